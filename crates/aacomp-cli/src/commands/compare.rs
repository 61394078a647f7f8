use crate::charts::ChartRenderer;
use crate::cli::CompareArgs;
use crate::config::{AppConfig, PartialAppConfig};
use crate::display;
use crate::error::{CliError, Result};
use crate::export::{ExportMetadata, ReportExporter};
use crate::uniprot::UniProtClient;
use crate::utils::progress::CliProgressHandler;
use aacomp::{
    core::io::{fasta::FastaFileSource, traits::SequenceSource},
    engine::{cancel::CancellationToken, progress::ProgressReporter},
    workflows::compare::{self, BatchWarning, ComparisonOutcome, ComparisonResult},
};
use std::io::{self, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, warn};

const INTERRUPTED_EXIT_CODE: i32 = 130;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InterruptAction {
    CancelBatch,
    Exit,
}

/// The first Ctrl-C while sequences are being retrieved abandons the batch; a
/// second one, or any Ctrl-C after retrieval, ends the process.
fn interrupt_action(retrieval_done: bool, already_cancelled: bool) -> InterruptAction {
    if retrieval_done || already_cancelled {
        InterruptAction::Exit
    } else {
        InterruptAction::CancelBatch
    }
}

/// `show_progress` is false with `--quiet`, and with `-v` where log lines would
/// otherwise be drawn across the bar.
pub async fn run(args: CompareArgs, show_progress: bool) -> Result<()> {
    let partial_config = PartialAppConfig::load(args.config.as_deref())?;
    info!("Merging configuration from file and CLI arguments...");
    let config = partial_config.merge_with_cli(&args)?;

    let source = open_source(&args, &config)?;

    let progress_handler = if show_progress {
        CliProgressHandler::new()
    } else {
        CliProgressHandler::hidden()
    };
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    let cancel = CancellationToken::new();
    let retrieval_done = Arc::new(AtomicBool::new(false));
    watch_for_interrupt(cancel.clone(), retrieval_done.clone());

    info!("Invoking the comparison workflow...");
    let outcome = tokio::task::block_in_place(|| {
        compare::run(
            &args.accessions,
            source.as_ref(),
            &config.core,
            &reporter,
            &cancel,
        )
    });
    retrieval_done.store(true, Ordering::SeqCst);
    progress_handler.clear();
    let outcome = outcome?;

    write_warnings(&mut io::stderr().lock(), outcome.warnings())?;

    match outcome {
        ComparisonOutcome::Empty => {
            warn!("No accession codes were given.");
            println!("No accession codes given; nothing to compare.");
            Ok(())
        }
        ComparisonOutcome::NoRecords { warnings } => Err(CliError::NoRecords(warnings.len())),
        ComparisonOutcome::Completed(result) => {
            print_tables(&result);
            write_report(&result, &config)
        }
    }
}

fn open_source(args: &CompareArgs, config: &AppConfig) -> Result<Box<dyn SequenceSource>> {
    match &args.fasta {
        Some(path) => {
            info!("Reading sequences from local FASTA file {:?}", path);
            let source = FastaFileSource::from_path(path).map_err(|e| CliError::FileParsing {
                path: path.clone(),
                source: e.into(),
            })?;
            info!("Indexed {} FASTA record(s).", source.len());
            Ok(Box::new(source))
        }
        None => {
            info!("Retrieving sequences from {}", config.fetch.base_url);
            Ok(Box::new(UniProtClient::new(&config.fetch)?))
        }
    }
}

fn watch_for_interrupt(cancel: CancellationToken, retrieval_done: Arc<AtomicBool>) {
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            match interrupt_action(retrieval_done.load(Ordering::SeqCst), cancel.is_cancelled()) {
                InterruptAction::CancelBatch => {
                    info!("Interrupt received, cancelling the batch.");
                    eprintln!("Interrupted; abandoning the batch (press Ctrl-C again to exit).");
                    cancel.cancel();
                }
                InterruptAction::Exit => {
                    eprintln!("Interrupted.");
                    std::process::exit(INTERRUPTED_EXIT_CODE);
                }
            }
        }
    });
}

/// One line per identifier that produced no record.
fn write_warnings<W: Write>(out: &mut W, warnings: &[BatchWarning]) -> io::Result<()> {
    for warning in warnings {
        writeln!(out, "⚠️  {}", warning)?;
    }
    Ok(())
}

fn print_tables(result: &ComparisonResult) {
    println!("\nAmino acid frequencies:\n");
    print!("{}", display::frequency_table(result.frequency_table()));
    println!("\nSpecific ratios:\n");
    print!("{}", display::ratio_table(result.ratio_table()));
    println!("\nMean frequency per residue:\n");
    print!("{}", display::residue_means(result.residue_means()));
}

fn write_report(result: &ComparisonResult, config: &AppConfig) -> Result<()> {
    let Some(report_settings) = &config.report else {
        info!("Report output disabled.");
        return Ok(());
    };

    let images = if config.charts.enabled {
        ChartRenderer::new(&config.charts)
            .with_format(report_settings.format.image_format())
            .render_all(result)?
    } else {
        info!("Chart rendering disabled.");
        Vec::new()
    };

    let report = result.assemble_report(images)?;
    let metadata = ExportMetadata {
        proteins: result.frequency_table().proteins().to_vec(),
        warnings: result.warnings().iter().map(|w| w.to_string()).collect(),
    };

    let exporter = ReportExporter::new(&report_settings.path, report_settings.format);
    let entries = exporter.export(&report, &metadata)?;
    println!(
        "\n✓ Report with {} section(s) and {} file(s) written to: {}",
        report.len(),
        entries.len(),
        exporter.path().display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use aacomp::engine::config::ComparisonConfigBuilder;
    use std::io::Cursor;

    #[test]
    fn one_invalid_accession_yields_one_warning_line() {
        let source = FastaFileSource::from_reader(Cursor::new(
            ">sp|P69905|HBA_HUMAN Hemoglobin subunit alpha\nMVLSPADKTNVKAAW\n",
        ))
        .unwrap();
        let config = ComparisonConfigBuilder::new()
            .max_concurrent_fetches(2)
            .build()
            .unwrap();

        let outcome = compare::run(
            "P69905, INVALIDXYZ",
            &source,
            &config,
            &ProgressReporter::new(),
            &CancellationToken::new(),
        )
        .unwrap();

        let mut out = Vec::new();
        write_warnings(&mut out, outcome.warnings()).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("INVALIDXYZ"));
        assert!(!text.contains("P69905"));
    }

    #[test]
    fn ctrl_c_cancels_only_a_running_retrieval() {
        assert_eq!(interrupt_action(false, false), InterruptAction::CancelBatch);
        assert_eq!(interrupt_action(false, true), InterruptAction::Exit);
        assert_eq!(interrupt_action(true, false), InterruptAction::Exit);
    }
}
