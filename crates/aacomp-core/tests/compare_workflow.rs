use aacomp::core::io::fasta::FastaFileSource;
use aacomp::core::io::traits::{FetchedEntry, RetrievalError, SequenceSource};
use aacomp::engine::cancel::CancellationToken;
use aacomp::engine::config::{ComparisonConfig, ComparisonConfigBuilder};
use aacomp::engine::progress::{Progress, ProgressReporter};
use aacomp::engine::report::{ChartImage, ImageFormat, ReportError, SectionContent};
use aacomp::workflows::compare::{self, ComparisonOutcome, ComparisonResult};
use std::io::Cursor;
use std::sync::Mutex;

const PROTEINS: &str = "\
>sp|P69905|HBA_HUMAN Hemoglobin subunit alpha OS=Homo sapiens OX=9606 GN=HBA1 PE=1 SV=2
MVLS
>sp|P68871|HBB_HUMAN Hemoglobin subunit beta OS=Homo sapiens OX=9606 GN=HBB PE=1 SV=2
MVHLTPEEKSAVTALWGKVNVDEVGGEALGRLLVVYPWTQRFFESFGDLSTPDAVMGNPKVKAHGKKVLGAFSDGLAHLDNLKGTF
ATLSELHCDKLHVDPENFRLLGNVLVCVLAHHFGKEFTPPVQAAYQKVVAGVANALAHKYH
>tr|AAA001|POLYA_TEST Poly-alanine
AAA
>tr|CCC001|POLYC_TEST Poly-cysteine
CCC
";

fn source() -> FastaFileSource {
    FastaFileSource::from_reader(Cursor::new(PROTEINS)).unwrap()
}

fn config(workers: usize) -> ComparisonConfig {
    ComparisonConfigBuilder::new()
        .max_concurrent_fetches(workers)
        .build()
        .unwrap()
}

fn completed(input: &str) -> ComparisonResult {
    let outcome = compare::run(
        input,
        &source(),
        &config(4),
        &ProgressReporter::new(),
        &CancellationToken::new(),
    )
    .unwrap();
    match outcome {
        ComparisonOutcome::Completed(result) => result,
        other => panic!("expected a completed comparison, got {:?}", other),
    }
}

#[test]
fn single_short_sequence_yields_quarter_frequencies_and_zero_ratio() {
    let result = completed("P69905");
    let table = result.frequency_table();

    assert_eq!(table.residues(), &['L', 'M', 'S', 'V']);
    assert_eq!(table.proteins(), &["HBA_HUMAN".to_string()]);
    for symbol in ['M', 'V', 'L', 'S'] {
        assert!((table.frequency_of(symbol, 0).unwrap() - 0.25).abs() < 1e-12);
    }
    assert_eq!(result.ratio_table().value(0, 0), Some(0.0));
}

#[test]
fn failed_identifier_leaves_one_column_and_one_warning() {
    let result = completed("P69905,INVALIDXYZ");

    assert_eq!(result.frequency_table().proteins().len(), 1);
    assert_eq!(result.warnings().len(), 1);
    assert_eq!(result.warnings()[0].identifier, "INVALIDXYZ");
}

#[test]
fn disjoint_alphabets_are_zero_filled() {
    let result = completed("AAA001, CCC001");
    let table = result.frequency_table();

    assert_eq!(table.residues(), &['A', 'C']);
    assert_eq!(table.column(0), Some(&[1.0, 0.0][..]));
    assert_eq!(table.column(1), Some(&[0.0, 1.0][..]));
}

#[test]
fn frequency_columns_sum_to_one_and_rows_are_sorted_union() {
    let result = completed("P69905, P68871, AAA001, CCC001");
    let table = result.frequency_table();

    assert!(table.residues().windows(2).all(|w| w[0] < w[1]));
    for idx in 0..table.proteins().len() {
        let sum: f64 = table.column(idx).unwrap().iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
    }

    let mut union: Vec<char> = "MVLSHTPEKAWGNDRYQFC".chars().collect();
    union.sort_unstable();
    union.dedup();
    assert_eq!(table.residues(), union.as_slice());
}

#[test]
fn ratio_values_are_finite_for_every_protein() {
    let result = completed("P69905, P68871, AAA001, CCC001");
    let ratios = result.ratio_table();

    for protein_idx in 0..ratios.proteins().len() {
        for (_, value) in ratios.row(protein_idx).unwrap().iter() {
            assert!(value.is_finite());
            assert!(value >= 0.0);
        }
    }
    let hbb = ratios.row(1).unwrap();
    assert!((hbb.get("E/Q").unwrap() - 8.0 / 3.0).abs() < 1e-12);
}

#[test]
fn repeated_runs_are_identical_regardless_of_worker_count() {
    let run_with = |workers| {
        let outcome = compare::run(
            "P68871, AAA001, P69905, CCC001, P68871",
            &source(),
            &config(workers),
            &ProgressReporter::new(),
            &CancellationToken::new(),
        )
        .unwrap();
        let ComparisonOutcome::Completed(result) = outcome else {
            panic!("expected a completed comparison");
        };
        (result.frequency_table().clone(), result.ratio_table().clone())
    };

    assert_eq!(run_with(1), run_with(1));
    assert_eq!(run_with(1), run_with(4));
}

#[test]
fn all_identifiers_failing_yields_warnings_only() {
    let outcome = compare::run(
        "NOPE1, NOPE2",
        &source(),
        &config(2),
        &ProgressReporter::new(),
        &CancellationToken::new(),
    )
    .unwrap();

    let ComparisonOutcome::NoRecords { warnings } = outcome else {
        panic!("expected no records");
    };
    let names: Vec<_> = warnings.iter().map(|w| w.identifier.as_str()).collect();
    assert_eq!(names, vec!["NOPE1", "NOPE2"]);
}

#[test]
fn report_bundles_tables_and_charts_in_stable_order() {
    let result = completed("P69905, P68871");
    let svg = |name: &str| ChartImage::new(name, ImageFormat::Svg, b"<svg/>".to_vec());

    let report = result
        .assemble_report(vec![
            svg("frequency-bar").attached_to(result.frequency_section()),
            svg("ratio-bar").attached_to(result.ratio_section()),
            svg("residue-mean-bar"),
        ])
        .unwrap();

    let names: Vec<_> = report.section_names().collect();
    assert_eq!(
        names,
        vec!["amino-acid-frequencies", "specific-ratios", "residue-mean-bar"]
    );
    match report.sections()[0].content() {
        SectionContent::Table { table, images } => {
            assert_eq!(table.columns(), &["HBA_HUMAN".to_string(), "HBB_HUMAN".to_string()]);
            assert_eq!(images.len(), 1);
            assert_eq!(images[0].name(), "frequency-bar");
        }
        SectionContent::Image(_) => panic!("first section should be a table"),
    }

    let conflict = result.assemble_report(vec![svg("specific-ratios")]);
    assert_eq!(
        conflict,
        Err(ReportError::NameConflict("specific-ratios".to_string()))
    );
}

struct CancellingSource {
    token: CancellationToken,
}

impl SequenceSource for CancellingSource {
    fn fetch(
        &self,
        identifier: &str,
        _cancel: &CancellationToken,
    ) -> Result<FetchedEntry, RetrievalError> {
        self.token.cancel();
        Ok(FetchedEntry::new(format!(">{}\nMVLS\n", identifier)))
    }
}

#[test]
fn cancellation_during_retrieval_discards_the_batch() {
    let token = CancellationToken::new();
    let source = CancellingSource {
        token: token.clone(),
    };

    let result = compare::run(
        "A, B, C",
        &source,
        &config(1),
        &ProgressReporter::new(),
        &token,
    );

    assert!(matches!(
        result,
        Err(aacomp::engine::error::EngineError::Cancelled)
    ));
}

#[test]
fn progress_reports_each_phase() {
    let phases = Mutex::new(Vec::new());
    let reporter = ProgressReporter::with_callback(Box::new(|event| {
        if let Progress::PhaseStart { name } = event {
            phases.lock().unwrap().push(name);
        }
    }));

    compare::run(
        "P69905",
        &source(),
        &config(1),
        &reporter,
        &CancellationToken::new(),
    )
    .unwrap();
    drop(reporter);

    assert_eq!(
        phases.into_inner().unwrap(),
        vec![
            "Retrieving sequences",
            "Analyzing composition",
            "Aggregating tables"
        ]
    );
}
