use crate::core::analysis::{AnalysisError, analyze};
use crate::core::io::fasta::{FastaError, parse_fasta_sequence};
use crate::core::io::traits::{RetrievalError, SequenceSource};
use crate::core::models::record::ProteinRecord;
use crate::core::utils::identifiers::normalize_identifiers;
use crate::engine::aggregate::{FrequencyTable, RatioTable, ResidueMeans, aggregate};
use crate::engine::cancel::CancellationToken;
use crate::engine::config::{ComparisonConfig, ReportNaming};
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::report::{ChartImage, ReportArtifact, ReportError, assemble_report};
use crate::engine::tasks;
use std::fmt;
use tracing::{debug, info, instrument};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WarningReason {
    Retrieval(RetrievalError),
    Unparseable(String),
    EmptySequence,
}

impl fmt::Display for WarningReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WarningReason::Retrieval(e) => write!(f, "{}", e),
            WarningReason::Unparseable(reason) => write!(f, "no parseable sequence ({})", reason),
            WarningReason::EmptySequence => write!(f, "sequence is empty"),
        }
    }
}

/// An identifier of the batch that produced no record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchWarning {
    pub identifier: String,
    pub reason: WarningReason,
}

impl fmt::Display for BatchWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid accession or sequence not found: {} ({})",
            self.identifier, self.reason
        )
    }
}

#[derive(Debug)]
pub struct ComparisonResult {
    identifiers: Vec<String>,
    frequency_table: FrequencyTable,
    ratio_table: RatioTable,
    residue_means: ResidueMeans,
    warnings: Vec<BatchWarning>,
    naming: ReportNaming,
}

impl ComparisonResult {
    /// Identifiers that produced a record, in batch order.
    pub fn identifiers(&self) -> &[String] {
        &self.identifiers
    }

    pub fn frequency_table(&self) -> &FrequencyTable {
        &self.frequency_table
    }

    pub fn ratio_table(&self) -> &RatioTable {
        &self.ratio_table
    }

    pub fn residue_means(&self) -> &ResidueMeans {
        &self.residue_means
    }

    pub fn warnings(&self) -> &[BatchWarning] {
        &self.warnings
    }

    pub fn frequency_section(&self) -> &str {
        &self.naming.frequency_section
    }

    pub fn ratio_section(&self) -> &str {
        &self.naming.ratio_section
    }

    /// Bundles both tables and the caller's rendered charts into a report.
    ///
    /// # Errors
    ///
    /// Fails with a [`ReportError`] on section name collisions or images attached
    /// to a section that does not exist.
    pub fn assemble_report(
        &self,
        images: impl IntoIterator<Item = ChartImage>,
    ) -> Result<ReportArtifact, ReportError> {
        assemble_report(
            &self.frequency_table,
            &self.ratio_table,
            &self.naming.frequency_section,
            &self.naming.ratio_section,
            images,
        )
    }
}

#[derive(Debug)]
pub enum ComparisonOutcome {
    /// The identifier list held no identifiers; nothing was fetched.
    Empty,
    /// Every identifier failed; there are no tables to report.
    NoRecords { warnings: Vec<BatchWarning> },
    Completed(ComparisonResult),
}

impl ComparisonOutcome {
    pub fn warnings(&self) -> &[BatchWarning] {
        match self {
            ComparisonOutcome::Empty => &[],
            ComparisonOutcome::NoRecords { warnings } => warnings,
            ComparisonOutcome::Completed(result) => result.warnings(),
        }
    }
}

/// Runs the comparison pipeline on a comma-separated identifier list.
///
/// Identifiers are normalized, retrieved through `source` with bounded
/// concurrency, analyzed, and aggregated once every retrieval has resolved.
/// Identifiers that cannot be retrieved or carry no parseable sequence become
/// [`BatchWarning`]s, one per failed identifier, returned with the outcome and
/// not reported anywhere else; the rest of the batch still completes.
///
/// # Errors
///
/// Returns [`EngineError::Cancelled`] if `cancel` is raised before the join, or
/// [`EngineError::Initialization`] if the retrieval pool cannot be created.
#[instrument(skip_all, name = "comparison_workflow")]
pub fn run<S: SequenceSource + ?Sized>(
    input: &str,
    source: &S,
    config: &ComparisonConfig,
    reporter: &ProgressReporter,
    cancel: &CancellationToken,
) -> Result<ComparisonOutcome, EngineError> {
    let identifiers = normalize_identifiers(input);
    if identifiers.is_empty() {
        info!("Identifier list is empty; nothing to compare.");
        return Ok(ComparisonOutcome::Empty);
    }
    info!("Comparing {} identifier(s).", identifiers.len());

    // === Phase 1: Retrieval (join barrier) ===
    reporter.report(Progress::PhaseStart {
        name: "Retrieving sequences",
    });
    let fetched = tasks::fetch::run(&identifiers, source, config, reporter, cancel)?;
    reporter.report(Progress::PhaseFinish);

    // === Phase 2: Composition analysis ===
    reporter.report(Progress::PhaseStart {
        name: "Analyzing composition",
    });
    let mut records: Vec<ProteinRecord> = Vec::with_capacity(identifiers.len());
    let mut resolved = Vec::with_capacity(identifiers.len());
    let mut warnings = Vec::new();

    for (identifier, result) in identifiers.into_iter().zip(fetched) {
        match analyze_fetched(&identifier, result) {
            Ok(record) => {
                records.push(record);
                resolved.push(identifier);
            }
            Err(reason) => {
                let warning = BatchWarning { identifier, reason };
                debug!("{}", warning);
                warnings.push(warning);
            }
        }
    }
    reporter.report(Progress::PhaseFinish);

    if records.is_empty() {
        info!("No identifier produced a record; skipping aggregation.");
        return Ok(ComparisonOutcome::NoRecords { warnings });
    }

    // === Phase 3: Aggregation ===
    reporter.report(Progress::PhaseStart {
        name: "Aggregating tables",
    });
    let (frequency_table, ratio_table) = aggregate(records);
    let residue_means = frequency_table.residue_means();
    reporter.report(Progress::PhaseFinish);

    info!(
        proteins = frequency_table.proteins().len(),
        residues = frequency_table.residues().len(),
        warnings = warnings.len(),
        "Comparison complete."
    );

    Ok(ComparisonOutcome::Completed(ComparisonResult {
        identifiers: resolved,
        frequency_table,
        ratio_table,
        residue_means,
        warnings,
        naming: config.naming.clone(),
    }))
}

fn analyze_fetched(
    identifier: &str,
    result: tasks::fetch::FetchResult,
) -> Result<ProteinRecord, WarningReason> {
    let entry = result.map_err(WarningReason::Retrieval)?;
    let sequence = parse_fasta_sequence(&entry.fasta).map_err(|e| match e {
        FastaError::EmptySequence => WarningReason::EmptySequence,
        other => WarningReason::Unparseable(other.to_string()),
    })?;
    analyze(identifier, entry.display_name.as_deref(), &sequence).map_err(|e| match e {
        AnalysisError::EmptySequence { .. } => WarningReason::EmptySequence,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io::traits::FetchedEntry;
    use crate::engine::config::ComparisonConfigBuilder;
    use std::collections::HashMap;

    struct MapSource(HashMap<&'static str, FetchedEntry>);

    impl SequenceSource for MapSource {
        fn fetch(
            &self,
            identifier: &str,
            _cancel: &CancellationToken,
        ) -> Result<FetchedEntry, RetrievalError> {
            self.0
                .get(identifier)
                .cloned()
                .ok_or_else(|| RetrievalError::Status { status: 400 })
        }
    }

    fn source() -> MapSource {
        let mut entries = HashMap::new();
        entries.insert(
            "P69905",
            FetchedEntry::new(">sp|P69905|HBA_HUMAN\nMVLS\n").with_display_name("HBA_HUMAN"),
        );
        entries.insert("AAA1", FetchedEntry::new(">AAA1\nAAA\n"));
        entries.insert("CCC1", FetchedEntry::new(">CCC1\nCCC\n"));
        entries.insert("HTML", FetchedEntry::new("<html>error</html>"));
        entries.insert("EMPTY", FetchedEntry::new(">EMPTY\n"));
        MapSource(entries)
    }

    fn config() -> ComparisonConfig {
        ComparisonConfigBuilder::new()
            .max_concurrent_fetches(2)
            .build()
            .unwrap()
    }

    fn compare(input: &str) -> ComparisonOutcome {
        run(
            input,
            &source(),
            &config(),
            &ProgressReporter::new(),
            &CancellationToken::new(),
        )
        .unwrap()
    }

    #[test]
    fn empty_input_short_circuits() {
        assert!(matches!(compare(""), ComparisonOutcome::Empty));
        assert!(matches!(compare(" , ,"), ComparisonOutcome::Empty));
    }

    #[test]
    fn invalid_identifier_becomes_warning_and_batch_continues() {
        let ComparisonOutcome::Completed(result) = compare("P69905, INVALIDXYZ") else {
            panic!("expected a completed comparison");
        };

        assert_eq!(result.frequency_table().proteins(), &["HBA_HUMAN".to_string()]);
        assert_eq!(result.identifiers(), &["P69905".to_string()]);
        assert_eq!(result.warnings().len(), 1);
        assert_eq!(result.warnings()[0].identifier, "INVALIDXYZ");
        assert!(result.warnings()[0].to_string().contains("INVALIDXYZ"));
    }

    #[test]
    fn unparseable_and_empty_sequences_become_warnings() {
        let outcome = compare("HTML,EMPTY");
        let ComparisonOutcome::NoRecords { warnings } = outcome else {
            panic!("expected no records");
        };
        assert_eq!(warnings.len(), 2);
        assert!(matches!(warnings[0].reason, WarningReason::Unparseable(_)));
        assert_eq!(warnings[1].reason, WarningReason::EmptySequence);
    }

    #[test]
    fn repeated_identifiers_are_analyzed_each_time() {
        let ComparisonOutcome::Completed(result) = compare("AAA1, AAA1") else {
            panic!("expected a completed comparison");
        };
        assert_eq!(result.frequency_table().proteins().len(), 2);
        assert_eq!(result.ratio_table().proteins().len(), 2);
    }

    #[test]
    fn result_assembles_report_with_configured_section_names() {
        let ComparisonOutcome::Completed(result) = compare("AAA1, CCC1") else {
            panic!("expected a completed comparison");
        };
        let report = result.assemble_report(Vec::new()).unwrap();
        let names: Vec<_> = report.section_names().collect();
        assert_eq!(names, vec![result.frequency_section(), result.ratio_section()]);
        assert_eq!(result.residue_means().get('A'), Some(0.5));
    }

    #[test]
    fn cancelled_batch_produces_no_result() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = run(
            "AAA1, CCC1",
            &source(),
            &config(),
            &ProgressReporter::new(),
            &cancel,
        );
        assert!(matches!(result, Err(EngineError::Cancelled)));
    }
}
