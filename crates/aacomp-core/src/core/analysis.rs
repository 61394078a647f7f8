use crate::core::models::composition::{ResidueCounts, ResidueFrequencies};
use crate::core::models::ratio::RatioValues;
use crate::core::models::record::ProteinRecord;
use crate::core::utils::residues::non_standard_symbols;
use thiserror::Error;
use tracing::{debug, instrument};

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum AnalysisError {
    #[error("Sequence for '{identifier}' is empty")]
    EmptySequence { identifier: String },
}

/// Computes residue counts, relative frequencies and the registry ratios for one
/// protein sequence.
///
/// `display_name` defaults to `identifier` when absent or blank. Symbols outside
/// the standard alphabet are counted like any other symbol.
///
/// # Errors
///
/// Returns [`AnalysisError::EmptySequence`] if `sequence` has no residues.
#[instrument(skip(sequence), fields(length = sequence.chars().count()))]
pub fn analyze(
    identifier: &str,
    display_name: Option<&str>,
    sequence: &str,
) -> Result<ProteinRecord, AnalysisError> {
    if sequence.is_empty() {
        return Err(AnalysisError::EmptySequence {
            identifier: identifier.to_string(),
        });
    }

    let counts = ResidueCounts::tally(sequence);
    let frequencies = ResidueFrequencies::from_counts(&counts);
    let ratios = RatioValues::compute(&counts);

    let unusual = non_standard_symbols(sequence);
    if !unusual.is_empty() {
        debug!(?unusual, "Sequence contains non-standard residue symbols.");
    }

    let display_name = display_name
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(identifier);

    Ok(ProteinRecord::new(
        identifier.to_string(),
        display_name.to_string(),
        sequence.to_string(),
        counts,
        frequencies,
        ratios,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analyze_computes_counts_frequencies_and_ratios() {
        let record = analyze("P69905", None, "MVLS").unwrap();

        for symbol in ['M', 'V', 'L', 'S'] {
            assert_eq!(record.residue_counts().get(symbol), 1);
            assert!((record.residue_frequencies().get(symbol) - 0.25).abs() < 1e-12);
        }
        assert_eq!(record.residue_counts().len(), 4);
        assert_eq!(record.ratios().get("E/Q"), Some(0.0));
        assert_eq!(record.length(), 4);
    }

    #[test]
    fn analyze_defaults_display_name_to_identifier() {
        let record = analyze("P69905", None, "MVLS").unwrap();
        assert_eq!(record.display_name(), "P69905");

        let record = analyze("P69905", Some("  "), "MVLS").unwrap();
        assert_eq!(record.display_name(), "P69905");

        let record = analyze("P69905", Some("HBA_HUMAN"), "MVLS").unwrap();
        assert_eq!(record.display_name(), "HBA_HUMAN");
        assert_eq!(record.identifier(), "P69905");
    }

    #[test]
    fn analyze_fails_on_empty_sequence() {
        let result = analyze("P69905", None, "");
        assert_eq!(
            result,
            Err(AnalysisError::EmptySequence {
                identifier: "P69905".to_string()
            })
        );
    }

    #[test]
    fn analyze_frequencies_sum_to_one() {
        let record = analyze("X", None, "MVHLTPEEKSAVTALWGKVNVDEVGGEALGRLLVVYPWTQRFFESFGDLSTPDAVMGNPKVKAHGKKVLGAFSDGLAHLDNLKGTFATLSELHCDKLHVDPENFRLLGNVLVCVLAHHFGKEFTPPVQAAYQKVVAGVANALAHKYH").unwrap();
        assert!((record.residue_frequencies().sum() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn analyze_counts_non_standard_symbols() {
        let record = analyze("X", None, "AXXU").unwrap();
        assert_eq!(record.residue_counts().get('X'), 2);
        assert!((record.residue_frequencies().get('U') - 0.25).abs() < 1e-12);
    }

    #[test]
    fn analyze_ratios_never_produce_non_finite_values() {
        let record = analyze("X", None, "EEEEYYYYGGGDDD").unwrap();
        for (_, value) in record.ratios().iter() {
            assert!(value.is_finite());
            assert_eq!(value, 0.0);
        }
    }
}
