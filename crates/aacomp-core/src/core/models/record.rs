use super::composition::{ResidueCounts, ResidueFrequencies};
use super::ratio::RatioValues;

/// Composition statistics for one successfully retrieved protein.
///
/// Built only by the composition analyzer and never mutated afterwards.
#[derive(Debug, PartialEq)]
pub struct ProteinRecord {
    identifier: String,
    display_name: String,
    sequence: String,
    residue_counts: ResidueCounts,
    residue_frequencies: ResidueFrequencies,
    ratios: RatioValues,
}

impl ProteinRecord {
    pub(crate) fn new(
        identifier: String,
        display_name: String,
        sequence: String,
        residue_counts: ResidueCounts,
        residue_frequencies: ResidueFrequencies,
        ratios: RatioValues,
    ) -> Self {
        Self {
            identifier,
            display_name,
            sequence,
            residue_counts,
            residue_frequencies,
            ratios,
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Label used for table columns and chart legends; the identifier unless the
    /// source supplied an entry name.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn sequence(&self) -> &str {
        &self.sequence
    }

    pub fn length(&self) -> usize {
        self.residue_counts.total()
    }

    pub fn residue_counts(&self) -> &ResidueCounts {
        &self.residue_counts
    }

    pub fn residue_frequencies(&self) -> &ResidueFrequencies {
        &self.residue_frequencies
    }

    pub fn ratios(&self) -> &RatioValues {
        &self.ratios
    }
}
