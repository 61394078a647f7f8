use crate::core::models::ratio::{RATIO_COUNT, RATIO_REGISTRY, RatioValues};
use crate::core::models::record::ProteinRecord;
use std::collections::BTreeSet;
use tracing::{debug, instrument};

/// Residue frequencies of every protein in a batch, side by side.
///
/// Rows are the union of residue symbols observed across the batch in ascending
/// order; columns follow record arrival order and are labelled by display name.
/// Two records sharing a display name remain two columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrequencyTable {
    residues: Vec<char>,
    proteins: Vec<String>,
    columns: Vec<Vec<f64>>,
}

impl FrequencyTable {
    pub fn residues(&self) -> &[char] {
        &self.residues
    }

    pub fn proteins(&self) -> &[String] {
        &self.proteins
    }

    pub fn is_empty(&self) -> bool {
        self.proteins.is_empty()
    }

    /// All frequencies of one protein, in row order.
    pub fn column(&self, protein_idx: usize) -> Option<&[f64]> {
        self.columns.get(protein_idx).map(Vec::as_slice)
    }

    /// Frequency of one residue across all proteins, in column order.
    pub fn row(&self, residue_idx: usize) -> Option<Vec<f64>> {
        if residue_idx >= self.residues.len() {
            return None;
        }
        Some(
            self.columns
                .iter()
                .map(|column| column[residue_idx])
                .collect(),
        )
    }

    pub fn value(&self, residue_idx: usize, protein_idx: usize) -> Option<f64> {
        self.columns
            .get(protein_idx)
            .and_then(|column| column.get(residue_idx))
            .copied()
    }

    /// Frequency of `symbol` for the protein in column `protein_idx`; `None` if the
    /// symbol is not a row of this table or the column does not exist.
    pub fn frequency_of(&self, symbol: char, protein_idx: usize) -> Option<f64> {
        let residue_idx = self.residues.binary_search(&symbol).ok()?;
        self.value(residue_idx, protein_idx)
    }

    /// Mean frequency of each residue across all proteins, in row order.
    pub fn residue_means(&self) -> ResidueMeans {
        let n = self.columns.len();
        let entries = self
            .residues
            .iter()
            .enumerate()
            .map(|(residue_idx, &symbol)| {
                let mean = if n == 0 {
                    0.0
                } else {
                    self.columns
                        .iter()
                        .map(|column| column[residue_idx])
                        .sum::<f64>()
                        / n as f64
                };
                (symbol, mean)
            })
            .collect();
        ResidueMeans { entries }
    }
}

/// Registry ratios of every protein in a batch, one row per protein.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RatioTable {
    proteins: Vec<String>,
    rows: Vec<RatioValues>,
}

impl RatioTable {
    pub fn proteins(&self) -> &[String] {
        &self.proteins
    }

    /// Column names in registry order.
    pub fn ratio_names(&self) -> [&'static str; RATIO_COUNT] {
        RATIO_REGISTRY.map(|spec| spec.name)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, protein_idx: usize) -> Option<&RatioValues> {
        self.rows.get(protein_idx)
    }

    pub fn value(&self, protein_idx: usize, ratio_idx: usize) -> Option<f64> {
        self.rows
            .get(protein_idx)
            .and_then(|row| row.as_slice().get(ratio_idx))
            .copied()
    }
}

/// Per-residue mean frequency across a batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResidueMeans {
    entries: Vec<(char, f64)>,
}

impl ResidueMeans {
    pub fn get(&self, symbol: char) -> Option<f64> {
        self.entries
            .iter()
            .find(|(s, _)| *s == symbol)
            .map(|(_, mean)| *mean)
    }

    pub fn iter(&self) -> impl Iterator<Item = (char, f64)> + '_ {
        self.entries.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Merges the records of a batch into a frequency table and a ratio table.
///
/// The row universe is computed first, as the sorted union of all observed
/// symbols; each record then contributes one column in the order supplied, with
/// `0` for residues it never exhibited. An empty batch yields two empty tables.
#[instrument(skip_all, name = "aggregation", fields(records = records.len()))]
pub fn aggregate(records: Vec<ProteinRecord>) -> (FrequencyTable, RatioTable) {
    let universe: BTreeSet<char> = records
        .iter()
        .flat_map(|record| record.residue_frequencies().symbols())
        .collect();
    let residues: Vec<char> = universe.into_iter().collect();
    debug!(rows = residues.len(), "Computed residue universe.");

    let mut frequency = FrequencyTable {
        residues,
        proteins: Vec::with_capacity(records.len()),
        columns: Vec::with_capacity(records.len()),
    };
    let mut ratio = RatioTable {
        proteins: Vec::with_capacity(records.len()),
        rows: Vec::with_capacity(records.len()),
    };

    for record in records {
        let frequencies = record.residue_frequencies();
        let column = frequency
            .residues
            .iter()
            .map(|&symbol| frequencies.get(symbol))
            .collect();
        frequency.columns.push(column);
        frequency.proteins.push(record.display_name().to_string());

        ratio.rows.push(*record.ratios());
        ratio.proteins.push(record.display_name().to_string());
    }

    (frequency, ratio)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::analysis::analyze;

    fn records(sequences: &[(&str, &str)]) -> Vec<ProteinRecord> {
        sequences
            .iter()
            .map(|(name, seq)| analyze(name, None, seq).unwrap())
            .collect()
    }

    #[test]
    fn aggregate_fills_disjoint_alphabets_with_zero() {
        let (frequency, _) = aggregate(records(&[("P1", "AAA"), ("P2", "CCC")]));

        assert_eq!(frequency.residues(), &['A', 'C']);
        assert_eq!(frequency.proteins(), &["P1".to_string(), "P2".to_string()]);
        assert_eq!(frequency.column(0), Some(&[1.0, 0.0][..]));
        assert_eq!(frequency.column(1), Some(&[0.0, 1.0][..]));
    }

    #[test]
    fn aggregate_rows_are_sorted_union_of_symbols() {
        let (frequency, _) = aggregate(records(&[("P1", "WMA"), ("P2", "CAY"), ("P3", "MM")]));

        assert_eq!(frequency.residues(), &['A', 'C', 'M', 'W', 'Y']);
        assert!(frequency.residues().windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn aggregate_keeps_duplicate_display_names_as_separate_columns() {
        let (frequency, ratio) = aggregate(records(&[("P1", "AAA"), ("P1", "ACC")]));

        assert_eq!(frequency.proteins().len(), 2);
        assert_eq!(frequency.proteins()[0], frequency.proteins()[1]);
        assert_eq!(ratio.proteins().len(), 2);
        assert_ne!(frequency.column(0), frequency.column(1));
    }

    #[test]
    fn aggregate_of_no_records_is_empty() {
        let (frequency, ratio) = aggregate(Vec::new());

        assert!(frequency.is_empty());
        assert!(frequency.residues().is_empty());
        assert!(ratio.is_empty());
        assert!(frequency.residue_means().is_empty());
    }

    #[test]
    fn aggregate_builds_ratio_rows_in_registry_order() {
        let (_, ratio) = aggregate(records(&[("P1", "EEQ"), ("P2", "GGS")]));

        assert_eq!(ratio.ratio_names(), ["E/Q", "E/P", "Y/F", "D/N", "G/S"]);
        assert_eq!(ratio.value(0, 0), Some(2.0));
        assert_eq!(ratio.value(0, 4), Some(0.0));
        assert_eq!(ratio.value(1, 4), Some(2.0));
        assert_eq!(ratio.value(2, 0), None);
    }

    #[test]
    fn aggregate_is_deterministic() {
        let batch = [("P1", "MVLSPADKTNV"), ("P2", "MVHLTPEEKS"), ("P3", "GGGSYF")];
        let first = aggregate(records(&batch));
        let second = aggregate(records(&batch));
        assert_eq!(first, second);
    }

    #[test]
    fn frequency_table_lookup_helpers() {
        let (frequency, _) = aggregate(records(&[("P1", "AAC"), ("P2", "C")]));

        assert_eq!(frequency.frequency_of('C', 1), Some(1.0));
        assert_eq!(frequency.frequency_of('Z', 0), None);
        assert_eq!(frequency.row(0), Some(vec![2.0 / 3.0, 0.0]));
        assert_eq!(frequency.row(5), None);
    }

    #[test]
    fn residue_means_average_each_row() {
        let (frequency, _) = aggregate(records(&[("P1", "AAA"), ("P2", "CCC")]));
        let means = frequency.residue_means();

        assert_eq!(means.len(), 2);
        assert_eq!(means.get('A'), Some(0.5));
        assert_eq!(means.get('C'), Some(0.5));
    }
}
