use std::collections::BTreeMap;

/// Occurrence count of every residue symbol observed in one sequence.
///
/// Symbols are kept in ascending order. Reading an absent symbol through
/// [`ResidueCounts::get`] yields `0` and never inserts an entry, so the set of
/// observed symbols only ever reflects what the sequence actually contained.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResidueCounts {
    counts: BTreeMap<char, usize>,
}

impl ResidueCounts {
    /// Tallies every symbol of `sequence` in a single pass.
    pub fn tally(sequence: &str) -> Self {
        let mut counts = BTreeMap::new();
        for symbol in sequence.chars() {
            *counts.entry(symbol).or_insert(0) += 1;
        }
        Self { counts }
    }

    /// Count for `symbol`, or `0` if it was never observed.
    pub fn get(&self, symbol: char) -> usize {
        self.counts.get(&symbol).copied().unwrap_or(0)
    }

    pub fn contains(&self, symbol: char) -> bool {
        self.counts.contains_key(&symbol)
    }

    /// Total number of residues tallied (the sequence length in symbols).
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    /// Number of distinct symbols observed.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn symbols(&self) -> impl Iterator<Item = char> + '_ {
        self.counts.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (char, usize)> + '_ {
        self.counts.iter().map(|(&symbol, &count)| (symbol, count))
    }
}

/// Relative frequency of every residue symbol observed in one sequence.
///
/// Built from [`ResidueCounts`]; for a non-empty sequence the frequencies sum to 1.
/// Like the counts, an absent symbol reads as `0.0` without being inserted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResidueFrequencies {
    frequencies: BTreeMap<char, f64>,
}

impl ResidueFrequencies {
    pub fn from_counts(counts: &ResidueCounts) -> Self {
        let total = counts.total();
        if total == 0 {
            return Self::default();
        }
        let total = total as f64;
        let frequencies = counts
            .iter()
            .map(|(symbol, count)| (symbol, count as f64 / total))
            .collect();
        Self { frequencies }
    }

    /// Frequency for `symbol`, or `0.0` if it was never observed.
    pub fn get(&self, symbol: char) -> f64 {
        self.frequencies.get(&symbol).copied().unwrap_or(0.0)
    }

    pub fn contains(&self, symbol: char) -> bool {
        self.frequencies.contains_key(&symbol)
    }

    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    pub fn symbols(&self) -> impl Iterator<Item = char> + '_ {
        self.frequencies.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (char, f64)> + '_ {
        self.frequencies
            .iter()
            .map(|(&symbol, &frequency)| (symbol, frequency))
    }

    pub fn sum(&self) -> f64 {
        self.frequencies.values().sum()
    }
}
