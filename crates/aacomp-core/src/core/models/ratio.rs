use super::composition::ResidueCounts;

/// A named pair of residues whose count ratio is tracked for every protein.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RatioSpec {
    pub name: &'static str,
    pub numerator: char,
    pub denominator: char,
}

pub const RATIO_COUNT: usize = 5;

/// The fixed ratio registry. Its order is the column order of every ratio table.
pub const RATIO_REGISTRY: [RatioSpec; RATIO_COUNT] = [
    RatioSpec::new("E/Q", 'E', 'Q'),
    RatioSpec::new("E/P", 'E', 'P'),
    RatioSpec::new("Y/F", 'Y', 'F'),
    RatioSpec::new("D/N", 'D', 'N'),
    RatioSpec::new("G/S", 'G', 'S'),
];

impl RatioSpec {
    pub const fn new(name: &'static str, numerator: char, denominator: char) -> Self {
        Self {
            name,
            numerator,
            denominator,
        }
    }

    /// `count(numerator) / count(denominator)`, or `0.0` when the denominator
    /// residue does not occur at all.
    pub fn evaluate(&self, counts: &ResidueCounts) -> f64 {
        let denominator = counts.get(self.denominator);
        if denominator == 0 {
            return 0.0;
        }
        counts.get(self.numerator) as f64 / denominator as f64
    }
}

pub fn ratio_names() -> impl Iterator<Item = &'static str> {
    RATIO_REGISTRY.iter().map(|spec| spec.name)
}

/// The registry ratios evaluated for one protein, stored in registry order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatioValues {
    values: [f64; RATIO_COUNT],
}

impl RatioValues {
    pub fn compute(counts: &ResidueCounts) -> Self {
        Self {
            values: RATIO_REGISTRY.map(|spec| spec.evaluate(counts)),
        }
    }

    /// Value of the ratio called `name` (e.g. `"E/Q"`), if it is in the registry.
    pub fn get(&self, name: &str) -> Option<f64> {
        RATIO_REGISTRY
            .iter()
            .position(|spec| spec.name == name)
            .map(|idx| self.values[idx])
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static RatioSpec, f64)> + '_ {
        RATIO_REGISTRY.iter().zip(self.values.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_is_in_fixed_order() {
        let names: Vec<_> = ratio_names().collect();
        assert_eq!(names, vec!["E/Q", "E/P", "Y/F", "D/N", "G/S"]);
    }

    #[test]
    fn evaluate_divides_numerator_by_denominator_count() {
        let counts = ResidueCounts::tally("EEEQQ");
        let spec = RATIO_REGISTRY[0];
        assert!((spec.evaluate(&counts) - 1.5).abs() < 1e-12);
    }

    #[test]
    fn evaluate_returns_zero_when_denominator_is_absent() {
        let counts = ResidueCounts::tally("EEEE");
        for spec in RATIO_REGISTRY {
            let value = spec.evaluate(&counts);
            assert_eq!(value, 0.0, "{} should be 0 without denominator", spec.name);
            assert!(value.is_finite());
        }
    }

    #[test]
    fn evaluate_returns_zero_when_numerator_is_absent() {
        let counts = ResidueCounts::tally("QQ");
        assert_eq!(RATIO_REGISTRY[0].evaluate(&counts), 0.0);
    }

    #[test]
    fn ratio_values_lookup_by_name() {
        let values = RatioValues::compute(&ResidueCounts::tally("GGGSDNN"));
        assert_eq!(values.get("G/S"), Some(3.0));
        assert_eq!(values.get("D/N"), Some(0.5));
        assert_eq!(values.get("K/R"), None);
        assert_eq!(values.as_slice().len(), RATIO_COUNT);
    }
}
