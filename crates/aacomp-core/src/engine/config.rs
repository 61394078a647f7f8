use thiserror::Error;

pub const DEFAULT_FREQUENCY_SECTION: &str = "amino-acid-frequencies";
pub const DEFAULT_RATIO_SECTION: &str = "specific-ratios";

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Invalid value for '{parameter}': {reason}")]
    InvalidValue {
        parameter: &'static str,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportNaming {
    pub frequency_section: String,
    pub ratio_section: String,
}

impl Default for ReportNaming {
    fn default() -> Self {
        Self {
            frequency_section: DEFAULT_FREQUENCY_SECTION.to_string(),
            ratio_section: DEFAULT_RATIO_SECTION.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonConfig {
    /// Upper bound on retrievals running at the same time.
    pub max_concurrent_fetches: usize,
    pub naming: ReportNaming,
}

#[derive(Default)]
pub struct ComparisonConfigBuilder {
    max_concurrent_fetches: Option<usize>,
    frequency_section: Option<String>,
    ratio_section: Option<String>,
}

impl ComparisonConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_concurrent_fetches(mut self, n: usize) -> Self {
        self.max_concurrent_fetches = Some(n);
        self
    }
    pub fn frequency_section(mut self, name: impl Into<String>) -> Self {
        self.frequency_section = Some(name.into());
        self
    }
    pub fn ratio_section(mut self, name: impl Into<String>) -> Self {
        self.ratio_section = Some(name.into());
        self
    }

    pub fn build(self) -> Result<ComparisonConfig, ConfigError> {
        let max_concurrent_fetches = self
            .max_concurrent_fetches
            .ok_or(ConfigError::MissingParameter("max_concurrent_fetches"))?;
        if max_concurrent_fetches == 0 {
            return Err(ConfigError::InvalidValue {
                parameter: "max_concurrent_fetches",
                reason: "must be at least 1".to_string(),
            });
        }

        let defaults = ReportNaming::default();
        let naming = ReportNaming {
            frequency_section: self
                .frequency_section
                .unwrap_or(defaults.frequency_section),
            ratio_section: self.ratio_section.unwrap_or(defaults.ratio_section),
        };
        for (parameter, name) in [
            ("frequency_section", &naming.frequency_section),
            ("ratio_section", &naming.ratio_section),
        ] {
            if name.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    parameter,
                    reason: "section name cannot be empty".to_string(),
                });
            }
        }
        if naming.frequency_section == naming.ratio_section {
            return Err(ConfigError::InvalidValue {
                parameter: "ratio_section",
                reason: format!(
                    "must differ from the frequency section name '{}'",
                    naming.frequency_section
                ),
            });
        }

        Ok(ComparisonConfig {
            max_concurrent_fetches,
            naming,
        })
    }
}
