use crate::cli::OutputFormat;
use aacomp::engine::config::{DEFAULT_FREQUENCY_SECTION, DEFAULT_RATIO_SECTION};
use std::path::PathBuf;

pub struct DefaultsConfig {
    pub base_url: String,
    pub max_concurrent: usize,
    pub timeout_secs: u64,
    pub charts_enabled: bool,
    pub chart_width: u32,
    pub chart_height: u32,
    pub format: OutputFormat,
    pub frequency_section: String,
    pub ratio_section: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            base_url: "https://rest.uniprot.org".to_string(),
            max_concurrent: 4,
            timeout_secs: 30,
            charts_enabled: true,
            chart_width: 1000,
            chart_height: 500,
            format: OutputFormat::Xlsx,
            frequency_section: DEFAULT_FREQUENCY_SECTION.to_string(),
            ratio_section: DEFAULT_RATIO_SECTION.to_string(),
        }
    }
}

impl DefaultsConfig {
    /// Report path used when none is configured, named after `format`.
    pub fn output_for(format: OutputFormat) -> PathBuf {
        PathBuf::from(match format {
            OutputFormat::Xlsx => "UniProt_comparison_results_with_plots.xlsx",
            OutputFormat::Archive => "UniProt_comparison_results.tar.zst",
            OutputFormat::Dir => "UniProt_comparison_results",
        })
    }
}
