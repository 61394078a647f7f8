use super::config::ConfigError;
use super::report::ReportError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Initialization failed: {0}")]
    Initialization(String),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Report assembly failed: {0}")]
    Report(#[from] ReportError),

    #[error("Batch was cancelled before all retrievals resolved")]
    Cancelled,
}
