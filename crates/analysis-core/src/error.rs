use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// Mandatory identity fields (symbol, current price) missing or invalid.
    /// Stops the analysis for that symbol; no partial result is produced.
    #[error("Data error: {0}")]
    DataError(String),

    #[error("Provider error: {0}")]
    ProviderError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}
