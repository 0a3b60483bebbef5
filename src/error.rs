use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Pushgateway returned status {status}: {body}")]
    Pushgateway { status: u16, body: String },

    #[error("Configuration error: {0}")]
    Config(String),

    /// A stage saw data it can only see when the stage sequence is wrong.
    #[error("Pipeline defect in stage '{stage}': {message}")]
    Defect { stage: &'static str, message: String },

    #[error("Data quality check failed: {summary}")]
    QualityGate { summary: String },
}

pub type Result<T> = std::result::Result<T, EtlError>;
