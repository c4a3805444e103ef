use crate::setting::RunId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TunerError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV Error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON Parsing Error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("Pattern generator failed on run {run_id}: {reason}")]
    Generator { run_id: RunId, reason: String },

    #[error("Duplicate affix in pattern set: '{0}'")]
    DuplicateAffix(String),

    #[error("Hyphenation mismatch: gold '{gold}' vs predicted '{predicted}'")]
    Misaligned { gold: String, predicted: String },

    #[error("Population is empty, no patterns to finalize")]
    EmptyPopulation,
}

pub type TunerResult<T> = Result<T, TunerError>;
