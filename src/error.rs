use thiserror::Error;

#[derive(Error, Debug)]
pub enum QuarterlyDataError {
    #[error("Invalid quarter label '{label}' on row {row}: expected format Q<1-4>-YYYY (e.g. Q1-2023)")]
    InvalidQuarterLabel { row: usize, label: String },

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, QuarterlyDataError>;
