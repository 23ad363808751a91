//! Error types for table access, data loading and control dispatch.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashError {
    #[error("Column '{0}' not found")]
    ColumnNotFound(String),

    #[error("Failed to parse '{value}' as number in column '{column}' at row {row}")]
    NotNumeric {
        column: String,
        row: usize,
        value: String,
    },

    #[error("Column '{0}' has no numeric values")]
    EmptyColumn(String),

    #[error("Failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to read data source: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Control '{0}' is declared twice")]
    DuplicateControl(String),

    #[error("Control '{0}' was never declared")]
    UndeclaredControl(String),

    #[error("Output '{0}' already has a rule")]
    DuplicateOutput(String),

    #[error("Value {value} is not admissible for control '{control}'")]
    InadmissibleValue { control: String, value: String },
}

impl DashError {
    /// Errors caused by the caller's input rather than by the data or a handler.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            DashError::UndeclaredControl(_) | DashError::InadmissibleValue { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, DashError>;
