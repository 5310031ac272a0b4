use crate::Side;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CompareError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("{side} content is blank")]
    BlankContent { side: Side },

    #[error("No identity column specified for {side}")]
    MissingIdentity { side: Side },

    #[error("Column '{column}' not found in {side} headers")]
    MissingColumn { side: Side, column: String },

    #[error("Mapped field '{field}' not found in {side} headers")]
    UnmappedField { side: Side, field: String },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("CSV error: {0}")]
    Csv(String),
}

impl CompareError {
    /// True for precondition failures caused by the caller's column setup.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            CompareError::Config(_)
                | CompareError::BlankContent { .. }
                | CompareError::MissingIdentity { .. }
                | CompareError::MissingColumn { .. }
                | CompareError::UnmappedField { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, CompareError>;
