use thiserror::Error;

/// Errors from the compliance engine.
///
/// Missing or malformed result data is never an error; it surfaces as `"-"`
/// placeholders and absent charts. These variants cover caller bugs only.
#[derive(Debug, Error)]
pub enum LabError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("contract violation: {0}")]
    ContractViolation(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for LabError {
    fn from(err: serde_json::Error) -> Self {
        LabError::Serialization(err.to_string())
    }
}

pub type LabResult<T> = Result<T, LabError>;
