use thiserror::Error;

/// Result type for deepq operations
pub type Result<T> = std::result::Result<T, DqnError>;

/// Main error type for the deepq crate
#[derive(Error, Debug)]
pub enum DqnError {
    /// Configuration rejected at construction time
    #[error("Invalid configuration '{name}': {reason}")]
    InvalidConfig {
        name: String,
        reason: String,
    },

    /// Invalid dimensions for operations
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        expected: String,
        actual: String,
    },

    /// Action index outside the approximator's output range
    #[error("Invalid action {action}: must be less than {max_actions}")]
    InvalidAction {
        action: usize,
        max_actions: usize,
    },

    /// Numerical computation errors
    #[error("Numerical error: {0}")]
    Numerical(String),

    /// IO errors (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<bincode::Error> for DqnError {
    fn from(err: bincode::Error) -> Self {
        DqnError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for DqnError {
    fn from(err: serde_json::Error) -> Self {
        DqnError::Serialization(err.to_string())
    }
}

// Helper functions for common error patterns
impl DqnError {
    pub fn invalid_config<S: Into<String>, R: Into<String>>(name: S, reason: R) -> Self {
        DqnError::InvalidConfig {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn dimension_mismatch<S: Into<String>, R: Into<String>>(expected: S, actual: R) -> Self {
        DqnError::DimensionMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}
