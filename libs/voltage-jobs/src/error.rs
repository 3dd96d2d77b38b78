//! Job Rule Engine Error Types

use thiserror::Error;

/// Result type for job rule operations
pub type Result<T> = std::result::Result<T, RuleError>;

/// Job rule engine errors
#[derive(Debug, Error)]
pub enum RuleError {
    /// Rule text is neither JSON nor YAML
    #[error("rule input is not valid JSON/YAML: {0}")]
    Parse(String),

    /// Rule input has the wrong structure
    #[error("rule input must be a list, mapping, or parseable string: {0}")]
    InvalidInput(String),

    /// Job name has no registered callable
    #[error("Job not found: {0}")]
    JobNotFound(String),

    /// Argument rejected while binding a job call
    #[error("Invalid argument '{arg}' for job '{job}': {reason}")]
    InvalidArgument {
        job: String,
        arg: String,
        reason: String,
    },

    /// Required argument absent from the job call
    #[error("Missing argument '{arg}' for job '{job}'")]
    MissingArgument { job: String, arg: String },

    /// Error raised by a condition or action, passed through untouched
    #[error(transparent)]
    Callable(#[from] anyhow::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl RuleError {
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn job_not_found(name: impl Into<String>) -> Self {
        Self::JobNotFound(name.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

impl From<serde_json::Error> for RuleError {
    fn from(err: serde_json::Error) -> Self {
        RuleError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for RuleError {
    fn from(err: serde_yaml::Error) -> Self {
        RuleError::Serialization(err.to_string())
    }
}

impl From<figment::Error> for RuleError {
    fn from(err: figment::Error) -> Self {
        RuleError::Config(err.to_string())
    }
}
