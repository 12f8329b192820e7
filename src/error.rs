use thiserror::Error;

/// Unified error type for revstamp operations
#[derive(Error, Debug)]
pub enum RevisionError {
    #[error("Environment error: {0}")]
    Environment(String),

    #[error("Format error: {0}")]
    Format(String),

    #[error("Value out of range: {0}")]
    Bounds(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results in revstamp
pub type Result<T> = std::result::Result<T, RevisionError>;

impl RevisionError {
    /// Create an environment error, e.g. a required VCS that is not available
    pub fn environment(msg: impl Into<String>) -> Self {
        RevisionError::Environment(msg.into())
    }

    /// Create a format error for a template, placeholder or resolved value
    pub fn format(msg: impl Into<String>) -> Self {
        RevisionError::Format(msg.into())
    }

    /// Create a bounds error for values that cannot be represented
    pub fn bounds(msg: impl Into<String>) -> Self {
        RevisionError::Bounds(msg.into())
    }

    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        RevisionError::Config(msg.into())
    }
}
