//! Error types for the ACL system.

use thiserror::Error;

/// The main error type for ACL operations.
#[derive(Error, Debug)]
pub enum Error {
    /// The referenced subject does not exist in the access graph.
    #[error("Subject '{0}' is not registered in the access graph")]
    UnresolvedSubject(String),

    /// The action path is empty or malformed.
    #[error("Invalid action path: {0}")]
    InvalidAction(String),

    /// Circular dependency detected in the subject graph.
    #[error("Circular dependency detected in subject graph involving '{0}'")]
    CircularDependency(String),

    /// Maximum subject graph depth exceeded.
    #[error("Maximum subject graph depth exceeded (max: {0})")]
    MaxDepthExceeded(usize),

    /// Storage operation failed.
    #[error("Storage operation failed: {0}")]
    Storage(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The theme alias is empty or otherwise unusable.
    #[error("Invalid theme: {0}")]
    InvalidTheme(String),

    /// No theme with the given alias could be located.
    #[error("Theme '{0}' not found")]
    ThemeNotFound(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// Result type alias for ACL operations.
pub type Result<T> = std::result::Result<T, Error>;
