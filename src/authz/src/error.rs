//! Error types for resource resolution

use thiserror::Error;

/// Resource resolution errors
#[derive(Debug, Error)]
pub enum AuthzError {
    /// Caller may not view the client that owns the resource server
    #[error("Forbidden: no view permission on client {client_id}")]
    Forbidden { client_id: String },

    /// A role policy carries a configuration that cannot be decoded
    #[error("Malformed configuration for role policy [{policy}]")]
    ConfigMalformed {
        policy: String,
        #[source]
        source: serde_json::Error,
    },

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Storage backend failure
    #[error("Store error: {0}")]
    Store(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthzError {
    /// Returns true when the error maps to a forbidden response
    pub fn is_forbidden(&self) -> bool {
        matches!(self, AuthzError::Forbidden { .. })
    }
}

/// Result type for resolution operations
pub type Result<T> = std::result::Result<T, AuthzError>;
