//! Unified error type for the basket service.
//!
//! The four request-facing variants (`NotFound`, `Forbidden`, `Unauthorized`,
//! `Validation`) map one-to-one onto HTTP status codes in [`crate::api`]. Everything
//! else is an internal failure and is reported to clients without detail.

use thiserror::Error;

/// Crate-wide error type
#[derive(Debug, Error)]
pub enum Error {
    /// The requested resource id does not resolve
    #[error("{resource} {id} not found")]
    NotFound {
        /// Kind of resource that was looked up ("basket", "item", "user")
        resource: &'static str,
        /// The id (or username) that failed to resolve
        id: String,
    },

    /// Authenticated, but not permitted to perform the action
    #[error("Forbidden: {message}")]
    Forbidden {
        /// What was refused
        message: String,
    },

    /// Missing, malformed, or otherwise invalid credentials
    #[error("Unauthorized: {message}")]
    Unauthorized {
        /// Why the credentials were rejected
        message: String,
    },

    /// Malformed or conflicting input
    #[error("Invalid {field}: {message}")]
    Validation {
        /// Offending input field
        field: &'static str,
        /// Human-readable reason
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// Database operation error
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Password hashing failed
    #[error("Password hashing error: {message}")]
    PasswordHash {
        /// Error message from the hasher
        message: String,
    },

    /// Token issuance failed
    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Environment variable error
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),
}

impl Error {
    /// Shorthand for a [`Error::NotFound`] keyed by a numeric id.
    pub fn not_found(resource: &'static str, id: i64) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    /// Shorthand for a [`Error::Validation`].
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// Shorthand for a [`Error::Unauthorized`].
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
