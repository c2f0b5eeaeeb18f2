//! # AppError
//!
//! Centralized error handling for ULTRAGOL.
//! Maps store and validation failures to actionable error types.

use thiserror::Error;

/// The primary error type for all domain and port operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    /// Document not found (e.g., Stream, Comment, Profile)
    #[error("{0} not found with ID {1}")]
    NotFound(String, String),

    /// User input rejected (e.g., bad link, empty teams field)
    #[error("validation error: {0}")]
    Validation(String),

    /// The caller is not signed in or does not own the resource
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The backing store's security rules rejected the request
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Transient store failure (network, connection pool, timeout)
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A snapshot document failed to decode into a domain model
    #[error("malformed document {id}: {reason}")]
    MalformedDocument { id: String, reason: String },

    /// Anything else (serialization bugs, poisoned state)
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn malformed(id: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::MalformedDocument {
            id: id.into(),
            reason: reason.to_string(),
        }
    }

    /// True for deletes racing another deleter; callers treat it as success.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(..))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(format!("json: {err}"))
    }
}

/// A specialized Result type for ULTRAGOL logic.
pub type Result<T> = std::result::Result<T, AppError>;
