//! Error types shared across the PhotoGuard crates

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::verdict::Stage;

/// Result alias used by every fallible PhotoGuard operation
pub type PhotoGuardResult<T> = Result<T, PhotoGuardError>;

/// Errors raised while handling a moderation request
///
/// Classification has no variant here: the engine is total over any label
/// list, so a failure inside it is a bug rather than a recoverable condition.
#[derive(Debug, Error)]
pub enum PhotoGuardError {
    /// Malformed request body
    #[error("Validation error: {0}")]
    Validation(String),

    /// Missing or wrong credential
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Object store write failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Detection call failed or returned an unusable shape
    #[error("Detection error: {0}")]
    Detection(String),

    /// The request deadline elapsed while `stage` was in flight
    #[error("Deadline of {deadline_ms}ms exceeded during {stage} stage")]
    Timeout { stage: Stage, deadline_ms: u64 },

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl PhotoGuardError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Auth(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    pub fn detection(msg: impl Into<String>) -> Self {
        Self::Detection(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Error kind as reported to callers
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) | Self::Config(_) => ErrorKind::Validation,
            Self::Auth(_) => ErrorKind::Auth,
            Self::Storage(_) => ErrorKind::Storage,
            Self::Detection(_) => ErrorKind::Detection,
            Self::Timeout { .. } => ErrorKind::Timeout,
        }
    }

    /// Pipeline stage this error belongs to
    pub fn stage(&self) -> Stage {
        match self {
            Self::Validation(_) | Self::Config(_) => Stage::Request,
            Self::Auth(_) => Stage::Auth,
            Self::Storage(_) => Stage::Storage,
            Self::Detection(_) => Stage::Detection,
            Self::Timeout { stage, .. } => *stage,
        }
    }

    /// Message that is safe to show to the end user.
    ///
    /// Underlying provider text stays in the logs; only the request-level
    /// validation detail is echoed back since it describes the caller's input.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(msg) => format!("Invalid request: {}", msg),
            Self::Config(_) => "The service is misconfigured. Please try again later.".to_string(),
            Self::Auth(_) => "Invalid or missing API key.".to_string(),
            Self::Storage(_) => "The photo could not be stored. Please try again.".to_string(),
            Self::Detection(_) => "The photo could not be analyzed. Please try again.".to_string(),
            Self::Timeout { stage, .. } => format!(
                "The request timed out during the {} stage. Please try again.",
                stage
            ),
        }
    }
}

/// Failure category, distinct from the stage in which it happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    Validation,
    Auth,
    Storage,
    Detection,
    Timeout,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation => write!(f, "validation"),
            Self::Auth => write!(f, "auth"),
            Self::Storage => write!(f, "storage"),
            Self::Detection => write!(f, "detection"),
            Self::Timeout => write!(f, "timeout"),
        }
    }
}
