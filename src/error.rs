// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types.

/// Application error type shared by the stores and the engine.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Remote store error: {0}")]
    Remote(String),

    #[error("Recurrence rule error: {0}")]
    Recurrence(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Local store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Whether this error is expected to clear on a later sync cycle.
    ///
    /// Transient remote failures are logged and deferred, never surfaced
    /// to the caller synchronously.
    pub fn is_transient(&self) -> bool {
        matches!(self, AppError::Remote(_) | AppError::Io(_))
    }
}

/// Result type alias for engine and store operations.
pub type Result<T> = std::result::Result<T, AppError>;
