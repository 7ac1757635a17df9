// SPDX-License-Identifier: MIT OR Apache-2.0
//! The error type every store/key-provider/session-manager backend returns.

/// Errors surfaced by [`crate::RecordStore`], [`crate::KeyProvider`], and
/// [`crate::SessionManager`] implementations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// An underlying I/O operation failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// A record on disk failed to parse as JSON.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
    /// A record failed record-model validation (checksum/signature).
    #[error("invalid record: {0}")]
    Invalid(String),
}

impl StoreError {
    /// Stable error code, as named in the GitGov error taxonomy.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::Io(_) => "IO_ERROR",
            StoreError::Json(_) => "IO_ERROR",
            StoreError::Invalid(_) => "INVALID_DATA",
        }
    }
}

/// Convenience alias used throughout this crate.
pub type Result<T> = std::result::Result<T, StoreError>;
