// SPDX-License-Identifier: MIT OR Apache-2.0
//! Errors surfaced by the metrics adapter.

use gitgov_factory::InvalidData;
use gitgov_store::StoreError;

/// Errors the metrics adapter returns.
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    /// `getTaskHealth` called with an id not present in the task store.
    #[error("task not found: {0}")]
    TaskNotFound(String),
    /// Argument validation failure (e.g. a non-array input).
    #[error(transparent)]
    InvalidData(#[from] InvalidData),
    /// Underlying store I/O failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl MetricsError {
    /// Stable error code, as named in the GitGov error taxonomy.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            MetricsError::TaskNotFound(_) => "TASK_NOT_FOUND",
            MetricsError::InvalidData(_) => "INVALID_DATA",
            MetricsError::Store(e) => e.code(),
        }
    }
}

/// Convenience alias used throughout this crate.
pub type Result<T> = std::result::Result<T, MetricsError>;
