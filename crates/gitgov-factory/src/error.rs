// SPDX-License-Identifier: MIT OR Apache-2.0
//! The single error kind every factory/validator in this crate returns.

/// Schema or argument validation failure.
///
/// This is the `INVALID_DATA` entry of the GitGov error taxonomy: every
/// factory constructor and `load` function returns this (never panics) when
/// a required field is missing or a constraint is violated.
#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid data: {message}")]
pub struct InvalidData {
    /// Human-readable description of what was wrong.
    pub message: String,
}

impl InvalidData {
    /// Build an [`InvalidData`] error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Stable error code, as named in the GitGov error taxonomy.
    #[must_use]
    pub fn code(&self) -> &'static str {
        "INVALID_DATA"
    }
}

/// Convenience alias used throughout this crate.
pub type Result<T> = std::result::Result<T, InvalidData>;
