// SPDX-License-Identifier: MIT OR Apache-2.0
//! Errors surfaced by the methodology engine.

/// Errors the workflow engine returns.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    /// `validateSignature` was called without `context.transitionTo`.
    #[error("validateSignature called without a transitionTo in context")]
    MissingTransitionTo,
    /// The methodology document failed to parse or failed schema validation.
    #[error("invalid methodology document: {0}")]
    InvalidDocument(String),
}

impl WorkflowError {
    /// Stable error code, as named in the GitGov error taxonomy.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            WorkflowError::MissingTransitionTo => "MISSING_TRANSITION_TO",
            WorkflowError::InvalidDocument(_) => "INVALID_DATA",
        }
    }
}

/// Convenience alias used throughout this crate.
pub type Result<T> = std::result::Result<T, WorkflowError>;
