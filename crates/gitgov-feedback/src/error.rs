// SPDX-License-Identifier: MIT OR Apache-2.0
//! Errors surfaced by the feedback adapter.

use gitgov_factory::InvalidData;
use gitgov_identity::IdentityError;
use gitgov_record::RecordError;
use gitgov_store::StoreError;

/// Errors the feedback adapter returns.
#[derive(Debug, thiserror::Error)]
pub enum FeedbackError {
    /// No feedback exists at the given id.
    #[error("feedback not found: {0}")]
    FeedbackNotFound(String),
    /// `resolve` called on a feedback that already has a resolution record.
    #[error("feedback already resolved: {0}")]
    AlreadyResolved(String),
    /// `create` with `type == "assignment"` duplicating an existing open
    /// assignment for the same entity and assignee.
    #[error("duplicate assignment for entity {entity_id} / assignee {assignee}")]
    DuplicateAssignment {
        /// The targeted entity id.
        entity_id: String,
        /// The duplicated assignee.
        assignee: String,
    },
    /// Underlying store I/O failure.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Record envelope construction failure.
    #[error(transparent)]
    Record(#[from] RecordError),
    /// Factory validation failure.
    #[error(transparent)]
    InvalidData(#[from] InvalidData),
    /// Identity lookup/signing failure, re-surfaced as-is.
    #[error(transparent)]
    Identity(#[from] IdentityError),
}

impl FeedbackError {
    /// Stable error code, as named in the GitGov error taxonomy.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            FeedbackError::FeedbackNotFound(_) => "FEEDBACK_NOT_FOUND",
            FeedbackError::AlreadyResolved(_) => "ALREADY_RESOLVED",
            FeedbackError::DuplicateAssignment { .. } => "DUPLICATE_ASSIGNMENT",
            FeedbackError::Store(e) => e.code(),
            FeedbackError::Record(_) => "INVALID_DATA",
            FeedbackError::InvalidData(_) => "INVALID_DATA",
            FeedbackError::Identity(e) => e.code(),
        }
    }
}

/// Convenience alias used throughout this crate.
pub type Result<T> = std::result::Result<T, FeedbackError>;
