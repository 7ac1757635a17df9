// SPDX-License-Identifier: MIT OR Apache-2.0
//! Errors surfaced by the backlog adapter.

use gitgov_factory::InvalidData;
use gitgov_feedback::FeedbackError;
use gitgov_identity::IdentityError;
use gitgov_metrics::MetricsError;
use gitgov_record::RecordError;
use gitgov_store::StoreError;
use gitgov_workflow::WorkflowError;

/// Errors the backlog adapter returns.
#[derive(Debug, thiserror::Error)]
pub enum BacklogError {
    /// No task exists at the given id.
    #[error("task not found: {0}")]
    TaskNotFound(String),
    /// No cycle exists at the given id.
    #[error("cycle not found: {0}")]
    CycleNotFound(String),
    /// The methodology declares no rule reaching `to` from `from`.
    #[error("illegal transition: {from} -> {to}")]
    IllegalTransition {
        /// The task's current status.
        from: String,
        /// The attempted target status.
        to: String,
    },
    /// The signature gate for this transition was not satisfied.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// A custom rule for this transition did not pass.
    #[error("precondition failed: {0}")]
    PreconditionFailed(String),
    /// A bidirectional task/cycle link update's second phase failed; the
    /// first-written side was rolled back.
    #[error("link inconsistent: {0}")]
    LinkInconsistent(String),
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
    /// Feedback adapter failure, re-surfaced as-is.
    #[error(transparent)]
    Feedback(#[from] FeedbackError),
    /// Workflow methodology failure, re-surfaced as-is.
    #[error(transparent)]
    Workflow(#[from] WorkflowError),
    /// Metrics adapter failure, re-surfaced as-is.
    #[error(transparent)]
    Metrics(#[from] MetricsError),
}

impl BacklogError {
    /// Stable error code, as named in the GitGov error taxonomy.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            BacklogError::TaskNotFound(_) => "TASK_NOT_FOUND",
            BacklogError::CycleNotFound(_) => "CYCLE_NOT_FOUND",
            BacklogError::IllegalTransition { .. } => "ILLEGAL_TRANSITION",
            BacklogError::Unauthorized(_) => "UNAUTHORIZED",
            BacklogError::PreconditionFailed(_) => "PRECONDITION_FAILED",
            BacklogError::LinkInconsistent(_) => "LINK_INCONSISTENT",
            BacklogError::Store(e) => e.code(),
            BacklogError::Record(_) => "INVALID_DATA",
            BacklogError::InvalidData(_) => "INVALID_DATA",
            BacklogError::Identity(e) => e.code(),
            BacklogError::Feedback(e) => e.code(),
            BacklogError::Workflow(e) => e.code(),
            BacklogError::Metrics(e) => e.code(),
        }
    }
}

/// Convenience alias used throughout this crate.
pub type Result<T> = std::result::Result<T, BacklogError>;
