// SPDX-License-Identifier: MIT OR Apache-2.0
//! Errors surfaced while assembling or driving a [`crate::GitGov`] facade.

use gitgov_agent::AgentError;
use gitgov_backlog::BacklogError;
use gitgov_config::ConfigError;
use gitgov_feedback::FeedbackError;
use gitgov_identity::IdentityError;
use gitgov_metrics::MetricsError;
use gitgov_store::StoreError;
use gitgov_workflow::WorkflowError;

/// Errors the top-level facade returns, aggregating every adapter's own
/// error type behind one `.code()` so callers can match without knowing
/// which adapter a failure originated in.
#[derive(Debug, thiserror::Error)]
pub enum GitGovError {
    /// Configuration failed to load or validate.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Record store I/O failure during wiring (e.g. creating `.gitgov/`).
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Identity adapter failure.
    #[error(transparent)]
    Identity(#[from] IdentityError),
    /// Agent adapter failure.
    #[error(transparent)]
    Agent(#[from] AgentError),
    /// Feedback adapter failure.
    #[error(transparent)]
    Feedback(#[from] FeedbackError),
    /// Workflow methodology failure.
    #[error(transparent)]
    Workflow(#[from] WorkflowError),
    /// Backlog adapter failure.
    #[error(transparent)]
    Backlog(#[from] BacklogError),
    /// Metrics adapter failure.
    #[error(transparent)]
    Metrics(#[from] MetricsError),
}

impl GitGovError {
    /// Stable error code, delegating to the originating adapter's own
    /// taxonomy entry.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            GitGovError::Config(e) => e.code(),
            GitGovError::Store(e) => e.code(),
            GitGovError::Identity(e) => e.code(),
            GitGovError::Agent(e) => e.code(),
            GitGovError::Feedback(e) => e.code(),
            GitGovError::Workflow(e) => e.code(),
            GitGovError::Backlog(e) => e.code(),
            GitGovError::Metrics(e) => e.code(),
        }
    }
}

/// Convenience alias used throughout this crate.
pub type Result<T> = std::result::Result<T, GitGovError>;
