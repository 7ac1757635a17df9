// SPDX-License-Identifier: MIT OR Apache-2.0
//! Errors surfaced by the agent adapter.

use gitgov_factory::InvalidData;
use gitgov_identity::IdentityError;
use gitgov_record::RecordError;
use gitgov_store::StoreError;

/// Errors the agent adapter returns.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// No actor exists for this agent's id.
    #[error("actor not found: {0}")]
    ActorNotFound(String),
    /// The backing actor is not `type == "agent"`.
    #[error("actor is not an agent: {0}")]
    ActorNotAgent(String),
    /// No agent manifest exists at the given id.
    #[error("agent not found: {0}")]
    AgentNotFound(String),
    /// `update` attempted to change the agent's id.
    #[error("agent id is immutable")]
    AgentIdImmutable,
    /// No private key is stored for this agent (required; no mock fallback).
    #[error("private key not found for agent: {0}")]
    PrivateKeyNotFound(String),
    /// Underlying store I/O failure.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Record envelope construction failure.
    #[error(transparent)]
    Record(#[from] RecordError),
    /// Factory validation failure.
    #[error(transparent)]
    InvalidData(#[from] InvalidData),
    /// Identity lookup failure, re-surfaced as-is.
    #[error(transparent)]
    Identity(#[from] IdentityError),
}

impl AgentError {
    /// Stable error code, as named in the GitGov error taxonomy.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            AgentError::ActorNotFound(_) => "ACTOR_NOT_FOUND",
            AgentError::ActorNotAgent(_) => "ACTOR_NOT_AGENT",
            AgentError::AgentNotFound(_) => "RECORD_NOT_FOUND",
            AgentError::AgentIdImmutable => "INVALID_DATA",
            AgentError::PrivateKeyNotFound(_) => "PRIVATE_KEY_NOT_FOUND",
            AgentError::Store(e) => e.code(),
            AgentError::Record(_) => "INVALID_DATA",
            AgentError::InvalidData(_) => "INVALID_DATA",
            AgentError::Identity(e) => e.code(),
        }
    }
}

/// Convenience alias used throughout this crate.
pub type Result<T> = std::result::Result<T, AgentError>;
