// SPDX-License-Identifier: MIT OR Apache-2.0
//! Errors surfaced by the identity adapter.

use gitgov_factory::InvalidData;
use gitgov_record::{RecordError, VerifyError};
use gitgov_store::StoreError;

/// Errors the identity adapter returns.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    /// No actor exists at the given id.
    #[error("actor not found: {0}")]
    ActorNotFound(String),
    /// The actor exists but is not of `type == "agent"`.
    #[error("actor is not an agent: {0}")]
    ActorNotAgent(String),
    /// `revokeActor` called on an already-revoked actor.
    #[error("actor already revoked: {0}")]
    ActorAlreadyRevoked(String),
    /// `getCurrentActor` found no session actor and no active actor to
    /// fall back to.
    #[error("no active actor")]
    NoActiveActor,
    /// Underlying store/key-provider/session I/O failure.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Record envelope construction or checksum failure.
    #[error(transparent)]
    Record(#[from] RecordError),
    /// Signature or checksum verification failure.
    #[error(transparent)]
    Verify(#[from] VerifyError),
    /// Factory validation failure.
    #[error(transparent)]
    InvalidData(#[from] InvalidData),
}

impl IdentityError {
    /// Stable error code, as named in the GitGov error taxonomy.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            IdentityError::ActorNotFound(_) => "ACTOR_NOT_FOUND",
            IdentityError::ActorNotAgent(_) => "ACTOR_NOT_AGENT",
            IdentityError::ActorAlreadyRevoked(_) => "ACTOR_ALREADY_REVOKED",
            IdentityError::NoActiveActor => "NO_ACTIVE_ACTOR",
            IdentityError::Store(e) => e.code(),
            IdentityError::Record(_) => "INVALID_DATA",
            IdentityError::Verify(e) => e.code(),
            IdentityError::InvalidData(_) => "INVALID_DATA",
        }
    }
}

/// Convenience alias used throughout this crate.
pub type Result<T> = std::result::Result<T, IdentityError>;
