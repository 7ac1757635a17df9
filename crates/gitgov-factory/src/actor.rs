// SPDX-License-Identifier: MIT OR Apache-2.0
//! ActorRecord payload, partial-input type, and factory.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{InvalidData, Result};
use crate::ids::{generate_actor_id, validate_actor_id};

/// Actor kind: a human operator or an autonomous agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ActorType {
    /// A human operator.
    Human,
    /// An autonomous agent.
    Agent,
}

impl ActorType {
    /// The string used as the leading segment of an actor id.
    #[must_use]
    pub fn as_id_prefix(self) -> &'static str {
        match self {
            ActorType::Human => "human",
            ActorType::Agent => "agent",
        }
    }
}

/// Actor lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ActorStatus {
    /// Actor is usable and its key is trusted.
    Active,
    /// Actor has been revoked (terminal; see `supersededBy`).
    Revoked,
}

/// The `ActorRecord` payload (spec.md §3).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ActorPayload {
    /// Identity key, matches `^(human|agent)(:[a-z0-9-]+)+$`.
    pub id: String,
    /// Human or agent.
    #[serde(rename = "type")]
    pub actor_type: ActorType,
    /// Display name for UIs.
    pub display_name: String,
    /// Base64 Ed25519 public key.
    pub public_key: String,
    /// Non-empty ordered set of role strings (`author`, `approver:product`, …).
    pub roles: Vec<String>,
    /// Current lifecycle status.
    pub status: ActorStatus,
    /// Set when this actor has been superseded by a rotated/successor actor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub superseded_by: Option<String>,
}

/// Caller-supplied fields for [`ActorFactory::create`]; everything else is
/// defaulted (`roles=["author"]`, `status=Active`).
#[derive(Debug, Clone, Default)]
pub struct ActorInput {
    /// Actor kind.
    pub actor_type: Option<ActorType>,
    /// Display name.
    pub display_name: Option<String>,
    /// Base64 public key, supplied by the caller (identity adapter
    /// generates the keypair and passes the public half through here).
    pub public_key: Option<String>,
    /// Roles; defaults to `["author"]` when empty.
    pub roles: Vec<String>,
}

/// Factory for [`ActorPayload`].
pub struct ActorFactory;

impl ActorFactory {
    /// Build a complete, validated [`ActorPayload`] from partial input.
    ///
    /// # Errors
    /// Returns [`InvalidData`] if `actor_type`, `display_name`, or
    /// `public_key` is missing.
    pub fn create(input: ActorInput) -> Result<ActorPayload> {
        let actor_type = input
            .actor_type
            .ok_or_else(|| InvalidData::new("actor type is required"))?;
        let display_name = input
            .display_name
            .ok_or_else(|| InvalidData::new("displayName is required"))?;
        if display_name.trim().is_empty() {
            return Err(InvalidData::new("displayName must not be empty"));
        }
        let public_key = input
            .public_key
            .ok_or_else(|| InvalidData::new("publicKey is required"))?;

        let id = generate_actor_id(actor_type.as_id_prefix(), &display_name);
        let roles = if input.roles.is_empty() {
            vec!["author".to_string()]
        } else {
            input.roles
        };

        let payload = ActorPayload {
            id,
            actor_type,
            display_name,
            public_key,
            roles,
            status: ActorStatus::Active,
            superseded_by: None,
        };
        Self::validate(&payload)?;
        Ok(payload)
    }

    /// Validate an already-complete payload (e.g. read back from storage).
    ///
    /// # Errors
    /// Returns [`InvalidData`] if any invariant is violated.
    pub fn validate(payload: &ActorPayload) -> Result<()> {
        validate_actor_id(&payload.id)?;
        if payload.display_name.trim().is_empty() {
            return Err(InvalidData::new("displayName must not be empty"));
        }
        if payload.public_key.trim().is_empty() {
            return Err(InvalidData::new("publicKey must not be empty"));
        }
        if payload.roles.is_empty() {
            return Err(InvalidData::new("roles must be non-empty"));
        }
        Ok(())
    }

    /// Validate and return a trusted [`ActorPayload`] loaded from storage.
    ///
    /// # Errors
    /// Returns [`InvalidData`] if the payload fails validation.
    pub fn load(value: serde_json::Value) -> Result<ActorPayload> {
        let payload: ActorPayload = serde_json::from_value(value)
            .map_err(|e| InvalidData::new(format!("malformed actor payload: {e}")))?;
        Self::validate(&payload)?;
        Ok(payload)
    }
}
