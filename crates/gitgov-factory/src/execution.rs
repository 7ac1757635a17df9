// SPDX-License-Identifier: MIT OR Apache-2.0
//! ExecutionRecord payload and factory. Always append-only.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{InvalidData, Result};
use crate::ids::{generate_execution_id, validate_timestamped_id};

/// The `ExecutionRecord` payload (spec.md §3): a single run of work against
/// a task, logged by whichever actor (human or agent) performed it.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ExecutionPayload {
    /// `{epochSeconds}-execution-{slug}`.
    pub id: String,
    /// The task this execution was performed against.
    pub task_id: String,
    /// The actor (human or agent) that performed the work.
    pub actor_id: String,
    /// Human-readable summary of what happened.
    pub summary: String,
    /// Optional typed metadata (tool calls, diffs, …).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

/// Caller-supplied fields for [`ExecutionFactory::create`].
#[derive(Debug, Clone, Default)]
pub struct ExecutionInput {
    /// Target task id (required).
    pub task_id: Option<String>,
    /// Acting actor id (required).
    pub actor_id: Option<String>,
    /// Summary text.
    pub summary: String,
    /// Metadata.
    pub metadata: Option<serde_json::Value>,
}

/// Factory for [`ExecutionPayload`].
pub struct ExecutionFactory;

impl ExecutionFactory {
    /// Build a complete, validated [`ExecutionPayload`].
    ///
    /// # Errors
    /// Returns [`InvalidData`] if `task_id` or `actor_id` is missing.
    pub fn create(input: ExecutionInput, now_epoch_seconds: i64) -> Result<ExecutionPayload> {
        let task_id = input
            .task_id
            .ok_or_else(|| InvalidData::new("taskId is required"))?;
        let actor_id = input
            .actor_id
            .ok_or_else(|| InvalidData::new("actorId is required"))?;
        let id = generate_execution_id(&input.summary, now_epoch_seconds);
        let payload = ExecutionPayload {
            id,
            task_id,
            actor_id,
            summary: input.summary,
            metadata: input.metadata,
        };
        Self::validate(&payload)?;
        Ok(payload)
    }

    /// Validate an already-complete payload.
    ///
    /// # Errors
    /// Returns [`InvalidData`] if `id` or `task_id` is malformed/empty.
    pub fn validate(payload: &ExecutionPayload) -> Result<()> {
        validate_timestamped_id(&payload.id, "execution")?;
        if payload.task_id.trim().is_empty() {
            return Err(InvalidData::new("taskId must not be empty"));
        }
        Ok(())
    }

    /// Validate and return a trusted [`ExecutionPayload`] loaded from storage.
    ///
    /// # Errors
    /// Returns [`InvalidData`] if the payload is malformed or invalid.
    pub fn load(value: serde_json::Value) -> Result<ExecutionPayload> {
        let payload: ExecutionPayload = serde_json::from_value(value)
            .map_err(|e| InvalidData::new(format!("malformed execution payload: {e}")))?;
        Self::validate(&payload)?;
        Ok(payload)
    }
}
