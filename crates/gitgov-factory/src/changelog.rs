// SPDX-License-Identifier: MIT OR Apache-2.0
//! ChangelogRecord payload and factory. Always append-only.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{InvalidData, Result};
use crate::ids::{generate_changelog_id, validate_timestamped_id};

/// The `ChangelogRecord` payload (spec.md §3): a durable note that one or
/// more tasks reached a notable milestone (typically completion).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ChangelogPayload {
    /// `{epochSeconds}-changelog-{slug}`.
    pub id: String,
    /// Tasks this changelog entry covers.
    pub related_tasks: Vec<String>,
    /// Human-readable summary of the change.
    pub summary: String,
    /// Optional typed metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

/// Caller-supplied fields for [`ChangelogFactory::create`].
#[derive(Debug, Clone, Default)]
pub struct ChangelogInput {
    /// Tasks this changelog covers (required, non-empty).
    pub related_tasks: Vec<String>,
    /// Summary text.
    pub summary: String,
    /// Metadata.
    pub metadata: Option<serde_json::Value>,
}

/// Factory for [`ChangelogPayload`].
pub struct ChangelogFactory;

impl ChangelogFactory {
    /// Build a complete, validated [`ChangelogPayload`].
    ///
    /// # Errors
    /// Returns [`InvalidData`] if `related_tasks` is empty.
    pub fn create(input: ChangelogInput, now_epoch_seconds: i64) -> Result<ChangelogPayload> {
        if input.related_tasks.is_empty() {
            return Err(InvalidData::new("relatedTasks must be non-empty"));
        }
        let id = generate_changelog_id(&input.summary, now_epoch_seconds);
        let payload = ChangelogPayload {
            id,
            related_tasks: input.related_tasks,
            summary: input.summary,
            metadata: input.metadata,
        };
        Self::validate(&payload)?;
        Ok(payload)
    }

    /// Validate an already-complete payload.
    ///
    /// # Errors
    /// Returns [`InvalidData`] if `id` is malformed or `related_tasks` is empty.
    pub fn validate(payload: &ChangelogPayload) -> Result<()> {
        validate_timestamped_id(&payload.id, "changelog")?;
        if payload.related_tasks.is_empty() {
            return Err(InvalidData::new("relatedTasks must be non-empty"));
        }
        Ok(())
    }

    /// Validate and return a trusted [`ChangelogPayload`] loaded from storage.
    ///
    /// # Errors
    /// Returns [`InvalidData`] if the payload is malformed or invalid.
    pub fn load(value: serde_json::Value) -> Result<ChangelogPayload> {
        let payload: ChangelogPayload = serde_json::from_value(value)
            .map_err(|e| InvalidData::new(format!("malformed changelog payload: {e}")))?;
        Self::validate(&payload)?;
        Ok(payload)
    }
}
