// SPDX-License-Identifier: MIT OR Apache-2.0
//! CycleRecord payload and factory.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{InvalidData, Result};
use crate::ids::{generate_cycle_id, validate_timestamped_id};

/// Cycle lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum CycleStatus {
    /// Being planned, not yet active.
    Planning,
    /// In progress.
    Active,
    /// All planned work finished.
    Completed,
    /// Archived (terminal).
    Archived,
}

/// The `CycleRecord` payload (spec.md §3).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CyclePayload {
    /// `{epochSeconds}-cycle-{slug}`.
    pub id: String,
    /// Short title.
    pub title: String,
    /// Current lifecycle state.
    pub status: CycleStatus,
    /// Forward references to tasks included in this cycle.
    #[serde(default)]
    pub task_ids: Vec<String>,
    /// Child cycle ids (for epic-style nesting).
    #[serde(default)]
    pub child_cycle_ids: Vec<String>,
    /// Free-form tags.
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Caller-supplied fields for [`CycleFactory::create`].
#[derive(Debug, Clone, Default)]
pub struct CycleInput {
    /// Title (required, non-empty).
    pub title: Option<String>,
    /// Tags.
    pub tags: Vec<String>,
}

/// Factory for [`CyclePayload`].
pub struct CycleFactory;

impl CycleFactory {
    /// Build a complete, validated [`CyclePayload`] with `status=Planning`.
    ///
    /// # Errors
    /// Returns [`InvalidData`] if `title` is missing or empty.
    pub fn create(input: CycleInput, now_epoch_seconds: i64) -> Result<CyclePayload> {
        let title = input
            .title
            .ok_or_else(|| InvalidData::new("title is required"))?;
        if title.trim().is_empty() {
            return Err(InvalidData::new("title must not be empty"));
        }
        let id = generate_cycle_id(&title, now_epoch_seconds);
        let payload = CyclePayload {
            id,
            title,
            status: CycleStatus::Planning,
            task_ids: vec![],
            child_cycle_ids: vec![],
            tags: input.tags,
        };
        Self::validate(&payload)?;
        Ok(payload)
    }

    /// Validate an already-complete payload.
    ///
    /// # Errors
    /// Returns [`InvalidData`] if `id` is malformed or `title` is empty.
    pub fn validate(payload: &CyclePayload) -> Result<()> {
        validate_timestamped_id(&payload.id, "cycle")?;
        if payload.title.trim().is_empty() {
            return Err(InvalidData::new("title must not be empty"));
        }
        Ok(())
    }

    /// Validate and return a trusted [`CyclePayload`] loaded from storage.
    ///
    /// # Errors
    /// Returns [`InvalidData`] if the payload is malformed or invalid.
    pub fn load(value: serde_json::Value) -> Result<CyclePayload> {
        let payload: CyclePayload = serde_json::from_value(value)
            .map_err(|e| InvalidData::new(format!("malformed cycle payload: {e}")))?;
        Self::validate(&payload)?;
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_sets_planning_status() {
        let input = CycleInput {
            title: Some("Sprint 12".into()),
            tags: vec![],
        };
        let p = CycleFactory::create(input, 1_700_000_000).unwrap();
        assert_eq!(p.status, CycleStatus::Planning);
        assert_eq!(p.id, "1700000000-cycle-sprint-12");
    }

    #[test]
    fn create_rejects_missing_title() {
        let input = CycleInput {
            title: None,
            tags: vec![],
        };
        assert!(CycleFactory::create(input, 1).is_err());
    }
}
