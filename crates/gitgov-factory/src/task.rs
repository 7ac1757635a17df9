// SPDX-License-Identifier: MIT OR Apache-2.0
//! TaskRecord payload and factory.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{InvalidData, Result};
use crate::ids::{generate_task_id, validate_timestamped_id};

/// Task lifecycle status, governed by the workflow methodology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Newly created, not yet submitted for review.
    Draft,
    /// Submitted and awaiting approval.
    Review,
    /// Approved and ready to be picked up.
    Ready,
    /// Currently being worked.
    Active,
    /// Completed.
    Done,
    /// Paused, typically due to an open blocking feedback.
    Paused,
    /// Archived (terminal, typically after a changelog).
    Archived,
    /// Discarded (terminal).
    Discarded,
}

/// The `TaskRecord` payload (spec.md §3).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TaskPayload {
    /// `{epochSeconds}-task-{slug}`.
    pub id: String,
    /// Short title.
    pub title: String,
    /// Longer description.
    #[serde(default)]
    pub description: String,
    /// Current lifecycle state.
    pub status: TaskStatus,
    /// Free-form priority label (e.g. `"high"`).
    #[serde(default)]
    pub priority: String,
    /// Free-form tags (e.g. `"epic:foo"`).
    #[serde(default)]
    pub tags: Vec<String>,
    /// External references (URLs, ticket ids, …).
    #[serde(default)]
    pub references: Vec<String>,
    /// Back-references to cycles that include this task.
    #[serde(default)]
    pub cycle_ids: Vec<String>,
    /// Optional free-text notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Optional typed metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

/// Caller-supplied fields for [`TaskFactory::create`].
#[derive(Debug, Clone, Default)]
pub struct TaskInput {
    /// Title (required, non-empty).
    pub title: Option<String>,
    /// Description.
    pub description: String,
    /// Priority label.
    pub priority: String,
    /// Tags.
    pub tags: Vec<String>,
    /// References.
    pub references: Vec<String>,
    /// Notes.
    pub notes: Option<String>,
    /// Metadata.
    pub metadata: Option<serde_json::Value>,
}

/// Factory for [`TaskPayload`].
pub struct TaskFactory;

impl TaskFactory {
    /// Build a complete, validated [`TaskPayload`] with `status=Draft`.
    ///
    /// # Errors
    /// Returns [`InvalidData`] if `title` is missing or empty.
    pub fn create(input: TaskInput, now_epoch_seconds: i64) -> Result<TaskPayload> {
        let title = input
            .title
            .ok_or_else(|| InvalidData::new("title is required"))?;
        if title.trim().is_empty() {
            return Err(InvalidData::new("title must not be empty"));
        }
        let id = generate_task_id(&title, now_epoch_seconds);
        let payload = TaskPayload {
            id,
            title,
            description: input.description,
            status: TaskStatus::Draft,
            priority: input.priority,
            tags: input.tags,
            references: input.references,
            cycle_ids: vec![],
            notes: input.notes,
            metadata: input.metadata,
        };
        Self::validate(&payload)?;
        Ok(payload)
    }

    /// Validate an already-complete payload.
    ///
    /// # Errors
    /// Returns [`InvalidData`] if `id` is malformed or `title` is empty.
    pub fn validate(payload: &TaskPayload) -> Result<()> {
        validate_timestamped_id(&payload.id, "task")?;
        if payload.title.trim().is_empty() {
            return Err(InvalidData::new("title must not be empty"));
        }
        Ok(())
    }

    /// Validate and return a trusted [`TaskPayload`] loaded from storage.
    ///
    /// # Errors
    /// Returns [`InvalidData`] if the payload is malformed or invalid.
    pub fn load(value: serde_json::Value) -> Result<TaskPayload> {
        let payload: TaskPayload = serde_json::from_value(value)
            .map_err(|e| InvalidData::new(format!("malformed task payload: {e}")))?;
        Self::validate(&payload)?;
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_sets_draft_status_and_id() {
        let input = TaskInput {
            title: Some("Fix the login bug".into()),
            ..Default::default()
        };
        let p = TaskFactory::create(input, 1_700_000_000).unwrap();
        assert_eq!(p.status, TaskStatus::Draft);
        assert_eq!(p.id, "1700000000-task-fix-the-login-bug");
        assert!(p.cycle_ids.is_empty());
    }

    #[test]
    fn create_rejects_empty_title() {
        let input = TaskInput {
            title: Some("   ".into()),
            ..Default::default()
        };
        assert!(TaskFactory::create(input, 1).is_err());
    }

    #[test]
    fn load_round_trips_create() {
        let input = TaskInput {
            title: Some("Ship the feature".into()),
            ..Default::default()
        };
        let created = TaskFactory::create(input, 1_700_000_100).unwrap();
        let value = serde_json::to_value(&created).unwrap();
        let loaded = TaskFactory::load(value).unwrap();
        assert_eq!(loaded.id, created.id);
    }
}
