// SPDX-License-Identifier: MIT OR Apache-2.0
//! FeedbackRecord payload and factory.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{InvalidData, Result};
use crate::ids::{generate_feedback_id, validate_timestamped_id};

/// What kind of entity a feedback targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    /// Targets a task.
    Task,
    /// Targets an execution.
    Execution,
    /// Targets a changelog.
    Changelog,
    /// Targets another feedback (used for resolution records).
    Feedback,
}

/// Feedback semantic type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackType {
    /// Forces the target task to pause while open.
    Blocking,
    /// Non-blocking suggestion.
    Suggestion,
    /// A question requiring a reply.
    Question,
    /// Assigns an actor to the target.
    Assignment,
    /// Records an approval.
    Approval,
    /// Records a rejection.
    Rejection,
    /// Requests or provides clarification.
    Clarification,
}

/// Feedback lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackStatus {
    /// Still outstanding.
    Open,
    /// Resolved (see `resolvesFeedbackId` on the resolution record).
    Resolved,
}

/// The `FeedbackRecord` payload (spec.md §3). Immutable after creation
/// except for the `open -> resolved` transition, which is modeled as a new
/// record (see `gitgov-feedback::FeedbackAdapter::resolve`), never a
/// mutation of this struct in place.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FeedbackPayload {
    /// `{epochSeconds}-feedback-{slug}`.
    pub id: String,
    /// Kind of entity this feedback targets.
    pub entity_type: EntityType,
    /// Id of the targeted entity.
    pub entity_id: String,
    /// Semantic type of this feedback.
    #[serde(rename = "type")]
    pub feedback_type: FeedbackType,
    /// Current status.
    pub status: FeedbackStatus,
    /// Free-text content/body.
    pub content: String,
    /// Assignee actor id, relevant for `type=="assignment"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    /// Set on resolution records: the id of the feedback being resolved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolves_feedback_id: Option<String>,
}

/// Caller-supplied fields for [`FeedbackFactory::create`].
#[derive(Debug, Clone, Default)]
pub struct FeedbackInput {
    /// Targeted entity kind.
    pub entity_type: Option<EntityType>,
    /// Targeted entity id (required).
    pub entity_id: Option<String>,
    /// Feedback semantic type.
    pub feedback_type: Option<FeedbackType>,
    /// Body text.
    pub content: String,
    /// Assignee, for `type=="assignment"`.
    pub assignee: Option<String>,
    /// Set only when constructing a resolution record.
    pub resolves_feedback_id: Option<String>,
}

/// Factory for [`FeedbackPayload`].
pub struct FeedbackFactory;

impl FeedbackFactory {
    /// Build a complete, validated [`FeedbackPayload`] with `status=Open`.
    ///
    /// # Errors
    /// Returns [`InvalidData`] if `entity_id` or `feedback_type`/`entity_type`
    /// is missing.
    pub fn create(input: FeedbackInput, now_epoch_seconds: i64) -> Result<FeedbackPayload> {
        let entity_type = input
            .entity_type
            .ok_or_else(|| InvalidData::new("entityType is required"))?;
        let entity_id = input
            .entity_id
            .ok_or_else(|| InvalidData::new("entityId is required"))?;
        if entity_id.trim().is_empty() {
            return Err(InvalidData::new("entityId must not be empty"));
        }
        let feedback_type = input
            .feedback_type
            .ok_or_else(|| InvalidData::new("type is required"))?;

        let id = generate_feedback_id(&input.content, now_epoch_seconds);
        let payload = FeedbackPayload {
            id,
            entity_type,
            entity_id,
            feedback_type,
            status: FeedbackStatus::Open,
            content: input.content,
            assignee: input.assignee,
            resolves_feedback_id: input.resolves_feedback_id,
        };
        Self::validate(&payload)?;
        Ok(payload)
    }

    /// Validate an already-complete payload.
    ///
    /// # Errors
    /// Returns [`InvalidData`] if `id` is malformed or `entity_id` is empty.
    pub fn validate(payload: &FeedbackPayload) -> Result<()> {
        validate_timestamped_id(&payload.id, "feedback")?;
        if payload.entity_id.trim().is_empty() {
            return Err(InvalidData::new("entityId must not be empty"));
        }
        Ok(())
    }

    /// Validate and return a trusted [`FeedbackPayload`] loaded from storage.
    ///
    /// # Errors
    /// Returns [`InvalidData`] if the payload is malformed or invalid.
    pub fn load(value: serde_json::Value) -> Result<FeedbackPayload> {
        let payload: FeedbackPayload = serde_json::from_value(value)
            .map_err(|e| InvalidData::new(format!("malformed feedback payload: {e}")))?;
        Self::validate(&payload)?;
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> FeedbackInput {
        FeedbackInput {
            entity_type: Some(EntityType::Task),
            entity_id: Some("1700000000-task-x".into()),
            feedback_type: Some(FeedbackType::Blocking),
            content: "security issue".into(),
            assignee: None,
            resolves_feedback_id: None,
        }
    }

    #[test]
    fn create_sets_open_status() {
        let p = FeedbackFactory::create(input(), 1_700_000_100).unwrap();
        assert_eq!(p.status, FeedbackStatus::Open);
        assert!(p.id.starts_with("1700000100-feedback-"));
    }

    #[test]
    fn create_rejects_missing_entity_id() {
        let mut i = input();
        i.entity_id = None;
        assert!(FeedbackFactory::create(i, 1).is_err());
    }
}
