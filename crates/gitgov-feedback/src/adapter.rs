// SPDX-License-Identifier: MIT OR Apache-2.0
//! The feedback adapter: creation with a duplicate-assignment guard, and
//! resolution modeled as a new record rather than a mutation.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use gitgov_eventbus::{event_types, Event, EventBus};
use gitgov_factory::{EntityType, FeedbackFactory, FeedbackInput, FeedbackPayload, FeedbackStatus, FeedbackType};
use gitgov_identity::IdentityAdapter;
use gitgov_record::{apply_signature, checksum, Kind, Signature, UnsignedRecord};
use gitgov_store::RecordStore;
use serde_json::json;

use crate::error::{FeedbackError, Result};

/// Reserved actor id for scheduler-driven automation (e.g. the daily health
/// audit). Never registered as an identity actor, so signing for it bypasses
/// [`IdentityAdapter::sign_record`] — see [`FeedbackAdapter::sign_and_persist`].
pub const SYSTEM_ACTOR_ID: &str = "system";

/// Coordinates feedback: every write is an append (creation or a
/// resolution record), never a mutation of an existing record.
pub struct FeedbackAdapter {
    store: Arc<dyn RecordStore<FeedbackPayload>>,
    identity: Arc<IdentityAdapter>,
    bus: EventBus,
}

impl FeedbackAdapter {
    /// Wire an adapter to its store, the shared identity adapter, and the
    /// shared event bus.
    #[must_use]
    pub fn new(store: Arc<dyn RecordStore<FeedbackPayload>>, identity: Arc<IdentityAdapter>, bus: EventBus) -> Self {
        Self { store, identity, bus }
    }

    /// Create a feedback record. Rejects a second open `assignment` for the
    /// same `(entityId, assignee)` pair with [`FeedbackError::DuplicateAssignment`].
    /// Emits `feedback.created` with the full payload snapshot and
    /// `triggeredBy = actor_id`.
    pub async fn create(&self, input: FeedbackInput, actor_id: &str) -> Result<FeedbackPayload> {
        if input.feedback_type == Some(FeedbackType::Assignment) {
            if let (Some(entity_id), Some(assignee)) = (&input.entity_id, &input.assignee) {
                if self.has_open_assignment(entity_id, assignee).await? {
                    return Err(FeedbackError::DuplicateAssignment {
                        entity_id: entity_id.clone(),
                        assignee: assignee.clone(),
                    });
                }
            }
        }

        let payload = FeedbackFactory::create(input, Utc::now().timestamp())?;
        self.sign_and_persist(payload.clone(), actor_id).await?;

        self.bus
            .publish(Event::new(
                event_types::FEEDBACK_CREATED,
                "feedback",
                json!({ "payload": payload, "triggeredBy": actor_id }),
            ))
            .await;

        Ok(payload)
    }

    /// Resolve a feedback by writing a *new* record: `entityType="feedback"`,
    /// `entityId = original.id`, `type="clarification"`,
    /// `status="resolved"`, `resolvesFeedbackId = original.id`. The original
    /// record is never mutated. Emits `feedback.created`.
    pub async fn resolve(&self, feedback_id: &str, actor_id: &str, note: impl Into<String>) -> Result<FeedbackPayload> {
        let original = self
            .get_feedback(feedback_id)
            .await?
            .ok_or_else(|| FeedbackError::FeedbackNotFound(feedback_id.to_string()))?;

        if original.status == FeedbackStatus::Resolved || self.is_resolved(feedback_id).await? {
            return Err(FeedbackError::AlreadyResolved(feedback_id.to_string()));
        }

        let input = FeedbackInput {
            entity_type: Some(EntityType::Feedback),
            entity_id: Some(original.id.clone()),
            feedback_type: Some(FeedbackType::Clarification),
            content: note.into(),
            assignee: None,
            resolves_feedback_id: Some(original.id.clone()),
        };
        let mut payload = FeedbackFactory::create(input, Utc::now().timestamp())?;
        payload.status = FeedbackStatus::Resolved;
        FeedbackFactory::validate(&payload)?;

        self.sign_and_persist(payload.clone(), actor_id).await?;

        self.bus
            .publish(Event::new(
                event_types::FEEDBACK_CREATED,
                "feedback",
                json!({ "payload": payload, "triggeredBy": actor_id }),
            ))
            .await;

        Ok(payload)
    }

    /// Direct store read; `None` for a missing feedback.
    pub async fn get_feedback(&self, id: &str) -> Result<Option<FeedbackPayload>> {
        Ok(self.store.get(id).await?.map(|r| r.payload))
    }

    /// Every feedback record whose `entityId == entity_id`, raw (not
    /// reduced for resolution).
    pub async fn get_feedback_by_entity(&self, entity_id: &str) -> Result<Vec<FeedbackPayload>> {
        Ok(self
            .get_all_feedback()
            .await?
            .into_iter()
            .filter(|f| f.entity_id == entity_id)
            .collect())
    }

    /// Every feedback record, raw.
    pub async fn get_all_feedback(&self) -> Result<Vec<FeedbackPayload>> {
        let mut all = Vec::new();
        for id in self.store.list().await? {
            if let Some(record) = self.store.get(&id).await? {
                all.push(record.payload);
            }
        }
        Ok(all)
    }

    /// Blocking feedbacks targeting `entity_id` that are still open: status
    /// `open` and with no resolution record pointing back at them. Feedback
    /// resolution is modeled as a new record, so "open" alone is not enough
    /// to answer this — the resolution chain must be reduced.
    pub async fn get_unresolved_blocking(&self, entity_id: &str) -> Result<Vec<FeedbackPayload>> {
        let all = self.get_all_feedback().await?;
        let resolved_ids: HashSet<&str> = all
            .iter()
            .filter_map(|f| f.resolves_feedback_id.as_deref())
            .collect();
        Ok(all
            .into_iter()
            .filter(|f| {
                f.entity_id == entity_id
                    && f.feedback_type == FeedbackType::Blocking
                    && f.status == FeedbackStatus::Open
                    && !resolved_ids.contains(f.id.as_str())
            })
            .collect())
    }

    async fn is_resolved(&self, feedback_id: &str) -> Result<bool> {
        Ok(self
            .get_all_feedback()
            .await?
            .iter()
            .any(|f| f.resolves_feedback_id.as_deref() == Some(feedback_id)))
    }

    async fn has_open_assignment(&self, entity_id: &str, assignee: &str) -> Result<bool> {
        Ok(self.get_feedback_by_entity(entity_id).await?.iter().any(|f| {
            f.feedback_type == FeedbackType::Assignment
                && f.status == FeedbackStatus::Open
                && f.assignee.as_deref() == Some(assignee)
        }))
    }

    /// Signs and persists a feedback record. [`SYSTEM_ACTOR_ID`] is handled
    /// specially: it is never a registered identity actor (there is no key
    /// to rotate or revoke), so scheduler-driven automation like
    /// `handleDailyTick`'s `suggestion` feedback gets a well-marked
    /// system signature instead of going through Identity.
    async fn sign_and_persist(&self, payload: FeedbackPayload, actor_id: &str) -> Result<()> {
        let unsigned = UnsignedRecord::new(Kind::Feedback, payload.clone())?;
        let mut record = unsigned.into_signed(Signature::placeholder(actor_id, "author"));

        if actor_id == SYSTEM_ACTOR_ID {
            record.header.payload_checksum = checksum(&payload)?;
            let sig = Signature {
                key_id: SYSTEM_ACTOR_ID.to_string(),
                role: "system".to_string(),
                notes: "automated suggestion".to_string(),
                signature: "system-signature".to_string(),
                timestamp: Utc::now().timestamp(),
            };
            apply_signature(&mut record.header.signatures, sig);
        } else {
            record = self
                .identity
                .sign_record(record, actor_id, "author", "feedback signature")
                .await?;
        }

        self.store.put(&payload.id, record).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gitgov_identity::CreateActorInput;
    use gitgov_store::{MemoryKeyProvider, MemorySessionManager, MemoryStore};

    async fn new_harness() -> (FeedbackAdapter, Arc<IdentityAdapter>, String) {
        let identity = Arc::new(IdentityAdapter::new(
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryKeyProvider::new()),
            Arc::new(MemorySessionManager::new()),
            EventBus::new(),
        ));
        let actor = identity
            .create_actor(CreateActorInput {
                actor_type: gitgov_factory::ActorType::Human,
                display_name: "Dev".into(),
                roles: vec!["author".into()],
            })
            .await
            .unwrap();
        let feedback = FeedbackAdapter::new(Arc::new(MemoryStore::new()), identity.clone(), EventBus::new());
        (feedback, identity, actor.id)
    }

    fn blocking_input(entity_id: &str) -> FeedbackInput {
        FeedbackInput {
            entity_type: Some(EntityType::Task),
            entity_id: Some(entity_id.to_string()),
            feedback_type: Some(FeedbackType::Blocking),
            content: "security issue".into(),
            assignee: None,
            resolves_feedback_id: None,
        }
    }

    #[tokio::test]
    async fn create_persists_and_emits() {
        let (feedback, _identity, actor_id) = new_harness().await;
        let p = feedback.create(blocking_input("1700-task-x"), &actor_id).await.unwrap();
        assert_eq!(p.status, FeedbackStatus::Open);
        assert!(feedback.get_feedback(&p.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn resolve_creates_new_record_and_leaves_original_open() {
        let (feedback, _identity, actor_id) = new_harness().await;
        let original = feedback.create(blocking_input("1700-task-x"), &actor_id).await.unwrap();

        let resolution = feedback.resolve(&original.id, &actor_id, "fixed").await.unwrap();
        assert_eq!(resolution.status, FeedbackStatus::Resolved);
        assert_eq!(resolution.resolves_feedback_id.as_deref(), Some(original.id.as_str()));

        let reloaded_original = feedback.get_feedback(&original.id).await.unwrap().unwrap();
        assert_eq!(reloaded_original.status, FeedbackStatus::Open);

        let unresolved = feedback.get_unresolved_blocking("1700-task-x").await.unwrap();
        assert!(unresolved.is_empty());
    }

    #[tokio::test]
    async fn resolve_twice_fails() {
        let (feedback, _identity, actor_id) = new_harness().await;
        let original = feedback.create(blocking_input("1700-task-x"), &actor_id).await.unwrap();
        feedback.resolve(&original.id, &actor_id, "fixed").await.unwrap();

        let err = feedback.resolve(&original.id, &actor_id, "again").await.unwrap_err();
        assert_eq!(err.code(), "ALREADY_RESOLVED");
    }

    #[tokio::test]
    async fn duplicate_assignment_is_rejected() {
        let (feedback, _identity, actor_id) = new_harness().await;
        let assignment = FeedbackInput {
            entity_type: Some(EntityType::Task),
            entity_id: Some("1700-task-x".into()),
            feedback_type: Some(FeedbackType::Assignment),
            content: "assign to dev".into(),
            assignee: Some(actor_id.clone()),
            resolves_feedback_id: None,
        };
        feedback.create(assignment.clone(), &actor_id).await.unwrap();
        let err = feedback.create(assignment, &actor_id).await.unwrap_err();
        assert_eq!(err.code(), "DUPLICATE_ASSIGNMENT");
    }

    #[tokio::test]
    async fn multiple_blockers_require_all_resolved() {
        let (feedback, _identity, actor_id) = new_harness().await;
        let b1 = feedback.create(blocking_input("1700-task-x"), &actor_id).await.unwrap();
        let b2 = feedback.create(blocking_input("1700-task-x"), &actor_id).await.unwrap();
        let b3 = feedback.create(blocking_input("1700-task-x"), &actor_id).await.unwrap();

        feedback.resolve(&b1.id, &actor_id, "fixed1").await.unwrap();
        feedback.resolve(&b2.id, &actor_id, "fixed2").await.unwrap();
        assert_eq!(feedback.get_unresolved_blocking("1700-task-x").await.unwrap().len(), 1);

        feedback.resolve(&b3.id, &actor_id, "fixed3").await.unwrap();
        assert!(feedback.get_unresolved_blocking("1700-task-x").await.unwrap().is_empty());
    }
}
