// SPDX-License-Identifier: MIT OR Apache-2.0
//! The backlog facade: task/cycle lifecycle, link maintenance, reporting
//! delegation to Metrics, and the five reactive event handlers that keep
//! the board moving without a human in the loop.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use gitgov_eventbus::{event_types, Event, EventBus};
use gitgov_factory::{
    ChangelogFactory, ChangelogInput, ChangelogPayload, CycleFactory, CycleInput, CyclePayload, CycleStatus,
    ExecutionFactory, ExecutionInput, ExecutionPayload, FeedbackType, TaskFactory, TaskInput, TaskPayload, TaskStatus,
};
use gitgov_feedback::{FeedbackAdapter, SYSTEM_ACTOR_ID};
use gitgov_identity::IdentityAdapter;
use gitgov_metrics::{
    AuditFinding, CollaborationMetrics, HealthThresholds, LintFinding, MetricsAdapter, ProductivityMetrics, SystemStatus,
    TaskHealth,
};
use gitgov_record::{Record, UnsignedRecord};
use gitgov_store::RecordStore;
use gitgov_workflow::{TransitionContext, WorkflowMethodology};
use serde_json::json;
use tracing::{debug, warn};

use crate::error::{BacklogError, Result};

/// Top-level configuration surfaced to `handleDailyTick` and task/system
/// health classification. Mirrors spec.md §4.8's `{ healthThresholds }`.
#[derive(Debug, Clone, Default)]
pub struct BacklogConfig {
    /// Forwarded verbatim into the wired [`MetricsAdapter`].
    pub health_thresholds: HealthThresholds,
}

fn task_status_str(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Draft => "draft",
        TaskStatus::Review => "review",
        TaskStatus::Ready => "ready",
        TaskStatus::Active => "active",
        TaskStatus::Done => "done",
        TaskStatus::Paused => "paused",
        TaskStatus::Archived => "archived",
        TaskStatus::Discarded => "discarded",
    }
}

fn parse_task_status(s: &str) -> Option<TaskStatus> {
    Some(match s {
        "draft" => TaskStatus::Draft,
        "review" => TaskStatus::Review,
        "ready" => TaskStatus::Ready,
        "active" => TaskStatus::Active,
        "done" => TaskStatus::Done,
        "paused" => TaskStatus::Paused,
        "archived" => TaskStatus::Archived,
        "discarded" => TaskStatus::Discarded,
        _ => return None,
    })
}

/// Everything the adapter's methods and its reactive handlers share. Kept
/// behind `Arc` so event handler closures can hold a clone independent of
/// the facade's own lifetime — the same shape `gitgov-eventbus`'s own
/// `EventBus` uses internally.
struct Inner {
    task_store: Arc<dyn RecordStore<TaskPayload>>,
    cycle_store: Arc<dyn RecordStore<CyclePayload>>,
    execution_store: Arc<dyn RecordStore<ExecutionPayload>>,
    changelog_store: Arc<dyn RecordStore<ChangelogPayload>>,
    identity: Arc<IdentityAdapter>,
    feedback: Arc<FeedbackAdapter>,
    metrics: Arc<MetricsAdapter>,
    workflow: Arc<WorkflowMethodology>,
    bus: EventBus,
    config: BacklogConfig,
}

/// The backlog facade. Cheaply cloneable (`Arc`-backed); construction
/// registers the five reactive event handlers against the shared bus, so
/// only one instance per bus should be built.
#[derive(Clone)]
pub struct BacklogAdapter {
    inner: Arc<Inner>,
}

impl BacklogAdapter {
    /// Wire the facade to its stores and collaborators and register its
    /// event handlers. `feedback` must already exist — see spec.md §9's
    /// cyclic-ownership note: whatever assembles the whole system builds
    /// `FeedbackAdapter` first, then this.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub async fn new(
        task_store: Arc<dyn RecordStore<TaskPayload>>,
        cycle_store: Arc<dyn RecordStore<CyclePayload>>,
        execution_store: Arc<dyn RecordStore<ExecutionPayload>>,
        changelog_store: Arc<dyn RecordStore<ChangelogPayload>>,
        identity: Arc<IdentityAdapter>,
        feedback: Arc<FeedbackAdapter>,
        metrics: Arc<MetricsAdapter>,
        workflow: Arc<WorkflowMethodology>,
        bus: EventBus,
        config: BacklogConfig,
    ) -> Self {
        let inner = Arc::new(Inner {
            task_store,
            cycle_store,
            execution_store,
            changelog_store,
            identity,
            feedback,
            metrics,
            workflow,
            bus: bus.clone(),
            config,
        });

        {
            let inner = inner.clone();
            bus.subscribe(
                event_types::FEEDBACK_CREATED,
                Arc::new(move |event| {
                    let inner = inner.clone();
                    Box::pin(async move { Inner::handle_feedback_created(&inner, event).await })
                }),
            )
            .await;
        }
        {
            let inner = inner.clone();
            bus.subscribe(
                event_types::EXECUTION_CREATED,
                Arc::new(move |event| {
                    let inner = inner.clone();
                    Box::pin(async move { Inner::handle_execution_created(&inner, event).await })
                }),
            )
            .await;
        }
        {
            let inner = inner.clone();
            bus.subscribe(
                event_types::CHANGELOG_CREATED,
                Arc::new(move |event| {
                    let inner = inner.clone();
                    Box::pin(async move { Inner::handle_changelog_created(&inner, event).await })
                }),
            )
            .await;
        }
        {
            let inner = inner.clone();
            bus.subscribe(
                event_types::CYCLE_STATUS_CHANGED,
                Arc::new(move |event| {
                    let inner = inner.clone();
                    Box::pin(async move { Inner::handle_cycle_status_changed(&inner, event).await })
                }),
            )
            .await;
        }
        {
            let inner = inner.clone();
            bus.subscribe(
                event_types::SYSTEM_DAILY_TICK,
                Arc::new(move |event| {
                    let inner = inner.clone();
                    Box::pin(async move { Inner::handle_daily_tick(&inner, event).await })
                }),
            )
            .await;
        }

        Self { inner }
    }

    // ---- Task CRUD ----------------------------------------------------

    /// Build, sign, and persist a new `draft` task.
    pub async fn create_task(&self, input: TaskInput, actor_id: &str) -> Result<TaskPayload> {
        let payload = TaskFactory::create(input, Utc::now().timestamp())?;
        let record = self.inner.sign_new(gitgov_record::Kind::Task, payload.clone(), actor_id, "author").await?;
        self.inner.task_store.put(&payload.id, record).await?;
        Ok(payload)
    }

    /// Direct store read; `None` for a missing task.
    pub async fn get_task(&self, id: &str) -> Result<Option<TaskPayload>> {
        Ok(self.inner.task_store.get(id).await?.map(|r| r.payload))
    }

    /// Direct store read of every task.
    pub async fn list_tasks(&self) -> Result<Vec<TaskPayload>> {
        self.inner.all_tasks().await
    }

    /// Replace a task's fields (title, description, tags, …), re-signing
    /// and re-persisting. The id and `cycleIds` are left untouched — use
    /// the link-maintenance methods for those.
    ///
    /// # Errors
    /// Returns [`BacklogError::TaskNotFound`] if no task exists at `payload.id`.
    pub async fn update_task(&self, mut payload: TaskPayload, actor_id: &str) -> Result<TaskPayload> {
        let existing = self
            .get_task(&payload.id)
            .await?
            .ok_or_else(|| BacklogError::TaskNotFound(payload.id.clone()))?;
        payload.cycle_ids = existing.cycle_ids;
        TaskFactory::validate(&payload)?;

        let record = self.inner.sign_new(gitgov_record::Kind::Task, payload.clone(), actor_id, "author").await?;
        self.inner.task_store.put(&payload.id, record).await?;
        Ok(payload)
    }

    /// Remove a task outright (no lifecycle check — use `discard_task` for
    /// the governed terminal transition instead).
    pub async fn delete_task(&self, id: &str) -> Result<()> {
        self.inner.task_store.delete(id).await?;
        Ok(())
    }

    // ---- Cycle CRUD -----------------------------------------------------

    /// Build, sign, and persist a new `planning` cycle.
    pub async fn create_cycle(&self, input: CycleInput, actor_id: &str) -> Result<CyclePayload> {
        let payload = CycleFactory::create(input, Utc::now().timestamp())?;
        let record = self.inner.sign_new(gitgov_record::Kind::Cycle, payload.clone(), actor_id, "author").await?;
        self.inner.cycle_store.put(&payload.id, record).await?;
        Ok(payload)
    }

    /// Direct store read; `None` for a missing cycle.
    pub async fn get_cycle(&self, id: &str) -> Result<Option<CyclePayload>> {
        Ok(self.inner.cycle_store.get(id).await?.map(|r| r.payload))
    }

    /// Replace a cycle's fields, re-signing and re-persisting. `taskIds` is
    /// left untouched — use the link-maintenance methods for those.
    ///
    /// # Errors
    /// Returns [`BacklogError::CycleNotFound`] if no cycle exists at `payload.id`.
    pub async fn update_cycle(&self, mut payload: CyclePayload, actor_id: &str) -> Result<CyclePayload> {
        let existing = self
            .get_cycle(&payload.id)
            .await?
            .ok_or_else(|| BacklogError::CycleNotFound(payload.id.clone()))?;
        payload.task_ids = existing.task_ids;
        CycleFactory::validate(&payload)?;

        let record = self.inner.sign_new(gitgov_record::Kind::Cycle, payload.clone(), actor_id, "author").await?;
        self.inner.cycle_store.put(&payload.id, record).await?;

        let old_status = existing.status;
        if old_status != payload.status {
            self.inner
                .bus
                .publish(Event::new(
                    event_types::CYCLE_STATUS_CHANGED,
                    "backlog",
                    json!({ "cycleId": payload.id, "from": cycle_status_str(old_status), "to": cycle_status_str(payload.status) }),
                ))
                .await;
        }
        Ok(payload)
    }

    /// Remove a cycle outright.
    pub async fn delete_cycle(&self, id: &str) -> Result<()> {
        self.inner.cycle_store.delete(id).await?;
        Ok(())
    }

    // ---- Lifecycle verbs -------------------------------------------------

    /// `draft -> review`.
    pub async fn submit_task(&self, task_id: &str, actor_id: &str, notes: &str) -> Result<TaskPayload> {
        self.inner.attempt_transition(task_id, "review", actor_id, notes, true).await
    }

    /// `review -> ready`.
    pub async fn approve_task(&self, task_id: &str, actor_id: &str, notes: &str) -> Result<TaskPayload> {
        self.inner.attempt_transition(task_id, "ready", actor_id, notes, true).await
    }

    /// `ready|paused -> active`.
    pub async fn activate_task(&self, task_id: &str, actor_id: &str, notes: &str) -> Result<TaskPayload> {
        self.inner.attempt_transition(task_id, "active", actor_id, notes, true).await
    }

    /// `active -> done`.
    pub async fn complete_task(&self, task_id: &str, actor_id: &str, notes: &str) -> Result<TaskPayload> {
        self.inner.attempt_transition(task_id, "done", actor_id, notes, true).await
    }

    /// `active -> paused`.
    pub async fn pause_task(&self, task_id: &str, actor_id: &str, notes: &str) -> Result<TaskPayload> {
        self.inner.attempt_transition(task_id, "paused", actor_id, notes, true).await
    }

    /// `paused -> active`.
    pub async fn resume_task(&self, task_id: &str, actor_id: &str, notes: &str) -> Result<TaskPayload> {
        self.inner.attempt_transition(task_id, "active", actor_id, notes, true).await
    }

    /// `draft|review|ready -> discarded`.
    pub async fn discard_task(&self, task_id: &str, actor_id: &str, notes: &str) -> Result<TaskPayload> {
        self.inner.attempt_transition(task_id, "discarded", actor_id, notes, true).await
    }

    // ---- Link maintenance -----------------------------------------------

    /// Attach `task_id` to `cycle_id` on both sides. On a second-phase
    /// failure the first-written side is rolled back and
    /// [`BacklogError::LinkInconsistent`] is returned.
    pub async fn add_task_to_cycle(&self, cycle_id: &str, task_id: &str, actor_id: &str) -> Result<()> {
        self.inner.set_task_cycle_link(cycle_id, task_id, actor_id, true).await
    }

    /// Detach each of `task_ids` from `cycle_id` on both sides.
    pub async fn remove_tasks_from_cycle(&self, cycle_id: &str, task_ids: &[String], actor_id: &str) -> Result<()> {
        for task_id in task_ids {
            self.inner.set_task_cycle_link(cycle_id, task_id, actor_id, false).await?;
        }
        Ok(())
    }

    /// Detach each of `task_ids` from `from_cycle_id` and attach to `to_cycle_id`.
    pub async fn move_tasks_between_cycles(
        &self,
        from_cycle_id: &str,
        to_cycle_id: &str,
        task_ids: &[String],
        actor_id: &str,
    ) -> Result<()> {
        for task_id in task_ids {
            self.inner.set_task_cycle_link(from_cycle_id, task_id, actor_id, false).await?;
            self.inner.set_task_cycle_link(to_cycle_id, task_id, actor_id, true).await?;
        }
        Ok(())
    }

    // ---- Navigation -------------------------------------------------------

    /// Every task with an open `assignment` feedback whose `assignee ==
    /// actor_id`, de-duplicated.
    pub async fn get_tasks_assigned_to_actor(&self, actor_id: &str) -> Result<Vec<TaskPayload>> {
        let all_feedback = self.inner.feedback.get_all_feedback().await?;
        let mut seen = HashSet::new();
        let mut task_ids = Vec::new();
        for f in &all_feedback {
            if f.feedback_type == FeedbackType::Assignment
                && f.status == gitgov_factory::FeedbackStatus::Open
                && f.assignee.as_deref() == Some(actor_id)
                && seen.insert(f.entity_id.clone())
            {
                task_ids.push(f.entity_id.clone());
            }
        }
        let mut tasks = Vec::new();
        for task_id in task_ids {
            if let Some(t) = self.get_task(&task_id).await? {
                tasks.push(t);
            }
        }
        Ok(tasks)
    }

    // ---- Execution / changelog --------------------------------------------

    /// Append an execution record and emit `execution.created` (consumed by
    /// `handleExecutionCreated`).
    pub async fn create_execution(&self, input: ExecutionInput, actor_id: &str) -> Result<ExecutionPayload> {
        let payload = ExecutionFactory::create(input, Utc::now().timestamp())?;
        let record = self
            .inner
            .sign_new(gitgov_record::Kind::Execution, payload.clone(), actor_id, "author")
            .await?;
        self.inner.execution_store.put(&payload.id, record).await?;

        self.inner
            .bus
            .publish(Event::new(
                event_types::EXECUTION_CREATED,
                "backlog",
                json!({ "payload": payload, "triggeredBy": actor_id }),
            ))
            .await;
        Ok(payload)
    }

    /// Append a changelog record and emit `changelog.created` (consumed by
    /// `handleChangelogCreated`).
    pub async fn create_changelog(&self, input: ChangelogInput, actor_id: &str) -> Result<ChangelogPayload> {
        let payload = ChangelogFactory::create(input, Utc::now().timestamp())?;
        let record = self
            .inner
            .sign_new(gitgov_record::Kind::Changelog, payload.clone(), actor_id, "author")
            .await?;
        self.inner.changelog_store.put(&payload.id, record).await?;

        self.inner
            .bus
            .publish(Event::new(
                event_types::CHANGELOG_CREATED,
                "backlog",
                json!({ "payload": payload, "triggeredBy": actor_id }),
            ))
            .await;
        Ok(payload)
    }

    // ---- Reporting (delegated to Metrics) ---------------------------------

    /// Delegates to [`MetricsAdapter::get_system_status`].
    pub async fn get_system_status(&self) -> Result<SystemStatus> {
        Ok(self.inner.metrics.get_system_status().await?)
    }

    /// Delegates to [`MetricsAdapter::get_task_health`].
    pub async fn get_task_health(&self, task_id: &str) -> Result<TaskHealth> {
        Ok(self.inner.metrics.get_task_health(task_id).await?)
    }

    /// Delegates to [`MetricsAdapter::get_productivity_metrics`].
    pub async fn get_productivity_metrics(&self) -> Result<ProductivityMetrics> {
        Ok(self.inner.metrics.get_productivity_metrics().await?)
    }

    /// Delegates to [`MetricsAdapter::get_collaboration_metrics`].
    pub async fn get_collaboration_metrics(&self) -> Result<CollaborationMetrics> {
        Ok(self.inner.metrics.get_collaboration_metrics().await?)
    }

    /// Delegates to [`MetricsAdapter::lint`].
    pub async fn lint(&self) -> Result<Vec<LintFinding>> {
        Ok(self.inner.metrics.lint().await?)
    }

    /// Delegates to [`MetricsAdapter::audit`].
    pub async fn audit(&self) -> Result<Vec<AuditFinding>> {
        Ok(self.inner.metrics.audit().await?)
    }
}

fn cycle_status_str(status: CycleStatus) -> &'static str {
    match status {
        CycleStatus::Planning => "planning",
        CycleStatus::Active => "active",
        CycleStatus::Completed => "completed",
        CycleStatus::Archived => "archived",
    }
}

impl Inner {
    async fn all_tasks(&self) -> Result<Vec<TaskPayload>> {
        let mut tasks = Vec::new();
        for id in self.task_store.list().await? {
            if let Some(r) = self.task_store.get(&id).await? {
                tasks.push(r.payload);
            }
        }
        Ok(tasks)
    }

    /// Sign a brand-new payload for `kind` and wrap it into a persistable
    /// [`Record`], following the placeholder-then-sign pattern (spec.md §9).
    async fn sign_new<T>(&self, kind: gitgov_record::Kind, payload: T, actor_id: &str, role: &str) -> Result<Record<T>>
    where
        T: serde::Serialize + serde::de::DeserializeOwned + Clone + Send + Sync,
    {
        let unsigned = UnsignedRecord::new(kind, payload)?;
        let placeholder = gitgov_record::Signature::placeholder(actor_id, role);
        let record = unsigned.into_signed(placeholder);
        Ok(self.identity.sign_record(record, actor_id, role, "backlog signature").await?)
    }

    async fn task_has_active_cycle(&self, task: &TaskPayload) -> Result<bool> {
        for cycle_id in &task.cycle_ids {
            if let Some(cycle) = self.cycle_store.get(cycle_id).await? {
                if cycle.payload.status == CycleStatus::Active {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    async fn epic_has_child_cycle(&self, task: &TaskPayload) -> Result<bool> {
        for cycle_id in &task.cycle_ids {
            if let Some(cycle) = self.cycle_store.get(cycle_id).await? {
                if !cycle.payload.child_cycle_ids.is_empty() {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    async fn assignment_resolved(&self, task_id: &str) -> Result<bool> {
        let feedbacks = self.feedback.get_feedback_by_entity(task_id).await?;
        let assignments: Vec<_> = feedbacks.iter().filter(|f| f.feedback_type == FeedbackType::Assignment).collect();
        if assignments.is_empty() {
            return Ok(false);
        }
        let all = self.feedback.get_all_feedback().await?;
        let resolved_ids: HashSet<&str> = all.iter().filter_map(|f| f.resolves_feedback_id.as_deref()).collect();
        Ok(assignments.iter().any(|f| resolved_ids.contains(f.id.as_str())))
    }

    /// The five-step algorithm of spec.md §4.8, shared by every lifecycle
    /// verb and every reactive handler.
    ///
    /// `gated` distinguishes the two callers: human-invoked lifecycle verbs
    /// pass `true` and are held to the methodology's signature gate and
    /// custom rules in full. The reactive handlers pass `false` — spec.md
    /// §8 scenario 2 (resolving a task's last blocking feedback resumes it
    /// to `active` unconditionally) would otherwise collide with the
    /// `active` transition's `sprint_capacity` custom rule, which has
    /// nothing to do with blocker resolution. Ungated attempts still check
    /// transition legality and still produce a real signature: the role is
    /// resolved the same way a gated transition's is, via
    /// `WorkflowMethodology::resolve_signature_rule(from, target,
    /// actor.roles)`, falling back to `"author"` if the methodology has no
    /// matching rule. The record stays attributable and verifiable; the
    /// actor just skips the capability/custom-rule gate a human command
    /// would enforce.
    async fn attempt_transition(
        &self,
        task_id: &str,
        target: &str,
        actor_id: &str,
        notes: &str,
        gated: bool,
    ) -> Result<TaskPayload> {
        let mut record = self
            .task_store
            .get(task_id)
            .await?
            .ok_or_else(|| BacklogError::TaskNotFound(task_id.to_string()))?;
        let current = record.payload.clone();
        let from = task_status_str(current.status);

        if from == target {
            return Ok(current);
        }

        let target_status = parse_task_status(target)
            .ok_or_else(|| BacklogError::IllegalTransition { from: from.to_string(), to: target.to_string() })?;

        let Some(requires) = self.workflow.get_transition_rule(from, target).cloned() else {
            return Err(BacklogError::IllegalTransition { from: from.to_string(), to: target.to_string() });
        };

        let actor = self
            .identity
            .get_actor(actor_id)
            .await?
            .ok_or_else(|| gitgov_identity::IdentityError::ActorNotFound(actor_id.to_string()))?;

        let mut new_payload = current.clone();
        new_payload.status = target_status;

        let signing_role = self
            .workflow
            .resolve_signature_rule(from, target, &actor.roles)
            .map(|r| r.role)
            .unwrap_or_else(|| "author".to_string());

        record.payload = new_payload.clone();
        record = self.identity.sign_record(record, actor_id, &signing_role, notes).await?;

        if gated {
            let ctx = TransitionContext {
                transition_to: Some(target.to_string()),
                task_status: from.to_string(),
                task_tags: current.tags.clone(),
                task_cycle_ids: current.cycle_ids.clone(),
                has_active_cycle: self.task_has_active_cycle(&current).await?,
                epic_has_child_cycle: self.epic_has_child_cycle(&current).await?,
                assignment_resolved: self.assignment_resolved(&current.id).await?,
                actor_roles: actor.roles.clone(),
                signatures: vec![record.header.signatures.last().cloned().expect("always at least one signature")],
            };

            if requires.signatures.is_some() {
                let new_sig = ctx.signatures[0].clone();
                if !self.workflow.validate_signature(&new_sig, &ctx)? {
                    return Err(BacklogError::Unauthorized(format!(
                        "{actor_id} cannot sign off {from} -> {target}"
                    )));
                }
            }

            if let Some(rule_ids) = &requires.custom_rules {
                if !self.workflow.validate_custom_rules(rule_ids, &ctx) {
                    return Err(BacklogError::PreconditionFailed(format!(
                        "custom rules failed for {from} -> {target}"
                    )));
                }
            }
        }

        self.task_store.put(task_id, record).await?;
        Ok(new_payload)
    }

    async fn set_task_cycle_link(&self, cycle_id: &str, task_id: &str, actor_id: &str, attach: bool) -> Result<()> {
        let original_cycle = self
            .cycle_store
            .get(cycle_id)
            .await?
            .ok_or_else(|| BacklogError::CycleNotFound(cycle_id.to_string()))?;
        let original_task = self
            .task_store
            .get(task_id)
            .await?
            .ok_or_else(|| BacklogError::TaskNotFound(task_id.to_string()))?;

        let mut cycle_record = original_cycle.clone();
        if attach {
            if !cycle_record.payload.task_ids.iter().any(|t| t == task_id) {
                cycle_record.payload.task_ids.push(task_id.to_string());
            }
        } else {
            cycle_record.payload.task_ids.retain(|t| t != task_id);
        }
        let signed_cycle = self.identity.sign_record(cycle_record, actor_id, "author", "cycle link update").await?;
        self.cycle_store.put(cycle_id, signed_cycle).await?;

        let mut task_record = original_task.clone();
        if attach {
            if !task_record.payload.cycle_ids.iter().any(|c| c == cycle_id) {
                task_record.payload.cycle_ids.push(cycle_id.to_string());
            }
        } else {
            task_record.payload.cycle_ids.retain(|c| c != cycle_id);
        }

        match self.identity.sign_record(task_record, actor_id, "author", "task link update").await {
            Ok(signed_task) => {
                self.task_store.put(task_id, signed_task).await?;
                Ok(())
            }
            Err(e) => {
                self.cycle_store.put(cycle_id, original_cycle).await?;
                Err(BacklogError::LinkInconsistent(format!(
                    "{task_id} <-> {cycle_id} second phase failed, rolled back: {e}"
                )))
            }
        }
    }

    // ---- Event handlers -----------------------------------------------

    async fn handle_feedback_created(inner: &Arc<Inner>, event: Event) -> std::result::Result<(), String> {
        let payload: gitgov_factory::FeedbackPayload = serde_json::from_value(event.payload["payload"].clone())
            .map_err(|e| format!("malformed feedback.created payload: {e}"))?;
        let triggered_by = event.payload["triggeredBy"].as_str().unwrap_or(SYSTEM_ACTOR_ID).to_string();

        if payload.entity_type != gitgov_factory::EntityType::Task {
            return Ok(());
        }

        if payload.feedback_type == FeedbackType::Blocking {
            if let Ok(Some(task)) = inner.task_store.get(&payload.entity_id).await.map(|r| r.map(|r| r.payload)) {
                if task.status == TaskStatus::Active {
                    if let Err(e) = inner.attempt_transition(&payload.entity_id, "paused", &triggered_by, "auto-paused: blocking feedback opened", false).await {
                        warn!(task_id = %payload.entity_id, error = %e, "auto-pause failed");
                    }
                }
            }
        }

        if payload.resolves_feedback_id.is_some() {
            match inner.metrics.get_task_health(&payload.entity_id).await {
                Ok(health) if health.blocking_feedbacks == 0 => {
                    if let Ok(Some(task)) = inner.task_store.get(&payload.entity_id).await.map(|r| r.map(|r| r.payload)) {
                        if task.status == TaskStatus::Paused {
                            if let Err(e) = inner.attempt_transition(&payload.entity_id, "active", &triggered_by, "auto-resumed: blockers cleared", false).await {
                                warn!(task_id = %payload.entity_id, error = %e, "auto-resume failed");
                            }
                        }
                    }
                }
                Ok(_) => debug!(task_id = %payload.entity_id, "blockers remain; staying paused"),
                Err(e) => warn!(task_id = %payload.entity_id, error = %e, "could not check task health"),
            }
        }

        Ok(())
    }

    async fn handle_execution_created(inner: &Arc<Inner>, event: Event) -> std::result::Result<(), String> {
        let payload: ExecutionPayload = serde_json::from_value(event.payload["payload"].clone())
            .map_err(|e| format!("malformed execution.created payload: {e}"))?;

        let Ok(Some(task)) = inner.task_store.get(&payload.task_id).await.map(|r| r.map(|r| r.payload)) else {
            return Ok(());
        };
        if task.status != TaskStatus::Ready {
            return Ok(());
        }

        let mut count = 0;
        for id in inner.execution_store.list().await.map_err(|e| e.to_string())? {
            if let Ok(Some(r)) = inner.execution_store.get(&id).await {
                if r.payload.task_id == payload.task_id {
                    count += 1;
                }
            }
        }
        if count == 1 {
            if let Err(e) = inner
                .attempt_transition(&payload.task_id, "active", &payload.actor_id, "auto-activated: first execution logged", false)
                .await
            {
                warn!(task_id = %payload.task_id, error = %e, "auto-activate failed");
            }
        }

        Ok(())
    }

    async fn handle_changelog_created(inner: &Arc<Inner>, event: Event) -> std::result::Result<(), String> {
        let payload: ChangelogPayload = serde_json::from_value(event.payload["payload"].clone())
            .map_err(|e| format!("malformed changelog.created payload: {e}"))?;
        let triggered_by = event.payload["triggeredBy"].as_str().unwrap_or(SYSTEM_ACTOR_ID).to_string();

        for task_id in &payload.related_tasks {
            let Ok(Some(task)) = inner.task_store.get(task_id).await.map(|r| r.map(|r| r.payload)) else {
                continue;
            };
            if task.status != TaskStatus::Done {
                continue;
            }
            if let Err(e) = inner.attempt_transition(task_id, "archived", &triggered_by, "auto-archived: changelog recorded", false).await {
                warn!(task_id = %task_id, error = %e, "auto-archive failed");
            }
        }

        Ok(())
    }

    /// Default is "no cascade" (spec.md §9 Open Question (a)): archiving or
    /// completing a cycle does not, by itself, retarget its tasks. Logged
    /// for observability; a methodology-driven cascade is a documented
    /// extension point, not implemented here.
    async fn handle_cycle_status_changed(_inner: &Arc<Inner>, event: Event) -> std::result::Result<(), String> {
        debug!(payload = %event.payload, "cycle status changed; no cascade by default");
        Ok(())
    }

    async fn handle_daily_tick(inner: &Arc<Inner>, _event: Event) -> std::result::Result<(), String> {
        let tasks = inner.all_tasks().await.map_err(|e| e.to_string())?;
        for task in tasks {
            let health = match inner.metrics.get_task_health(&task.id).await {
                Ok(h) => h,
                Err(e) => {
                    warn!(task_id = %task.id, error = %e, "daily tick: could not read task health");
                    continue;
                }
            };
            if health.is_healthy {
                continue;
            }
            let content = format!(
                "health check: score={:.0} (min {:.0}), time in stage={:.1}d (max {:.1}d)",
                health.health_score,
                inner.config.health_thresholds.task_min_score,
                health.time_in_current_stage_days,
                inner.config.health_thresholds.max_days_in_stage
            );
            let input = gitgov_factory::FeedbackInput {
                entity_type: Some(gitgov_factory::EntityType::Task),
                entity_id: Some(task.id.clone()),
                feedback_type: Some(FeedbackType::Suggestion),
                content,
                assignee: None,
                resolves_feedback_id: None,
            };
            if let Err(e) = inner.feedback.create(input, SYSTEM_ACTOR_ID).await {
                warn!(task_id = %task.id, error = %e, "daily tick: could not create suggestion feedback");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gitgov_factory::{ActorType, EntityType, FeedbackInput};
    use gitgov_identity::{CreateActorInput, IdentityAdapter};
    use gitgov_store::{MemoryKeyProvider, MemorySessionManager, MemoryStore};

    struct Harness {
        backlog: BacklogAdapter,
        feedback: Arc<FeedbackAdapter>,
        bus: EventBus,
        dev_id: String,
    }

    async fn harness() -> Harness {
        let bus = EventBus::new();
        let identity = Arc::new(IdentityAdapter::new(
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryKeyProvider::new()),
            Arc::new(MemorySessionManager::new()),
            bus.clone(),
        ));
        let dev = identity
            .create_actor(CreateActorInput {
                actor_type: ActorType::Human,
                display_name: "Dev".into(),
                roles: vec!["author".into()],
            })
            .await
            .unwrap();

        let feedback_store = Arc::new(MemoryStore::new());
        let feedback = Arc::new(FeedbackAdapter::new(feedback_store, identity.clone(), bus.clone()));

        let task_store: Arc<dyn RecordStore<TaskPayload>> = Arc::new(MemoryStore::new());
        let metrics = Arc::new(MetricsAdapter::new(
            task_store.clone(),
            feedback.clone(),
            None,
            None,
            HealthThresholds::default(),
        ));

        let backlog = BacklogAdapter::new(
            task_store,
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryStore::new()),
            identity.clone(),
            feedback.clone(),
            metrics,
            Arc::new(WorkflowMethodology::create_default()),
            bus.clone(),
            BacklogConfig::default(),
        )
        .await;

        Harness { backlog, feedback, bus, dev_id: dev.id }
    }

    async fn force_active(h: &Harness) -> TaskPayload {
        let task = h.backlog.create_task(TaskInput { title: Some("t1".into()), ..Default::default() }, &h.dev_id).await.unwrap();
        let mut payload = task;
        payload.status = TaskStatus::Active;
        h.backlog.update_task(payload, &h.dev_id).await.unwrap()
    }

    #[tokio::test]
    async fn blocking_feedback_pauses_active_task() {
        let h = harness().await;
        let task = force_active(&h).await;

        h.feedback
            .create(
                FeedbackInput {
                    entity_type: Some(EntityType::Task),
                    entity_id: Some(task.id.clone()),
                    feedback_type: Some(FeedbackType::Blocking),
                    content: "sec issue".into(),
                    assignee: None,
                    resolves_feedback_id: None,
                },
                &h.dev_id,
            )
            .await
            .unwrap();

        h.bus.wait_for_idle().await;
        let reloaded = h.backlog.get_task(&task.id).await.unwrap().unwrap();
        assert_eq!(reloaded.status, TaskStatus::Paused);
    }

    #[tokio::test]
    async fn resolving_last_blocker_resumes_unconditionally() {
        let h = harness().await;
        let task = force_active(&h).await;

        let block = h
            .feedback
            .create(
                FeedbackInput {
                    entity_type: Some(EntityType::Task),
                    entity_id: Some(task.id.clone()),
                    feedback_type: Some(FeedbackType::Blocking),
                    content: "sec issue".into(),
                    assignee: None,
                    resolves_feedback_id: None,
                },
                &h.dev_id,
            )
            .await
            .unwrap();
        h.bus.wait_for_idle().await;
        assert_eq!(h.backlog.get_task(&task.id).await.unwrap().unwrap().status, TaskStatus::Paused);

        h.feedback.resolve(&block.id, &h.dev_id, "fixed").await.unwrap();
        h.bus.wait_for_idle().await;
        assert_eq!(h.backlog.get_task(&task.id).await.unwrap().unwrap().status, TaskStatus::Active);
    }

    #[tokio::test]
    async fn multiple_blockers_require_all_resolved() {
        let h = harness().await;
        let task = force_active(&h).await;
        let mk = |id: &str| FeedbackInput {
            entity_type: Some(EntityType::Task),
            entity_id: Some(id.to_string()),
            feedback_type: Some(FeedbackType::Blocking),
            content: "blocker".into(),
            assignee: None,
            resolves_feedback_id: None,
        };

        let b1 = h.feedback.create(mk(&task.id), &h.dev_id).await.unwrap();
        let b2 = h.feedback.create(mk(&task.id), &h.dev_id).await.unwrap();
        let b3 = h.feedback.create(mk(&task.id), &h.dev_id).await.unwrap();
        h.bus.wait_for_idle().await;
        assert_eq!(h.backlog.get_task(&task.id).await.unwrap().unwrap().status, TaskStatus::Paused);

        h.feedback.resolve(&b1.id, &h.dev_id, "fixed1").await.unwrap();
        h.feedback.resolve(&b2.id, &h.dev_id, "fixed2").await.unwrap();
        h.bus.wait_for_idle().await;
        assert_eq!(h.backlog.get_task(&task.id).await.unwrap().unwrap().status, TaskStatus::Paused);

        h.feedback.resolve(&b3.id, &h.dev_id, "fixed3").await.unwrap();
        h.bus.wait_for_idle().await;
        assert_eq!(h.backlog.get_task(&task.id).await.unwrap().unwrap().status, TaskStatus::Active);
    }

    #[tokio::test]
    async fn duplicate_assignment_lists_task_once() {
        let h = harness().await;
        let task = h.backlog.create_task(TaskInput { title: Some("assignable".into()), ..Default::default() }, &h.dev_id).await.unwrap();

        let assignment = FeedbackInput {
            entity_type: Some(EntityType::Task),
            entity_id: Some(task.id.clone()),
            feedback_type: Some(FeedbackType::Assignment),
            content: "assign to dev".into(),
            assignee: Some(h.dev_id.clone()),
            resolves_feedback_id: None,
        };
        h.feedback.create(assignment.clone(), &h.dev_id).await.unwrap();
        let err = h.feedback.create(assignment, &h.dev_id).await.unwrap_err();
        assert_eq!(err.code(), "DUPLICATE_ASSIGNMENT");

        let assigned = h.backlog.get_tasks_assigned_to_actor(&h.dev_id).await.unwrap();
        assert_eq!(assigned.len(), 1);
        assert_eq!(assigned[0].id, task.id);
    }

    #[tokio::test]
    async fn illegal_transition_is_rejected() {
        let h = harness().await;
        let task = h.backlog.create_task(TaskInput { title: Some("t".into()), ..Default::default() }, &h.dev_id).await.unwrap();
        let err = h.backlog.complete_task(&task.id, &h.dev_id, "too soon").await.unwrap_err();
        assert_eq!(err.code(), "ILLEGAL_TRANSITION");
    }

    #[tokio::test]
    async fn approve_without_capability_role_is_unauthorized() {
        let h = harness().await;
        let task = h.backlog.create_task(TaskInput { title: Some("t".into()), ..Default::default() }, &h.dev_id).await.unwrap();
        h.backlog.submit_task(&task.id, &h.dev_id, "ready for review").await.unwrap();
        let err = h.backlog.approve_task(&task.id, &h.dev_id, "lgtm").await.unwrap_err();
        assert_eq!(err.code(), "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn link_maintenance_is_bidirectional() {
        let h = harness().await;
        let task = h.backlog.create_task(TaskInput { title: Some("t".into()), ..Default::default() }, &h.dev_id).await.unwrap();
        let cycle = h.backlog.create_cycle(CycleInput { title: Some("Sprint 1".into()), tags: vec![] }, &h.dev_id).await.unwrap();

        h.backlog.add_task_to_cycle(&cycle.id, &task.id, &h.dev_id).await.unwrap();
        let reloaded_task = h.backlog.get_task(&task.id).await.unwrap().unwrap();
        let reloaded_cycle = h.backlog.get_cycle(&cycle.id).await.unwrap().unwrap();
        assert!(reloaded_task.cycle_ids.contains(&cycle.id));
        assert!(reloaded_cycle.task_ids.contains(&task.id));

        h.backlog.remove_tasks_from_cycle(&cycle.id, &[task.id.clone()], &h.dev_id).await.unwrap();
        let reloaded_task = h.backlog.get_task(&task.id).await.unwrap().unwrap();
        let reloaded_cycle = h.backlog.get_cycle(&cycle.id).await.unwrap().unwrap();
        assert!(!reloaded_task.cycle_ids.contains(&cycle.id));
        assert!(!reloaded_cycle.task_ids.contains(&task.id));
    }
}
