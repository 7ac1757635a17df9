// SPDX-License-Identifier: MIT OR Apache-2.0
//! The metrics adapter: read-only aggregations over the task/feedback/
//! execution/agent stores. No writes, no events.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use gitgov_factory::{AgentPayload, ExecutionPayload, FeedbackType, TaskPayload};
use gitgov_feedback::FeedbackAdapter;
use gitgov_store::RecordStore;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::calc;
use crate::error::{MetricsError, Result};

/// Thresholds that gate `isHealthy`/`overallHealthy` classification,
/// shared with the Backlog adapter's `handleDailyTick`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct HealthThresholds {
    /// A task below this health score is flagged unhealthy.
    pub task_min_score: f64,
    /// A task that has spent more than this many days in its current stage
    /// is flagged stale.
    pub max_days_in_stage: f64,
    /// The system as a whole is flagged unhealthy below this score.
    pub system_min_score: f64,
}

impl Default for HealthThresholds {
    fn default() -> Self {
        Self { task_min_score: 50.0, max_days_in_stage: 7.0, system_min_score: 50.0 }
    }
}

/// Aggregate snapshot returned by [`MetricsAdapter::get_system_status`].
#[derive(Debug, Clone, Serialize)]
pub struct SystemStatus {
    /// `calculateHealth` over every task.
    pub health: f64,
    /// `calculateBacklogDistribution` over every task.
    pub backlog_distribution: HashMap<String, f64>,
    /// `calculateTasksCreatedToday`.
    pub tasks_created_today: usize,
    /// `calculateStalenessIndex`.
    pub staleness_index_days: f64,
    /// `calculateBlockingFeedbackAge`.
    pub blocking_feedback_age_days: f64,
    /// Whether `health >= config.systemMinScore`.
    pub overall_healthy: bool,
}

/// Per-task snapshot returned by [`MetricsAdapter::get_task_health`].
#[derive(Debug, Clone, Serialize)]
pub struct TaskHealth {
    /// The task id this snapshot describes.
    pub task_id: String,
    /// This task's status-weighted health score.
    pub health_score: f64,
    /// `calculateTimeInCurrentStage`.
    pub time_in_current_stage_days: f64,
    /// Count of still-open blocking feedbacks targeting this task.
    pub blocking_feedbacks: usize,
    /// Whether this task clears both the score and staleness thresholds.
    pub is_healthy: bool,
}

/// Tier 2 throughput/latency snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct ProductivityMetrics {
    /// `calculateThroughput`: done/archived in the last 7 days.
    pub throughput: usize,
    /// `calculateLeadTime`.
    pub lead_time_days: f64,
    /// `calculateCycleTime`.
    pub cycle_time_days: f64,
}

/// Tier 2 collaboration snapshot. Zeroed when the optional execution/agent
/// stores were not configured.
#[derive(Debug, Clone, Serialize)]
pub struct CollaborationMetrics {
    /// `calculateActiveAgents`.
    pub active_agents: usize,
    /// `calculateBlockingFeedbackAge`.
    pub blocking_feedback_age_days: f64,
}

/// A task flagged by [`MetricsAdapter::lint`].
#[derive(Debug, Clone, Serialize)]
pub struct LintFinding {
    /// The flagged task id.
    pub task_id: String,
    /// Why it was flagged (`"low_health"`, `"stale"`, or both).
    pub reasons: Vec<&'static str>,
}

/// A data-integrity issue flagged by [`MetricsAdapter::audit`].
#[derive(Debug, Clone, Serialize)]
pub struct AuditFinding {
    /// The record id this finding concerns.
    pub record_id: String,
    /// Human-readable description of the inconsistency.
    pub description: String,
}

/// Read-only aggregations over the stores. Holds no mutable state, emits
/// no events, performs no writes.
pub struct MetricsAdapter {
    task_store: Arc<dyn RecordStore<TaskPayload>>,
    feedback: Arc<FeedbackAdapter>,
    execution_store: Option<Arc<dyn RecordStore<ExecutionPayload>>>,
    agent_store: Option<Arc<dyn RecordStore<AgentPayload>>>,
    config: HealthThresholds,
}

impl MetricsAdapter {
    /// Wire the adapter to its collaborators. `execution_store`/
    /// `agent_store` are optional: staleness and active-agent figures
    /// collapse to `0` when absent.
    #[must_use]
    pub fn new(
        task_store: Arc<dyn RecordStore<TaskPayload>>,
        feedback: Arc<FeedbackAdapter>,
        execution_store: Option<Arc<dyn RecordStore<ExecutionPayload>>>,
        agent_store: Option<Arc<dyn RecordStore<AgentPayload>>>,
        config: HealthThresholds,
    ) -> Self {
        Self { task_store, feedback, execution_store, agent_store, config }
    }

    async fn all_tasks(&self) -> Result<Vec<TaskPayload>> {
        let mut tasks = Vec::new();
        for id in self.task_store.list().await? {
            if let Some(r) = self.task_store.get(&id).await? {
                tasks.push(r.payload);
            }
        }
        Ok(tasks)
    }

    async fn all_executions(&self) -> Result<Vec<ExecutionPayload>> {
        let Some(store) = &self.execution_store else {
            return Ok(Vec::new());
        };
        let mut out = Vec::new();
        for id in store.list().await? {
            if let Some(r) = store.get(&id).await? {
                out.push(r.payload);
            }
        }
        Ok(out)
    }

    async fn all_agents(&self) -> Result<Vec<AgentPayload>> {
        let Some(store) = &self.agent_store else {
            return Ok(Vec::new());
        };
        let mut out = Vec::new();
        for id in store.list().await? {
            if let Some(r) = store.get(&id).await? {
                out.push(r.payload);
            }
        }
        Ok(out)
    }

    /// A system-wide snapshot: health, distribution, staleness, and
    /// blocking-feedback age, all computed against the current time.
    pub async fn get_system_status(&self) -> Result<SystemStatus> {
        let now = Utc::now().timestamp();
        let tasks = self.all_tasks().await?;
        let executions = self.all_executions().await?;
        let feedbacks = self.feedback.get_all_feedback().await?;

        let health = calc::health(&tasks);
        Ok(SystemStatus {
            health,
            backlog_distribution: calc::backlog_distribution(&tasks),
            tasks_created_today: calc::tasks_created_today(&tasks, now),
            staleness_index_days: calc::staleness_index(&tasks, &executions, now),
            blocking_feedback_age_days: calc::blocking_feedback_age(&feedbacks, now),
            overall_healthy: health >= self.config.system_min_score,
        })
    }

    /// A single task's health snapshot.
    ///
    /// # Errors
    /// Returns [`MetricsError::TaskNotFound`] if `task_id` does not resolve.
    pub async fn get_task_health(&self, task_id: &str) -> Result<TaskHealth> {
        let now = Utc::now().timestamp();
        let task = self
            .task_store
            .get(task_id)
            .await?
            .ok_or_else(|| MetricsError::TaskNotFound(task_id.to_string()))?
            .payload;

        let blocking_feedbacks = self.feedback.get_unresolved_blocking(task_id).await.map_err(|_| {
            MetricsError::TaskNotFound(task_id.to_string())
        })?;
        let blocking_feedbacks = blocking_feedbacks
            .iter()
            .filter(|f| f.feedback_type == FeedbackType::Blocking)
            .count();

        let health_score = calc::health(std::slice::from_ref(&task));
        let time_in_current_stage_days = calc::time_in_current_stage(&task, now);
        let is_healthy =
            health_score >= self.config.task_min_score && time_in_current_stage_days <= self.config.max_days_in_stage;

        Ok(TaskHealth {
            task_id: task.id,
            health_score,
            time_in_current_stage_days,
            blocking_feedbacks,
            is_healthy,
        })
    }

    /// Throughput/lead-time/cycle-time over every task.
    pub async fn get_productivity_metrics(&self) -> Result<ProductivityMetrics> {
        let now = Utc::now().timestamp();
        let tasks = self.all_tasks().await?;
        Ok(ProductivityMetrics {
            throughput: calc::throughput(&tasks, now),
            lead_time_days: calc::lead_time(&tasks, now),
            cycle_time_days: calc::cycle_time(&tasks, now),
        })
    }

    /// Active-agent count and blocking-feedback age. Zeroed when the
    /// execution/agent stores were not configured.
    pub async fn get_collaboration_metrics(&self) -> Result<CollaborationMetrics> {
        let now = Utc::now().timestamp();
        let executions = self.all_executions().await?;
        let agents = self.all_agents().await?;
        let feedbacks = self.feedback.get_all_feedback().await?;
        Ok(CollaborationMetrics {
            active_agents: calc::active_agents(&executions, &agents, now),
            blocking_feedback_age_days: calc::blocking_feedback_age(&feedbacks, now),
        })
    }

    /// Tasks violating the health-score or staleness threshold.
    pub async fn lint(&self) -> Result<Vec<LintFinding>> {
        let now = Utc::now().timestamp();
        let tasks = self.all_tasks().await?;
        let mut findings = Vec::new();
        for task in &tasks {
            let mut reasons = Vec::new();
            if calc::health(std::slice::from_ref(task)) < self.config.task_min_score {
                reasons.push("low_health");
            }
            if calc::time_in_current_stage(task, now) > self.config.max_days_in_stage {
                reasons.push("stale");
            }
            if !reasons.is_empty() {
                findings.push(LintFinding { task_id: task.id.clone(), reasons });
            }
        }
        Ok(findings)
    }

    /// Data-model integrity sweep: the bidirectional task/cycle link
    /// invariant (spec.md §8) — every `task.cycleIds` entry must reference
    /// a cycle that in turn lists the task back in its `taskIds`. The cycle
    /// store is not wired into this adapter (it is read-only reporting
    /// over tasks/feedback/executions), so this checks what is reachable
    /// from the task side: each `cycleId` is non-empty and each task
    /// appears at most once per cycle reference.
    pub async fn audit(&self) -> Result<Vec<AuditFinding>> {
        let tasks = self.all_tasks().await?;
        let mut findings = Vec::new();
        for task in &tasks {
            let mut seen = std::collections::HashSet::new();
            for cycle_id in &task.cycle_ids {
                if cycle_id.trim().is_empty() {
                    findings.push(AuditFinding {
                        record_id: task.id.clone(),
                        description: "task references an empty cycleId".to_string(),
                    });
                } else if !seen.insert(cycle_id.as_str()) {
                    findings.push(AuditFinding {
                        record_id: task.id.clone(),
                        description: format!("task lists cycle {cycle_id} more than once"),
                    });
                }
            }
        }
        Ok(findings)
    }
}
