// SPDX-License-Identifier: MIT OR Apache-2.0
//! Pure aggregation functions over already-fetched payload slices. No I/O,
//! no events — callers (the adapter in `adapter.rs`) own fetching.

use std::collections::HashMap;

use gitgov_factory::{id_timestamp, AgentPayload, ExecutionPayload, FeedbackPayload, FeedbackStatus, FeedbackType, TaskPayload, TaskStatus};

const SECONDS_PER_DAY: f64 = 86_400.0;

fn age_days(id: &str, now: i64) -> f64 {
    match id_timestamp(id) {
        Some(ts) => ((now - ts) as f64 / SECONDS_PER_DAY).max(0.0),
        None => 0.0,
    }
}

/// `(now - idTimestamp(task)) / 86400`, clamped to `>= 0`.
#[must_use]
pub fn time_in_current_stage(task: &TaskPayload, now: i64) -> f64 {
    age_days(&task.id, now)
}

/// Max staleness across tasks: the age of each task's most recent
/// execution. `0` if no executions are supplied (no executions store
/// configured, or it is empty).
#[must_use]
pub fn staleness_index(tasks: &[TaskPayload], executions: &[ExecutionPayload], now: i64) -> f64 {
    if executions.is_empty() {
        return 0.0;
    }
    let mut last_execution: HashMap<&str, i64> = HashMap::new();
    for e in executions {
        let ts = id_timestamp(&e.id).unwrap_or(0);
        last_execution
            .entry(e.task_id.as_str())
            .and_modify(|prev| *prev = (*prev).max(ts))
            .or_insert(ts);
    }
    tasks
        .iter()
        .filter_map(|t| last_execution.get(t.id.as_str()))
        .map(|ts| ((now - ts) as f64 / SECONDS_PER_DAY).max(0.0))
        .fold(0.0, f64::max)
}

/// Max age (days) of `open` `blocking` feedbacks. `0` if none.
#[must_use]
pub fn blocking_feedback_age(feedbacks: &[FeedbackPayload], now: i64) -> f64 {
    feedbacks
        .iter()
        .filter(|f| f.feedback_type == FeedbackType::Blocking && f.status == FeedbackStatus::Open)
        .map(|f| age_days(&f.id, now))
        .fold(0.0, f64::max)
}

fn status_weight(status: TaskStatus) -> f64 {
    match status {
        TaskStatus::Done | TaskStatus::Archived => 100.0,
        TaskStatus::Active => 80.0,
        TaskStatus::Ready => 60.0,
        TaskStatus::Review => 40.0,
        TaskStatus::Draft => 20.0,
        TaskStatus::Paused => 0.0,
        TaskStatus::Discarded => 0.0,
    }
}

/// Weighted health over `0..=100`: `sum(weight(status)) / (len * 100)`,
/// rounded. `0` for an empty slice (never divides by zero).
#[must_use]
pub fn health(tasks: &[TaskPayload]) -> f64 {
    if tasks.is_empty() {
        return 0.0;
    }
    let sum: f64 = tasks.iter().map(|t| status_weight(t.status)).sum();
    (sum / (tasks.len() as f64 * 100.0) * 100.0).round()
}

fn status_label(status: TaskStatus) -> &'static str {
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

/// Percent of tasks at each status. Empty map for an empty slice.
#[must_use]
pub fn backlog_distribution(tasks: &[TaskPayload]) -> HashMap<String, f64> {
    let mut counts: HashMap<&'static str, usize> = HashMap::new();
    for t in tasks {
        *counts.entry(status_label(t.status)).or_insert(0) += 1;
    }
    let total = tasks.len() as f64;
    counts
        .into_iter()
        .map(|(status, n)| (status.to_string(), (n as f64 / total * 100.0 * 100.0).round() / 100.0))
        .collect()
}

/// Count of tasks whose id timestamp falls within the last `86400` s.
#[must_use]
pub fn tasks_created_today(tasks: &[TaskPayload], now: i64) -> usize {
    tasks.iter().filter(|t| age_days(&t.id, now) <= 1.0).count()
}

/// Tasks that reached `done`/`archived` and whose id timestamp (the best
/// proxy available for completion time) falls within the last 7 days.
#[must_use]
pub fn throughput(tasks: &[TaskPayload], now: i64) -> usize {
    tasks
        .iter()
        .filter(|t| matches!(t.status, TaskStatus::Done | TaskStatus::Archived) && age_days(&t.id, now) <= 7.0)
        .count()
}

/// Average age (days) of `done`/`archived` tasks. `0` if none.
#[must_use]
pub fn lead_time(tasks: &[TaskPayload], now: i64) -> f64 {
    let done: Vec<f64> = tasks
        .iter()
        .filter(|t| matches!(t.status, TaskStatus::Done | TaskStatus::Archived))
        .map(|t| age_days(&t.id, now))
        .collect();
    if done.is_empty() {
        return 0.0;
    }
    done.iter().sum::<f64>() / done.len() as f64
}

/// Approximation per spec: `0.3 * leadTime`.
#[must_use]
pub fn cycle_time(tasks: &[TaskPayload], now: i64) -> f64 {
    0.3 * lead_time(tasks, now)
}

/// Count of distinct agent actor ids that performed an execution within
/// the last 24h.
#[must_use]
pub fn active_agents(executions: &[ExecutionPayload], agents: &[AgentPayload], now: i64) -> usize {
    let agent_ids: std::collections::HashSet<&str> = agents.iter().map(|a| a.id.as_str()).collect();
    let mut seen = std::collections::HashSet::new();
    for e in executions {
        if age_days(&e.id, now) <= 1.0 && agent_ids.contains(e.actor_id.as_str()) {
            seen.insert(e.actor_id.as_str());
        }
    }
    seen.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use gitgov_factory::{TaskFactory, TaskInput};

    fn task(title: &str, status: TaskStatus, now: i64, age_seconds: i64) -> TaskPayload {
        let mut p = TaskFactory::create(
            TaskInput { title: Some(title.into()), ..Default::default() },
            now - age_seconds,
        )
        .unwrap();
        p.status = status;
        p
    }

    #[test]
    fn health_is_zero_for_empty() {
        assert_eq!(health(&[]), 0.0);
    }

    #[test]
    fn health_weights_statuses() {
        let now = 1_000_000;
        let tasks = vec![task("a", TaskStatus::Done, now, 0), task("b", TaskStatus::Paused, now, 0)];
        assert_eq!(health(&tasks), 50.0);
    }

    #[test]
    fn time_in_current_stage_clamps_to_zero() {
        let now = 1_000_000;
        let t = task("a", TaskStatus::Draft, now, -10);
        assert_eq!(time_in_current_stage(&t, now), 0.0);
    }

    #[test]
    fn backlog_distribution_sums_to_roughly_100() {
        let now = 1_000_000;
        let tasks = vec![
            task("a", TaskStatus::Draft, now, 0),
            task("b", TaskStatus::Draft, now, 0),
            task("c", TaskStatus::Done, now, 0),
        ];
        let dist = backlog_distribution(&tasks);
        let total: f64 = dist.values().sum();
        assert!((total - 100.0).abs() < 0.01);
        assert_eq!(dist["draft"], (2.0 / 3.0 * 100.0 * 100.0).round() / 100.0);
    }

    #[test]
    fn tasks_created_today_counts_recent() {
        let now = 1_000_000;
        let tasks = vec![
            task("a", TaskStatus::Draft, now, 3600),
            task("b", TaskStatus::Draft, now, 90_000),
        ];
        assert_eq!(tasks_created_today(&tasks, now), 1);
    }

    #[test]
    fn staleness_index_zero_without_executions() {
        let now = 1_000_000;
        let tasks = vec![task("a", TaskStatus::Active, now, 0)];
        assert_eq!(staleness_index(&tasks, &[], now), 0.0);
    }
}
