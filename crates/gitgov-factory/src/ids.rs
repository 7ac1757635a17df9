// SPDX-License-Identifier: MIT OR Apache-2.0
//! Id generation and the shared slug/actor-id regexes.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{InvalidData, Result};

/// Matches a valid actor id: `(human|agent)(:[a-z0-9-]+)+`.
pub static ACTOR_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(human|agent)(:[a-z0-9-]+)+$").expect("valid regex"));

/// Matches a valid timestamped entity id: `{epoch}-{kind}-{slug}`.
fn timestamped_id_re(kind: &str) -> Regex {
    Regex::new(&format!(r"^(\d+)-{kind}-[a-z0-9-]+$")).expect("valid regex")
}

/// Kebab-case a free-text title: lowercase, non-alphanumeric runs become a
/// single `-`, trimmed, capped at 60 chars so ids stay filesystem-friendly.
#[must_use]
pub fn slugify(text: &str) -> String {
    let mut slug = String::new();
    let mut last_was_dash = false;
    for ch in text.chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch);
            last_was_dash = false;
        } else if !last_was_dash && !slug.is_empty() {
            slug.push('-');
            last_was_dash = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    if slug.is_empty() {
        slug.push_str("untitled");
    }
    slug.chars().take(60).collect()
}

/// Generate a task id: `{epochSeconds}-task-{slug}`.
#[must_use]
pub fn generate_task_id(title: &str, now_epoch_seconds: i64) -> String {
    format!("{now_epoch_seconds}-task-{}", slugify(title))
}

/// Generate a cycle id: `{epochSeconds}-cycle-{slug}`.
#[must_use]
pub fn generate_cycle_id(title: &str, now_epoch_seconds: i64) -> String {
    format!("{now_epoch_seconds}-cycle-{}", slugify(title))
}

/// Generate a feedback id: `{epochSeconds}-feedback-{slug}`.
#[must_use]
pub fn generate_feedback_id(content: &str, now_epoch_seconds: i64) -> String {
    format!("{now_epoch_seconds}-feedback-{}", slugify(content))
}

/// Generate an execution id: `{epochSeconds}-execution-{slug}`.
#[must_use]
pub fn generate_execution_id(summary: &str, now_epoch_seconds: i64) -> String {
    format!("{now_epoch_seconds}-execution-{}", slugify(summary))
}

/// Generate a changelog id: `{epochSeconds}-changelog-{slug}`.
#[must_use]
pub fn generate_changelog_id(summary: &str, now_epoch_seconds: i64) -> String {
    format!("{now_epoch_seconds}-changelog-{}", slugify(summary))
}

/// Generate an actor id: `{type}:{slug(displayName)}`, e.g. `human:ada`.
#[must_use]
pub fn generate_actor_id(actor_type: &str, display_name: &str) -> String {
    format!("{actor_type}:{}", slugify(display_name))
}

/// Validate that `id` matches the actor id regex.
pub fn validate_actor_id(id: &str) -> Result<()> {
    if ACTOR_ID_RE.is_match(id) {
        Ok(())
    } else {
        Err(InvalidData::new(format!("'{id}' is not a valid actor id")))
    }
}

/// Validate that `id` matches `{epoch}-{kind}-{slug}` and the leading
/// integer is a parseable, positive epoch-seconds timestamp.
pub fn validate_timestamped_id(id: &str, kind: &str) -> Result<i64> {
    let re = timestamped_id_re(kind);
    let caps = re
        .captures(id)
        .ok_or_else(|| InvalidData::new(format!("'{id}' is not a valid {kind} id")))?;
    let ts: i64 = caps[1]
        .parse()
        .map_err(|_| InvalidData::new(format!("'{id}' has an unparseable timestamp")))?;
    if ts <= 0 {
        return Err(InvalidData::new(format!(
            "'{id}' timestamp must be a positive integer"
        )));
    }
    Ok(ts)
}

/// Extract the leading epoch-seconds integer from any non-actor id.
///
/// Invariant (spec.md §3, "ID timestamp"): the leading integer of every
/// non-actor id is a parseable positive integer minted at creation.
pub fn id_timestamp(id: &str) -> Option<i64> {
    let prefix: String = id.chars().take_while(|c| c.is_ascii_digit()).collect();
    if prefix.is_empty() {
        return None;
    }
    prefix.parse().ok().filter(|ts| *ts > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_basic() {
        assert_eq!(slugify("Fix the Login Bug!"), "fix-the-login-bug");
        assert_eq!(slugify("  leading/trailing  "), "leading-trailing");
        assert_eq!(slugify(""), "untitled");
    }

    #[test]
    fn task_id_round_trips() {
        let id = generate_task_id("Fix login bug", 1_700_000_000);
        assert_eq!(id, "1700000000-task-fix-login-bug");
        let ts = validate_timestamped_id(&id, "task").unwrap();
        assert_eq!(ts, 1_700_000_000);
        assert_eq!(id_timestamp(&id), Some(1_700_000_000));
    }

    #[test]
    fn actor_id_regex() {
        assert!(validate_actor_id("human:dev").is_ok());
        assert!(validate_actor_id("agent:builder:v2").is_ok());
        assert!(validate_actor_id("robot:dev").is_err());
        assert!(validate_actor_id("human").is_err());
    }

    #[test]
    fn timestamped_id_rejects_wrong_kind() {
        let id = generate_task_id("x", 1);
        assert!(validate_timestamped_id(&id, "cycle").is_err());
    }
}
