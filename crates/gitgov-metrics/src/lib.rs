// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]
#![warn(missing_docs)]
//! gitgov-metrics
//!
//! Pure, read-only aggregations over the task/feedback/execution/agent
//! stores: health scoring, staleness, throughput, and active-agent counts.
//! No writes, no events. Tier 3/4 metrics named in earlier drafts of this
//! system are out of scope here and are not implemented.

mod adapter;
mod calc;
mod error;

pub use adapter::{
    AuditFinding, CollaborationMetrics, HealthThresholds, LintFinding, MetricsAdapter,
    ProductivityMetrics, SystemStatus, TaskHealth,
};
pub use error::{MetricsError, Result};
