// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]
#![warn(missing_docs)]
//! gitgov-factory
//!
//! Per-kind record factories and validators: each entity gets a
//! `XxxFactory::create(input, now) -> Result<XxxPayload, InvalidData>` that
//! fills defaults and validates, and a `XxxFactory::load(value) ->
//! Result<XxxPayload, InvalidData>` that validates an untrusted payload read
//! back from storage.

/// Agent manifest payload and factory.
pub mod agent;
/// Actor payload and factory.
pub mod actor;
/// Changelog payload and factory.
pub mod changelog;
/// The single error type this crate returns.
pub mod error;
/// Cycle payload and factory.
pub mod cycle;
/// Execution payload and factory.
pub mod execution;
/// Feedback payload and factory.
pub mod feedback;
/// Id generation and validation helpers.
pub mod ids;
/// Task payload and factory.
pub mod task;

pub use actor::{ActorFactory, ActorInput, ActorPayload, ActorStatus, ActorType};
pub use agent::{AgentFactory, AgentInput, AgentPayload, AgentStatus, EngineKind};
pub use changelog::{ChangelogFactory, ChangelogInput, ChangelogPayload};
pub use cycle::{CycleFactory, CycleInput, CyclePayload, CycleStatus};
pub use error::{InvalidData, Result};
pub use execution::{ExecutionFactory, ExecutionInput, ExecutionPayload};
pub use feedback::{
    EntityType, FeedbackFactory, FeedbackInput, FeedbackPayload, FeedbackStatus, FeedbackType,
};
pub use ids::{
    generate_actor_id, generate_changelog_id, generate_cycle_id, generate_execution_id,
    generate_feedback_id, generate_task_id, id_timestamp, slugify, validate_actor_id,
    validate_timestamped_id,
};
pub use task::{TaskFactory, TaskInput, TaskPayload, TaskStatus};
