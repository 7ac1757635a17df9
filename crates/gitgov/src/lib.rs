// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]
#![warn(missing_docs)]
//! gitgov
//!
//! The top-level facade: wires every domain adapter (Identity, Agent,
//! Feedback, Workflow Methodology, Backlog, Metrics) against a shared event
//! bus and store backend, resolving the Backlog↔Feedback construction-order
//! dependency described in spec.md §9. A *library* crate — callers (a CLI, a
//! TUI, a bot) embed [`GitGov`] rather than run it as a service.

mod error;
mod facade;

pub use error::{GitGovError, Result};
pub use facade::GitGov;
