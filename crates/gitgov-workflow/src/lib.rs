// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]
#![warn(missing_docs)]
//! gitgov-workflow
//!
//! A JSON-declared workflow methodology engine: resolves transition rules,
//! validates signature gates, and evaluates custom rule predicates. Ships
//! two bundled methodologies (kanban, scrum); callers may also load a
//! user-supplied document via [`WorkflowMethodology::from_json`].

mod document;
mod error;
mod methodology;

pub use document::{
    CustomRuleDef, CustomRuleKind, MethodologyDocument, Requires, SignatureRule, TransitionEntry,
    ViewConfig,
};
pub use error::{Result, WorkflowError};
pub use methodology::{TransitionContext, WorkflowMethodology};
