// SPDX-License-Identifier: MIT OR Apache-2.0
//! The JSON shape of a methodology document (spec.md §4.7), plus a
//! JSON-schema validated at load time.

use std::collections::HashMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A signature gate: which role must sign, which capability roles qualify,
/// and how many qualifying signatures are required.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SignatureRule {
    /// The signature role a qualifying signature must carry.
    pub role: String,
    /// Actor roles that make an actor eligible to satisfy this rule.
    pub capability_roles: Vec<String>,
    /// Minimum number of qualifying signatures required.
    pub min_approvals: u32,
}

/// The `requires` block of a transition: command hint, triggering event,
/// signature gates keyed by capability group, and custom rule ids.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct Requires {
    /// UX hint naming the CLI command that performs this transition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    /// The event type that triggers this transition automatically, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
    /// Signature gates, keyed by capability group name (`"__default__"` is
    /// the fallback group).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signatures: Option<HashMap<String, SignatureRule>>,
    /// Ids of custom rules (from the document's `custom_rules` map) that
    /// must all pass.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_rules: Option<Vec<String>>,
}

/// One entry of `state_transitions`: the states a target may be reached
/// from, and what reaching it requires.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TransitionEntry {
    /// Source states from which this target is reachable.
    pub from: Vec<String>,
    /// What must hold for the transition to be legal.
    #[serde(default)]
    pub requires: Requires,
}

/// Which built-in predicate a custom rule dispatches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum CustomRuleKind {
    /// A resolved `assignment` feedback exists for the task.
    AssignmentRequired,
    /// The task references at least one currently-active cycle.
    SprintCapacity,
    /// Epic-tagged tasks must be paused with at least one child cycle.
    EpicComplexity,
    /// Extension point: logged and always passes.
    Custom,
}

/// One entry of `custom_rules`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CustomRuleDef {
    /// Which built-in predicate this rule dispatches to.
    pub validation: CustomRuleKind,
}

/// A view configuration (board layout); not interpreted by this engine,
/// only round-tripped for consumers such as a CLI or UI.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ViewConfig {
    /// Column name -> the states rendered in that column.
    pub columns: HashMap<String, Vec<String>>,
    /// Free-form theme identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    /// Free-form layout identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<String>,
}

/// A full methodology document: `state_transitions`, `custom_rules`, and
/// optional `view_configs`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct MethodologyDocument {
    /// Methodology name, e.g. `"kanban"`.
    pub name: String,
    /// Methodology document version.
    pub version: String,
    /// Target state -> transition entry.
    pub state_transitions: HashMap<String, TransitionEntry>,
    /// Rule id -> custom rule definition.
    #[serde(default)]
    pub custom_rules: HashMap<String, CustomRuleDef>,
    /// View name -> view configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_configs: Option<HashMap<String, ViewConfig>>,
}

fn schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "required": ["name", "version", "state_transitions"],
        "properties": {
            "name": { "type": "string", "minLength": 1 },
            "version": { "type": "string", "minLength": 1 },
            "state_transitions": {
                "type": "object",
                "additionalProperties": {
                    "type": "object",
                    "required": ["from"],
                    "properties": {
                        "from": { "type": "array", "items": { "type": "string" } }
                    }
                }
            },
            "custom_rules": { "type": "object" },
            "view_configs": { "type": "object" }
        }
    })
}

impl MethodologyDocument {
    /// Parse and schema-validate a methodology document from JSON text.
    pub fn from_json(text: &str) -> crate::error::Result<Self> {
        let value: serde_json::Value = serde_json::from_str(text)
            .map_err(|e| crate::error::WorkflowError::InvalidDocument(e.to_string()))?;

        let compiled = jsonschema::validator_for(&schema())
            .map_err(|e| crate::error::WorkflowError::InvalidDocument(e.to_string()))?;
        if let Err(first) = compiled.validate(&value) {
            return Err(crate::error::WorkflowError::InvalidDocument(first.to_string()));
        }

        serde_json::from_value(value)
            .map_err(|e| crate::error::WorkflowError::InvalidDocument(e.to_string()))
    }
}
