// SPDX-License-Identifier: MIT OR Apache-2.0
//! AgentRecord payload and factory.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{InvalidData, Result};
use crate::ids::validate_actor_id;

/// How an agent's work is executed.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineKind {
    /// Runs a local function/entrypoint in-process.
    Local {
        /// Module/binary entrypoint.
        entrypoint: String,
        /// Function name to invoke.
        function: String,
    },
    /// Calls a remote HTTP API.
    Api {
        /// Endpoint URL.
        url: String,
    },
}

/// Agent manifest lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    /// Agent is registered and runnable.
    Active,
    /// Agent manifest has been archived.
    Archived,
}

/// The `AgentRecord` payload (spec.md §3). `id` must equal the id of an
/// `ActorRecord` whose `type == "agent"`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AgentPayload {
    /// Id of the backing agent-typed actor.
    pub id: String,
    /// How this agent executes its work.
    pub engine: EngineKind,
    /// Lifecycle status.
    pub status: AgentStatus,
    /// Event names that trigger this agent.
    #[serde(default)]
    pub triggers: Vec<String>,
    /// Knowledge sources this agent depends on.
    #[serde(default)]
    pub knowledge_dependencies: Vec<String>,
    /// Free-form description of prompt/engine requirements.
    #[serde(default)]
    pub prompt_engine_requirements: String,
    /// Optional typed metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

/// Caller-supplied fields for [`AgentFactory::create`].
#[derive(Debug, Clone, Default)]
pub struct AgentInput {
    /// Id of the backing actor (must already exist with `type=="agent"`).
    pub id: Option<String>,
    /// Execution engine.
    pub engine: Option<EngineKind>,
    /// Trigger event names.
    pub triggers: Vec<String>,
    /// Knowledge dependencies.
    pub knowledge_dependencies: Vec<String>,
    /// Prompt/engine requirements text.
    pub prompt_engine_requirements: String,
    /// Optional metadata.
    pub metadata: Option<serde_json::Value>,
}

/// Factory for [`AgentPayload`].
pub struct AgentFactory;

impl AgentFactory {
    /// Build a complete, validated [`AgentPayload`]. Does not check that a
    /// matching `type=="agent"` actor exists — that precondition belongs to
    /// `gitgov-agent`'s adapter, which has access to the identity layer.
    ///
    /// # Errors
    /// Returns [`InvalidData`] if `id` or `engine` is missing, or `id` is
    /// not a syntactically valid actor id.
    pub fn create(input: AgentInput) -> Result<AgentPayload> {
        let id = input.id.ok_or_else(|| InvalidData::new("id is required"))?;
        validate_actor_id(&id)?;
        let engine = input
            .engine
            .ok_or_else(|| InvalidData::new("engine is required"))?;

        let payload = AgentPayload {
            id,
            engine,
            status: AgentStatus::Active,
            triggers: input.triggers,
            knowledge_dependencies: input.knowledge_dependencies,
            prompt_engine_requirements: input.prompt_engine_requirements,
            metadata: input.metadata,
        };
        Self::validate(&payload)?;
        Ok(payload)
    }

    /// Validate an already-complete payload.
    ///
    /// # Errors
    /// Returns [`InvalidData`] if `id` is not a valid actor id.
    pub fn validate(payload: &AgentPayload) -> Result<()> {
        validate_actor_id(&payload.id)
    }

    /// Validate and return a trusted [`AgentPayload`] loaded from storage.
    ///
    /// # Errors
    /// Returns [`InvalidData`] if the payload is malformed or invalid.
    pub fn load(value: serde_json::Value) -> Result<AgentPayload> {
        let payload: AgentPayload = serde_json::from_value(value)
            .map_err(|e| InvalidData::new(format!("malformed agent payload: {e}")))?;
        Self::validate(&payload)?;
        Ok(payload)
    }
}
