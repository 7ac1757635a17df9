// SPDX-License-Identifier: MIT OR Apache-2.0
//! The agent adapter: agent manifest CRUD anchored to a `type == "agent"` actor.

use std::sync::Arc;

use gitgov_eventbus::{event_types, Event, EventBus};
use gitgov_factory::{ActorType, AgentFactory, AgentInput, AgentPayload, AgentStatus};
use gitgov_identity::{decode_signing_key, IdentityAdapter};
use gitgov_record::{apply_signature, checksum, sign, Kind, UnsignedRecord};
use gitgov_store::{KeyProvider, RecordStore};
use serde_json::json;

use crate::error::{AgentError, Result};

/// Coordinates agent manifests: each manifest is anchored to an identity
/// actor of `type == "agent"`, and is itself signed by that actor's key
/// (no mock-signature fallback — an agent without a private key cannot
/// register).
pub struct AgentAdapter {
    store: Arc<dyn RecordStore<AgentPayload>>,
    keys: Arc<dyn KeyProvider>,
    identity: Arc<IdentityAdapter>,
    bus: EventBus,
}

impl AgentAdapter {
    /// Wire an adapter to its store, key provider, the shared identity
    /// adapter, and the shared event bus.
    #[must_use]
    pub fn new(
        store: Arc<dyn RecordStore<AgentPayload>>,
        keys: Arc<dyn KeyProvider>,
        identity: Arc<IdentityAdapter>,
        bus: EventBus,
    ) -> Self {
        Self { store, keys, identity, bus }
    }

    async fn require_agent_actor(&self, id: &str) -> Result<()> {
        let actor = self
            .identity
            .get_actor(id)
            .await?
            .ok_or_else(|| AgentError::ActorNotFound(id.to_string()))?;
        if actor.actor_type != ActorType::Agent {
            return Err(AgentError::ActorNotAgent(id.to_string()));
        }
        Ok(())
    }

    /// Build, sign, and persist a new agent manifest. Requires an existing
    /// `type == "agent"` actor at `input.id` and that actor's private key.
    /// Emits `identity.agent.registered`.
    pub async fn create(&self, input: AgentInput) -> Result<AgentPayload> {
        let payload = AgentFactory::create(input)?;
        self.require_agent_actor(&payload.id).await?;

        let record = self.sign_and_wrap(&payload).await?;
        self.store.put(&payload.id, record).await?;

        self.bus
            .publish(Event::new(
                event_types::AGENT_REGISTERED,
                "agent",
                json!({ "agentId": payload.id }),
            ))
            .await;

        Ok(payload)
    }

    /// Replace an agent's manifest fields, re-signing and re-persisting.
    /// The id is immutable.
    ///
    /// # Errors
    /// Returns [`AgentError::AgentIdImmutable`] if `payload.id != existing.id`.
    pub async fn update(&self, payload: AgentPayload) -> Result<AgentPayload> {
        let existing = self
            .get(&payload.id)
            .await?
            .ok_or_else(|| AgentError::AgentNotFound(payload.id.clone()))?;
        if payload.id != existing.id {
            return Err(AgentError::AgentIdImmutable);
        }
        AgentFactory::validate(&payload)?;

        let record = self.sign_and_wrap(&payload).await?;
        self.store.put(&payload.id, record).await?;
        Ok(payload)
    }

    /// Update with `status = archived`.
    pub async fn archive(&self, id: &str) -> Result<AgentPayload> {
        let mut payload = self
            .get(id)
            .await?
            .ok_or_else(|| AgentError::AgentNotFound(id.to_string()))?;
        payload.status = AgentStatus::Archived;
        self.update(payload).await
    }

    /// Direct store read; `None` for a missing agent.
    pub async fn get(&self, id: &str) -> Result<Option<AgentPayload>> {
        Ok(self.store.get(id).await?.map(|r| r.payload))
    }

    /// Direct store read of every agent manifest.
    pub async fn list(&self) -> Result<Vec<AgentPayload>> {
        let mut agents = Vec::new();
        for id in self.store.list().await? {
            if let Some(record) = self.store.get(&id).await? {
                agents.push(record.payload);
            }
        }
        Ok(agents)
    }

    async fn sign_and_wrap(&self, payload: &AgentPayload) -> Result<gitgov_record::Record<AgentPayload>> {
        let priv_key_b64 = self
            .keys
            .get(&payload.id)
            .await?
            .ok_or_else(|| AgentError::PrivateKeyNotFound(payload.id.clone()))?;
        let signing_key = decode_signing_key(&priv_key_b64)
            .ok_or_else(|| AgentError::PrivateKeyNotFound(payload.id.clone()))?;

        let unsigned = UnsignedRecord::new(Kind::Agent, payload.clone())?;
        let new_sig = sign(payload, &signing_key, &payload.id, "agent", "agent manifest signature")?;

        if let Some(mut record) = self.store.get(&payload.id).await? {
            record.payload = payload.clone();
            record.header.payload_checksum = checksum(payload)?;
            apply_signature(&mut record.header.signatures, new_sig);
            Ok(record)
        } else {
            Ok(unsigned.into_signed(new_sig))
        }
    }
}
