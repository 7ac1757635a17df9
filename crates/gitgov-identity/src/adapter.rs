// SPDX-License-Identifier: MIT OR Apache-2.0
//! The identity adapter: actor CRUD, signing, revocation, and key rotation.

use std::sync::Arc;

use gitgov_eventbus::{event_types, Event, EventBus};
use gitgov_factory::{ActorFactory, ActorInput, ActorPayload, ActorStatus, ActorType};
use gitgov_record::{apply_signature, checksum, sign, verify, Kind, Record, Signature, UnsignedRecord};
use gitgov_store::{KeyProvider, RecordStore, SessionManager};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::json;
use tracing::warn;

use crate::error::{IdentityError, Result};
use crate::keys::{decode_signing_key, decode_verifying_key, encode_signing_key, generate_keypair};

static ROTATION_SUFFIX_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"-v(\d+)$").expect("valid regex"));

const MOCK_SIGNATURE: &str = "mock-signature";
const MAX_SUCCESSION_DEPTH: usize = 256;

/// Caller-supplied fields for [`IdentityAdapter::create_actor`]. The
/// adapter generates the keypair itself; callers never supply a public key.
#[derive(Debug, Clone)]
pub struct CreateActorInput {
    /// Human or agent.
    pub actor_type: ActorType,
    /// Display name for UIs.
    pub display_name: String,
    /// Roles; defaults to `["author"]` when empty.
    pub roles: Vec<String>,
}

/// Why an actor is being revoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevokeReason {
    /// The actor's private key is believed compromised.
    Compromised,
    /// Superseded by a rotated key.
    Rotation,
    /// Manually revoked by an operator.
    Manual,
}

fn derive_rotated_id(id: &str) -> String {
    if let Some(caps) = ROTATION_SUFFIX_RE.captures(id) {
        let n: u32 = caps[1].parse().unwrap_or(1);
        let start = caps.get(0).unwrap().start();
        format!("{}-v{}", &id[..start], n + 1)
    } else {
        format!("{id}-v2")
    }
}

/// Coordinates actor identity: creation (self-signing bootstrap), signing
/// other records on an actor's behalf, revocation, and key rotation with
/// succession chains. Adapters are wired as capability interfaces
/// (`Arc<dyn Trait>`), not concrete store types, so the rest of the system
/// never depends on which backend is in play.
pub struct IdentityAdapter {
    store: Arc<dyn RecordStore<ActorPayload>>,
    keys: Arc<dyn KeyProvider>,
    session: Arc<dyn SessionManager>,
    bus: EventBus,
}

impl IdentityAdapter {
    /// Wire an adapter to its store, key provider, session manager, and the
    /// shared event bus.
    #[must_use]
    pub fn new(
        store: Arc<dyn RecordStore<ActorPayload>>,
        keys: Arc<dyn KeyProvider>,
        session: Arc<dyn SessionManager>,
        bus: EventBus,
    ) -> Self {
        Self { store, keys, session, bus }
    }

    /// Create a new actor: generates an Ed25519 keypair, assembles and
    /// self-signs the record (`keyId == actorId`), persists it, and best-
    /// effort persists the private key. Emits `identity.actor.created`.
    pub async fn create_actor(&self, input: CreateActorInput) -> Result<ActorPayload> {
        let (signing_key, public_key) = generate_keypair();

        let payload = ActorFactory::create(ActorInput {
            actor_type: Some(input.actor_type),
            display_name: Some(input.display_name),
            public_key: Some(public_key),
            roles: input.roles,
        })?;

        let unsigned = UnsignedRecord::new(Kind::Actor, payload.clone())?;
        let self_sig = sign(&payload, &signing_key, &payload.id, "self", "bootstrap self-signature")?;
        let record = unsigned.into_signed(self_sig);

        let actor_id = payload.id.clone();
        let actor_public_key = payload.public_key.clone();
        verify(&record, |key_id| {
            (key_id == actor_id).then(|| decode_verifying_key(&actor_public_key)).flatten()
        })?;

        self.store.put(&payload.id, record).await?;

        if let Err(e) = self.keys.set(&payload.id, &encode_signing_key(&signing_key)).await {
            warn!(actor_id = %payload.id, error = %e, "failed to persist private key; continuing");
        }

        let is_bootstrap = self.store.list().await?.len() == 1;
        self.bus
            .publish(Event::new(
                event_types::ACTOR_CREATED,
                "identity",
                json!({ "actorId": payload.id, "isBootstrap": is_bootstrap }),
            ))
            .await;

        Ok(payload)
    }

    /// Direct store read; `None` for a missing actor.
    pub async fn get_actor(&self, id: &str) -> Result<Option<ActorPayload>> {
        Ok(self.store.get(id).await?.map(|r| r.payload))
    }

    /// Direct store read of every actor.
    pub async fn list_actors(&self) -> Result<Vec<ActorPayload>> {
        let mut actors = Vec::new();
        for id in self.store.list().await? {
            if let Some(record) = self.store.get(&id).await? {
                actors.push(record.payload);
            }
        }
        Ok(actors)
    }

    /// Re-sign an already-persisted record of any payload type. Recomputes
    /// the checksum against `record.payload`, loads the signing actor's
    /// private key (falling back to a well-marked mock signature if none is
    /// stored), and applies the placeholder-replace-or-append rule.
    ///
    /// # Errors
    /// Returns [`IdentityError::ActorNotFound`] if `actor_id` does not
    /// resolve to a persisted actor.
    pub async fn sign_record<T>(
        &self,
        mut record: Record<T>,
        actor_id: &str,
        role: &str,
        notes: &str,
    ) -> Result<Record<T>>
    where
        T: Serialize + DeserializeOwned + Clone + Send + Sync,
    {
        self.get_actor(actor_id)
            .await?
            .ok_or_else(|| IdentityError::ActorNotFound(actor_id.to_string()))?;

        record.header.payload_checksum = checksum(&record.payload)?;

        let new_sig = match self.keys.get(actor_id).await? {
            Some(priv_key_b64) => match decode_signing_key(&priv_key_b64) {
                Some(signing_key) => sign(&record.payload, &signing_key, actor_id, role, notes)?,
                None => {
                    warn!(actor_id, "stored private key is malformed; using mock signature");
                    mock_signature(actor_id, role, notes)
                }
            },
            None => {
                warn!(actor_id, "no private key available; using mock signature");
                mock_signature(actor_id, role, notes)
            }
        };

        apply_signature(&mut record.header.signatures, new_sig);
        Ok(record)
    }

    /// Flip `status` to `revoked`, record `supersededBy`, re-checksum, and
    /// persist. Emits `identity.actor.revoked`.
    pub async fn revoke_actor(
        &self,
        id: &str,
        reason: RevokeReason,
        superseded_by: Option<String>,
    ) -> Result<ActorPayload> {
        let mut record = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| IdentityError::ActorNotFound(id.to_string()))?;
        if record.payload.status == ActorStatus::Revoked {
            return Err(IdentityError::ActorAlreadyRevoked(id.to_string()));
        }

        record.payload.status = ActorStatus::Revoked;
        record.payload.superseded_by = superseded_by.clone();
        record.header.payload_checksum = checksum(&record.payload)?;

        self.store.put(id, record.clone()).await?;

        self.bus
            .publish(Event::new(
                event_types::ACTOR_REVOKED,
                "identity",
                json!({ "actorId": id, "reason": reason, "supersededBy": superseded_by }),
            ))
            .await;

        Ok(record.payload)
    }

    /// Generate a new keypair, derive a successor id (`-v2`, else bump
    /// `-vN`), persist the new active actor, revoke the old one with
    /// `reason=rotation`, and best-effort migrate session state and the new
    /// private key. Returns `(oldActor, newActor)`.
    pub async fn rotate_actor_key(&self, id: &str) -> Result<(ActorPayload, ActorPayload)> {
        let old = self
            .get_actor(id)
            .await?
            .ok_or_else(|| IdentityError::ActorNotFound(id.to_string()))?;
        if old.status == ActorStatus::Revoked {
            return Err(IdentityError::ActorAlreadyRevoked(id.to_string()));
        }

        let new_id = derive_rotated_id(id);
        let (signing_key, public_key) = generate_keypair();

        let new_payload = ActorPayload {
            id: new_id.clone(),
            actor_type: old.actor_type,
            display_name: old.display_name.clone(),
            public_key,
            roles: old.roles.clone(),
            status: ActorStatus::Active,
            superseded_by: None,
        };
        ActorFactory::validate(&new_payload)?;

        let unsigned = UnsignedRecord::new(Kind::Actor, new_payload.clone())?;
        let self_sig = sign(&new_payload, &signing_key, &new_id, "self", "key rotation self-signature")?;
        let record = unsigned.into_signed(self_sig);

        let resolver_id = new_id.clone();
        let resolver_key = new_payload.public_key.clone();
        verify(&record, |key_id| {
            (key_id == resolver_id).then(|| decode_verifying_key(&resolver_key)).flatten()
        })?;

        self.store.put(&new_id, record).await?;

        let old_actor = self
            .revoke_actor(id, RevokeReason::Rotation, Some(new_id.clone()))
            .await?;

        if let Err(e) = self.session.migrate_actor_state(id, &new_id).await {
            warn!(old_id = id, new_id = %new_id, error = %e, "failed to migrate session state");
        }
        if let Err(e) = self.keys.set(&new_id, &encode_signing_key(&signing_key)).await {
            warn!(new_id = %new_id, error = %e, "failed to persist rotated private key");
        }

        Ok((old_actor, new_payload))
    }

    /// Follow the `supersededBy` chain while the current actor is revoked,
    /// returning the first active id reached (or the last seen id if the
    /// chain ends on a revoked actor with no successor).
    pub async fn resolve_current_actor_id(&self, id: &str) -> Result<String> {
        let mut current = id.to_string();
        for _ in 0..MAX_SUCCESSION_DEPTH {
            let Some(actor) = self.get_actor(&current).await? else {
                return Ok(current);
            };
            if actor.status == ActorStatus::Revoked {
                if let Some(next) = actor.superseded_by {
                    current = next;
                    continue;
                }
            }
            return Ok(current);
        }
        Ok(current)
    }

    /// Read the session's current actor, resolve its succession chain, and
    /// return its actor record. Falls back to the first `active` actor, or
    /// fails [`IdentityError::NoActiveActor`].
    pub async fn get_current_actor(&self) -> Result<ActorPayload> {
        if let Some(session_id) = self.session.current_actor_id().await? {
            let resolved = self.resolve_current_actor_id(&session_id).await?;
            if let Some(actor) = self.get_actor(&resolved).await? {
                return Ok(actor);
            }
        }
        self.list_actors()
            .await?
            .into_iter()
            .find(|a| a.status == ActorStatus::Active)
            .ok_or(IdentityError::NoActiveActor)
    }

    /// `getActor(resolveCurrentActorId(agentId))` — the actor currently
    /// acting on behalf of `agent_id`'s succession chain.
    pub async fn get_effective_actor_for_agent(&self, agent_id: &str) -> Result<Option<ActorPayload>> {
        let resolved = self.resolve_current_actor_id(agent_id).await?;
        self.get_actor(&resolved).await
    }

    /// The public key for `key_id`, or `None`. Used as the resolver for
    /// signature verification.
    pub async fn get_actor_public_key(&self, key_id: &str) -> Result<Option<String>> {
        Ok(self.get_actor(key_id).await?.map(|a| a.public_key))
    }
}

fn mock_signature(key_id: &str, role: &str, notes: &str) -> Signature {
    Signature {
        key_id: key_id.to_string(),
        role: role.to_string(),
        notes: format!("mock signature (no private key available): {notes}"),
        signature: MOCK_SIGNATURE.to_string(),
        timestamp: chrono::Utc::now().timestamp(),
    }
}
