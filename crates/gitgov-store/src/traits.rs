// SPDX-License-Identifier: MIT OR Apache-2.0
//! The three external collaborator interfaces GitGov's core consumes
//! (spec.md §6): `RecordStore<T>`, `KeyProvider`, `SessionManager`.

use async_trait::async_trait;
use gitgov_record::Record;
use serde::{de::DeserializeOwned, Serialize};

use crate::error::Result;

/// A typed key -> signed-record map. Implementations persist however they
/// like (memory, filesystem, a database); adapters only ever see this trait.
#[async_trait]
pub trait RecordStore<T>: Send + Sync
where
    T: Serialize + DeserializeOwned + Send + Sync + Clone,
{
    /// Fetch a record by id, or `None` if it does not exist.
    async fn get(&self, id: &str) -> Result<Option<Record<T>>>;

    /// Insert or overwrite the record at `id`.
    async fn put(&self, id: &str, record: Record<T>) -> Result<()>;

    /// Remove the record at `id`, if present.
    async fn delete(&self, id: &str) -> Result<()>;

    /// List every id currently stored.
    async fn list(&self) -> Result<Vec<String>>;

    /// Whether a record exists at `id`.
    async fn exists(&self, id: &str) -> Result<bool>;
}

/// An actorId -> private-key map.
///
/// Filesystem backends store the key alongside the actor's record file with
/// file mode `0600`; environment-variable backends map `actorId` to an
/// `UPPER_SNAKE` name under a configurable prefix (spec.md §6).
#[async_trait]
pub trait KeyProvider: Send + Sync {
    /// Fetch the private key for `actor_id`, base64-encoded, or `None`.
    async fn get(&self, actor_id: &str) -> Result<Option<String>>;

    /// Store (overwriting) the private key for `actor_id`.
    async fn set(&self, actor_id: &str, private_key_b64: &str) -> Result<()>;

    /// Whether a key is stored for `actor_id`.
    async fn has(&self, actor_id: &str) -> Result<bool>;

    /// Remove the stored key for `actor_id`, if present.
    async fn delete(&self, actor_id: &str) -> Result<()>;
}

/// Process-wide session state: which actor is "current", and small
/// per-actor state blobs adapters may stash (e.g. after key rotation).
#[async_trait]
pub trait SessionManager: Send + Sync {
    /// Load (or lazily initialize) the session.
    async fn load_session(&self) -> Result<()>;

    /// The currently active actor id, if any.
    async fn current_actor_id(&self) -> Result<Option<String>>;

    /// Set the currently active actor id.
    async fn set_current_actor_id(&self, actor_id: Option<String>) -> Result<()>;

    /// Fetch the stashed state blob for `actor_id`, if any.
    async fn get_actor_state(&self, actor_id: &str) -> Result<Option<serde_json::Value>>;

    /// Replace the stashed state blob for `actor_id`.
    async fn update_actor_state(&self, actor_id: &str, state: serde_json::Value) -> Result<()>;

    /// Move `from`'s stashed state (and "current actor" pointer, if it was
    /// `from`) to `to`. Used by `rotateActorKey` to migrate session state to
    /// the new actor id; failures here are non-fatal to the caller.
    async fn migrate_actor_state(&self, from: &str, to: &str) -> Result<()>;
}
