// SPDX-License-Identifier: MIT OR Apache-2.0
//! In-memory `RecordStore`/`KeyProvider`/`SessionManager` backends, used by
//! adapter unit tests and as the default for embedders supplying their own
//! persistence elsewhere.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use gitgov_record::Record;
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::RwLock;

use crate::error::Result;
use crate::traits::{KeyProvider, RecordStore, SessionManager};

/// An in-memory [`RecordStore`] backed by a `RwLock<HashMap<..>>`.
pub struct MemoryStore<T> {
    data: Arc<RwLock<HashMap<String, Record<T>>>>,
    _marker: PhantomData<T>,
}

impl<T> Default for MemoryStore<T> {
    fn default() -> Self {
        Self {
            data: Arc::new(RwLock::new(HashMap::new())),
            _marker: PhantomData,
        }
    }
}

impl<T> Clone for MemoryStore<T> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> MemoryStore<T> {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl<T> RecordStore<T> for MemoryStore<T>
where
    T: Serialize + DeserializeOwned + Send + Sync + Clone,
{
    async fn get(&self, id: &str) -> Result<Option<Record<T>>> {
        Ok(self.data.read().await.get(id).cloned())
    }

    async fn put(&self, id: &str, record: Record<T>) -> Result<()> {
        self.data.write().await.insert(id.to_string(), record);
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.data.write().await.remove(id);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<String>> {
        Ok(self.data.read().await.keys().cloned().collect())
    }

    async fn exists(&self, id: &str) -> Result<bool> {
        Ok(self.data.read().await.contains_key(id))
    }
}

/// An in-memory [`KeyProvider`].
#[derive(Clone, Default)]
pub struct MemoryKeyProvider {
    data: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryKeyProvider {
    /// Create an empty key provider.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyProvider for MemoryKeyProvider {
    async fn get(&self, actor_id: &str) -> Result<Option<String>> {
        Ok(self.data.read().await.get(actor_id).cloned())
    }

    async fn set(&self, actor_id: &str, private_key_b64: &str) -> Result<()> {
        self.data
            .write()
            .await
            .insert(actor_id.to_string(), private_key_b64.to_string());
        Ok(())
    }

    async fn has(&self, actor_id: &str) -> Result<bool> {
        Ok(self.data.read().await.contains_key(actor_id))
    }

    async fn delete(&self, actor_id: &str) -> Result<()> {
        self.data.write().await.remove(actor_id);
        Ok(())
    }
}

#[derive(Default)]
struct SessionData {
    current_actor_id: Option<String>,
    actor_states: HashMap<String, serde_json::Value>,
}

/// An in-memory [`SessionManager`].
#[derive(Clone, Default)]
pub struct MemorySessionManager {
    data: Arc<RwLock<SessionData>>,
}

impl MemorySessionManager {
    /// Create a fresh, empty session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionManager for MemorySessionManager {
    async fn load_session(&self) -> Result<()> {
        Ok(())
    }

    async fn current_actor_id(&self) -> Result<Option<String>> {
        Ok(self.data.read().await.current_actor_id.clone())
    }

    async fn set_current_actor_id(&self, actor_id: Option<String>) -> Result<()> {
        self.data.write().await.current_actor_id = actor_id;
        Ok(())
    }

    async fn get_actor_state(&self, actor_id: &str) -> Result<Option<serde_json::Value>> {
        Ok(self.data.read().await.actor_states.get(actor_id).cloned())
    }

    async fn update_actor_state(&self, actor_id: &str, state: serde_json::Value) -> Result<()> {
        self.data
            .write()
            .await
            .actor_states
            .insert(actor_id.to_string(), state);
        Ok(())
    }

    async fn migrate_actor_state(&self, from: &str, to: &str) -> Result<()> {
        let mut data = self.data.write().await;
        if let Some(state) = data.actor_states.remove(from) {
            data.actor_states.insert(to.to_string(), state);
        }
        if data.current_actor_id.as_deref() == Some(from) {
            data.current_actor_id = Some(to.to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gitgov_record::{Header, Kind, Signature};

    fn sample_record(v: u32) -> Record<u32> {
        Record {
            header: Header {
                version: "1.0".into(),
                kind: Kind::Task,
                payload_checksum: "abc".into(),
                signatures: vec![Signature {
                    key_id: "human:dev".into(),
                    role: "author".into(),
                    notes: "".into(),
                    signature: "sig".into(),
                    timestamp: 0,
                }],
            },
            payload: v,
        }
    }

    #[tokio::test]
    async fn memory_store_crud() {
        let store: MemoryStore<u32> = MemoryStore::new();
        assert!(!store.exists("a").await.unwrap());
        store.put("a", sample_record(1)).await.unwrap();
        assert!(store.exists("a").await.unwrap());
        assert_eq!(store.get("a").await.unwrap().unwrap().payload, 1);
        assert_eq!(store.list().await.unwrap(), vec!["a".to_string()]);
        store.delete("a").await.unwrap();
        assert!(!store.exists("a").await.unwrap());
    }

    #[tokio::test]
    async fn memory_key_provider_crud() {
        let kp = MemoryKeyProvider::new();
        assert!(!kp.has("human:dev").await.unwrap());
        kp.set("human:dev", "privkey").await.unwrap();
        assert!(kp.has("human:dev").await.unwrap());
        assert_eq!(kp.get("human:dev").await.unwrap().unwrap(), "privkey");
        kp.delete("human:dev").await.unwrap();
        assert!(!kp.has("human:dev").await.unwrap());
    }

    #[tokio::test]
    async fn memory_session_migrate() {
        let sm = MemorySessionManager::new();
        sm.set_current_actor_id(Some("human:alice".into()))
            .await
            .unwrap();
        sm.update_actor_state("human:alice", serde_json::json!({"x": 1}))
            .await
            .unwrap();

        sm.migrate_actor_state("human:alice", "human:alice-v2")
            .await
            .unwrap();

        assert_eq!(
            sm.current_actor_id().await.unwrap(),
            Some("human:alice-v2".to_string())
        );
        assert!(sm.get_actor_state("human:alice").await.unwrap().is_none());
        assert!(sm
            .get_actor_state("human:alice-v2")
            .await
            .unwrap()
            .is_some());
    }
}
