// SPDX-License-Identifier: MIT OR Apache-2.0
//! Filesystem-backed `RecordStore`/`KeyProvider`/`SessionManager` backends,
//! reproducing the `.gitgov/` on-disk layout (spec.md §6): one subdirectory
//! per record kind, one JSON file per record at two-space indentation, a
//! colon-to-underscore `safeId` escape for actor/agent ids (git refs and some
//! filesystems choke on `:`), key files alongside their actor at mode `0600`,
//! and a single `.session.json` for process-wide session state.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use gitgov_record::Record;
use serde::{de::DeserializeOwned, Serialize};
use tokio::fs;

use crate::error::{Result, StoreError};
use crate::traits::{KeyProvider, RecordStore, SessionManager};

/// Escape an id for use as a filename: actor/agent ids contain `:`, which we
/// replace with `_` so the file is a single path segment on every OS.
fn safe_id(id: &str) -> String {
    id.replace(':', "_")
}

async fn ensure_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).await?;
    Ok(())
}

async fn write_json_pretty(path: &Path, value: &impl Serialize) -> Result<()> {
    let body = serde_json::to_string_pretty(value)?;
    fs::write(path, body).await?;
    Ok(())
}

#[cfg(unix)]
async fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = fs::metadata(path).await?.permissions();
    perms.set_mode(0o600);
    fs::set_permissions(path, perms).await?;
    Ok(())
}

#[cfg(not(unix))]
async fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

/// A [`RecordStore`] persisting each record as `<root>/<kind_dir>/<safeId>.json`.
pub struct FsStore<T> {
    dir: PathBuf,
    _marker: PhantomData<T>,
}

impl<T> FsStore<T> {
    /// Open a store rooted at `dir` (e.g. `.gitgov/tasks`). The directory is
    /// created lazily on first write, not here.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            _marker: PhantomData,
        }
    }

    fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", safe_id(id)))
    }
}

#[async_trait]
impl<T> RecordStore<T> for FsStore<T>
where
    T: Serialize + DeserializeOwned + Send + Sync + Clone,
{
    async fn get(&self, id: &str) -> Result<Option<Record<T>>> {
        let path = self.path_for(id);
        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn put(&self, id: &str, record: Record<T>) -> Result<()> {
        ensure_dir(&self.dir).await?;
        write_json_pretty(&self.path_for(id), &record).await
    }

    async fn delete(&self, id: &str) -> Result<()> {
        match fs::remove_file(self.path_for(id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn list(&self) -> Result<Vec<String>> {
        let mut ids = Vec::new();
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(ids),
            Err(e) => return Err(e.into()),
        };
        while let Some(entry) = entries.next_entry().await? {
            if let Some(stem) = entry.path().file_stem().and_then(|s| s.to_str()) {
                ids.push(stem.to_string());
            }
        }
        ids.sort();
        Ok(ids)
    }

    async fn exists(&self, id: &str) -> Result<bool> {
        Ok(fs::try_exists(self.path_for(id)).await?)
    }
}

/// A [`KeyProvider`] persisting each private key as
/// `<root>/<safeId>.key`, created at file mode `0600` on unix.
pub struct FsKeyProvider {
    dir: PathBuf,
}

impl FsKeyProvider {
    /// Open a key provider rooted at `dir` (e.g. `.gitgov/.keys`).
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, actor_id: &str) -> PathBuf {
        self.dir.join(format!("{}.key", safe_id(actor_id)))
    }
}

#[async_trait]
impl KeyProvider for FsKeyProvider {
    async fn get(&self, actor_id: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.path_for(actor_id)).await {
            Ok(key) => Ok(Some(key)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, actor_id: &str, private_key_b64: &str) -> Result<()> {
        ensure_dir(&self.dir).await?;
        let path = self.path_for(actor_id);
        fs::write(&path, private_key_b64).await?;
        restrict_permissions(&path).await?;
        Ok(())
    }

    async fn has(&self, actor_id: &str) -> Result<bool> {
        Ok(fs::try_exists(self.path_for(actor_id)).await?)
    }

    async fn delete(&self, actor_id: &str) -> Result<()> {
        match fs::remove_file(self.path_for(actor_id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[derive(Debug, Default, Serialize, serde::Deserialize)]
struct SessionFile {
    current_actor_id: Option<String>,
    #[serde(default)]
    actor_states: HashMap<String, serde_json::Value>,
}

/// A [`SessionManager`] persisting session state as a single
/// `<root>/.session.json` file, rewritten in full on every mutation.
pub struct FsSessionManager {
    path: PathBuf,
    state: tokio::sync::Mutex<SessionFile>,
}

impl FsSessionManager {
    /// Point at `<root>/.session.json`. Call [`FsSessionManager::load_session`]
    /// before reading state.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            path: root.into().join(".session.json"),
            state: tokio::sync::Mutex::new(SessionFile::default()),
        }
    }

    async fn persist(&self, state: &SessionFile) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            ensure_dir(parent).await?;
        }
        write_json_pretty(&self.path, state).await
    }
}

#[async_trait]
impl SessionManager for FsSessionManager {
    async fn load_session(&self) -> Result<()> {
        let loaded = match fs::read(&self.path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| StoreError::Invalid(format!("corrupt session file: {e}")))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => SessionFile::default(),
            Err(e) => return Err(e.into()),
        };
        *self.state.lock().await = loaded;
        Ok(())
    }

    async fn current_actor_id(&self) -> Result<Option<String>> {
        Ok(self.state.lock().await.current_actor_id.clone())
    }

    async fn set_current_actor_id(&self, actor_id: Option<String>) -> Result<()> {
        let mut state = self.state.lock().await;
        state.current_actor_id = actor_id;
        self.persist(&state).await
    }

    async fn get_actor_state(&self, actor_id: &str) -> Result<Option<serde_json::Value>> {
        Ok(self.state.lock().await.actor_states.get(actor_id).cloned())
    }

    async fn update_actor_state(&self, actor_id: &str, new_state: serde_json::Value) -> Result<()> {
        let mut state = self.state.lock().await;
        state.actor_states.insert(actor_id.to_string(), new_state);
        self.persist(&state).await
    }

    async fn migrate_actor_state(&self, from: &str, to: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        if let Some(value) = state.actor_states.remove(from) {
            state.actor_states.insert(to.to_string(), value);
        }
        if state.current_actor_id.as_deref() == Some(from) {
            state.current_actor_id = Some(to.to_string());
        }
        self.persist(&state).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gitgov_record::{Header, Kind, Signature};
    use tempfile::tempdir;

    fn sample_record() -> Record<u32> {
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
            payload: 7,
        }
    }

    #[tokio::test]
    async fn fs_store_round_trips_and_lists() {
        let dir = tempdir().unwrap();
        let store: FsStore<u32> = FsStore::new(dir.path().join("tasks"));

        assert!(!store.exists("1753-task-a").await.unwrap());
        store.put("1753-task-a", sample_record()).await.unwrap();
        assert!(store.exists("1753-task-a").await.unwrap());

        let loaded = store.get("1753-task-a").await.unwrap().unwrap();
        assert_eq!(loaded.payload, 7);
        assert_eq!(store.list().await.unwrap(), vec!["1753-task-a".to_string()]);

        store.delete("1753-task-a").await.unwrap();
        assert!(store.get("1753-task-a").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn fs_store_escapes_colons_in_actor_ids() {
        let dir = tempdir().unwrap();
        let store: FsStore<u32> = FsStore::new(dir.path().join("actors"));
        store.put("human:alice", sample_record()).await.unwrap();
        assert!(dir.path().join("actors").join("human_alice.json").exists());
    }

    #[tokio::test]
    async fn fs_key_provider_round_trips() {
        let dir = tempdir().unwrap();
        let kp = FsKeyProvider::new(dir.path().join(".keys"));
        kp.set("human:alice", "base64key").await.unwrap();
        assert!(kp.has("human:alice").await.unwrap());
        assert_eq!(kp.get("human:alice").await.unwrap().unwrap(), "base64key");

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let meta = std::fs::metadata(dir.path().join(".keys").join("human_alice.key")).unwrap();
            assert_eq!(meta.permissions().mode() & 0o777, 0o600);
        }
    }

    #[tokio::test]
    async fn fs_session_manager_persists_across_instances() {
        let dir = tempdir().unwrap();
        {
            let sm = FsSessionManager::new(dir.path());
            sm.load_session().await.unwrap();
            sm.set_current_actor_id(Some("human:alice".into()))
                .await
                .unwrap();
        }
        let sm2 = FsSessionManager::new(dir.path());
        sm2.load_session().await.unwrap();
        assert_eq!(
            sm2.current_actor_id().await.unwrap(),
            Some("human:alice".to_string())
        );
    }
}
