use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use log::debug;
use tokio::sync::RwLock;

use super::conversation::ConversationState;
use crate::types::{AppError, AppResult};

/// Where conversation state survives between requests (and, for the file
/// store, between restarts).
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self, session_id: &str) -> AppResult<Option<ConversationState>>;

    async fn save(&self, session_id: &str, state: &ConversationState) -> AppResult<()>;

    async fn delete(&self, session_id: &str) -> AppResult<()>;
}

#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, ConversationState>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, session_id: &str) -> AppResult<Option<ConversationState>> {
        Ok(self.sessions.read().await.get(session_id).cloned())
    }

    async fn save(&self, session_id: &str, state: &ConversationState) -> AppResult<()> {
        self.sessions
            .write()
            .await
            .insert(session_id.to_string(), state.clone());
        Ok(())
    }

    async fn delete(&self, session_id: &str) -> AppResult<()> {
        self.sessions.write().await.remove(session_id);
        Ok(())
    }
}

/// One JSON file per session under `dir`.
pub struct FileSessionStore {
    dir: PathBuf,
}

impl FileSessionStore {
    pub async fn open(dir: impl AsRef<Path>) -> AppResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| AppError::Storage(format!("cannot create {}: {}", dir.display(), e)))?;
        Ok(Self { dir })
    }

    fn path_for(&self, session_id: &str) -> AppResult<PathBuf> {
        let valid = !session_id.is_empty()
            && session_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(AppError::SessionNotFound(session_id.to_string()));
        }
        Ok(self.dir.join(format!("{}.json", session_id)))
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn load(&self, session_id: &str) -> AppResult<Option<ConversationState>> {
        let path = self.path_for(session_id)?;
        let raw = match tokio::fs::read(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(AppError::Storage(format!("cannot read {}: {}", path.display(), e))),
        };
        let state = serde_json::from_slice(&raw)
            .map_err(|e| AppError::Storage(format!("corrupt session {}: {}", session_id, e)))?;
        Ok(Some(state))
    }

    async fn save(&self, session_id: &str, state: &ConversationState) -> AppResult<()> {
        let path = self.path_for(session_id)?;
        let raw = serde_json::to_vec_pretty(state)
            .map_err(|e| AppError::Storage(e.to_string()))?;

        // readers only ever see a complete file
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, raw)
            .await
            .map_err(|e| AppError::Storage(format!("cannot write {}: {}", tmp.display(), e)))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| AppError::Storage(format!("cannot write {}: {}", path.display(), e)))?;
        debug!("saved session {}", session_id);
        Ok(())
    }

    async fn delete(&self, session_id: &str) -> AppResult<()> {
        let path = self.path_for(session_id)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Storage(format!("cannot delete {}: {}", path.display(), e))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ConversationState {
        let mut state = ConversationState::new();
        state.begin_round("Plan a 2-day trip to Penang under $300");
        state.complete_round("Day 1: George Town");
        state
    }

    #[tokio::test]
    async fn memory_store_round_trips() {
        let store = MemorySessionStore::new();
        assert!(store.load("a").await.unwrap().is_none());

        let state = sample();
        store.save("a", &state).await.unwrap();
        assert_eq!(store.load("a").await.unwrap(), Some(state));

        store.delete("a").await.unwrap();
        assert!(store.load("a").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let id = "6f1c2a8e-0d1b-4c1e-9f7a-2b3c4d5e6f70";

        let store = FileSessionStore::open(dir.path()).await.unwrap();
        store.save(id, &sample()).await.unwrap();

        let reopened = FileSessionStore::open(dir.path()).await.unwrap();
        let loaded = reopened.load(id).await.unwrap().unwrap();
        assert_eq!(loaded.active.len(), 2);
        assert_eq!(loaded.active[1].content, "Day 1: George Town");

        reopened.delete(id).await.unwrap();
        assert!(reopened.load(id).await.unwrap().is_none());
        reopened.delete(id).await.unwrap();
    }

    #[tokio::test]
    async fn file_store_rejects_path_like_ids() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::open(dir.path()).await.unwrap();
        assert!(matches!(
            store.load("../etc/passwd").await,
            Err(AppError::SessionNotFound(_))
        ));
    }

    #[tokio::test]
    async fn corrupt_file_is_a_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join("bad.json"), b"{not json").await.unwrap();
        let store = FileSessionStore::open(dir.path()).await.unwrap();
        assert!(matches!(store.load("bad").await, Err(AppError::Storage(_))));
    }
}
