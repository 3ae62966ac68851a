//! StateStore trait: where session state lives between tool calls.
//!
//! The tool context only needs load/save; implementations decide the
//! format. [`JsonFileStore`] is the default, [`MemoryStateStore`] is for
//! tests and ephemeral hosts.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::Result;
use crate::session::SessionState;

/// Persistence for [`SessionState`].
pub trait StateStore: Send + Sync {
    /// Load the stored state, or an empty state if nothing is stored yet.
    fn load(&self) -> Result<SessionState>;

    /// Replace the stored state.
    fn save(&self, state: &SessionState) -> Result<()>;
}

/// Session state kept in a JSON file.
///
/// Writes go to a sibling temp file first and are renamed into place, so a
/// crash mid-write leaves the previous state intact.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Store state at `path`. The file need not exist yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StateStore for JsonFileStore {
    fn load(&self) -> Result<SessionState> {
        if !self.path.exists() {
            return Ok(SessionState::default());
        }
        let raw = fs::read_to_string(&self.path)?;
        if raw.trim().is_empty() {
            return Ok(SessionState::default());
        }
        Ok(serde_json::from_str(&raw)?)
    }

    fn save(&self, state: &SessionState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(state)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// In-memory state store.
#[derive(Default)]
pub struct MemoryStateStore {
    state: Mutex<SessionState>,
}

impl MemoryStateStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStateStore {
    fn load(&self) -> Result<SessionState> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        Ok(state.clone())
    }

    fn save(&self, state: &SessionState) -> Result<()> {
        let mut stored = self.state.lock().unwrap_or_else(|e| e.into_inner());
        *stored = state.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use knet_core::{EntityKind, Uuid};

    #[test]
    fn test_json_store_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("state.json"));
        assert_eq!(store.load().unwrap(), SessionState::default());
    }

    #[test]
    fn test_json_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested/state.json"));

        let mut state = SessionState::new();
        let now = Utc::now();
        state.record(Uuid::new_v4(), EntityKind::Fragment, "hello", now);
        state.cache_tag("physics", Uuid::new_v4(), now, 300);

        store.save(&state).unwrap();
        assert_eq!(store.load().unwrap(), state);
        assert!(!store.path().with_extension("json.tmp").exists());
    }

    #[test]
    fn test_json_store_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "{not json").unwrap();
        assert!(JsonFileStore::new(path).load().is_err());
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryStateStore::new();
        let mut state = store.load().unwrap();
        state.record(Uuid::new_v4(), EntityKind::Tag, "t", Utc::now());
        store.save(&state).unwrap();
        assert_eq!(store.load().unwrap().recent.len(), 1);
    }
}
