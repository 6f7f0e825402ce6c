// ABOUTME: In-process RemoteRepository used for offline sessions and tests

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use super::{RemoteError, RemoteRepository, VersionTag};

/// One recorded call, for asserting on remote traffic
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCall {
    Get(String),
    Create(String),
    Update(String),
    Delete(String),
}

#[derive(Debug, Default)]
struct State {
    files: BTreeMap<String, (Vec<u8>, u64)>,
    next_version: u64,
    calls: Vec<RemoteCall>,
    offline: bool,
}

impl State {
    fn bump(&mut self) -> u64 {
        self.next_version += 1;
        self.next_version
    }
}

fn tag_for(version: u64) -> VersionTag {
    VersionTag::new(format!("v{version:08x}"))
}

/// Content store with the same optimistic-concurrency rules as a hosted remote
#[derive(Debug, Default)]
pub struct MemoryRemote {
    state: Mutex<State>,
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        // A poisoned lock only means another test thread panicked mid-call;
        // the map itself is still consistent
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Write a path as another client would, advancing its version tag
    pub fn put_external(&self, path: &str, content: &[u8]) -> VersionTag {
        let mut state = self.state();
        let version = state.bump();
        state.files.insert(path.to_string(), (content.to_vec(), version));
        tag_for(version)
    }

    /// Remove a path as another client would
    pub fn remove_external(&self, path: &str) {
        self.state().files.remove(path);
    }

    pub fn content(&self, path: &str) -> Option<Vec<u8>> {
        self.state().files.get(path).map(|(bytes, _)| bytes.clone())
    }

    pub fn paths(&self) -> Vec<String> {
        self.state().files.keys().cloned().collect()
    }

    /// Make every subsequent call fail as if the network were down
    pub fn set_offline(&self, offline: bool) {
        self.state().offline = offline;
    }

    pub fn calls(&self) -> Vec<RemoteCall> {
        self.state().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    fn begin(&self, call: RemoteCall) -> Result<MutexGuard<'_, State>, RemoteError> {
        let mut state = self.state();
        state.calls.push(call);
        if state.offline {
            return Err(RemoteError::Network("remote is offline".to_string()));
        }
        Ok(state)
    }
}

#[async_trait::async_trait]
impl RemoteRepository for MemoryRemote {
    async fn probe(&self) -> Result<(), RemoteError> {
        if self.state().offline {
            return Err(RemoteError::Network("remote is offline".to_string()));
        }
        Ok(())
    }

    async fn get_content(&self, path: &str) -> Result<(Vec<u8>, VersionTag), RemoteError> {
        let state = self.begin(RemoteCall::Get(path.to_string()))?;
        state
            .files
            .get(path)
            .map(|(bytes, version)| (bytes.clone(), tag_for(*version)))
            .ok_or_else(|| RemoteError::NotFound(path.to_string()))
    }

    async fn create_file(
        &self,
        path: &str,
        content: &[u8],
        _message: &str,
    ) -> Result<VersionTag, RemoteError> {
        let mut state = self.begin(RemoteCall::Create(path.to_string()))?;
        if state.files.contains_key(path) {
            return Err(RemoteError::Conflict(path.to_string()));
        }
        let version = state.bump();
        state.files.insert(path.to_string(), (content.to_vec(), version));
        Ok(tag_for(version))
    }

    async fn update_file(
        &self,
        path: &str,
        content: &[u8],
        tag: &VersionTag,
        _message: &str,
    ) -> Result<VersionTag, RemoteError> {
        let mut state = self.begin(RemoteCall::Update(path.to_string()))?;
        match state.files.get(path) {
            None => return Err(RemoteError::NotFound(path.to_string())),
            Some((_, version)) if tag_for(*version) != *tag => {
                return Err(RemoteError::Conflict(path.to_string()))
            }
            Some(_) => {}
        }
        let version = state.bump();
        state.files.insert(path.to_string(), (content.to_vec(), version));
        Ok(tag_for(version))
    }

    async fn delete_file(
        &self,
        path: &str,
        tag: &VersionTag,
        _message: &str,
    ) -> Result<(), RemoteError> {
        let mut state = self.begin(RemoteCall::Delete(path.to_string()))?;
        match state.files.get(path) {
            None => Err(RemoteError::NotFound(path.to_string())),
            Some((_, version)) if tag_for(*version) != *tag => {
                Err(RemoteError::Conflict(path.to_string()))
            }
            Some(_) => {
                state.files.remove(path);
                Ok(())
            }
        }
    }
}
