// ABOUTME: Session state for one connected workspace - binding, sync bookkeeping, and command history
//
// A session holds no command logic; the interpreter mutates it. Sessions bound
// to different repositories share nothing and can run side by side.

pub mod connect;

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::audit::{audit_log, AuditEntry};
use crate::models::{CommandResult, HistoryEntry, WorkspaceBinding};
use crate::remote::RemoteRepository;
use crate::sync::SyncCoordinator;
use crate::workspace::{WorkspaceError, WorkspaceStore};

pub use connect::{connect, connect_with, ConnectError};

pub struct Session {
    id: Uuid,
    binding: WorkspaceBinding,
    created_at: DateTime<Utc>,
    history: Vec<HistoryEntry>,
    pub(crate) store: WorkspaceStore,
    pub(crate) sync: SyncCoordinator,
}

impl Session {
    /// Start a session over an already provisioned workspace. The manifest
    /// file is created empty if the workspace does not have one.
    pub fn open(
        binding: WorkspaceBinding,
        remote: Arc<dyn RemoteRepository>,
        manifest_file: &str,
    ) -> Result<Self, WorkspaceError> {
        let store = WorkspaceStore::new(&binding.local_root);
        if store.ensure_file(manifest_file)? {
            info!(manifest = manifest_file, "Created empty manifest in {}", store.root().display());
        }

        let session = Self {
            id: Uuid::new_v4(),
            binding,
            created_at: Utc::now(),
            history: Vec::new(),
            store,
            sync: SyncCoordinator::new(remote),
        };
        info!(session_id = %session.id, repo = %session.binding.remote, "Session opened");
        Ok(session)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn binding(&self) -> &WorkspaceBinding {
        &self.binding
    }

    pub fn store(&self) -> &WorkspaceStore {
        &self.store
    }

    pub fn sync(&self) -> &SyncCoordinator {
        &self.sync
    }

    /// Every executed command, oldest first
    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub(crate) fn record(&mut self, command: &str, result: CommandResult) {
        self.history.push(HistoryEntry::new(command, result));
    }

    /// Attach session identity to an audit entry and log it
    pub(crate) fn audit(&self, entry: AuditEntry) {
        audit_log(entry.session(self.id, self.binding.remote.full_name()));
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("binding", &self.binding)
            .field("created_at", &self.created_at)
            .field("history_len", &self.history.len())
            .finish()
    }
}
