// ABOUTME: Mirrors local workspace mutations onto the remote repository
//
// Pushes hide the create-vs-update split: the current remote version is
// fetched first, then the path is updated against that tag or created when the
// remote has never seen it. Failures are returned to the caller, never rolled
// back locally. Deleting a path that is already gone remotely counts as done.

use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::models::TrackedFile;
use crate::remote::{RemoteError, RemoteRepository, VersionTag};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("remote sync of {path} failed: {source}")]
pub struct SyncError {
    pub path: String,
    #[source]
    pub source: RemoteError,
}

impl SyncError {
    fn new(path: &str, source: RemoteError) -> Self {
        Self {
            path: path.to_string(),
            source,
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self.source, RemoteError::Conflict(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushOutcome {
    Created(VersionTag),
    Updated(VersionTag),
}

impl PushOutcome {
    pub fn tag(&self) -> &VersionTag {
        match self {
            PushOutcome::Created(tag) | PushOutcome::Updated(tag) => tag,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    AlreadyAbsent,
}

/// Sole caller into the remote for one session; owns the session's tracked files
pub struct SyncCoordinator {
    remote: Arc<dyn RemoteRepository>,
    tracked: BTreeMap<String, TrackedFile>,
}

impl SyncCoordinator {
    pub fn new(remote: Arc<dyn RemoteRepository>) -> Self {
        Self {
            remote,
            tracked: BTreeMap::new(),
        }
    }

    pub fn remote(&self) -> &Arc<dyn RemoteRepository> {
        &self.remote
    }

    pub fn tracked(&self, path: &str) -> Option<&TrackedFile> {
        self.tracked.get(path)
    }

    /// Record that a path exists locally without touching the remote
    pub fn track_local(&mut self, path: &str) {
        self.tracked
            .entry(path.to_string())
            .and_modify(|f| f.local_exists = true)
            .or_insert_with(|| TrackedFile::new(path));
    }

    /// The remote state of `path` is unknown after a failed call
    fn forget_version(&mut self, path: &str) {
        if let Some(file) = self.tracked.get_mut(path) {
            file.remote_version = None;
        }
    }

    /// Make the remote hold `content` at `path`.
    ///
    /// `message` overrides the default `Create <path>` / `Update <path>` commit message.
    pub async fn push(
        &mut self,
        path: &str,
        content: &[u8],
        message: Option<&str>,
    ) -> Result<PushOutcome, SyncError> {
        let outcome = match self.remote.get_content(path).await {
            Ok((_, tag)) => {
                let message = message.map_or_else(|| format!("Update {}", path), str::to_string);
                debug!(path, %tag, "Updating remote file");
                self.remote
                    .update_file(path, content, &tag, &message)
                    .await
                    .map(PushOutcome::Updated)
            }
            Err(RemoteError::NotFound(_)) => {
                let message = message.map_or_else(|| format!("Create {}", path), str::to_string);
                debug!(path, "Creating remote file");
                self.remote
                    .create_file(path, content, &message)
                    .await
                    .map(PushOutcome::Created)
            }
            Err(e) => Err(e),
        };

        match outcome {
            Ok(outcome) => {
                info!(path, tag = %outcome.tag(), "Pushed to remote");
                self.track_local(path);
                if let Some(file) = self.tracked.get_mut(path) {
                    file.remote_version = Some(outcome.tag().clone());
                }
                Ok(outcome)
            }
            Err(e) => {
                warn!(path, error = %e, "Remote push failed, keeping local change");
                self.track_local(path);
                self.forget_version(path);
                Err(SyncError::new(path, e))
            }
        }
    }

    /// Remove `path` from the remote. A path the remote no longer has is
    /// treated as successfully deleted.
    pub async fn delete(
        &mut self,
        path: &str,
        message: Option<&str>,
    ) -> Result<DeleteOutcome, SyncError> {
        if let Some(file) = self.tracked.get_mut(path) {
            file.local_exists = false;
        }

        let result = match self.remote.get_content(path).await {
            Ok((_, tag)) => {
                let message = message.map_or_else(|| format!("Delete {}", path), str::to_string);
                match self.remote.delete_file(path, &tag, &message).await {
                    Ok(()) => Ok(DeleteOutcome::Deleted),
                    Err(RemoteError::NotFound(_)) => Ok(DeleteOutcome::AlreadyAbsent),
                    Err(e) => Err(e),
                }
            }
            Err(RemoteError::NotFound(_)) => Ok(DeleteOutcome::AlreadyAbsent),
            Err(e) => Err(e),
        };

        match result {
            Ok(outcome) => {
                info!(path, ?outcome, "Remote delete complete");
                self.tracked.remove(path);
                Ok(outcome)
            }
            Err(e) => {
                warn!(path, error = %e, "Remote delete failed, local file already removed");
                self.forget_version(path);
                Err(SyncError::new(path, e))
            }
        }
    }
}
