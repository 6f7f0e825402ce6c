// ABOUTME: Workspace binding between a remote repository and its local root, plus per-file sync state

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::git::RepoId;
use crate::remote::VersionTag;

/// Which remote a session mirrors and where its local copy lives.
/// `local_root` is derived from `remote` and never changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceBinding {
    pub remote: RepoId,
    pub local_root: PathBuf,
}

impl WorkspaceBinding {
    pub fn new(remote: RepoId, workspaces_root: &std::path::Path) -> Self {
        let local_root = remote.local_root(workspaces_root);
        Self { remote, local_root }
    }
}

/// Sync bookkeeping for one workspace path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedFile {
    pub relative_path: String,
    pub local_exists: bool,
    /// Absent until the path has been pushed at least once
    pub remote_version: Option<VersionTag>,
}

impl TrackedFile {
    pub fn new(relative_path: &str) -> Self {
        Self {
            relative_path: relative_path.to_string(),
            local_exists: true,
            remote_version: None,
        }
    }

    pub fn is_synchronized(&self) -> bool {
        self.remote_version.is_some()
    }
}
