// ABOUTME: Clones or fast-forwards the local workspace that mirrors a remote repository

use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::repo_source::{redact_url, strip_credentials, RepoId};
use super::repository::RepositoryManager;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProvisionError {
    #[error("Clone failed: {0}")]
    CloneFailed(String),
    #[error("Authentication failed - check your access token")]
    AuthFailed,
    #[error("Repository not found: {0}")]
    NotFound(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Workspace cannot fast-forward to the remote state: {0}")]
    NotFastForward(String),
    #[error("Workspace path exists but is not a git repository: {0}")]
    NotARepository(String),
    #[error("git failed: {0}")]
    CommandFailed(String),
    #[error("IO error: {0}")]
    Io(String),
}

impl From<std::io::Error> for ProvisionError {
    fn from(err: std::io::Error) -> Self {
        ProvisionError::Io(err.to_string())
    }
}

/// Maps remote repositories onto workspace directories under a common root
#[derive(Debug, Clone)]
pub struct WorkspaceProvisioner {
    workspaces_root: PathBuf,
}

impl WorkspaceProvisioner {
    pub fn new(workspaces_root: impl Into<PathBuf>) -> Self {
        Self {
            workspaces_root: workspaces_root.into(),
        }
    }

    pub fn workspace_path(&self, repo: &RepoId) -> PathBuf {
        repo.local_root(&self.workspaces_root)
    }

    /// Clone the repository if its workspace does not exist yet, otherwise
    /// fast-forward it to the remote's latest state.
    pub fn provision(&self, repo: &RepoId, clone_url: &str) -> Result<PathBuf, ProvisionError> {
        let path = self.workspace_path(repo);

        if path.exists() {
            self.pull(&path, clone_url)?;
        } else {
            self.clone_into(&path, clone_url)?;
        }

        match RepositoryManager::open(&path).map(|m| m.head_commit()) {
            Ok(Some((id, summary))) => {
                info!(repo = %repo, head = %id, "Workspace ready at {} ({})", path.display(), summary)
            }
            Ok(None) => info!(repo = %repo, "Workspace ready at {} (empty repository)", path.display()),
            Err(e) => warn!("Provisioned workspace could not be inspected: {}", e),
        }

        Ok(path)
    }

    fn clone_into(&self, path: &Path, clone_url: &str) -> Result<(), ProvisionError> {
        info!("Cloning {} to {}", redact_url(clone_url), path.display());

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let output = Command::new("git")
            .args(["clone", clone_url])
            .arg(path)
            .env("GIT_TERMINAL_PROMPT", "0")
            .output()
            .map_err(|e| ProvisionError::CloneFailed(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            // A failed clone can leave a partial directory behind which would
            // otherwise be treated as an existing workspace next time
            if path.exists() {
                let _ = std::fs::remove_dir_all(path);
            }
            return Err(classify_git_error(&stderr, clone_url));
        }

        scrub_origin(path, clone_url)
    }

    fn pull(&self, path: &Path, clone_url: &str) -> Result<(), ProvisionError> {
        let manager = RepositoryManager::open(path)
            .map_err(|_| ProvisionError::NotARepository(path.display().to_string()))?;

        match manager.get_status() {
            Ok(changes) if changes.total() > 0 => debug!(
                "Workspace {} has {} uncommitted change(s) before pull",
                path.display(),
                changes.total()
            ),
            Ok(_) => {}
            Err(e) => debug!("Could not read workspace status: {}", e),
        }

        info!("Pulling latest state into {}", path.display());

        let fetch = git(path, &["fetch", clone_url])?;
        if !fetch.status.success() {
            let stderr = String::from_utf8_lossy(&fetch.stderr);
            // Empty remote: nothing to fast-forward to
            if stderr.contains("couldn't find remote ref") && manager.head_commit().is_none() {
                debug!("Remote has no commits yet, nothing to pull");
                return Ok(());
            }
            return Err(classify_git_error(&stderr, clone_url));
        }

        let Some(target) = manager.fetched_head() else {
            debug!("Fetch returned no commits, nothing to pull");
            return Ok(());
        };

        // Pushed mutations come back as upstream commits while the same
        // content is still uncommitted here
        match manager.settle_changes_in(target) {
            Ok(settled) if !settled.is_empty() => {
                info!("{} local change(s) already upstream: {}", settled.len(), settled.join(", "))
            }
            Ok(_) => {}
            Err(e) => warn!("Could not compare local changes with upstream: {}", e),
        }

        let merge = git(path, &["merge", "--ff-only", "FETCH_HEAD"])?;
        if !merge.status.success() {
            let stderr = String::from_utf8_lossy(&merge.stderr);
            return Err(classify_git_error(&stderr, clone_url));
        }

        Ok(())
    }
}

fn git(path: &Path, args: &[&str]) -> Result<std::process::Output, ProvisionError> {
    Command::new("git")
        .args(args)
        .current_dir(path)
        .env("GIT_TERMINAL_PROMPT", "0")
        .output()
        .map_err(|e| ProvisionError::CommandFailed(e.to_string()))
}

/// Keep access tokens out of `.git/config`; later pulls pass the URL explicitly
fn scrub_origin(path: &Path, clone_url: &str) -> Result<(), ProvisionError> {
    let stripped = strip_credentials(clone_url);
    if stripped == clone_url {
        return Ok(());
    }
    RepositoryManager::open(path)
        .and_then(|manager| manager.set_origin_url(&stripped))
        .map_err(|e| ProvisionError::CommandFailed(redact_url(&e.to_string())))
}

/// Classify git errors into appropriate ProvisionError variants
fn classify_git_error(stderr: &str, url: &str) -> ProvisionError {
    let stderr_lower = stderr.to_lowercase();
    let message = redact_url(stderr.trim());

    if stderr_lower.contains("authentication failed")
        || stderr_lower.contains("permission denied")
        || stderr_lower.contains("could not read username")
        || stderr_lower.contains("invalid credentials")
        || stderr_lower.contains("could not read password")
    {
        ProvisionError::AuthFailed
    } else if stderr_lower.contains("not possible to fast-forward")
        || stderr_lower.contains("would be overwritten")
        || stderr_lower.contains("divergent branches")
        || stderr_lower.contains("diverging branches")
        || stderr_lower.contains("commit your changes or stash them")
    {
        ProvisionError::NotFastForward(message)
    } else if stderr_lower.contains("repository not found")
        || stderr_lower.contains("does not exist")
        || stderr_lower.contains("not found")
        || stderr_lower.contains("fatal: repository")
    {
        ProvisionError::NotFound(redact_url(url))
    } else if stderr_lower.contains("could not resolve host")
        || stderr_lower.contains("network")
        || stderr_lower.contains("connection")
        || stderr_lower.contains("timed out")
    {
        ProvisionError::Network(message)
    } else {
        ProvisionError::CommandFailed(message)
    }
}
