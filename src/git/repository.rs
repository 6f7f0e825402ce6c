// ABOUTME: Inspection and upkeep of a provisioned workspace's git metadata

use git2::build::CheckoutBuilder;
use git2::{Oid, Repository, Status, StatusOptions};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum GitError {
    #[error("Git repository error: {0}")]
    Git(#[from] git2::Error),
    #[error("Repository not found at path: {0}")]
    NotFound(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Counts of uncommitted changes in a working tree
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LocalChanges {
    pub added: u32,
    pub modified: u32,
    pub deleted: u32,
}

impl LocalChanges {
    pub fn total(&self) -> u32 {
        self.added + self.modified + self.deleted
    }
}

pub struct RepositoryManager {
    repo: Repository,
}

impl RepositoryManager {
    pub fn open(path: &Path) -> Result<Self, GitError> {
        let repo = Repository::open(path)
            .map_err(|e| GitError::NotFound(format!("{}: {}", path.display(), e.message())))?;

        Ok(Self { repo })
    }

    pub fn get_status(&self) -> Result<LocalChanges, GitError> {
        let mut opts = StatusOptions::new();
        opts.include_untracked(true);
        opts.include_ignored(false);

        let statuses = self.repo.statuses(Some(&mut opts))?;

        let mut changes = LocalChanges::default();

        for entry in statuses.iter() {
            let status = entry.status();

            if status.intersects(Status::WT_NEW | Status::INDEX_NEW) {
                changes.added += 1;
            }

            if status.intersects(
                Status::WT_MODIFIED | Status::INDEX_MODIFIED | Status::WT_RENAMED | Status::INDEX_RENAMED,
            ) {
                changes.modified += 1;
            }

            if status.intersects(Status::WT_DELETED | Status::INDEX_DELETED) {
                changes.deleted += 1;
            }
        }

        debug!(
            "Workspace status: +{} ~{} -{}",
            changes.added, changes.modified, changes.deleted
        );
        Ok(changes)
    }

    /// Commit recorded in FETCH_HEAD by the last `git fetch`, if any
    pub fn fetched_head(&self) -> Option<Oid> {
        let commit = self.repo.revparse_single("FETCH_HEAD").ok()?.peel_to_commit().ok()?;
        Some(commit.id())
    }

    /// Point `origin` at `url`
    pub fn set_origin_url(&self, url: &str) -> Result<(), GitError> {
        self.repo.remote_set_url("origin", url)?;
        Ok(())
    }

    /// Discard uncommitted changes that `target` already contains, so that a
    /// fast-forward to it does not refuse to overwrite them. An empty untracked
    /// file also gives way to the upstream version. Returns the settled paths.
    pub fn settle_changes_in(&self, target: Oid) -> Result<Vec<String>, GitError> {
        let tree = self.repo.find_commit(target)?.tree()?;
        let workdir = self
            .repo
            .workdir()
            .ok_or_else(|| GitError::NotFound("repository has no working tree".to_string()))?
            .to_path_buf();

        let mut opts = StatusOptions::new();
        opts.include_untracked(true);
        opts.recurse_untracked_dirs(true);
        opts.include_ignored(false);

        let mut untracked = Vec::new();
        let mut tracked = Vec::new();
        for entry in self.repo.statuses(Some(&mut opts))?.iter() {
            let Some(path) = entry.path() else { continue };
            let status = entry.status();
            let is_new = status.contains(Status::WT_NEW);

            let local = std::fs::read(workdir.join(path)).ok();
            let upstream = tree
                .get_path(Path::new(path))
                .ok()
                .and_then(|e| e.to_object(&self.repo).ok())
                .and_then(|o| o.into_blob().ok())
                .map(|b| b.content().to_vec());

            let settled = match (&local, &upstream) {
                (Some(local), Some(upstream)) => local == upstream || (is_new && local.is_empty()),
                (None, None) => true,
                _ => false,
            };
            if !settled {
                continue;
            }
            if is_new {
                untracked.push(path.to_string());
            } else {
                tracked.push(path.to_string());
            }
        }

        for path in &untracked {
            std::fs::remove_file(workdir.join(path))?;
        }
        if !tracked.is_empty() {
            let mut checkout = CheckoutBuilder::new();
            checkout.force();
            for path in &tracked {
                checkout.path(path.as_str());
            }
            self.repo.checkout_head(Some(&mut checkout))?;
        }

        debug!(
            "Settled {} local change(s) already present upstream",
            untracked.len() + tracked.len()
        );
        untracked.extend(tracked);
        Ok(untracked)
    }

    /// Short id and summary of the checked-out commit, `None` for an unborn HEAD
    pub fn head_commit(&self) -> Option<(String, String)> {
        let commit = self.repo.head().ok()?.peel_to_commit().ok()?;
        let id = commit.id().to_string();
        let short = id.chars().take(8).collect();
        Some((short, commit.summary().unwrap_or_default().to_string()))
    }
}
