// ABOUTME: Remote repository abstraction - per-path content storage guarded by version tags
//
// Implementations:
// - github: hosted contents API over authenticated HTTPS
// - memory: in-process store used for offline sessions and tests

pub mod github;
pub mod memory;

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub use github::GitHubRemote;
pub use memory::MemoryRemote;

/// Opaque token identifying the last-known state of a remote path
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VersionTag(String);

impl VersionTag {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VersionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Tags are usually 40-char object ids; the prefix is enough for logs
        let short: String = self.0.chars().take(12).collect();
        f.write_str(&short)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    #[error("remote path {0} not found")]
    NotFound(String),
    #[error("remote path {0} changed since it was last fetched")]
    Conflict(String),
    #[error("remote rejected credentials: {0}")]
    Unauthorized(String),
    #[error("remote unreachable: {0}")]
    Network(String),
    #[error("remote API error: {0}")]
    Api(String),
}

/// Capability set of a hosted repository that stores content per path
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait RemoteRepository: Send + Sync {
    /// Verify the repository exists and the credentials can reach it
    async fn probe(&self) -> Result<(), RemoteError> {
        Ok(())
    }

    /// Current content and version tag of a path
    async fn get_content(&self, path: &str) -> Result<(Vec<u8>, VersionTag), RemoteError>;

    /// Create a path that must not exist yet
    async fn create_file(
        &self,
        path: &str,
        content: &[u8],
        message: &str,
    ) -> Result<VersionTag, RemoteError>;

    /// Replace content, provided `tag` is still the current version
    async fn update_file(
        &self,
        path: &str,
        content: &[u8],
        tag: &VersionTag,
        message: &str,
    ) -> Result<VersionTag, RemoteError>;

    /// Remove a path, provided `tag` is still the current version
    async fn delete_file(
        &self,
        path: &str,
        tag: &VersionTag,
        message: &str,
    ) -> Result<(), RemoteError>;
}
