// ABOUTME: Git integration for workspace provisioning: repository identity, clone/pull, and status

pub mod provisioner;
pub mod repo_source;
pub mod repository;

pub use provisioner::{ProvisionError, WorkspaceProvisioner};
pub use repo_source::{RepoId, RepoSourceError};
pub use repository::RepositoryManager;
