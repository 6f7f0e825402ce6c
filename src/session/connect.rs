// ABOUTME: Connect flow - validate input, probe the remote, provision the workspace, open a session

use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};

use super::Session;
use crate::audit::{audit_log, AuditAction, AuditEntry, AuditResult};
use crate::config::AppConfig;
use crate::git::{ProvisionError, RepoId, WorkspaceProvisioner};
use crate::models::WorkspaceBinding;
use crate::remote::{GitHubRemote, RemoteError, RemoteRepository};
use crate::workspace::WorkspaceError;

/// Failures that prevent a session from starting
#[derive(Error, Debug)]
pub enum ConnectError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("Access to {repo} was denied: {message}")]
    Auth { repo: String, message: String },
    #[error("Repository {0} not found or not accessible with this token")]
    RepositoryNotFound(String),
    #[error("Remote unreachable: {0}")]
    Unreachable(String),
    #[error("Remote API error: {0}")]
    Remote(String),
    #[error("Failed to provision workspace: {0}")]
    Provision(#[from] ProvisionError),
    #[error("Failed to prepare workspace: {0}")]
    Workspace(#[from] WorkspaceError),
}

fn probe_error(repo: &RepoId, err: RemoteError) -> ConnectError {
    match err {
        RemoteError::Unauthorized(message) => ConnectError::Auth {
            repo: repo.full_name(),
            message,
        },
        RemoteError::NotFound(_) => ConnectError::RepositoryNotFound(repo.full_name()),
        RemoteError::Network(message) => ConnectError::Unreachable(message),
        RemoteError::Conflict(message) | RemoteError::Api(message) => ConnectError::Remote(message),
    }
}

/// Connect to a hosted repository with an access token
pub async fn connect(config: &AppConfig, token: &str, repo_input: &str) -> Result<Session, ConnectError> {
    let token = token.trim();
    if token.is_empty() {
        return Err(ConnectError::InvalidInput(
            "Please provide both token and repository".to_string(),
        ));
    }
    if repo_input.trim().is_empty() {
        return Err(ConnectError::InvalidInput(
            "Please provide both token and repository".to_string(),
        ));
    }
    let repo = RepoId::parse(repo_input.trim()).map_err(|e| ConnectError::InvalidInput(e.to_string()))?;

    let remote = GitHubRemote::new(&config.remote, repo.clone(), token).map_err(|e| probe_error(&repo, e))?;
    let clone_url = repo.authenticated_clone_url(token);
    connect_with(config, repo, Arc::new(remote), &clone_url).await
}

/// Connect using a caller-supplied remote and clone source
pub async fn connect_with(
    config: &AppConfig,
    repo: RepoId,
    remote: Arc<dyn RemoteRepository>,
    clone_url: &str,
) -> Result<Session, ConnectError> {
    remote.probe().await.map_err(|e| probe_error(&repo, e))?;

    let provisioner = WorkspaceProvisioner::new(&config.workspace.root);
    let reused = provisioner.workspace_path(&repo).exists();
    let root = {
        let repo = repo.clone();
        let clone_url = clone_url.to_string();
        tokio::task::spawn_blocking(move || provisioner.provision(&repo, &clone_url))
            .await
            .map_err(|e| ProvisionError::CommandFailed(format!("provisioning task failed: {}", e)))?
    };

    let root = match root {
        Ok(root) => root,
        Err(e) => {
            error!(repo = %repo, "Provisioning failed: {}", e);
            audit_log(
                AuditEntry::new(AuditAction::WorkspaceProvisioned, AuditResult::Failed(e.to_string()))
                    .details(repo.full_name()),
            );
            return Err(e.into());
        }
    };

    let binding = WorkspaceBinding::new(repo, &config.workspace.root);
    debug_assert_eq!(binding.local_root, root);

    let session = Session::open(binding, remote, &config.workspace.manifest_file)?;
    session.audit(
        AuditEntry::new(AuditAction::WorkspaceProvisioned, AuditResult::Success)
            .path(root.display().to_string())
            .details(if reused { "pulled" } else { "cloned" }),
    );
    info!(session_id = %session.id(), "Connected to {}", session.binding().remote);
    Ok(session)
}
