// ABOUTME: Shared test fixtures and utilities for behavioral tests
//
// Provides:
// - TestRepo: Temporary git repository used as the clone source
// - Workspace: Temporary workspaces root plus config pointing at it
// - connect_local(): Connect a session to a TestRepo through an in-process remote

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;
use tempfile::TempDir;

use repoterm::config::AppConfig;
use repoterm::git::RepoId;
use repoterm::remote::{MemoryRemote, RemoteRepository};
use repoterm::session::{connect_with, ConnectError, Session};

fn git(path: &Path, args: &[&str]) -> Result<()> {
    let output = Command::new("git").args(args).current_dir(path).output()?;
    if !output.status.success() {
        anyhow::bail!(
            "git {} failed: {}",
            args.join(" "),
            String::from_utf8_lossy(&output.stderr)
        );
    }
    Ok(())
}

/// Creates a temporary git repository
pub struct TestRepo {
    pub dir: TempDir,
    pub path: PathBuf,
}

impl TestRepo {
    /// Create a new temporary git repository with initial commit
    pub fn new() -> Result<Self> {
        let repo = Self::empty()?;
        repo.add_commit("README.md", "# Test Repo\n", "Initial commit")?;
        Ok(repo)
    }

    /// Create a repository with no commits at all
    pub fn empty() -> Result<Self> {
        let dir = TempDir::new()?;
        let path = dir.path().to_path_buf();

        git(&path, &["init"])?;
        git(&path, &["config", "user.email", "test@test.com"])?;
        git(&path, &["config", "user.name", "Test User"])?;

        Ok(Self { dir, path })
    }

    /// Get the path to the repository
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Clone source accepted by `git clone` and `git pull`
    pub fn url(&self) -> String {
        self.path.display().to_string()
    }

    /// Add a file and commit it
    pub fn add_commit(&self, filename: &str, content: &str, message: &str) -> Result<()> {
        let file = self.path.join(filename);
        if let Some(parent) = file.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(file, content)?;
        git(&self.path, &["add", filename])?;
        git(&self.path, &["commit", "-m", message])?;
        Ok(())
    }
}

/// Temporary workspaces root with a config pointing at it
pub struct Workspace {
    pub dir: TempDir,
    pub config: AppConfig,
}

impl Workspace {
    pub fn new() -> Result<Self> {
        let dir = TempDir::new()?;
        let mut config = AppConfig::default();
        config.workspace.root = dir.path().to_path_buf();
        Ok(Self { dir, config })
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }
}

pub fn demo_repo() -> RepoId {
    RepoId::new("github.com", "octo", "demo")
}

/// Connect to `source` as `octo/demo`, with `remote` standing in for the hosted API
pub async fn connect_local(
    workspace: &Workspace,
    source: &TestRepo,
    remote: Arc<dyn RemoteRepository>,
) -> Result<Session, ConnectError> {
    connect_with(&workspace.config, demo_repo(), remote, &source.url()).await
}

/// Connected session over a fresh clone of a one-commit repository
pub struct Connected {
    pub source: TestRepo,
    pub workspace: Workspace,
    pub remote: Arc<MemoryRemote>,
    pub session: Session,
}

impl Connected {
    pub async fn new() -> Result<Self> {
        let source = TestRepo::new()?;
        let workspace = Workspace::new()?;
        let remote = Arc::new(MemoryRemote::new());
        let session = connect_local(&workspace, &source, remote.clone()).await?;
        Ok(Self {
            source,
            workspace,
            remote,
            session,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_creation() -> Result<()> {
        let repo = TestRepo::new()?;
        assert!(repo.path().exists());
        assert!(repo.path().join(".git").exists());
        assert!(repo.path().join("README.md").exists());
        Ok(())
    }

    #[test]
    fn test_repo_add_commit_nested() -> Result<()> {
        let repo = TestRepo::new()?;
        repo.add_commit("src/app.py", "print(1)\n", "Add app")?;
        assert!(repo.path().join("src/app.py").exists());
        Ok(())
    }
}
