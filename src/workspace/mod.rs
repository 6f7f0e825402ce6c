// ABOUTME: Local workspace store - owns all filesystem access beneath a workspace root
//
// Paths are always relative to the root. Anything absolute or escaping the
// root via `..` is refused before touching the disk.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum WorkspaceError {
    #[error("File {0} does not exist")]
    NotFound(String),
    #[error("Path {0} is outside the workspace")]
    OutsideWorkspace(String),
    #[error("{path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl WorkspaceError {
    fn io(path: &str, source: std::io::Error) -> Self {
        if source.kind() == ErrorKind::NotFound {
            WorkspaceError::NotFound(path.to_string())
        } else {
            WorkspaceError::Io {
                path: path.to_string(),
                source,
            }
        }
    }
}

/// Filesystem view of one provisioned workspace
const GIT_DIR: &str = ".git";

#[derive(Debug, Clone)]
pub struct WorkspaceStore {
    root: PathBuf,
}

impl WorkspaceStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a workspace-relative path, refusing anything that leaves the root
    /// or reaches into the clone's git metadata
    pub fn resolve(&self, path: &str) -> Result<PathBuf, WorkspaceError> {
        let relative = Path::new(path);
        if path.is_empty() {
            return Err(WorkspaceError::OutsideWorkspace(path.to_string()));
        }
        for component in relative.components() {
            match component {
                Component::Normal(part) if part == GIT_DIR => {
                    return Err(WorkspaceError::OutsideWorkspace(path.to_string()))
                }
                Component::Normal(_) | Component::CurDir => {}
                _ => return Err(WorkspaceError::OutsideWorkspace(path.to_string())),
            }
        }
        Ok(self.root.join(relative))
    }

    /// Canonical `/`-separated form of a workspace path (`./a//b` becomes `a/b`),
    /// used as the remote path and tracking key
    pub fn normalize(&self, path: &str) -> Result<String, WorkspaceError> {
        let resolved = self.resolve(path)?;
        let relative = resolved
            .strip_prefix(&self.root)
            .map_err(|_| WorkspaceError::OutsideWorkspace(path.to_string()))?;
        let parts: Vec<String> = relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy().to_string()),
                _ => None,
            })
            .collect();
        if parts.is_empty() {
            return Err(WorkspaceError::OutsideWorkspace(path.to_string()));
        }
        Ok(parts.join("/"))
    }

    pub fn exists(&self, path: &str) -> Result<bool, WorkspaceError> {
        Ok(self.resolve(path)?.exists())
    }

    pub fn is_file(&self, path: &str) -> Result<bool, WorkspaceError> {
        Ok(self.resolve(path)?.is_file())
    }

    pub fn read(&self, path: &str) -> Result<Vec<u8>, WorkspaceError> {
        let full = self.resolve(path)?;
        if full.is_dir() {
            return Err(WorkspaceError::Io {
                path: path.to_string(),
                source: std::io::Error::new(ErrorKind::Other, "is a directory"),
            });
        }
        fs::read(&full).map_err(|e| WorkspaceError::io(path, e))
    }

    /// Replace the file's content. The new content becomes visible in one
    /// rename, so readers never observe a partial write.
    pub fn write(&self, path: &str, content: &[u8]) -> Result<(), WorkspaceError> {
        let full = self.resolve(path)?;
        let parent = full.parent().unwrap_or(&self.root).to_path_buf();
        fs::create_dir_all(&parent).map_err(|e| WorkspaceError::io(path, e))?;

        let mut staged =
            tempfile::NamedTempFile::new_in(&parent).map_err(|e| WorkspaceError::io(path, e))?;
        staged.write_all(content).map_err(|e| WorkspaceError::io(path, e))?;
        staged.as_file().sync_all().map_err(|e| WorkspaceError::io(path, e))?;
        staged
            .persist(&full)
            .map_err(|e| WorkspaceError::io(path, e.error))?;

        debug!(path, bytes = content.len(), "Wrote workspace file");
        Ok(())
    }

    pub fn append(&self, path: &str, content: &[u8]) -> Result<(), WorkspaceError> {
        let full = self.resolve(path)?;
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).map_err(|e| WorkspaceError::io(path, e))?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&full)
            .map_err(|e| WorkspaceError::io(path, e))?;
        file.write_all(content).map_err(|e| WorkspaceError::io(path, e))?;

        debug!(path, bytes = content.len(), "Appended to workspace file");
        Ok(())
    }

    /// Create an empty file unless one already exists
    pub fn ensure_file(&self, path: &str) -> Result<bool, WorkspaceError> {
        let full = self.resolve(path)?;
        if full.is_file() {
            return Ok(false);
        }
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).map_err(|e| WorkspaceError::io(path, e))?;
        }
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&full)
            .map_err(|e| WorkspaceError::io(path, e))?;
        Ok(true)
    }

    /// Remove a file. Parent directories are left in place even when empty.
    pub fn delete(&self, path: &str) -> Result<(), WorkspaceError> {
        let full = self.resolve(path)?;
        if !full.is_file() {
            return Err(WorkspaceError::NotFound(path.to_string()));
        }
        fs::remove_file(&full).map_err(|e| WorkspaceError::io(path, e))
    }

    pub fn make_dir(&self, path: &str) -> Result<(), WorkspaceError> {
        let full = self.resolve(path)?;
        fs::create_dir_all(&full).map_err(|e| WorkspaceError::io(path, e))
    }

    /// Top-level entry names of a directory, in the order the filesystem
    /// returns them. Git metadata is not part of the workspace view.
    pub fn list(&self, dir: Option<&str>) -> Result<Vec<String>, WorkspaceError> {
        let (label, full) = match dir {
            Some(d) => (d, self.resolve(d)?),
            None => (".", self.root.clone()),
        };

        let entries = fs::read_dir(&full).map_err(|e| WorkspaceError::io(label, e))?;
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| WorkspaceError::io(label, e))?;
            let name = entry.file_name().to_string_lossy().to_string();
            if name == GIT_DIR {
                continue;
            }
            names.push(name);
        }
        Ok(names)
    }
}
