// ABOUTME: Audit logging for workspace mutations and remote sync failures
//
// Every file save, delete, directory creation and package install is recorded,
// along with remote sync failures, so a diverged workspace can be traced back
// to the command that caused it.
//
// Audit log is written to: ~/.repoterm/logs/audit.jsonl (once initialized)
// Format: JSON Lines (one JSON object per line) for easy grep/parsing

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{error, info};
use uuid::Uuid;

/// Types of auditable actions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    WorkspaceProvisioned,
    FileSaved,
    FileDeleted,
    DirectoryCreated,
    PackageAdded,
    RemoteSyncFailed,
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuditAction::WorkspaceProvisioned => write!(f, "WORKSPACE_PROVISIONED"),
            AuditAction::FileSaved => write!(f, "FILE_SAVED"),
            AuditAction::FileDeleted => write!(f, "FILE_DELETED"),
            AuditAction::DirectoryCreated => write!(f, "DIRECTORY_CREATED"),
            AuditAction::PackageAdded => write!(f, "PACKAGE_ADDED"),
            AuditAction::RemoteSyncFailed => write!(f, "REMOTE_SYNC_FAILED"),
        }
    }
}

/// Result of an audited action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditResult {
    Success,
    Failed(String),
    /// Local side applied, remote side did not
    Partial(String),
}

/// A single audit log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,
    pub action: AuditAction,
    pub result: AuditResult,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<Uuid>,

    /// `owner/name` of the bound repository
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,

    /// Workspace-relative path involved
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl AuditEntry {
    pub fn new(action: AuditAction, result: AuditResult) -> Self {
        Self {
            timestamp: Utc::now(),
            action,
            result,
            session_id: None,
            repository: None,
            path: None,
            details: None,
        }
    }

    pub fn session(mut self, session_id: Uuid, repository: impl Into<String>) -> Self {
        self.session_id = Some(session_id);
        self.repository = Some(repository.into());
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Global audit logger
static AUDIT_LOGGER: Mutex<Option<AuditLogger>> = Mutex::new(None);

/// Audit logger that writes to a JSONL file
pub struct AuditLogger {
    writer: BufWriter<File>,
}

impl AuditLogger {
    /// Initialize the global audit logger at the default location
    pub fn init() -> std::io::Result<()> {
        Self::init_at(&Self::default_log_path())
    }

    /// Initialize the global audit logger writing to `log_path`
    pub fn init_at(log_path: &Path) -> std::io::Result<()> {
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)?;

        let logger = AuditLogger {
            writer: BufWriter::new(file),
        };

        let mut global = AUDIT_LOGGER.lock().unwrap_or_else(|e| e.into_inner());
        *global = Some(logger);

        info!("Audit logging initialized: {:?}", log_path);
        Ok(())
    }

    pub fn default_log_path() -> PathBuf {
        crate::config::repoterm_home().join("logs").join("audit.jsonl")
    }

    fn write_entry(&mut self, entry: &AuditEntry) -> std::io::Result<()> {
        let json = serde_json::to_string(entry)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

        writeln!(self.writer, "{}", json)?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Record an audit entry. Always mirrored to tracing; written to the audit
/// file only when a logger has been initialized.
pub fn audit_log(entry: AuditEntry) {
    info!(
        target: "audit",
        action = %entry.action,
        result = ?entry.result,
        session_id = ?entry.session_id,
        repository = ?entry.repository,
        path = ?entry.path,
        "AUDIT: {}",
        entry.action
    );

    let mut global = match AUDIT_LOGGER.lock() {
        Ok(g) => g,
        Err(e) => {
            error!("Failed to acquire audit logger lock: {}", e);
            return;
        }
    };

    if let Some(ref mut logger) = *global {
        if let Err(e) = logger.write_entry(&entry) {
            error!("Failed to write audit entry: {}", e);
        }
    }
}
