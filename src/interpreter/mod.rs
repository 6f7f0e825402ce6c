// ABOUTME: Command interpreter - turns a command line into a local effect plus a mirrored remote update
//
// Every handler error is converted into a failed CommandResult here; nothing
// escapes `execute`. Local changes are never rolled back when the remote push
// fails, the failure becomes a warning on an otherwise successful result.

pub mod command;
pub mod exec;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::audit::{AuditAction, AuditEntry, AuditResult};
use crate::config::{AppConfig, ExecConfig};
use crate::models::{CommandResult, EditRequest};
use crate::session::Session;
use crate::sync::SyncError;
use crate::workspace::WorkspaceError;

pub use command::{Command, ParseError};
pub use exec::{ExecutionError, ScriptOutput};

#[derive(Error, Debug)]
pub enum CommandError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Workspace(#[from] WorkspaceError),
    #[error(transparent)]
    Execution(#[from] ExecutionError),
}

#[derive(Debug, Clone)]
pub struct CommandInterpreter {
    manifest_file: String,
    exec: ExecConfig,
}

impl CommandInterpreter {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            manifest_file: config.workspace.manifest_file.clone(),
            exec: config.exec.clone(),
        }
    }

    /// Run one command line to completion and append it to the session history
    pub async fn execute(&self, session: &mut Session, line: &str) -> CommandResult {
        let result = match self.dispatch(session, line).await {
            Ok(result) => result,
            Err(e) => CommandResult::failure(e.to_string()),
        };

        if !result.succeeded {
            info!(command = line.trim(), "Command failed: {}", result.output);
        }
        session.record(line.trim(), result.clone());
        result
    }

    async fn dispatch(&self, session: &mut Session, line: &str) -> Result<CommandResult, CommandError> {
        let command = Command::parse(line)?;
        debug!(verb = command.verb(), mutation = command.is_mutation(), "Executing command");

        match command {
            Command::PipInstall { packages } => self.pip_install(session, &packages).await,
            Command::Edit { path } => {
                let edit = self.begin_edit(session, &path)?;
                Ok(CommandResult::success(format!("Editing {}", path)).with_edit(edit))
            }
            Command::Python { path } => self.python(session, &path).await,
            Command::List { dir } => {
                let names = session.store.list(dir.as_deref())?;
                Ok(CommandResult::success(names.join("\n")))
            }
            Command::Cat { path } => {
                let bytes = session.store.read(&path)?;
                Ok(CommandResult::success(String::from_utf8_lossy(&bytes).into_owned()))
            }
            Command::Remove { path } => self.remove(session, &path).await,
            Command::MakeDir { path } => {
                session.store.make_dir(&path)?;
                session.audit(AuditEntry::new(AuditAction::DirectoryCreated, AuditResult::Success).path(&path));
                Ok(CommandResult::success(format!("Directory {} created", path)))
            }
        }
    }

    async fn pip_install(&self, session: &mut Session, packages: &[String]) -> Result<CommandResult, CommandError> {
        let manifest = session.store.normalize(&self.manifest_file)?;
        for package in packages {
            session.store.append(&manifest, format!("{}\n", package).as_bytes())?;
        }
        let content = session.store.read(&manifest)?;

        let message = format!("Add {} to requirements", packages.join(", "));
        let pushed = session.sync.push(&manifest, &content, Some(&message)).await;

        let output = packages
            .iter()
            .map(|p| format!("Saved {} to {}", p, self.manifest_file))
            .collect::<Vec<_>>()
            .join("\n");
        let mut result = CommandResult::success(output);
        let outcome = self.sync_outcome(session, &pushed);
        for package in packages {
            session.audit(
                AuditEntry::new(AuditAction::PackageAdded, outcome.clone())
                    .path(&manifest)
                    .details(package),
            );
        }
        if let Err(e) = pushed {
            result = result.with_warning(e.to_string());
        }
        Ok(result)
    }

    /// First half of the edit protocol: make sure the file exists and hand
    /// back its current content. Nothing is pushed until `commit_edit`.
    pub fn begin_edit(&self, session: &mut Session, path: &str) -> Result<EditRequest, CommandError> {
        let path = session.store.normalize(path)?;
        if session.store.ensure_file(&path)? {
            debug!(path = %path, "Created file for editing");
            session.sync.track_local(&path);
        }
        let bytes = session.store.read(&path)?;
        Ok(EditRequest {
            path,
            content: String::from_utf8_lossy(&bytes).into_owned(),
        })
    }

    /// Second half of the edit protocol: write the edited content locally and
    /// push it. Recorded in history as `save <file>`.
    pub async fn commit_edit(&self, session: &mut Session, path: &str, content: &str) -> CommandResult {
        let result = match self.save(session, path, content).await {
            Ok(result) => result,
            Err(e) => CommandResult::failure(e.to_string()),
        };
        session.record(&format!("save {}", path), result.clone());
        result
    }

    async fn save(&self, session: &mut Session, path: &str, content: &str) -> Result<CommandResult, CommandError> {
        let path = session.store.normalize(path)?;
        session.store.write(&path, content.as_bytes())?;

        let pushed = session.sync.push(&path, content.as_bytes(), None).await;
        let outcome = self.sync_outcome(session, &pushed);
        session.audit(
            AuditEntry::new(AuditAction::FileSaved, outcome)
                .path(&path)
                .details(format!("{} bytes", content.len())),
        );

        let result = CommandResult::success(format!("{} saved", path));
        Ok(match pushed {
            Ok(_) => result,
            Err(e) => result.with_warning(e.to_string()),
        })
    }

    async fn python(&self, session: &mut Session, path: &str) -> Result<CommandResult, CommandError> {
        let path = session.store.normalize(path)?;
        if !session.store.is_file(&path)? {
            return Err(WorkspaceError::NotFound(path).into());
        }

        let output = exec::run_script(&self.exec, session.store.root(), &path).await?;
        if output.success() {
            Ok(CommandResult::success(output.text()))
        } else {
            let mut text = output.text();
            if !text.is_empty() && !text.ends_with('\n') {
                text.push('\n');
            }
            text.push_str(&format!("[{}]", output.status));
            Ok(CommandResult::failure(text))
        }
    }

    async fn remove(&self, session: &mut Session, path: &str) -> Result<CommandResult, CommandError> {
        let path = session.store.normalize(path)?;
        // Absent locally: report and leave the remote alone
        session.store.delete(&path)?;

        let deleted = session.sync.delete(&path, None).await;
        let outcome = self.sync_outcome(session, &deleted);
        session.audit(AuditEntry::new(AuditAction::FileDeleted, outcome).path(&path));

        let result = CommandResult::success(format!("{} deleted", path));
        Ok(match deleted {
            Ok(_) => result,
            Err(e) => result.with_warning(e.to_string()),
        })
    }

    /// Audit result for a local change whose remote push produced `pushed`.
    /// Failed pushes are additionally audited on their own.
    fn sync_outcome<T>(&self, session: &Session, pushed: &Result<T, SyncError>) -> AuditResult {
        match pushed {
            Ok(_) => AuditResult::Success,
            Err(e) => {
                warn!(path = %e.path, conflict = e.is_conflict(), "Local change kept, remote not updated");
                session.audit(
                    AuditEntry::new(AuditAction::RemoteSyncFailed, AuditResult::Failed(e.source.to_string()))
                        .path(&e.path),
                );
                AuditResult::Partial(e.to_string())
            }
        }
    }
}
