// ABOUTME: Runs workspace scripts as child processes with a timeout and output cap

use std::path::Path;
use std::process::{ExitStatus, Stdio};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::{debug, warn};

use crate::config::ExecConfig;

pub const TRUNCATION_MARKER: &str = "[output truncated]";

#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{script} timed out after {secs}s and was stopped")]
    TimedOut { script: String, secs: u64 },
    #[error("Failed to collect output of {script}: {source}")]
    Output {
        script: String,
        #[source]
        source: std::io::Error,
    },
}

/// Captured result of one script run
#[derive(Debug)]
pub struct ScriptOutput {
    pub status: ExitStatus,
    /// stdout followed by stderr, capped at the configured size
    pub combined: String,
    pub truncated: bool,
}

impl ScriptOutput {
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// Combined output with the truncation marker when applicable
    pub fn text(&self) -> String {
        if self.truncated {
            let mut text = self.combined.clone();
            if !text.is_empty() && !text.ends_with('\n') {
                text.push('\n');
            }
            text.push_str(TRUNCATION_MARKER);
            text
        } else {
            self.combined.clone()
        }
    }
}

/// Run `<interpreter> <script>` inside `workdir`.
///
/// The child is killed if it outlives `config.timeout_secs`.
pub async fn run_script(
    config: &ExecConfig,
    workdir: &Path,
    script: &str,
) -> Result<ScriptOutput, ExecutionError> {
    debug!(interpreter = %config.interpreter, script, "Launching script");

    let mut child = Command::new(&config.interpreter)
        .arg(script)
        .current_dir(workdir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| ExecutionError::Launch {
            program: config.interpreter.clone(),
            source,
        })?;

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    let limit = config.max_output_bytes;

    let collect = async {
        let (out, err, status) = tokio::join!(
            read_capped(stdout, limit),
            read_capped(stderr, limit),
            child.wait()
        );
        Ok::<_, std::io::Error>((out?, err?, status?))
    };

    let collected = tokio::time::timeout(config.timeout(), collect).await;
    let ((out, out_cut), (err, err_cut), status) = match collected {
        Ok(collected) => collected.map_err(|source| ExecutionError::Output {
            script: script.to_string(),
            source,
        })?,
        Err(_) => {
            warn!(script, secs = config.timeout_secs, "Script timed out, killing it");
            if let Err(e) = child.start_kill() {
                debug!("Kill after timeout failed: {}", e);
            }
            return Err(ExecutionError::TimedOut {
                script: script.to_string(),
                secs: config.timeout_secs,
            });
        }
    };

    let mut bytes = out;
    bytes.extend_from_slice(&err);
    let mut truncated = out_cut || err_cut;
    if bytes.len() > limit {
        bytes.truncate(limit);
        truncated = true;
    }

    debug!(script, %status, bytes = bytes.len(), truncated, "Script finished");
    Ok(ScriptOutput {
        status,
        combined: String::from_utf8_lossy(&bytes).into_owned(),
        truncated,
    })
}

/// Read a stream to the end, keeping at most `limit` bytes. The rest is
/// drained so the child never blocks on a full pipe.
async fn read_capped<R: AsyncRead + Unpin>(
    reader: Option<R>,
    limit: usize,
) -> std::io::Result<(Vec<u8>, bool)> {
    let Some(mut reader) = reader else {
        return Ok((Vec::new(), false));
    };

    let mut kept = Vec::new();
    let mut truncated = false;
    let mut buf = [0u8; 8192];
    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        let room = limit.saturating_sub(kept.len());
        if n > room {
            truncated = true;
        }
        kept.extend_from_slice(&buf[..n.min(room)]);
    }
    Ok((kept, truncated))
}
