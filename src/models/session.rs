// ABOUTME: Session history entry - one executed command line and the result it produced

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::CommandResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub command: String,
    pub result: CommandResult,
    pub at: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn new(command: &str, result: CommandResult) -> Self {
        Self {
            command: command.to_string(),
            result,
            at: Utc::now(),
        }
    }

    /// Terminal-style transcript line: prompt, command, then rendered output
    pub fn transcript(&self) -> String {
        let rendered = self.result.render();
        if rendered.is_empty() {
            format!("$ {}", self.command)
        } else {
            format!("$ {}\n{}", self.command, rendered)
        }
    }
}
