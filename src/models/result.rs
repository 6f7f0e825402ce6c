// ABOUTME: Result of executing one command line - output text, success flag, and sync warnings

use serde::{Deserialize, Serialize};

/// Signals that the command opened a file for editing; the caller must
/// finish the interaction with `commit_edit`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditRequest {
    pub path: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResult {
    pub output: String,
    pub succeeded: bool,
    /// Remote sync failures that did not undo the local change
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edit: Option<EditRequest>,
}

impl CommandResult {
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            succeeded: true,
            warnings: Vec::new(),
            edit: None,
        }
    }

    pub fn failure(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            succeeded: false,
            warnings: Vec::new(),
            edit: None,
        }
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }

    pub fn with_edit(mut self, edit: EditRequest) -> Self {
        self.edit = Some(edit);
        self
    }

    /// Local change applied but at least one remote push failed
    pub fn is_partial(&self) -> bool {
        self.succeeded && !self.warnings.is_empty()
    }

    pub fn render(&self) -> String {
        let mut lines: Vec<String> = Vec::new();
        if !self.output.is_empty() {
            lines.push(self.output.trim_end_matches('\n').to_string());
        }
        lines.extend(self.warnings.iter().map(|w| format!("warning: {}", w)));
        lines.join("\n")
    }
}
