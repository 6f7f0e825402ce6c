// ABOUTME: Configuration management for repoterm
// Handles workspace location, remote API settings, script execution limits, and UI preferences

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application version
    #[serde(default = "default_version")]
    pub version: String,

    #[serde(default)]
    pub workspace: WorkspaceConfig,

    #[serde(default)]
    pub remote: RemoteConfig,

    #[serde(default)]
    pub exec: ExecConfig,

    #[serde(default)]
    pub ui: UiPreferences,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    /// Directory under which every workspace is provisioned as host/owner/repo
    #[serde(default = "default_workspace_root")]
    pub root: PathBuf,

    /// Dependency manifest appended to by `pip install`
    #[serde(default = "default_manifest_file")]
    pub manifest_file: String,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            root: default_workspace_root(),
            manifest_file: default_manifest_file(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Base URL of the hosting API
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_remote_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            timeout_secs: default_remote_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecConfig {
    /// Interpreter used by the `python` command
    #[serde(default = "default_interpreter")]
    pub interpreter: String,

    /// Wall-clock limit for one script run (default: 60s)
    #[serde(default = "default_exec_timeout")]
    pub timeout_secs: u64,

    /// Captured output beyond this many bytes is dropped (default: 64 KiB)
    #[serde(default = "default_max_output")]
    pub max_output_bytes: usize,
}

impl Default for ExecConfig {
    fn default() -> Self {
        Self {
            interpreter: default_interpreter(),
            timeout_secs: default_exec_timeout(),
            max_output_bytes: default_max_output(),
        }
    }
}

impl ExecConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UiPreferences {
    /// Editor command for `nano`/`touch` (falls back to $EDITOR, then detection)
    #[serde(default)]
    pub editor: Option<String>,
}

fn default_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_workspace_root() -> PathBuf {
    repoterm_home().join("workspaces")
}

fn default_manifest_file() -> String {
    "requirements.txt".to_string()
}

fn default_api_url() -> String {
    "https://api.github.com".to_string()
}

fn default_remote_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("repoterm/{}", env!("CARGO_PKG_VERSION"))
}

fn default_interpreter() -> String {
    "python".to_string()
}

fn default_exec_timeout() -> u64 {
    60
}

fn default_max_output() -> usize {
    64 * 1024
}

/// `~/.repoterm`, or `./.repoterm` when no home directory is known
pub fn repoterm_home() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".repoterm")
}

impl AppConfig {
    /// Load configuration from default locations, then apply environment overrides
    pub fn load() -> Result<Self> {
        let mut config = Self::default();

        // Lowest precedence first; later files override earlier ones
        for path in Self::get_config_paths().iter().rev() {
            if let Some(file_config) = Self::load_file(path)? {
                config.merge(file_config);
            }
        }

        config.apply_env_overrides(std::env::vars());
        Ok(config)
    }

    pub fn load_file(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        let config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;
        Ok(Some(config))
    }

    /// Get configuration file paths in order of precedence
    fn get_config_paths() -> Vec<PathBuf> {
        let mut paths = vec![];

        // 1. Local project config
        if let Ok(cwd) = std::env::current_dir() {
            paths.push(cwd.join(".repoterm").join("config.toml"));
        }

        // 2. User config (~/.repoterm/config/config.toml)
        paths.push(Self::get_user_config_dir().join("config.toml"));

        // 3. System config
        paths.push(PathBuf::from("/etc/repoterm/config.toml"));

        paths
    }

    fn get_user_config_dir() -> PathBuf {
        repoterm_home().join("config")
    }

    /// Merge another config into this one; values left at their defaults in
    /// `other` do not override what is already set
    fn merge(&mut self, other: AppConfig) {
        if other.workspace.root != default_workspace_root() {
            self.workspace.root = other.workspace.root;
        }
        if other.workspace.manifest_file != default_manifest_file() {
            self.workspace.manifest_file = other.workspace.manifest_file;
        }

        if other.remote.api_url != default_api_url() {
            self.remote.api_url = other.remote.api_url;
        }
        if other.remote.timeout_secs != default_remote_timeout() {
            self.remote.timeout_secs = other.remote.timeout_secs;
        }
        if other.remote.user_agent != default_user_agent() {
            self.remote.user_agent = other.remote.user_agent;
        }

        if other.exec.interpreter != default_interpreter() {
            self.exec.interpreter = other.exec.interpreter;
        }
        if other.exec.timeout_secs != default_exec_timeout() {
            self.exec.timeout_secs = other.exec.timeout_secs;
        }
        if other.exec.max_output_bytes != default_max_output() {
            self.exec.max_output_bytes = other.exec.max_output_bytes;
        }

        if other.ui.editor.is_some() {
            self.ui.editor = other.ui.editor;
        }
    }

    /// Apply `REPOTERM_*` overrides from an environment listing
    pub fn apply_env_overrides(&mut self, vars: impl IntoIterator<Item = (String, String)>) {
        for (key, value) in vars {
            match key.as_str() {
                "REPOTERM_WORKSPACE_ROOT" => self.workspace.root = PathBuf::from(value),
                "REPOTERM_API_URL" => self.remote.api_url = value,
                "REPOTERM_PYTHON" => self.exec.interpreter = value,
                _ => {}
            }
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            workspace: WorkspaceConfig::default(),
            remote: RemoteConfig::default(),
            exec: ExecConfig::default(),
            ui: UiPreferences::default(),
        }
    }
}
