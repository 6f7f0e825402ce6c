// ABOUTME: Behavioral tests for configuration loading
// Verifies config defaults, partial files, and serialization roundtrips

use anyhow::Result;
use std::path::PathBuf;
use tempfile::TempDir;

use repoterm::config::AppConfig;

/// Defaults are usable without any config file
#[test]
fn test_default_config_has_sensible_values() {
    let config = AppConfig::default();

    assert_eq!(config.workspace.manifest_file, "requirements.txt");
    assert_eq!(config.remote.api_url, "https://api.github.com");
    assert_eq!(config.remote.timeout_secs, 30);
    assert_eq!(config.exec.timeout_secs, 60);
    assert_eq!(config.exec.max_output_bytes, 65536);
    assert!(config.ui.editor.is_none());
    assert_eq!(config.version, env!("CARGO_PKG_VERSION"));
}

/// A saved-then-loaded config keeps every field
#[test]
fn test_config_toml_roundtrip() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("config.toml");

    let mut config = AppConfig::default();
    config.workspace.root = PathBuf::from("/srv/workspaces");
    config.exec.interpreter = "python3".to_string();
    config.ui.editor = Some("vim".to_string());
    std::fs::write(&path, toml::to_string_pretty(&config)?)?;

    let loaded = AppConfig::load_file(&path)?.expect("file exists");
    assert_eq!(loaded.workspace.root, PathBuf::from("/srv/workspaces"));
    assert_eq!(loaded.exec.interpreter, "python3");
    assert_eq!(loaded.ui.editor.as_deref(), Some("vim"));
    Ok(())
}

/// A malformed file is an error that names the file
#[test]
fn test_malformed_config_names_the_file() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[exec\ntimeout_secs = ")?;

    let err = AppConfig::load_file(&path).unwrap_err();
    assert!(format!("{err:#}").contains("config.toml"));
    Ok(())
}
