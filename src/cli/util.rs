// ABOUTME: Shared CLI utilities for token lookup and connecting a session

use anyhow::{anyhow, Context, Result};
use tracing::info;

use repoterm::config::AppConfig;
use repoterm::credentials::resolve_token;
use repoterm::session::{connect, Session};

/// Load configuration, resolve a token, and connect to `repo`
pub async fn open_session(repo: &str, token_flag: Option<&str>) -> Result<(AppConfig, Session)> {
    let config = AppConfig::load().context("Failed to load configuration")?;

    let (token, source) = resolve_token(token_flag)?.ok_or_else(|| {
        anyhow!("No access token found. Pass --token, set GITHUB_TOKEN, or run 'repoterm auth login <token>'.")
    })?;
    info!("Using access token from {}", source);

    let session = connect(&config, &token, repo)
        .await
        .with_context(|| format!("Could not connect to {}", repo))?;
    Ok((config, session))
}
