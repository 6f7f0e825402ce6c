// ABOUTME: Secure credential storage using system keychain
// Uses keyring crate for cross-platform support (macOS Keychain, Linux Secret Service)

use anyhow::{Context, Result};
use keyring::Entry;

const SERVICE_NAME: &str = "repoterm";

/// Environment variables consulted for a token, in order
pub const TOKEN_ENV_VARS: &[&str] = &["REPOTERM_TOKEN", "GITHUB_TOKEN"];

/// Credential keys for different secrets
pub enum CredentialKey {
    GithubPat,
}

impl CredentialKey {
    fn as_str(&self) -> &'static str {
        match self {
            CredentialKey::GithubPat => "github_pat",
        }
    }
}

/// Where a resolved token came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenSource {
    Flag,
    Env(&'static str),
    Keychain,
}

impl std::fmt::Display for TokenSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenSource::Flag => write!(f, "--token"),
            TokenSource::Env(var) => write!(f, "${}", var),
            TokenSource::Keychain => write!(f, "system keychain"),
        }
    }
}

/// Store a credential in the system keychain
pub fn store_credential(key: CredentialKey, value: &str) -> Result<()> {
    let entry = Entry::new(SERVICE_NAME, key.as_str())
        .context("Failed to create keyring entry")?;

    entry
        .set_password(value)
        .context("Failed to store credential in keychain")?;

    tracing::info!("Stored credential: {}", key.as_str());
    Ok(())
}

/// Retrieve a credential from the system keychain
pub fn get_credential(key: CredentialKey) -> Result<Option<String>> {
    let entry = Entry::new(SERVICE_NAME, key.as_str())
        .context("Failed to create keyring entry")?;

    match entry.get_password() {
        Ok(password) => {
            tracing::debug!("Retrieved credential: {}", key.as_str());
            Ok(Some(password))
        }
        Err(keyring::Error::NoEntry) => {
            tracing::debug!("No credential found for: {}", key.as_str());
            Ok(None)
        }
        Err(e) => {
            tracing::warn!("Failed to retrieve credential {}: {}", key.as_str(), e);
            Err(anyhow::anyhow!("Failed to retrieve credential: {}", e))
        }
    }
}

/// Delete a credential from the system keychain
pub fn delete_credential(key: CredentialKey) -> Result<()> {
    let entry = Entry::new(SERVICE_NAME, key.as_str())
        .context("Failed to create keyring entry")?;

    match entry.delete_credential() {
        Ok(()) => {
            tracing::info!("Deleted credential: {}", key.as_str());
            Ok(())
        }
        Err(keyring::Error::NoEntry) => Ok(()),
        Err(e) => Err(anyhow::anyhow!("Failed to delete credential: {}", e)),
    }
}

/// Store a GitHub personal access token
pub fn store_github_token(token: &str) -> Result<()> {
    let token = token.trim();
    if token.is_empty() {
        return Err(anyhow::anyhow!("Token cannot be empty"));
    }
    if !(token.starts_with("ghp_") || token.starts_with("github_pat_") || token.starts_with("gho_")) {
        tracing::warn!("Token doesn't look like a GitHub token - may be invalid");
    }

    store_credential(CredentialKey::GithubPat, token)
}

pub fn get_github_token() -> Result<Option<String>> {
    get_credential(CredentialKey::GithubPat)
}

pub fn delete_github_token() -> Result<()> {
    delete_credential(CredentialKey::GithubPat)
}

/// Masked form of a token for display
pub fn mask_token(token: &str) -> String {
    let prefix: String = token.chars().take(8).collect();
    if token.chars().count() > 12 {
        format!("{}••••••••", prefix)
    } else {
        "••••••••".to_string()
    }
}

/// Pick a token: explicit flag, then environment, then keychain
pub fn resolve_token(flag: Option<&str>) -> Result<Option<(String, TokenSource)>> {
    resolve_token_from(flag, |var| std::env::var(var).ok(), get_github_token)
}

fn resolve_token_from(
    flag: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
    keychain: impl FnOnce() -> Result<Option<String>>,
) -> Result<Option<(String, TokenSource)>> {
    if let Some(token) = flag.map(str::trim).filter(|t| !t.is_empty()) {
        return Ok(Some((token.to_string(), TokenSource::Flag)));
    }
    for var in TOKEN_ENV_VARS.iter().copied() {
        if let Some(token) = env(var).filter(|t| !t.trim().is_empty()) {
            return Ok(Some((token.trim().to_string(), TokenSource::Env(var))));
        }
    }
    Ok(keychain()?.map(|t| (t, TokenSource::Keychain)))
}
