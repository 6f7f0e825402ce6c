// ABOUTME: Repository identifier parsing for the remote a session is bound to

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Represents how the user named the remote repository
#[derive(Debug, Clone, PartialEq)]
pub enum RepoSource {
    /// HTTPS URL (https://github.com/user/repo)
    HttpsUrl(String),
    /// SSH URL (git@github.com:user/repo.git)
    SshUrl(String),
    /// GitHub shorthand (user/repo) - expands to HTTPS
    GithubShorthand { owner: String, repo: String },
}

/// Fully qualified identity of a hosted repository
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoId {
    pub host: String,
    pub owner: String,
    pub name: String,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RepoSourceError {
    #[error("Invalid URL format: {0}")]
    InvalidUrl(String),
    #[error("Unable to parse repository: {0}")]
    ParseError(String),
}

impl RepoSource {
    /// Classify user input into appropriate RepoSource variant
    pub fn from_input(input: &str) -> Result<Self, RepoSourceError> {
        let input = input.trim();

        if input.is_empty() {
            return Err(RepoSourceError::ParseError("Empty input".to_string()));
        }

        if input.starts_with("https://") || input.starts_with("http://") {
            return Ok(RepoSource::HttpsUrl(input.trim_end_matches('/').to_string()));
        }

        if input.starts_with("git@") || input.starts_with("ssh://") {
            return Ok(RepoSource::SshUrl(input.to_string()));
        }

        // GitHub shorthand: owner/repo (no spaces, exactly one slash, no protocol)
        if !input.contains(' ') && input.matches('/').count() == 1 && !input.contains(':') {
            let parts: Vec<&str> = input.split('/').collect();
            if parts.len() == 2 && !parts[0].is_empty() && !parts[1].is_empty() {
                return Ok(RepoSource::GithubShorthand {
                    owner: parts[0].to_string(),
                    repo: parts[1].trim_end_matches(".git").to_string(),
                });
            }
        }

        // host/owner/repo without protocol
        if input.contains('/') && input.contains('.') && !input.starts_with('.') {
            return Ok(RepoSource::HttpsUrl(format!("https://{}", input)));
        }

        Err(RepoSourceError::ParseError(format!(
            "Expected owner/repo or a repository URL, got '{}'",
            input
        )))
    }

    /// Extract host/owner/repo
    pub fn parse_components(&self) -> Result<RepoId, RepoSourceError> {
        match self {
            RepoSource::HttpsUrl(url) => parse_https_url(url),
            RepoSource::SshUrl(url) => parse_ssh_url(url),
            RepoSource::GithubShorthand { owner, repo } => {
                Ok(RepoId::new("github.com", owner, repo))
            }
        }
    }
}

impl RepoId {
    pub fn new(host: &str, owner: &str, name: &str) -> Self {
        Self {
            host: host.to_string(),
            owner: owner.to_string(),
            name: name.to_string(),
        }
    }

    /// Parse any accepted repository notation
    pub fn parse(input: &str) -> Result<Self, RepoSourceError> {
        let id = RepoSource::from_input(input)?.parse_components()?;
        for part in [&id.host, &id.owner, &id.name] {
            if part.is_empty() || part == "." || part == ".." {
                return Err(RepoSourceError::ParseError(format!(
                    "Invalid repository component in '{}'",
                    input
                )));
            }
        }
        Ok(id)
    }

    /// `owner/name`, as used by the hosting API
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }

    /// Deterministic workspace location for this repository under `root`
    pub fn local_root(&self, root: &Path) -> PathBuf {
        root.join(&self.host).join(&self.owner).join(&self.name)
    }

    /// HTTPS clone URL carrying the access token as credentials
    pub fn authenticated_clone_url(&self, token: &str) -> String {
        format!(
            "https://x-access-token:{}@{}/{}/{}.git",
            token, self.host, self.owner, self.name
        )
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host == "github.com" {
            write!(f, "{}/{}", self.owner, self.name)
        } else {
            write!(f, "{}/{}/{}", self.host, self.owner, self.name)
        }
    }
}

/// Replace credentials embedded in a URL so it can be logged
pub fn redact_url(url: &str) -> String {
    match (url.find("://"), url.find('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            format!("{}://***{}", &url[..scheme_end], &url[at..])
        }
        _ => url.to_string(),
    }
}

/// The same URL with any user name or password removed. Local paths and
/// scp-style addresses are returned as-is.
pub fn strip_credentials(url: &str) -> String {
    match url::Url::parse(url) {
        Ok(mut parsed) if parsed.has_host() && (!parsed.username().is_empty() || parsed.password().is_some()) => {
            // Only fails for cannot-be-a-base URLs, which have no host
            let _ = parsed.set_username("");
            let _ = parsed.set_password(None);
            parsed.to_string()
        }
        _ => url.to_string(),
    }
}

/// Parse HTTPS URL into components
fn parse_https_url(url: &str) -> Result<RepoId, RepoSourceError> {
    // https://github.com/owner/repo.git or https://github.com/owner/repo
    let url_clean = url.trim_end_matches('/').trim_end_matches(".git");

    let without_protocol = url_clean
        .strip_prefix("https://")
        .or_else(|| url_clean.strip_prefix("http://"))
        .unwrap_or(url_clean);

    let parts: Vec<&str> = without_protocol.split('/').collect();

    if parts.len() == 3 {
        Ok(RepoId::new(parts[0], parts[1], parts[2]))
    } else {
        Err(RepoSourceError::InvalidUrl(format!("Cannot parse URL: {}", url)))
    }
}

/// Parse SSH URL into components
fn parse_ssh_url(url: &str) -> Result<RepoId, RepoSourceError> {
    // git@github.com:owner/repo.git or ssh://git@github.com/owner/repo.git
    let url_clean = url.trim_end_matches(".git");
    let url_normalized = url_clean.strip_prefix("ssh://").unwrap_or(url_clean);

    let Some(at_pos) = url_normalized.find('@') else {
        return Err(RepoSourceError::InvalidUrl(format!("Cannot parse SSH URL: {}", url)));
    };
    let after_at = &url_normalized[at_pos + 1..];

    // Could be : or / separator depending on format
    let (host, path) = match after_at.find(':').or_else(|| after_at.find('/')) {
        Some(pos) => (&after_at[..pos], &after_at[pos + 1..]),
        None => {
            return Err(RepoSourceError::InvalidUrl(format!(
                "Cannot parse SSH URL: {}",
                url
            )))
        }
    };

    let path_parts: Vec<&str> = path.split('/').collect();
    if path_parts.len() == 2 {
        Ok(RepoId::new(host, path_parts[0], path_parts[1]))
    } else {
        Err(RepoSourceError::InvalidUrl(format!("Cannot parse SSH URL: {}", url)))
    }
}
