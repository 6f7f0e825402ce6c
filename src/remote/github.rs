// ABOUTME: GitHub contents API client implementing RemoteRepository over bearer-token HTTPS

use base64::Engine as _;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use super::{RemoteError, RemoteRepository, VersionTag};
use crate::config::RemoteConfig;
use crate::git::RepoId;

/// Client for one repository on a GitHub-compatible API
#[derive(Debug, Clone)]
pub struct GitHubRemote {
    client: Client,
    api_url: Url,
    repo: RepoId,
    token: String,
}

#[derive(Debug, Deserialize)]
struct ContentsResponse {
    #[serde(rename = "type")]
    kind: String,
    sha: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    encoding: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WriteResponse {
    content: WrittenContent,
}

#[derive(Debug, Deserialize)]
struct WrittenContent {
    sha: String,
}

#[derive(Debug, Serialize)]
struct WriteRequest<'a> {
    message: &'a str,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct DeleteRequest<'a> {
    message: &'a str,
    sha: &'a str,
}

impl GitHubRemote {
    pub fn new(config: &RemoteConfig, repo: RepoId, token: &str) -> Result<Self, RemoteError> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RemoteError::Api(format!("Failed to create HTTP client: {}", e)))?;

        let api_url = Url::parse(&config.api_url)
            .map_err(|e| RemoteError::Api(format!("Invalid API URL {}: {}", config.api_url, e)))?;

        Ok(Self {
            client,
            api_url,
            repo,
            token: token.to_string(),
        })
    }

    /// `{api}/repos/{owner}/{repo}` followed by `extra` segments, each escaped
    fn endpoint<'a>(&self, extra: impl IntoIterator<Item = &'a str>) -> Result<Url, RemoteError> {
        let mut url = self.api_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| RemoteError::Api(format!("API URL {} cannot be a base", self.api_url)))?;
            segments.pop_if_empty();
            segments.extend(["repos", self.repo.owner.as_str(), self.repo.name.as_str()]);
            segments.extend(extra);
        }
        Ok(url)
    }

    fn contents_url(&self, path: &str) -> Result<Url, RemoteError> {
        let parts = path.split('/').filter(|p| !p.is_empty() && *p != ".");
        self.endpoint(std::iter::once("contents").chain(parts))
    }

    fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
    }

    async fn send(&self, builder: reqwest::RequestBuilder) -> Result<Response, RemoteError> {
        builder.send().await.map_err(|e| {
            warn!("Request to {} failed: {}", self.repo, e);
            RemoteError::Network(e.without_url().to_string())
        })
    }
}

/// Map a non-success status into the remote error taxonomy
async fn status_error(response: Response, path: &str) -> RemoteError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    classify_status(status, &body, path)
}

fn classify_status(status: StatusCode, body: &str, path: &str) -> RemoteError {
    match status {
        StatusCode::NOT_FOUND => RemoteError::NotFound(path.to_string()),
        StatusCode::CONFLICT => RemoteError::Conflict(path.to_string()),
        // Creating over an existing path without its sha, or updating with a
        // sha that no longer matches, is reported as a validation failure
        StatusCode::UNPROCESSABLE_ENTITY if body.contains("sha") => {
            RemoteError::Conflict(path.to_string())
        }
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            RemoteError::Unauthorized(format!("{} ({})", status, summarize(body)))
        }
        s if s.is_server_error() => RemoteError::Network(format!("{} ({})", s, summarize(body))),
        s => RemoteError::Api(format!("{} ({})", s, summarize(body))),
    }
}

fn summarize(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.chars().take(200).collect())
}

fn decode_content(path: &str, body: ContentsResponse) -> Result<(Vec<u8>, VersionTag), RemoteError> {
    if body.kind != "file" {
        return Err(RemoteError::Api(format!("{} is a {}, not a file", path, body.kind)));
    }
    let encoded: String = body
        .content
        .unwrap_or_default()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    let bytes = match body.encoding.as_deref() {
        Some("base64") | None => base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map_err(|e| RemoteError::Api(format!("Invalid content encoding for {}: {}", path, e)))?,
        Some(other) => {
            return Err(RemoteError::Api(format!(
                "Unsupported content encoding '{}' for {}",
                other, path
            )))
        }
    };
    Ok((bytes, VersionTag::new(body.sha)))
}

#[async_trait::async_trait]
impl RemoteRepository for GitHubRemote {
    async fn probe(&self) -> Result<(), RemoteError> {
        let url = self.endpoint(std::iter::empty())?;
        let response = self.send(self.request(reqwest::Method::GET, url)).await?;
        if response.status().is_success() {
            debug!("Remote {} reachable", self.repo);
            Ok(())
        } else {
            Err(status_error(response, &self.repo.full_name()).await)
        }
    }

    async fn get_content(&self, path: &str) -> Result<(Vec<u8>, VersionTag), RemoteError> {
        let url = self.contents_url(path)?;
        let response = self.send(self.request(reqwest::Method::GET, url)).await?;
        if !response.status().is_success() {
            return Err(status_error(response, path).await);
        }

        // Directories come back as a JSON array
        let value: serde_json::Value = response
            .json()
            .await
            .map_err(|e| RemoteError::Api(format!("Failed to parse contents of {}: {}", path, e)))?;
        if value.is_array() {
            return Err(RemoteError::Api(format!("{} is a directory, not a file", path)));
        }
        let body: ContentsResponse = serde_json::from_value(value)
            .map_err(|e| RemoteError::Api(format!("Failed to parse contents of {}: {}", path, e)))?;
        decode_content(path, body)
    }

    async fn create_file(
        &self,
        path: &str,
        content: &[u8],
        message: &str,
    ) -> Result<VersionTag, RemoteError> {
        self.put(path, content, None, message).await
    }

    async fn update_file(
        &self,
        path: &str,
        content: &[u8],
        tag: &VersionTag,
        message: &str,
    ) -> Result<VersionTag, RemoteError> {
        self.put(path, content, Some(tag), message).await
    }

    async fn delete_file(
        &self,
        path: &str,
        tag: &VersionTag,
        message: &str,
    ) -> Result<(), RemoteError> {
        let url = self.contents_url(path)?;
        let body = DeleteRequest {
            message,
            sha: tag.as_str(),
        };
        let response = self
            .send(self.request(reqwest::Method::DELETE, url).json(&body))
            .await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(status_error(response, path).await)
        }
    }
}

impl GitHubRemote {
    async fn put(
        &self,
        path: &str,
        content: &[u8],
        tag: Option<&VersionTag>,
        message: &str,
    ) -> Result<VersionTag, RemoteError> {
        let url = self.contents_url(path)?;
        let body = WriteRequest {
            message,
            content: base64::engine::general_purpose::STANDARD.encode(content),
            sha: tag.map(VersionTag::as_str),
        };
        let response = self
            .send(self.request(reqwest::Method::PUT, url).json(&body))
            .await?;
        if !response.status().is_success() {
            return Err(status_error(response, path).await);
        }

        let written: WriteResponse = response
            .json()
            .await
            .map_err(|e| RemoteError::Api(format!("Failed to parse write response for {}: {}", path, e)))?;
        Ok(VersionTag::new(written.content.sha))
    }
}
