//! GitHub contents API adapter for the catalog document.
//!
//! The catalog lives as a single JSON file in a repository. Reads decode
//! the base64 content envelope; writes re-fetch the file and carry its
//! blob SHA so the API rejects the update if the content moved in
//! between (last-fetched-wins).

use std::path::PathBuf;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{RemoteStore, RemoteStoreError};
use crate::catalog::CatalogDocument;

/// Commit message recorded for every catalog revision
const COMMIT_MESSAGE: &str = "Update songs data";

/// Environment variable consulted first for the bearer token
pub const TOKEN_ENV: &str = "SONGBOOK_GITHUB_TOKEN";

/// Configuration for the GitHub-backed store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// Repository owner
    pub owner: String,

    /// Repository name
    pub repo: String,

    /// Branch the catalog file lives on
    #[serde(default = "default_branch")]
    pub branch: String,

    /// Path of the catalog file within the repository
    #[serde(default = "default_data_file")]
    pub data_file: String,
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_data_file() -> String {
    "songs-data.json".to_string()
}

/// GitHub contents API client
pub struct GitHubStore {
    config: GitHubConfig,
    api_base: String,
    token_file: Option<PathBuf>,
    client: reqwest::Client,
}

/// Read envelope returned by the contents endpoint
#[derive(Debug, Deserialize)]
struct ContentEnvelope {
    /// Base64 payload, wrapped with newlines by the API
    content: String,

    /// Blob SHA, the version token for conditional writes
    sha: String,
}

/// Write body accepted by the contents endpoint
#[derive(Debug, Serialize)]
struct UpdateRequest<'a> {
    message: &'a str,
    content: String,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<String>,
}

impl GitHubStore {
    /// Create a store for the configured repository
    pub fn new(config: GitHubConfig) -> Self {
        Self {
            config,
            api_base: "https://api.github.com".to_string(),
            token_file: None,
            client: reqwest::Client::new(),
        }
    }

    /// Override the API base URL (tests)
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    /// Token file consulted when the environment variable is unset
    pub fn with_token_file(mut self, path: PathBuf) -> Self {
        self.token_file = Some(path);
        self
    }

    /// Build the contents endpoint URL
    fn contents_url(&self) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.api_base, self.config.owner, self.config.repo, self.config.data_file
        )
    }

    /// Resolve the bearer token at call time. Never cached: environment
    /// variable first, then the configured token file.
    async fn resolve_token(&self) -> Result<String, RemoteStoreError> {
        if let Ok(token) = std::env::var(TOKEN_ENV) {
            let token = token.trim().to_string();
            if !token.is_empty() {
                return Ok(token);
            }
        }

        if let Some(path) = &self.token_file {
            if let Ok(raw) = tokio::fs::read_to_string(path).await {
                let token = raw.trim().to_string();
                if !token.is_empty() {
                    return Ok(token);
                }
            }
        }

        Err(RemoteStoreError::MissingToken(format!(
            "set {} or provide a token file",
            TOKEN_ENV
        )))
    }

    /// Fetch the raw envelope, keeping the blob SHA for conditional writes
    async fn fetch_envelope(&self) -> Result<Option<ContentEnvelope>, RemoteStoreError> {
        let response = self
            .client
            .get(self.contents_url())
            .query(&[("ref", self.config.branch.as_str())])
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", "songbook")
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !response.status().is_success() {
            return Err(RemoteStoreError::Status {
                status: describe_status(response.status()),
            });
        }

        Ok(Some(response.json().await?))
    }
}

#[async_trait]
impl RemoteStore for GitHubStore {
    fn name(&self) -> &str {
        "github"
    }

    async fn fetch(&self) -> Result<Option<CatalogDocument>, RemoteStoreError> {
        match self.fetch_envelope().await? {
            Some(envelope) => Ok(Some(decode_document(&envelope)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, document: &CatalogDocument) -> Result<(), RemoteStoreError> {
        let sha = self.fetch_envelope().await?.map(|envelope| envelope.sha);
        let token = self.resolve_token().await?;

        let body = UpdateRequest {
            message: COMMIT_MESSAGE,
            content: encode_document(document)?,
            branch: &self.config.branch,
            sha,
        };

        let response = self
            .client
            .put(self.contents_url())
            .header("Authorization", format!("Bearer {}", token))
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", "songbook")
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(RemoteStoreError::Status {
                status: describe_status(response.status()),
            });
        }

        debug!(file = %self.config.data_file, "Saved catalog document");
        Ok(())
    }
}

fn describe_status(status: reqwest::StatusCode) -> String {
    match status.canonical_reason() {
        Some(reason) => format!("{} {}", status.as_u16(), reason),
        None => status.as_u16().to_string(),
    }
}

/// Decode the envelope payload into a catalog document.
/// The API wraps base64 at 60 columns; whitespace is stripped first.
fn decode_document(envelope: &ContentEnvelope) -> Result<CatalogDocument, RemoteStoreError> {
    let compact: String = envelope
        .content
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    let bytes = BASE64.decode(compact.as_bytes())?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Encode a catalog document as the envelope payload
fn encode_document(document: &CatalogDocument) -> Result<String, RemoteStoreError> {
    let json = serde_json::to_vec_pretty(document)?;
    Ok(BASE64.encode(json))
}
