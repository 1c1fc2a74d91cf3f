//! Adapter interfaces for remote catalog storage.
//!
//! Adapters mediate reads and writes of the catalog document against a
//! hosted content API.

pub mod github;

use async_trait::async_trait;
use thiserror::Error;

// Re-export the GitHub adapter
pub use github::{GitHubConfig, GitHubStore};

use crate::catalog::CatalogDocument;

/// Errors talking to a remote store
#[derive(Debug, Error)]
pub enum RemoteStoreError {
    #[error("remote API error: {status}")]
    Status { status: String },

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("malformed catalog document: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("invalid content encoding: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("no access token available: {0}")]
    MissingToken(String),
}

/// Trait for remote catalog stores.
///
/// The manager takes any implementation, so tests can substitute an
/// in-memory store.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Human-readable store name
    fn name(&self) -> &str;

    /// Retrieve the current catalog document.
    ///
    /// `Ok(None)` means the remote file does not exist yet; that is
    /// absence, not an error.
    async fn fetch(&self) -> Result<Option<CatalogDocument>, RemoteStoreError>;

    /// Write a new revision of the catalog document.
    ///
    /// Exactly one attempt. The write carries the version token of the
    /// last fetched revision so a concurrent edit rejects it.
    async fn save(&self, document: &CatalogDocument) -> Result<(), RemoteStoreError>;
}
