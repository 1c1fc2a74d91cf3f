//! Local fallback store: the catalog as JSON files on disk.
//!
//! Two independent slots, one for the song list and one for the audio
//! map, mirroring the two keys of the catalog document. Read at startup
//! when no remote store is reachable, written on every persist fallback.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs;
use tracing::debug;

use crate::catalog::{AudioReference, CatalogDocument, Song};

/// File name of the song list slot
const SONGS_FILE: &str = "songs.json";

/// File name of the audio map slot
const AUDIO_FILE: &str = "audio-data.json";

/// Errors reading or writing the local store
#[derive(Debug, Error)]
pub enum LocalStoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// JSON-on-disk store rooted at a directory
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    /// Create a store rooted at the given directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Store rooted at the configured home directory
    pub fn open_default() -> anyhow::Result<Self> {
        Ok(Self::new(crate::config::data_dir()?))
    }

    /// The directory both slots live in
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn songs_path(&self) -> PathBuf {
        self.root.join(SONGS_FILE)
    }

    fn audio_path(&self) -> PathBuf {
        self.root.join(AUDIO_FILE)
    }

    /// Load both slots. Missing files read as an empty catalog.
    pub async fn load(&self) -> Result<CatalogDocument, LocalStoreError> {
        let songs: Vec<Song> = self
            .read_slot(&self.songs_path())
            .await?
            .unwrap_or_default();
        let audio_data: HashMap<String, AudioReference> = self
            .read_slot(&self.audio_path())
            .await?
            .unwrap_or_default();

        Ok(CatalogDocument { songs, audio_data })
    }

    /// Write both slots with the full document state
    pub async fn store(&self, document: &CatalogDocument) -> Result<(), LocalStoreError> {
        fs::create_dir_all(&self.root).await?;

        self.write_slot(&self.songs_path(), &document.songs).await?;
        self.write_slot(&self.audio_path(), &document.audio_data)
            .await?;

        debug!(root = %self.root.display(), songs = document.songs.len(), "Wrote catalog to local store");
        Ok(())
    }

    async fn read_slot<T: serde::de::DeserializeOwned>(
        &self,
        path: &Path,
    ) -> Result<Option<T>, LocalStoreError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(path).await?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    async fn write_slot<T: serde::Serialize>(
        &self,
        path: &Path,
        value: &T,
    ) -> Result<(), LocalStoreError> {
        let content = serde_json::to_string_pretty(value)?;
        fs::write(path, content).await?;
        Ok(())
    }
}
