//! The in-memory catalog and its persistence orchestration.
//!
//! `CatalogManager` holds the authoritative song list and audio map. All
//! mutations go through its methods, update memory first, then persist:
//! one attempt against the remote store when configured, degrading to the
//! local store on any failure. Remote trouble never reaches the caller.

pub mod audio;
pub mod document;
pub mod song;

use std::collections::HashMap;

use chrono::Utc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

pub use audio::{is_youtube_url, youtube_video_id, AudioReference};
pub use document::CatalogDocument;
pub use song::{Song, SongDraft, SongPatch, TagInput, DEFAULT_DEMO_TEXT};

use crate::adapters::RemoteStore;
use crate::storage::LocalStore;

/// Lifecycle of the manager's in-memory state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogState {
    /// Constructed, initial load not yet started
    Uninitialized,

    /// Initial load in flight
    Loading,

    /// In-memory state is authoritative
    Ready,
}

/// Sort order for search results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// A to Z by name
    #[default]
    Ascending,

    /// Z to A by name
    Descending,
}

/// A composed read of a song together with its audio reference.
///
/// The view is built on demand; the stored record is never mutated by a
/// read.
#[derive(Debug, Clone, PartialEq)]
pub struct SongView {
    pub song: Song,
    pub audio: Option<AudioReference>,
}

/// Single authoritative view of the catalog.
///
/// Constructed with explicit stores so tests can substitute either one.
pub struct CatalogManager {
    songs: Vec<Song>,
    audio_data: HashMap<String, AudioReference>,
    remote: Option<Box<dyn RemoteStore>>,
    local: LocalStore,
    state_tx: watch::Sender<CatalogState>,
    state_rx: watch::Receiver<CatalogState>,
    last_id_millis: i64,
}

impl CatalogManager {
    /// Create a manager with explicit stores. The catalog starts empty;
    /// call [`CatalogManager::load`] before mutating.
    pub fn new(remote: Option<Box<dyn RemoteStore>>, local: LocalStore) -> Self {
        let (state_tx, state_rx) = watch::channel(CatalogState::Uninitialized);
        Self {
            songs: Vec::new(),
            audio_data: HashMap::new(),
            remote,
            local,
            state_tx,
            state_rx,
            last_id_millis: 0,
        }
    }

    /// Manager without a remote store, persisting only locally
    pub fn local_only(local: LocalStore) -> Self {
        Self::new(None, local)
    }

    /// Current lifecycle state
    pub fn state(&self) -> CatalogState {
        *self.state_rx.borrow()
    }

    /// A future that resolves once the initial load has completed.
    ///
    /// Completion is signalled through a watch channel, not polled.
    pub fn ready(&self) -> impl std::future::Future<Output = ()> + Send + 'static {
        let mut rx = self.state_rx.clone();
        async move {
            // Err means the sender dropped, at which point no further
            // transition can happen anyway.
            let _ = rx.wait_for(|state| *state == CatalogState::Ready).await;
        }
    }

    /// Perform the initial load.
    ///
    /// With a remote store configured: a present document seeds memory,
    /// absence seeds an empty catalog, and any failure falls back to the
    /// local store. Without one, the local store is read directly.
    pub async fn load(&mut self) {
        let _ = self.state_tx.send(CatalogState::Loading);

        let document = match &self.remote {
            Some(remote) => match remote.fetch().await {
                Ok(Some(document)) => {
                    info!(
                        store = remote.name(),
                        songs = document.songs.len(),
                        "Loaded catalog from remote store"
                    );
                    document
                }
                Ok(None) => {
                    info!(store = remote.name(), "Remote catalog absent, starting empty");
                    CatalogDocument::new()
                }
                Err(e) => {
                    warn!(
                        store = remote.name(),
                        error = %e,
                        "Remote load failed, falling back to local store"
                    );
                    self.load_local().await
                }
            },
            None => self.load_local().await,
        };

        self.last_id_millis = document
            .songs
            .iter()
            .filter_map(|song| song.id.parse().ok())
            .max()
            .unwrap_or(0);
        self.songs = document.songs;
        self.audio_data = document.audio_data;

        let _ = self.state_tx.send(CatalogState::Ready);
    }

    async fn load_local(&self) -> CatalogDocument {
        match self.local.load().await {
            Ok(document) => {
                debug!(songs = document.songs.len(), "Loaded catalog from local store");
                document
            }
            Err(e) => {
                warn!(error = %e, "Local store unreadable, starting empty");
                CatalogDocument::new()
            }
        }
    }

    /// Add a new song and persist.
    ///
    /// Assigns a fresh identifier, normalizes tags, fills the demo text
    /// default, and records at most one audio reference (a file payload
    /// wins over a URL). Returns the stored record.
    pub async fn add(
        &mut self,
        draft: SongDraft,
        audio_payload: Option<String>,
        audio_url: Option<String>,
    ) -> Song {
        let song = Song {
            id: self.next_id(),
            name: draft.name,
            composer: draft.composer,
            lyrics: draft.lyrics,
            tags: draft.tags.normalize(),
            demo_text: draft
                .demo_text
                .filter(|text| !text.is_empty())
                .unwrap_or_else(|| DEFAULT_DEMO_TEXT.to_string()),
        };

        if let Some(reference) = audio_reference(audio_payload, audio_url) {
            self.audio_data.insert(song.id.clone(), reference);
        }

        self.songs.push(song.clone());
        info!(id = %song.id, name = %song.name, "Added song");

        self.persist().await;
        song
    }

    /// Composed read of a song and its audio reference
    pub fn get(&self, id: &str) -> Option<SongView> {
        self.songs.iter().find(|song| song.id == id).map(|song| SongView {
            song: song.clone(),
            audio: self.audio_data.get(id).cloned(),
        })
    }

    /// Merge a partial record onto an existing song and persist.
    ///
    /// The identifier is preserved regardless of what the patch carries.
    /// Tags re-normalize the same way as [`CatalogManager::add`]; the
    /// audio reference is replaced only when a new payload or URL is
    /// supplied. Returns `false` when the id is unknown.
    pub async fn update(
        &mut self,
        id: &str,
        patch: SongPatch,
        audio_payload: Option<String>,
        audio_url: Option<String>,
    ) -> bool {
        let Some(song) = self.songs.iter_mut().find(|song| song.id == id) else {
            return false;
        };

        if let Some(name) = patch.name {
            song.name = name;
        }
        if let Some(composer) = patch.composer {
            song.composer = composer;
        }
        if let Some(lyrics) = patch.lyrics {
            song.lyrics = lyrics;
        }
        if let Some(tags) = patch.tags {
            song.tags = tags.normalize();
        }

        // Precedence: patch value, existing value, default.
        match patch.demo_text {
            Some(text) if !text.is_empty() => song.demo_text = text,
            _ => {
                if song.demo_text.is_empty() {
                    song.demo_text = DEFAULT_DEMO_TEXT.to_string();
                }
            }
        }

        if let Some(reference) = audio_reference(audio_payload, audio_url) {
            self.audio_data.insert(id.to_string(), reference);
        }

        info!(id, "Updated song");
        self.persist().await;
        true
    }

    /// Remove a song and its audio entry together, then persist.
    /// Returns `false` when the id is unknown.
    pub async fn remove(&mut self, id: &str) -> bool {
        let Some(pos) = self.songs.iter().position(|song| song.id == id) else {
            return false;
        };

        self.songs.remove(pos);
        self.audio_data.remove(id);

        info!(id, "Removed song");
        self.persist().await;
        true
    }

    /// Case-insensitive search across name, composer, lyrics and tags.
    ///
    /// An empty query matches every song. Non-empty `tag_filters` keep
    /// only songs with at least one tag substring-matching at least one
    /// filter term; query and tag filters combine with AND. Results sort
    /// by name in the requested order; ties keep list order.
    pub fn search(&self, query: &str, sort: SortOrder, tag_filters: &[String]) -> Vec<&Song> {
        let query = query.trim().to_lowercase();

        let mut results: Vec<&Song> = self
            .songs
            .iter()
            .filter(|song| query.is_empty() || matches_query(song, &query))
            .filter(|song| tag_filters.is_empty() || matches_tags(song, tag_filters))
            .collect();

        results.sort_by(|a, b| {
            let ordering = a.name.to_lowercase().cmp(&b.name.to_lowercase());
            match sort {
                SortOrder::Ascending => ordering,
                SortOrder::Descending => ordering.reverse(),
            }
        });

        results
    }

    /// Deduplicated, alphabetically sorted union of all tags
    pub fn list_tags(&self) -> Vec<String> {
        let mut tags: Vec<String> = self
            .songs
            .iter()
            .flat_map(|song| song.tags.iter().cloned())
            .collect();
        tags.sort();
        tags.dedup();
        tags
    }

    /// Audio reference for a song, if any
    pub fn audio(&self, id: &str) -> Option<&AudioReference> {
        self.audio_data.get(id)
    }

    /// Replace a song's audio reference directly and persist.
    /// No-op when neither a payload nor a URL is supplied.
    pub async fn set_audio(
        &mut self,
        id: &str,
        audio_payload: Option<String>,
        audio_url: Option<String>,
    ) {
        if let Some(reference) = audio_reference(audio_payload, audio_url) {
            self.audio_data.insert(id.to_string(), reference);
            self.persist().await;
        }
    }

    /// All songs in insertion order
    pub fn songs(&self) -> &[Song] {
        &self.songs
    }

    /// Number of songs in the catalog
    pub fn len(&self) -> usize {
        self.songs.len()
    }

    /// Whether the catalog holds no songs
    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }

    /// Snapshot the in-memory state as a catalog document
    pub fn to_document(&self) -> CatalogDocument {
        CatalogDocument {
            songs: self.songs.clone(),
            audio_data: self.audio_data.clone(),
        }
    }

    /// One persistence attempt after a mutation: remote first when
    /// configured, local store on failure or when no remote exists.
    async fn persist(&self) {
        let document = self.to_document();

        if let Some(remote) = &self.remote {
            match remote.save(&document).await {
                Ok(()) => {
                    debug!(store = remote.name(), "Persisted catalog to remote store");
                    return;
                }
                Err(e) => {
                    warn!(
                        store = remote.name(),
                        error = %e,
                        "Remote save failed, writing local fallback"
                    );
                }
            }
        }

        if let Err(e) = self.local.store(&document).await {
            warn!(error = %e, "Local store write failed");
        }
    }

    /// Fresh identifier from the current time in milliseconds, bumped
    /// past the last issued id so consecutive adds stay distinct.
    fn next_id(&mut self) -> String {
        let now = Utc::now().timestamp_millis();
        let next = now.max(self.last_id_millis + 1);
        self.last_id_millis = next;
        next.to_string()
    }
}

/// At most one audio reference per call; a file payload wins over a URL.
fn audio_reference(payload: Option<String>, url: Option<String>) -> Option<AudioReference> {
    if let Some(data) = payload {
        Some(AudioReference::from_file(data))
    } else {
        url.map(AudioReference::from_url)
    }
}

fn matches_query(song: &Song, query: &str) -> bool {
    song.name.to_lowercase().contains(query)
        || song.composer.to_lowercase().contains(query)
        || song.lyrics.to_lowercase().contains(query)
        || song.tags.iter().any(|tag| tag.to_lowercase().contains(query))
}

fn matches_tags(song: &Song, filters: &[String]) -> bool {
    filters.iter().any(|filter| {
        let filter = filter.to_lowercase();
        song.tags.iter().any(|tag| tag.to_lowercase().contains(&filter))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn manager(temp: &TempDir) -> CatalogManager {
        let mut manager = CatalogManager::local_only(LocalStore::new(temp.path()));
        manager.load().await;
        manager
    }

    #[tokio::test]
    async fn test_state_transitions() {
        let temp = TempDir::new().unwrap();
        let mut manager = CatalogManager::local_only(LocalStore::new(temp.path()));
        assert_eq!(manager.state(), CatalogState::Uninitialized);

        let ready = manager.ready();
        manager.load().await;
        assert_eq!(manager.state(), CatalogState::Ready);

        // Resolves immediately once Ready has been observed
        ready.await;
    }

    #[tokio::test]
    async fn test_add_assigns_distinct_ids() {
        let temp = TempDir::new().unwrap();
        let mut manager = manager(&temp).await;

        let a = manager.add(SongDraft::new("A", "c", "l"), None, None).await;
        let b = manager.add(SongDraft::new("B", "c", "l"), None, None).await;
        let c = manager.add(SongDraft::new("C", "c", "l"), None, None).await;

        assert_ne!(a.id, b.id);
        assert_ne!(b.id, c.id);
        assert!(a.id.parse::<i64>().unwrap() < b.id.parse::<i64>().unwrap());
    }

    #[tokio::test]
    async fn test_search_matches_all_fields() {
        let temp = TempDir::new().unwrap();
        let mut manager = manager(&temp).await;

        manager
            .add(
                SongDraft::new("Amazing Grace", "John Newton", "how sweet the sound")
                    .with_tags("hymn, classic"),
                None,
                None,
            )
            .await;
        manager
            .add(
                SongDraft::new("It Is Well", "Horatio Spafford", "peace like a river")
                    .with_tags("peace"),
                None,
                None,
            )
            .await;

        // Name, composer, lyrics and tag all match case-insensitively
        assert_eq!(manager.search("GRACE", SortOrder::Ascending, &[]).len(), 1);
        assert_eq!(manager.search("newton", SortOrder::Ascending, &[]).len(), 1);
        assert_eq!(manager.search("river", SortOrder::Ascending, &[]).len(), 1);
        assert_eq!(manager.search("hymn", SortOrder::Ascending, &[]).len(), 1);
        assert_eq!(manager.search("", SortOrder::Ascending, &[]).len(), 2);
        assert!(manager.search("nothing", SortOrder::Ascending, &[]).is_empty());
    }

    #[tokio::test]
    async fn test_search_sort_is_stable() {
        let temp = TempDir::new().unwrap();
        let mut manager = manager(&temp).await;

        let first = manager.add(SongDraft::new("Same Name", "a", "l"), None, None).await;
        let middle = manager.add(SongDraft::new("Between", "b", "l"), None, None).await;
        let second = manager.add(SongDraft::new("Same Name", "c", "l"), None, None).await;

        let ascending = manager.search("", SortOrder::Ascending, &[]);
        assert_eq!(
            ascending.iter().map(|s| s.id.as_str()).collect::<Vec<_>>(),
            vec![middle.id.as_str(), first.id.as_str(), second.id.as_str()]
        );

        // Descending reverses name order but keeps tie order
        let descending = manager.search("", SortOrder::Descending, &[]);
        assert_eq!(
            descending.iter().map(|s| s.id.as_str()).collect::<Vec<_>>(),
            vec![first.id.as_str(), second.id.as_str(), middle.id.as_str()]
        );
    }

    #[tokio::test]
    async fn test_search_tag_filters_and_query_combine() {
        let temp = TempDir::new().unwrap();
        let mut manager = manager(&temp).await;

        manager
            .add(
                SongDraft::new("Amazing Grace", "John Newton", "l").with_tags("hymn, worship"),
                None,
                None,
            )
            .await;
        manager
            .add(
                SongDraft::new("How Great Thou Art", "Carl Boberg", "l")
                    .with_tags("hymn, traditional"),
                None,
                None,
            )
            .await;

        let worship = manager.search("", SortOrder::Ascending, &["Worship".to_string()]);
        assert_eq!(worship.len(), 1);
        assert_eq!(worship[0].name, "Amazing Grace");

        // AND of query and tag filter
        let none = manager.search("great", SortOrder::Ascending, &["worship".to_string()]);
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_list_tags_deduplicates_and_sorts() {
        let temp = TempDir::new().unwrap();
        let mut manager = manager(&temp).await;

        manager
            .add(SongDraft::new("A", "c", "l").with_tags("hymn, classic"), None, None)
            .await;
        manager
            .add(SongDraft::new("B", "c", "l").with_tags("worship, hymn"), None, None)
            .await;

        assert_eq!(manager.list_tags(), vec!["classic", "hymn", "worship"]);
    }

    #[tokio::test]
    async fn test_file_payload_wins_over_url() {
        let temp = TempDir::new().unwrap();
        let mut manager = manager(&temp).await;

        let song = manager
            .add(
                SongDraft::new("A", "c", "l"),
                Some("payload".to_string()),
                Some("https://example.com/song.mp3".to_string()),
            )
            .await;

        assert_eq!(
            manager.audio(&song.id),
            Some(&AudioReference::File("payload".to_string()))
        );
    }
}
