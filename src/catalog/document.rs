//! The serialized catalog unit exchanged with every backend.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::audio::AudioReference;
use super::song::Song;

/// The complete persisted catalog: song list plus audio map.
///
/// Both the remote store and the local fallback read and write this exact
/// shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogDocument {
    /// All songs, in insertion order
    #[serde(default)]
    pub songs: Vec<Song>,

    /// Audio references keyed by song id
    #[serde(default)]
    pub audio_data: HashMap<String, AudioReference>,
}

impl CatalogDocument {
    /// Create an empty document
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the document holds no songs and no audio
    pub fn is_empty(&self) -> bool {
        self.songs.is_empty() && self.audio_data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_wire_shape() {
        let mut document = CatalogDocument::new();
        document.songs.push(Song {
            id: "1".to_string(),
            name: "Amazing Grace".to_string(),
            composer: "John Newton".to_string(),
            lyrics: "Amazing grace".to_string(),
            tags: vec!["hymn".to_string()],
            demo_text: "Demo song".to_string(),
        });
        document.audio_data.insert(
            "1".to_string(),
            AudioReference::Url("https://example.com/song.mp3".to_string()),
        );

        let json = serde_json::to_value(&document).unwrap();
        assert!(json["songs"].is_array());
        assert_eq!(json["audioData"]["1"]["type"], "url");

        let parsed: CatalogDocument = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, document);
    }

    #[test]
    fn test_missing_keys_read_as_empty() {
        let parsed: CatalogDocument = serde_json::from_str("{}").unwrap();
        assert!(parsed.is_empty());
    }
}
