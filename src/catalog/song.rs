//! Song records and the input shapes accepted by the catalog.
//!
//! Tags may arrive either as an explicit list or as a single
//! comma-delimited string; both forms are normalized before storage.

use serde::{Deserialize, Serialize};

/// Placeholder demo text used when a song is created without one
pub const DEFAULT_DEMO_TEXT: &str = "Demo song";

/// A song record as persisted in the catalog document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Song {
    /// Opaque identifier, assigned at creation and immutable afterwards
    pub id: String,

    /// Song title
    pub name: String,

    /// Composer or author
    pub composer: String,

    /// Full lyrics (multi-line)
    pub lyrics: String,

    /// Free-form tags, matched case-insensitively
    #[serde(default)]
    pub tags: Vec<String>,

    /// Short demo text shown alongside the song
    #[serde(default = "default_demo_text")]
    pub demo_text: String,
}

fn default_demo_text() -> String {
    DEFAULT_DEMO_TEXT.to_string()
}

/// Tags as supplied by callers: an explicit list or a single
/// comma-delimited string.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagInput {
    /// Already-split tag list
    List(Vec<String>),

    /// Comma-delimited string, e.g. `"hymn, classic"`
    Delimited(String),
}

impl TagInput {
    /// Normalize into the stored form: split on commas (string form),
    /// trim whitespace, drop empty entries.
    pub fn normalize(&self) -> Vec<String> {
        match self {
            TagInput::List(tags) => tags
                .iter()
                .map(|tag| tag.trim().to_string())
                .filter(|tag| !tag.is_empty())
                .collect(),
            TagInput::Delimited(raw) => raw
                .split(',')
                .map(|tag| tag.trim().to_string())
                .filter(|tag| !tag.is_empty())
                .collect(),
        }
    }
}

impl Default for TagInput {
    fn default() -> Self {
        TagInput::List(Vec::new())
    }
}

impl From<Vec<String>> for TagInput {
    fn from(tags: Vec<String>) -> Self {
        TagInput::List(tags)
    }
}

impl From<&str> for TagInput {
    fn from(raw: &str) -> Self {
        TagInput::Delimited(raw.to_string())
    }
}

/// Input for creating a new song
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SongDraft {
    pub name: String,

    pub composer: String,

    pub lyrics: String,

    #[serde(default)]
    pub tags: TagInput,

    /// Falls back to [`DEFAULT_DEMO_TEXT`] when omitted
    #[serde(default)]
    pub demo_text: Option<String>,
}

impl SongDraft {
    /// Create a draft with the required fields
    pub fn new(
        name: impl Into<String>,
        composer: impl Into<String>,
        lyrics: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            composer: composer.into(),
            lyrics: lyrics.into(),
            tags: TagInput::default(),
            demo_text: None,
        }
    }

    /// Set the tags
    pub fn with_tags(mut self, tags: impl Into<TagInput>) -> Self {
        self.tags = tags.into();
        self
    }

    /// Set the demo text
    pub fn with_demo_text(mut self, demo_text: impl Into<String>) -> Self {
        self.demo_text = Some(demo_text.into());
        self
    }
}

/// Partial update for an existing song.
///
/// A supplied `id` is ignored: identifiers are immutable after creation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SongPatch {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub composer: Option<String>,

    #[serde(default)]
    pub lyrics: Option<String>,

    #[serde(default)]
    pub tags: Option<TagInput>,

    #[serde(default)]
    pub demo_text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_delimited_tags() {
        let tags = TagInput::Delimited("a, b ,c".to_string());
        assert_eq!(tags.normalize(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_normalize_drops_empty_entries() {
        let tags = TagInput::Delimited("hymn, , ,classic,".to_string());
        assert_eq!(tags.normalize(), vec!["hymn", "classic"]);

        let tags = TagInput::List(vec!["  worship ".to_string(), "".to_string()]);
        assert_eq!(tags.normalize(), vec!["worship"]);
    }

    #[test]
    fn test_tag_input_deserializes_both_forms() {
        let from_list: TagInput = serde_json::from_str(r#"["hymn","classic"]"#).unwrap();
        assert_eq!(from_list.normalize(), vec!["hymn", "classic"]);

        let from_string: TagInput = serde_json::from_str(r#""hymn, classic""#).unwrap();
        assert_eq!(from_string.normalize(), vec!["hymn", "classic"]);
    }

    #[test]
    fn test_song_wire_shape() {
        let song = Song {
            id: "1".to_string(),
            name: "Amazing Grace".to_string(),
            composer: "John Newton".to_string(),
            lyrics: "Amazing grace, how sweet the sound".to_string(),
            tags: vec!["hymn".to_string()],
            demo_text: DEFAULT_DEMO_TEXT.to_string(),
        };

        let json = serde_json::to_value(&song).unwrap();
        assert_eq!(json["demoText"], "Demo song");
        assert_eq!(json["tags"][0], "hymn");

        let parsed: Song = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, song);
    }

    #[test]
    fn test_demo_text_defaults_when_missing() {
        let parsed: Song = serde_json::from_str(
            r#"{"id":"1","name":"n","composer":"c","lyrics":"l","tags":[]}"#,
        )
        .unwrap();
        assert_eq!(parsed.demo_text, DEFAULT_DEMO_TEXT);
    }
}
