//! Audio references and video-link classification.
//!
//! Audio lives in a map keyed by song id, separate from the song records,
//! so a catalog without audio stays small on the wire.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Where a song's audio lives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum AudioReference {
    /// Uploaded payload data (opaque string)
    File(String),

    /// Generic remote link
    Url(String),

    /// Video-sharing link
    YouTube(String),
}

impl AudioReference {
    /// Classify a link: video-sharing URLs become [`AudioReference::YouTube`],
    /// everything else a generic [`AudioReference::Url`].
    pub fn from_url(url: impl Into<String>) -> Self {
        let url = url.into();
        if is_youtube_url(&url) {
            AudioReference::YouTube(url)
        } else {
            AudioReference::Url(url)
        }
    }

    /// Wrap an uploaded file payload
    pub fn from_file(data: impl Into<String>) -> Self {
        AudioReference::File(data.into())
    }

    /// The raw payload or link
    pub fn data(&self) -> &str {
        match self {
            AudioReference::File(data)
            | AudioReference::Url(data)
            | AudioReference::YouTube(data) => data,
        }
    }

    /// The wire tag for this reference kind
    pub fn kind(&self) -> &'static str {
        match self {
            AudioReference::File(_) => "file",
            AudioReference::Url(_) => "url",
            AudioReference::YouTube(_) => "youtube",
        }
    }
}

fn youtube_host_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(https?://)?(www\.)?(youtube\.com|youtu\.be)/.+$").expect("valid pattern")
    })
}

fn youtube_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        // Video ids are exactly 11 characters; the trailing group stops a
        // longer token from matching on its first 11.
        Regex::new(r"(?:youtu\.be/|/v/|/embed/|[?&]v=)([A-Za-z0-9_-]{11})([^A-Za-z0-9_-]|$)")
            .expect("valid pattern")
    })
}

/// Whether a URL points at a known video-sharing host, with or without
/// scheme and `www.` prefix.
pub fn is_youtube_url(url: &str) -> bool {
    youtube_host_pattern().is_match(url)
}

/// Extract the 11-character video id from the common URL shapes
/// (`watch?v=`, `youtu.be/`, `/embed/`, `/v/`).
pub fn youtube_video_id(url: &str) -> Option<String> {
    youtube_id_pattern()
        .captures(url)
        .map(|captures| captures[1].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_youtube_url_classification() {
        assert!(is_youtube_url("https://youtu.be/dQw4w9WgXcQ"));
        assert!(is_youtube_url("https://www.youtube.com/watch?v=dQw4w9WgXcQ"));
        assert!(is_youtube_url("youtube.com/watch?v=dQw4w9WgXcQ"));
        assert!(is_youtube_url("www.youtube.com/embed/dQw4w9WgXcQ"));

        assert!(!is_youtube_url("https://example.com/song.mp3"));
        assert!(!is_youtube_url("https://notyoutube.com/watch?v=dQw4w9WgXcQ"));
    }

    #[test]
    fn test_from_url_picks_kind() {
        let video = AudioReference::from_url("https://youtu.be/dQw4w9WgXcQ");
        assert_eq!(video.kind(), "youtube");

        let generic = AudioReference::from_url("https://example.com/song.mp3");
        assert_eq!(generic.kind(), "url");
        assert_eq!(generic.data(), "https://example.com/song.mp3");
    }

    #[test]
    fn test_video_id_extraction() {
        let expected = Some("dQw4w9WgXcQ".to_string());

        assert_eq!(youtube_video_id("https://youtu.be/dQw4w9WgXcQ"), expected);
        assert_eq!(
            youtube_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ"),
            expected
        );
        assert_eq!(
            youtube_video_id("https://www.youtube.com/embed/dQw4w9WgXcQ"),
            expected
        );
        assert_eq!(
            youtube_video_id("https://www.youtube.com/watch?list=abc&v=dQw4w9WgXcQ&t=1"),
            expected
        );

        assert_eq!(youtube_video_id("https://example.com/song.mp3"), None);
        assert_eq!(youtube_video_id("https://youtu.be/short"), None);
    }

    #[test]
    fn test_audio_reference_wire_shape() {
        let reference = AudioReference::YouTube("https://youtu.be/dQw4w9WgXcQ".to_string());
        let json = serde_json::to_value(&reference).unwrap();

        assert_eq!(json["type"], "youtube");
        assert_eq!(json["data"], "https://youtu.be/dQw4w9WgXcQ");

        let parsed: AudioReference =
            serde_json::from_str(r#"{"type":"file","data":"payload"}"#).unwrap();
        assert_eq!(parsed, AudioReference::File("payload".to_string()));
    }
}
