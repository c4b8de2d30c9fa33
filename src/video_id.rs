//! YouTube video ID extraction.
//!
//! Accepted inputs, checked in this order (first match wins):
//! - `youtube.com/watch?v=ID`, `youtu.be/ID`, `youtube.com/embed/ID`
//! - any `youtube.com/...` URL carrying `v=ID` in its query string
//! - a bare 11-character ID

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

const ID_LEN: usize = 11;

static URL_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?:youtube\.com/watch\?v=|youtu\.be/|youtube\.com/embed/)([A-Za-z0-9_-]{11})",
        r"youtube\.com/.*[?&]v=([A-Za-z0-9_-]{11})",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid regex"))
    .collect()
});

/// A validated 11-character YouTube video identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct VideoId(String);

impl VideoId {
    /// Accepts `raw` only if it is exactly an identifier, nothing around it.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.len() == ID_LEN && raw.chars().all(is_id_char) {
            Some(Self(raw.to_string()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn is_id_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

/// Extract the video ID from a user-supplied URL or bare ID.
///
/// Returns `None` for anything that is not a recognisable YouTube reference.
pub fn extract_video_id(raw: &str) -> Option<VideoId> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    URL_PATTERNS
        .iter()
        .find_map(|re| re.captures(raw))
        .and_then(|caps| caps.get(1))
        .map(|m| VideoId(m.as_str().to_string()))
        .or_else(|| VideoId::parse(raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: &str = "dQw4w9WgXcQ";

    fn id_of(url: &str) -> Option<String> {
        extract_video_id(url).map(|v| v.to_string())
    }

    #[test]
    fn test_all_supported_shapes_agree() {
        let urls = [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://youtube.com/watch?v=dQw4w9WgXcQ",
            "http://m.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://youtu.be/dQw4w9WgXcQ",
            "https://youtu.be/dQw4w9WgXcQ?si=abcdef",
            "https://www.youtube.com/embed/dQw4w9WgXcQ",
            "https://www.youtube.com/watch?feature=share&v=dQw4w9WgXcQ",
            "youtube.com/watch?v=dQw4w9WgXcQ",
            "dQw4w9WgXcQ",
            "  dQw4w9WgXcQ \n",
        ];

        for url in urls {
            assert_eq!(id_of(url).as_deref(), Some(ID), "url: {url}");
        }
    }

    #[test]
    fn test_extra_query_parameters_are_ignored() {
        assert_eq!(
            id_of("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=43s").as_deref(),
            Some(ID)
        );
        let with_playlist = "https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=42s&list=PLrAXtmRdnEQy";
        assert_eq!(id_of(with_playlist).as_deref(), Some(ID));
        assert_eq!(
            id_of("https://www.youtube.com/playlist?list=PLrAXtmRdnEQy&v=dQw4w9WgXcQ").as_deref(),
            Some(ID)
        );
    }

    #[test]
    fn test_unrecognised_input_is_none() {
        for input in [
            "",
            "   ",
            "not a url",
            "https://example.com/invalid",
            "https://youtube.com/watch?invalid=123",
            "https://youtube.com/watch?v=test123",
            "https://vimeo.com/watch?v=dQw4w9WgXcQ",
            "dQw4w9WgXc",
            "dQw4w9WgXcQQ",
            "dQw4w9Wg!cQ",
        ] {
            assert_eq!(id_of(input), None, "input: {input:?}");
        }
    }

    #[test]
    fn test_direct_form_wins_over_query_form() {
        // The watch?v= form is checked before the generic query scan.
        assert_eq!(
            id_of("https://www.youtube.com/watch?v=aircAruvnKk&v=dQw4w9WgXcQ").as_deref(),
            Some("aircAruvnKk")
        );
        assert_eq!(
            id_of("https://youtu.be/aircAruvnKk?v=dQw4w9WgXcQ").as_deref(),
            Some("aircAruvnKk")
        );
    }

    #[test]
    fn test_eleven_identifier_chars_are_taken_as_an_id() {
        // Indistinguishable from a real ID, so it is accepted and left to the fetcher.
        assert_eq!(id_of("invalid-url").as_deref(), Some("invalid-url"));
    }

    #[test]
    fn test_parse_requires_exact_id() {
        assert!(VideoId::parse(ID).is_some());
        assert!(VideoId::parse("https://youtu.be/dQw4w9WgXcQ").is_none());
        assert!(VideoId::parse("abc").is_none());
    }
}
