use serde::{Deserialize, Serialize};

use crate::config::ProxyStatus;
use crate::video_id::VideoId;

/// One timed line of a transcript, in upstream order.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct TranscriptSegment {
    pub start: f64,
    pub duration: f64,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transcript {
    pub video_id: VideoId,
    pub segments: Vec<TranscriptSegment>,
    pub full_text: String,
}

impl Transcript {
    pub fn from_segments(video_id: VideoId, segments: Vec<TranscriptSegment>) -> Self {
        let full_text = segments
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        Self {
            video_id,
            segments,
            full_text,
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct TranscriptRequest {
    #[serde(default)]
    pub url: String,
    /// Overrides the configured language preference for this request
    #[serde(default)]
    pub languages: Option<Vec<String>>,
}

#[derive(Serialize, Debug)]
pub struct TranscriptResponse {
    pub success: bool,
    pub video_id: VideoId,
    pub transcript: Vec<TranscriptSegment>,
    pub full_text: String,
    #[serde(flatten)]
    pub proxy: ProxyStatus,
}

impl TranscriptResponse {
    pub fn new(transcript: Transcript, proxy: ProxyStatus) -> Self {
        Self {
            success: true,
            video_id: transcript.video_id,
            transcript: transcript.segments,
            full_text: transcript.full_text,
            proxy,
        }
    }
}

#[derive(Serialize, Debug)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}
