use async_trait::async_trait;
use thiserror::Error;

pub mod youtube;

pub use youtube::YoutubeTranscriptFetcher;

use crate::models::{Transcript, TranscriptSegment};
use crate::video_id::VideoId;

/// Failure kinds of a transcript fetch.
#[derive(Debug, Error)]
pub enum TranscriptError {
    #[error("transcripts are disabled for this video")]
    TranscriptsDisabled,

    #[error("no transcript found (requested languages: {requested:?})")]
    NoTranscriptFound { requested: Vec<String> },

    #[error("video is unavailable: {0}")]
    VideoUnavailable(String),

    #[error("YouTube is blocking requests from this IP")]
    RequestBlocked,

    #[error("request to YouTube failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected response from YouTube: {0}")]
    Unparsable(String),
}

impl TranscriptError {
    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            TranscriptError::TranscriptsDisabled => "transcripts_disabled",
            TranscriptError::NoTranscriptFound { .. } => "no_transcript_found",
            TranscriptError::VideoUnavailable(_) => "video_unavailable",
            TranscriptError::RequestBlocked => "request_blocked",
            TranscriptError::Http(_) => "http",
            TranscriptError::Unparsable(_) => "unparsable",
        }
    }
}

/// Source of transcript segments.
///
/// Proxy settings belong to the implementation and are fixed when it is built.
/// `languages` is a preference order; implementations fall back to any
/// available transcript when none of them exist.
#[async_trait]
pub trait TranscriptFetcher: Send + Sync {
    async fn fetch(
        &self,
        video_id: &VideoId,
        languages: &[String],
    ) -> Result<Vec<TranscriptSegment>, TranscriptError>;
}

/// Fetch segments for `video_id` and assemble the display text.
pub async fn fetch_transcript(
    fetcher: &dyn TranscriptFetcher,
    video_id: VideoId,
    languages: &[String],
) -> Result<Transcript, TranscriptError> {
    tracing::debug!(%video_id, ?languages, "Fetching transcript");

    let segments = fetcher.fetch(&video_id, languages).await.map_err(|e| {
        tracing::warn!(%video_id, kind = e.kind(), "Transcript fetch failed: {e}");
        e
    })?;

    tracing::info!(%video_id, segments = segments.len(), "Transcript fetched");
    Ok(Transcript::from_segments(video_id, segments))
}
