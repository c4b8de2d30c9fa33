//! Request-boundary errors.
//!
//! Every failure of the transcript endpoint ends up here and is turned into a
//! JSON `{"error": "..."}` body with a status code per failure kind.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::transcript::TranscriptError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Please provide a YouTube URL")]
    MissingUrl,

    #[error("Invalid YouTube URL")]
    InvalidUrl,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Transcript(#[from] TranscriptError),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::MissingUrl | ApiError::InvalidUrl | ApiError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Transcript(e) => match e {
                TranscriptError::TranscriptsDisabled
                | TranscriptError::NoTranscriptFound { .. }
                | TranscriptError::VideoUnavailable(_) => StatusCode::NOT_FOUND,
                TranscriptError::RequestBlocked
                | TranscriptError::Http(_)
                | TranscriptError::Unparsable(_) => StatusCode::BAD_GATEWAY,
            },
        }
    }

    /// Message shown to the user. Upstream details stay in the logs.
    pub fn user_message(&self) -> String {
        let ApiError::Transcript(e) = self else {
            return self.to_string();
        };

        match e {
            TranscriptError::TranscriptsDisabled => {
                "Transcripts are disabled for this video".to_string()
            }
            TranscriptError::NoTranscriptFound { .. } => {
                "No transcript is available for this video".to_string()
            }
            TranscriptError::VideoUnavailable(reason) => {
                format!("This video is unavailable: {reason}")
            }
            TranscriptError::RequestBlocked => {
                concat!(
                    "YouTube is blocking requests from this server; ",
                    "configure a proxy or try again later"
                )
                .to_string()
            }
            TranscriptError::Http(err) if err.is_timeout() => {
                "Timed out while contacting YouTube".to_string()
            }
            TranscriptError::Http(_) => {
                "Could not reach YouTube (network or proxy failure)".to_string()
            }
            TranscriptError::Unparsable(_) => {
                "YouTube returned a response that could not be read".to_string()
            }
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: self.user_message(),
        };

        (status, Json(body)).into_response()
    }
}
