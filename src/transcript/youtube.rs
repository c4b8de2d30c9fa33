use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::{Captures, Regex};
use reqwest::header::{ACCEPT_LANGUAGE, COOKIE};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;

use super::{TranscriptError, TranscriptFetcher};
use crate::config::ProxyConfig;
use crate::models::TranscriptSegment;
use crate::video_id::VideoId;

const YOUTUBE_BASE_URL: &str = "https://www.youtube.com";
const CONSENT_FORM: &str = "action=\"https://consent.youtube.com/s\"";
const USER_AGENT: &str = concat!("tubescript/", env!("CARGO_PKG_VERSION"));

// Innertube client the player endpoint answers with plain caption URLs.
const CLIENT_NAME: &str = "ANDROID";
const CLIENT_VERSION: &str = "20.10.38";

static API_KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""INNERTUBE_API_KEY":\s*"([a-zA-Z0-9_-]+)""#).expect("valid regex")
});
static CONSENT_VALUE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"name="v" value="(.*?)""#).expect("valid regex"));
static TEXT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<text\b([^>]*)>(.*?)</text>").expect("valid regex"));
static ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(\w+)="([^"]*)""#).expect("valid regex"));
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));
static ENTITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#[xX][0-9a-fA-F]+|#[0-9]+|[a-zA-Z]+);").expect("valid regex")
});

/// Fetches captions straight from YouTube's watch page and innertube API.
pub struct YoutubeTranscriptFetcher {
    client: reqwest::Client,
    /// Origin serving `/watch` and `/youtubei/v1/player`, without trailing slash
    base_url: String,
}

impl YoutubeTranscriptFetcher {
    pub fn new(proxy: Option<&ProxyConfig>, timeout: Duration) -> Result<Self, TranscriptError> {
        Self::with_base_url(proxy, timeout, YOUTUBE_BASE_URL)
    }

    pub fn with_base_url(
        proxy: Option<&ProxyConfig>,
        timeout: Duration,
        base_url: impl Into<String>,
    ) -> Result<Self, TranscriptError> {
        let mut builder = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT);

        if let Some(proxy) = proxy {
            tracing::info!(
                endpoint = %proxy.endpoint,
                countries = ?proxy.countries,
                "Routing YouTube requests through proxy"
            );
            let proxy = reqwest::Proxy::all(proxy.proxy_url())?
                .basic_auth(&proxy.proxy_username(), &proxy.password);
            builder = builder.proxy(proxy);
        } else {
            // Only WEBSHARE_* decides proxying; ignore HTTP(S)_PROXY from the environment.
            builder = builder.no_proxy();
        }

        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self {
            client: builder.build()?,
            base_url,
        })
    }

    async fn watch_page(
        &self,
        video_id: &VideoId,
        consent: Option<&str>,
    ) -> Result<String, TranscriptError> {
        let mut request = self
            .client
            .get(format!("{}/watch", self.base_url))
            .query(&[("v", video_id.as_str())])
            .header(ACCEPT_LANGUAGE, "en-US");
        if let Some(value) = consent {
            request = request.header(COOKIE, format!("CONSENT=YES+{value}"));
        }

        let response = check_status(request.send().await?)?;
        Ok(response.text().await?)
    }

    /// Watch page HTML, accepting the EU cookie consent form once if shown.
    async fn watch_page_with_consent(
        &self,
        video_id: &VideoId,
    ) -> Result<String, TranscriptError> {
        let html = self.watch_page(video_id, None).await?;
        if !html.contains(CONSENT_FORM) {
            return Ok(html);
        }

        tracing::debug!(%video_id, "Accepting YouTube cookie consent");
        let value = CONSENT_VALUE_RE
            .captures(&html)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| {
                TranscriptError::Unparsable("consent form without value".to_string())
            })?;

        let html = self.watch_page(video_id, Some(&value)).await?;
        if html.contains(CONSENT_FORM) {
            return Err(TranscriptError::Unparsable(
                "consent cookie was not accepted".to_string(),
            ));
        }
        Ok(html)
    }

    async fn player(
        &self,
        video_id: &VideoId,
        api_key: &str,
    ) -> Result<PlayerResponse, TranscriptError> {
        let body = json!({
            "context": {
                "client": {
                    "clientName": CLIENT_NAME,
                    "clientVersion": CLIENT_VERSION,
                }
            },
            "videoId": video_id.as_str(),
        });

        let response = self
            .client
            .post(format!("{}/youtubei/v1/player", self.base_url))
            .query(&[("key", api_key)])
            .json(&body)
            .send()
            .await?;
        let response = check_status(response)?;

        response
            .json::<PlayerResponse>()
            .await
            .map_err(|e| TranscriptError::Unparsable(format!("player response: {e}")))
    }

    async fn track_segments(
        &self,
        track: &CaptionTrack,
    ) -> Result<Vec<TranscriptSegment>, TranscriptError> {
        let url = track.base_url.replace("&fmt=srv3", "");
        let response = check_status(self.client.get(url).send().await?)?;
        let xml = response.text().await?;

        if xml.trim().is_empty() {
            return Err(TranscriptError::Unparsable("empty caption track".to_string()));
        }
        Ok(parse_transcript_xml(&xml))
    }
}

#[async_trait]
impl TranscriptFetcher for YoutubeTranscriptFetcher {
    async fn fetch(
        &self,
        video_id: &VideoId,
        languages: &[String],
    ) -> Result<Vec<TranscriptSegment>, TranscriptError> {
        let html = self.watch_page_with_consent(video_id).await?;
        let api_key = innertube_api_key(&html)?;

        let player = self.player(video_id, &api_key).await?;
        let tracks = caption_tracks(player)?;

        let track = select_track(&tracks, languages).ok_or_else(|| {
            TranscriptError::NoTranscriptFound {
                requested: languages.to_vec(),
            }
        })?;
        tracing::debug!(
            %video_id,
            language = %track.language_code,
            generated = track.is_generated(),
            "Selected caption track"
        );

        self.track_segments(track).await
    }
}

fn check_status(response: reqwest::Response) -> Result<reqwest::Response, TranscriptError> {
    if response.status() == StatusCode::TOO_MANY_REQUESTS {
        return Err(TranscriptError::RequestBlocked);
    }
    Ok(response.error_for_status()?)
}

fn innertube_api_key(html: &str) -> Result<String, TranscriptError> {
    if html.contains("class=\"g-recaptcha\"") {
        return Err(TranscriptError::RequestBlocked);
    }
    API_KEY_RE
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| TranscriptError::Unparsable("INNERTUBE_API_KEY not found".to_string()))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlayerResponse {
    #[serde(default)]
    playability_status: Option<PlayabilityStatus>,
    #[serde(default)]
    captions: Option<Captions>,
}

#[derive(Debug, Deserialize)]
struct PlayabilityStatus {
    #[serde(default)]
    status: String,
    #[serde(default)]
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Captions {
    #[serde(rename = "playerCaptionsTracklistRenderer", default)]
    tracklist: Option<Tracklist>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Tracklist {
    #[serde(default)]
    caption_tracks: Option<Vec<CaptionTrack>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CaptionTrack {
    base_url: String,
    language_code: String,
    /// `"asr"` for auto-generated tracks
    #[serde(default)]
    kind: Option<String>,
}

impl CaptionTrack {
    fn is_generated(&self) -> bool {
        self.kind.as_deref() == Some("asr")
    }
}

fn caption_tracks(player: PlayerResponse) -> Result<Vec<CaptionTrack>, TranscriptError> {
    if let Some(playability) = player.playability_status {
        let reason = playability.reason.unwrap_or_default();
        match playability.status.as_str() {
            "OK" | "" => {}
            "LOGIN_REQUIRED" if reason.contains("not a bot") => {
                return Err(TranscriptError::RequestBlocked);
            }
            other => {
                let reason = if reason.is_empty() {
                    format!("playability status {other}")
                } else {
                    reason
                };
                return Err(TranscriptError::VideoUnavailable(reason));
            }
        }
    }

    player
        .captions
        .and_then(|c| c.tracklist)
        .and_then(|t| t.caption_tracks)
        .ok_or(TranscriptError::TranscriptsDisabled)
}

/// Requested languages in order, manual tracks before generated ones; then
/// any manual track; then whatever is listed first.
fn select_track<'a>(tracks: &'a [CaptionTrack], languages: &[String]) -> Option<&'a CaptionTrack> {
    let find = |lang: &str, generated: bool| {
        tracks
            .iter()
            .find(|t| t.language_code == lang && t.is_generated() == generated)
    };

    languages
        .iter()
        .find_map(|lang| find(lang.as_str(), false).or_else(|| find(lang.as_str(), true)))
        .or_else(|| tracks.iter().find(|t| !t.is_generated()))
        .or_else(|| tracks.first())
}

fn parse_transcript_xml(xml: &str) -> Vec<TranscriptSegment> {
    TEXT_RE
        .captures_iter(xml)
        .filter_map(|caps| {
            let text = clean_text(&caps[2]);
            if text.is_empty() {
                return None;
            }

            let mut start = 0.0;
            let mut duration = 0.0;
            for attr in ATTR_RE.captures_iter(&caps[1]) {
                let value = attr[2].parse::<f64>().unwrap_or(0.0);
                match &attr[1] {
                    "start" => start = value,
                    "dur" => duration = value,
                    _ => {}
                }
            }

            Some(TranscriptSegment {
                start,
                duration,
                text,
            })
        })
        .collect()
}

/// Caption text is XML-escaped HTML: decode twice, then drop markup.
fn clean_text(raw: &str) -> String {
    let html = unescape_entities(&unescape_entities(raw));
    TAG_RE.replace_all(&html, "").trim().to_string()
}

fn unescape_entities(s: &str) -> String {
    ENTITY_RE
        .replace_all(s, |caps: &Captures| {
            let name = &caps[1];
            let decoded = match name {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some(' '),
                _ => name
                    .strip_prefix("#x")
                    .or_else(|| name.strip_prefix("#X"))
                    .map(|hex| u32::from_str_radix(hex, 16))
                    .or_else(|| name.strip_prefix('#').map(str::parse::<u32>))
                    .and_then(Result::ok)
                    .and_then(char::from_u32),
            };
            decoded.map_or_else(|| caps[0].to_string(), String::from)
        })
        .into_owned()
}
