use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Json, State},
    response::Html,
    routing::{get, post},
    Router,
};

use crate::{
    config::{AppConfig, ProxyStatus},
    error::{ApiError, ApiResult},
    models::{HealthResponse, TranscriptRequest, TranscriptResponse},
    transcript::{fetch_transcript, TranscriptFetcher},
    video_id::extract_video_id,
};

/// Read-only state shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub fetcher: Arc<dyn TranscriptFetcher>,
}

impl AppState {
    pub fn new(config: AppConfig, fetcher: Arc<dyn TranscriptFetcher>) -> Self {
        Self {
            config: Arc::new(config),
            fetcher,
        }
    }
}

pub fn create_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/get_transcript", post(get_transcript))
        .route("/proxy_status", get(proxy_status))
        .route("/health", get(health))
        .with_state(state)
}

async fn get_transcript(
    State(state): State<AppState>,
    payload: Result<Json<TranscriptRequest>, JsonRejection>,
) -> ApiResult<Json<TranscriptResponse>> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let url = request.url.trim();
    if url.is_empty() {
        return Err(ApiError::MissingUrl);
    }

    let video_id = extract_video_id(url).ok_or_else(|| {
        tracing::debug!(url, "Rejected URL without a video ID");
        ApiError::InvalidUrl
    })?;

    let languages = request
        .languages
        .filter(|langs| !langs.is_empty())
        .unwrap_or_else(|| state.config.languages.clone());

    let transcript = fetch_transcript(state.fetcher.as_ref(), video_id, &languages).await?;
    let proxy = ProxyStatus::from(state.config.proxy.as_ref());

    Ok(Json(TranscriptResponse::new(transcript, proxy)))
}

async fn proxy_status(State(state): State<AppState>) -> Json<ProxyStatus> {
    Json(ProxyStatus::from(state.config.proxy.as_ref()))
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

// Single page: the script drives Idle -> Submitted -> Success/Failed -> Idle.
async fn index() -> Html<&'static str> {
    Html(r#"
    <!DOCTYPE html>
    <html>
      <head>
        <meta charset="utf-8" />
        <meta name="viewport" content="width=device-width, initial-scale=1" />
        <title>tubescript</title>
        <link href="https://cdn.jsdelivr.net/npm/tailwindcss@3.2.7/dist/tailwind.min.css" rel="stylesheet">
      </head>
      <body class="p-4 max-w-3xl mx-auto">
        <h1 class="text-2xl font-bold mb-4">YouTube Transcript</h1>
        <form id="transcriptForm" class="space-y-4">
          <div>
            <label class="block font-medium" for="url">YouTube URL or video ID</label>
            <input type="text" id="url" name="url" class="border rounded w-full p-1"
                   placeholder="https://www.youtube.com/watch?v=..." required />
          </div>
          <button id="submitBtn" type="submit" class="bg-blue-500 text-white px-4 py-2 rounded">Get transcript</button>
          <span id="proxyStatus" class="text-sm text-gray-500"></span>
        </form>
        <hr class="my-4"/>

        <p id="status" class="mb-2"></p>
        <p id="error" class="mb-2 text-red-600"></p>
        <div id="resultBox" class="hidden">
          <div class="space-x-2 mb-2">
            <button id="copyBtn" type="button" class="bg-green-500 text-white px-4 py-2 rounded">Copy</button>
            <button id="clearBtn" type="button" class="bg-gray-500 text-white px-4 py-2 rounded">Clear</button>
          </div>
          <textarea id="result" class="border rounded w-full p-1 h-96" readonly></textarea>
        </div>

        <script>
          const form = document.getElementById('transcriptForm');
          const submitBtn = document.getElementById('submitBtn');
          const statusEl = document.getElementById('status');
          const errorEl = document.getElementById('error');
          const resultBox = document.getElementById('resultBox');
          const resultEl = document.getElementById('result');

          function setState(state, detail) {
            submitBtn.disabled = state === 'submitted';
            statusEl.textContent = state === 'submitted' ? 'Fetching transcript...' : '';
            errorEl.textContent = state === 'failed' ? detail : '';
            resultEl.value = state === 'success' ? detail : '';
            resultBox.classList.toggle('hidden', state !== 'success');
          }

          form.addEventListener('submit', async (e) => {
            e.preventDefault();
            setState('submitted');
            try {
              const res = await fetch('/get_transcript', {
                method: 'POST',
                headers: {'Content-Type': 'application/json'},
                body: JSON.stringify({ url: form.url.value })
              });
              const data = await res.json();
              if (res.ok && data.success) {
                setState('success', data.full_text);
              } else {
                setState('failed', data.error || 'Error fetching transcript.');
              }
            } catch (err) {
              setState('failed', 'Could not reach the server.');
            }
          });

          document.getElementById('copyBtn').addEventListener('click', async () => {
            await navigator.clipboard.writeText(resultEl.value);
            statusEl.textContent = 'Copied to clipboard.';
          });

          document.getElementById('clearBtn').addEventListener('click', () => {
            form.reset();
            setState('idle');
          });

          fetch('/proxy_status')
            .then((res) => res.json())
            .then((data) => {
              if (data.proxy_enabled) {
                const where = data.countries.length ? ' (' + data.countries.join(', ') + ')' : '';
                document.getElementById('proxyStatus').textContent = 'Proxy enabled' + where;
              }
            })
            .catch(() => {});
        </script>
      </body>
    </html>
    "#)
}
