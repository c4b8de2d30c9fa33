mod config;
mod error;
mod models;
mod routes;
mod transcript;
mod video_id;

use std::net::SocketAddr;
use std::sync::Arc;

use config::AppConfig;
use routes::{create_routes, AppState};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use transcript::YoutubeTranscriptFetcher;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env();
    init_tracing(config.json_logs);

    info!(
        proxy_enabled = config.proxy.is_some(),
        languages = ?config.languages,
        "Starting tubescript"
    );

    let fetcher = YoutubeTranscriptFetcher::new(config.proxy.as_ref(), config.request_timeout);
    let fetcher = match fetcher {
        Ok(f) => f,
        Err(e) => {
            error!("Failed to build YouTube client: {}", e);
            std::process::exit(1);
        }
    };

    let addr: SocketAddr = match config.bind_addr().parse() {
        Ok(addr) => addr,
        Err(e) => {
            error!("Invalid bind address {}: {}", config.bind_addr(), e);
            std::process::exit(1);
        }
    };

    let state = AppState::new(config, Arc::new(fetcher));
    let app = create_routes(state).layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()));

    let server = match axum::Server::try_bind(&addr) {
        Ok(builder) => builder,
        Err(e) => {
            error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    info!("Listening on {}", addr);
    if let Err(e) = server
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Server error: {}", e);
        std::process::exit(1);
    }

    info!("Server shutdown complete");
}

fn init_tracing(json: bool) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("tubescript=info,tower_http=info"));

    if json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_target(true))
            .with(env_filter)
            .init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal");
}
