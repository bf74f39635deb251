mod cache;
mod config;
mod error;
mod handlers;
mod interpreter;
mod key;
mod kitchen;
mod llm;
mod metrics;
mod models;
mod prompt;
mod state;

use anyhow::Context;
use axum::http::HeaderValue;
use clap::Parser;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::cache::MemoryStore;
use crate::config::Args;
use crate::kitchen::Kitchen;
use crate::llm::GeminiClient;
use crate::state::AppState;

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .map(|o| o.trim())
        .filter(|o| !o.is_empty())
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %o, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(Any)
        .allow_headers(Any)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env is optional
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // parse cli arguments
    let args = Args::parse();

    let generator = GeminiClient::new(args.generation_settings())
        .context("failed to build generation client")?;
    let kitchen = Kitchen::new(
        Arc::new(MemoryStore::new()),
        Arc::new(generator),
        args.kitchen_settings(),
    );
    let state = Arc::new(AppState { kitchen });

    let app = handlers::router(state)
        .layer(cors_layer(&args.cors_origins))
        .layer(TraceLayer::new_for_http());

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!(port = args.port, model = %args.model, "kitchen running on http://localhost:{}", args.port);
    info!(format = ?args.response_format, max_output_tokens = args.max_output_tokens, "generation profile");

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
