mod config;
mod db;
mod drive;
mod errors;
mod llm_client;
mod models;
mod profile;
mod resumes;
mod routes;
mod state;
mod sync;
mod tailoring;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::llm_client::LlmClient;
use crate::profile::store::ProfileStore;
use crate::routes::build_router;
use crate::state::AppState;
use crate::tailoring::{LlmTailor, MockTailor, Tailor};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting MapleLeaf API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize SQLite and run pending schema migrations before anything
    // can observe the stored documents.
    let pool = create_pool(&config.database_url).await?;
    db::init(&pool).await?;

    let profiles = ProfileStore::new(pool.clone());

    let tailor: Arc<dyn Tailor> = match config.anthropic_api_key.clone() {
        Some(key) => {
            info!("LLM tailoring enabled (model: {})", llm_client::MODEL);
            Arc::new(LlmTailor::new(LlmClient::new(key)))
        }
        None => {
            warn!("ANTHROPIC_API_KEY not set; tailoring returns mock content");
            Arc::new(MockTailor)
        }
    };

    let state = AppState {
        db: pool,
        profiles,
        tailor,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // local-first app, the UI runs on another port

    let addr: SocketAddr = format!("127.0.0.1:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
