mod config;
mod db;
mod embedding;
mod errors;
mod llm_client;
mod locations;
mod models;
mod postings;
mod recommend;
mod routes;
mod state;
mod vector_store;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::embedding::{Embedder, HttpEmbedder};
use crate::llm_client::LlmClient;
use crate::postings::{MemoryPostingSource, PgPostingSource, PostingSource};
use crate::recommend::Recommender;
use crate::routes::build_router;
use crate::state::AppState;
use crate::vector_store::{ChromaStore, SnapshotStore, VectorStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting recommender API v{}", env!("CARGO_PKG_VERSION"));

    let embedder = HttpEmbedder::new(
        &config.embedding_url,
        config.embedding_model.clone(),
        config.embedding_api_key.clone(),
    )?;
    info!("Embedder initialized (model: {})", embedder.model_name());

    let store = build_vector_store(&config).await?;
    let postings = build_posting_source(&config).await?;

    let llm = LlmClient::new(config.anthropic_api_key.clone())?;
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    let recommender = Recommender::new(
        Arc::new(embedder),
        store,
        postings,
        Arc::new(llm),
        config.ranking,
    );
    let policy = recommender.policy();
    info!(
        "Ranking policy: title threshold {}, top {}",
        policy.title_threshold, policy.top_n
    );

    let state = AppState {
        recommender: Arc::new(recommender),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the web client's host is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Chroma by default; a JSON snapshot when `VECTOR_SNAPSHOT_PATH` is set.
async fn build_vector_store(config: &Config) -> Result<Arc<dyn VectorStore>> {
    match &config.vector_snapshot_path {
        Some(path) => {
            let store = SnapshotStore::load(path, config.vector_query_limit).await?;
            info!("Vector snapshot loaded from {path} ({} chunks)", store.len());
            Ok(Arc::new(store))
        }
        None => {
            let store = ChromaStore::new(
                &config.chroma_url,
                config.chroma_collection.clone(),
                config.metadata_schema.clone(),
                config.vector_query_limit,
            )?;
            info!(
                "Chroma client initialized ({} / {})",
                config.chroma_url, config.chroma_collection
            );
            Ok(Arc::new(store))
        }
    }
}

/// Postgres by default; a JSON export when `POSTINGS_SNAPSHOT_PATH` is set.
async fn build_posting_source(config: &Config) -> Result<Arc<dyn PostingSource>> {
    if let Some(path) = &config.postings_snapshot_path {
        let source = MemoryPostingSource::load(path).await?;
        info!("Postings loaded from {path}");
        return Ok(Arc::new(source));
    }
    let database_url = config
        .database_url
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("DATABASE_URL is not set"))?;
    let pool = create_pool(database_url).await?;
    Ok(Arc::new(PgPostingSource::new(pool)))
}
