mod cache;
mod catalog;
mod config;
mod eligibility;
mod error;
mod model;
mod recommender;
mod server;
#[cfg(test)]
mod testing;

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use sahayak_common::embedding::{Embedder, EmbeddingModelKind, HashingEmbedder, TextEmbedder};
use sahayak_common::redis::RedisCache;

use cache::RecommendationCache;
use catalog::SchemeCatalog;
use config::{Config, EmbeddingBackend};
use recommender::SchemeRecommender;
use server::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    info!("starting scheme-recommender");

    // 1. Load config from environment
    let config = Config::from_env()?;
    info!(
        schemes = %config.schemes_path.display(),
        max_top_k = config.max_top_k,
        redis = config.redis_url.is_some(),
        "configuration loaded"
    );

    // 2. Connect to Redis (optional, recommendations are recomputed without it)
    let redis_cache = RedisCache::new(config.redis_url.as_deref());
    if redis_cache.is_available().await {
        info!("redis connected");
    } else {
        info!("redis unavailable, running without recommendation cache");
    }

    // 3. Initialize embedding model
    let embedder: Arc<dyn TextEmbedder> = match config.embedding_backend {
        EmbeddingBackend::FastEmbed => {
            info!("initializing embedding model (may download on first run)");
            Arc::new(Embedder::new(EmbeddingModelKind::BgeBase).await?)
        }
        EmbeddingBackend::Hashing => {
            info!("using hashing embedder");
            Arc::new(HashingEmbedder::default())
        }
    };

    // 4. Load and index the schemes
    let catalog = Arc::new(SchemeCatalog::load(&config.schemes_path, embedder).await?);
    let schemes = catalog.len();
    info!(schemes, fingerprint = %catalog.fingerprint(), "scheme catalogue ready");

    // 5. Invalidate stale cached recommendations
    let cache = RecommendationCache::new(redis_cache);
    cache.sync_fingerprint(catalog.fingerprint()).await;

    // 6. Serve HTTP
    let recommender = SchemeRecommender::new(catalog, cache, config.max_top_k);
    let app = server::router(Arc::new(AppState {
        recommender,
        schemes,
    }));

    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    info!(addr = %config.listen_addr, "scheme-recommender listening");
    axum::serve(listener, app).await.inspect_err(|e| {
        tracing::error!(error = %e, "HTTP server error");
    })?;
    info!("scheme-recommender shut down");
    Ok(())
}
