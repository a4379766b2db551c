mod artifacts;
mod cache;
mod catalog;
mod config;
mod error;
mod letter;
mod matcher;
mod model;
mod narrative;
mod pipeline;
mod server;
#[cfg(test)]
mod testing;

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use sahayak_common::capability::{Capabilities, Translator};
use sahayak_common::embedding::{Embedder, EmbeddingModelKind, HashingEmbedder, TextEmbedder};
use sahayak_common::language::ScriptLanguageDetector;
use sahayak_common::openai::{OpenAiClient, OpenAiClientConfig};
use sahayak_common::providers::{
    HttpDocumentRenderer, LlmTranslator, OpenAiSpeechSynthesizer, WhisperTranscriber,
};
use sahayak_common::redis::RedisCache;

use artifacts::ArtifactStore;
use cache::CachedTranslator;
use catalog::CatalogIndex;
use config::{Config, EmbeddingBackend};
use matcher::DuplicatePolicy;
use pipeline::ComplaintPipeline;
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

    info!("starting complaint-assistant");

    // 1. Load config from environment
    let config = Config::from_env()?;
    info!(
        queries = %config.queries_path.display(),
        sections = %config.sections_path.display(),
        output_dir = %config.output_dir().display(),
        top_k = config.top_k,
        deduplicate = config.deduplicate_matches,
        redis = config.redis_url.is_some(),
        "configuration loaded"
    );

    // 2. Connect to Redis (optional, translations are recomputed without it)
    let redis_cache = RedisCache::new(config.redis_url.as_deref());
    if redis_cache.is_available().await {
        info!("redis connected");
    } else {
        info!("redis unavailable, running without translation cache");
    }

    // 3. Initialize embedding model
    let embedder: Arc<dyn TextEmbedder> = match config.embedding_backend {
        EmbeddingBackend::FastEmbed => {
            info!("initializing embedding model (may download on first run)");
            Arc::new(Embedder::new(EmbeddingModelKind::MiniLm).await?)
        }
        EmbeddingBackend::Hashing => {
            info!("using hashing embedder");
            Arc::new(HashingEmbedder::default())
        }
    };

    // 4. Load and index the catalogue
    let catalog = Arc::new(
        CatalogIndex::load(&config.queries_path, &config.sections_path, embedder).await?,
    );
    let sections = catalog.all_entries().len();
    info!(
        sections,
        phrasings = catalog.index().len(),
        fingerprint = %catalog.fingerprint(),
        "catalogue ready"
    );

    // 5. Wire external capabilities
    let openai_config = OpenAiClientConfig::from_env();
    info!(
        base_url = %openai_config.base_url,
        max_retries = openai_config.max_retries,
        "openai client configured"
    );
    let openai = Arc::new(OpenAiClient::new(openai_config)?);
    let translator: Arc<dyn Translator> = Arc::new(CachedTranslator::new(
        Arc::new(LlmTranslator::new(
            Arc::clone(&openai),
            config.translation_model.clone(),
        )),
        redis_cache,
    ));
    let capabilities = Capabilities {
        transcriber: Arc::new(WhisperTranscriber::new(
            Arc::clone(&openai),
            config.transcription_model.clone(),
        )),
        translator,
        speech: Arc::new(OpenAiSpeechSynthesizer::new(
            Arc::clone(&openai),
            config.speech_model.clone(),
            config.speech_voices.clone(),
        )),
        renderer: Arc::new(HttpDocumentRenderer::new(
            &config.renderer_url,
            config.renderer_timeout,
        )?),
        detector: Arc::new(ScriptLanguageDetector),
    };

    // 6. Build pipeline and serve HTTP
    let pipeline = Arc::new(ComplaintPipeline::new(
        catalog,
        DuplicatePolicy::from_flag(config.deduplicate_matches),
        capabilities,
        ArtifactStore::new(config.output_dir.clone(), &config.public_url_prefix),
        config.top_k,
    ));
    let app = server::router(
        Arc::new(AppState { pipeline, sections }),
        config.max_upload_bytes,
    );

    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    info!(addr = %config.listen_addr, "complaint-assistant listening");
    axum::serve(listener, app).await.inspect_err(|e| {
        tracing::error!(error = %e, "HTTP server error");
    })?;
    info!("complaint-assistant shut down");
    Ok(())
}
