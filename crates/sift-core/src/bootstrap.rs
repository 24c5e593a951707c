//! Construction of the embedder, vector store, and file providers from config.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use sift_index::{ChunkerConfig, IndexerConfig, SelectorConfig};
use sift_llm::{AnyEmbedder, StatusTx};
use sift_llm::ollama::OllamaEmbedder;
use sift_llm::openai::OpenAiEmbedder;
use sift_source::{GitHubProvider, LocalProvider, RepoKey};
use sift_store::{InMemoryVectorStore, QdrantStore, VectorStore};

use crate::config::{Config, EmbeddingProviderKind, StoreBackend};

/// Priority: `--config` flag > `SIFT_CONFIG` env > `config/default.toml`.
#[must_use]
pub fn resolve_config_path(cli_path: Option<&Path>) -> PathBuf {
    if let Some(path) = cli_path {
        return path.to_owned();
    }
    if let Ok(path) = std::env::var("SIFT_CONFIG") {
        return PathBuf::from(path);
    }
    PathBuf::from("config/default.toml")
}

/// Load, override from env, and validate.
///
/// # Errors
///
/// Returns an error if the config cannot be parsed or fails validation.
pub fn load_config(cli_path: Option<&Path>) -> anyhow::Result<Config> {
    let path = resolve_config_path(cli_path);
    let config = Config::load(&path)?;
    config
        .validate()
        .with_context(|| format!("invalid configuration in {}", path.display()))?;
    Ok(config)
}

/// Build the configured embedding backend.
///
/// # Errors
///
/// Returns an error if the `openai` provider is selected without an API key.
pub fn create_embedder(config: &Config, status_tx: Option<StatusTx>) -> anyhow::Result<AnyEmbedder> {
    let emb = &config.embedding;
    let embedder = match emb.provider {
        EmbeddingProviderKind::Ollama => {
            AnyEmbedder::Ollama(OllamaEmbedder::new(emb.base_url(), emb.model.clone()))
        }
        EmbeddingProviderKind::OpenAi => {
            let key = emb
                .api_key
                .as_ref()
                .context("embedding.api_key is required for the openai provider")?;
            let mut provider =
                OpenAiEmbedder::new(key.expose().to_owned(), emb.base_url(), emb.model.clone());
            if let Some(tx) = status_tx {
                provider = provider.with_status_tx(tx);
            }
            AnyEmbedder::OpenAi(provider)
        }
    };
    tracing::info!(
        provider = %emb.provider,
        model = %emb.model,
        base_url = %emb.base_url(),
        "embedding provider configured"
    );
    Ok(embedder)
}

/// Build the configured vector store.
///
/// # Errors
///
/// Returns an error if the Qdrant client cannot be created.
pub fn create_store(config: &Config) -> anyhow::Result<Arc<dyn VectorStore>> {
    match config.store.backend {
        StoreBackend::Qdrant => {
            let store = QdrantStore::new(&config.store.qdrant_url, config.store.collection.clone())
                .with_context(|| format!("failed to connect to Qdrant at {}", config.store.qdrant_url))?;
            tracing::info!(
                url = %config.store.qdrant_url,
                collection = %config.store.collection,
                "qdrant store configured"
            );
            Ok(Arc::new(store))
        }
        StoreBackend::Memory => {
            tracing::warn!("using in-memory vector store, indexed records are lost on exit");
            Ok(Arc::new(InMemoryVectorStore::new()))
        }
    }
}

/// # Errors
///
/// Returns an error if `repo` is not `owner/repo`.
pub fn create_github_provider(config: &Config, repo: &str) -> anyhow::Result<GitHubProvider> {
    let key: RepoKey = repo
        .parse()
        .with_context(|| format!("invalid repository {repo:?}, expected owner/repo"))?;
    let token = config.github.token.as_ref().map(|t| t.expose().to_owned());
    if token.is_none() {
        tracing::debug!("no GitHub token configured, using unauthenticated requests");
    }
    Ok(GitHubProvider::new(key, token).with_api_url(config.github.api_url.clone()))
}

/// # Errors
///
/// Returns an error if `path` is not a directory.
pub fn create_local_provider(path: &Path) -> anyhow::Result<LocalProvider> {
    anyhow::ensure!(path.is_dir(), "{} is not a directory", path.display());
    Ok(LocalProvider::new(path))
}

#[must_use]
pub fn indexer_config(config: &Config) -> IndexerConfig {
    IndexerConfig {
        chunker: ChunkerConfig {
            max_size: config.index.chunk_size,
            overlap: config.index.chunk_overlap,
        },
        namespace: config.store.namespace.clone(),
        concurrency: config.index.concurrency,
    }
}

#[must_use]
pub fn selector_config(config: &Config) -> SelectorConfig {
    SelectorConfig {
        top_k: config.retrieval.top_k,
        score_threshold: config.retrieval.score_threshold,
        max_results: config.retrieval.max_results,
        concurrency: config.retrieval.concurrency,
    }
}
