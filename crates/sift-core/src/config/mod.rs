mod env;
mod types;


pub use types::*;

use std::path::Path;

use anyhow::{Context, bail};

impl Config {
    /// Load configuration from a TOML file with env var overrides.
    ///
    /// Falls back to defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config file {}", path.display()))?;
            toml::from_str::<Self>(&content).context("failed to parse config file")?
        } else {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Reject settings the pipeline cannot run with.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first offending setting.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.index.chunk_size == 0 {
            bail!("index.chunk_size must be greater than 0");
        }
        if self.index.chunk_overlap >= self.index.chunk_size {
            bail!(
                "index.chunk_overlap ({}) must be less than index.chunk_size ({})",
                self.index.chunk_overlap,
                self.index.chunk_size
            );
        }
        if self.index.concurrency == 0 {
            bail!("index.concurrency must be greater than 0");
        }
        if self.retrieval.top_k == 0 {
            bail!("retrieval.top_k must be greater than 0");
        }
        if self.retrieval.max_results == 0 {
            bail!("retrieval.max_results must be greater than 0");
        }
        if self.retrieval.concurrency == 0 {
            bail!("retrieval.concurrency must be greater than 0");
        }
        if !(-1.0..=1.0).contains(&self.retrieval.score_threshold) {
            bail!(
                "retrieval.score_threshold must be within [-1, 1], got {}",
                self.retrieval.score_threshold
            );
        }
        if self.store.namespace.trim().is_empty() {
            bail!("store.namespace must not be empty");
        }
        if self.embedding.provider == EmbeddingProviderKind::OpenAi
            && self
                .embedding
                .api_key
                .as_ref()
                .is_none_or(|k| k.expose().is_empty())
        {
            bail!("embedding.api_key (or SIFT_EMBEDDING_API_KEY) is required for the openai provider");
        }
        Ok(())
    }
}
