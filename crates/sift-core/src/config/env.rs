use std::str::FromStr;

use super::{Config, Secret};

fn parse_var<T: FromStr>(key: &str) -> Option<T> {
    let v = std::env::var(key).ok()?;
    if let Ok(parsed) = v.parse::<T>() {
        Some(parsed)
    } else {
        tracing::warn!("ignoring invalid {key} value: {v}");
        None
    }
}

impl Config {
    pub(crate) fn apply_env_overrides(&mut self) {
        if let Some(kind) = parse_var("SIFT_EMBEDDING_PROVIDER") {
            self.embedding.provider = kind;
        }
        if let Ok(v) = std::env::var("SIFT_EMBEDDING_BASE_URL") {
            self.embedding.base_url = Some(v);
        }
        if let Ok(v) = std::env::var("SIFT_EMBEDDING_MODEL") {
            self.embedding.model = v;
        }
        if let Ok(v) = std::env::var("SIFT_EMBEDDING_API_KEY") {
            self.embedding.api_key = Some(Secret::new(v));
        }

        if let Some(backend) = parse_var("SIFT_STORE_BACKEND") {
            self.store.backend = backend;
        }
        if let Ok(v) = std::env::var("SIFT_QDRANT_URL") {
            self.store.qdrant_url = v;
        }
        if let Ok(v) = std::env::var("SIFT_STORE_COLLECTION") {
            self.store.collection = v;
        }
        if let Ok(v) = std::env::var("SIFT_STORE_NAMESPACE") {
            self.store.namespace = v;
        }

        if let Some(n) = parse_var("SIFT_INDEX_CHUNK_SIZE") {
            self.index.chunk_size = n;
        }
        if let Some(n) = parse_var("SIFT_INDEX_CHUNK_OVERLAP") {
            self.index.chunk_overlap = n;
        }
        if let Some(n) = parse_var("SIFT_INDEX_CONCURRENCY") {
            self.index.concurrency = n;
        }

        if let Some(n) = parse_var("SIFT_RETRIEVAL_TOP_K") {
            self.retrieval.top_k = n;
        }
        if let Some(t) = parse_var("SIFT_RETRIEVAL_SCORE_THRESHOLD") {
            self.retrieval.score_threshold = t;
        }
        if let Some(n) = parse_var("SIFT_RETRIEVAL_MAX_RESULTS") {
            self.retrieval.max_results = n;
        }
        if let Some(n) = parse_var("SIFT_RETRIEVAL_CONCURRENCY") {
            self.retrieval.concurrency = n;
        }

        if let Ok(v) = std::env::var("SIFT_GITHUB_API_URL") {
            self.github.api_url = v;
        }
        if let Ok(v) = std::env::var("SIFT_GITHUB_TOKEN") {
            self.github.token = Some(Secret::new(v));
        }
    }
}
