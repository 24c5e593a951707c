use std::sync::Arc;

use sift_llm::EmbeddingProvider;
use sift_store::{ScoredPoint, VectorStore};

use crate::error::{IndexError, Result};
use crate::types::{MatchResult, parse_line_range};

/// Embeds query text and runs a namespaced nearest-neighbor lookup.
pub struct QueryEngine<E: EmbeddingProvider> {
    store: Arc<dyn VectorStore>,
    embedder: Arc<E>,
    namespace: String,
}

impl<E: EmbeddingProvider> QueryEngine<E> {
    #[must_use]
    pub fn new(store: Arc<dyn VectorStore>, embedder: Arc<E>, namespace: impl Into<String>) -> Self {
        Self {
            store,
            embedder,
            namespace: namespace.into(),
        }
    }

    /// Top `k` matches for `text` in the store's ranking order, highest score first.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Embedding`] or [`IndexError::StoreQuery`] when the
    /// respective collaborator call fails.
    pub async fn query(&self, text: &str, k: usize) -> Result<Vec<MatchResult>> {
        let vector = self.embedder.embed(text).await?;
        let top_k = u64::try_from(k)?;
        let points = self
            .store
            .query(&self.namespace, vector, top_k)
            .await
            .map_err(IndexError::StoreQuery)?;
        tracing::debug!(k, returned = points.len(), "query");
        Ok(points.into_iter().map(to_match).collect())
    }
}

fn to_match(point: ScoredPoint) -> MatchResult {
    let mut payload = point.payload;
    let line_range = payload.get("line_range").and_then(|s| parse_line_range(s));
    MatchResult {
        id: point.id,
        content: payload.remove("content").unwrap_or_default(),
        filepath: payload.remove("filepath").unwrap_or_default(),
        repo: payload.remove("repo").unwrap_or_default(),
        score: point.score,
        line_range,
    }
}
