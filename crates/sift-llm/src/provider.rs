use std::future::Future;

use crate::error::LlmError;

/// Side channel for short human-readable progress messages (rate limit waits, retries).
pub type StatusTx = tokio::sync::mpsc::UnboundedSender<String>;

/// Maps a text to a fixed-length vector.
///
/// Every vector produced by one provider instance has the same dimension, and
/// texts with similar meaning produce vectors with high cosine similarity.
pub trait EmbeddingProvider: Send + Sync {
    /// Embed `text` into a vector.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unreachable, rejects the request, or
    /// returns no embedding.
    fn embed(&self, text: &str) -> impl Future<Output = Result<Vec<f32>, LlmError>> + Send;

    /// Provider name used in logs and error messages.
    fn name(&self) -> &str;
}
