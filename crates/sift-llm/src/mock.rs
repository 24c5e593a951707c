//! Test-only embedding provider.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::LlmError;
use crate::provider::EmbeddingProvider;

#[derive(Debug, Clone)]
enum Mode {
    Fixed(Vec<f32>),
    Hashed { dims: usize },
    Failing,
}

/// Deterministic embedder for tests.
///
/// `hashed` mode maps each identifier-like token into one of `dims` buckets, so
/// texts sharing vocabulary score high under cosine similarity.
#[derive(Debug, Clone)]
pub struct MockEmbedder {
    mode: Mode,
    fail_on: Option<String>,
    calls: Arc<AtomicUsize>,
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self::fixed(vec![0.0; 384])
    }
}

impl MockEmbedder {
    #[must_use]
    pub fn fixed(vector: Vec<f32>) -> Self {
        Self {
            mode: Mode::Fixed(vector),
            fail_on: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    #[must_use]
    pub fn hashed(dims: usize) -> Self {
        Self {
            mode: Mode::Hashed { dims: dims.max(1) },
            fail_on: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    #[must_use]
    pub fn failing() -> Self {
        Self {
            mode: Mode::Failing,
            fail_on: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Fail any `embed` call whose text contains `needle`.
    #[must_use]
    pub fn fail_when_contains(mut self, needle: impl Into<String>) -> Self {
        self.fail_on = Some(needle.into());
        self
    }

    /// Number of `embed` calls made so far, across clones.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl EmbeddingProvider for MockEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(ref needle) = self.fail_on
            && text.contains(needle.as_str())
        {
            return Err(LlmError::Other("mock embedding failure".into()));
        }
        match &self.mode {
            Mode::Fixed(v) => Ok(v.clone()),
            Mode::Hashed { dims } => Ok(hashed_embedding(text, *dims)),
            Mode::Failing => Err(LlmError::Other("mock embedding failure".into())),
        }
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "mock"
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn hashed_embedding(text: &str, dims: usize) -> Vec<f32> {
    let mut v = vec![0.0f32; dims];
    let tokens = text
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|t| !t.is_empty() && !t.chars().all(|c| c.is_ascii_digit()));
    for token in tokens {
        let hash = blake3::hash(token.to_lowercase().as_bytes());
        let mut prefix = [0u8; 8];
        prefix.copy_from_slice(&hash.as_bytes()[..8]);
        let bucket = (u64::from_le_bytes(prefix) % dims as u64) as usize;
        v[bucket] += 1.0;
    }
    if v.iter().all(|x| *x == 0.0) {
        v[0] = 1.0;
    }
    v
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cosine(a: &[f32], b: &[f32]) -> f32 {
        let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
        let na: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let nb: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
        dot / (na * nb)
    }

    #[tokio::test]
    async fn fixed_returns_vector_and_counts_calls() {
        let m = MockEmbedder::fixed(vec![1.0, 2.0]);
        let clone = m.clone();
        assert_eq!(m.embed("a").await.unwrap(), vec![1.0, 2.0]);
        clone.embed("b").await.unwrap();
        assert_eq!(m.calls(), 2);
    }

    #[tokio::test]
    async fn failing_errors() {
        assert!(MockEmbedder::failing().embed("x").await.is_err());
    }

    #[tokio::test]
    async fn fail_when_contains_is_selective() {
        let m = MockEmbedder::hashed(16).fail_when_contains("poison");
        assert!(m.embed("clean text").await.is_ok());
        assert!(m.embed("some poison here").await.is_err());
    }

    #[tokio::test]
    async fn hashed_is_deterministic_and_similarity_tracks_vocabulary() {
        let m = MockEmbedder::hashed(256);
        let a = m.embed("let total = price * quantity;").await.unwrap();
        let b = m.embed("let total = price * quantity + 1;").await.unwrap();
        let c = m.embed("The quick brown fox jumps over the lazy dog").await.unwrap();
        assert_eq!(a, m.embed("let total = price * quantity;").await.unwrap());
        assert!(cosine(&a, &b) > 0.9);
        assert!(cosine(&a, &c) < 0.5);
    }

    #[tokio::test]
    async fn hashed_empty_text_is_nonzero() {
        let v = MockEmbedder::hashed(8).embed("   ").await.unwrap();
        assert_eq!(v.len(), 8);
        assert!(v.iter().any(|x| *x != 0.0));
    }
}
