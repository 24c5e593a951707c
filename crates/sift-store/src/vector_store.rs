use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;

#[derive(Debug, thiserror::Error)]
pub enum VectorStoreError {
    #[error("connection error: {0}")]
    Connection(String),
    #[error("collection error: {0}")]
    Collection(String),
    #[error("upsert error: {0}")]
    Upsert(String),
    #[error("query error: {0}")]
    Query(String),
}

/// A record to write: logical id, embedding, and string metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorPoint {
    pub id: String,
    pub vector: Vec<f32>,
    pub payload: BTreeMap<String, String>,
}

/// A stored record returned by similarity search.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredPoint {
    pub id: String,
    pub score: f32,
    pub payload: BTreeMap<String, String>,
}

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Similarity-searchable store partitioned by namespace.
///
/// Records written to one namespace are never returned by queries against
/// another. Upserting an existing id within a namespace replaces the record.
pub trait VectorStore: Send + Sync {
    /// Prepare backing storage for vectors of `vector_size` dimensions. Idempotent.
    fn ensure_collection(&self, vector_size: u64) -> BoxFuture<'_, Result<(), VectorStoreError>>;

    fn upsert(
        &self,
        namespace: &str,
        points: Vec<VectorPoint>,
    ) -> BoxFuture<'_, Result<(), VectorStoreError>>;

    /// Return at most `top_k` records from `namespace`, highest score first.
    fn query(
        &self,
        namespace: &str,
        vector: Vec<f32>,
        top_k: u64,
    ) -> BoxFuture<'_, Result<Vec<ScoredPoint>, VectorStoreError>>;
}
