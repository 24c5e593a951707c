//! Error types for sift-index.

use sift_store::VectorStoreError;

/// Errors raised while indexing files or selecting context.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// File provider unavailable or a listing failed.
    #[error("fetch failed: {0}")]
    Fetch(#[from] sift_source::SourceError),

    /// Provider content was not valid base64.
    #[error("cannot decode content of {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: base64::DecodeError,
    },

    /// Embedding call failed.
    #[error("embedding failed: {0}")]
    Embedding(#[from] sift_llm::LlmError),

    /// Collection setup failed.
    #[error("vector store setup failed: {0}")]
    Store(#[source] VectorStoreError),

    /// Batch upsert for a file failed; none of its records should be considered written.
    #[error("writing records for {path} failed: {source}")]
    StoreWrite {
        path: String,
        #[source]
        source: VectorStoreError,
    },

    /// Nearest-neighbor query failed.
    #[error("vector store query failed: {0}")]
    StoreQuery(#[source] VectorStoreError),

    /// Integer conversion error.
    #[error("integer conversion failed: {0}")]
    IntConversion(#[from] std::num::TryFromIntError),
}

/// Result type alias using `IndexError`.
pub type Result<T> = std::result::Result<T, IndexError>;
