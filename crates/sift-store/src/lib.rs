//! Namespaced vector storage for code chunk embeddings.

pub mod in_memory_store;
pub mod qdrant;
pub mod vector_store;

pub use in_memory_store::InMemoryVectorStore;
pub use qdrant::QdrantStore;
pub use vector_store::{BoxFuture, ScoredPoint, VectorPoint, VectorStore, VectorStoreError};
