//! Code indexing and related-code retrieval for pull request review.
//!
//! Source files are split into overlapping line-aligned chunks, annotated with
//! lightweight metadata, embedded, and written to a namespaced vector store.
//! For each file under review the store is queried with the file's content and
//! the strongest matches from other files are selected as review context.

pub mod chunker;
pub mod context;
pub mod error;
pub mod indexer;
pub mod languages;
pub mod metadata;
pub mod query;
pub mod selector;
#[cfg(test)]
pub(crate) mod testing;
pub mod types;
pub mod walker;

pub use chunker::{Chunk, ChunkerConfig};
pub use context::format_as_context;
pub use error::{IndexError, Result};
pub use indexer::{CodeIndexer, IndexReport, IndexerConfig};
pub use query::QueryEngine;
pub use selector::{ContextSelection, ContextSelector, FailedFile, SelectorConfig, filter_matches};
pub use types::{MatchResult, SourceFile};
pub use walker::RepositoryWalker;
