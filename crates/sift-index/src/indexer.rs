//! Indexing orchestrator: walk → chunk → embed → store.

use std::sync::Arc;
use std::time::Instant;

use futures::{StreamExt, TryStreamExt, stream};
use serde::Serialize;
use sift_llm::{EmbeddingProvider, StatusTx};
use sift_store::{VectorPoint, VectorStore};
use tokio::sync::OnceCell;

use crate::chunker::ChunkerConfig;
use crate::error::{IndexError, Result};
use crate::languages::detect_language;
use crate::metadata::{ChunkMetadata, record_id};
use crate::types::SourceFile;
use crate::walker::RepositoryWalker;

/// Embedding requests in flight for a single file.
const EMBED_CONCURRENCY: usize = 8;

/// Indexer configuration.
#[derive(Debug, Clone)]
pub struct IndexerConfig {
    pub chunker: ChunkerConfig,
    /// Vector store partition all records are written to.
    pub namespace: String,
    /// Files indexed concurrently during a repository walk.
    pub concurrency: usize,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            chunker: ChunkerConfig::default(),
            namespace: "code files".to_owned(),
            concurrency: 4,
        }
    }
}

/// Summary of an indexing run.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct IndexReport {
    pub files_listed: usize,
    pub files_filtered_out: usize,
    pub files_indexed: usize,
    pub files_skipped: usize,
    pub files_failed: Vec<(String, String)>,
    pub records_written: usize,
    pub duration_ms: u64,
}

enum Outcome {
    Indexed(usize),
    Skipped,
    Failed(String),
}

impl IndexReport {
    fn record(&mut self, path: String, outcome: Outcome) {
        match outcome {
            Outcome::Indexed(n) => {
                self.files_indexed += 1;
                self.records_written += n;
            }
            Outcome::Skipped => self.files_skipped += 1,
            Outcome::Failed(err) => self.files_failed.push((path, err)),
        }
    }

    fn finish(&mut self, start: Instant) {
        self.files_failed.sort();
        self.duration_ms = start.elapsed().as_millis().try_into().unwrap_or(u64::MAX);
    }
}

/// Turns source files into embedded, namespaced store records.
pub struct CodeIndexer<E: EmbeddingProvider> {
    store: Arc<dyn VectorStore>,
    embedder: Arc<E>,
    config: IndexerConfig,
    status_tx: Option<StatusTx>,
    ready: OnceCell<u64>,
}

impl<E: EmbeddingProvider> CodeIndexer<E> {
    #[must_use]
    pub fn new(store: Arc<dyn VectorStore>, embedder: Arc<E>, config: IndexerConfig) -> Self {
        Self {
            store,
            embedder,
            config,
            status_tx: None,
            ready: OnceCell::new(),
        }
    }

    #[must_use]
    pub fn with_status_tx(mut self, tx: StatusTx) -> Self {
        self.status_tx = Some(tx);
        self
    }

    #[must_use]
    pub fn config(&self) -> &IndexerConfig {
        &self.config
    }

    fn emit_status(&self, msg: impl Into<String>) {
        if let Some(ref tx) = self.status_tx {
            let _ = tx.send(msg.into());
        }
    }

    /// Probe the embedding dimension once and make sure the collection exists.
    async fn ensure_ready(&self) -> Result<u64> {
        let size = self
            .ready
            .get_or_try_init(|| async {
                let probe = self.embedder.embed("probe").await?;
                let vector_size = u64::try_from(probe.len())?;
                self.store
                    .ensure_collection(vector_size)
                    .await
                    .map_err(IndexError::Store)?;
                tracing::debug!(vector_size, embedder = self.embedder.name(), "collection ready");
                Ok::<u64, IndexError>(vector_size)
            })
            .await?;
        Ok(*size)
    }

    /// Chunk, embed, and upsert one file as a single batch. Returns records written.
    ///
    /// Record ids are `{path}-{chunk_index}`, so re-indexing unchanged content
    /// overwrites the same records.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Embedding`] if any chunk fails to embed (nothing is
    /// written), or [`IndexError::StoreWrite`] naming the file if the upsert fails.
    pub async fn index_file(&self, file: &SourceFile) -> Result<usize> {
        let chunks = self.config.chunker.split(&file.content);
        if chunks.is_empty() {
            tracing::debug!(file = %file.path, "empty file, nothing to index");
            return Ok(0);
        }
        self.ensure_ready().await?;

        let embedder = &self.embedder;
        let vectors: Vec<Vec<f32>> = stream::iter(chunks.iter())
            .map(|chunk| embedder.embed(chunk.text))
            .buffered(EMBED_CONCURRENCY)
            .try_collect()
            .await?;

        let language = detect_language(&file.path).map(|l| l.id());
        let points: Vec<VectorPoint> = chunks
            .iter()
            .zip(vectors)
            .enumerate()
            .map(|(i, (chunk, vector))| VectorPoint {
                id: record_id(&file.path, i),
                vector,
                payload: ChunkMetadata::for_chunk(&file.path, &file.repo_key, chunk, i, language)
                    .into_payload(),
            })
            .collect();
        let count = points.len();

        self.store
            .upsert(&self.config.namespace, points)
            .await
            .map_err(|source| IndexError::StoreWrite {
                path: file.path.clone(),
                source,
            })?;

        tracing::debug!(file = %file.path, chunks = count, "indexed");
        self.emit_status(format!("embedding created for {}", file.path));
        Ok(count)
    }

    async fn index_one(&self, file: &SourceFile) -> Outcome {
        match self.index_file(file).await {
            Ok(0) => Outcome::Skipped,
            Ok(n) => Outcome::Indexed(n),
            Err(e) => {
                tracing::warn!(file = %file.path, "indexing failed: {e}");
                Outcome::Failed(e.to_string())
            }
        }
    }

    /// Index already-fetched files concurrently. Per-file failures are reported, not raised.
    pub async fn index_files(&self, files: &[SourceFile]) -> IndexReport {
        let start = Instant::now();
        let mut report = IndexReport {
            files_listed: files.len(),
            ..IndexReport::default()
        };

        let outcomes: Vec<_> = stream::iter(files)
            .map(|file| async move { (file.path.clone(), self.index_one(file).await) })
            .buffer_unordered(self.config.concurrency.max(1))
            .collect()
            .await;
        for (path, outcome) in outcomes {
            report.record(path, outcome);
        }

        report.finish(start);
        report
    }

    /// Index every supported file under `root`.
    ///
    /// Without `git_ref` the provider's default branch is used. Files that are
    /// missing or cannot be fetched or decoded are skipped; files whose
    /// embedding or upsert fails are reported as failed. The walk continues
    /// past both.
    ///
    /// # Errors
    ///
    /// Returns an error if the default branch cannot be resolved or the tree
    /// cannot be fully listed.
    pub async fn index_repository(
        &self,
        walker: &RepositoryWalker,
        root: &str,
        git_ref: Option<&str>,
    ) -> Result<IndexReport> {
        let start = Instant::now();
        let git_ref = match git_ref {
            Some(r) => Some(r.to_owned()),
            None => walker.provider().default_ref().await?,
        };
        let git_ref = git_ref.as_deref();

        let paths = walker.list_files(root, git_ref).await?;
        let supported = RepositoryWalker::filter_supported(&paths);
        let mut report = IndexReport {
            files_listed: paths.len(),
            files_filtered_out: paths.len() - supported.len(),
            ..IndexReport::default()
        };
        tracing::info!(
            repo = %walker.provider().repo_key(),
            git_ref = git_ref.unwrap_or("<working tree>"),
            total = supported.len(),
            filtered_out = report.files_filtered_out,
            "indexing started"
        );

        let outcomes: Vec<_> = stream::iter(supported)
            .map(|path| async move {
                let outcome = match walker.fetch(&path, git_ref).await {
                    Ok(Some(file)) => self.index_one(&file).await,
                    Ok(None) => {
                        tracing::warn!(file = %path, "not found, skipping");
                        Outcome::Skipped
                    }
                    Err(e) => {
                        tracing::warn!(file = %path, "fetch failed, skipping: {e}");
                        Outcome::Skipped
                    }
                };
                (path, outcome)
            })
            .buffer_unordered(self.config.concurrency.max(1))
            .collect()
            .await;
        for (path, outcome) in outcomes {
            report.record(path, outcome);
        }

        report.finish(start);
        tracing::info!(
            indexed = report.files_indexed,
            skipped = report.files_skipped,
            failed = report.files_failed.len(),
            records = report.records_written,
            duration_ms = report.duration_ms,
            "indexing finished"
        );
        Ok(report)
    }
}
