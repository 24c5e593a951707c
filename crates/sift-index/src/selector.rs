//! Related-code selection for files under review.

use std::collections::BTreeMap;

use futures::{StreamExt, stream};
use serde::Serialize;
use sift_llm::EmbeddingProvider;

use crate::error::Result;
use crate::query::QueryEngine;
use crate::types::{MatchResult, SourceFile};

/// Selection policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectorConfig {
    /// Raw matches requested per file before filtering (default: 20).
    pub top_k: usize,
    /// Matches must score strictly above this (default: 0.8).
    pub score_threshold: f32,
    /// Matches kept per file after filtering (default: 3).
    pub max_results: usize,
    /// Files queried concurrently (default: 8).
    pub concurrency: usize,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            top_k: 20,
            score_threshold: 0.8,
            max_results: 3,
            concurrency: 8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedFile {
    pub path: String,
    pub error: String,
}

/// Per-file related code. Files with no surviving match are absent from `matches`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ContextSelection {
    pub matches: BTreeMap<String, Vec<MatchResult>>,
    pub failed: Vec<FailedFile>,
}

impl ContextSelection {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty() && self.failed.is_empty()
    }
}

/// Drop self-matches, keep scores strictly above `threshold`, cap at `max_results`.
/// Input order is preserved.
#[must_use]
pub fn filter_matches(
    own_path: &str,
    matches: Vec<MatchResult>,
    threshold: f32,
    max_results: usize,
) -> Vec<MatchResult> {
    matches
        .into_iter()
        .filter(|m| m.filepath != own_path)
        .filter(|m| m.score > threshold)
        .take(max_results)
        .collect()
}

pub struct ContextSelector<E: EmbeddingProvider> {
    engine: QueryEngine<E>,
    config: SelectorConfig,
}

impl<E: EmbeddingProvider> ContextSelector<E> {
    #[must_use]
    pub fn new(engine: QueryEngine<E>, config: SelectorConfig) -> Self {
        Self { engine, config }
    }

    async fn select_for_file(&self, file: &SourceFile) -> Result<Vec<MatchResult>> {
        if file.content.trim().is_empty() {
            return Ok(Vec::new());
        }
        let raw = self.engine.query(&file.content, self.config.top_k).await?;
        let raw_count = raw.len();
        let kept = filter_matches(
            &file.path,
            raw,
            self.config.score_threshold,
            self.config.max_results,
        );
        tracing::debug!(file = %file.path, raw = raw_count, kept = kept.len(), "context selected");
        Ok(kept)
    }

    /// Query related code for each file independently.
    ///
    /// A failure for one file is recorded in [`ContextSelection::failed`] and
    /// does not affect the others.
    pub async fn select_context(&self, files: &[SourceFile]) -> ContextSelection {
        let outcomes: Vec<_> = stream::iter(files)
            .map(|file| async move { (file.path.as_str(), self.select_for_file(file).await) })
            .buffer_unordered(self.config.concurrency.max(1))
            .collect()
            .await;

        let mut selection = ContextSelection::default();
        for (path, outcome) in outcomes {
            match outcome {
                Ok(matches) if matches.is_empty() => {}
                Ok(matches) => {
                    selection.matches.insert(path.to_owned(), matches);
                }
                Err(e) => {
                    tracing::warn!(file = %path, "context selection failed: {e}");
                    selection.failed.push(FailedFile {
                        path: path.to_owned(),
                        error: e.to_string(),
                    });
                }
            }
        }
        selection.failed.sort_by(|a, b| a.path.cmp(&b.path));
        selection
    }
}
