use std::sync::Arc;

use anyhow::Context;
use futures::{StreamExt, stream};
use sift_core::Config;
use sift_core::bootstrap::{
    create_embedder, create_github_provider, create_local_provider, create_store,
    indexer_config, selector_config,
};
use sift_index::{
    CodeIndexer, ContextSelection, ContextSelector, FailedFile, IndexReport, QueryEngine,
    RepositoryWalker, SourceFile, format_as_context,
};
use sift_llm::{AnyEmbedder, StatusTx};
use sift_source::FileProvider;
use sift_store::VectorStore;

use crate::{OutputFormat, SourceArgs};

const FETCH_CONCURRENCY: usize = 8;

/// Forward side-channel status messages to the log.
fn spawn_status_logger() -> StatusTx {
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<String>();
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            tracing::debug!(status = %msg);
        }
    });
    tx
}

struct Pipeline {
    store: Arc<dyn VectorStore>,
    embedder: Arc<AnyEmbedder>,
    status_tx: StatusTx,
}

impl Pipeline {
    fn new(config: &Config) -> anyhow::Result<Self> {
        let status_tx = spawn_status_logger();
        Ok(Self {
            store: create_store(config)?,
            embedder: Arc::new(create_embedder(config, Some(status_tx.clone()))?),
            status_tx,
        })
    }

    fn indexer(&self, config: &Config) -> CodeIndexer<AnyEmbedder> {
        CodeIndexer::new(
            Arc::clone(&self.store),
            Arc::clone(&self.embedder),
            indexer_config(config),
        )
        .with_status_tx(self.status_tx.clone())
    }

    fn selector(&self, config: &Config) -> ContextSelector<AnyEmbedder> {
        let engine = QueryEngine::new(
            Arc::clone(&self.store),
            Arc::clone(&self.embedder),
            config.store.namespace.clone(),
        );
        ContextSelector::new(engine, selector_config(config))
    }
}

fn open_provider(config: &Config, source: &SourceArgs) -> anyhow::Result<Arc<dyn FileProvider>> {
    match (&source.location.repo, &source.location.path) {
        (Some(repo), _) => Ok(Arc::new(create_github_provider(config, repo)?)),
        (None, Some(path)) => Ok(Arc::new(create_local_provider(path)?)),
        (None, None) => anyhow::bail!("either --repo or --path is required"),
    }
}

/// Fetch files, splitting them into loaded files and per-file failures.
async fn fetch_files(
    walker: &RepositoryWalker,
    paths: &[String],
    git_ref: Option<&str>,
) -> (Vec<SourceFile>, Vec<FailedFile>) {
    let results: Vec<_> = stream::iter(paths)
        .map(|path| async move { (path, walker.fetch(path, git_ref).await) })
        .buffered(FETCH_CONCURRENCY)
        .collect()
        .await;

    let mut files = Vec::new();
    let mut failed = Vec::new();
    for (path, result) in results {
        match result {
            Ok(Some(file)) => files.push(file),
            Ok(None) => failed.push(FailedFile {
                path: path.clone(),
                error: "file not found".into(),
            }),
            Err(e) => failed.push(FailedFile {
                path: path.clone(),
                error: e.to_string(),
            }),
        }
    }
    (files, failed)
}

fn print_report(report: &IndexReport) {
    println!(
        "listed {} files ({} filtered out): {} indexed, {} skipped, {} failed, {} records written in {} ms",
        report.files_listed,
        report.files_filtered_out,
        report.files_indexed,
        report.files_skipped,
        report.files_failed.len(),
        report.records_written,
        report.duration_ms,
    );
    for (path, error) in &report.files_failed {
        println!("  failed: {path}: {error}");
    }
}

fn print_selection(selection: &ContextSelection, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(selection)
                .context("failed to serialize context selection")?;
            println!("{json}");
        }
        OutputFormat::Xml => {
            print!("{}", format_as_context(selection));
            for failed in &selection.failed {
                eprintln!("context selection failed for {}: {}", failed.path, failed.error);
            }
        }
    }
    Ok(())
}

pub(crate) async fn index(config: &Config, source: &SourceArgs) -> anyhow::Result<()> {
    let pipeline = Pipeline::new(config)?;
    let walker = RepositoryWalker::new(open_provider(config, source)?);
    let report = pipeline
        .indexer(config)
        .index_repository(&walker, "", source.git_ref.as_deref())
        .await
        .context("repository indexing failed")?;
    print_report(&report);
    Ok(())
}

pub(crate) async fn context(
    config: &Config,
    source: &SourceArgs,
    paths: &[String],
    format: OutputFormat,
) -> anyhow::Result<()> {
    let pipeline = Pipeline::new(config)?;
    let walker = RepositoryWalker::new(open_provider(config, source)?);
    let (files, fetch_failed) = fetch_files(&walker, paths, source.git_ref.as_deref()).await;

    let mut selection = pipeline.selector(config).select_context(&files).await;
    selection.failed.extend(fetch_failed);
    selection.failed.sort_by(|a, b| a.path.cmp(&b.path));
    print_selection(&selection, format)
}

pub(crate) async fn review(
    config: &Config,
    repo: &str,
    number: u64,
    index_changed: bool,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let pipeline = Pipeline::new(config)?;
    let github = Arc::new(create_github_provider(config, repo)?);
    let pr = github
        .pull_request(number)
        .await
        .with_context(|| format!("failed to load pull request #{number} of {repo}"))?;

    let changed: Vec<String> = pr
        .files
        .iter()
        .filter(|f| !f.is_removed())
        .map(|f| f.path.clone())
        .collect();
    let reviewable = RepositoryWalker::filter_supported(&changed);
    tracing::info!(
        pr = number,
        head = %pr.head_sha,
        changed = pr.files.len(),
        reviewable = reviewable.len(),
        "pull request loaded"
    );

    let walker = RepositoryWalker::new(github);
    let (files, fetch_failed) = fetch_files(&walker, &reviewable, Some(pr.head_sha.as_str())).await;

    if index_changed {
        let report = pipeline.indexer(config).index_files(&files).await;
        tracing::info!(
            indexed = report.files_indexed,
            failed = report.files_failed.len(),
            records = report.records_written,
            "changed files re-indexed"
        );
    }

    let mut selection = pipeline.selector(config).select_context(&files).await;
    selection.failed.extend(fetch_failed);
    selection.failed.sort_by(|a, b| a.path.cmp(&b.path));
    print_selection(&selection, format)
}
