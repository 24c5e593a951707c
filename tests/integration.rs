use std::path::Path;
use std::sync::Arc;

use sift_core::Config;
use sift_core::bootstrap::{create_local_provider, create_store, indexer_config, selector_config};
use sift_core::config::StoreBackend;
use sift_index::{
    CodeIndexer, ContextSelector, QueryEngine, RepositoryWalker, SourceFile, format_as_context,
};
use sift_llm::mock::MockEmbedder;

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

fn retry_helper(name: &str) -> String {
    format!(
        "export async function {name}(request: Request, attempts: number): Promise<Response> {{\n\
         \x20   let lastError: Error | undefined;\n\
         \x20   for (let attempt = 0; attempt < attempts; attempt++) {{\n\
         \x20       try {{\n\
         \x20           const response = await fetch(request.clone());\n\
         \x20           if (response.status < 500) return response;\n\
         \x20       }} catch (error) {{\n\
         \x20           lastError = error as Error;\n\
         \x20       }}\n\
         \x20       await sleep(backoffDelay(attempt));\n\
         \x20   }}\n\
         \x20   throw lastError ?? new Error(\"retries exhausted\");\n\
         }}\n"
    )
}

fn memory_config(dir: &Path) -> Config {
    let path = dir.join("sift.toml");
    std::fs::write(
        &path,
        "[store]\nbackend = \"memory\"\nnamespace = \"review\"\n\n[index]\nchunk_size = 4000\nchunk_overlap = 100\n",
    )
    .unwrap();
    let config = Config::load(&path).unwrap();
    config.validate().unwrap();
    config
}

#[tokio::test]
async fn configured_pipeline_selects_related_code() {
    let config_dir = tempfile::tempdir().unwrap();
    let config = memory_config(config_dir.path());
    assert_eq!(config.store.backend, StoreBackend::Memory);

    let repo = tempfile::tempdir().unwrap();
    write(repo.path(), "src/http/retry.ts", &retry_helper("fetchWithRetry"));
    write(repo.path(), "src/api/client.ts", &retry_helper("requestWithRetry"));
    write(
        repo.path(),
        "src/ui/banner.tsx",
        "export const Banner = () => <h1>Spring sale: everything half price this weekend</h1>;\n",
    );

    let store = create_store(&config).unwrap();
    let embedder = Arc::new(MockEmbedder::hashed(256));
    let walker = RepositoryWalker::new(Arc::new(create_local_provider(repo.path()).unwrap()));

    let report = CodeIndexer::new(Arc::clone(&store), Arc::clone(&embedder), indexer_config(&config))
        .index_repository(&walker, "", None)
        .await
        .unwrap();
    assert_eq!(report.files_indexed, 3);
    assert_eq!(report.records_written, 3);

    let reviewed = walker.fetch("src/api/client.ts", None).await.unwrap().unwrap();
    let selector = ContextSelector::new(
        QueryEngine::new(store, embedder, config.store.namespace.clone()),
        selector_config(&config),
    );
    let selection = selector.select_context(&[reviewed]).await;

    let related = &selection.matches["src/api/client.ts"];
    assert_eq!(related.len(), 1);
    assert_eq!(related[0].filepath, "src/http/retry.ts");

    let prompt = format_as_context(&selection);
    assert!(prompt.contains("fetchWithRetry"));
    assert!(!prompt.contains("Spring sale"));
}

#[tokio::test]
async fn namespaces_do_not_leak() {
    let config_dir = tempfile::tempdir().unwrap();
    let config = memory_config(config_dir.path());
    let store = create_store(&config).unwrap();
    let embedder = Arc::new(MockEmbedder::hashed(256));

    let mut indexer_cfg = indexer_config(&config);
    indexer_cfg.namespace = "other-team".into();
    CodeIndexer::new(Arc::clone(&store), Arc::clone(&embedder), indexer_cfg)
        .index_file(&SourceFile::new("lib/retry.ts", retry_helper("fetchWithRetry"), "acme/web"))
        .await
        .unwrap();

    let selector = ContextSelector::new(
        QueryEngine::new(store, embedder, config.store.namespace.clone()),
        selector_config(&config),
    );
    let selection = selector
        .select_context(&[SourceFile::new(
            "src/client.ts",
            retry_helper("requestWithRetry"),
            "acme/web",
        )])
        .await;
    assert!(selection.is_empty());
}
