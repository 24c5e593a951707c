//! Repository enumeration over a [`FileProvider`] and extension filtering.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use futures::{StreamExt, TryStreamExt, stream};
use sift_source::{EntryKind, FileProvider};

use crate::error::{IndexError, Result};
use crate::languages::classify;
use crate::types::SourceFile;

/// Directory listings issued concurrently per tree level.
const LIST_CONCURRENCY: usize = 8;

/// Walks a repository tree exposed by a file provider.
#[derive(Clone)]
pub struct RepositoryWalker {
    provider: Arc<dyn FileProvider>,
}

impl std::fmt::Debug for RepositoryWalker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepositoryWalker")
            .field("repo", &self.provider.repo_key())
            .finish()
    }
}

impl RepositoryWalker {
    #[must_use]
    pub fn new(provider: Arc<dyn FileProvider>) -> Self {
        Self { provider }
    }

    #[must_use]
    pub fn provider(&self) -> &dyn FileProvider {
        self.provider.as_ref()
    }

    /// Every file path reachable from `root`, sorted and deduplicated.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Fetch`] if any directory cannot be listed; a partial
    /// listing is never returned.
    pub async fn list_files(&self, root: &str, git_ref: Option<&str>) -> Result<Vec<String>> {
        let root = root.trim_matches('/').to_owned();
        let mut files = BTreeSet::new();
        let mut visited = HashSet::from([root.clone()]);
        let mut frontier = vec![root];

        while !frontier.is_empty() {
            let provider = &self.provider;
            let listings: Vec<_> = stream::iter(std::mem::take(&mut frontier))
                .map(|dir| async move {
                    provider.get_tree(&dir, git_ref).await.map_err(|e| {
                        tracing::warn!(dir = %dir, "cannot list directory: {e}");
                        IndexError::Fetch(e)
                    })
                })
                .buffer_unordered(LIST_CONCURRENCY)
                .try_collect()
                .await?;

            for entry in listings.into_iter().flatten() {
                match entry.kind {
                    EntryKind::File => {
                        files.insert(entry.path);
                    }
                    EntryKind::Dir => {
                        if visited.insert(entry.path.clone()) {
                            frontier.push(entry.path);
                        }
                    }
                }
            }
        }

        tracing::debug!(files = files.len(), dirs = visited.len(), "repository listed");
        Ok(files.into_iter().collect())
    }

    /// Keep paths with a supported source extension. Each rejected path is logged with its reason.
    #[must_use]
    pub fn filter_supported(paths: &[String]) -> Vec<String> {
        paths
            .iter()
            .filter(|path| match classify(path) {
                Ok(_) => true,
                Err(reason) => {
                    tracing::info!(file = %path, %reason, "filtered out");
                    false
                }
            })
            .cloned()
            .collect()
    }

    /// Fetch and decode one file. `Ok(None)` when the provider has no such file.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Fetch`] if the provider call fails or
    /// [`IndexError::Decode`] if the content is not valid base64.
    pub async fn fetch(&self, path: &str, git_ref: Option<&str>) -> Result<Option<SourceFile>> {
        let Some(remote) = self.provider.get_file(path, git_ref).await? else {
            return Ok(None);
        };
        let content = decode_content(path, &remote.content)?;
        Ok(Some(SourceFile {
            path: path.to_owned(),
            content,
            repo_key: self.provider.repo_key(),
        }))
    }
}

/// Decode provider base64, ignoring line wrapping. Invalid UTF-8 is replaced.
///
/// # Errors
///
/// Returns [`IndexError::Decode`] if `raw` is not valid base64.
pub fn decode_content(path: &str, raw: &str) -> Result<String> {
    let compact: Vec<u8> = raw
        .bytes()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    let bytes = STANDARD.decode(compact).map_err(|source| IndexError::Decode {
        path: path.to_owned(),
        source,
    })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StaticProvider;

    fn walker(provider: StaticProvider) -> RepositoryWalker {
        RepositoryWalker::new(Arc::new(provider))
    }

    #[tokio::test]
    async fn list_files_recurses_all_levels() {
        let w = walker(
            StaticProvider::new("octo/widgets")
                .with_file("README.md", "# hi")
                .with_file("src/index.ts", "export {}")
                .with_file("src/util/math.ts", "export const x = 1;")
                .with_file("src/util/deep/more.py", "x = 1"),
        );
        let files = w.list_files("", None).await.unwrap();
        assert_eq!(
            files,
            vec![
                "README.md",
                "src/index.ts",
                "src/util/deep/more.py",
                "src/util/math.ts"
            ]
        );
    }

    #[tokio::test]
    async fn list_files_from_subtree() {
        let w = walker(
            StaticProvider::new("o/r")
                .with_file("a.ts", "a")
                .with_file("lib/b.ts", "b"),
        );
        assert_eq!(w.list_files("lib", None).await.unwrap(), vec!["lib/b.ts"]);
    }

    #[tokio::test]
    async fn unlistable_subtree_fails_whole_listing() {
        let w = walker(
            StaticProvider::new("o/r")
                .with_file("a.ts", "a")
                .with_file("broken/b.ts", "b")
                .failing_dir("broken"),
        );
        let err = w.list_files("", None).await.unwrap_err();
        assert!(matches!(err, IndexError::Fetch(_)));
    }

    #[test]
    fn filter_supported_keeps_code_only() {
        let paths: Vec<String> = ["src/a.ts", "README.md", "Makefile", "lib/b.RS", "img.png"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(
            RepositoryWalker::filter_supported(&paths),
            vec!["src/a.ts", "lib/b.RS"]
        );
    }

    #[tokio::test]
    async fn fetch_decodes_and_tags_repo() {
        let w = walker(StaticProvider::new("octo/widgets").with_file("a.py", "print('hi')\n"));
        let file = w.fetch("a.py", Some("main")).await.unwrap().unwrap();
        assert_eq!(file.content, "print('hi')\n");
        assert_eq!(file.repo_key, "octo/widgets");
        assert!(w.fetch("missing.py", None).await.unwrap().is_none());
    }

    #[test]
    fn decode_content_ignores_line_wrapping() {
        assert_eq!(decode_content("a", "Y29uc3Qg\neCA9IDE7\n").unwrap(), "const x = 1;");
    }

    #[test]
    fn decode_content_replaces_invalid_utf8() {
        let raw = STANDARD.encode([b'o', b'k', 0xFF]);
        assert_eq!(decode_content("a", &raw).unwrap(), "ok\u{FFFD}");
    }

    #[test]
    fn decode_content_rejects_invalid_base64() {
        let err = decode_content("src/a.ts", "!!not base64!!").unwrap_err();
        assert!(matches!(err, IndexError::Decode { ref path, .. } if path == "src/a.ts"));
    }
}
