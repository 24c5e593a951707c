//! In-memory file provider for unit tests.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use sift_source::{BoxFuture, EntryKind, FileProvider, RemoteFile, SourceError, TreeEntry};

#[derive(Debug, Default)]
pub struct StaticProvider {
    repo_key: String,
    files: BTreeMap<String, Vec<u8>>,
    failing_dirs: HashSet<String>,
    failing_files: HashSet<String>,
    raw_content: BTreeMap<String, String>,
}

impl StaticProvider {
    pub fn new(repo_key: &str) -> Self {
        Self {
            repo_key: repo_key.to_owned(),
            ..Self::default()
        }
    }

    pub fn with_file(mut self, path: &str, content: &str) -> Self {
        self.files.insert(path.to_owned(), content.as_bytes().to_vec());
        self
    }

    /// Serve `raw` verbatim as the file's base64 content.
    pub fn with_raw_file(mut self, path: &str, raw: &str) -> Self {
        self.files.insert(path.to_owned(), Vec::new());
        self.raw_content.insert(path.to_owned(), raw.to_owned());
        self
    }

    pub fn failing_dir(mut self, dir: &str) -> Self {
        self.failing_dirs.insert(dir.to_owned());
        self
    }

    pub fn failing_file(mut self, path: &str) -> Self {
        self.failing_files.insert(path.to_owned());
        self
    }

    fn children(&self, dir: &str) -> Vec<TreeEntry> {
        let prefix = if dir.is_empty() {
            String::new()
        } else {
            format!("{dir}/")
        };
        let mut dirs = BTreeSet::new();
        let mut out = Vec::new();
        for path in self.files.keys() {
            let Some(rest) = path.strip_prefix(&prefix) else {
                continue;
            };
            match rest.split_once('/') {
                None => out.push(TreeEntry {
                    kind: EntryKind::File,
                    path: path.clone(),
                }),
                Some((sub, _)) => {
                    dirs.insert(format!("{prefix}{sub}"));
                }
            }
        }
        out.extend(dirs.into_iter().map(|path| TreeEntry {
            kind: EntryKind::Dir,
            path,
        }));
        out
    }
}

impl FileProvider for StaticProvider {
    fn get_tree<'a>(
        &'a self,
        path: &'a str,
        _git_ref: Option<&'a str>,
    ) -> BoxFuture<'a, Result<Vec<TreeEntry>, SourceError>> {
        Box::pin(async move {
            if self.failing_dirs.contains(path) {
                return Err(SourceError::Other(format!("listing {path} failed")));
            }
            Ok(self.children(path))
        })
    }

    fn get_file<'a>(
        &'a self,
        path: &'a str,
        _git_ref: Option<&'a str>,
    ) -> BoxFuture<'a, Result<Option<RemoteFile>, SourceError>> {
        Box::pin(async move {
            if self.failing_files.contains(path) {
                return Err(SourceError::Other(format!("fetching {path} failed")));
            }
            let Some(bytes) = self.files.get(path) else {
                return Ok(None);
            };
            let content = self
                .raw_content
                .get(path)
                .cloned()
                .unwrap_or_else(|| STANDARD.encode(bytes));
            Ok(Some(RemoteFile {
                content,
                sha: String::new(),
            }))
        })
    }

    fn default_ref(&self) -> BoxFuture<'_, Result<Option<String>, SourceError>> {
        Box::pin(async { Ok(Some("main".to_owned())) })
    }

    fn repo_key(&self) -> String {
        self.repo_key.clone()
    }
}
