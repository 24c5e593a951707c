use std::path::{Component, Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::error::{Result, SourceError};
use crate::provider::{BoxFuture, EntryKind, FileProvider, RemoteFile, TreeEntry};

/// File provider over a local checkout. Honors `.gitignore` and skips hidden entries.
/// Refs are ignored: the working tree is served as-is.
#[derive(Debug, Clone)]
pub struct LocalProvider {
    root: PathBuf,
    repo_key: String,
}

impl LocalProvider {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let repo_key = root
            .canonicalize()
            .ok()
            .as_deref()
            .unwrap_or(&root)
            .file_name()
            .map_or_else(|| root.display().to_string(), |n| n.to_string_lossy().into_owned());
        Self { root, repo_key }
    }

    /// Override the repository identifier stored with indexed chunks.
    #[must_use]
    pub fn with_repo_key(mut self, key: impl Into<String>) -> Self {
        self.repo_key = key.into();
        self
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Result<PathBuf> {
        let rel = Path::new(path.trim_start_matches("./"));
        if rel
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(SourceError::InvalidPath(path.to_owned()));
        }
        Ok(self.root.join(rel))
    }

    async fn list_dir(&self, path: &str) -> Result<Vec<TreeEntry>> {
        let dir = self.resolve(path)?;
        let meta = match tokio::fs::metadata(&dir).await {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(SourceError::NotFound(path.to_owned()));
            }
            Err(e) => return Err(e.into()),
        };
        if !meta.is_dir() {
            return Err(SourceError::NotADirectory(path.to_owned()));
        }

        let root = self.root.clone();
        tokio::task::spawn_blocking(move || walk_one_level(&root, &dir))
            .await
            .map_err(|e| SourceError::Other(format!("directory walk task failed: {e}")))?
    }

    async fn read_file(&self, path: &str) -> Result<Option<RemoteFile>> {
        let full = self.resolve(path)?;
        match tokio::fs::metadata(&full).await {
            Ok(m) if m.is_file() => {}
            Ok(_) => return Ok(None),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        }
        let bytes = tokio::fs::read(&full).await?;
        Ok(Some(RemoteFile {
            sha: blake3::hash(&bytes).to_hex().to_string(),
            content: STANDARD.encode(&bytes),
        }))
    }
}

fn walk_one_level(root: &Path, dir: &Path) -> Result<Vec<TreeEntry>> {
    let walker = ignore::WalkBuilder::new(dir)
        .max_depth(Some(1))
        .hidden(true)
        .require_git(false)
        .build();

    let mut entries = Vec::new();
    for entry in walker {
        let entry = entry?;
        if entry.depth() == 0 {
            continue;
        }
        let kind = match entry.file_type() {
            Some(ft) if ft.is_dir() => EntryKind::Dir,
            Some(ft) if ft.is_file() => EntryKind::File,
            _ => continue,
        };
        let Ok(rel) = entry.path().strip_prefix(root) else {
            continue;
        };
        let path = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        entries.push(TreeEntry { kind, path });
    }
    entries.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(entries)
}

impl FileProvider for LocalProvider {
    fn get_tree<'a>(
        &'a self,
        path: &'a str,
        _git_ref: Option<&'a str>,
    ) -> BoxFuture<'a, Result<Vec<TreeEntry>>> {
        Box::pin(self.list_dir(path))
    }

    fn get_file<'a>(
        &'a self,
        path: &'a str,
        _git_ref: Option<&'a str>,
    ) -> BoxFuture<'a, Result<Option<RemoteFile>>> {
        Box::pin(self.read_file(path))
    }

    fn default_ref(&self) -> BoxFuture<'_, Result<Option<String>>> {
        Box::pin(async { Ok(None) })
    }

    fn repo_key(&self) -> String {
        self.repo_key.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(root: &Path, rel: &str, content: &str) {
        let p = root.join(rel);
        std::fs::create_dir_all(p.parent().unwrap()).unwrap();
        std::fs::write(p, content).unwrap();
    }

    #[tokio::test]
    async fn get_tree_lists_one_level_sorted() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "b.ts", "b");
        write(dir.path(), "a.ts", "a");
        write(dir.path(), "src/lib.rs", "fn main() {}");

        let p = LocalProvider::new(dir.path());
        let tree = p.get_tree("", None).await.unwrap();
        assert_eq!(
            tree,
            vec![
                TreeEntry { kind: EntryKind::File, path: "a.ts".into() },
                TreeEntry { kind: EntryKind::File, path: "b.ts".into() },
                TreeEntry { kind: EntryKind::Dir, path: "src".into() },
            ]
        );

        let sub = p.get_tree("src", None).await.unwrap();
        assert_eq!(sub, vec![TreeEntry { kind: EntryKind::File, path: "src/lib.rs".into() }]);
    }

    #[tokio::test]
    async fn get_tree_respects_gitignore_and_hidden() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), ".gitignore", "target/\n*.log\n");
        write(dir.path(), "target/out.rs", "x");
        write(dir.path(), "debug.log", "x");
        write(dir.path(), ".env", "SECRET=1");
        write(dir.path(), "main.go", "package main");

        let tree = LocalProvider::new(dir.path()).get_tree("", None).await.unwrap();
        let paths: Vec<_> = tree.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["main.go"]);
    }

    #[tokio::test]
    async fn get_tree_missing_dir_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = LocalProvider::new(dir.path())
            .get_tree("nope", None)
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::NotFound(_)));
    }

    #[tokio::test]
    async fn get_file_returns_base64_and_none_for_missing() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "src/a.py", "def f():\n    pass\n");
        let p = LocalProvider::new(dir.path());

        let file = p.get_file("src/a.py", Some("main")).await.unwrap().unwrap();
        let decoded = STANDARD.decode(&file.content).unwrap();
        assert_eq!(decoded, b"def f():\n    pass\n");
        assert_eq!(file.sha.len(), 64);

        assert!(p.get_file("src/missing.py", None).await.unwrap().is_none());
        assert!(p.get_file("src", None).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn parent_traversal_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let p = LocalProvider::new(dir.path());
        assert!(matches!(
            p.get_file("../etc/passwd", None).await,
            Err(SourceError::InvalidPath(_))
        ));
    }

    #[tokio::test]
    async fn default_ref_is_none_and_repo_key_overridable() {
        let dir = tempfile::tempdir().unwrap();
        let p = LocalProvider::new(dir.path()).with_repo_key("octo/widgets");
        assert!(p.default_ref().await.unwrap().is_none());
        assert_eq!(p.repo_key(), "octo/widgets");
    }
}
