use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;

use crate::error::SourceError;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
}

/// One entry of a directory listing. `path` is relative to the repository root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    pub kind: EntryKind,
    pub path: String,
}

/// File content as delivered by the provider: base64, possibly line-wrapped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    pub content: String,
    pub sha: String,
}

/// Read-only access to a repository tree.
pub trait FileProvider: Send + Sync {
    /// List the immediate children of `path` (`""` is the root).
    ///
    /// Fails if the directory cannot be listed.
    fn get_tree<'a>(
        &'a self,
        path: &'a str,
        git_ref: Option<&'a str>,
    ) -> BoxFuture<'a, Result<Vec<TreeEntry>, SourceError>>;

    /// Fetch a single file. `Ok(None)` when the path does not exist or is not a file.
    fn get_file<'a>(
        &'a self,
        path: &'a str,
        git_ref: Option<&'a str>,
    ) -> BoxFuture<'a, Result<Option<RemoteFile>, SourceError>>;

    /// Branch used when no ref is requested, if the provider has one.
    fn default_ref(&self) -> BoxFuture<'_, Result<Option<String>, SourceError>>;

    /// Human-readable repository identifier (`owner/repo` or a directory path).
    fn repo_key(&self) -> String;
}

/// `owner/repo` identifier of a hosted repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoKey {
    pub owner: String,
    pub repo: String,
}

impl RepoKey {
    #[must_use]
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
        }
    }
}

impl fmt::Display for RepoKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

impl FromStr for RepoKey {
    type Err = SourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_end_matches(".git");
        let mut parts = trimmed.split('/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(owner), Some(repo), None) if !owner.is_empty() && !repo.is_empty() => {
                Ok(Self::new(owner, repo))
            }
            _ => Err(SourceError::InvalidRepoKey(s.to_owned())),
        }
    }
}
