use std::time::Duration;

use reqwest::{StatusCode, Url};
use serde::Deserialize;

use crate::error::{Result, SourceError};
use crate::provider::{BoxFuture, EntryKind, FileProvider, RemoteFile, RepoKey, TreeEntry};

const DEFAULT_API_URL: &str = "https://api.github.com";
const API_VERSION: &str = "2022-11-28";
const FILES_PER_PAGE: usize = 100;
/// The contents API silently cuts directory listings at this many entries.
const CONTENTS_DIR_LIMIT: usize = 1000;

/// File provider backed by the GitHub REST contents API.
#[derive(Clone)]
pub struct GitHubProvider {
    client: reqwest::Client,
    api_url: String,
    repo: RepoKey,
    token: Option<String>,
}

impl std::fmt::Debug for GitHubProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubProvider")
            .field("api_url", &self.api_url)
            .field("repo", &self.repo)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// A file touched by a pull request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChangedFile {
    #[serde(rename = "filename")]
    pub path: String,
    pub status: String,
}

impl ChangedFile {
    #[must_use]
    pub fn is_removed(&self) -> bool {
        self.status == "removed"
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequest {
    pub number: u64,
    pub head_sha: String,
    pub files: Vec<ChangedFile>,
}

#[derive(Deserialize)]
struct ContentEntry {
    #[serde(rename = "type")]
    kind: String,
    path: String,
}

#[derive(Deserialize)]
struct FileContent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    content: String,
    /// `"none"` for files too large for the contents API.
    #[serde(default)]
    encoding: Option<String>,
    sha: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ContentsResponse {
    Dir(Vec<ContentEntry>),
    File(FileContent),
}

#[derive(Deserialize)]
struct RepoInfo {
    default_branch: Option<String>,
}

#[derive(Deserialize)]
struct PullInfo {
    head: PullHead,
}

#[derive(Deserialize)]
struct PullHead {
    sha: String,
}

impl GitHubProvider {
    #[must_use]
    pub fn new(repo: RepoKey, token: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .timeout(Duration::from_secs(60))
            .user_agent(concat!("sift/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("failed to build GitHub HTTP client, using defaults: {e}");
                reqwest::Client::new()
            });
        Self {
            client,
            api_url: DEFAULT_API_URL.to_owned(),
            repo,
            token: token.filter(|t| !t.is_empty()),
        }
    }

    /// Override the API base URL (GitHub Enterprise, tests).
    #[must_use]
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into().trim_end_matches('/').to_owned();
        self
    }

    #[must_use]
    pub fn repo(&self) -> &RepoKey {
        &self.repo
    }

    fn url(&self, segments: &[&str], git_ref: Option<&str>) -> Result<Url> {
        let mut url =
            Url::parse(&self.api_url).map_err(|e| SourceError::InvalidUrl(e.to_string()))?;
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|()| SourceError::InvalidUrl(self.api_url.clone()))?;
            path.pop_if_empty()
                .extend(["repos", self.repo.owner.as_str(), self.repo.repo.as_str()])
                .extend(segments.iter().filter(|s| !s.is_empty()));
        }
        if let Some(r) = git_ref {
            url.query_pairs_mut().append_pair("ref", r);
        }
        Ok(url)
    }

    fn contents_url(&self, path: &str, git_ref: Option<&str>) -> Result<Url> {
        let mut segments = vec!["contents"];
        segments.extend(path.trim_matches('/').split('/'));
        self.url(&segments, git_ref)
    }

    async fn get(&self, url: Url) -> Result<reqwest::Response> {
        let mut req = self
            .client
            .get(url)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION);
        if let Some(ref token) = self.token {
            req = req.bearer_auth(token);
        }
        Ok(req.send().await?)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: Url) -> Result<Option<T>> {
        let url_str = url.to_string();
        let resp = self.get(url).await?;
        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            tracing::warn!(url = %url_str, status = status.as_u16(), "GitHub API error");
            return Err(SourceError::Status {
                url: url_str,
                status: status.as_u16(),
            });
        }
        let bytes = resp.bytes().await?;
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    async fn list_dir(&self, path: &str, git_ref: Option<&str>) -> Result<Vec<TreeEntry>> {
        let url = self.contents_url(path, git_ref)?;
        match self.get_json::<ContentsResponse>(url).await? {
            None => Err(SourceError::NotFound(path.to_owned())),
            Some(ContentsResponse::File(_)) => Err(SourceError::NotADirectory(path.to_owned())),
            Some(ContentsResponse::Dir(entries)) if entries.len() >= CONTENTS_DIR_LIMIT => {
                tracing::warn!(dir = %path, entries = entries.len(), "directory listing truncated");
                Err(SourceError::Truncated(path.to_owned()))
            }
            Some(ContentsResponse::Dir(entries)) => Ok(entries
                .into_iter()
                .filter_map(|e| {
                    let kind = match e.kind.as_str() {
                        "file" => EntryKind::File,
                        "dir" => EntryKind::Dir,
                        other => {
                            tracing::debug!(path = %e.path, kind = other, "skipping tree entry");
                            return None;
                        }
                    };
                    Some(TreeEntry { kind, path: e.path })
                })
                .collect()),
        }
    }

    async fn fetch_file(&self, path: &str, git_ref: Option<&str>) -> Result<Option<RemoteFile>> {
        let url = self.contents_url(path, git_ref)?;
        match self.get_json::<ContentsResponse>(url).await? {
            Some(ContentsResponse::File(f)) if f.encoding.as_deref() == Some("none") => {
                tracing::warn!(file = %path, "file too large for the contents API, skipping");
                Ok(None)
            }
            Some(ContentsResponse::File(f)) if f.kind == "file" => Ok(Some(RemoteFile {
                content: f.content,
                sha: f.sha,
            })),
            _ => Ok(None),
        }
    }

    async fn fetch_default_branch(&self) -> Result<Option<String>> {
        let url = self.url(&[], None)?;
        let info = self
            .get_json::<RepoInfo>(url)
            .await?
            .ok_or_else(|| SourceError::NotFound(self.repo.to_string()))?;
        Ok(info.default_branch)
    }

    /// Head commit and changed files of pull request `number`.
    ///
    /// # Errors
    ///
    /// Returns an error if the pull request does not exist or the API call fails.
    pub async fn pull_request(&self, number: u64) -> Result<PullRequest> {
        let n = number.to_string();
        let info = self
            .get_json::<PullInfo>(self.url(&["pulls", n.as_str()], None)?)
            .await?
            .ok_or_else(|| SourceError::NotFound(format!("{}#{number}", self.repo)))?;

        let mut files = Vec::new();
        let mut page = 1u32;
        loop {
            let mut url = self.url(&["pulls", n.as_str(), "files"], None)?;
            url.query_pairs_mut()
                .append_pair("per_page", &FILES_PER_PAGE.to_string())
                .append_pair("page", &page.to_string());
            let batch: Vec<ChangedFile> = self.get_json(url).await?.unwrap_or_default();
            let last = batch.len() < FILES_PER_PAGE;
            files.extend(batch);
            if last {
                break;
            }
            page += 1;
        }

        tracing::debug!(pr = number, files = files.len(), head = %info.head.sha, "fetched pull request");
        Ok(PullRequest {
            number,
            head_sha: info.head.sha,
            files,
        })
    }
}

impl FileProvider for GitHubProvider {
    fn get_tree<'a>(
        &'a self,
        path: &'a str,
        git_ref: Option<&'a str>,
    ) -> BoxFuture<'a, Result<Vec<TreeEntry>>> {
        Box::pin(self.list_dir(path, git_ref))
    }

    fn get_file<'a>(
        &'a self,
        path: &'a str,
        git_ref: Option<&'a str>,
    ) -> BoxFuture<'a, Result<Option<RemoteFile>>> {
        Box::pin(self.fetch_file(path, git_ref))
    }

    fn default_ref(&self) -> BoxFuture<'_, Result<Option<String>>> {
        Box::pin(self.fetch_default_branch())
    }

    fn repo_key(&self) -> String {
        self.repo.to_string()
    }
}
