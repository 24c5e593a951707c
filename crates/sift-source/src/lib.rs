//! Repository file providers.
//!
//! A [`FileProvider`] lists one directory level at a time and fetches single
//! files as base64 content, the shape returned by the GitHub contents API.

pub mod error;
pub mod github;
pub mod local;
pub mod provider;

pub use error::SourceError;
pub use github::{ChangedFile, GitHubProvider, PullRequest};
pub use local::LocalProvider;
pub use provider::{BoxFuture, EntryKind, FileProvider, RemoteFile, RepoKey, TreeEntry};
