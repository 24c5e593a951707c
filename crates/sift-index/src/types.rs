use serde::Serialize;

/// A file ready for chunking: decoded text plus where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: String,
    pub content: String,
    /// `owner/repo` of the repository the file belongs to.
    pub repo_key: String,
}

impl SourceFile {
    #[must_use]
    pub fn new(
        path: impl Into<String>,
        content: impl Into<String>,
        repo_key: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            repo_key: repo_key.into(),
        }
    }
}

/// One ranked hit from a similarity query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    pub id: String,
    pub content: String,
    pub filepath: String,
    pub repo: String,
    pub score: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_range: Option<(usize, usize)>,
}

/// Parse a `"{from}-{to}"` line range.
#[must_use]
pub fn parse_line_range(s: &str) -> Option<(usize, usize)> {
    let (from, to) = s.split_once('-')?;
    Some((from.trim().parse().ok()?, to.trim().parse().ok()?))
}
