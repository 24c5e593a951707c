//! Best-effort structural hints and the payload stored with each chunk.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::chunker::Chunk;

static FUNCTION_SIGNATURE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"function\s+([A-Za-z0-9_]+)\s*\(([^)]*)\)\s*:\s*([A-Za-z0-9_]+)").unwrap()
});

static CLASS_DECLARATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"class\s+([A-Za-z0-9_]+)").unwrap());

/// First `function name(params): ReturnType` signature found in a chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSignature {
    pub name: String,
    pub params: Vec<String>,
    pub return_type: String,
}

/// Match the first typed function signature in `text`. Never fails; `None` when absent.
#[must_use]
pub fn extract_function(text: &str) -> Option<FunctionSignature> {
    let caps = FUNCTION_SIGNATURE.captures(text)?;
    let params = caps[2]
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_owned)
        .collect();
    Some(FunctionSignature {
        name: caps[1].to_owned(),
        params,
        return_type: caps[3].to_owned(),
    })
}

#[must_use]
pub fn extract_class_name(text: &str) -> Option<String> {
    CLASS_DECLARATION
        .captures(text)
        .map(|caps| caps[1].to_owned())
}

/// Metadata stored alongside a chunk's vector.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkMetadata {
    pub filepath: String,
    pub repo: String,
    pub content: String,
    pub chunk_index: usize,
    pub line_range: Option<(usize, usize)>,
    pub function_name: Option<String>,
    pub function_params: Option<String>,
    pub return_type: Option<String>,
    pub class_name: Option<String>,
    pub language: Option<String>,
}

impl ChunkMetadata {
    #[must_use]
    pub fn for_chunk(
        filepath: &str,
        repo: &str,
        chunk: &Chunk<'_>,
        chunk_index: usize,
        language: Option<&str>,
    ) -> Self {
        let signature = extract_function(chunk.text);
        let (function_name, function_params, return_type) = match signature {
            Some(sig) => (
                Some(sig.name),
                Some(sig.params.join(", ")),
                Some(sig.return_type),
            ),
            None => (None, None, None),
        };
        Self {
            filepath: filepath.to_owned(),
            repo: repo.to_owned(),
            content: chunk.text.to_owned(),
            chunk_index,
            line_range: Some((chunk.line_from, chunk.line_to)),
            function_name,
            function_params,
            return_type,
            class_name: extract_class_name(chunk.text),
            language: language.map(str::to_owned),
        }
    }

    /// Flatten into the store payload, dropping every empty or absent value.
    #[must_use]
    pub fn into_payload(self) -> BTreeMap<String, String> {
        let fields = [
            ("filepath", Some(self.filepath)),
            ("repo", Some(self.repo)),
            ("content", Some(self.content)),
            ("chunk_index", Some(self.chunk_index.to_string())),
            (
                "line_range",
                self.line_range.map(|(from, to)| format!("{from}-{to}")),
            ),
            ("function_name", self.function_name),
            ("function_params", self.function_params),
            ("return_type", self.return_type),
            ("class_name", self.class_name),
            ("language", self.language),
        ];
        fields
            .into_iter()
            .filter_map(|(k, v)| v.filter(|s| !s.is_empty()).map(|s| (k.to_owned(), s)))
            .collect()
    }
}

/// Logical record id: `{filepath}-{chunk_index}`.
#[must_use]
pub fn record_id(filepath: &str, chunk_index: usize) -> String {
    format!("{filepath}-{chunk_index}")
}
