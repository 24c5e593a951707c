//! Source-extension allow-list and language detection.

use std::path::Path;

/// Languages whose files are indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lang {
    TypeScript,
    JavaScript,
    Python,
    Java,
    Cpp,
    C,
    CSharp,
    Go,
    Rust,
    Php,
    Ruby,
    Swift,
    Kotlin,
}

impl Lang {
    /// Identifier stored in chunk metadata.
    #[must_use]
    pub fn id(self) -> &'static str {
        match self {
            Self::TypeScript => "typescript",
            Self::JavaScript => "javascript",
            Self::Python => "python",
            Self::Java => "java",
            Self::Cpp => "cpp",
            Self::C => "c",
            Self::CSharp => "csharp",
            Self::Go => "go",
            Self::Rust => "rust",
            Self::Php => "php",
            Self::Ruby => "ruby",
            Self::Swift => "swift",
            Self::Kotlin => "kotlin",
        }
    }

    fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "ts" | "tsx" => Some(Self::TypeScript),
            "js" | "jsx" => Some(Self::JavaScript),
            "py" => Some(Self::Python),
            "java" => Some(Self::Java),
            "cpp" => Some(Self::Cpp),
            "c" => Some(Self::C),
            "cs" => Some(Self::CSharp),
            "go" => Some(Self::Go),
            "rs" => Some(Self::Rust),
            "php" => Some(Self::Php),
            "rb" => Some(Self::Ruby),
            "swift" => Some(Self::Swift),
            "kt" => Some(Self::Kotlin),
            _ => None,
        }
    }
}

impl std::fmt::Display for Lang {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

/// Why a path was excluded from indexing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Skip {
    NoExtension,
    Unsupported(String),
}

impl std::fmt::Display for Skip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoExtension => f.write_str("no extension"),
            Self::Unsupported(ext) => write!(f, "unsupported extension .{ext}"),
        }
    }
}

/// Classify `path` against the allow-list. Extensions compare case-insensitively.
///
/// # Errors
///
/// Returns the reason the path is not indexable.
pub fn classify(path: &str) -> Result<Lang, Skip> {
    let ext = Path::new(path)
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .ok_or(Skip::NoExtension)?;
    Lang::from_extension(&ext).ok_or(Skip::Unsupported(ext))
}

#[must_use]
pub fn detect_language(path: &str) -> Option<Lang> {
    classify(path).ok()
}

#[must_use]
pub fn is_supported(path: &str) -> bool {
    classify(path).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_fifteen_extensions_supported() {
        for ext in [
            "ts", "tsx", "js", "jsx", "py", "java", "cpp", "c", "cs", "go", "rs", "php", "rb",
            "swift", "kt",
        ] {
            assert!(is_supported(&format!("src/file.{ext}")), "{ext}");
        }
    }

    #[test]
    fn extension_is_case_insensitive() {
        assert_eq!(detect_language("App.TSX"), Some(Lang::TypeScript));
        assert_eq!(detect_language("lib/Main.Kt"), Some(Lang::Kotlin));
    }

    #[test]
    fn no_extension_is_skipped() {
        assert_eq!(classify("Makefile"), Err(Skip::NoExtension));
        assert_eq!(classify("bin/run"), Err(Skip::NoExtension));
        assert_eq!(classify("weird."), Err(Skip::NoExtension));
    }

    #[test]
    fn unsupported_extension_is_skipped_with_reason() {
        let reason = classify("docs/README.md").unwrap_err();
        assert_eq!(reason, Skip::Unsupported("md".into()));
        assert_eq!(reason.to_string(), "unsupported extension .md");
    }

    #[test]
    fn dotted_directory_does_not_count_as_extension() {
        assert_eq!(classify("v1.2/LICENSE"), Err(Skip::NoExtension));
        assert_eq!(detect_language("v1.2/main.go"), Some(Lang::Go));
    }

    #[test]
    fn lang_display_matches_id() {
        assert_eq!(Lang::CSharp.to_string(), "csharp");
    }
}
