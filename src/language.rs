//! Language Support - dialect detection and tree-sitter grammar selection
//!
//! TypeScript and JavaScript share one node vocabulary; the dialect decides which
//! grammar parses a file and which TypeScript-only constructs the extractors emit.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Source dialect of an analyzed file
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    TypeScript,
    Tsx,
    JavaScript,
    Jsx,
}

impl Dialect {
    /// Detect the dialect from a path's extension (`.d.ts` counts as TypeScript)
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");
        detect_dialect_from_extension(extension)
    }

    pub fn is_typescript(self) -> bool {
        matches!(self, Dialect::TypeScript | Dialect::Tsx)
    }

    pub fn is_javascript(self) -> bool {
        !self.is_typescript()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Dialect::TypeScript => "typescript",
            Dialect::Tsx => "tsx",
            Dialect::JavaScript => "javascript",
            Dialect::Jsx => "jsx",
        }
    }

    /// Get the tree-sitter grammar for this dialect
    pub fn tree_sitter_language(self) -> tree_sitter::Language {
        match self {
            Dialect::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            Dialect::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
            // The JavaScript grammar parses JSX natively
            Dialect::JavaScript | Dialect::Jsx => tree_sitter_javascript::LANGUAGE.into(),
        }
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Detect dialect from file extension
pub fn detect_dialect_from_extension(extension: &str) -> Option<Dialect> {
    match extension {
        "ts" | "mts" | "cts" => Some(Dialect::TypeScript),
        "tsx" => Some(Dialect::Tsx),
        "js" | "mjs" | "cjs" => Some(Dialect::JavaScript),
        "jsx" => Some(Dialect::Jsx),
        _ => None,
    }
}

/// Get tree-sitter language parser for a dialect name
pub fn get_tree_sitter_language(language: &str) -> Result<tree_sitter::Language> {
    match language {
        "typescript" => Ok(Dialect::TypeScript.tree_sitter_language()),
        "tsx" => Ok(Dialect::Tsx.tree_sitter_language()),
        "javascript" | "jsx" => Ok(Dialect::JavaScript.tree_sitter_language()),
        _ => Err(anyhow::anyhow!(
            "Unsupported language: '{}'. Supported languages: typescript, tsx, javascript, jsx",
            language
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_detect_dialects() {
        assert_eq!(
            Dialect::from_path(&PathBuf::from("src/a.ts")),
            Some(Dialect::TypeScript)
        );
        assert_eq!(
            Dialect::from_path(&PathBuf::from("src/types.d.ts")),
            Some(Dialect::TypeScript)
        );
        assert_eq!(
            Dialect::from_path(&PathBuf::from("src/App.tsx")),
            Some(Dialect::Tsx)
        );
        assert_eq!(
            Dialect::from_path(&PathBuf::from("lib/index.cjs")),
            Some(Dialect::JavaScript)
        );
        assert_eq!(
            Dialect::from_path(&PathBuf::from("ui/Button.jsx")),
            Some(Dialect::Jsx)
        );
        assert_eq!(Dialect::from_path(&PathBuf::from("README.md")), None);
    }

    #[test]
    fn test_dialect_flags() {
        assert!(Dialect::Tsx.is_typescript());
        assert!(!Dialect::Tsx.is_javascript());
        assert!(Dialect::Jsx.is_javascript());
    }

    #[test]
    fn test_grammars_load() {
        for name in ["typescript", "tsx", "javascript", "jsx"] {
            let language = get_tree_sitter_language(name).unwrap();
            let mut parser = tree_sitter::Parser::new();
            parser.set_language(&language).unwrap();
        }
        assert!(get_tree_sitter_language("python").is_err());
    }
}
