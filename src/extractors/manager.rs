//! ExtractorManager - Public API for per-file extraction
//!
//! Handles reading and parsing and delegates the passes to the factory. Each
//! call owns its parser and tree, so one manager can be shared by every
//! worker of a parallel run.

use std::path::Path;
use tree_sitter::Parser;

use crate::error::ExtractionError;
use crate::extractors::base::FileExtraction;
use crate::language::Dialect;

/// Stateless entry point for extracting one file
#[derive(Debug, Default, Clone, Copy)]
pub struct ExtractorManager {}

impl ExtractorManager {
    pub fn new() -> Self {
        Self {}
    }

    /// Dialects this manager can parse
    pub fn supported_languages(&self) -> Vec<&'static str> {
        vec!["typescript", "tsx", "javascript", "jsx"]
    }

    /// Read `path` from disk and extract it, storing it as `stored_path`
    pub fn extract_file(
        &self,
        path: &Path,
        stored_path: &str,
    ) -> Result<FileExtraction, ExtractionError> {
        let dialect = self.dialect_of(stored_path)?;
        let content = crate::utils::file_utils::read_file_content(path).map_err(|error| {
            ExtractionError::Unreadable {
                path: path.to_path_buf(),
                source: error
                    .downcast::<std::io::Error>()
                    .unwrap_or_else(|other| std::io::Error::other(other.to_string())),
            }
        })?;
        self.extract_with_dialect(stored_path, &content, dialect)
    }

    /// Extract in-memory source; the dialect comes from `stored_path`'s extension
    pub fn extract_source(
        &self,
        stored_path: &str,
        content: &str,
    ) -> Result<FileExtraction, ExtractionError> {
        let dialect = self.dialect_of(stored_path)?;
        self.extract_with_dialect(stored_path, content, dialect)
    }

    fn extract_with_dialect(
        &self,
        stored_path: &str,
        content: &str,
        dialect: Dialect,
    ) -> Result<FileExtraction, ExtractionError> {
        let mut parser = Parser::new();
        let language = self.get_tree_sitter_language(dialect, stored_path)?;
        parser
            .set_language(&language)
            .map_err(|e| ExtractionError::Unparsable {
                path: stored_path.to_string(),
                reason: format!("failed to set parser language for {}: {}", dialect, e),
            })?;

        let tree = parser
            .parse(content, None)
            .ok_or_else(|| ExtractionError::Unparsable {
                path: stored_path.to_string(),
                reason: "parser returned no tree".to_string(),
            })?;

        // Error recovery would still give a tree; a partial tree means partial symbols
        let root = tree.root_node();
        if root.has_error() {
            return Err(ExtractionError::Unparsable {
                path: stored_path.to_string(),
                reason: format!(
                    "syntax error near line {}",
                    first_error_line(root).unwrap_or(root.start_position().row + 1)
                ),
            });
        }

        let extraction = super::factory::extract_file(&tree, stored_path, content, dialect);

        tracing::debug!(
            "Extracted {} symbols, {} call drafts, {} imports, {} patterns from {} file: {}",
            extraction.symbols.len(),
            extraction.drafts.len(),
            extraction.imports.len(),
            extraction.patterns.len(),
            dialect,
            stored_path
        );
        Ok(extraction)
    }

    /// Get tree-sitter language for a dialect (delegates to the shared module)
    fn get_tree_sitter_language(
        &self,
        dialect: Dialect,
        stored_path: &str,
    ) -> Result<tree_sitter::Language, ExtractionError> {
        crate::language::get_tree_sitter_language(dialect.as_str()).map_err(|e| {
            ExtractionError::Unparsable {
                path: stored_path.to_string(),
                reason: e.to_string(),
            }
        })
    }

    fn dialect_of(&self, stored_path: &str) -> Result<Dialect, ExtractionError> {
        Dialect::from_path(Path::new(stored_path)).ok_or_else(|| {
            ExtractionError::UnsupportedExtension {
                path: stored_path.to_string(),
            }
        })
    }
}

/// 1-based line of the first error or missing node
fn first_error_line(node: tree_sitter::Node) -> Option<usize> {
    if node.is_error() || node.is_missing() {
        return Some(node.start_position().row + 1);
    }
    let mut cursor = node.walk();
    let children: Vec<_> = node.children(&mut cursor).collect();
    children
        .into_iter()
        .filter(|child| child.has_error())
        .find_map(first_error_line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DiagnosticKind;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_extract_file_from_disk() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("util.ts");
        fs::write(&path, "export function util() {}\n").unwrap();

        let manager = ExtractorManager::new();
        let extraction = manager.extract_file(&path, "src/util.ts").unwrap();

        assert_eq!(extraction.file_path, "src/util.ts");
        assert_eq!(extraction.dialect, Dialect::TypeScript);
        assert_eq!(extraction.symbols[0].name, "util");
        assert!(extraction.symbols[0].is_exported);
    }

    #[test]
    fn test_missing_file_is_unreadable() {
        let temp = TempDir::new().unwrap();
        let manager = ExtractorManager::new();
        let error = manager
            .extract_file(&temp.path().join("gone.ts"), "gone.ts")
            .unwrap_err();

        assert_eq!(error.kind(), DiagnosticKind::UnreadableFile);
        assert!(matches!(error, ExtractionError::Unreadable { .. }));
    }

    #[test]
    fn test_syntax_errors_are_unparsable() {
        let manager = ExtractorManager::new();
        let error = manager
            .extract_source("broken.ts", "function ok() {}\nclass {{{ =\n")
            .unwrap_err();

        assert_eq!(error.kind(), DiagnosticKind::UnparsableSource);
        assert!(error.to_string().contains("broken.ts"));
    }

    #[test]
    fn test_unsupported_extension() {
        let manager = ExtractorManager::new();
        let error = manager.extract_source("notes.md", "# hi").unwrap_err();
        assert_eq!(error.kind(), DiagnosticKind::UnsupportedFile);
    }

    #[test]
    fn test_jsx_and_tsx_parse() {
        let manager = ExtractorManager::new();
        let jsx = manager
            .extract_source("ui/App.jsx", "export function App() { return <div>{render()}</div>; }\n")
            .unwrap();
        assert_eq!(jsx.dialect, Dialect::Jsx);
        assert!(jsx.drafts.iter().any(|draft| draft.callee_name == "render"));

        let tsx = manager
            .extract_source(
                "ui/Card.tsx",
                "export const Card = (props: { title: string }) => <h1>{props.title}</h1>;\n",
            )
            .unwrap();
        assert_eq!(tsx.dialect, Dialect::Tsx);
        assert_eq!(tsx.symbols[0].name, "Card");
        assert_eq!(manager.supported_languages().len(), 4);
    }
}
