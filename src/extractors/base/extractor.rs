// BaseExtractor implementation
//
// Per-file context shared by the symbol builder, the relation extractor and the
// pattern detector: source text, normalized path, dialect flags and id
// generation. One instance lives for exactly one file of one analysis run.

use md5;
use tracing::debug;
use tree_sitter::Node;

use super::types::{Location, Position};
use crate::language::Dialect;

/// Base implementation for the TypeScript/JavaScript extractor
pub struct BaseExtractor {
    pub file_path: String,
    pub content: String,
    pub dialect: Dialect,
}

impl BaseExtractor {
    /// Create the per-file context.
    ///
    /// `file_path` must already be normalized (unix separators, relative to the
    /// workspace root when one is configured); ids are derived from it verbatim.
    pub fn new(file_path: String, content: String, dialect: Dialect) -> Self {
        debug!("BaseExtractor for '{}' ({})", file_path, dialect);
        Self {
            file_path,
            content,
            dialect,
        }
    }

    pub fn is_typescript(&self) -> bool {
        self.dialect.is_typescript()
    }

    pub fn is_javascript(&self) -> bool {
        self.dialect.is_javascript()
    }

    /// Get text from a tree-sitter node
    pub fn get_node_text(&self, node: &Node) -> String {
        let start_byte = node.start_byte();
        let end_byte = node.end_byte();

        // Use byte slice but handle UTF-8 boundaries properly
        let content_bytes = self.content.as_bytes();
        if start_byte < content_bytes.len() && end_byte <= content_bytes.len() {
            String::from_utf8_lossy(&content_bytes[start_byte..end_byte]).to_string()
        } else {
            String::new()
        }
    }

    /// Get field text safely
    pub fn get_field_text(&self, node: &Node, field_name: &str) -> Option<String> {
        node.child_by_field_name(field_name)
            .map(|field_node| self.get_node_text(&field_node))
    }

    /// Location of a node in this file
    pub fn location(&self, node: &Node) -> Location {
        Location {
            file_path: self.file_path.clone(),
            start: Position::from_point(node.start_position()),
            end: Position::from_point(node.end_position()),
        }
    }

    /// Generate a stable id (MD5 hash) from a qualified name and a position
    pub fn generate_id(&self, qualified_name: &str, position: Position) -> String {
        generate_id(&self.file_path, qualified_name, position)
    }

    /// Name for a declaration the source leaves unnamed, e.g. `module$anonymous@3:9`
    pub fn synthetic_name(&self, context: &str, node: &Node) -> String {
        let position = Position::from_point(node.start_position());
        format!("{}$anonymous@{}:{}", context, position.line, position.column)
    }

    /// Strip quotes from a string literal node (`'./a'` -> `./a`)
    pub fn string_literal_value(&self, node: &Node) -> String {
        self.get_node_text(node)
            .trim_matches(|c| c == '"' || c == '\'' || c == '`')
            .to_string()
    }

    /// Node text cut to `max_len` characters, with `...` appended when cut
    pub fn truncate_text(&self, node: &Node, max_len: usize) -> String {
        let text = self.get_node_text(node);
        if text.chars().count() <= max_len {
            text
        } else {
            let mut truncated: String = text.chars().take(max_len).collect();
            truncated.push_str("...");
            truncated
        }
    }
}

pub(crate) fn generate_id(file_path: &str, qualified_name: &str, position: Position) -> String {
    let input = format!(
        "{}:{}:{}:{}",
        file_path, qualified_name, position.line, position.column
    );
    let digest = md5::compute(input.as_bytes());
    format!("{:x}", digest)
}
