//! Shared extractor factory - the one place every per-file pass is run
//!
//! The manager parses; this module turns a parsed tree into a
//! [`FileExtraction`] so that every code path (single file, in-memory source,
//! parallel batch) runs the same passes in the same order.

use crate::extractors::base::FileExtraction;
use crate::extractors::typescript::TypeScriptExtractor;
use crate::language::Dialect;
use crate::utils::hash_content;

/// Run the symbol, module-edge, relation and pattern passes over one tree
///
/// # Parameters
/// - `tree`: Pre-parsed tree-sitter AST
/// - `file_path`: Stored (Unix-style) file path; ids and locations derive from it
/// - `content`: Source code content
/// - `dialect`: Dialect the tree was parsed with
///
/// # Example
/// ```ignore
/// let extraction = extract_file(&tree, "src/main.ts", &content, Dialect::TypeScript);
/// ```
pub fn extract_file(
    tree: &tree_sitter::Tree,
    file_path: &str,
    content: &str,
    dialect: Dialect,
) -> FileExtraction {
    let extractor = TypeScriptExtractor::new(file_path.to_string(), content.to_string(), dialect);

    // Symbols first: relations and patterns read the scope ownership map
    let table = extractor.extract_symbols(tree);
    let edges = extractor.extract_module_edges(tree);
    let drafts = extractor.extract_relationships(tree, &table);
    let patterns = extractor.extract_patterns(tree, &table);

    FileExtraction {
        file_path: file_path.to_string(),
        dialect,
        content_hash: hash_content(content),
        line_count: content.lines().count(),
        symbols: table.symbols,
        drafts,
        imports: edges.imports,
        exports: edges.exports,
        patterns,
        heritage: table.heritage,
        default_export: edges.default_export,
        module_scope: table.module_scope,
        scope_parents: table.scope_parents,
    }
}
