//! TypeScript/JavaScript extractor with modular architecture
//!
//! One extractor handles all four dialects; TypeScript-only constructs are
//! gated on the dialect. The work is split into specialized modules:
//!
//! - **symbols**: the symbol table builder walk and scope ownership map
//! - **classes**: class declarations/expressions and class fields
//! - **functions**: function declarations, expressions, arrows and methods
//! - **variables**: variable declarators and destructuring patterns
//! - **interfaces**: interfaces and their member signatures
//! - **assignments**: naming of prototype, static and CommonJS member assignments
//! - **imports_exports**: ES module, CommonJS and dynamic import/export edges
//! - **relationships**: call, construction and property-access drafts
//! - **inference**: receiver class inference from annotations and `new`
//! - **helpers**: naming rules shared by the passes above

mod assignments;
mod classes;
mod functions;
mod helpers;
mod imports_exports;
pub(crate) mod inference;
mod interfaces;
pub(crate) mod relationships;
mod symbols;
mod variables;

pub use imports_exports::ModuleEdges;
pub use symbols::{ScopeEntry, SymbolTable};

use crate::extractors::base::{BaseExtractor, CallDraft};
use crate::extractors::patterns::{self, PatternSet};
use crate::language::Dialect;
use tree_sitter::Tree;

/// Main TypeScript/JavaScript extractor that orchestrates the per-file passes
pub struct TypeScriptExtractor {
    base: BaseExtractor,
}

impl TypeScriptExtractor {
    /// Create a new extractor for one file.
    ///
    /// `file_path` is the stored (normalized) path; every id and location of
    /// this file is derived from it.
    pub fn new(file_path: String, content: String, dialect: Dialect) -> Self {
        Self {
            base: BaseExtractor::new(file_path, content, dialect),
        }
    }

    /// Build the symbol table (symbols, scope owners, class heritage)
    pub fn extract_symbols(&self, tree: &Tree) -> SymbolTable {
        symbols::extract_symbols(self, tree)
    }

    /// Extract import/export edges and the default-export name
    pub fn extract_module_edges(&self, tree: &Tree) -> ModuleEdges {
        imports_exports::extract_module_edges(self, tree)
    }

    /// Extract call, construction and property-access drafts
    pub fn extract_relationships(&self, tree: &Tree, table: &SymbolTable) -> Vec<CallDraft> {
        relationships::extract_relationships(self, tree, table)
    }

    /// Detect dynamic-code patterns
    pub fn extract_patterns(&self, tree: &Tree, table: &SymbolTable) -> PatternSet {
        patterns::detect_patterns(&self.base, tree, table)
    }

    /// Get immutable reference to base extractor (for sub-modules)
    pub(crate) fn base(&self) -> &BaseExtractor {
        &self.base
    }
}
