// Base Extractor Types
//
// All data structures shared by the symbol builder, the relation extractor, the
// linker and the aggregated result: positions, symbols, call relations,
// import/export edges and the per-file extraction bundle.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::extractors::patterns::PatternSet;
use crate::language::Dialect;

/// A 1-based line/column pair
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }

    /// Convert a tree-sitter point (0-based row and column) into a 1-based position
    pub fn from_point(point: tree_sitter::Point) -> Self {
        Self {
            line: point.row as u32 + 1,
            column: point.column as u32 + 1,
        }
    }
}

/// Where an entity was observed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub file_path: String,
    pub start: Position,
    pub end: Position,
}

/// Symbol kinds emitted by the symbol table builder
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    Class,
    Interface,
    Function,
    Method,
    Property,
    Variable,
    Constructor,
}

impl std::fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SymbolKind::Class => write!(f, "class"),
            SymbolKind::Interface => write!(f, "interface"),
            SymbolKind::Function => write!(f, "function"),
            SymbolKind::Method => write!(f, "method"),
            SymbolKind::Property => write!(f, "property"),
            SymbolKind::Variable => write!(f, "variable"),
            SymbolKind::Constructor => write!(f, "constructor"),
        }
    }
}

/// Visibility levels for symbols
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    Private,
}

impl std::fmt::Display for Visibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Visibility::Public => write!(f, "public"),
            Visibility::Protected => write!(f, "protected"),
            Visibility::Private => write!(f, "private"),
        }
    }
}

/// A declared program entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Symbol {
    /// MD5 of `file_path:qualified_name:line:column`
    pub id: String,
    pub name: String,
    pub kind: SymbolKind,
    /// Owning class (or interface) for members
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    pub file_path: String,
    pub location: Location,
    pub is_exported: bool,
    pub visibility: Visibility,
}

impl Symbol {
    /// `Class.member` for members, the bare name otherwise
    pub fn qualified_name(&self) -> String {
        qualified_name(&self.name, self.class_name.as_deref())
    }
}

pub(crate) fn qualified_name(name: &str, class_name: Option<&str>) -> String {
    match class_name {
        Some(class_name) => format!("{}.{}", class_name, name),
        None => name.to_string(),
    }
}

/// How a call site was classified
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum CallType {
    Method,
    Constructor,
    Function,
    Property,
}

impl std::fmt::Display for CallType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CallType::Method => write!(f, "method"),
            CallType::Constructor => write!(f, "constructor"),
            CallType::Function => write!(f, "function"),
            CallType::Property => write!(f, "property"),
        }
    }
}

/// Outcome of linking one end of a call relation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum Resolution {
    /// Linked to a symbol present in the analysis result
    #[serde(rename_all = "camelCase")]
    Resolved { symbol_id: String },
    /// External or unknown target, kept as the text written at the site
    Unresolved { text: String },
}

/// One end of a call relation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct CallEndpoint {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    pub file_path: String,
    pub resolution: Resolution,
}

impl CallEndpoint {
    pub fn symbol_id(&self) -> Option<&str> {
        match &self.resolution {
            Resolution::Resolved { symbol_id } => Some(symbol_id),
            Resolution::Unresolved { .. } => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self.resolution, Resolution::Resolved { .. })
    }
}

/// A call, construction or property use between two endpoints
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CallRelation {
    pub id: String,
    pub caller: CallEndpoint,
    pub callee: CallEndpoint,
    pub call_type: CallType,
    pub location: Location,
}

impl CallRelation {
    pub fn is_cross_file(&self) -> bool {
        self.caller.file_path != self.callee.file_path
    }
}

/// Import statement flavours
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum ImportKind {
    /// `import { a } from './x'`, `import a from './x'`, `import * as a from './x'`
    Static,
    /// `import type { A } from './x'`
    TypeOnly,
    /// `import './x'`
    SideEffect,
    /// `require('./x')`
    Require,
    /// `import('./x')`
    Dynamic,
}

/// A local name bound by an import (or exported under another name)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct NameBinding {
    pub local: String,
    /// Name on the other side of the module boundary; `default` or `*` for
    /// default and namespace bindings
    pub imported: String,
}

impl NameBinding {
    pub fn new(local: impl Into<String>, imported: impl Into<String>) -> Self {
        Self {
            local: local.into(),
            imported: imported.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImportRelation {
    pub file_path: String,
    pub specifier: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_file_path: Option<String>,
    pub imported_names: Vec<String>,
    pub bindings: Vec<NameBinding>,
    pub kind: ImportKind,
    pub location: Location,
}

/// Export statement flavours
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum ExportKind {
    /// `export class A {}`, `export const a = 1`
    Declaration,
    /// `export default …`
    Default,
    /// `export { a, b as c }`
    Named,
    /// `export { a } from './x'`, `export * as ns from './x'`
    ReExport,
    /// `export * from './x'`
    ReExportAll,
    /// `module.exports = …`, `exports.a = …`
    CommonJs,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExportRelation {
    pub file_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specifier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_file_path: Option<String>,
    pub exported_names: Vec<String>,
    /// For `Named`/`ReExport`: `local` is the name inside the exporting (or
    /// re-exported) module, `imported` the name seen by importers
    pub bindings: Vec<NameBinding>,
    pub kind: ExportKind,
    pub location: Location,
}

/// Enclosing declaration of a call site, as seen by the relation extractor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerContext {
    pub name: String,
    pub class_name: Option<String>,
    /// Id of the local symbol that owns the scope; absent for the module scope
    pub symbol_id: Option<String>,
}

/// Receiver of a member call as written at the site
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Receiver {
    /// `foo()`
    None,
    /// `a.foo()` where `a` is a plain identifier
    Identifier(String),
    /// Anything else (`a.b.foo()`, `f().foo()`, ...)
    Expression(String),
}

/// Unresolved call relation produced per file; resolved by the linker
#[derive(Debug, Clone, PartialEq)]
pub struct CallDraft {
    pub caller: CallerContext,
    pub callee_name: String,
    /// Class inferred for the receiver (or the constructed class)
    pub callee_class: Option<String>,
    pub receiver: Receiver,
    /// Full text of the call target, e.g. `this.repo.save`
    pub callee_text: String,
    pub call_type: CallType,
    /// The site is invoked (`a.b()`), not just read (`a.b`)
    pub invoked: bool,
    pub location: Location,
}

/// Everything extracted from one file, before linking
#[derive(Debug, Clone)]
pub struct FileExtraction {
    pub file_path: String,
    pub dialect: Dialect,
    pub content_hash: String,
    pub line_count: usize,
    pub symbols: Vec<Symbol>,
    pub drafts: Vec<CallDraft>,
    pub imports: Vec<ImportRelation>,
    pub exports: Vec<ExportRelation>,
    pub patterns: PatternSet,
    /// class name -> superclass name as written
    pub heritage: HashMap<String, String>,
    /// Name of the symbol behind `export default` / `module.exports =`
    pub default_export: Option<String>,
    /// Ids of symbols reachable by name at module scope
    pub module_scope: HashSet<String>,
    /// symbol id -> id of the declaration it is nested in
    pub scope_parents: HashMap<String, String>,
}
