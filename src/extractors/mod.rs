//! Tree-sitter based extractors for TypeScript and JavaScript
//!
//! # Architecture
//!
//! - `base` - shared data model, per-file context and tree helpers
//! - `typescript` - symbol table builder, module edges and relation extraction
//!   for all four dialects (TypeScript, TSX, JavaScript, JSX)
//! - `patterns` - dynamic-code idiom detection
//! - `factory` - runs every pass over a parsed tree
//! - `manager` - ExtractorManager public API (read, parse, extract)

pub mod base;
pub mod factory;
pub mod manager;
pub mod patterns;
pub mod typescript;

// Re-export the public API
pub use base::{
    CallDraft, CallEndpoint, CallRelation, CallType, ExportKind, ExportRelation, FileExtraction,
    ImportKind, ImportRelation, Location, NameBinding, Position, Resolution, Symbol, SymbolKind,
    Visibility,
};
pub use factory::extract_file;
pub use manager::ExtractorManager;
pub use patterns::{PatternKind, PatternSet};
