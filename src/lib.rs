// Callgraph Core - tree-sitter call and dependency graph extraction
//
// Per-file extraction runs in parallel; cross-file linking runs once every
// file is done. The result is a serializable snapshot of one run.

pub mod analysis;
pub mod config;
pub mod error;
pub mod extractors;
pub mod language;
pub mod linker;
pub mod utils;

pub use analysis::{AnalysisOptions, AnalysisResult, Analyzer};
pub use config::{PathMapping, ProjectConfig};
pub use error::{AnalysisError, Diagnostic, DiagnosticKind, ExtractionError};
pub use extractors::{
    CallEndpoint, CallRelation, CallType, ExportRelation, ImportRelation, PatternKind, PatternSet,
    Symbol, SymbolKind, Visibility,
};
pub use language::Dialect;
