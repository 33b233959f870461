// Base extractor types and shared per-file machinery
//
// - types.rs: data model (Position, Location, Symbol, CallRelation, import/export edges)
// - extractor.rs: BaseExtractor (per-file context, text slicing, id generation)
// - creation_methods.rs: symbol/draft construction and visibility
// - tree_methods.rs: tree navigation helpers
// - categories.rs: NodeCategory, the closed set of node shapes the walkers dispatch on

pub mod categories;
pub mod creation_methods;
pub mod extractor;
pub mod tree_methods;
pub mod types;

// Re-export key types for external use
pub use categories::NodeCategory;
pub use creation_methods::SymbolOptions;
pub use extractor::BaseExtractor;
pub use types::{
    CallDraft, CallEndpoint, CallRelation, CallType, CallerContext, ExportKind, ExportRelation,
    FileExtraction, ImportKind, ImportRelation, Location, NameBinding, Position, Receiver,
    Resolution, Symbol, SymbolKind, Visibility,
};
