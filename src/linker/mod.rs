//! Cross-file linker
//!
//! Runs once, after every file has been extracted:
//!
//! 1. index analyzed files by stored path (plus `paths` aliases and `baseUrl`)
//! 2. resolve import and re-export specifiers against that index
//! 3. index every symbol by `(filePath, name, className)`
//! 4. resolve call drafts through import bindings, re-export chains and
//!    class heritage
//!
//! All indices are complete before the first lookup.

mod calls;
mod modules;
mod symbols;

pub use modules::ModuleIndex;
pub use symbols::{ImportBindings, ImportTarget, SymbolIndex};

use crate::error::Diagnostic;
use crate::extractors::base::{CallRelation, ExportRelation, FileExtraction, ImportRelation};
use calls::CallResolver;
use tracing::debug;

/// Linker output, in file order then source order
#[derive(Debug, Default)]
pub struct LinkedGraph {
    pub call_relations: Vec<CallRelation>,
    pub import_relations: Vec<ImportRelation>,
    pub export_relations: Vec<ExportRelation>,
    pub warnings: Vec<Diagnostic>,
}

/// Link per-file extractions into one graph
pub fn link(files: &[FileExtraction], modules: &ModuleIndex) -> LinkedGraph {
    let import_targets: Vec<Vec<Option<usize>>> = files
        .iter()
        .map(|file| {
            file.imports
                .iter()
                .map(|import| modules.resolve(&file.file_path, &import.specifier))
                .collect()
        })
        .collect();
    let export_targets: Vec<Vec<Option<usize>>> = files
        .iter()
        .map(|file| {
            file.exports
                .iter()
                .map(|export| {
                    export
                        .specifier
                        .as_deref()
                        .and_then(|specifier| modules.resolve(&file.file_path, specifier))
                })
                .collect()
        })
        .collect();

    let (symbol_index, warnings) = SymbolIndex::build(files);
    let bindings: Vec<ImportBindings> = files
        .iter()
        .zip(&import_targets)
        .map(|(file, targets)| {
            ImportBindings::from_imports(file.imports.iter().zip(targets.iter().copied()))
        })
        .collect();

    let resolver = CallResolver::new(files, &symbol_index, &bindings, &export_targets);
    let mut graph = LinkedGraph {
        warnings,
        ..Default::default()
    };

    for (slot, file) in files.iter().enumerate() {
        graph.import_relations.extend(file.imports.iter().zip(&import_targets[slot]).map(
            |(import, target)| ImportRelation {
                resolved_file_path: target.map(|target| files[target].file_path.clone()),
                ..import.clone()
            },
        ));
        graph.export_relations.extend(file.exports.iter().zip(&export_targets[slot]).map(
            |(export, target)| ExportRelation {
                resolved_file_path: target.map(|target| files[target].file_path.clone()),
                ..export.clone()
            },
        ));
        graph.call_relations.extend(
            file.drafts
                .iter()
                .map(|draft| resolver.resolve(slot, draft)),
        );
    }

    let resolved = graph
        .call_relations
        .iter()
        .filter(|relation| relation.callee.is_resolved())
        .count();
    debug!(
        "Linked {} files: {} of {} call relations resolved, {} symbols indexed",
        files.len(),
        resolved,
        graph.call_relations.len(),
        symbol_index.len()
    );

    graph
}
