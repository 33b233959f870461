//! Global symbol index and per-file import bindings

use std::collections::HashMap;

use crate::error::{Diagnostic, DiagnosticKind};
use crate::extractors::base::{FileExtraction, ImportRelation, Symbol};

/// Bound on enclosing-declaration chains
const MAX_SCOPE_DEPTH: usize = 256;

type SymbolKey = (String, String, Option<String>);
/// `(filePath, enclosing declaration id, name)`; `None` is the module body
type NestedKey = (String, Option<String>, String);

/// Every symbol of the run.
///
/// Module-scope symbols are keyed by `(filePath, name, className)`. Symbols
/// declared inside blocks, function bodies or object literals are keyed by
/// their enclosing declaration instead, so they only shadow names for code
/// nested in the same declaration.
#[derive(Debug, Default)]
pub struct SymbolIndex<'a> {
    by_key: HashMap<SymbolKey, &'a Symbol>,
    by_id: HashMap<&'a str, &'a Symbol>,
    nested: HashMap<NestedKey, &'a Symbol>,
    parents: HashMap<&'a str, &'a str>,
}

impl<'a> SymbolIndex<'a> {
    /// Register symbols in file order; the first symbol under a key keeps it
    pub fn build(files: &'a [FileExtraction]) -> (Self, Vec<Diagnostic>) {
        let mut index = Self::default();
        let mut warnings = Vec::new();

        for file in files {
            index.parents.extend(
                file.scope_parents
                    .iter()
                    .map(|(child, parent)| (child.as_str(), parent.as_str())),
            );
        }

        for file in files {
            for symbol in &file.symbols {
                index.by_id.entry(symbol.id.as_str()).or_insert(symbol);
                if file.module_scope.contains(&symbol.id) {
                    index.register_module_symbol(symbol, &mut warnings);
                } else if symbol.class_name.is_none() {
                    let key = (
                        symbol.file_path.clone(),
                        file.scope_parents.get(&symbol.id).cloned(),
                        symbol.name.clone(),
                    );
                    index.nested.entry(key).or_insert(symbol);
                }
            }
        }

        (index, warnings)
    }

    fn register_module_symbol(&mut self, symbol: &'a Symbol, warnings: &mut Vec<Diagnostic>) {
        let key = (
            symbol.file_path.clone(),
            symbol.name.clone(),
            symbol.class_name.clone(),
        );
        if let Some(first) = self.by_key.get(&key) {
            tracing::warn!(
                "Duplicate symbol {} in {} (line {}), keeping line {}",
                symbol.qualified_name(),
                symbol.file_path,
                symbol.location.start.line,
                first.location.start.line
            );
            warnings.push(Diagnostic::new(
                DiagnosticKind::DuplicateSymbol,
                Some(symbol.file_path.clone()),
                format!(
                    "{} at line {} duplicates the declaration at line {}",
                    symbol.qualified_name(),
                    symbol.location.start.line,
                    first.location.start.line
                ),
            ));
            return;
        }
        self.by_key.insert(key, symbol);
    }

    pub fn lookup(&self, file_path: &str, name: &str, class_name: Option<&str>) -> Option<&'a Symbol> {
        let key = (
            file_path.to_string(),
            name.to_string(),
            class_name.map(str::to_string),
        );
        self.by_key.get(&key).copied()
    }

    /// Class-less `name` as seen from inside the declaration `scope`: the
    /// nearest enclosing declaration first, then module scope, then names
    /// declared in the module body outside any declaration (IIFEs, loops)
    pub fn lookup_in_scope(&self, file_path: &str, name: &str, scope: Option<&str>) -> Option<&'a Symbol> {
        let nested = |scope: Option<&str>| {
            let key = (
                file_path.to_string(),
                scope.map(str::to_string),
                name.to_string(),
            );
            self.nested.get(&key).copied()
        };

        let mut current = scope;
        let mut depth = 0;
        while let Some(id) = current {
            if let Some(symbol) = nested(Some(id)) {
                return Some(symbol);
            }
            // Parent chains are trees; the bound only guards malformed input
            depth += 1;
            if depth > MAX_SCOPE_DEPTH {
                break;
            }
            current = self.parents.get(id).copied();
        }

        self.lookup(file_path, name, None).or_else(|| nested(None))
    }

    pub fn by_id(&self, id: &str) -> Option<&'a Symbol> {
        self.by_id.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}

/// Where an imported local name comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportTarget {
    /// Exported name; `default` or `*` for default and namespace bindings
    pub imported: String,
    pub specifier: String,
    /// Slot of the resolved file, when the specifier maps to an analyzed file
    pub file: Option<usize>,
}

/// Local name -> import target for one file
#[derive(Debug, Clone, Default)]
pub struct ImportBindings {
    bindings: HashMap<String, ImportTarget>,
}

impl ImportBindings {
    /// Later imports of the same local name replace earlier ones
    pub fn from_imports<'i>(imports: impl IntoIterator<Item = (&'i ImportRelation, Option<usize>)>) -> Self {
        let mut bindings = HashMap::new();
        for (import, file) in imports {
            for binding in &import.bindings {
                bindings.insert(
                    binding.local.clone(),
                    ImportTarget {
                        imported: binding.imported.clone(),
                        specifier: import.specifier.clone(),
                        file,
                    },
                );
            }
        }
        Self { bindings }
    }

    pub fn get(&self, local_name: &str) -> Option<&ImportTarget> {
        self.bindings.get(local_name)
    }

    pub fn is_imported(&self, local_name: &str) -> bool {
        self.bindings.contains_key(local_name)
    }
}
