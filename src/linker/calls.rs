//! Call draft resolution
//!
//! Turns each per-file draft into a [`CallRelation`]. Lookups go through the
//! global symbol index and the file's import bindings only, never through a
//! scan, so the outcome does not depend on the order files were analyzed in.

use std::collections::HashMap;

use super::symbols::{ImportBindings, SymbolIndex};
use crate::extractors::base::types::qualified_name;
use crate::extractors::base::{
    CallDraft, CallEndpoint, CallRelation, CallType, ExportKind, FileExtraction, Position,
    Receiver, Resolution, Symbol, SymbolKind,
};

/// Bound on re-export chains and inheritance chains
const MAX_CHAIN_DEPTH: usize = 16;

pub(super) struct CallResolver<'a> {
    files: &'a [FileExtraction],
    symbols: &'a SymbolIndex<'a>,
    bindings: &'a [ImportBindings],
    /// Per file, per export: slot of the re-exported file
    export_targets: &'a [Vec<Option<usize>>],
    slots: HashMap<&'a str, usize>,
}

impl<'a> CallResolver<'a> {
    pub(super) fn new(
        files: &'a [FileExtraction],
        symbols: &'a SymbolIndex<'a>,
        bindings: &'a [ImportBindings],
        export_targets: &'a [Vec<Option<usize>>],
    ) -> Self {
        let mut slots = HashMap::new();
        for (slot, file) in files.iter().enumerate() {
            slots.entry(file.file_path.as_str()).or_insert(slot);
        }
        Self {
            files,
            symbols,
            bindings,
            export_targets,
            slots,
        }
    }

    /// Link one draft of the file in `slot`
    pub(super) fn resolve(&self, slot: usize, draft: &CallDraft) -> CallRelation {
        let file_path = &self.files[slot].file_path;
        let caller = self.caller_endpoint(file_path, draft);
        let (target, call_type) = self.resolve_callee(slot, draft);

        let callee = match target {
            Some(symbol) => CallEndpoint {
                name: symbol.name.clone(),
                class_name: symbol
                    .class_name
                    .clone()
                    .or_else(|| (symbol.kind == SymbolKind::Class).then(|| symbol.name.clone())),
                file_path: symbol.file_path.clone(),
                resolution: Resolution::Resolved {
                    symbol_id: symbol.id.clone(),
                },
            },
            None => CallEndpoint {
                name: draft.callee_name.clone(),
                class_name: draft.callee_class.clone(),
                file_path: self.unresolved_file(slot, draft),
                resolution: Resolution::Unresolved {
                    text: draft.callee_text.clone(),
                },
            },
        };

        let caller_name = qualified_name(&draft.caller.name, draft.caller.class_name.as_deref());
        CallRelation {
            id: relation_id(
                file_path,
                &caller_name,
                &draft.callee_text,
                call_type,
                draft.location.start,
            ),
            caller,
            callee,
            call_type,
            location: draft.location.clone(),
        }
    }

    /// The caller is resolved only while its symbol is still part of the run
    fn caller_endpoint(&self, file_path: &str, draft: &CallDraft) -> CallEndpoint {
        let caller = &draft.caller;
        let resolution = match caller.symbol_id.as_deref().and_then(|id| self.symbols.by_id(id)) {
            Some(symbol) => Resolution::Resolved {
                symbol_id: symbol.id.clone(),
            },
            None => Resolution::Unresolved {
                text: qualified_name(&caller.name, caller.class_name.as_deref()),
            },
        };

        CallEndpoint {
            name: caller.name.clone(),
            class_name: caller.class_name.clone(),
            file_path: file_path.to_string(),
            resolution,
        }
    }

    fn resolve_callee(&self, slot: usize, draft: &CallDraft) -> (Option<&'a Symbol>, CallType) {
        let name = draft.callee_name.as_str();
        let call_type = draft.call_type;
        let scope = draft.caller.symbol_id.as_deref();

        match call_type {
            CallType::Function => (self.resolve_value(slot, name, scope, 0), call_type),
            CallType::Constructor => {
                let target = match &draft.receiver {
                    Receiver::None => self.resolve_value(slot, name, scope, 0),
                    Receiver::Identifier(namespace) => {
                        self.resolve_namespace_member(slot, namespace, name)
                    }
                    Receiver::Expression(_) => None,
                };
                (target, call_type)
            }
            CallType::Method | CallType::Property => {
                if let Some(class) = draft.callee_class.as_deref() {
                    let target = self
                        .resolve_class(slot, class, scope, 0)
                        .and_then(|class| self.member_of(class, name, 0));
                    return (target, call_type);
                }

                match &draft.receiver {
                    // Immediately invoked function expressions name their own scope
                    Receiver::None => (self.local(slot, name, scope), call_type),
                    Receiver::Identifier(receiver) => {
                        if let Some(target) = self.resolve_namespace_member(slot, receiver, name) {
                            return (Some(target), call_type);
                        }
                        // Static access on a class this file imports
                        let target = self
                            .resolve_class(slot, receiver, scope, 0)
                            .and_then(|class| self.member_of(class, name, 0));
                        match target {
                            Some(target) if draft.invoked => (Some(target), CallType::Method),
                            target => (target, call_type),
                        }
                    }
                    Receiver::Expression(_) => (None, call_type),
                }
            }
        }
    }

    /// Class-less declaration `name` visible from `scope` (`None` is module scope)
    fn local(&self, slot: usize, name: &str, scope: Option<&str>) -> Option<&'a Symbol> {
        self.symbols
            .lookup_in_scope(&self.files[slot].file_path, name, scope)
    }

    /// A name as seen from `scope`: local declaration first, then imports
    fn resolve_value(
        &self,
        slot: usize,
        name: &str,
        scope: Option<&str>,
        depth: usize,
    ) -> Option<&'a Symbol> {
        if depth > MAX_CHAIN_DEPTH {
            return None;
        }
        let local = self.local(slot, name, scope);
        if let Some(symbol) = local.filter(|symbol| symbol.kind != SymbolKind::Variable) {
            return Some(symbol);
        }

        // `const x = require('./x')` declares a variable and an import binding
        let imported = self.bindings[slot].get(name).and_then(|target| {
            let file = target.file?;
            match target.imported.as_str() {
                // A namespace or `require` binding used as a value is the module's default export
                "*" => self.resolve_export(file, "default", depth + 1),
                imported => self.resolve_export(file, imported, depth + 1),
            }
        });
        imported.or(local)
    }

    /// `ns.name` where `ns` is a namespace import or a `require` binding
    fn resolve_namespace_member(&self, slot: usize, namespace: &str, name: &str) -> Option<&'a Symbol> {
        let target = self.bindings[slot].get(namespace)?;
        if target.imported != "*" {
            return None;
        }
        self.resolve_export(target.file?, name, 0)
    }

    /// Class (or constructor function) a type name refers to
    fn resolve_class(
        &self,
        slot: usize,
        type_text: &str,
        scope: Option<&str>,
        depth: usize,
    ) -> Option<&'a Symbol> {
        let name = type_text.split('<').next().unwrap_or(type_text).trim();
        let symbol = match name.split_once('.') {
            Some((namespace, member)) => self.resolve_namespace_member(slot, namespace, member)?,
            None => self.resolve_value(slot, name, scope, depth)?,
        };
        matches!(
            symbol.kind,
            SymbolKind::Class | SymbolKind::Interface | SymbolKind::Function
        )
        .then_some(symbol)
    }

    /// Member of a class, inherited members included
    fn member_of(&self, class: &'a Symbol, member: &str, depth: usize) -> Option<&'a Symbol> {
        if depth > MAX_CHAIN_DEPTH {
            return None;
        }
        if let Some(symbol) = self
            .symbols
            .lookup(&class.file_path, member, Some(class.name.as_str()))
        {
            return Some(symbol);
        }

        let slot = *self.slots.get(class.file_path.as_str())?;
        let superclass = self.files[slot].heritage.get(&class.name)?;
        let parent = self.resolve_class(slot, superclass, None, depth + 1)?;
        if parent.id == class.id {
            return None;
        }
        self.member_of(parent, member, depth + 1)
    }

    /// Symbol a file exports under `name`, following re-export chains
    fn resolve_export(&self, slot: usize, name: &str, depth: usize) -> Option<&'a Symbol> {
        if depth > MAX_CHAIN_DEPTH {
            return None;
        }
        let file = &self.files[slot];

        if name == "default" {
            if let Some(symbol) = file
                .default_export
                .as_deref()
                .and_then(|local| self.local(slot, local, None))
            {
                return Some(symbol);
            }
        }

        for (index, export) in file.exports.iter().enumerate() {
            let Some(binding) = export.bindings.iter().find(|binding| binding.imported == name)
            else {
                continue;
            };
            match export.kind {
                ExportKind::ReExportAll => {}
                ExportKind::ReExport => {
                    // `export * as ns from` names a module, not a symbol
                    if binding.local == "*" {
                        return None;
                    }
                    let target = self.export_targets[slot].get(index).copied().flatten()?;
                    return self.resolve_export(target, &binding.local, depth + 1);
                }
                _ => return self.resolve_value(slot, &binding.local, None, depth + 1),
            }
        }

        if name != "default" {
            for (index, export) in file.exports.iter().enumerate() {
                if export.kind != ExportKind::ReExportAll {
                    continue;
                }
                let Some(target) = self.export_targets[slot].get(index).copied().flatten() else {
                    continue;
                };
                if let Some(symbol) = self.resolve_export(target, name, depth + 1) {
                    return Some(symbol);
                }
            }
        }

        self.local(slot, name, None).filter(|symbol| symbol.is_exported)
    }

    /// File an unresolved callee is attributed to: the module the name was
    /// imported from, otherwise the caller's own file
    fn unresolved_file(&self, slot: usize, draft: &CallDraft) -> String {
        let head = match &draft.receiver {
            Receiver::None => Some(draft.callee_name.as_str()),
            Receiver::Identifier(receiver) => Some(receiver.as_str()),
            Receiver::Expression(_) => None,
        };

        let bindings = &self.bindings[slot];
        let target = head
            .and_then(|name| bindings.get(name))
            .or_else(|| {
                draft
                    .callee_class
                    .as_deref()
                    .and_then(|class| bindings.get(class.split('<').next().unwrap_or(class).trim()))
            });

        match target {
            Some(target) => match target.file {
                Some(file) => self.files[file].file_path.clone(),
                None => target.specifier.clone(),
            },
            None => self.files[slot].file_path.clone(),
        }
    }
}

/// MD5 of `file_path:caller:callee_text:call_type:line:column`
pub(crate) fn relation_id(
    file_path: &str,
    caller_name: &str,
    callee_text: &str,
    call_type: CallType,
    position: Position,
) -> String {
    let input = format!(
        "{}:{}:{}:{}:{}:{}",
        file_path, caller_name, callee_text, call_type, position.line, position.column
    );
    format!("{:x}", md5::compute(input.as_bytes()))
}
