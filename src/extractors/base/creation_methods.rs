// Symbol, draft and visibility creation methods
//
// Split out of extractor.rs to keep the per-file context small

use tree_sitter::Node;

use super::extractor::BaseExtractor;
use super::types::{
    qualified_name, CallDraft, CallType, CallerContext, Receiver, Symbol, SymbolKind, Visibility,
};

/// Options for creating symbols
#[derive(Debug, Clone, Default)]
pub struct SymbolOptions {
    pub class_name: Option<String>,
    pub is_exported: bool,
    pub visibility: Option<Visibility>,
}

impl BaseExtractor {
    /// Create a symbol spanning `node`
    ///
    /// The id is derived from the qualified name and the start of `node`, so the
    /// same declaration always gets the same id.
    pub fn create_symbol(
        &self,
        node: &Node,
        name: String,
        kind: SymbolKind,
        options: SymbolOptions,
    ) -> Symbol {
        let location = self.location(node);
        let id = self.generate_id(
            &qualified_name(&name, options.class_name.as_deref()),
            location.start,
        );

        Symbol {
            id,
            name,
            kind,
            class_name: options.class_name,
            file_path: self.file_path.clone(),
            location,
            is_exported: options.is_exported,
            visibility: options.visibility.unwrap_or_default(),
        }
    }

    /// Create a call draft for the site at `node`
    #[allow(clippy::too_many_arguments)]
    pub fn create_draft(
        &self,
        node: &Node,
        caller: CallerContext,
        callee_name: String,
        callee_class: Option<String>,
        receiver: Receiver,
        callee_text: String,
        call_type: CallType,
        invoked: bool,
    ) -> CallDraft {
        CallDraft {
            caller,
            callee_name,
            callee_class,
            receiver,
            callee_text,
            call_type,
            invoked,
            location: self.location(node),
        }
    }

    /// Extract visibility from TS accessibility modifiers or JS `#private` names
    pub fn extract_visibility(&self, node: &Node) -> Option<Visibility> {
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "accessibility_modifier" => {
                    return match self.get_node_text(&child).trim() {
                        "private" => Some(Visibility::Private),
                        "protected" => Some(Visibility::Protected),
                        _ => Some(Visibility::Public),
                    };
                }
                "private_property_identifier" => return Some(Visibility::Private),
                _ => continue,
            }
        }

        None
    }
}
