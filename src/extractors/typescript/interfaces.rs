//! Interface extraction
//!
//! TypeScript interfaces and their method/property signatures, plus abstract
//! method signatures declared inside abstract classes.

use super::helpers;
use super::symbols::{BuilderContext, Container, ContainerKind};
use crate::extractors::base::{SymbolKind, SymbolOptions};
use crate::extractors::typescript::TypeScriptExtractor;
use tree_sitter::Node;

/// Extract an interface declaration
pub(super) fn extract_interface(
    extractor: &TypeScriptExtractor,
    ctx: &mut BuilderContext,
    node: Node,
) -> Option<Container> {
    let base = extractor.base();
    let name = base.get_field_text(&node, "name")?;
    let is_exported = helpers::is_export_declared(&node)
        || (ctx.at_top_level() && ctx.exported_locals.contains(&name));

    // interface A extends B: members of B are reachable through A
    if let Some(extends) = base.find_child_by_type(&node, "extends_type_clause") {
        if let Some(parent_type) = extends.named_child(0) {
            let parent_name = match parent_type.kind() {
                "generic_type" => base.get_field_text(&parent_type, "name"),
                _ => Some(base.get_node_text(&parent_type)),
            };
            if let Some(parent_name) = parent_name {
                ctx.table.heritage.insert(name.clone(), parent_name);
            }
        }
    }

    let symbol = base.create_symbol(
        &node,
        name,
        SymbolKind::Interface,
        SymbolOptions {
            class_name: None,
            is_exported,
            visibility: None,
        },
    );

    Some(ctx.register(&node, symbol, ContainerKind::Interface))
}

/// Extract a method signature.
///
/// Interface members become methods of the interface; abstract signatures in
/// a class become methods of the class. Overload signatures are skipped, the
/// implementation carries the symbol.
pub(super) fn extract_method_signature(
    extractor: &TypeScriptExtractor,
    ctx: &mut BuilderContext,
    node: Node,
) {
    let base = extractor.base();
    let owner = if node.kind() == "abstract_method_signature" {
        ctx.enclosing_class()
    } else if is_interface_member(&node) {
        ctx.enclosing_interface()
    } else {
        None
    };
    let Some(owner) = owner else {
        return;
    };
    let Some(name_node) = node.child_by_field_name("name") else {
        return;
    };

    let symbol = base.create_symbol(
        &node,
        helpers::property_key_text(base, &name_node),
        SymbolKind::Method,
        SymbolOptions {
            class_name: Some(owner),
            is_exported: false,
            visibility: base.extract_visibility(&node),
        },
    );
    ctx.push_symbol(&node, symbol);
}

/// Extract an interface property signature
pub(super) fn extract_property_signature(
    extractor: &TypeScriptExtractor,
    ctx: &mut BuilderContext,
    node: Node,
) {
    if !is_interface_member(&node) {
        return;
    }
    let base = extractor.base();
    let Some(owner) = ctx.enclosing_interface() else {
        return;
    };
    let Some(name_node) = node.child_by_field_name("name") else {
        return;
    };

    let symbol = base.create_symbol(
        &node,
        helpers::property_key_text(base, &name_node),
        SymbolKind::Property,
        SymbolOptions {
            class_name: Some(owner),
            is_exported: false,
            visibility: None,
        },
    );
    ctx.push_symbol(&node, symbol);
}

/// Direct member of an interface body (not of a nested object type)
fn is_interface_member(node: &Node) -> bool {
    match node.parent() {
        Some(parent) if parent.kind() == "interface_body" => true,
        Some(parent) if parent.kind() == "object_type" => parent
            .parent()
            .map(|grand| grand.kind() == "interface_declaration")
            .unwrap_or(false),
        _ => false,
    }
}
