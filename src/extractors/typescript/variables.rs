//! Variable extraction
//!
//! One Variable symbol per bound name. Declarators holding a function or
//! class are named by the expression handlers instead.

use super::helpers;
use super::symbols::BuilderContext;
use crate::extractors::base::tree_methods::unwrap_parens;
use crate::extractors::base::{NodeCategory, SymbolKind, SymbolOptions};
use crate::extractors::typescript::TypeScriptExtractor;
use tree_sitter::Node;

/// Extract the names bound by a `variable_declarator`
pub(super) fn extract_declarator(
    extractor: &TypeScriptExtractor,
    ctx: &mut BuilderContext,
    node: Node,
) {
    let base = extractor.base();
    let Some(name_node) = node.child_by_field_name("name") else {
        return;
    };

    match name_node.kind() {
        "identifier" => {
            let holds_definition = node
                .child_by_field_name("value")
                .map(|value| {
                    let value = unwrap_parens(value);
                    value.kind() == "class"
                        || NodeCategory::of(&value) == NodeCategory::FunctionExpression
                })
                .unwrap_or(false);
            if holds_definition {
                return;
            }

            let name = base.get_node_text(&name_node);
            let is_exported = helpers::is_export_declared(&node)
                || (ctx.at_top_level() && ctx.exported_locals.contains(&name));
            let symbol = base.create_symbol(
                &node,
                name,
                SymbolKind::Variable,
                SymbolOptions {
                    class_name: None,
                    is_exported,
                    visibility: None,
                },
            );
            ctx.push_symbol(&node, symbol);
        }
        "object_pattern" | "array_pattern" => {
            let is_exported = helpers::is_export_declared(&node);
            let mut bound = Vec::new();
            collect_bound_names(name_node, &mut bound);

            for identifier in bound {
                let symbol = base.create_symbol(
                    &identifier,
                    base.get_node_text(&identifier),
                    SymbolKind::Variable,
                    SymbolOptions {
                        class_name: None,
                        is_exported,
                        visibility: None,
                    },
                );
                ctx.push_symbol(&node, symbol);
            }
        }
        _ => {}
    }
}

/// Identifiers a destructuring pattern binds, skipping default values and keys
pub(super) fn collect_bound_names<'a>(pattern: Node<'a>, out: &mut Vec<Node<'a>>) {
    match pattern.kind() {
        "identifier" | "shorthand_property_identifier_pattern" => out.push(pattern),
        "pair_pattern" => {
            if let Some(value) = pattern.child_by_field_name("value") {
                collect_bound_names(value, out);
            }
        }
        "assignment_pattern" | "object_assignment_pattern" => {
            if let Some(left) = pattern.child_by_field_name("left") {
                collect_bound_names(left, out);
            }
        }
        "object_pattern" | "array_pattern" | "rest_pattern" => {
            let mut cursor = pattern.walk();
            for child in pattern.named_children(&mut cursor) {
                collect_bound_names(child, out);
            }
        }
        _ => {}
    }
}
