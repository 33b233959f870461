//! Function and method extraction
//!
//! This module handles function declarations, function/arrow expressions,
//! methods (class and object-literal), constructors and TypeScript
//! constructor parameter properties.

use super::helpers;
use super::symbols::{BuilderContext, Container, ContainerKind};
use crate::extractors::base::{SymbolKind, SymbolOptions, Visibility};
use crate::extractors::typescript::TypeScriptExtractor;
use tree_sitter::Node;

/// Extract a function (or generator) declaration
pub(super) fn extract_function_declaration(
    extractor: &TypeScriptExtractor,
    ctx: &mut BuilderContext,
    node: Node,
) -> Option<Container> {
    let base = extractor.base();
    let name = base
        .get_field_text(&node, "name")
        .unwrap_or_else(|| base.synthetic_name(&ctx.context_label(), &node));
    let is_exported = helpers::is_export_declared(&node)
        || (ctx.at_top_level() && ctx.exported_locals.contains(&name));

    let symbol = base.create_symbol(
        &node,
        name,
        SymbolKind::Function,
        SymbolOptions {
            class_name: None,
            is_exported,
            visibility: None,
        },
    );

    Some(ctx.register(&node, symbol, ContainerKind::Function))
}

/// Extract a function expression, arrow function or generator expression.
///
/// The name comes from where the expression appears (declarator, assignment,
/// object key, class field, `export default`), then from its own name, and
/// finally a synthetic `context$anonymous@line:col` name.
pub(super) fn extract_function_expression(
    extractor: &TypeScriptExtractor,
    ctx: &mut BuilderContext,
    node: Node,
) -> Option<Container> {
    let base = extractor.base();

    let named = helpers::context_name(base, node, &ctx.naming_scope());
    let (name, kind, class_name, span, is_exported, visibility) = match named {
        Some(named) => (
            named.name,
            named.kind,
            named.class_name,
            named.span,
            named.is_exported,
            named.visibility,
        ),
        None => {
            let name = helpers::own_name(base, &node)
                .unwrap_or_else(|| base.synthetic_name(&ctx.context_label(), &node));
            (name, SymbolKind::Function, None, node, false, None)
        }
    };

    let symbol = base.create_symbol(
        &span,
        name,
        kind,
        SymbolOptions {
            class_name,
            is_exported,
            visibility,
        },
    );

    Some(ctx.register(&node, symbol, ContainerKind::Function))
}

/// Extract a method definition (class body or object literal)
pub(super) fn extract_method(
    extractor: &TypeScriptExtractor,
    ctx: &mut BuilderContext,
    node: Node,
) -> Option<Container> {
    let base = extractor.base();
    let name = match node.child_by_field_name("name") {
        Some(name_node) => helpers::property_key_text(base, &name_node),
        None => base.synthetic_name(&ctx.context_label(), &node),
    };

    let class_name = ctx.enclosing_class();
    let kind = if class_name.is_some() && name == "constructor" {
        SymbolKind::Constructor
    } else {
        SymbolKind::Method
    };

    if kind == SymbolKind::Constructor {
        if let Some(owner) = class_name.as_deref() {
            extract_parameter_properties(extractor, ctx, node, owner);
        }
    }

    let symbol = base.create_symbol(
        &node,
        name,
        kind,
        SymbolOptions {
            class_name,
            is_exported: false,
            visibility: base.extract_visibility(&node),
        },
    );

    Some(ctx.register(&node, symbol, ContainerKind::Function))
}

/// `constructor(private repo: Repo, readonly id: string)` declares properties
fn extract_parameter_properties(
    extractor: &TypeScriptExtractor,
    ctx: &mut BuilderContext,
    constructor: Node,
    owner: &str,
) {
    let base = extractor.base();
    let Some(parameters) = constructor.child_by_field_name("parameters") else {
        return;
    };

    let mut cursor = parameters.walk();
    for parameter in parameters.named_children(&mut cursor) {
        if !matches!(parameter.kind(), "required_parameter" | "optional_parameter") {
            continue;
        }

        let visibility = base.extract_visibility(&parameter);
        if visibility.is_none() && !base.has_token(&parameter, "readonly") {
            continue;
        }

        let Some(pattern) = parameter.child_by_field_name("pattern") else {
            continue;
        };
        if pattern.kind() != "identifier" {
            continue;
        }

        let symbol = base.create_symbol(
            &parameter,
            base.get_node_text(&pattern),
            SymbolKind::Property,
            SymbolOptions {
                class_name: Some(owner.to_string()),
                is_exported: false,
                visibility: Some(visibility.unwrap_or(Visibility::Public)),
            },
        );
        ctx.push_symbol(&parameter, symbol);
    }
}
