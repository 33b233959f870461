//! Helper functions for the TypeScript/JavaScript extractor
//!
//! Naming rules shared by the symbol builder, the import/export pass and the
//! relation extractor. They must agree, otherwise the linker cannot match a call
//! site's enclosing scope to the symbol that was emitted for it.

use tree_sitter::Node;

use super::assignments;
use crate::extractors::base::tree_methods::{is_field_of, parent_skipping_parens};
use crate::extractors::base::{BaseExtractor, SymbolKind, Visibility};

/// Name a function or class expression takes from where it appears
pub(super) struct ContextName<'a> {
    pub name: String,
    pub kind: SymbolKind,
    pub class_name: Option<String>,
    /// Node whose span the symbol covers (the declarator, assignment, pair, ...)
    pub span: Node<'a>,
    pub is_exported: bool,
    pub visibility: Option<Visibility>,
}

/// Inputs the naming rules need from the builder's walk state
pub(super) struct NamingScope<'s> {
    /// Innermost enclosing class, if the expression is a direct class member
    pub member_of_class: Option<&'s str>,
    pub at_top_level: bool,
    pub exported_locals: &'s std::collections::HashSet<String>,
    pub declared_types: &'s std::collections::HashSet<String>,
}

/// Work out the contextual name of a function/class expression `node`.
///
/// Returns `None` when the expression sits somewhere that does not name it
/// (callback arguments, return values, ...).
pub(super) fn context_name<'a>(
    base: &BaseExtractor,
    node: Node<'a>,
    scope: &NamingScope,
) -> Option<ContextName<'a>> {
    let parent = parent_skipping_parens(node)?;
    let value_kind = if node.kind() == "class" {
        SymbolKind::Class
    } else {
        SymbolKind::Function
    };

    match parent.kind() {
        "variable_declarator" if is_field_of(node, parent, "value") => {
            let name_node = parent.child_by_field_name("name")?;
            if name_node.kind() != "identifier" {
                return None;
            }
            let name = base.get_node_text(&name_node);
            let is_exported = is_export_declared(&parent)
                || (scope.at_top_level && scope.exported_locals.contains(&name));
            Some(ContextName {
                name,
                kind: value_kind,
                class_name: None,
                span: parent,
                is_exported,
                visibility: None,
            })
        }
        "assignment_expression" if is_field_of(node, parent, "right") => {
            assignments::name_from_assignment(base, node, parent, value_kind, scope)
        }
        "pair" if is_field_of(node, parent, "value") => {
            let key = parent.child_by_field_name("key")?;
            Some(ContextName {
                name: property_key_text(base, &key),
                kind: value_kind,
                class_name: None,
                span: parent,
                is_exported: false,
                visibility: None,
            })
        }
        "public_field_definition" | "field_definition" if is_field_of(node, parent, "value") => {
            let key = parent
                .child_by_field_name("name")
                .or_else(|| parent.child_by_field_name("property"))?;
            Some(ContextName {
                name: property_key_text(base, &key),
                kind: SymbolKind::Method,
                class_name: scope.member_of_class.map(str::to_string),
                span: parent,
                is_exported: false,
                visibility: base.extract_visibility(&parent),
            })
        }
        "export_statement" => {
            let name = own_name(base, &node).unwrap_or_else(|| base.synthetic_name("default", &node));
            Some(ContextName {
                name,
                kind: value_kind,
                class_name: None,
                span: node,
                is_exported: true,
                visibility: None,
            })
        }
        _ => None,
    }
}

/// The name a function/class expression gives itself (`function foo() {}`)
pub(super) fn own_name(base: &BaseExtractor, node: &Node) -> Option<String> {
    node.child_by_field_name("name")
        .map(|name_node| base.get_node_text(&name_node))
}

/// Text of a property key with string quotes removed
pub(super) fn property_key_text(base: &BaseExtractor, key: &Node) -> String {
    match key.kind() {
        "string" => base.string_literal_value(key),
        _ => base.get_node_text(key),
    }
}

/// Declaration is wrapped in `export …` (directly or through a declaration list)
pub(super) fn is_export_declared(node: &Node) -> bool {
    let mut current = node.parent();
    while let Some(parent) = current {
        match parent.kind() {
            "lexical_declaration" | "variable_declaration" => current = parent.parent(),
            "export_statement" => return true,
            _ => return false,
        }
    }
    false
}

/// Superclass named in a class heritage clause, without type arguments
pub(super) fn superclass_name(base: &BaseExtractor, class_node: &Node) -> Option<String> {
    let heritage = base.find_child_by_type(class_node, "class_heritage")?;
    let target = match base.find_child_by_type(&heritage, "extends_clause") {
        Some(extends) => extends
            .child_by_field_name("value")
            .or_else(|| extends.named_child(0))?,
        None => {
            // JavaScript: `class_heritage` holds the expression directly
            let first = heritage.named_child(0)?;
            if first.kind() == "implements_clause" {
                return None;
            }
            first
        }
    };

    Some(match target.kind() {
        "member_expression" => base.get_field_text(&target, "property")?,
        _ => base.get_node_text(&target),
    })
}

/// `module.exports`, `exports.x`, `module.exports.x`
pub(super) fn is_commonjs_export_target(text: &str) -> bool {
    text == "module.exports" || text.starts_with("module.exports.") || text.starts_with("exports.")
}
