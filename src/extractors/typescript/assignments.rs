//! Assignment expression naming
//!
//! Functions and classes assigned to members are how pre-class JavaScript
//! declares methods: `Ctor.prototype.m = function () {}`, static
//! `Ctor.m = function () {}` and CommonJS `exports.m = function () {}`.

use tree_sitter::Node;

use super::helpers::{self, ContextName, NamingScope};
use crate::extractors::base::{BaseExtractor, SymbolKind, Visibility};
use crate::extractors::patterns::PROTOTYPE_MEMBER;

/// Name the function/class expression `value` assigned by `assignment`
pub(super) fn name_from_assignment<'a>(
    base: &BaseExtractor,
    value: Node<'a>,
    assignment: Node<'a>,
    value_kind: SymbolKind,
    scope: &NamingScope,
) -> Option<ContextName<'a>> {
    let left = assignment.child_by_field_name("left")?;
    let left_text = base.get_node_text(&left);

    // Ctor.prototype.method = function () {}
    if let Some(captures) = PROTOTYPE_MEMBER.captures(&left_text) {
        return Some(ContextName {
            name: captures[2].to_string(),
            kind: SymbolKind::Method,
            class_name: Some(captures[1].to_string()),
            span: assignment,
            is_exported: false,
            visibility: Some(Visibility::Public),
        });
    }

    match left.kind() {
        "identifier" => {
            let name = left_text;
            let is_exported = scope.at_top_level && scope.exported_locals.contains(&name);
            Some(ContextName {
                name,
                kind: value_kind,
                class_name: None,
                span: assignment,
                is_exported,
                visibility: None,
            })
        }
        "member_expression" => {
            // module.exports = function () {}
            if left_text == "module.exports" {
                let name = helpers::own_name(base, &value)
                    .unwrap_or_else(|| base.synthetic_name("default", &value));
                return Some(ContextName {
                    name,
                    kind: value_kind,
                    class_name: None,
                    span: assignment,
                    is_exported: true,
                    visibility: None,
                });
            }

            let object = left.child_by_field_name("object")?;
            let property = left.child_by_field_name("property")?;
            let property_name = base.get_node_text(&property);
            let object_text = base.get_node_text(&object);

            // exports.m = function () {}
            if helpers::is_commonjs_export_target(&left_text) {
                return Some(ContextName {
                    name: property_name,
                    kind: value_kind,
                    class_name: None,
                    span: assignment,
                    is_exported: true,
                    visibility: None,
                });
            }

            // Ctor.m = function () {} where Ctor is declared in this file
            if object.kind() == "identifier" && scope.declared_types.contains(&object_text) {
                return Some(ContextName {
                    name: property_name,
                    kind: SymbolKind::Method,
                    class_name: Some(object_text),
                    span: assignment,
                    is_exported: false,
                    visibility: Some(Visibility::Public),
                });
            }

            Some(ContextName {
                name: property_name,
                kind: value_kind,
                class_name: None,
                span: assignment,
                is_exported: false,
                visibility: None,
            })
        }
        _ => None,
    }
}
