//! Receiver class inference
//!
//! Works out which class a receiver expression refers to from what the
//! source states directly: type annotations, `new` expressions and `as`
//! casts. There is no flow analysis; a binding keeps the class of its
//! declaration for the whole scope.

use crate::extractors::base::tree_methods::unwrap_parens;
use crate::extractors::base::BaseExtractor;
use std::collections::HashMap;
use tree_sitter::Node;

/// Class named by a type annotation, if it names one.
///
/// Accepts a `type_annotation` or a bare type node. `Repo<T>` names `Repo`,
/// `ns.Repo` names `Repo`; predefined and structural types name nothing.
pub(crate) fn type_name(base: &BaseExtractor, node: &Node) -> Option<String> {
    match node.kind() {
        "type_annotation" | "parenthesized_type" => {
            let inner = node.named_child(0)?;
            type_name(base, &inner)
        }
        "type_identifier" => Some(base.get_node_text(node)),
        "generic_type" => {
            let name = node.child_by_field_name("name")?;
            type_name(base, &name)
        }
        "nested_type_identifier" => base.get_field_text(node, "name"),
        _ => None,
    }
}

/// Class constructed by a `new` expression
pub(crate) fn constructed_class(base: &BaseExtractor, new_node: &Node) -> Option<String> {
    let constructor = unwrap_parens(new_node.child_by_field_name("constructor")?);
    match constructor.kind() {
        "identifier" => Some(base.get_node_text(&constructor)),
        "member_expression" => base.get_field_text(&constructor, "property"),
        _ => None,
    }
}

/// Class stated for a value expression (`new X()`, `y as X`, `<X>y`)
pub(crate) fn value_class(base: &BaseExtractor, value: &Node) -> Option<String> {
    let value = unwrap_parens(*value);
    match value.kind() {
        "new_expression" => constructed_class(base, &value),
        "as_expression" | "satisfies_expression" => {
            let ty = value.named_child(1)?;
            type_name(base, &ty)
        }
        "type_assertion" => {
            let arguments = value.named_child(0)?;
            let ty = arguments.named_child(0)?;
            type_name(base, &ty)
        }
        "await_expression" => {
            let inner = value.named_child(0)?;
            value_class(base, &inner)
        }
        _ => None,
    }
}

/// `const repo: Repo = …` or `const repo = new Repo()` -> (repo, Repo)
pub(crate) fn declared_binding(base: &BaseExtractor, declarator: &Node) -> Option<(String, String)> {
    let name = declarator.child_by_field_name("name")?;
    if name.kind() != "identifier" {
        return None;
    }

    let class = declarator
        .child_by_field_name("type")
        .and_then(|annotation| type_name(base, &annotation))
        .or_else(|| {
            declarator
                .child_by_field_name("value")
                .and_then(|value| value_class(base, &value))
        })?;

    Some((base.get_node_text(&name), class))
}

/// Parameters with a class type annotation: `(repo: Repo, id: string)` -> {repo: Repo}
pub(crate) fn parameter_bindings(base: &BaseExtractor, function: &Node) -> HashMap<String, String> {
    let mut bindings = HashMap::new();
    let Some(parameters) = function.child_by_field_name("parameters") else {
        return bindings;
    };

    let mut cursor = parameters.walk();
    for parameter in parameters.named_children(&mut cursor) {
        if !matches!(parameter.kind(), "required_parameter" | "optional_parameter") {
            continue;
        }
        let (Some(pattern), Some(annotation)) = (
            parameter.child_by_field_name("pattern"),
            parameter.child_by_field_name("type"),
        ) else {
            continue;
        };
        if pattern.kind() != "identifier" {
            continue;
        }
        if let Some(class) = type_name(base, &annotation) {
            bindings.insert(base.get_node_text(&pattern), class);
        }
    }

    bindings
}

/// Classes of `this.<field>` members declared by a class body.
///
/// Sources: field annotations and initializers, constructor parameter
/// properties, and `this.x = new X()` assignments inside the constructor.
pub(crate) fn collect_field_types(base: &BaseExtractor, class_node: &Node) -> HashMap<String, String> {
    let mut fields = HashMap::new();
    let Some(body) = class_node.child_by_field_name("body") else {
        return fields;
    };

    let mut cursor = body.walk();
    for member in body.named_children(&mut cursor) {
        match member.kind() {
            "public_field_definition" | "field_definition" => {
                let Some(key) = member
                    .child_by_field_name("name")
                    .or_else(|| member.child_by_field_name("property"))
                else {
                    continue;
                };
                let class = member
                    .child_by_field_name("type")
                    .and_then(|annotation| type_name(base, &annotation))
                    .or_else(|| {
                        member
                            .child_by_field_name("value")
                            .and_then(|value| value_class(base, &value))
                    });
                if let Some(class) = class {
                    fields.insert(base.get_node_text(&key), class);
                }
            }
            "method_definition" => {
                if base.get_field_text(&member, "name").as_deref() != Some("constructor") {
                    continue;
                }
                collect_parameter_properties(base, &member, &mut fields);
                if let Some(constructor_body) = member.child_by_field_name("body") {
                    collect_constructor_assignments(base, &constructor_body, &mut fields);
                }
            }
            _ => {}
        }
    }

    fields
}

/// `constructor(private repo: Repo)` declares `this.repo: Repo`
fn collect_parameter_properties(
    base: &BaseExtractor,
    constructor: &Node,
    fields: &mut HashMap<String, String>,
) {
    let Some(parameters) = constructor.child_by_field_name("parameters") else {
        return;
    };
    let mut cursor = parameters.walk();
    for parameter in parameters.named_children(&mut cursor) {
        let is_property = base.find_child_by_type(&parameter, "accessibility_modifier").is_some()
            || base.has_token(&parameter, "readonly");
        if !is_property {
            continue;
        }
        let (Some(pattern), Some(annotation)) = (
            parameter.child_by_field_name("pattern"),
            parameter.child_by_field_name("type"),
        ) else {
            continue;
        };
        if let Some(class) = type_name(base, &annotation) {
            fields
                .entry(base.get_node_text(&pattern))
                .or_insert(class);
        }
    }
}

/// `this.x = new X()` anywhere in a constructor body (nested functions excluded)
fn collect_constructor_assignments(
    base: &BaseExtractor,
    node: &Node,
    fields: &mut HashMap<String, String>,
) {
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "function_declaration" | "function_expression" | "function" | "class" => continue,
            "assignment_expression" => {
                if let (Some(left), Some(right)) = (
                    child.child_by_field_name("left"),
                    child.child_by_field_name("right"),
                ) {
                    let is_this_member = left.kind() == "member_expression"
                        && left
                            .child_by_field_name("object")
                            .map(|object| object.kind() == "this")
                            .unwrap_or(false);
                    if is_this_member {
                        if let (Some(field), Some(class)) = (
                            base.get_field_text(&left, "property"),
                            value_class(base, &right),
                        ) {
                            fields.entry(field).or_insert(class);
                        }
                    }
                }
                collect_constructor_assignments(base, &child, fields);
            }
            _ => collect_constructor_assignments(base, &child, fields),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::typescript::test_support::parse;

    fn find<'a>(node: Node<'a>, kind: &str) -> Option<Node<'a>> {
        if node.kind() == kind {
            return Some(node);
        }
        let mut cursor = node.walk();
        let children: Vec<_> = node.children(&mut cursor).collect();
        children.into_iter().find_map(|child| find(child, kind))
    }

    #[test]
    fn test_declared_binding_sources() {
        let cases = [
            ("const r: Repo = make();", Some("Repo")),
            ("const r: Repo<User> = make();", Some("Repo")),
            ("const r: db.Repo = make();", Some("Repo")),
            ("const r = new Repo();", Some("Repo")),
            ("const r = new models.Repo();", Some("Repo")),
            ("const r = make() as Repo;", Some("Repo")),
            ("const r: string = '';", None),
            ("const r = make();", None),
        ];

        for (code, expected) in cases {
            let (extractor, tree) = parse("src/t.ts", code);
            let declarator = find(tree.root_node(), "variable_declarator").unwrap();
            let binding = declared_binding(extractor.base(), &declarator);
            assert_eq!(
                binding.as_ref().map(|(_, class)| class.as_str()),
                expected,
                "{}",
                code
            );
        }
    }

    #[test]
    fn test_field_types() {
        let code = r#"
class Service {
    private cache: Cache;
    logger = new Logger();
    constructor(private repo: Repo, name: string, other: Other) {
        this.queue = new Queue();
    }
}
"#;
        let (extractor, tree) = parse("src/s.ts", code);
        let class = find(tree.root_node(), "class_declaration").unwrap();
        let fields = collect_field_types(extractor.base(), &class);

        assert_eq!(fields.get("cache").map(String::as_str), Some("Cache"));
        assert_eq!(fields.get("logger").map(String::as_str), Some("Logger"));
        assert_eq!(fields.get("repo").map(String::as_str), Some("Repo"));
        assert_eq!(fields.get("queue").map(String::as_str), Some("Queue"));
        assert!(!fields.contains_key("name"));
        assert!(!fields.contains_key("other"));
    }
}
