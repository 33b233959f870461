//! Syntactic pattern detection
//!
//! One walk over the tree; each node category feeds the detectors that care
//! about it. Detectors are independent, so one construct can yield several
//! records (an IIFE is both a module pattern and a closure).

use tree_sitter::{Node, Tree};

use super::types::*;
use super::{ASYNC_CALLEE, PROTOTYPE_MEMBER};
use crate::extractors::base::tree_methods::{
    is_field_of, parent_skipping_parens, unwrap_parens, walk_tree,
};
use crate::extractors::base::{BaseExtractor, NodeCategory};
use crate::extractors::typescript::SymbolTable;

const MAX_TEXT: usize = 120;

/// Detect every pattern in one file
pub fn detect_patterns(base: &BaseExtractor, tree: &Tree, table: &SymbolTable) -> PatternSet {
    let mut patterns = PatternSet::default();

    walk_tree(tree.root_node(), &mut |node| match NodeCategory::of(&node) {
        NodeCategory::ElementAccess => detect_dynamic_access(base, node, &mut patterns),
        NodeCategory::Assignment => {
            detect_prototype_method(base, node, &mut patterns);
            detect_commonjs_assignment(base, node, &mut patterns);
        }
        NodeCategory::Call => {
            detect_iife(base, node, table, &mut patterns);
            detect_module_call(base, node, &mut patterns);
            detect_callback(base, node, &mut patterns);
        }
        NodeCategory::FunctionDeclaration => detect_nested_closure(base, node, &mut patterns),
        NodeCategory::FunctionExpression => detect_function_expression(base, node, &mut patterns),
        NodeCategory::ObjectLiteral => detect_object_literal(base, node, &mut patterns),
        _ => {}
    });

    patterns
}

/// `obj[key]` as read, write or call target
fn detect_dynamic_access(base: &BaseExtractor, node: Node, patterns: &mut PatternSet) {
    let (Some(object), Some(index)) = (
        node.child_by_field_name("object"),
        node.child_by_field_name("index"),
    ) else {
        return;
    };

    let access_type = match parent_skipping_parens(node) {
        Some(parent)
            if matches!(
                parent.kind(),
                "assignment_expression" | "augmented_assignment_expression"
            ) && is_field_of(node, parent, "left") =>
        {
            AccessType::Write
        }
        Some(parent) if parent.kind() == "call_expression" && is_field_of(node, parent, "function") => {
            AccessType::Call
        }
        _ => AccessType::Read,
    };

    patterns.dynamic_property_accesses.push(DynamicPropertyAccess {
        object: base.truncate_text(&object, MAX_TEXT),
        property: base.truncate_text(&index, MAX_TEXT),
        access_type,
        location: base.location(&node),
    });
}

/// `Ctor.prototype.method = …`
fn detect_prototype_method(base: &BaseExtractor, node: Node, patterns: &mut PatternSet) {
    let Some(left) = node.child_by_field_name("left") else {
        return;
    };
    let left_text = base.get_node_text(&left);
    let Some(captures) = PROTOTYPE_MEMBER.captures(&left_text) else {
        return;
    };

    let is_function = node
        .child_by_field_name("right")
        .map(|right| NodeCategory::of(&unwrap_parens(right)) == NodeCategory::FunctionExpression)
        .unwrap_or(false);

    patterns.prototype_methods.push(PrototypeMethod {
        constructor: captures[1].to_string(),
        method_name: captures[2].to_string(),
        is_function,
        location: base.location(&node),
    });
}

/// `module.exports = …`, `exports.x = …`
fn detect_commonjs_assignment(base: &BaseExtractor, node: Node, patterns: &mut PatternSet) {
    let Some(left) = node.child_by_field_name("left") else {
        return;
    };
    let target = base.get_node_text(&left);

    let exported_names = if target == "module.exports" {
        vec!["default".to_string()]
    } else if let Some(name) = target
        .strip_prefix("module.exports.")
        .or_else(|| target.strip_prefix("exports."))
    {
        vec![name.to_string()]
    } else {
        return;
    };

    patterns.module_patterns.push(ModulePattern {
        pattern_type: ModulePatternType::CommonJs,
        exported_names,
        location: base.location(&node),
    });
}

/// `(function () { … })()`: an IIFE module pattern plus a closure, same location
fn detect_iife(base: &BaseExtractor, node: Node, table: &SymbolTable, patterns: &mut PatternSet) {
    let Some(function) = node.child_by_field_name("function").map(unwrap_parens) else {
        return;
    };
    if NodeCategory::of(&function) != NodeCategory::FunctionExpression {
        return;
    }

    let location = base.location(&node);
    let text = base.get_node_text(&node);
    let pattern_type = if text.contains("define.amd") && text.contains("exports") {
        ModulePatternType::Umd
    } else {
        ModulePatternType::Iife
    };

    patterns.module_patterns.push(ModulePattern {
        pattern_type,
        exported_names: returned_object_keys(base, function),
        location: location.clone(),
    });

    patterns.closures.push(Closure {
        name: table
            .scopes
            .get(&function.id())
            .map(|entry| entry.name.clone()),
        closure_type: ClosureType::Iife,
        inner_function_count: count_inner_functions(function),
        location,
    });
}

/// `require('x')`, `require([...], fn)`, `define(...)`
fn detect_module_call(base: &BaseExtractor, node: Node, patterns: &mut PatternSet) {
    let Some(function) = node.child_by_field_name("function") else {
        return;
    };
    if function.kind() != "identifier" {
        return;
    }
    let first_argument = node
        .child_by_field_name("arguments")
        .and_then(|arguments| arguments.named_child(0));

    let pattern_type = match (base.get_node_text(&function).as_str(), first_argument) {
        ("require", Some(argument)) if argument.kind() == "string" => ModulePatternType::CommonJs,
        ("require", Some(argument)) if argument.kind() == "array" => ModulePatternType::Amd,
        ("define", Some(_)) => ModulePatternType::Amd,
        _ => return,
    };

    patterns.module_patterns.push(ModulePattern {
        pattern_type,
        exported_names: Vec::new(),
        location: base.location(&node),
    });
}

/// A call with at least one function argument; one record per call
fn detect_callback(base: &BaseExtractor, node: Node, patterns: &mut PatternSet) {
    let (Some(function), Some(arguments)) = (
        node.child_by_field_name("function"),
        node.child_by_field_name("arguments"),
    ) else {
        return;
    };

    let mut cursor = arguments.walk();
    let first_function = arguments
        .named_children(&mut cursor)
        .enumerate()
        .find(|(_, argument)| {
            NodeCategory::of(&unwrap_parens(*argument)) == NodeCategory::FunctionExpression
        });
    let Some((argument_index, argument)) = first_function else {
        return;
    };

    let callee = base.truncate_text(&function, MAX_TEXT);
    patterns.callbacks.push(Callback {
        is_async: ASYNC_CALLEE.is_match(&callee),
        callee,
        argument_index,
        is_arrow: unwrap_parens(argument).kind() == "arrow_function",
        location: base.location(&node),
    });
}

/// Function declarations that define at least one function inside them
fn detect_nested_closure(base: &BaseExtractor, node: Node, patterns: &mut PatternSet) {
    let inner_function_count = count_inner_functions(node);
    if inner_function_count == 0 {
        return;
    }

    patterns.closures.push(Closure {
        name: base.get_field_text(&node, "name"),
        closure_type: ClosureType::NestedFunction,
        inner_function_count,
        location: base.location(&node),
    });
}

fn detect_function_expression(base: &BaseExtractor, node: Node, patterns: &mut PatternSet) {
    patterns.function_expressions.push(FunctionExpression {
        name: base.get_field_text(&node, "name"),
        assigned_to: assignment_target(base, node),
        is_arrow: node.kind() == "arrow_function",
        is_async: base.has_token(&node, "async"),
        is_generator: node.kind() == "generator_function" || base.has_token(&node, "*"),
        location: base.location(&node),
    });
}

fn detect_object_literal(base: &BaseExtractor, node: Node, patterns: &mut PatternSet) {
    let mut property_names = Vec::new();
    let mut method_names = Vec::new();
    let mut member_count = 0;

    let mut cursor = node.walk();
    for member in node.named_children(&mut cursor) {
        match member.kind() {
            "comment" => continue,
            "pair" => {
                if let Some(key) = member.child_by_field_name("key") {
                    let name = key_text(base, key);
                    let holds_function = member
                        .child_by_field_name("value")
                        .map(|value| {
                            NodeCategory::of(&unwrap_parens(value))
                                == NodeCategory::FunctionExpression
                        })
                        .unwrap_or(false);
                    if holds_function {
                        method_names.push(name);
                    } else {
                        property_names.push(name);
                    }
                }
            }
            "method_definition" => {
                if let Some(key) = member.child_by_field_name("name") {
                    method_names.push(key_text(base, key));
                }
            }
            "shorthand_property_identifier" => property_names.push(base.get_node_text(&member)),
            _ => {}
        }
        member_count += 1;
    }

    if member_count == 0 {
        return;
    }

    patterns.object_literals.push(ObjectLiteral {
        property_names,
        method_names,
        location: base.location(&node),
    });
}

fn key_text(base: &BaseExtractor, key: Node) -> String {
    match key.kind() {
        "string" => base.string_literal_value(&key),
        _ => base.get_node_text(&key),
    }
}

/// Function-like nodes strictly inside `node`
fn count_inner_functions(node: Node) -> usize {
    let mut count = 0;
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk_tree(child, &mut |inner| {
            if NodeCategory::of(&inner).is_function_like() {
                count += 1;
            }
        });
    }
    count
}

/// Keys of an object literal the function returns from its top-level body
fn returned_object_keys(base: &BaseExtractor, function: Node) -> Vec<String> {
    let Some(body) = function.child_by_field_name("body") else {
        return Vec::new();
    };

    let object = if body.kind() == "statement_block" {
        let mut cursor = body.walk();
        let returned = body
            .named_children(&mut cursor)
            .filter(|statement| statement.kind() == "return_statement")
            .find_map(|statement| statement.named_child(0));
        match returned {
            Some(value) => unwrap_parens(value),
            None => return Vec::new(),
        }
    } else {
        unwrap_parens(body)
    };
    if object.kind() != "object" {
        return Vec::new();
    }

    let mut names = Vec::new();
    let mut cursor = object.walk();
    for member in object.named_children(&mut cursor) {
        let key = match member.kind() {
            "pair" => member.child_by_field_name("key").map(|key| key_text(base, key)),
            "method_definition" => member
                .child_by_field_name("name")
                .map(|key| key_text(base, key)),
            "shorthand_property_identifier" => Some(base.get_node_text(&member)),
            _ => None,
        };
        names.extend(key);
    }
    names
}

/// Text of whatever a function expression is assigned to
fn assignment_target(base: &BaseExtractor, node: Node) -> Option<String> {
    let parent = parent_skipping_parens(node)?;
    let target = match parent.kind() {
        "variable_declarator" if is_field_of(node, parent, "value") => parent.child_by_field_name("name")?,
        "assignment_expression" if is_field_of(node, parent, "right") => parent.child_by_field_name("left")?,
        "pair" if is_field_of(node, parent, "value") => parent.child_by_field_name("key")?,
        "public_field_definition" | "field_definition" if is_field_of(node, parent, "value") => parent
            .child_by_field_name("name")
            .or_else(|| parent.child_by_field_name("property"))?,
        _ => return None,
    };
    Some(key_text(base, target))
}
