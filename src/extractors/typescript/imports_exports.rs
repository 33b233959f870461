//! Import and export edge extraction
//!
//! ES module statements, CommonJS `require`/`module.exports`, and dynamic
//! `import()`. Each edge keeps the specifier as written; the linker resolves
//! specifiers to files.

use std::collections::HashSet;

use super::helpers;
use super::variables::collect_bound_names;
use crate::extractors::base::tree_methods::{parent_skipping_parens, unwrap_parens, walk_tree};
use crate::extractors::base::{
    BaseExtractor, ExportKind, ExportRelation, ImportKind, ImportRelation, NameBinding,
    NodeCategory,
};
use crate::extractors::typescript::TypeScriptExtractor;
use tree_sitter::{Node, Tree};

/// Module-level edges of one file
#[derive(Debug, Clone, Default)]
pub struct ModuleEdges {
    pub imports: Vec<ImportRelation>,
    pub exports: Vec<ExportRelation>,
    /// Local name of the default export, when it has one
    pub default_export: Option<String>,
}

/// Walk the whole tree collecting import and export edges
pub(super) fn extract_module_edges(extractor: &TypeScriptExtractor, tree: &Tree) -> ModuleEdges {
    let base = extractor.base();
    let mut edges = ModuleEdges::default();

    walk_tree(tree.root_node(), &mut |node| match NodeCategory::of(&node) {
        NodeCategory::Import => {
            if let Some(import) = extract_import(base, node) {
                edges.imports.push(import);
            }
        }
        NodeCategory::Export => extract_export(base, node, &mut edges),
        NodeCategory::Call => {
            if let Some(import) = extract_call_import(base, node) {
                edges.imports.push(import);
            }
        }
        NodeCategory::Assignment => extract_commonjs_export(base, node, &mut edges),
        _ => {}
    });

    edges
}

/// `import … from '…'`, `import '…'`, and TypeScript `import x = require('…')`
fn extract_import(base: &BaseExtractor, node: Node) -> Option<ImportRelation> {
    let Some(source) = node.child_by_field_name("source") else {
        let clause = base.find_child_by_type(&node, "import_require_clause")?;
        let source = clause.child_by_field_name("source")?;
        let local = base.find_child_by_type(&clause, "identifier")?;
        return Some(import_relation(
            base,
            node,
            base.string_literal_value(&source),
            vec![NameBinding::new(base.get_node_text(&local), "*")],
            ImportKind::Require,
        ));
    };
    let specifier = base.string_literal_value(&source);

    let Some(clause) = base.find_child_by_type(&node, "import_clause") else {
        return Some(import_relation(base, node, specifier, Vec::new(), ImportKind::SideEffect));
    };

    let mut bindings = Vec::new();
    let mut cursor = clause.walk();
    for child in clause.named_children(&mut cursor) {
        match child.kind() {
            "identifier" => bindings.push(NameBinding::new(base.get_node_text(&child), "default")),
            "namespace_import" => {
                if let Some(local) = base.find_child_by_type(&child, "identifier") {
                    bindings.push(NameBinding::new(base.get_node_text(&local), "*"));
                }
            }
            "named_imports" => {
                let mut inner = child.walk();
                for specifier_node in child.named_children(&mut inner) {
                    if specifier_node.kind() != "import_specifier" {
                        continue;
                    }
                    let Some(name) = specifier_node.child_by_field_name("name") else {
                        continue;
                    };
                    let imported = helpers::property_key_text(base, &name);
                    let local = specifier_node
                        .child_by_field_name("alias")
                        .map(|alias| base.get_node_text(&alias))
                        .unwrap_or_else(|| imported.clone());
                    bindings.push(NameBinding::new(local, imported));
                }
            }
            _ => {}
        }
    }

    let kind = if base.has_token(&node, "type") {
        ImportKind::TypeOnly
    } else {
        ImportKind::Static
    };
    Some(import_relation(base, node, specifier, bindings, kind))
}

/// `require('…')` with a literal argument and `import('…')`
fn extract_call_import(base: &BaseExtractor, node: Node) -> Option<ImportRelation> {
    let function = node.child_by_field_name("function")?;
    let arguments = node.child_by_field_name("arguments")?;
    let first = arguments.named_child(0)?;
    if first.kind() != "string" {
        return None;
    }
    let specifier = base.string_literal_value(&first);

    match function.kind() {
        "import" => Some(import_relation(base, node, specifier, Vec::new(), ImportKind::Dynamic)),
        "identifier" if base.get_node_text(&function) == "require" => {
            let bindings = require_bindings(base, node);
            Some(import_relation(base, node, specifier, bindings, ImportKind::Require))
        }
        _ => None,
    }
}

/// Names bound by the declarator around a `require` call.
///
/// `const m = require('x')` binds the module object, recorded as a namespace
/// binding; destructuring and `require('x').name` bind single exports.
fn require_bindings(base: &BaseExtractor, call: Node) -> Vec<NameBinding> {
    let Some(mut parent) = parent_skipping_parens(call) else {
        return Vec::new();
    };

    let mut imported = "*".to_string();
    if parent.kind() == "member_expression" {
        let Some(property) = parent.child_by_field_name("property") else {
            return Vec::new();
        };
        imported = base.get_node_text(&property);
        match parent_skipping_parens(parent) {
            Some(grand) => parent = grand,
            None => return Vec::new(),
        }
    }

    if parent.kind() != "variable_declarator" {
        return Vec::new();
    }
    let Some(name) = parent.child_by_field_name("name") else {
        return Vec::new();
    };

    match name.kind() {
        "identifier" => vec![NameBinding::new(base.get_node_text(&name), imported)],
        "object_pattern" if imported == "*" => {
            let mut bindings = Vec::new();
            let mut cursor = name.walk();
            for property in name.named_children(&mut cursor) {
                match property.kind() {
                    "shorthand_property_identifier_pattern" => {
                        let text = base.get_node_text(&property);
                        bindings.push(NameBinding::new(text.clone(), text));
                    }
                    "pair_pattern" => {
                        let key = property.child_by_field_name("key");
                        let value = property.child_by_field_name("value");
                        if let (Some(key), Some(value)) = (key, value) {
                            if value.kind() == "identifier" {
                                bindings.push(NameBinding::new(
                                    base.get_node_text(&value),
                                    helpers::property_key_text(base, &key),
                                ));
                            }
                        }
                    }
                    _ => {}
                }
            }
            bindings
        }
        _ => Vec::new(),
    }
}

fn import_relation(
    base: &BaseExtractor,
    node: Node,
    specifier: String,
    bindings: Vec<NameBinding>,
    kind: ImportKind,
) -> ImportRelation {
    let mut imported_names: Vec<String> = Vec::new();
    for binding in &bindings {
        if !imported_names.contains(&binding.imported) {
            imported_names.push(binding.imported.clone());
        }
    }

    ImportRelation {
        file_path: base.file_path.clone(),
        specifier,
        resolved_file_path: None,
        imported_names,
        bindings,
        kind,
        location: base.location(&node),
    }
}

/// Every `export …` form
fn extract_export(base: &BaseExtractor, node: Node, edges: &mut ModuleEdges) {
    let specifier = node
        .child_by_field_name("source")
        .map(|source| base.string_literal_value(&source));
    let is_default = base.has_token(&node, "default");

    let (kind, bindings) = if let Some(declaration) = node.child_by_field_name("declaration") {
        let names = declaration_names(base, declaration);
        if is_default {
            edges.default_export = names.first().cloned();
            let bindings = names
                .into_iter()
                .take(1)
                .map(|name| NameBinding::new(name, "default"))
                .collect();
            (ExportKind::Default, bindings)
        } else {
            let bindings = names
                .into_iter()
                .map(|name| NameBinding::new(name.clone(), name))
                .collect();
            (ExportKind::Declaration, bindings)
        }
    } else if is_default || base.has_token(&node, "=") {
        // `export default <expr>` and TypeScript `export = <expr>`
        let value = match node.child_by_field_name("value") {
            Some(value) => Some(value),
            None => {
                let mut cursor = node.walk();
                let last = node.named_children(&mut cursor).last();
                last
            }
        };
        let local = value.and_then(|value| default_export_name(base, unwrap_parens(value)));
        edges.default_export = local.clone();
        let kind = if is_default {
            ExportKind::Default
        } else {
            ExportKind::CommonJs
        };
        let bindings = local
            .map(|local| vec![NameBinding::new(local, "default")])
            .unwrap_or_default();
        push_export(base, node, edges, None, vec!["default".to_string()], bindings, kind);
        return;
    } else if let Some(clause) = base.find_child_by_type(&node, "export_clause") {
        let kind = if specifier.is_some() {
            ExportKind::ReExport
        } else {
            ExportKind::Named
        };
        (kind, clause_bindings(base, clause))
    } else if specifier.is_some() {
        match base.find_child_by_type(&node, "namespace_export") {
            Some(namespace) => {
                let bindings = namespace
                    .named_child(0)
                    .map(|alias| vec![NameBinding::new("*", helpers::property_key_text(base, &alias))])
                    .unwrap_or_default();
                (ExportKind::ReExport, bindings)
            }
            None => {
                push_export(
                    base,
                    node,
                    edges,
                    specifier,
                    vec!["*".to_string()],
                    Vec::new(),
                    ExportKind::ReExportAll,
                );
                return;
            }
        }
    } else {
        return;
    };

    let names = bindings.iter().map(|b| b.imported.clone()).collect();
    push_export(base, node, edges, specifier, names, bindings, kind);
}

/// `module.exports = …`, `exports.a = …`, `module.exports.a = …`
fn extract_commonjs_export(base: &BaseExtractor, node: Node, edges: &mut ModuleEdges) {
    let (Some(left), Some(right)) = (
        node.child_by_field_name("left"),
        node.child_by_field_name("right"),
    ) else {
        return;
    };
    let target = base.get_node_text(&left);
    if !helpers::is_commonjs_export_target(&target) {
        return;
    }
    let right = unwrap_parens(right);

    if target == "module.exports" {
        if right.kind() == "object" {
            let bindings = object_export_bindings(base, right);
            let names = bindings.iter().map(|b| b.imported.clone()).collect();
            push_export(base, node, edges, None, names, bindings, ExportKind::CommonJs);
        } else {
            let local = default_export_name(base, right);
            edges.default_export = local.clone();
            let bindings = local
                .map(|local| vec![NameBinding::new(local, "default")])
                .unwrap_or_default();
            push_export(
                base,
                node,
                edges,
                None,
                vec!["default".to_string()],
                bindings,
                ExportKind::CommonJs,
            );
        }
        return;
    }

    let Some(property) = left.child_by_field_name("property") else {
        return;
    };
    let exported = base.get_node_text(&property);
    let local = match right.kind() {
        "identifier" => base.get_node_text(&right),
        _ => exported.clone(),
    };
    push_export(
        base,
        node,
        edges,
        None,
        vec![exported.clone()],
        vec![NameBinding::new(local, exported)],
        ExportKind::CommonJs,
    );
}

#[allow(clippy::too_many_arguments)]
fn push_export(
    base: &BaseExtractor,
    node: Node,
    edges: &mut ModuleEdges,
    specifier: Option<String>,
    exported_names: Vec<String>,
    bindings: Vec<NameBinding>,
    kind: ExportKind,
) {
    edges.exports.push(ExportRelation {
        file_path: base.file_path.clone(),
        specifier,
        resolved_file_path: None,
        exported_names,
        bindings,
        kind,
        location: base.location(&node),
    });
}

/// `{ a, b as c }` -> (a, a), (b, c)
fn clause_bindings(base: &BaseExtractor, clause: Node) -> Vec<NameBinding> {
    let mut bindings = Vec::new();
    let mut cursor = clause.walk();
    for specifier in clause.named_children(&mut cursor) {
        if specifier.kind() != "export_specifier" {
            continue;
        }
        let Some(name) = specifier.child_by_field_name("name") else {
            continue;
        };
        let local = helpers::property_key_text(base, &name);
        let exported = specifier
            .child_by_field_name("alias")
            .map(|alias| helpers::property_key_text(base, &alias))
            .unwrap_or_else(|| local.clone());
        bindings.push(NameBinding::new(local, exported));
    }
    bindings
}

/// `module.exports = { a, b: c, d() {} }` -> (a, a), (c, b), (d, d)
fn object_export_bindings(base: &BaseExtractor, object: Node) -> Vec<NameBinding> {
    let mut bindings = Vec::new();
    let mut cursor = object.walk();
    for member in object.named_children(&mut cursor) {
        match member.kind() {
            "shorthand_property_identifier" => {
                let name = base.get_node_text(&member);
                bindings.push(NameBinding::new(name.clone(), name));
            }
            "pair" => {
                let Some(key) = member.child_by_field_name("key") else {
                    continue;
                };
                let exported = helpers::property_key_text(base, &key);
                let local = match member.child_by_field_name("value").map(unwrap_parens) {
                    Some(value) if value.kind() == "identifier" => base.get_node_text(&value),
                    _ => exported.clone(),
                };
                bindings.push(NameBinding::new(local, exported));
            }
            "method_definition" => {
                if let Some(name) = member.child_by_field_name("name") {
                    let name = helpers::property_key_text(base, &name);
                    bindings.push(NameBinding::new(name.clone(), name));
                }
            }
            _ => {}
        }
    }
    bindings
}

/// Local name behind a default export value, matching the symbol builder
fn default_export_name(base: &BaseExtractor, value: Node) -> Option<String> {
    match value.kind() {
        "identifier" => Some(base.get_node_text(&value)),
        _ if value.kind() == "class"
            || NodeCategory::of(&value) == NodeCategory::FunctionExpression =>
        {
            Some(
                helpers::own_name(base, &value)
                    .unwrap_or_else(|| base.synthetic_name("default", &value)),
            )
        }
        _ => None,
    }
}

/// Names a declaration introduces (`export const a = 1, b = 2` -> a, b)
fn declaration_names(base: &BaseExtractor, declaration: Node) -> Vec<String> {
    match declaration.kind() {
        "lexical_declaration" | "variable_declaration" => {
            let mut names = Vec::new();
            let mut cursor = declaration.walk();
            for declarator in declaration.named_children(&mut cursor) {
                if declarator.kind() != "variable_declarator" {
                    continue;
                }
                let Some(name) = declarator.child_by_field_name("name") else {
                    continue;
                };
                let mut bound = Vec::new();
                collect_bound_names(name, &mut bound);
                names.extend(bound.iter().map(|node| base.get_node_text(node)));
            }
            names
        }
        _ => base
            .get_field_text(&declaration, "name")
            .into_iter()
            .collect(),
    }
}

/// Local names exported by name from the module scope.
///
/// Collected before the symbol walk so declarations exported further down the
/// file (`export { a }`, `module.exports = { a }`) are flagged as exported.
pub(super) fn collect_exported_locals(base: &BaseExtractor, root: Node) -> HashSet<String> {
    let mut locals = HashSet::new();

    let mut cursor = root.walk();
    for statement in root.named_children(&mut cursor) {
        match statement.kind() {
            "export_statement" => {
                if statement.child_by_field_name("source").is_some() {
                    continue;
                }
                if let Some(clause) = base.find_child_by_type(&statement, "export_clause") {
                    for binding in clause_bindings(base, clause) {
                        locals.insert(binding.local);
                    }
                } else if let Some(value) = statement.child_by_field_name("value") {
                    let value = unwrap_parens(value);
                    if value.kind() == "identifier" {
                        locals.insert(base.get_node_text(&value));
                    }
                }
            }
            "expression_statement" => {
                let Some(expression) = statement.named_child(0) else {
                    continue;
                };
                if expression.kind() != "assignment_expression" {
                    continue;
                }
                let (Some(left), Some(right)) = (
                    expression.child_by_field_name("left"),
                    expression.child_by_field_name("right"),
                ) else {
                    continue;
                };
                let target = base.get_node_text(&left);
                if !helpers::is_commonjs_export_target(&target) {
                    continue;
                }
                let right = unwrap_parens(right);
                match right.kind() {
                    "identifier" => {
                        locals.insert(base.get_node_text(&right));
                    }
                    "object" if target == "module.exports" => {
                        for binding in object_export_bindings(base, right) {
                            locals.insert(binding.local);
                        }
                    }
                    _ => {}
                }
            }
            _ => {}
        }
    }

    locals
}

#[cfg(test)]
mod tests {
    use crate::extractors::base::{ExportKind, ImportKind, NameBinding};
    use crate::extractors::typescript::test_support::parse;

    #[test]
    fn test_es_module_imports() {
        let code = r#"
import Default, { a, b as c } from './one';
import * as ns from "../two";
import type { T } from './types';
import './polyfill';
"#;
        let (extractor, tree) = parse("src/main.ts", code);
        let edges = extractor.extract_module_edges(&tree);

        assert_eq!(edges.imports.len(), 4);
        let first = &edges.imports[0];
        assert_eq!(first.specifier, "./one");
        assert_eq!(first.kind, ImportKind::Static);
        assert_eq!(
            first.bindings,
            vec![
                NameBinding::new("Default", "default"),
                NameBinding::new("a", "a"),
                NameBinding::new("c", "b"),
            ]
        );
        assert_eq!(first.imported_names, vec!["default", "a", "b"]);

        assert_eq!(edges.imports[1].specifier, "../two");
        assert_eq!(edges.imports[1].bindings, vec![NameBinding::new("ns", "*")]);
        assert_eq!(edges.imports[2].kind, ImportKind::TypeOnly);
        assert_eq!(edges.imports[3].kind, ImportKind::SideEffect);
        assert!(edges.imports[3].bindings.is_empty());
    }

    #[test]
    fn test_commonjs_and_dynamic_imports() {
        let code = r#"
const fs = require('fs');
const { join, resolve: res } = require('path');
const helper = require('./util').helper;
async function lazy() { return import('./heavy'); }
"#;
        let (extractor, tree) = parse("src/main.js", code);
        let edges = extractor.extract_module_edges(&tree);

        assert_eq!(edges.imports.len(), 4);
        assert_eq!(edges.imports[0].kind, ImportKind::Require);
        assert_eq!(edges.imports[0].bindings, vec![NameBinding::new("fs", "*")]);
        assert_eq!(
            edges.imports[1].bindings,
            vec![NameBinding::new("join", "join"), NameBinding::new("res", "resolve")]
        );
        assert_eq!(edges.imports[2].bindings, vec![NameBinding::new("helper", "helper")]);
        assert_eq!(edges.imports[3].kind, ImportKind::Dynamic);
        assert_eq!(edges.imports[3].specifier, "./heavy");
    }

    #[test]
    fn test_export_forms() {
        let code = r#"
export class A {}
export const x = 1, y = 2;
function internal() {}
export { internal as publicName };
export { a, b as bee } from './other';
export * from './all';
export * as tools from './tools';
export default function () {}
"#;
        let (extractor, tree) = parse("src/index.ts", code);
        let edges = extractor.extract_module_edges(&tree);
        let kinds: Vec<_> = edges.exports.iter().map(|e| e.kind).collect();

        assert_eq!(
            kinds,
            vec![
                ExportKind::Declaration,
                ExportKind::Declaration,
                ExportKind::Named,
                ExportKind::ReExport,
                ExportKind::ReExportAll,
                ExportKind::ReExport,
                ExportKind::Default,
            ]
        );
        assert_eq!(edges.exports[1].exported_names, vec!["x", "y"]);
        assert_eq!(
            edges.exports[2].bindings,
            vec![NameBinding::new("internal", "publicName")]
        );
        assert_eq!(edges.exports[3].specifier.as_deref(), Some("./other"));
        assert_eq!(edges.exports[3].exported_names, vec!["a", "bee"]);
        assert_eq!(edges.exports[5].bindings, vec![NameBinding::new("*", "tools")]);
        assert_eq!(edges.default_export.as_deref(), Some("default$anonymous@9:16"));
    }

    #[test]
    fn test_commonjs_exports() {
        let code = r#"
function main() {}
function util() {}
module.exports = main;
exports.run = function () {};
module.exports.util = util;
"#;
        let (extractor, tree) = parse("src/cli.js", code);
        let edges = extractor.extract_module_edges(&tree);

        assert_eq!(edges.default_export.as_deref(), Some("main"));
        assert!(edges.exports.iter().all(|e| e.kind == ExportKind::CommonJs));
        assert_eq!(edges.exports[1].bindings, vec![NameBinding::new("run", "run")]);
        assert_eq!(edges.exports[2].bindings, vec![NameBinding::new("util", "util")]);

        let table = extractor.extract_symbols(&tree);
        let run = table.symbols.iter().find(|s| s.name == "run").unwrap();
        assert!(run.is_exported);
        let main = table.symbols.iter().find(|s| s.name == "main").unwrap();
        assert!(main.is_exported);
    }
}
