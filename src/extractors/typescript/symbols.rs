//! Core symbol extraction logic
//!
//! This module owns the depth-first walk of the symbol table builder and routes
//! each node category to the module that knows how to turn it into a Symbol.
//! The walk also records, for every node that opens a scope (class, function,
//! method, field initializer), which symbol owns it; the relation extractor
//! uses that map to name the caller of each call site.

use std::collections::{HashMap, HashSet};

use super::{classes, functions, imports_exports, interfaces, variables, TypeScriptExtractor};
use crate::extractors::base::tree_methods::unwrap_parens;
use crate::extractors::base::{CallerContext, NodeCategory, Symbol, SymbolKind};
use crate::extractors::typescript::helpers::NamingScope;
use tree_sitter::{Node, Tree};

/// Symbols of one file plus the scope ownership map
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    pub symbols: Vec<Symbol>,
    /// tree-sitter node id -> symbol owning that scope
    pub scopes: HashMap<usize, ScopeEntry>,
    /// class name -> superclass name as written
    pub heritage: HashMap<String, String>,
    /// Ids of symbols other code can reach by name at module scope
    pub module_scope: HashSet<String>,
    /// symbol id -> id of the declaration it is nested in
    pub scope_parents: HashMap<String, String>,
}

impl SymbolTable {
    /// Names usable as a static receiver: classes plus anything that owns members
    pub fn type_names(&self) -> HashSet<String> {
        self.symbols
            .iter()
            .filter_map(|symbol| match symbol.kind {
                SymbolKind::Class => Some(symbol.name.clone()),
                _ => symbol.class_name.clone(),
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeEntry {
    pub name: String,
    pub class_name: Option<String>,
    pub symbol_id: String,
    pub kind: SymbolKind,
}

impl ScopeEntry {
    pub fn caller_context(&self) -> CallerContext {
        CallerContext {
            name: self.name.clone(),
            class_name: self.class_name.clone(),
            symbol_id: Some(self.symbol_id.clone()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum ContainerKind {
    Class,
    Interface,
    Function,
    Member,
}

/// An enclosing declaration during the walk
#[derive(Debug, Clone)]
pub(super) struct Container {
    pub qualified_name: String,
    pub name: String,
    pub symbol_id: String,
    pub kind: ContainerKind,
}

/// Mutable state threaded through one file's walk
pub(super) struct BuilderContext {
    pub table: SymbolTable,
    pub containers: Vec<Container>,
    pub exported_locals: HashSet<String>,
    pub declared_types: HashSet<String>,
    /// `module.exports = { … }` object nodes; their members are module scope
    pub export_objects: HashSet<usize>,
    /// `(name, class)` of members already visible; accessor pairs and
    /// overload signatures keep the first
    pub member_keys: HashSet<(String, String)>,
}

impl BuilderContext {
    /// Owning class when the walk is directly inside a class body
    pub fn enclosing_class(&self) -> Option<String> {
        self.containers
            .last()
            .filter(|container| container.kind == ContainerKind::Class)
            .map(|container| container.name.clone())
    }

    pub fn enclosing_interface(&self) -> Option<String> {
        self.containers
            .last()
            .filter(|container| container.kind == ContainerKind::Interface)
            .map(|container| container.name.clone())
    }

    pub fn at_top_level(&self) -> bool {
        self.containers.is_empty()
    }

    /// Context used in synthetic names (`Service.run`, or `module` at top level)
    pub fn context_label(&self) -> String {
        self.containers
            .last()
            .map(|container| container.qualified_name.clone())
            .unwrap_or_else(|| "module".to_string())
    }

    pub fn naming_scope(&self) -> NamingScope<'_> {
        NamingScope {
            member_of_class: self
                .containers
                .last()
                .filter(|container| container.kind == ContainerKind::Class)
                .map(|container| container.name.as_str()),
            at_top_level: self.at_top_level(),
            exported_locals: &self.exported_locals,
            declared_types: &self.declared_types,
        }
    }

    /// Add a symbol declared by `node`
    pub fn push_symbol(&mut self, node: &Node, symbol: Symbol) {
        let visible = match &symbol.class_name {
            Some(class_name) => self
                .member_keys
                .insert((symbol.name.clone(), class_name.clone())),
            None => declared_at_module_scope(node, &self.export_objects),
        };
        if visible {
            self.table.module_scope.insert(symbol.id.clone());
        }
        if let Some(parent) = self.containers.last() {
            self.table
                .scope_parents
                .insert(symbol.id.clone(), parent.symbol_id.clone());
        }
        self.table.symbols.push(symbol);
    }

    /// Record `symbol` as the owner of the scope opened by `node`
    pub fn register(&mut self, node: &Node, symbol: Symbol, kind: ContainerKind) -> Container {
        let container = Container {
            qualified_name: symbol.qualified_name(),
            name: symbol.name.clone(),
            symbol_id: symbol.id.clone(),
            kind,
        };
        self.table.scopes.insert(
            node.id(),
            ScopeEntry {
                name: symbol.name.clone(),
                class_name: symbol.class_name.clone(),
                symbol_id: symbol.id.clone(),
                kind: symbol.kind,
            },
        );
        self.push_symbol(node, symbol);
        container
    }
}

/// Every ancestor up to the program is a declaration wrapper, not a block,
/// function body or plain object literal
fn declared_at_module_scope(node: &Node, export_objects: &HashSet<usize>) -> bool {
    let mut current = node.parent();
    while let Some(parent) = current {
        match parent.kind() {
            "program" => return true,
            "export_statement"
            | "lexical_declaration"
            | "variable_declaration"
            | "variable_declarator"
            | "object_pattern"
            | "array_pattern"
            | "pair_pattern"
            | "assignment_pattern"
            | "object_assignment_pattern"
            | "rest_pattern"
            | "parenthesized_expression"
            | "expression_statement"
            | "assignment_expression"
            | "pair" => {}
            "object" if export_objects.contains(&parent.id()) => {}
            _ => return false,
        }
        current = parent.parent();
    }
    false
}

/// Extract all symbols from the syntax tree
pub(super) fn extract_symbols(extractor: &TypeScriptExtractor, tree: &Tree) -> SymbolTable {
    let root = tree.root_node();
    let mut ctx = BuilderContext {
        table: SymbolTable::default(),
        containers: Vec::new(),
        exported_locals: imports_exports::collect_exported_locals(extractor.base(), root),
        declared_types: collect_declared_types(extractor, root),
        export_objects: collect_export_objects(extractor, root),
        member_keys: HashSet::new(),
    };
    visit_node(extractor, &mut ctx, root);
    ctx.table
}

/// Recursively visit nodes and extract symbols based on node category
fn visit_node(extractor: &TypeScriptExtractor, ctx: &mut BuilderContext, node: Node) {
    let container = match NodeCategory::of(&node) {
        NodeCategory::Class => classes::extract_class(extractor, ctx, node),
        NodeCategory::Interface if extractor.base().is_typescript() => {
            interfaces::extract_interface(extractor, ctx, node)
        }
        NodeCategory::FunctionDeclaration => {
            functions::extract_function_declaration(extractor, ctx, node)
        }
        NodeCategory::FunctionExpression => {
            functions::extract_function_expression(extractor, ctx, node)
        }
        NodeCategory::Method => functions::extract_method(extractor, ctx, node),
        NodeCategory::MethodSignature => {
            interfaces::extract_method_signature(extractor, ctx, node);
            None
        }
        NodeCategory::PropertySignature => {
            interfaces::extract_property_signature(extractor, ctx, node);
            None
        }
        NodeCategory::Field => classes::extract_field(extractor, ctx, node),
        NodeCategory::VariableDeclarator => {
            variables::extract_declarator(extractor, ctx, node);
            None
        }
        _ => None,
    };

    let pushed = container.is_some();
    if let Some(container) = container {
        ctx.containers.push(container);
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        visit_node(extractor, ctx, child);
    }

    if pushed {
        ctx.containers.pop();
    }
}

/// Object literals assigned to `module.exports` by a top-level statement
fn collect_export_objects(extractor: &TypeScriptExtractor, root: Node) -> HashSet<usize> {
    let base = extractor.base();
    let mut objects = HashSet::new();

    let mut cursor = root.walk();
    for statement in root.named_children(&mut cursor) {
        if statement.kind() != "expression_statement" {
            continue;
        }
        let Some(assignment) = statement.named_child(0) else {
            continue;
        };
        if assignment.kind() != "assignment_expression" {
            continue;
        }
        let (Some(left), Some(right)) = (
            assignment.child_by_field_name("left"),
            assignment.child_by_field_name("right"),
        ) else {
            continue;
        };
        let right = unwrap_parens(right);
        if right.kind() == "object" && base.get_node_text(&left) == "module.exports" {
            objects.insert(right.id());
        }
    }

    objects
}

/// Top-level classes and functions, the only receivers a static member
/// assignment (`Ctor.m = function () {}`) can attach a method to
fn collect_declared_types(extractor: &TypeScriptExtractor, root: Node) -> HashSet<String> {
    let base = extractor.base();
    let mut names = HashSet::new();

    let mut cursor = root.walk();
    for statement in root.named_children(&mut cursor) {
        let declaration = match statement.kind() {
            "export_statement" => match statement.child_by_field_name("declaration") {
                Some(declaration) => declaration,
                None => continue,
            },
            _ => statement,
        };

        match declaration.kind() {
            "class_declaration"
            | "abstract_class_declaration"
            | "function_declaration"
            | "generator_function_declaration" => {
                if let Some(name) = base.get_field_text(&declaration, "name") {
                    names.insert(name);
                }
            }
            "lexical_declaration" | "variable_declaration" => {
                let mut inner = declaration.walk();
                for declarator in declaration.named_children(&mut inner) {
                    if declarator.kind() != "variable_declarator" {
                        continue;
                    }
                    let is_type_like = declarator
                        .child_by_field_name("value")
                        .map(|value| {
                            let value = unwrap_parens(value);
                            value.kind() == "class"
                                || NodeCategory::of(&value) == NodeCategory::FunctionExpression
                        })
                        .unwrap_or(false);
                    if is_type_like {
                        if let Some(name) = base.get_field_text(&declarator, "name") {
                            names.insert(name);
                        }
                    }
                }
            }
            _ => {}
        }
    }

    names
}
