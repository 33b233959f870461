//! Relation extraction
//!
//! Walks a file once more after the symbol table is built and records a call
//! draft for every call, `new` and member read. Each draft names its caller
//! from the scope ownership map, so drafts and symbols always agree on names
//! and ids. Drafts carry only what the site itself states; resolving them to
//! symbols is the linker's job.

use std::collections::{HashMap, HashSet};

use super::inference;
use super::symbols::SymbolTable;
use crate::extractors::base::tree_methods::{parent_skipping_parens, unwrap_parens};
use crate::extractors::base::{CallDraft, CallType, CallerContext, NodeCategory, Receiver};
use crate::extractors::typescript::TypeScriptExtractor;
use tree_sitter::{Node, Tree};

/// Caller name used for code at module level
pub const MODULE_CALLER: &str = "<module>";

/// Longest callee text kept on a draft
const MAX_CALLEE_TEXT: usize = 120;

/// Extract call drafts from the syntax tree
pub(crate) fn extract_relationships(
    extractor: &TypeScriptExtractor,
    tree: &Tree,
    table: &SymbolTable,
) -> Vec<CallDraft> {
    let mut walker = RelationWalker {
        extractor,
        table,
        type_names: table.type_names(),
        module_bindings: HashMap::new(),
        frames: Vec::new(),
        drafts: Vec::new(),
    };
    walker.visit(tree.root_node());
    walker.drafts
}

/// Scope frames pushed while walking
enum Frame {
    Class {
        name: String,
        superclass: Option<String>,
        field_types: HashMap<String, String>,
    },
    Function {
        caller: CallerContext,
        this_class: Option<String>,
        bindings: HashMap<String, String>,
    },
}

struct RelationWalker<'a> {
    extractor: &'a TypeScriptExtractor,
    table: &'a SymbolTable,
    type_names: HashSet<String>,
    module_bindings: HashMap<String, String>,
    frames: Vec<Frame>,
    drafts: Vec<CallDraft>,
}

impl<'a> RelationWalker<'a> {
    fn visit(&mut self, node: Node) {
        let category = NodeCategory::of(&node);
        let pushed = self.enter(node, category);

        match category {
            NodeCategory::VariableDeclarator => {
                let base = self.extractor.base();
                if let Some((name, class)) = inference::declared_binding(base, &node) {
                    self.bind(name, class);
                }
            }
            NodeCategory::Call => self.record_call(node),
            NodeCategory::New => self.record_new(node),
            NodeCategory::MemberAccess if !is_invocation_target(node) => {
                self.record_property_access(node)
            }
            _ => {}
        }

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.visit(child);
        }

        if pushed {
            self.frames.pop();
        }
    }

    /// Push a frame when `node` opens a scope the symbol table knows about
    fn enter(&mut self, node: Node, category: NodeCategory) -> bool {
        let Some(entry) = self.table.scopes.get(&node.id()) else {
            return false;
        };
        let base = self.extractor.base();

        let frame = match category {
            NodeCategory::Class => Frame::Class {
                name: entry.name.clone(),
                superclass: self.table.heritage.get(&entry.name).cloned(),
                field_types: inference::collect_field_types(base, &node),
            },
            NodeCategory::Field => Frame::Function {
                caller: entry.caller_context(),
                this_class: entry.class_name.clone(),
                bindings: HashMap::new(),
            },
            _ if category.is_function_like() => {
                // Arrow functions see the `this` of the scope they are written in
                let this_class = if node.kind() == "arrow_function" {
                    self.this_class()
                } else {
                    entry.class_name.clone()
                };
                Frame::Function {
                    caller: entry.caller_context(),
                    this_class,
                    bindings: inference::parameter_bindings(base, &node),
                }
            }
            _ => return false,
        };

        self.frames.push(frame);
        true
    }

    /// `foo()`, `a.b()`, `a[b]()`, `super()`, IIFEs
    fn record_call(&mut self, node: Node) {
        let base = self.extractor.base();
        let Some(function) = node.child_by_field_name("function") else {
            return;
        };
        let function = unwrap_parens(function);
        let callee_text = base.truncate_text(&function, MAX_CALLEE_TEXT);

        let (name, class, receiver, call_type) = match function.kind() {
            // Dynamic import is an import edge, not a call
            "import" => return,
            "identifier" => (
                base.get_node_text(&function),
                None,
                Receiver::None,
                CallType::Function,
            ),
            "super" => {
                let superclass = self.superclass();
                (
                    superclass.clone().unwrap_or_else(|| "super".to_string()),
                    superclass,
                    Receiver::None,
                    CallType::Constructor,
                )
            }
            "member_expression" => {
                let Some(property) = function.child_by_field_name("property") else {
                    return;
                };
                let object = function.child_by_field_name("object");
                let class = object.and_then(|object| self.receiver_class(object));
                let call_type = if class.is_some() {
                    CallType::Method
                } else {
                    CallType::Property
                };
                (
                    base.get_node_text(&property),
                    class,
                    self.receiver_of(object),
                    call_type,
                )
            }
            "subscript_expression" => {
                let name = match function.child_by_field_name("index") {
                    Some(index) if index.kind() == "string" => base.string_literal_value(&index),
                    Some(index) => base.truncate_text(&index, MAX_CALLEE_TEXT),
                    None => callee_text.clone(),
                };
                let object = function.child_by_field_name("object");
                (name, None, self.receiver_of(object), CallType::Property)
            }
            _ => {
                // Immediately invoked function expressions call the scope they define
                let name = self
                    .table
                    .scopes
                    .get(&function.id())
                    .map(|entry| entry.name.clone())
                    .unwrap_or_else(|| callee_text.clone());
                (name, None, Receiver::None, CallType::Property)
            }
        };

        let draft = base.create_draft(
            &node,
            self.caller(),
            name,
            class,
            receiver,
            callee_text,
            call_type,
            true,
        );
        self.drafts.push(draft);
    }

    /// `new X()`, `new ns.X()`
    fn record_new(&mut self, node: Node) {
        let base = self.extractor.base();
        let Some(constructor) = node.child_by_field_name("constructor") else {
            return;
        };
        let constructor = unwrap_parens(constructor);
        let callee_text = base.truncate_text(&constructor, MAX_CALLEE_TEXT);

        let (name, receiver) = match constructor.kind() {
            "identifier" => (base.get_node_text(&constructor), Receiver::None),
            "member_expression" => {
                let Some(name) = base.get_field_text(&constructor, "property") else {
                    return;
                };
                let object = constructor.child_by_field_name("object");
                (name, self.receiver_of(object))
            }
            _ => (callee_text.clone(), Receiver::None),
        };
        let class = inference::constructed_class(base, &node);

        let draft = base.create_draft(
            &node,
            self.caller(),
            name,
            class,
            receiver,
            callee_text,
            CallType::Constructor,
            true,
        );
        self.drafts.push(draft);
    }

    /// `a.b` read without being called
    fn record_property_access(&mut self, node: Node) {
        let base = self.extractor.base();
        let Some(property) = node.child_by_field_name("property") else {
            return;
        };
        let object = node.child_by_field_name("object");
        let class = object.and_then(|object| self.receiver_class(object));

        let draft = base.create_draft(
            &node,
            self.caller(),
            base.get_node_text(&property),
            class,
            self.receiver_of(object),
            base.truncate_text(&node, MAX_CALLEE_TEXT),
            CallType::Property,
            false,
        );
        self.drafts.push(draft);
    }

    /// Innermost function-like scope; class bodies and the module map to `<module>`
    fn caller(&self) -> CallerContext {
        for frame in self.frames.iter().rev() {
            match frame {
                Frame::Function { caller, .. } => return caller.clone(),
                Frame::Class { .. } => break,
            }
        }
        CallerContext {
            name: MODULE_CALLER.to_string(),
            class_name: None,
            symbol_id: None,
        }
    }

    fn this_class(&self) -> Option<String> {
        match self.frames.last()? {
            Frame::Function { this_class, .. } => this_class.clone(),
            Frame::Class { name, .. } => Some(name.clone()),
        }
    }

    fn superclass(&self) -> Option<String> {
        self.frames.iter().rev().find_map(|frame| match frame {
            Frame::Class { superclass, .. } => Some(superclass.clone()),
            Frame::Function { .. } => None,
        })?
    }

    fn field_type(&self, field: &str) -> Option<String> {
        let this_class = self.this_class()?;
        self.frames.iter().rev().find_map(|frame| match frame {
            Frame::Class {
                name, field_types, ..
            } if *name == this_class => field_types.get(field).cloned(),
            _ => None,
        })
    }

    fn binding(&self, name: &str) -> Option<String> {
        for frame in self.frames.iter().rev() {
            if let Frame::Function { bindings, .. } = frame {
                if let Some(class) = bindings.get(name) {
                    return Some(class.clone());
                }
            }
        }
        self.module_bindings.get(name).cloned()
    }

    fn bind(&mut self, name: String, class: String) {
        for frame in self.frames.iter_mut().rev() {
            if let Frame::Function { bindings, .. } = frame {
                bindings.insert(name, class);
                return;
            }
        }
        self.module_bindings.insert(name, class);
    }

    /// Class of the object a member is read from, when the source states it
    fn receiver_class(&self, object: Node) -> Option<String> {
        let base = self.extractor.base();
        let object = unwrap_parens(object);
        match object.kind() {
            "this" => self.this_class(),
            "super" => self.superclass(),
            "identifier" => {
                let name = base.get_node_text(&object);
                self.binding(&name).or_else(|| {
                    // Static access on a class declared in this file
                    self.type_names.contains(&name).then_some(name)
                })
            }
            "member_expression" => {
                let inner = object.child_by_field_name("object")?;
                if unwrap_parens(inner).kind() != "this" {
                    return None;
                }
                let field = base.get_field_text(&object, "property")?;
                self.field_type(&field)
            }
            "non_null_expression" => {
                let inner = object.named_child(0)?;
                self.receiver_class(inner)
            }
            _ => inference::value_class(base, &object),
        }
    }

    fn receiver_of(&self, object: Option<Node>) -> Receiver {
        let Some(object) = object else {
            return Receiver::None;
        };
        let base = self.extractor.base();
        let object = unwrap_parens(object);
        match object.kind() {
            "identifier" => Receiver::Identifier(base.get_node_text(&object)),
            _ => Receiver::Expression(base.truncate_text(&object, MAX_CALLEE_TEXT)),
        }
    }
}

/// Member expression is the target of a call or `new` (`(a.b)()` included)
fn is_invocation_target(node: Node) -> bool {
    let Some(parent) = parent_skipping_parens(node) else {
        return false;
    };
    let field = match parent.kind() {
        "call_expression" => "function",
        "new_expression" => "constructor",
        _ => return false,
    };
    parent
        .child_by_field_name(field)
        .map(|target| unwrap_parens(target).id() == node.id())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::typescript::test_support::parse;

    fn drafts_for(path: &str, code: &str) -> Vec<CallDraft> {
        let (extractor, tree) = parse(path, code);
        let table = extractor.extract_symbols(&tree);
        extractor.extract_relationships(&tree, &table)
    }

    #[test]
    fn test_call_classification() {
        let code = r#"
class Service {
    private repo: Repo;
    run() {
        helper();
        this.save();
        this.repo.find();
        unknown.thing();
        const p = new Parser();
        p.parse();
    }
    save() {}
}
"#;
        let drafts = drafts_for("src/service.ts", code);
        let by_name = |name: &str| drafts.iter().find(|d| d.callee_name == name).unwrap();

        assert_eq!(by_name("helper").call_type, CallType::Function);

        let save = by_name("save");
        assert_eq!(save.call_type, CallType::Method);
        assert_eq!(save.callee_class.as_deref(), Some("Service"));
        assert_eq!(save.caller.name, "run");
        assert_eq!(save.caller.class_name.as_deref(), Some("Service"));

        let find = by_name("find");
        assert_eq!(find.call_type, CallType::Method);
        assert_eq!(find.callee_class.as_deref(), Some("Repo"));

        let thing = by_name("thing");
        assert_eq!(thing.call_type, CallType::Property);
        assert_eq!(thing.receiver, Receiver::Identifier("unknown".to_string()));

        let parser = drafts
            .iter()
            .find(|d| d.call_type == CallType::Constructor)
            .unwrap();
        assert_eq!(parser.callee_name, "Parser");
        assert_eq!(parser.callee_class.as_deref(), Some("Parser"));

        let parse = by_name("parse");
        assert_eq!(parse.call_type, CallType::Method);
        assert_eq!(parse.callee_class.as_deref(), Some("Parser"));
    }

    #[test]
    fn test_module_level_calls_and_property_reads() {
        let code = "init();\nconst v = config.port;\n";
        let drafts = drafts_for("src/main.js", code);

        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts[0].caller.name, MODULE_CALLER);
        assert!(drafts[0].caller.symbol_id.is_none());

        let port = &drafts[1];
        assert_eq!(port.callee_name, "port");
        assert_eq!(port.call_type, CallType::Property);
        assert!(!port.invoked);
        assert_eq!(port.callee_text, "config.port");
    }

    #[test]
    fn test_arrow_inherits_this_and_super_calls() {
        let code = r#"
class Child extends Parent {
    constructor() {
        super();
        items.forEach(item => this.add(item));
    }
    add(item) {}
}
"#;
        let drafts = drafts_for("src/child.js", code);

        let parent = drafts.iter().find(|d| d.callee_name == "Parent").unwrap();
        assert_eq!(parent.call_type, CallType::Constructor);
        assert_eq!(parent.caller.name, "constructor");

        let add = drafts.iter().find(|d| d.callee_name == "add").unwrap();
        assert_eq!(add.call_type, CallType::Method);
        assert_eq!(add.callee_class.as_deref(), Some("Child"));
        assert_eq!(add.caller.name, "Child.constructor$anonymous@5:23");
    }

    #[test]
    fn test_static_receiver_and_iife() {
        let code = "class Registry { static lookup() {} }\nRegistry.lookup();\n(function () { boot(); })();\n";
        let drafts = drafts_for("src/r.js", code);

        let lookup = drafts.iter().find(|d| d.callee_name == "lookup").unwrap();
        assert_eq!(lookup.call_type, CallType::Method);
        assert_eq!(lookup.callee_class.as_deref(), Some("Registry"));

        let iife = drafts
            .iter()
            .find(|d| d.callee_name == "module$anonymous@3:2")
            .unwrap();
        assert_eq!(iife.call_type, CallType::Property);
        assert_eq!(iife.caller.name, MODULE_CALLER);

        let boot = drafts.iter().find(|d| d.callee_name == "boot").unwrap();
        assert_eq!(boot.caller.name, "module$anonymous@3:2");
    }
}
