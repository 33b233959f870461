//! Closed set of syntax-node categories the extractors care about.
//!
//! Every walker classifies a node once with [`NodeCategory::of`] and then matches on
//! the category, so supporting a new construct means adding a variant here and a
//! handler in each walker that needs it.

use tree_sitter::Node;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeCategory {
    /// `class A {}`, `abstract class A {}`, `class {}` expressions
    Class,
    /// `interface A {}` (TypeScript only)
    Interface,
    /// `function f() {}` and generator declarations
    FunctionDeclaration,
    /// `function () {}`, `() => {}`, `function* () {}` in expression position
    FunctionExpression,
    /// `m() {}` inside a class body or object literal
    Method,
    /// `m(): void;` inside an interface or abstract class
    MethodSignature,
    /// class fields (`x = 1`, `private x: T`)
    Field,
    /// `x: T;` inside an interface
    PropertySignature,
    /// `const x = …` / `var x = …`
    VariableDeclarator,
    /// `a = b` (plain assignment only)
    Assignment,
    /// `a += b` and friends
    AugmentedAssignment,
    Call,
    New,
    /// `a.b`
    MemberAccess,
    /// `a[b]`
    ElementAccess,
    Import,
    Export,
    /// `{ a: 1, b() {} }`
    ObjectLiteral,
    Other,
}

impl NodeCategory {
    /// Keyword tokens share kinds with expressions (`class`, `function`), so
    /// only named nodes are classified.
    pub fn of(node: &Node) -> Self {
        if !node.is_named() {
            return NodeCategory::Other;
        }
        Self::from_kind(node.kind())
    }

    pub fn from_kind(kind: &str) -> Self {
        match kind {
            "class_declaration" | "abstract_class_declaration" | "class" => NodeCategory::Class,
            "interface_declaration" => NodeCategory::Interface,
            "function_declaration" | "generator_function_declaration" => {
                NodeCategory::FunctionDeclaration
            }
            "function_expression" | "function" | "arrow_function" | "generator_function" => {
                NodeCategory::FunctionExpression
            }
            "method_definition" => NodeCategory::Method,
            "method_signature" | "abstract_method_signature" => NodeCategory::MethodSignature,
            "public_field_definition" | "field_definition" => NodeCategory::Field,
            "property_signature" => NodeCategory::PropertySignature,
            "variable_declarator" => NodeCategory::VariableDeclarator,
            "assignment_expression" => NodeCategory::Assignment,
            "augmented_assignment_expression" => NodeCategory::AugmentedAssignment,
            "call_expression" => NodeCategory::Call,
            "new_expression" => NodeCategory::New,
            "member_expression" => NodeCategory::MemberAccess,
            "subscript_expression" => NodeCategory::ElementAccess,
            "import_statement" => NodeCategory::Import,
            "export_statement" => NodeCategory::Export,
            "object" => NodeCategory::ObjectLiteral,
            _ => NodeCategory::Other,
        }
    }

    /// Nodes that open a new function body (and therefore a caller scope)
    pub fn is_function_like(self) -> bool {
        matches!(
            self,
            NodeCategory::FunctionDeclaration | NodeCategory::FunctionExpression | NodeCategory::Method
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_function_like_categories() {
        assert!(NodeCategory::from_kind("arrow_function").is_function_like());
        assert!(NodeCategory::from_kind("function_expression").is_function_like());
        assert!(NodeCategory::from_kind("method_definition").is_function_like());
        assert!(!NodeCategory::from_kind("class_declaration").is_function_like());
        assert!(!NodeCategory::from_kind("method_signature").is_function_like());
    }

    #[test]
    fn test_keyword_tokens_are_other() {
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into())
            .unwrap();
        let tree = parser
            .parse("class A {}\nfunction f() {}\n", None)
            .unwrap();

        let mut classes = 0;
        let mut functions = 0;
        crate::extractors::base::tree_methods::walk_tree(tree.root_node(), &mut |node| {
            match NodeCategory::of(&node) {
                NodeCategory::Class => classes += 1,
                NodeCategory::FunctionDeclaration | NodeCategory::FunctionExpression => {
                    functions += 1
                }
                _ => {}
            }
        });
        assert_eq!(classes, 1);
        assert_eq!(functions, 1);
    }

    #[test]
    fn test_unknown_kinds_are_other() {
        assert_eq!(NodeCategory::from_kind("template_string"), NodeCategory::Other);
    }
}
