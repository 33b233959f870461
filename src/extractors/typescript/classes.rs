//! Class extraction
//!
//! Class declarations, class expressions and class fields. Superclasses are
//! recorded in the table's heritage map for inherited member lookup.

use super::helpers;
use super::symbols::{BuilderContext, Container, ContainerKind};
use crate::extractors::base::tree_methods::unwrap_parens;
use crate::extractors::base::{NodeCategory, SymbolKind, SymbolOptions};
use crate::extractors::typescript::TypeScriptExtractor;
use tree_sitter::Node;

/// Extract a class declaration or class expression
pub(super) fn extract_class(
    extractor: &TypeScriptExtractor,
    ctx: &mut BuilderContext,
    node: Node,
) -> Option<Container> {
    let base = extractor.base();

    let (name, span, is_exported) = if node.kind() == "class" {
        match helpers::context_name(base, node, &ctx.naming_scope()) {
            Some(named) => (named.name, named.span, named.is_exported),
            None => {
                let name = helpers::own_name(base, &node)
                    .unwrap_or_else(|| base.synthetic_name(&ctx.context_label(), &node));
                (name, node, false)
            }
        }
    } else {
        let name = match base.get_field_text(&node, "name") {
            Some(name) => name,
            None => base.synthetic_name(&ctx.context_label(), &node),
        };
        let is_exported = helpers::is_export_declared(&node)
            || (ctx.at_top_level() && ctx.exported_locals.contains(&name));
        (name, node, is_exported)
    };

    if let Some(superclass) = helpers::superclass_name(base, &node) {
        ctx.table.heritage.insert(name.clone(), superclass);
    }

    let symbol = base.create_symbol(
        &span,
        name,
        SymbolKind::Class,
        SymbolOptions {
            class_name: None,
            is_exported,
            visibility: None,
        },
    );

    Some(ctx.register(&node, symbol, ContainerKind::Class))
}

/// Extract a class field.
///
/// Fields initialized with a function become methods; that symbol is created
/// by the function expression handler, which names it after the field.
pub(super) fn extract_field(
    extractor: &TypeScriptExtractor,
    ctx: &mut BuilderContext,
    node: Node,
) -> Option<Container> {
    let base = extractor.base();

    let holds_function = node
        .child_by_field_name("value")
        .map(|value| NodeCategory::of(&unwrap_parens(value)) == NodeCategory::FunctionExpression)
        .unwrap_or(false);
    if holds_function {
        return None;
    }

    let key = node
        .child_by_field_name("name")
        .or_else(|| node.child_by_field_name("property"))?;
    let name = helpers::property_key_text(base, &key);

    let symbol = base.create_symbol(
        &node,
        name,
        SymbolKind::Property,
        SymbolOptions {
            class_name: ctx.enclosing_class(),
            is_exported: false,
            visibility: base.extract_visibility(&node),
        },
    );

    // The initializer runs as part of the field, so the field owns its calls
    Some(ctx.register(&node, symbol, ContainerKind::Member))
}

#[cfg(test)]
mod tests {
    use crate::extractors::base::{SymbolKind, Visibility};
    use crate::extractors::typescript::test_support::parse;

    #[test]
    fn test_class_with_members() {
        let code = r#"
export class UserService extends BaseService {
    private cache = new Map();
    protected readonly limit: number = 10;
    #secret = 1;
    onReady = () => this.start();
}
"#;
        let (extractor, tree) = parse("src/user.ts", code);
        let table = extractor.extract_symbols(&tree);

        let class = table.symbols.iter().find(|s| s.name == "UserService").unwrap();
        assert_eq!(class.kind, SymbolKind::Class);
        assert!(class.is_exported);
        assert_eq!(table.heritage.get("UserService").map(String::as_str), Some("BaseService"));

        let cache = table.symbols.iter().find(|s| s.name == "cache").unwrap();
        assert_eq!(cache.kind, SymbolKind::Property);
        assert_eq!(cache.class_name.as_deref(), Some("UserService"));
        assert_eq!(cache.visibility, Visibility::Private);

        let limit = table.symbols.iter().find(|s| s.name == "limit").unwrap();
        assert_eq!(limit.visibility, Visibility::Protected);

        let secret = table.symbols.iter().find(|s| s.name == "#secret").unwrap();
        assert_eq!(secret.visibility, Visibility::Private);

        let on_ready = table.symbols.iter().find(|s| s.name == "onReady").unwrap();
        assert_eq!(on_ready.kind, SymbolKind::Method);
        assert_eq!(on_ready.class_name.as_deref(), Some("UserService"));
    }

    #[test]
    fn test_anonymous_default_class_gets_synthetic_name() {
        let (extractor, tree) = parse("src/widget.js", "export default class {}\n");
        let table = extractor.extract_symbols(&tree);

        assert_eq!(table.symbols.len(), 1);
        assert_eq!(table.symbols[0].name, "default$anonymous@1:16");
        assert!(table.symbols[0].is_exported);
    }

    #[test]
    fn test_class_expression_named_by_declarator() {
        let (extractor, tree) = parse("src/a.js", "const Shape = class { area() {} };\n");
        let table = extractor.extract_symbols(&tree);

        let class = table.symbols.iter().find(|s| s.kind == SymbolKind::Class).unwrap();
        assert_eq!(class.name, "Shape");
        let area = table.symbols.iter().find(|s| s.name == "area").unwrap();
        assert_eq!(area.class_name.as_deref(), Some("Shape"));
        assert!(!table.symbols.iter().any(|s| s.kind == SymbolKind::Variable));
    }
}
