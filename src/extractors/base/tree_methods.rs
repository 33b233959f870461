// Tree navigation methods for BaseExtractor

use super::extractor::BaseExtractor;
use tree_sitter::Node;

impl BaseExtractor {
    /// Find first child by type
    pub fn find_child_by_type<'a>(&self, node: &Node<'a>, child_type: &str) -> Option<Node<'a>> {
        let mut cursor = node.walk();
        let found = node
            .children(&mut cursor)
            .find(|child| child.kind() == child_type);
        found
    }

    /// Check whether a node has an unnamed token child such as `async`, `static` or `*`
    pub fn has_token(&self, node: &Node, token: &str) -> bool {
        let mut cursor = node.walk();
        let found = node
            .children(&mut cursor)
            .any(|child| child.kind() == token);
        found
    }
}

/// `node`, possibly wrapped in parentheses, is the `field` child of `parent`
pub(crate) fn is_field_of(node: Node, parent: Node, field: &str) -> bool {
    parent
        .child_by_field_name(field)
        .map(|child| unwrap_parens(child).id() == node.id())
        .unwrap_or(false)
}

/// Skip any number of wrapping parentheses: `((fn))` -> `fn`
pub(crate) fn unwrap_parens(node: Node) -> Node {
    let mut current = node;
    while current.kind() == "parenthesized_expression" {
        match current.named_child(0) {
            Some(inner) => current = inner,
            None => break,
        }
    }
    current
}

/// Walk up through wrapping parentheses and return the first real parent
pub(crate) fn parent_skipping_parens(node: Node) -> Option<Node> {
    let mut parent = node.parent();
    while let Some(p) = parent {
        if p.kind() != "parenthesized_expression" {
            return Some(p);
        }
        parent = p.parent();
    }
    None
}

/// Walk every node below `node` (inclusive), depth first
pub(crate) fn walk_tree<'a, F>(node: Node<'a>, visitor: &mut F)
where
    F: FnMut(Node<'a>),
{
    visitor(node);
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk_tree(child, visitor);
    }
}
