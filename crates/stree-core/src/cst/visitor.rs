//! Tree traversal
//!
//! [`Visitor`] walks children in field order and can be overridden per node.
//! [`FieldVisitor`] folds a node and its fields into one output value; the
//! JSON and S-expression dumps are both built on it.

use super::node::{Comment, FieldRef, Node};

pub trait Visitor<'a> {
    fn visit(&mut self, node: &'a Node) {
        walk(self, node);
    }
}

/// Visit every child of `node` in field order
pub fn walk<'a, V: Visitor<'a> + ?Sized>(visitor: &mut V, node: &'a Node) {
    for child in node.child_nodes() {
        visitor.visit(child);
    }
}

/// Folds nodes into values, field by field
pub trait FieldVisitor {
    type Output;

    /// Combine a visited node's fields; attached comments are in `node.comments`
    fn node(&mut self, node: &Node, fields: Vec<(&'static str, Self::Output)>) -> Self::Output;

    fn comment(&mut self, comment: &Comment) -> Self::Output;

    fn text(&mut self, value: &str) -> Self::Output;

    fn boolean(&mut self, value: bool) -> Self::Output;

    fn number(&mut self, value: usize) -> Self::Output;

    fn nil(&mut self) -> Self::Output;

    fn list(&mut self, items: Vec<Self::Output>) -> Self::Output;
}

pub fn visit_fields<V: FieldVisitor>(visitor: &mut V, node: &Node) -> V::Output {
    let fields = node
        .fields()
        .into_iter()
        .map(|(name, field)| {
            let value = match field {
                FieldRef::Node(child) => visit_fields(visitor, child),
                FieldRef::OptionalNode(Some(child)) => visit_fields(visitor, child),
                FieldRef::OptionalNode(None) => visitor.nil(),
                FieldRef::Nodes(children) => {
                    let items = children
                        .iter()
                        .map(|child| visit_fields(visitor, child))
                        .collect();
                    visitor.list(items)
                }
                FieldRef::Str(value) => visitor.text(value),
                FieldRef::Bool(value) => visitor.boolean(value),
                FieldRef::Int(value) => visitor.number(value),
            };
            (name, value)
        })
        .collect();
    visitor.node(node, fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cst::node::NodeTag;
    use crate::driver::parse;

    #[derive(Default)]
    struct Counter {
        idents: Vec<String>,
    }

    impl<'a> Visitor<'a> for Counter {
        fn visit(&mut self, node: &'a Node) {
            if node.is(NodeTag::Ident)
                && let Some(value) = node.token_value()
            {
                self.idents.push(value.to_string());
            }
            walk(self, node);
        }
    }

    #[test]
    fn walk_reaches_every_identifier_in_order() {
        let program = parse("foo(bar, baz)\nqux = 1\n").unwrap();
        let mut counter = Counter::default();
        counter.visit(&program);
        assert_eq!(counter.idents, vec!["foo", "bar", "baz", "qux"]);
    }

    struct TypeNames;

    impl FieldVisitor for TypeNames {
        type Output = String;

        fn node(&mut self, node: &Node, fields: Vec<(&'static str, String)>) -> String {
            let inner: Vec<String> = fields.into_iter().map(|(_, value)| value).collect();
            format!("{}[{}]", node.type_name(), inner.join(","))
        }

        fn comment(&mut self, _comment: &Comment) -> String {
            "#".to_string()
        }

        fn text(&mut self, value: &str) -> String {
            value.to_string()
        }

        fn boolean(&mut self, value: bool) -> String {
            value.to_string()
        }

        fn number(&mut self, value: usize) -> String {
            value.to_string()
        }

        fn nil(&mut self) -> String {
            "nil".to_string()
        }

        fn list(&mut self, items: Vec<String>) -> String {
            format!("({})", items.join(" "))
        }
    }

    #[test]
    fn field_visitor_folds_in_declaration_order() {
        let program = parse("x = 1").unwrap();
        assert_eq!(
            visit_fields(&mut TypeNames, &program),
            "program[statements[(assign[var_field[ident[x]],int[1]])]]"
        );
    }
}
