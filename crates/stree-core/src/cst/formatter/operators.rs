//! Operators, assignments and parentheses

use super::Formatter;
use super::literals::skip_indent;
use crate::cst::format_element::Layout;
use crate::cst::node::*;

impl<'a> Formatter<'a> {
    /// `left op right`, breaking after the operator
    pub(super) fn format_binary(&mut self, inner: &'a Binary) {
        let power = inner.operator == "**";
        // a comment after the left operand ends its line, so the right
        // operand moves down in every pass
        let commented = ends_with_comment(&inner.left);
        self.group(|f| {
            f.group(|f| f.format(&inner.left));
            if !power {
                f.text(" ");
            }
            if inner.operator == "<<" {
                f.text("<<");
                if commented {
                    f.indent(|f| {
                        f.breakable_force();
                        f.format(&inner.right);
                    });
                } else {
                    f.text(" ");
                    f.format(&inner.right);
                }
                return;
            }
            f.group(|f| {
                f.text(&inner.operator);
                if commented {
                    f.break_parent();
                }
                f.indent(|f| {
                    if power {
                        f.breakable_empty();
                    } else {
                        f.breakable_space();
                    }
                    f.format(&inner.right);
                });
            });
        });
    }

    pub(super) fn format_not(&mut self, inner: &'a Not) {
        if inner.parentheses {
            self.text("not(");
            self.format_optional(inner.statement.as_deref());
            self.text(")");
        } else {
            self.text("not ");
            self.format_optional(inner.statement.as_deref());
        }
    }

    pub(super) fn format_ifop(&mut self, inner: &'a IfOp) {
        self.group(|f| {
            f.format(&inner.predicate);
            f.text(" ?");
            f.indent(|f| {
                f.breakable_space();
                f.format(&inner.truthy);
                f.text(" :");
                f.breakable_space();
                f.format(&inner.falsy);
            });
        });
    }

    /// `target =` followed by the value, indented on the next line if needed
    fn format_assignment(&mut self, target: &'a Node, operator: impl FnOnce(&mut Self), value: &'a Node) {
        self.group(|f| {
            f.format(target);
            operator(f);
            if skip_indent(value) || target.is(NodeTag::ARefField) {
                f.text(" ");
                f.format(value);
            } else {
                f.indent(|f| {
                    f.breakable_space();
                    f.format(value);
                });
            }
        });
    }

    pub(super) fn format_assign(&mut self, inner: &'a Assign) {
        self.format_assignment(&inner.target, |f| f.text(" ="), &inner.value);
    }

    pub(super) fn format_opassign(&mut self, inner: &'a OpAssign) {
        self.format_assignment(
            &inner.target,
            |f| {
                f.text(" ");
                f.format(&inner.operator);
            },
            &inner.value,
        );
    }

    pub(super) fn format_massign(&mut self, inner: &'a MAssign) {
        self.group(|f| {
            f.group(|f| f.format(&inner.target));
            f.text(" =");
            f.indent(|f| {
                f.breakable_space();
                f.format(&inner.value);
            });
        });
    }

    /// Parentheses are dropped where the surrounding targets already
    /// delimit the list
    pub(super) fn format_mlhs_paren(&mut self, inner: &'a MlhsParen) {
        if matches!(
            self.parent_tag(),
            Some(NodeTag::MAssign | NodeTag::MlhsParen)
        ) {
            self.format(&inner.contents);
            return;
        }
        self.group(|f| {
            f.text("(");
            f.indent(|f| {
                f.breakable_empty();
                f.format(&inner.contents);
            });
            f.breakable_empty();
            f.text(")");
        });
    }

    pub(super) fn format_paren(&mut self, inner: &'a Paren) {
        self.group(|f| {
            f.format(&inner.lparen);
            if let Some(contents) = &inner.contents {
                let empty_params = matches!(&contents.kind, NodeKind::Params(_))
                    && contents.child_nodes().is_empty();
                if !empty_params {
                    f.indent(|f| {
                        f.breakable_empty();
                        f.format(contents);
                    });
                }
            }
            f.breakable_empty();
            f.text(")");
        });
    }
}

#[cfg(test)]
mod tests {
    use crate::cst::formatter::{FormatOptions, format_program};
    use crate::driver::parse;

    fn format_with(source: &str, print_width: usize) -> String {
        let program = parse(source).unwrap();
        let options = FormatOptions {
            print_width,
            ..FormatOptions::default()
        };
        format_program(&program, source, &options)
    }

    fn format(source: &str) -> String {
        format_with(source, 80)
    }

    #[test]
    fn spaces_binary_operators() {
        assert_eq!(format("a+b*c"), "a + b * c\n");
        assert_eq!(format("a ** 2"), "a**2\n");
        assert_eq!(format("list<<item"), "list << item\n");
    }

    #[test]
    fn breaks_after_the_operator() {
        assert_eq!(
            format_with("first_value && second_value", 20),
            "first_value &&\n  second_value\n"
        );
    }

    #[test]
    fn assignments_indent_long_values() {
        assert_eq!(format("x=1"), "x = 1\n");
        assert_eq!(format("x += 1"), "x += 1\n");
        assert_eq!(
            format_with("result = compute_something(argument)", 20),
            "result =\n  compute_something(\n    argument\n  )\n"
        );
        assert_eq!(format("a, b = 1, 2"), "a, b = 1, 2\n");
    }

    #[test]
    fn collections_stay_beside_the_equals_sign() {
        assert_eq!(
            format_with("values = [first, second]", 16),
            "values = [\n  first,\n  second\n]\n"
        );
    }

    #[test]
    fn keeps_ternaries() {
        assert_eq!(format("a ? b : c"), "a ? b : c\n");
        assert_eq!(format("not x"), "not x\n");
        assert_eq!(format("!x"), "!x\n");
    }
}

/// Whether a trailing comment sits at the very end of `node`
fn ends_with_comment(node: &Node) -> bool {
    if node.comments.iter().any(|comment| !comment.is_leading()) {
        return true;
    }
    node.child_nodes()
        .into_iter()
        .max_by_key(|child| child.end_char())
        .is_some_and(ends_with_comment)
}
