//! Conditionals, loops, `case` and exception handling

use super::Formatter;
use crate::cst::format_element::Layout;
use crate::cst::node::*;

/// Parents in which a ternary needs parentheses
fn ternary_needs_parentheses(parent: Option<NodeTag>) -> bool {
    matches!(
        parent,
        Some(
            NodeTag::Args
                | NodeTag::Assign
                | NodeTag::Assoc
                | NodeTag::Binary
                | NodeTag::CallNode
                | NodeTag::Defined
                | NodeTag::MAssign
                | NodeTag::OpAssign
        )
    )
}

/// The only real statement of a list, ignoring placeholders
fn sole_statement(statements: &Node) -> Option<&Node> {
    let NodeKind::Statements(inner) = &statements.kind else {
        return None;
    };
    let mut real = inner
        .body
        .iter()
        .filter(|statement| !statement.is(NodeTag::VoidStmt));
    match (real.next(), real.next()) {
        (Some(statement), None) => Some(statement),
        _ => None,
    }
}

/// Statements that read ambiguously or not at all as a ternary branch
fn fits_in_ternary(statement: &Node) -> bool {
    if statement.has_comments() {
        return false;
    }
    match &statement.kind {
        NodeKind::Binary(binary) => !matches!(binary.operator.as_str(), "and" | "or"),
        kind => !matches!(
            kind.tag(),
            NodeTag::AliasNode
                | NodeTag::Assign
                | NodeTag::Break
                | NodeTag::Command
                | NodeTag::CommandCall
                | NodeTag::CommentNode
                | NodeTag::Defined
                | NodeTag::EmbDoc
                | NodeTag::Heredoc
                | NodeTag::IfNode
                | NodeTag::IfOp
                | NodeTag::Lambda
                | NodeTag::MAssign
                | NodeTag::Next
                | NodeTag::Not
                | NodeTag::OpAssign
                | NodeTag::RescueMod
                | NodeTag::ReturnNode
                | NodeTag::Super
                | NodeTag::Undef
                | NodeTag::UnlessNode
                | NodeTag::UntilNode
                | NodeTag::WhileNode
                | NodeTag::YieldNode
                | NodeTag::ZSuper
        ),
    }
}

/// The `end` of a range written without an upper bound
fn is_endless_range(node: Option<&Node>) -> bool {
    matches!(node.map(|node| &node.kind), Some(NodeKind::RangeNode(range)) if range.right.is_none())
}

impl<'a> Formatter<'a> {
    /// `if` and `unless` in block, modifier and ternary form
    pub(super) fn format_conditional(
        &mut self,
        node: &'a Node,
        keyword: &'static str,
        predicate: &'a Node,
        statements: &'a Node,
        consequent: Option<&'a Node>,
        modifier: bool,
    ) {
        if modifier {
            self.format_modifier(keyword, predicate, statements);
            return;
        }
        if let Some((truthy, falsy)) = self.ternary_branches(node, predicate, statements, consequent) {
            self.format_ternary(keyword, predicate, truthy, falsy, statements, consequent);
            return;
        }

        self.group(|f| {
            f.format_condition_header(keyword, predicate);
            f.format_clause_body(statements);
            if let Some(consequent) = consequent {
                f.breakable_force();
                f.format(consequent);
            }
            f.breakable_force();
            f.text("end");
        });
    }

    fn format_condition_header(&mut self, keyword: &str, predicate: &'a Node) {
        self.text(keyword);
        self.text(" ");
        self.nest(keyword.len() as isize + 1, |f| f.format(predicate));
    }

    /// `statement if predicate`, turning into a block when too long
    ///
    /// A guard in a pattern clause always stays on the pattern's line.
    fn format_modifier(&mut self, keyword: &'static str, predicate: &'a Node, statements: &'a Node) {
        let flat = |f: &mut Self| {
            f.format(statements);
            f.text(" ");
            f.text(keyword);
            f.text(" ");
            f.format(predicate);
        };

        let guard = self.parent_tag() == Some(NodeTag::In);
        let begin_loop = matches!(keyword, "while" | "until")
            && sole_statement(statements).is_some_and(|statement| statement.is(NodeTag::Begin));
        if guard || begin_loop {
            flat(self);
            return;
        }

        self.group(|f| {
            f.if_break(
                |f| {
                    f.format_condition_header(keyword, predicate);
                    f.indent(|f| {
                        f.breakable_space();
                        f.format(statements);
                    });
                    f.breakable_space();
                    f.text("end");
                },
                flat,
            );
        });
    }

    /// Branches of a short `if`/`else` that reads as a ternary
    fn ternary_branches(
        &self,
        node: &'a Node,
        predicate: &'a Node,
        statements: &'a Node,
        consequent: Option<&'a Node>,
    ) -> Option<(&'a Node, &'a Node)> {
        if self.options.disable_auto_ternary {
            return None;
        }
        if let Some(NodeKind::Paren(paren)) = self.grandparent().map(|grandparent| &grandparent.kind)
            && let Some(contents) = paren.contents.as_deref()
            && sole_statement(contents).is_some_and(|statement| std::ptr::eq(statement, node))
        {
            return None;
        }
        if matches!(
            predicate.tag(),
            NodeTag::Assign
                | NodeTag::Binary
                | NodeTag::Command
                | NodeTag::CommandCall
                | NodeTag::MAssign
                | NodeTag::OpAssign
        ) {
            return None;
        }

        let consequent = consequent?;
        let NodeKind::Else(otherwise) = &consequent.kind else {
            return None;
        };
        if consequent.has_comments() || otherwise.keyword.has_comments() {
            return None;
        }
        let truthy = sole_statement(statements).filter(|statement| fits_in_ternary(statement))?;
        let falsy = sole_statement(&otherwise.statements).filter(|statement| fits_in_ternary(statement))?;
        Some((truthy, falsy))
    }

    /// `predicate ? truthy : falsy`, or the block form when it does not fit
    fn format_ternary(
        &mut self,
        keyword: &'static str,
        predicate: &'a Node,
        truthy: &'a Node,
        falsy: &'a Node,
        statements: &'a Node,
        consequent: Option<&'a Node>,
    ) {
        let parenthesize = ternary_needs_parentheses(self.parent_tag());
        let (first, second) = if keyword == "unless" {
            (falsy, truthy)
        } else {
            (truthy, falsy)
        };

        self.group(|f| {
            f.if_break(
                |f| {
                    f.format_condition_header(keyword, predicate);
                    f.indent(|f| {
                        f.breakable_space();
                        f.format(statements);
                    });
                    f.breakable_space();
                    f.text("else");
                    if let Some(consequent) = consequent {
                        f.with_comments(consequent, |f| {
                            f.indent(|f| {
                                f.breakable_space();
                                f.format(falsy);
                            });
                        });
                    }
                    f.breakable_space();
                    f.text("end");
                },
                |f| {
                    if parenthesize {
                        f.text("(");
                    }
                    f.format(predicate);
                    f.text(" ? ");
                    f.format(first);
                    f.text(" : ");
                    f.format(second);
                    if parenthesize {
                        f.text(")");
                    }
                },
            );
        });
    }

    pub(super) fn format_elsif(&mut self, inner: &'a Elsif) {
        self.group(|f| {
            f.group(|f| f.format_condition_header("elsif", &inner.predicate));
            f.format_clause_body(&inner.statements);
            if let Some(consequent) = &inner.consequent {
                f.breakable_force();
                f.format(consequent);
            }
        });
    }

    pub(super) fn format_else(&mut self, inner: &'a Else) {
        self.group(|f| {
            f.format(&inner.keyword);
            f.format_clause_body(&inner.statements);
        });
    }

    /// `while` and `until`
    pub(super) fn format_loop(
        &mut self,
        keyword: &'static str,
        predicate: &'a Node,
        statements: &'a Node,
        modifier: bool,
    ) {
        if modifier {
            self.format_modifier(keyword, predicate, statements);
            return;
        }
        self.group(|f| {
            f.format_condition_header(keyword, predicate);
            f.format_clause_body(statements);
            f.breakable_force();
            f.text("end");
        });
    }

    pub(super) fn format_for(&mut self, inner: &'a For) {
        self.group(|f| {
            f.text("for ");
            f.group(|f| f.format(&inner.index));
            f.text(" in ");
            f.format(&inner.collection);
            f.format_clause_body(&inner.statements);
            f.breakable_force();
            f.text("end");
        });
    }

    pub(super) fn format_case(&mut self, inner: &'a Case) {
        self.group(|f| {
            f.format(&inner.keyword);
            if let Some(value) = &inner.value {
                f.text(" ");
                f.format(value);
            }
            f.breakable_force();
            f.format(&inner.consequent);
            f.breakable_force();
            f.text("end");
        });
    }

    pub(super) fn format_when(&mut self, inner: &'a When) {
        let parts: &'a [Node] = match &inner.arguments.kind {
            NodeKind::Args(args) => &args.parts,
            _ => std::slice::from_ref(inner.arguments.as_ref()),
        };
        self.group(|f| {
            f.group(|f| {
                f.text("when ");
                f.nest(5, |f| {
                    f.with_comments(&inner.arguments, |f| {
                        f.seplist(parts, Self::comma_breakable);
                    });
                });
                // `when 1..` followed by a newline would continue the range
                if is_endless_range(parts.last()) {
                    f.text(" then");
                }
            });
            f.format_clause_body(&inner.statements);
            if let Some(consequent) = &inner.consequent {
                f.breakable_force();
                f.format(consequent);
            }
        });
    }

    pub(super) fn format_in(&mut self, inner: &'a In) {
        self.group(|f| {
            f.group(|f| {
                f.text("in ");
                f.nest(3, |f| f.format(&inner.pattern));
                if is_endless_range(Some(&inner.pattern)) {
                    f.text(" then");
                }
            });
            f.format_clause_body(&inner.statements);
            if let Some(consequent) = &inner.consequent {
                f.breakable_force();
                f.format(consequent);
            }
        });
    }

    /// `value => pattern` and `value in pattern`
    pub(super) fn format_rassign(&mut self, inner: &'a RAssign) {
        self.group(|f| {
            f.format(&inner.value);
            f.text(" ");
            f.format(&inner.operator);
            if matches!(
                inner.pattern.tag(),
                NodeTag::AryPtn | NodeTag::FndPtn | NodeTag::HshPtn
            ) {
                f.text(" ");
                f.format(&inner.pattern);
            } else {
                f.group(|f| {
                    f.indent(|f| {
                        f.breakable_space();
                        f.format(&inner.pattern);
                    });
                });
            }
        });
    }

    pub(super) fn format_begin(&mut self, inner: &'a Begin) {
        self.text("begin");
        self.format_header_comments(&inner.bodystmt);
        self.format_body(&inner.bodystmt);
        self.breakable_force();
        self.text("end");
    }

    pub(super) fn format_rescue(&mut self, inner: &'a Rescue) {
        self.group(|f| {
            f.format(&inner.keyword);
            if let Some(exception) = &inner.exception {
                f.text(" ");
                f.nest(7, |f| f.format(exception));
            }
            f.format_clause_body(&inner.statements);
            if let Some(consequent) = &inner.consequent {
                f.breakable_force();
                f.format(consequent);
            }
        });
    }

    /// `Error, Other => error`
    pub(super) fn format_rescue_ex(&mut self, inner: &'a RescueEx) {
        self.group(|f| {
            if let Some(exceptions) = &inner.exceptions {
                f.format(exceptions);
                if inner.variable.is_some() {
                    f.text(" ");
                }
            }
            if let Some(variable) = &inner.variable {
                f.text("=> ");
                f.format(variable);
            }
        });
    }

    pub(super) fn format_rescue_mod(&mut self, inner: &'a RescueMod) {
        self.group(|f| {
            f.format(&inner.statement);
            f.text(" rescue");
            f.indent(|f| {
                f.breakable_space();
                f.format(&inner.value);
            });
        });
    }
}

#[cfg(test)]
mod tests {
    use crate::cst::formatter::{FormatOptions, format_program};
    use crate::driver::parse;

    fn format_with(source: &str, options: &FormatOptions) -> String {
        let program = parse(source).unwrap();
        format_program(&program, source, options)
    }

    fn format(source: &str) -> String {
        format_with(source, &FormatOptions::default())
    }

    #[test]
    fn short_if_else_becomes_a_ternary() {
        assert_eq!(format("if a\n  b\nelse\n  c\nend\n"), "a ? b : c\n");
        assert_eq!(format("unless a\n  b\nelse\n  c\nend\n"), "a ? c : b\n");
        assert_eq!(format("x = if a\n  b\nelse\n  c\nend\n"), "x = (a ? b : c)\n");
    }

    #[test]
    fn ternary_conversion_can_be_disabled() {
        let options = FormatOptions {
            disable_auto_ternary: true,
            ..FormatOptions::default()
        };
        let source = "if a\n  b\nelse\n  c\nend\n";
        assert_eq!(format_with(source, &options), source);
    }

    #[test]
    fn block_conditionals_stay_blocks() {
        let source = "if a\n  b\nend\n";
        assert_eq!(format(source), source);
        let source = "if a\n  b\nelsif c\n  d\nelse\n  e\nend\n";
        assert_eq!(format(source), source);
        let source = "while a\n  b\nend\n";
        assert_eq!(format(source), source);
    }

    #[test]
    fn long_modifiers_become_blocks() {
        let options = FormatOptions {
            print_width: 20,
            ..FormatOptions::default()
        };
        assert_eq!(format("foo if bar"), "foo if bar\n");
        assert_eq!(
            format_with("do_something if condition_holds", &options),
            "if condition_holds\n  do_something\nend\n"
        );
    }

    #[test]
    fn case_clauses_line_up() {
        let source = "case x\nwhen 1, 2\n  a\nwhen 3\n  b\nelse\n  c\nend\n";
        assert_eq!(format(source), source);
        assert_eq!(
            format("case x\nin [a, b]\n  a\nin { c: 1 }\n  c\nend\n"),
            "case x\nin a, b\n  a\nin c: 1\n  c\nend\n"
        );
    }

    #[test]
    fn rescue_clauses_outdent() {
        let source = "begin\n  a\nrescue Error => e\n  b\nelse\n  c\nensure\n  d\nend\n";
        assert_eq!(format(source), source);
        assert_eq!(format("a rescue b"), "a rescue b\n");
    }
}
