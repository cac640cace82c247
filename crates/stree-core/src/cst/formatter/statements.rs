//! Programs, statement lists and the bodies of compound statements

use super::{Formatter, is_empty_body, is_empty_statements};
use crate::cst::format_element::Layout;
use crate::cst::node::*;

/// `private`, `protected` and `public` on their own
fn is_access_control(node: &Node) -> bool {
    match &node.kind {
        NodeKind::VCall(call) => matches!(
            call.value.token_value(),
            Some("private" | "protected" | "public")
        ),
        _ => false,
    }
}

impl<'a> Formatter<'a> {
    pub(super) fn format_program(&mut self, inner: &'a Program) {
        self.format(&inner.statements);
        let ends_with_data = match &inner.statements.kind {
            NodeKind::Statements(statements) => statements
                .body
                .last()
                .is_some_and(|last| last.is(NodeTag::EndContent)),
            _ => false,
        };
        if !ends_with_data {
            self.breakable_force();
        }
    }

    /// One statement per line, keeping single blank lines from the source
    pub(super) fn format_statements(&mut self, body: &'a [Node]) {
        if let [first, second] = body
            && first.is(NodeTag::VoidStmt)
            && second.is(NodeTag::CommentNode)
        {
            self.format(second);
            self.break_parent();
            return;
        }

        let in_interpolation = self.parent_tag() == Some(NodeTag::StringEmbExpr);
        let mut previous: Option<&'a Node> = None;

        for statement in body {
            if statement.is(NodeTag::VoidStmt) {
                continue;
            }

            if let Some(before) = previous {
                let line = before.last_line();
                let start = statement.location.start_line;
                if start.saturating_sub(line) > 1
                    || is_access_control(statement)
                    || is_access_control(before)
                {
                    self.breakable_force();
                    self.breakable_force();
                } else if start != line || !in_interpolation {
                    self.breakable_force();
                } else {
                    self.text("; ");
                }
            }

            self.format(statement);
            previous = Some(statement);
        }
    }

    pub(super) fn format_embdoc(&mut self, inner: &'a EmbDoc) {
        self.trim();
        self.text(&inner.value);
    }

    pub(super) fn format_end_content(&mut self, inner: &'a EndContent) {
        self.text("__END__");
        self.breakable_force();
        self.format_lines(&inner.value);
    }

    /// Body of a `def`, `class`, `module` or `class <<`
    pub(super) fn format_body(&mut self, bodystmt: &'a Node) {
        if is_empty_body(bodystmt) {
            return;
        }
        let leading_statements = match &bodystmt.kind {
            NodeKind::BodyStmt(inner) => !is_empty_statements(&inner.statements),
            _ => true,
        };
        self.indent(|f| {
            if leading_statements {
                f.breakable_force();
            }
            f.format(bodystmt);
        });
    }

    /// Indented statements of a clause such as `else` or `ensure`
    pub(super) fn format_clause_body(&mut self, statements: &'a Node) {
        if is_empty_statements(statements) {
            return;
        }
        self.indent(|f| {
            f.breakable_force();
            f.format(statements);
        });
    }

    pub(super) fn format_bodystmt(&mut self, inner: &'a BodyStmt) {
        self.group(|f| {
            if !is_empty_statements(&inner.statements) {
                f.format(&inner.statements);
            }
            if let Some(rescue) = &inner.rescue_clause {
                f.nest(-2, |f| {
                    f.breakable_force();
                    f.format(rescue);
                });
            }
            if let Some(keyword) = &inner.else_keyword {
                f.nest(-2, |f| {
                    f.breakable_force();
                    f.format(keyword);
                });
                if let Some(clause) = &inner.else_clause
                    && !is_empty_statements(clause)
                {
                    f.breakable_force();
                    f.format(clause);
                }
            }
            if let Some(ensure) = &inner.ensure_clause {
                f.nest(-2, |f| {
                    f.breakable_force();
                    f.format(ensure);
                });
            }
        });
    }

    /// `BEGIN { ... }` and `END { ... }`
    pub(super) fn format_program_hook(&mut self, keyword: &str, statements: &'a Node) {
        self.group(|f| {
            f.text(keyword);
            if is_empty_statements(statements) {
                f.text(" {}");
                return;
            }
            f.text(" {");
            f.indent(|f| {
                f.breakable_space();
                f.format(statements);
            });
            f.breakable_space();
            f.text("}");
        });
    }
}

#[cfg(test)]
mod tests {
    use crate::cst::formatter::{FormatOptions, format_program};
    use crate::driver::parse;

    fn format(source: &str) -> String {
        let program = parse(source).unwrap();
        format_program(&program, source, &FormatOptions::default())
    }

    #[test]
    fn collapses_runs_of_blank_lines() {
        assert_eq!(format("a\n\n\n\nb\nc\n"), "a\n\nb\nc\n");
    }

    #[test]
    fn separates_access_modifiers() {
        assert_eq!(
            format("class A\n  def a; end\n  private\n  def b; end\nend\n"),
            "class A\n  def a\n  end\n\n  private\n\n  def b\n  end\nend\n"
        );
    }

    #[test]
    fn keeps_data_after_end_marker() {
        assert_eq!(format("foo\n__END__\nraw  text\n"), "foo\n__END__\nraw  text\n");
    }

    #[test]
    fn embedded_documents_start_at_column_zero() {
        let source = "class A\n=begin\ndocs\n=end\n  def a\n  end\nend\n";
        assert_eq!(format(source), source);
    }

    #[test]
    fn begin_blocks_collapse_when_short() {
        assert_eq!(format("BEGIN {\n  foo\n}\n"), "BEGIN { foo }\n");
        assert_eq!(format("END {}\n"), "END {}\n");
    }
}
