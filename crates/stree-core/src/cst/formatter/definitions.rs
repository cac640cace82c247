//! Method, class and module definitions and parameter lists

use super::Formatter;
use crate::cst::format_element::Layout;
use crate::cst::node::*;

impl<'a> Formatter<'a> {
    pub(super) fn format_def(&mut self, inner: &'a DefNode) {
        let endless = !inner.bodystmt.is(NodeTag::BodyStmt);
        self.group(|f| {
            f.group(|f| {
                f.text("def ");
                if let Some(target) = &inner.target {
                    f.format(target);
                    f.format_optional(inner.operator.as_deref());
                }
                f.format(&inner.name);
                if let Some(params) = &inner.params {
                    let bare_and_empty =
                        params.is(NodeTag::Params) && params.child_nodes().is_empty();
                    if !bare_and_empty {
                        f.format(params);
                    }
                }
            });

            if endless {
                f.text(" =");
                f.group(|f| {
                    f.indent(|f| {
                        f.breakable_space();
                        f.format(&inner.bodystmt);
                    });
                });
                return;
            }

            f.format_body(&inner.bodystmt);
            f.breakable_force();
            f.text("end");
        });
    }

    pub(super) fn format_class(&mut self, inner: &'a ClassDeclaration) {
        self.group(|f| {
            f.group(|f| {
                f.text("class ");
                f.format(&inner.constant);
                if let Some(superclass) = &inner.superclass {
                    f.text(" < ");
                    f.format(superclass);
                }
            });
            f.format_body(&inner.bodystmt);
            f.breakable_force();
            f.text("end");
        });
    }

    /// Parameters in declaration order; a bare list on a `def` gains
    /// parentheses
    pub(super) fn format_params(&mut self, inner: &'a Params) {
        let rest = inner
            .rest
            .as_deref()
            .filter(|rest| !rest.is(NodeTag::ExcessedComma));
        let excessed_comma = inner
            .rest
            .as_deref()
            .filter(|rest| rest.is(NodeTag::ExcessedComma));

        let parts: Vec<&'a Node> = inner
            .requireds
            .iter()
            .chain(&inner.optionals)
            .chain(rest)
            .chain(&inner.posts)
            .chain(&inner.keywords)
            .chain(inner.keyword_rest.as_deref())
            .chain(inner.block.as_deref())
            .collect();

        let contents = |f: &mut Self| {
            f.seplist(parts, Self::comma_breakable);
            if let Some(comma) = excessed_comma {
                f.format(comma);
            }
        };

        if self.parent_tag() == Some(NodeTag::DefNode) {
            self.text("(");
            self.group(|f| {
                f.indent(|f| {
                    f.breakable_empty();
                    contents(f);
                });
                f.breakable_empty();
            });
            self.text(")");
        } else {
            contents(self);
        }
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
    fn method_definitions() {
        assert_eq!(format("def foo(a,b=1,*c,d:,e: 2,**f,&g)\nend"), "def foo(a, b = 1, *c, d:, e: 2, **f, &g)\nend\n");
        assert_eq!(format("def foo a, b\n  a\nend"), "def foo(a, b)\n  a\nend\n");
        assert_eq!(format("def self.foo; end"), "def self.foo\nend\n");
        assert_eq!(format("def foo() = 1"), "def foo() = 1\n");
    }

    #[test]
    fn class_and_module_bodies() {
        assert_eq!(format("class Foo<Bar\nend"), "class Foo < Bar\nend\n");
        assert_eq!(
            format("module A\n  class B\n    x\n  end\nend"),
            "module A\n  class B\n    x\n  end\nend\n"
        );
        assert_eq!(format("class << self\n  def a; end\nend"), "class << self\n  def a\n  end\nend\n");
    }

    #[test]
    fn rescue_in_method_bodies() {
        let source = "def foo\n  bar\nrescue StandardError\n  baz\nensure\n  qux\nend\n";
        assert_eq!(format(source), source);
    }

    #[test]
    fn block_parameters_stay_flat() {
        assert_eq!(format("foo { |a,(b,c),*d| a }"), "foo { |a, (b, c), *d| a }\n");
        assert_eq!(format("foo { |a,| a }"), "foo { |a,| a }\n");
    }
}
