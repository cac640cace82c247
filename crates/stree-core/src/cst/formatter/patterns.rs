//! Array, find and hash patterns

use super::Formatter;
use super::literals::KeyStyle;
use crate::cst::format_element::Layout;
use crate::cst::node::*;

impl<'a> Formatter<'a> {
    /// Inside another pattern, where brackets cannot be left off
    fn in_nested_pattern(&self) -> bool {
        matches!(
            self.parent_tag(),
            Some(
                NodeTag::AryPtn
                    | NodeTag::Binary
                    | NodeTag::FndPtn
                    | NodeTag::HshPtn
                    | NodeTag::RAssign
            )
        )
    }

    /// `*name`, or a bare `*`
    fn format_splat_pattern(&mut self, node: &'a Node) {
        self.with_comments(node, |f| {
            f.text("*");
            if let NodeKind::VarField(field) = &node.kind {
                f.format_optional(field.value.as_deref());
            }
        });
    }

    fn format_pattern_parts(&mut self, inner: &'a AryPtn) {
        let mut first = true;
        let mut separate = |f: &mut Self| {
            if !first {
                f.comma_breakable();
            }
            first = false;
        };
        for required in &inner.requireds {
            separate(self);
            self.format(required);
        }
        if let Some(rest) = &inner.rest {
            separate(self);
            self.format_splat_pattern(rest);
        }
        for post in &inner.posts {
            separate(self);
            self.format(post);
        }
    }

    pub(super) fn format_aryptn(&mut self, inner: &'a AryPtn) {
        let count = inner.requireds.len() + inner.posts.len() + usize::from(inner.rest.is_some());

        if let Some(constant) = &inner.constant {
            self.format(constant);
            self.group(|f| {
                f.text("[");
                f.indent(|f| {
                    f.breakable_empty();
                    f.format_pattern_parts(inner);
                });
                f.breakable_empty();
                f.text("]");
            });
        } else if count == 1 || self.in_nested_pattern() {
            self.text("[");
            self.format_pattern_parts(inner);
            self.text("]");
        } else if count == 0 {
            self.text("[]");
        } else {
            self.group(|f| f.format_pattern_parts(inner));
        }
    }

    pub(super) fn format_fndptn(&mut self, inner: &'a FndPtn) {
        self.format_optional(inner.constant.as_deref());
        self.group(|f| {
            f.text("[");
            f.indent(|f| {
                f.breakable_empty();
                f.format_splat_pattern(&inner.left);
                f.comma_breakable();
                f.seplist(&inner.values, Self::comma_breakable);
                f.comma_breakable();
                f.format_splat_pattern(&inner.right);
            });
            f.breakable_empty();
            f.text("]");
        });
    }

    pub(super) fn format_hshptn(&mut self, inner: &'a HshPtn) {
        let parts: Vec<&'a Node> = inner
            .keywords
            .iter()
            .chain(inner.keyword_rest.as_deref())
            .collect();
        let nested = self.in_nested_pattern();
        // A lone `**` at the end of a clause line needs `then` to end it
        let bare_rest = inner.constant.is_none()
            && !nested
            && inner.keywords.is_empty()
            && matches!(
                inner.keyword_rest.as_deref().map(|rest| &rest.kind),
                Some(NodeKind::KwRestParam(KwRestParam { name: None }))
            );

        self.key_styles.push(KeyStyle::Identity);
        if let Some(constant) = &inner.constant {
            self.format(constant);
            self.group(|f| {
                f.text("[");
                f.indent(|f| {
                    f.breakable_empty();
                    f.seplist(parts, Self::comma_breakable);
                });
                f.breakable_empty();
                f.text("]");
            });
        } else if parts.is_empty() {
            self.text("{}");
        } else if parts.len() == 1 && !nested {
            self.seplist(parts, Self::comma_breakable);
            if bare_rest {
                self.text(" then");
            }
        } else {
            self.group(|f| {
                f.text("{");
                f.indent(|f| {
                    f.breakable_space();
                    f.seplist(parts, Self::comma_breakable);
                });
                f.breakable_space();
                f.text("}");
            });
        }
        self.key_styles.pop();
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

    fn clause(pattern: &str) -> String {
        let output = format(&format!("case x\nin {pattern}\n  y\nend\n"));
        output
            .strip_prefix("case x\nin ")
            .and_then(|rest| rest.strip_suffix("\n  y\nend\n"))
            .unwrap_or(&output)
            .to_string()
    }

    #[test]
    fn array_patterns() {
        assert_eq!(clause("[a, *rest]"), "a, *rest");
        assert_eq!(clause("[a]"), "[a]");
        assert_eq!(clause("[]"), "[]");
        assert_eq!(clause("Point[x, y]"), "Point[x, y]");
        assert_eq!(clause("[a, [b, c]]"), "a, [b, c]");
    }

    #[test]
    fn find_patterns() {
        assert_eq!(clause("[*, 1, *post]"), "[*, 1, *post]");
    }

    #[test]
    fn hash_patterns() {
        assert_eq!(clause("{ name: String }"), "name: String");
        assert_eq!(clause("{ a: 1, b: }"), "{ a: 1, b: }");
        assert_eq!(clause("{}"), "{}");
        assert_eq!(clause("Point(x:, y:)"), "Point[x:, y:]");
    }

    #[test]
    fn alternatives_bindings_and_guards() {
        assert_eq!(clause("Integer | Float => n"), "Integer | Float => n");
        assert_eq!(clause("[a, b] if a > b"), "a, b if a > b");
        assert_eq!(clause("^value"), "^value");
    }

    #[test]
    fn rightward_assignment() {
        assert_eq!(format("config => { name: }"), "config => { name: }\n");
        assert_eq!(format("value in Integer"), "value in Integer\n");
    }
}
