//! Method calls, call chains, arguments and blocks

use super::{Formatter, is_empty_body};
use crate::cst::format_element::{Layout, flat_width};
use crate::cst::node::*;

/// Number of links from which a chain is laid out one call per line
const CHAIN_THRESHOLD: usize = 3;

/// A call with a receiver, or a block attached to one
fn is_chained(node: &Node) -> bool {
    match &node.kind {
        NodeKind::CallNode(call) => call.receiver.is_some(),
        NodeKind::MethodAddBlock(block) => {
            matches!(&block.call.kind, NodeKind::CallNode(call) if call.receiver.is_some())
        }
        _ => false,
    }
}

/// One `.message(args) { block }` step of a call chain
struct Link<'a> {
    node: &'a Node,
    call: &'a CallNode,
    /// The method-add-block node when the step carries a block
    owner: Option<&'a Node>,
    block: Option<&'a Node>,
}

/// The innermost receiver and the links applied to it, innermost first
fn chain_links(top: &Node) -> (&Node, Vec<Link<'_>>) {
    let mut links = Vec::new();
    let mut current = top;
    loop {
        match &current.kind {
            NodeKind::MethodAddBlock(owner) => match &owner.call.kind {
                NodeKind::CallNode(call) if call.receiver.is_some() => {
                    links.push(Link {
                        node: &owner.call,
                        call,
                        owner: Some(current),
                        block: Some(&owner.block),
                    });
                    match call.receiver.as_deref() {
                        Some(receiver) => current = receiver,
                        None => break,
                    }
                }
                _ => break,
            },
            NodeKind::CallNode(call) => match call.receiver.as_deref() {
                Some(receiver) => {
                    links.push(Link {
                        node: current,
                        call,
                        owner: None,
                        block: None,
                    });
                    current = receiver;
                }
                None => break,
            },
            _ => break,
        }
    }
    links.reverse();
    (current, links)
}

/// Long enough, and with arguments or blocks before the last step
fn worth_chaining(links: &[Link<'_>]) -> bool {
    let count = links.len() + links.iter().filter(|link| link.block.is_some()).count();
    if count < CHAIN_THRESHOLD {
        return false;
    }
    let Some((_, before_last)) = links.split_last() else {
        return false;
    };
    before_last
        .iter()
        .any(|link| link.call.arguments.is_some() || link.block.is_some())
}

fn predicate_of(node: &Node) -> Option<&Node> {
    match &node.kind {
        NodeKind::IfNode(inner) => Some(&inner.predicate),
        NodeKind::UnlessNode(inner) => Some(&inner.predicate),
        NodeKind::WhileNode(inner) => Some(&inner.predicate),
        NodeKind::UntilNode(inner) => Some(&inner.predicate),
        NodeKind::IfOp(inner) => Some(&inner.predicate),
        _ => None,
    }
}

impl<'a> Formatter<'a> {
    pub(super) fn format_field(&mut self, inner: &'a Field) {
        self.group(|f| {
            f.format(&inner.parent);
            f.format(&inner.operator);
            f.format(&inner.name);
        });
    }

    pub(super) fn format_aref(&mut self, collection: &'a Node, index: Option<&'a Node>) {
        self.group(|f| {
            f.format(collection);
            f.text("[");
            if let Some(index) = index {
                f.indent(|f| {
                    f.breakable_empty();
                    f.format(index);
                });
                f.breakable_empty();
            }
            f.text("]");
        });
    }

    /// `::` reads as `.` except before a constant without arguments
    fn format_call_operator(&mut self, operator: &'a Node, message: Option<&'a Node>, has_arguments: bool) {
        let constant = message.is_some_and(|message| message.is(NodeTag::Const));
        if operator.token_value() == Some("::") && !(constant && !has_arguments) {
            self.with_comments(operator, |f| f.text("."));
        } else {
            self.format(operator);
        }
    }

    pub(super) fn format_call(&mut self, node: &'a Node, inner: &'a CallNode) {
        if inner.receiver.is_some() && !self.parent().is_some_and(is_chained) {
            let (root, links) = chain_links(node);
            if worth_chaining(&links) {
                self.format_chain(root, &links);
                return;
            }
        }

        let message = inner.message.as_deref();
        let has_arguments = inner.arguments.is_some();
        if let Some(receiver) = &inner.receiver {
            self.group(|f| {
                f.format(receiver);
                let Some(operator) = inner.operator.as_deref() else {
                    f.format_optional(message);
                    return;
                };
                let comment_between = receiver.comments.iter().any(|comment| !comment.is_leading())
                    || operator.has_comments();
                if comment_between {
                    f.indent(|f| {
                        f.breakable_force();
                        f.format_call_operator(operator, message, has_arguments);
                        f.format_optional(message);
                    });
                } else {
                    f.format_call_operator(operator, message, has_arguments);
                    f.format_optional(message);
                }
            });
        } else {
            self.format_optional(message);
        }
        self.format_optional(inner.arguments.as_deref());
    }

    /// The receiver, then every link on its own line when the chain breaks
    fn format_chain(&mut self, root: &'a Node, links: &[Link<'a>]) {
        let Some((top, rest)) = links.split_last() else {
            self.format(root);
            return;
        };
        let attached = matches!(
            root.tag(),
            NodeTag::ArrayLiteral
                | NodeTag::HashLiteral
                | NodeTag::Heredoc
                | NodeTag::IfNode
                | NodeTag::UnlessNode
                | NodeTag::XStringLiteral
        );

        self.format(root);
        self.group(|f| {
            f.indent(|f| {
                let mut first = true;
                for link in rest {
                    if !(first && attached) {
                        f.breakable_empty();
                    }
                    first = false;
                    match (link.owner, link.block) {
                        (Some(owner), Some(block)) => f.with_comments(owner, |f| {
                            f.with_comments(link.node, |f| f.format_link(link.call));
                            f.format(block);
                        }),
                        _ => f.with_comments(link.node, |f| f.format_link(link.call)),
                    }
                }
                if !(first && attached) {
                    f.breakable_empty();
                }
                // The top node is already on the stack unless a block owns it.
                if top.owner.is_some() {
                    f.with_comments(top.node, |f| f.format_link(top.call));
                } else {
                    f.format_link(top.call);
                }
            });
        });
        if let Some(block) = top.block {
            self.format(block);
        }
    }

    fn format_link(&mut self, call: &'a CallNode) {
        let message = call.message.as_deref();
        if let Some(operator) = call.operator.as_deref() {
            self.format_call_operator(operator, message, call.arguments.is_some());
        }
        self.format_optional(message);
        self.format_optional(call.arguments.as_deref());
    }

    pub(super) fn format_method_add_block(&mut self, node: &'a Node, inner: &'a MethodAddBlock) {
        if is_chained(&inner.call) && !self.parent().is_some_and(is_chained) {
            let (root, links) = chain_links(node);
            if worth_chaining(&links) {
                self.format_chain(root, &links);
                return;
            }
        }
        self.format(&inner.call);
        self.format(&inner.block);
    }

    /// A block inside command arguments binds differently with braces, so
    /// its delimiters stay as written
    fn block_bounds_fixed(&self) -> bool {
        for ancestor in self.ancestors() {
            match ancestor.tag() {
                NodeTag::Statements | NodeTag::ArgParen => return false,
                NodeTag::Command | NodeTag::CommandCall => return true,
                _ => {}
            }
        }
        false
    }

    /// `return foo { }` would pass the block to `return`
    fn block_needs_do_end(&self) -> bool {
        match self.parent().map(|parent| &parent.kind) {
            Some(NodeKind::MethodAddBlock(owner)) => matches!(
                owner.call.tag(),
                NodeTag::Break | NodeTag::Next | NodeTag::ReturnNode | NodeTag::Super
            ),
            _ => false,
        }
    }

    /// `do` inside a condition would be read as the loop's `do`
    fn block_needs_braces(&self, node: &'a Node) -> bool {
        let mut previous = node;
        for ancestor in self.ancestors() {
            match ancestor.tag() {
                NodeTag::Paren | NodeTag::Statements => return false,
                _ => {}
            }
            if predicate_of(ancestor).is_some_and(|predicate| std::ptr::eq(predicate, previous)) {
                return true;
            }
            previous = ancestor;
        }
        false
    }

    pub(super) fn format_block(&mut self, node: &'a Node, inner: &'a BlockNode) {
        let written_do = inner.opening.token_value() == Some("do");
        let owned_by_command = matches!(
            self.parent_tag(),
            Some(NodeTag::Command | NodeTag::CommandCall)
        );
        let (break_open, break_close, flat_open, flat_close) =
            if owned_by_command || self.block_bounds_fixed() {
                if written_do {
                    ("do", "end", "do", "end")
                } else {
                    ("{", "}", "{", "}")
                }
            } else if self.block_needs_do_end() {
                ("do", "end", "do", "end")
            } else if self.block_needs_braces(node) {
                ("{", "}", "{", "}")
            } else {
                ("do", "end", "{", "}")
            };
        let empty = is_empty_body(&inner.bodystmt);

        self.group(|f| {
            if owned_by_command {
                f.break_parent();
            }
            f.text(" ");
            f.with_comments(&inner.opening, |f| {
                f.if_break(|f| f.text(break_open), |f| f.text(flat_open));
            });
            if let Some(block_var) = &inner.block_var {
                f.text(" ");
                f.format(block_var);
            }
            if empty {
                if inner.block_var.is_some() {
                    f.breakable_space();
                } else {
                    f.breakable_empty();
                }
            } else {
                f.indent(|f| {
                    f.breakable_space();
                    f.format(&inner.bodystmt);
                });
                f.breakable_space();
            }
            f.if_break(|f| f.text(break_close), |f| f.text(flat_close));
        });
    }

    pub(super) fn format_block_var(&mut self, inner: &'a BlockVar) {
        self.text("|");
        self.flat_group(|f| {
            f.format(&inner.params);
            if !inner.locals.is_empty() {
                f.text("; ");
                f.seplist(&inner.locals, |f| f.text(", "));
            }
        });
        self.text("|");
    }

    pub(super) fn format_arg_paren(&mut self, inner: &'a ArgParen) {
        let Some(arguments) = &inner.arguments else {
            self.text("()");
            return;
        };
        self.text("(");
        self.group(|f| {
            f.indent(|f| {
                f.breakable_empty();
                f.format(arguments);
                if let NodeKind::Args(args) = &arguments.kind {
                    f.format_trailing_comma(&args.parts);
                }
            });
            f.breakable_empty();
        });
        self.text(")");
    }

    /// Arguments of a call without parentheses line up after the message
    fn format_command_arguments(&mut self, width: usize, arguments: &'a Node) {
        let unaligned = match &arguments.kind {
            NodeKind::Args(args) => matches!(
                args.parts.as_slice(),
                [part] if matches!(part.tag(), NodeTag::DefNode | NodeTag::IfOp)
            ),
            _ => false,
        };
        self.text(" ");
        if unaligned {
            self.format(arguments);
        } else {
            self.nest(width as isize + 1, |f| f.format(arguments));
        }
    }

    pub(super) fn format_command(&mut self, inner: &'a Command) {
        self.group(|f| {
            f.format(&inner.message);
            let width = inner
                .message
                .token_value()
                .map_or(0, |message| message.chars().count());
            f.format_command_arguments(width, &inner.arguments);
        });
        self.format_optional(inner.block.as_deref());
    }

    pub(super) fn format_command_call(&mut self, inner: &'a CommandCall) {
        self.group(|f| {
            let head = f.capture(|f| {
                f.format(&inner.receiver);
                f.format_call_operator(&inner.operator, Some(&inner.message), inner.arguments.is_some());
                f.format(&inner.message);
            });
            let width = flat_width(&head);
            for element in head {
                f.doc().push(element);
            }
            if let Some(arguments) = &inner.arguments {
                let width = if width > f.options.print_width / 2 { 0 } else { width };
                f.format_command_arguments(width, arguments);
            }
        });
        self.format_optional(inner.block.as_deref());
    }

    /// `super`, `yield`, `return`, `break` and `next` with their arguments
    pub(super) fn format_keyword_arguments(&mut self, keyword: &str, arguments: Option<&'a Node>) {
        self.text(keyword);
        let Some(arguments) = arguments else {
            return;
        };
        match &arguments.kind {
            NodeKind::ArgParen(_) => self.format(arguments),
            NodeKind::Args(args) if args.parts.is_empty() => {}
            _ => {
                self.group(|f| {
                    f.text(" ");
                    f.nest(keyword.len() as isize + 1, |f| f.format(arguments));
                });
            }
        }
    }

    pub(super) fn format_defined(&mut self, inner: &'a Defined) {
        self.group(|f| {
            f.text("defined?(");
            f.indent(|f| {
                f.breakable_empty();
                f.format(&inner.value);
            });
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
    fn short_calls_stay_on_one_line() {
        assert_eq!(format("foo(  1,2 )"), "foo(1, 2)\n");
        assert_eq!(format("foo.bar( )"), "foo.bar()\n");
        assert_eq!(format("Foo::bar"), "Foo.bar\n");
        assert_eq!(format("Foo::Bar"), "Foo::Bar\n");
    }

    #[test]
    fn long_argument_lists_break_inside_parentheses() {
        assert_eq!(
            format_with("method_name(first_argument, second_argument)", 30),
            "method_name(\n  first_argument,\n  second_argument\n)\n"
        );
    }

    #[test]
    fn command_arguments_align_after_the_message() {
        assert_eq!(
            format_with("attr_reader :first_name, :last_name, :email", 30),
            "attr_reader :first_name,\n            :last_name,\n            :email\n"
        );
    }

    #[test]
    fn chains_break_one_call_per_line() {
        assert_eq!(
            format_with("records.where(active: true).order(:name).limit(10)", 40),
            "records\n  .where(active: true)\n  .order(:name)\n  .limit(10)\n"
        );
        assert_eq!(
            format("records.where(active: true).order(:name).limit(10)"),
            "records.where(active: true).order(:name).limit(10)\n"
        );
    }

    #[test]
    fn blocks_switch_delimiters_with_the_layout() {
        assert_eq!(format("foo.each do |x| x end"), "foo.each { |x| x }\n");
        assert_eq!(
            format_with("items.each { |item| process_the_item(item) }", 30),
            "items.each do |item|\n  process_the_item(item)\nend\n"
        );
        assert_eq!(format("foo {}"), "foo {}\n");
    }

    #[test]
    fn command_blocks_keep_do_end() {
        assert_eq!(
            format("it \"works\" do\n  run\nend\n"),
            "it \"works\" do\n  run\nend\n"
        );
    }
}
