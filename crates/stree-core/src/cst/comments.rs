//! Attaching leftover comments to nodes
//!
//! Own-line comments inside statement lists are spliced in while the tree is
//! built. Everything else (comments after code, comments inside argument
//! lists, arrays, hashes and parameter lists, ignore markers) is attached
//! here once the tree is complete.
//!
//! For each comment the tree is descended through the children that contain
//! it. At the innermost level the nearest child before it and the nearest
//! child after it decide the placement:
//!
//! * a comment that follows code on its line trails the preceding node when
//!   that node ends on the same line, and otherwise leads the following node;
//! * a comment after a header such as `class Foo` or `if x`, before any code
//!   of the body, trails the last part of the header;
//! * an own-line comment leads the following node, or trails the preceding one;
//! * with neither, it trails the innermost enclosing node.

use super::node::{Comment, Node, NodeTag, Placement};

/// Attach `comments` (in source order) to the nodes of `program`
pub fn attach(program: &mut Node, comments: Vec<Comment>) {
    for comment in comments {
        let (path, placement) = decide(program, &comment);
        match node_at(program, &path) {
            Some(node) => push(node, comment, placement),
            None => push(program, comment, Placement::Trailing),
        }
    }
}

fn push(node: &mut Node, mut comment: Comment, placement: Placement) {
    comment.placement = placement;
    node.comments.push(comment);
}

fn node_at<'a>(node: &'a mut Node, path: &[usize]) -> Option<&'a mut Node> {
    match path.split_first() {
        None => Some(node),
        Some((&index, rest)) => node
            .child_nodes_mut()
            .into_iter()
            .nth(index)
            .and_then(|child| node_at(child, rest)),
    }
}

/// Children that can carry a comment, with their position among all children
fn candidates(node: &Node) -> Vec<(usize, &Node)> {
    let mut children: Vec<(usize, &Node)> = node
        .child_nodes()
        .into_iter()
        .enumerate()
        .filter(|(_, child)| {
            !child.location.is_empty()
                && !matches!(
                    child.tag(),
                    NodeTag::VoidStmt | NodeTag::CommentNode | NodeTag::EmbDoc
                )
        })
        .collect();
    children.sort_by_key(|(_, child)| (child.start_char(), child.end_char()));
    children
}

/// Where the code of a body starts, past any empty statement lists
fn content_start(node: &Node) -> Option<usize> {
    candidates(node)
        .into_iter()
        .find_map(|(_, child)| match child.tag() {
            NodeTag::Statements | NodeTag::BodyStmt => content_start(child),
            _ => Some(child.start_char()),
        })
}

/// Whether `body` holds `comment` before any of its code, as in
/// `class Foo # note`
fn opens_body(body: &Node, comment: &Comment) -> bool {
    matches!(body.tag(), NodeTag::Statements | NodeTag::BodyStmt)
        && !content_start(body).is_some_and(|start| start < comment.location.start_char)
}

/// The last part of a header that ends on the comment's line, such as the
/// predicate of an `if` or the name of a `def`
fn header_before<'n>(children: &[(usize, &'n Node)], comment: &Comment) -> Option<(usize, &'n Node)> {
    children
        .iter()
        .filter(|(_, child)| child.end_char() <= comment.location.start_char)
        .max_by_key(|(_, child)| child.end_char())
        .filter(|(_, child)| child.location.end_line == comment.location.start_line)
        .copied()
}

/// Path from the root to the receiving node, and the placement there
fn decide(root: &Node, comment: &Comment) -> (Vec<usize>, Placement) {
    let start = comment.location.start_char;
    let end = comment.location.end_char;
    let mut path = Vec::new();
    let mut node = root;

    loop {
        let children = candidates(node);

        let containing = children
            .iter()
            .find(|(_, child)| child.start_char() <= start && end <= child.end_char());
        if let Some((index, child)) = containing {
            if comment.inline && opens_body(child, comment) {
                if let Some((header, _)) = header_before(&children, comment) {
                    path.push(header);
                    return (path, Placement::Trailing);
                }
                if node.is(NodeTag::Begin) {
                    // printed after the `begin` keyword
                    path.push(*index);
                    return (path, Placement::Leading);
                }
            }
            path.push(*index);
            node = child;
            continue;
        }

        let overlapping = children
            .iter()
            .any(|(_, child)| child.start_char() < end && child.end_char() > start);
        if overlapping {
            tracing::warn!(
                line = comment.location.start_line,
                "Comment overlaps a node; attaching it to the enclosing node"
            );
            return (path, Placement::Trailing);
        }

        // `children` is sorted by start, so the nodes ending before the
        // comment form a prefix
        let split = children.partition_point(|(_, child)| child.end_char() <= start);
        let preceding = split.checked_sub(1).and_then(|i| children.get(i));
        let following = children.get(split);

        let with = |index: usize| {
            let mut path = path.clone();
            path.push(index);
            path
        };

        let decision = if comment.inline {
            match (preceding, following) {
                (Some((index, before)), _)
                    if before.location.end_line == comment.location.start_line =>
                {
                    Some((with(*index), Placement::Trailing))
                }
                (_, Some((index, _))) => Some((with(*index), Placement::Leading)),
                (Some((index, _)), None) => Some((with(*index), Placement::Trailing)),
                (None, None) => None,
            }
        } else {
            match (preceding, following) {
                (_, Some((index, _))) => Some((with(*index), Placement::Leading)),
                (Some((index, _)), None) => Some((with(*index), Placement::Trailing)),
                (None, None) => None,
            }
        };

        return decision.unwrap_or((path, Placement::Trailing));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cst::node::NodeKind;
    use crate::cst::parser::parse;

    fn first_statement(program: &Node) -> &Node {
        let NodeKind::Program(program) = &program.kind else {
            panic!("expected a program");
        };
        let NodeKind::Statements(statements) = &program.statements.kind else {
            panic!("expected statements");
        };
        &statements.body[0]
    }

    fn all_comments(node: &Node, out: &mut Vec<(NodeTag, String, Placement)>) {
        for comment in &node.comments {
            out.push((node.tag(), comment.value.clone(), comment.placement));
        }
        for child in node.child_nodes() {
            all_comments(child, out);
        }
    }

    #[test]
    fn trailing_comments_stay_on_their_line() {
        let program = parse("foo(1) # note\nbar\n").unwrap();
        let statement = first_statement(&program);
        assert_eq!(statement.comments.len(), 1);
        assert!(statement.comments[0].is_trailing());
        assert_eq!(statement.comments[0].value, "# note");
    }

    #[test]
    fn own_line_comments_in_arrays_lead_the_next_element() {
        let program = parse("[\n  1,\n  # two\n  2\n]\n").unwrap();
        let mut found = Vec::new();
        all_comments(&program, &mut found);
        assert_eq!(
            found,
            vec![(NodeTag::Int, "# two".to_string(), Placement::Leading)]
        );
    }

    #[test]
    fn comments_after_the_last_element_trail_it() {
        let program = parse("foo(\n  a, # first\n  b # second\n)\n").unwrap();
        let mut found = Vec::new();
        all_comments(&program, &mut found);
        let mut values: Vec<&str> = found.iter().map(|(_, value, _)| value.as_str()).collect();
        values.sort();
        assert_eq!(values, vec!["# first", "# second"]);
        assert!(found.iter().all(|(_, _, placement)| *placement == Placement::Trailing));
    }

    #[test]
    fn header_comments_trail_the_header() {
        let cases = [
            ("class A # cls\nend\n", NodeTag::ConstRef),
            ("def foo(a) # d\n  a\nend\n", NodeTag::Paren),
            ("if a # c1\n  b\nend\n", NodeTag::VCall),
            ("foo do # blk\n  bar\nend\n", NodeTag::Kw),
        ];
        for (source, tag) in cases {
            let program = parse(source).unwrap();
            let mut found = Vec::new();
            all_comments(&program, &mut found);
            assert_eq!(found.len(), 1, "{source:?}");
            assert_eq!(found[0].0, tag, "{source:?}");
            assert_eq!(found[0].2, Placement::Trailing, "{source:?}");
        }
    }

    #[test]
    fn comments_after_begin_lead_its_body() {
        let program = parse("begin # start\n  a\nend\n").unwrap();
        let mut found = Vec::new();
        all_comments(&program, &mut found);
        assert_eq!(
            found,
            vec![(NodeTag::BodyStmt, "# start".to_string(), Placement::Leading)]
        );
    }

    #[test]
    fn comments_after_code_in_a_body_stay_there() {
        let program = parse("if a\n  b # inside\nend\n").unwrap();
        let mut found = Vec::new();
        all_comments(&program, &mut found);
        assert_eq!(
            found,
            vec![(NodeTag::VCall, "# inside".to_string(), Placement::Trailing)]
        );
    }

    #[test]
    fn ignore_markers_lead_the_next_statement() {
        let program = parse("# stree-ignore\nfoo   bar\n").unwrap();
        let statement = first_statement(&program);
        assert_eq!(statement.comments.len(), 1);
        assert!(statement.comments[0].is_leading());
        assert!(statement.comments[0].is_ignore());
    }
}
