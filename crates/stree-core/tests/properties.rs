//! Properties that hold for every input: stable output, comments kept once,
//! locations nested inside their parents

use stree_core::cst::visitor::{Visitor, walk};
use stree_core::driver::{format, parse};
use stree_core::{Node, NodeKind, NodeTag};

const CORPUS: &[&str] = &[
    "x=1",
    "a, b = 1, 2",
    "foo(1,2)",
    "foo.bar(baz) { |x| x * 2 }",
    "items.map do |item|\n  item.name\nend\n",
    "if a then b end",
    "if a\n  b\nelsif c\n  d\nelse\n  e\nend\n",
    "unless done\n  retry_later\nend\n",
    "while running\n  tick\nend\n",
    "value = compute rescue nil",
    "case x\nwhen 1, 2 then :low\nelse :high\nend\n",
    "case point\nin [x, y]\n  x\nin { name: }\n  name\nend\n",
    "def greet(name, greeting: \"hi\")\n  \"#{greeting} #{name}\"\nend\n",
    "class Foo < Bar\n  private\n\n  def baz = 1\nend\n",
    "module A\n  B = [1, 2, 3]\nend\n",
    "begin\n  risky\nrescue ArgumentError => e\n  handle(e)\nensure\n  cleanup\nend\n",
    "{ :a => 1, \"b\" => 2 }",
    "add = ->(a, b) { a + b }",
    "puts <<~TEXT\n  hello\n  world\nTEXT\n",
    "list << item unless item.nil?",
    "return if done",
    "first_value = some_method_call(argument_one, argument_two, argument_three, argument_four)",
    "a ? b : c",
    "!x && (y || z)",
    "1..10",
    "/ab+c/i =~ text",
    "alias new_name old_name",
    "%w[a b c].each { puts _1 }",
    "foo(<<~A, 1)\n  a\nA\n",
    "x = <<~EOS.strip\n  text\nEOS\n",
    "x = <<~EOS\n  hello #{<<~INNER}\n    inner\n  INNER\nEOS\n",
    "x = *items",
    "pair = 1, 2",
    "case\nwhen ready? then go\nend\n",
    "case x\nin {a:}\n  a\nend\n",
];

#[test]
fn formatting_is_idempotent() {
    for source in CORPUS {
        let once = format(source).unwrap_or_else(|e| panic!("{source:?}: {e}"));
        let twice = format(&once).unwrap_or_else(|e| panic!("{once:?}: {e}"));
        assert_eq!(once, twice, "reformatting output of {source:?}");
    }
}

const COMMENTED: &[&str] = &[
    "# leading\nfoo # trailing\n",
    "def foo # why\n  # inside\n  bar\nend\n",
    "foo(\n  a, # first\n  b # second\n)\n",
    "[\n  1, # one\n  2\n]\n",
    "class A\n  # doc\n  def b; end\nend\n# last\n",
    "=begin\nblock\n=end\nfoo\n",
    "if x # check\n  y\nend\n",
    "class A # cls\nend\n",
    "module M # mod\n  X = 1\nend\n",
    "foo do # blk\n  bar\nend\n",
    "while x # loop\n  y\nend\n",
    "begin # start\n  a\nrescue # fail\n  b\nend\n",
    "x = 1 +   # plus\n  2\n",
    "list << # append\n  item\n",
];

fn comment_lines(source: &str) -> Vec<String> {
    source
        .lines()
        .filter_map(|line| line.find('#').map(|at| line[at..].trim_end().to_string()))
        .collect()
}

#[test]
fn comments_survive_exactly_once() {
    for source in COMMENTED {
        let output = format(source).unwrap_or_else(|e| panic!("{source:?}: {e}"));
        for comment in comment_lines(source) {
            assert_eq!(
                output.matches(comment.as_str()).count(),
                1,
                "{comment:?} in {output:?}"
            );
        }
        assert_eq!(format(&output).unwrap(), output, "reformatting {source:?}");
    }
}

#[test]
fn embedded_documents_are_verbatim() {
    let output = format("=begin\nblock\n=end\nfoo\n").unwrap();
    assert!(output.starts_with("=begin\nblock\n=end\n"));
}

/// Checks that every child lies inside its parent and that list children
/// come in order
struct LocationCheck {
    stack: Vec<(usize, usize)>,
    failures: Vec<String>,
}

impl<'a> Visitor<'a> for LocationCheck {
    fn visit(&mut self, node: &'a Node) {
        let (start, end) = (node.start_char(), node.end_char());
        if start > end {
            self.failures.push(format!("{} ends before it starts", node.type_name()));
        }
        if let Some(&(parent_start, parent_end)) = self.stack.last()
            && (start < parent_start || end > parent_end)
        {
            self.failures.push(format!(
                "{} at {start}..{end} escapes its parent {parent_start}..{parent_end}",
                node.type_name()
            ));
        }

        let list: Option<&[Node]> = match &node.kind {
            NodeKind::Statements(inner) => Some(&inner.body),
            NodeKind::Args(inner) => Some(&inner.parts),
            NodeKind::HashLiteral(inner) => Some(&inner.assocs),
            _ => None,
        };
        if let Some(list) = list {
            let real: Vec<&Node> = list.iter().filter(|n| !n.is(NodeTag::VoidStmt)).collect();
            for pair in real.windows(2) {
                // a heredoc body sits below the code that follows its opener
                let overlap_allowed = contains_heredoc(pair[0])
                    && pair[0].start_char() < pair[1].start_char();
                if pair[0].end_char() > pair[1].start_char() && !overlap_allowed {
                    self.failures.push(format!(
                        "{} overlaps the following {}",
                        pair[0].type_name(),
                        pair[1].type_name()
                    ));
                }
            }
        }

        self.stack.push((start, end));
        walk(self, node);
        self.stack.pop();
    }
}

fn contains_heredoc(node: &Node) -> bool {
    node.is(NodeTag::Heredoc) || node.child_nodes().into_iter().any(contains_heredoc)
}

#[test]
fn child_locations_nest_inside_parents() {
    for source in CORPUS {
        let program = parse(source).unwrap();
        let mut check = LocationCheck {
            stack: Vec::new(),
            failures: Vec::new(),
        };
        check.visit(&program);
        assert!(check.failures.is_empty(), "{source:?}: {:?}", check.failures);
    }
}

#[test]
fn program_spans_the_whole_source() {
    let source = "a = 1\nb = 2\n";
    let program = parse(source).unwrap();
    assert_eq!(program.start_char(), 0);
    assert_eq!(program.end_char(), source.chars().count());
}

#[test]
fn deep_nesting_is_an_error_not_a_crash() {
    let source = format!("{}1{}", "(".repeat(5000), ")".repeat(5000));
    assert!(parse(&source).is_err());
}
