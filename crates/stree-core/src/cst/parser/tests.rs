use super::*;
use crate::cst::node::{NodeKind, NodeTag};

fn statements(source: &str) -> Vec<Node> {
    let program = parse(source).unwrap();
    let NodeKind::Program(program) = program.kind else {
        panic!("expected a program");
    };
    let NodeKind::Statements(statements) = program.statements.kind else {
        panic!("expected statements");
    };
    statements.body
}

fn first(source: &str) -> Node {
    statements(source).remove(0)
}

/// Tags of a node and its descendants, depth first
fn shape(node: &Node) -> String {
    let children: Vec<String> = node.child_nodes().into_iter().map(shape).collect();
    if children.is_empty() {
        node.type_name().to_string()
    } else {
        format!("{}({})", node.type_name(), children.join(" "))
    }
}

#[test]
fn empty_programs_hold_a_void_statement() {
    let body = statements("");
    assert_eq!(body.len(), 1);
    assert!(body[0].is(NodeTag::VoidStmt));
}

#[test]
fn operators_follow_precedence() {
    let node = first("1 + 2 * 3");
    assert_eq!(shape(&node), "binary(int binary(int int))");

    let node = first("2 ** 3 ** 4");
    let NodeKind::Binary(binary) = &node.kind else {
        panic!("expected a binary");
    };
    assert!(binary.left.is(NodeTag::Int));
    assert!(binary.right.is(NodeTag::Binary));
}

#[test]
fn keyword_operators_bind_loosest() {
    let node = first("a = 1 and b");
    let NodeKind::Binary(binary) = &node.kind else {
        panic!("expected a binary");
    };
    assert_eq!(binary.operator, "and");
    assert!(binary.left.is(NodeTag::Assign));
}

#[test]
fn commands_take_arguments_without_parentheses() {
    let node = first("puts 1, 2");
    assert_eq!(shape(&node), "command(ident args(int int))");

    let node = first("foo.bar baz");
    assert_eq!(shape(&node), "command_call(vcall(ident) period ident args(vcall(ident)))");
}

#[test]
fn locals_are_not_method_calls() {
    let body = statements("x = 1\nx\ny\n");
    assert!(body[1].is(NodeTag::VarRef));
    assert!(body[2].is(NodeTag::VCall));
}

#[test]
fn calls_with_parentheses_and_blocks() {
    let node = first("foo(1) { |x| x }");
    let NodeKind::MethodAddBlock(add) = &node.kind else {
        panic!("expected a block call");
    };
    assert!(add.call.is(NodeTag::CallNode));
    let NodeKind::BlockNode(block) = &add.block.kind else {
        panic!("expected a block");
    };
    assert!(block.block_var.is_some());
    assert_eq!(block.opening.token_value(), Some("{"));
}

#[test]
fn commands_keep_their_do_blocks() {
    let node = first("it 'works' do\n  run\nend\n");
    let NodeKind::Command(command) = &node.kind else {
        panic!("expected a command");
    };
    assert!(command.block.is_some());
    assert_eq!(node.location.end_line, 3);
}

#[test]
fn keyword_arguments_gather_into_a_bare_hash() {
    let node = first("foo(1, a: 2, 'b' => 3, &blk)");
    let NodeKind::CallNode(call) = &node.kind else {
        panic!("expected a call");
    };
    let arguments = call.arguments.as_ref().unwrap();
    assert_eq!(
        shape(arguments),
        "arg_paren(args(int bare_assoc_hash(assoc(label int) assoc(string_literal(tstring_content) int)) arg_block(vcall(ident))))"
    );
}

#[test]
fn multiple_assignment_collects_targets() {
    let node = first("a, *b, (c, d) = list");
    let NodeKind::MAssign(massign) = &node.kind else {
        panic!("expected a multiple assignment");
    };
    let NodeKind::Mlhs(mlhs) = &massign.target.kind else {
        panic!("expected targets");
    };
    let tags: Vec<NodeTag> = mlhs.parts.iter().map(Node::tag).collect();
    assert_eq!(tags, vec![NodeTag::VarField, NodeTag::ArgStar, NodeTag::MlhsParen]);
}

#[test]
fn attribute_and_index_targets() {
    assert!(matches!(&first("a.b = 1").kind, NodeKind::Assign(assign) if assign.target.is(NodeTag::Field)));
    assert!(matches!(&first("a[1] += 1").kind, NodeKind::OpAssign(assign) if assign.target.is(NodeTag::ARefField)));
    assert!(matches!(&first("A::B ||= 1").kind, NodeKind::OpAssign(assign) if assign.target.is(NodeTag::ConstPathField)));
}

#[test]
fn modifiers_wrap_statements() {
    let node = first("foo if bar");
    let NodeKind::IfNode(node) = &node.kind else {
        panic!("expected an if");
    };
    assert!(node.modifier);

    let node = first("x = risky rescue nil");
    assert!(matches!(&node.kind, NodeKind::Assign(assign) if assign.value.is(NodeTag::RescueMod)));
}

#[test]
fn conditionals_chain_their_clauses() {
    let node = first("if a\n  1\nelsif b\n  2\nelse\n  3\nend\n");
    let NodeKind::IfNode(node) = &node.kind else {
        panic!("expected an if");
    };
    let elsif = node.consequent.as_ref().unwrap();
    let NodeKind::Elsif(elsif) = &elsif.kind else {
        panic!("expected an elsif");
    };
    assert!(elsif.consequent.as_ref().unwrap().is(NodeTag::Else));
}

#[test]
fn definitions_and_bodies() {
    let node = first("def foo(a, b = 1, *c, d:, e: 2, **f, &g)\n  a\nrescue Error => e\n  b\nensure\n  c\nend\n");
    let NodeKind::DefNode(def) = &node.kind else {
        panic!("expected a def");
    };
    let params = def.params.as_ref().unwrap();
    let NodeKind::Paren(paren) = &params.kind else {
        panic!("expected parenthesized params");
    };
    let NodeKind::Params(params) = &paren.contents.as_ref().unwrap().kind else {
        panic!("expected params");
    };
    assert_eq!(params.requireds.len(), 1);
    assert_eq!(params.optionals.len(), 1);
    assert!(params.rest.is_some());
    assert_eq!(params.keywords.len(), 2);
    assert!(params.keyword_rest.is_some());
    assert!(params.block.is_some());

    let NodeKind::BodyStmt(body) = &def.bodystmt.kind else {
        panic!("expected a body");
    };
    assert!(body.rescue_clause.is_some());
    assert!(body.ensure_clause.is_some());
}

#[test]
fn endless_and_singleton_definitions() {
    let node = first("def self.square(x) = x * x");
    let NodeKind::DefNode(def) = &node.kind else {
        panic!("expected a def");
    };
    assert!(def.target.is_some());
    assert!(def.bodystmt.is(NodeTag::Binary));
}

#[test]
fn classes_and_modules() {
    let node = first("class Foo::Bar < Base\n  include Baz\nend\n");
    let NodeKind::ClassDeclaration(class) = &node.kind else {
        panic!("expected a class");
    };
    assert!(class.constant.is(NodeTag::ConstPathRef));
    assert!(class.superclass.is_some());

    let node = first("class << self\nend\n");
    assert!(node.is(NodeTag::SClass));

    let node = first("module Outer\n  VALUE = 1\nend\n");
    assert!(node.is(NodeTag::ModuleDeclaration));
}

#[test]
fn block_parameters_with_trailing_comma() {
    let node = first("each { |a, | a }");
    let NodeKind::MethodAddBlock(add) = &node.kind else {
        panic!("expected a block call");
    };
    let NodeKind::BlockNode(block) = &add.block.kind else {
        panic!("expected a block");
    };
    let NodeKind::BlockVar(block_var) = &block.block_var.as_ref().unwrap().kind else {
        panic!("expected block params");
    };
    let NodeKind::Params(params) = &block_var.params.kind else {
        panic!("expected params");
    };
    assert!(params.rest.as_ref().unwrap().is(NodeTag::ExcessedComma));
}

#[test]
fn lambdas() {
    let node = first("->(x) { x + 1 }");
    assert!(node.is(NodeTag::Lambda));
    let node = first("-> do\n  1\nend\n");
    assert!(node.is(NodeTag::Lambda));
}

#[test]
fn strings_and_interpolation() {
    let node = first("\"a#{b}c\"");
    assert_eq!(
        shape(&node),
        "string_literal(tstring_content string_embexpr(statements(vcall(ident))) tstring_content)"
    );

    let node = first("%w[a b c]");
    let NodeKind::QWords(words) = &node.kind else {
        panic!("expected a word list");
    };
    assert_eq!(words.elements.len(), 3);

    let node = first(":foo");
    assert_eq!(shape(&node), "symbol_literal(symbol(ident))");
}

#[test]
fn heredocs_span_their_body() {
    let body = statements("foo(<<~EOS)\n  text\nEOS\nbar\n");
    let NodeKind::CallNode(call) = &body[0].kind else {
        panic!("expected a call");
    };
    let arguments = call.arguments.as_ref().unwrap();
    let NodeKind::ArgParen(paren) = &arguments.kind else {
        panic!("expected parenthesized arguments");
    };
    let NodeKind::Args(args) = &paren.arguments.as_ref().unwrap().kind else {
        panic!("expected arguments");
    };
    let NodeKind::Heredoc(heredoc) = &args.parts[0].kind else {
        panic!("expected a heredoc");
    };
    assert_eq!(heredoc.dedent, 2);
    assert_eq!(heredoc.ending.token_value(), Some("EOS\n"));
    assert!(body[1].is(NodeTag::VCall));

    // The call and its arguments reach down to the terminator
    assert_eq!(body[0].location.end_line, 3);
    assert_eq!(args.parts[0].location.end_line, 3);
    assert!(body[0].end_char() >= args.parts[0].end_char());
}

#[test]
fn case_in_patterns() {
    let node = first("case value\nin [Integer => x, *rest]\n  x\nin {name: String}\n  1\nin [*, 1, *]\n  2\nend\n");
    let NodeKind::Case(case) = &node.kind else {
        panic!("expected a case");
    };
    let NodeKind::In(clause) = &case.consequent.kind else {
        panic!("expected an in clause");
    };
    let NodeKind::AryPtn(pattern) = &clause.pattern.kind else {
        panic!("expected an array pattern");
    };
    assert_eq!(pattern.requireds.len(), 1);
    assert!(pattern.requireds[0].is(NodeTag::Binary));
    assert!(pattern.rest.is_some());

    let NodeKind::In(second) = &clause.consequent.as_ref().unwrap().kind else {
        panic!("expected a second clause");
    };
    assert!(second.pattern.is(NodeTag::HshPtn));

    let NodeKind::In(third) = &second.consequent.as_ref().unwrap().kind else {
        panic!("expected a third clause");
    };
    assert!(third.pattern.is(NodeTag::FndPtn));
}

#[test]
fn rightward_assignment() {
    let node = first("config => {db: {user:}}");
    let NodeKind::RAssign(rassign) = &node.kind else {
        panic!("expected a rightward assignment");
    };
    assert!(rassign.pattern.is(NodeTag::HshPtn));
}

#[test]
fn case_when_clauses() {
    let node = first("case x\nwhen 1, 2 then :a\nelse :b\nend\n");
    let NodeKind::Case(case) = &node.kind else {
        panic!("expected a case");
    };
    let NodeKind::When(clause) = &case.consequent.kind else {
        panic!("expected a when clause");
    };
    assert!(clause.consequent.as_ref().unwrap().is(NodeTag::Else));
}

#[test]
fn alias_and_undef() {
    assert_eq!(shape(&first("alias new old")), "alias(ident ident)");
    let node = first("undef :a, :b");
    let NodeKind::Undef(undef) = &node.kind else {
        panic!("expected an undef");
    };
    assert_eq!(undef.symbols.len(), 2);
}

#[test]
fn alias_operands_must_agree() {
    assert_eq!(shape(&first("alias $new $old")), "alias(gvar gvar)");
    assert_eq!(
        parse("alias foo $bar").unwrap_err().message,
        "invalid alias operands"
    );
    assert_eq!(
        parse("alias $a $1").unwrap_err().message,
        "can't make alias for the number variables"
    );
}

#[test]
fn parameter_names_are_unique() {
    let err = parse("def foo(a, b, a)
end").unwrap_err();
    assert_eq!(err.message, "duplicated argument name");
    assert_eq!((err.line, err.column), (1, 14));

    assert!(parse("foo { |a, (b, a)| a }").is_err());
    assert!(parse("def foo(a, k: 1, **k)
end").is_err());
    assert!(parse("foo { |_, _| 1 }").is_ok());
    assert!(parse("def foo(_a, _a)
end").is_ok());
}

#[test]
fn syntax_errors_report_their_position() {
    let err = parse("foo(\n  1,\n  2\n").unwrap_err();
    assert!(err.line >= 3);
    assert!(err.message.contains("end-of-input"));

    let err = parse("def foo\n").unwrap_err();
    assert!(err.message.starts_with("syntax error"));
}

#[test]
fn nesting_is_capped() {
    let source = format!("{}1{}", "(".repeat(MAX_DEPTH + 10), ")".repeat(MAX_DEPTH + 10));
    let err = std::thread::Builder::new()
        .stack_size(256 * 1024 * 1024)
        .spawn(move || parse(&source))
        .unwrap()
        .join()
        .unwrap()
        .unwrap_err();
    assert!(err.message.contains("nesting too deep"));
}

#[test]
fn single_targets_take_value_lists() {
    assert_eq!(
        shape(&first("x = *a")),
        "assign(var_field(ident) mrhs(arg_star(vcall(ident))))"
    );
    assert_eq!(
        shape(&first("a = 1, 2")),
        "assign(var_field(ident) mrhs(int int))"
    );
    assert_eq!(
        shape(&first("x = *a, 1")),
        "assign(var_field(ident) mrhs(arg_star(vcall(ident)) int))"
    );
    assert_eq!(shape(&first("foo(x = 1, 2)")).matches("assign").count(), 1);
    assert!(parse("x += *a").is_err());
}

#[test]
fn case_without_a_subject() {
    for source in ["case\nwhen a then b\nend", "case; when a; b; end"] {
        let node = first(source);
        let NodeKind::Case(case) = &node.kind else {
            panic!("expected a case in {source:?}");
        };
        assert!(case.value.is_none());
        assert!(case.consequent.is(NodeTag::When));
    }
}

#[test]
fn error_columns_count_characters() {
    let err = parse("\"é\" + )").unwrap_err();
    assert_eq!((err.line, err.column), (1, 6));
}

#[test]
fn bare_label_patterns_end_at_the_line() {
    let node = first("case x\nin a:\n  a\nend");
    let NodeKind::Case(case) = &node.kind else {
        panic!("expected a case");
    };
    let NodeKind::In(clause) = &case.consequent.kind else {
        panic!("expected an in clause");
    };
    let NodeKind::Statements(body) = &clause.statements.kind else {
        panic!("expected statements");
    };
    let code: Vec<&Node> = body.body.iter().filter(|s| !s.is(NodeTag::VoidStmt)).collect();
    assert_eq!(code.len(), 1);
}
