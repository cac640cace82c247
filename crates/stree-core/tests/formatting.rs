//! End-to-end formatting behavior

use stree_core::driver::{format, format_with};
use stree_core::FormatOptions;

fn single_quoted() -> FormatOptions {
    FormatOptions {
        preferred_quote: '\'',
        ..FormatOptions::default()
    }
}

#[test]
fn assignment_gains_spaces() {
    assert_eq!(format("x=1").unwrap(), "x = 1\n");
}

#[test]
fn then_clauses_become_blocks() {
    assert_eq!(format("if a then b end").unwrap(), "if a\n  b\nend\n");
}

#[test]
fn trailing_comments_stay_on_their_line() {
    assert_eq!(format("foo # note").unwrap(), "foo # note\n");
}

#[test]
fn string_arrays_become_word_lists() {
    assert_eq!(
        format(r#"["a","b","c","d","e","f"]"#).unwrap(),
        "%w[a b c d e f]\n"
    );
    assert_eq!(format("[:a, :b]").unwrap(), "%i[a b]\n");
    assert_eq!(format(r#"["a b", "c"]"#).unwrap(), "[\"a b\", \"c\"]\n");
    assert_eq!(format(r#"["a"]"#).unwrap(), "[\"a\"]\n");
}

#[test]
fn heredoc_arguments_keep_their_trailing_comment() {
    let source = "foo(<<~EOS) # c\n  x\nEOS\n";
    assert_eq!(format(source).unwrap(), source);
}

#[test]
fn quotes_follow_the_preferred_style() {
    let cases = [
        ("''", "\"\""),
        ("'no special chars'", "\"no special chars\""),
        ("'has #{interpolation} looking text'", "'has #{interpolation} looking text'"),
        (r#""has a \" escaped quote""#, r#""has a \" escaped quote""#),
        (r"'back\slash'", r"'back\slash'"),
        ("'say \"hi\"'", "'say \"hi\"'"),
        ("%q(paren)", "\"paren\""),
    ];
    for (source, expected) in cases {
        assert_eq!(format(source).unwrap(), format!("{expected}\n"), "formatting {source}");
    }
}

#[test]
fn single_quote_preference() {
    let options = single_quoted();
    assert_eq!(format_with("\"plain\"", &options).unwrap(), "'plain'\n");
    assert_eq!(format_with("\"it's\"", &options).unwrap(), "\"it's\"\n");
    assert_eq!(format_with("\"#{x}\"", &options).unwrap(), "\"#{x}\"\n");
}

#[test]
fn symbols_keep_their_quotes() {
    assert_eq!(format(r#":"foo""#).unwrap(), ":\"foo\"\n");
}

#[test]
fn long_decimals_are_grouped() {
    let cases = [
        ("1234567", "1_234_567"),
        ("12345", "12_345"),
        ("1234", "1234"),
        ("1_000", "1_000"),
        ("012345", "012345"),
        ("0x12345", "0x12345"),
    ];
    for (source, expected) in cases {
        assert_eq!(format(source).unwrap(), format!("{expected}\n"), "formatting {source}");
    }
}

#[test]
fn labels_are_preferred_for_hash_keys() {
    assert_eq!(format("{ :a => 1, :b => 2 }").unwrap(), "{ a: 1, b: 2 }\n");
    assert_eq!(format("{ \"a\" => 1 }").unwrap(), "{ \"a\" => 1 }\n");
}

#[test]
fn long_calls_break_their_arguments() {
    let options = FormatOptions {
        print_width: 30,
        ..FormatOptions::default()
    };
    assert_eq!(
        format_with("method_name(first_argument, second_argument)", &options).unwrap(),
        "method_name(\n  first_argument,\n  second_argument\n)\n"
    );
}

#[test]
fn trailing_commas_when_enabled() {
    let options = FormatOptions {
        print_width: 30,
        trailing_comma: true,
        ..FormatOptions::default()
    };
    assert_eq!(
        format_with("method_name(first_argument, second_argument)", &options).unwrap(),
        "method_name(\n  first_argument,\n  second_argument,\n)\n"
    );
    assert_eq!(format_with("foo(a, b)", &options).unwrap(), "foo(a, b)\n");
}

#[test]
fn short_conditionals_become_ternaries() {
    let source = "if a\n  b\nelse\n  c\nend\n";
    assert_eq!(format(source).unwrap(), "a ? b : c\n");

    let options = FormatOptions {
        disable_auto_ternary: true,
        ..FormatOptions::default()
    };
    assert_eq!(format_with(source, &options).unwrap(), source);
}

#[test]
fn blank_lines_collapse_to_one() {
    assert_eq!(format("a\n\n\n\nb\n").unwrap(), "a\n\nb\n");
}

#[test]
fn ignore_comments_keep_the_original_text() {
    let source = "# stree-ignore\nfoo(  1,2 )\nbar(  3 )\n";
    assert_eq!(format(source).unwrap(), "# stree-ignore\nfoo(  1,2 )\nbar(3)\n");
}

#[test]
fn empty_programs_stay_empty() {
    assert_eq!(format("").unwrap(), "\n");
}

#[test]
fn parse_errors_surface() {
    let err = format("foo(").unwrap_err();
    assert!(!err.message.is_empty());
}

#[test]
fn nested_heredocs_print_each_body_once() {
    let source = "x = <<~EOS\n  hello #{<<~INNER}\n    inner\n  INNER\nEOS\n";
    let output = format(source).unwrap();
    assert_eq!(output, source);
    assert_eq!(output.matches("    inner").count(), 1);
}

#[test]
fn keyword_arguments_stay_on_one_line() {
    let cases = [
        "yield 1, 2",
        "break 1, 2",
        "next a, b",
        "return a, b",
        "super 1, 2",
        "undef foo, bar",
    ];
    for source in cases {
        assert_eq!(format(source).unwrap(), format!("{source}\n"), "formatting {source}");
    }
}

#[test]
fn header_comments_stay_on_the_header() {
    let cases = [
        "if a # c1\n  b\nend\n",
        "while a # spin\n  b\nend\n",
        "class A # cls\nend\n",
        "module M # mod\n  X = 1\nend\n",
        "def foo # d\n  1\nend\n",
        "def bar(a) # d\n  a\nend\n",
        "foo do # blk\n  bar\nend\n",
        "begin # start\n  a\nrescue # fail\n  b\nend\n",
    ];
    for source in cases {
        assert_eq!(format(source).unwrap(), source, "formatting {source:?}");
    }
}

#[test]
fn case_without_a_subject() {
    assert_eq!(
        format("case\nwhen a then b\nend").unwrap(),
        "case\nwhen a\n  b\nend\n"
    );
}

#[test]
fn single_targets_keep_value_lists() {
    assert_eq!(format("x = *a").unwrap(), "x = *a\n");
    assert_eq!(format("a = 1,2").unwrap(), "a = 1, 2\n");
}

#[test]
fn bare_label_patterns_end_at_the_line() {
    let once = format("case x\nin {a:}\n  a\nend").unwrap();
    assert!(once.ends_with("\n  a\nend\n"), "{once:?}");
    assert_eq!(format(&once).unwrap(), once);
}

#[test]
fn comments_between_operands_keep_their_place() {
    let once = format("x = 1 +   # plus\n  2\n").unwrap();
    assert!(once.contains("1 + # plus\n"), "{once:?}");
    assert_eq!(format(&once).unwrap(), once);
}
