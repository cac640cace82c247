//! Debug dumps of the tree and the layout document

use stree_core::FormatOptions;
use stree_core::driver::{document, json, sexp};

#[test]
fn sexp_dump_lists_fields_in_order() {
    insta::assert_snapshot!(
        sexp("x = 1", 80).unwrap(),
        @r#"(program (statements ((assign (var_field (ident "x")) (int "1")))))"#
    );
}

#[test]
fn sexp_dump_includes_comments() {
    insta::assert_snapshot!(
        sexp("foo # note\n", 80).unwrap(),
        @r##"(program (statements ((vcall (ident "foo") (comments "# note")))))"##
    );
}

#[test]
fn json_dump_of_a_commented_call() {
    let value = json("foo # note\n").unwrap();
    let vcall = &value["statements"]["body"][0];
    insta::assert_snapshot!(
        serde_json::to_string(vcall).unwrap(),
        @r##"{"type":"vcall","value":{"type":"ident","value":"foo","location":[1,0,1,3],"comments":[]},"location":[1,0,1,3],"comments":[{"type":"comment","value":"# note","inline":true,"location":[1,4,1,10],"placement":"trailing"}]}"##
    );
}

#[test]
fn document_dump_shows_groups() {
    let output = document("foo(1, 2)", &FormatOptions::default()).unwrap();
    assert!(output.contains("group"));
    assert!(output.contains("text \"foo\""));
    assert!(output.contains("breakable space"));
}
