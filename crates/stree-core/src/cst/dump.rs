//! JSON and S-expression dumps of a tree

use serde_json::{Map, Value, json};

use super::format_element::{DocBuilder, Layout};
use super::node::{Comment, Node};
use super::printer::{Printer, PrinterOptions};
use super::visitor::{FieldVisitor, visit_fields};

/// `{"type": ..., <fields>, "location": [sl, sc, el, ec], "comments": [...]}`
pub fn to_json(program: &Node) -> Value {
    visit_fields(&mut JsonDump, program)
}

struct JsonDump;

impl FieldVisitor for JsonDump {
    type Output = Value;

    fn node(&mut self, node: &Node, fields: Vec<(&'static str, Value)>) -> Value {
        let mut object = Map::new();
        object.insert("type".to_string(), Value::from(node.type_name()));
        for (name, value) in fields {
            object.insert(name.to_string(), value);
        }
        object.insert("location".to_string(), json!(node.location.to_array()));
        let comments = node
            .comments
            .iter()
            .map(|comment| self.comment(comment))
            .collect();
        object.insert("comments".to_string(), Value::Array(comments));
        Value::Object(object)
    }

    fn comment(&mut self, comment: &Comment) -> Value {
        json!({
            "type": if comment.embdoc { "embdoc" } else { "comment" },
            "value": comment.value,
            "inline": comment.inline,
            "location": comment.location.to_array(),
            "placement": comment.placement,
        })
    }

    fn text(&mut self, value: &str) -> Value {
        Value::from(value)
    }

    fn boolean(&mut self, value: bool) -> Value {
        Value::from(value)
    }

    fn number(&mut self, value: usize) -> Value {
        Value::from(value)
    }

    fn nil(&mut self) -> Value {
        Value::Null
    }

    fn list(&mut self, items: Vec<Value>) -> Value {
        Value::Array(items)
    }
}

enum Sexp {
    Atom(String),
    Node(&'static str, Vec<Sexp>),
    List(Vec<Sexp>),
}

struct SexpDump;

impl FieldVisitor for SexpDump {
    type Output = Sexp;

    fn node(&mut self, node: &Node, fields: Vec<(&'static str, Sexp)>) -> Sexp {
        let mut items: Vec<Sexp> = fields.into_iter().map(|(_, value)| value).collect();
        if !node.comments.is_empty() {
            let comments = node
                .comments
                .iter()
                .map(|comment| self.comment(comment))
                .collect();
            items.push(Sexp::Node("comments", comments));
        }
        Sexp::Node(node.type_name(), items)
    }

    fn comment(&mut self, comment: &Comment) -> Sexp {
        Sexp::Atom(format!("{:?}", comment.value))
    }

    fn text(&mut self, value: &str) -> Sexp {
        Sexp::Atom(format!("{value:?}"))
    }

    fn boolean(&mut self, value: bool) -> Sexp {
        Sexp::Atom(value.to_string())
    }

    fn number(&mut self, value: usize) -> Sexp {
        Sexp::Atom(value.to_string())
    }

    fn nil(&mut self) -> Sexp {
        Sexp::Atom("nil".to_string())
    }

    fn list(&mut self, items: Vec<Sexp>) -> Sexp {
        Sexp::List(items)
    }
}

/// Parenthesized dump laid out within `width` columns
pub fn to_sexp(program: &Node, width: usize) -> String {
    let sexp = visit_fields(&mut SexpDump, program);
    let mut doc = DocBuilder::new();
    write_sexp(&mut doc, &sexp);
    doc.breakable_force();

    let printer = Printer::new(PrinterOptions {
        line_width: width,
        ..PrinterOptions::default()
    });
    printer.print(&doc.finish())
}

fn write_sexp(q: &mut DocBuilder, sexp: &Sexp) {
    match sexp {
        Sexp::Atom(atom) => q.text(atom),
        Sexp::Node(name, items) => {
            q.group(|q| {
                q.text("(");
                q.text(name);
                q.indent(|q| {
                    for item in items {
                        q.breakable_space();
                        write_sexp(q, item);
                    }
                });
                q.text(")");
            });
        }
        Sexp::List(items) => {
            q.group(|q| {
                q.text("(");
                q.nest(1, |q| {
                    for (index, item) in items.iter().enumerate() {
                        if index > 0 {
                            q.breakable_space();
                        }
                        write_sexp(q, item);
                    }
                });
                q.text(")");
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::parse;

    #[test]
    fn json_lists_fields_between_type_and_location() {
        let program = parse("x = 1").unwrap();
        let value = to_json(&program);
        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        assert_eq!(keys, ["type", "statements", "location", "comments"]);

        let assign = &value["statements"]["body"][0];
        assert_eq!(assign["type"], "assign");
        assert_eq!(assign["value"]["value"], "1");
        assert_eq!(assign["location"], json!([1, 0, 1, 5]));
    }

    #[test]
    fn json_carries_attached_comments() {
        let program = parse("foo # note\n").unwrap();
        let value = to_json(&program);
        let comment = &value["statements"]["body"][0]["comments"][0];
        assert_eq!(comment["value"], "# note");
        assert_eq!(comment["inline"], true);
        assert_eq!(comment["placement"], "trailing");
    }

    #[test]
    fn sexp_fits_on_one_line_when_wide_enough() {
        let program = parse("x = 1").unwrap();
        assert_eq!(
            to_sexp(&program, 120),
            "(program (statements ((assign (var_field (ident \"x\")) (int \"1\")))))\n"
        );
    }

    #[test]
    fn sexp_breaks_nested_nodes_when_narrow() {
        let program = parse("x = 1").unwrap();
        let output = to_sexp(&program, 30);
        assert!(output.starts_with("(program\n  (statements\n"));
        assert!(output.lines().all(|line| line.len() <= 30));
    }
}
