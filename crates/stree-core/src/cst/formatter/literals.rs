//! Strings, symbols, numbers, collections and lambdas

use super::{Formatter, contains_heredoc, is_empty_body};
use crate::cst::format_element::{HEREDOC_PRIORITY, Layout, separator};
use crate::cst::node::*;

/// How the keys of one hash are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum KeyStyle {
    /// `key: value`
    Labels,
    /// `:key => value`
    Rockets,
    /// As written; used when a value is omitted (`{ x: }`) and in patterns
    Identity,
}

impl KeyStyle {
    pub(super) fn for_assocs(assocs: &[Node]) -> Self {
        let mut style = KeyStyle::Labels;
        for assoc in assocs {
            let NodeKind::Assoc(assoc) = &assoc.kind else {
                continue;
            };
            if assoc.value.is_none() {
                return KeyStyle::Identity;
            }
            match &assoc.key.kind {
                NodeKind::Label(_) => {}
                NodeKind::DynaSymbol(symbol) if !symbol.quote.starts_with("%s") => {}
                NodeKind::SymbolLiteral(_) if symbol_name(&assoc.key).is_some_and(labelable) => {}
                _ => style = KeyStyle::Rockets,
            }
        }
        style
    }
}

/// Name of a plain symbol literal, `foo` for `:foo`
fn symbol_name(node: &Node) -> Option<&str> {
    match &node.kind {
        NodeKind::SymbolLiteral(symbol) => match &symbol.value.kind {
            NodeKind::SymbolContent(content) => content.value.token_value(),
            _ => symbol.value.token_value(),
        },
        _ => None,
    }
}

/// Whether `name:` is a valid label for the symbol `:name`
fn labelable(name: &str) -> bool {
    name.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_') && !name.ends_with('=')
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Identifier-like content that can lose its quotes as a label
fn is_plain_label(value: &str) -> bool {
    let mut chars = value.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !(first.is_ascii_alphabetic() || first == '_') {
        return false;
    }
    let rest: Vec<char> = chars.collect();
    match rest.split_last() {
        None => true,
        Some((last, middle)) => {
            middle.iter().copied().all(is_word_char)
                && (is_word_char(*last) || *last == '!' || *last == '?')
        }
    }
}

/// Closing delimiter for a `%` literal opener
pub(super) fn matching(open: char) -> char {
    match open {
        '(' => ')',
        '[' => ']',
        '{' => '}',
        '<' => '>',
        other => other,
    }
}

/// Group a long decimal integer in threes: `10000` becomes `10_000`
///
/// Returns `None` for literals left as written: short ones, ones already
/// using underscores and octal, hex or binary ones.
pub fn group_digits(value: &str) -> Option<String> {
    if value.len() < 5 || value.contains('_') {
        return None;
    }
    let (sign, digits) = match value.strip_prefix(['+', '-']) {
        Some(digits) => (&value[..1], digits),
        None => ("", value),
    };
    if digits.starts_with('0') || !digits.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }

    let mut grouped = String::with_capacity(value.len() + digits.len() / 3);
    grouped.push_str(sign);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push('_');
        }
        grouped.push(digit);
    }
    Some(grouped)
}

/// Escape unescaped occurrences of `enclosing` in string content
///
/// Existing escape sequences are kept as they are. Content is returned
/// unchanged unless `enclosing` is a quote character.
pub fn normalize_quotes(content: &str, enclosing: char) -> String {
    if enclosing != '"' && enclosing != '\'' {
        return content.to_string();
    }
    let mut normalized = String::with_capacity(content.len());
    let mut chars = content.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                normalized.push(c);
                if let Some(escaped) = chars.next() {
                    normalized.push(escaped);
                }
            }
            c if c == enclosing => {
                normalized.push('\\');
                normalized.push(c);
            }
            c => normalized.push(c),
        }
    }
    normalized
}

/// Whether a string must keep the quotes it was written with
fn quotes_locked(parts: &[Node], quote: char) -> bool {
    parts.iter().any(|part| match &part.kind {
        NodeKind::TStringContent(content) => {
            let value = &content.value;
            value.contains('\\')
                || value.contains("#{")
                || value.contains("#@")
                || value.contains("#$")
                || value.contains(quote)
        }
        _ => true,
    })
}

/// Values that read well starting on the line of their key or `=`
pub(super) fn skip_indent(value: &Node) -> bool {
    match &value.kind {
        NodeKind::ArrayLiteral(_)
        | NodeKind::HashLiteral(_)
        | NodeKind::Heredoc(_)
        | NodeKind::Lambda(_)
        | NodeKind::QSymbols(_)
        | NodeKind::QWords(_)
        | NodeKind::Symbols(_)
        | NodeKind::Words(_) => true,
        NodeKind::CallNode(call) => call.receiver.as_deref().is_some_and(skip_indent),
        NodeKind::DynaSymbol(symbol) => symbol.quote.starts_with("%s"),
        _ => false,
    }
}

/// Text of a single-part string that can be written inside `%w[]`
fn qword_text(node: &Node) -> Option<&str> {
    if node.has_comments() {
        return None;
    }
    let plain = |value: &str| {
        !value.is_empty()
            && !value.contains(|c: char| c.is_whitespace() || matches!(c, '[' | ']' | '\\'))
    };
    match &node.kind {
        NodeKind::StringLiteral(string) => match string.parts.as_slice() {
            [
                Node {
                    kind: NodeKind::TStringContent(content),
                    ..
                },
            ] if plain(&content.value) => Some(&content.value),
            _ => None,
        },
        NodeKind::CharLiteral(character) => character
            .value
            .strip_prefix('?')
            .filter(|value| value.chars().count() == 1 && plain(value)),
        _ => None,
    }
}

/// Name of a plain symbol that can be written inside `%i[]`
fn qsymbol_text(node: &Node) -> Option<&str> {
    if node.has_comments() {
        return None;
    }
    symbol_name(node).filter(|name| !name.contains(['[', ']']))
}

fn is_empty_params(node: &Node) -> bool {
    match &node.kind {
        NodeKind::Params(params) => {
            params.requireds.is_empty()
                && params.optionals.is_empty()
                && params.rest.is_none()
                && params.posts.is_empty()
                && params.keywords.is_empty()
                && params.keyword_rest.is_none()
                && params.block.is_none()
        }
        _ => false,
    }
}

impl<'a> Formatter<'a> {
    /// `?a` becomes a one-character string
    pub(super) fn format_char(&mut self, inner: &'a CharLiteral) {
        let mut chars = inner.value.chars();
        match (chars.next(), chars.next(), chars.next()) {
            (Some('?'), Some(c), None) => {
                let quote = self.quote();
                let mut value = String::with_capacity(4);
                value.push(quote);
                if c == quote {
                    value.push('\\');
                }
                value.push(c);
                value.push(quote);
                self.text(value);
            }
            _ => self.text(&inner.value),
        }
    }

    /// Content parts of a string-like literal closed by `closing`
    fn format_string_parts(&mut self, parts: &'a [Node], closing: char) {
        for part in parts {
            match &part.kind {
                NodeKind::TStringContent(content) => {
                    self.format_lines(&normalize_quotes(&content.value, closing));
                }
                _ => self.format(part),
            }
        }
    }

    pub(super) fn format_string_literal(&mut self, inner: &'a StringLiteral) {
        let quote = self.quote();
        if inner.parts.is_empty() {
            self.text(format!("{quote}{quote}"));
            return;
        }

        let (opening, closing) = if !quotes_locked(&inner.parts, quote) {
            (quote.to_string(), quote)
        } else if inner.quote.starts_with('%') {
            let open = inner.quote.chars().last().unwrap_or(quote);
            (inner.quote.clone(), matching(open))
        } else {
            let written = inner.quote.chars().last().unwrap_or(quote);
            (inner.quote.clone(), written)
        };

        self.text(opening);
        self.group(|f| f.format_string_parts(&inner.parts, closing));
        self.text(closing.to_string());
    }

    /// `"a" \` followed by the next string on its own line
    pub(super) fn format_string_concat(&mut self, inner: &'a StringConcat) {
        self.group(|f| {
            f.format(&inner.left);
            f.text(" \\");
            f.indent(|f| {
                f.breakable_force();
                f.format(&inner.right);
            });
        });
    }

    pub(super) fn format_string_embexpr(&mut self, node: &'a Node, inner: &'a StringEmbExpr) {
        // A heredoc opened here stretches the location over its body
        if node.location.start_line == node.location.end_line || contains_heredoc(node) {
            self.flat_group(|f| {
                f.text("#{");
                f.format(&inner.statements);
                f.text("}");
            });
        } else {
            self.group(|f| {
                f.text("#{");
                f.indent(|f| {
                    f.breakable_empty();
                    f.format(&inner.statements);
                });
                f.breakable_empty();
                f.text("}");
            });
        }
    }

    pub(super) fn format_xstring(&mut self, inner: &'a XStringLiteral) {
        self.text("`");
        self.format_string_parts(&inner.parts, '`');
        self.text("`");
    }

    /// The opener stays in place; the body and terminator are deferred to
    /// the end of the line so they follow whatever else is on it
    pub(super) fn format_heredoc(&mut self, inner: &'a Heredoc) {
        self.group(|f| f.format(&inner.beginning));
        self.line_suffix(HEREDOC_PRIORITY, |f| {
            f.group(|f| {
                f.doc().push(separator());
                for part in &inner.parts {
                    match &part.kind {
                        NodeKind::TStringContent(content) => {
                            let value = &content.value;
                            let body = value.strip_suffix('\n').unwrap_or(value);
                            for (index, line) in body.split('\n').enumerate() {
                                if index > 0 {
                                    f.doc().push(separator());
                                }
                                f.text(line);
                            }
                            if value.ends_with('\n') {
                                f.doc().push(separator());
                            }
                        }
                        _ => f.format(part),
                    }
                }
                f.format(&inner.ending);
            });
        });
    }

    fn is_hash_key(&self, node: &'a Node) -> bool {
        match self.parent().map(|parent| &parent.kind) {
            Some(NodeKind::Assoc(assoc)) => std::ptr::eq(assoc.key.as_ref(), node),
            _ => false,
        }
    }

    /// Quoted symbols keep their delimiters; as hash keys the leading `:`
    /// is left to the key style
    pub(super) fn format_dyna_symbol(&mut self, node: &'a Node, inner: &'a DynaSymbol) {
        let quote = inner.quote.as_str();
        let opening = if self.is_hash_key(node) {
            quote.strip_prefix(':').unwrap_or(quote)
        } else {
            quote
        };
        let closing = matching(quote.chars().last().unwrap_or('"'));

        self.text(opening);
        self.format_string_parts(&inner.parts, closing);
        self.text(closing.to_string());
    }

    /// Slashes unless the content has one, `%r{}` otherwise
    pub(super) fn format_regexp(&mut self, inner: &'a RegexpLiteral) {
        let content: String = inner
            .parts
            .iter()
            .filter_map(|part| match &part.kind {
                NodeKind::TStringContent(content) => Some(content.value.as_str()),
                _ => None,
            })
            .collect();

        let ambiguous = inner.parts.first().is_some_and(|part| {
            matches!(&part.kind, NodeKind::TStringContent(content) if content.value.starts_with([' ', '=']))
        }) && self.in_command_arguments();
        let braces = ambiguous || content.contains('/');
        let flags = inner.ending.get(1..).unwrap_or_default();

        if braces && content.contains(['{', '}']) {
            self.text(&inner.beginning);
            self.format_string_parts(&inner.parts, '/');
            self.text(&inner.ending);
        } else if braces {
            let from_slashes = inner.beginning == "/";
            self.text("%r{");
            for part in &inner.parts {
                match &part.kind {
                    NodeKind::TStringContent(content) if from_slashes => {
                        self.format_lines(&content.value.replace("\\/", "/"));
                    }
                    NodeKind::TStringContent(content) => self.format_lines(&content.value),
                    _ => self.format(part),
                }
            }
            self.text("}");
            self.text(flags);
        } else {
            self.text("/");
            self.format_string_parts(&inner.parts, '/');
            self.text("/");
            self.text(flags);
        }
    }

    /// Inside the arguments of a call written without parentheses
    fn in_command_arguments(&self) -> bool {
        for ancestor in self.ancestors() {
            match ancestor.tag() {
                NodeTag::Command | NodeTag::CommandCall => return true,
                NodeTag::Statements | NodeTag::ArgParen | NodeTag::Paren => return false,
                _ => {}
            }
        }
        false
    }

    /// Opening delimiter and its comments inside otherwise empty brackets
    fn format_empty_with_comments(&mut self, opener: &'a Node, closing: &str) {
        self.group(|f| {
            f.text(opener.token_value().unwrap_or_default());
            f.indent(|f| {
                for comment in &opener.comments {
                    f.breakable_force();
                    f.format_comment(comment);
                }
            });
            f.breakable_force();
            f.text(closing);
        });
    }

    fn format_word_array(&mut self, opening: &str, words: &[&'a str]) {
        self.text(opening);
        self.group(|f| {
            f.indent(|f| {
                f.breakable_empty();
                for (index, word) in words.iter().enumerate() {
                    if index > 0 {
                        f.breakable_space();
                    }
                    f.text(word);
                }
            });
            f.breakable_empty();
        });
        self.text("]");
    }

    pub(super) fn format_array(&mut self, inner: &'a ArrayLiteral) {
        if let Some(contents) = &inner.contents
            && !inner.lbracket.has_comments()
            && !contents.has_comments()
            && let NodeKind::Args(args) = &contents.kind
            && args.parts.len() > 1
        {
            let parts = &args.parts;
            if let Some(words) = parts.iter().map(qword_text).collect::<Option<Vec<_>>>() {
                self.format_word_array("%w[", &words);
                return;
            }
            if let Some(symbols) = parts.iter().map(qsymbol_text).collect::<Option<Vec<_>>>() {
                self.format_word_array("%i[", &symbols);
                return;
            }
            let var_refs = parts
                .iter()
                .all(|part| part.is(NodeTag::VarRef) && !part.has_comments());
            if var_refs {
                let width: usize = parts
                    .iter()
                    .map(|part| {
                        let name = match &part.kind {
                            NodeKind::VarRef(var_ref) => var_ref.value.token_value().unwrap_or_default(),
                            _ => "",
                        };
                        name.len() + 2
                    })
                    .sum();
                if width > self.options.print_width * 2 {
                    self.format_filled_array(inner, parts);
                    return;
                }
            }
        }

        if inner.contents.is_none() && inner.lbracket.has_comments() {
            self.format_empty_with_comments(&inner.lbracket, "]");
            return;
        }

        self.group(|f| {
            f.format(&inner.lbracket);
            if let Some(contents) = &inner.contents {
                f.indent(|f| {
                    f.breakable_empty();
                    f.format(contents);
                    if let NodeKind::Args(args) = &contents.kind {
                        f.format_trailing_comma(&args.parts);
                    }
                });
            }
            f.breakable_empty();
            f.text("]");
        });
    }

    /// Long lists of plain variables wrap like words in a paragraph
    fn format_filled_array(&mut self, inner: &'a ArrayLiteral, parts: &'a [Node]) {
        self.group(|f| {
            f.format(&inner.lbracket);
            f.indent(|f| {
                f.breakable_empty();
                for (index, part) in parts.iter().enumerate() {
                    if index > 0 {
                        f.text(",");
                        f.fill_breakable();
                    }
                    f.format(part);
                }
                f.format_trailing_comma(parts);
            });
            f.breakable_empty();
            f.text("]");
        });
    }

    /// `%w[]` and friends, switching to square brackets when no element
    /// contains one
    pub(super) fn format_word_list(&mut self, node: &'a Node, beginning: &'a Node, elements: &'a [Node]) {
        let opener = beginning.token_value().unwrap_or("%w[");
        let has_brackets = elements.iter().any(|element| {
            element.child_nodes().into_iter().any(|part| {
                matches!(&part.kind, NodeKind::TStringContent(content) if content.value.contains(['[', ']']))
            })
        });

        let (opening, closing) = if has_brackets {
            let open = opener.chars().last().unwrap_or('[');
            (opener.to_string(), matching(open))
        } else {
            let prefix = opener.get(..2).unwrap_or(match node.tag() {
                NodeTag::Words => "%W",
                NodeTag::Symbols => "%I",
                NodeTag::QSymbols => "%i",
                _ => "%w",
            });
            (format!("{prefix}["), ']')
        };

        self.text(opening);
        self.group(|f| {
            f.indent(|f| {
                f.breakable_empty();
                f.seplist(elements, |f| f.breakable_space());
            });
            f.breakable_empty();
        });
        self.text(closing.to_string());
    }

    pub(super) fn format_hash(&mut self, inner: &'a HashLiteral) {
        if inner.assocs.is_empty() {
            if inner.lbrace.has_comments() {
                self.format_empty_with_comments(&inner.lbrace, "}");
            } else {
                self.text("{}");
            }
            return;
        }

        self.key_styles.push(KeyStyle::for_assocs(&inner.assocs));
        let contents = |f: &mut Self| {
            f.format(&inner.lbrace);
            f.indent(|f| {
                f.breakable_space();
                f.seplist(&inner.assocs, Self::comma_breakable);
                f.format_trailing_comma(&inner.assocs);
            });
            f.breakable_space();
            f.text("}");
        };
        if self.parent_tag() == Some(NodeTag::Assoc) {
            contents(self);
        } else {
            self.group(contents);
        }
        self.key_styles.pop();
    }

    pub(super) fn format_assoc(&mut self, inner: &'a Assoc) {
        let style = self.key_styles.last().copied().unwrap_or(KeyStyle::Identity);
        let contents = |f: &mut Self| {
            f.format_hash_key(style, &inner.key);
            if let Some(value) = &inner.value {
                if !inner.key.has_comments() && skip_indent(value) {
                    f.text(" ");
                    f.format(value);
                } else {
                    f.indent(|f| {
                        f.breakable_space();
                        f.format(value);
                    });
                }
            }
        };
        if inner.value.as_deref().is_some_and(|value| value.is(NodeTag::HashLiteral)) {
            contents(self);
        } else {
            self.group(contents);
        }
    }

    fn format_hash_key(&mut self, style: KeyStyle, key: &'a Node) {
        match (style, &key.kind) {
            (KeyStyle::Labels, NodeKind::SymbolLiteral(symbol)) => {
                self.with_comments(key, |f| f.format(&symbol.value));
                self.text(":");
            }
            (KeyStyle::Labels, NodeKind::DynaSymbol(symbol)) => {
                match symbol.parts.as_slice() {
                    [
                        Node {
                            kind: NodeKind::TStringContent(content),
                            ..
                        },
                    ] if is_plain_label(&content.value) => {
                        self.with_comments(key, |f| f.text(&content.value));
                    }
                    _ => self.format(key),
                }
                self.text(":");
            }
            (KeyStyle::Rockets, NodeKind::Label(label)) => {
                self.with_comments(key, |f| {
                    f.text(":");
                    f.text(label.value.strip_suffix(':').unwrap_or(&label.value));
                });
                self.text(" =>");
            }
            (KeyStyle::Rockets | KeyStyle::Identity, NodeKind::DynaSymbol(symbol)) => {
                let label_form = !symbol.quote.starts_with([':', '%']);
                if style == KeyStyle::Identity && label_form {
                    self.format(key);
                    self.text(":");
                    return;
                }
                if !symbol.quote.starts_with('%') {
                    self.text(":");
                }
                self.format(key);
                self.text(" =>");
            }
            (_, NodeKind::Label(_)) => self.format(key),
            _ => {
                self.format(key);
                self.text(" =>");
            }
        }
    }

    pub(super) fn format_range(&mut self, inner: &'a RangeNode) {
        let spaced = matches!(
            self.parent_tag(),
            Some(NodeTag::IfNode | NodeTag::UnlessNode)
        );
        self.format_optional(inner.left.as_deref());
        if spaced && inner.left.is_some() {
            self.text(" ");
        }
        self.format(&inner.operator);
        if spaced && inner.right.is_some() {
            self.text(" ");
        }
        self.format_optional(inner.right.as_deref());
    }

    /// `->(params) { ... }`, or `do ... end` when it does not fit on a line
    pub(super) fn format_lambda(&mut self, inner: &'a Lambda) {
        let braces_only = self
            .ancestors()
            .any(|ancestor| matches!(ancestor.tag(), NodeTag::Command | NodeTag::CommandCall));
        let empty = is_empty_body(&inner.statements);

        self.text("->");
        self.group(|f| {
            match &inner.params.kind {
                NodeKind::Paren(paren) => {
                    if paren
                        .contents
                        .as_deref()
                        .is_some_and(|contents| !is_empty_params(contents))
                    {
                        f.format(&inner.params);
                    }
                }
                NodeKind::Params(_) if !is_empty_params(&inner.params) => {
                    f.text("(");
                    f.format(&inner.params);
                    f.text(")");
                }
                _ => {}
            }
            f.text(" ");
            f.if_break(
                |f| f.text(if braces_only { "{" } else { "do" }),
                |f| f.text("{"),
            );
            if empty {
                f.breakable_empty();
            } else {
                f.indent(|f| {
                    f.breakable_space();
                    f.format(&inner.statements);
                });
                f.breakable_space();
            }
            f.if_break(
                |f| f.text(if braces_only { "}" } else { "end" }),
                |f| f.text("}"),
            );
        });
    }

    pub(super) fn format_lambda_var(&mut self, inner: &'a LambdaVar) {
        self.format(&inner.params);
        if !inner.locals.is_empty() {
            self.text("; ");
            self.seplist(&inner.locals, |f| f.text(", "));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cst::formatter::{FormatOptions, format_program};
    use crate::driver::parse;

    fn format_with(source: &str, options: &FormatOptions) -> String {
        let program = parse(source).unwrap();
        format_program(&program, source, options)
    }

    fn format(source: &str) -> String {
        format_with(source, &FormatOptions::default())
    }

    #[test]
    fn groups_long_decimals() {
        assert_eq!(group_digits("10000").as_deref(), Some("10_000"));
        assert_eq!(group_digits("1234567").as_deref(), Some("1_234_567"));
        assert_eq!(group_digits("-12345").as_deref(), Some("-12_345"));
        assert_eq!(group_digits("1234"), None);
        assert_eq!(group_digits("1_0000"), None);
        assert_eq!(group_digits("01234567"), None);
        assert_eq!(group_digits("0x1234ABCD"), None);
        assert_eq!(group_digits("+0777777"), None);
    }

    #[test]
    fn escapes_only_the_enclosing_quote() {
        assert_eq!(normalize_quotes("it's", '\''), "it\\'s");
        assert_eq!(normalize_quotes("it's", '"'), "it's");
        assert_eq!(normalize_quotes("say \\\"hi\\\"", '"'), "say \\\"hi\\\"");
        assert_eq!(normalize_quotes("a\"b", '/'), "a\"b");
    }

    #[test]
    fn plain_labels() {
        assert!(is_plain_label("foo"));
        assert!(is_plain_label("foo?"));
        assert!(is_plain_label("_a1"));
        assert!(!is_plain_label("foo bar"));
        assert!(!is_plain_label("1a"));
        assert!(!is_plain_label("a?b"));
        assert!(!is_plain_label(""));
    }

    #[test]
    fn prefers_the_configured_quote() {
        assert_eq!(format("'abc'"), "\"abc\"\n");
        assert_eq!(format("'it\"s'"), "'it\"s'\n");
        assert_eq!(format("'a\\'b'"), "'a\\'b'\n");
        assert_eq!(format("%q(abc)"), "\"abc\"\n");
        assert_eq!(format("''"), "\"\"\n");

        let single = FormatOptions {
            preferred_quote: '\'',
            ..FormatOptions::default()
        };
        assert_eq!(format_with("\"abc\"", &single), "'abc'\n");
        assert_eq!(format_with("\"#{a}\"", &single), "\"#{a}\"\n");
    }

    #[test]
    fn character_literals_become_strings() {
        assert_eq!(format("?a"), "\"a\"\n");
        assert_eq!(format("?\""), "\"\\\"\"\n");
    }

    #[test]
    fn heredoc_bodies_follow_the_opening_line() {
        let source = "foo(<<~EOS, 1) # comment\n  body\nEOS\nbar\n";
        assert_eq!(format(source), source);
    }

    #[test]
    fn string_arrays_become_word_lists() {
        assert_eq!(
            format("[\"a\", \"b\", \"c\", \"d\", \"e\", \"f\"]"),
            "%w[a b c d e f]\n"
        );
        assert_eq!(format("[:a, :b]"), "%i[a b]\n");
        assert_eq!(format("[\"a b\", \"c\"]"), "[\"a b\", \"c\"]\n");
        assert_eq!(format("%w(a b)"), "%w[a b]\n");
        assert_eq!(format("%w(a [b])"), "%w(a [b])\n");
    }

    #[test]
    fn hash_keys_share_one_style() {
        assert_eq!(format("{ :a => 1, :b => 2 }"), "{ a: 1, b: 2 }\n");
        assert_eq!(format("{ a: 1, \"b\" => 2 }"), "{ :a => 1, \"b\" => 2 }\n");
        assert_eq!(format("{ :+ => 1 }"), "{ :+ => 1 }\n");
        assert_eq!(format("{ x:, y: 1 }"), "{ x:, y: 1 }\n");
        assert_eq!(format("{}"), "{}\n");
    }

    #[test]
    fn regexps_pick_their_delimiters() {
        assert_eq!(format("%r{abc}i"), "/abc/i\n");
        assert_eq!(format("/a\\/b/"), "%r{a/b}\n");
        assert_eq!(format("%r{a/{2}}"), "%r{a/{2}}\n");
    }

    #[test]
    fn lambdas_use_braces_when_flat() {
        assert_eq!(format("->(x) do x end"), "->(x) { x }\n");
        assert_eq!(format("-> { }"), "-> {}\n");
    }
}
