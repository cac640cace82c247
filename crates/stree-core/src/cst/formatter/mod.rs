//! Pretty-printing formatter
//!
//! The formatter walks a parsed program and builds a document for the
//! layout engine. Every node goes through [`Formatter::format`], which keeps
//! the ancestor stack and prints the comments attached to the node around
//! it; the per-node rules live in the submodules, grouped by kind of node.
//!
//! # Example
//!
//! ```rust,ignore
//! use stree_core::cst::formatter::{FormatOptions, format_program};
//! use stree_core::driver::parse;
//!
//! let source = "x=1";
//! let program = parse(source).unwrap();
//! assert_eq!(format_program(&program, source, &FormatOptions::default()), "x = 1\n");
//! ```

mod calls;
mod control;
mod definitions;
mod literals;
mod operators;
mod patterns;
mod statements;

pub use literals::{group_digits, normalize_quotes};

use super::format_element::{COMMENT_PRIORITY, DocBuilder, FormatElement, Layout};
use super::location::SourceIndex;
use super::node::*;
use super::printer::{Printer, PrinterOptions};
use literals::KeyStyle;

/// Formatting options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatOptions {
    /// Maximum line width before groups break
    pub print_width: usize,

    /// Quote used for strings whose content allows either quote
    pub preferred_quote: char,

    /// Whether broken arrays, hashes and argument lists get a trailing comma
    pub trailing_comma: bool,

    /// Whether to keep short `if`/`else` blocks instead of using a ternary
    pub disable_auto_ternary: bool,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            print_width: 80,
            preferred_quote: '"',
            trailing_comma: false,
            disable_auto_ternary: false,
        }
    }
}

/// Format a parsed program back into source
pub fn format_program(program: &Node, source: &str, options: &FormatOptions) -> String {
    let document = build_document(program, source, options);
    let printer = Printer::new(PrinterOptions {
        line_width: options.print_width,
        ..PrinterOptions::default()
    });
    printer.print(&document)
}

/// The document the printer lays out for `program`
pub fn build_document(program: &Node, source: &str, options: &FormatOptions) -> Vec<FormatElement> {
    let mut formatter = Formatter::new(source, options.clone());
    formatter.format(program);
    formatter.finish()
}

/// Render state for one program
pub struct Formatter<'a> {
    source: &'a str,
    index: SourceIndex,
    options: FormatOptions,
    doc: DocBuilder,
    stack: Vec<&'a Node>,
    /// Key style of the enclosing hash literals and hash patterns
    key_styles: Vec<KeyStyle>,
}

impl Layout for Formatter<'_> {
    fn doc(&mut self) -> &mut DocBuilder {
        &mut self.doc
    }
}

impl<'a> Formatter<'a> {
    pub fn new(source: &'a str, options: FormatOptions) -> Self {
        Self {
            source,
            index: SourceIndex::new(source),
            options,
            doc: DocBuilder::new(),
            stack: Vec::new(),
            key_styles: Vec::new(),
        }
    }

    pub fn options(&self) -> &FormatOptions {
        &self.options
    }

    pub fn finish(self) -> Vec<FormatElement> {
        self.doc.finish()
    }

    /// Print a node with its attached comments
    pub fn format(&mut self, node: &'a Node) {
        self.with_comments(node, |f| f.format_node(node));
    }

    /// Push `node` on the ancestor stack and print its comments around `body`
    ///
    /// Leading comments go on their own lines before the node. If the last
    /// of them is `# stree-ignore`, the node's original source is printed
    /// instead of `body`. Trailing comments are deferred to the end of the
    /// line.
    fn with_comments(&mut self, node: &'a Node, body: impl FnOnce(&mut Self)) {
        self.stack.push(node);

        // an empty statement list prints only its comments
        let bare = has_no_statements(node);
        let mut ignored = false;
        let header = self.parent_tag() == Some(NodeTag::Begin);
        let mut leading = node
            .comments
            .iter()
            .filter(|comment| comment.is_leading() && !(header && comment.inline))
            .peekable();
        while let Some(comment) = leading.next() {
            self.format_comment(comment);
            if !bare || leading.peek().is_some() {
                self.breakable_force();
            }
            ignored = comment.is_ignore();
        }

        if ignored {
            self.format_verbatim(node);
        } else {
            body(self);
        }

        let led = node.comments.iter().any(|comment| comment.is_leading() && !(header && comment.inline));
        let trailing = node.comments.iter().filter(|comment| !comment.is_leading());
        for (index, comment) in trailing.enumerate() {
            self.line_suffix(COMMENT_PRIORITY, |f| {
                if bare && !led && index == 0 {
                    // the comment starts the body line itself
                } else if comment.inline {
                    f.text(" ");
                } else {
                    f.breakable_space();
                }
                f.format_comment(comment);
                f.break_parent();
            });
        }

        self.stack.pop();
    }

    /// Comments after a `begin` keyword, kept on its line
    fn format_header_comments(&mut self, body: &'a Node) {
        let inline = body.comments.iter().filter(|comment| comment.is_leading() && comment.inline);
        for comment in inline {
            self.line_suffix(COMMENT_PRIORITY, |f| {
                f.text(" ");
                f.format_comment(comment);
                f.break_parent();
            });
        }
    }

    fn format_comment(&mut self, comment: &Comment) {
        if comment.embdoc {
            self.trim();
            self.text(comment.value.trim_end());
        } else {
            self.text(comment.value.trim_end());
        }
    }

    /// The original source of `node`, including heredoc bodies it opens
    fn format_verbatim(&mut self, node: &'a Node) {
        let slice = self
            .index
            .slice(self.source, node.start_char(), deep_end_char(node));
        let slice = slice.strip_suffix('\n').unwrap_or(slice);
        for (index, line) in slice.split('\n').enumerate() {
            if index > 0 {
                self.breakable_return();
            }
            self.text(line);
        }
    }

    /// Text with embedded newlines; continuation lines start at column 0
    fn format_lines(&mut self, value: &str) {
        let body = value.strip_suffix('\n').unwrap_or(value);
        for (index, line) in body.split('\n').enumerate() {
            if index > 0 {
                self.breakable_return();
            }
            self.text(line);
        }
        if value.ends_with('\n') {
            self.breakable_return();
        }
    }

    pub fn parent(&self) -> Option<&'a Node> {
        self.ancestors().next()
    }

    pub fn parent_tag(&self) -> Option<NodeTag> {
        self.parent().map(Node::tag)
    }

    pub fn grandparent(&self) -> Option<&'a Node> {
        self.ancestors().nth(1)
    }

    /// Enclosing nodes, nearest first, excluding the node being printed
    pub fn ancestors(&self) -> impl Iterator<Item = &'a Node> + '_ {
        self.stack.iter().rev().skip(1).copied()
    }

    fn quote(&self) -> char {
        self.options.preferred_quote
    }

    /// Format `nodes` with `separator` between each pair
    fn seplist<I>(&mut self, nodes: I, separator: impl Fn(&mut Self))
    where
        I: IntoIterator<Item = &'a Node>,
    {
        for (index, node) in nodes.into_iter().enumerate() {
            if index > 0 {
                separator(self);
            }
            self.format(node);
        }
    }

    fn comma_breakable(&mut self) {
        self.text(",");
        self.breakable_space();
    }

    fn format_optional(&mut self, node: Option<&'a Node>) {
        if let Some(node) = node {
            self.format(node);
        }
    }

    /// A `,` after the last element, only when the group breaks
    fn format_trailing_comma(&mut self, parts: &[Node]) {
        if self.options.trailing_comma && trailing_comma_allowed(parts) {
            self.if_broken(|f| f.text(","));
        }
    }

    fn format_node(&mut self, node: &'a Node) {
        match &node.kind {
            NodeKind::Program(inner) => self.format_program(inner),
            NodeKind::Statements(inner) => self.format_statements(&inner.body),
            NodeKind::VoidStmt(_) => {}
            NodeKind::CommentNode(inner) => self.text(inner.value.trim_end()),
            NodeKind::EmbDoc(inner) => self.format_embdoc(inner),
            NodeKind::EndContent(inner) => self.format_end_content(inner),

            NodeKind::Int(inner) => match group_digits(&inner.value) {
                Some(grouped) => self.text(grouped),
                None => self.text(&inner.value),
            },
            NodeKind::CharLiteral(inner) => self.format_char(inner),
            NodeKind::HeredocEnd(inner) => self.text(inner.value.trim_end_matches(['\n', '\r'])),
            NodeKind::Ident(Ident { value })
            | NodeKind::Const(Const { value })
            | NodeKind::IVar(IVar { value })
            | NodeKind::CVar(CVar { value })
            | NodeKind::GVar(GVar { value })
            | NodeKind::Backref(Backref { value })
            | NodeKind::Label(Label { value })
            | NodeKind::Kw(Kw { value })
            | NodeKind::Op(Op { value })
            | NodeKind::Period(Period { value })
            | NodeKind::FloatLiteral(FloatLiteral { value })
            | NodeKind::RationalLiteral(RationalLiteral { value })
            | NodeKind::Imaginary(Imaginary { value })
            | NodeKind::TStringContent(TStringContent { value })
            | NodeKind::LParen(LParen { value })
            | NodeKind::RParen(RParen { value })
            | NodeKind::LBrace(LBrace { value })
            | NodeKind::RBrace(RBrace { value })
            | NodeKind::LBracket(LBracket { value })
            | NodeKind::RBracket(RBracket { value })
            | NodeKind::TStringBeg(TStringBeg { value })
            | NodeKind::TStringEnd(TStringEnd { value })
            | NodeKind::SymBeg(SymBeg { value })
            | NodeKind::LabelEnd(LabelEnd { value })
            | NodeKind::HeredocBeg(HeredocBeg { value })
            | NodeKind::RegexpBeg(RegexpBeg { value })
            | NodeKind::RegexpEnd(RegexpEnd { value })
            | NodeKind::EmbExprBeg(EmbExprBeg { value })
            | NodeKind::EmbExprEnd(EmbExprEnd { value })
            | NodeKind::Backtick(Backtick { value })
            | NodeKind::WordsBeg(WordsBeg { value })
            | NodeKind::QWordsBeg(QWordsBeg { value })
            | NodeKind::SymbolsBeg(SymbolsBeg { value })
            | NodeKind::QSymbolsBeg(QSymbolsBeg { value })
            | NodeKind::TLambda(TLambda { value })
            | NodeKind::TLamBeg(TLamBeg { value })
            | NodeKind::Comma(Comma { value }) => self.text(value),

            NodeKind::VarRef(inner) => self.format(&inner.value),
            NodeKind::PinnedVarRef(inner) => {
                self.text("^");
                self.format(&inner.value);
            }
            NodeKind::VarField(inner) => self.format_optional(inner.value.as_deref()),
            NodeKind::VCall(inner) => self.format(&inner.value),
            NodeKind::ConstRef(inner) => self.format(&inner.constant),
            NodeKind::ConstPathRef(ConstPathRef { parent, constant })
            | NodeKind::ConstPathField(ConstPathField { parent, constant }) => {
                self.format(parent);
                self.text("::");
                self.format(constant);
            }
            NodeKind::TopConstRef(TopConstRef { constant })
            | NodeKind::TopConstField(TopConstField { constant }) => {
                self.text("::");
                self.format(constant);
            }
            NodeKind::Field(inner) => self.format_field(inner),
            NodeKind::ARef(ARef { collection, index })
            | NodeKind::ARefField(ARefField { collection, index }) => {
                self.format_aref(collection, index.as_deref());
            }

            NodeKind::StringLiteral(inner) => self.format_string_literal(inner),
            NodeKind::StringContent(inner) => {
                for part in &inner.parts {
                    self.format(part);
                }
            }
            NodeKind::StringConcat(inner) => self.format_string_concat(inner),
            NodeKind::StringEmbExpr(inner) => self.format_string_embexpr(node, inner),
            NodeKind::StringDVar(inner) => {
                self.text("#{");
                self.format(&inner.variable);
                self.text("}");
            }
            NodeKind::XStringLiteral(inner) => self.format_xstring(inner),
            NodeKind::Heredoc(inner) => self.format_heredoc(inner),
            NodeKind::SymbolLiteral(inner) => {
                self.text(":");
                self.format(&inner.value);
            }
            NodeKind::DynaSymbol(inner) => self.format_dyna_symbol(node, inner),
            NodeKind::SymbolContent(inner) => self.format(&inner.value),
            NodeKind::RegexpLiteral(inner) => self.format_regexp(inner),
            NodeKind::ArrayLiteral(inner) => self.format_array(inner),
            NodeKind::Words(Words {
                beginning,
                elements,
            })
            | NodeKind::Symbols(Symbols {
                beginning,
                elements,
            })
            | NodeKind::QWords(QWords {
                beginning,
                elements,
            })
            | NodeKind::QSymbols(QSymbols {
                beginning,
                elements,
            }) => self.format_word_list(node, beginning, elements),
            NodeKind::Word(inner) => {
                for part in &inner.parts {
                    self.format(part);
                }
            }
            NodeKind::HashLiteral(inner) => self.format_hash(inner),
            NodeKind::BareAssocHash(inner) => {
                self.key_styles.push(KeyStyle::for_assocs(&inner.assocs));
                self.seplist(&inner.assocs, Self::comma_breakable);
                self.key_styles.pop();
            }
            NodeKind::Assoc(inner) => self.format_assoc(inner),
            NodeKind::AssocSplat(inner) => {
                self.text("**");
                self.format_optional(inner.value.as_deref());
            }
            NodeKind::RangeNode(inner) => self.format_range(inner),
            NodeKind::Lambda(inner) => self.format_lambda(inner),
            NodeKind::LambdaVar(inner) => self.format_lambda_var(inner),

            NodeKind::CallNode(inner) => self.format_call(node, inner),
            NodeKind::Command(inner) => self.format_command(inner),
            NodeKind::CommandCall(inner) => self.format_command_call(inner),
            NodeKind::MethodAddBlock(inner) => self.format_method_add_block(node, inner),
            NodeKind::BlockNode(inner) => self.format_block(node, inner),
            NodeKind::BlockVar(inner) => self.format_block_var(inner),
            NodeKind::Args(inner) => self.seplist(&inner.parts, Self::comma_breakable),
            NodeKind::ArgParen(inner) => self.format_arg_paren(inner),
            NodeKind::ArgStar(inner) => {
                self.text("*");
                self.format_optional(inner.value.as_deref());
            }
            NodeKind::ArgBlock(inner) => {
                self.text("&");
                self.format_optional(inner.value.as_deref());
            }
            NodeKind::ArgsForward(_) => self.text("..."),
            NodeKind::Super(inner) => self.format_keyword_arguments("super", Some(&inner.arguments)),
            NodeKind::ZSuper(_) => self.text("super"),
            NodeKind::YieldNode(inner) => {
                self.format_keyword_arguments("yield", inner.arguments.as_deref());
            }
            NodeKind::Defined(inner) => self.format_defined(inner),

            NodeKind::Binary(inner) => self.format_binary(inner),
            NodeKind::Unary(inner) => {
                self.text(&inner.operator);
                self.format(&inner.statement);
            }
            NodeKind::Not(inner) => self.format_not(inner),
            NodeKind::IfOp(inner) => self.format_ifop(inner),
            NodeKind::Assign(inner) => self.format_assign(inner),
            NodeKind::OpAssign(inner) => self.format_opassign(inner),
            NodeKind::MAssign(inner) => self.format_massign(inner),
            NodeKind::Mlhs(inner) => {
                self.seplist(&inner.parts, Self::comma_breakable);
                if inner.comma {
                    self.text(",");
                }
            }
            NodeKind::MlhsParen(inner) => self.format_mlhs_paren(inner),
            NodeKind::Mrhs(inner) => self.seplist(&inner.parts, Self::comma_breakable),
            NodeKind::Paren(inner) => self.format_paren(inner),

            NodeKind::IfNode(IfNode {
                predicate,
                statements,
                consequent,
                modifier,
            }) => self.format_conditional(
                node,
                "if",
                predicate,
                statements,
                consequent.as_deref(),
                *modifier,
            ),
            NodeKind::UnlessNode(UnlessNode {
                predicate,
                statements,
                consequent,
                modifier,
            }) => self.format_conditional(
                node,
                "unless",
                predicate,
                statements,
                consequent.as_deref(),
                *modifier,
            ),
            NodeKind::Elsif(inner) => self.format_elsif(inner),
            NodeKind::Else(inner) => self.format_else(inner),
            NodeKind::WhileNode(WhileNode {
                predicate,
                statements,
                modifier,
            }) => self.format_loop("while", predicate, statements, *modifier),
            NodeKind::UntilNode(UntilNode {
                predicate,
                statements,
                modifier,
            }) => self.format_loop("until", predicate, statements, *modifier),
            NodeKind::For(inner) => self.format_for(inner),
            NodeKind::Case(inner) => self.format_case(inner),
            NodeKind::When(inner) => self.format_when(inner),
            NodeKind::In(inner) => self.format_in(inner),
            NodeKind::RAssign(inner) => self.format_rassign(inner),
            NodeKind::Begin(inner) => self.format_begin(inner),
            NodeKind::PinnedBegin(inner) => {
                self.text("^(");
                self.format(&inner.statement);
                self.text(")");
            }
            NodeKind::BodyStmt(inner) => self.format_bodystmt(inner),
            NodeKind::Rescue(inner) => self.format_rescue(inner),
            NodeKind::RescueEx(inner) => self.format_rescue_ex(inner),
            NodeKind::RescueMod(inner) => self.format_rescue_mod(inner),
            NodeKind::Ensure(inner) => {
                self.format(&inner.keyword);
                self.format_clause_body(&inner.statements);
            }
            NodeKind::ReturnNode(ReturnNode { arguments }) => {
                self.format_keyword_arguments("return", arguments.as_deref());
            }
            NodeKind::Break(Break { arguments }) => {
                self.format_keyword_arguments("break", arguments.as_deref());
            }
            NodeKind::Next(Next { arguments }) => {
                self.format_keyword_arguments("next", arguments.as_deref());
            }
            NodeKind::Redo(_) => self.text("redo"),
            NodeKind::Retry(_) => self.text("retry"),
            NodeKind::BeginBlock(BeginBlock { statements, .. }) => {
                self.format_program_hook("BEGIN", statements);
            }
            NodeKind::EndBlock(EndBlock { statements, .. }) => {
                self.format_program_hook("END", statements);
            }
            NodeKind::AliasNode(inner) => {
                self.text("alias ");
                self.format(&inner.left);
                self.text(" ");
                self.format(&inner.right);
            }
            NodeKind::Undef(inner) => {
                self.group(|f| {
                    f.text("undef ");
                    f.nest(6, |f| f.seplist(&inner.symbols, Self::comma_breakable));
                });
            }

            NodeKind::DefNode(inner) => self.format_def(inner),
            NodeKind::ClassDeclaration(inner) => self.format_class(inner),
            NodeKind::SClass(inner) => {
                self.group(|f| {
                    f.text("class << ");
                    f.format(&inner.target);
                    f.format_body(&inner.bodystmt);
                    f.breakable_force();
                    f.text("end");
                });
            }
            NodeKind::ModuleDeclaration(inner) => {
                self.group(|f| {
                    f.text("module ");
                    f.format(&inner.constant);
                    f.format_body(&inner.bodystmt);
                    f.breakable_force();
                    f.text("end");
                });
            }
            NodeKind::Params(inner) => self.format_params(inner),
            NodeKind::OptionalParam(inner) => {
                self.format(&inner.name);
                self.text(" = ");
                self.format(&inner.value);
            }
            NodeKind::KeywordParam(inner) => {
                self.format(&inner.name);
                if let Some(value) = &inner.value {
                    self.text(" ");
                    self.format(value);
                }
            }
            NodeKind::RestParam(RestParam { name }) => {
                self.text("*");
                self.format_optional(name.as_deref());
            }
            NodeKind::KwRestParam(KwRestParam { name }) => {
                self.text("**");
                self.format_optional(name.as_deref());
            }
            NodeKind::BlockArg(BlockArg { name }) => {
                self.text("&");
                self.format_optional(name.as_deref());
            }
            NodeKind::ExcessedComma(_) => self.text(","),
            NodeKind::NoKwRest(_) => self.text("**nil"),

            NodeKind::AryPtn(inner) => self.format_aryptn(inner),
            NodeKind::HshPtn(inner) => self.format_hshptn(inner),
            NodeKind::FndPtn(inner) => self.format_fndptn(inner),
        }
    }
}

/// Whether a statement list holds nothing but placeholders
fn is_empty_statements(node: &Node) -> bool {
    has_no_statements(node) && node.comments.is_empty()
}

/// A statement list with no code and no spliced comments
fn has_no_statements(node: &Node) -> bool {
    match &node.kind {
        NodeKind::Statements(inner) => inner.body.iter().all(|statement| statement.is(NodeTag::VoidStmt)),
        _ => false,
    }
}

/// Whether a body, with or without clauses, prints nothing
fn is_empty_body(node: &Node) -> bool {
    match &node.kind {
        NodeKind::BodyStmt(inner) => {
            node.comments.is_empty()
                && is_empty_statements(&inner.statements)
                && inner.rescue_clause.is_none()
                && inner.else_clause.is_none()
                && inner.ensure_clause.is_none()
        }
        _ => is_empty_statements(node),
    }
}

/// Whether a heredoc sits anywhere inside `node`
pub(super) fn contains_heredoc(node: &Node) -> bool {
    node.is(NodeTag::Heredoc) || node.child_nodes().into_iter().any(contains_heredoc)
}

/// Furthest character offset covered by `node` or its descendants
fn deep_end_char(node: &Node) -> usize {
    node.child_nodes()
        .into_iter()
        .map(deep_end_char)
        .fold(node.end_char(), usize::max)
}

/// A trailing comma would change the meaning or not parse after block
/// arguments, splats, `...`, heredocs and a lone command argument
fn trailing_comma_allowed(parts: &[Node]) -> bool {
    let Some(last) = parts.last() else {
        return false;
    };
    if contains_heredoc(last) {
        return false;
    }
    match &last.kind {
        NodeKind::ArgBlock(_)
        | NodeKind::ArgStar(_)
        | NodeKind::ArgsForward(_)
        | NodeKind::AssocSplat(_)
        | NodeKind::Heredoc(_) => false,
        NodeKind::Command(_) | NodeKind::CommandCall(_) => parts.len() > 1,
        NodeKind::BareAssocHash(hash) => trailing_comma_allowed(&hash.assocs),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::parse;

    fn format_with(source: &str, options: &FormatOptions) -> String {
        let program = parse(source).unwrap();
        format_program(&program, source, options)
    }

    fn format(source: &str) -> String {
        format_with(source, &FormatOptions::default())
    }

    #[test]
    fn defaults_match_the_documented_options() {
        let options = FormatOptions::default();
        assert_eq!(options.print_width, 80);
        assert_eq!(options.preferred_quote, '"');
        assert!(!options.trailing_comma);
        assert!(!options.disable_auto_ternary);
    }

    #[test]
    fn leading_comments_stay_on_their_own_lines() {
        assert_eq!(format("# first\n# second\nfoo\n"), "# first\n# second\nfoo\n");
    }

    #[test]
    fn ignored_nodes_print_their_source() {
        let source = "# stree-ignore\nfoo(  1,2 )\nbar(  1,2 )\n";
        assert_eq!(format(source), "# stree-ignore\nfoo(  1,2 )\nbar(1, 2)\n");
    }

    #[test]
    fn ignored_nodes_keep_heredoc_bodies() {
        let source = "# stree-ignore\nfoo(<<~EOS,  1)\n  body\nEOS\n";
        assert_eq!(format(source), source);
    }

    #[test]
    fn trailing_comments_follow_their_line() {
        assert_eq!(
            format("foo(\n  a, # first\n  b\n)\n"),
            "foo(\n  a, # first\n  b\n)\n"
        );
    }

    #[test]
    fn trailing_commas_only_when_broken() {
        let options = FormatOptions {
            print_width: 20,
            trailing_comma: true,
            ..FormatOptions::default()
        };
        assert_eq!(format_with("foo(a, b)", &options), "foo(a, b)\n");
        assert_eq!(
            format_with("foo(alpha, beta, gamma)", &options),
            "foo(\n  alpha,\n  beta,\n  gamma,\n)\n"
        );
        assert_eq!(
            format_with("foo(alpha, beta, &gamma)", &options),
            "foo(\n  alpha,\n  beta,\n  &gamma\n)\n"
        );
    }
}
