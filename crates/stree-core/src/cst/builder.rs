//! Tree construction
//!
//! The grammar driver scans every token it consumes through
//! [`TreeBuilder::scan`] and then calls one `on_*` production per grammar
//! rule, children first. Value tokens come back from `scan` as leaf nodes.
//! Keywords, operators, brackets and string delimiters are additionally
//! recorded in the [`TokenLedger`]; each production claims the ones it owns
//! from there to compute its bounds.
//!
//! Containers whose bounds depend on their surroundings (`Statements`,
//! `BodyStmt`, `Rescue`) are built with provisional locations and finalized
//! by the parent through [`TreeBuilder::bind`] and friends. Binding a
//! statement list also splices own-line comments into its body.

use super::comments;
use super::ledger::TokenLedger;
use super::location::{Location, SourceIndex};
use super::node::*;
use super::token::{Token, TokenKind};
use crate::error::ParseError;

pub type BuildResult = Result<Node, ParseError>;

/// Everything one parse accumulates besides the tree itself
#[derive(Debug)]
pub struct ParserState {
    pub ledger: TokenLedger,
    /// Comments not yet attached to a node, in source order
    pub comments: Vec<Comment>,
    /// Heredocs whose body or terminator has not been seen yet
    pub heredocs: Vec<Node>,
    pub end_content: Option<Node>,
    pub index: SourceIndex,
}

impl ParserState {
    pub fn new(source: &str) -> Self {
        Self {
            ledger: TokenLedger::new(),
            comments: Vec::new(),
            heredocs: Vec::new(),
            end_content: None,
            index: SourceIndex::new(source),
        }
    }
}

fn is_ledger_kind(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Kw
            | TokenKind::Op
            | TokenKind::Period
            | TokenKind::LParen
            | TokenKind::RParen
            | TokenKind::LBracket
            | TokenKind::RBracket
            | TokenKind::LBrace
            | TokenKind::RBrace
            | TokenKind::TLambda
            | TokenKind::TLamBeg
            | TokenKind::TStringBeg
            | TokenKind::TStringEnd
            | TokenKind::SymBeg
            | TokenKind::LabelEnd
            | TokenKind::RegexpBeg
            | TokenKind::RegexpEnd
            | TokenKind::Backtick
            | TokenKind::WordsBeg
            | TokenKind::QWordsBeg
            | TokenKind::SymbolsBeg
            | TokenKind::QSymbolsBeg
            | TokenKind::EmbExprBeg
            | TokenKind::EmbExprEnd
            | TokenKind::EmbVar
    )
}

fn leaf_kind(kind: TokenKind, value: String) -> Option<NodeKind> {
    Some(match kind {
        TokenKind::Ident => Ident { value }.into(),
        TokenKind::Const => Const { value }.into(),
        TokenKind::IVar => IVar { value }.into(),
        TokenKind::CVar => CVar { value }.into(),
        TokenKind::GVar => GVar { value }.into(),
        TokenKind::Backref => Backref { value }.into(),
        TokenKind::Label => Label { value }.into(),
        TokenKind::Kw => Kw { value }.into(),
        TokenKind::Op => Op { value }.into(),
        TokenKind::Period => Period { value }.into(),
        TokenKind::Comma => Comma { value }.into(),
        TokenKind::LParen => LParen { value }.into(),
        TokenKind::RParen => RParen { value }.into(),
        TokenKind::LBracket => LBracket { value }.into(),
        TokenKind::RBracket => RBracket { value }.into(),
        TokenKind::LBrace => LBrace { value }.into(),
        TokenKind::RBrace => RBrace { value }.into(),
        TokenKind::TLambda => TLambda { value }.into(),
        TokenKind::TLamBeg => TLamBeg { value }.into(),
        TokenKind::Int => Int { value }.into(),
        TokenKind::Float => FloatLiteral { value }.into(),
        TokenKind::Rational => RationalLiteral { value }.into(),
        TokenKind::Imaginary => Imaginary { value }.into(),
        TokenKind::Char => CharLiteral { value }.into(),
        TokenKind::TStringBeg => TStringBeg { value }.into(),
        TokenKind::TStringContent => TStringContent { value }.into(),
        TokenKind::TStringEnd => TStringEnd { value }.into(),
        TokenKind::EmbExprBeg => EmbExprBeg { value }.into(),
        TokenKind::EmbExprEnd => EmbExprEnd { value }.into(),
        TokenKind::SymBeg => SymBeg { value }.into(),
        TokenKind::LabelEnd => LabelEnd { value }.into(),
        TokenKind::RegexpBeg => RegexpBeg { value }.into(),
        TokenKind::RegexpEnd => RegexpEnd { value }.into(),
        TokenKind::Backtick => Backtick { value }.into(),
        TokenKind::WordsBeg => WordsBeg { value }.into(),
        TokenKind::QWordsBeg => QWordsBeg { value }.into(),
        TokenKind::SymbolsBeg => SymbolsBeg { value }.into(),
        TokenKind::QSymbolsBeg => QSymbolsBeg { value }.into(),
        TokenKind::HeredocBeg => HeredocBeg { value }.into(),
        TokenKind::HeredocEnd => HeredocEnd { value }.into(),
        TokenKind::EmbVar
        | TokenKind::Semicolon
        | TokenKind::WordsSep
        | TokenKind::Comment
        | TokenKind::EmbDoc
        | TokenKind::EndContent
        | TokenKind::Newline
        | TokenKind::Eof => return None,
    })
}

fn boxed(node: Node) -> Box<Node> {
    Box::new(node)
}

/// Width of the common indentation of a squiggly heredoc body
/// Grow each node's end over its descendants; heredoc bodies are the only
/// children that reach past the code around them
fn cover_descendants(node: &mut Node) {
    let mut end = node.location;
    for child in node.child_nodes_mut() {
        cover_descendants(child);
        if child.location.end_char > end.end_char {
            end = end.with_end(
                child.location.end_line,
                child.location.end_char,
                child.location.end_column,
            );
        }
    }
    node.location = end;
}

fn dedent_width(body: &str) -> usize {
    body.split_inclusive('\n')
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let mut width = 0;
            for ch in line.chars() {
                match ch {
                    ' ' => width += 1,
                    '\t' => width = (width / 8 + 1) * 8,
                    _ => break,
                }
            }
            width
        })
        .min()
        .unwrap_or(0)
}

pub struct TreeBuilder<'src> {
    source: &'src str,
    state: ParserState,
    /// Location of the most recently scanned token
    cursor: Location,
}

impl<'src> TreeBuilder<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            state: ParserState::new(source),
            cursor: Location::fixed(1, 0, 0),
        }
    }

    pub fn state(&self) -> &ParserState {
        &self.state
    }

    pub fn index(&self) -> &SourceIndex {
        &self.state.index
    }

    pub fn cursor(&self) -> Location {
        self.cursor
    }

    pub fn location_of(&self, token: &Token) -> Location {
        let index = &self.state.index;
        Location {
            start_line: token.line,
            start_char: index.char_pos(token.line, token.column),
            start_column: index.char_column(token.line, token.column),
            end_line: token.end_line,
            end_char: index.char_pos(token.end_line, token.end_column),
            end_column: index.char_column(token.end_line, token.end_column),
        }
    }

    fn location(&self, start_char: usize, end_char: usize) -> Location {
        self.state.index.location(start_char, end_char)
    }

    /// Record a token; value tokens come back as leaf nodes
    pub fn scan(&mut self, token: &Token) -> Option<Node> {
        let location = self.location_of(token);
        match token.kind {
            TokenKind::Comment => {
                let line_start = self.state.index.byte_pos(token.line, 0);
                let start = self.state.index.byte_pos(token.line, token.column);
                let inline = self
                    .source
                    .get(line_start..start)
                    .is_some_and(|before| !before.trim().is_empty());
                self.state
                    .comments
                    .push(Comment::new(token.value.clone(), inline, location));
                return None;
            }
            TokenKind::EmbDoc => {
                self.state
                    .comments
                    .push(Comment::embdoc(token.value.clone(), location));
                return None;
            }
            TokenKind::EndContent => {
                let value = token.value.clone();
                self.state.end_content = Some(Node::new(EndContent { value }, location));
                return None;
            }
            _ => {}
        }

        self.cursor = location;
        self.state
            .ledger
            .set_position(token.line, location.start_column);
        if is_ledger_kind(token.kind) {
            self.state.ledger.record(token.clone());
        }
        leaf_kind(token.kind, token.value.clone()).map(|kind| Node::new(kind, location))
    }

    fn find(&mut self, kind: TokenKind, value: &str) -> Result<Location, ParseError> {
        let token = self.state.ledger.find(kind, Some(value), true)?;
        Ok(self.location_of(&token))
    }

    fn find_any(&mut self, kind: TokenKind) -> Result<Location, ParseError> {
        let token = self.state.ledger.find(kind, None, true)?;
        Ok(self.location_of(&token))
    }

    fn find_token(&mut self, kind: TokenKind) -> Result<(Token, Location), ParseError> {
        let token = self.state.ledger.find(kind, None, true)?;
        let location = self.location_of(&token);
        Ok((token, location))
    }

    fn keyword(&mut self, value: &str) -> Result<Location, ParseError> {
        self.find(TokenKind::Kw, value)
    }

    fn operator(&mut self, value: &str) -> Result<Location, ParseError> {
        self.find(TokenKind::Op, value)
    }

    /// Location of a keyword that a later production will claim
    fn peek_keyword(&self, value: &str) -> Option<Location> {
        self.state
            .ledger
            .peek(TokenKind::Kw, Some(value))
            .map(|token| self.location_of(token))
    }

    /// Drop an optional keyword such as `then` or a loop's `do`
    fn discard_keyword(&mut self, value: &str, after: &Location) {
        let line = after.start_line;
        let column = self.state.index.byte_offset(after.start_char)
            - self.state.index.byte_pos(line, 0);
        self.state
            .ledger
            .take_after(TokenKind::Kw, Some(value), line, column);
    }

    /// Remove the ledger entry behind a leaf node that carries one
    pub fn claim(&mut self, node: &Node) -> Result<(), ParseError> {
        let kind = match node.tag() {
            NodeTag::Kw => TokenKind::Kw,
            NodeTag::Op => TokenKind::Op,
            NodeTag::Period => TokenKind::Period,
            _ => return Ok(()),
        };
        let value = node.token_value().unwrap_or_default().to_string();
        self.state.ledger.find(kind, Some(&value), true)?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Statements and binding
    // ------------------------------------------------------------------

    pub fn on_void_stmt(&self) -> Node {
        let at = self.cursor;
        Node::new(
            VoidStmt {},
            Location::fixed(at.end_line, at.end_char, at.end_column),
        )
    }

    /// A statement list with provisional bounds; the parent binds it
    pub fn on_stmts(&self, mut body: Vec<Node>) -> Node {
        if body.is_empty() {
            body.push(self.on_void_stmt());
        }
        let location = match (body.first(), body.last()) {
            (Some(first), Some(last)) => first.location.to(&last.location),
            _ => self.cursor,
        };
        Node::new(Statements { body }, location)
    }

    /// Finalize a statement list's bounds and splice own-line comments into it
    pub fn bind(&mut self, statements: &mut Node, start_char: usize, end_char: usize) {
        let end_char = end_char.max(start_char);
        statements.location = self.location(start_char, end_char);
        let start = statements.location;
        let NodeKind::Statements(inner) = &mut statements.kind else {
            return;
        };

        if let Some(first) = inner.body.first_mut()
            && first.is(NodeTag::VoidStmt)
        {
            first.location = Location::fixed(start.start_line, start.start_char, start.start_column);
        }

        let mut comment_index = 0;
        let mut body_index = 0;
        while comment_index < self.state.comments.len() {
            let comment = &self.state.comments[comment_index];
            let location = comment.location;
            let candidate = !comment.inline
                && !comment.is_ignore()
                && start_char <= location.start_char
                && location.end_char <= end_char;
            if !candidate {
                comment_index += 1;
                continue;
            }

            while let Some(node) = inner.body.get(body_index) {
                if node.is(NodeTag::VoidStmt) || node.start_char() < location.start_char {
                    body_index += 1;
                } else {
                    break;
                }
            }

            let enclosed = body_index > 0
                && inner.body[body_index - 1].start_char() < location.start_char
                && inner.body[body_index - 1].end_char() > location.start_char;
            if enclosed {
                comment_index += 1;
            } else {
                let comment = self.state.comments.remove(comment_index);
                inner.body.insert(body_index, comment.into_node());
            }
        }
    }

    /// Bind a body with `rescue`/`else`/`ensure` clauses
    pub fn bind_bodystmt(&mut self, bodystmt: &mut Node, start_char: usize, end_char: usize) {
        bodystmt.location = self.location(start_char, end_char.max(start_char));
        let NodeKind::BodyStmt(inner) = &mut bodystmt.kind else {
            return;
        };

        let else_start = inner.else_keyword.as_ref().map(|keyword| keyword.start_char());
        let ensure_start = inner.ensure_clause.as_ref().map(|clause| clause.start_char());
        let rescue_start = inner.rescue_clause.as_ref().map(|clause| clause.start_char());

        let statements_end = rescue_start.or(else_start).or(ensure_start).unwrap_or(end_char);
        self.bind(&mut inner.statements, start_char, statements_end);

        let after_rescue = else_start.or(ensure_start).unwrap_or(end_char);
        if let Some(rescue) = inner.rescue_clause.as_deref_mut() {
            self.bind_rescue_end(rescue, after_rescue);
        }

        if let (Some(keyword), Some(clause)) =
            (inner.else_keyword.as_ref(), inner.else_clause.as_deref_mut())
        {
            let start = keyword.end_char();
            self.bind(clause, start, ensure_start.unwrap_or(end_char));
        }
    }

    /// Extend a rescue chain to `end_char` and bind each clause's statements
    fn bind_rescue_end(&mut self, rescue: &mut Node, end_char: usize) {
        rescue.location = self.location(rescue.start_char(), end_char.max(rescue.start_char()));
        let NodeKind::Rescue(inner) = &mut rescue.kind else {
            return;
        };
        let start = inner
            .exception
            .as_ref()
            .map(|exception| exception.end_char())
            .unwrap_or(inner.keyword.end_char());
        let next = inner.consequent.as_ref().map(|consequent| consequent.start_char());
        self.bind(&mut inner.statements, start, next.unwrap_or(end_char));
        if let Some(consequent) = inner.consequent.as_deref_mut() {
            self.bind_rescue_end(consequent, end_char);
        }
    }

    pub fn on_program(&mut self, mut statements: Node) -> Node {
        let end = self.state.index.char_len();
        self.bind(&mut statements, 0, end);
        if let Some(end_content) = self.state.end_content.take()
            && let NodeKind::Statements(inner) = &mut statements.kind
        {
            inner.body.push(end_content);
        }
        let location = self.location(0, end);
        let mut program = Node::new(
            Program {
                statements: boxed(statements),
            },
            location,
        );

        let remaining = std::mem::take(&mut self.state.comments);
        comments::attach(&mut program, remaining);
        cover_descendants(&mut program);
        if !self.state.ledger.is_empty() {
            tracing::trace!(
                leftover = self.state.ledger.len(),
                "Ledger entries left unclaimed"
            );
        }
        program
    }

    // ------------------------------------------------------------------
    // Variables and references
    // ------------------------------------------------------------------

    pub fn on_var_ref(&mut self, value: Node) -> BuildResult {
        self.claim(&value)?;
        let location = value.location;
        Ok(Node::new(VarRef { value: boxed(value) }, location))
    }

    pub fn on_pinned_var_ref(&mut self, value: Node) -> BuildResult {
        let caret = self.operator("^")?;
        let location = caret.to(&value.location);
        Ok(Node::new(PinnedVarRef { value: boxed(value) }, location))
    }

    pub fn on_var_field(&mut self, value: Option<Node>) -> Node {
        let location = value
            .as_ref()
            .map(|value| value.location)
            .unwrap_or(self.cursor);
        Node::new(
            VarField {
                value: value.map(boxed),
            },
            location,
        )
    }

    pub fn on_vcall(&self, value: Node) -> Node {
        let location = value.location;
        Node::new(VCall { value: boxed(value) }, location)
    }

    pub fn on_const_ref(&self, constant: Node) -> Node {
        let location = constant.location;
        Node::new(
            ConstRef {
                constant: boxed(constant),
            },
            location,
        )
    }

    pub fn on_const_path_ref(&mut self, parent: Node, constant: Node) -> BuildResult {
        self.operator("::")?;
        let location = parent.location.to(&constant.location);
        Ok(Node::new(
            ConstPathRef {
                parent: boxed(parent),
                constant: boxed(constant),
            },
            location,
        ))
    }

    pub fn on_const_path_field(&mut self, parent: Node, constant: Node) -> BuildResult {
        self.operator("::")?;
        let location = parent.location.to(&constant.location);
        Ok(Node::new(
            ConstPathField {
                parent: boxed(parent),
                constant: boxed(constant),
            },
            location,
        ))
    }

    pub fn on_top_const_ref(&mut self, constant: Node) -> BuildResult {
        let colons = self.operator("::")?;
        let location = colons.to(&constant.location);
        Ok(Node::new(
            TopConstRef {
                constant: boxed(constant),
            },
            location,
        ))
    }

    pub fn on_top_const_field(&mut self, constant: Node) -> BuildResult {
        let colons = self.operator("::")?;
        let location = colons.to(&constant.location);
        Ok(Node::new(
            TopConstField {
                constant: boxed(constant),
            },
            location,
        ))
    }

    /// Reinterpret an expression that turned out to be assigned to
    pub fn on_target(&self, node: Node) -> BuildResult {
        let Node {
            kind,
            location,
            comments,
        } = node;
        let kind: NodeKind = match kind {
            NodeKind::VCall(VCall { value }) => VarField { value: Some(value) }.into(),
            NodeKind::VarRef(VarRef { value }) if !value.is(NodeTag::Kw) => {
                VarField { value: Some(value) }.into()
            }
            NodeKind::CallNode(CallNode {
                receiver: Some(parent),
                operator: Some(operator),
                message: Some(name),
                arguments: None,
            }) => Field {
                parent,
                operator,
                name,
            }
            .into(),
            NodeKind::ARef(ARef { collection, index }) => ARefField { collection, index }.into(),
            NodeKind::ConstPathRef(ConstPathRef { parent, constant }) => {
                ConstPathField { parent, constant }.into()
            }
            NodeKind::TopConstRef(TopConstRef { constant }) => TopConstField { constant }.into(),
            kind @ (NodeKind::VarField(_)
            | NodeKind::Field(_)
            | NodeKind::ARefField(_)
            | NodeKind::ConstPathField(_)
            | NodeKind::TopConstField(_)
            | NodeKind::ArgStar(_)
            | NodeKind::MlhsParen(_)) => kind,
            _ => {
                return Err(ParseError::new(
                    "syntax error, unexpected assignment target",
                    location.start_line,
                    location.start_column,
                ));
            }
        };
        Ok(Node {
            kind,
            location,
            comments,
        })
    }

    pub fn on_field(&mut self, parent: Node, operator: Node, name: Node) -> BuildResult {
        self.claim(&operator)?;
        let location = parent.location.to(&name.location);
        Ok(Node::new(
            Field {
                parent: boxed(parent),
                operator: boxed(operator),
                name: boxed(name),
            },
            location,
        ))
    }

    pub fn on_aref(&mut self, collection: Node, index: Option<Node>) -> BuildResult {
        let rbracket = self.find_any(TokenKind::RBracket)?;
        self.find_any(TokenKind::LBracket)?;
        let location = collection.location.to(&rbracket);
        Ok(Node::new(
            ARef {
                collection: boxed(collection),
                index: index.map(boxed),
            },
            location,
        ))
    }

    pub fn on_aref_field(&mut self, collection: Node, index: Option<Node>) -> BuildResult {
        let rbracket = self.find_any(TokenKind::RBracket)?;
        self.find_any(TokenKind::LBracket)?;
        let location = collection.location.to(&rbracket);
        Ok(Node::new(
            ARefField {
                collection: boxed(collection),
                index: index.map(boxed),
            },
            location,
        ))
    }

    // ------------------------------------------------------------------
    // Strings, symbols and regular expressions
    // ------------------------------------------------------------------

    pub fn on_string_literal(&mut self, parts: Vec<Node>) -> BuildResult {
        let ending = self.find_any(TokenKind::TStringEnd)?;
        let (beginning, start) = self.find_token(TokenKind::TStringBeg)?;
        Ok(Node::new(
            StringLiteral {
                parts,
                quote: beginning.value,
            },
            start.to(&ending),
        ))
    }

    /// `"key": value` hash keys
    pub fn on_label_literal(&mut self, parts: Vec<Node>) -> BuildResult {
        let ending = self.find_any(TokenKind::LabelEnd)?;
        let (beginning, start) = self.find_token(TokenKind::TStringBeg)?;
        Ok(Node::new(
            DynaSymbol {
                parts,
                quote: beginning.value,
            },
            start.to(&ending),
        ))
    }

    pub fn on_xstring_literal(&mut self, parts: Vec<Node>) -> BuildResult {
        let ending = self.find_any(TokenKind::TStringEnd)?;
        let start = self.find_any(TokenKind::Backtick)?;
        Ok(Node::new(XStringLiteral { parts }, start.to(&ending)))
    }

    pub fn on_string_embexpr(&mut self, mut statements: Node) -> BuildResult {
        let ending = self.find_any(TokenKind::EmbExprEnd)?;
        let beginning = self.find_any(TokenKind::EmbExprBeg)?;
        self.bind(&mut statements, beginning.end_char, ending.start_char);
        Ok(Node::new(
            StringEmbExpr {
                statements: boxed(statements),
            },
            beginning.to(&ending),
        ))
    }

    pub fn on_string_dvar(&mut self, variable: Node) -> BuildResult {
        let start = self.find_any(TokenKind::EmbVar)?;
        let location = start.to(&variable.location);
        Ok(Node::new(
            StringDVar {
                variable: boxed(variable),
            },
            location,
        ))
    }

    pub fn on_string_concat(&self, left: Node, right: Node) -> Node {
        let location = left.location.to(&right.location);
        Node::new(
            StringConcat {
                left: boxed(left),
                right: boxed(right),
            },
            location,
        )
    }

    /// Open a heredoc; its parts and terminator arrive next
    pub fn on_heredoc_beg(&mut self, beginning: Node) {
        let location = beginning.location;
        let ending = Node::new(
            HeredocEnd {
                value: String::new(),
            },
            location,
        );
        self.state.heredocs.push(Node::new(
            Heredoc {
                beginning: boxed(beginning),
                parts: Vec::new(),
                ending: boxed(ending),
                dedent: 0,
            },
            location,
        ));
    }

    pub fn on_heredoc_part(&mut self, part: Node) {
        if let Some(Node {
            kind: NodeKind::Heredoc(heredoc),
            ..
        }) = self.state.heredocs.last_mut()
        {
            heredoc.parts.push(part);
        }
    }

    pub fn on_heredoc_end(&mut self, ending: Node) {
        let source = self.source;
        let index = &self.state.index;
        if let Some(node) = self.state.heredocs.last_mut() {
            node.location = node.location.to(&ending.location);
            if let NodeKind::Heredoc(heredoc) = &mut node.kind {
                if heredoc.beginning.token_value().is_some_and(|value| value.starts_with("<<~"))
                    && let Some(first) = heredoc.parts.first()
                {
                    let body = index.slice(source, first.start_char(), ending.start_char());
                    heredoc.dedent = dedent_width(body);
                }
                heredoc.ending = boxed(ending);
            }
        }
    }

    /// Take the completed heredoc from the top of the stack
    pub fn on_heredoc_literal(&mut self) -> BuildResult {
        self.state.heredocs.pop().ok_or_else(|| {
            let at = self.cursor;
            ParseError::new("heredoc body is missing", at.start_line, at.start_column)
        })
    }

    pub fn on_symbol_literal(&mut self, value: Node) -> BuildResult {
        self.claim(&value)?;
        let start = self.find_any(TokenKind::SymBeg)?;
        let location = start.to(&value.location);
        let symbol = Node::new(SymbolContent { value: boxed(value) }, location);
        Ok(Node::new(
            SymbolLiteral {
                value: boxed(symbol),
            },
            location,
        ))
    }

    pub fn on_dyna_symbol(&mut self, parts: Vec<Node>) -> BuildResult {
        let ending = self.find_any(TokenKind::TStringEnd)?;
        let (beginning, start) = self.find_token(TokenKind::SymBeg)?;
        Ok(Node::new(
            DynaSymbol {
                parts,
                quote: beginning.value,
            },
            start.to(&ending),
        ))
    }

    pub fn on_regexp_literal(&mut self, parts: Vec<Node>) -> BuildResult {
        let (ending, end) = self.find_token(TokenKind::RegexpEnd)?;
        let (beginning, start) = self.find_token(TokenKind::RegexpBeg)?;
        Ok(Node::new(
            RegexpLiteral {
                beginning: beginning.value,
                parts,
                ending: ending.value,
            },
            start.to(&end),
        ))
    }

    pub fn on_word(&self, parts: Vec<Node>) -> Node {
        let location = match (parts.first(), parts.last()) {
            (Some(first), Some(last)) => first.location.to(&last.location),
            _ => self.cursor,
        };
        Node::new(Word { parts }, location)
    }

    /// `%w[]`, `%W[]`, `%i[]` and `%I[]`, told apart by the opening token
    pub fn on_words(&mut self, opener: TokenKind, elements: Vec<Node>) -> BuildResult {
        let ending = self.find_any(TokenKind::TStringEnd)?;
        let (token, start) = self.find_token(opener)?;
        let location = start.to(&ending);
        let beginning = match leaf_kind(opener, token.value) {
            Some(kind) => boxed(Node::new(kind, start)),
            None => return Err(self.error("unexpected word list opener")),
        };
        let kind: NodeKind = match opener {
            TokenKind::WordsBeg => Words { beginning, elements }.into(),
            TokenKind::QWordsBeg => QWords { beginning, elements }.into(),
            TokenKind::SymbolsBeg => Symbols { beginning, elements }.into(),
            _ => QSymbols { beginning, elements }.into(),
        };
        Ok(Node::new(kind, location))
    }

    fn error(&self, message: &str) -> ParseError {
        let at = self.cursor;
        ParseError::new(message, at.start_line, at.start_column)
    }

    // ------------------------------------------------------------------
    // Arrays, hashes, ranges and lambdas
    // ------------------------------------------------------------------

    pub fn on_array(&mut self, contents: Option<Node>) -> BuildResult {
        let rbracket = self.find_any(TokenKind::RBracket)?;
        let (token, lbracket) = self.find_token(TokenKind::LBracket)?;
        let opener = Node::new(LBracket { value: token.value }, lbracket);
        Ok(Node::new(
            ArrayLiteral {
                lbracket: boxed(opener),
                contents: contents.map(boxed),
            },
            lbracket.to(&rbracket),
        ))
    }

    pub fn on_hash(&mut self, assocs: Vec<Node>) -> BuildResult {
        let rbrace = self.find_any(TokenKind::RBrace)?;
        let (token, lbrace) = self.find_token(TokenKind::LBrace)?;
        let opener = Node::new(LBrace { value: token.value }, lbrace);
        Ok(Node::new(
            HashLiteral {
                lbrace: boxed(opener),
                assocs,
            },
            lbrace.to(&rbrace),
        ))
    }

    /// `key => value`, `key: value` or the shorthand `key:`
    pub fn on_assoc(&mut self, key: Node, value: Option<Node>, rocket: bool) -> BuildResult {
        if rocket {
            self.operator("=>")?;
        }
        let location = match &value {
            Some(value) => key.location.to(&value.location),
            None => key.location,
        };
        Ok(Node::new(
            Assoc {
                key: boxed(key),
                value: value.map(boxed),
            },
            location,
        ))
    }

    pub fn on_assoc_splat(&mut self, value: Option<Node>) -> BuildResult {
        let start = self.operator("**")?;
        let location = match &value {
            Some(value) => start.to(&value.location),
            None => start,
        };
        Ok(Node::new(
            AssocSplat {
                value: value.map(boxed),
            },
            location,
        ))
    }

    pub fn on_bare_assoc_hash(&self, assocs: Vec<Node>) -> Node {
        let location = match (assocs.first(), assocs.last()) {
            (Some(first), Some(last)) => first.location.to(&last.location),
            _ => self.cursor,
        };
        Node::new(BareAssocHash { assocs }, location)
    }

    pub fn on_range(&mut self, left: Option<Node>, operator: Node, right: Option<Node>) -> BuildResult {
        self.claim(&operator)?;
        let start = left.as_ref().map(|left| left.location).unwrap_or(operator.location);
        let end = right.as_ref().map(|right| right.location).unwrap_or(operator.location);
        Ok(Node::new(
            RangeNode {
                left: left.map(boxed),
                operator: boxed(operator),
                right: right.map(boxed),
            },
            start.to(&end),
        ))
    }

    /// `->(params) { ... }` and `-> do ... end`
    pub fn on_lambda(&mut self, params: Node, mut statements: Node, braces: bool) -> BuildResult {
        let (opening, closing) = if braces {
            let closing = self.find_any(TokenKind::RBrace)?;
            (self.find_any(TokenKind::TLamBeg)?, closing)
        } else {
            let closing = self.keyword("end")?;
            (self.keyword("do")?, closing)
        };
        let start = self.find_any(TokenKind::TLambda)?;
        if statements.is(NodeTag::BodyStmt) {
            self.bind_bodystmt(&mut statements, opening.end_char, closing.start_char);
        } else {
            self.bind(&mut statements, opening.end_char, closing.start_char);
        }
        Ok(Node::new(
            Lambda {
                params: boxed(params),
                statements: boxed(statements),
            },
            start.to(&closing),
        ))
    }

    pub fn on_lambda_var(&self, params: Node, locals: Vec<Node>) -> Node {
        let end = locals.last().map(|local| local.location).unwrap_or(params.location);
        let location = params.location.to(&end);
        Node::new(
            LambdaVar {
                params: boxed(params),
                locals,
            },
            location,
        )
    }

    // ------------------------------------------------------------------
    // Calls and blocks
    // ------------------------------------------------------------------

    pub fn on_call(
        &mut self,
        receiver: Option<Node>,
        operator: Option<Node>,
        message: Option<Node>,
        arguments: Option<Node>,
    ) -> BuildResult {
        if let Some(operator) = &operator {
            self.claim(operator)?;
        }
        if let Some(message) = &message {
            self.claim(message)?;
        }
        let start = receiver
            .as_ref()
            .or(message.as_ref())
            .or(operator.as_ref())
            .or(arguments.as_ref())
            .map(|node| node.location)
            .unwrap_or(self.cursor);
        let end = arguments
            .as_ref()
            .or(message.as_ref())
            .or(operator.as_ref())
            .map(|node| node.location)
            .unwrap_or(start);
        Ok(Node::new(
            CallNode {
                receiver: receiver.map(boxed),
                operator: operator.map(boxed),
                message: message.map(boxed),
                arguments: arguments.map(boxed),
            },
            start.to(&end),
        ))
    }

    pub fn on_command(&mut self, message: Node, arguments: Node) -> BuildResult {
        self.claim(&message)?;
        let location = message.location.to(&arguments.location);
        Ok(Node::new(
            Command {
                message: boxed(message),
                arguments: boxed(arguments),
                block: None,
            },
            location,
        ))
    }

    pub fn on_command_call(
        &mut self,
        receiver: Node,
        operator: Node,
        message: Node,
        arguments: Option<Node>,
    ) -> BuildResult {
        self.claim(&operator)?;
        self.claim(&message)?;
        let end = arguments
            .as_ref()
            .map(|arguments| arguments.location)
            .unwrap_or(message.location);
        let location = receiver.location.to(&end);
        Ok(Node::new(
            CommandCall {
                receiver: boxed(receiver),
                operator: boxed(operator),
                message: boxed(message),
                arguments: arguments.map(boxed),
                block: None,
            },
            location,
        ))
    }

    /// Attach a block; commands keep it in their own `block` field
    pub fn on_method_add_block(&self, mut call: Node, block: Node) -> Node {
        let location = call.location.to(&block.location);
        let slot = match &mut call.kind {
            NodeKind::Command(command) => Some(&mut command.block),
            NodeKind::CommandCall(command) => Some(&mut command.block),
            _ => None,
        };
        match slot {
            Some(slot) if slot.is_none() => {
                *slot = Some(boxed(block));
                call.location = location;
                call
            }
            _ => Node::new(
                MethodAddBlock {
                    call: boxed(call),
                    block: boxed(block),
                },
                location,
            ),
        }
    }

    pub fn on_brace_block(&mut self, block_var: Option<Node>, mut statements: Node) -> BuildResult {
        let rbrace = self.find_any(TokenKind::RBrace)?;
        let (token, lbrace) = self.find_token(TokenKind::LBrace)?;
        let start = block_var
            .as_ref()
            .map(|block_var| block_var.end_char())
            .unwrap_or(lbrace.end_char);
        self.bind(&mut statements, start, rbrace.start_char);
        let opening = Node::new(LBrace { value: token.value }, lbrace);
        Ok(Node::new(
            BlockNode {
                opening: boxed(opening),
                block_var: block_var.map(boxed),
                bodystmt: boxed(statements),
            },
            lbrace.to(&rbrace),
        ))
    }

    pub fn on_do_block(&mut self, block_var: Option<Node>, mut bodystmt: Node) -> BuildResult {
        let ending = self.keyword("end")?;
        let beginning = self.keyword("do")?;
        let start = block_var
            .as_ref()
            .map(|block_var| block_var.end_char())
            .unwrap_or(beginning.end_char);
        self.bind_bodystmt(&mut bodystmt, start, ending.start_char);
        let opening = Node::new(
            Kw {
                value: "do".to_string(),
            },
            beginning,
        );
        Ok(Node::new(
            BlockNode {
                opening: boxed(opening),
                block_var: block_var.map(boxed),
                bodystmt: boxed(bodystmt),
            },
            beginning.to(&ending),
        ))
    }

    /// `|params; locals|`, or the empty `||`
    pub fn on_block_var(&mut self, params: Node, locals: Vec<Node>, empty: bool) -> BuildResult {
        let location = if empty {
            self.operator("||")?
        } else {
            let closing = self.operator("|")?;
            self.operator("|")?.to(&closing)
        };
        Ok(Node::new(
            BlockVar {
                params: boxed(params),
                locals,
            },
            location,
        ))
    }

    pub fn on_args(&self, parts: Vec<Node>) -> Node {
        let location = match (parts.first(), parts.last()) {
            (Some(first), Some(last)) => first.location.to(&last.location),
            _ => {
                let at = self.cursor;
                Location::fixed(at.end_line, at.end_char, at.end_column)
            }
        };
        Node::new(Args { parts }, location)
    }

    pub fn on_arg_paren(&mut self, arguments: Option<Node>) -> BuildResult {
        let rparen = self.find_any(TokenKind::RParen)?;
        let lparen = self.find_any(TokenKind::LParen)?;
        Ok(Node::new(
            ArgParen {
                arguments: arguments.map(boxed),
            },
            lparen.to(&rparen),
        ))
    }

    pub fn on_arg_star(&mut self, value: Option<Node>) -> BuildResult {
        let star = self.operator("*")?;
        let location = match &value {
            Some(value) => star.to(&value.location),
            None => star,
        };
        Ok(Node::new(
            ArgStar {
                value: value.map(boxed),
            },
            location,
        ))
    }

    pub fn on_arg_block(&mut self, value: Option<Node>) -> BuildResult {
        let ampersand = self.operator("&")?;
        let location = match &value {
            Some(value) => ampersand.to(&value.location),
            None => ampersand,
        };
        Ok(Node::new(
            ArgBlock {
                value: value.map(boxed),
            },
            location,
        ))
    }

    pub fn on_args_forward(&mut self) -> BuildResult {
        let location = self.operator("...")?;
        Ok(Node::new(ArgsForward {}, location))
    }

    pub fn on_super(&mut self, arguments: Node) -> BuildResult {
        let keyword = self.keyword("super")?;
        let location = keyword.to(&arguments.location);
        Ok(Node::new(
            Super {
                arguments: boxed(arguments),
            },
            location,
        ))
    }

    pub fn on_zsuper(&mut self) -> BuildResult {
        let keyword = self.keyword("super")?;
        Ok(Node::new(ZSuper {}, keyword))
    }

    pub fn on_yield(&mut self, arguments: Option<Node>) -> BuildResult {
        let keyword = self.keyword("yield")?;
        let location = match &arguments {
            Some(arguments) => keyword.to(&arguments.location),
            None => keyword,
        };
        Ok(Node::new(
            YieldNode {
                arguments: arguments.map(boxed),
            },
            location,
        ))
    }

    pub fn on_defined(&mut self, value: Node, parentheses: bool) -> BuildResult {
        let end = if parentheses {
            let rparen = self.find_any(TokenKind::RParen)?;
            self.find_any(TokenKind::LParen)?;
            rparen
        } else {
            value.location
        };
        let keyword = self.keyword("defined?")?;
        Ok(Node::new(
            Defined {
                value: boxed(value),
            },
            keyword.to(&end),
        ))
    }

    // ------------------------------------------------------------------
    // Operators and assignment
    // ------------------------------------------------------------------

    /// Binary operation; `and`, `or` and `not`-free keyword operators are claimed as keywords
    pub fn on_binary(&mut self, left: Node, operator: &str, right: Node) -> BuildResult {
        if matches!(operator, "and" | "or") {
            self.keyword(operator)?;
        } else {
            self.operator(operator)?;
        }
        let location = left.location.to(&right.location);
        Ok(Node::new(
            Binary {
                left: boxed(left),
                operator: operator.to_string(),
                right: boxed(right),
            },
            location,
        ))
    }

    pub fn on_unary(&mut self, operator: &str, statement: Node) -> BuildResult {
        let start = self.operator(operator)?;
        let location = start.to(&statement.location);
        Ok(Node::new(
            Unary {
                operator: operator.to_string(),
                statement: boxed(statement),
            },
            location,
        ))
    }

    pub fn on_not(&mut self, statement: Option<Node>, parentheses: bool) -> BuildResult {
        let end = if parentheses {
            let rparen = self.find_any(TokenKind::RParen)?;
            self.find_any(TokenKind::LParen)?;
            Some(rparen)
        } else {
            statement.as_ref().map(|statement| statement.location)
        };
        let keyword = self.keyword("not")?;
        let location = keyword.to(&end.unwrap_or(keyword));
        Ok(Node::new(
            Not {
                statement: statement.map(boxed),
                parentheses,
            },
            location,
        ))
    }

    pub fn on_ifop(&mut self, predicate: Node, truthy: Node, falsy: Node) -> BuildResult {
        self.operator(":")?;
        self.operator("?")?;
        let location = predicate.location.to(&falsy.location);
        Ok(Node::new(
            IfOp {
                predicate: boxed(predicate),
                truthy: boxed(truthy),
                falsy: boxed(falsy),
            },
            location,
        ))
    }

    pub fn on_assign(&mut self, target: Node, value: Node) -> BuildResult {
        self.operator("=")?;
        let location = target.location.to(&value.location);
        Ok(Node::new(
            Assign {
                target: boxed(target),
                value: boxed(value),
            },
            location,
        ))
    }

    /// Widen `a = 1` once `, 2` follows; a splatted value is already a list
    pub fn on_assign_mrhs(&self, assign: Assign, rest: Vec<Node>) -> Node {
        let Assign { target, value } = assign;
        let value = *value;
        let mut parts = match value.kind {
            NodeKind::Mrhs(mrhs) => mrhs.parts,
            kind => vec![Node { kind, ..value }],
        };
        parts.extend(rest);
        let value = self.on_mrhs(parts);
        let location = target.location.to(&value.location);
        Node::new(
            Assign {
                target,
                value: boxed(value),
            },
            location,
        )
    }

    pub fn on_opassign(&mut self, target: Node, operator: Node, value: Node) -> BuildResult {
        self.claim(&operator)?;
        let location = target.location.to(&value.location);
        Ok(Node::new(
            OpAssign {
                target: boxed(target),
                operator: boxed(operator),
                value: boxed(value),
            },
            location,
        ))
    }

    pub fn on_massign(&mut self, target: Node, value: Node) -> BuildResult {
        self.operator("=")?;
        let location = target.location.to(&value.location);
        Ok(Node::new(
            MAssign {
                target: boxed(target),
                value: boxed(value),
            },
            location,
        ))
    }

    pub fn on_mlhs(&self, parts: Vec<Node>, comma: bool) -> Node {
        let location = match (parts.first(), parts.last()) {
            (Some(first), Some(last)) => first.location.to(&last.location),
            _ => self.cursor,
        };
        Node::new(Mlhs { parts, comma }, location)
    }

    pub fn on_mlhs_paren(&mut self, contents: Node) -> BuildResult {
        let rparen = self.find_any(TokenKind::RParen)?;
        let lparen = self.find_any(TokenKind::LParen)?;
        Ok(Node::new(
            MlhsParen {
                contents: boxed(contents),
            },
            lparen.to(&rparen),
        ))
    }

    pub fn on_mrhs(&self, parts: Vec<Node>) -> Node {
        let location = match (parts.first(), parts.last()) {
            (Some(first), Some(last)) => first.location.to(&last.location),
            _ => self.cursor,
        };
        Node::new(Mrhs { parts }, location)
    }

    /// Parenthesized expression, parameter list or pattern
    pub fn on_paren(&mut self, contents: Option<Node>) -> BuildResult {
        let rparen = self.find_any(TokenKind::RParen)?;
        let (token, lparen) = self.find_token(TokenKind::LParen)?;
        let contents = match contents {
            Some(mut statements) if statements.is(NodeTag::Statements) => {
                self.bind(&mut statements, lparen.end_char, rparen.start_char);
                Some(statements)
            }
            other => other,
        };
        let opener = Node::new(LParen { value: token.value }, lparen);
        Ok(Node::new(
            Paren {
                lparen: boxed(opener),
                contents: contents.map(boxed),
            },
            lparen.to(&rparen),
        ))
    }

    // ------------------------------------------------------------------
    // Control flow
    // ------------------------------------------------------------------

    fn conditional(
        &mut self,
        keyword: &str,
        predicate: &Node,
        statements: &mut Node,
        consequent: Option<&Node>,
    ) -> Result<(Location, Location), ParseError> {
        let ending = self.keyword("end")?;
        let beginning = self.keyword(keyword)?;
        self.discard_keyword("then", &predicate.location);
        let end = consequent.map(Node::start_char).unwrap_or(ending.start_char);
        self.bind(statements, predicate.end_char(), end);
        Ok((beginning, ending))
    }

    pub fn on_if(&mut self, predicate: Node, mut statements: Node, consequent: Option<Node>) -> BuildResult {
        let (beginning, ending) =
            self.conditional("if", &predicate, &mut statements, consequent.as_ref())?;
        Ok(Node::new(
            IfNode {
                predicate: boxed(predicate),
                statements: boxed(statements),
                consequent: consequent.map(boxed),
                modifier: false,
            },
            beginning.to(&ending),
        ))
    }

    pub fn on_unless(
        &mut self,
        predicate: Node,
        mut statements: Node,
        consequent: Option<Node>,
    ) -> BuildResult {
        let (beginning, ending) =
            self.conditional("unless", &predicate, &mut statements, consequent.as_ref())?;
        Ok(Node::new(
            UnlessNode {
                predicate: boxed(predicate),
                statements: boxed(statements),
                consequent: consequent.map(boxed),
                modifier: false,
            },
            beginning.to(&ending),
        ))
    }

    fn modifier_body(&mut self, statement: Node) -> Node {
        let location = statement.location;
        let mut statements = Node::new(
            Statements {
                body: vec![statement],
            },
            location,
        );
        self.bind(&mut statements, location.start_char, location.end_char);
        statements
    }

    /// `statement if predicate`, `unless`, `while` and `until` modifiers
    pub fn on_modifier(&mut self, keyword: &str, statement: Node, predicate: Node) -> BuildResult {
        self.keyword(keyword)?;
        let location = statement.location.to(&predicate.location);
        let statements = boxed(self.modifier_body(statement));
        let predicate = boxed(predicate);
        let kind: NodeKind = match keyword {
            "if" => IfNode {
                predicate,
                statements,
                consequent: None,
                modifier: true,
            }
            .into(),
            "unless" => UnlessNode {
                predicate,
                statements,
                consequent: None,
                modifier: true,
            }
            .into(),
            "while" => WhileNode {
                predicate,
                statements,
                modifier: true,
            }
            .into(),
            _ => UntilNode {
                predicate,
                statements,
                modifier: true,
            }
            .into(),
        };
        Ok(Node::new(kind, location))
    }

    pub fn on_elsif(&mut self, predicate: Node, mut statements: Node, consequent: Option<Node>) -> BuildResult {
        let beginning = self.keyword("elsif")?;
        self.discard_keyword("then", &predicate.location);
        let end = match &consequent {
            Some(consequent) => consequent.start_char(),
            None => self
                .peek_keyword("end")
                .map(|ending| ending.start_char)
                .unwrap_or(statements.end_char()),
        };
        self.bind(&mut statements, predicate.end_char(), end);
        let end_location = consequent
            .as_ref()
            .map(|consequent| consequent.location)
            .unwrap_or(statements.location);
        Ok(Node::new(
            Elsif {
                predicate: boxed(predicate),
                statements: boxed(statements),
                consequent: consequent.map(boxed),
            },
            beginning.to(&end_location),
        ))
    }

    pub fn on_else(&mut self, mut statements: Node) -> BuildResult {
        let keyword = self.keyword("else")?;
        let end = self
            .peek_keyword("end")
            .map(|ending| ending.start_char)
            .unwrap_or(statements.end_char());
        self.bind(&mut statements, keyword.end_char, end);
        let location = keyword.to(&statements.location);
        let keyword_node = Node::new(
            Kw {
                value: "else".to_string(),
            },
            keyword,
        );
        Ok(Node::new(
            Else {
                keyword: boxed(keyword_node),
                statements: boxed(statements),
            },
            location,
        ))
    }

    pub fn on_while(&mut self, keyword: &str, predicate: Node, mut statements: Node) -> BuildResult {
        let ending = self.keyword("end")?;
        let beginning = self.keyword(keyword)?;
        self.discard_keyword("do", &predicate.location);
        self.bind(&mut statements, predicate.end_char(), ending.start_char);
        let predicate = boxed(predicate);
        let statements = boxed(statements);
        let kind: NodeKind = if keyword == "while" {
            WhileNode {
                predicate,
                statements,
                modifier: false,
            }
            .into()
        } else {
            UntilNode {
                predicate,
                statements,
                modifier: false,
            }
            .into()
        };
        Ok(Node::new(kind, beginning.to(&ending)))
    }

    pub fn on_for(&mut self, index: Node, collection: Node, mut statements: Node) -> BuildResult {
        let ending = self.keyword("end")?;
        self.discard_keyword("do", &collection.location);
        self.keyword("in")?;
        let beginning = self.keyword("for")?;
        self.bind(&mut statements, collection.end_char(), ending.start_char);
        Ok(Node::new(
            For {
                index: boxed(index),
                collection: boxed(collection),
                statements: boxed(statements),
            },
            beginning.to(&ending),
        ))
    }

    pub fn on_case(&mut self, value: Option<Node>, consequent: Node) -> BuildResult {
        let ending = self.keyword("end")?;
        let beginning = self.keyword("case")?;
        let keyword = Node::new(
            Kw {
                value: "case".to_string(),
            },
            beginning,
        );
        Ok(Node::new(
            Case {
                keyword: boxed(keyword),
                value: value.map(boxed),
                consequent: boxed(consequent),
            },
            beginning.to(&ending),
        ))
    }

    fn clause_end(&self, statements: &Node, consequent: Option<&Node>) -> usize {
        match consequent {
            Some(consequent) => consequent.start_char(),
            None => self
                .peek_keyword("end")
                .map(|ending| ending.start_char)
                .unwrap_or(statements.end_char()),
        }
    }

    pub fn on_when(&mut self, arguments: Node, mut statements: Node, consequent: Option<Node>) -> BuildResult {
        let beginning = self.keyword("when")?;
        self.discard_keyword("then", &arguments.location);
        let end = self.clause_end(&statements, consequent.as_ref());
        self.bind(&mut statements, arguments.end_char(), end);
        let end_location = consequent
            .as_ref()
            .map(|consequent| consequent.location)
            .unwrap_or(statements.location);
        Ok(Node::new(
            When {
                arguments: boxed(arguments),
                statements: boxed(statements),
                consequent: consequent.map(boxed),
            },
            beginning.to(&end_location),
        ))
    }

    pub fn on_in(&mut self, pattern: Node, mut statements: Node, consequent: Option<Node>) -> BuildResult {
        let beginning = self.keyword("in")?;
        self.discard_keyword("then", &pattern.location);
        let end = self.clause_end(&statements, consequent.as_ref());
        self.bind(&mut statements, pattern.end_char(), end);
        let end_location = consequent
            .as_ref()
            .map(|consequent| consequent.location)
            .unwrap_or(statements.location);
        Ok(Node::new(
            In {
                pattern: boxed(pattern),
                statements: boxed(statements),
                consequent: consequent.map(boxed),
            },
            beginning.to(&end_location),
        ))
    }

    pub fn on_rassign(&mut self, value: Node, operator: Node, pattern: Node) -> BuildResult {
        self.claim(&operator)?;
        let location = value.location.to(&pattern.location);
        Ok(Node::new(
            RAssign {
                value: boxed(value),
                operator: boxed(operator),
                pattern: boxed(pattern),
            },
            location,
        ))
    }

    pub fn on_begin(&mut self, mut bodystmt: Node) -> BuildResult {
        let ending = self.keyword("end")?;
        let beginning = self.keyword("begin")?;
        self.bind_bodystmt(&mut bodystmt, beginning.end_char, ending.start_char);
        Ok(Node::new(
            Begin {
                bodystmt: boxed(bodystmt),
            },
            beginning.to(&ending),
        ))
    }

    pub fn on_pinned_begin(&mut self, statement: Node) -> BuildResult {
        let rparen = self.find_any(TokenKind::RParen)?;
        self.find_any(TokenKind::LParen)?;
        let caret = self.operator("^")?;
        Ok(Node::new(
            PinnedBegin {
                statement: boxed(statement),
            },
            caret.to(&rparen),
        ))
    }

    /// A body with optional clauses; bound later by its owner
    pub fn on_bodystmt(
        &mut self,
        statements: Node,
        rescue_clause: Option<Node>,
        else_clause: Option<Node>,
        ensure_clause: Option<Node>,
    ) -> BuildResult {
        let else_keyword = match &else_clause {
            Some(_) => {
                let keyword = self.keyword("else")?;
                Some(boxed(Node::new(
                    Kw {
                        value: "else".to_string(),
                    },
                    keyword,
                )))
            }
            None => None,
        };
        let location = statements.location;
        Ok(Node::new(
            BodyStmt {
                statements: boxed(statements),
                rescue_clause: rescue_clause.map(boxed),
                else_keyword,
                else_clause: else_clause.map(boxed),
                ensure_clause: ensure_clause.map(boxed),
            },
            location,
        ))
    }

    pub fn on_rescue(
        &mut self,
        exception: Option<Node>,
        statements: Node,
        consequent: Option<Node>,
    ) -> BuildResult {
        let keyword = self.keyword("rescue")?;
        if let Some(exception) = &exception {
            self.discard_keyword("then", &exception.location);
        }
        let keyword_node = Node::new(
            Kw {
                value: "rescue".to_string(),
            },
            keyword,
        );
        let end = consequent
            .as_ref()
            .map(|consequent| consequent.location)
            .unwrap_or(statements.location);
        Ok(Node::new(
            Rescue {
                keyword: boxed(keyword_node),
                exception: exception.map(boxed),
                statements: boxed(statements),
                consequent: consequent.map(boxed),
            },
            keyword.to(&end),
        ))
    }

    pub fn on_rescue_ex(&mut self, exceptions: Option<Node>, variable: Option<Node>) -> BuildResult {
        if variable.is_some() {
            self.operator("=>")?;
        }
        let start = exceptions
            .as_ref()
            .or(variable.as_ref())
            .map(|node| node.location)
            .unwrap_or(self.cursor);
        let end = variable
            .as_ref()
            .or(exceptions.as_ref())
            .map(|node| node.location)
            .unwrap_or(start);
        Ok(Node::new(
            RescueEx {
                exceptions: exceptions.map(boxed),
                variable: variable.map(boxed),
            },
            start.to(&end),
        ))
    }

    pub fn on_rescue_mod(&mut self, statement: Node, value: Node) -> BuildResult {
        self.keyword("rescue")?;
        let location = statement.location.to(&value.location);
        Ok(Node::new(
            RescueMod {
                statement: boxed(statement),
                value: boxed(value),
            },
            location,
        ))
    }

    pub fn on_ensure(&mut self, mut statements: Node) -> BuildResult {
        let keyword = self.keyword("ensure")?;
        let end = self
            .peek_keyword("end")
            .map(|ending| ending.start_char)
            .unwrap_or(statements.end_char());
        self.bind(&mut statements, keyword.end_char, end);
        let location = keyword.to(&statements.location);
        let keyword_node = Node::new(
            Kw {
                value: "ensure".to_string(),
            },
            keyword,
        );
        Ok(Node::new(
            Ensure {
                keyword: boxed(keyword_node),
                statements: boxed(statements),
            },
            location,
        ))
    }

    /// `return`, `break` and `next`
    pub fn on_jump(&mut self, keyword: &str, arguments: Option<Node>) -> BuildResult {
        let start = self.keyword(keyword)?;
        let location = match &arguments {
            Some(arguments) => start.to(&arguments.location),
            None => start,
        };
        let arguments = arguments.map(boxed);
        let kind: NodeKind = match keyword {
            "return" => ReturnNode { arguments }.into(),
            "break" => Break { arguments }.into(),
            _ => Next { arguments }.into(),
        };
        Ok(Node::new(kind, location))
    }

    pub fn on_redo(&mut self) -> BuildResult {
        let location = self.keyword("redo")?;
        Ok(Node::new(Redo {}, location))
    }

    pub fn on_retry(&mut self) -> BuildResult {
        let location = self.keyword("retry")?;
        Ok(Node::new(Retry {}, location))
    }

    /// `BEGIN { ... }` and `END { ... }`
    pub fn on_program_hook(&mut self, keyword: &str, mut statements: Node) -> BuildResult {
        let rbrace = self.find_any(TokenKind::RBrace)?;
        let (token, lbrace) = self.find_token(TokenKind::LBrace)?;
        let beginning = self.keyword(keyword)?;
        self.bind(&mut statements, lbrace.end_char, rbrace.start_char);
        let lbrace = boxed(Node::new(LBrace { value: token.value }, lbrace));
        let statements = boxed(statements);
        let kind: NodeKind = if keyword == "BEGIN" {
            BeginBlock { lbrace, statements }.into()
        } else {
            EndBlock { lbrace, statements }.into()
        };
        Ok(Node::new(kind, beginning.to(&rbrace)))
    }

    pub fn on_alias(&mut self, left: Node, right: Node) -> BuildResult {
        self.claim(&left)?;
        self.claim(&right)?;
        let keyword = self.keyword("alias")?;
        let location = keyword.to(&right.location);
        Ok(Node::new(
            AliasNode {
                left: boxed(left),
                right: boxed(right),
            },
            location,
        ))
    }

    pub fn on_undef(&mut self, symbols: Vec<Node>) -> BuildResult {
        for symbol in &symbols {
            self.claim(symbol)?;
        }
        let keyword = self.keyword("undef")?;
        let end = symbols.last().map(|symbol| symbol.location).unwrap_or(keyword);
        Ok(Node::new(Undef { symbols }, keyword.to(&end)))
    }

    // ------------------------------------------------------------------
    // Definitions
    // ------------------------------------------------------------------

    /// Regular and singleton definitions; an endless one passes its expression as `body`
    pub fn on_def(
        &mut self,
        target: Option<Node>,
        operator: Option<Node>,
        name: Node,
        params: Option<Node>,
        mut body: Node,
    ) -> BuildResult {
        let endless = !body.is(NodeTag::BodyStmt);
        let ending = if endless {
            self.operator("=")?;
            body.location
        } else {
            self.keyword("end")?
        };
        if let Some(operator) = &operator {
            self.claim(operator)?;
        }
        self.claim(&name)?;
        let beginning = self.keyword("def")?;
        if !endless {
            let start = params
                .as_ref()
                .map(Node::end_char)
                .unwrap_or(name.end_char());
            self.bind_bodystmt(&mut body, start, ending.start_char);
        }
        Ok(Node::new(
            DefNode {
                target: target.map(boxed),
                operator: operator.map(boxed),
                name: boxed(name),
                params: params.map(boxed),
                bodystmt: boxed(body),
            },
            beginning.to(&ending),
        ))
    }

    pub fn on_class(
        &mut self,
        constant: Node,
        superclass: Option<Node>,
        mut bodystmt: Node,
    ) -> BuildResult {
        let ending = self.keyword("end")?;
        if superclass.is_some() {
            self.operator("<")?;
        }
        let beginning = self.keyword("class")?;
        let start = superclass
            .as_ref()
            .map(Node::end_char)
            .unwrap_or(constant.end_char());
        self.bind_bodystmt(&mut bodystmt, start, ending.start_char);
        Ok(Node::new(
            ClassDeclaration {
                constant: boxed(constant),
                superclass: superclass.map(boxed),
                bodystmt: boxed(bodystmt),
            },
            beginning.to(&ending),
        ))
    }

    pub fn on_sclass(&mut self, target: Node, mut bodystmt: Node) -> BuildResult {
        let ending = self.keyword("end")?;
        self.operator("<<")?;
        let beginning = self.keyword("class")?;
        self.bind_bodystmt(&mut bodystmt, target.end_char(), ending.start_char);
        Ok(Node::new(
            SClass {
                target: boxed(target),
                bodystmt: boxed(bodystmt),
            },
            beginning.to(&ending),
        ))
    }

    pub fn on_module(&mut self, constant: Node, mut bodystmt: Node) -> BuildResult {
        let ending = self.keyword("end")?;
        let beginning = self.keyword("module")?;
        self.bind_bodystmt(&mut bodystmt, constant.end_char(), ending.start_char);
        Ok(Node::new(
            ModuleDeclaration {
                constant: boxed(constant),
                bodystmt: boxed(bodystmt),
            },
            beginning.to(&ending),
        ))
    }

    #[allow(clippy::too_many_arguments)]
    pub fn on_params(
        &self,
        requireds: Vec<Node>,
        optionals: Vec<Node>,
        rest: Option<Node>,
        posts: Vec<Node>,
        keywords: Vec<Node>,
        keyword_rest: Option<Node>,
        block: Option<Node>,
    ) -> Node {
        let mut locations: Vec<Location> = Vec::new();
        locations.extend(requireds.iter().map(|node| node.location));
        locations.extend(optionals.iter().map(|node| node.location));
        locations.extend(rest.iter().map(|node| node.location));
        locations.extend(posts.iter().map(|node| node.location));
        locations.extend(keywords.iter().map(|node| node.location));
        locations.extend(keyword_rest.iter().map(|node| node.location));
        locations.extend(block.iter().map(|node| node.location));

        let location = match (
            locations.iter().min_by_key(|location| location.start_char),
            locations.iter().max_by_key(|location| location.end_char),
        ) {
            (Some(first), Some(last)) => first.to(last),
            _ => {
                let at = self.cursor;
                Location::fixed(at.end_line, at.end_char, at.end_column)
            }
        };
        Node::new(
            Params {
                requireds,
                optionals,
                rest: rest.map(boxed),
                posts,
                keywords,
                keyword_rest: keyword_rest.map(boxed),
                block: block.map(boxed),
            },
            location,
        )
    }

    pub fn on_optional_param(&mut self, name: Node, value: Node) -> BuildResult {
        self.operator("=")?;
        let location = name.location.to(&value.location);
        Ok(Node::new(
            OptionalParam {
                name: boxed(name),
                value: boxed(value),
            },
            location,
        ))
    }

    pub fn on_keyword_param(&self, name: Node, value: Option<Node>) -> Node {
        let location = match &value {
            Some(value) => name.location.to(&value.location),
            None => name.location,
        };
        Node::new(
            KeywordParam {
                name: boxed(name),
                value: value.map(boxed),
            },
            location,
        )
    }

    pub fn on_rest_param(&mut self, name: Option<Node>) -> BuildResult {
        let star = self.operator("*")?;
        let location = name.as_ref().map(|name| star.to(&name.location)).unwrap_or(star);
        Ok(Node::new(RestParam { name: name.map(boxed) }, location))
    }

    pub fn on_kwrest_param(&mut self, name: Option<Node>) -> BuildResult {
        let stars = self.operator("**")?;
        let location = name.as_ref().map(|name| stars.to(&name.location)).unwrap_or(stars);
        Ok(Node::new(KwRestParam { name: name.map(boxed) }, location))
    }

    pub fn on_nokw_rest(&mut self) -> BuildResult {
        let nil = self.keyword("nil")?;
        let stars = self.operator("**")?;
        Ok(Node::new(NoKwRest {}, stars.to(&nil)))
    }

    pub fn on_blockarg(&mut self, name: Option<Node>) -> BuildResult {
        let ampersand = self.operator("&")?;
        let location = name
            .as_ref()
            .map(|name| ampersand.to(&name.location))
            .unwrap_or(ampersand);
        Ok(Node::new(BlockArg { name: name.map(boxed) }, location))
    }

    pub fn on_excessed_comma(&self, comma: &Token) -> Node {
        Node::new(ExcessedComma {}, self.location_of(comma))
    }

    // ------------------------------------------------------------------
    // Patterns
    // ------------------------------------------------------------------

    /// Closing and opening delimiters of a bracketed pattern
    fn pattern_bounds(
        &mut self,
        delimiters: Option<(TokenKind, TokenKind)>,
    ) -> Result<Option<(Location, Location)>, ParseError> {
        match delimiters {
            Some((open, close)) => {
                let closing = self.find_any(close)?;
                let opening = self.find_any(open)?;
                Ok(Some((opening, closing)))
            }
            None => Ok(None),
        }
    }

    fn pattern_location(
        &self,
        constant: Option<&Node>,
        bounds: Option<(Location, Location)>,
        parts: &[Location],
    ) -> Location {
        let start = constant
            .map(|constant| constant.location)
            .or(bounds.map(|(opening, _)| opening))
            .or(parts.iter().min_by_key(|location| location.start_char).copied())
            .unwrap_or(self.cursor);
        let end = bounds
            .map(|(_, closing)| closing)
            .or(parts.iter().max_by_key(|location| location.end_char).copied())
            .unwrap_or(start);
        start.to(&end)
    }

    pub fn on_aryptn(
        &mut self,
        constant: Option<Node>,
        requireds: Vec<Node>,
        rest: Option<Node>,
        posts: Vec<Node>,
        delimiters: Option<(TokenKind, TokenKind)>,
    ) -> BuildResult {
        let bounds = self.pattern_bounds(delimiters)?;
        let parts: Vec<Location> = requireds
            .iter()
            .chain(rest.iter())
            .chain(posts.iter())
            .map(|node| node.location)
            .collect();
        let location = self.pattern_location(constant.as_ref(), bounds, &parts);
        Ok(Node::new(
            AryPtn {
                constant: constant.map(boxed),
                requireds,
                rest: rest.map(boxed),
                posts,
            },
            location,
        ))
    }

    pub fn on_hshptn(
        &mut self,
        constant: Option<Node>,
        keywords: Vec<Node>,
        keyword_rest: Option<Node>,
        delimiters: Option<(TokenKind, TokenKind)>,
    ) -> BuildResult {
        let bounds = self.pattern_bounds(delimiters)?;
        let parts: Vec<Location> = keywords
            .iter()
            .chain(keyword_rest.iter())
            .map(|node| node.location)
            .collect();
        let location = self.pattern_location(constant.as_ref(), bounds, &parts);
        Ok(Node::new(
            HshPtn {
                constant: constant.map(boxed),
                keywords,
                keyword_rest: keyword_rest.map(boxed),
            },
            location,
        ))
    }

    pub fn on_fndptn(
        &mut self,
        constant: Option<Node>,
        left: Node,
        values: Vec<Node>,
        right: Node,
        delimiters: Option<(TokenKind, TokenKind)>,
    ) -> BuildResult {
        let bounds = self.pattern_bounds(delimiters)?;
        let parts = vec![left.location, right.location];
        let location = self.pattern_location(constant.as_ref(), bounds, &parts);
        Ok(Node::new(
            FndPtn {
                constant: constant.map(boxed),
                left: boxed(left),
                values,
                right: boxed(right),
            },
            location,
        ))
    }

    /// `*name` or a bare `*` inside an array or find pattern
    pub fn on_splat_pattern(&mut self, name: Option<Node>) -> BuildResult {
        let star = self.operator("*")?;
        let location = name.as_ref().map(|name| star.to(&name.location)).unwrap_or(star);
        Ok(Node::new(VarField { value: name.map(boxed) }, location))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan_all<'a>(builder: &mut TreeBuilder<'a>, source: &'a str) -> Vec<Node> {
        super::super::lexer::tokenize(source)
            .unwrap()
            .iter()
            .filter_map(|token| builder.scan(token))
            .collect()
    }

    #[test]
    fn value_tokens_become_leaves() {
        let source = "foo + 1";
        let mut builder = TreeBuilder::new(source);
        let leaves = scan_all(&mut builder, source);
        assert_eq!(leaves.len(), 3);
        assert!(leaves[0].is(NodeTag::Ident));
        assert!(leaves[1].is(NodeTag::Op));
        assert_eq!(leaves[2].location.start_char, 6);
        assert_eq!(builder.state().ledger.len(), 1);
    }

    #[test]
    fn comments_record_whether_code_precedes_them() {
        let source = "# own line\nfoo # trailing\n";
        let mut builder = TreeBuilder::new(source);
        scan_all(&mut builder, source);
        let comments = &builder.state().comments;
        assert_eq!(comments.len(), 2);
        assert!(!comments[0].inline);
        assert!(comments[1].inline);
        assert_eq!(comments[1].value, "# trailing");
    }

    #[test]
    fn binding_splices_own_line_comments() {
        let source = "a\n# note\nb\n";
        let mut builder = TreeBuilder::new(source);
        let leaves = scan_all(&mut builder, source);
        let body: Vec<Node> = leaves.into_iter().map(|leaf| builder.on_vcall(leaf)).collect();
        let mut statements = builder.on_stmts(body);
        builder.bind(&mut statements, 0, source.len());

        let NodeKind::Statements(inner) = &statements.kind else {
            panic!("expected statements");
        };
        let tags: Vec<NodeTag> = inner.body.iter().map(Node::tag).collect();
        assert_eq!(tags, vec![NodeTag::VCall, NodeTag::CommentNode, NodeTag::VCall]);
        assert!(builder.state().comments.is_empty());
    }

    #[test]
    fn ledger_misses_abort() {
        let source = "1";
        let mut builder = TreeBuilder::new(source);
        scan_all(&mut builder, source);
        let err = builder.on_arg_paren(None).unwrap_err();
        assert_eq!(err.message, "Cannot find expected rparen");
    }

    #[test]
    fn squiggly_heredocs_measure_indentation() {
        assert_eq!(dedent_width("    a\n  b\n\n"), 2);
        assert_eq!(dedent_width("\tx\n"), 8);
        assert_eq!(dedent_width(""), 0);
    }
}
