//! Recursive-descent grammar driver
//!
//! The parser pulls tokens from the [`Lexer`], decides which production
//! applies and hands every consumed token to the [`TreeBuilder`], which owns
//! node construction. Productions are always invoked children first, so the
//! builder can claim keywords and delimiters from its ledger innermost-first.
//!
//! Comments are never part of the lookahead: they are scanned into the
//! builder as soon as the tokenizer produces them.

mod definitions;
mod expressions;
mod literals;
mod patterns;
mod statements;

use std::collections::VecDeque;

use super::builder::TreeBuilder;
use super::lexer::Lexer;
use super::node::Node;
use super::token::{Token, TokenKind};
use crate::error::ParseError;

/// Deepest expression nesting accepted before giving up
pub const MAX_DEPTH: usize = 1024;

type PResult<T> = Result<T, ParseError>;

/// Parse a complete program
pub fn parse(source: &str) -> Result<Node, ParseError> {
    Parser::new(source).parse_program()
}

/// Context flags that change how the next expression is read
#[derive(Debug, Clone, Copy, Default)]
struct Restrictions {
    /// A `do` belongs to an enclosing `while`, `until`, `for` or command
    no_do: bool,
    /// A `|` closes block parameters or separates pattern alternatives
    no_pipe: bool,
    /// The expression is an assignment target, not an assignment
    no_assign: bool,
}

pub struct Parser<'src> {
    lexer: Lexer<'src>,
    builder: TreeBuilder<'src>,
    lookahead: VecDeque<Token>,
    restrictions: Restrictions,
    depth: usize,
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            lexer: Lexer::new(source),
            builder: TreeBuilder::new(source),
            lookahead: VecDeque::new(),
            restrictions: Restrictions::default(),
            depth: 0,
        }
    }

    pub fn parse_program(mut self) -> Result<Node, ParseError> {
        let statements = self.parse_statements()?;
        if !self.at(TokenKind::Eof)? {
            return Err(self.error_here());
        }
        self.bump()?;
        Ok(self.builder.on_program(statements))
    }

    // ------------------------------------------------------------------
    // Token plumbing
    // ------------------------------------------------------------------

    fn fill(&mut self, count: usize) -> PResult<()> {
        while self.lookahead.len() < count {
            let token = self.lexer.next_token()?;
            match token.kind {
                TokenKind::Comment | TokenKind::EmbDoc | TokenKind::EndContent => {
                    self.builder.scan(&token);
                }
                _ => self.lookahead.push_back(token),
            }
        }
        Ok(())
    }

    fn peek_nth(&mut self, n: usize) -> PResult<&Token> {
        self.fill(n + 1)?;
        self.lookahead
            .get(n)
            .ok_or_else(|| ParseError::new("syntax error, unexpected end-of-input", 0, 0))
    }

    fn peek(&mut self) -> PResult<&Token> {
        self.peek_nth(0)
    }

    fn peek_kind(&mut self) -> PResult<TokenKind> {
        Ok(self.peek()?.kind)
    }

    fn at(&mut self, kind: TokenKind) -> PResult<bool> {
        Ok(self.peek()?.kind == kind)
    }

    fn at_kw(&mut self, value: &str) -> PResult<bool> {
        Ok(self.peek()?.is_kw(value))
    }

    fn at_op(&mut self, value: &str) -> PResult<bool> {
        Ok(self.peek()?.is_op(value))
    }

    /// Consume the next token, returning it with its leaf node if it has one
    fn bump(&mut self) -> PResult<(Token, Option<Node>)> {
        self.fill(1)?;
        let token = self
            .lookahead
            .pop_front()
            .ok_or_else(|| ParseError::new("syntax error, unexpected end-of-input", 0, 0))?;
        let node = self.builder.scan(&token);
        Ok((token, node))
    }

    /// Consume a value token as a leaf node
    fn leaf(&mut self) -> PResult<Node> {
        let (token, node) = self.bump()?;
        node.ok_or_else(|| self.unexpected(&token))
    }

    fn eat(&mut self, kind: TokenKind) -> PResult<bool> {
        if self.at(kind)? {
            self.bump()?;
            return Ok(true);
        }
        Ok(false)
    }

    fn eat_kw(&mut self, value: &str) -> PResult<bool> {
        if self.at_kw(value)? {
            self.bump()?;
            return Ok(true);
        }
        Ok(false)
    }

    fn expect(&mut self, kind: TokenKind) -> PResult<Token> {
        if self.at(kind)? {
            return Ok(self.bump()?.0);
        }
        Err(self.error_here())
    }

    fn expect_kw(&mut self, value: &str) -> PResult<Token> {
        if self.at_kw(value)? {
            return Ok(self.bump()?.0);
        }
        Err(self.error_here())
    }

    fn expect_op(&mut self, value: &str) -> PResult<Token> {
        if self.at_op(value)? {
            return Ok(self.bump()?.0);
        }
        Err(self.error_here())
    }

    fn skip_newlines(&mut self) -> PResult<()> {
        while self.eat(TokenKind::Newline)? {}
        Ok(())
    }

    /// Skip statement separators: newlines and semicolons
    fn skip_terms(&mut self) -> PResult<()> {
        while matches!(
            self.peek_kind()?,
            TokenKind::Newline | TokenKind::Semicolon
        ) {
            self.bump()?;
        }
        Ok(())
    }

    fn unexpected(&self, token: &Token) -> ParseError {
        let location = self.builder.location_of(token);
        let message = match token.kind {
            TokenKind::Eof | TokenKind::Newline => {
                format!("syntax error, unexpected {}", token.kind.describe())
            }
            _ => format!(
                "syntax error, unexpected {} '{}'",
                token.kind.describe(),
                token.value
            ),
        };
        ParseError::new(message, location.start_line, location.start_column)
    }

    fn error_here(&mut self) -> ParseError {
        match self.peek() {
            Ok(token) => {
                let token = token.clone();
                self.unexpected(&token)
            }
            Err(error) => error,
        }
    }

    // ------------------------------------------------------------------
    // Context
    // ------------------------------------------------------------------

    fn enter(&mut self) -> PResult<()> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            let at = self.builder.cursor();
            return Err(ParseError::new(
                format!("nesting too deep (more than {MAX_DEPTH} levels)"),
                at.start_line,
                at.start_column,
            ));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Run `parse` with `restrictions` in place, restoring the previous ones after
    fn restricted<T>(
        &mut self,
        restrictions: Restrictions,
        parse: impl FnOnce(&mut Self) -> PResult<T>,
    ) -> PResult<T> {
        let saved = std::mem::replace(&mut self.restrictions, restrictions);
        let result = parse(self);
        self.restrictions = saved;
        result
    }

    /// Brackets reset every restriction
    fn nested<T>(&mut self, parse: impl FnOnce(&mut Self) -> PResult<T>) -> PResult<T> {
        self.restricted(Restrictions::default(), parse)
    }

    fn without_do<T>(&mut self, parse: impl FnOnce(&mut Self) -> PResult<T>) -> PResult<T> {
        let restrictions = Restrictions {
            no_do: true,
            ..self.restrictions
        };
        self.restricted(restrictions, parse)
    }

    /// Run `parse` inside a fresh local variable scope
    fn scoped<T>(
        &mut self,
        inherit: bool,
        parse: impl FnOnce(&mut Self) -> PResult<T>,
    ) -> PResult<T> {
        self.lexer.push_scope(inherit);
        let result = parse(self);
        self.lexer.pop_scope();
        result
    }

    fn declare(&mut self, name: &str) {
        self.lexer.declare(name.trim_end_matches(':'));
    }
}

/// Tokens that close a statement list
fn is_terminator(token: &Token) -> bool {
    match token.kind {
        TokenKind::Eof
        | TokenKind::RBrace
        | TokenKind::RParen
        | TokenKind::RBracket
        | TokenKind::EmbExprEnd => true,
        TokenKind::Kw => matches!(
            token.value.as_str(),
            "end" | "else" | "elsif" | "when" | "in" | "rescue" | "ensure" | "then" | "do"
        ),
        _ => false,
    }
}

/// Keywords that begin a value
const VALUE_KEYWORDS: &[&str] = &[
    "nil",
    "true",
    "false",
    "self",
    "not",
    "defined?",
    "__FILE__",
    "__LINE__",
    "__ENCODING__",
    "super",
    "yield",
    "case",
    "begin",
    "def",
];

/// Whether `token` can begin an operand
fn starts_value(token: &Token) -> bool {
    match token.kind {
        TokenKind::Ident
        | TokenKind::Const
        | TokenKind::IVar
        | TokenKind::CVar
        | TokenKind::GVar
        | TokenKind::Backref
        | TokenKind::Int
        | TokenKind::Float
        | TokenKind::Rational
        | TokenKind::Imaginary
        | TokenKind::Char
        | TokenKind::TStringBeg
        | TokenKind::SymBeg
        | TokenKind::RegexpBeg
        | TokenKind::Backtick
        | TokenKind::HeredocBeg
        | TokenKind::WordsBeg
        | TokenKind::QWordsBeg
        | TokenKind::SymbolsBeg
        | TokenKind::QSymbolsBeg
        | TokenKind::LParen
        | TokenKind::LBracket
        | TokenKind::LBrace
        | TokenKind::TLambda => true,
        TokenKind::Kw => VALUE_KEYWORDS.contains(&token.value.as_str()),
        TokenKind::Op => matches!(
            token.value.as_str(),
            "-" | "+" | "!" | "~" | "::" | ".." | "*"
        ),
        _ => false,
    }
}

#[cfg(test)]
mod tests;
