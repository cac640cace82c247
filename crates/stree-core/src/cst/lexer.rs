//! Ruby tokenizer
//!
//! A pull tokenizer that tracks just enough lexer state to settle Ruby's
//! whitespace-sensitive ambiguities: `foo -1` versus `foo - 1`, `foo [1]`
//! versus `foo[1]`, `/` as regexp or division, `{` as hash or block, `?a`
//! character literals, `:sym` versus a ternary colon, `%w[]` versus modulo,
//! `<<~EOS` versus a shift, and labels.
//!
//! String-like literals run on a mode stack so that `#{}` interpolation can
//! nest code inside them. Heredoc bodies are lexed as soon as the opener is
//! seen: their tokens follow the `HeredocBeg` token directly, then the rest
//! of the opening line is lexed, and the consumed body is skipped when that
//! line's newline is reached.
//!
//! Whether an identifier is a local variable changes how the next token is
//! read. The grammar driver declares locals through [`Lexer::declare`] and
//! opens scopes with [`Lexer::push_scope`].

use super::token::{Token, TokenKind};
use crate::error::ParseError;
use std::collections::{HashSet, VecDeque};

/// Where the tokenizer is within an expression
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexState {
    /// Expecting an operand, e.g. at the start of a statement or after an operator
    Beg,
    /// After `return`, `break`, `next` and `rescue`
    Mid,
    /// After a method name that may take arguments without parentheses
    Arg,
    /// After a complete operand
    End,
    /// Expecting a method name, after `def`, `alias`, `undef` or `:`
    Fname,
    /// After `.`, `&.` or `::`
    Dot,
    /// Expecting an operand where a `label:` may appear
    Label,
}

impl LexState {
    fn is_beg(self) -> bool {
        matches!(self, LexState::Beg | LexState::Mid | LexState::Label)
    }

    fn allows_label(self) -> bool {
        matches!(self, LexState::Label | LexState::Arg | LexState::Mid)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LiteralKind {
    String,
    XString,
    Symbol,
    Regexp,
    Words,
}

#[derive(Debug, Clone)]
struct Literal {
    kind: LiteralKind,
    open: Option<u8>,
    close: u8,
    nesting: usize,
    interpolate: bool,
    label_ok: bool,
}

#[derive(Debug, Clone)]
struct HeredocBody {
    terminator: String,
    indented_end: bool,
    interpolate: bool,
}

#[derive(Debug, Clone)]
enum Mode {
    Literal(Literal),
    Heredoc(HeredocBody),
    /// Code inside `#{}`
    Interpolation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Brace {
    Plain,
    Lambda,
    EmbExpr,
}

#[derive(Debug, Clone, Copy)]
struct Resume {
    pos: usize,
    line: usize,
}

#[derive(Debug, Default)]
struct Scope {
    names: HashSet<String>,
    inherit: bool,
}

const KEYWORDS: &[&str] = &[
    "__ENCODING__",
    "__LINE__",
    "__FILE__",
    "BEGIN",
    "END",
    "alias",
    "and",
    "begin",
    "break",
    "case",
    "class",
    "def",
    "defined?",
    "do",
    "else",
    "elsif",
    "end",
    "ensure",
    "false",
    "for",
    "if",
    "in",
    "module",
    "next",
    "nil",
    "not",
    "or",
    "redo",
    "rescue",
    "retry",
    "return",
    "self",
    "super",
    "then",
    "true",
    "undef",
    "unless",
    "until",
    "when",
    "while",
    "yield",
];

pub fn is_keyword(word: &str) -> bool {
    KEYWORDS.contains(&word)
}

fn keyword_state(word: &str) -> LexState {
    match word {
        "end" | "self" | "nil" | "true" | "false" | "__FILE__" | "__LINE__" | "__ENCODING__"
        | "redo" | "retry" => LexState::End,
        "def" | "alias" | "undef" => LexState::Fname,
        "return" | "break" | "next" | "rescue" => LexState::Mid,
        "super" | "yield" | "defined?" => LexState::Arg,
        "in" => LexState::Label,
        _ => LexState::Beg,
    }
}

fn is_ident_start(byte: u8) -> bool {
    byte.is_ascii_alphabetic() || byte == b'_' || byte >= 0x80
}

fn is_ident_char(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_' || byte >= 0x80
}

fn is_space(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\r' | b'\x0b' | b'\x0c')
}

fn closing_delimiter(open: u8) -> Option<u8> {
    match open {
        b'(' => Some(b')'),
        b'[' => Some(b']'),
        b'{' => Some(b'}'),
        b'<' => Some(b'>'),
        _ => None,
    }
}

pub struct Lexer<'src> {
    source: &'src str,
    bytes: &'src [u8],
    pos: usize,
    line: usize,
    line_start: usize,
    state: LexState,
    space_seen: bool,
    /// Between `def` and the end of the method name
    in_def: bool,
    /// `alias` has read its first name and expects a second one
    alias_pending: bool,
    modes: Vec<Mode>,
    braces: Vec<Brace>,
    paren_depth: usize,
    lambda_depths: Vec<usize>,
    heredoc_resume: Option<Resume>,
    pending: VecDeque<Token>,
    scopes: Vec<Scope>,
    done: bool,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            pos: 0,
            line: 1,
            line_start: 0,
            state: LexState::Beg,
            space_seen: false,
            in_def: false,
            alias_pending: false,
            modes: Vec::new(),
            braces: Vec::new(),
            paren_depth: 0,
            lambda_depths: Vec::new(),
            heredoc_resume: None,
            pending: VecDeque::new(),
            scopes: vec![Scope::default()],
            done: false,
        }
    }

    pub fn state(&self) -> LexState {
        self.state
    }

    /// Open a local variable scope; blocks inherit outer locals, definitions do not
    pub fn push_scope(&mut self, inherit: bool) {
        self.scopes.push(Scope {
            names: HashSet::new(),
            inherit,
        });
    }

    pub fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    pub fn declare(&mut self, name: &str) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.names.insert(name.to_string());
        }
    }

    pub fn is_local(&self, name: &str) -> bool {
        for scope in self.scopes.iter().rev() {
            if scope.names.contains(name) {
                return true;
            }
            if !scope.inherit {
                break;
            }
        }
        false
    }

    pub fn next_token(&mut self) -> Result<Token, ParseError> {
        while self.pending.is_empty() {
            if self.done {
                return Ok(self.eof_token());
            }
            self.step()?;
        }
        // The loop above only exits with a queued token
        Ok(self.pending.pop_front().unwrap_or_else(|| self.eof_token()))
    }

    fn eof_token(&self) -> Token {
        Token::new(TokenKind::Eof, "", self.line, self.pos - self.line_start)
    }

    fn error(&self, message: impl Into<String>, pos: usize) -> ParseError {
        let line_start = self.source[..pos.min(self.source.len())]
            .rfind('\n')
            .map(|index| index + 1)
            .unwrap_or(0);
        let line = self.source[..line_start].matches('\n').count() + 1;
        let column = self.source[line_start..pos.min(self.source.len())]
            .chars()
            .count();
        ParseError::new(message, line, column)
    }

    fn peek(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn at_eof(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn starts_with(&self, text: &str) -> bool {
        self.source[self.pos..].starts_with(text)
    }

    /// Advance one byte, tracking line starts
    fn bump(&mut self) {
        if let Some(byte) = self.peek(0) {
            self.pos += 1;
            if byte == b'\n' {
                self.line += 1;
                self.line_start = self.pos;
            }
        }
    }

    fn bump_n(&mut self, count: usize) {
        for _ in 0..count {
            self.bump();
        }
    }

    /// Emit a token spanning `start..self.pos`, which began at `line`/`column`
    fn push(&mut self, kind: TokenKind, start: usize, line: usize, column: usize) {
        let value = self.source[start..self.pos].to_string();
        self.push_value(kind, value, line, column);
    }

    fn push_value(&mut self, kind: TokenKind, value: String, line: usize, column: usize) {
        let token = Token {
            kind,
            value,
            line,
            column,
            end_line: self.line,
            end_column: self.pos - self.line_start,
            space_before: self.space_seen,
        };
        self.space_seen = false;
        self.pending.push_back(token);
    }

    fn step(&mut self) -> Result<(), ParseError> {
        match self.modes.last() {
            Some(Mode::Literal(_)) => self.lex_literal(),
            Some(Mode::Heredoc(_)) => self.lex_heredoc_body(),
            _ => self.lex_code(),
        }
    }

    fn in_literal(&self) -> bool {
        self.modes
            .iter()
            .any(|mode| !matches!(mode, Mode::Interpolation))
    }

    // ------------------------------------------------------------------
    // Code
    // ------------------------------------------------------------------

    fn skip_whitespace(&mut self) {
        loop {
            match self.peek(0) {
                Some(byte) if is_space(byte) => {
                    self.bump();
                    self.space_seen = true;
                }
                Some(b'\\') if self.peek(1) == Some(b'\n') => {
                    self.bump_n(2);
                    self.space_seen = true;
                }
                Some(b'\\') if self.peek(1) == Some(b'\r') && self.peek(2) == Some(b'\n') => {
                    self.bump_n(3);
                    self.space_seen = true;
                }
                _ => break,
            }
        }
    }

    fn lex_code(&mut self) -> Result<(), ParseError> {
        self.skip_whitespace();

        if self.at_eof() {
            if self.in_literal() {
                return Err(self.error("unterminated string meets end of file", self.pos));
            }
            self.push_value(
                TokenKind::Eof,
                String::new(),
                self.line,
                self.pos - self.line_start,
            );
            self.done = true;
            return Ok(());
        }

        let start = self.pos;
        let line = self.line;
        let column = self.pos - self.line_start;

        if start == self.line_start {
            if self.starts_with("=begin")
                && self.peek(6).is_none_or(|byte| is_space(byte) || byte == b'\n')
            {
                return self.lex_embdoc();
            }
            if self.starts_with("__END__") && self.is_end_marker() {
                return self.lex_end_content();
            }
        }

        let Some(byte) = self.peek(0) else {
            return Ok(());
        };

        match byte {
            b'\n' => self.lex_newline(),
            b'#' => {
                while let Some(byte) = self.peek(0) {
                    if byte == b'\n' {
                        break;
                    }
                    self.bump();
                }
                let value = self.source[start..self.pos].trim_end().to_string();
                let space_seen = self.space_seen;
                self.push_value(TokenKind::Comment, value, line, column);
                if let Some(token) = self.pending.back_mut() {
                    token.end_column = column + token.value.len();
                }
                // Comments are invisible to spacing decisions
                self.space_seen = space_seen;
                Ok(())
            }
            b'0'..=b'9' => self.lex_number(start, line, column),
            b'"' | b'\'' => {
                self.bump();
                let label_ok = self.state.allows_label();
                self.push(TokenKind::TStringBeg, start, line, column);
                self.modes.push(Mode::Literal(Literal {
                    kind: LiteralKind::String,
                    open: None,
                    close: byte,
                    nesting: 0,
                    interpolate: byte == b'"',
                    label_ok,
                }));
                Ok(())
            }
            b'`' if !matches!(self.state, LexState::Fname | LexState::Dot) => {
                self.bump();
                self.push(TokenKind::Backtick, start, line, column);
                self.modes.push(Mode::Literal(Literal {
                    kind: LiteralKind::XString,
                    open: None,
                    close: b'`',
                    nesting: 0,
                    interpolate: true,
                    label_ok: false,
                }));
                Ok(())
            }
            b'@' => self.lex_instance_variable(start, line, column),
            b'$' => self.lex_global_variable(start, line, column),
            b':' => self.lex_colon(start, line, column),
            b'?' => self.lex_question(start, line, column),
            b'%' => self.lex_percent(start, line, column),
            b'/' => {
                let value_position = self.state.is_beg()
                    || (self.state == LexState::Arg
                        && self.space_seen
                        && !self.peek(1).is_none_or(|byte| is_space(byte) || byte == b'='));
                if value_position {
                    self.bump();
                    self.push(TokenKind::RegexpBeg, start, line, column);
                    self.modes.push(Mode::Literal(Literal {
                        kind: LiteralKind::Regexp,
                        open: None,
                        close: b'/',
                        nesting: 0,
                        interpolate: true,
                        label_ok: false,
                    }));
                    Ok(())
                } else {
                    self.lex_operator(start, line, column)
                }
            }
            b'<' if self.heredoc_ahead() => self.lex_heredoc_beg(start, line, column),
            b'(' => {
                self.bump();
                self.paren_depth += 1;
                self.push(TokenKind::LParen, start, line, column);
                self.state = LexState::Label;
                Ok(())
            }
            b')' => {
                self.bump();
                self.paren_depth = self.paren_depth.saturating_sub(1);
                self.push(TokenKind::RParen, start, line, column);
                self.state = LexState::End;
                Ok(())
            }
            b'[' => {
                if self.state == LexState::Fname && self.peek(1) == Some(b']') {
                    let count = if self.peek(2) == Some(b'=') { 3 } else { 2 };
                    self.bump_n(count);
                    self.push(TokenKind::Op, start, line, column);
                    self.state = LexState::Arg;
                    self.in_def = false;
                    return Ok(());
                }
                self.bump();
                self.push(TokenKind::LBracket, start, line, column);
                self.state = LexState::Label;
                Ok(())
            }
            b']' => {
                self.bump();
                self.push(TokenKind::RBracket, start, line, column);
                self.state = LexState::End;
                Ok(())
            }
            b'{' => {
                self.bump();
                if self.lambda_depths.last() == Some(&self.paren_depth) {
                    self.lambda_depths.pop();
                    self.braces.push(Brace::Lambda);
                    self.push(TokenKind::TLamBeg, start, line, column);
                } else {
                    self.braces.push(Brace::Plain);
                    self.push(TokenKind::LBrace, start, line, column);
                }
                self.state = LexState::Label;
                Ok(())
            }
            b'}' => {
                self.bump();
                match self.braces.pop() {
                    Some(Brace::EmbExpr) => {
                        if matches!(self.modes.last(), Some(Mode::Interpolation)) {
                            self.modes.pop();
                        }
                        self.push(TokenKind::EmbExprEnd, start, line, column);
                    }
                    _ => self.push(TokenKind::RBrace, start, line, column),
                }
                self.state = LexState::End;
                Ok(())
            }
            b',' => {
                self.bump();
                self.push(TokenKind::Comma, start, line, column);
                self.state = LexState::Label;
                Ok(())
            }
            b';' => {
                self.bump();
                self.push(TokenKind::Semicolon, start, line, column);
                self.state = LexState::Beg;
                Ok(())
            }
            b'.' => {
                if self.starts_with("...") {
                    self.bump_n(3);
                    self.push(TokenKind::Op, start, line, column);
                    self.state = LexState::Beg;
                } else if self.starts_with("..") {
                    self.bump_n(2);
                    self.push(TokenKind::Op, start, line, column);
                    self.state = LexState::Beg;
                } else {
                    self.bump();
                    self.push(TokenKind::Period, start, line, column);
                    self.state = LexState::Dot;
                }
                Ok(())
            }
            b'-' if self.peek(1) == Some(b'>') => {
                self.bump_n(2);
                self.push(TokenKind::TLambda, start, line, column);
                self.lambda_depths.push(self.paren_depth);
                self.state = LexState::Label;
                Ok(())
            }
            b'-' if self.peek(1).is_some_and(|byte| byte.is_ascii_digit())
                && self.unary_position() =>
            {
                self.bump();
                self.lex_number(start, line, column)
            }
            byte if is_ident_start(byte) => self.lex_identifier(start, line, column),
            b'\\' => Err(self.error("unexpected backslash", start)),
            _ => self.lex_operator(start, line, column),
        }
    }

    /// Whether a sign or operator here starts an operand rather than a binary operation
    fn unary_position(&self) -> bool {
        self.state.is_beg()
            || (self.state == LexState::Arg
                && self.space_seen
                && !self.peek(1).is_none_or(is_space))
    }

    fn is_end_marker(&self) -> bool {
        match self.bytes.get(self.pos + 7) {
            None | Some(b'\n') => true,
            Some(b'\r') => self.bytes.get(self.pos + 8).is_none_or(|byte| *byte == b'\n'),
            _ => false,
        }
    }

    fn lex_newline(&mut self) -> Result<(), ParseError> {
        let line = self.line;
        let column = self.pos - self.line_start;
        self.bump();

        if let Some(resume) = self.heredoc_resume.take() {
            self.pos = resume.pos;
            self.line = resume.line;
            self.line_start = resume.pos;
        }

        let ignored = matches!(
            self.state,
            LexState::Beg | LexState::Label | LexState::Dot | LexState::Fname
        ) || self.leading_dot_ahead();

        if ignored {
            self.space_seen = true;
            return Ok(());
        }

        self.space_seen = false;
        let token = Token {
            kind: TokenKind::Newline,
            value: "\n".to_string(),
            line,
            column,
            end_line: line,
            end_column: column + 1,
            space_before: false,
        };
        self.pending.push_back(token);
        self.state = LexState::Beg;
        Ok(())
    }

    /// Whether the next code line continues a method chain with `.name` or `&.name`
    fn leading_dot_ahead(&self) -> bool {
        let mut index = self.pos;
        let bytes = self.bytes;
        loop {
            while index < bytes.len() && (is_space(bytes[index]) || bytes[index] == b'\n') {
                index += 1;
            }
            if index < bytes.len() && bytes[index] == b'#' {
                while index < bytes.len() && bytes[index] != b'\n' {
                    index += 1;
                }
                continue;
            }
            break;
        }
        match (bytes.get(index), bytes.get(index + 1)) {
            (Some(b'.'), Some(next)) => *next != b'.',
            (Some(b'&'), Some(b'.')) => true,
            _ => false,
        }
    }

    fn lex_embdoc(&mut self) -> Result<(), ParseError> {
        let start = self.pos;
        let line = self.line;
        loop {
            // Move to the start of the next line
            while let Some(byte) = self.peek(0) {
                self.bump();
                if byte == b'\n' {
                    break;
                }
            }
            if self.at_eof() {
                return Err(self.error("embedded document meets end of file", start));
            }
            if self.starts_with("=end")
                && self.peek(4).is_none_or(|byte| is_space(byte) || byte == b'\n')
            {
                while let Some(byte) = self.peek(0) {
                    if byte == b'\n' {
                        break;
                    }
                    self.bump();
                }
                let value = self.source[start..self.pos].trim_end().to_string();
                self.push_value(TokenKind::EmbDoc, value, line, 0);
                return Ok(());
            }
        }
    }

    fn lex_end_content(&mut self) -> Result<(), ParseError> {
        let line = self.line;
        self.bump_n(7);
        let rest_start = match self.peek(0) {
            Some(b'\r') => self.pos + 2,
            Some(b'\n') => self.pos + 1,
            _ => self.pos,
        }
        .min(self.bytes.len());
        let token = Token {
            kind: TokenKind::EndContent,
            value: self.source[rest_start..].to_string(),
            line,
            column: 0,
            end_line: line,
            end_column: 7,
            space_before: false,
        };
        self.pending.push_back(token);
        self.pos = self.bytes.len();
        self.push_value(TokenKind::Eof, String::new(), line + 1, 0);
        self.done = true;
        Ok(())
    }

    fn lex_number(&mut self, start: usize, line: usize, column: usize) -> Result<(), ParseError> {
        let mut kind = TokenKind::Int;

        if self.peek(0) == Some(b'0')
            && self
                .peek(1)
                .is_some_and(|byte| matches!(byte.to_ascii_lowercase(), b'x' | b'b' | b'o' | b'd'))
        {
            self.bump_n(2);
            while self
                .peek(0)
                .is_some_and(|byte| byte.is_ascii_hexdigit() || byte == b'_')
            {
                self.bump();
            }
        } else {
            while self
                .peek(0)
                .is_some_and(|byte| byte.is_ascii_digit() || byte == b'_')
            {
                self.bump();
            }
            if self.peek(0) == Some(b'.') && self.peek(1).is_some_and(|byte| byte.is_ascii_digit())
            {
                kind = TokenKind::Float;
                self.bump();
                while self
                    .peek(0)
                    .is_some_and(|byte| byte.is_ascii_digit() || byte == b'_')
                {
                    self.bump();
                }
            }
            if self.peek(0).is_some_and(|byte| byte == b'e' || byte == b'E') {
                let sign = usize::from(matches!(self.peek(1), Some(b'+') | Some(b'-')));
                if self.peek(1 + sign).is_some_and(|byte| byte.is_ascii_digit()) {
                    kind = TokenKind::Float;
                    self.bump_n(1 + sign);
                    while self.peek(0).is_some_and(|byte| byte.is_ascii_digit()) {
                        self.bump();
                    }
                }
            }
        }

        if self.peek(0) == Some(b'r') && self.word_ends_at(1) {
            self.bump();
            kind = TokenKind::Rational;
        } else if self.peek(0) == Some(b'r') && self.peek(1) == Some(b'i') && self.word_ends_at(2) {
            self.bump_n(2);
            kind = TokenKind::Imaginary;
        } else if self.peek(0) == Some(b'i') && self.word_ends_at(1) {
            self.bump();
            kind = TokenKind::Imaginary;
        }

        if self.peek(0).is_some_and(is_ident_char) {
            return Err(self.error("trailing characters after numeric literal", self.pos));
        }

        self.push(kind, start, line, column);
        self.state = LexState::End;
        Ok(())
    }

    fn word_ends_at(&self, offset: usize) -> bool {
        self.peek(offset).is_none_or(|byte| !is_ident_char(byte))
    }

    fn lex_instance_variable(
        &mut self,
        start: usize,
        line: usize,
        column: usize,
    ) -> Result<(), ParseError> {
        let class_var = self.peek(1) == Some(b'@');
        let prefix = if class_var { 2 } else { 1 };
        if !self.peek(prefix).is_some_and(is_ident_start) {
            return Err(self.error("invalid instance variable name", start));
        }
        self.bump_n(prefix);
        while self.peek(0).is_some_and(is_ident_char) {
            self.bump();
        }
        let kind = if class_var {
            TokenKind::CVar
        } else {
            TokenKind::IVar
        };
        self.push(kind, start, line, column);
        self.state = LexState::End;
        Ok(())
    }

    fn lex_global_variable(
        &mut self,
        start: usize,
        line: usize,
        column: usize,
    ) -> Result<(), ParseError> {
        self.bump();
        let kind = match self.peek(0) {
            Some(byte) if is_ident_start(byte) => {
                while self.peek(0).is_some_and(is_ident_char) {
                    self.bump();
                }
                TokenKind::GVar
            }
            Some(byte) if byte.is_ascii_digit() => {
                while self.peek(0).is_some_and(|byte| byte.is_ascii_digit()) {
                    self.bump();
                }
                if &self.source[start..self.pos] == "$0" {
                    TokenKind::GVar
                } else {
                    TokenKind::Backref
                }
            }
            Some(b'&' | b'`' | b'\'' | b'+') => {
                self.bump();
                TokenKind::Backref
            }
            Some(b'-') if self.peek(1).is_some_and(is_ident_char) => {
                self.bump_n(2);
                TokenKind::GVar
            }
            Some(
                b'~' | b'*' | b'$' | b'?' | b'!' | b'@' | b'/' | b'\\' | b';' | b',' | b'.'
                | b'=' | b':' | b'<' | b'>' | b'"' | b'_',
            ) => {
                self.bump();
                TokenKind::GVar
            }
            _ => return Err(self.error("invalid global variable name", start)),
        };
        let naming = self.state == LexState::Fname;
        self.push(kind, start, line, column);
        self.state = if naming {
            self.after_name()
        } else {
            LexState::End
        };
        Ok(())
    }

    /// State after a method name; `alias` reads its second name right after the first
    fn after_name(&mut self) -> LexState {
        if std::mem::take(&mut self.alias_pending) {
            LexState::Fname
        } else {
            LexState::End
        }
    }

    fn lex_colon(&mut self, start: usize, line: usize, column: usize) -> Result<(), ParseError> {
        if self.peek(1) == Some(b':') {
            self.bump_n(2);
            self.push(TokenKind::Op, start, line, column);
            self.state = LexState::Dot;
            return Ok(());
        }

        if let Some(quote @ (b'"' | b'\'')) = self.peek(1) {
            self.bump_n(2);
            self.push(TokenKind::SymBeg, start, line, column);
            self.modes.push(Mode::Literal(Literal {
                kind: LiteralKind::Symbol,
                open: None,
                close: quote,
                nesting: 0,
                interpolate: quote == b'"',
                label_ok: false,
            }));
            return Ok(());
        }

        let symbol_start = self.peek(1).is_some_and(|byte| {
            is_ident_start(byte) || b"@$+-*/%<>=!~^&|[`".contains(&byte)
        });
        if symbol_start && !(self.state == LexState::End && self.space_seen) {
            self.bump();
            self.push(TokenKind::SymBeg, start, line, column);
            self.state = LexState::Fname;
            return Ok(());
        }

        self.bump();
        self.push(TokenKind::Op, start, line, column);
        self.state = LexState::Beg;
        Ok(())
    }

    fn lex_question(&mut self, start: usize, line: usize, column: usize) -> Result<(), ParseError> {
        let value_position =
            self.state.is_beg() || (self.state == LexState::Arg && self.space_seen);
        if value_position
            && let Some(next) = self.source[self.pos + 1..].chars().next()
            && !next.is_whitespace()
        {
            let after = self.pos + 1 + next.len_utf8();
            let is_char = next == '\\'
                || self
                    .bytes
                    .get(after)
                    .is_none_or(|byte| !is_ident_char(*byte));
            if is_char {
                self.bump();
                if next == '\\' {
                    self.bump();
                    self.lex_char_escape();
                } else {
                    self.bump_n(next.len_utf8());
                }
                self.push(TokenKind::Char, start, line, column);
                self.state = LexState::End;
                return Ok(());
            }
        }

        self.bump();
        self.push(TokenKind::Op, start, line, column);
        self.state = LexState::Beg;
        Ok(())
    }

    /// Consume the escape sequence after a backslash in a character literal
    fn lex_char_escape(&mut self) {
        match self.peek(0) {
            Some(b'u') if self.peek(1) == Some(b'{') => {
                while let Some(byte) = self.peek(0) {
                    self.bump();
                    if byte == b'}' {
                        break;
                    }
                }
            }
            Some(b'u') => {
                self.bump();
                for _ in 0..4 {
                    if self.peek(0).is_some_and(|byte| byte.is_ascii_hexdigit()) {
                        self.bump();
                    }
                }
            }
            Some(b'C' | b'M') if self.peek(1) == Some(b'-') => {
                self.bump_n(2);
                if self.peek(0) == Some(b'\\') {
                    self.bump();
                    self.lex_char_escape();
                } else {
                    self.bump_char();
                }
            }
            Some(b'c') => {
                self.bump();
                self.bump_char();
            }
            Some(_) => self.bump_char(),
            None => {}
        }
    }

    fn bump_char(&mut self) {
        if let Some(ch) = self.source[self.pos..].chars().next() {
            self.bump_n(ch.len_utf8());
        }
    }

    fn lex_percent(&mut self, start: usize, line: usize, column: usize) -> Result<(), ParseError> {
        let value_position = self.state.is_beg()
            || (self.state == LexState::Arg
                && self.space_seen
                && !self.peek(1).is_none_or(|byte| is_space(byte) || byte == b'='));

        if value_position && let Some(next) = self.peek(1) {
            let (kind_char, delimiter, prefix) = if b"qQwWiIsrx".contains(&next)
                && self
                    .peek(2)
                    .is_some_and(|byte| !byte.is_ascii_alphanumeric() && !is_space(byte) && byte != b'\n')
            {
                (next, self.peek(2), 3)
            } else if !next.is_ascii_alphanumeric() && !is_space(next) && next != b'\n' && next != b'=' {
                (b'Q', Some(next), 2)
            } else {
                (0, None, 0)
            };

            if let Some(open) = delimiter {
                let (close, nested) = match closing_delimiter(open) {
                    Some(close) => (close, Some(open)),
                    None => (open, None),
                };
                let (token_kind, literal_kind, interpolate) = match kind_char {
                    b'q' => (TokenKind::TStringBeg, LiteralKind::String, false),
                    b'Q' => (TokenKind::TStringBeg, LiteralKind::String, true),
                    b'w' => (TokenKind::QWordsBeg, LiteralKind::Words, false),
                    b'W' => (TokenKind::WordsBeg, LiteralKind::Words, true),
                    b'i' => (TokenKind::QSymbolsBeg, LiteralKind::Words, false),
                    b'I' => (TokenKind::SymbolsBeg, LiteralKind::Words, true),
                    b's' => (TokenKind::SymBeg, LiteralKind::Symbol, false),
                    b'r' => (TokenKind::RegexpBeg, LiteralKind::Regexp, true),
                    _ => (TokenKind::Backtick, LiteralKind::XString, true),
                };
                self.bump_n(prefix);
                self.push(token_kind, start, line, column);
                self.modes.push(Mode::Literal(Literal {
                    kind: literal_kind,
                    open: nested,
                    close,
                    nesting: 0,
                    interpolate,
                    label_ok: false,
                }));
                return Ok(());
            }
        }

        self.lex_operator(start, line, column)
    }

    fn heredoc_ahead(&self) -> bool {
        if !self.starts_with("<<") {
            return false;
        }
        let value_position =
            self.state.is_beg() || (self.state == LexState::Arg && self.space_seen);
        if !value_position {
            return false;
        }
        let mut offset = 2;
        if matches!(self.peek(offset), Some(b'~') | Some(b'-')) {
            offset += 1;
        }
        match self.peek(offset) {
            Some(b'"' | b'\'' | b'`') => true,
            Some(byte) => is_ident_start(byte),
            None => false,
        }
    }

    fn lex_heredoc_beg(&mut self, start: usize, line: usize, column: usize) -> Result<(), ParseError> {
        self.bump_n(2);
        let indented_end = matches!(self.peek(0), Some(b'~') | Some(b'-'));
        if indented_end {
            self.bump();
        }

        let (terminator, interpolate) = match self.peek(0) {
            Some(quote @ (b'"' | b'\'' | b'`')) => {
                self.bump();
                let id_start = self.pos;
                while self.peek(0).is_some_and(|byte| byte != quote && byte != b'\n') {
                    self.bump();
                }
                if self.peek(0) != Some(quote) {
                    return Err(self.error("unterminated here document identifier", start));
                }
                let id = self.source[id_start..self.pos].to_string();
                self.bump();
                (id, quote != b'\'')
            }
            _ => {
                let id_start = self.pos;
                while self.peek(0).is_some_and(is_ident_char) {
                    self.bump();
                }
                (self.source[id_start..self.pos].to_string(), true)
            }
        };

        self.push(TokenKind::HeredocBeg, start, line, column);
        self.state = LexState::End;

        // Lex the body now so its tokens follow the opener
        let body = match self.heredoc_resume.take() {
            Some(resume) => resume,
            None => match self.source[self.pos..].find('\n') {
                Some(offset) => Resume {
                    pos: self.pos + offset + 1,
                    line: self.line + 1,
                },
                None => {
                    return Err(self.error(
                        format!("can't find string \"{terminator}\" anywhere before EOF"),
                        start,
                    ));
                }
            },
        };

        let saved = (self.pos, self.line, self.line_start, self.state, self.space_seen);
        self.pos = body.pos;
        self.line = body.line;
        self.line_start = body.pos;
        self.space_seen = false;

        let depth = self.modes.len();
        self.modes.push(Mode::Heredoc(HeredocBody {
            terminator,
            indented_end,
            interpolate,
        }));
        while self.modes.len() > depth {
            if self.done {
                return Err(self.error("unterminated heredoc", start));
            }
            self.step()?;
        }

        self.heredoc_resume = Some(Resume {
            pos: self.pos,
            line: self.line,
        });
        (self.pos, self.line, self.line_start, self.state, self.space_seen) = saved;
        Ok(())
    }

    fn lex_identifier(&mut self, start: usize, line: usize, column: usize) -> Result<(), ParseError> {
        while self.peek(0).is_some_and(is_ident_char) {
            self.bump();
        }
        let first = self.bytes[start];
        let is_const = first.is_ascii_uppercase();

        // Predicate and bang method names
        if !is_const
            && matches!(self.peek(0), Some(b'?') | Some(b'!'))
            && self.peek(1) != Some(b'=')
        {
            self.bump();
        }

        let defining = self.state == LexState::Fname
            || (self.state == LexState::Dot && self.in_def);

        // Setter names in definitions and symbols, `def name=(value)`
        if defining
            && self.peek(0) == Some(b'=')
            && !matches!(self.peek(1), Some(b'=') | Some(b'~') | Some(b'>'))
            && is_ident_char(self.bytes[self.pos - 1])
        {
            self.bump();
        }

        // Labels
        if self.state.allows_label()
            && self.peek(0) == Some(b':')
            && self.peek(1) != Some(b':')
        {
            self.bump();
            self.push(TokenKind::Label, start, line, column);
            self.state = LexState::Label;
            return Ok(());
        }

        let word = &self.source[start..self.pos];

        if defining {
            let kind = if word == "self" && self.peek(0) == Some(b'.') {
                TokenKind::Kw
            } else if is_const {
                TokenKind::Const
            } else {
                TokenKind::Ident
            };
            if kind != TokenKind::Kw {
                self.in_def = false;
            }
            self.push(kind, start, line, column);
            self.state = self.after_name();
            return Ok(());
        }

        if self.state != LexState::Dot && is_keyword(word) {
            let state = keyword_state(word);
            if word == "def" {
                self.in_def = true;
            }
            if word == "alias" {
                self.alias_pending = true;
            }
            if word == "do" && self.lambda_depths.last() == Some(&self.paren_depth) {
                self.lambda_depths.pop();
            }
            self.push(TokenKind::Kw, start, line, column);
            self.state = state;
            return Ok(());
        }

        if is_const {
            self.push(TokenKind::Const, start, line, column);
            self.state = if self.state == LexState::Dot {
                LexState::Arg
            } else {
                LexState::End
            };
            return Ok(());
        }

        let local = self.state != LexState::Dot
            && !word.ends_with(['?', '!'])
            && self.is_local(word);
        self.push(TokenKind::Ident, start, line, column);
        self.state = if local { LexState::End } else { LexState::Arg };
        Ok(())
    }

    fn lex_operator(&mut self, start: usize, line: usize, column: usize) -> Result<(), ParseError> {
        const UNARY_METHODS: [&str; 4] = ["+@", "-@", "!@", "~@"];
        const OPERATORS: &[&str] = &[
            "**=", "<=>", "===", "<<=", ">>=", "&&=", "||=", "**", "==", "!=", ">=", "<=", "&&",
            "||", "<<", ">>", "=~", "!~", "+=", "-=", "*=", "/=", "%=", "|=", "&=", "^=", "=>",
            "&.", "+", "-", "*", "/", "%", "=", "<", ">", "!", "&", "|", "^", "~",
        ];

        if self.state == LexState::Fname
            && let Some(op) = UNARY_METHODS.iter().find(|op| self.starts_with(op))
        {
            self.bump_n(op.len());
            self.push(TokenKind::Op, start, line, column);
            self.state = LexState::Arg;
            self.in_def = false;
            return Ok(());
        }

        let Some(op) = OPERATORS.iter().find(|op| self.starts_with(op)) else {
            let ch = self.source[self.pos..].chars().next().unwrap_or(' ');
            return Err(self.error(format!("unexpected character '{ch}'"), start));
        };

        self.bump_n(op.len());
        self.push(TokenKind::Op, start, line, column);
        self.state = match (*op, self.state) {
            (_, LexState::Fname) => {
                self.in_def = false;
                if std::mem::take(&mut self.alias_pending) {
                    LexState::Fname
                } else {
                    LexState::Arg
                }
            }
            ("&.", _) => LexState::Dot,
            ("|", _) => LexState::Label,
            _ => LexState::Beg,
        };
        Ok(())
    }

    // ------------------------------------------------------------------
    // Literals
    // ------------------------------------------------------------------

    fn lex_literal(&mut self) -> Result<(), ParseError> {
        let Some(Mode::Literal(literal)) = self.modes.last().cloned() else {
            return Ok(());
        };

        let start = self.pos;
        let line = self.line;
        let column = self.pos - self.line_start;

        let Some(byte) = self.peek(0) else {
            return Err(self.error("unterminated string meets end of file", start));
        };

        if byte == literal.close && literal.nesting == 0 {
            self.bump();
            self.modes.pop();
            match literal.kind {
                LiteralKind::Regexp => {
                    while self.peek(0).is_some_and(|byte| byte.is_ascii_lowercase()) {
                        self.bump();
                    }
                    self.push(TokenKind::RegexpEnd, start, line, column);
                }
                LiteralKind::String
                    if literal.label_ok
                        && self.peek(0) == Some(b':')
                        && self.peek(1) != Some(b':') =>
                {
                    self.bump();
                    self.push(TokenKind::LabelEnd, start, line, column);
                    self.state = LexState::Label;
                    return Ok(());
                }
                _ => self.push(TokenKind::TStringEnd, start, line, column),
            }
            self.state = LexState::End;
            return Ok(());
        }

        if literal.kind == LiteralKind::Words && (is_space(byte) || byte == b'\n') {
            while self
                .peek(0)
                .is_some_and(|byte| is_space(byte) || byte == b'\n')
            {
                self.bump();
            }
            self.push(TokenKind::WordsSep, start, line, column);
            return Ok(());
        }

        if literal.interpolate && self.lex_interpolation_start(start, line, column)? {
            return Ok(());
        }

        let mut nesting = literal.nesting;
        while let Some(byte) = self.peek(0) {
            if byte == literal.close && nesting == 0 {
                break;
            }
            if literal.kind == LiteralKind::Words && (is_space(byte) || byte == b'\n') {
                break;
            }
            if literal.interpolate && byte == b'#' && self.interpolation_ahead() {
                break;
            }
            if byte == b'\\' {
                self.bump();
                self.bump_char();
                continue;
            }
            if Some(byte) == literal.open {
                nesting += 1;
            } else if byte == literal.close {
                nesting -= 1;
            }
            self.bump();
        }

        if self.at_eof() {
            return Err(self.error("unterminated string meets end of file", start));
        }

        if let Some(Mode::Literal(top)) = self.modes.last_mut() {
            top.nesting = nesting;
        }
        self.push(TokenKind::TStringContent, start, line, column);
        Ok(())
    }

    fn interpolation_ahead(&self) -> bool {
        match self.peek(1) {
            Some(b'{') => true,
            Some(b'@') => self
                .peek(2)
                .is_some_and(|byte| is_ident_start(byte) || byte == b'@'),
            Some(b'$') => self.peek(2).is_some_and(is_ident_start),
            _ => false,
        }
    }

    /// Lex `#{`, `#@ivar` or `#$gvar` when one starts here
    fn lex_interpolation_start(
        &mut self,
        start: usize,
        line: usize,
        column: usize,
    ) -> Result<bool, ParseError> {
        if self.peek(0) != Some(b'#') || !self.interpolation_ahead() {
            return Ok(false);
        }
        match self.peek(1) {
            Some(b'{') => {
                self.bump_n(2);
                self.push(TokenKind::EmbExprBeg, start, line, column);
                self.braces.push(Brace::EmbExpr);
                self.modes.push(Mode::Interpolation);
                self.state = LexState::Beg;
            }
            _ => {
                self.bump();
                self.push(TokenKind::EmbVar, start, line, column);
                let var_start = self.pos;
                let var_column = self.pos - self.line_start;
                if self.peek(0) == Some(b'@') {
                    self.lex_instance_variable(var_start, line, var_column)?;
                } else {
                    self.lex_global_variable(var_start, line, var_column)?;
                }
            }
        }
        Ok(true)
    }

    fn lex_heredoc_body(&mut self) -> Result<(), ParseError> {
        let Some(Mode::Heredoc(body)) = self.modes.last().cloned() else {
            return Ok(());
        };

        let start = self.pos;
        let line = self.line;
        let column = self.pos - self.line_start;

        if self.pos == self.line_start && self.at_terminator(&body) {
            while let Some(byte) = self.peek(0) {
                self.bump();
                if byte == b'\n' {
                    break;
                }
            }
            let value = self.source[start..self.pos].to_string();
            let token = Token {
                kind: TokenKind::HeredocEnd,
                end_line: line,
                end_column: column + value.trim_end_matches(['\n', '\r']).len(),
                value,
                line,
                column,
                space_before: false,
            };
            self.pending.push_back(token);
            self.modes.pop();
            return Ok(());
        }

        if self.at_eof() {
            return Err(self.error(
                format!("can't find string \"{}\" anywhere before EOF", body.terminator),
                start,
            ));
        }

        if body.interpolate && self.lex_interpolation_start(start, line, column)? {
            return Ok(());
        }

        while let Some(byte) = self.peek(0) {
            if body.interpolate && byte == b'#' && self.interpolation_ahead() {
                break;
            }
            if byte == b'\\' {
                self.bump();
                self.bump_char();
                if self.pos == self.line_start && self.at_terminator(&body) {
                    break;
                }
                continue;
            }
            self.bump();
            if byte != b'\n' {
                continue;
            }
            // A heredoc opened inside this line's interpolation owns the
            // lines that follow it
            if let Some(resume) = self.heredoc_resume.take() {
                self.push(TokenKind::TStringContent, start, line, column);
                self.pos = resume.pos;
                self.line = resume.line;
                self.line_start = resume.pos;
                return Ok(());
            }
            if self.at_eof() || self.at_terminator(&body) {
                break;
            }
        }

        self.push(TokenKind::TStringContent, start, line, column);
        Ok(())
    }

    fn at_terminator(&self, body: &HeredocBody) -> bool {
        let rest = &self.source[self.pos..];
        let text = rest.split('\n').next().unwrap_or("");
        let text = text.strip_suffix('\r').unwrap_or(text);
        let text = if body.indented_end {
            text.trim_start()
        } else {
            text
        };
        text == body.terminator
    }
}

/// Tokenize a whole source without any local variable knowledge
pub fn tokenize(source: &str) -> Result<Vec<Token>, ParseError> {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token()?;
        let eof = token.kind == TokenKind::Eof;
        tokens.push(token);
        if eof {
            return Ok(tokens);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<(TokenKind, String)> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .filter(|token| token.kind != TokenKind::Eof)
            .map(|token| (token.kind, token.value))
            .collect()
    }

    fn kind_list(source: &str) -> Vec<TokenKind> {
        kinds(source).into_iter().map(|(kind, _)| kind).collect()
    }

    #[test]
    fn assignment_tokens() {
        use TokenKind::*;
        assert_eq!(kind_list("x=1"), vec![Ident, Op, Int]);
        assert_eq!(
            kinds("x = 1\n"),
            vec![
                (Ident, "x".to_string()),
                (Op, "=".to_string()),
                (Int, "1".to_string()),
                (Newline, "\n".to_string()),
            ]
        );
    }

    #[test]
    fn minus_depends_on_spacing_and_locals() {
        use TokenKind::*;
        // `foo` is not a local, so `-1` is an argument
        assert_eq!(kind_list("foo -1"), vec![Ident, Int]);
        assert_eq!(kind_list("foo - 1"), vec![Ident, Op, Int]);

        let mut lexer = Lexer::new("x -1");
        lexer.declare("x");
        let first = lexer.next_token().unwrap();
        let second = lexer.next_token().unwrap();
        assert_eq!(first.kind, Ident);
        assert_eq!(second.kind, Op);
    }

    #[test]
    fn regexp_versus_division() {
        use TokenKind::*;
        assert_eq!(
            kind_list("x = /ab/i"),
            vec![Ident, Op, RegexpBeg, TStringContent, RegexpEnd]
        );
        assert_eq!(kind_list("a / b"), vec![Ident, Op, Ident]);
        assert_eq!(kinds("/a/mx").last().unwrap().1, "/mx");
    }

    #[test]
    fn strings_with_interpolation() {
        use TokenKind::*;
        assert_eq!(
            kind_list("\"a#{b}c\""),
            vec![
                TStringBeg,
                TStringContent,
                EmbExprBeg,
                Ident,
                EmbExprEnd,
                TStringContent,
                TStringEnd
            ]
        );
        assert_eq!(
            kind_list("\"#@foo\""),
            vec![TStringBeg, EmbVar, IVar, TStringEnd]
        );
        assert_eq!(
            kind_list("'#{x}'"),
            vec![TStringBeg, TStringContent, TStringEnd]
        );
    }

    #[test]
    fn labels_and_symbols() {
        use TokenKind::*;
        assert_eq!(
            kind_list("foo(a: 1, :b)"),
            vec![Ident, LParen, Label, Int, Comma, SymBeg, Ident, RParen]
        );
        assert_eq!(
            kind_list("{ \"a\": 1 }"),
            vec![LBrace, TStringBeg, TStringContent, LabelEnd, Int, RBrace]
        );
        assert_eq!(kind_list("a ? b : c"), vec![Ident, Op, Ident, Op, Ident]);
        assert_eq!(kind_list("Foo::Bar"), vec![Const, Op, Const]);
    }

    #[test]
    fn percent_literals() {
        use TokenKind::*;
        assert_eq!(
            kind_list("%w[a b]"),
            vec![QWordsBeg, TStringContent, WordsSep, TStringContent, TStringEnd]
        );
        assert_eq!(
            kind_list("%i(a)"),
            vec![QSymbolsBeg, TStringContent, TStringEnd]
        );
        assert_eq!(
            kind_list("%q{a{b}c}"),
            vec![TStringBeg, TStringContent, TStringEnd]
        );
        assert_eq!(kind_list("a % b"), vec![Ident, Op, Ident]);
    }

    #[test]
    fn character_literals_and_ternaries() {
        use TokenKind::*;
        assert_eq!(kinds("?a"), vec![(Char, "?a".to_string())]);
        assert_eq!(kinds("?\\n"), vec![(Char, "?\\n".to_string())]);

        let mut lexer = Lexer::new("x ? 1 : 2");
        lexer.declare("x");
        let tokens: Vec<TokenKind> = std::iter::from_fn(|| {
            let token = lexer.next_token().ok()?;
            (token.kind != Eof).then_some(token.kind)
        })
        .collect();
        assert_eq!(tokens, vec![Ident, Op, Int, Op, Int]);
    }

    #[test]
    fn heredoc_body_follows_its_opener() {
        use TokenKind::*;
        let source = "foo(<<~EOS) # c\n  x\nEOS\nbar\n";
        let tokens = kinds(source);
        let expected = vec![
            (Ident, "foo".to_string()),
            (LParen, "(".to_string()),
            (HeredocBeg, "<<~EOS".to_string()),
            (TStringContent, "  x\n".to_string()),
            (HeredocEnd, "EOS\n".to_string()),
            (RParen, ")".to_string()),
            (Comment, "# c".to_string()),
            (Newline, "\n".to_string()),
            (Ident, "bar".to_string()),
            (Newline, "\n".to_string()),
        ];
        assert_eq!(tokens, expected);
    }

    #[test]
    fn two_heredocs_on_one_line() {
        let source = "foo(<<~A, <<~B)\n  a\nA\n  b\nB\n";
        let tokens = kinds(source);
        let contents: Vec<&str> = tokens
            .iter()
            .filter(|(kind, _)| *kind == TokenKind::TStringContent)
            .map(|(_, value)| value.as_str())
            .collect();
        assert_eq!(contents, vec!["  a\n", "  b\n"]);
        assert_eq!(tokens.last().unwrap().0, TokenKind::Newline);
    }

    #[test]
    fn heredoc_inside_heredoc_interpolation() {
        let source = "x = <<~EOS\n  hello #{<<~INNER}\n    inner\n  INNER\nEOS\n";
        let contents: Vec<(TokenKind, String)> = kinds(source)
            .into_iter()
            .filter(|(kind, _)| {
                matches!(kind, TokenKind::TStringContent | TokenKind::HeredocEnd)
            })
            .collect();
        assert_eq!(
            contents,
            vec![
                (TokenKind::TStringContent, "  hello ".to_string()),
                (TokenKind::TStringContent, "    inner\n".to_string()),
                (TokenKind::HeredocEnd, "  INNER\n".to_string()),
                (TokenKind::TStringContent, "\n".to_string()),
                (TokenKind::HeredocEnd, "EOS\n".to_string()),
            ]
        );
    }

    #[test]
    fn leading_dots_continue_chains() {
        use TokenKind::*;
        assert_eq!(
            kind_list("foo\n  .bar\n  # note\n  &.baz\n"),
            vec![Ident, Period, Ident, Comment, Op, Ident, Newline]
        );
    }

    #[test]
    fn lambda_braces() {
        use TokenKind::*;
        assert_eq!(
            kind_list("->(x) { x }"),
            vec![TLambda, LParen, Ident, RParen, TLamBeg, Ident, RBrace]
        );
    }

    #[test]
    fn trivia_and_end_content() {
        use TokenKind::*;
        let tokens = kinds("=begin\ndoc\n=end\nx\n__END__\ndata\n");
        assert_eq!(tokens[0], (EmbDoc, "=begin\ndoc\n=end".to_string()));
        assert_eq!(tokens[1], (Ident, "x".to_string()));
        assert_eq!(tokens[3], (EndContent, "data\n".to_string()));
    }

    #[test]
    fn numbers() {
        use TokenKind::*;
        assert_eq!(kinds("1_000"), vec![(Int, "1_000".to_string())]);
        assert_eq!(kind_list("1.5"), vec![Float]);
        assert_eq!(kind_list("1e3"), vec![Float]);
        assert_eq!(kind_list("3r"), vec![Rational]);
        assert_eq!(kind_list("2i"), vec![Imaginary]);
        assert_eq!(kind_list("0x1F"), vec![Int]);
        assert_eq!(kind_list("1..2"), vec![Int, Op, Int]);
    }

    #[test]
    fn unterminated_strings_fail() {
        let err = tokenize("x = \"abc").unwrap_err();
        assert!(err.message.contains("unterminated"));
        assert_eq!(err.line, 1);
    }

    #[test]
    fn alias_reads_two_names() {
        use TokenKind::*;
        assert_eq!(
            kind_list("alias :new :old"),
            vec![Kw, SymBeg, Ident, SymBeg, Ident]
        );
        assert_eq!(kind_list("alias $new $old"), vec![Kw, GVar, GVar]);
        assert_eq!(kind_list("x ? y : z"), vec![Ident, Op, Ident, Op, Ident]);
    }

    #[test]
    fn byte_columns_are_reported() {
        let tokens = tokenize("é = 1").unwrap();
        assert_eq!(tokens[1].column, 3);
        assert_eq!(tokens[1].value, "=");
    }
}
