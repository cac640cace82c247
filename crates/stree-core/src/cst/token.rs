//! Scanner tokens
//!
//! Tokens carry their text verbatim along with the byte position where they
//! start and end. The builder turns these into character-based
//! [`Location`](super::Location)s through the [`SourceIndex`](super::SourceIndex).

use serde::Serialize;
use std::fmt;

/// Every kind of token the scanner produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenKind {
    // Names
    Ident,
    Const,
    IVar,
    CVar,
    GVar,
    Backref,
    Label,
    Kw,

    // Operators and punctuation
    Op,
    Period,
    Comma,
    Semicolon,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    TLambda,
    TLamBeg,

    // Numbers
    Int,
    Float,
    Rational,
    Imaginary,
    Char,

    // String-like literals
    TStringBeg,
    TStringContent,
    TStringEnd,
    EmbExprBeg,
    EmbExprEnd,
    EmbVar,
    SymBeg,
    LabelEnd,
    RegexpBeg,
    RegexpEnd,
    Backtick,
    WordsBeg,
    QWordsBeg,
    SymbolsBeg,
    QSymbolsBeg,
    WordsSep,
    HeredocBeg,
    HeredocEnd,

    // Trivia and structure
    Comment,
    EmbDoc,
    EndContent,
    Newline,
    Eof,
}

impl TokenKind {
    /// Human readable name used in error messages
    pub fn describe(self) -> &'static str {
        match self {
            TokenKind::Ident => "identifier",
            TokenKind::Const => "constant",
            TokenKind::IVar => "instance variable",
            TokenKind::CVar => "class variable",
            TokenKind::GVar => "global variable",
            TokenKind::Backref => "back reference",
            TokenKind::Label => "label",
            TokenKind::Kw => "keyword",
            TokenKind::Op => "operator",
            TokenKind::Period => "period",
            TokenKind::Comma => "comma",
            TokenKind::Semicolon => "semicolon",
            TokenKind::LParen => "lparen",
            TokenKind::RParen => "rparen",
            TokenKind::LBracket => "lbracket",
            TokenKind::RBracket => "rbracket",
            TokenKind::LBrace => "lbrace",
            TokenKind::RBrace => "rbrace",
            TokenKind::TLambda => "tlambda",
            TokenKind::TLamBeg => "tlambeg",
            TokenKind::Int => "integer",
            TokenKind::Float => "float",
            TokenKind::Rational => "rational",
            TokenKind::Imaginary => "imaginary",
            TokenKind::Char => "character literal",
            TokenKind::TStringBeg => "tstring_beg",
            TokenKind::TStringContent => "tstring_content",
            TokenKind::TStringEnd => "tstring_end",
            TokenKind::EmbExprBeg => "embexpr_beg",
            TokenKind::EmbExprEnd => "embexpr_end",
            TokenKind::EmbVar => "embvar",
            TokenKind::SymBeg => "symbeg",
            TokenKind::LabelEnd => "label_end",
            TokenKind::RegexpBeg => "regexp_beg",
            TokenKind::RegexpEnd => "regexp_end",
            TokenKind::Backtick => "backtick",
            TokenKind::WordsBeg => "words_beg",
            TokenKind::QWordsBeg => "qwords_beg",
            TokenKind::SymbolsBeg => "symbols_beg",
            TokenKind::QSymbolsBeg => "qsymbols_beg",
            TokenKind::WordsSep => "words_sep",
            TokenKind::HeredocBeg => "heredoc_beg",
            TokenKind::HeredocEnd => "heredoc_end",
            TokenKind::Comment => "comment",
            TokenKind::EmbDoc => "embdoc",
            TokenKind::EndContent => "__END__",
            TokenKind::Newline => "newline",
            TokenKind::Eof => "end-of-input",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// A token with its text and byte position
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    /// 1-based line of the first byte
    pub line: usize,
    /// Byte column of the first byte
    pub column: usize,
    /// 1-based line just past the last byte
    pub end_line: usize,
    /// Byte column just past the last byte
    pub end_column: usize,
    /// Whether whitespace separates this token from the previous one
    pub space_before: bool,
}

impl Token {
    /// A token that ends on the line it starts on
    pub fn new(kind: TokenKind, value: impl Into<String>, line: usize, column: usize) -> Self {
        let value = value.into();
        let end_column = column + value.len();
        Self {
            kind,
            value,
            line,
            column,
            end_line: line,
            end_column,
            space_before: false,
        }
    }

    pub fn is(&self, kind: TokenKind, value: &str) -> bool {
        self.kind == kind && self.value == value
    }

    pub fn is_kw(&self, value: &str) -> bool {
        self.is(TokenKind::Kw, value)
    }

    pub fn is_op(&self, value: &str) -> bool {
        self.is(TokenKind::Op, value)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Eof => f.write_str("end-of-input"),
            TokenKind::Newline => f.write_str("newline"),
            _ => write!(f, "'{}'", self.value),
        }
    }
}
