//! Strings, symbols, regular expressions, word lists, heredocs, arrays and hashes

use super::expressions::is_label_symbol;
use super::{PResult, Parser};
use crate::cst::node::Node;
use crate::cst::token::TokenKind;

impl Parser<'_> {
    /// Content, interpolation and embedded variables up to a closing delimiter
    fn parse_string_parts(&mut self) -> PResult<Vec<Node>> {
        let mut parts = Vec::new();
        loop {
            match self.peek_kind()? {
                TokenKind::TStringContent => parts.push(self.leaf()?),
                TokenKind::EmbExprBeg => {
                    self.bump()?;
                    let statements = self.nested(|parser| parser.parse_statements())?;
                    self.expect(TokenKind::EmbExprEnd)?;
                    parts.push(self.builder.on_string_embexpr(statements)?);
                }
                TokenKind::EmbVar => {
                    self.bump()?;
                    let variable = self.leaf()?;
                    let variable = self.builder.on_var_ref(variable)?;
                    parts.push(self.builder.on_string_dvar(variable)?);
                }
                _ => return Ok(parts),
            }
        }
    }

    /// A quoted string, a `"label":` key, or adjacent strings
    pub(super) fn parse_string(&mut self) -> PResult<Node> {
        self.bump()?;
        let parts = self.parse_string_parts()?;
        if self.eat(TokenKind::LabelEnd)? {
            return self.builder.on_label_literal(parts);
        }
        self.expect(TokenKind::TStringEnd)?;
        let string = self.builder.on_string_literal(parts)?;

        if self.at(TokenKind::TStringBeg)? {
            let right = self.parse_string()?;
            if is_label_symbol(&right) {
                return Err(self.error_here());
            }
            return Ok(self.builder.on_string_concat(string, right));
        }
        Ok(string)
    }

    pub(super) fn parse_xstring(&mut self) -> PResult<Node> {
        self.bump()?;
        let parts = self.parse_string_parts()?;
        self.expect(TokenKind::TStringEnd)?;
        self.builder.on_xstring_literal(parts)
    }

    /// `:name`, `:+`, `:"quoted #{x}"` and `%s(...)`
    pub(super) fn parse_symbol(&mut self) -> PResult<Node> {
        let (beginning, _) = self.bump()?;
        if beginning.value == ":" {
            let value = match self.peek_kind()? {
                TokenKind::Ident
                | TokenKind::Const
                | TokenKind::Op
                | TokenKind::Kw
                | TokenKind::IVar
                | TokenKind::CVar
                | TokenKind::GVar
                | TokenKind::Backref
                | TokenKind::Backtick => self.leaf()?,
                _ => return Err(self.error_here()),
            };
            return self.builder.on_symbol_literal(value);
        }
        let parts = self.parse_string_parts()?;
        self.expect(TokenKind::TStringEnd)?;
        self.builder.on_dyna_symbol(parts)
    }

    pub(super) fn parse_regexp(&mut self) -> PResult<Node> {
        self.bump()?;
        let parts = self.parse_string_parts()?;
        self.expect(TokenKind::RegexpEnd)?;
        self.builder.on_regexp_literal(parts)
    }

    /// `%w[]`, `%W[]`, `%i[]` and `%I[]`
    pub(super) fn parse_words(&mut self) -> PResult<Node> {
        let (opener, _) = self.bump()?;
        let mut elements = Vec::new();
        let mut current = Vec::new();
        loop {
            match self.peek_kind()? {
                TokenKind::WordsSep => {
                    self.bump()?;
                    if !current.is_empty() {
                        elements.push(self.builder.on_word(std::mem::take(&mut current)));
                    }
                }
                TokenKind::TStringContent | TokenKind::EmbExprBeg | TokenKind::EmbVar => {
                    let parts = self.parse_string_parts()?;
                    current.extend(parts);
                }
                TokenKind::TStringEnd => break,
                _ => return Err(self.error_here()),
            }
        }
        if !current.is_empty() {
            elements.push(self.builder.on_word(current));
        }
        self.expect(TokenKind::TStringEnd)?;
        self.builder.on_words(opener.kind, elements)
    }

    /// The body tokens of a heredoc follow its opener directly
    pub(super) fn parse_heredoc(&mut self) -> PResult<Node> {
        let beginning = self.leaf()?;
        self.builder.on_heredoc_beg(beginning);
        loop {
            match self.peek_kind()? {
                TokenKind::HeredocEnd => break,
                TokenKind::TStringContent | TokenKind::EmbExprBeg | TokenKind::EmbVar => {
                    for part in self.parse_string_parts()? {
                        self.builder.on_heredoc_part(part);
                    }
                }
                _ => return Err(self.error_here()),
            }
        }
        let ending = self.leaf()?;
        self.builder.on_heredoc_end(ending);
        self.builder.on_heredoc_literal()
    }

    pub(super) fn parse_array(&mut self) -> PResult<Node> {
        self.bump()?;
        let parts = self.nested(|parser| parser.parse_call_args(Some(TokenKind::RBracket)))?;
        self.skip_newlines()?;
        self.expect(TokenKind::RBracket)?;
        let contents = if parts.is_empty() {
            None
        } else {
            Some(self.builder.on_args(parts))
        };
        self.builder.on_array(contents)
    }

    pub(super) fn parse_hash(&mut self) -> PResult<Node> {
        self.bump()?;
        let assocs = self.nested(|parser| parser.parse_assocs(TokenKind::RBrace))?;
        self.expect(TokenKind::RBrace)?;
        self.builder.on_hash(assocs)
    }

    /// `key => value`, `key: value`, `"key": value`, `key:` and `**splat`
    fn parse_assocs(&mut self, closer: TokenKind) -> PResult<Vec<Node>> {
        let mut assocs = Vec::new();
        loop {
            self.skip_newlines()?;
            if self.at(closer)? {
                break;
            }

            let assoc = if self.at_op("**")? {
                self.bump()?;
                let value = if self.value_follows()? {
                    Some(self.parse_arg()?)
                } else {
                    None
                };
                self.builder.on_assoc_splat(value)?
            } else if self.at(TokenKind::Label)? {
                let key = self.leaf()?;
                self.skip_newlines()?;
                let value = if self.value_follows()? {
                    Some(self.parse_arg()?)
                } else {
                    None
                };
                self.builder.on_assoc(key, value, false)?
            } else {
                let key = self.parse_arg()?;
                if is_label_symbol(&key) {
                    self.skip_newlines()?;
                    let value = if self.value_follows()? {
                        Some(self.parse_arg()?)
                    } else {
                        None
                    };
                    self.builder.on_assoc(key, value, false)?
                } else {
                    self.skip_newlines()?;
                    self.expect_op("=>")?;
                    self.skip_newlines()?;
                    let value = self.parse_arg()?;
                    self.builder.on_assoc(key, Some(value), true)?
                }
            };
            assocs.push(assoc);

            self.skip_newlines()?;
            if !self.eat(TokenKind::Comma)? {
                break;
            }
        }
        self.skip_newlines()?;
        Ok(assocs)
    }
}
