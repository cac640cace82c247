//! Pattern matching: `case ... in`, `value => pattern` and `value in pattern`
//!
//! Alternatives are `Binary` nodes with a `|` operator and bindings are
//! `Binary` nodes with `=>`. Splats come back from the builder as
//! `VarField`s, so array contents are collected as [`Element`]s to keep
//! track of which positions were splats.

use super::{PResult, Parser, Restrictions, starts_value};
use crate::cst::node::Node;
use crate::cst::token::TokenKind;

enum Element {
    Value(Node),
    Splat(Node),
}

impl Parser<'_> {
    /// A pattern after `in`, with an optional `if`/`unless` guard
    pub(super) fn parse_pattern_clause(&mut self) -> PResult<Node> {
        let pattern = self.parse_pattern_top()?;
        let token = self.peek()?;
        if token.is_kw("if") || token.is_kw("unless") {
            let keyword = token.value.clone();
            self.bump()?;
            let guard = self.parse_expr()?;
            return self.builder.on_modifier(&keyword, pattern, guard);
        }
        Ok(pattern)
    }

    /// A complete pattern, where brackets and braces may be left off
    pub(super) fn parse_pattern_top(&mut self) -> PResult<Node> {
        let restrictions = Restrictions {
            no_pipe: true,
            ..Restrictions::default()
        };
        self.restricted(restrictions, |parser| {
            let token = parser.peek()?;
            if token.kind == TokenKind::Label || token.is_op("**") {
                let (keywords, rest) = parser.parse_hash_pattern_body(None)?;
                return parser.builder.on_hshptn(None, keywords, rest, None);
            }

            let first = parser.parse_pattern_element()?;
            if !parser.at(TokenKind::Comma)? {
                return match first {
                    Element::Value(pattern) => Ok(pattern),
                    splat => parser.build_array_pattern(None, vec![splat], None),
                };
            }

            let mut elements = vec![first];
            while parser.eat(TokenKind::Comma)? {
                let token = parser.peek()?;
                if matches!(token.kind, TokenKind::Newline | TokenKind::Semicolon)
                    || token.is_kw("then")
                {
                    break;
                }
                elements.push(parser.parse_pattern_element()?);
            }
            parser.build_array_pattern(None, elements, None)
        })
    }

    fn parse_pattern_element(&mut self) -> PResult<Element> {
        if !self.at_op("*")? {
            return Ok(Element::Value(self.parse_pattern_as()?));
        }
        self.bump()?;
        let name = if self.at(TokenKind::Ident)? {
            let name = self.peek()?.value.clone();
            self.declare(&name);
            Some(self.leaf()?)
        } else {
            None
        };
        Ok(Element::Splat(self.builder.on_splat_pattern(name)?))
    }

    /// `pattern => name`
    fn parse_pattern_as(&mut self) -> PResult<Node> {
        let pattern = self.parse_pattern_alternatives()?;
        if !self.at_op("=>")? {
            return Ok(pattern);
        }
        self.bump()?;
        if !self.at(TokenKind::Ident)? {
            return Err(self.error_here());
        }
        let name = self.peek()?.value.clone();
        self.declare(&name);
        let leaf = self.leaf()?;
        let binding = self.builder.on_var_field(Some(leaf));
        self.builder.on_binary(pattern, "=>", binding)
    }

    /// `a | b | c`
    fn parse_pattern_alternatives(&mut self) -> PResult<Node> {
        let mut left = self.parse_pattern_primary()?;
        while self.at_op("|")? {
            self.bump()?;
            self.skip_newlines()?;
            let right = self.parse_pattern_primary()?;
            left = self.builder.on_binary(left, "|", right)?;
        }
        Ok(left)
    }

    fn parse_pattern_primary(&mut self) -> PResult<Node> {
        let token = self.peek()?.clone();
        match token.kind {
            TokenKind::LBracket => {
                self.bump()?;
                let elements = self.parse_array_pattern_body(TokenKind::RBracket)?;
                self.expect(TokenKind::RBracket)?;
                self.build_array_pattern(
                    None,
                    elements,
                    Some((TokenKind::LBracket, TokenKind::RBracket)),
                )
            }
            TokenKind::LBrace => {
                self.bump()?;
                let (keywords, rest) = self.parse_hash_pattern_body(Some(TokenKind::RBrace))?;
                self.expect(TokenKind::RBrace)?;
                self.builder.on_hshptn(
                    None,
                    keywords,
                    rest,
                    Some((TokenKind::LBrace, TokenKind::RBrace)),
                )
            }
            TokenKind::LParen => {
                self.bump()?;
                self.skip_newlines()?;
                let pattern = self.parse_pattern_top()?;
                self.skip_newlines()?;
                self.expect(TokenKind::RParen)?;
                self.builder.on_paren(Some(pattern))
            }
            TokenKind::Op if token.value == "^" => self.parse_pin(),
            TokenKind::Ident => {
                self.declare(&token.value);
                let name = self.leaf()?;
                Ok(self.builder.on_var_field(Some(name)))
            }
            TokenKind::Const => self.parse_constant_pattern(),
            TokenKind::Op if token.value == "::" => self.parse_constant_pattern(),
            _ => self.parse_range(),
        }
    }

    /// `^name`, `^@ivar` and `^(expression)`
    fn parse_pin(&mut self) -> PResult<Node> {
        self.bump()?;
        if self.at(TokenKind::LParen)? {
            self.bump()?;
            let statement = self.nested(|parser| parser.parse_expr())?;
            self.expect(TokenKind::RParen)?;
            return self.builder.on_pinned_begin(statement);
        }
        match self.peek_kind()? {
            TokenKind::Ident | TokenKind::IVar | TokenKind::CVar | TokenKind::GVar => {
                let name = self.leaf()?;
                let reference = self.builder.on_var_ref(name)?;
                self.builder.on_pinned_var_ref(reference)
            }
            _ => Err(self.error_here()),
        }
    }

    /// A constant, optionally followed by a bracketed array or hash pattern
    fn parse_constant_pattern(&mut self) -> PResult<Node> {
        let mut constant = if self.at_op("::")? {
            self.bump()?;
            let name = self.leaf()?;
            self.builder.on_top_const_ref(name)?
        } else {
            let name = self.leaf()?;
            self.builder.on_var_ref(name)?
        };
        while self.at_op("::")? && self.peek_nth(1)?.kind == TokenKind::Const {
            self.bump()?;
            let name = self.leaf()?;
            constant = self.builder.on_const_path_ref(constant, name)?;
        }

        let token = self.peek()?;
        let (open, close) = match token.kind {
            TokenKind::LParen if !token.space_before => (TokenKind::LParen, TokenKind::RParen),
            TokenKind::LBracket if !token.space_before => {
                (TokenKind::LBracket, TokenKind::RBracket)
            }
            _ => {
                if self.at_op("..")? || self.at_op("...")? {
                    let operator = self.leaf()?;
                    let right = if starts_value(self.peek()?) {
                        Some(self.parse_pattern_primary()?)
                    } else {
                        None
                    };
                    return self.builder.on_range(Some(constant), operator, right);
                }
                return Ok(constant);
            }
        };

        self.bump()?;
        self.skip_newlines()?;
        let token = self.peek()?;
        if token.kind == TokenKind::Label || token.is_op("**") {
            let (keywords, rest) = self.parse_hash_pattern_body(Some(close))?;
            self.expect(close)?;
            return self
                .builder
                .on_hshptn(Some(constant), keywords, rest, Some((open, close)));
        }
        let elements = self.parse_array_pattern_body(close)?;
        self.expect(close)?;
        self.build_array_pattern(Some(constant), elements, Some((open, close)))
    }

    fn parse_array_pattern_body(&mut self, closer: TokenKind) -> PResult<Vec<Element>> {
        let mut elements = Vec::new();
        loop {
            self.skip_newlines()?;
            if self.at(closer)? {
                break;
            }
            elements.push(self.parse_pattern_element()?);
            self.skip_newlines()?;
            if !self.eat(TokenKind::Comma)? {
                break;
            }
        }
        self.skip_newlines()?;
        Ok(elements)
    }

    /// Keywords and an optional `**rest` or `**nil`
    fn parse_hash_pattern_body(
        &mut self,
        closer: Option<TokenKind>,
    ) -> PResult<(Vec<Node>, Option<Node>)> {
        let mut keywords = Vec::new();
        let mut rest = None;
        loop {
            if closer.is_some() {
                self.skip_newlines()?;
            }
            let token = self.peek()?.clone();
            if Some(token.kind) == closer {
                break;
            }
            match token.kind {
                TokenKind::Label | TokenKind::TStringBeg => {
                    let key = if token.kind == TokenKind::Label {
                        self.leaf()?
                    } else {
                        self.parse_string()?
                    };
                    let key_line = self.builder.cursor().end_line;
                    let value = if self.pattern_value_follows(closer, key_line)? {
                        Some(self.parse_pattern_as()?)
                    } else {
                        if token.kind == TokenKind::Label {
                            self.declare(&token.value);
                        }
                        None
                    };
                    keywords.push(self.builder.on_assoc(key, value, false)?);
                }
                TokenKind::Op if token.value == "**" => {
                    self.bump()?;
                    if self.eat_kw("nil")? {
                        rest = Some(self.builder.on_nokw_rest()?);
                    } else {
                        let name = if self.at(TokenKind::Ident)? {
                            let name = self.peek()?.value.clone();
                            self.declare(&name);
                            Some(self.leaf()?)
                        } else {
                            None
                        };
                        rest = Some(self.builder.on_kwrest_param(name)?);
                    }
                }
                _ => return Err(self.unexpected(&token)),
            }
            if closer.is_some() {
                self.skip_newlines()?;
            }
            if !self.eat(TokenKind::Comma)? {
                break;
            }
        }
        if closer.is_some() {
            self.skip_newlines()?;
        }
        Ok((keywords, rest))
    }

    /// Whether a value follows a key; outside braces the value must start on
    /// the key's line
    fn pattern_value_follows(&mut self, closer: Option<TokenKind>, key_line: usize) -> PResult<bool> {
        let token = self.peek()?;
        if Some(token.kind) == closer || token.kind == TokenKind::Comma {
            return Ok(false);
        }
        if closer.is_none() && token.line > key_line {
            return Ok(false);
        }
        Ok(starts_value(token) || token.is_op("^"))
    }

    /// Without splats an array pattern; one splat splits it into
    /// requireds, rest and posts; splats at both ends make a find pattern
    fn build_array_pattern(
        &mut self,
        constant: Option<Node>,
        elements: Vec<Element>,
        delimiters: Option<(TokenKind, TokenKind)>,
    ) -> PResult<Node> {
        let splats: Vec<usize> = elements
            .iter()
            .enumerate()
            .filter(|(_, element)| matches!(element, Element::Splat(_)))
            .map(|(index, _)| index)
            .collect();
        let count = elements.len();
        let mut nodes = elements.into_iter().map(|element| match element {
            Element::Value(node) | Element::Splat(node) => node,
        });

        match splats.as_slice() {
            [] => {
                let requireds = nodes.collect();
                self.builder
                    .on_aryptn(constant, requireds, None, Vec::new(), delimiters)
            }
            [index] => {
                let requireds: Vec<Node> = nodes.by_ref().take(*index).collect();
                let rest = nodes.next();
                let posts = nodes.collect();
                self.builder
                    .on_aryptn(constant, requireds, rest, posts, delimiters)
            }
            [first, .., last] if *first == 0 && *last == count - 1 && splats.len() == 2 => {
                let mut values: Vec<Node> = nodes.collect();
                let (Some(right), true) = (values.pop(), !values.is_empty()) else {
                    return Err(self.error_here());
                };
                let left = values.remove(0);
                self.builder
                    .on_fndptn(constant, left, values, right, delimiters)
            }
            _ => Err(self.error_here()),
        }
    }
}
