//! Parameter lists, method, class and module definitions, and lambdas

use super::{PResult, Parser, Restrictions, starts_value};
use crate::cst::node::Node;
use crate::cst::token::{Token, TokenKind};
use crate::error::ParseError;

/// What closes a parameter list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum ParamsEnd {
    /// `def name(...)` and `->(...)`
    Paren,
    /// Block parameters between pipes
    Pipe,
    /// `-> a, b { ... }`
    Lambda,
    /// `def name a, b` up to the end of the line
    Line,
}

impl ParamsEnd {
    fn closes(self, token: &Token) -> bool {
        match self {
            ParamsEnd::Paren => matches!(token.kind, TokenKind::RParen | TokenKind::Semicolon),
            ParamsEnd::Pipe => token.is_op("|") || token.kind == TokenKind::Semicolon,
            ParamsEnd::Lambda => token.kind == TokenKind::TLamBeg || token.is_kw("do"),
            ParamsEnd::Line => matches!(
                token.kind,
                TokenKind::Newline | TokenKind::Semicolon | TokenKind::Eof
            ),
        }
    }

    /// Bracketed lists may span lines
    fn multiline(self) -> bool {
        matches!(self, ParamsEnd::Paren | ParamsEnd::Pipe)
    }
}

#[derive(Default)]
struct ParamsBuilder {
    requireds: Vec<Node>,
    optionals: Vec<Node>,
    rest: Option<Node>,
    posts: Vec<Node>,
    keywords: Vec<Node>,
    keyword_rest: Option<Node>,
    block: Option<Node>,
    /// Names bound so far, for the duplicate check
    names: Vec<String>,
}

impl ParamsBuilder {
    /// Positional parameters after a splat or defaults are posts
    fn push_positional(&mut self, param: Node) {
        if self.rest.is_some() || !self.optionals.is_empty() {
            self.posts.push(param);
        } else {
            self.requireds.push(param);
        }
    }
}

impl Parser<'_> {
    pub(super) fn parse_params(&mut self, end: ParamsEnd) -> PResult<Node> {
        let mut params = ParamsBuilder::default();

        loop {
            if end.multiline() {
                self.skip_newlines()?;
            }
            let token = self.peek()?.clone();
            if end.closes(&token) {
                break;
            }

            match token.kind {
                TokenKind::Ident => {
                    self.declare_param(&mut params.names, &token)?;
                    let name = self.leaf()?;
                    if self.at_op("=")? {
                        self.bump()?;
                        let value = self.parse_default_value(end)?;
                        params
                            .optionals
                            .push(self.builder.on_optional_param(name, value)?);
                    } else {
                        params.push_positional(name);
                    }
                }
                TokenKind::Label => {
                    self.declare_param(&mut params.names, &token)?;
                    let name = self.leaf()?;
                    let next = self.peek()?;
                    let value = if starts_value(next) && !end.closes(next) {
                        Some(self.parse_default_value(end)?)
                    } else {
                        None
                    };
                    params.keywords.push(self.builder.on_keyword_param(name, value));
                }
                TokenKind::LParen => {
                    let destructured = self.parse_destructured_param(&mut params.names)?;
                    params.push_positional(destructured);
                }
                TokenKind::Op => match token.value.as_str() {
                    "*" => {
                        self.bump()?;
                        let name = self.parse_param_name(&mut params.names)?;
                        params.rest = Some(self.builder.on_rest_param(name)?);
                    }
                    "**" => {
                        self.bump()?;
                        if self.eat_kw("nil")? {
                            params.keyword_rest = Some(self.builder.on_nokw_rest()?);
                        } else {
                            let name = self.parse_param_name(&mut params.names)?;
                            params.keyword_rest = Some(self.builder.on_kwrest_param(name)?);
                        }
                    }
                    "&" => {
                        self.bump()?;
                        let name = self.parse_param_name(&mut params.names)?;
                        params.block = Some(self.builder.on_blockarg(name)?);
                    }
                    "..." => {
                        self.bump()?;
                        params.rest = Some(self.builder.on_args_forward()?);
                    }
                    _ => return Err(self.unexpected(&token)),
                },
                _ => return Err(self.unexpected(&token)),
            }

            if end.multiline() {
                self.skip_newlines()?;
            }
            if !self.at(TokenKind::Comma)? {
                break;
            }
            let (comma, _) = self.bump()?;
            if end == ParamsEnd::Pipe && self.at_op("|")? && params.rest.is_none() {
                params.rest = Some(self.builder.on_excessed_comma(&comma));
                break;
            }
        }

        let ParamsBuilder {
            requireds,
            optionals,
            rest,
            posts,
            keywords,
            keyword_rest,
            block,
            ..
        } = params;
        Ok(self.builder.on_params(
            requireds,
            optionals,
            rest,
            posts,
            keywords,
            keyword_rest,
            block,
        ))
    }

    /// Default values inside pipes cannot contain a bare `|`
    fn parse_default_value(&mut self, end: ParamsEnd) -> PResult<Node> {
        let restrictions = Restrictions {
            no_pipe: end == ParamsEnd::Pipe,
            ..Restrictions::default()
        };
        self.restricted(restrictions, |parser| parser.parse_arg())
    }

    /// Bind a parameter name; names may repeat only when they start with `_`
    fn declare_param(&mut self, names: &mut Vec<String>, token: &Token) -> PResult<()> {
        let name = token.value.trim_end_matches(':');
        if !name.starts_with('_') && names.iter().any(|seen| seen == name) {
            let location = self.builder.location_of(token);
            return Err(ParseError::new(
                "duplicated argument name",
                location.start_line,
                location.start_column,
            ));
        }
        names.push(name.to_string());
        self.declare(name);
        Ok(())
    }

    fn parse_param_name(&mut self, names: &mut Vec<String>) -> PResult<Option<Node>> {
        if !self.at(TokenKind::Ident)? {
            return Ok(None);
        }
        let token = self.peek()?.clone();
        self.declare_param(names, &token)?;
        Ok(Some(self.leaf()?))
    }

    /// `(a, (b, *c))` in a parameter list
    fn parse_destructured_param(&mut self, names: &mut Vec<String>) -> PResult<Node> {
        self.bump()?;
        let mut parts = Vec::new();
        loop {
            self.skip_newlines()?;
            let token = self.peek()?.clone();
            let part = match token.kind {
                TokenKind::Ident => {
                    self.declare_param(names, &token)?;
                    self.leaf()?
                }
                TokenKind::LParen => self.parse_destructured_param(names)?,
                TokenKind::Op if token.value == "*" => {
                    self.bump()?;
                    let name = self.parse_param_name(names)?;
                    self.builder.on_rest_param(name)?
                }
                _ => return Err(self.unexpected(&token)),
            };
            parts.push(part);
            self.skip_newlines()?;
            if !self.eat(TokenKind::Comma)? {
                break;
            }
        }
        self.expect(TokenKind::RParen)?;
        let targets = self.builder.on_mlhs(parts, false);
        self.builder.on_mlhs_paren(targets)
    }

    // ------------------------------------------------------------------
    // Definitions
    // ------------------------------------------------------------------

    pub(super) fn parse_def(&mut self) -> PResult<Node> {
        self.bump()?;

        let singleton = {
            let separator = self.peek_nth(1)?;
            separator.kind == TokenKind::Period || separator.is_op("::")
        };
        let (target, operator) = if singleton {
            let receiver = self.leaf()?;
            let target = self.builder.on_var_ref(receiver)?;
            let operator = self.leaf()?;
            (Some(target), Some(operator))
        } else {
            (None, None)
        };

        let name = match self.peek_kind()? {
            TokenKind::Ident
            | TokenKind::Const
            | TokenKind::Op
            | TokenKind::Kw
            | TokenKind::Backtick => self.leaf()?,
            _ => return Err(self.error_here()),
        };

        self.scoped(false, |parser| {
            parser.nested(|parser| {
                let params = parser.parse_def_params()?;
                if parser.at_op("=")? {
                    parser.bump()?;
                    parser.skip_newlines()?;
                    let mut body = parser.parse_arg()?;
                    if parser.at_kw("rescue")? {
                        parser.bump()?;
                        let value = parser.parse_arg()?;
                        body = parser.builder.on_rescue_mod(body, value)?;
                    }
                    return parser.builder.on_def(target, operator, name, params, body);
                }
                let bodystmt = parser.parse_bodystmt()?;
                parser
                    .builder
                    .on_def(target, operator, name, params, bodystmt)
            })
        })
    }

    fn parse_def_params(&mut self) -> PResult<Option<Node>> {
        let token = self.peek()?;
        if token.kind == TokenKind::LParen {
            self.bump()?;
            let params = self.parse_params(ParamsEnd::Paren)?;
            self.skip_newlines()?;
            self.expect(TokenKind::RParen)?;
            return Ok(Some(self.builder.on_paren(Some(params))?));
        }
        if matches!(token.kind, TokenKind::Newline | TokenKind::Semicolon) || token.is_op("=") {
            return Ok(None);
        }
        Ok(Some(self.parse_params(ParamsEnd::Line)?))
    }

    pub(super) fn parse_class(&mut self) -> PResult<Node> {
        self.bump()?;
        if self.at_op("<<")? {
            self.bump()?;
            let target = self.parse_expr()?;
            let bodystmt = self.scoped(false, |parser| parser.nested(|parser| parser.parse_bodystmt()))?;
            return self.builder.on_sclass(target, bodystmt);
        }

        let constant = self.parse_constant_path()?;
        let superclass = if self.at_op("<")? {
            self.bump()?;
            Some(self.parse_expr()?)
        } else {
            None
        };
        let bodystmt = self.scoped(false, |parser| parser.nested(|parser| parser.parse_bodystmt()))?;
        self.builder.on_class(constant, superclass, bodystmt)
    }

    pub(super) fn parse_module(&mut self) -> PResult<Node> {
        self.bump()?;
        let constant = self.parse_constant_path()?;
        let bodystmt = self.scoped(false, |parser| parser.nested(|parser| parser.parse_bodystmt()))?;
        self.builder.on_module(constant, bodystmt)
    }

    /// `Name`, `Outer::Name` or `::Name` after `class` or `module`
    fn parse_constant_path(&mut self) -> PResult<Node> {
        let mut node = if self.at_op("::")? {
            self.bump()?;
            let constant = self.leaf()?;
            self.builder.on_top_const_ref(constant)?
        } else {
            if !self.at(TokenKind::Const)? {
                return Err(self.error_here());
            }
            let constant = self.leaf()?;
            if !self.at_op("::")? {
                return Ok(self.builder.on_const_ref(constant));
            }
            self.builder.on_var_ref(constant)?
        };
        while self.at_op("::")? {
            self.bump()?;
            let constant = self.leaf()?;
            node = self.builder.on_const_path_ref(node, constant)?;
        }
        Ok(node)
    }

    pub(super) fn parse_lambda(&mut self) -> PResult<Node> {
        self.bump()?;
        self.scoped(true, |parser| {
            parser.nested(|parser| {
                let params = parser.parse_lambda_params()?;
                if parser.eat(TokenKind::TLamBeg)? {
                    let statements = parser.parse_statements()?;
                    parser.skip_newlines()?;
                    parser.expect(TokenKind::RBrace)?;
                    return parser.builder.on_lambda(params, statements, true);
                }
                parser.expect_kw("do")?;
                let bodystmt = parser.parse_bodystmt()?;
                parser.builder.on_lambda(params, bodystmt, false)
            })
        })
    }

    fn parse_lambda_params(&mut self) -> PResult<Node> {
        let token = self.peek()?;
        if token.kind == TokenKind::LParen {
            self.bump()?;
            let params = self.parse_params(ParamsEnd::Paren)?;
            let locals = self.parse_block_locals()?;
            self.skip_newlines()?;
            self.expect(TokenKind::RParen)?;
            let contents = if locals.is_empty() {
                params
            } else {
                self.builder.on_lambda_var(params, locals)
            };
            return self.builder.on_paren(Some(contents));
        }
        if token.kind == TokenKind::TLamBeg || token.is_kw("do") {
            return Ok(self.builder.on_params(
                Vec::new(),
                Vec::new(),
                None,
                Vec::new(),
                Vec::new(),
                None,
                None,
            ));
        }
        self.parse_params(ParamsEnd::Lambda)
    }
}
