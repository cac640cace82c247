//! Operators, primaries, calls, arguments and blocks

use super::definitions::ParamsEnd;
use super::{PResult, Parser, VALUE_KEYWORDS, starts_value};
use crate::cst::node::{Node, NodeKind, NodeTag, VCall};
use crate::cst::token::{Token, TokenKind};

const ASSIGNMENT_OPERATORS: &[&str] = &[
    "=", "+=", "-=", "*=", "/=", "%=", "**=", "||=", "&&=", "|=", "&=", "^=", "<<=", ">>=",
];

/// Binding power and right-associativity of a binary operator
fn binary_precedence(operator: &str) -> Option<(u8, bool)> {
    Some(match operator {
        "||" => (1, false),
        "&&" => (2, false),
        "<=>" | "==" | "===" | "!=" | "=~" | "!~" => (3, false),
        "<" | "<=" | ">" | ">=" => (4, false),
        "|" | "^" => (5, false),
        "&" => (6, false),
        "<<" | ">>" => (7, false),
        "+" | "-" => (8, false),
        "*" | "/" | "%" => (9, false),
        "**" => (11, true),
        _ => return None,
    })
}

/// Unary minus binds looser than `**` and tighter than everything else
const UNARY_MINUS_OPERAND: u8 = 11;

/// Expressions that can be assigned to directly
fn is_assignable(node: &Node) -> bool {
    match &node.kind {
        NodeKind::VCall(call) => call
            .value
            .token_value()
            .is_some_and(|name| !name.ends_with(['?', '!'])),
        NodeKind::VarRef(var) => !var.value.is(NodeTag::Kw),
        NodeKind::ARef(_) | NodeKind::ConstPathRef(_) | NodeKind::TopConstRef(_) => true,
        NodeKind::CallNode(call) => {
            call.receiver.is_some()
                && call.operator.is_some()
                && call.message.is_some()
                && call.arguments.is_none()
        }
        _ => false,
    }
}

/// Calls that a `{ }` or `do ... end` block can attach to
fn takes_block(node: &Node) -> bool {
    matches!(
        node.tag(),
        NodeTag::VCall | NodeTag::CallNode | NodeTag::Super | NodeTag::ZSuper
    )
}

/// `"key": value` keys come back from the string parser as label symbols
pub(super) fn is_label_symbol(node: &Node) -> bool {
    matches!(&node.kind, NodeKind::DynaSymbol(symbol) if symbol.quote == "\"" || symbol.quote == "'")
}

impl Parser<'_> {
    /// `not`, `and` and `or` level
    pub(super) fn parse_expr(&mut self) -> PResult<Node> {
        let mut left = self.parse_not()?;
        loop {
            let token = self.peek()?;
            if !(token.is_kw("and") || token.is_kw("or")) {
                break;
            }
            let keyword = token.value.clone();
            self.bump()?;
            self.skip_newlines()?;
            let right = self.parse_not()?;
            left = self.builder.on_binary(left, &keyword, right)?;
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> PResult<Node> {
        if !self.at_kw("not")? {
            return self.parse_arg();
        }
        self.enter()?;
        let result = self.parse_not_inner();
        self.leave();
        result
    }

    fn parse_not_inner(&mut self) -> PResult<Node> {
        self.bump()?;
        let token = self.peek()?;
        if token.kind == TokenKind::LParen && !token.space_before {
            self.bump()?;
            self.skip_newlines()?;
            let statement = if self.at(TokenKind::RParen)? {
                None
            } else {
                Some(self.nested(|parser| parser.parse_expr())?)
            };
            self.skip_newlines()?;
            self.expect(TokenKind::RParen)?;
            return self.builder.on_not(statement, true);
        }
        let statement = self.parse_not()?;
        self.builder.on_not(Some(statement), false)
    }

    /// A single argument-level expression: ternaries, ranges and operators
    pub(super) fn parse_arg(&mut self) -> PResult<Node> {
        let predicate = self.parse_range()?;
        if is_label_symbol(&predicate) || !self.at_op("?")? {
            return Ok(predicate);
        }
        self.enter()?;
        let result = self.parse_ternary(predicate);
        self.leave();
        result
    }

    fn parse_ternary(&mut self, predicate: Node) -> PResult<Node> {
        self.bump()?;
        self.skip_newlines()?;
        let truthy = self.parse_arg()?;
        self.skip_newlines()?;
        self.expect_op(":")?;
        self.skip_newlines()?;
        let falsy = self.parse_arg()?;
        self.builder.on_ifop(predicate, truthy, falsy)
    }

    pub(super) fn parse_range(&mut self) -> PResult<Node> {
        if self.at_op("..")? || self.at_op("...")? {
            let operator = self.leaf()?;
            let right = self.parse_binary(1)?;
            return self.builder.on_range(None, operator, Some(right));
        }
        let left = self.parse_binary(1)?;
        if is_label_symbol(&left) {
            return Ok(left);
        }
        if self.at_op("..")? || self.at_op("...")? {
            let operator = self.leaf()?;
            let token = self.peek()?;
            let right = if starts_value(token) && token.kind != TokenKind::LBrace {
                Some(self.parse_binary(1)?)
            } else {
                None
            };
            return self.builder.on_range(Some(left), operator, right);
        }
        Ok(left)
    }

    /// Precedence climbing over the binary operators
    fn parse_binary(&mut self, min: u8) -> PResult<Node> {
        let mut left = self.parse_unary()?;
        if is_label_symbol(&left) {
            return Ok(left);
        }
        loop {
            let token = self.peek()?;
            if token.kind != TokenKind::Op {
                break;
            }
            let operator = token.value.clone();
            let Some((precedence, right_assoc)) = binary_precedence(&operator) else {
                break;
            };
            if precedence < min || (operator == "|" && self.restrictions.no_pipe) {
                break;
            }
            self.bump()?;
            self.skip_newlines()?;
            let next = if right_assoc { precedence } else { precedence + 1 };
            let right = self.parse_binary(next)?;
            left = self.builder.on_binary(left, &operator, right)?;
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> PResult<Node> {
        let token = self.peek()?;
        if token.kind != TokenKind::Op || !matches!(token.value.as_str(), "!" | "~" | "+" | "-") {
            return self.parse_primary_postfix();
        }
        let operator = token.value.clone();
        self.enter()?;
        let result = self.parse_unary_operation(&operator);
        self.leave();
        result
    }

    fn parse_unary_operation(&mut self, operator: &str) -> PResult<Node> {
        self.bump()?;
        let operand = if operator == "-" {
            self.parse_binary(UNARY_MINUS_OPERAND)?
        } else {
            self.parse_unary()?
        };
        self.builder.on_unary(operator, operand)
    }

    // ------------------------------------------------------------------
    // Primaries
    // ------------------------------------------------------------------

    /// A primary with its method calls, indexing and blocks, or an assignment to it
    pub(super) fn parse_primary_postfix(&mut self) -> PResult<Node> {
        self.enter()?;
        let result = self.parse_primary_postfix_inner();
        self.leave();
        result
    }

    fn parse_primary_postfix_inner(&mut self) -> PResult<Node> {
        let primary = self.parse_primary()?;
        if is_label_symbol(&primary) {
            return Ok(primary);
        }
        let node = self.parse_postfix(primary)?;
        if !self.restrictions.no_assign && is_assignable(&node) {
            let token = self.peek()?;
            if token.kind == TokenKind::Op && ASSIGNMENT_OPERATORS.contains(&token.value.as_str())
            {
                return self.parse_assignment(node);
            }
        }
        Ok(node)
    }

    fn parse_assignment(&mut self, target: Node) -> PResult<Node> {
        let target = self.to_target(target)?;
        let operator = self.leaf()?;
        self.skip_newlines()?;
        let mut value = if operator.token_value() == Some("=") && self.at_op("*")? {
            let splat = self.parse_mrhs_part()?;
            self.builder.on_mrhs(vec![splat])
        } else {
            self.parse_arg()?
        };
        if self.at_kw("rescue")? {
            self.bump()?;
            let rescue = self.parse_arg()?;
            value = self.builder.on_rescue_mod(value, rescue)?;
        }
        if operator.token_value() == Some("=") {
            self.builder.on_assign(target, value)
        } else {
            self.builder.on_opassign(target, operator, value)
        }
    }

    fn parse_primary(&mut self) -> PResult<Node> {
        let token = self.peek()?.clone();
        match token.kind {
            TokenKind::Int
            | TokenKind::Float
            | TokenKind::Rational
            | TokenKind::Imaginary
            | TokenKind::Char => self.leaf(),
            TokenKind::IVar | TokenKind::CVar | TokenKind::GVar | TokenKind::Backref => {
                let variable = self.leaf()?;
                self.builder.on_var_ref(variable)
            }
            TokenKind::Ident => self.parse_identifier(),
            TokenKind::Const => self.parse_constant(),
            TokenKind::Kw => self.parse_keyword(&token),
            TokenKind::LParen => self.parse_paren(),
            TokenKind::LBracket => self.parse_array(),
            TokenKind::LBrace => self.parse_hash(),
            TokenKind::TStringBeg => self.parse_string(),
            TokenKind::Backtick => self.parse_xstring(),
            TokenKind::SymBeg => self.parse_symbol(),
            TokenKind::RegexpBeg => self.parse_regexp(),
            TokenKind::WordsBeg
            | TokenKind::QWordsBeg
            | TokenKind::SymbolsBeg
            | TokenKind::QSymbolsBeg => self.parse_words(),
            TokenKind::HeredocBeg => self.parse_heredoc(),
            TokenKind::TLambda => self.parse_lambda(),
            TokenKind::Op if token.value == "::" => {
                self.bump()?;
                if !self.at(TokenKind::Const)? {
                    return Err(self.error_here());
                }
                let constant = self.leaf()?;
                self.builder.on_top_const_ref(constant)
            }
            _ => Err(self.unexpected(&token)),
        }
    }

    fn parse_keyword(&mut self, token: &Token) -> PResult<Node> {
        match token.value.as_str() {
            "nil" | "true" | "false" | "self" | "__FILE__" | "__LINE__" | "__ENCODING__" => {
                let keyword = self.leaf()?;
                self.builder.on_var_ref(keyword)
            }
            "if" | "unless" => self.parse_if(),
            "while" | "until" => self.parse_while(),
            "case" => self.parse_case(),
            "for" => self.parse_for(),
            "begin" => self.parse_begin(),
            "def" => self.parse_def(),
            "class" => self.parse_class(),
            "module" => self.parse_module(),
            "return" | "break" | "next" => self.parse_jump(),
            "redo" => {
                self.bump()?;
                self.builder.on_redo()
            }
            "retry" => {
                self.bump()?;
                self.builder.on_retry()
            }
            "yield" => self.parse_yield(),
            "super" => self.parse_super(),
            "defined?" => self.parse_defined(),
            "not" => self.parse_not(),
            "alias" => self.parse_alias(),
            "undef" => self.parse_undef(),
            "BEGIN" | "END" => self.parse_program_hook(),
            _ => Err(self.unexpected(token)),
        }
    }

    fn parse_identifier(&mut self) -> PResult<Node> {
        let name = self.peek()?.value.clone();
        let local = !name.ends_with(['?', '!']) && self.lexer.is_local(&name);
        let identifier = self.leaf()?;

        let next = self.peek()?;
        if next.kind == TokenKind::LParen && !next.space_before {
            let arguments = self.parse_arg_paren()?;
            return self
                .builder
                .on_call(None, None, Some(identifier), Some(arguments));
        }
        if local {
            return self.builder.on_var_ref(identifier);
        }
        if self.command_args_follow(false)? {
            return self.parse_command(identifier);
        }
        Ok(self.builder.on_vcall(identifier))
    }

    fn parse_constant(&mut self) -> PResult<Node> {
        let constant = self.leaf()?;
        let next = self.peek()?;
        if next.kind == TokenKind::LParen && !next.space_before {
            let arguments = self.parse_arg_paren()?;
            return self
                .builder
                .on_call(None, None, Some(constant), Some(arguments));
        }
        if self.command_args_follow(true)? {
            return self.parse_command(constant);
        }
        self.builder.on_var_ref(constant)
    }

    /// Whether arguments without parentheses follow a method name. Constants
    /// only take arguments that cannot be read as an operator or index.
    fn command_args_follow(&mut self, constant: bool) -> PResult<bool> {
        if self.restrictions.no_assign {
            return Ok(false);
        }
        let token = self.peek()?;
        if !token.space_before {
            return Ok(false);
        }
        Ok(match token.kind {
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
            | TokenKind::Label
            | TokenKind::TStringBeg
            | TokenKind::SymBeg
            | TokenKind::RegexpBeg
            | TokenKind::Backtick
            | TokenKind::HeredocBeg
            | TokenKind::WordsBeg
            | TokenKind::QWordsBeg
            | TokenKind::SymbolsBeg
            | TokenKind::QSymbolsBeg
            | TokenKind::TLambda => true,
            TokenKind::LBracket | TokenKind::LParen => !constant,
            TokenKind::Kw => !constant && VALUE_KEYWORDS.contains(&token.value.as_str()),
            TokenKind::Op => {
                let prefix = matches!(
                    token.value.as_str(),
                    "*" | "**" | "&" | "-" | "!" | "::" | "~" | ".."
                );
                !constant && prefix && !self.peek_nth(1)?.space_before
            }
            _ => false,
        })
    }

    /// `name args` with an optional `do` block
    fn parse_command(&mut self, message: Node) -> PResult<Node> {
        let arguments = self.parse_command_args()?;
        let command = self.builder.on_command(message, arguments)?;
        self.parse_command_block(command)
    }

    fn parse_command_args(&mut self) -> PResult<Node> {
        let parts = self.without_do(|parser| parser.parse_call_args(None))?;
        Ok(self.builder.on_args(parts))
    }

    fn parse_command_block(&mut self, command: Node) -> PResult<Node> {
        if !self.restrictions.no_do && self.at_kw("do")? {
            let block = self.parse_do_block()?;
            return Ok(self.builder.on_method_add_block(command, block));
        }
        Ok(command)
    }

    pub(super) fn parse_paren(&mut self) -> PResult<Node> {
        self.bump()?;
        let mut statements = self.nested(|parser| parser.parse_statements())?;
        self.expect(TokenKind::RParen)?;

        if let NodeKind::Statements(inner) = &mut statements.kind
            && inner.body.len() == 1
            && inner.body[0].is(NodeTag::Mlhs)
            && let Some(targets) = inner.body.pop()
        {
            return self.builder.on_mlhs_paren(targets);
        }
        self.builder.on_paren(Some(statements))
    }

    fn parse_defined(&mut self) -> PResult<Node> {
        self.bump()?;
        let token = self.peek()?;
        if token.kind == TokenKind::LParen && !token.space_before {
            self.bump()?;
            self.skip_newlines()?;
            let value = self.nested(|parser| parser.parse_expr())?;
            self.skip_newlines()?;
            self.expect(TokenKind::RParen)?;
            return self.builder.on_defined(value, true);
        }
        let value = self.parse_arg()?;
        self.builder.on_defined(value, false)
    }

    fn parse_yield(&mut self) -> PResult<Node> {
        self.bump()?;
        let token = self.peek()?;
        let arguments = if token.kind == TokenKind::LParen && !token.space_before {
            Some(self.parse_arg_paren()?)
        } else if self.value_follows()? {
            let parts = self.parse_call_args(None)?;
            Some(self.builder.on_args(parts))
        } else {
            None
        };
        self.builder.on_yield(arguments)
    }

    fn parse_super(&mut self) -> PResult<Node> {
        self.bump()?;
        let token = self.peek()?;
        if token.kind == TokenKind::LParen && !token.space_before {
            let arguments = self.parse_arg_paren()?;
            return self.builder.on_super(arguments);
        }
        if self.value_follows()? || self.at_op("&")? {
            let parts = self.without_do(|parser| parser.parse_call_args(None))?;
            let arguments = self.builder.on_args(parts);
            let call = self.builder.on_super(arguments)?;
            return self.parse_command_block(call);
        }
        self.builder.on_zsuper()
    }

    // ------------------------------------------------------------------
    // Method calls, indexing and blocks
    // ------------------------------------------------------------------

    fn parse_postfix(&mut self, mut node: Node) -> PResult<Node> {
        loop {
            if matches!(node.tag(), NodeTag::Command | NodeTag::CommandCall) {
                return Ok(node);
            }
            let token = self.peek()?;
            let kind = token.kind;
            let value = token.value.clone();
            node = match kind {
                TokenKind::Period => self.parse_method_call(node)?,
                TokenKind::Op if value == "&." => self.parse_method_call(node)?,
                TokenKind::Op if value == "::" => {
                    let constant = self.peek_nth(1)?.kind == TokenKind::Const;
                    let after = self.peek_nth(2)?;
                    let call = after.kind == TokenKind::LParen && !after.space_before;
                    if constant && !call {
                        self.bump()?;
                        let constant = self.leaf()?;
                        self.builder.on_const_path_ref(node, constant)?
                    } else {
                        self.parse_method_call(node)?
                    }
                }
                TokenKind::LBracket => self.parse_index(node)?,
                TokenKind::LBrace if takes_block(&node) => {
                    let block = self.parse_brace_block()?;
                    self.attach_block(node, block)?
                }
                TokenKind::Kw
                    if value == "do" && !self.restrictions.no_do && takes_block(&node) =>
                {
                    let block = self.parse_do_block()?;
                    self.attach_block(node, block)?
                }
                _ => return Ok(node),
            };
        }
    }

    /// `receiver.message`, `receiver&.message(args)`, `receiver.()` and `receiver.message args`
    fn parse_method_call(&mut self, receiver: Node) -> PResult<Node> {
        let operator = self.leaf()?;
        self.skip_newlines()?;

        if self.at(TokenKind::LParen)? {
            let arguments = self.parse_arg_paren()?;
            return self
                .builder
                .on_call(Some(receiver), Some(operator), None, Some(arguments));
        }

        let message = match self.peek_kind()? {
            TokenKind::Ident
            | TokenKind::Const
            | TokenKind::Op
            | TokenKind::Kw
            | TokenKind::Backtick => self.leaf()?,
            _ => return Err(self.error_here()),
        };

        let token = self.peek()?;
        if token.kind == TokenKind::LParen && !token.space_before {
            let arguments = self.parse_arg_paren()?;
            return self.builder.on_call(
                Some(receiver),
                Some(operator),
                Some(message),
                Some(arguments),
            );
        }
        if self.command_args_follow(false)? {
            let arguments = self.parse_command_args()?;
            let call =
                self.builder
                    .on_command_call(receiver, operator, message, Some(arguments))?;
            return self.parse_command_block(call);
        }
        self.builder
            .on_call(Some(receiver), Some(operator), Some(message), None)
    }

    fn parse_index(&mut self, collection: Node) -> PResult<Node> {
        self.bump()?;
        let parts = self.nested(|parser| parser.parse_call_args(Some(TokenKind::RBracket)))?;
        self.skip_newlines()?;
        self.expect(TokenKind::RBracket)?;
        let index = if parts.is_empty() {
            None
        } else {
            Some(self.builder.on_args(parts))
        };
        self.builder.on_aref(collection, index)
    }

    fn attach_block(&mut self, call: Node, block: Node) -> PResult<Node> {
        let call = match call.kind {
            NodeKind::VCall(VCall { value }) => self.builder.on_call(None, None, Some(*value), None)?,
            _ => call,
        };
        Ok(self.builder.on_method_add_block(call, block))
    }

    pub(super) fn parse_brace_block(&mut self) -> PResult<Node> {
        self.bump()?;
        self.scoped(true, |parser| {
            parser.nested(|parser| {
                let block_var = parser.parse_block_var()?;
                let statements = parser.parse_statements()?;
                parser.skip_newlines()?;
                parser.expect(TokenKind::RBrace)?;
                parser.builder.on_brace_block(block_var, statements)
            })
        })
    }

    pub(super) fn parse_do_block(&mut self) -> PResult<Node> {
        self.bump()?;
        self.scoped(true, |parser| {
            parser.nested(|parser| {
                let block_var = parser.parse_block_var()?;
                let bodystmt = parser.parse_bodystmt()?;
                parser.builder.on_do_block(block_var, bodystmt)
            })
        })
    }

    /// `|a, (b, c); local|`
    fn parse_block_var(&mut self) -> PResult<Option<Node>> {
        self.skip_newlines()?;
        if self.at_op("||")? {
            self.bump()?;
            let params = self.builder.on_params(
                Vec::new(),
                Vec::new(),
                None,
                Vec::new(),
                Vec::new(),
                None,
                None,
            );
            return Ok(Some(self.builder.on_block_var(params, Vec::new(), true)?));
        }
        if !self.at_op("|")? {
            return Ok(None);
        }
        self.bump()?;
        let params = self.parse_params(ParamsEnd::Pipe)?;
        let locals = self.parse_block_locals()?;
        self.expect_op("|")?;
        Ok(Some(self.builder.on_block_var(params, locals, false)?))
    }

    /// Block-local names after `;` in a parameter list
    pub(super) fn parse_block_locals(&mut self) -> PResult<Vec<Node>> {
        let mut locals = Vec::new();
        if !self.eat(TokenKind::Semicolon)? {
            return Ok(locals);
        }
        while self.at(TokenKind::Ident)? {
            let name = self.peek()?.value.clone();
            self.declare(&name);
            locals.push(self.leaf()?);
            if !self.eat(TokenKind::Comma)? {
                break;
            }
        }
        Ok(locals)
    }

    // ------------------------------------------------------------------
    // Arguments
    // ------------------------------------------------------------------

    pub(super) fn parse_arg_paren(&mut self) -> PResult<Node> {
        self.bump()?;
        let parts = self.nested(|parser| parser.parse_call_args(Some(TokenKind::RParen)))?;
        self.skip_newlines()?;
        self.expect(TokenKind::RParen)?;
        let arguments = if parts.is_empty() {
            None
        } else {
            Some(self.builder.on_args(parts))
        };
        self.builder.on_arg_paren(arguments)
    }

    /// Comma-separated arguments. Keyword arguments are gathered into one
    /// `BareAssocHash` and a block argument always ends the list. With a
    /// closer, newlines between arguments are insignificant and a trailing
    /// comma is allowed.
    pub(super) fn parse_call_args(&mut self, closer: Option<TokenKind>) -> PResult<Vec<Node>> {
        let mut parts = Vec::new();
        let mut assocs = Vec::new();
        let mut block = None;

        if let Some(closer) = closer {
            self.skip_newlines()?;
            if self.at(closer)? {
                return Ok(parts);
            }
        }

        loop {
            let token = self.peek()?;
            let kind = token.kind;
            let value = token.value.clone();
            match kind {
                TokenKind::Op if value == "*" => {
                    self.bump()?;
                    let splat = if self.value_follows()? {
                        Some(self.parse_arg()?)
                    } else {
                        None
                    };
                    parts.push(self.builder.on_arg_star(splat)?);
                }
                TokenKind::Op if value == "**" => {
                    self.bump()?;
                    let splat = if self.value_follows()? {
                        Some(self.parse_arg()?)
                    } else {
                        None
                    };
                    assocs.push(self.builder.on_assoc_splat(splat)?);
                }
                TokenKind::Op if value == "&" => {
                    self.bump()?;
                    let argument = if self.value_follows()? {
                        Some(self.parse_arg()?)
                    } else {
                        None
                    };
                    block = Some(self.builder.on_arg_block(argument)?);
                }
                TokenKind::Op if value == "..." && closer == Some(TokenKind::RParen) => {
                    self.bump()?;
                    parts.push(self.builder.on_args_forward()?);
                }
                TokenKind::Label => {
                    let key = self.leaf()?;
                    let value = if self.value_follows()? {
                        Some(self.parse_arg()?)
                    } else {
                        None
                    };
                    assocs.push(self.builder.on_assoc(key, value, false)?);
                }
                _ => {
                    let argument = self.parse_arg()?;
                    if is_label_symbol(&argument) {
                        let value = if self.value_follows()? {
                            Some(self.parse_arg()?)
                        } else {
                            None
                        };
                        assocs.push(self.builder.on_assoc(argument, value, false)?);
                    } else if self.at_op("=>")? {
                        self.bump()?;
                        self.skip_newlines()?;
                        let value = self.parse_arg()?;
                        assocs.push(self.builder.on_assoc(argument, Some(value), true)?);
                    } else {
                        parts.push(argument);
                    }
                }
            }

            if closer.is_some() {
                self.skip_newlines()?;
            }
            if !self.eat(TokenKind::Comma)? {
                break;
            }
            self.skip_newlines()?;
            if let Some(closer) = closer
                && self.at(closer)?
            {
                break;
            }
        }

        if !assocs.is_empty() {
            parts.push(self.builder.on_bare_assoc_hash(assocs));
        }
        parts.extend(block);
        Ok(parts)
    }
}
