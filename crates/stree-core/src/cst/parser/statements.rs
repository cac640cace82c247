//! Statement lists, modifiers, multiple assignment and control flow

use super::{PResult, Parser, Restrictions, is_terminator, starts_value};
use crate::cst::node::{Assign, Node, NodeKind, NodeTag};
use crate::cst::token::{Token, TokenKind};
use crate::error::ParseError;

/// Expressions that may start a multiple assignment
fn is_mlhs_target(node: &Node) -> bool {
    match &node.kind {
        NodeKind::VCall(_)
        | NodeKind::ARef(_)
        | NodeKind::ConstPathRef(_)
        | NodeKind::TopConstRef(_)
        | NodeKind::MlhsParen(_)
        | NodeKind::ArgStar(_) => true,
        NodeKind::VarRef(var) => !var.value.is(NodeTag::Kw),
        NodeKind::CallNode(call) => {
            call.receiver.is_some()
                && call.operator.is_some()
                && call.message.is_some()
                && call.arguments.is_none()
        }
        _ => false,
    }
}

impl Parser<'_> {
    /// Statements up to a closing keyword or bracket
    pub(super) fn parse_statements(&mut self) -> PResult<Node> {
        let mut body = Vec::new();
        loop {
            let token = self.peek()?;
            if matches!(token.kind, TokenKind::Newline | TokenKind::Semicolon) {
                self.bump()?;
                continue;
            }
            if is_terminator(token) {
                break;
            }

            body.push(self.parse_stmt()?);
            let token = self.peek()?;
            let separated = matches!(token.kind, TokenKind::Newline | TokenKind::Semicolon)
                || is_terminator(token);
            if !separated {
                return Err(self.error_here());
            }
        }
        Ok(self.builder.on_stmts(body))
    }

    /// A statement with any trailing modifiers
    pub(super) fn parse_stmt(&mut self) -> PResult<Node> {
        self.enter()?;
        let result = self.parse_stmt_inner();
        self.leave();
        result
    }

    fn parse_stmt_inner(&mut self) -> PResult<Node> {
        let mut statement = self.parse_expr_stmt()?;
        loop {
            let token = self.peek()?;
            if token.kind != TokenKind::Kw {
                break;
            }
            let keyword = token.value.clone();
            match keyword.as_str() {
                "if" | "unless" | "while" | "until" => {
                    self.bump()?;
                    let predicate = self.parse_expr()?;
                    statement = self.builder.on_modifier(&keyword, statement, predicate)?;
                }
                "rescue" => {
                    self.bump()?;
                    let value = self.parse_expr()?;
                    statement = self.builder.on_rescue_mod(statement, value)?;
                }
                _ => break,
            }
        }
        Ok(statement)
    }

    fn parse_expr_stmt(&mut self) -> PResult<Node> {
        if self.at_op("*")? {
            let first = self.parse_mlhs_item()?;
            return self.parse_multiple_assignment(first);
        }

        let expression = self.parse_expr()?;
        if self.at(TokenKind::Comma)? {
            if is_mlhs_target(&expression) {
                return self.parse_multiple_assignment(expression);
            }
            if let NodeKind::Assign(assign) = expression.kind {
                return self.parse_mrhs_assignment(assign);
            }
        }
        if expression.is(NodeTag::MlhsParen) && self.at_op("=")? {
            self.bump()?;
            let value = self.parse_mrhs()?;
            return self.builder.on_massign(expression, value);
        }
        if self.at_op("=>")? || self.at_kw("in")? {
            return self.parse_rassign(expression);
        }
        Ok(expression)
    }

    /// `value => pattern` and `value in pattern`
    pub(super) fn parse_rassign(&mut self, value: Node) -> PResult<Node> {
        let operator = self.leaf()?;
        let pattern = self.parse_pattern_top()?;
        self.builder.on_rassign(value, operator, pattern)
    }

    /// The rest of `a, b = ...` once the first target is known. Without an
    /// `=` the targets are returned as an `Mlhs`, as inside `(a, b)` and `for`.
    fn parse_multiple_assignment(&mut self, first: Node) -> PResult<Node> {
        let mut parts = vec![self.to_target(first)?];
        let mut comma = false;
        while self.eat(TokenKind::Comma)? {
            let token = self.peek()?;
            if token.is_op("=") || token.is_kw("in") || token.kind == TokenKind::RParen {
                comma = true;
                break;
            }
            parts.push(self.parse_mlhs_item()?);
        }
        let targets = self.builder.on_mlhs(parts, comma);
        if !self.at_op("=")? {
            return Ok(targets);
        }
        self.bump()?;
        self.skip_newlines()?;
        let value = self.parse_mrhs()?;
        self.builder.on_massign(targets, value)
    }

    /// One target of a multiple assignment: `a`, `*rest`, `(b, c)`, `obj.attr`, `h[k]`
    pub(super) fn parse_mlhs_item(&mut self) -> PResult<Node> {
        let restrictions = Restrictions {
            no_assign: true,
            ..self.restrictions
        };
        self.restricted(restrictions, |parser| {
            if parser.at_op("*")? {
                parser.bump()?;
                let value = if parser.peek()?.kind == TokenKind::Comma
                    || parser.at_op("=")?
                    || parser.at(TokenKind::RParen)?
                {
                    None
                } else {
                    let target = parser.parse_primary_postfix()?;
                    Some(parser.to_target(target)?)
                };
                return parser.builder.on_arg_star(value);
            }
            let target = parser.parse_primary_postfix()?;
            parser.to_target(target)
        })
    }

    /// Turn an expression into an assignment target, declaring new locals
    pub(super) fn to_target(&mut self, node: Node) -> PResult<Node> {
        let target = self.builder.on_target(node)?;
        if let NodeKind::VarField(field) = &target.kind
            && let Some(value) = &field.value
            && value.is(NodeTag::Ident)
            && let Some(name) = value.token_value()
        {
            let name = name.to_string();
            self.declare(&name);
        }
        Ok(target)
    }

    /// `a = 1, 2`: the values after the first gathered into a list
    fn parse_mrhs_assignment(&mut self, assign: Assign) -> PResult<Node> {
        let mut rest = Vec::new();
        while self.eat(TokenKind::Comma)? {
            self.skip_newlines()?;
            rest.push(self.parse_mrhs_part()?);
        }
        Ok(self.builder.on_assign_mrhs(assign, rest))
    }

    /// One value on the right of an assignment, possibly splatted
    pub(super) fn parse_mrhs_part(&mut self) -> PResult<Node> {
        if self.at_op("*")? {
            self.bump()?;
            let value = self.parse_arg()?;
            return self.builder.on_arg_star(Some(value));
        }
        self.parse_arg()
    }

    /// The right side of a multiple assignment
    fn parse_mrhs(&mut self) -> PResult<Node> {
        let mut parts = Vec::new();
        loop {
            parts.push(self.parse_mrhs_part()?);
            if !self.eat(TokenKind::Comma)? {
                break;
            }
            self.skip_newlines()?;
        }
        if parts.len() == 1
            && !parts[0].is(NodeTag::ArgStar)
            && let Some(value) = parts.pop()
        {
            return Ok(value);
        }
        Ok(self.builder.on_mrhs(parts))
    }

    // ------------------------------------------------------------------
    // Bodies with rescue, else and ensure
    // ------------------------------------------------------------------

    /// Statements with optional clauses, through the closing `end`
    pub(super) fn parse_bodystmt(&mut self) -> PResult<Node> {
        let statements = self.parse_statements()?;

        let mut rescues = Vec::new();
        while self.at_kw("rescue")? {
            self.bump()?;
            let exception = self.parse_rescue_head()?;
            self.skip_terms()?;
            self.eat_kw("then")?;
            let body = self.parse_statements()?;
            rescues.push((exception, body));
        }

        let else_statements = if self.eat_kw("else")? {
            Some(self.parse_statements()?)
        } else {
            None
        };

        let ensure_statements = if self.eat_kw("ensure")? {
            Some(self.parse_statements()?)
        } else {
            None
        };

        self.expect_kw("end")?;

        let ensure_clause = match ensure_statements {
            Some(statements) => Some(self.builder.on_ensure(statements)?),
            None => None,
        };
        let mut rescue_clause = None;
        for (exception, body) in rescues.into_iter().rev() {
            rescue_clause = Some(self.builder.on_rescue(exception, body, rescue_clause)?);
        }
        self.builder
            .on_bodystmt(statements, rescue_clause, else_statements, ensure_clause)
    }

    /// `Error, Other => name` after `rescue`
    fn parse_rescue_head(&mut self) -> PResult<Option<Node>> {
        let mut exceptions = Vec::new();
        loop {
            let token = self.peek()?;
            if !starts_value(token) || token.kind == TokenKind::LBrace {
                break;
            }
            let exception = if token.is_op("*") {
                self.bump()?;
                let value = self.parse_arg()?;
                self.builder.on_arg_star(Some(value))?
            } else {
                self.parse_arg()?
            };
            exceptions.push(exception);
            if !self.eat(TokenKind::Comma)? {
                break;
            }
            self.skip_newlines()?;
        }

        let exceptions = if exceptions.len() == 1 && !exceptions[0].is(NodeTag::ArgStar) {
            exceptions.pop()
        } else if exceptions.is_empty() {
            None
        } else {
            Some(self.builder.on_mrhs(exceptions))
        };

        let variable = if self.at_op("=>")? {
            self.bump()?;
            Some(self.parse_mlhs_item()?)
        } else {
            None
        };

        if exceptions.is_none() && variable.is_none() {
            return Ok(None);
        }
        Ok(Some(self.builder.on_rescue_ex(exceptions, variable)?))
    }

    // ------------------------------------------------------------------
    // Conditionals and loops
    // ------------------------------------------------------------------

    fn parse_then(&mut self) -> PResult<()> {
        self.skip_terms()?;
        self.eat_kw("then")?;
        Ok(())
    }

    pub(super) fn parse_if(&mut self) -> PResult<Node> {
        let (keyword, _) = self.bump()?;
        let predicate = self.parse_expr()?;
        self.parse_then()?;
        let statements = self.parse_statements()?;

        let mut branches = Vec::new();
        while keyword.value == "if" && self.eat_kw("elsif")? {
            let predicate = self.parse_expr()?;
            self.parse_then()?;
            let body = self.parse_statements()?;
            branches.push((predicate, body));
        }
        let else_statements = if self.eat_kw("else")? {
            Some(self.parse_statements()?)
        } else {
            None
        };
        self.expect_kw("end")?;

        let mut consequent = match else_statements {
            Some(body) => Some(self.builder.on_else(body)?),
            None => None,
        };
        for (predicate, body) in branches.into_iter().rev() {
            consequent = Some(self.builder.on_elsif(predicate, body, consequent)?);
        }
        if keyword.value == "if" {
            self.builder.on_if(predicate, statements, consequent)
        } else {
            self.builder.on_unless(predicate, statements, consequent)
        }
    }

    pub(super) fn parse_while(&mut self) -> PResult<Node> {
        let (keyword, _) = self.bump()?;
        let predicate = self.without_do(|parser| parser.parse_expr())?;
        self.skip_terms()?;
        self.eat_kw("do")?;
        let statements = self.parse_statements()?;
        self.expect_kw("end")?;
        self.builder.on_while(&keyword.value, predicate, statements)
    }

    pub(super) fn parse_for(&mut self) -> PResult<Node> {
        self.bump()?;
        let first = self.parse_mlhs_item()?;
        let index = if self.at(TokenKind::Comma)? {
            self.parse_multiple_assignment(first)?
        } else {
            first
        };
        self.expect_kw("in")?;
        let collection = self.without_do(|parser| parser.parse_expr())?;
        self.skip_terms()?;
        self.eat_kw("do")?;
        let statements = self.parse_statements()?;
        self.expect_kw("end")?;
        self.builder.on_for(index, collection, statements)
    }

    pub(super) fn parse_case(&mut self) -> PResult<Node> {
        self.bump()?;
        let token = self.peek()?;
        let value = if matches!(token.kind, TokenKind::Newline | TokenKind::Semicolon)
            || token.is_kw("when")
        {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.skip_terms()?;

        enum Clause {
            When(Node, Node),
            In(Node, Node),
        }

        let mut clauses = Vec::new();
        loop {
            if self.eat_kw("when")? {
                let parts = self.without_do(|parser| parser.parse_call_args(None))?;
                let arguments = self.builder.on_args(parts);
                self.parse_then()?;
                clauses.push(Clause::When(arguments, self.parse_statements()?));
            } else if self.eat_kw("in")? {
                let pattern = self.parse_pattern_clause()?;
                self.parse_then()?;
                clauses.push(Clause::In(pattern, self.parse_statements()?));
            } else {
                break;
            }
        }
        if clauses.is_empty() {
            return Err(self.error_here());
        }

        let else_statements = if self.eat_kw("else")? {
            Some(self.parse_statements()?)
        } else {
            None
        };
        self.expect_kw("end")?;

        let mut consequent = match else_statements {
            Some(body) => Some(self.builder.on_else(body)?),
            None => None,
        };
        for clause in clauses.into_iter().rev() {
            consequent = Some(match clause {
                Clause::When(arguments, body) => {
                    self.builder.on_when(arguments, body, consequent)?
                }
                Clause::In(pattern, body) => self.builder.on_in(pattern, body, consequent)?,
            });
        }
        match consequent {
            Some(consequent) => self.builder.on_case(value, consequent),
            None => Err(self.error_here()),
        }
    }

    pub(super) fn parse_begin(&mut self) -> PResult<Node> {
        self.bump()?;
        let bodystmt = self.nested(|parser| parser.parse_bodystmt())?;
        self.builder.on_begin(bodystmt)
    }

    /// `BEGIN { ... }` and `END { ... }`
    pub(super) fn parse_program_hook(&mut self) -> PResult<Node> {
        let (keyword, _) = self.bump()?;
        self.expect(TokenKind::LBrace)?;
        let statements = self.nested(|parser| parser.parse_statements())?;
        self.skip_newlines()?;
        self.expect(TokenKind::RBrace)?;
        self.builder.on_program_hook(&keyword.value, statements)
    }

    // ------------------------------------------------------------------
    // Jumps, alias and undef
    // ------------------------------------------------------------------

    /// `return`, `break` and `next`, with optional values
    pub(super) fn parse_jump(&mut self) -> PResult<Node> {
        let (keyword, _) = self.bump()?;
        let arguments = if self.value_follows()? {
            let parts = self.parse_call_args(None)?;
            Some(self.builder.on_args(parts))
        } else {
            None
        };
        self.builder.on_jump(&keyword.value, arguments)
    }

    /// `alias new old` between two methods or two global variables
    pub(super) fn parse_alias(&mut self) -> PResult<Node> {
        self.bump()?;
        let new_name = self.peek()?.clone();
        let left = self.parse_method_reference()?;
        let old_name = self.peek()?.clone();
        let right = self.parse_method_reference()?;

        let global = |token: &Token| matches!(token.kind, TokenKind::GVar | TokenKind::Backref);
        let message = if new_name.kind == TokenKind::Backref {
            Some("can't set variable")
        } else if global(&new_name) && is_nth_ref(&old_name) {
            Some("can't make alias for the number variables")
        } else if global(&new_name) != global(&old_name) {
            Some("invalid alias operands")
        } else {
            None
        };
        if let Some(message) = message {
            let location = self.builder.location_of(&new_name);
            return Err(ParseError::new(
                message,
                location.start_line,
                location.start_column,
            ));
        }
        self.builder.on_alias(left, right)
    }

    pub(super) fn parse_undef(&mut self) -> PResult<Node> {
        self.bump()?;
        let mut symbols = vec![self.parse_method_reference()?];
        while self.eat(TokenKind::Comma)? {
            self.skip_newlines()?;
            symbols.push(self.parse_method_reference()?);
        }
        self.builder.on_undef(symbols)
    }

    /// An `alias` or `undef` operand: a symbol, a bare name or a global
    fn parse_method_reference(&mut self) -> PResult<Node> {
        match self.peek_kind()? {
            TokenKind::SymBeg => self.parse_symbol(),
            TokenKind::Ident
            | TokenKind::Const
            | TokenKind::GVar
            | TokenKind::Backref
            | TokenKind::Op
            | TokenKind::Kw => self.leaf(),
            _ => Err(self.error_here()),
        }
    }

    /// Whether the next token begins a value on the same line
    pub(super) fn value_follows(&mut self) -> PResult<bool> {
        Ok(starts_value(self.peek()?))
    }
}

/// `$1`, `$2` and so on
fn is_nth_ref(token: &Token) -> bool {
    token.kind == TokenKind::Backref
        && token.value.len() > 1
        && token.value[1..].bytes().all(|byte| byte.is_ascii_digit())
}
