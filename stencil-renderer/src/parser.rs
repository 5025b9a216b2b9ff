//! Parser for directive code.
//!
//! Statement directives from one template form a single token stream in which
//! every literal segment and expression directive appears as an
//! [`TokenKind::Emit`] placeholder. Braces and `for`/`if` headers may therefore
//! open in one directive and close in another, with template text between.
//!
//! Precedence, lowest first: sequence (`,`), assignment, conditional (`?:`),
//! `||`, `&&`, equality, relational, additive, multiplicative, unary, postfix,
//! member/call, primary. Semicolons are optional.
//!
//! Nesting is bounded by [`Parser::with_max_depth`]: every statement,
//! sub-expression and operator application counts as one level, so the
//! resulting tree is shallow enough for the recursive interpreter.

use crate::ast::*;
use crate::error::{ParseError, ParseResult, Span};
use crate::lexer::{Token, TokenKind};

/// Nesting levels allowed when no limit is configured.
pub const DEFAULT_MAX_DEPTH: usize = 128;

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    emissions: Vec<Option<Stmt>>,
    loop_depth: usize,
    switch_depth: usize,
    depth: usize,
    max_depth: usize,
}

impl Parser {
    /// A parser over `tokens`; an `Eof` token is appended if missing.
    pub fn new(tokens: Vec<Token>) -> Self {
        Self::with_emissions(tokens, Vec::new())
    }

    /// A parser whose `Emit(i)` tokens resolve to `emissions[i]`.
    pub fn with_emissions(mut tokens: Vec<Token>, emissions: Vec<Stmt>) -> Self {
        if !matches!(tokens.last(), Some(Token { kind: TokenKind::Eof, .. })) {
            let end = tokens.last().map_or(0, |t| t.span.end);
            tokens.push(Token::new(TokenKind::Eof, Span::new(end, end)));
        }
        Self {
            tokens,
            pos: 0,
            emissions: emissions.into_iter().map(Some).collect(),
            loop_depth: 0,
            switch_depth: 0,
            depth: 0,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Parse a whole program.
    pub fn parse_program(&mut self) -> ParseResult<Program> {
        let mut body = Vec::new();
        while !self.check(&TokenKind::Eof) {
            body.push(self.parse_stmt()?);
        }
        Ok(Program { body })
    }

    /// Parse the content of an expression directive: zero or more
    /// comma-separated values, then end of input.
    pub fn parse_print(&mut self) -> ParseResult<Vec<Expr>> {
        let mut args = Vec::new();
        if !self.check(&TokenKind::Eof) {
            args.push(self.parse_assignment()?);
            while self.eat(&TokenKind::Comma) {
                args.push(self.parse_assignment()?);
            }
        }
        self.expect(&TokenKind::Eof, "end of expression")?;
        Ok(args)
    }
}

// ==================== TOKEN HELPERS ====================

impl Parser {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_at(&self, n: usize) -> &TokenKind {
        &self.tokens[(self.pos + n).min(self.tokens.len() - 1)].kind
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.peek().kind) == std::mem::discriminant(kind)
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind, expected: &str) -> ParseResult<Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.error_expected(expected))
        }
    }

    fn expect_ident(&mut self, expected: &str) -> ParseResult<String> {
        match self.peek().kind.clone() {
            TokenKind::Ident(name) => {
                self.advance();
                Ok(name)
            }
            _ => Err(self.error_expected(expected)),
        }
    }

    fn error_expected(&self, expected: &str) -> ParseError {
        let token = self.peek();
        match token.kind {
            TokenKind::Eof => ParseError::unexpected_eof(token.span, expected),
            ref kind => ParseError::unexpected_token(token.span, expected, &kind.describe()),
        }
    }

    fn end_statement(&mut self) {
        self.eat(&TokenKind::Semicolon);
    }

    /// Go one nesting level deeper; the caller restores `depth`.
    fn enter(&mut self) -> ParseResult<()> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(ParseError::new(
                format!("nesting too deep (limit {})", self.max_depth),
                self.peek().span,
            ));
        }
        Ok(())
    }

    /// Run `parse` one level deeper. Levels entered inside it are released
    /// when it returns.
    fn nested<T>(&mut self, parse: impl FnOnce(&mut Self) -> ParseResult<T>) -> ParseResult<T> {
        let base = self.depth;
        self.enter()?;
        let result = parse(self);
        self.depth = base;
        result
    }
}

// ==================== STATEMENTS ====================

impl Parser {
    fn parse_stmt(&mut self) -> ParseResult<Stmt> {
        self.nested(Self::parse_stmt_kind)
    }

    fn parse_stmt_kind(&mut self) -> ParseResult<Stmt> {
        match self.peek().kind.clone() {
            TokenKind::Emit(index) => {
                self.advance();
                Ok(self
                    .emissions
                    .get_mut(index)
                    .and_then(Option::take)
                    .unwrap_or(Stmt::Empty))
            }
            TokenKind::Semicolon => {
                self.advance();
                Ok(Stmt::Empty)
            }
            TokenKind::LBrace => self.parse_block(),
            TokenKind::Var => {
                self.advance();
                let decls = self.parse_declarators()?;
                self.end_statement();
                Ok(Stmt::VarDecl(decls))
            }
            TokenKind::If => self.parse_if(),
            TokenKind::For => self.parse_for(),
            TokenKind::While => self.parse_while(),
            TokenKind::Do => self.parse_do_while(),
            TokenKind::Switch => self.parse_switch(),
            TokenKind::Break => {
                let token = self.advance();
                if self.loop_depth == 0 && self.switch_depth == 0 {
                    return Err(ParseError::new(
                        "`break` outside of a loop or switch",
                        token.span,
                    ));
                }
                self.end_statement();
                Ok(Stmt::Break)
            }
            TokenKind::Continue => {
                let token = self.advance();
                if self.loop_depth == 0 {
                    return Err(ParseError::new("`continue` outside of a loop", token.span));
                }
                self.end_statement();
                Ok(Stmt::Continue)
            }
            TokenKind::Else | TokenKind::Case | TokenKind::Default | TokenKind::RBrace => {
                Err(self.error_expected("statement"))
            }
            _ => {
                let expr = self.parse_sequence()?;
                self.end_statement();
                Ok(Stmt::Expr(expr))
            }
        }
    }

    fn parse_block(&mut self) -> ParseResult<Stmt> {
        self.expect(&TokenKind::LBrace, "`{`")?;
        let mut body = Vec::new();
        while !self.check(&TokenKind::RBrace) {
            if self.check(&TokenKind::Eof) {
                return Err(self.error_expected("`}`"));
            }
            body.push(self.parse_stmt()?);
        }
        self.advance();
        Ok(Stmt::Block(body))
    }

    fn parse_declarators(&mut self) -> ParseResult<Vec<(String, Option<Expr>)>> {
        let mut decls = Vec::new();
        loop {
            let name = self.expect_ident("variable name")?;
            let init = if self.eat(&TokenKind::Assign) {
                Some(self.parse_assignment()?)
            } else {
                None
            };
            decls.push((name, init));
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        Ok(decls)
    }

    fn parse_paren_expr(&mut self) -> ParseResult<Expr> {
        self.expect(&TokenKind::LParen, "`(`")?;
        let expr = self.parse_sequence()?;
        self.expect(&TokenKind::RParen, "`)`")?;
        Ok(expr)
    }

    fn parse_if(&mut self) -> ParseResult<Stmt> {
        self.expect(&TokenKind::If, "`if`")?;
        let test = self.parse_paren_expr()?;
        let then = Box::new(self.parse_stmt()?);
        let otherwise = if self.eat(&TokenKind::Else) {
            Some(Box::new(self.parse_stmt()?))
        } else {
            None
        };
        Ok(Stmt::If {
            test,
            then,
            otherwise,
        })
    }

    fn parse_loop_body(&mut self) -> ParseResult<Box<Stmt>> {
        self.loop_depth += 1;
        let body = self.parse_stmt();
        self.loop_depth -= 1;
        body.map(Box::new)
    }

    fn parse_for(&mut self) -> ParseResult<Stmt> {
        self.expect(&TokenKind::For, "`for`")?;
        self.expect(&TokenKind::LParen, "`(`")?;

        // for (var k in obj) / for (k in obj)
        let declare = self.check(&TokenKind::Var);
        let name_at = usize::from(declare);
        let is_for_in = matches!(self.peek_at(name_at), TokenKind::Ident(_))
            && matches!(self.peek_at(name_at + 1), TokenKind::In);
        if is_for_in {
            if declare {
                self.advance();
            }
            let name = self.expect_ident("loop variable")?;
            self.expect(&TokenKind::In, "`in`")?;
            let object = self.parse_sequence()?;
            self.expect(&TokenKind::RParen, "`)`")?;
            let body = self.parse_loop_body()?;
            return Ok(Stmt::ForIn {
                binding: name,
                declare,
                object,
                body,
            });
        }

        let init = if self.eat(&TokenKind::Var) {
            Some(Box::new(Stmt::VarDecl(self.parse_declarators()?)))
        } else if self.check(&TokenKind::Semicolon) {
            None
        } else {
            Some(Box::new(Stmt::Expr(self.parse_sequence()?)))
        };
        self.expect(&TokenKind::Semicolon, "`;`")?;

        let test = if self.check(&TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_sequence()?)
        };
        self.expect(&TokenKind::Semicolon, "`;`")?;

        let update = if self.check(&TokenKind::RParen) {
            None
        } else {
            Some(self.parse_sequence()?)
        };
        self.expect(&TokenKind::RParen, "`)`")?;

        let body = self.parse_loop_body()?;
        Ok(Stmt::For {
            init,
            test,
            update,
            body,
        })
    }

    fn parse_while(&mut self) -> ParseResult<Stmt> {
        self.expect(&TokenKind::While, "`while`")?;
        let test = self.parse_paren_expr()?;
        let body = self.parse_loop_body()?;
        Ok(Stmt::While { test, body })
    }

    fn parse_do_while(&mut self) -> ParseResult<Stmt> {
        self.expect(&TokenKind::Do, "`do`")?;
        let body = self.parse_loop_body()?;
        self.expect(&TokenKind::While, "`while`")?;
        let test = self.parse_paren_expr()?;
        self.end_statement();
        Ok(Stmt::DoWhile { body, test })
    }

    fn parse_switch(&mut self) -> ParseResult<Stmt> {
        self.expect(&TokenKind::Switch, "`switch`")?;
        let discriminant = self.parse_paren_expr()?;
        self.expect(&TokenKind::LBrace, "`{`")?;

        self.switch_depth += 1;
        let cases = self.parse_switch_cases();
        self.switch_depth -= 1;
        let cases = cases?;

        self.expect(&TokenKind::RBrace, "`}`")?;
        Ok(Stmt::Switch {
            discriminant,
            cases,
        })
    }

    fn parse_switch_cases(&mut self) -> ParseResult<Vec<SwitchCase>> {
        let mut cases: Vec<SwitchCase> = Vec::new();
        let mut seen_default = false;
        loop {
            let test = match self.peek().kind {
                TokenKind::Case => {
                    self.advance();
                    Some(self.parse_sequence()?)
                }
                TokenKind::Default => {
                    let token = self.advance();
                    if seen_default {
                        return Err(ParseError::new(
                            "more than one `default` clause in switch",
                            token.span,
                        ));
                    }
                    seen_default = true;
                    None
                }
                TokenKind::RBrace => return Ok(cases),
                // Template text before the first `case` is unreachable.
                TokenKind::Emit(_) if cases.is_empty() => {
                    self.advance();
                    continue;
                }
                _ => return Err(self.error_expected("`case`, `default` or `}`")),
            };
            self.expect(&TokenKind::Colon, "`:`")?;

            let mut body = Vec::new();
            while !matches!(
                self.peek().kind,
                TokenKind::Case | TokenKind::Default | TokenKind::RBrace | TokenKind::Eof
            ) {
                body.push(self.parse_stmt()?);
            }
            cases.push(SwitchCase { test, body });
        }
    }
}

// ==================== EXPRESSIONS ====================

impl Parser {
    pub(crate) fn parse_sequence(&mut self) -> ParseResult<Expr> {
        let first = self.parse_assignment()?;
        if !self.check(&TokenKind::Comma) {
            return Ok(first);
        }
        let mut items = vec![first];
        while self.eat(&TokenKind::Comma) {
            items.push(self.parse_assignment()?);
        }
        Ok(Expr::Sequence(items))
    }

    fn parse_assignment(&mut self) -> ParseResult<Expr> {
        self.nested(Self::parse_assignment_expr)
    }

    fn parse_assignment_expr(&mut self) -> ParseResult<Expr> {
        let target_span = self.peek().span;
        let lhs = self.parse_conditional()?;

        let op = match self.peek().kind {
            TokenKind::Assign => AssignOp::Assign,
            TokenKind::PlusAssign => AssignOp::Compound(BinaryOp::Add),
            TokenKind::MinusAssign => AssignOp::Compound(BinaryOp::Sub),
            TokenKind::StarAssign => AssignOp::Compound(BinaryOp::Mul),
            TokenKind::SlashAssign => AssignOp::Compound(BinaryOp::Div),
            TokenKind::PercentAssign => AssignOp::Compound(BinaryOp::Rem),
            _ => return Ok(lhs),
        };
        let Expr::Ident(target) = lhs else {
            return Err(ParseError::new(
                "invalid assignment target; only variables can be assigned",
                target_span,
            ));
        };
        self.advance();
        let value = self.parse_assignment()?;
        Ok(Expr::Assign {
            op,
            target,
            value: Box::new(value),
        })
    }

    fn parse_conditional(&mut self) -> ParseResult<Expr> {
        let test = self.parse_or()?;
        if !self.eat(&TokenKind::Question) {
            return Ok(test);
        }
        let then = self.parse_assignment()?;
        self.expect(&TokenKind::Colon, "`:`")?;
        let otherwise = self.parse_assignment()?;
        Ok(Expr::Conditional {
            test: Box::new(test),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        })
    }

    fn parse_or(&mut self) -> ParseResult<Expr> {
        let mut lhs = self.parse_and()?;
        while self.eat(&TokenKind::OrOr) {
            let rhs = self.parse_and()?;
            self.enter()?;
            lhs = Expr::Logical {
                op: LogicalOp::Or,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> ParseResult<Expr> {
        let mut lhs = self.parse_equality()?;
        while self.eat(&TokenKind::AndAnd) {
            let rhs = self.parse_equality()?;
            self.enter()?;
            lhs = Expr::Logical {
                op: LogicalOp::And,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn parse_equality(&mut self) -> ParseResult<Expr> {
        let mut lhs = self.parse_relational()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::EqEq => BinaryOp::Eq,
                TokenKind::NotEq => BinaryOp::NotEq,
                TokenKind::EqEqEq => BinaryOp::StrictEq,
                TokenKind::NotEqEq => BinaryOp::StrictNotEq,
                _ => return Ok(lhs),
            };
            self.advance();
            let rhs = self.parse_relational()?;
            self.enter()?;
            lhs = binary(op, lhs, rhs);
        }
    }

    fn parse_relational(&mut self) -> ParseResult<Expr> {
        let mut lhs = self.parse_additive()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Lt => BinaryOp::Lt,
                TokenKind::LtEq => BinaryOp::LtEq,
                TokenKind::Gt => BinaryOp::Gt,
                TokenKind::GtEq => BinaryOp::GtEq,
                _ => return Ok(lhs),
            };
            self.advance();
            let rhs = self.parse_additive()?;
            self.enter()?;
            lhs = binary(op, lhs, rhs);
        }
    }

    fn parse_additive(&mut self) -> ParseResult<Expr> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => return Ok(lhs),
            };
            self.advance();
            let rhs = self.parse_multiplicative()?;
            self.enter()?;
            lhs = binary(op, lhs, rhs);
        }
    }

    fn parse_multiplicative(&mut self) -> ParseResult<Expr> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::Percent => BinaryOp::Rem,
                _ => return Ok(lhs),
            };
            self.advance();
            let rhs = self.parse_unary()?;
            self.enter()?;
            lhs = binary(op, lhs, rhs);
        }
    }

    fn parse_unary(&mut self) -> ParseResult<Expr> {
        let op = match self.peek().kind {
            TokenKind::Bang => UnaryOp::Not,
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Plus => UnaryOp::Plus,
            TokenKind::Typeof => UnaryOp::Typeof,
            TokenKind::PlusPlus | TokenKind::MinusMinus => {
                let token = self.advance();
                let op = if token.kind == TokenKind::PlusPlus {
                    UpdateOp::Increment
                } else {
                    UpdateOp::Decrement
                };
                let target = self.expect_ident("variable after prefix operator")?;
                return Ok(Expr::Update {
                    op,
                    prefix: true,
                    target,
                });
            }
            _ => return self.parse_postfix(),
        };
        self.advance();
        self.enter()?;
        let operand = self.parse_unary()?;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    fn parse_postfix(&mut self) -> ParseResult<Expr> {
        let span = self.peek().span;
        let expr = self.parse_member()?;
        let op = match self.peek().kind {
            TokenKind::PlusPlus => UpdateOp::Increment,
            TokenKind::MinusMinus => UpdateOp::Decrement,
            _ => return Ok(expr),
        };
        let Expr::Ident(target) = expr else {
            return Err(ParseError::new(
                "invalid update target; only variables can be incremented",
                span,
            ));
        };
        self.advance();
        Ok(Expr::Update {
            op,
            prefix: false,
            target,
        })
    }

    fn parse_member(&mut self) -> ParseResult<Expr> {
        let mut expr = self.parse_primary()?;
        loop {
            if matches!(
                self.peek().kind,
                TokenKind::Dot | TokenKind::LBracket | TokenKind::LParen
            ) {
                self.enter()?;
            }
            match self.peek().kind {
                TokenKind::Dot => {
                    self.advance();
                    let token = self.advance();
                    let property = match token.kind {
                        TokenKind::Ident(name) => name,
                        ref kind => match kind.keyword_text() {
                            Some(word) => word.to_string(),
                            None => {
                                return Err(ParseError::unexpected_token(
                                    token.span,
                                    "property name",
                                    &kind.describe(),
                                ))
                            }
                        },
                    };
                    expr = Expr::Member {
                        object: Box::new(expr),
                        property,
                    };
                }
                TokenKind::LBracket => {
                    self.advance();
                    let index = self.parse_sequence()?;
                    self.expect(&TokenKind::RBracket, "`]`")?;
                    expr = Expr::Index {
                        object: Box::new(expr),
                        index: Box::new(index),
                    };
                }
                TokenKind::LParen => {
                    self.advance();
                    let args = self.parse_arguments(&TokenKind::RParen, "`)`")?;
                    expr = Expr::Call {
                        callee: Box::new(expr),
                        args,
                    };
                }
                _ => return Ok(expr),
            }
        }
    }

    /// Comma-separated expressions up to and including `close`.
    fn parse_arguments(&mut self, close: &TokenKind, expected: &str) -> ParseResult<Vec<Expr>> {
        let mut args = Vec::new();
        if self.eat(close) {
            return Ok(args);
        }
        loop {
            args.push(self.parse_assignment()?);
            if self.eat(close) {
                return Ok(args);
            }
            self.expect(&TokenKind::Comma, expected)?;
        }
    }

    fn parse_primary(&mut self) -> ParseResult<Expr> {
        let token = self.advance();
        let expr = match token.kind {
            TokenKind::Number(n) => Expr::Number(n),
            TokenKind::Str(s) => Expr::Str(s),
            TokenKind::True => Expr::Bool(true),
            TokenKind::False => Expr::Bool(false),
            TokenKind::Null => Expr::Null,
            TokenKind::This => Expr::This,
            TokenKind::Ident(name) => match name.as_str() {
                "undefined" => Expr::Undefined,
                "NaN" => Expr::Number(f64::NAN),
                "Infinity" => Expr::Number(f64::INFINITY),
                _ => Expr::Ident(name),
            },
            TokenKind::LParen => {
                let expr = self.parse_sequence()?;
                self.expect(&TokenKind::RParen, "`)`")?;
                expr
            }
            TokenKind::LBracket => {
                Expr::Array(self.parse_arguments(&TokenKind::RBracket, "`]`")?)
            }
            TokenKind::Eof => return Err(ParseError::unexpected_eof(token.span, "expression")),
            kind => {
                return Err(ParseError::unexpected_token(
                    token.span,
                    "expression",
                    &kind.describe(),
                ))
            }
        };
        Ok(expr)
    }
}

fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
    Expr::Binary {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    }
}
