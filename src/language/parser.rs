use crate::language::{
    ast::*,
    errors::SyntaxError,
    lexer::scan,
    span::Span,
    token::{Literal, Token, TokenKind},
};
use std::rc::Rc;

const MAX_ARGS: usize = 255;

/// Statements parsed so far plus every syntax error met on the way.
#[derive(Debug)]
pub struct Parsed {
    pub statements: Vec<Stmt>,
    pub errors: Vec<SyntaxError>,
}

pub fn parse(tokens: Vec<Token>) -> Parsed {
    Parser::new(tokens).parse()
}

/// Scan and parse in one go. Lexical errors come first, in source order.
pub fn parse_source(source: &str) -> Parsed {
    let scanned = scan(source);
    let mut parsed = parse(scanned.tokens);
    let mut errors = scanned.errors;
    errors.append(&mut parsed.errors);
    parsed.errors = errors;
    parsed
}

type ParseResult<T> = Result<T, SyntaxError>;

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    errors: Vec<SyntaxError>,
    // Number of function bodies enclosing the current token.
    function_depth: usize,
}

impl Parser {
    fn new(mut tokens: Vec<Token>) -> Self {
        if !tokens.last().is_some_and(|token| token.is(TokenKind::Eof)) {
            let (line, end) = tokens
                .last()
                .map(|token| (token.line, token.span.end))
                .unwrap_or((1, 0));
            tokens.push(Token::new(TokenKind::Eof, "", line, Span::new(end, end)));
        }
        Self {
            tokens,
            pos: 0,
            errors: Vec::new(),
            function_depth: 0,
        }
    }

    fn parse(mut self) -> Parsed {
        let mut statements = Vec::new();
        while !self.is_eof() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }
        tracing::debug!(
            statements = statements.len(),
            errors = self.errors.len(),
            "parsed program"
        );
        Parsed {
            statements,
            errors: self.errors,
        }
    }

    fn declaration(&mut self) -> Option<Stmt> {
        let result = if self.matches(TokenKind::Fun) {
            self.parse_function("function")
        } else if self.matches(TokenKind::Var) {
            self.parse_var()
        } else {
            self.parse_statement()
        };

        match result {
            Ok(stmt) => Some(stmt),
            Err(err) => {
                self.report(err);
                self.synchronize();
                None
            }
        }
    }

    fn parse_function(&mut self, kind: &str) -> ParseResult<Stmt> {
        let name = self.expect(TokenKind::Identifier, &format!("Expect {kind} name."))?;
        self.expect(
            TokenKind::LeftParen,
            &format!("Expect '(' after {kind} name."),
        )?;
        let mut params = Vec::new();
        if !self.check(TokenKind::RightParen) {
            loop {
                if params.len() >= MAX_ARGS {
                    let err = self.error_here("Can't have more than 255 parameters.");
                    self.report(err);
                }
                params.push(self.expect(TokenKind::Identifier, "Expect parameter name.")?);
                if !self.matches(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RightParen, "Expect ')' after parameters.")?;
        self.expect(
            TokenKind::LeftBrace,
            &format!("Expect '{{' before {kind} body."),
        )?;
        self.function_depth += 1;
        let body = self.parse_block();
        self.function_depth -= 1;
        let body = body?;
        Ok(Stmt::Function(Rc::new(FunctionDecl { name, params, body })))
    }

    fn parse_var(&mut self) -> ParseResult<Stmt> {
        let name = self.expect(TokenKind::Identifier, "Expect variable name.")?;
        let initializer = if self.matches(TokenKind::Equal) {
            Some(self.parse_expression()?)
        } else {
            None
        };
        self.expect(
            TokenKind::Semicolon,
            "Expect ';' after variable declaration.",
        )?;
        Ok(Stmt::Var { name, initializer })
    }

    fn parse_statement(&mut self) -> ParseResult<Stmt> {
        if self.matches(TokenKind::For) {
            return self.parse_for();
        }
        if self.matches(TokenKind::If) {
            return self.parse_if();
        }
        if self.matches(TokenKind::Print) {
            let keyword = self.previous().clone();
            let value = self.parse_expression()?;
            self.expect(TokenKind::Semicolon, "Expect ';' after value.")?;
            return Ok(Stmt::Print { keyword, value });
        }
        if self.matches(TokenKind::Return) {
            return self.parse_return();
        }
        if self.matches(TokenKind::While) {
            return self.parse_while();
        }
        if self.matches(TokenKind::LeftBrace) {
            return Ok(Stmt::Block(self.parse_block()?));
        }

        let expr = self.parse_expression()?;
        self.expect(TokenKind::Semicolon, "Expect ';' after expression.")?;
        Ok(Stmt::Expression(expr))
    }

    fn parse_return(&mut self) -> ParseResult<Stmt> {
        let keyword = self.previous().clone();
        if self.function_depth == 0 {
            self.report(SyntaxError::at_token(
                &keyword,
                "Can't return from top-level code.",
            ));
        }
        let value = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(TokenKind::Semicolon, "Expect ';' after return value.")?;
        Ok(Stmt::Return { keyword, value })
    }

    // `for` has no node of its own; it becomes a `while` inside a block.
    fn parse_for(&mut self) -> ParseResult<Stmt> {
        self.expect(TokenKind::LeftParen, "Expect '(' after 'for'.")?;
        let initializer = if self.matches(TokenKind::Semicolon) {
            None
        } else if self.matches(TokenKind::Var) {
            Some(self.parse_var()?)
        } else {
            let expr = self.parse_expression()?;
            self.expect(TokenKind::Semicolon, "Expect ';' after expression.")?;
            Some(Stmt::Expression(expr))
        };

        let condition = if self.check(TokenKind::Semicolon) {
            Expr::Literal(LiteralValue::Bool(true))
        } else {
            self.parse_expression()?
        };
        self.expect(TokenKind::Semicolon, "Expect ';' after loop condition.")?;

        let increment = if self.check(TokenKind::RightParen) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(TokenKind::RightParen, "Expect ')' after for clauses.")?;

        let mut body = self.parse_statement()?;
        if let Some(increment) = increment {
            body = Stmt::Block(vec![body, Stmt::Expression(increment)]);
        }
        let mut stmt = Stmt::While {
            condition,
            body: Box::new(body),
        };
        if let Some(initializer) = initializer {
            stmt = Stmt::Block(vec![initializer, stmt]);
        }
        Ok(stmt)
    }

    fn parse_if(&mut self) -> ParseResult<Stmt> {
        self.expect(TokenKind::LeftParen, "Expect '(' after 'if'.")?;
        let condition = self.parse_expression()?;
        self.expect(TokenKind::RightParen, "Expect ')' after if condition.")?;
        let then_branch = Box::new(self.parse_statement()?);
        let else_branch = if self.matches(TokenKind::Else) {
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };
        Ok(Stmt::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn parse_while(&mut self) -> ParseResult<Stmt> {
        self.expect(TokenKind::LeftParen, "Expect '(' after 'while'.")?;
        let condition = self.parse_expression()?;
        self.expect(TokenKind::RightParen, "Expect ')' after while condition.")?;
        let body = Box::new(self.parse_statement()?);
        Ok(Stmt::While { condition, body })
    }

    fn parse_block(&mut self) -> ParseResult<Vec<Stmt>> {
        let mut statements = Vec::new();
        while !self.check(TokenKind::RightBrace) && !self.is_eof() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }
        self.expect(TokenKind::RightBrace, "Expect '}' after block.")?;
        Ok(statements)
    }

    fn parse_expression(&mut self) -> ParseResult<Expr> {
        self.parse_assignment()
    }

    fn parse_assignment(&mut self) -> ParseResult<Expr> {
        let expr = self.parse_or()?;
        if !self.matches(TokenKind::Equal) {
            return Ok(expr);
        }

        let equals = self.previous().clone();
        let value = self.parse_assignment()?;
        match expr {
            Expr::Variable(name) => Ok(Expr::Assign {
                name,
                value: Box::new(value),
            }),
            other => {
                self.report(
                    SyntaxError::at_token(&equals, "Invalid assignment target.")
                        .with_help("only a variable name can be assigned to"),
                );
                Ok(other)
            }
        }
    }

    fn parse_or(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_and()?;
        while self.matches(TokenKind::Or) {
            let op = self.previous().clone();
            let right = self.parse_and()?;
            left = Expr::Logical {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_equality()?;
        while self.matches(TokenKind::And) {
            let op = self.previous().clone();
            let right = self.parse_equality()?;
            left = Expr::Logical {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_comparison()?;
        while self.matches_any(&[TokenKind::BangEqual, TokenKind::EqualEqual]) {
            let op = self.previous().clone();
            let right = self.parse_comparison()?;
            left = binary(left, op, right);
        }
        Ok(left)
    }

    // The right operand recurses into this same level, so `a < b < c`
    // groups as `a < (b < c)`.
    fn parse_comparison(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_term()?;
        while self.matches_any(&[
            TokenKind::Greater,
            TokenKind::GreaterEqual,
            TokenKind::Less,
            TokenKind::LessEqual,
        ]) {
            let op = self.previous().clone();
            let right = self.parse_comparison()?;
            left = binary(left, op, right);
        }
        Ok(left)
    }

    fn parse_term(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_factor()?;
        while self.matches_any(&[TokenKind::Minus, TokenKind::Plus]) {
            let op = self.previous().clone();
            let right = self.parse_factor()?;
            left = binary(left, op, right);
        }
        Ok(left)
    }

    fn parse_factor(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_unary()?;
        while self.matches_any(&[TokenKind::Slash, TokenKind::Star]) {
            let op = self.previous().clone();
            let right = self.parse_unary()?;
            left = binary(left, op, right);
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> ParseResult<Expr> {
        if self.matches_any(&[TokenKind::Bang, TokenKind::Minus]) {
            let op = self.previous().clone();
            let expr = self.parse_unary()?;
            return Ok(Expr::Unary {
                op,
                expr: Box::new(expr),
            });
        }
        self.parse_call()
    }

    fn parse_call(&mut self) -> ParseResult<Expr> {
        let mut expr = self.parse_primary()?;
        while self.matches(TokenKind::LeftParen) {
            expr = self.finish_call(expr)?;
        }
        Ok(expr)
    }

    fn finish_call(&mut self, callee: Expr) -> ParseResult<Expr> {
        let mut args = Vec::new();
        if !self.check(TokenKind::RightParen) {
            loop {
                if args.len() >= MAX_ARGS {
                    let err = self.error_here("Can't have more than 255 arguments.");
                    self.report(err);
                }
                args.push(self.parse_expression()?);
                if !self.matches(TokenKind::Comma) {
                    break;
                }
            }
        }
        let paren = self.expect(TokenKind::RightParen, "Expect ')' after arguments.")?;
        Ok(Expr::Call {
            callee: Box::new(callee),
            paren,
            args,
        })
    }

    fn parse_primary(&mut self) -> ParseResult<Expr> {
        let token = self.peek().clone();
        let expr = match token.kind {
            TokenKind::False => Expr::Literal(LiteralValue::Bool(false)),
            TokenKind::True => Expr::Literal(LiteralValue::Bool(true)),
            TokenKind::Nil => Expr::Literal(LiteralValue::Nil),
            TokenKind::Number | TokenKind::String => Expr::Literal(match token.literal {
                Some(Literal::Number(value)) => LiteralValue::Number(value),
                Some(Literal::String(value)) => LiteralValue::String(value),
                None => return Err(self.error_here("Expect expression.")),
            }),
            TokenKind::Identifier => Expr::Variable(token),
            TokenKind::LeftParen => {
                self.advance();
                let inner = self.parse_expression()?;
                self.expect(TokenKind::RightParen, "Expect ')' after expression.")?;
                return Ok(Expr::Grouping(Box::new(inner)));
            }
            _ => return Err(self.error_here("Expect expression.")),
        };
        self.advance();
        Ok(expr)
    }

    fn expect(&mut self, kind: TokenKind, msg: &str) -> ParseResult<Token> {
        if self.check(kind) {
            Ok(self.advance().clone())
        } else {
            Err(self.error_here(msg))
        }
    }

    fn matches(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn matches_any(&mut self, kinds: &[TokenKind]) -> bool {
        kinds.iter().any(|kind| self.matches(*kind))
    }

    fn check(&self, kind: TokenKind) -> bool {
        !self.is_eof() && self.peek().is(kind)
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.pos.saturating_sub(1)]
    }

    fn advance(&mut self) -> &Token {
        if !self.is_eof() {
            self.pos += 1;
        }
        self.previous()
    }

    fn is_eof(&self) -> bool {
        self.peek().is(TokenKind::Eof)
    }

    fn error_here(&self, message: &str) -> SyntaxError {
        SyntaxError::at_token(self.peek(), message)
    }

    fn report(&mut self, err: SyntaxError) {
        tracing::trace!(line = err.line, message = %err.message, "syntax error");
        self.errors.push(err);
    }

    // Skip to a likely statement boundary: just past a ';' or right before a
    // keyword that opens a declaration or statement.
    fn synchronize(&mut self) {
        self.advance();
        while !self.is_eof() {
            if self.previous().is(TokenKind::Semicolon) {
                return;
            }
            if self.peek().kind.starts_statement() {
                return;
            }
            self.advance();
        }
    }
}

fn binary(left: Expr, op: Token, right: Expr) -> Expr {
    Expr::Binary {
        left: Box::new(left),
        op,
        right: Box::new(right),
    }
}
