//! Recursive-descent parser over the scanner's token stream.
//!
//! Two entry points: [`Parser::parse`] produces a statement list (program
//! mode) and [`Parser::parse_expression`] a single expression (REPL mode).
//! Errors go through the reporter callback as they are found.  Recovery uses
//! two mechanisms:
//!
//! * **Error productions**: a binary operator missing an operand reports
//!   and substitutes an [`Expr::Nothing`] sentinel so the surrounding
//!   reductions still succeed.
//! * **Synchronisation**: a hard error at declaration level skips tokens to
//!   after a `;` or to the next statement-introducing keyword.
//!
//! Either path flips the parser's `had_error` flag, so the driver refuses to
//! evaluate even though an AST came back.

use std::rc::Rc;

use log::debug;

use crate::ast::{next_node_id, Expr, Stmt};
use crate::error::{LoxError, Result};
use crate::token::{Token, TokenType};
use crate::value::Value;

/// Binary operators that cannot begin an expression.  Seeing one in operand
/// position means the left operand is missing.
const BINARY_OPERATORS: &[TokenType] = &[
    TokenType::PLUS,
    TokenType::SLASH,
    TokenType::STAR,
    TokenType::BANG_EQUAL,
    TokenType::EQUAL_EQUAL,
    TokenType::GREATER,
    TokenType::GREATER_EQUAL,
    TokenType::LESS,
    TokenType::LESS_EQUAL,
    TokenType::AND,
    TokenType::OR,
    TokenType::QUESTION,
    TokenType::COMMA,
];

pub struct Parser<F: FnMut(&LoxError)> {
    tokens: Vec<Token>,
    current: usize,
    had_error: bool,
    report: F,
}

impl<F: FnMut(&LoxError)> Parser<F> {
    pub fn new(tokens: Vec<Token>, report: F) -> Self {
        Parser {
            tokens,
            current: 0,
            had_error: false,
            report,
        }
    }

    /// Parse a whole program.  Returns the statements that could be built
    /// and whether the parse was error-free.
    pub fn parse(mut self) -> (Vec<Stmt>, bool) {
        let mut statements: Vec<Stmt> = Vec::new();

        while !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }

        (statements, !self.had_error)
    }

    /// Parse a single bare expression (REPL mode).  Trailing tokens before
    /// `EOF` are an error.
    pub fn parse_expression(mut self) -> (Option<Expr>, bool) {
        match self.expression() {
            Ok(expr) => {
                if !self.is_at_end() {
                    let token = self.peek().clone();
                    let _ = self.error(&token, "Expect end of expression.");
                }

                let ok = !self.had_error;
                (Some(expr), ok)
            }

            Err(_) => (None, false),
        }
    }

    // ------------------------------------------------------------------
    // Declarations and statements
    // ------------------------------------------------------------------

    fn declaration(&mut self) -> Option<Stmt> {
        let result = if self.check(&TokenType::FUN) && self.check_next(&TokenType::IDENTIFIER) {
            self.advance();
            self.function_declaration()
        } else if self.match_token(&TokenType::VAR) {
            self.var_declaration()
        } else {
            self.statement()
        };

        match result {
            Ok(stmt) => Some(stmt),

            Err(_) => {
                self.synchronize();
                None
            }
        }
    }

    fn function_declaration(&mut self) -> Result<Stmt> {
        let name = self.consume(&TokenType::IDENTIFIER, "Expect function name.")?;

        let (params, body) = self.function_parts("function")?;

        Ok(Stmt::Function { name, params, body })
    }

    /// Parameter list and body, shared by named declarations and anonymous
    /// function expressions.  The leading `fun` (and name, if any) have
    /// already been consumed.
    fn function_parts(&mut self, kind: &str) -> Result<(Rc<Vec<Token>>, Rc<Vec<Stmt>>)> {
        self.consume(
            &TokenType::LEFT_PAREN,
            &format!("Expect '(' after {} name.", kind),
        )?;

        let mut params: Vec<Token> = Vec::new();

        if !self.check(&TokenType::RIGHT_PAREN) {
            loop {
                if params.len() >= 255 {
                    let token = self.peek().clone();
                    let _ = self.error(&token, "Cannot have more than 255 parameters.");
                }

                params.push(self.consume(&TokenType::IDENTIFIER, "Expect parameter name.")?);

                if !self.match_token(&TokenType::COMMA) {
                    break;
                }
            }
        }

        self.consume(&TokenType::RIGHT_PAREN, "Expect ')' after parameters.")?;
        self.consume(
            &TokenType::LEFT_BRACE,
            &format!("Expect '{{' before {} body.", kind),
        )?;

        let body = self.block()?;

        Ok((Rc::new(params), Rc::new(body)))
    }

    fn var_declaration(&mut self) -> Result<Stmt> {
        let name = self.consume(&TokenType::IDENTIFIER, "Expect variable name.")?;

        let initializer = if self.match_token(&TokenType::EQUAL) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(
            &TokenType::SEMICOLON,
            "Expect ';' after variable declaration.",
        )?;

        Ok(Stmt::Var { name, initializer })
    }

    fn statement(&mut self) -> Result<Stmt> {
        if self.match_token(&TokenType::PRINT) {
            return self.print_statement();
        }

        if self.match_token(&TokenType::LEFT_BRACE) {
            return Ok(Stmt::Block(self.block()?));
        }

        if self.match_token(&TokenType::IF) {
            return self.if_statement();
        }

        if self.match_token(&TokenType::WHILE) {
            return self.while_statement();
        }

        if self.match_token(&TokenType::FOR) {
            return self.for_statement();
        }

        if self.match_token(&TokenType::BREAK) {
            return self.break_statement();
        }

        if self.match_token(&TokenType::RETURN) {
            return self.return_statement();
        }

        self.expression_statement()
    }

    fn print_statement(&mut self) -> Result<Stmt> {
        let value = self.expression()?;

        self.consume(&TokenType::SEMICOLON, "Expect ';' after value.")?;

        Ok(Stmt::Print(value))
    }

    fn block(&mut self) -> Result<Vec<Stmt>> {
        let mut statements: Vec<Stmt> = Vec::new();

        while !self.check(&TokenType::RIGHT_BRACE) && !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }

        self.consume(&TokenType::RIGHT_BRACE, "Expect '}' after block.")?;

        Ok(statements)
    }

    fn if_statement(&mut self) -> Result<Stmt> {
        self.consume(&TokenType::LEFT_PAREN, "Expect '(' after 'if'.")?;
        let condition = self.expression()?;
        self.consume(&TokenType::RIGHT_PAREN, "Expect ')' after if condition.")?;

        let then_branch = Box::new(self.statement()?);

        let else_branch = if self.match_token(&TokenType::ELSE) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };

        Ok(Stmt::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn while_statement(&mut self) -> Result<Stmt> {
        self.consume(&TokenType::LEFT_PAREN, "Expect '(' after 'while'.")?;
        let condition = self.expression()?;
        self.consume(&TokenType::RIGHT_PAREN, "Expect ')' after condition.")?;

        let body = Box::new(self.statement()?);

        Ok(Stmt::While { condition, body })
    }

    /// `for` is pure sugar: lowered to a while loop, with the incrementer
    /// appended inside a synthetic block and the initializer wrapped in an
    /// outer one.
    fn for_statement(&mut self) -> Result<Stmt> {
        self.consume(&TokenType::LEFT_PAREN, "Expect '(' after 'for'.")?;

        let initializer = if self.match_token(&TokenType::SEMICOLON) {
            None
        } else if self.match_token(&TokenType::VAR) {
            Some(self.var_declaration()?)
        } else {
            Some(self.expression_statement()?)
        };

        let condition = if !self.check(&TokenType::SEMICOLON) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(&TokenType::SEMICOLON, "Expect ';' after loop condition.")?;

        let increment = if !self.check(&TokenType::RIGHT_PAREN) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(&TokenType::RIGHT_PAREN, "Expect ')' after for clauses.")?;

        let mut body = self.statement()?;

        if let Some(increment) = increment {
            body = Stmt::Block(vec![body, Stmt::Expression(increment)]);
        }

        let condition = condition.unwrap_or(Expr::Literal(Value::Bool(true)));

        body = Stmt::While {
            condition,
            body: Box::new(body),
        };

        if let Some(initializer) = initializer {
            body = Stmt::Block(vec![initializer, body]);
        }

        debug!("Desugared for statement into while loop");

        Ok(body)
    }

    fn break_statement(&mut self) -> Result<Stmt> {
        let keyword = self.previous().clone();

        self.consume(&TokenType::SEMICOLON, "Expect ';' after 'break'.")?;

        Ok(Stmt::Break(keyword))
    }

    fn return_statement(&mut self) -> Result<Stmt> {
        let keyword = self.previous().clone();

        let value = if !self.check(&TokenType::SEMICOLON) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(&TokenType::SEMICOLON, "Expect ';' after return value.")?;

        Ok(Stmt::Return { keyword, value })
    }

    fn expression_statement(&mut self) -> Result<Stmt> {
        let expr = self.expression()?;

        self.consume(&TokenType::SEMICOLON, "Expect ';' after expression.")?;

        Ok(Stmt::Expression(expr))
    }

    // ------------------------------------------------------------------
    // Expressions, precedence ascending
    // ------------------------------------------------------------------

    fn expression(&mut self) -> Result<Expr> {
        self.comma()
    }

    /// Comma operator: lowest precedence, left-associative, excluded from
    /// argument lists (those parse at assignment level).
    fn comma(&mut self) -> Result<Expr> {
        let mut expr = self.assignment()?;

        while self.match_token(&TokenType::COMMA) {
            let operator = self.previous().clone();
            let right = self.operand(Self::assignment);

            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn assignment(&mut self) -> Result<Expr> {
        let expr = self.conditional()?;

        if self.match_token(&TokenType::EQUAL) {
            let equals = self.previous().clone();
            let value = self.assignment()?;

            return match expr {
                Expr::Variable { name, .. } => Ok(Expr::Assign {
                    id: next_node_id(),
                    name,
                    value: Box::new(value),
                }),

                other => {
                    let _ = self.error(&equals, "Invalid assignment target.");
                    Ok(other)
                }
            };
        }

        Ok(expr)
    }

    /// C-style ternary, right-associative.  A missing `:` is a hard error
    /// that aborts the sub-expression.
    fn conditional(&mut self) -> Result<Expr> {
        let condition = self.or()?;

        if self.match_token(&TokenType::QUESTION) {
            let then_branch = self.or()?;

            self.consume(&TokenType::COLON, "Expect ':' in ternary expression.")?;

            let else_branch = self.conditional()?;

            return Ok(Expr::Ternary {
                condition: Box::new(condition),
                then_branch: Box::new(then_branch),
                else_branch: Box::new(else_branch),
            });
        }

        Ok(condition)
    }

    fn or(&mut self) -> Result<Expr> {
        let mut expr = self.and()?;

        while self.match_token(&TokenType::OR) {
            let operator = self.previous().clone();
            let right = self.and()?;

            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn and(&mut self) -> Result<Expr> {
        let mut expr = self.equality()?;

        while self.match_token(&TokenType::AND) {
            let operator = self.previous().clone();
            let right = self.equality()?;

            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn equality(&mut self) -> Result<Expr> {
        let mut expr = self.comparison()?;

        while self.match_tokens(&[TokenType::BANG_EQUAL, TokenType::EQUAL_EQUAL]) {
            let operator = self.previous().clone();
            let right = self.operand(Self::comparison);

            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn comparison(&mut self) -> Result<Expr> {
        let mut expr = self.term()?;

        while self.match_tokens(&[
            TokenType::GREATER,
            TokenType::GREATER_EQUAL,
            TokenType::LESS,
            TokenType::LESS_EQUAL,
        ]) {
            let operator = self.previous().clone();
            let right = self.operand(Self::term);

            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn term(&mut self) -> Result<Expr> {
        let mut expr = self.factor()?;

        while self.match_tokens(&[TokenType::MINUS, TokenType::PLUS]) {
            let operator = self.previous().clone();
            let right = self.operand(Self::factor);

            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn factor(&mut self) -> Result<Expr> {
        let mut expr = self.unary()?;

        while self.match_tokens(&[TokenType::SLASH, TokenType::STAR]) {
            let operator = self.previous().clone();
            let right = self.operand(Self::unary);

            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    /// Right operand of a binary operator.  On a hard error (already
    /// reported) the operand degrades to `Nothing` so the reduction above
    /// still succeeds; the `had_error` flag keeps the program from running.
    fn operand(&mut self, parse: fn(&mut Self) -> Result<Expr>) -> Expr {
        parse(self).unwrap_or(Expr::Nothing)
    }

    fn unary(&mut self) -> Result<Expr> {
        if self.match_tokens(&[TokenType::BANG, TokenType::MINUS]) {
            let operator = self.previous().clone();
            let right = self.unary()?;

            return Ok(Expr::Unary {
                operator,
                right: Box::new(right),
            });
        }

        self.call()
    }

    fn call(&mut self) -> Result<Expr> {
        let mut expr = self.primary()?;

        while self.match_token(&TokenType::LEFT_PAREN) {
            expr = self.finish_call(expr)?;
        }

        Ok(expr)
    }

    fn finish_call(&mut self, callee: Expr) -> Result<Expr> {
        let mut arguments: Vec<Expr> = Vec::new();

        if !self.check(&TokenType::RIGHT_PAREN) {
            loop {
                if arguments.len() >= 255 {
                    let token = self.peek().clone();
                    let _ = self.error(&token, "Cannot have more than 255 arguments.");
                }

                arguments.push(self.assignment()?);

                if !self.match_token(&TokenType::COMMA) {
                    break;
                }
            }
        }

        let paren = self.consume(&TokenType::RIGHT_PAREN, "Expect ')' after arguments.")?;

        Ok(Expr::Call {
            callee: Box::new(callee),
            paren,
            arguments,
        })
    }

    fn primary(&mut self) -> Result<Expr> {
        if self.match_token(&TokenType::FALSE) {
            return Ok(Expr::Literal(Value::Bool(false)));
        }

        if self.match_token(&TokenType::TRUE) {
            return Ok(Expr::Literal(Value::Bool(true)));
        }

        if self.match_token(&TokenType::NIL) {
            return Ok(Expr::Literal(Value::Nil));
        }

        if self.match_token(&TokenType::NUMBER(0.0)) {
            if let TokenType::NUMBER(n) = &self.previous().token_type {
                return Ok(Expr::Literal(Value::Number(*n)));
            }

            unreachable!("matched NUMBER token without a number payload");
        }

        if self.match_token(&TokenType::STRING(String::new())) {
            if let TokenType::STRING(s) = &self.previous().token_type {
                return Ok(Expr::Literal(Value::String(s.clone())));
            }

            unreachable!("matched STRING token without a string payload");
        }

        if self.match_token(&TokenType::IDENTIFIER) {
            return Ok(Expr::Variable {
                id: next_node_id(),
                name: self.previous().clone(),
            });
        }

        if self.match_token(&TokenType::LEFT_PAREN) {
            let expr = self.expression()?;

            self.consume(&TokenType::RIGHT_PAREN, "Expect ')' after expression.")?;

            return Ok(Expr::Grouping(Box::new(expr)));
        }

        if self.match_token(&TokenType::FUN) {
            let (params, body) = self.function_parts("function")?;

            return Ok(Expr::Function { params, body });
        }

        // Error production: a binary operator in operand position means the
        // left operand is missing.  Report, leave the operator for the
        // enclosing precedence loop, and hand back a sentinel.
        if BINARY_OPERATORS.contains(&self.peek().token_type) {
            let token = self.peek().clone();
            let _ = self.error(&token, "Binary operator without left-hand operand.");

            return Ok(Expr::Nothing);
        }

        let token = self.peek().clone();
        Err(self.error(&token, "Expect expression."))
    }

    // ------------------------------------------------------------------
    // Token-stream helpers
    // ------------------------------------------------------------------

    fn match_token(&mut self, token_type: &TokenType) -> bool {
        if self.check(token_type) {
            self.advance();
            return true;
        }

        false
    }

    fn match_tokens(&mut self, types: &[TokenType]) -> bool {
        for token_type in types {
            if self.match_token(token_type) {
                return true;
            }
        }

        false
    }

    fn check(&self, token_type: &TokenType) -> bool {
        if self.is_at_end() {
            return false;
        }

        &self.peek().token_type == token_type
    }

    fn check_next(&self, token_type: &TokenType) -> bool {
        match self.tokens.get(self.current + 1) {
            Some(token) => &token.token_type == token_type,
            None => false,
        }
    }

    fn consume(&mut self, token_type: &TokenType, message: &str) -> Result<Token> {
        if self.check(token_type) {
            return Ok(self.advance().clone());
        }

        let token = self.peek().clone();
        Err(self.error(&token, message))
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }

        self.previous()
    }

    fn is_at_end(&self) -> bool {
        self.peek().token_type == TokenType::EOF
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current - 1]
    }

    /// Report through the callback, flip `had_error`, and build the error
    /// value.  Callers decide whether it is hard (propagate with `?`) or
    /// recoverable (discard and continue).
    fn error(&mut self, token: &Token, message: &str) -> LoxError {
        self.had_error = true;

        let err = LoxError::parse(token.line, token.lexeme.clone(), message.to_string());

        (self.report)(&err);

        err
    }

    /// Skip to the next statement boundary after a hard error.
    fn synchronize(&mut self) {
        debug!("Synchronizing parser at token {}", self.current);

        self.advance();

        while !self.is_at_end() {
            if self.previous().token_type == TokenType::SEMICOLON {
                return;
            }

            match self.peek().token_type {
                TokenType::CLASS
                | TokenType::FUN
                | TokenType::VAR
                | TokenType::FOR
                | TokenType::IF
                | TokenType::WHILE
                | TokenType::PRINT
                | TokenType::RETURN => return,

                _ => {
                    self.advance();
                }
            }
        }
    }
}
