//! Static resolution pass.
//!
//! A single AST walk, run exactly once between parse and evaluation, that:
//!
//! 1. **Builds lexical scopes**: maintains a stack of `HashMap<String,bool>`
//!    tracking declared (false) and fully defined (true) names in each nested
//!    block or function body.
//! 2. **Enforces static rules**: redeclaration in the same non-global scope,
//!    reading a variable in its own initializer, `return` outside a function,
//!    `break` outside a loop.
//! 3. **Records binding distances**: for every `Expr::Variable` and
//!    `Expr::Assign` occurrence, calls back into the interpreter to note the
//!    number of scopes between the use site and the declaring scope.  Names
//!    found in no scope are left unrecorded and resolve against the globals
//!    at runtime.
//!
//! Resolution halts on the first static error; the driver reports it and
//! refuses to evaluate.

use std::collections::HashMap;
use std::io::Write;

use log::{debug, info};

use crate::ast::{Expr, Stmt};
use crate::error::{LoxError, Result};
use crate::interpreter::Interpreter;
use crate::token::Token;

/// Are we inside a user function?  Used to validate `return`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum FunctionType {
    None,
    Function,
}

pub struct Resolver<'interp, W: Write> {
    interpreter: &'interp mut Interpreter<W>,
    scopes: Vec<HashMap<String, bool>>, // false=declared, true=defined
    current_function: FunctionType,
    in_loop: bool,
}

impl<'interp, W: Write> Resolver<'interp, W> {
    /// Create a new resolver bound to the given interpreter.
    pub fn new(interpreter: &'interp mut Interpreter<W>) -> Self {
        info!("Resolver instantiated");
        Resolver {
            interpreter,
            scopes: Vec::new(),
            current_function: FunctionType::None,
            in_loop: false,
        }
    }

    /// Walk all top-level statements.
    pub fn resolve(&mut self, statements: &[Stmt]) -> Result<()> {
        info!(
            "Beginning resolve pass over {} statement(s)",
            statements.len()
        );
        for stmt in statements {
            self.resolve_stmt(stmt)?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Statement resolution
    // ------------------------------------------------------------------

    fn resolve_stmt(&mut self, stmt: &Stmt) -> Result<()> {
        match stmt {
            Stmt::Block(statements) => {
                self.begin_scope();

                for s in statements {
                    self.resolve_stmt(s)?;
                }

                self.end_scope();
            }

            Stmt::Var { name, initializer } => {
                // Declare first so the initializer sees the name as
                // "declared but not defined"; this is what rejects
                // `var a = a;`.
                self.declare(name)?;

                if let Some(expr) = initializer {
                    self.resolve_expr(expr)?;
                }

                self.define(name);
            }

            Stmt::Function { name, params, body } => {
                // Declared and defined before the body resolves, so the
                // function may recursively reference itself.
                self.declare(name)?;
                self.define(name);

                self.resolve_function(params, body)?;
            }

            Stmt::Expression(expr) | Stmt::Print(expr) => {
                self.resolve_expr(expr)?;
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition)?;
                self.resolve_stmt(then_branch)?;

                if let Some(eb) = else_branch.as_deref() {
                    self.resolve_stmt(eb)?;
                }
            }

            Stmt::While { condition, body } => {
                self.resolve_expr(condition)?;

                let enclosing = self.in_loop;
                self.in_loop = true;

                self.resolve_stmt(body)?;

                self.in_loop = enclosing;
            }

            Stmt::Break(keyword) => {
                if !self.in_loop {
                    return Err(LoxError::resolve(
                        keyword.line,
                        "Break statement outside of loop.",
                    ));
                }
            }

            Stmt::Return { keyword, value } => {
                if self.current_function == FunctionType::None {
                    return Err(LoxError::resolve(
                        keyword.line,
                        "Return statement outside of function.",
                    ));
                }

                if let Some(expr) = value {
                    self.resolve_expr(expr)?;
                }
            }
        }

        Ok(())
    }

    // ------------------------------------------------------------------
    // Expression resolution
    // ------------------------------------------------------------------

    fn resolve_expr(&mut self, expr: &Expr) -> Result<()> {
        match expr {
            Expr::Literal(_) | Expr::Nothing => {}

            Expr::Grouping(inner) => {
                self.resolve_expr(inner)?;
            }

            Expr::Unary { right, .. } => {
                self.resolve_expr(right)?;
            }

            Expr::Binary { left, right, .. } => {
                self.resolve_expr(left)?;
                self.resolve_expr(right)?;
            }

            Expr::Ternary {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition)?;
                self.resolve_expr(then_branch)?;
                self.resolve_expr(else_branch)?;
            }

            Expr::Variable { id, name } => {
                if let Some(scope) = self.scopes.last() {
                    if scope.get(&name.lexeme) == Some(&false) {
                        return Err(LoxError::resolve(
                            name.line,
                            "Cannot read local variable in its own initializer.",
                        ));
                    }
                }

                self.resolve_local(*id, name);
            }

            Expr::Assign { id, name, value } => {
                self.resolve_expr(value)?;
                self.resolve_local(*id, name);
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                self.resolve_expr(callee)?;

                for arg in arguments {
                    self.resolve_expr(arg)?;
                }
            }

            Expr::Function { params, body } => {
                self.resolve_function(params, body)?;
            }
        }

        Ok(())
    }

    // ------------------------------------------------------------------
    // Function helper
    // ------------------------------------------------------------------

    /// Enter a fresh scope for a function's parameters + body.  The body
    /// leaves any enclosing loop, so `break` inside it is rejected.
    fn resolve_function(&mut self, params: &[Token], body: &[Stmt]) -> Result<()> {
        let enclosing_function = self.current_function;
        let enclosing_loop = self.in_loop;

        self.current_function = FunctionType::Function;
        self.in_loop = false;

        self.begin_scope();

        for param in params {
            self.declare(param)?;
            self.define(param);
        }

        for stmt in body {
            self.resolve_stmt(stmt)?;
        }

        self.end_scope();

        self.current_function = enclosing_function;
        self.in_loop = enclosing_loop;

        Ok(())
    }

    // ------------------------------------------------------------------
    // Scope management
    // ------------------------------------------------------------------

    #[inline]
    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    #[inline]
    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    fn declare(&mut self, name: &Token) -> Result<()> {
        // Only local scopes reject duplicates; at global scope
        // redeclaration silently rebinds.
        if let Some(scope) = self.scopes.last_mut() {
            if scope.contains_key(&name.lexeme) {
                return Err(LoxError::resolve(
                    name.line,
                    "Variable already declared in this scope.",
                ));
            }

            scope.insert(name.lexeme.clone(), false);
        }
        Ok(())
    }

    fn define(&mut self, name: &Token) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.lexeme.clone(), true);
        }
    }

    // ------------------------------------------------------------------
    // Binding-distance helper
    // ------------------------------------------------------------------

    /// Record this occurrence as a local at the depth of the innermost scope
    /// containing the name; a miss in every scope means global.
    fn resolve_local(&mut self, id: usize, name: &Token) {
        for (depth, scope) in self.scopes.iter().rev().enumerate() {
            if scope.contains_key(&name.lexeme) {
                debug!("Resolved '{}' at depth {}", name.lexeme, depth);
                self.interpreter.note_local(id, depth);
                return;
            }
        }

        debug!("Resolved '{}' as global", name.lexeme);
    }
}
