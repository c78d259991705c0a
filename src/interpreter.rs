//! Tree-walking evaluator.
//!
//! Carries the global environment, the current environment, the resolver's
//! locals table and the output sink.  Statement execution returns a
//! [`Signal`] so that `break` and `return` unwind cooperatively through the
//! recursion without abusing the error channel: the nearest enclosing loop
//! consumes `Break`, the nearest call boundary consumes `Return`.  Runtime
//! errors use the ordinary error channel and terminate only the current
//! top-level statement.

use std::collections::HashMap;
use std::io::{self, Write};
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::ast::{Expr, Stmt};
use crate::environment::{EnvRef, Environment};
use crate::error::{LoxError, Result};
use crate::token::{Token, TokenType};
use crate::value::{LoxFunction, TypeTag, Value};

/// Outcome of executing a statement.  `Break` and `Return` are control
/// signals, not errors; they never reach the user.
#[derive(Debug)]
pub enum Signal {
    Normal,
    Break,
    Return(Value),
}

pub struct Interpreter<W: Write = io::Stdout> {
    globals: EnvRef,
    environment: EnvRef,
    locals: HashMap<usize, usize>,
    output: W,
}

impl Interpreter<io::Stdout> {
    pub fn new() -> Self {
        Self::with_output(io::stdout())
    }
}

impl Default for Interpreter<io::Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> Interpreter<W> {
    /// Build an interpreter whose `print` statements write to `output`.
    pub fn with_output(output: W) -> Self {
        let globals = Environment::root();

        {
            let mut env = globals.borrow_mut();

            env.define(
                "clock",
                Value::NativeFunction {
                    name: "clock".to_string(),
                    arity: 0,
                    func: clock_native,
                },
            );

            env.define(
                "type",
                Value::NativeFunction {
                    name: "type".to_string(),
                    arity: 1,
                    func: type_native,
                },
            );

            env.define("bool", Value::Type(TypeTag::Bool));
            env.define("num", Value::Type(TypeTag::Num));
            env.define("str", Value::Type(TypeTag::Str));
            env.define("func", Value::Type(TypeTag::Func));
        }

        Interpreter {
            globals: globals.clone(),
            environment: globals,
            locals: HashMap::new(),
            output,
        }
    }

    /// Record a resolved binding distance for a `Variable`/`Assign` node.
    /// Called by the resolver; absence of an id means global.
    pub fn note_local(&mut self, id: usize, depth: usize) {
        self.locals.insert(id, depth);
    }

    /// Execute a program.  A runtime error terminates only the statement
    /// that raised it; subsequent top-level statements still run.
    pub fn interpret<F>(&mut self, statements: &[Stmt], mut report: F)
    where
        F: FnMut(&LoxError),
    {
        for stmt in statements {
            if let Err(e) = self.execute(stmt) {
                report(&e);
            }
        }
    }

    fn execute(&mut self, stmt: &Stmt) -> Result<Signal> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;

                Ok(Signal::Normal)
            }

            Stmt::Print(expr) => {
                let value = self.evaluate(expr)?;

                writeln!(self.output, "{}", value)?;

                Ok(Signal::Normal)
            }

            Stmt::Var { name, initializer } => {
                let value: Value = if let Some(expr) = initializer {
                    self.evaluate(expr)?
                } else {
                    Value::Nil
                };

                self.environment.borrow_mut().define(&name.lexeme, value);

                Ok(Signal::Normal)
            }

            Stmt::Block(statements) => {
                let env = Environment::nested(&self.environment);

                self.execute_block(statements, env)
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if is_truthy(&self.evaluate(condition)?) {
                    self.execute(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)
                } else {
                    Ok(Signal::Normal)
                }
            }

            Stmt::While { condition, body } => {
                while is_truthy(&self.evaluate(condition)?) {
                    match self.execute(body)? {
                        Signal::Normal => {}

                        Signal::Break => break,

                        ret @ Signal::Return(_) => return Ok(ret),
                    }
                }

                Ok(Signal::Normal)
            }

            Stmt::Break(_) => Ok(Signal::Break),

            Stmt::Return { value, .. } => {
                let value: Value = if let Some(expr) = value {
                    self.evaluate(expr)?
                } else {
                    Value::Nil
                };

                Ok(Signal::Return(value))
            }

            Stmt::Function { name, params, body } => {
                let function = Value::Function(Rc::new(LoxFunction {
                    name: Some(name.lexeme.clone()),
                    params: params.clone(),
                    body: body.clone(),
                    closure: self.environment.clone(),
                }));

                self.environment
                    .borrow_mut()
                    .define(&name.lexeme, function);

                Ok(Signal::Normal)
            }
        }
    }

    /// Run `statements` in `env`, restoring the previous environment on
    /// every exit path (normal completion, signal, or error).
    fn execute_block(&mut self, statements: &[Stmt], env: EnvRef) -> Result<Signal> {
        let previous = std::mem::replace(&mut self.environment, env);

        for stmt in statements {
            match self.execute(stmt) {
                Ok(Signal::Normal) => {}

                other => {
                    self.environment = previous;
                    return other;
                }
            }
        }

        self.environment = previous;

        Ok(Signal::Normal)
    }

    pub fn evaluate(&mut self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Literal(value) => Ok(value.clone()),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { operator, right } => self.evaluate_unary(operator, right),

            Expr::Binary {
                left,
                operator,
                right,
            } => self.evaluate_binary(left, operator, right),

            Expr::Ternary {
                condition,
                then_branch,
                else_branch,
            } => {
                if is_truthy(&self.evaluate(condition)?) {
                    self.evaluate(then_branch)
                } else {
                    self.evaluate(else_branch)
                }
            }

            Expr::Variable { id, name } => self.look_up_variable(*id, name),

            Expr::Assign { id, name, value } => {
                let value = self.evaluate(value)?;

                match self.locals.get(id) {
                    Some(&depth) => Environment::assign_at(
                        &self.environment,
                        depth,
                        &name.lexeme,
                        value.clone(),
                        name.line,
                    )?,

                    None => {
                        Environment::assign(&self.globals, &name.lexeme, value.clone(), name.line)?
                    }
                }

                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => self.evaluate_call(callee, paren, arguments),

            Expr::Function { params, body } => Ok(Value::Function(Rc::new(LoxFunction {
                name: None,
                params: params.clone(),
                body: body.clone(),
                closure: self.environment.clone(),
            }))),

            Expr::Nothing => Ok(Value::Nil),
        }
    }

    fn look_up_variable(&self, id: usize, name: &Token) -> Result<Value> {
        match self.locals.get(&id) {
            Some(&depth) => Environment::get_at(&self.environment, depth, &name.lexeme, name.line),

            None => Environment::get(&self.globals, &name.lexeme, name.line),
        }
    }

    fn evaluate_unary(&mut self, operator: &Token, right: &Expr) -> Result<Value> {
        let value: Value = self.evaluate(right)?;

        match operator.token_type {
            TokenType::MINUS => match value {
                Value::Number(n) => Ok(Value::Number(-n)),

                _ => Err(LoxError::runtime(format!(
                    "Operand must be a number. [line {}]",
                    operator.line
                ))),
            },

            TokenType::BANG => Ok(Value::Bool(!is_truthy(&value))),

            _ => Err(LoxError::runtime(format!(
                "Invalid unary operator on line {}",
                operator.line
            ))),
        }
    }

    fn evaluate_binary(&mut self, left: &Expr, operator: &Token, right: &Expr) -> Result<Value> {
        match operator.token_type {
            // Logical operators short-circuit and yield the operand itself,
            // not a coerced boolean.
            TokenType::OR => {
                let left_val: Value = self.evaluate(left)?;

                if is_truthy(&left_val) {
                    Ok(left_val)
                } else {
                    self.evaluate(right)
                }
            }

            TokenType::AND => {
                let left_val: Value = self.evaluate(left)?;

                if !is_truthy(&left_val) {
                    Ok(left_val)
                } else {
                    self.evaluate(right)
                }
            }

            // Comma: evaluate left for effect, yield right.
            TokenType::COMMA => {
                self.evaluate(left)?;

                self.evaluate(right)
            }

            _ => {
                // Strict left-then-right evaluation, observable through
                // side effects.
                let left_val: Value = self.evaluate(left)?;
                let right_val: Value = self.evaluate(right)?;

                match operator.token_type {
                    TokenType::PLUS => match (left_val, right_val) {
                        (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),

                        (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),

                        _ => Err(LoxError::runtime(format!(
                            "Operands must be two numbers or two strings on line {}",
                            operator.line
                        ))),
                    },

                    TokenType::MINUS => match (left_val, right_val) {
                        (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a - b)),

                        _ => Err(LoxError::runtime(format!(
                            "Operands must be numbers on line {}",
                            operator.line
                        ))),
                    },

                    TokenType::STAR => match (left_val, right_val) {
                        (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a * b)),

                        _ => Err(LoxError::runtime(format!(
                            "Operands must be numbers on line {}",
                            operator.line
                        ))),
                    },

                    TokenType::SLASH => match (left_val, right_val) {
                        (Value::Number(a), Value::Number(b)) => {
                            if b == 0.0 {
                                Err(LoxError::runtime(format!(
                                    "Division by zero on line {}",
                                    operator.line
                                )))
                            } else {
                                Ok(Value::Number(a / b))
                            }
                        }

                        _ => Err(LoxError::runtime(format!(
                            "Operands must be numbers on line {}",
                            operator.line
                        ))),
                    },

                    TokenType::EQUAL_EQUAL => Ok(Value::Bool(left_val == right_val)),

                    TokenType::BANG_EQUAL => Ok(Value::Bool(left_val != right_val)),

                    TokenType::LESS => match (left_val, right_val) {
                        (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a < b)),

                        (Value::String(a), Value::String(b)) => Ok(Value::Bool(a < b)),

                        _ => Err(LoxError::runtime(format!(
                            "Operands must be two numbers or two strings on line {}",
                            operator.line
                        ))),
                    },

                    TokenType::LESS_EQUAL => match (left_val, right_val) {
                        (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a <= b)),

                        (Value::String(a), Value::String(b)) => Ok(Value::Bool(a <= b)),

                        _ => Err(LoxError::runtime(format!(
                            "Operands must be two numbers or two strings on line {}",
                            operator.line
                        ))),
                    },

                    TokenType::GREATER => match (left_val, right_val) {
                        (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a > b)),

                        (Value::String(a), Value::String(b)) => Ok(Value::Bool(a > b)),

                        _ => Err(LoxError::runtime(format!(
                            "Operands must be two numbers or two strings on line {}",
                            operator.line
                        ))),
                    },

                    TokenType::GREATER_EQUAL => match (left_val, right_val) {
                        (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a >= b)),

                        (Value::String(a), Value::String(b)) => Ok(Value::Bool(a >= b)),

                        _ => Err(LoxError::runtime(format!(
                            "Operands must be two numbers or two strings on line {}",
                            operator.line
                        ))),
                    },

                    _ => Err(LoxError::runtime(format!(
                        "Invalid binary operator on line {}",
                        operator.line
                    ))),
                }
            }
        }
    }

    fn evaluate_call(&mut self, callee: &Expr, paren: &Token, arguments: &[Expr]) -> Result<Value> {
        let callee_val = self.evaluate(callee)?;

        let mut args: Vec<Value> = Vec::with_capacity(arguments.len());

        for arg in arguments {
            args.push(self.evaluate(arg)?);
        }

        match callee_val {
            Value::NativeFunction { arity, func, .. } => {
                if args.len() != arity {
                    return Err(LoxError::runtime(format!(
                        "Expected {} arguments but got {} at line {}",
                        arity,
                        args.len(),
                        paren.line
                    )));
                }

                func(&args)
            }

            Value::Function(function) => {
                if args.len() != function.params.len() {
                    return Err(LoxError::runtime(format!(
                        "Expected {} arguments but got {} at line {}",
                        function.params.len(),
                        args.len(),
                        paren.line
                    )));
                }

                self.call_function(&function, args)
            }

            _ => Err(LoxError::runtime(format!(
                "Can only call functions at line {}",
                paren.line
            ))),
        }
    }

    /// Invoke a user function: fresh environment chained to the captured
    /// closure (not the caller's), parameters bound to arguments, body run
    /// until completion or a `Return` signal.
    fn call_function(&mut self, function: &LoxFunction, args: Vec<Value>) -> Result<Value> {
        let env = Environment::nested(&function.closure);

        for (param, arg) in function.params.iter().zip(args) {
            env.borrow_mut().define(&param.lexeme, arg);
        }

        match self.execute_block(&function.body, env)? {
            Signal::Return(value) => Ok(value),

            _ => Ok(Value::Nil),
        }
    }
}

/// Only `false` and `nil` are falsy; everything else, including `0` and
/// `""`, is truthy.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Nil => false,

        Value::Bool(b) => *b,

        _ => true,
    }
}

fn clock_native(_args: &[Value]) -> Result<Value> {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| LoxError::runtime(format!("Clock error: {}", e)))?
        .as_secs_f64();

    Ok(Value::Number(timestamp))
}

fn type_native(args: &[Value]) -> Result<Value> {
    Ok(Value::Type(args[0].type_tag()))
}
