use std::fmt;
use std::rc::Rc;

use crate::ast::Stmt;
use crate::environment::EnvRef;
use crate::error::Result;
use crate::token::Token;

/// Runtime values.  A closed tagged variant; coercions are explicit match
/// arms in the evaluator, never `As*`-style accessors.
#[derive(Debug, Clone)]
pub enum Value {
    Bool(bool),
    Number(f64),
    String(String),
    Nil,
    Function(Rc<LoxFunction>),
    NativeFunction {
        name: String,
        arity: usize,
        func: fn(&[Value]) -> Result<Value>,
    },
    Type(TypeTag),
}

/// A user function: parameter list, body, and the environment in effect where
/// the function literal was evaluated.  The parameter list and body are
/// shared with the AST node that produced the value, so constructing a
/// closure clones two pointers, not the tree.
pub struct LoxFunction {
    pub name: Option<String>,
    pub params: Rc<Vec<Token>>,
    pub body: Rc<Vec<Stmt>>,
    pub closure: EnvRef,
}

// The closure environment may (through recursion) contain the function
// itself, so the derived Debug would loop.
impl fmt::Debug for LoxFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoxFunction")
            .field("name", &self.name)
            .field("arity", &self.params.len())
            .finish()
    }
}

/// Reification of a value's kind, produced by the `type()` built-in and
/// pre-bound under the globals `str`, `num`, `func` and `bool`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeTag {
    Bool,
    Num,
    Str,
    Nil,
    Func,
    Type,
}

impl TypeTag {
    pub fn name(self) -> &'static str {
        match self {
            TypeTag::Bool => "bool",
            TypeTag::Num => "num",
            TypeTag::Str => "str",
            TypeTag::Nil => "nil",
            TypeTag::Func => "func",
            TypeTag::Type => "type",
        }
    }
}

impl Value {
    /// The kind tag of this value, as exposed through `type()`.
    pub fn type_tag(&self) -> TypeTag {
        match self {
            Value::Bool(_) => TypeTag::Bool,
            Value::Number(_) => TypeTag::Num,
            Value::String(_) => TypeTag::Str,
            Value::Nil => TypeTag::Nil,
            Value::Function(_) | Value::NativeFunction { .. } => TypeTag::Func,
            Value::Type(_) => TypeTag::Type,
        }
    }
}

// Same-kind value equality; functions compare by identity, natives by
// function pointer; every cross-kind pair is unequal.  NaN follows IEEE-754.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a == b,

            (Value::String(a), Value::String(b)) => a == b,

            (Value::Bool(a), Value::Bool(b)) => a == b,

            (Value::Nil, Value::Nil) => true,

            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),

            (Value::NativeFunction { func: a, .. }, Value::NativeFunction { func: b, .. }) => {
                a == b
            }

            (Value::Type(a), Value::Type(b)) => a == b,

            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),

            Value::Number(n) => write!(f, "{}", n),

            Value::String(s) => write!(f, "{}", s),

            Value::Nil => write!(f, "nil"),

            Value::Function(func) => match &func.name {
                Some(name) => write!(f, "<fn {}>", name),
                None => write!(f, "<fn>"),
            },

            Value::NativeFunction { name, .. } => write!(f, "<native fn {}>", name),

            Value::Type(tag) => write!(f, "<class '{}'>", tag.name()),
        }
    }
}
