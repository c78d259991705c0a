use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::{LoxError, Result};
use crate::value::Value;

/// Shared handle to a scope.  Closures hold one of these, which is what
/// keeps a scope alive after the block that created it has exited.
pub type EnvRef = Rc<RefCell<Environment>>;

/// A single lexical scope: its bindings plus a link to the parent scope.
/// The global environment is the root of the chain (no parent).
///
/// Lookups need to hop between scopes that are each behind their own
/// `RefCell`, so everything except [`Environment::define`] operates on the
/// shared [`EnvRef`] handle rather than on a borrowed `&self`.
#[derive(Debug)]
pub struct Environment {
    bindings: HashMap<String, Value>,
    parent: Option<EnvRef>,
}

impl Environment {
    /// The root scope of a chain.
    pub fn root() -> EnvRef {
        Rc::new(RefCell::new(Environment {
            bindings: HashMap::new(),
            parent: None,
        }))
    }

    /// A fresh scope nested inside `parent`.
    pub fn nested(parent: &EnvRef) -> EnvRef {
        Rc::new(RefCell::new(Environment {
            bindings: HashMap::new(),
            parent: Some(Rc::clone(parent)),
        }))
    }

    /// Unconditionally bind `name` in this scope.  Rebinding an existing
    /// name is allowed; this is what makes global redeclaration legal.
    pub fn define(&mut self, name: &str, value: Value) {
        self.bindings.insert(name.to_string(), value);
    }

    /// Read the innermost visible binding of `name`.
    pub fn get(this: &EnvRef, name: &str, line: usize) -> Result<Value> {
        let scope = Self::scope_of(this, name).ok_or_else(|| undefined(name, line))?;

        read_binding(&scope, name, line)
    }

    /// Rewrite the innermost visible binding of `name`; error if no scope
    /// on the chain holds it.
    pub fn assign(this: &EnvRef, name: &str, value: Value, line: usize) -> Result<()> {
        let scope = Self::scope_of(this, name).ok_or_else(|| undefined(name, line))?;

        scope.borrow_mut().bindings.insert(name.to_string(), value);

        Ok(())
    }

    /// Read `name` in the scope exactly `depth` hops up, without searching.
    /// Used whenever the resolver has recorded a binding distance.
    pub fn get_at(this: &EnvRef, depth: usize, name: &str, line: usize) -> Result<Value> {
        let scope = Self::ancestor(this, depth).ok_or_else(|| undefined(name, line))?;

        read_binding(&scope, name, line)
    }

    /// Write `name` in the scope exactly `depth` hops up.
    pub fn assign_at(
        this: &EnvRef,
        depth: usize,
        name: &str,
        value: Value,
        line: usize,
    ) -> Result<()> {
        let scope = Self::ancestor(this, depth).ok_or_else(|| undefined(name, line))?;

        scope.borrow_mut().bindings.insert(name.to_string(), value);

        Ok(())
    }

    /// The innermost scope on the chain starting at `this` that binds
    /// `name`.  Both search-based accessors funnel through here.
    fn scope_of(this: &EnvRef, name: &str) -> Option<EnvRef> {
        let mut scope = Rc::clone(this);

        loop {
            if scope.borrow().bindings.contains_key(name) {
                return Some(scope);
            }

            let parent = scope.borrow().parent.clone()?;
            scope = parent;
        }
    }

    /// The scope exactly `depth` hops up the chain.
    fn ancestor(this: &EnvRef, depth: usize) -> Option<EnvRef> {
        let mut scope = Rc::clone(this);

        for _ in 0..depth {
            let parent = scope.borrow().parent.clone()?;
            scope = parent;
        }

        Some(scope)
    }
}

fn read_binding(scope: &EnvRef, name: &str, line: usize) -> Result<Value> {
    let value = scope.borrow().bindings.get(name).cloned();

    value.ok_or_else(|| undefined(name, line))
}

fn undefined(name: &str, line: usize) -> LoxError {
    LoxError::runtime(format!("Undefined variable '{}' on line {}", name, line))
}
