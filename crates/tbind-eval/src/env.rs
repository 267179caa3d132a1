//! Lexical environments.
//!
//! A chain of scopes. Function scopes also hold `var`s and the `this`
//! value; block scopes hold `let`/`const`. Arrow functions get a function
//! scope without `this`, so lookups reach the enclosing one.

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::value::Value;

struct Binding {
    value: Value,
    mutable: bool,
}

struct Scope {
    vars: FxHashMap<String, Binding>,
    parent: Option<Env>,
    function: bool,
    this: Option<Value>,
}

#[derive(Clone)]
pub struct Env(Rc<RefCell<Scope>>);

/// Why an assignment failed.
#[derive(Debug, PartialEq, Eq)]
pub enum AssignError {
    Unbound,
    Const,
}

impl Env {
    pub fn global() -> Env {
        Env::new(None, true, Some(Value::Undefined))
    }

    fn new(parent: Option<Env>, function: bool, this: Option<Value>) -> Env {
        Env(Rc::new(RefCell::new(Scope {
            vars: FxHashMap::default(),
            parent,
            function,
            this,
        })))
    }

    pub fn block(&self) -> Env {
        Env::new(Some(self.clone()), false, None)
    }

    /// Scope for a call. `this` is `None` for arrow functions.
    pub fn function(&self, this: Option<Value>) -> Env {
        Env::new(Some(self.clone()), true, this)
    }

    pub fn declare(&self, name: &str, value: Value, mutable: bool) {
        self.0
            .borrow_mut()
            .vars
            .insert(name.to_string(), Binding { value, mutable });
    }

    /// Declare a `var` in the nearest function scope. An existing binding
    /// keeps its value unless `value` is given.
    pub fn declare_var(&self, name: &str, value: Option<Value>) {
        let mut scope = self.clone();
        loop {
            let parent = {
                let s = scope.0.borrow();
                if s.function {
                    None
                } else {
                    s.parent.clone()
                }
            };
            match parent {
                Some(p) => scope = p,
                None => break,
            }
        }
        let mut s = scope.0.borrow_mut();
        if let Some(binding) = s.vars.get_mut(name) {
            if let Some(value) = value {
                binding.value = value;
            }
            return;
        }
        s.vars.insert(
            name.to_string(),
            Binding {
                value: value.unwrap_or(Value::Undefined),
                mutable: true,
            },
        );
    }

    pub fn lookup(&self, name: &str) -> Option<Value> {
        let s = self.0.borrow();
        match s.vars.get(name) {
            Some(binding) => Some(binding.value.clone()),
            None => s.parent.as_ref().and_then(|p| p.lookup(name)),
        }
    }

    pub fn is_declared_here(&self, name: &str) -> bool {
        self.0.borrow().vars.contains_key(name)
    }

    pub fn assign(&self, name: &str, value: Value) -> Result<(), AssignError> {
        let parent = {
            let mut s = self.0.borrow_mut();
            if let Some(binding) = s.vars.get_mut(name) {
                if !binding.mutable {
                    return Err(AssignError::Const);
                }
                binding.value = value;
                return Ok(());
            }
            s.parent.clone()
        };
        match parent {
            Some(parent) => parent.assign(name, value),
            None => Err(AssignError::Unbound),
        }
    }

    pub fn this(&self) -> Value {
        let s = self.0.borrow();
        match &s.this {
            Some(this) => this.clone(),
            None => s
                .parent
                .as_ref()
                .map(Env::this)
                .unwrap_or(Value::Undefined),
        }
    }
}
