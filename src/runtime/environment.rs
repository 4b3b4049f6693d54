use crate::runtime::{error::RuntimeError, value::Value};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

#[derive(Default)]
struct Scope {
    values: HashMap<String, Value>,
    enclosing: Option<Environment>,
}

/// Shared handle to one scope in the chain. Clones alias the same scope, so a
/// closure holding a handle keeps its scope alive after the block that made it.
#[derive(Clone, Default)]
pub struct Environment {
    scope: Rc<RefCell<Scope>>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enclosed(parent: &Environment) -> Self {
        Self {
            scope: Rc::new(RefCell::new(Scope {
                values: HashMap::new(),
                enclosing: Some(parent.clone()),
            })),
        }
    }

    pub fn enclosing(&self) -> Option<Environment> {
        self.scope.borrow().enclosing.clone()
    }

    /// Binds in this scope, replacing any existing local binding.
    pub fn define(&self, name: impl Into<String>, value: Value) {
        self.scope.borrow_mut().values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Result<Value, RuntimeError> {
        let mut current = self.clone();
        loop {
            let parent = {
                let scope = current.scope.borrow();
                if let Some(value) = scope.values.get(name) {
                    return Ok(value.clone());
                }
                scope.enclosing.clone()
            };
            match parent {
                Some(parent) => current = parent,
                None => return Err(undefined(name)),
            }
        }
    }

    /// Updates the nearest existing binding. Never creates one.
    pub fn assign(&self, name: &str, value: Value) -> Result<(), RuntimeError> {
        let mut current = self.clone();
        loop {
            let parent = {
                let mut scope = current.scope.borrow_mut();
                if let Some(slot) = scope.values.get_mut(name) {
                    *slot = value;
                    return Ok(());
                }
                scope.enclosing.clone()
            };
            match parent {
                Some(parent) => current = parent,
                None => return Err(undefined(name)),
            }
        }
    }

    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut current = self.enclosing();
        while let Some(scope) = current {
            depth += 1;
            current = scope.enclosing();
        }
        depth
    }

    pub fn ptr_eq(&self, other: &Environment) -> bool {
        Rc::ptr_eq(&self.scope, &other.scope)
    }
}

fn undefined(name: &str) -> RuntimeError {
    RuntimeError::UndefinedVariable {
        name: name.to_string(),
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scope = self.scope.borrow();
        let mut names: Vec<&String> = scope.values.keys().collect();
        names.sort();
        f.debug_struct("Environment")
            .field("names", &names)
            .field("depth", &self.depth())
            .finish()
    }
}
