use crate::language::ast::FunctionDecl;
use crate::runtime::{
    environment::Environment,
    error::RuntimeResult,
    interpreter::{Flow, Interpreter},
    value::Value,
};
use std::fmt;
use std::rc::Rc;

/// Anything a call expression can invoke.
#[derive(Clone)]
pub enum Callable {
    Native(Rc<NativeFunction>),
    User(Rc<UserFunction>),
}

pub struct NativeFunction {
    pub name: &'static str,
    pub arity: usize,
    pub function: fn(&[Value]) -> Value,
}

/// A `fun` declaration paired with the scope it was declared in.
pub struct UserFunction {
    pub declaration: Rc<FunctionDecl>,
    pub closure: Environment,
}

impl Callable {
    pub fn user(declaration: Rc<FunctionDecl>, closure: Environment) -> Self {
        Callable::User(Rc::new(UserFunction {
            declaration,
            closure,
        }))
    }

    pub fn native(name: &'static str, arity: usize, function: fn(&[Value]) -> Value) -> Self {
        Callable::Native(Rc::new(NativeFunction {
            name,
            arity,
            function,
        }))
    }

    pub fn arity(&self) -> usize {
        match self {
            Callable::Native(native) => native.arity,
            Callable::User(function) => function.declaration.arity(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Callable::Native(native) => native.name,
            Callable::User(function) => &function.declaration.name.lexeme,
        }
    }

    pub fn ptr_eq(&self, other: &Callable) -> bool {
        match (self, other) {
            (Callable::Native(a), Callable::Native(b)) => Rc::ptr_eq(a, b),
            (Callable::User(a), Callable::User(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Arity is checked by the caller.
    pub fn call(&self, interpreter: &mut Interpreter, args: Vec<Value>) -> RuntimeResult<Value> {
        match self {
            Callable::Native(native) => Ok((native.function)(&args)),
            Callable::User(function) => {
                let environment = Environment::enclosed(&function.closure);
                for (param, arg) in function.declaration.params.iter().zip(args) {
                    environment.define(param.lexeme.clone(), arg);
                }
                match interpreter.execute_block(&function.declaration.body, environment)? {
                    Flow::Return(value) => Ok(value),
                    Flow::Next => Ok(Value::Nil),
                }
            }
        }
    }
}

impl fmt::Display for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Callable::Native(native) => write!(f, "<native fn {}>", native.name),
            Callable::User(function) => write!(f, "<fn {}>", function.declaration.name.lexeme),
        }
    }
}
