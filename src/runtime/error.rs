use crate::language::{span::Span, token::Token};
use thiserror::Error;

pub type RuntimeResult<T> = Result<T, RuntimeFault>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Undefined variable '{name}'.")]
    UndefinedVariable { name: String },
    #[error("Operand must be a number.")]
    OperandMustBeNumber,
    #[error("Operands must be two numbers or two strings.")]
    OperandsMustBeNumbersOrStrings,
    #[error("Can only call functions and classes.")]
    NotCallable,
    #[error("Expected {expected} arguments but got {received}.")]
    ArityMismatch { expected: usize, received: usize },
    #[error("Failed to write output: {0}")]
    Output(#[from] std::io::Error),
}

/// A runtime error pinned to the token that raised it.
#[derive(Debug, Error)]
#[error("{error}\n[line {line}]")]
pub struct RuntimeFault {
    pub error: RuntimeError,
    pub line: usize,
    pub span: Span,
}

impl RuntimeFault {
    pub fn at(token: &Token, error: RuntimeError) -> Self {
        Self {
            error,
            line: token.line,
            span: token.span,
        }
    }

    pub fn message(&self) -> String {
        self.error.to_string()
    }
}

pub trait AtToken<T> {
    fn at_token(self, token: &Token) -> RuntimeResult<T>;
}

impl<T> AtToken<T> for Result<T, RuntimeError> {
    fn at_token(self, token: &Token) -> RuntimeResult<T> {
        self.map_err(|error| RuntimeFault::at(token, error))
    }
}
