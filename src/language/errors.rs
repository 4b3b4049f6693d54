use crate::language::{
    span::Span,
    token::{Token, TokenKind},
};

/// A lexical or syntax fault. Collected, never thrown past the front end.
#[derive(Clone, Debug, PartialEq)]
pub struct SyntaxError {
    pub message: String,
    pub line: usize,
    pub location: Option<String>,
    pub span: Span,
    pub help: Option<String>,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, line: usize, span: Span) -> Self {
        Self {
            message: message.into(),
            line,
            location: None,
            span,
            help: None,
        }
    }

    /// Error anchored on a token: located at `end` for end of input, or at the lexeme.
    pub fn at_token(token: &Token, message: impl Into<String>) -> Self {
        let location = if token.is(TokenKind::Eof) {
            "end".to_string()
        } else {
            format!("'{}'", token.lexeme)
        };
        Self {
            message: message.into(),
            line: token.line,
            location: Some(location),
            span: token.span,
            help: None,
        }
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }
}
