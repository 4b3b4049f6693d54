use crate::language::{
    errors::SyntaxError,
    span::Span,
    token::{Literal, Token, TokenKind},
};
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{alpha1, alphanumeric1, char, digit1},
    combinator::{opt, recognize},
    multi::many0_count,
    sequence::pair,
    IResult, Parser as NomParser,
};

/// Result of scanning a whole source string. `tokens` always ends with `Eof`.
#[derive(Debug)]
pub struct Scanned {
    pub tokens: Vec<Token>,
    pub errors: Vec<SyntaxError>,
}

pub fn scan(source: &str) -> Scanned {
    let scanned = Lexer::new(source).run();
    tracing::trace!(
        tokens = scanned.tokens.len(),
        errors = scanned.errors.len(),
        "scanned source"
    );
    scanned
}

// A '.' only belongs to the number when a digit follows it.
fn number_literal(input: &str) -> IResult<&str, &str> {
    recognize(pair(digit1, opt(pair(char('.'), digit1)))).parse(input)
}

fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        alt((alpha1, tag("_"))),
        many0_count(alt((alphanumeric1, tag("_")))),
    ))
    .parse(input)
}

struct Lexer<'a> {
    src: &'a str,
    chars: std::str::Chars<'a>,
    current: Option<char>,
    offset: usize,
    line: usize,
    tokens: Vec<Token>,
    errors: Vec<SyntaxError>,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        let mut chars = src.chars();
        let current = chars.next();
        Self {
            src,
            chars,
            current,
            offset: 0,
            line: 1,
            tokens: Vec::new(),
            errors: Vec::new(),
        }
    }

    fn run(mut self) -> Scanned {
        while let Some(ch) = self.current {
            match ch {
                '/' if self.peek() == Some('/') => self.eat_line_comment(),
                ' ' | '\t' | '\r' => {
                    self.bump();
                }
                '\n' => {
                    self.line += 1;
                    self.bump();
                }
                '"' => self.lex_string(),
                ch if ch.is_ascii_digit() => self.lex_number(),
                ch if ch.is_ascii_alphabetic() || ch == '_' => self.lex_identifier(),
                _ => self.lex_symbol(),
            }
        }
        let end = self.offset;
        self.tokens
            .push(Token::new(TokenKind::Eof, "", self.line, Span::new(end, end)));

        Scanned {
            tokens: self.tokens,
            errors: self.errors,
        }
    }

    fn bump(&mut self) -> Option<char> {
        if let Some(ch) = self.current {
            self.offset += ch.len_utf8();
        }
        self.current = self.chars.next();
        self.current
    }

    fn peek(&self) -> Option<char> {
        self.chars.clone().next()
    }

    fn seek(&mut self, offset: usize) {
        self.offset = offset;
        self.chars = self.src[offset..].chars();
        self.current = self.chars.next();
    }

    fn token(&self, kind: TokenKind, start: usize, end: usize) -> Token {
        Token::new(kind, &self.src[start..end], self.line, Span::new(start, end))
    }

    fn push_token(&mut self, kind: TokenKind, start: usize, end: usize) {
        let token = self.token(kind, start, end);
        self.tokens.push(token);
    }

    fn error(&mut self, start: usize, end: usize, message: impl Into<String>) {
        self.errors
            .push(SyntaxError::new(message, self.line, Span::new(start, end)));
    }

    fn eat_line_comment(&mut self) {
        while let Some(ch) = self.current {
            if ch == '\n' {
                break;
            }
            self.bump();
        }
    }

    fn lex_identifier(&mut self) {
        let src = self.src;
        let start = self.offset;
        let Ok((rest, text)) = identifier(&src[start..]) else {
            self.bump();
            self.error(start, self.offset, "Unexpected character.");
            return;
        };
        let end = src.len() - rest.len();
        let kind = TokenKind::keyword(text).unwrap_or(TokenKind::Identifier);
        self.seek(end);
        self.push_token(kind, start, end);
    }

    fn lex_number(&mut self) {
        let src = self.src;
        let start = self.offset;
        let Ok((rest, text)) = number_literal(&src[start..]) else {
            self.bump();
            self.error(start, self.offset, "Unexpected character.");
            return;
        };
        let end = src.len() - rest.len();
        match text.parse::<f64>() {
            Ok(value) => {
                self.seek(end);
                let token = self.token(TokenKind::Number, start, end);
                self.tokens.push(token.with_literal(Literal::Number(value)));
            }
            Err(_) => {
                self.seek(end);
                self.error(start, end, "Invalid number literal.");
            }
        }
    }

    fn lex_string(&mut self) {
        let start = self.offset;
        self.bump();
        while let Some(ch) = self.current {
            match ch {
                '"' => {
                    self.bump();
                    let end = self.offset;
                    let value = self.src[start + 1..end - 1].to_string();
                    let token = self.token(TokenKind::String, start, end);
                    self.tokens.push(token.with_literal(Literal::String(value)));
                    return;
                }
                '\n' => {
                    self.line += 1;
                    self.bump();
                }
                _ => {
                    self.bump();
                }
            }
        }
        self.errors.push(
            SyntaxError::new("Unterminated string.", self.line, Span::new(start, self.offset))
                .with_help("close the string with a matching '\"'"),
        );
    }

    fn lex_symbol(&mut self) {
        let start = self.offset;
        match self.current {
            Some('(') => self.single(TokenKind::LeftParen),
            Some(')') => self.single(TokenKind::RightParen),
            Some('{') => self.single(TokenKind::LeftBrace),
            Some('}') => self.single(TokenKind::RightBrace),
            Some(',') => self.single(TokenKind::Comma),
            Some('.') => self.single(TokenKind::Dot),
            Some('-') => self.single(TokenKind::Minus),
            Some('+') => self.single(TokenKind::Plus),
            Some(';') => self.single(TokenKind::Semicolon),
            Some('*') => self.single(TokenKind::Star),
            Some('/') => self.single(TokenKind::Slash),
            Some('!') => self.either('=', TokenKind::BangEqual, TokenKind::Bang),
            Some('=') => self.either('=', TokenKind::EqualEqual, TokenKind::Equal),
            Some('<') => self.either('=', TokenKind::LessEqual, TokenKind::Less),
            Some('>') => self.either('=', TokenKind::GreaterEqual, TokenKind::Greater),
            Some(_) => {
                self.bump();
                self.error(start, self.offset, "Unexpected character.");
            }
            None => {}
        }
    }

    fn single(&mut self, kind: TokenKind) {
        let start = self.offset;
        self.bump();
        self.push_token(kind, start, self.offset);
    }

    fn either(&mut self, next: char, matched: TokenKind, otherwise: TokenKind) {
        let start = self.offset;
        self.bump();
        if self.current == Some(next) {
            self.bump();
            self.push_token(matched, start, self.offset);
        } else {
            self.push_token(otherwise, start, self.offset);
        }
    }
}
