//! Drives one piece of source text through scanning, parsing and evaluation.
//!
//! A [`Session`] owns a single interpreter, so definitions made by one
//! [`Session::run`] stay visible to the next. The prompt relies on that.

use crate::{
    diagnostics::Diagnostic,
    language::{
        lexer,
        parser::{self, parse_source},
        printer,
    },
    runtime::Interpreter,
};
use std::io::Write;
use tracing::debug;

/// How a run ended, from the process's point of view.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Success,
    StaticError,
    RuntimeError,
}

impl Outcome {
    pub fn exit_code(self) -> u8 {
        match self {
            Outcome::Success => 0,
            Outcome::StaticError => 65,
            Outcome::RuntimeError => 70,
        }
    }
}

#[derive(Debug)]
pub struct RunReport {
    pub outcome: Outcome,
    pub diagnostics: Vec<Diagnostic>,
}

impl RunReport {
    fn success() -> Self {
        Self {
            outcome: Outcome::Success,
            diagnostics: Vec::new(),
        }
    }

    fn from_static(diagnostics: Vec<Diagnostic>) -> Self {
        let outcome = if diagnostics.is_empty() {
            Outcome::Success
        } else {
            Outcome::StaticError
        };
        Self {
            outcome,
            diagnostics,
        }
    }
}

pub struct Session {
    interpreter: Interpreter,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            interpreter: Interpreter::new(),
        }
    }

    pub fn with_output(out: Box<dyn Write>) -> Self {
        Self {
            interpreter: Interpreter::with_output(out),
        }
    }

    /// Scans, parses and, when both are clean, evaluates `source`. Any static
    /// error means nothing runs.
    pub fn run(&mut self, source: &str) -> RunReport {
        let parsed = parse_source(source);
        if !parsed.errors.is_empty() {
            debug!(errors = parsed.errors.len(), "static errors; skipping evaluation");
            return RunReport::from_static(
                parsed.errors.into_iter().map(Diagnostic::from).collect(),
            );
        }
        debug!(statements = parsed.statements.len(), "evaluating");
        match self.interpreter.interpret(&parsed.statements) {
            Ok(()) => RunReport::success(),
            Err(fault) => {
                debug!(line = fault.line, "runtime fault");
                RunReport {
                    outcome: Outcome::RuntimeError,
                    diagnostics: vec![Diagnostic::from(&fault)],
                }
            }
        }
    }
}

/// One token per line, `KIND lexeme literal`, ending with the end-of-input token.
pub fn dump_tokens(source: &str) -> (String, RunReport) {
    let scanned = lexer::scan(source);
    debug!(tokens = scanned.tokens.len(), "scanned");
    let text = scanned
        .tokens
        .iter()
        .map(|token| format!("{token}\n"))
        .collect::<String>();
    let diagnostics = scanned.errors.into_iter().map(Diagnostic::from).collect();
    (text, RunReport::from_static(diagnostics))
}

/// Each recovered top-level statement in prefix form, one per line.
pub fn dump_ast(source: &str) -> (String, RunReport) {
    let scanned = lexer::scan(source);
    let lexical = scanned.errors;
    let parsed = parser::parse(scanned.tokens);
    let text = parsed
        .statements
        .iter()
        .map(|stmt| format!("{}\n", printer::print_stmt(stmt)))
        .collect::<String>();
    let diagnostics = lexical
        .into_iter()
        .chain(parsed.errors)
        .map(Diagnostic::from)
        .collect();
    (text, RunReport::from_static(diagnostics))
}
