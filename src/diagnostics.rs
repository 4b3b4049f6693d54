use crate::{
    config::DiagnosticStyle,
    language::{errors::SyntaxError, span::Span},
    runtime::error::RuntimeFault,
};
use miette::{Diagnostic as MietteDiagnostic, NamedSource, Report, SourceSpan};
use std::path::Path;
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// Lexical or syntax error. Reported before anything runs.
    Static,
    /// Uncaught runtime fault. Ends the run.
    Runtime,
}

/// One record on the diagnostics channel.
#[derive(Clone, Debug, PartialEq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub line: usize,
    pub location: Option<String>,
    pub message: String,
    pub span: Span,
    pub help: Option<String>,
}

impl From<SyntaxError> for Diagnostic {
    fn from(err: SyntaxError) -> Self {
        Self {
            kind: DiagnosticKind::Static,
            line: err.line,
            location: err.location,
            message: err.message,
            span: err.span,
            help: err.help,
        }
    }
}

impl From<&RuntimeFault> for Diagnostic {
    fn from(fault: &RuntimeFault) -> Self {
        Self {
            kind: DiagnosticKind::Runtime,
            line: fault.line,
            location: None,
            message: fault.message(),
            span: fault.span,
            help: None,
        }
    }
}

impl Diagnostic {
    /// `[line N] Error at 'x': message` for static errors, `message\n[line N]` at runtime.
    pub fn render_plain(&self) -> String {
        match (self.kind, &self.location) {
            (DiagnosticKind::Static, Some(location)) => {
                format!("[line {}] Error at {}: {}", self.line, location, self.message)
            }
            (DiagnosticKind::Static, None) => {
                format!("[line {}] Error: {}", self.line, self.message)
            }
            (DiagnosticKind::Runtime, _) => format!("{}\n[line {}]", self.message, self.line),
        }
    }

    pub fn render_fancy(&self, name: &str, source: &str) -> String {
        let diagnostic = SourceDiagnostic::new(NamedSource::new(name, source.to_string()), self);
        format!("{:?}", Report::new(diagnostic))
    }

    pub fn render(&self, style: DiagnosticStyle, name: &str, source: &str) -> String {
        match style {
            DiagnosticStyle::Plain => self.render_plain(),
            DiagnosticStyle::Fancy => self.render_fancy(name, source),
        }
    }
}

#[derive(Debug, Error, MietteDiagnostic)]
#[error("{message}")]
pub struct SourceDiagnostic {
    #[source_code]
    src: NamedSource,
    #[label("{label}")]
    span: SourceSpan,
    #[help]
    help: Option<String>,
    message: String,
    label: String,
}

impl SourceDiagnostic {
    pub fn new(src: NamedSource, diagnostic: &Diagnostic) -> Self {
        let label = match (diagnostic.kind, &diagnostic.location) {
            (DiagnosticKind::Static, Some(location)) => format!("error at {location}"),
            (DiagnosticKind::Static, None) => "here".to_string(),
            (DiagnosticKind::Runtime, _) => format!("raised on line {}", diagnostic.line),
        };
        Self {
            src,
            span: diagnostic.span.into(),
            help: diagnostic.help.clone(),
            message: diagnostic.message.clone(),
            label,
        }
    }
}

pub fn emit_diagnostics(
    diagnostics: &[Diagnostic],
    style: DiagnosticStyle,
    name: &str,
    source: &str,
) {
    for diagnostic in diagnostics {
        eprintln!("{}", diagnostic.render(style, name, source));
    }
}

pub fn report_io_error(path: &Path, error: &std::io::Error) {
    eprintln!("Failed to access {}: {}", path.display(), error);
}
