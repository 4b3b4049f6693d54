use std::{env, path::PathBuf, str::FromStr};
use thiserror::Error;

pub const DIAGNOSTICS_VAR: &str = "LOX_DIAGNOSTICS";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Mode {
    Prompt,
    Script(PathBuf),
}

/// What to do with each piece of source once it is read.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Action {
    #[default]
    Run,
    Tokens,
    PrintAst,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DiagnosticStyle {
    #[default]
    Plain,
    Fancy,
}

impl FromStr for DiagnosticStyle {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "plain" => Ok(DiagnosticStyle::Plain),
            "fancy" => Ok(DiagnosticStyle::Fancy),
            other => Err(ConfigError::UnknownStyle(other.to_string())),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Usage: lox-lang [--tokens | --print-ast] [script]")]
    Usage,
    #[error("Unknown option `{0}`\nUsage: lox-lang [--tokens | --print-ast] [script]")]
    UnknownOption(String),
    #[error("Unknown diagnostics style `{0}` in LOX_DIAGNOSTICS (expected `plain` or `fancy`)")]
    UnknownStyle(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub mode: Mode,
    pub action: Action,
    pub style: DiagnosticStyle,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let style = env::var(DIAGNOSTICS_VAR).ok();
        Self::parse(env::args().skip(1), style.as_deref())
    }

    /// Builds a config from command-line arguments (program name excluded)
    /// and the raw value of the diagnostics style variable.
    pub fn parse<I, S>(args: I, style: Option<&str>) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut action = Action::Run;
        let mut script = None;
        for arg in args {
            let arg: String = arg.into();
            match arg.as_str() {
                "--tokens" if action == Action::Run => action = Action::Tokens,
                "--print-ast" if action == Action::Run => action = Action::PrintAst,
                "--tokens" | "--print-ast" => return Err(ConfigError::Usage),
                flag if flag.starts_with("--") => {
                    return Err(ConfigError::UnknownOption(flag.to_string()))
                }
                _ if script.is_some() => return Err(ConfigError::Usage),
                path => script = Some(PathBuf::from(path)),
            }
        }
        let style = match style {
            Some(value) => value.parse()?,
            None => DiagnosticStyle::default(),
        };
        Ok(Self {
            mode: script.map_or(Mode::Prompt, Mode::Script),
            action,
            style,
        })
    }
}
