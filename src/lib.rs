#![allow(clippy::collapsible_if)]

pub mod config;
pub mod diagnostics;
pub mod language;
pub mod logging;
pub mod runtime;
pub mod session;

pub use session::{Outcome, RunReport, Session};

#[cfg(test)]
mod tests;
