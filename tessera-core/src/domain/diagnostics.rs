// tessera-core/src/domain/diagnostics.rs

use crate::domain::rules::DeclLocation;
use crate::error::TesseraError;
use miette::Diagnostic;
use regex::Regex;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;

/// Raised when a user mapping configuration cannot be loaded against the
/// declaration API.
///
/// Carries the config file path, a best-effort originating line number, the
/// declaration trace inside the user config (internal frames excluded), and
/// the original failure for inspection. Loading is single-pass: there is no
/// retry or partial recovery.
#[derive(Debug, Error, Diagnostic)]
#[diagnostic(
    code(tessera::domain::config_load),
    help("The line number comes from the first declaration made in the config file, or for syntax errors (which leave no declarations) from the parser message.")
)]
pub struct ConfigLoadError {
    pub config_file: PathBuf,
    pub lineno: Option<u32>,
    pub config_trace: Vec<DeclLocation>,
    #[source]
    pub original: Box<TesseraError>,
}

impl ConfigLoadError {
    /// Wrap a failure raised while evaluating the config at `config_file`.
    /// `trace` is the declaration-location trail accumulated by the builder
    /// up to the failure.
    pub fn new(config_file: impl Into<PathBuf>, trace: &[DeclLocation], original: TesseraError) -> Self {
        let config_file = config_file.into();
        // A matching trace frame wins; the message regexes only kick in for
        // syntax-class failures, which fail before any declaration is made
        // and so leave no trace to match.
        let lineno = lineno_from_trace(&config_file, trace)
            .or_else(|| lineno_from_message(&original.to_string()));
        Self {
            config_trace: trace_from_config(&config_file, trace),
            config_file,
            lineno,
            original: Box::new(original),
        }
    }
}

impl fmt::Display for ConfigLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error loading configuration file {}", self.config_file.display())?;
        if let Some(lineno) = self.lineno {
            write!(f, ":{}", lineno)?;
        }
        write!(f, " {}", self.original)
    }
}

/// Best-effort line number from a failure message. Syntax-class failures
/// carry no declaration trace, but their messages usually embed the line,
/// either `...:4:...` or `... at line 4 column 2`.
pub fn lineno_from_message(message: &str) -> Option<u32> {
    static COLON_FORM: OnceLock<Regex> = OnceLock::new();
    static WORD_FORM: OnceLock<Regex> = OnceLock::new();
    let colon = COLON_FORM.get_or_init(|| {
        #[allow(clippy::unwrap_used)]
        Regex::new(r":(\d+):").unwrap()
    });
    let word = WORD_FORM.get_or_init(|| {
        #[allow(clippy::unwrap_used)]
        Regex::new(r"line (\d+)").unwrap()
    });
    colon
        .captures(message)
        .or_else(|| word.captures(message))
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Line of the first declaration frame made from the config file itself.
fn lineno_from_trace(config_file: &Path, trace: &[DeclLocation]) -> Option<u32> {
    trace
        .iter()
        .find(|frame| Path::new(&frame.file) == config_file)
        .map(|frame| frame.line)
}

/// The trace up to and including the first frame inside the config file.
/// Empty when no frame matches the config file.
fn trace_from_config(config_file: &Path, trace: &[DeclLocation]) -> Vec<DeclLocation> {
    let mut filtered = Vec::new();
    for frame in trace {
        filtered.push(frame.clone());
        if Path::new(&frame.file) == config_file {
            return filtered;
        }
    }
    Vec::new()
}
