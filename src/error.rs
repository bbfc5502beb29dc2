//! This module defines all error types used throughout the application.
//!
//! Fatal analysis errors (lexing, structural parse failures, duplicate or
//! ambiguous state names) all render with the user-facing `Parse error: `
//! prefix. Non-fatal findings are [`AnalysisWarning`] values attached to a
//! successful analysis, never raised as errors.

use crate::parser::lexer::Position;
use std::io;
use thiserror::Error;

/// Main error type for the application
#[derive(Error, Debug)]
pub enum Error {
    /// IO errors (file not found, permission denied, etc.)
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Unrecoverable byte sequences in the source text
    #[error("Parse error: {reason} at {position}")]
    Lex { position: Position, reason: String },

    /// Structurally malformed input (unbalanced delimiters, unterminated blocks)
    #[error("Parse error: {message} at {position}")]
    Parse { message: String, position: Position },

    /// The same qualified state name was declared twice
    #[error("Parse error: duplicate state declaration '{qualified_id}'")]
    DuplicateState { qualified_id: String },

    /// A bare state reference matches declarations under multiple scopes
    #[error("Parse error: ambiguous state reference '{name}' (candidates: {})", candidates.join(", "))]
    AmbiguousStateRef { name: String, candidates: Vec<String> },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error with custom message
    #[error("{0}")]
    Custom(String),

    /// Wrapped anyhow errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a custom error with a message
    pub fn custom(msg: impl Into<String>) -> Self {
        Self::Custom(msg.into())
    }

    /// Create a structural parse error at a position
    pub fn parse(msg: impl Into<String>, position: Position) -> Self {
        Self::Parse {
            message: msg.into(),
            position,
        }
    }

    /// Create a lexer error at a position
    pub fn lex(reason: impl Into<String>, position: Position) -> Self {
        Self::Lex {
            position,
            reason: reason.into(),
        }
    }

    /// Whether this error is fatal to analysis and carries the `Parse error: ` prefix
    pub fn is_analysis_error(&self) -> bool {
        matches!(
            self,
            Error::Lex { .. }
                | Error::Parse { .. }
                | Error::DuplicateState { .. }
                | Error::AmbiguousStateRef { .. }
        )
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Custom(format!("JSON error: {}", err))
    }
}

/// A non-fatal finding produced during analysis. The diagram is still
/// emitted; warnings describe edges that were degraded or dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisWarning {
    /// A transition clause deferred to a helper that could not be resolved
    /// (missing definition, or a call nested past the one-level depth limit).
    UnresolvedCall { name: String },

    /// An edge referencing an undeclared state was dropped from the graph.
    DroppedEdge {
        from: String,
        to: String,
        label: String,
    },
}

impl std::fmt::Display for AnalysisWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalysisWarning::UnresolvedCall { name } => {
                write!(f, "unresolved local call '{}'", name)
            }
            AnalysisWarning::DroppedEdge { from, to, label } => {
                write!(
                    f,
                    "dropped edge {} -> {} ({}): undeclared state",
                    from, to, label
                )
            }
        }
    }
}

// Helper macros for creating errors

/// Create a custom error with formatting
#[macro_export]
macro_rules! custom_error {
    ($($arg:tt)*) => {
        $crate::error::Error::Custom(format!($($arg)*))
    };
}

/// Bail with a custom error message
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::custom_error!($($arg)*))
    };
}

/// Ensure a condition is true or return error
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $($arg:tt)*) => {
        if !($cond) {
            $crate::bail!($($arg)*);
        }
    };
}
