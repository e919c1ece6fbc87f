//! Error types for the compliance module.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for top-level engine operations.
pub type EngineResult<T> = Result<T, ComplianceError>;

/// Errors that abort a whole compliance run.
///
/// Everything that can go wrong for a single rule is reported as a
/// [`CheckError`] and turned into an `ERROR` result instead.
#[derive(Error, Debug)]
pub enum ComplianceError {
    #[error("Invalid target path {path:?}: {reason}")]
    InvalidTarget { path: PathBuf, reason: String },
}

/// Errors raised while loading a rule document.
///
/// The rule store never propagates these; the offending document is skipped
/// with a warning.
#[derive(Error, Debug)]
pub enum RuleError {
    #[error("Invalid parameters for rule '{rule}' ({check_type}): {message}")]
    InvalidParameters {
        rule: String,
        check_type: String,
        message: String,
    },

    #[error("Unsupported rule document format: {0}")]
    UnsupportedFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Unexpected conditions hit while evaluating one rule.
#[derive(Error, Debug)]
pub enum CheckError {
    #[error("Failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path:?}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Failed to scan {path:?}: {message}")]
    Scan { path: PathBuf, message: String },
}

impl CheckError {
    pub(crate) fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn parse(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.to_string(),
        }
    }
}
