//! Error types for `gcode_migrate`.
//!
//! Two families live here:
//! - [`MigrateError`]: fatal failures while loading configuration or lookup
//!   tables. These abort a run before any message is processed.
//! - [`Diagnostic`]: recoverable conditions met while transforming a single
//!   message. They are logged and handed back alongside the result so the
//!   operator can follow up manually.

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, MigrateError>;

/// Fatal errors.
#[derive(Debug, Error)]
pub enum MigrateError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid pattern: {0}")]
    Regex(#[from] regex::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("{}:{line}: {reason}", path.display())]
    InvalidMapping {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("input line {line}: {reason}")]
    InvalidRecord { line: usize, reason: String },
}

impl MigrateError {
    /// Shorthand for a configuration error about a single key.
    pub fn missing_key(key: &str) -> Self {
        Self::Config(format!("required setting '{key}' is not set"))
    }
}

/// Recoverable per-message conditions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, schemars::JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// A revision mention has no destination commit; left as written.
    UnresolvedReference { revision: String },
    /// The body already contains a code fence; it was indented instead.
    UnexpectedMarkup { sequence: String },
    /// The rendered body reached the size ceiling and was replaced.
    OversizeBody { length: usize },
    /// The creation timestamp could not be parsed; shown verbatim.
    UnparsableDate { raw: String },
}

impl Diagnostic {
    /// Emit this diagnostic as a warning on the current span.
    pub fn emit(&self) {
        match self {
            Self::UnresolvedReference { revision } => {
                tracing::warn!(revision = %revision, "No destination commit for revision");
            }
            Self::UnexpectedMarkup { sequence } => {
                tracing::warn!(sequence = %sequence, "Body already contains a fence, indenting instead");
            }
            Self::OversizeBody { length } => {
                tracing::warn!(length, "Rendered body too long, replaced with placeholder");
            }
            Self::UnparsableDate { raw } => {
                tracing::warn!(raw = %raw, "Unparsable timestamp, passing through unchanged");
            }
        }
    }
}
