use crate::value::Shape;
use colored::Colorize;
use std::path::PathBuf;
use thiserror::Error;

/// Why a root target was rejected before any field was visited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TargetError {
    #[error("cannot load into a value: target must be a record")]
    NotARecord,
    #[error("cannot load into an empty optional record")]
    Nil,
}

/// A raw source value that does not fit the shape of its field
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("invalid integer '{raw}': {reason}")]
    InvalidInteger { raw: String, reason: String },
    #[error("invalid float '{raw}'")]
    InvalidFloat { raw: String },
    #[error("invalid boolean '{raw}', expected true/false/1/0")]
    InvalidBool { raw: String },
    #[error("invalid duration '{raw}': {reason}")]
    InvalidDuration { raw: String, reason: String },
    #[error("invalid character '{raw}', expected exactly one character")]
    InvalidChar { raw: String },
    #[error("malformed map entry '{entry}', expected key=value")]
    MalformedEntry { entry: String },
    #[error("{shape} field cannot be set from {found}")]
    Unsupported { shape: Shape, found: &'static str },
    /// Error returned by a [`Settable`](crate::Settable) implementation, kept verbatim
    #[error("{0}")]
    Custom(String),
}

/// Errors that can occur while loading or validating a record
#[derive(Debug, Clone, Error)]
pub enum Error {
    #[error(transparent)]
    InvalidTarget(#[from] TargetError),

    #[error("{}: {shape} field cannot be set from {found} (key {key})", .path.magenta().bold())]
    UnsupportedShape {
        path: String,
        key: String,
        shape: Shape,
        found: &'static str,
    },

    #[error(
        "{}: Invalid value {} for {key}: {source}",
        .path.magenta().bold(),
        format!("'{}'", .value).red()
    )]
    Parse {
        path: String,
        key: String,
        value: String,
        source: ParseError,
    },

    #[error(
        "{}: {} and {second} both resolve to it",
        .key.magenta().bold(),
        format!("duplicate key, {first}").red()
    )]
    DuplicateKey {
        key: String,
        first: String,
        second: String,
    },

    #[error("{}: Is required but has a zero value", .path.magenta().bold())]
    RequiredMissing { path: String },

    #[error("{}: {reason}", .path.display().to_string().magenta().bold())]
    SourceUnavailable { path: PathBuf, reason: String },

    #[error("Invalid command-line flags: {message}")]
    Flags { message: String },

    #[error("{usage}")]
    Help { usage: String },

    #[error("{}", format_errors(.0))]
    Multiple(Vec<Error>),
}

impl Error {
    /// Wraps a coercion failure with the field path, key and raw text it came from
    pub(crate) fn coercion(path: String, key: &str, value: &str, err: ParseError) -> Self {
        match err {
            ParseError::Unsupported { shape, found } => Error::UnsupportedShape {
                path,
                key: key.to_string(),
                shape,
                found,
            },
            source => Error::Parse {
                path,
                key: key.to_string(),
                value: value.to_string(),
                source,
            },
        }
    }

    /// Paths of every required field reported by this error
    pub fn missing_fields(&self) -> Vec<&str> {
        match self {
            Error::RequiredMissing { path } => vec![path.as_str()],
            Error::Multiple(errors) => errors.iter().flat_map(Error::missing_fields).collect(),
            _ => Vec::new(),
        }
    }
}

/// Helper to format multiple configuration errors into a panic message
pub fn format_errors(errors: &[Error]) -> String {
    let error_summary = errors
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Configuration failed with {} error(s):\n{}",
        errors.len().to_string().yellow().bold(),
        error_summary
    )
}
