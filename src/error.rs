//src/error.rs

use std::path::PathBuf;
use thiserror::Error;

/// The four failure classes a caller can branch on, plus option and
/// environment failures (I/O, worker pool start-up).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Format,
    Parse,
    Bounds,
    Consistency,
    Config,
    Io,
}

/// Every way an aggregation run can fail. None of these are recoverable
/// within a run: the first error aborts the whole file.
#[derive(Debug, Error)]
pub enum CoverageError {
    /// Malformed row: wrong column count or missing header column.
    #[error("format error at line {line}: {detail}")]
    Format { line: usize, detail: String },

    /// Non-numeric (or non-finite) content in a numeric column.
    #[error("parse error at line {line}: column '{column}' value '{value}' is not {expected}")]
    Parse {
        line: usize,
        column: &'static str,
        value: String,
        expected: &'static str,
    },

    /// Alignment interval falls outside the subject's coverage array.
    #[error(
        "bounds error at line {line}: coordinates {start}..{end} on '{subject}' exceeds length {length}"
    )]
    Bounds {
        line: usize,
        subject: String,
        start: i64,
        end: i64,
        length: usize,
    },

    /// A subject or protein is missing from (or disagrees with) the mapping data.
    #[error("consistency error for '{subject}': {detail}")]
    Consistency { subject: String, detail: String },

    /// Options that cannot work together.
    #[error("invalid options: {0}")]
    Config(String),

    #[error("could not start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("I/O error on '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, CoverageError>;

impl CoverageError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoverageError::Format { .. } => ErrorKind::Format,
            CoverageError::Parse { .. } => ErrorKind::Parse,
            CoverageError::Bounds { .. } => ErrorKind::Bounds,
            CoverageError::Consistency { .. } => ErrorKind::Consistency,
            CoverageError::Config(_) => ErrorKind::Config,
            CoverageError::Io { .. } | CoverageError::ThreadPool(_) => ErrorKind::Io,
        }
    }

    pub fn format(line: usize, detail: impl Into<String>) -> Self {
        CoverageError::Format {
            line,
            detail: detail.into(),
        }
    }

    pub fn consistency(subject: impl Into<String>, detail: impl Into<String>) -> Self {
        CoverageError::Consistency {
            subject: subject.into(),
            detail: detail.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CoverageError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Parse one integer field, reporting the column name and line on failure.
pub(crate) fn parse_field<T: std::str::FromStr>(
    raw: &str,
    column: &'static str,
    line: usize,
) -> Result<T> {
    raw.trim().parse::<T>().map_err(|_| CoverageError::Parse {
        line,
        column,
        value: raw.to_string(),
        expected: "an integer",
    })
}

/// Parse a float field. `nan` and `inf` parse as `f64` but are rejected.
pub(crate) fn parse_finite(raw: &str, column: &'static str, line: usize) -> Result<f64> {
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(CoverageError::Parse {
            line,
            column,
            value: raw.to_string(),
            expected: "a finite number",
        }),
    }
}
