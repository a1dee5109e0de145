//! Error type shared by the evaluation library
//!
//! Every fallible library operation returns [`Result`]. The binary wraps these
//! in `anyhow` with file/step context before reporting them.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading data, fitting models or aggregating runs
#[derive(Error, Debug)]
pub enum EvalError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A test period lacks one class, so TPR or FPR is undefined
    #[error(
        "Degenerate test split in period {period}: {positives} malicious, {negatives} benign samples"
    )]
    DegenerateSplit {
        period: usize,
        positives: usize,
        negatives: usize,
    },

    #[error("Inconsistent period count: run {run} has {found} periods, expected {expected}")]
    InconsistentPeriodCount {
        run: usize,
        expected: usize,
        found: usize,
    },

    #[error("Inconsistent period dates: run {run} does not share the first run's start dates")]
    InconsistentPeriodDates { run: usize },

    #[error("Length mismatch for {what}: expected {expected}, got {found}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("{}:{line}: {message}", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("Classifier failed: {0}")]
    Classifier(String),

    #[error("Invalid result bundle: {0}")]
    InvalidBundle(String),

    #[error("Serialization failed: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for evaluation operations
pub type Result<T> = std::result::Result<T, EvalError>;

impl EvalError {
    pub(crate) fn parse(path: impl Into<PathBuf>, line: usize, message: impl Into<String>) -> Self {
        EvalError::Parse {
            path: path.into(),
            line,
            message: message.into(),
        }
    }
}
