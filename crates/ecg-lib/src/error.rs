//! Error types for file-level and computation-level failures.
//!
//! Row-level problems (malformed lines, non-numeric cells, out-of-range
//! voltages) never surface here; they are recovered and reported through
//! [`crate::diagnostics::Diagnostics`].

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EcgError {
    #[error("cannot read input file {path}: {source}")]
    FileAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("degenerate input: {0}")]
    DegenerateInput(String),

    #[error("detector returned index {index} for a series of {len} samples")]
    DetectorIndex { index: usize, len: usize },

    #[error("cannot write output file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("configuration error in {path}: {reason}")]
    Config { path: PathBuf, reason: String },
}

pub type Result<T> = std::result::Result<T, EcgError>;
