//! Error types for loadgap-core

use crate::fields::CanonicalField;
use crate::gaps::IdentifierFailure;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in loadgap-core
#[derive(Debug, Error)]
pub enum Error {
    /// Failed to read a file
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File bytes are not valid for the configured encoding
    #[error("failed to decode '{path}' as {encoding}")]
    Decode {
        path: PathBuf,
        encoding: &'static str,
    },

    /// Malformed load file (bad quoting, missing header)
    #[error("failed to parse load file '{path}': {message}")]
    Parse { path: PathBuf, message: String },

    /// Encoding label not recognized by encoding_rs
    #[error("unknown encoding label '{0}'")]
    UnknownEncoding(String),

    /// A field required for gap detection matched no column
    #[error("required field '{field}' did not match any column")]
    MissingRequiredField { field: CanonicalField },

    /// One or more rows had Bates values with no digit run
    #[error("could not derive numeric document identifiers for {} row(s)", .failures.len())]
    UnparseableIdentifiers { failures: Vec<IdentifierFailure> },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV output error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
