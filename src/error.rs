use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum AnnofetchError {
    #[error("remote fetch failed: {0}")]
    Fetch(String),

    #[error("remote source returned status {status}: {message}")]
    FetchStatus { status: u16, message: String },

    #[error("filesystem error: {0}")]
    Filesystem(String),

    #[error("malformed {format} record at line {line}: {reason}")]
    Parse {
        format: &'static str,
        line: usize,
        reason: String,
    },

    #[error("term {term} not found in {ontology} ontology")]
    MissingTerm { term: String, ontology: String },

    #[error("invalid term rename pattern: {0}")]
    InvalidPattern(String),

    #[error("{0} not loaded")]
    NotLoaded(&'static str),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),
}

impl AnnofetchError {
    pub(crate) fn filesystem(err: impl std::fmt::Display) -> Self {
        AnnofetchError::Filesystem(err.to_string())
    }
}
