//! Error types for analysis runs
//!
//! Every error here is `Clone` so that one failed run can be handed to every
//! caller that was waiting on it.

use thiserror::Error;

/// Failures reported by an external semantic analyzer.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SemanticError {
    /// The analyzer cannot be used at all (e.g. missing credentials)
    #[error("semantic analyzer unavailable: {0}")]
    Unavailable(String),
    /// The request was sent but failed (transport error, timeout, non-2xx status)
    #[error("semantic analyzer request failed: {0}")]
    Request(String),
    /// The analyzer answered with something that is not a valid verdict
    #[error("malformed semantic analyzer response: {0}")]
    Malformed(String),
}

/// Fatal failures of one analysis run.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("file discovery failed: {0}")]
    Discovery(String),

    #[error("no source files found under {root}; check the path and ignore patterns")]
    EmptyGraph { root: String },

    #[error(transparent)]
    Semantic(#[from] SemanticError),

    #[error("analysis worker panicked: {0}")]
    Worker(String),
}

pub type AnalysisResult<T> = std::result::Result<T, AnalysisError>;
