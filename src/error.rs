//! Error taxonomy for the diff engine.
//!
//! `ExecError` covers subprocess mechanics, `DiffError` layers repository
//! and revision lookup failures on top. Errors propagate to the caller
//! unmodified; nothing here retries or exits.

use thiserror::Error;

/// Failures of a single git subprocess invocation
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("failed to spawn git: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("git command timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("git exited with code {exit_code}: {stderr}")]
    CommandFailed { exit_code: i32, stderr: String },
}

/// Failures of diff generation and content resolution
#[derive(Debug, Error)]
pub enum DiffError {
    #[error(transparent)]
    Exec(#[from] ExecError),

    #[error("not a git repository: {0}")]
    NotARepository(String),

    #[error("invalid revision: {0}")]
    InvalidRevision(String),

    #[error("path not found in revision: {0}")]
    PathNotFound(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}
