// src/errors.rs

//! Crate-wide error type.
//!
//! Almost everything here is fatal to a run. The one exception is
//! [`RegenError::Vcs`], which the staleness decider turns into "assume the
//! output is stale" instead of propagating.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegenError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("IO error on {path:?}: {source}")]
    PathIo {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// A version-control query failed where an answer was expected.
    #[error("Indeterminate VCS state: {0}")]
    Vcs(String),

    /// The external generator exited with a non-zero status.
    #[error("Generating {path:?} failed (exit code {exit_code:?}): {stderr}")]
    Generation {
        path: PathBuf,
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("Template error at line {line}: {message}")]
    Template { line: usize, message: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RegenError {
    /// Attach the offending path to an I/O error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        RegenError::PathIo {
            path: path.into(),
            source,
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, RegenError>;
