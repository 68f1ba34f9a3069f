//! Crate-level error types.
//!
//! The parse pipeline itself fails only with [`ParseError`]; this wrapper
//! adds file-level context for the path-based entry points and the CLI.

use crate::parsers::ParseError;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors surfaced by file-level operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum SbomError {
    #[error("failed to parse {path}")]
    Parse {
        path: String,
        #[source]
        source: ParseError,
    },

    #[error("IO error at {}: {message}", path.display())]
    Io {
        path: PathBuf,
        message: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is {size} bytes, exceeding the {limit} byte limit", path.display())]
    FileTooLarge { path: PathBuf, size: u64, limit: u64 },
}

impl SbomError {
    /// Wrap an IO error with its path context.
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            message: source.to_string(),
            source,
        }
    }

    /// The parse classification, when this error wraps a parse failure.
    pub fn parse_kind(&self) -> Option<crate::parsers::ErrorKind> {
        match self {
            Self::Parse { source, .. } => Some(source.kind()),
            _ => None,
        }
    }
}

/// Convenient Result alias for file-level operations.
pub type Result<T> = std::result::Result<T, SbomError>;
