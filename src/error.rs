//! Load error taxonomy for the viewer engine.
//!
//! Two user-facing failure classes: the source could not be read, or no
//! candidate encoding could decode it. Cancellation is a normal
//! termination path and deliberately has no variant here — it is reported
//! through `LoadState`, never as an error.

use std::fmt;
use std::path::{Path, PathBuf};

/// Error that terminates a load session.
///
/// Clonable so it can be carried inside `LoadState::Failed` after being
/// sent across the ingestion channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// The byte source could not be opened or read.
    Io {
        /// Path of the source, when it has one.
        path: Option<PathBuf>,
        message: String,
    },

    /// No candidate encoding accepted the input.
    ///
    /// The trial list ends in windows-1252, which decodes any byte
    /// sequence, so hitting this is an invariant violation rather than an
    /// ordinary bad-input condition.
    Decode { detail: String },
}

impl LoadError {
    /// Build an `Io` error from a path and the underlying I/O error.
    pub fn io(path: &Path, source: &std::io::Error) -> Self {
        LoadError::Io {
            path: Some(path.to_path_buf()),
            message: source.to_string(),
        }
    }

    /// Build an `Io` error for a source without a path (pipes, memory).
    pub fn io_unnamed(source: &std::io::Error) -> Self {
        LoadError::Io {
            path: None,
            message: source.to_string(),
        }
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Io {
                path: Some(path),
                message,
            } => {
                write!(f, "cannot read {}: {}", path.display(), message)
            }
            LoadError::Io {
                path: None,
                message,
            } => {
                write!(f, "cannot read source: {}", message)
            }
            LoadError::Decode { detail } => {
                write!(f, "decode failure (encoding trial exhausted): {}", detail)
            }
        }
    }
}

impl std::error::Error for LoadError {}
