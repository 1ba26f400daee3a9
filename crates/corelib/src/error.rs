//! Errors produced while importing a mesh and its skin.
//!
//! Nothing here is recovered from: every variant aborts construction of the
//! loader and is handed back to the caller as-is.

use std::{fmt, io, path::PathBuf};

use thiserror::Error;

/// Which per-corner index a face refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IndexKind {
    Vertex,
    Normal,
    TexCoord,
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            IndexKind::Vertex => "vertex",
            IndexKind::Normal => "normal",
            IndexKind::TexCoord => "texture coordinate",
        })
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Invalid color selection: {color} (expected 0..=6)")]
    InvalidArgument { color: i64 },

    #[error("Failed to parse {what} on line {line}: '{token}'")]
    Parse {
        line: usize,
        what: &'static str,
        token: String,
    },

    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to decode image {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    #[error("Face {face} corner {corner}: {kind} index {index} out of range (len={len})")]
    IndexOutOfRange {
        face: usize,
        corner: usize,
        kind: IndexKind,
        index: u32,
        len: usize,
    },

    #[error("Unrecognized record tag '{tag}' on line {line}")]
    UnknownTag { line: usize, tag: String },

    #[error("Backend error: {0}")]
    Backend(String),
}

impl LoadError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        LoadError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn decode(
        path: impl Into<PathBuf>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
    ) -> Self {
        LoadError::Decode {
            path: path.into(),
            source: source.into(),
        }
    }
}

pub type LoadResult<T> = Result<T, LoadError>;
