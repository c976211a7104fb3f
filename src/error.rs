use std::path::PathBuf;

use thiserror::Error;

/// Failures while resolving, reading or validating a dataset folder.
///
/// All of these are recovered at the session's load boundary; none of them
/// leaves a partially published dataset behind.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("please enter a folder path")]
    EmptyPath,
    #[error("no file ending with `{suffix}` in {}", dir.display())]
    NotFound { dir: PathBuf, suffix: String },
    #[error(
        "number of components in the {what} ({table}) does not match the 4th dimension of the volume ({volume})"
    )]
    ShapeMismatch {
        what: &'static str,
        table: usize,
        volume: usize,
    },
    #[error("component id {id} is not a valid volume index (volume has {n_comps} components)")]
    IdOutsideVolume { id: i64, n_comps: usize },
    #[error("{}: {reason}", path.display())]
    MalformedDocument { path: PathBuf, reason: String },
    #[error("failed to parse {}: {reason}", path.display())]
    Parse { path: PathBuf, reason: String },
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl LoadError {
    pub fn parse(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// A failed artifact computation. Shown in the affected panel only and
/// never stored in the artifact cache.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RenderError {
    #[error("component index {index} is out of bounds for the volume ({n_frames} frames)")]
    FrameOutOfBounds { index: usize, n_frames: usize },
    #[error("mixing table has no column `{0}`")]
    MissingColumn(String),
    #[error("column `{column}` row {row}: `{value}` is not a number")]
    BadSample {
        column: String,
        row: usize,
        value: String,
    },
    #[error("{0}")]
    Other(String),
}

/// A selection that does not name a component of the loaded dataset.
/// Callers clamp this to "no selection"; it is never shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("component {id} is not part of the loaded dataset")]
pub struct OutOfRange {
    pub id: i64,
}
