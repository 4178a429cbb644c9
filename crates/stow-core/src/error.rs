use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StowError {
    #[error("cannot open {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("string length {len} exceeds limit of {max} bytes")]
    StringTooLong { len: usize, max: usize },

    #[error("unknown record tag: {tag}")]
    UnknownTag { tag: u8 },

    #[error("truncated stream while reading {field}")]
    Truncated { field: &'static str },

    #[error("{field} is not valid UTF-8")]
    InvalidText { field: &'static str },

    #[error("reached end of input without end-of-object marker")]
    MissingSentinel,

    #[error("array of {count} elements does not fit a count word")]
    CountOverflow { count: usize },

    #[error("object nesting exceeds maximum depth of {max}")]
    DepthExceeded { max: usize },

    #[error("short write: flushed {written} of {expected} bytes")]
    ShortWrite { expected: usize, written: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StowError {
    /// True when the error is an open failure caused by a missing file.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::Open { source, .. } if source.kind() == std::io::ErrorKind::NotFound
        )
    }

    /// True for errors caused by malformed input rather than the environment.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            Self::StringTooLong { .. }
                | Self::UnknownTag { .. }
                | Self::Truncated { .. }
                | Self::InvalidText { .. }
                | Self::MissingSentinel
                | Self::DepthExceeded { .. }
        )
    }
}

pub type StowResult<T> = Result<T, StowError>;
