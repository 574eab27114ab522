//! Unified error type for rekorder.
//!
//! Wraps storage I/O failures and format errors from the lower crates and
//! adds the writer's usage errors, so callers match on one enum.

use rekorder_codec::InvalidLevel;
use rekorder_core::FormatError;
use thiserror::Error;

/// All rekorder errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Storage failure (open, map, grow, flush, truncate)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file violates the log format
    #[error("format error: {0}")]
    Format(#[from] FormatError),

    /// Operation on a writer that has already been closed
    #[error("log writer is closed")]
    Closed,

    /// Writer options rejected at construction
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A 32-bit header total would overflow
    #[error("capacity exceeded: {0}")]
    CapacityExceeded(String),
}

/// Result type for rekorder operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check if this is a storage I/O error.
    pub fn is_io(&self) -> bool {
        matches!(self, Error::Io(_))
    }

    /// Check if this is a format error.
    pub fn is_format(&self) -> bool {
        matches!(self, Error::Format(_))
    }

    /// Check if this is a caller mistake (closed writer, bad options).
    pub fn is_usage(&self) -> bool {
        matches!(self, Error::Closed | Error::InvalidConfig(_))
    }

    /// The format error, if this is one.
    pub fn as_format(&self) -> Option<&FormatError> {
        match self {
            Error::Format(e) => Some(e),
            _ => None,
        }
    }
}

impl From<InvalidLevel> for Error {
    fn from(e: InvalidLevel) -> Self {
        Error::InvalidConfig(e.to_string())
    }
}
