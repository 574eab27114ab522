//! Format errors.
//!
//! Every decoding failure in the log format is a [`FormatError`]. They are
//! detected at decode time and never recovered from: once a container is
//! malformed, position tracking past it cannot be trusted.

use thiserror::Error;

/// Errors raised while decoding a log file.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// The file does not start with the format magic.
    #[error("invalid file magic: {found:02x?}")]
    BadMagic {
        /// Leading bytes actually found (at most the magic length)
        found: Vec<u8>,
    },

    /// The header declares a size other than the fixed header size.
    #[error("header size mismatch: expected {expected}, found {found}")]
    HeaderSize {
        /// Fixed header size
        expected: u16,
        /// Size stored in the file
        found: u16,
    },

    /// The header carries a version this implementation does not read.
    #[error("unsupported format version {found:#06x} (expected {expected:#06x})")]
    UnsupportedVersion {
        /// Supported version
        expected: u16,
        /// Version stored in the file
        found: u16,
    },

    /// The header sets option bits this implementation does not understand.
    #[error("unsupported option flags {0:#06x}")]
    UnsupportedOptions(u16),

    /// Fewer bytes remain than a structure or field requires.
    #[error("truncated {what} at offset {offset}: need {needed} bytes, {available} available")]
    Truncated {
        /// What was being decoded
        what: &'static str,
        /// Offset of the structure within its buffer
        offset: u64,
        /// Bytes required
        needed: u64,
        /// Bytes actually available
        available: u64,
    },

    /// A record's declared payload length runs past the end of the buffer.
    #[error("payload of {declared} bytes at offset {offset} overruns buffer ({available} bytes left)")]
    PayloadOverrun {
        /// Offset of the payload within the buffer
        offset: u64,
        /// Declared payload length
        declared: u32,
        /// Bytes left in the buffer
        available: u64,
    },

    /// A payload is too long for the 32-bit record length field.
    #[error("record payload of {len} bytes does not fit the 32-bit length field")]
    PayloadTooLarge {
        /// Payload length
        len: u64,
    },

    /// The compressed block could not be decoded.
    #[error("decompression failed: {0}")]
    Decompress(String),

    /// Decompression yielded a different number of bytes than declared.
    #[error("decompressed size mismatch: expected {expected}, got {actual}")]
    SizeMismatch {
        /// Declared uncompressed size
        expected: u32,
        /// Bytes produced
        actual: u64,
    },

    /// Bytes left over after the declared number of records was parsed.
    #[error("{trailing} trailing bytes after {records} records")]
    TrailingBytes {
        /// Records parsed
        records: u32,
        /// Unconsumed bytes
        trailing: u64,
    },

    /// Header totals disagree with the containers actually present.
    #[error("header totals disagree with containers: {0}")]
    TotalsMismatch(String),

    /// A failure inside a specific container.
    #[error("container {index}: {source}")]
    Container {
        /// Zero-based container index
        index: u32,
        /// Underlying failure
        #[source]
        source: Box<FormatError>,
    },
}

impl FormatError {
    /// Attach the index of the container in which this error occurred.
    pub fn in_container(self, index: u32) -> Self {
        FormatError::Container {
            index,
            source: Box::new(self),
        }
    }

    /// Strip any container context and return the underlying error.
    pub fn root_cause(&self) -> &FormatError {
        match self {
            FormatError::Container { source, .. } => source.root_cause(),
            other => other,
        }
    }

    pub(crate) fn truncated(what: &'static str, offset: usize, needed: usize, available: usize) -> Self {
        FormatError::Truncated {
            what,
            offset: offset as u64,
            needed: needed as u64,
            available: available as u64,
        }
    }
}
