//! Core types for rekorder
//!
//! This crate defines the on-disk layout shared by the log writer and reader:
//! - FileHeader: fixed 48-byte header at offset 0
//! - ContainerHeader: 12-byte header in front of every compressed block
//! - DaqRecord: the uncompressed record framing inside a container
//! - FormatError: every way a byte sequence can fail to decode
//!
//! The layout is byte-packed and little-endian throughout. Nothing here
//! performs I/O.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod format;

pub use error::FormatError;
pub use format::{
    decode_record, encode_record, log_path, ContainerHeader, DaqRecord, FileHeader,
    CATEGORY_DAQ, CONTAINER_HEADER_SIZE, FILE_EXTENSION, FILE_HEADER_SIZE, FILLER_BYTE,
    FORMAT_VERSION, KNOWN_OPTIONS, MAGIC, OPTION_ZSTD, RECORD_HEADER_SIZE,
};
