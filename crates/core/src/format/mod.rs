//! On-disk byte formats for log files.
//!
//! ```text
//! +-------------------+  offset 0
//! | FileHeader (48)   |
//! +-------------------+  offset 48
//! | ContainerHeader   |  record_count, size_compressed, size_uncompressed
//! | payload           |  size_compressed bytes
//! +-------------------+
//! | ContainerHeader   |
//! | payload           |
//! +-------------------+
//! | ...               |  num_containers times
//! ```
//!
//! Inside a decompressed container payload, records follow each other with
//! no padding:
//!
//! ```text
//! | category u8 | counter u16 | timestamp f64 | length u32 | payload |
//! ```
//!
//! All multi-byte integers are little-endian.

mod container;
mod header;
mod record;

use std::path::{Path, PathBuf};

pub use container::ContainerHeader;
pub use header::FileHeader;
pub use record::{decode_record, encode_record, DaqRecord};

/// Magic bytes at the start of every log file.
pub const MAGIC: [u8; 16] = *b"ASAMINT::XCP_RAW";

/// Size of the file header in bytes.
pub const FILE_HEADER_SIZE: usize = 48;

/// Size of a container header in bytes.
pub const CONTAINER_HEADER_SIZE: usize = 12;

/// Size of the fixed part of a record (category, counter, timestamp, length).
pub const RECORD_HEADER_SIZE: usize = 1 + 2 + 8 + 4;

/// Current format version.
pub const FORMAT_VERSION: u16 = 0x0100;

/// Value of unused header bytes.
pub const FILLER_BYTE: u8 = 0xCC;

pub(crate) const FILLER_LEN: usize = 10;

/// Option flag: container payloads are zstd frames instead of LZ4 blocks.
pub const OPTION_ZSTD: u16 = 0x0001;

/// Every option bit this implementation understands.
pub const KNOWN_OPTIONS: u16 = OPTION_ZSTD;

/// Record category for DAQ samples.
pub const CATEGORY_DAQ: u8 = 1;

/// Conventional log file extension (advisory; files are identified by magic).
pub const FILE_EXTENSION: &str = "xmraw";

/// Append the conventional extension to `stem`.
///
/// `log_path("run/session1")` yields `run/session1.xmraw`.
pub fn log_path(stem: impl AsRef<Path>) -> PathBuf {
    let stem = stem.as_ref();
    let mut name = stem.as_os_str().to_os_string();
    name.push(".");
    name.push(FILE_EXTENSION);
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_sizes() {
        assert_eq!(MAGIC.len() + 2 + 2 + 2 + 4 * 4 + FILLER_LEN, FILE_HEADER_SIZE);
        assert_eq!(RECORD_HEADER_SIZE, 15);
    }

    #[test]
    fn test_log_path_appends_extension() {
        assert_eq!(
            log_path("run/session1"),
            PathBuf::from("run/session1.xmraw")
        );
        // Existing dots are kept; the extension is appended, not substituted.
        assert_eq!(log_path("a.b"), PathBuf::from("a.b.xmraw"));
    }
}
