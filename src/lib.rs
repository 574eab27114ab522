//! # rekorder
//!
//! Compressed, memory-mapped container log for DAQ measurement records.
//!
//! A log file is a 48-byte header followed by containers, each one a block
//! of records compressed together. Records are timestamped, categorized
//! samples with an opaque payload.
//!
//! ## Quick Start
//!
//! ```no_run
//! use rekorder::prelude::*;
//!
//! // Record
//! let mut writer = LogWriter::create(log_path("session"), WriterOptions::default())?;
//! writer.append(&DaqRecord::daq(100, 0.0, b"AB".to_vec()))?;
//! writer.append_frame(101, 0.01, b"")?;
//! writer.close()?;
//!
//! // Replay
//! let reader = LogReader::open(log_path("session"))?;
//! for record in reader.records() {
//!     let record = record?;
//!     println!("{} @ {}", record.counter, record.timestamp);
//! }
//! println!("ratio: {:?}", reader.compression_ratio());
//! # Ok::<(), rekorder::Error>(())
//! ```
//!
//! ## Crates
//!
//! - `rekorder-core` - binary layout and [`FormatError`]
//! - `rekorder-codec` - per-container block compression
//! - `rekorder-storage` - growable and read-only memory mappings

#![warn(missing_docs)]

mod error;
mod options;
mod reader;
mod writer;

pub mod prelude;

// Re-export main entry points
pub use error::{Error, Result};
pub use options::{
    WriterOptions, WriterOptionsBuilder, DEFAULT_CHUNK_THRESHOLD, DEFAULT_PREALLOCATION_SIZE,
};
pub use reader::{ContainerInfo, Containers, LogReader, LogSummary, Records};
pub use writer::LogWriter;

// Re-export lower-level types
pub use rekorder_codec::{BlockCodec, Compression, CompressionLevel};
pub use rekorder_core::{
    log_path, ContainerHeader, DaqRecord, FileHeader, FormatError, CATEGORY_DAQ, FILE_EXTENSION,
};
pub use rekorder_storage::FlushPolicy;
