//! Convenient imports for rekorder.
//!
//! ```no_run
//! use rekorder::prelude::*;
//!
//! let reader = LogReader::open("session.xmraw")?;
//! let count = reader.records().count();
//! # Ok::<(), rekorder::Error>(())
//! ```

// Entry points
pub use crate::reader::LogReader;
pub use crate::writer::LogWriter;

// Configuration
pub use crate::options::WriterOptions;
pub use rekorder_codec::Compression;
pub use rekorder_storage::FlushPolicy;

// Error handling
pub use crate::error::{Error, Result};

// Records
pub use rekorder_core::{log_path, DaqRecord};
