//! Writer configuration.

use std::path::Path;

use rekorder_codec::{BlockCodec, Compression, CompressionLevel};
use rekorder_storage::FlushPolicy;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::writer::LogWriter;

/// Default initial file size.
pub const DEFAULT_PREALLOCATION_SIZE: u64 = 256 * 1024;

/// Default uncompressed bytes per container.
pub const DEFAULT_CHUNK_THRESHOLD: usize = 1024 * 1024;

/// Options accepted by [`LogWriter::create`].
///
/// Every field has a default, so partial JSON/TOML documents deserialize:
///
/// ```
/// let opts: rekorder::WriterOptions =
///     serde_json::from_str(r#"{ "chunk_threshold": 65536 }"#).unwrap();
/// assert_eq!(opts.chunk_threshold, 65536);
/// assert_eq!(opts.compression_level.get(), 9);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriterOptions {
    /// Initial file size in bytes, allocated sparsely
    pub preallocation_size: u64,
    /// Staged uncompressed bytes that trigger a container
    pub chunk_threshold: usize,
    /// Compression level, 1..=9
    pub compression_level: CompressionLevel,
    /// Container compression algorithm
    pub compression: Compression,
    /// When container bytes are synced
    pub flush_policy: FlushPolicy,
}

impl WriterOptions {
    /// Start a builder from the defaults.
    pub fn builder() -> WriterOptionsBuilder {
        WriterOptionsBuilder::new()
    }

    /// Reject zero sizes and thresholds that cannot fit a container.
    pub fn validate(&self) -> Result<()> {
        if self.preallocation_size == 0 {
            return Err(Error::InvalidConfig(
                "preallocation_size must be greater than zero".into(),
            ));
        }
        if self.chunk_threshold == 0 {
            return Err(Error::InvalidConfig(
                "chunk_threshold must be greater than zero".into(),
            ));
        }
        if self.chunk_threshold as u64 > u32::MAX as u64 {
            return Err(Error::InvalidConfig(format!(
                "chunk_threshold {} exceeds the 32-bit container size limit",
                self.chunk_threshold
            )));
        }
        Ok(())
    }

    /// Codec for containers written with these options.
    pub fn codec(&self) -> BlockCodec {
        BlockCodec::new(self.compression, self.compression_level)
    }
}

impl Default for WriterOptions {
    fn default() -> Self {
        WriterOptions {
            preallocation_size: DEFAULT_PREALLOCATION_SIZE,
            chunk_threshold: DEFAULT_CHUNK_THRESHOLD,
            compression_level: CompressionLevel::default(),
            compression: Compression::default(),
            flush_policy: FlushPolicy::default(),
        }
    }
}

/// Builder for [`WriterOptions`].
///
/// # Example
///
/// ```no_run
/// use rekorder::WriterOptions;
///
/// // Small containers, synced only on close
/// let writer = WriterOptions::builder()
///     .chunk_threshold(64 * 1024)
///     .compression_level(4)
///     .flush_on_close()
///     .create("session.xmraw")?;
/// # Ok::<(), rekorder::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct WriterOptionsBuilder {
    opts: WriterOptions,
    level: u8,
}

impl WriterOptionsBuilder {
    /// Create a builder with default settings.
    pub fn new() -> Self {
        let opts = WriterOptions::default();
        let level = opts.compression_level.get();
        WriterOptionsBuilder { opts, level }
    }

    /// Set the initial file size.
    pub fn preallocation_size(mut self, bytes: u64) -> Self {
        self.opts.preallocation_size = bytes;
        self
    }

    /// Set the container threshold.
    pub fn chunk_threshold(mut self, bytes: usize) -> Self {
        self.opts.chunk_threshold = bytes;
        self
    }

    /// Set the compression level. Checked by [`build`](Self::build).
    pub fn compression_level(mut self, level: u8) -> Self {
        self.level = level;
        self
    }

    /// Set the compression algorithm.
    pub fn compression(mut self, compression: Compression) -> Self {
        self.opts.compression = compression;
        self
    }

    /// Write zstd containers.
    pub fn zstd(self) -> Self {
        self.compression(Compression::Zstd)
    }

    /// Set the flush policy.
    pub fn flush_policy(mut self, policy: FlushPolicy) -> Self {
        self.opts.flush_policy = policy;
        self
    }

    /// Sync only when the writer is closed.
    pub fn flush_on_close(self) -> Self {
        self.flush_policy(FlushPolicy::OnClose)
    }

    /// Validate and return the options.
    pub fn build(self) -> Result<WriterOptions> {
        let mut opts = self.opts;
        opts.compression_level = CompressionLevel::new(self.level)?;
        opts.validate()?;
        Ok(opts)
    }

    /// Build the options and create a writer at `path`.
    pub fn create(self, path: impl AsRef<Path>) -> Result<LogWriter> {
        LogWriter::create(path, self.build()?)
    }
}

impl Default for WriterOptionsBuilder {
    fn default() -> Self {
        Self::new()
    }
}
