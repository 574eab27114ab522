//! Log writer.
//!
//! Records are encoded into an in-memory staging buffer. Once the buffer
//! reaches the configured chunk threshold it is compressed and written as
//! one container, after which the file header is rewritten with the running
//! totals. Closing emits the remainder, writes the final header and trims
//! the file to the bytes actually used.
//!
//! ```text
//! Open ──append──▶ buffering ──threshold──▶ flushing-container ──▶ buffering
//!   │                  │
//!   └──────close───────┴──▶ Closed
//! ```

use std::path::{Path, PathBuf};

use rekorder_codec::BlockCodec;
use rekorder_core::{
    encode_record, ContainerHeader, DaqRecord, FileHeader, CATEGORY_DAQ, CONTAINER_HEADER_SIZE,
    FILE_HEADER_SIZE, RECORD_HEADER_SIZE,
};
use rekorder_storage::GrowableMmap;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::options::{WriterOptions, DEFAULT_CHUNK_THRESHOLD};

/// Largest uncompressed container the 32-bit size fields can describe.
const MAX_CONTAINER_BYTES: u64 = u32::MAX as u64;

/// Single-owner writer for one log file.
///
/// Not shareable between threads; move it to the thread that produces the
/// records. Dropping an open writer closes it and logs any failure; call
/// [`close`](Self::close) to observe the result.
///
/// # Example
///
/// ```no_run
/// use rekorder::{LogWriter, WriterOptions};
///
/// let mut writer = LogWriter::create("run.xmraw", WriterOptions::default())?;
/// writer.append_frame(100, 0.0, b"AB")?;
/// writer.append_frame(101, 0.01, b"")?;
/// writer.close()?;
/// # Ok::<(), rekorder::Error>(())
/// ```
pub struct LogWriter {
    path: PathBuf,
    /// `None` once closed
    storage: Option<GrowableMmap>,
    codec: BlockCodec,
    options: WriterOptions,
    header: FileHeader,
    staging: Vec<u8>,
    pending_records: u32,
    /// End of the last complete container
    offset: u64,
}

impl LogWriter {
    /// Create (or truncate) a log at `path`.
    ///
    /// The provisional header is written immediately, so even a writer that
    /// never receives a record leaves a readable file behind.
    pub fn create(path: impl AsRef<Path>, options: WriterOptions) -> Result<Self> {
        options.validate()?;

        let path = path.as_ref().to_path_buf();
        let mut storage = GrowableMmap::create(&path, options.preallocation_size)?;
        let header = FileHeader::new(options.compression.option_flags());
        storage.write_at(0, &header.encode())?;

        info!(
            path = %path.display(),
            compression = ?options.compression,
            level = options.compression_level.get(),
            chunk_threshold = options.chunk_threshold,
            "created log"
        );

        Ok(LogWriter {
            path,
            storage: Some(storage),
            codec: options.codec(),
            staging: Vec::with_capacity(options.chunk_threshold.min(DEFAULT_CHUNK_THRESHOLD)),
            options,
            header,
            pending_records: 0,
            offset: FILE_HEADER_SIZE as u64,
        })
    }

    /// Append one record.
    ///
    /// Does no I/O unless the staging buffer reaches the chunk threshold.
    /// On error the record is not staged, so retrying it cannot duplicate
    /// it; records appended earlier stay pending.
    pub fn append(&mut self, record: &DaqRecord) -> Result<()> {
        self.append_parts(record.category, record.counter, record.timestamp, &record.payload)
    }

    /// Append a DAQ-category record from its parts.
    pub fn append_frame(&mut self, counter: u16, timestamp: f64, payload: &[u8]) -> Result<()> {
        self.append_parts(CATEGORY_DAQ, counter, timestamp, payload)
    }

    /// Append a sequence of `(counter, timestamp, payload)` DAQ frames.
    ///
    /// Stops at the first failure; frames before it stay appended.
    pub fn append_frames<I, P>(&mut self, frames: I) -> Result<()>
    where
        I: IntoIterator<Item = (u16, f64, P)>,
        P: AsRef<[u8]>,
    {
        for (counter, timestamp, payload) in frames {
            self.append_frame(counter, timestamp, payload.as_ref())?;
        }
        Ok(())
    }

    /// Write pending records as a container and sync the whole mapping.
    pub fn flush(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.emit_container()?;
        if let Some(storage) = &self.storage {
            storage.flush()?;
        }
        Ok(())
    }

    /// Finish the file.
    ///
    /// Emits pending records, writes the final header, flushes and trims the
    /// file to its exact size. Calling it again is a no-op. The mapping is
    /// released even on failure, in which case the file ends after the last
    /// container that was completely written.
    pub fn close(&mut self) -> Result<()> {
        if self.storage.is_none() {
            return Ok(());
        }

        let emitted = self.emit_container();
        let Some(mut storage) = self.storage.take() else {
            return emitted;
        };

        let finished = emitted.and_then(|()| {
            storage
                .write_at(0, &self.header.encode())
                .map_err(Error::from)
        });
        let truncated = storage.truncate_to(self.offset);
        finished?;
        truncated?;

        info!(
            path = %self.path.display(),
            containers = self.header.num_containers,
            records = self.header.record_count,
            bytes = self.offset,
            "closed log"
        );
        Ok(())
    }

    /// Path of the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Header with the totals of all containers written so far.
    pub fn header(&self) -> &FileHeader {
        &self.header
    }

    /// Options the writer was created with.
    pub fn options(&self) -> &WriterOptions {
        &self.options
    }

    /// Records staged but not yet written.
    pub fn pending_records(&self) -> u32 {
        self.pending_records
    }

    /// File bytes used by the header and the containers written so far.
    pub fn bytes_written(&self) -> u64 {
        self.offset
    }

    /// Ratio of the containers written so far; `None` before the first.
    pub fn compression_ratio(&self) -> Option<f64> {
        self.header.compression_ratio()
    }

    /// Whether [`close`](Self::close) has run.
    pub fn is_closed(&self) -> bool {
        self.storage.is_none()
    }

    fn ensure_open(&self) -> Result<()> {
        if self.storage.is_none() {
            return Err(Error::Closed);
        }
        Ok(())
    }

    fn append_parts(
        &mut self,
        category: u8,
        counter: u16,
        timestamp: f64,
        payload: &[u8],
    ) -> Result<()> {
        self.ensure_open()?;

        let encoded = (RECORD_HEADER_SIZE + payload.len()) as u64;
        if encoded > MAX_CONTAINER_BYTES {
            return Err(Error::CapacityExceeded(format!(
                "record of {} bytes exceeds the container size limit",
                encoded
            )));
        }
        if self.staging.len() as u64 + encoded > MAX_CONTAINER_BYTES
            || self.pending_records == u32::MAX
        {
            self.emit_container()?;
        }

        let staged = self.staging.len();
        encode_record(&mut self.staging, category, counter, timestamp, payload)?;
        self.pending_records += 1;

        if self.staging.len() >= self.options.chunk_threshold {
            if let Err(e) = self.emit_container() {
                // The record is only accepted if its container was written.
                self.staging.truncate(staged);
                self.pending_records -= 1;
                return Err(e);
            }
        }
        Ok(())
    }

    /// Compress the staging buffer and write it as the next container.
    ///
    /// Nothing is written if the totals would overflow. The header is
    /// rewritten only after the container bytes are in place.
    fn emit_container(&mut self) -> Result<()> {
        if self.pending_records == 0 {
            return Ok(());
        }
        let storage = self.storage.as_mut().ok_or(Error::Closed)?;

        let block = self.codec.compress(&self.staging)?;
        let container = ContainerHeader {
            record_count: self.pending_records,
            size_compressed: block.compressed_len() as u32,
            size_uncompressed: self.staging.len() as u32,
        };
        let totals = self.header.checked_add_container(&container).ok_or_else(|| {
            Error::CapacityExceeded(format!(
                "adding {} records ({} bytes) overflows the header totals",
                container.record_count, container.size_uncompressed
            ))
        })?;

        let at = self.offset;
        storage.write_at(at, &container.encode())?;
        storage.write_at(at + CONTAINER_HEADER_SIZE as u64, block.bytes())?;
        let len = container.disk_len();
        let sync = self.options.flush_policy.syncs_every_container();
        if sync {
            storage.flush_range(at, len as usize)?;
        }

        storage.write_at(0, &totals.encode())?;
        if sync {
            storage.flush_range(0, FILE_HEADER_SIZE)?;
        }

        debug!(
            index = self.header.num_containers,
            offset = at,
            records = container.record_count,
            compressed = container.size_compressed,
            uncompressed = container.size_uncompressed,
            stored = container.is_stored(),
            "wrote container"
        );

        self.header = totals;
        self.offset = at + len;
        self.staging.clear();
        self.pending_records = 0;
        Ok(())
    }
}

impl Drop for LogWriter {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!(path = %self.path.display(), error = %e, "failed to close log on drop");
        }
    }
}

impl std::fmt::Debug for LogWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogWriter")
            .field("path", &self.path)
            .field("header", &self.header)
            .field("pending_records", &self.pending_records)
            .field("closed", &self.is_closed())
            .finish()
    }
}
