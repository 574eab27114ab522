//! Log reader.
//!
//! The file is mapped read-only and the header validated on open. Containers
//! and records are then produced lazily: only one decompressed container is
//! held in memory at a time, and the reader never looks past the
//! `num_containers` the header declares.

use std::iter::FusedIterator;
use std::path::Path;

use rekorder_codec::BlockCodec;
use rekorder_core::{
    decode_record, ContainerHeader, DaqRecord, FileHeader, FormatError, CONTAINER_HEADER_SIZE,
    FILE_HEADER_SIZE,
};
use rekorder_storage::MappedFile;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Read-only view of a finished log.
///
/// # Example
///
/// ```no_run
/// use rekorder::LogReader;
///
/// let reader = LogReader::open("run.xmraw")?;
/// for record in reader.records() {
///     let record = record?;
///     println!("{} {:.3} {} bytes", record.counter, record.timestamp, record.payload.len());
/// }
/// # Ok::<(), rekorder::Error>(())
/// ```
#[derive(Debug)]
pub struct LogReader {
    file: MappedFile,
    header: FileHeader,
    codec: BlockCodec,
}

/// Location and sizes of one container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ContainerInfo {
    /// Zero-based position in the file
    pub index: u32,
    /// File offset of the container header
    pub offset: u64,
    /// Records in the container
    pub record_count: u32,
    /// Payload bytes on disk
    pub size_compressed: u32,
    /// Payload bytes after decompression
    pub size_uncompressed: u32,
}

impl ContainerInfo {
    /// File offset of the payload.
    pub fn payload_offset(&self) -> u64 {
        self.offset + CONTAINER_HEADER_SIZE as u64
    }

    /// Whether the payload is stored uncompressed.
    pub fn is_stored(&self) -> bool {
        self.size_compressed == self.size_uncompressed
    }
}

/// Totals gathered by [`LogReader::verify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct LogSummary {
    /// Containers read
    pub containers: u32,
    /// Records decoded
    pub records: u64,
    /// Sum of container payload bytes on disk
    pub size_compressed: u64,
    /// Sum of decompressed payload bytes
    pub size_uncompressed: u64,
    /// Containers stored without compression
    pub stored_containers: u32,
    /// File bytes after the last container
    pub trailing_bytes: u64,
}

impl LogSummary {
    /// Uncompressed over compressed bytes; `None` if nothing was compressed.
    pub fn compression_ratio(&self) -> Option<f64> {
        if self.size_compressed == 0 {
            None
        } else {
            Some(self.size_uncompressed as f64 / self.size_compressed as f64)
        }
    }
}

impl LogReader {
    /// Open and validate the log at `path`.
    ///
    /// A missing or unreadable file is an I/O error; a file that does not
    /// start with a valid header (including an empty file) is a format
    /// error.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = MappedFile::open(path)?;
        let header = FileHeader::decode(file.as_slice())?;
        let codec = BlockCodec::from_options(header.options);

        info!(
            path = %file.path().display(),
            containers = header.num_containers,
            records = header.record_count,
            compression = ?codec.compression(),
            "opened log"
        );

        Ok(LogReader {
            file,
            header,
            codec,
        })
    }

    /// The validated file header.
    pub fn header(&self) -> &FileHeader {
        &self.header
    }

    /// Path of the log file.
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// File length in bytes.
    pub fn file_len(&self) -> u64 {
        self.file.len()
    }

    /// Header ratio of uncompressed to compressed bytes.
    ///
    /// `None` when the header records no compressed bytes.
    pub fn compression_ratio(&self) -> Option<f64> {
        self.header.compression_ratio()
    }

    /// Iterate over container headers without decompressing.
    ///
    /// Each call starts again from the first container.
    pub fn containers(&self) -> Containers<'_> {
        Containers {
            data: self.file.as_slice(),
            num_containers: self.header.num_containers,
            index: 0,
            offset: FILE_HEADER_SIZE as u64,
            failed: false,
        }
    }

    /// Iterate over all records in file order.
    ///
    /// Each call starts again from the first record.
    pub fn records(&self) -> Records<'_> {
        Records {
            containers: self.containers(),
            codec: self.codec,
            current: None,
            failed: false,
        }
    }

    /// Decode every container and record and check the header totals.
    pub fn verify(&self) -> Result<LogSummary> {
        let mut summary = LogSummary::default();
        let mut end = FILE_HEADER_SIZE as u64;

        for info in self.containers() {
            let info = info?;
            summary.containers += 1;
            summary.size_compressed += info.size_compressed as u64;
            summary.size_uncompressed += info.size_uncompressed as u64;
            if info.is_stored() {
                summary.stored_containers += 1;
            }
            end = info.payload_offset() + info.size_compressed as u64;
        }

        for record in self.records() {
            record?;
            summary.records += 1;
        }
        summary.trailing_bytes = self.file_len().saturating_sub(end);

        let header = &self.header;
        let mismatch = if summary.records != header.record_count as u64 {
            Some(format!(
                "header counts {} records, containers hold {}",
                header.record_count, summary.records
            ))
        } else if summary.size_compressed != header.size_compressed as u64 {
            Some(format!(
                "header counts {} compressed bytes, containers hold {}",
                header.size_compressed, summary.size_compressed
            ))
        } else if summary.size_uncompressed != header.size_uncompressed as u64 {
            Some(format!(
                "header counts {} uncompressed bytes, containers hold {}",
                header.size_uncompressed, summary.size_uncompressed
            ))
        } else {
            None
        };

        if let Some(msg) = mismatch {
            return Err(FormatError::TotalsMismatch(msg).into());
        }

        debug!(
            path = %self.path().display(),
            containers = summary.containers,
            records = summary.records,
            "verified log"
        );
        Ok(summary)
    }
}

// =============================================================================
// Containers
// =============================================================================

/// Iterator over the containers of a log, see [`LogReader::containers`].
///
/// Yields exactly `num_containers` items, or stops after the first error.
#[derive(Debug, Clone)]
pub struct Containers<'a> {
    data: &'a [u8],
    num_containers: u32,
    index: u32,
    offset: u64,
    failed: bool,
}

impl<'a> Containers<'a> {
    fn next_with_payload(&mut self) -> Option<Result<(ContainerInfo, &'a [u8])>> {
        if self.failed || self.index >= self.num_containers {
            return None;
        }

        match self.read_container() {
            Ok(item) => Some(Ok(item)),
            Err(e) => {
                self.failed = true;
                Some(Err(e.in_container(self.index).into()))
            }
        }
    }

    fn read_container(&mut self) -> std::result::Result<(ContainerInfo, &'a [u8]), FormatError> {
        let data = self.data;
        let start = self.offset as usize;
        let rest = data.get(start..).unwrap_or(&[]);

        if rest.len() < CONTAINER_HEADER_SIZE {
            return Err(FormatError::Truncated {
                what: "container header",
                offset: self.offset,
                needed: CONTAINER_HEADER_SIZE as u64,
                available: rest.len() as u64,
            });
        }
        let header = ContainerHeader::decode(rest)?;

        let payload = &rest[CONTAINER_HEADER_SIZE..];
        let size = header.size_compressed as usize;
        if payload.len() < size {
            return Err(FormatError::Truncated {
                what: "container payload",
                offset: self.offset + CONTAINER_HEADER_SIZE as u64,
                needed: size as u64,
                available: payload.len() as u64,
            });
        }

        let info = ContainerInfo {
            index: self.index,
            offset: self.offset,
            record_count: header.record_count,
            size_compressed: header.size_compressed,
            size_uncompressed: header.size_uncompressed,
        };
        self.index += 1;
        self.offset += header.disk_len();

        Ok((info, &payload[..size]))
    }
}

impl Iterator for Containers<'_> {
    type Item = Result<ContainerInfo>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_with_payload()
            .map(|item| item.map(|(info, _)| info))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.failed {
            (0, Some(0))
        } else {
            (0, Some((self.num_containers - self.index) as usize))
        }
    }
}

impl FusedIterator for Containers<'_> {}

// =============================================================================
// Records
// =============================================================================

/// Iterator over the records of a log, see [`LogReader::records`].
#[derive(Debug)]
pub struct Records<'a> {
    containers: Containers<'a>,
    codec: BlockCodec,
    current: Option<Block>,
    failed: bool,
}

/// The decompressed container being replayed.
#[derive(Debug)]
struct Block {
    index: u32,
    data: Vec<u8>,
    pos: usize,
    declared: u32,
    decoded: u32,
}

impl Block {
    /// Next record, `None` once the declared count is reached and every
    /// byte consumed.
    fn next_record(&mut self) -> Option<std::result::Result<DaqRecord, FormatError>> {
        if self.decoded < self.declared {
            return Some(decode_record(&self.data, self.pos).map(|(record, next)| {
                self.pos = next;
                self.decoded += 1;
                record
            }));
        }

        let trailing = self.data.len() - self.pos;
        if trailing > 0 {
            return Some(Err(FormatError::TrailingBytes {
                records: self.decoded,
                trailing: trailing as u64,
            }));
        }
        None
    }
}

impl Records<'_> {
    fn fail(&mut self, e: Error) -> Option<Result<DaqRecord>> {
        self.failed = true;
        self.current = None;
        Some(Err(e))
    }
}

impl Iterator for Records<'_> {
    type Item = Result<DaqRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.failed {
                return None;
            }

            if let Some(block) = self.current.as_mut() {
                match block.next_record() {
                    Some(Ok(record)) => return Some(Ok(record)),
                    Some(Err(e)) => {
                        let index = block.index;
                        return self.fail(e.in_container(index).into());
                    }
                    None => self.current = None,
                }
            }

            let (info, payload) = match self.containers.next_with_payload()? {
                Ok(item) => item,
                Err(e) => return self.fail(e),
            };

            match self.codec.decompress(payload, info.size_uncompressed) {
                Ok(data) => {
                    self.current = Some(Block {
                        index: info.index,
                        data,
                        pos: 0,
                        declared: info.record_count,
                        decoded: 0,
                    })
                }
                Err(e) => return self.fail(e.in_container(info.index).into()),
            }
        }
    }
}

impl FusedIterator for Records<'_> {}
