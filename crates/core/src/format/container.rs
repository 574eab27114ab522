//! Container header.

use byteorder::{ByteOrder, LittleEndian};

use super::CONTAINER_HEADER_SIZE;
use crate::error::FormatError;

/// Header in front of each compressed block.
///
/// Exactly `size_compressed` payload bytes follow it on disk. A payload whose
/// compressed and uncompressed sizes are equal is stored verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ContainerHeader {
    /// Records in this container
    pub record_count: u32,
    /// Payload bytes on disk
    pub size_compressed: u32,
    /// Payload bytes after decompression
    pub size_uncompressed: u32,
}

impl ContainerHeader {
    /// Whether the payload is stored without compression.
    pub fn is_stored(&self) -> bool {
        self.size_compressed == self.size_uncompressed
    }

    /// Bytes this container occupies on disk, header included.
    pub fn disk_len(&self) -> u64 {
        CONTAINER_HEADER_SIZE as u64 + self.size_compressed as u64
    }

    /// Encode to the fixed 12-byte layout.
    pub fn encode(&self) -> [u8; CONTAINER_HEADER_SIZE] {
        let mut buf = [0u8; CONTAINER_HEADER_SIZE];
        LittleEndian::write_u32(&mut buf[0..4], self.record_count);
        LittleEndian::write_u32(&mut buf[4..8], self.size_compressed);
        LittleEndian::write_u32(&mut buf[8..12], self.size_uncompressed);
        buf
    }

    /// Decode from the start of `buf`.
    pub fn decode(buf: &[u8]) -> Result<Self, FormatError> {
        if buf.len() < CONTAINER_HEADER_SIZE {
            return Err(FormatError::truncated(
                "container header",
                0,
                CONTAINER_HEADER_SIZE,
                buf.len(),
            ));
        }

        Ok(ContainerHeader {
            record_count: LittleEndian::read_u32(&buf[0..4]),
            size_compressed: LittleEndian::read_u32(&buf[4..8]),
            size_uncompressed: LittleEndian::read_u32(&buf[8..12]),
        })
    }
}
