//! Block codec for rekorder containers
//!
//! Each container payload is compressed as one independent block:
//! - LZ4 block format (no size prefix), high-compression mode, the default
//! - zstd frames, selected by the `OPTION_ZSTD` header flag
//!
//! A block that does not shrink under compression is stored verbatim. The
//! container header then carries equal compressed and uncompressed sizes,
//! which is how the decoder recognizes it.

#![warn(missing_docs)]
#![warn(clippy::all)]

use std::io;

use rekorder_core::{FormatError, OPTION_ZSTD};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::trace;

/// Most output bytes one LZ4 block input byte can produce.
const LZ4_MAX_EXPANSION: u64 = 255;

/// Compression algorithm for container payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    /// LZ4 block format
    #[default]
    Lz4,
    /// zstd frame format
    Zstd,
}

impl Compression {
    /// Header option flags announcing this algorithm.
    pub fn option_flags(self) -> u16 {
        match self {
            Compression::Lz4 => 0,
            Compression::Zstd => OPTION_ZSTD,
        }
    }

    /// Algorithm announced by header option flags.
    pub fn from_option_flags(options: u16) -> Self {
        if options & OPTION_ZSTD != 0 {
            Compression::Zstd
        } else {
            Compression::Lz4
        }
    }
}

/// Compression level out of range.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("compression level {0} outside {min}..={max}", min = CompressionLevel::MIN, max = CompressionLevel::MAX)]
pub struct InvalidLevel(pub u8);

/// Compression level, `1..=9`.
///
/// Trades write speed for ratio. It never changes what decompression
/// produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct CompressionLevel(u8);

impl CompressionLevel {
    /// Fastest level.
    pub const MIN: u8 = 1;
    /// Best ratio.
    pub const MAX: u8 = 9;

    /// Validate a level.
    pub fn new(level: u8) -> Result<Self, InvalidLevel> {
        if (Self::MIN..=Self::MAX).contains(&level) {
            Ok(CompressionLevel(level))
        } else {
            Err(InvalidLevel(level))
        }
    }

    /// The numeric level.
    pub fn get(self) -> u8 {
        self.0
    }
}

impl Default for CompressionLevel {
    fn default() -> Self {
        CompressionLevel(Self::MAX)
    }
}

impl TryFrom<u8> for CompressionLevel {
    type Error = InvalidLevel;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        CompressionLevel::new(level)
    }
}

impl From<CompressionLevel> for u8 {
    fn from(level: CompressionLevel) -> u8 {
        level.0
    }
}

/// Output of [`BlockCodec::compress`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressedBlock {
    bytes: Vec<u8>,
    uncompressed_len: usize,
}

impl CompressedBlock {
    /// Bytes to store on disk.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consume the block, returning the bytes to store.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Length of the stored bytes.
    pub fn compressed_len(&self) -> usize {
        self.bytes.len()
    }

    /// Length of the input that was compressed.
    pub fn uncompressed_len(&self) -> usize {
        self.uncompressed_len
    }

    /// Whether the input was kept verbatim.
    pub fn is_stored(&self) -> bool {
        self.bytes.len() == self.uncompressed_len
    }
}

/// Stateless block compressor/decompressor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockCodec {
    compression: Compression,
    level: CompressionLevel,
}

impl BlockCodec {
    /// Create a codec.
    pub fn new(compression: Compression, level: CompressionLevel) -> Self {
        BlockCodec { compression, level }
    }

    /// Codec for decoding a file with the given header option flags.
    pub fn from_options(options: u16) -> Self {
        BlockCodec::new(Compression::from_option_flags(options), CompressionLevel::default())
    }

    /// Algorithm in use.
    pub fn compression(&self) -> Compression {
        self.compression
    }

    /// Level in use.
    pub fn level(&self) -> CompressionLevel {
        self.level
    }

    /// Compress one block.
    ///
    /// The result is never longer than `input`: incompressible data comes
    /// back verbatim.
    pub fn compress(&self, input: &[u8]) -> io::Result<CompressedBlock> {
        let level = self.level.get() as i32;
        let packed = match self.compression {
            Compression::Lz4 => lz4::block::compress(
                input,
                Some(lz4::block::CompressionMode::HIGHCOMPRESSION(level)),
                false,
            )?,
            Compression::Zstd => zstd::bulk::compress(input, level)?,
        };

        let bytes = if packed.len() < input.len() {
            packed
        } else {
            input.to_vec()
        };

        trace!(
            compression = ?self.compression,
            uncompressed = input.len(),
            compressed = bytes.len(),
            "compressed block"
        );

        Ok(CompressedBlock {
            bytes,
            uncompressed_len: input.len(),
        })
    }

    /// Decompress one block that must expand to exactly `expected_len` bytes.
    ///
    /// `expected_len` comes from an untrusted container header, so it is
    /// checked against what `input` can possibly expand to before any output
    /// buffer is allocated.
    pub fn decompress(&self, input: &[u8], expected_len: u32) -> Result<Vec<u8>, FormatError> {
        if input.len() as u64 == expected_len as u64 {
            return Ok(input.to_vec());
        }

        let output = match self.compression {
            Compression::Lz4 => {
                let bound = (input.len() as u64).saturating_mul(LZ4_MAX_EXPANSION);
                if expected_len as u64 > bound {
                    return Err(FormatError::Decompress(format!(
                        "lz4 block of {} bytes cannot expand to {} bytes",
                        input.len(),
                        expected_len
                    )));
                }
                let size = i32::try_from(expected_len).map_err(|_| {
                    FormatError::Decompress(format!(
                        "lz4 block of {} bytes exceeds the block size limit",
                        expected_len
                    ))
                })?;
                lz4::block::decompress(input, Some(size))
                    .map_err(|e| FormatError::Decompress(format!("lz4: {}", e)))?
            }
            Compression::Zstd => {
                match zstd::zstd_safe::get_frame_content_size(input) {
                    Ok(Some(declared)) if declared == expected_len as u64 => {}
                    Ok(Some(declared)) => {
                        return Err(FormatError::SizeMismatch {
                            expected: expected_len,
                            actual: declared,
                        })
                    }
                    Ok(None) => {
                        return Err(FormatError::Decompress(
                            "zstd: frame does not declare its content size".to_string(),
                        ))
                    }
                    Err(e) => return Err(FormatError::Decompress(format!("zstd: {}", e))),
                }
                zstd::bulk::decompress(input, expected_len as usize)
                    .map_err(|e| FormatError::Decompress(format!("zstd: {}", e)))?
            }
        };

        if output.len() as u64 != expected_len as u64 {
            return Err(FormatError::SizeMismatch {
                expected: expected_len,
                actual: output.len() as u64,
            });
        }

        Ok(output)
    }
}
