//! File header.

use byteorder::{ByteOrder, LittleEndian};

use super::container::ContainerHeader;
use super::{
    FILE_HEADER_SIZE, FILLER_BYTE, FILLER_LEN, FORMAT_VERSION, KNOWN_OPTIONS, MAGIC,
    OPTION_ZSTD,
};
use crate::error::FormatError;

const HDR_SIZE_AT: usize = 16;
const VERSION_AT: usize = 18;
const OPTIONS_AT: usize = 20;
const NUM_CONTAINERS_AT: usize = 22;
const RECORD_COUNT_AT: usize = 26;
const SIZE_COMPRESSED_AT: usize = 30;
const SIZE_UNCOMPRESSED_AT: usize = 34;
const FILLER_AT: usize = 38;

/// File header stored at offset 0.
///
/// The writer creates it with zero totals, rewrites it with running totals
/// after every container, and writes the final totals on close.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeader {
    /// Format version
    pub version: u16,
    /// Option flags (see [`OPTION_ZSTD`])
    pub options: u16,
    /// Number of containers following the header
    pub num_containers: u32,
    /// Total records across all containers
    pub record_count: u32,
    /// Sum of the containers' compressed sizes
    pub size_compressed: u32,
    /// Sum of the containers' uncompressed sizes
    pub size_uncompressed: u32,
}

impl FileHeader {
    /// Create a provisional header with zero totals.
    pub fn new(options: u16) -> Self {
        FileHeader {
            version: FORMAT_VERSION,
            options,
            num_containers: 0,
            record_count: 0,
            size_compressed: 0,
            size_uncompressed: 0,
        }
    }

    /// Whether containers in this file are zstd frames.
    pub fn is_zstd(&self) -> bool {
        self.options & OPTION_ZSTD != 0
    }

    /// Uncompressed total divided by compressed total.
    ///
    /// Returns `None` when no compressed bytes have been recorded.
    pub fn compression_ratio(&self) -> Option<f64> {
        if self.size_compressed == 0 {
            None
        } else {
            Some(self.size_uncompressed as f64 / self.size_compressed as f64)
        }
    }

    /// Totals after appending `container`, or `None` if a 32-bit field
    /// would overflow.
    pub fn checked_add_container(&self, container: &ContainerHeader) -> Option<FileHeader> {
        Some(FileHeader {
            num_containers: self.num_containers.checked_add(1)?,
            record_count: self.record_count.checked_add(container.record_count)?,
            size_compressed: self.size_compressed.checked_add(container.size_compressed)?,
            size_uncompressed: self
                .size_uncompressed
                .checked_add(container.size_uncompressed)?,
            ..*self
        })
    }

    /// Encode to the fixed 48-byte layout.
    pub fn encode(&self) -> [u8; FILE_HEADER_SIZE] {
        let mut buf = [0u8; FILE_HEADER_SIZE];
        buf[..MAGIC.len()].copy_from_slice(&MAGIC);
        LittleEndian::write_u16(&mut buf[HDR_SIZE_AT..], FILE_HEADER_SIZE as u16);
        LittleEndian::write_u16(&mut buf[VERSION_AT..], self.version);
        LittleEndian::write_u16(&mut buf[OPTIONS_AT..], self.options);
        LittleEndian::write_u32(&mut buf[NUM_CONTAINERS_AT..], self.num_containers);
        LittleEndian::write_u32(&mut buf[RECORD_COUNT_AT..], self.record_count);
        LittleEndian::write_u32(&mut buf[SIZE_COMPRESSED_AT..], self.size_compressed);
        LittleEndian::write_u32(&mut buf[SIZE_UNCOMPRESSED_AT..], self.size_uncompressed);
        buf[FILLER_AT..FILLER_AT + FILLER_LEN].fill(FILLER_BYTE);
        buf
    }

    /// Decode and validate a header from the start of `buf`.
    ///
    /// The magic is checked before anything else is read, so a short or
    /// foreign file always fails with [`FormatError::BadMagic`].
    pub fn decode(buf: &[u8]) -> Result<Self, FormatError> {
        if buf.len() < MAGIC.len() || buf[..MAGIC.len()] != MAGIC {
            let n = buf.len().min(MAGIC.len());
            return Err(FormatError::BadMagic {
                found: buf[..n].to_vec(),
            });
        }

        if buf.len() < FILE_HEADER_SIZE {
            return Err(FormatError::truncated(
                "file header",
                0,
                FILE_HEADER_SIZE,
                buf.len(),
            ));
        }

        let hdr_size = LittleEndian::read_u16(&buf[HDR_SIZE_AT..]);
        if hdr_size as usize != FILE_HEADER_SIZE {
            return Err(FormatError::HeaderSize {
                expected: FILE_HEADER_SIZE as u16,
                found: hdr_size,
            });
        }

        let version = LittleEndian::read_u16(&buf[VERSION_AT..]);
        if version != FORMAT_VERSION {
            return Err(FormatError::UnsupportedVersion {
                expected: FORMAT_VERSION,
                found: version,
            });
        }

        let options = LittleEndian::read_u16(&buf[OPTIONS_AT..]);
        if options & !KNOWN_OPTIONS != 0 {
            return Err(FormatError::UnsupportedOptions(options));
        }

        Ok(FileHeader {
            version,
            options,
            num_containers: LittleEndian::read_u32(&buf[NUM_CONTAINERS_AT..]),
            record_count: LittleEndian::read_u32(&buf[RECORD_COUNT_AT..]),
            size_compressed: LittleEndian::read_u32(&buf[SIZE_COMPRESSED_AT..]),
            size_uncompressed: LittleEndian::read_u32(&buf[SIZE_UNCOMPRESSED_AT..]),
        })
    }
}

impl Default for FileHeader {
    fn default() -> Self {
        FileHeader::new(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FileHeader {
        FileHeader {
            version: FORMAT_VERSION,
            options: 0,
            num_containers: 2,
            record_count: 300,
            size_compressed: 1_000,
            size_uncompressed: 4_000,
        }
    }

    #[test]
    fn test_encoded_layout() {
        let buf = sample().encode();

        assert_eq!(&buf[..16], b"ASAMINT::XCP_RAW");
        assert_eq!(&buf[16..18], &[48, 0]);
        assert_eq!(&buf[18..20], &[0x00, 0x01]);
        assert_eq!(&buf[20..22], &[0, 0]);
        assert_eq!(&buf[22..26], &[2, 0, 0, 0]);
        assert_eq!(&buf[26..30], &[44, 1, 0, 0]);
        assert_eq!(&buf[30..34], &[0xe8, 0x03, 0, 0]);
        assert_eq!(&buf[34..38], &[0xa0, 0x0f, 0, 0]);
        assert!(buf[38..].iter().all(|&b| b == 0xCC));
    }

    #[test]
    fn test_decode_encoded() {
        let header = sample();
        assert_eq!(FileHeader::decode(&header.encode()).unwrap(), header);
    }

    #[test]
    fn test_empty_buffer_is_bad_magic() {
        let err = FileHeader::decode(&[]).unwrap_err();
        assert_eq!(err, FormatError::BadMagic { found: vec![] });
    }

    #[test]
    fn test_wrong_magic() {
        let mut buf = sample().encode();
        buf[0] = b'X';
        assert!(matches!(
            FileHeader::decode(&buf),
            Err(FormatError::BadMagic { .. })
        ));
    }

    #[test]
    fn test_short_header_after_magic() {
        let buf = sample().encode();
        let err = FileHeader::decode(&buf[..20]).unwrap_err();
        assert!(matches!(err, FormatError::Truncated { needed: 48, available: 20, .. }));
    }

    #[test]
    fn test_wrong_header_size() {
        let mut buf = sample().encode();
        buf[16] = 49;
        assert_eq!(
            FileHeader::decode(&buf).unwrap_err(),
            FormatError::HeaderSize {
                expected: 48,
                found: 49
            }
        );
    }

    #[test]
    fn test_unknown_version() {
        let mut buf = sample().encode();
        buf[19] = 0x02;
        assert!(matches!(
            FileHeader::decode(&buf),
            Err(FormatError::UnsupportedVersion { found: 0x0200, .. })
        ));
    }

    #[test]
    fn test_unknown_option_bits() {
        let mut buf = sample().encode();
        buf[20] = 0x04;
        assert_eq!(
            FileHeader::decode(&buf).unwrap_err(),
            FormatError::UnsupportedOptions(0x0004)
        );
    }

    #[test]
    fn test_zstd_flag() {
        let header = FileHeader::new(OPTION_ZSTD);
        let decoded = FileHeader::decode(&header.encode()).unwrap();
        assert!(decoded.is_zstd());
        assert!(!FileHeader::default().is_zstd());
    }

    #[test]
    fn test_checked_add_container() {
        let container = ContainerHeader {
            record_count: 3,
            size_compressed: 20,
            size_uncompressed: 50,
        };
        let next = sample().checked_add_container(&container).unwrap();
        assert_eq!(next.num_containers, 3);
        assert_eq!(next.record_count, 303);
        assert_eq!(next.size_compressed, 1_020);
        assert_eq!(next.size_uncompressed, 4_050);

        let full = FileHeader {
            record_count: u32::MAX - 1,
            ..sample()
        };
        assert_eq!(full.checked_add_container(&container), None);
    }

    #[test]
    fn test_compression_ratio() {
        assert_eq!(FileHeader::default().compression_ratio(), None);
        assert_eq!(sample().compression_ratio(), Some(4.0));
    }
}
