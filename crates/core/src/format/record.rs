//! DAQ record framing.

use byteorder::{ByteOrder, LittleEndian};

use super::{CATEGORY_DAQ, RECORD_HEADER_SIZE};
use crate::error::FormatError;

/// One timestamped, categorized sample.
///
/// On disk the payload length is always encoded explicitly in front of the
/// payload bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct DaqRecord {
    /// Record category (1 = DAQ)
    pub category: u8,
    /// Running counter from the producer
    pub counter: u16,
    /// Sample timestamp
    pub timestamp: f64,
    /// Raw payload bytes
    pub payload: Vec<u8>,
}

impl DaqRecord {
    /// Create a record.
    pub fn new(category: u8, counter: u16, timestamp: f64, payload: impl Into<Vec<u8>>) -> Self {
        DaqRecord {
            category,
            counter,
            timestamp,
            payload: payload.into(),
        }
    }

    /// Create a record in the DAQ category.
    pub fn daq(counter: u16, timestamp: f64, payload: impl Into<Vec<u8>>) -> Self {
        Self::new(CATEGORY_DAQ, counter, timestamp, payload)
    }

    /// Bytes this record occupies inside a container.
    pub fn encoded_len(&self) -> usize {
        RECORD_HEADER_SIZE + self.payload.len()
    }

    /// Append the framed record to `buf`.
    pub fn encode_into(&self, buf: &mut Vec<u8>) -> Result<(), FormatError> {
        encode_record(buf, self.category, self.counter, self.timestamp, &self.payload)
    }
}

/// Append one framed record to `buf`.
///
/// Fails with [`FormatError::PayloadTooLarge`] if the payload length does not
/// fit the 32-bit length field; `buf` is left untouched in that case.
pub fn encode_record(
    buf: &mut Vec<u8>,
    category: u8,
    counter: u16,
    timestamp: f64,
    payload: &[u8],
) -> Result<(), FormatError> {
    let len = u32::try_from(payload.len()).map_err(|_| FormatError::PayloadTooLarge {
        len: payload.len() as u64,
    })?;

    let mut head = [0u8; RECORD_HEADER_SIZE];
    head[0] = category;
    LittleEndian::write_u16(&mut head[1..3], counter);
    LittleEndian::write_f64(&mut head[3..11], timestamp);
    LittleEndian::write_u32(&mut head[11..15], len);

    buf.reserve(RECORD_HEADER_SIZE + payload.len());
    buf.extend_from_slice(&head);
    buf.extend_from_slice(payload);
    Ok(())
}

// (name, start, width) of each fixed field.
const FIELDS: [(&str, usize, usize); 4] = [
    ("record category", 0, 1),
    ("record counter", 1, 2),
    ("record timestamp", 3, 8),
    ("record payload length", 11, 4),
];

/// Decode the record starting at `offset` in `buf`.
///
/// Returns the record and the offset just past it.
pub fn decode_record(buf: &[u8], offset: usize) -> Result<(DaqRecord, usize), FormatError> {
    let remaining = buf.len().saturating_sub(offset);

    if remaining < RECORD_HEADER_SIZE {
        // Name the first field that does not fit.
        for (what, start, width) in FIELDS {
            if remaining < start + width {
                return Err(FormatError::truncated(
                    what,
                    offset + start,
                    width,
                    remaining.saturating_sub(start),
                ));
            }
        }
    }

    let head = &buf[offset..offset + RECORD_HEADER_SIZE];
    let len = LittleEndian::read_u32(&head[11..15]);

    let payload_at = offset + RECORD_HEADER_SIZE;
    let available = buf.len() - payload_at;
    if len as usize > available {
        return Err(FormatError::PayloadOverrun {
            offset: payload_at as u64,
            declared: len,
            available: available as u64,
        });
    }

    let end = payload_at + len as usize;
    let record = DaqRecord {
        category: head[0],
        counter: LittleEndian::read_u16(&head[1..3]),
        timestamp: LittleEndian::read_f64(&head[3..11]),
        payload: buf[payload_at..end].to_vec(),
    };

    Ok((record, end))
}
