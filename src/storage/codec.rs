//! Record Codec
//!
//! Fixed-width field (de)serialization. Every field occupies exactly
//! `field_width` bytes: the value left-aligned, followed by space padding.
//!
//! ```text
//! ┌────────────────────┬────────────────────┬─────┐
//! │ "alice␣␣␣...␣"  20 │ "42␣␣␣...␣"     20 │ ... │
//! └────────────────────┴────────────────────┴─────┘
//! ```

use bytes::{BufMut, Bytes, BytesMut};

use crate::config::FieldOverflowPolicy;
use crate::error::{Result, StrataError};

use super::layout::PAD;

/// Encodes and decodes records of one fixed shape
#[derive(Debug, Clone, Copy)]
pub struct RecordCodec {
    field_count: usize,
    field_width: usize,
    policy: FieldOverflowPolicy,
}

impl RecordCodec {
    pub fn new(field_count: usize, field_width: usize, policy: FieldOverflowPolicy) -> Self {
        Self {
            field_count,
            field_width,
            policy,
        }
    }

    pub fn field_width(&self) -> usize {
        self.field_width
    }

    /// Size of an encoded record
    pub fn record_width(&self) -> usize {
        self.field_count * self.field_width
    }

    pub fn encode<S: AsRef<str>>(&self, fields: &[S]) -> Result<Bytes> {
        if fields.len() != self.field_count {
            return Err(StrataError::SchemaMismatch {
                expected: self.field_count,
                actual: fields.len(),
            });
        }
        encode(fields, self.field_width, self.policy)
    }

    pub fn decode(&self, block: &[u8]) -> Result<Vec<String>> {
        if block.len() != self.record_width() {
            return Err(StrataError::InvalidField(format!(
                "record block is {} bytes, expected {}",
                block.len(),
                self.record_width()
            )));
        }
        decode(block, self.field_count, self.field_width)
    }
}

/// Pad (or, under `Truncate`, cut) each field to `width` bytes
pub fn encode<S: AsRef<str>>(
    fields: &[S],
    width: usize,
    policy: FieldOverflowPolicy,
) -> Result<Bytes> {
    let mut buf = BytesMut::with_capacity(fields.len() * width);

    for field in fields {
        let value = field.as_ref();
        if value.bytes().any(|b| b.is_ascii_control()) {
            return Err(StrataError::InvalidField(format!(
                "'{}' contains control characters",
                value.escape_debug()
            )));
        }

        let bytes = if value.len() <= width {
            value.as_bytes()
        } else {
            match policy {
                FieldOverflowPolicy::Reject => {
                    return Err(StrataError::FieldTooLong {
                        field: value.to_string(),
                        width,
                    })
                }
                FieldOverflowPolicy::Truncate => {
                    let mut cut = width;
                    while !value.is_char_boundary(cut) {
                        cut -= 1;
                    }
                    &value.as_bytes()[..cut]
                }
            }
        };

        buf.put_slice(bytes);
        buf.put_bytes(PAD, width - bytes.len());
    }

    Ok(buf.freeze())
}

/// Split a block into `field_count` cells of `width` bytes and trim padding
pub fn decode(block: &[u8], field_count: usize, width: usize) -> Result<Vec<String>> {
    if block.len() < field_count * width {
        return Err(StrataError::InvalidField(format!(
            "block of {} bytes cannot hold {} fields of width {}",
            block.len(),
            field_count,
            width
        )));
    }

    block
        .chunks_exact(width)
        .take(field_count)
        .map(|cell| {
            let text = std::str::from_utf8(cell).map_err(|e| {
                StrataError::InvalidField(format!("stored field is not UTF-8: {}", e))
            })?;
            Ok(text.trim_end_matches(PAD as char).to_string())
        })
        .collect()
}
