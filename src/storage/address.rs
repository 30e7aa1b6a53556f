//! Record addresses
//!
//! An address names a slot as (segment file, byte offset of the slot's flag
//! byte). Its textual form is `"segment_filename,byte_offset"`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::StrataError;

/// Location of one stored record
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address {
    /// File name of the segment (not a path)
    pub segment: String,

    /// Byte offset of the slot flag inside the segment
    pub offset: u64,
}

impl Address {
    pub fn new(segment: impl Into<String>, offset: u64) -> Self {
        Self {
            segment: segment.into(),
            offset,
        }
    }

    /// Offset of the record payload (one past the slot flag)
    pub fn payload_offset(&self) -> u64 {
        self.offset + 1
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.segment, self.offset)
    }
}

impl FromStr for Address {
    type Err = StrataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (segment, offset) = s
            .rsplit_once(',')
            .ok_or_else(|| StrataError::InvalidAddress(format!("missing ',' in '{}'", s)))?;

        let segment = segment.trim();
        if segment.is_empty() {
            return Err(StrataError::InvalidAddress(format!(
                "empty segment name in '{}'",
                s
            )));
        }

        let offset = offset
            .trim()
            .parse()
            .map_err(|_| StrataError::InvalidAddress(format!("bad offset in '{}'", s)))?;

        Ok(Self::new(segment, offset))
    }
}
