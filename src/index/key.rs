//! Primary key representation
//!
//! The ordering of a type's index is fixed by the declared type of its
//! primary key field: integer keys compare numerically, everything else
//! compares as text.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StrataError};

/// A typed primary key stored in the B+ tree
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IndexKey {
    /// Numeric key (declared `int`)
    Int(i64),

    /// Lexicographic key (any other declared type)
    Text(String),
}

/// Which comparison a type's keys use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    Int,
    Text,
}

impl IndexKey {
    /// The kind of this key
    pub fn kind(&self) -> KeyKind {
        match self {
            IndexKey::Int(_) => KeyKind::Int,
            IndexKey::Text(_) => KeyKind::Text,
        }
    }
}

impl Ord for IndexKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (IndexKey::Int(a), IndexKey::Int(b)) => a.cmp(b),
            (IndexKey::Text(a), IndexKey::Text(b)) => a.cmp(b),
            // Never mixed within one tree; keep a total order anyway.
            (IndexKey::Int(_), IndexKey::Text(_)) => Ordering::Less,
            (IndexKey::Text(_), IndexKey::Int(_)) => Ordering::Greater,
        }
    }
}

impl PartialOrd for IndexKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for IndexKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexKey::Int(v) => write!(f, "{}", v),
            IndexKey::Text(s) => f.write_str(s),
        }
    }
}

impl KeyKind {
    /// Parse a raw field value into a key of this kind
    pub fn parse(&self, raw: &str) -> Result<IndexKey> {
        match self {
            KeyKind::Int => raw.trim().parse::<i64>().map(IndexKey::Int).map_err(|_| {
                StrataError::InvalidField(format!("'{}' is not a valid integer key", raw))
            }),
            KeyKind::Text => Ok(IndexKey::Text(raw.to_string())),
        }
    }
}
