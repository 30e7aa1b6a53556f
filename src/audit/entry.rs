//! Audit entry definitions

use std::time::{SystemTime, UNIX_EPOCH};

use crate::protocol::Status;

/// One outcome row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEntry {
    /// Unix seconds when the command finished
    pub timestamp: u64,

    /// The command line as read, trimmed
    pub line: String,

    /// Outcome
    pub status: Status,
}

impl AuditEntry {
    /// Entry stamped with the current wall clock
    pub fn now(line: &str, status: Status) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Self::at(timestamp, line, status)
    }

    pub fn at(timestamp: u64, line: &str, status: Status) -> Self {
        Self {
            timestamp,
            line: line.trim().to_string(),
            status,
        }
    }

    /// CSV row without the trailing newline
    pub fn to_row(&self) -> String {
        format!("{},{},{}", self.timestamp, self.line, self.status)
    }
}
