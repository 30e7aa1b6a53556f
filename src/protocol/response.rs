//! Response definitions
//!
//! Outcome of one command: a success flag for the outcome log plus any
//! record lines destined for the output file.

use std::fmt;

/// Command outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Failure,
}

impl Status {
    pub fn is_success(self) -> bool {
        self == Status::Success
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Success => f.write_str("success"),
            Status::Failure => f.write_str("failure"),
        }
    }
}

/// A response to one command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: Status,

    /// Output lines (records, type names), written even on failure
    pub lines: Vec<String>,
}

impl Response {
    /// Successful response carrying output lines
    pub fn success(lines: Vec<String>) -> Self {
        Self {
            status: Status::Success,
            lines,
        }
    }

    /// Failed response with no output
    pub fn failure() -> Self {
        Self {
            status: Status::Failure,
            lines: Vec::new(),
        }
    }

    /// Map a boolean outcome with no output
    pub fn from_bool(ok: bool) -> Self {
        if ok {
            Self::success(Vec::new())
        } else {
            Self::failure()
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}
