//! Audit Log Module
//!
//! Append-only record of every processed command and its outcome.
//!
//! ## File Format
//! One CSV row per non-blank script line:
//! ```text
//! ┌──────────────┬───────────────────────────┬──────────────────┐
//! │ unix seconds │ command line (trimmed)    │ success|failure  │
//! └──────────────┴───────────────────────────┴──────────────────┘
//! 1700000000,CREATE TYPE Person 2 1 id int name str,success
//! ```
//! The log is a data file kept beside the catalog, separate from the
//! diagnostic `tracing` output.

mod entry;
mod writer;

pub use entry::AuditEntry;
pub use writer::AuditLog;
