//! Audit log writer
//!
//! Appends rows to the outcome log, flushing after each one so the log is
//! complete up to the last processed command.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::Result;

use super::AuditEntry;

/// Appends entries to the outcome log file
pub struct AuditLog {
    path: PathBuf,
    writer: BufWriter<File>,
    rows: u64,
}

impl AuditLog {
    /// Open or create the log in append mode
    pub fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
            rows: 0,
        })
    }

    /// Append one row and flush
    pub fn append(&mut self, entry: &AuditEntry) -> Result<()> {
        writeln!(self.writer, "{}", entry.to_row())?;
        self.writer.flush()?;
        self.rows += 1;
        Ok(())
    }

    /// Force the log to disk
    pub fn sync(&mut self) -> Result<()> {
        self.writer.flush()?;
        self.writer.get_ref().sync_all()?;
        Ok(())
    }

    /// Rows appended through this handle
    pub fn rows_written(&self) -> u64 {
        self.rows
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
