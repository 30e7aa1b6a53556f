//! Script Session
//!
//! Drives the engine from a command script: one line in, one outcome row in
//! the audit log, zero or more record lines out.

use std::io::{BufRead, Write};

use tracing::{debug, error, warn};

use crate::audit::{AuditEntry, AuditLog};
use crate::engine::Engine;
use crate::error::Result;
use crate::protocol::{Command, Response, Status};

/// Totals for one script run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub succeeded: usize,
    pub failed: usize,
}

/// Interprets script lines against an engine
pub struct Session<W: Write> {
    engine: Engine,
    audit: AuditLog,
    output: W,
    summary: SessionSummary,
}

impl<W: Write> Session<W> {
    /// Create a session; the audit log is opened at the engine's configured path
    pub fn new(engine: Engine, output: W) -> Result<Self> {
        let audit = AuditLog::open(&engine.config().audit_log_path())?;
        Ok(Self {
            engine,
            audit,
            output,
            summary: SessionSummary::default(),
        })
    }

    /// Process every line of `input`
    ///
    /// A fault aborts the run after the indexes have been checkpointed.
    pub fn run<R: BufRead>(&mut self, input: R) -> Result<SessionSummary> {
        for line in input.lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    self.checkpoint_after_fault();
                    return Err(e.into());
                }
            };
            self.process_line(&line)?;
        }
        Ok(self.summary)
    }

    /// Process one line; blank lines are skipped and yield `None`
    ///
    /// Rejected commands become failures. Storage and index faults are
    /// logged as failures too, then abort once every index is checkpointed.
    pub fn process_line(&mut self, line: &str) -> Result<Option<Response>> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let response = match Command::parse(line).and_then(|cmd| {
            debug!(command = ?cmd.command_type(), "executing");
            self.engine.execute(cmd)
        }) {
            Ok(response) => response,
            Err(e) if e.is_rejection() => {
                warn!(line, error = %e, "command rejected");
                Response::failure()
            }
            Err(e) => {
                error!(line, error = %e, "command aborted the session");
                self.summary.failed += 1;
                if let Err(audit_err) = self.audit.append(&AuditEntry::now(line, Status::Failure)) {
                    warn!(error = %audit_err, "outcome row lost");
                }
                self.checkpoint_after_fault();
                return Err(e);
            }
        };

        for out in &response.lines {
            writeln!(self.output, "{}", out)?;
        }
        self.audit.append(&AuditEntry::now(line, response.status))?;

        if response.is_success() {
            self.summary.succeeded += 1;
        } else {
            self.summary.failed += 1;
        }
        Ok(Some(response))
    }

    /// Keep every change made before a fault; errors here are only logged
    fn checkpoint_after_fault(&mut self) {
        if let Err(e) = self.output.flush() {
            warn!(error = %e, "output flush failed");
        }
        if let Err(e) = self.audit.sync() {
            warn!(error = %e, "outcome log sync failed");
        }
        if let Err(e) = self.engine.checkpoint() {
            error!(error = %e, "checkpoint after fault failed");
        }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn summary(&self) -> SessionSummary {
        self.summary
    }

    /// Flush output and the audit log, then checkpoint and close the engine
    pub fn finish(mut self) -> Result<(SessionSummary, W)> {
        self.output.flush()?;
        self.audit.sync()?;
        self.engine.close()?;
        Ok((self.summary, self.output))
    }
}
