//! Configuration for Strata
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::error::{Result, StrataError};

/// Main configuration for a Strata instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory for all data files
    /// Internal structure:
    ///   {data_dir}/
    ///     ├── catalog.csv         (type catalog)
    ///     ├── strata_log.csv      (command outcome log)
    ///     ├── segments/           ({type}_{n}.seg segment files)
    ///     └── indexes/            ({type}.idx index snapshots)
    pub data_dir: PathBuf,

    /// Size of one page in bytes (PAGESIZE)
    pub page_size: usize,

    /// Number of pages in every segment file
    pub pages_per_segment: usize,

    /// Width of every record field in bytes
    pub field_width: usize,

    /// What to do with field values wider than `field_width`
    pub overflow_policy: FieldOverflowPolicy,

    // -------------------------------------------------------------------------
    // Index Configuration
    // -------------------------------------------------------------------------
    /// Maximum keys per B+ tree node (M)
    pub fanout: usize,

    // -------------------------------------------------------------------------
    // Outcome Log Configuration
    // -------------------------------------------------------------------------
    /// File name of the append-only command outcome log inside `data_dir`
    pub audit_log: String,
}

/// Policy for field values that do not fit the fixed field width
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldOverflowPolicy {
    /// Refuse the record with `FieldTooLong`
    Reject,

    /// Cut the value to the field width (on a UTF-8 boundary)
    Truncate,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./strata_data"),
            page_size: 2000,
            pages_per_segment: 10,
            field_width: 20,
            overflow_policy: FieldOverflowPolicy::Reject,
            fanout: 4,
            audit_log: "strata_log.csv".to_string(),
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check the parts of the geometry that do not depend on a schema
    pub fn validate(&self) -> Result<()> {
        if self.field_width == 0 {
            return Err(StrataError::Config("field_width must be positive".into()));
        }
        if self.page_size < 2 {
            return Err(StrataError::Config(format!(
                "page_size {} cannot hold a page flag and a slot",
                self.page_size
            )));
        }
        if self.pages_per_segment == 0 {
            return Err(StrataError::Config(
                "pages_per_segment must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Effective fanout (values below 2 clamp to 2)
    pub fn effective_fanout(&self) -> usize {
        self.fanout.max(2)
    }

    /// Directory holding segment files
    pub fn segment_dir(&self) -> PathBuf {
        self.data_dir.join("segments")
    }

    /// Directory holding index snapshots
    pub fn index_dir(&self) -> PathBuf {
        self.data_dir.join("indexes")
    }

    /// Path of the type catalog
    pub fn catalog_path(&self) -> PathBuf {
        self.data_dir.join("catalog.csv")
    }

    /// Path of the command outcome log
    pub fn audit_log_path(&self) -> PathBuf {
        self.data_dir.join(&self.audit_log)
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory (root for all storage)
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set the page size in bytes
    pub fn page_size(mut self, size: usize) -> Self {
        self.config.page_size = size;
        self
    }

    /// Set the number of pages per segment file
    pub fn pages_per_segment(mut self, count: usize) -> Self {
        self.config.pages_per_segment = count;
        self
    }

    /// Set the fixed field width in bytes
    pub fn field_width(mut self, width: usize) -> Self {
        self.config.field_width = width;
        self
    }

    /// Set the over-length field policy
    pub fn overflow_policy(mut self, policy: FieldOverflowPolicy) -> Self {
        self.config.overflow_policy = policy;
        self
    }

    /// Set the B+ tree fanout
    pub fn fanout(mut self, fanout: usize) -> Self {
        self.config.fanout = fanout;
        self
    }

    /// Set the outcome log file name
    pub fn audit_log(mut self, name: impl Into<String>) -> Self {
        self.config.audit_log = name.into();
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
