//! Catalog Module
//!
//! Flat text registry of type schemas and their active segment pointers.
//!
//! ## File Format
//! One line per type:
//! ```text
//! Person,3,1,id,int,name,str,age,int,Person_1.seg
//! Planet,2,2,mass,int,name,str,Planet_4.seg
//! ```
//! The file is read once at startup and rewritten whole whenever a type is
//! created or deleted, or an active segment pointer advances.

mod schema;

use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{Result, StrataError};

pub use schema::{validate_name, FieldDef, FieldType, TypeSchema};

/// Handle on the catalog file
#[derive(Debug, Clone)]
pub struct Catalog {
    path: PathBuf,
}

impl Catalog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every schema; a missing file is an empty catalog
    pub fn load(&self) -> Result<Vec<TypeSchema>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let text = fs::read_to_string(&self.path)?;
        let mut schemas: Vec<TypeSchema> = Vec::new();
        for (lineno, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let schema = TypeSchema::from_line(line).map_err(|e| {
                StrataError::Catalog(format!("line {}: {}", lineno + 1, e))
            })?;
            if schemas.iter().any(|s| s.name == schema.name) {
                return Err(StrataError::Catalog(format!(
                    "line {}: type '{}' registered twice",
                    lineno + 1,
                    schema.name
                )));
            }
            schemas.push(schema);
        }
        Ok(schemas)
    }

    /// Replace the catalog with `schemas`
    pub fn save<'a>(&self, schemas: impl IntoIterator<Item = &'a TypeSchema>) -> Result<()> {
        let tmp_path = self.path.with_extension("csv.tmp");
        {
            let file = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&tmp_path)?;
            let mut writer = BufWriter::new(file);
            for schema in schemas {
                writeln!(writer, "{}", schema.to_line())?;
            }
            writer.flush()?;
        }
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}
