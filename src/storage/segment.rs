//! Segment files
//!
//! Naming and initialization of the fixed-size files that hold one type's
//! records. Segment `n` of type `T` is stored as `T_n.seg`; segments are
//! never renamed or overwritten once created.

use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{Result, StrataError};

use super::layout::SegmentLayout;

/// File extension of segment files
pub const SEGMENT_EXTENSION: &str = "seg";

/// File name of segment `number` of `type_name`
/// ("Person", 3) → "Person_3.seg"
pub fn segment_name(type_name: &str, number: u32) -> String {
    format!("{}_{}.{}", type_name, number, SEGMENT_EXTENSION)
}

/// Parse a segment file name into (type name, number)
/// "Person_3.seg" → Some(("Person", 3))
pub fn parse_segment_name(name: &str) -> Option<(&str, u32)> {
    let stem = name.strip_suffix(SEGMENT_EXTENSION)?.strip_suffix('.')?;
    let (type_name, number) = stem.rsplit_once('_')?;
    if type_name.is_empty() {
        return None;
    }
    Some((type_name, number.parse().ok()?))
}

/// Name of the segment that follows `current`
pub fn next_segment_name(current: &str) -> Result<String> {
    let (type_name, number) = parse_segment_name(current).ok_or_else(|| {
        StrataError::InvalidAddress(format!("'{}' is not a segment file name", current))
    })?;
    Ok(segment_name(type_name, number + 1))
}

/// Create a new, fully initialized segment file
///
/// Every page gets an open flag and free slots with blank payloads; the file
/// is exactly `layout.segment_size()` bytes. Fails if the file exists.
pub fn create_segment(path: &Path, layout: &SegmentLayout) -> Result<()> {
    let file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)?;

    let page = layout.blank_page();
    let mut writer = BufWriter::new(file);
    for _ in 0..layout.pages_per_segment() {
        writer.write_all(&page)?;
    }
    writer.flush()?;

    let file = writer.into_inner().map_err(|e| {
        StrataError::Io(std::io::Error::other(format!(
            "Failed to flush segment {}: {}",
            path.display(),
            e
        )))
    })?;
    file.sync_all()?;
    Ok(())
}

/// All segment files of `type_name` in `dir`, in segment-number order
pub fn list_segments(dir: &Path, type_name: &str) -> Result<Vec<PathBuf>> {
    let mut found: Vec<(u32, PathBuf)> = Vec::new();

    if !dir.exists() {
        return Ok(Vec::new());
    }
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if let Some((owner, number)) = parse_segment_name(name) {
            if owner == type_name {
                found.push((number, path.clone()));
            }
        }
    }

    found.sort_by_key(|(number, _)| *number);
    Ok(found.into_iter().map(|(_, path)| path).collect())
}
