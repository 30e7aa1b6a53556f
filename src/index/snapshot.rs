//! Index Snapshot
//!
//! Persists the key → address set of a tree (never its shape) and rebuilds a
//! fresh tree from it by sequential insertion.
//!
//! ## File Format
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │ Header (18 bytes)                                             │
//! │   Magic: "STIX" (4) | Version: u16 (2) | CRC32: u32 (4)       │
//! │   PayloadLen: u64 (8)                                         │
//! ├───────────────────────────────────────────────────────────────┤
//! │ Payload: bincode(Vec<(key, value)>) in ascending key order    │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//! All integers are little-endian. The CRC covers the payload only.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Result, StrataError};

use super::tree::BPlusTree;

/// Magic bytes identifying a Strata index snapshot
pub const MAGIC: &[u8; 4] = b"STIX";

/// Current snapshot format version
pub const VERSION: u16 = 1;

/// Header size: Magic (4) + Version (2) + CRC (4) + PayloadLen (8) = 18 bytes
pub const HEADER_SIZE: usize = 18;

/// Reader/writer for index snapshot files
pub struct IndexSnapshot;

impl IndexSnapshot {
    /// Write the tree's entries to `path`, replacing any previous snapshot
    ///
    /// The snapshot is written to a sibling temp file and renamed into place.
    /// Returns the number of entries written.
    pub fn write<K, V>(path: &Path, tree: &BPlusTree<K, V>) -> Result<usize>
    where
        K: Ord + Clone + Serialize,
        V: Serialize,
    {
        let entries: Vec<(&K, &V)> = tree.iter().collect();
        let payload = bincode::serialize(&entries)?;
        let crc = crc32fast::hash(&payload);

        let tmp_path = path.with_extension("idx.tmp");
        {
            let file = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&tmp_path)?;
            let mut writer = BufWriter::new(file);

            writer.write_all(MAGIC)?;
            writer.write_all(&VERSION.to_le_bytes())?;
            writer.write_all(&crc.to_le_bytes())?;
            writer.write_all(&(payload.len() as u64).to_le_bytes())?;
            writer.write_all(&payload)?;
            writer.flush()?;

            let file = writer.into_inner().map_err(|e| {
                StrataError::Snapshot(format!("Failed to flush snapshot: {}", e))
            })?;
            file.sync_all()?;
        }
        fs::rename(&tmp_path, path)?;

        Ok(entries.len())
    }

    /// Read and verify a snapshot, returning its entries in stored order
    pub fn read<K, V>(path: &Path) -> Result<Vec<(K, V)>>
    where
        K: DeserializeOwned,
        V: DeserializeOwned,
    {
        let mut file = File::open(path)?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)?;

        if bytes.len() < HEADER_SIZE {
            return Err(StrataError::Snapshot(format!(
                "{} is truncated: {} bytes",
                path.display(),
                bytes.len()
            )));
        }

        let (header, payload) = bytes.split_at(HEADER_SIZE);
        if &header[0..4] != MAGIC {
            return Err(StrataError::Snapshot(format!(
                "Invalid snapshot magic: expected STIX, got {:?}",
                &header[0..4]
            )));
        }

        let version = u16::from_le_bytes([header[4], header[5]]);
        if version != VERSION {
            return Err(StrataError::Snapshot(format!(
                "Unsupported snapshot version: {}",
                version
            )));
        }

        let crc = u32::from_le_bytes([header[6], header[7], header[8], header[9]]);
        let mut len_bytes = [0u8; 8];
        len_bytes.copy_from_slice(&header[10..18]);
        let payload_len = u64::from_le_bytes(len_bytes) as usize;

        if payload.len() != payload_len {
            return Err(StrataError::Snapshot(format!(
                "Payload length mismatch: header says {}, file holds {}",
                payload_len,
                payload.len()
            )));
        }
        if crc32fast::hash(payload) != crc {
            return Err(StrataError::Snapshot(format!(
                "Checksum mismatch in {}",
                path.display()
            )));
        }

        Ok(bincode::deserialize(payload)?)
    }

    /// Rebuild a tree with fanout `maximum` from a snapshot file
    pub fn load<K, V>(path: &Path, maximum: usize) -> Result<BPlusTree<K, V>>
    where
        K: Ord + Clone + DeserializeOwned,
        V: DeserializeOwned,
    {
        let entries = Self::read(path)?;
        Self::rebuild(entries, maximum)
    }

    /// Build a fresh tree by inserting entries one at a time
    ///
    /// Fails if the entry set carries the same key twice.
    pub fn rebuild<K, V>(
        entries: impl IntoIterator<Item = (K, V)>,
        maximum: usize,
    ) -> Result<BPlusTree<K, V>>
    where
        K: Ord + Clone,
    {
        let mut tree = BPlusTree::new(maximum);
        for (key, value) in entries {
            let (inserted, _) = tree.insert(key, value);
            if !inserted {
                return Err(StrataError::Snapshot(
                    "Snapshot contains a duplicate key".to_string(),
                ));
            }
        }
        Ok(tree)
    }
}
