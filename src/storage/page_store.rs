//! Page Store
//!
//! Slot allocation over the segment files of one record type.
//!
//! ## Responsibilities
//! - Find the first free slot in the active segment (skipping full pages)
//! - Maintain page-full flags on allocate/free
//! - Roll over to a new segment when the active one is full
//! - Read/overwrite payloads at stored addresses in any segment
//!
//! Every operation opens the segment file it needs and closes it on return.

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use bytes::Bytes;
use tracing::debug;

use crate::error::{Result, StrataError};

use super::address::Address;
use super::layout::{SegmentLayout, PAGE_FULL, PAGE_OPEN, SLOT_FREE, SLOT_OCCUPIED};
use super::segment::{create_segment, list_segments, next_segment_name, parse_segment_name, segment_name};

/// Slot allocator for one record type
#[derive(Debug)]
pub struct PageStore {
    /// Directory holding the segment files
    dir: PathBuf,

    /// Owning record type
    type_name: String,

    /// Geometry shared by every segment of the type
    layout: SegmentLayout,

    /// File name of the segment receiving new records
    active: String,
}

impl PageStore {
    /// Create the first segment of a new type
    pub fn create(dir: &Path, type_name: &str, layout: SegmentLayout) -> Result<Self> {
        fs::create_dir_all(dir)?;
        let active = segment_name(type_name, 1);
        create_segment(&dir.join(&active), &layout)?;
        debug!(type_name, segment = %active, "created first segment");

        Ok(Self {
            dir: dir.to_path_buf(),
            type_name: type_name.to_string(),
            layout,
            active,
        })
    }

    /// Attach to an existing type whose active segment is `active`
    pub fn open(dir: &Path, type_name: &str, layout: SegmentLayout, active: &str) -> Result<Self> {
        let store = Self {
            dir: dir.to_path_buf(),
            type_name: type_name.to_string(),
            layout,
            active: active.to_string(),
        };
        store.check_segment(active)?;

        let size = fs::metadata(store.segment_path(active))?.len();
        if size != layout.segment_size() {
            return Err(StrataError::Corruption {
                segment: active.to_string(),
                offset: 0,
                reason: format!(
                    "segment is {} bytes, layout expects {}",
                    size,
                    layout.segment_size()
                ),
            });
        }
        Ok(store)
    }

    pub fn layout(&self) -> &SegmentLayout {
        &self.layout
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// File name of the segment receiving new records
    pub fn active_segment(&self) -> &str {
        &self.active
    }

    pub fn segment_path(&self, segment: &str) -> PathBuf {
        self.dir.join(segment)
    }

    // =========================================================================
    // Slot Operations
    // =========================================================================

    /// Store a record in the first free slot, rolling over if needed
    pub fn allocate(&mut self, record: &[u8]) -> Result<Address> {
        self.check_record(record)?;

        if let Some(address) = self.try_allocate(&self.active, record)? {
            return Ok(address);
        }

        let next = next_segment_name(&self.active)?;
        create_segment(&self.segment_path(&next), &self.layout)?;
        debug!(
            type_name = %self.type_name,
            from = %self.active,
            to = %next,
            "segment full, rolled over"
        );
        self.active = next;

        self.try_allocate(&self.active, record)?
            .ok_or_else(|| StrataError::Corruption {
                segment: self.active.clone(),
                offset: 0,
                reason: "fresh segment has no free slot".to_string(),
            })
    }

    /// Release the slot at `address`
    ///
    /// The slot flag goes to free and the owning page's flag to open.
    pub fn free(&self, address: &Address) -> Result<()> {
        let (page, _) = self.locate(address)?;
        let mut file = self.open_segment(&address.segment, true)?;

        let flag = read_byte(&mut file, address.offset)?;
        if flag != SLOT_OCCUPIED {
            return Err(corruption(address, flag, "freeing a slot that is not occupied"));
        }

        write_byte(&mut file, address.offset, SLOT_FREE)?;
        write_byte(&mut file, self.layout.page_offset(page), PAGE_OPEN)?;
        Ok(())
    }

    /// Payload bytes of the record at `address`
    pub fn read(&self, address: &Address) -> Result<Bytes> {
        self.locate(address)?;
        let mut file = self.open_segment(&address.segment, false)?;

        let mut slot = vec![0u8; self.layout.slot_size()];
        file.seek(SeekFrom::Start(address.offset))?;
        file.read_exact(&mut slot)?;

        if slot[0] != SLOT_OCCUPIED {
            return Err(corruption(address, slot[0], "reading a slot that is not occupied"));
        }
        Ok(Bytes::from(slot).slice(1..))
    }

    /// Overwrite the payload at `address` in place (flag untouched)
    pub fn write(&self, address: &Address, record: &[u8]) -> Result<()> {
        self.check_record(record)?;
        self.locate(address)?;
        let mut file = self.open_segment(&address.segment, true)?;

        file.seek(SeekFrom::Start(address.payload_offset()))?;
        file.write_all(record)?;
        Ok(())
    }

    /// Delete every segment file of this type
    pub fn destroy(self) -> Result<usize> {
        let segments = list_segments(&self.dir, &self.type_name)?;
        for path in &segments {
            fs::remove_file(path)?;
        }
        debug!(type_name = %self.type_name, count = segments.len(), "removed segments");
        Ok(segments.len())
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Scan one segment page by page for a free slot
    fn try_allocate(&self, segment: &str, record: &[u8]) -> Result<Option<Address>> {
        let mut file = self.open_segment(segment, true)?;
        let slot_size = self.layout.slot_size();
        let mut slots = vec![0u8; self.layout.slot_area()];

        for page in 0..self.layout.pages_per_segment() {
            let page_offset = self.layout.page_offset(page);
            match read_byte(&mut file, page_offset)? {
                PAGE_FULL => continue,
                PAGE_OPEN => {}
                other => {
                    return Err(StrataError::Corruption {
                        segment: segment.to_string(),
                        offset: page_offset,
                        reason: format!("unknown page flag {:#04x}", other),
                    })
                }
            }

            file.read_exact(&mut slots)?;
            let mut free = Vec::new();
            for (slot, chunk) in slots.chunks_exact(slot_size).enumerate() {
                match chunk[0] {
                    SLOT_OCCUPIED => {}
                    SLOT_FREE => free.push(slot),
                    other => {
                        return Err(StrataError::Corruption {
                            segment: segment.to_string(),
                            offset: self.layout.slot_offset(page, slot),
                            reason: format!("unknown slot flag {:#04x}", other),
                        })
                    }
                }
            }

            let Some(&slot) = free.first() else {
                return Err(StrataError::Corruption {
                    segment: segment.to_string(),
                    offset: page_offset,
                    reason: "page flagged open but has no free slot".to_string(),
                });
            };

            let offset = self.layout.slot_offset(page, slot);
            let mut image = Vec::with_capacity(slot_size);
            image.push(SLOT_OCCUPIED);
            image.extend_from_slice(record);
            file.seek(SeekFrom::Start(offset))?;
            file.write_all(&image)?;

            if free.len() == 1 {
                write_byte(&mut file, page_offset, PAGE_FULL)?;
            }

            return Ok(Some(Address::new(segment, offset)));
        }

        Ok(None)
    }

    fn locate(&self, address: &Address) -> Result<(usize, usize)> {
        self.check_segment(&address.segment)?;
        self.layout.locate_slot(address.offset)
    }

    fn check_segment(&self, segment: &str) -> Result<()> {
        match parse_segment_name(segment) {
            Some((owner, _)) if owner == self.type_name => Ok(()),
            _ => Err(StrataError::InvalidAddress(format!(
                "segment '{}' does not belong to type '{}'",
                segment, self.type_name
            ))),
        }
    }

    fn check_record(&self, record: &[u8]) -> Result<()> {
        if record.len() != self.layout.record_width() {
            return Err(StrataError::InvalidField(format!(
                "record is {} bytes, slots hold {}",
                record.len(),
                self.layout.record_width()
            )));
        }
        Ok(())
    }

    fn open_segment(&self, segment: &str, writable: bool) -> Result<File> {
        Ok(OpenOptions::new()
            .read(true)
            .write(writable)
            .open(self.segment_path(segment))?)
    }
}

fn read_byte(file: &mut File, offset: u64) -> Result<u8> {
    let mut byte = [0u8; 1];
    file.seek(SeekFrom::Start(offset))?;
    file.read_exact(&mut byte)?;
    Ok(byte[0])
}

fn write_byte(file: &mut File, offset: u64, value: u8) -> Result<()> {
    file.seek(SeekFrom::Start(offset))?;
    file.write_all(&[value])?;
    Ok(())
}

fn corruption(address: &Address, flag: u8, reason: &str) -> StrataError {
    StrataError::Corruption {
        segment: address.segment.clone(),
        offset: address.offset,
        reason: format!("{} (flag {:#04x})", reason, flag),
    }
}
