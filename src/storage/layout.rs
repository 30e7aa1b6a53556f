//! Segment geometry
//!
//! Pure arithmetic over the fixed page/slot layout of one record type.

use crate::error::{Result, StrataError};

/// Page flag: at least one slot is free
pub const PAGE_OPEN: u8 = b'0';

/// Page flag: every slot is occupied
pub const PAGE_FULL: u8 = b'1';

/// Slot flag: slot is free
pub const SLOT_FREE: u8 = b'0';

/// Slot flag: slot holds a record
pub const SLOT_OCCUPIED: u8 = b'1';

/// Filler for blank payloads and page padding
pub const PAD: u8 = b' ';

/// Page/slot geometry for one record type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentLayout {
    page_size: usize,
    pages_per_segment: usize,
    field_count: usize,
    field_width: usize,
    slots_per_page: usize,
}

impl SegmentLayout {
    /// Compute the layout, failing if no slot fits in a page
    pub fn new(
        page_size: usize,
        pages_per_segment: usize,
        field_count: usize,
        field_width: usize,
    ) -> Result<Self> {
        if field_count == 0 || field_width == 0 {
            return Err(StrataError::Config(format!(
                "records need at least one byte of payload (fields={}, width={})",
                field_count, field_width
            )));
        }
        if pages_per_segment == 0 {
            return Err(StrataError::Config(
                "pages_per_segment must be positive".into(),
            ));
        }

        let slot_size = field_count * field_width + 1;
        let slots_per_page = page_size.saturating_sub(1) / slot_size;
        if slots_per_page == 0 {
            return Err(StrataError::Config(format!(
                "a {}-byte page cannot hold one {}-byte slot",
                page_size, slot_size
            )));
        }

        Ok(Self {
            page_size,
            pages_per_segment,
            field_count,
            field_width,
            slots_per_page,
        })
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn pages_per_segment(&self) -> usize {
        self.pages_per_segment
    }

    pub fn field_count(&self) -> usize {
        self.field_count
    }

    pub fn field_width(&self) -> usize {
        self.field_width
    }

    /// `floor((page_size - 1) / slot_size)`
    pub fn slots_per_page(&self) -> usize {
        self.slots_per_page
    }

    /// Payload bytes per record
    pub fn record_width(&self) -> usize {
        self.field_count * self.field_width
    }

    /// Flag byte plus payload
    pub fn slot_size(&self) -> usize {
        self.record_width() + 1
    }

    /// Bytes used by slots in one page (excludes the page flag and padding)
    pub fn slot_area(&self) -> usize {
        self.slots_per_page * self.slot_size()
    }

    /// Total bytes of a segment file
    pub fn segment_size(&self) -> u64 {
        (self.page_size * self.pages_per_segment) as u64
    }

    /// Records one segment can hold
    pub fn capacity(&self) -> usize {
        self.slots_per_page * self.pages_per_segment
    }

    /// Offset of a page's flag byte
    pub fn page_offset(&self, page: usize) -> u64 {
        (page * self.page_size) as u64
    }

    /// Offset of a slot's flag byte
    pub fn slot_offset(&self, page: usize, slot: usize) -> u64 {
        self.page_offset(page) + 1 + (slot * self.slot_size()) as u64
    }

    /// Map a slot flag offset back to `(page, slot)`
    pub fn locate_slot(&self, offset: u64) -> Result<(usize, usize)> {
        let offset = offset as usize;
        let page = offset / self.page_size;
        let within = offset % self.page_size;

        if page >= self.pages_per_segment {
            return Err(StrataError::InvalidAddress(format!(
                "offset {} lies past the last page",
                offset
            )));
        }
        if within == 0 || (within - 1) % self.slot_size() != 0 {
            return Err(StrataError::InvalidAddress(format!(
                "offset {} is not on a slot boundary",
                offset
            )));
        }

        let slot = (within - 1) / self.slot_size();
        if slot >= self.slots_per_page {
            return Err(StrataError::InvalidAddress(format!(
                "offset {} lies in page padding",
                offset
            )));
        }
        Ok((page, slot))
    }

    /// One freshly initialized page: open flag, free slots, padding
    pub fn blank_page(&self) -> Vec<u8> {
        let mut page = Vec::with_capacity(self.page_size);
        page.push(PAGE_OPEN);
        for _ in 0..self.slots_per_page {
            page.push(SLOT_FREE);
            page.resize(page.len() + self.record_width(), PAD);
        }
        page.resize(self.page_size, PAD);
        page
    }
}
