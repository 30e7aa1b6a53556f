//! Storage Module
//!
//! Paged, fixed-slot record heap behind the index.
//!
//! ## Responsibilities
//! - Fixed-width record encoding
//! - Slot allocation, free-slot reuse, page-full tracking
//! - Segment rollover when the active segment fills
//!
//! ## Segment File Format
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ Page 0 (PAGESIZE bytes)                                      │
//! │ ┌──────┬──────┬─────────────┬──────┬─────────────┬─────────┐ │
//! │ │Full  │Used  │ Payload     │Used  │ Payload     │ Padding │ │
//! │ │'0'/'1│'0'/'1│ fields×width│'0'/'1│ fields×width│ ' ' ... │ │
//! │ └──────┴──────┴─────────────┴──────┴─────────────┴─────────┘ │
//! ├──────────────────────────────────────────────────────────────┤
//! │ Page 1 ... Page PAGES_PER_SEGMENT-1                          │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//! `slots_per_page = floor((PAGESIZE - 1) / (fields × width + 1))`

mod address;
pub mod codec;
mod layout;
mod page_store;
pub mod segment;

pub use address::Address;
pub use codec::RecordCodec;
pub use layout::{SegmentLayout, PAD, PAGE_FULL, PAGE_OPEN, SLOT_FREE, SLOT_OCCUPIED};
pub use page_store::PageStore;
