//! # Strata
//!
//! A single-process typed record store with:
//! - A B+ tree primary-key index per record type, with a doubly linked leaf chain
//! - A paged, fixed-slot record heap split across segment files
//! - A flat-text type catalog and an append-only command outcome log
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   Script Session                             │
//! │        (line → Command → Engine → output + audit row)        │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                      Engine                                  │
//! │          (type registry, record CRUD, filters)               │
//! └──────┬──────────────────────┬──────────────────────┬────────┘
//!        │                      │                      │
//!        ▼                      ▼                      ▼
//! ┌─────────────┐        ┌─────────────┐        ┌─────────────┐
//! │   Catalog   │        │  B+ Tree    │        │ Page Store  │
//! │ (flat CSV)  │        │ (per type,  │        │ (segments,  │
//! │             │        │  snapshots) │        │  slots)     │
//! └─────────────┘        └─────────────┘        └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod index;
pub mod storage;
pub mod catalog;
pub mod protocol;
pub mod audit;
pub mod engine;
pub mod session;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{Result, StrataError};
pub use config::{Config, FieldOverflowPolicy};
pub use engine::Engine;
pub use session::{Session, SessionSummary};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of Strata
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
