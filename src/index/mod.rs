//! Index Module
//!
//! In-memory B+ tree primary index.
//!
//! ## Responsibilities
//! - Ordered insert/delete/lookup with node splitting, fusion, and borrowing
//! - Doubly linked leaf chain for ordered full scans
//! - Snapshot of the key → address set at process boundaries
//!
//! ## Structure
//! ```text
//!                 ┌─────────┐
//!                 │  [ 5 ]  │          internal: routing keys only
//!                 └──┬───┬──┘
//!          ┌─────────┘   └─────────┐
//!     ┌────▼────┐             ┌────▼────┐
//!     │ [1 2 3] │ ◄─────────► │ [5 6 7] │   leaves: keys + addresses
//!     └─────────┘  leaf chain └─────────┘
//! ```
//!
//! Nodes live in an arena owned by the tree; links are `NodeId`s.

mod key;
pub mod node;
mod snapshot;
mod tree;

pub use key::{IndexKey, KeyKind};
pub use node::{InternalNode, LeafNode, Node, NodeArena, NodeId};
pub use snapshot::IndexSnapshot;
pub use tree::{BPlusTree, LeafChainIter, TreeStats};
