//! Protocol Module
//!
//! Line-oriented command surface driven by script files.
//!
//! ## Command Grammar
//! ```text
//! CREATE TYPE   <name> <field_count> <pk_ordinal> <field> <type> ...
//! DELETE TYPE   <name>
//! LIST TYPE
//! CREATE RECORD <type> <value> ...
//! DELETE RECORD <type> <pk>
//! UPDATE RECORD <type> <pk> <value> ...
//! SEARCH RECORD <type> <pk>
//! LIST RECORD   <type>
//! FILTER RECORD <type> <field><op><value>      op ∈ { <, >, = }
//! ```
//!
//! ## Responses
//! Every command yields `success` or `failure`. SEARCH, LIST and FILTER also
//! produce output lines: one record per line, field values separated by a
//! single space, in ascending primary key order.

mod command;
mod predicate;
mod response;

pub use command::{Command, CommandType};
pub use predicate::{CompareOp, Predicate};
pub use response::{Response, Status};
