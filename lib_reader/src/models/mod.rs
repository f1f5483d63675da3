//! # Data Model
//!
//! - **`resource`**: what the reader opens (URL, duration class, metadata).
//! - **`record`**: the reusable decoded-record container handed to consumers.

/// Resources, their duration class and record type.
pub mod resource;
/// The reusable record container and its status tags.
pub mod record;

pub use record::{DumpPosition, Record, RecordStatus, NAME_LEN};
pub use resource::{RecordType, Resource, ResourceDuration};
