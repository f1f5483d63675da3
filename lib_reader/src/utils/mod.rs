//! # Utilities Module
//!
//! General-purpose helpers shared across the crate.
//!
//! - **`str_set`**: an owned string hash set used by the filter manager.

/// Owned string set.
pub mod str_set;
