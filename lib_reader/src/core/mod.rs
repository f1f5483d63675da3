//! # Core Engine Module
//!
//! The reader engine. It aggregates the components that turn a resource and
//! a decoder factory into a pull-based record stream.
//!
//! ## Core Components:
//!
//! - **`opener`**: the background opener thread. It builds the decoder under
//!   a bounded exponential-backoff retry policy, allocates the record buffers,
//!   seeds the first record and hands everything to the reader through a
//!   oneshot channel. That hand-off is the only cross-thread synchronization
//!   in a reader's lifetime.
//!
//! - **`buffer`**: the double buffer and the prefetch algorithm. Two record
//!   slots swap between "prefetch" and "export" roles so the reader always
//!   looks one record ahead of what it hands to the caller.
//!
//! - **`status`**: the public pull results and the internal stream lifecycle.
//!
//! - **`reader`**: the `Reader` itself and its public pull API.

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms, unused_qualifications)]

/// Double buffer and prefetch algorithm.
pub mod buffer;
/// Background opener thread and its retry policy.
pub mod opener;
/// The public `Reader` type.
pub mod reader;
/// Pull results and stream lifecycle states.
pub mod status;

// --- Public API Re-exports ---
pub use opener::RetryPolicy;
pub use reader::Reader;
pub use status::{NextRecord, ReaderStatus, StreamState};
