//! # lib_reader
//!
//! Asynchronous, double-buffered record reader for routing dump resources
//! (files, URLs or live feeds). A `Reader` opens its resource on a background
//! thread, decodes records through a pluggable `FormatDecoder` and hands them
//! out one at a time through a pull API that distinguishes "nothing yet",
//! "stream ended" and "hard failure".
//!
//! Optional modules are gated by cargo features (`configs`, `loggers`, `full`).

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms, unused_qualifications)]

/// The reader engine: opener thread, double buffer and pull API.
pub mod core;
/// Error types shared by the reader and its decoders.
pub mod errors;
/// Filter manager handed through to decoders.
pub mod filters;
/// Decoder collaborator interface and the ascii reference decoder.
pub mod format;
/// Resource and record data model.
pub mod models;
/// General purpose helpers (string set).
pub mod utils;

/// Reader configuration loaded from JSON files and the environment.
#[cfg(feature = "configs")]
pub mod configs;
/// Console and file logger setup for binaries.
#[cfg(feature = "loggers")]
pub mod loggers;

// --- Public API Re-exports ---
pub use crate::core::{NextRecord, Reader, ReaderStatus, RetryPolicy};
pub use errors::{DecoderError, ReaderError};
pub use filters::FilterManager;
pub use format::{AsciiDumpDecoder, DecodeOutcome, FormatDecoder};
pub use models::record::{DumpPosition, Record, RecordStatus};
pub use models::resource::{RecordType, Resource, ResourceDuration};
pub use utils::str_set::StrSet;
