//! # Error Types
//!
//! `DecoderError` is produced by format decoders (opening a resource or
//! allocating records). `ReaderError` is what the reader surfaces to its
//! caller. Per-record decode problems are never errors: they travel as
//! `DecodeOutcome` values and are absorbed by the prefetch step.

use thiserror::Error;

/// Failures reported by a `FormatDecoder` or its factory.
#[derive(Debug, Error)]
pub enum DecoderError {
    #[error("failed to open {url}: {source}")]
    Open {
        url: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported resource: {0}")]
    Unsupported(String),

    #[error("could not allocate record: {0}")]
    RecordAlloc(String),

    #[error("{0}")]
    Other(String),
}

/// Failures surfaced by the `Reader`.
#[derive(Debug, Error)]
pub enum ReaderError {
    /// The opener gave up after exhausting its retry policy (or could not
    /// allocate the record buffers).
    #[error("could not open dump {url}")]
    CantOpenDump { url: String },

    /// The decoder hit an unrecoverable read error after a successful open.
    #[error("read error while decoding {url}")]
    ReadFailed { url: String },

    /// The opener thread could not be started.
    #[error("failed to spawn opener thread: {0}")]
    Spawn(#[from] std::io::Error),
}
