//! # Status Types
//!
//! Two separate notions live here. `StreamState` is the persistent lifecycle
//! of an opened stream. `NextRecord` / `ReaderStatus` is what one pull hands
//! back to the caller. Decoder-level outcomes (`DecodeOutcome`) are local to
//! a single prefetch and never appear in either.

use std::fmt;

use crate::errors::ReaderError;
use crate::models::record::Record;

/// Lifecycle of an opened stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// More records may follow; prefetching continues.
    Active,
    /// A finite dump reported its end (or was filtered, empty or corrupted).
    Exhausted,
    /// The decoder hit an unrecoverable read error.
    Failed,
}

/// The four public pull statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderStatus {
    /// A record is ready.
    Ok,
    /// Live source with nothing ready yet; poll again later.
    Again,
    /// The dump is exhausted or could not be opened.
    EndOfStream,
    /// Unrecoverable decode failure after a successful open.
    Error,
}

impl fmt::Display for ReaderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReaderStatus::Ok => "ok",
            ReaderStatus::Again => "again",
            ReaderStatus::EndOfStream => "end-of-stream",
            ReaderStatus::Error => "error",
        };
        f.write_str(name)
    }
}

/// # Next Record
///
/// Result of one pull. Borrowed records stay valid until the next call on
/// the reader, which reclaims the slot.
#[derive(Debug)]
pub enum NextRecord<'a, P> {
    /// The next record of the stream.
    Ok(&'a Record<P>),
    /// Live source, nothing available right now.
    Again,
    /// The stream has ended. When the dump could not be opened at all, this
    /// carries a record whose status is `CorruptedSource`.
    EndOfStream(Option<&'a Record<P>>),
    /// The stream failed while decoding.
    Error(ReaderError),
}

impl<'a, P> NextRecord<'a, P> {
    pub fn status(&self) -> ReaderStatus {
        match self {
            NextRecord::Ok(_) => ReaderStatus::Ok,
            NextRecord::Again => ReaderStatus::Again,
            NextRecord::EndOfStream(_) => ReaderStatus::EndOfStream,
            NextRecord::Error(_) => ReaderStatus::Error,
        }
    }

    /// The carried record, if any.
    pub fn record(&self) -> Option<&'a Record<P>> {
        match self {
            NextRecord::Ok(record) => Some(*record),
            NextRecord::EndOfStream(record) => *record,
            NextRecord::Again | NextRecord::Error(_) => None,
        }
    }
}
