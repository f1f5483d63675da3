//! # Format Decoders
//!
//! The reader drives decoders through the `FormatDecoder` trait: one call to
//! `populate_record` decodes (at most) one record into a reused container and
//! reports a `DecodeOutcome`. Decoders are built on the reader's opener
//! thread by a factory closure of the shape
//! `FnMut(&Resource, &FilterManager) -> Result<D, DecoderError>`, which lets
//! the opener retry construction without knowing anything about the format.
//!
//! ## Contained Modules:
//! - **`ascii`**: a line-oriented text dump decoder used by the CLI and tests.

use crate::errors::DecoderError;
use crate::models::record::Record;

/// Decoder for newline-delimited text dumps.
pub mod ascii;

pub use ascii::AsciiDumpDecoder;

/// Outcome of a single `populate_record` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeOutcome {
    /// A record was decoded.
    Ok,
    /// Unrecoverable I/O failure.
    ReadError,
    /// The dump has no more records.
    EndOfDump,
    /// Everything left in the dump was filtered out.
    FilteredDump,
    /// The dump contained no records at all.
    EmptyDump,
    /// The dump as a whole is corrupted.
    CorruptedDump,
    /// This one message is corrupted; the record carries a placeholder.
    CorruptedMsg,
    /// This one message is unsupported; the record carries a placeholder.
    UnsupportedMsg,
}

impl DecodeOutcome {
    /// Outcomes that end a finite dump but only mean "nothing right now"
    /// for a live one.
    pub fn is_dump_terminal(self) -> bool {
        matches!(
            self,
            DecodeOutcome::EndOfDump
                | DecodeOutcome::FilteredDump
                | DecodeOutcome::EmptyDump
                | DecodeOutcome::CorruptedDump
        )
    }

    /// Outcomes for a single bad message that must not stop the stream.
    pub fn is_message_error(self) -> bool {
        matches!(self, DecodeOutcome::CorruptedMsg | DecodeOutcome::UnsupportedMsg)
    }
}

/// # Format Decoder
///
/// A decoder owns whatever open handle it reads from and is dropped when the
/// reader is dropped.
pub trait FormatDecoder: Send + 'static {
    /// Format specific data attached to each record.
    type Payload: Send + 'static;

    /// Allocates a record container bound to this decoder.
    fn create_record(&self) -> Result<Record<Self::Payload>, DecoderError> {
        Ok(Record::new())
    }

    /// Decodes the next record into `record`.
    ///
    /// The record has been cleared by the caller. Its metadata is already set
    /// and must not be changed.
    fn populate_record(&mut self, record: &mut Record<Self::Payload>) -> DecodeOutcome;
}
