//! # Record
//!
//! The decoded-record container. A reader allocates exactly two of these
//! and reuses them for the whole life of the stream: resource metadata is
//! copied in once by `prepopulate`, and only the body (status, position,
//! timestamps, payload) changes from one decode to the next.

use crate::models::resource::{RecordType, Resource};

/// Size bound of the project and collector name fields, terminator included.
/// Names are stored with at most `NAME_LEN - 1` bytes.
pub const NAME_LEN: usize = 32;

/// Per-record status set by the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordStatus {
    /// A well-formed record.
    #[default]
    Valid,
    /// The whole source was filtered out.
    FilteredSource,
    /// The source contained no records.
    EmptySource,
    /// The source could not be opened or is corrupted as a whole.
    CorruptedSource,
    /// This single record could not be decoded.
    CorruptedRecord,
    /// This single record uses an unsupported message type.
    UnsupportedRecord,
    /// The record lies outside the requested time interval.
    OutsideTimeInterval,
}

/// Where a record sits inside its dump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DumpPosition {
    #[default]
    Start,
    Middle,
    End,
}

/// # Record
///
/// A reusable record whose payload type `P` is defined by the decoder that
/// fills it.
#[derive(Debug)]
pub struct Record<P> {
    /// Status of the most recent decode into this record.
    pub status: RecordStatus,
    /// Position of this record within its dump.
    pub dump_pos: DumpPosition,
    /// Record timestamp, seconds part.
    pub time_sec: u32,
    /// Record timestamp, microseconds part.
    pub time_usec: u32,
    project_name: String,
    collector_name: String,
    record_type: RecordType,
    dump_time_sec: u32,
    payload: Option<P>,
}

impl<P> Default for Record<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> Record<P> {
    /// Creates an empty record with no metadata.
    pub fn new() -> Self {
        Self {
            status: RecordStatus::Valid,
            dump_pos: DumpPosition::Start,
            time_sec: 0,
            time_usec: 0,
            project_name: String::new(),
            collector_name: String::new(),
            record_type: RecordType::Updates,
            dump_time_sec: 0,
            payload: None,
        }
    }

    /// Copies resource-level metadata into the record.
    pub fn prepopulate(&mut self, resource: &Resource) {
        self.project_name = truncate_name(&resource.project);
        self.collector_name = truncate_name(&resource.collector);
        self.record_type = resource.record_type;
        self.dump_time_sec = resource.initial_time;
    }

    /// Resets the record body for reuse. Metadata is left untouched.
    pub fn clear(&mut self) {
        self.status = RecordStatus::Valid;
        self.dump_pos = DumpPosition::Start;
        self.time_sec = 0;
        self.time_usec = 0;
        self.payload = None;
    }

    pub fn project(&self) -> &str {
        &self.project_name
    }

    pub fn collector(&self) -> &str {
        &self.collector_name
    }

    pub fn record_type(&self) -> RecordType {
        self.record_type
    }

    /// Nominal dump time of the resource this record came from.
    pub fn dump_time(&self) -> u32 {
        self.dump_time_sec
    }

    pub fn payload(&self) -> Option<&P> {
        self.payload.as_ref()
    }

    pub fn set_payload(&mut self, payload: P) {
        self.payload = Some(payload);
    }

    pub fn take_payload(&mut self) -> Option<P> {
        self.payload.take()
    }
}

/// Truncates a name to `NAME_LEN - 1` bytes without splitting a character.
fn truncate_name(name: &str) -> String {
    let limit = NAME_LEN - 1;
    if name.len() <= limit {
        return name.to_string();
    }
    let mut end = limit;
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    name[..end].to_string()
}
