//! # Ascii Dump Decoder
//!
//! Reads newline-delimited text dumps with one record per line:
//!
//! ```text
//! <sec>[.<usec>]|<body>
//! ```
//!
//! Blank lines are ignored. A line that does not parse is delivered as a
//! `CorruptedMsg` placeholder so the stream keeps going. Lines whose time
//! falls outside the filter interval are skipped silently.
//!
//! The decoder keeps its reader open across end-of-file, so a live resource
//! that is still being appended to is tailed: the next call after an
//! end-of-dump outcome picks up any new lines. On a live resource a line
//! without its trailing newline is held back until the rest of it arrives.

use std::fs::File;
use std::io::{BufRead, BufReader};

use crate::errors::DecoderError;
use crate::filters::{FilterManager, TimeInterval};
use crate::format::{DecodeOutcome, FormatDecoder};
use crate::models::record::{DumpPosition, Record, RecordStatus};
use crate::models::resource::Resource;

const FILE_SCHEME: &str = "file://";

/// # Ascii Dump Decoder
///
/// Generic over any buffered reader; `open` builds one over a file.
pub struct AsciiDumpDecoder<R = BufReader<File>> {
    url: String,
    source: R,
    interval: Option<TimeInterval>,
    resource_accepted: bool,
    // Live dumps may end in a line that is still being written.
    live: bool,
    // Non-blank lines seen so far.
    lines_read: u64,
    // Records handed to the reader, corrupted placeholders included.
    exported: u64,
    skipped_since_export: bool,
    last_time: (u32, u32),
    line: String,
}

impl AsciiDumpDecoder<BufReader<File>> {
    /// Opens the file named by `resource.url`. Suitable as a reader factory.
    pub fn open(resource: &Resource, filters: &FilterManager) -> Result<Self, DecoderError> {
        let path = resource.url.strip_prefix(FILE_SCHEME).unwrap_or(&resource.url);
        let file = File::open(path).map_err(|source| DecoderError::Open {
            url: resource.url.clone(),
            source,
        })?;
        log::debug!("Opened ascii dump {}", resource.url);
        Ok(Self::from_reader(BufReader::new(file), resource, filters))
    }
}

impl<R: BufRead> AsciiDumpDecoder<R> {
    /// Wraps an already open reader.
    pub fn from_reader(source: R, resource: &Resource, filters: &FilterManager) -> Self {
        Self {
            url: resource.url.clone(),
            source,
            interval: filters.interval(),
            resource_accepted: filters.accepts_resource(resource),
            live: resource.is_forever(),
            lines_read: 0,
            exported: 0,
            skipped_since_export: false,
            last_time: (0, 0),
            line: String::new(),
        }
    }

    fn end_of_file(&mut self, record: &mut Record<String>) -> DecodeOutcome {
        record.dump_pos = DumpPosition::End;
        if self.lines_read == 0 {
            record.status = RecordStatus::EmptySource;
            return DecodeOutcome::EmptyDump;
        }
        if self.exported == 0 {
            record.status = RecordStatus::FilteredSource;
            return DecodeOutcome::FilteredDump;
        }
        // A skipped tail means the last exported record was not the true end.
        if self.skipped_since_export {
            record.dump_pos = DumpPosition::Middle;
        }
        record.time_sec = self.last_time.0;
        record.time_usec = self.last_time.1;
        DecodeOutcome::EndOfDump
    }

    fn next_position(&self) -> DumpPosition {
        if self.exported == 0 {
            DumpPosition::Start
        } else {
            DumpPosition::Middle
        }
    }
}

impl<R: BufRead + Send + 'static> FormatDecoder for AsciiDumpDecoder<R> {
    type Payload = String;

    fn populate_record(&mut self, record: &mut Record<String>) -> DecodeOutcome {
        if !self.resource_accepted {
            record.status = RecordStatus::FilteredSource;
            return DecodeOutcome::FilteredDump;
        }

        loop {
            // `line` keeps a partial tail across calls until its newline arrives.
            match self.source.read_line(&mut self.line) {
                Ok(0) if self.line.is_empty() || self.live => return self.end_of_file(record),
                Ok(_) if self.live && !self.line.ends_with('\n') => {
                    return self.end_of_file(record);
                }
                Ok(_) => {}
                Err(e) => {
                    log::error!("Read error in {}: {}", self.url, e);
                    return DecodeOutcome::ReadError;
                }
            }

            let full_line = std::mem::take(&mut self.line);
            let line = full_line.trim();
            if line.is_empty() {
                continue;
            }
            self.lines_read += 1;

            let Some((sec, usec, body)) = parse_line(line) else {
                log::warn!("Corrupted line {} in {}", self.lines_read, self.url);
                record.status = RecordStatus::CorruptedRecord;
                record.dump_pos = self.next_position();
                record.time_sec = self.last_time.0;
                record.time_usec = self.last_time.1;
                self.exported += 1;
                self.skipped_since_export = false;
                return DecodeOutcome::CorruptedMsg;
            };

            if !self.interval.map_or(true, |interval| interval.contains(sec)) {
                self.skipped_since_export = true;
                continue;
            }

            record.status = RecordStatus::Valid;
            record.dump_pos = self.next_position();
            record.time_sec = sec;
            record.time_usec = usec;
            record.set_payload(body.to_string());
            self.exported += 1;
            self.skipped_since_export = false;
            self.last_time = (sec, usec);
            return DecodeOutcome::Ok;
        }
    }
}

/// Splits `<sec>[.<usec>]|<body>`.
fn parse_line(line: &str) -> Option<(u32, u32, &str)> {
    let (time, body) = line.split_once('|')?;
    let (sec, usec) = match time.split_once('.') {
        Some((sec, usec)) => (sec.parse().ok()?, usec.parse().ok()?),
        None => (time.parse().ok()?, 0),
    };
    if usec >= 1_000_000 {
        return None;
    }
    Some((sec, usec, body))
}
