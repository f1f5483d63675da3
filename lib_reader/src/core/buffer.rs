//! # Double Buffer & Prefetch
//!
//! Two record slots alternate between the "prefetch" role (the next record,
//! not yet handed out) and the "export" role (the record the caller is
//! currently looking at). Each pull releases the export slot, flips the
//! roles and decodes one record ahead into the new prefetch slot. Looking
//! one record ahead is what lets the reader stamp the end-of-dump boundary
//! onto the last record before the caller ever sees it.

use std::sync::Arc;

use crate::core::status::{NextRecord, StreamState};
use crate::errors::{DecoderError, ReaderError};
use crate::format::{DecodeOutcome, FormatDecoder};
use crate::models::record::{DumpPosition, Record};
use crate::models::resource::Resource;

/// One record container plus its "holds an unconsumed record" flag.
#[derive(Debug)]
pub(crate) struct Slot<P> {
    pub(crate) record: Record<P>,
    pub(crate) filled: bool,
}

/// # Double Buffer
///
/// `prefetch_idx` names the prefetch slot; the export slot is `1 - prefetch_idx`.
#[derive(Debug)]
pub(crate) struct DoubleBuffer<P> {
    slots: [Slot<P>; 2],
    prefetch_idx: usize,
}

impl<P> DoubleBuffer<P> {
    /// Allocates both slots from the decoder and stamps resource metadata.
    pub(crate) fn allocate<D>(decoder: &D, resource: &Resource) -> Result<Self, DecoderError>
    where
        D: FormatDecoder<Payload = P>,
    {
        let make_slot = || -> Result<Slot<P>, DecoderError> {
            let mut record = decoder.create_record()?;
            record.prepopulate(resource);
            Ok(Slot { record, filled: false })
        };
        let first = make_slot()?;
        let second = make_slot()?;
        Ok(Self {
            slots: [first, second],
            prefetch_idx: 0,
        })
    }

    pub(crate) fn prefetch_index(&self) -> usize {
        self.prefetch_idx
    }

    pub(crate) fn export_index(&self) -> usize {
        1 - self.prefetch_index()
    }

    /// Swaps the prefetch and export roles.
    pub(crate) fn flip(&mut self) {
        self.prefetch_idx = self.export_index();
    }

    pub(crate) fn export(&self) -> &Slot<P> {
        &self.slots[self.export_index()]
    }

    /// Mutable access to both slots at once, as `(prefetch, export)`.
    pub(crate) fn split_mut(&mut self) -> (&mut Slot<P>, &mut Slot<P>) {
        let prefetch_idx = self.prefetch_idx;
        let (left, right) = self.slots.split_at_mut(1);
        if prefetch_idx == 0 {
            (&mut left[0], &mut right[0])
        } else {
            (&mut right[0], &mut left[0])
        }
    }
}

/// # Record Stream
///
/// Everything a reader owns once its decoder is open. Built on the opener
/// thread, then moved to the caller's thread in one piece.
pub(crate) struct RecordStream<D: FormatDecoder> {
    resource: Arc<Resource>,
    decoder: D,
    buffer: DoubleBuffer<D::Payload>,
    state: StreamState,
    next_time: Option<u32>,
}

impl<D: FormatDecoder> RecordStream<D> {
    pub(crate) fn new(resource: Arc<Resource>, decoder: D, buffer: DoubleBuffer<D::Payload>) -> Self {
        Self {
            resource,
            decoder,
            buffer,
            state: StreamState::Active,
            next_time: None,
        }
    }

    pub(crate) fn state(&self) -> StreamState {
        self.state
    }

    /// Timestamp of the record waiting in the prefetch slot.
    pub(crate) fn next_time(&self) -> Option<u32> {
        self.next_time
    }

    /// Fills the prefetch slot with the next decoded record.
    ///
    /// Only an unrecoverable read error is returned as `Err`; every other
    /// decoder outcome is absorbed here and reflected in `state` and the
    /// slot's `filled` flag.
    pub(crate) fn prefetch(&mut self) -> Result<(), ReaderError> {
        debug_assert_eq!(self.state, StreamState::Active);
        let forever = self.resource.is_forever();
        let (prefetch, export) = self.buffer.split_mut();
        debug_assert!(!prefetch.filled);

        prefetch.record.clear();
        let outcome = self.decoder.populate_record(&mut prefetch.record);
        log::trace!("Prefetch from {} returned {:?}", self.resource.url, outcome);

        if outcome == DecodeOutcome::ReadError {
            self.state = StreamState::Failed;
            return Err(ReaderError::ReadFailed {
                url: self.resource.url.clone(),
            });
        }

        // A live source that has run dry is only quiet, not finished.
        if forever && outcome.is_dump_terminal() {
            return Ok(());
        }

        // A single bad message still yields a (flagged) record.
        if outcome.is_message_error() {
            prefetch.filled = true;
            return Ok(());
        }

        self.next_time = Some(prefetch.record.time_sec);

        // The decoder only stamps the record it is touching, so carry a true
        // end boundary back onto the record about to be exported.
        if outcome == DecodeOutcome::EndOfDump
            && prefetch.record.dump_pos == DumpPosition::End
            && export.filled
        {
            export.record.dump_pos = DumpPosition::End;
        }

        // An end-of-dump signal carries no record.
        if outcome != DecodeOutcome::EndOfDump {
            prefetch.filled = true;
        }

        if outcome.is_dump_terminal() {
            log::debug!("Dump {} exhausted ({:?})", self.resource.url, outcome);
            self.state = StreamState::Exhausted;
        }
        Ok(())
    }

    /// One pull: release the export slot, flip, prefetch ahead, export.
    pub(crate) fn advance(&mut self) -> NextRecord<'_, D::Payload> {
        let (_, export) = self.buffer.split_mut();
        export.filled = false;
        self.buffer.flip();

        if self.state() == StreamState::Active {
            if let Err(e) = self.prefetch() {
                log::error!("Prefetch failed: {}", e);
                return NextRecord::Error(e);
            }
        }

        let export = self.buffer.export();
        if export.filled {
            NextRecord::Ok(&export.record)
        } else if self.resource.is_forever() && self.state == StreamState::Active {
            NextRecord::Again
        } else {
            NextRecord::EndOfStream(None)
        }
    }
}
