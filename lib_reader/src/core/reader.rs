//! # Reader
//!
//! The public face of the engine. A `Reader` is created without blocking,
//! then pulled one record at a time with `next_record`.
//!
//! ## States:
//! - **AwaitingOpen**: the opener thread is still working. The first call
//!   that needs the stream blocks on the oneshot receiver, exactly once.
//! - **Open**: the stream is owned by the caller's thread; no further
//!   synchronization happens for the rest of the reader's life.
//! - **CantOpen**: the opener gave up. Pulls return `EndOfStream` with a
//!   synthesized record flagged `CorruptedSource`.
//!
//! `open_wait` blocks the calling thread, so a reader must not be pulled
//! from inside an async runtime worker; wrap it in `spawn_blocking` there.

use std::sync::mpsc;
use std::sync::Arc;
use std::thread::JoinHandle;

use tokio::sync::oneshot;

use crate::core::buffer::RecordStream;
use crate::core::opener::{self, OpenOutcome, RetryPolicy};
use crate::core::status::NextRecord;
use crate::errors::{DecoderError, ReaderError};
use crate::filters::FilterManager;
use crate::format::FormatDecoder;
use crate::models::record::{Record, RecordStatus};
use crate::models::resource::Resource;

enum OpenState<D: FormatDecoder> {
    AwaitingOpen(oneshot::Receiver<OpenOutcome<D>>),
    Open(Box<RecordStream<D>>),
    CantOpen,
}

/// # Reader
///
/// Double-buffered, background-opened record reader for one resource.
pub struct Reader<D: FormatDecoder> {
    resource: Arc<Resource>,
    state: OpenState<D>,
    // Handed out by every pull once the open has failed.
    failure: Record<D::Payload>,
    opener: Option<JoinHandle<()>>,
    cancel_tx: Option<mpsc::Sender<()>>,
}

impl<D: FormatDecoder> Reader<D> {
    /// Creates a reader and starts opening `resource` in the background
    /// using the default retry policy.
    ///
    /// # Arguments
    /// * `resource` - The dump to read.
    /// * `filters` - Passed through to `factory` untouched.
    /// * `factory` - Builds the decoder; called on the opener thread, once
    ///   per attempt.
    ///
    /// # Errors
    /// Returns `ReaderError::Spawn` if the opener thread cannot be started.
    pub fn new<F>(
        resource: Arc<Resource>,
        filters: Arc<FilterManager>,
        factory: F,
    ) -> Result<Self, ReaderError>
    where
        F: FnMut(&Resource, &FilterManager) -> Result<D, DecoderError> + Send + 'static,
    {
        Self::with_policy(resource, filters, RetryPolicy::default(), factory)
    }

    /// Same as `new`, with an explicit retry policy.
    pub fn with_policy<F>(
        resource: Arc<Resource>,
        filters: Arc<FilterManager>,
        policy: RetryPolicy,
        factory: F,
    ) -> Result<Self, ReaderError>
    where
        F: FnMut(&Resource, &FilterManager) -> Result<D, DecoderError> + Send + 'static,
    {
        let handle = opener::spawn(Arc::clone(&resource), filters, policy, factory)?;
        log::debug!("Reader created for {}", resource.url);
        let failure = failure_record(&resource);
        Ok(Self {
            resource,
            state: OpenState::AwaitingOpen(handle.ready_rx),
            failure,
            opener: Some(handle.thread),
            cancel_tx: Some(handle.cancel_tx),
        })
    }

    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    /// Blocks until the opener has finished.
    ///
    /// Only the first call waits; afterwards the outcome is cached.
    ///
    /// # Errors
    /// `ReaderError::CantOpenDump` if the dump could not be opened.
    pub fn open_wait(&mut self) -> Result<(), ReaderError> {
        if self.resolve().is_ok() {
            Ok(())
        } else {
            Err(self.cant_open())
        }
    }

    /// Timestamp of the next record, `None` until one has been prefetched.
    ///
    /// # Errors
    /// `ReaderError::CantOpenDump` if the dump could not be opened.
    pub fn next_time(&mut self) -> Result<Option<u32>, ReaderError> {
        let next_time = self.resolve().ok().map(|stream| stream.next_time());
        next_time.ok_or_else(|| self.cant_open())
    }

    /// # Next Record
    ///
    /// Advances the stream by one record.
    ///
    /// ## Returns
    /// - `Ok(record)`: the next record. Records that failed to decode are
    ///   still delivered, flagged through `record.status`.
    /// - `Again`: live resource with nothing ready yet.
    /// - `EndOfStream(None)`: the dump is exhausted (or failed earlier).
    /// - `EndOfStream(Some(record))`: the dump could not be opened; the
    ///   record carries `RecordStatus::CorruptedSource`.
    /// - `Error(e)`: unrecoverable read failure.
    pub fn next_record(&mut self) -> NextRecord<'_, D::Payload> {
        match self.resolve() {
            Ok(stream) => stream.advance(),
            Err(record) => NextRecord::EndOfStream(Some(record)),
        }
    }

    /// Waits for the opener (first call only) and returns the open stream,
    /// or the synthesized failure record.
    fn resolve(&mut self) -> Result<&mut RecordStream<D>, &Record<D::Payload>> {
        self.wait_for_opener();
        match &mut self.state {
            OpenState::Open(stream) => Ok(&mut **stream),
            OpenState::AwaitingOpen(_) | OpenState::CantOpen => Err(&self.failure),
        }
    }

    /// Receives the opener's outcome if it has not been received yet. The
    /// state is never `AwaitingOpen` afterwards.
    fn wait_for_opener(&mut self) {
        if !matches!(self.state, OpenState::AwaitingOpen(_)) {
            return;
        }
        let OpenState::AwaitingOpen(ready_rx) =
            std::mem::replace(&mut self.state, OpenState::CantOpen)
        else {
            return;
        };
        match ready_rx.blocking_recv() {
            Ok(OpenOutcome::Opened(stream)) => {
                log::debug!("Dump {} ready", self.resource.url);
                self.state = OpenState::Open(stream);
            }
            Ok(OpenOutcome::CantOpen) => {}
            Err(_) => {
                log::error!("Opener for {} exited without reporting", self.resource.url);
            }
        }
    }

    fn cant_open(&self) -> ReaderError {
        ReaderError::CantOpenDump {
            url: self.resource.url.clone(),
        }
    }
}

fn failure_record<P>(resource: &Resource) -> Record<P> {
    let mut record = Record::new();
    record.prepopulate(resource);
    record.status = RecordStatus::CorruptedSource;
    record
}

impl<D: FormatDecoder> Drop for Reader<D> {
    /// Cancels any pending backoff and joins the opener thread before the
    /// buffers and decoder are released.
    fn drop(&mut self) {
        drop(self.cancel_tx.take());
        if let Some(thread) = self.opener.take() {
            if thread.join().is_err() {
                log::error!("Opener thread for {} panicked", self.resource.url);
            }
        }
    }
}
