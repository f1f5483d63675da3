//! # Opener Thread
//!
//! Opening a dump can be slow (remote URLs) and can fail transiently, so the
//! reader does it on a dedicated background thread and returns to its caller
//! immediately.
//!
//! ## Workflow:
//! 1.  **Open**: call the decoder factory up to `max_attempts` times, waiting
//!     `initial_backoff`, then twice that, and so on between attempts. No wait
//!     follows the final failed attempt.
//! 2.  **Allocate**: create the two record slots and stamp resource metadata.
//! 3.  **Seed**: prefetch the first record so the first pull sees a
//!     consistent buffer.
//! 4.  **Hand off**: send the finished stream (or `CantOpen`) through the
//!     oneshot channel. After this send the thread touches nothing shared
//!     and exits; ownership of the stream now belongs to the caller.
//!
//! Dropping the reader disconnects the cancel channel, which cuts any pending
//! backoff wait short. A factory call that is already running is not
//! interrupted.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tokio::sync::oneshot;

use crate::core::buffer::{DoubleBuffer, RecordStream};
use crate::errors::DecoderError;
use crate::filters::FilterManager;
use crate::format::FormatDecoder;
use crate::models::resource::Resource;

/// Attempts made to open a dump before giving up.
pub const DUMP_OPEN_MAX_RETRIES: u32 = 5;
/// Wait after the first failed attempt; doubled after each further failure.
pub const DUMP_OPEN_MIN_RETRY_WAIT: Duration = Duration::from_secs(10);

/// # Retry Policy
///
/// Bounded retries with exponential backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of open attempts (at least one is always made).
    pub max_attempts: u32,
    /// Wait after the first failed attempt.
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DUMP_OPEN_MAX_RETRIES,
            initial_backoff: DUMP_OPEN_MIN_RETRY_WAIT,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, initial_backoff: Duration) -> Self {
        Self {
            max_attempts,
            initial_backoff,
        }
    }

    /// Wait after failed attempt number `attempt` (1-based), or `None` when
    /// that attempt was the last one.
    pub fn backoff(&self, attempt: u32) -> Option<Duration> {
        if attempt >= self.max_attempts {
            return None;
        }
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        Some(self.initial_backoff.saturating_mul(factor))
    }
}

/// What the opener hands to the reader.
pub(crate) enum OpenOutcome<D: FormatDecoder> {
    Opened(Box<RecordStream<D>>),
    CantOpen,
}

/// Handles the reader keeps for a running opener.
pub(crate) struct OpenerHandle<D: FormatDecoder> {
    pub(crate) ready_rx: oneshot::Receiver<OpenOutcome<D>>,
    pub(crate) cancel_tx: mpsc::Sender<()>,
    pub(crate) thread: JoinHandle<()>,
}

/// Starts the opener thread.
pub(crate) fn spawn<D, F>(
    resource: Arc<Resource>,
    filters: Arc<FilterManager>,
    policy: RetryPolicy,
    factory: F,
) -> std::io::Result<OpenerHandle<D>>
where
    D: FormatDecoder,
    F: FnMut(&Resource, &FilterManager) -> Result<D, DecoderError> + Send + 'static,
{
    let (ready_tx, ready_rx) = oneshot::channel();
    // A plain channel, not a cancellation token: the opener is a blocking
    // thread and waits out its backoff with `recv_timeout`.
    let (cancel_tx, cancel_rx) = mpsc::channel();

    let thread = thread::Builder::new()
        .name("dump-opener".to_string())
        .spawn(move || {
            let outcome = open_stream(&resource, &filters, policy, factory, &cancel_rx);
            if ready_tx.send(outcome).is_err() {
                log::debug!("Reader for {} went away before the open finished", resource.url);
            }
        })?;

    Ok(OpenerHandle {
        ready_rx,
        cancel_tx,
        thread,
    })
}

fn open_stream<D, F>(
    resource: &Arc<Resource>,
    filters: &FilterManager,
    policy: RetryPolicy,
    factory: F,
    cancel_rx: &mpsc::Receiver<()>,
) -> OpenOutcome<D>
where
    D: FormatDecoder,
    F: FnMut(&Resource, &FilterManager) -> Result<D, DecoderError>,
{
    let Some(decoder) = open_with_retries(resource, filters, policy, factory, cancel_rx) else {
        return OpenOutcome::CantOpen;
    };

    let buffer = match DoubleBuffer::allocate(&decoder, resource) {
        Ok(buffer) => buffer,
        Err(e) => {
            log::error!("Could not allocate records for {}: {}", resource.url, e);
            return OpenOutcome::CantOpen;
        }
    };

    // Boxed before the first prefetch so the slots never move again.
    let mut stream = Box::new(RecordStream::new(Arc::clone(resource), decoder, buffer));
    if let Err(e) = stream.prefetch() {
        log::error!("Initial prefetch failed: {}", e);
    }
    OpenOutcome::Opened(stream)
}

/// Runs the factory under `policy`. Returns `None` when every attempt failed
/// or the wait was cancelled.
fn open_with_retries<D, F>(
    resource: &Resource,
    filters: &FilterManager,
    policy: RetryPolicy,
    mut factory: F,
    cancel_rx: &mpsc::Receiver<()>,
) -> Option<D>
where
    F: FnMut(&Resource, &FilterManager) -> Result<D, DecoderError>,
{
    let max_attempts = policy.max_attempts.max(1);
    for attempt in 1..=max_attempts {
        match factory(resource, filters) {
            Ok(decoder) => {
                log::debug!("Opened {} on attempt {}", resource.url, attempt);
                return Some(decoder);
            }
            Err(e) => {
                log::warn!(
                    "Could not open ({}). Attempt {} of {}: {}",
                    resource.url,
                    attempt,
                    max_attempts,
                    e
                );
                if let Some(delay) = policy.backoff(attempt) {
                    if cancelled_during(cancel_rx, delay) {
                        log::info!("Open of {} cancelled", resource.url);
                        return None;
                    }
                }
            }
        }
    }

    log::error!(
        "Could not open dumpfile ({}) after {} attempts. Giving up.",
        resource.url,
        max_attempts
    );
    None
}

/// Sleeps for `delay` unless the cancel channel fires or disconnects first.
fn cancelled_during(cancel_rx: &mpsc::Receiver<()>, delay: Duration) -> bool {
    !matches!(cancel_rx.recv_timeout(delay), Err(RecvTimeoutError::Timeout))
}
