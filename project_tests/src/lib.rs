//! # Reader Test Fixtures
//!
//! A scripted `FormatDecoder` whose outcomes, timing and allocation
//! behaviour are chosen by each test, plus small helpers shared by the
//! behavioural tests under `tests/`.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};

use lib_reader::{
    DecodeOutcome, DecoderError, DumpPosition, FilterManager, FormatDecoder, Reader, ReaderError,
    Record, RecordStatus, RecordType, Resource,
};

static INIT_LOGGER: Once = Once::new();

/// Routes `log` output through `env_logger` once per test binary.
pub fn init_logging() {
    INIT_LOGGER.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

/// A finite test resource with fixed metadata.
pub fn test_resource() -> Resource {
    Resource::new("mock://dump", "routeviews", "route-views2", RecordType::Updates, 1_500_000_000)
}

/// One scripted `populate_record` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub outcome: DecodeOutcome,
    pub time: u32,
    pub pos: DumpPosition,
}

impl Step {
    /// A valid record. The payload is the timestamp.
    pub fn record(time: u32) -> Self {
        Self {
            outcome: DecodeOutcome::Ok,
            time,
            pos: DumpPosition::Middle,
        }
    }

    /// A single bad message, delivered as a flagged record.
    pub fn corrupted(time: u32) -> Self {
        Self {
            outcome: DecodeOutcome::CorruptedMsg,
            time,
            pos: DumpPosition::Middle,
        }
    }

    /// End of dump marking the true end boundary.
    pub fn end() -> Self {
        Self::outcome(DecodeOutcome::EndOfDump, DumpPosition::End)
    }

    pub fn outcome(outcome: DecodeOutcome, pos: DumpPosition) -> Self {
        Self { outcome, time: 0, pos }
    }

    pub fn at(mut self, pos: DumpPosition) -> Self {
        self.pos = pos;
        self
    }
}

/// Counters and address log shared between a test and its decoder.
#[derive(Debug, Default)]
pub struct DecodeLog {
    calls: AtomicUsize,
    targets: Mutex<Vec<usize>>,
}

impl DecodeLog {
    /// Number of `populate_record` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Address of the record handed to each `populate_record` call, in order.
    pub fn targets(&self) -> Vec<usize> {
        self.targets.lock().map(|t| t.clone()).unwrap_or_default()
    }

    /// Address of the record handed to the most recent call.
    pub fn last_target(&self) -> Option<usize> {
        self.targets().last().copied()
    }
}

/// Address of a record, for identity comparisons.
pub fn address_of<P>(record: &Record<P>) -> usize {
    record as *const Record<P> as usize
}

/// # Scripted Decoder
///
/// Replays `steps` in order. Once they run out it either starts over
/// (`cycle`) or keeps answering with a plain end of dump.
pub struct ScriptedDecoder {
    script: Vec<Step>,
    pending: VecDeque<Step>,
    cycle: bool,
    fail_alloc: bool,
    log: Arc<DecodeLog>,
}

impl ScriptedDecoder {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            pending: steps.iter().copied().collect(),
            script: steps,
            cycle: false,
            fail_alloc: false,
            log: Arc::new(DecodeLog::default()),
        }
    }

    /// Restarts the script whenever it runs out.
    pub fn cycled(mut self) -> Self {
        self.cycle = true;
        self
    }

    /// Makes `create_record` fail.
    pub fn failing_alloc(mut self) -> Self {
        self.fail_alloc = true;
        self
    }

    pub fn with_log(mut self, log: Arc<DecodeLog>) -> Self {
        self.log = log;
        self
    }

    fn next_step(&mut self) -> Step {
        if self.pending.is_empty() && self.cycle {
            self.pending.extend(self.script.iter().copied());
        }
        self.pending.pop_front().unwrap_or_else(Step::end)
    }
}

impl FormatDecoder for ScriptedDecoder {
    type Payload = u32;

    fn create_record(&self) -> Result<Record<u32>, DecoderError> {
        if self.fail_alloc {
            return Err(DecoderError::RecordAlloc("scripted failure".to_string()));
        }
        Ok(Record::new())
    }

    fn populate_record(&mut self, record: &mut Record<u32>) -> DecodeOutcome {
        self.log.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut targets) = self.log.targets.lock() {
            targets.push(address_of(record));
        }

        let step = self.next_step();
        record.time_sec = step.time;
        record.dump_pos = step.pos;
        match step.outcome {
            DecodeOutcome::Ok => {
                record.status = RecordStatus::Valid;
                record.set_payload(step.time);
            }
            DecodeOutcome::CorruptedMsg => record.status = RecordStatus::CorruptedRecord,
            DecodeOutcome::UnsupportedMsg => record.status = RecordStatus::UnsupportedRecord,
            DecodeOutcome::EmptyDump => record.status = RecordStatus::EmptySource,
            DecodeOutcome::FilteredDump => record.status = RecordStatus::FilteredSource,
            DecodeOutcome::CorruptedDump => record.status = RecordStatus::CorruptedSource,
            DecodeOutcome::EndOfDump | DecodeOutcome::ReadError => {}
        }
        step.outcome
    }
}

/// Builds a reader over `resource` whose decoder replays `steps` once.
pub fn scripted_reader(
    resource: Resource,
    steps: Vec<Step>,
) -> Result<(Reader<ScriptedDecoder>, Arc<DecodeLog>), ReaderError> {
    let log = Arc::new(DecodeLog::default());
    let decoder_log = Arc::clone(&log);
    let reader = Reader::new(
        Arc::new(resource),
        Arc::new(FilterManager::new()),
        move |_: &Resource, _: &FilterManager| {
            Ok(ScriptedDecoder::new(steps.clone()).with_log(Arc::clone(&decoder_log)))
        },
    )?;
    Ok((reader, log))
}
