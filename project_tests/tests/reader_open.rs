use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use lib_reader::{
    DecoderError, FilterManager, NextRecord, Reader, ReaderError, ReaderStatus, RecordStatus,
    Resource, RetryPolicy,
};
use project_tests::{init_logging, test_resource, ScriptedDecoder, Step};

const SLOW_OPEN: Duration = Duration::from_millis(300);

#[test]
fn test_open_wait_blocks_only_once() {
    init_logging();
    let mut reader = Reader::new(
        Arc::new(test_resource()),
        Arc::new(FilterManager::new()),
        |_: &Resource, _: &FilterManager| {
            thread::sleep(SLOW_OPEN);
            Ok(ScriptedDecoder::new(vec![Step::record(10), Step::record(20)]))
        },
    )
    .expect("reader");

    let started = Instant::now();
    reader.open_wait().expect("opened");
    assert!(started.elapsed() >= SLOW_OPEN);

    let started = Instant::now();
    reader.open_wait().expect("opened");
    assert_eq!(reader.next_time().expect("opened"), Some(10));
    assert_eq!(reader.next_record().status(), ReaderStatus::Ok);
    assert!(started.elapsed() < SLOW_OPEN / 2);
}

#[test]
fn test_first_pull_waits_for_open() {
    let mut reader = Reader::new(
        Arc::new(test_resource()),
        Arc::new(FilterManager::new()),
        |_: &Resource, _: &FilterManager| {
            thread::sleep(Duration::from_millis(100));
            Ok(ScriptedDecoder::new(vec![Step::record(10), Step::end()]))
        },
    )
    .expect("reader");

    match reader.next_record() {
        NextRecord::Ok(record) => assert_eq!(record.time_sec, 10),
        other => panic!("expected a record, got {}", other.status()),
    }
}

#[test]
fn test_failing_open_retries_then_gives_up() {
    init_logging();
    let attempts = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&attempts);
    let policy = RetryPolicy::new(5, Duration::from_millis(20));

    let started = Instant::now();
    let mut reader = Reader::<ScriptedDecoder>::with_policy(
        Arc::new(test_resource()),
        Arc::new(FilterManager::new()),
        policy,
        move |resource: &Resource, _: &FilterManager| {
            if let Ok(mut seen) = seen.lock() {
                seen.push(Instant::now());
            }
            Err(DecoderError::Unsupported(resource.url.clone()))
        },
    )
    .expect("reader");

    let resource = test_resource();
    match reader.next_record() {
        NextRecord::EndOfStream(Some(record)) => {
            assert_eq!(record.status, RecordStatus::CorruptedSource);
            assert_eq!(record.project(), resource.project);
            assert_eq!(record.collector(), resource.collector);
            assert_eq!(record.dump_time(), resource.initial_time);
        }
        other => panic!("expected a failure record, got {}", other.status()),
    }
    // 20 + 40 + 80 + 160 ms of backoff between five attempts.
    assert!(started.elapsed() >= Duration::from_millis(300));

    let attempts = attempts.lock().expect("attempt log").clone();
    assert_eq!(attempts.len(), 5);
    for (i, pair) in attempts.windows(2).enumerate() {
        let expected = policy.backoff(i as u32 + 1).expect("not the last attempt");
        assert!(pair[1] - pair[0] >= expected);
    }

    assert!(matches!(reader.open_wait(), Err(ReaderError::CantOpenDump { .. })));
    assert!(matches!(reader.next_time(), Err(ReaderError::CantOpenDump { .. })));
    assert!(matches!(reader.next_record(), NextRecord::EndOfStream(Some(_))));
}

#[test]
fn test_record_allocation_failure_is_cant_open() {
    let mut reader = Reader::new(
        Arc::new(test_resource()),
        Arc::new(FilterManager::new()),
        |_: &Resource, _: &FilterManager| Ok(ScriptedDecoder::new(vec![]).failing_alloc()),
    )
    .expect("reader");

    assert!(reader.open_wait().is_err());
    let status = reader.next_record().record().map(|record| record.status);
    assert_eq!(status, Some(RecordStatus::CorruptedSource));
}

#[test]
fn test_opener_panic_reads_as_cant_open() {
    let mut reader = Reader::<ScriptedDecoder>::new(
        Arc::new(test_resource()),
        Arc::new(FilterManager::new()),
        |_: &Resource, _: &FilterManager| -> Result<ScriptedDecoder, DecoderError> {
            panic!("factory blew up")
        },
    )
    .expect("reader");

    assert!(matches!(reader.open_wait(), Err(ReaderError::CantOpenDump { .. })));
    for _ in 0..2 {
        let status = reader.next_record().record().map(|record| record.status);
        assert_eq!(status, Some(RecordStatus::CorruptedSource));
    }
}

#[test]
fn test_open_succeeds_after_transient_failures() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let mut reader = Reader::with_policy(
        Arc::new(test_resource()),
        Arc::new(FilterManager::new()),
        RetryPolicy::new(5, Duration::from_millis(5)),
        move |_: &Resource, _: &FilterManager| {
            if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                return Err(DecoderError::Other("not yet".to_string()));
            }
            Ok(ScriptedDecoder::new(vec![Step::record(10), Step::end()]))
        },
    )
    .expect("reader");

    reader.open_wait().expect("opened on third attempt");
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[test]
fn test_filters_reach_the_factory() {
    let mut filters = FilterManager::new();
    filters.set_interval(100, Some(200));
    let mut reader = Reader::new(
        Arc::new(test_resource()),
        Arc::new(filters),
        |_: &Resource, filters: &FilterManager| {
            if filters.accepts_time(150) && !filters.accepts_time(250) {
                Ok(ScriptedDecoder::new(vec![Step::record(150), Step::end()]))
            } else {
                Err(DecoderError::Other("filters missing".to_string()))
            }
        },
    )
    .expect("reader");

    assert!(reader.open_wait().is_ok());
}

#[test]
fn test_drop_during_backoff_returns_promptly() {
    let reader = Reader::<ScriptedDecoder>::with_policy(
        Arc::new(test_resource()),
        Arc::new(FilterManager::new()),
        RetryPolicy::new(5, Duration::from_secs(30)),
        |_: &Resource, _: &FilterManager| Err(DecoderError::Other("down".to_string())),
    )
    .expect("reader");

    thread::sleep(Duration::from_millis(50));
    let started = Instant::now();
    drop(reader);
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[test]
fn test_drop_without_pulling() {
    let reader = Reader::new(
        Arc::new(test_resource()),
        Arc::new(FilterManager::new()),
        |_: &Resource, _: &FilterManager| Ok(ScriptedDecoder::new(vec![Step::record(1)])),
    )
    .expect("reader");
    drop(reader);
}
