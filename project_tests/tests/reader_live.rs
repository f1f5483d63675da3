use std::sync::Arc;

use lib_reader::{
    DecodeOutcome, DumpPosition, FilterManager, NextRecord, Reader, ReaderStatus, Resource,
};
use project_tests::{init_logging, test_resource, ScriptedDecoder, Step};

fn live_reader(steps: Vec<Step>) -> Reader<ScriptedDecoder> {
    Reader::new(
        Arc::new(test_resource().forever()),
        Arc::new(FilterManager::new()),
        move |_: &Resource, _: &FilterManager| Ok(ScriptedDecoder::new(steps.clone()).cycled()),
    )
    .expect("reader")
}

#[test]
fn test_live_source_alternates_again_and_records() {
    init_logging();
    let mut reader = live_reader(vec![
        Step::outcome(DecodeOutcome::EmptyDump, DumpPosition::End),
        Step::record(42),
    ]);

    let mut statuses = Vec::new();
    for _ in 0..10 {
        match reader.next_record() {
            NextRecord::Ok(record) => {
                assert_eq!(record.time_sec, 42);
                statuses.push(ReaderStatus::Ok);
            }
            other => statuses.push(other.status()),
        }
    }

    assert!(!statuses.contains(&ReaderStatus::EndOfStream));
    let expected: Vec<_> = [ReaderStatus::Again, ReaderStatus::Ok]
        .into_iter()
        .cycle()
        .take(10)
        .collect();
    assert_eq!(statuses, expected);
}

#[test]
fn test_live_source_never_ends_on_terminal_outcomes() {
    let mut reader = live_reader(vec![
        Step::end(),
        Step::outcome(DecodeOutcome::FilteredDump, DumpPosition::End),
        Step::outcome(DecodeOutcome::CorruptedDump, DumpPosition::End),
    ]);

    for _ in 0..9 {
        assert_eq!(reader.next_record().status(), ReaderStatus::Again);
    }
}

#[test]
fn test_live_source_delivers_bad_messages() {
    let mut reader = live_reader(vec![
        Step::corrupted(7),
        Step::outcome(DecodeOutcome::EmptyDump, DumpPosition::End),
    ]);

    let first = reader.next_record().record().map(|record| record.status);
    assert_eq!(first, Some(lib_reader::RecordStatus::CorruptedRecord));
    assert_eq!(reader.next_record().status(), ReaderStatus::Again);
}

#[test]
fn test_live_source_reports_read_errors() {
    let mut reader = live_reader(vec![
        Step::record(1),
        Step::record(2),
        Step::outcome(DecodeOutcome::ReadError, DumpPosition::Middle),
    ]);

    assert_eq!(reader.next_record().status(), ReaderStatus::Ok);
    assert_eq!(reader.next_record().status(), ReaderStatus::Error);
    assert_eq!(reader.next_record().status(), ReaderStatus::EndOfStream);
}
