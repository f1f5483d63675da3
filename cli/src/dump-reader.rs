//! # dump-reader
//!
//! Reads an ascii dump file through the background-opened, double-buffered
//! reader and prints one line per record:
//!
//! ```text
//! project|collector|type|dump_time|time|position|status|body
//! ```
//!
//! Live dumps (`--live`) are polled until interrupted or `--max-records`
//! is reached.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::thread;

use anyhow::Context;
use clap::{ArgAction, Parser, ValueHint};
use lib_reader::configs::{load_reader_config, ReaderConfig};
use lib_reader::loggers::setup_logging;
use lib_reader::{AsciiDumpDecoder, FilterManager, NextRecord, Reader, Record, RecordType, Resource};

/// CLI arguments for dump-reader.
#[derive(Parser, Debug)]
#[command(
    name = "dump-reader",
    version,
    author = "ckir",
    about = "Prints the records of an ascii routing dump.",
    long_about = "Opens a dump in the background (with bounded retries), then pulls and prints \
                  its records one by one. Supports project/collector/type/time filters and live \
                  dumps that keep growing."
)]
pub struct Cli {
    /// Dump file to read (plain path or file:// URL).
    #[arg(value_hint = ValueHint::FilePath)]
    pub path: String,

    /// Project name stamped on every record.
    #[arg(long, default_value = "local")]
    pub project: String,

    /// Collector name stamped on every record.
    #[arg(long, default_value = "local")]
    pub collector: String,

    /// Dump type: ribs or updates.
    #[arg(long, default_value = "updates")]
    pub record_type: RecordType,

    /// Nominal dump time in Unix seconds.
    #[arg(long, default_value_t = 0)]
    pub dump_time: u32,

    /// Treat the dump as a live feed that never ends.
    #[arg(long, action = ArgAction::SetTrue)]
    pub live: bool,

    /// Only read the dump if its project is one of these.
    #[arg(long, value_name = "PROJECT", action = ArgAction::Append)]
    pub only_project: Vec<String>,

    /// Only read the dump if its collector is one of these.
    #[arg(long, value_name = "COLLECTOR", action = ArgAction::Append)]
    pub only_collector: Vec<String>,

    /// Only read the dump if its type is one of these.
    #[arg(long, value_name = "TYPE", action = ArgAction::Append)]
    pub only_type: Vec<RecordType>,

    /// Skip records older than this Unix time.
    #[arg(long)]
    pub interval_begin: Option<u32>,

    /// Skip records newer than this Unix time.
    #[arg(long, requires = "interval_begin")]
    pub interval_end: Option<u32>,

    /// JSON reader configuration file.
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Directory for log files. Logs go to stdout only when omitted.
    #[arg(long, value_hint = ValueHint::DirPath)]
    pub log_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, env = "READER_LOG_LEVEL", default_value = "warn")]
    pub log_level: String,

    /// Stop after this many records.
    #[arg(long)]
    pub max_records: Option<u64>,

    /// Overrides `maxOpenAttempts` from the config file and environment.
    #[arg(long)]
    pub max_open_attempts: Option<u32>,

    /// Overrides `openRetryWaitMs`.
    #[arg(long)]
    pub open_retry_wait_ms: Option<u64>,

    /// Overrides `pollIntervalMs`.
    #[arg(long)]
    pub poll_interval_ms: Option<u64>,
}

impl Cli {
    /// Applies the flags that were given on top of `config`.
    fn merge_into(&self, mut config: ReaderConfig) -> anyhow::Result<ReaderConfig> {
        if let Some(attempts) = self.max_open_attempts {
            config.max_open_attempts = attempts;
        }
        if let Some(wait) = self.open_retry_wait_ms {
            config.open_retry_wait_ms = wait;
        }
        if let Some(interval) = self.poll_interval_ms {
            config.poll_interval_ms = interval;
        }
        config.validate()?;
        Ok(config)
    }
}

fn main() -> ExitCode {
    let args = Cli::parse();

    match run(&args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Cli) -> anyhow::Result<ExitCode> {
    setup_logging(args.log_dir.as_deref(), &args.log_level).context("Failed to set up logging")?;

    let config = load_reader_config(args.config.as_deref()).context("Invalid reader configuration")?;
    let config = args.merge_into(config)?;
    log::debug!("{}", config);

    let mut resource = Resource::new(
        args.path.clone(),
        args.project.clone(),
        args.collector.clone(),
        args.record_type,
        args.dump_time,
    );
    if args.live {
        resource = resource.forever();
    }

    let mut filters = FilterManager::new();
    for project in &args.only_project {
        filters.add_project(project);
    }
    for collector in &args.only_collector {
        filters.add_collector(collector);
    }
    for record_type in &args.only_type {
        filters.add_record_type(*record_type);
    }
    if let Some(begin) = args.interval_begin {
        filters.set_interval(begin, args.interval_end);
    }

    let mut reader = Reader::with_policy(
        Arc::new(resource),
        Arc::new(filters),
        config.retry_policy(),
        |resource: &Resource, filters: &FilterManager| AsciiDumpDecoder::open(resource, filters),
    )?;

    let mut printed: u64 = 0;
    loop {
        if args.max_records.is_some_and(|max| printed >= max) {
            return Ok(ExitCode::SUCCESS);
        }

        match reader.next_record() {
            NextRecord::Ok(record) => {
                println!("{}", format_record(record));
                printed += 1;
            }
            NextRecord::Again => thread::sleep(config.poll_interval()),
            NextRecord::EndOfStream(Some(record)) => {
                log::error!("Could not open dump {}", args.path);
                println!("{}", format_record(record));
                return Ok(ExitCode::FAILURE);
            }
            NextRecord::EndOfStream(None) => {
                log::info!("Read {} records from {}", printed, args.path);
                return Ok(ExitCode::SUCCESS);
            }
            NextRecord::Error(e) => {
                log::error!("{}", e);
                return Ok(ExitCode::FAILURE);
            }
        }
    }
}

fn format_record(record: &Record<String>) -> String {
    format!(
        "{}|{}|{}|{}|{}.{:06}|{:?}|{:?}|{}",
        record.project(),
        record.collector(),
        record.record_type(),
        record.dump_time(),
        record.time_sec,
        record.time_usec,
        record.dump_pos,
        record.status,
        record.payload().map(String::as_str).unwrap_or("")
    )
}
