use anyhow::Result;
use std::fs;
use std::path::Path;

/// Prefix of log files written by `setup_logging`.
pub const LOG_FILE_PREFIX: &str = "dump_reader";

/// Installs the global `log` backend.
///
/// Messages go to stdout and, when `log_dir` is given, to a timestamped
/// `dump_reader_<ts>.log` file in that directory. Older `.log` files there
/// are removed so only the newest one is kept.
///
/// # Arguments
/// * `log_dir` - Optional directory for the log file. Created if missing.
/// * `log_level` - One of trace, debug, info, warn, error (default info).
pub fn setup_logging(log_dir: Option<&Path>, log_level: &str) -> Result<()> {
    let mut dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}[{}][{}] {}",
                chrono::Local::now().format("[%Y-%m-%d %H:%M:%S]"),
                record.target(),
                record.level(),
                message
            ))
        })
        .level(parse_level(log_level))
        .chain(std::io::stdout());

    if let Some(log_dir) = log_dir {
        if !log_dir.exists() {
            fs::create_dir_all(log_dir)?;
        }

        // Clean up old log files, keeping only the most recent one
        cleanup_old_logs(log_dir)?;

        let log_file_name = format!(
            "{}_{}.log",
            LOG_FILE_PREFIX,
            chrono::Local::now().format("%Y-%m-%d_%H-%M-%S")
        );
        dispatch = dispatch.chain(fern::log_file(log_dir.join(log_file_name))?);
    }

    dispatch.apply()?;
    Ok(())
}

/// Maps a level name onto a filter, defaulting to `Info`.
pub fn parse_level(log_level: &str) -> log::LevelFilter {
    match log_level.to_lowercase().as_str() {
        "trace" => log::LevelFilter::Trace,
        "debug" => log::LevelFilter::Debug,
        "warn" => log::LevelFilter::Warn,
        "error" => log::LevelFilter::Error,
        "off" => log::LevelFilter::Off,
        _ => log::LevelFilter::Info,
    }
}

fn cleanup_old_logs(log_dir: &Path) -> Result<()> {
    let mut entries: Vec<_> = fs::read_dir(log_dir)?
        .filter_map(|res| res.ok())
        .filter(|e| e.path().extension().map_or(false, |ext| ext == "log"))
        .filter_map(|e| {
            let modified = e.metadata().and_then(|m| m.modified()).ok()?;
            Some((modified, e.path()))
        })
        .collect();

    // Sort by modification time, newest first
    entries.sort_by(|a, b| b.0.cmp(&a.0));

    // Keep the most recent one (index 0), delete the rest
    for (_, path) in entries.iter().skip(1) {
        if let Err(e) = fs::remove_file(path) {
            eprintln!("Failed to delete old log file {:?}: {}", path, e);
        }
    }

    Ok(())
}
