//! # Resource
//!
//! Describes one dump resource: where it lives, whether it is a live feed,
//! and the per-resource metadata that is stamped onto every record read
//! from it. The reader never mutates a resource; it is shared with the
//! orchestrator through an `Arc`.

use std::fmt;
use std::str::FromStr;

/// The kind of dump a resource contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordType {
    /// Routing table snapshots.
    Ribs,
    /// Update messages.
    Updates,
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordType::Ribs => write!(f, "ribs"),
            RecordType::Updates => write!(f, "updates"),
        }
    }
}

impl FromStr for RecordType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ribs" | "rib" => Ok(RecordType::Ribs),
            "updates" | "update" => Ok(RecordType::Updates),
            other => Err(format!("unknown record type '{}'", other)),
        }
    }
}

/// How long a resource covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceDuration {
    /// A live or continuous source with no natural end.
    Forever,
    /// A finite dump spanning the given number of seconds.
    Finite(u32),
}

/// # Resource
///
/// Identifies what to open and carries the metadata that prepopulates every
/// record produced from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    /// Location of the dump (file path or URL), interpreted by the decoder.
    pub url: String,
    /// Name of the project publishing the dump.
    pub project: String,
    /// Name of the collector that produced the dump.
    pub collector: String,
    /// Kind of dump.
    pub record_type: RecordType,
    /// Nominal dump time, in Unix seconds.
    pub initial_time: u32,
    /// Duration class of the resource.
    pub duration: ResourceDuration,
}

impl Resource {
    /// Creates a finite resource with a zero duration.
    pub fn new(
        url: impl Into<String>,
        project: impl Into<String>,
        collector: impl Into<String>,
        record_type: RecordType,
        initial_time: u32,
    ) -> Self {
        Self {
            url: url.into(),
            project: project.into(),
            collector: collector.into(),
            record_type,
            initial_time,
            duration: ResourceDuration::Finite(0),
        }
    }

    /// Sets a finite duration in seconds.
    pub fn with_duration(mut self, secs: u32) -> Self {
        self.duration = ResourceDuration::Finite(secs);
        self
    }

    /// Marks the resource as a live feed.
    pub fn forever(mut self) -> Self {
        self.duration = ResourceDuration::Forever;
        self
    }

    /// True for live/continuous resources.
    pub fn is_forever(&self) -> bool {
        self.duration == ResourceDuration::Forever
    }
}
