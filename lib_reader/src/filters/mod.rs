//! # Filter Manager
//!
//! Holds the user's selection of projects, collectors, record types and an
//! optional time interval. The reader never looks inside it; it is passed
//! through to the decoder factory, which decides how to apply it.

use std::collections::HashSet;

use crate::models::resource::{RecordType, Resource};
use crate::utils::str_set::StrSet;

/// Inclusive time interval in Unix seconds. `end == None` is open-ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeInterval {
    pub begin: u32,
    pub end: Option<u32>,
}

impl TimeInterval {
    pub fn contains(&self, time: u32) -> bool {
        time >= self.begin && self.end.map_or(true, |end| time <= end)
    }
}

/// # Filter Manager
///
/// Empty sets accept everything.
#[derive(Debug, Clone, Default)]
pub struct FilterManager {
    projects: StrSet,
    collectors: StrSet,
    record_types: HashSet<RecordType>,
    interval: Option<TimeInterval>,
}

impl FilterManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_project(&mut self, project: &str) -> &mut Self {
        self.projects.insert(project);
        self
    }

    pub fn add_collector(&mut self, collector: &str) -> &mut Self {
        self.collectors.insert(collector);
        self
    }

    pub fn add_record_type(&mut self, record_type: RecordType) -> &mut Self {
        self.record_types.insert(record_type);
        self
    }

    pub fn set_interval(&mut self, begin: u32, end: Option<u32>) -> &mut Self {
        self.interval = Some(TimeInterval { begin, end });
        self
    }

    pub fn interval(&self) -> Option<TimeInterval> {
        self.interval
    }

    /// True when the resource's project, collector and type all pass.
    pub fn accepts_resource(&self, resource: &Resource) -> bool {
        (self.projects.is_empty() || self.projects.contains(&resource.project))
            && (self.collectors.is_empty() || self.collectors.contains(&resource.collector))
            && (self.record_types.is_empty() || self.record_types.contains(&resource.record_type))
    }

    /// True when `time` lies inside the interval (or no interval is set).
    pub fn accepts_time(&self, time: u32) -> bool {
        self.interval.map_or(true, |interval| interval.contains(time))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resource() -> Resource {
        Resource::new("x", "ris", "rrc00", RecordType::Updates, 0)
    }

    #[test]
    fn test_empty_manager_accepts_everything() {
        let filters = FilterManager::new();
        assert!(filters.accepts_resource(&resource()));
        assert!(filters.accepts_time(0));
        assert!(filters.accepts_time(u32::MAX));
    }

    #[test]
    fn test_resource_filters() {
        let mut filters = FilterManager::new();
        filters.add_project("ris").add_collector("rrc01");
        assert!(!filters.accepts_resource(&resource()));

        filters.add_collector("rrc00");
        assert!(filters.accepts_resource(&resource()));

        filters.add_record_type(RecordType::Ribs);
        assert!(!filters.accepts_resource(&resource()));
    }

    #[test]
    fn test_interval_bounds_are_inclusive() {
        let mut filters = FilterManager::new();
        filters.set_interval(100, Some(200));
        assert!(!filters.accepts_time(99));
        assert!(filters.accepts_time(100));
        assert!(filters.accepts_time(200));
        assert!(!filters.accepts_time(201));

        filters.set_interval(100, None);
        assert!(filters.accepts_time(u32::MAX));
    }
}
