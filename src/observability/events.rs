//! Observable lifecycle events
//!
//! Registry notifications are logged under their own names. The events here
//! cover everything around them: rejections, degraded votes, startup and
//! snapshot persistence.

use std::fmt;

use super::logger::Severity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Lifecycle
    /// Configuration file parsed and validated
    ConfigLoaded,
    /// Fresh registry state written by `init`
    RegistryInitialized,
    /// Batch of requests started
    BatchBegin,
    /// Batch of requests finished
    BatchComplete,

    // Operations
    /// A mutating operation was rejected; state unchanged
    OperationRejected,
    /// Vote weighed with the base weight because the reputation source had no answer
    OracleFallback,

    // Snapshot
    SnapshotWriteBegin,
    SnapshotWriteComplete,
    SnapshotLoadBegin,
    SnapshotLoadComplete,
    /// Checksum or invariant check failed while loading
    SnapshotCorrupted,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::RegistryInitialized => "REGISTRY_INITIALIZED",
            Event::BatchBegin => "BATCH_BEGIN",
            Event::BatchComplete => "BATCH_COMPLETE",
            Event::OperationRejected => "OPERATION_REJECTED",
            Event::OracleFallback => "ORACLE_FALLBACK",
            Event::SnapshotWriteBegin => "SNAPSHOT_WRITE_BEGIN",
            Event::SnapshotWriteComplete => "SNAPSHOT_WRITE_COMPLETE",
            Event::SnapshotLoadBegin => "SNAPSHOT_LOAD_BEGIN",
            Event::SnapshotLoadComplete => "SNAPSHOT_LOAD_COMPLETE",
            Event::SnapshotCorrupted => "SNAPSHOT_CORRUPTED",
        }
    }

    /// Severity the event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::OracleFallback => Severity::Warn,
            Event::OperationRejected | Event::SnapshotCorrupted => Severity::Error,
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_events_have_string_representation() {
        let events = [
            Event::ConfigLoaded,
            Event::RegistryInitialized,
            Event::BatchBegin,
            Event::BatchComplete,
            Event::OperationRejected,
            Event::OracleFallback,
            Event::SnapshotWriteBegin,
            Event::SnapshotWriteComplete,
            Event::SnapshotLoadBegin,
            Event::SnapshotLoadComplete,
            Event::SnapshotCorrupted,
        ];

        for event in events {
            let s = event.as_str();
            assert!(!s.is_empty());
            assert!(s.chars().all(|c| c.is_uppercase() || c == '_'));
        }
    }

    #[test]
    fn test_severities() {
        assert_eq!(Event::OracleFallback.severity(), Severity::Warn);
        assert_eq!(Event::OperationRejected.severity(), Severity::Error);
        assert_eq!(Event::SnapshotCorrupted.severity(), Severity::Error);
        assert_eq!(Event::BatchComplete.severity(), Severity::Info);
    }

    #[test]
    fn test_event_display() {
        assert_eq!(format!("{}", Event::OracleFallback), "ORACLE_FALLBACK");
    }
}
