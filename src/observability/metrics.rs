//! Registry counters
//!
//! Counters only, reset on process start. `active_records` is the single
//! gauge and is set from the store rather than counted.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Operational counters of one registry instance
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    records_created: AtomicU64,
    records_updated: AtomicU64,
    records_forked: AtomicU64,
    records_deactivated: AtomicU64,
    votes_cast: AtomicU64,
    votes_removed: AtomicU64,
    /// Votes weighed with the base weight because reputation was unavailable
    oracle_fallbacks: AtomicU64,
    comments_added: AtomicU64,
    reviews_marked: AtomicU64,
    admin_changes: AtomicU64,
    operations_rejected: AtomicU64,
    active_records: AtomicU64,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_records_created(&self) {
        self.records_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_records_updated(&self) {
        self.records_updated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_records_forked(&self) {
        self.records_forked.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_records_deactivated(&self) {
        self.records_deactivated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_votes_cast(&self) {
        self.votes_cast.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_votes_removed(&self) {
        self.votes_removed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_oracle_fallbacks(&self) {
        self.oracle_fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_comments_added(&self) {
        self.comments_added.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_reviews_marked(&self) {
        self.reviews_marked.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_admin_changes(&self) {
        self.admin_changes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_operations_rejected(&self) {
        self.operations_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn set_active_records(&self, count: u64) {
        self.active_records.store(count, Ordering::Relaxed);
    }

    pub fn operations_rejected(&self) -> u64 {
        self.operations_rejected.load(Ordering::Relaxed)
    }

    pub fn oracle_fallbacks(&self) -> u64 {
        self.oracle_fallbacks.load(Ordering::Relaxed)
    }

    /// Point-in-time copy of every counter
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            records_created: self.records_created.load(Ordering::Relaxed),
            records_updated: self.records_updated.load(Ordering::Relaxed),
            records_forked: self.records_forked.load(Ordering::Relaxed),
            records_deactivated: self.records_deactivated.load(Ordering::Relaxed),
            votes_cast: self.votes_cast.load(Ordering::Relaxed),
            votes_removed: self.votes_removed.load(Ordering::Relaxed),
            oracle_fallbacks: self.oracle_fallbacks.load(Ordering::Relaxed),
            comments_added: self.comments_added.load(Ordering::Relaxed),
            reviews_marked: self.reviews_marked.load(Ordering::Relaxed),
            admin_changes: self.admin_changes.load(Ordering::Relaxed),
            operations_rejected: self.operations_rejected.load(Ordering::Relaxed),
            active_records: self.active_records.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub records_created: u64,
    pub records_updated: u64,
    pub records_forked: u64,
    pub records_deactivated: u64,
    pub votes_cast: u64,
    pub votes_removed: u64,
    pub oracle_fallbacks: u64,
    pub comments_added: u64,
    pub reviews_marked: u64,
    pub admin_changes: u64,
    pub operations_rejected: u64,
    pub active_records: u64,
}
