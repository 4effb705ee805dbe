//! Reviewer coordination
//!
//! A global set of registered reviewers (membership is admin-gated by the
//! registry facade) and an append-only review log per record. The log does
//! not deduplicate: a reviewer marking the same record twice appears twice.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::registry::{ActorId, Record, RecordId, RegistryError, RegistryResult};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewCoordinator {
    reviewers: BTreeSet<ActorId>,
    logs: BTreeMap<RecordId, Vec<ActorId>>,
}

impl ReviewCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `actor` to the reviewer set. Returns false if already present.
    pub fn register(&mut self, actor: ActorId) -> bool {
        self.reviewers.insert(actor)
    }

    /// Removes `actor` from the reviewer set. Returns false if absent.
    ///
    /// Past review log entries by `actor` are kept.
    pub fn unregister(&mut self, actor: &ActorId) -> bool {
        self.reviewers.remove(actor)
    }

    pub fn is_reviewer(&self, actor: &ActorId) -> bool {
        self.reviewers.contains(actor)
    }

    /// Appends `actor` to the review log of `record`.
    ///
    /// The record may be inactive; it only has to exist.
    pub fn mark_reviewed(&mut self, record: &Record, actor: &ActorId) -> RegistryResult<()> {
        if !self.is_reviewer(actor) {
            return Err(RegistryError::not_reviewer(actor));
        }
        self.logs.entry(record.id).or_default().push(actor.clone());
        Ok(())
    }

    /// Review log of a record, in the order reviews were marked
    pub fn reviewers_of(&self, record_id: RecordId) -> &[ActorId] {
        self.logs.get(&record_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Records with a non-empty review log, in id order
    pub fn reviewed_records(&self) -> impl Iterator<Item = RecordId> + '_ {
        self.logs.keys().copied()
    }

    pub fn reviewers(&self) -> impl Iterator<Item = &ActorId> {
        self.reviewers.iter()
    }

    pub fn reviewer_count(&self) -> usize {
        self.reviewers.len()
    }
}
