//! Per-record vote accounting
//!
//! Direction is not remembered per voter. Removing a vote clears the voter's
//! flag so they may vote again, but the counters and the score keep the
//! contribution of the removed vote.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::registry::{ActorId, Record, RecordId, RegistryError, RegistryResult};

/// Direction of a vote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteDirection {
    Up,
    Down,
}

impl VoteDirection {
    pub fn from_upvote(is_upvote: bool) -> Self {
        if is_upvote {
            VoteDirection::Up
        } else {
            VoteDirection::Down
        }
    }

    pub fn is_up(&self) -> bool {
        matches!(self, VoteDirection::Up)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VoteDirection::Up => "up",
            VoteDirection::Down => "down",
        }
    }
}

/// Public view of a record's vote totals
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteStats {
    pub upvotes: u64,
    pub downvotes: u64,
    /// Sum of signed vote weights
    pub score: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct VoteState {
    voted: BTreeSet<ActorId>,
    upvotes: u64,
    downvotes: u64,
    score: i64,
}

/// Vote state of every record that has ever been voted on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VoteLedger {
    states: BTreeMap<RecordId, VoteState>,
}

impl VoteLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Casts a vote on an active record.
    ///
    /// `weigh` runs only after every check has passed, so a rejected vote
    /// never consults the reputation source. Returns the applied weight.
    pub fn cast<F>(
        &mut self,
        record: &Record,
        actor: &ActorId,
        direction: VoteDirection,
        weigh: F,
    ) -> RegistryResult<u64>
    where
        F: FnOnce() -> u64,
    {
        if !record.active {
            return Err(RegistryError::record_inactive(record.id));
        }
        if self.has_voted(record.id, actor) {
            return Err(RegistryError::already_voted(actor, record.id));
        }

        let weight = weigh();
        let signed = i64::try_from(weight).unwrap_or(i64::MAX);

        let state = self.states.entry(record.id).or_default();
        state.voted.insert(actor.clone());
        match direction {
            VoteDirection::Up => {
                state.upvotes += 1;
                state.score = state.score.saturating_add(signed);
            }
            VoteDirection::Down => {
                state.downvotes += 1;
                state.score = state.score.saturating_sub(signed);
            }
        }
        Ok(weight)
    }

    /// Clears `actor`'s voted flag on `record_id`.
    ///
    /// Counters and score are left as they are.
    pub fn remove(&mut self, record_id: RecordId, actor: &ActorId) -> RegistryResult<()> {
        let removed = self
            .states
            .get_mut(&record_id)
            .map(|state| state.voted.remove(actor))
            .unwrap_or(false);
        if !removed {
            return Err(RegistryError::not_voted(actor, record_id));
        }
        Ok(())
    }

    /// Records that have received at least one vote, in id order
    pub fn voted_records(&self) -> impl Iterator<Item = RecordId> + '_ {
        self.states.keys().copied()
    }

    pub fn has_voted(&self, record_id: RecordId, actor: &ActorId) -> bool {
        self.states
            .get(&record_id)
            .map(|state| state.voted.contains(actor))
            .unwrap_or(false)
    }

    /// Totals for a record. Zero for records nobody voted on.
    pub fn stats(&self, record_id: RecordId) -> VoteStats {
        self.states
            .get(&record_id)
            .map(|state| VoteStats {
                upvotes: state.upvotes,
                downvotes: state.downvotes,
                score: state.score,
            })
            .unwrap_or_default()
    }

    /// Number of actors currently holding a vote on the record
    pub fn voter_count(&self, record_id: RecordId) -> usize {
        self.states
            .get(&record_id)
            .map(|state| state.voted.len())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::RegistryErrorCode;

    fn record(id: u64, active: bool) -> Record {
        let now = chrono::Utc::now();
        Record {
            id: RecordId::new(id),
            author: ActorId::new("author"),
            content_ref: format!("ref-{}", id).as_str().into(),
            title: "t".into(),
            description: String::new(),
            language: crate::registry::Language::Rust,
            category: crate::registry::Category::Utility,
            dependencies: Vec::new(),
            version_chain: Vec::new(),
            active,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_upvote_and_downvote_weights() {
        let mut ledger = VoteLedger::new();
        let target = record(1, true);

        ledger.cast(&target, &ActorId::new("a"), VoteDirection::Up, || 3).unwrap();
        ledger.cast(&target, &ActorId::new("b"), VoteDirection::Down, || 1).unwrap();
        ledger.cast(&target, &ActorId::new("c"), VoteDirection::Down, || 5).unwrap();

        let stats = ledger.stats(target.id);
        assert_eq!(stats.upvotes, 1);
        assert_eq!(stats.downvotes, 2);
        assert_eq!(stats.score, 3 - 1 - 5);
        assert_eq!(ledger.voter_count(target.id), 3);
    }

    #[test]
    fn test_double_vote_rejected_without_weighing() {
        let mut ledger = VoteLedger::new();
        let target = record(1, true);
        let voter = ActorId::new("a");

        ledger.cast(&target, &voter, VoteDirection::Up, || 1).unwrap();
        let err = ledger
            .cast(&target, &voter, VoteDirection::Down, || panic!("weighed a rejected vote"))
            .unwrap_err();
        assert_eq!(err.code(), RegistryErrorCode::AlreadyVoted);
        assert_eq!(ledger.stats(target.id).score, 1);
    }

    #[test]
    fn test_inactive_record_rejected() {
        let mut ledger = VoteLedger::new();
        let err = ledger
            .cast(&record(1, false), &ActorId::new("a"), VoteDirection::Up, || 1)
            .unwrap_err();
        assert_eq!(err.code(), RegistryErrorCode::RecordInactive);
        assert_eq!(ledger.stats(RecordId::new(1)), VoteStats::default());
    }

    #[test]
    fn test_remove_keeps_score_and_allows_revote() {
        let mut ledger = VoteLedger::new();
        let target = record(1, true);
        let voter = ActorId::new("a");

        ledger.cast(&target, &voter, VoteDirection::Up, || 1).unwrap();
        ledger.remove(target.id, &voter).unwrap();

        assert!(!ledger.has_voted(target.id, &voter));
        assert_eq!(ledger.stats(target.id).score, 1);
        assert_eq!(ledger.stats(target.id).upvotes, 1);

        ledger.cast(&target, &voter, VoteDirection::Up, || 1).unwrap();
        assert_eq!(ledger.stats(target.id).score, 2);
        assert_eq!(ledger.stats(target.id).upvotes, 2);
    }

    #[test]
    fn test_remove_without_vote() {
        let mut ledger = VoteLedger::new();
        let err = ledger.remove(RecordId::new(1), &ActorId::new("a")).unwrap_err();
        assert_eq!(err.code(), RegistryErrorCode::NotVoted);

        ledger.cast(&record(1, true), &ActorId::new("b"), VoteDirection::Up, || 1).unwrap();
        let err = ledger.remove(RecordId::new(1), &ActorId::new("a")).unwrap_err();
        assert_eq!(err.code(), RegistryErrorCode::NotVoted);
    }

    #[test]
    fn test_direction_from_bool() {
        assert_eq!(VoteDirection::from_upvote(true), VoteDirection::Up);
        assert_eq!(VoteDirection::from_upvote(false), VoteDirection::Down);
        assert!(VoteDirection::Up.is_up());
        assert_eq!(VoteDirection::Down.as_str(), "down");
    }
}
