//! # Snippet Registry
//!
//! `Registry` is the single entry point for every operation. It owns the
//! record store, vote ledger, comment thread, review coordinator and the
//! notification log, and runs each mutating operation as:
//!
//! 1. validate against current state (no writes),
//! 2. apply all writes,
//! 3. append exactly one notification.
//!
//! A rejected operation returns its `RegistryError` having changed nothing
//! but the rejection counter.
//!
//! The registry is a single-writer state machine. Callers serialize access;
//! `&mut self` on every mutating method enforces that within one process.

mod content_index;
mod dependency;
mod errors;
mod store;
mod supported;
mod table;
mod types;

pub use content_index::ContentIndex;
pub use dependency::{fork_dependencies, DependencyValidator};
pub use errors::{ErrorKind, RegistryError, RegistryErrorCode, RegistryResult};
pub use store::{RecordPolicy, RecordStore};
pub use supported::SupportedSet;
pub use table::{MemoryRecordTable, RecordTable, SecondaryIndex};
pub use types::{
    amount, ActorId, Balance, Category, CommentId, ContentRef, FeeProof, Language, NewRecord,
    Record, RecordId, Revision,
};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::comments::{Comment, CommentIds, CommentThread};
use crate::events::{Notification, NotificationEnvelope, NotificationLog};
use crate::observability::{log_event_with_fields, Event, Logger, MetricsRegistry};
use crate::oracle::{NoReputation, ReputationSource};
use crate::review::ReviewCoordinator;
use crate::votes::{resolve_weight, VoteDirection, VoteLedger, VoteStats, VoteWeight};

/// Who administers the registry and which records it accepts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrySettings {
    pub admin: ActorId,
    pub policy: RecordPolicy,
}

impl RegistrySettings {
    pub fn new(admin: impl Into<String>) -> Self {
        Self {
            admin: ActorId::new(admin),
            policy: RecordPolicy::default(),
        }
    }

    pub fn with_max_versions(mut self, max_versions: usize) -> Self {
        self.policy.max_versions = max_versions;
        self
    }

    pub fn with_posting_fee(mut self, fee: Balance) -> Self {
        self.policy.posting_fee = fee;
        self
    }
}

/// Source of operation timestamps
pub type Clock = fn() -> DateTime<Utc>;

pub struct Registry<T: RecordTable = MemoryRecordTable> {
    admin: ActorId,
    records: RecordStore<T>,
    votes: VoteLedger,
    comments: CommentThread,
    reviews: ReviewCoordinator,
    notifications: NotificationLog,
    oracle: Box<dyn ReputationSource>,
    metrics: MetricsRegistry,
    clock: Clock,
}

impl<T: RecordTable> std::fmt::Debug for Registry<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("admin", &self.admin)
            .finish_non_exhaustive()
    }
}

impl<T: RecordTable + Default> Registry<T> {
    /// Empty registry with no reputation source: every vote weighs 1.
    pub fn new(settings: RegistrySettings) -> Self {
        Self::from_parts(
            settings.admin,
            RecordStore::new(settings.policy),
            VoteLedger::new(),
            CommentThread::new(),
            ReviewCoordinator::new(),
            NotificationLog::new(),
        )
    }
}

impl<T: RecordTable> Registry<T> {
    /// Assembles a registry from already-validated state.
    pub(crate) fn from_parts(
        admin: ActorId,
        records: RecordStore<T>,
        votes: VoteLedger,
        comments: CommentThread,
        reviews: ReviewCoordinator,
        notifications: NotificationLog,
    ) -> Self {
        let registry = Self {
            admin,
            records,
            votes,
            comments,
            reviews,
            notifications,
            oracle: Box::new(NoReputation),
            metrics: MetricsRegistry::new(),
            clock: Utc::now,
        };
        registry.metrics.set_active_records(registry.records.active_count());
        registry
    }

    pub fn with_reputation(mut self, source: Box<dyn ReputationSource>) -> Self {
        self.oracle = source;
        self
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn set_reputation_source(&mut self, source: Box<dyn ReputationSource>) {
        self.oracle = source;
    }

    // =========================================================================
    // Records
    // =========================================================================

    /// Registers a new record owned by `actor`.
    pub fn register(
        &mut self,
        actor: &ActorId,
        input: NewRecord,
        fee: FeeProof,
    ) -> RegistryResult<RecordId> {
        let now = (self.clock)();
        let content_ref = input.content_ref.clone();
        let result = self.records.register(actor, input, fee, now);
        let record_id = self.settle("register", actor, result)?;

        self.emit(
            Notification::Created {
                record_id,
                author: actor.clone(),
                content_ref,
            },
            now,
        );
        Ok(record_id)
    }

    /// Publishes a new version of `record_id`. The old record stays active.
    pub fn update(
        &mut self,
        actor: &ActorId,
        record_id: RecordId,
        revision: Revision,
        fee: FeeProof,
    ) -> RegistryResult<RecordId> {
        let now = (self.clock)();
        let result = self.records.update(actor, record_id, revision, fee, now);
        let new_id = self.settle("update", actor, result)?;

        self.emit(
            Notification::Updated {
                old_id: record_id,
                new_id,
                author: actor.clone(),
            },
            now,
        );
        Ok(new_id)
    }

    /// Forks an active record into a new record owned by `actor`.
    pub fn fork(
        &mut self,
        actor: &ActorId,
        parent_id: RecordId,
        revision: Revision,
        fee: FeeProof,
    ) -> RegistryResult<RecordId> {
        let now = (self.clock)();
        let result = self.records.fork(actor, parent_id, revision, fee, now);
        let new_id = self.settle("fork", actor, result)?;

        self.emit(
            Notification::Forked {
                parent_id,
                new_id,
                author: actor.clone(),
            },
            now,
        );
        Ok(new_id)
    }

    pub fn deactivate(&mut self, actor: &ActorId, record_id: RecordId) -> RegistryResult<()> {
        let now = (self.clock)();
        let result = self.records.deactivate(actor, record_id, now);
        self.settle("deactivate", actor, result)?;

        self.emit(
            Notification::Deactivated {
                record_id,
                author: actor.clone(),
            },
            now,
        );
        Ok(())
    }

    // =========================================================================
    // Votes
    // =========================================================================

    /// Casts a weighted vote and returns the weight applied.
    ///
    /// An unavailable reputation source degrades the weight to 1; it never
    /// fails the vote.
    pub fn cast_vote(
        &mut self,
        actor: &ActorId,
        record_id: RecordId,
        direction: VoteDirection,
    ) -> RegistryResult<u64> {
        let now = (self.clock)();
        let result = self.try_cast_vote(actor, record_id, direction);
        let weight = self.settle("cast_vote", actor, result)?;

        self.emit(
            Notification::VoteCast {
                record_id,
                voter: actor.clone(),
                direction,
                weight,
            },
            now,
        );
        Ok(weight)
    }

    fn try_cast_vote(
        &mut self,
        actor: &ActorId,
        record_id: RecordId,
        direction: VoteDirection,
    ) -> RegistryResult<u64> {
        let record = self.records.get(record_id)?;
        let oracle = self.oracle.as_ref();
        let metrics = &self.metrics;

        self.votes.cast(record, actor, direction, || {
            let weight = resolve_weight(oracle, actor);
            if let VoteWeight::Fallback(reason) = &weight {
                metrics.increment_oracle_fallbacks();
                let record = record_id.to_string();
                let reason = reason.to_string();
                log_event_with_fields(
                    Event::OracleFallback,
                    &[
                        ("record_id", record.as_str()),
                        ("voter", actor.as_str()),
                        ("reason", reason.as_str()),
                    ],
                );
            }
            weight.value()
        })
    }

    /// Clears `actor`'s vote flag. The score keeps the vote's contribution.
    pub fn remove_vote(&mut self, actor: &ActorId, record_id: RecordId) -> RegistryResult<()> {
        let now = (self.clock)();
        let result = self
            .records
            .get(record_id)
            .map(|_| ())
            .and_then(|()| self.votes.remove(record_id, actor));
        self.settle("remove_vote", actor, result)?;

        self.emit(
            Notification::VoteRemoved {
                record_id,
                voter: actor.clone(),
            },
            now,
        );
        Ok(())
    }

    // =========================================================================
    // Comments
    // =========================================================================

    /// Comments on an active record. `parent_id` 0 means top-level.
    pub fn add_comment(
        &mut self,
        actor: &ActorId,
        record_id: RecordId,
        content_ref: ContentRef,
        parent_id: CommentId,
    ) -> RegistryResult<CommentId> {
        let now = (self.clock)();
        let result = match self.records.get(record_id) {
            Ok(record) => self.comments.add(record, actor, content_ref, parent_id, now),
            Err(e) => Err(e),
        };
        let comment_id = self.settle("add_comment", actor, result)?;

        self.emit(
            Notification::CommentAdded {
                record_id,
                comment_id,
                author: actor.clone(),
                parent_id,
            },
            now,
        );
        Ok(comment_id)
    }

    // =========================================================================
    // Reviews
    // =========================================================================

    pub fn register_reviewer(&mut self, admin: &ActorId, reviewer: ActorId) -> RegistryResult<()> {
        let now = (self.clock)();
        let result = self.require_admin(admin);
        self.settle("register_reviewer", admin, result)?;

        self.reviews.register(reviewer.clone());
        self.emit(Notification::ReviewerRegistered { reviewer }, now);
        Ok(())
    }

    pub fn unregister_reviewer(&mut self, admin: &ActorId, reviewer: &ActorId) -> RegistryResult<()> {
        let now = (self.clock)();
        let result = self.require_admin(admin);
        self.settle("unregister_reviewer", admin, result)?;

        self.reviews.unregister(reviewer);
        self.emit(
            Notification::ReviewerUnregistered {
                reviewer: reviewer.clone(),
            },
            now,
        );
        Ok(())
    }

    /// Appends `actor` to the record's review log. Inactive records qualify.
    pub fn mark_reviewed(&mut self, actor: &ActorId, record_id: RecordId) -> RegistryResult<()> {
        let now = (self.clock)();
        let result = if !self.reviews.is_reviewer(actor) {
            Err(RegistryError::not_reviewer(actor))
        } else {
            match self.records.get(record_id) {
                Ok(record) => self.reviews.mark_reviewed(record, actor),
                Err(e) => Err(e),
            }
        };
        self.settle("mark_reviewed", actor, result)?;

        self.emit(
            Notification::Reviewed {
                record_id,
                reviewer: actor.clone(),
            },
            now,
        );
        Ok(())
    }

    // =========================================================================
    // Administration
    // =========================================================================

    pub fn set_language_supported(
        &mut self,
        admin: &ActorId,
        language: Language,
        supported: bool,
    ) -> RegistryResult<()> {
        let now = (self.clock)();
        let result = self.require_admin(admin);
        self.settle("set_language_supported", admin, result)?;

        self.records.policy_mut().languages.set(language, supported);
        self.emit(Notification::LanguageSupportChanged { language, supported }, now);
        Ok(())
    }

    pub fn set_category_supported(
        &mut self,
        admin: &ActorId,
        category: Category,
        supported: bool,
    ) -> RegistryResult<()> {
        let now = (self.clock)();
        let result = self.require_admin(admin);
        self.settle("set_category_supported", admin, result)?;

        self.records.policy_mut().categories.set(category, supported);
        self.emit(Notification::CategorySupportChanged { category, supported }, now);
        Ok(())
    }

    pub fn set_posting_fee(&mut self, admin: &ActorId, fee: Balance) -> RegistryResult<()> {
        let now = (self.clock)();
        let result = self.require_admin(admin);
        self.settle("set_posting_fee", admin, result)?;

        let old_fee = std::mem::replace(&mut self.records.policy_mut().posting_fee, fee);
        self.emit(
            Notification::PostingFeeChanged {
                old_fee,
                new_fee: fee,
            },
            now,
        );
        Ok(())
    }

    /// Hands administration to `new_admin`. The caller loses admin rights.
    pub fn transfer_admin(&mut self, admin: &ActorId, new_admin: ActorId) -> RegistryResult<()> {
        let now = (self.clock)();
        let result = self.require_admin(admin).and_then(|()| {
            if new_admin.as_str().is_empty() {
                Err(RegistryError::invalid_input("New admin must not be empty"))
            } else {
                Ok(())
            }
        });
        self.settle("transfer_admin", admin, result)?;

        let previous = std::mem::replace(&mut self.admin, new_admin.clone());
        self.emit(
            Notification::AdminTransferred {
                previous,
                current: new_admin,
            },
            now,
        );
        Ok(())
    }

    fn require_admin(&self, actor: &ActorId) -> RegistryResult<()> {
        if actor != &self.admin {
            return Err(RegistryError::not_admin(actor));
        }
        Ok(())
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn record(&self, record_id: RecordId) -> RegistryResult<&Record> {
        self.records.get(record_id)
    }

    /// Every record `author` created, active or not, oldest first.
    pub fn records_by_author(&self, author: &ActorId) -> &[RecordId] {
        self.records.by_author(author)
    }

    pub fn records_by_language(&self, language: Language) -> &[RecordId] {
        self.records.by_language(language)
    }

    pub fn records_by_category(&self, category: Category) -> &[RecordId] {
        self.records.by_category(category)
    }

    /// Active ids among `offset + 1 ..= offset + limit`.
    pub fn active_records(&self, offset: u64, limit: u64) -> Vec<RecordId> {
        self.records.active_records(offset, limit)
    }

    pub fn vote_stats(&self, record_id: RecordId) -> RegistryResult<VoteStats> {
        self.records.get(record_id)?;
        Ok(self.votes.stats(record_id))
    }

    pub fn has_voted(&self, record_id: RecordId, actor: &ActorId) -> bool {
        self.votes.has_voted(record_id, actor)
    }

    /// Lazy sequence of the record's comment ids, oldest first.
    pub fn comments(&self, record_id: RecordId) -> RegistryResult<CommentIds<'_>> {
        self.records.get(record_id)?;
        Ok(self.comments.ids_for(record_id))
    }

    pub fn comment(&self, comment_id: CommentId) -> RegistryResult<&Comment> {
        self.comments.get(comment_id)
    }

    pub fn comment_count(&self, record_id: RecordId) -> usize {
        self.comments.count_for(record_id)
    }

    /// Review log of a record, duplicates included.
    pub fn reviewers(&self, record_id: RecordId) -> RegistryResult<&[ActorId]> {
        self.records.get(record_id)?;
        Ok(self.reviews.reviewers_of(record_id))
    }

    pub fn is_reviewer(&self, actor: &ActorId) -> bool {
        self.reviews.is_reviewer(actor)
    }

    pub fn total_records(&self) -> u64 {
        self.records.total_records()
    }

    pub fn active_record_count(&self) -> u64 {
        self.records.active_count()
    }

    pub fn posting_fee(&self) -> Balance {
        self.records.policy().posting_fee
    }

    pub fn max_versions(&self) -> usize {
        self.records.policy().max_versions
    }

    pub fn is_language_supported(&self, language: Language) -> bool {
        self.records.policy().languages.contains(language)
    }

    pub fn is_category_supported(&self, category: Category) -> bool {
        self.records.policy().categories.contains(category)
    }

    pub fn admin(&self) -> &ActorId {
        &self.admin
    }

    /// Notifications with a sequence number greater than `sequence`
    pub fn notifications_since(&self, sequence: u64) -> &[NotificationEnvelope] {
        self.notifications.since(sequence)
    }

    pub fn metrics(&self) -> &MetricsRegistry {
        &self.metrics
    }

    pub(crate) fn store(&self) -> &RecordStore<T> {
        &self.records
    }

    pub(crate) fn vote_ledger(&self) -> &VoteLedger {
        &self.votes
    }

    pub(crate) fn comment_thread(&self) -> &CommentThread {
        &self.comments
    }

    pub(crate) fn review_coordinator(&self) -> &ReviewCoordinator {
        &self.reviews
    }

    pub(crate) fn notification_log(&self) -> &NotificationLog {
        &self.notifications
    }

    // =========================================================================
    // Bookkeeping
    // =========================================================================

    fn settle<R>(
        &self,
        operation: &str,
        actor: &ActorId,
        result: RegistryResult<R>,
    ) -> RegistryResult<R> {
        if let Err(err) = &result {
            self.metrics.increment_operations_rejected();
            let record = err.record_id().map(|id| id.to_string()).unwrap_or_default();
            log_event_with_fields(
                Event::OperationRejected,
                &[
                    ("operation", operation),
                    ("actor", actor.as_str()),
                    ("code", err.code().code()),
                    ("message", err.message()),
                    ("record_id", record.as_str()),
                ],
            );
        }
        result
    }

    fn emit(&mut self, notification: Notification, now: DateTime<Utc>) {
        match &notification {
            Notification::Created { .. } => self.metrics.increment_records_created(),
            Notification::Updated { .. } => self.metrics.increment_records_updated(),
            Notification::Forked { .. } => self.metrics.increment_records_forked(),
            Notification::Deactivated { .. } => self.metrics.increment_records_deactivated(),
            Notification::VoteCast { .. } => self.metrics.increment_votes_cast(),
            Notification::VoteRemoved { .. } => self.metrics.increment_votes_removed(),
            Notification::CommentAdded { .. } => self.metrics.increment_comments_added(),
            Notification::Reviewed { .. } => self.metrics.increment_reviews_marked(),
            _ => self.metrics.increment_admin_changes(),
        }
        self.metrics.set_active_records(self.records.active_count());

        let envelope = self.notifications.append(notification, now);
        let sequence = envelope.sequence.to_string();
        let record = envelope
            .notification
            .record_id()
            .map(|id| id.to_string())
            .unwrap_or_default();
        let (payload_key, payload) = payload_field(&envelope.notification);
        Logger::info(
            envelope.notification.name(),
            &[
                ("sequence", sequence.as_str()),
                ("record_id", record.as_str()),
                (payload_key, payload.as_str()),
            ],
        );
    }
}

/// Log field carrying `value` as JSON, or the encode error in its place.
fn payload_field<S: Serialize>(value: &S) -> (&'static str, String) {
    match serde_json::to_string(value) {
        Ok(payload) => ("payload", payload),
        Err(e) => ("payload_error", e.to_string()),
    }
}
