//! # Registry Notifications
//!
//! One notification per successful mutating operation, appended to a
//! sequence-numbered log that observers read with `since`.
//!
//! Sequence numbers start at 1, increase by one per entry, and the log is
//! never reordered.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::registry::{amount, ActorId, Balance, Category, CommentId, ContentRef, Language, RecordId};
use crate::votes::VoteDirection;

/// Change described by a notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    Created {
        record_id: RecordId,
        author: ActorId,
        content_ref: ContentRef,
    },
    Updated {
        old_id: RecordId,
        new_id: RecordId,
        author: ActorId,
    },
    Forked {
        parent_id: RecordId,
        new_id: RecordId,
        author: ActorId,
    },
    Deactivated {
        record_id: RecordId,
        author: ActorId,
    },
    VoteCast {
        record_id: RecordId,
        voter: ActorId,
        direction: VoteDirection,
        weight: u64,
    },
    VoteRemoved {
        record_id: RecordId,
        voter: ActorId,
    },
    CommentAdded {
        record_id: RecordId,
        comment_id: CommentId,
        author: ActorId,
        parent_id: CommentId,
    },
    ReviewerRegistered {
        reviewer: ActorId,
    },
    ReviewerUnregistered {
        reviewer: ActorId,
    },
    Reviewed {
        record_id: RecordId,
        reviewer: ActorId,
    },
    LanguageSupportChanged {
        language: Language,
        supported: bool,
    },
    CategorySupportChanged {
        category: Category,
        supported: bool,
    },
    PostingFeeChanged {
        #[serde(with = "amount")]
        old_fee: Balance,
        #[serde(with = "amount")]
        new_fee: Balance,
    },
    AdminTransferred {
        previous: ActorId,
        current: ActorId,
    },
}

impl Notification {
    /// Stable upper-case name, used in log lines
    pub fn name(&self) -> &'static str {
        match self {
            Notification::Created { .. } => "RECORD_CREATED",
            Notification::Updated { .. } => "RECORD_UPDATED",
            Notification::Forked { .. } => "RECORD_FORKED",
            Notification::Deactivated { .. } => "RECORD_DEACTIVATED",
            Notification::VoteCast { .. } => "VOTE_CAST",
            Notification::VoteRemoved { .. } => "VOTE_REMOVED",
            Notification::CommentAdded { .. } => "COMMENT_ADDED",
            Notification::ReviewerRegistered { .. } => "REVIEWER_REGISTERED",
            Notification::ReviewerUnregistered { .. } => "REVIEWER_UNREGISTERED",
            Notification::Reviewed { .. } => "RECORD_REVIEWED",
            Notification::LanguageSupportChanged { .. } => "LANGUAGE_SUPPORT_CHANGED",
            Notification::CategorySupportChanged { .. } => "CATEGORY_SUPPORT_CHANGED",
            Notification::PostingFeeChanged { .. } => "POSTING_FEE_CHANGED",
            Notification::AdminTransferred { .. } => "ADMIN_TRANSFERRED",
        }
    }

    /// The record this notification is about, if any
    pub fn record_id(&self) -> Option<RecordId> {
        match self {
            Notification::Created { record_id, .. }
            | Notification::Deactivated { record_id, .. }
            | Notification::VoteCast { record_id, .. }
            | Notification::VoteRemoved { record_id, .. }
            | Notification::CommentAdded { record_id, .. }
            | Notification::Reviewed { record_id, .. } => Some(*record_id),
            Notification::Updated { new_id, .. } | Notification::Forked { new_id, .. } => {
                Some(*new_id)
            }
            _ => None,
        }
    }
}

/// A notification with its position in the log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationEnvelope {
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    pub notification: Notification,
}

/// Append-only notification log
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationLog {
    entries: Vec<NotificationEnvelope>,
}

impl NotificationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sequence number the next entry will receive
    pub fn next_sequence(&self) -> u64 {
        self.entries.len() as u64 + 1
    }

    pub fn append(&mut self, notification: Notification, timestamp: DateTime<Utc>) -> &NotificationEnvelope {
        let envelope = NotificationEnvelope {
            sequence: self.next_sequence(),
            timestamp,
            notification,
        };
        self.entries.push(envelope);
        &self.entries[self.entries.len() - 1]
    }

    /// Entries with a sequence number greater than `sequence`
    pub fn since(&self, sequence: u64) -> &[NotificationEnvelope] {
        let start = usize::try_from(sequence)
            .unwrap_or(usize::MAX)
            .min(self.entries.len());
        &self.entries[start..]
    }

    pub fn last(&self) -> Option<&NotificationEnvelope> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Checks sequence numbers are exactly `1..=len`.
    pub fn is_contiguous(&self) -> bool {
        self.entries
            .iter()
            .enumerate()
            .all(|(position, entry)| entry.sequence == position as u64 + 1)
    }
}
