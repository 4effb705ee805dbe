//! Request protocol of `snipreg exec`
//!
//! One JSON object per line, selected by `op`:
//!
//! ```json
//! {"op": "register", "actor": "alice", "content_ref": "sha256:..", "title": "SafeMath",
//!  "language": "solidity", "category": "utility", "dependencies": [1], "fee": "0"}
//! {"op": "cast_vote", "actor": "bob", "record_id": 1, "upvote": true}
//! {"op": "get_record", "record_id": 1}
//! ```
//!
//! Mutating requests answer with the sequence number of the notification
//! they emitted.

use serde::Deserialize;
use serde_json::{json, Value};

use crate::registry::{
    amount, ActorId, Balance, Category, CommentId, ContentRef, FeeProof, Language, NewRecord,
    RecordId, RecordTable, Registry, RegistryResult, Revision,
};
use crate::votes::VoteDirection;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case", deny_unknown_fields)]
pub enum Request {
    Register {
        actor: ActorId,
        content_ref: ContentRef,
        title: String,
        #[serde(default)]
        description: String,
        language: Language,
        category: Category,
        #[serde(default)]
        dependencies: Vec<RecordId>,
        #[serde(default, with = "amount")]
        fee: Balance,
    },
    Update {
        actor: ActorId,
        record_id: RecordId,
        content_ref: ContentRef,
        title: String,
        #[serde(default)]
        description: String,
        #[serde(default)]
        dependencies: Vec<RecordId>,
        #[serde(default, with = "amount")]
        fee: Balance,
    },
    Fork {
        actor: ActorId,
        parent_id: RecordId,
        content_ref: ContentRef,
        title: String,
        #[serde(default)]
        description: String,
        /// Added after the parent's dependencies and the parent itself
        #[serde(default)]
        dependencies: Vec<RecordId>,
        #[serde(default, with = "amount")]
        fee: Balance,
    },
    Deactivate {
        actor: ActorId,
        record_id: RecordId,
    },
    CastVote {
        actor: ActorId,
        record_id: RecordId,
        upvote: bool,
    },
    RemoveVote {
        actor: ActorId,
        record_id: RecordId,
    },
    AddComment {
        actor: ActorId,
        record_id: RecordId,
        content_ref: ContentRef,
        #[serde(default)]
        parent_id: CommentId,
    },
    RegisterReviewer {
        actor: ActorId,
        reviewer: ActorId,
    },
    UnregisterReviewer {
        actor: ActorId,
        reviewer: ActorId,
    },
    MarkReviewed {
        actor: ActorId,
        record_id: RecordId,
    },
    SetLanguageSupported {
        actor: ActorId,
        language: Language,
        supported: bool,
    },
    SetCategorySupported {
        actor: ActorId,
        category: Category,
        supported: bool,
    },
    SetPostingFee {
        actor: ActorId,
        #[serde(with = "amount")]
        fee: Balance,
    },
    TransferAdmin {
        actor: ActorId,
        new_admin: ActorId,
    },

    // Queries
    GetRecord {
        record_id: RecordId,
    },
    RecordsByAuthor {
        author: ActorId,
    },
    RecordsByLanguage {
        language: Language,
    },
    RecordsByCategory {
        category: Category,
    },
    ActiveRecords {
        #[serde(default)]
        offset: u64,
        limit: u64,
    },
    VoteStats {
        record_id: RecordId,
    },
    HasVoted {
        record_id: RecordId,
        actor: ActorId,
    },
    Comments {
        record_id: RecordId,
    },
    GetComment {
        comment_id: CommentId,
    },
    Reviewers {
        record_id: RecordId,
    },
    Notifications {
        #[serde(default)]
        since: u64,
    },
    Stats,
}

impl Request {
    pub fn from_value(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    /// True for requests that can change registry state
    pub fn is_mutating(&self) -> bool {
        !matches!(
            self,
            Request::GetRecord { .. }
                | Request::RecordsByAuthor { .. }
                | Request::RecordsByLanguage { .. }
                | Request::RecordsByCategory { .. }
                | Request::ActiveRecords { .. }
                | Request::VoteStats { .. }
                | Request::HasVoted { .. }
                | Request::Comments { .. }
                | Request::GetComment { .. }
                | Request::Reviewers { .. }
                | Request::Notifications { .. }
                | Request::Stats
        )
    }

    /// Applies the request and returns the response payload.
    pub fn execute<T: RecordTable>(self, registry: &mut Registry<T>) -> RegistryResult<Value> {
        match self {
            Request::Register {
                actor,
                content_ref,
                title,
                description,
                language,
                category,
                dependencies,
                fee,
            } => {
                let input = NewRecord {
                    content_ref,
                    title,
                    description,
                    language,
                    category,
                    dependencies,
                };
                let record_id = registry.register(&actor, input, FeeProof::new(fee))?;
                Ok(json!({ "record_id": record_id, "sequence": last_sequence(registry) }))
            }
            Request::Update {
                actor,
                record_id,
                content_ref,
                title,
                description,
                dependencies,
                fee,
            } => {
                let revision = Revision {
                    content_ref,
                    title,
                    description,
                    dependencies,
                };
                let new_id = registry.update(&actor, record_id, revision, FeeProof::new(fee))?;
                Ok(json!({ "record_id": new_id, "sequence": last_sequence(registry) }))
            }
            Request::Fork {
                actor,
                parent_id,
                content_ref,
                title,
                description,
                dependencies,
                fee,
            } => {
                let revision = Revision {
                    content_ref,
                    title,
                    description,
                    dependencies,
                };
                let new_id = registry.fork(&actor, parent_id, revision, FeeProof::new(fee))?;
                Ok(json!({ "record_id": new_id, "sequence": last_sequence(registry) }))
            }
            Request::Deactivate { actor, record_id } => {
                registry.deactivate(&actor, record_id)?;
                Ok(json!({ "sequence": last_sequence(registry) }))
            }
            Request::CastVote {
                actor,
                record_id,
                upvote,
            } => {
                let weight = registry.cast_vote(&actor, record_id, VoteDirection::from_upvote(upvote))?;
                Ok(json!({ "weight": weight, "sequence": last_sequence(registry) }))
            }
            Request::RemoveVote { actor, record_id } => {
                registry.remove_vote(&actor, record_id)?;
                Ok(json!({ "sequence": last_sequence(registry) }))
            }
            Request::AddComment {
                actor,
                record_id,
                content_ref,
                parent_id,
            } => {
                let comment_id = registry.add_comment(&actor, record_id, content_ref, parent_id)?;
                Ok(json!({ "comment_id": comment_id, "sequence": last_sequence(registry) }))
            }
            Request::RegisterReviewer { actor, reviewer } => {
                registry.register_reviewer(&actor, reviewer)?;
                Ok(json!({ "sequence": last_sequence(registry) }))
            }
            Request::UnregisterReviewer { actor, reviewer } => {
                registry.unregister_reviewer(&actor, &reviewer)?;
                Ok(json!({ "sequence": last_sequence(registry) }))
            }
            Request::MarkReviewed { actor, record_id } => {
                registry.mark_reviewed(&actor, record_id)?;
                Ok(json!({ "sequence": last_sequence(registry) }))
            }
            Request::SetLanguageSupported {
                actor,
                language,
                supported,
            } => {
                registry.set_language_supported(&actor, language, supported)?;
                Ok(json!({ "sequence": last_sequence(registry) }))
            }
            Request::SetCategorySupported {
                actor,
                category,
                supported,
            } => {
                registry.set_category_supported(&actor, category, supported)?;
                Ok(json!({ "sequence": last_sequence(registry) }))
            }
            Request::SetPostingFee { actor, fee } => {
                registry.set_posting_fee(&actor, fee)?;
                Ok(json!({ "sequence": last_sequence(registry) }))
            }
            Request::TransferAdmin { actor, new_admin } => {
                registry.transfer_admin(&actor, new_admin)?;
                Ok(json!({ "sequence": last_sequence(registry) }))
            }

            Request::GetRecord { record_id } => Ok(json!(registry.record(record_id)?)),
            Request::RecordsByAuthor { author } => Ok(json!(registry.records_by_author(&author))),
            Request::RecordsByLanguage { language } => {
                Ok(json!(registry.records_by_language(language)))
            }
            Request::RecordsByCategory { category } => {
                Ok(json!(registry.records_by_category(category)))
            }
            Request::ActiveRecords { offset, limit } => {
                Ok(json!(registry.active_records(offset, limit)))
            }
            Request::VoteStats { record_id } => Ok(json!(registry.vote_stats(record_id)?)),
            Request::HasVoted { record_id, actor } => {
                Ok(json!({ "voted": registry.has_voted(record_id, &actor) }))
            }
            Request::Comments { record_id } => {
                let ids: Vec<CommentId> = registry.comments(record_id)?.collect();
                Ok(json!(ids))
            }
            Request::GetComment { comment_id } => Ok(json!(registry.comment(comment_id)?)),
            Request::Reviewers { record_id } => Ok(json!(registry.reviewers(record_id)?)),
            Request::Notifications { since } => Ok(json!(registry.notifications_since(since))),
            Request::Stats => Ok(stats(registry)),
        }
    }
}

/// Registry-wide counts, as printed by `inspect` and the `stats` request
pub fn stats<T: RecordTable>(registry: &Registry<T>) -> Value {
    json!({
        "admin": registry.admin(),
        "total_records": registry.total_records(),
        "active_records": registry.active_record_count(),
        "max_versions": registry.max_versions(),
        "posting_fee": registry.posting_fee().to_string(),
        "notifications": last_sequence(registry),
        "metrics": registry.metrics().snapshot(),
    })
}

fn last_sequence<T: RecordTable>(registry: &Registry<T>) -> u64 {
    registry
        .notifications_since(0)
        .last()
        .map(|entry| entry.sequence)
        .unwrap_or(0)
}
