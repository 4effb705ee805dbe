//! Threaded comments
//!
//! Comments live in one append-only arena with a global id space, plus an
//! index from record to the ids attached to it in insertion order. Existing
//! entries are never mutated or reordered.
//!
//! A non-zero `parent_id` is only range-checked against the global counter.
//! It may name a comment on a different record.

use std::collections::BTreeMap;
use std::iter::FusedIterator;
use std::slice;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::registry::{
    ActorId, CommentId, ContentRef, Record, RecordId, RegistryError, RegistryResult,
};

/// A stored comment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub record_id: RecordId,
    pub author: ActorId,
    pub content_ref: ContentRef,
    pub timestamp: DateTime<Utc>,
    /// `CommentId::TOP_LEVEL` for a top-level comment
    pub parent_id: CommentId,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentThread {
    comments: Vec<Comment>,
    by_record: BTreeMap<RecordId, Vec<CommentId>>,
}

impl CommentThread {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches a comment to an active record and returns its id.
    pub fn add(
        &mut self,
        record: &Record,
        author: &ActorId,
        content_ref: ContentRef,
        parent_id: CommentId,
        now: DateTime<Utc>,
    ) -> RegistryResult<CommentId> {
        if !record.active {
            return Err(RegistryError::record_inactive(record.id));
        }
        if content_ref.is_empty() {
            return Err(RegistryError::empty_comment());
        }
        let counter = self.total();
        if !parent_id.is_top_level() && parent_id.value() > counter {
            return Err(RegistryError::invalid_parent_comment(parent_id, counter));
        }

        let id = CommentId::new(counter + 1);
        self.comments.push(Comment {
            id,
            record_id: record.id,
            author: author.clone(),
            content_ref,
            timestamp: now,
            parent_id,
        });
        self.by_record.entry(record.id).or_default().push(id);
        Ok(id)
    }

    pub fn get(&self, comment_id: CommentId) -> RegistryResult<&Comment> {
        if comment_id.is_top_level() {
            return Err(RegistryError::comment_not_found(comment_id));
        }
        self.comments
            .get(comment_id.value() as usize - 1)
            .ok_or_else(|| RegistryError::comment_not_found(comment_id))
    }

    /// Ids of every comment on `record_id`, oldest first.
    pub fn ids_for(&self, record_id: RecordId) -> CommentIds<'_> {
        let ids = self
            .by_record
            .get(&record_id)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        CommentIds { inner: ids.iter() }
    }

    pub fn count_for(&self, record_id: RecordId) -> usize {
        self.by_record.get(&record_id).map(Vec::len).unwrap_or(0)
    }

    /// Global comment counter
    pub fn total(&self) -> u64 {
        self.comments.len() as u64
    }

    /// Checks the arena is dense, every comment names a record in
    /// `1..=max_record_id` and an earlier parent, and the record index lists
    /// exactly the comments attached to each record.
    pub fn verify(&self, max_record_id: u64) -> RegistryResult<()> {
        let mut expected: BTreeMap<RecordId, Vec<CommentId>> = BTreeMap::new();

        for (position, comment) in self.comments.iter().enumerate() {
            if comment.id.value() != position as u64 + 1 {
                return Err(RegistryError::invalid_input(format!(
                    "Comment at position {} has id {}",
                    position, comment.id
                )));
            }
            if comment.record_id.is_zero() || comment.record_id.value() > max_record_id {
                return Err(RegistryError::invalid_input(format!(
                    "Comment {} is attached to unknown record {}",
                    comment.id, comment.record_id
                )));
            }
            if !comment.parent_id.is_top_level() && comment.parent_id >= comment.id {
                return Err(RegistryError::invalid_input(format!(
                    "Comment {} has parent {} which is not an earlier comment",
                    comment.id, comment.parent_id
                )));
            }
            expected.entry(comment.record_id).or_default().push(comment.id);
        }

        if expected != self.by_record {
            return Err(RegistryError::invalid_input(
                "Comment index does not match the comments' records",
            ));
        }
        Ok(())
    }
}

/// Lazy, finite sequence of comment ids on one record.
///
/// Cloning yields an independent cursor from the same position, and calling
/// `CommentThread::ids_for` again restarts from the first comment.
#[derive(Debug, Clone)]
pub struct CommentIds<'a> {
    inner: slice::Iter<'a, CommentId>,
}

impl Iterator for CommentIds<'_> {
    type Item = CommentId;

    fn next(&mut self) -> Option<CommentId> {
        self.inner.next().copied()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for CommentIds<'_> {}

impl FusedIterator for CommentIds<'_> {}
