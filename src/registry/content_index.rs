//! Content index: content reference -> first registering record
//!
//! Enforces global uniqueness of content references. Entries are never
//! removed, so a deactivated record keeps its content reserved.

use std::collections::HashMap;

use super::errors::{RegistryError, RegistryResult};
use super::types::{ContentRef, RecordId};

#[derive(Debug, Clone, Default)]
pub struct ContentIndex {
    entries: HashMap<ContentRef, RecordId>,
}

impl ContentIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, content_ref: &ContentRef) -> bool {
        self.entries.contains_key(content_ref)
    }

    /// The record that registered this content, if any
    pub fn owner(&self, content_ref: &ContentRef) -> Option<RecordId> {
        self.entries.get(content_ref).copied()
    }

    /// Reserve `content_ref` for `record_id`.
    ///
    /// Callers check `contains` during validation; a failure here means the
    /// pre-check was skipped.
    pub fn reserve(&mut self, content_ref: ContentRef, record_id: RecordId) -> RegistryResult<()> {
        if let Some(existing) = self.owner(&content_ref) {
            return Err(RegistryError::duplicate_content(&content_ref, existing));
        }
        self.entries.insert(content_ref, record_id);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
