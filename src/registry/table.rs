//! Record table and derived secondary indices
//!
//! The table is the source of truth. Secondary indices (author, language,
//! category) and the content index are derived state: they are updated after
//! a table write and can always be rebuilt by scanning the table in id order.
//!
//! # Invariants
//!
//! - Ids are dense and 1-based: record `n` lives at position `n`
//! - `put` either appends the next id or replaces an existing id
//! - Index entries are kept in ascending id order

use std::collections::BTreeMap;

use super::errors::{RegistryError, RegistryResult};
use super::types::{ActorId, Category, Language, Record, RecordId};

/// Storage seam for records.
///
/// The registry only ever calls `get`, `put` and `next_id`, so a host can back
/// it with an in-memory map, an embedded KV store or a ledger table.
pub trait RecordTable {
    /// Look up a record by id
    fn get(&self, id: RecordId) -> Option<&Record>;

    /// Insert the record at `next_id()` or replace an existing record
    fn put(&mut self, record: Record) -> RegistryResult<()>;

    /// The id the next committed record will receive
    fn next_id(&self) -> RecordId;

    /// Highest assigned id, `0` if the table is empty
    fn max_id(&self) -> u64 {
        self.next_id().value() - 1
    }
}

/// In-memory record table backed by a dense vector.
#[derive(Debug, Clone, Default)]
pub struct MemoryRecordTable {
    records: Vec<Record>,
}

impl MemoryRecordTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table from records in id order.
    ///
    /// Fails if ids are not exactly `1..=n`.
    pub fn from_records(records: Vec<Record>) -> RegistryResult<Self> {
        for (position, record) in records.iter().enumerate() {
            let expected = position as u64 + 1;
            if record.id.value() != expected {
                return Err(RegistryError::invalid_input(format!(
                    "Record at position {} has id {}, expected {}",
                    position, record.id, expected
                )));
            }
        }
        Ok(Self { records })
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl RecordTable for MemoryRecordTable {
    fn get(&self, id: RecordId) -> Option<&Record> {
        if id.is_zero() {
            return None;
        }
        self.records.get(id.value() as usize - 1)
    }

    fn put(&mut self, record: Record) -> RegistryResult<()> {
        let next = self.next_id();
        if record.id == next {
            self.records.push(record);
            return Ok(());
        }

        match self.records.get_mut((record.id.value() as usize).wrapping_sub(1)) {
            Some(slot) if !record.id.is_zero() => {
                *slot = record;
                Ok(())
            }
            _ => Err(RegistryError::invalid_input(format!(
                "Cannot place record {} in a table whose next id is {}",
                record.id, next
            ))),
        }
    }

    fn next_id(&self) -> RecordId {
        RecordId::new(self.records.len() as u64 + 1)
    }
}

/// Secondary indices from author, language and category to record ids.
///
/// Append-only: deactivated records stay indexed.
#[derive(Debug, Clone, Default)]
pub struct SecondaryIndex {
    by_author: BTreeMap<ActorId, Vec<RecordId>>,
    by_language: BTreeMap<Language, Vec<RecordId>>,
    by_category: BTreeMap<Category, Vec<RecordId>>,
}

impl SecondaryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index a freshly committed record
    pub fn insert(&mut self, record: &Record) {
        self.by_author
            .entry(record.author.clone())
            .or_default()
            .push(record.id);
        self.by_language
            .entry(record.language)
            .or_default()
            .push(record.id);
        self.by_category
            .entry(record.category)
            .or_default()
            .push(record.id);
    }

    pub fn by_author(&self, author: &ActorId) -> &[RecordId] {
        self.by_author.get(author).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn by_language(&self, language: Language) -> &[RecordId] {
        self.by_language.get(&language).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn by_category(&self, category: Category) -> &[RecordId] {
        self.by_category.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn clear(&mut self) {
        self.by_author.clear();
        self.by_language.clear();
        self.by_category.clear();
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::registry::types::ContentRef;
    use chrono::Utc;

    pub(crate) fn record(id: u64, author: &str) -> Record {
        let now = Utc::now();
        Record {
            id: RecordId::new(id),
            author: ActorId::new(author),
            content_ref: ContentRef::new(format!("ref-{}", id)),
            title: format!("snippet {}", id),
            description: String::new(),
            language: Language::Rust,
            category: Category::Utility,
            dependencies: Vec::new(),
            version_chain: Vec::new(),
            active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_empty_table_ids() {
        let table = MemoryRecordTable::new();
        assert_eq!(table.next_id(), RecordId::new(1));
        assert_eq!(table.max_id(), 0);
        assert!(table.get(RecordId::new(0)).is_none());
        assert!(table.get(RecordId::new(1)).is_none());
    }

    #[test]
    fn test_put_appends_next_id() {
        let mut table = MemoryRecordTable::new();
        table.put(record(1, "alice")).unwrap();
        table.put(record(2, "bob")).unwrap();

        assert_eq!(table.next_id(), RecordId::new(3));
        assert_eq!(table.get(RecordId::new(2)).unwrap().author.as_str(), "bob");
    }

    #[test]
    fn test_put_replaces_existing() {
        let mut table = MemoryRecordTable::new();
        table.put(record(1, "alice")).unwrap();

        let mut replaced = record(1, "alice");
        replaced.active = false;
        table.put(replaced).unwrap();

        assert_eq!(table.len(), 1);
        assert!(!table.get(RecordId::new(1)).unwrap().active);
    }

    #[test]
    fn test_put_rejects_gaps_and_zero() {
        let mut table = MemoryRecordTable::new();
        assert!(table.put(record(2, "alice")).is_err());
        assert!(table.put(record(0, "alice")).is_err());
        assert!(table.is_empty());
    }

    #[test]
    fn test_from_records_requires_dense_ids() {
        assert!(MemoryRecordTable::from_records(vec![record(1, "a"), record(2, "b")]).is_ok());
        assert!(MemoryRecordTable::from_records(vec![record(1, "a"), record(3, "b")]).is_err());
        assert!(MemoryRecordTable::from_records(vec![record(2, "a")]).is_err());
    }

    #[test]
    fn test_secondary_index_lookup() {
        let mut index = SecondaryIndex::new();
        let mut second = record(2, "alice");
        second.language = Language::Solidity;
        second.category = Category::DeFi;

        index.insert(&record(1, "alice"));
        index.insert(&second);
        index.insert(&record(3, "bob"));

        assert_eq!(
            index.by_author(&ActorId::new("alice")),
            &[RecordId::new(1), RecordId::new(2)]
        );
        assert_eq!(index.by_language(Language::Solidity), &[RecordId::new(2)]);
        assert_eq!(
            index.by_category(Category::Utility),
            &[RecordId::new(1), RecordId::new(3)]
        );
        assert!(index.by_author(&ActorId::new("carol")).is_empty());

        index.clear();
        assert!(index.by_language(Language::Rust).is_empty());
    }
}
