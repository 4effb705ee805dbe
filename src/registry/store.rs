//! RecordStore: creation, versioning, forking and deactivation of records
//!
//! Every mutating operation runs in two phases:
//! 1. Validate against current state. Any failure returns before a write.
//! 2. Commit: table first, then the content index and secondary indices.
//!
//! Update and fork allocate a new id. The record being superseded or forked
//! is left exactly as it was, including its `active` flag.

use chrono::{DateTime, Utc};

use super::content_index::ContentIndex;
use super::dependency::{fork_dependencies, DependencyValidator};
use super::errors::{RegistryError, RegistryResult};
use super::supported::SupportedSet;
use super::table::{RecordTable, SecondaryIndex};
use super::types::{
    ActorId, Balance, Category, ContentRef, FeeProof, Language, NewRecord, Record, RecordId,
    Revision,
};

/// Admin-tunable acceptance rules for new records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordPolicy {
    /// Upper bound on `version_chain.len()`
    pub max_versions: usize,
    /// Minimum fee acknowledgment for register, update and fork
    pub posting_fee: Balance,
    pub languages: SupportedSet<Language>,
    pub categories: SupportedSet<Category>,
}

impl Default for RecordPolicy {
    fn default() -> Self {
        Self {
            max_versions: 10,
            posting_fee: 0,
            languages: SupportedSet::new(Language::ALL),
            categories: SupportedSet::new(Category::ALL),
        }
    }
}

/// Owns the record table and everything derived from it.
#[derive(Debug)]
pub struct RecordStore<T: RecordTable> {
    table: T,
    content: ContentIndex,
    index: SecondaryIndex,
    active_count: u64,
    policy: RecordPolicy,
}

impl<T: RecordTable + Default> RecordStore<T> {
    /// Empty store over a fresh table.
    pub fn new(policy: RecordPolicy) -> Self {
        Self {
            table: T::default(),
            content: ContentIndex::new(),
            index: SecondaryIndex::new(),
            active_count: 0,
            policy,
        }
    }
}

impl<T: RecordTable> RecordStore<T> {
    /// Opens a store over `table`, rebuilding all derived state.
    ///
    /// Fails if the table breaks content uniqueness or the dependency and
    /// version ordering rules.
    pub fn open(table: T, policy: RecordPolicy) -> RegistryResult<Self> {
        let mut store = Self {
            table,
            content: ContentIndex::new(),
            index: SecondaryIndex::new(),
            active_count: 0,
            policy,
        };
        store.rebuild()?;
        Ok(store)
    }

    fn rebuild(&mut self) -> RegistryResult<()> {
        self.content.clear();
        self.index.clear();
        self.active_count = 0;

        for raw in 1..=self.table.max_id() {
            let id = RecordId::new(raw);
            let record = self
                .table
                .get(id)
                .ok_or_else(|| RegistryError::invalid_input(format!("Record {} missing from table", id)))?;

            if record.id != id {
                return Err(RegistryError::invalid_input(format!(
                    "Record stored at {} claims id {}",
                    id, record.id
                )));
            }
            if let Some(bad) = record
                .dependencies
                .iter()
                .chain(record.version_chain.iter())
                .find(|other| other.is_zero() || **other >= id)
            {
                return Err(RegistryError::invalid_input(format!(
                    "Record {} references {} which is not an earlier record",
                    id, bad
                )));
            }

            for (position, dependency) in record.dependencies.iter().enumerate() {
                if record.dependencies[..position].contains(dependency) {
                    return Err(RegistryError::invalid_input(format!(
                        "Record {} lists dependency {} more than once",
                        id, dependency
                    )));
                }
            }

            self.content.reserve(record.content_ref.clone(), id)?;
            self.index.insert(record);
            if record.active {
                self.active_count += 1;
            }
        }

        Ok(())
    }

    /// Registers a brand new record.
    pub fn register(
        &mut self,
        author: &ActorId,
        input: NewRecord,
        fee: FeeProof,
        now: DateTime<Utc>,
    ) -> RegistryResult<RecordId> {
        self.check_content(&input.content_ref, &input.title)?;
        if !self.policy.languages.contains(input.language) {
            return Err(RegistryError::unsupported_language(input.language));
        }
        if !self.policy.categories.contains(input.category) {
            return Err(RegistryError::unsupported_category(input.category));
        }
        self.check_fee(fee)?;
        DependencyValidator::new(&self.table).validate(&input.dependencies)?;

        let record = Record {
            id: self.table.next_id(),
            author: author.clone(),
            content_ref: input.content_ref,
            title: input.title,
            description: input.description,
            language: input.language,
            category: input.category,
            dependencies: input.dependencies,
            version_chain: Vec::new(),
            active: true,
            created_at: now,
            updated_at: now,
        };
        self.commit(record)
    }

    /// Publishes a new version of `record_id` as a new record.
    ///
    /// Only the author may update. The new record inherits language and
    /// category and extends the version chain with `record_id`. The old record
    /// stays active.
    pub fn update(
        &mut self,
        actor: &ActorId,
        record_id: RecordId,
        revision: Revision,
        fee: FeeProof,
        now: DateTime<Utc>,
    ) -> RegistryResult<RecordId> {
        let previous = self.get(record_id)?;
        if &previous.author != actor {
            return Err(RegistryError::not_author(actor, record_id));
        }
        if !previous.active {
            return Err(RegistryError::record_inactive(record_id));
        }
        self.check_content(&revision.content_ref, &revision.title)?;
        if previous.version_chain.len() >= self.policy.max_versions {
            return Err(RegistryError::version_limit(record_id, self.policy.max_versions));
        }
        self.check_fee(fee)?;
        DependencyValidator::new(&self.table).validate(&revision.dependencies)?;

        let mut version_chain = previous.version_chain.clone();
        version_chain.push(record_id);

        let record = Record {
            id: self.table.next_id(),
            author: actor.clone(),
            content_ref: revision.content_ref,
            title: revision.title,
            description: revision.description,
            language: previous.language,
            category: previous.category,
            dependencies: revision.dependencies,
            version_chain,
            active: true,
            created_at: now,
            updated_at: now,
        };
        self.commit(record)
    }

    /// Forks `parent_id` into a new record owned by `actor`.
    ///
    /// The new record depends on the parent's dependencies, the parent, and
    /// `revision.dependencies`, in that order.
    pub fn fork(
        &mut self,
        actor: &ActorId,
        parent_id: RecordId,
        revision: Revision,
        fee: FeeProof,
        now: DateTime<Utc>,
    ) -> RegistryResult<RecordId> {
        let parent = self.require_active(parent_id)?;
        self.check_content(&revision.content_ref, &revision.title)?;
        self.check_fee(fee)?;

        let dependencies = fork_dependencies(parent, &revision.dependencies);
        DependencyValidator::new(&self.table).validate(&dependencies)?;

        let record = Record {
            id: self.table.next_id(),
            author: actor.clone(),
            content_ref: revision.content_ref,
            title: revision.title,
            description: revision.description,
            language: parent.language,
            category: parent.category,
            dependencies,
            version_chain: Vec::new(),
            active: true,
            created_at: now,
            updated_at: now,
        };
        self.commit(record)
    }

    /// Marks a record inactive. Terminal.
    pub fn deactivate(
        &mut self,
        actor: &ActorId,
        record_id: RecordId,
        now: DateTime<Utc>,
    ) -> RegistryResult<()> {
        let current = self.get(record_id)?;
        if &current.author != actor {
            return Err(RegistryError::not_author(actor, record_id));
        }
        if !current.active {
            return Err(RegistryError::record_inactive(record_id));
        }

        let mut retired = current.clone();
        retired.active = false;
        retired.updated_at = now;
        self.table.put(retired)?;
        self.active_count -= 1;
        Ok(())
    }

    fn check_content(&self, content_ref: &ContentRef, title: &str) -> RegistryResult<()> {
        if content_ref.is_empty() {
            return Err(RegistryError::empty_content_ref());
        }
        if title.is_empty() {
            return Err(RegistryError::empty_title());
        }
        if let Some(existing) = self.content.owner(content_ref) {
            return Err(RegistryError::duplicate_content(content_ref, existing));
        }
        Ok(())
    }

    fn check_fee(&self, fee: FeeProof) -> RegistryResult<()> {
        if !fee.covers(self.policy.posting_fee) {
            return Err(RegistryError::insufficient_fee(self.policy.posting_fee, fee.paid));
        }
        Ok(())
    }

    fn commit(&mut self, record: Record) -> RegistryResult<RecordId> {
        let id = record.id;
        // The table write goes first: derived state only follows a stored
        // record. The content was checked unreserved during validation.
        self.table.put(record.clone())?;
        self.content.reserve(record.content_ref.clone(), id)?;
        self.index.insert(&record);
        self.active_count += 1;
        Ok(id)
    }

    pub fn get(&self, record_id: RecordId) -> RegistryResult<&Record> {
        self.table
            .get(record_id)
            .ok_or_else(|| RegistryError::record_not_found(record_id))
    }

    /// Fetches a record that must still be active.
    pub fn require_active(&self, record_id: RecordId) -> RegistryResult<&Record> {
        let record = self.get(record_id)?;
        if !record.active {
            return Err(RegistryError::record_inactive(record_id));
        }
        Ok(record)
    }

    pub fn by_author(&self, author: &ActorId) -> &[RecordId] {
        self.index.by_author(author)
    }

    pub fn by_language(&self, language: Language) -> &[RecordId] {
        self.index.by_language(language)
    }

    pub fn by_category(&self, category: Category) -> &[RecordId] {
        self.index.by_category(category)
    }

    /// Active records among ids `offset + 1 ..= offset + limit`.
    ///
    /// The window is over the id range, so a page can hold fewer than
    /// `limit` entries when some ids in it are inactive.
    pub fn active_records(&self, offset: u64, limit: u64) -> Vec<RecordId> {
        let first = offset.saturating_add(1);
        let last = offset.saturating_add(limit).min(self.table.max_id());

        (first..=last)
            .map(RecordId::new)
            .filter(|id| self.table.get(*id).map(|r| r.active).unwrap_or(false))
            .collect()
    }

    pub fn contains_content(&self, content_ref: &ContentRef) -> bool {
        self.content.contains(content_ref)
    }

    /// Highest id ever assigned
    pub fn total_records(&self) -> u64 {
        self.table.max_id()
    }

    pub fn active_count(&self) -> u64 {
        self.active_count
    }

    pub fn policy(&self) -> &RecordPolicy {
        &self.policy
    }

    pub(crate) fn policy_mut(&mut self) -> &mut RecordPolicy {
        &mut self.policy
    }

    pub fn table(&self) -> &T {
        &self.table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::table::MemoryRecordTable;
    use crate::registry::RegistryErrorCode;

    fn store() -> RecordStore<MemoryRecordTable> {
        RecordStore::open(MemoryRecordTable::new(), RecordPolicy::default()).unwrap()
    }

    fn alice() -> ActorId {
        ActorId::new("alice")
    }

    fn new_record(content: &str, deps: &[u64]) -> NewRecord {
        NewRecord {
            content_ref: ContentRef::new(content),
            title: format!("title {}", content),
            description: String::new(),
            language: Language::Solidity,
            category: Category::DeFi,
            dependencies: deps.iter().copied().map(RecordId::new).collect(),
        }
    }

    fn revision(content: &str, deps: &[u64]) -> Revision {
        Revision {
            content_ref: ContentRef::new(content),
            title: format!("title {}", content),
            description: String::new(),
            dependencies: deps.iter().copied().map(RecordId::new).collect(),
        }
    }

    #[test]
    fn test_register_assigns_increasing_ids() {
        let mut store = store();
        let now = Utc::now();
        let first = store.register(&alice(), new_record("a", &[]), FeeProof::none(), now).unwrap();
        let second = store.register(&alice(), new_record("b", &[]), FeeProof::none(), now).unwrap();

        assert_eq!(first, RecordId::new(1));
        assert_eq!(second, RecordId::new(2));
        assert_eq!(store.active_count(), 2);
        assert_eq!(store.total_records(), 2);
        assert!(store.contains_content(&ContentRef::new("a")));
    }

    #[test]
    fn test_register_rejections_leave_no_trace() {
        let mut store = store();
        let now = Utc::now();
        store.register(&alice(), new_record("a", &[]), FeeProof::none(), now).unwrap();

        let mut empty_title = new_record("b", &[]);
        empty_title.title.clear();
        let failures = [
            new_record("", &[]),
            empty_title,
            new_record("a", &[]),
            new_record("c", &[1, 1]),
            new_record("d", &[5]),
        ];
        for input in failures {
            assert!(store.register(&alice(), input, FeeProof::none(), now).is_err());
        }

        assert_eq!(store.total_records(), 1);
        assert_eq!(store.active_count(), 1);
        assert!(!store.contains_content(&ContentRef::new("c")));
        assert!(!store.contains_content(&ContentRef::new("d")));
        assert_eq!(store.by_author(&alice()).len(), 1);
    }

    #[test]
    fn test_register_checks_supported_sets_and_fee() {
        let mut policy = RecordPolicy::default();
        policy.languages.set(Language::Solidity, false);
        policy.posting_fee = 100;
        let mut store = RecordStore::open(MemoryRecordTable::new(), policy).unwrap();
        let now = Utc::now();

        let err = store
            .register(&alice(), new_record("a", &[]), FeeProof::new(100), now)
            .unwrap_err();
        assert_eq!(err.code(), RegistryErrorCode::UnsupportedLanguage);

        store.policy_mut().languages.set(Language::Solidity, true);
        store.policy_mut().categories.set(Category::DeFi, false);
        let err = store
            .register(&alice(), new_record("a", &[]), FeeProof::new(100), now)
            .unwrap_err();
        assert_eq!(err.code(), RegistryErrorCode::UnsupportedCategory);

        store.policy_mut().categories.set(Category::DeFi, true);
        let err = store
            .register(&alice(), new_record("a", &[]), FeeProof::new(99), now)
            .unwrap_err();
        assert_eq!(err.code(), RegistryErrorCode::InsufficientFee);

        assert!(store
            .register(&alice(), new_record("a", &[]), FeeProof::new(100), now)
            .is_ok());
    }

    #[test]
    fn test_update_creates_sibling_and_keeps_original_active() {
        let mut store = store();
        let now = Utc::now();
        let original = store.register(&alice(), new_record("a", &[]), FeeProof::none(), now).unwrap();

        let next = store
            .update(&alice(), original, revision("a2", &[]), FeeProof::none(), now)
            .unwrap();

        let updated = store.get(next).unwrap();
        assert_eq!(updated.version_chain, vec![original]);
        assert_eq!(updated.language, Language::Solidity);
        assert_eq!(updated.category, Category::DeFi);
        assert!(store.get(original).unwrap().active);
        assert_eq!(store.active_count(), 2);
    }

    #[test]
    fn test_update_requires_author() {
        let mut store = store();
        let now = Utc::now();
        let id = store.register(&alice(), new_record("a", &[]), FeeProof::none(), now).unwrap();

        let err = store
            .update(&ActorId::new("mallory"), id, revision("x", &[]), FeeProof::none(), now)
            .unwrap_err();
        assert_eq!(err.code(), RegistryErrorCode::NotAuthor);
    }

    #[test]
    fn test_update_of_missing_record() {
        let mut store = store();
        let err = store
            .update(&alice(), RecordId::new(9), revision("x", &[]), FeeProof::none(), Utc::now())
            .unwrap_err();
        assert_eq!(err.code(), RegistryErrorCode::RecordNotFound);
    }

    #[test]
    fn test_fork_merges_parent_dependencies() {
        let mut store = store();
        let now = Utc::now();
        store.register(&alice(), new_record("a", &[]), FeeProof::none(), now).unwrap();
        store.register(&alice(), new_record("b", &[]), FeeProof::none(), now).unwrap();
        store.register(&alice(), new_record("c", &[1]), FeeProof::none(), now).unwrap();

        let bob = ActorId::new("bob");
        let fork = store
            .fork(&bob, RecordId::new(3), revision("fork", &[2]), FeeProof::none(), now)
            .unwrap();

        let record = store.get(fork).unwrap();
        assert_eq!(
            record.dependencies,
            vec![RecordId::new(1), RecordId::new(3), RecordId::new(2)]
        );
        assert_eq!(record.author, bob);
        assert!(record.version_chain.is_empty());
        assert_eq!(store.by_author(&bob), &[fork]);
    }

    #[test]
    fn test_fork_rejects_repeating_parent_dependency() {
        let mut store = store();
        let now = Utc::now();
        store.register(&alice(), new_record("a", &[]), FeeProof::none(), now).unwrap();
        store.register(&alice(), new_record("b", &[1]), FeeProof::none(), now).unwrap();

        let err = store
            .fork(&alice(), RecordId::new(2), revision("fork", &[1]), FeeProof::none(), now)
            .unwrap_err();
        assert_eq!(err.code(), RegistryErrorCode::DuplicateDependency);
        assert_eq!(store.total_records(), 2);
    }

    #[test]
    fn test_deactivate_is_terminal() {
        let mut store = store();
        let now = Utc::now();
        let id = store.register(&alice(), new_record("a", &[]), FeeProof::none(), now).unwrap();

        store.deactivate(&alice(), id, now).unwrap();
        assert!(!store.get(id).unwrap().active);
        assert_eq!(store.active_count(), 0);

        let err = store.deactivate(&alice(), id, now).unwrap_err();
        assert_eq!(err.code(), RegistryErrorCode::RecordInactive);
        assert_eq!(store.active_count(), 0);

        // Content stays reserved after deactivation.
        let err = store
            .register(&alice(), new_record("a", &[]), FeeProof::none(), now)
            .unwrap_err();
        assert_eq!(err.code(), RegistryErrorCode::DuplicateContent);
    }

    #[test]
    fn test_active_records_window_over_ids() {
        let mut store = store();
        let now = Utc::now();
        for content in ["a", "b", "c", "d"] {
            store.register(&alice(), new_record(content, &[]), FeeProof::none(), now).unwrap();
        }
        store.deactivate(&alice(), RecordId::new(2), now).unwrap();

        assert_eq!(
            store.active_records(0, 3),
            vec![RecordId::new(1), RecordId::new(3)]
        );
        assert_eq!(store.active_records(2, 10), vec![RecordId::new(3), RecordId::new(4)]);
        assert!(store.active_records(4, 10).is_empty());
        assert!(store.active_records(0, 0).is_empty());
        assert_eq!(store.active_records(u64::MAX, u64::MAX), Vec::<RecordId>::new());
    }

    #[test]
    fn test_open_rebuilds_indices() {
        let mut store = store();
        let now = Utc::now();
        store.register(&alice(), new_record("a", &[]), FeeProof::none(), now).unwrap();
        store.register(&alice(), new_record("b", &[1]), FeeProof::none(), now).unwrap();
        store.deactivate(&alice(), RecordId::new(1), now).unwrap();

        let table = store.table().clone();
        let reopened = RecordStore::open(table, RecordPolicy::default()).unwrap();
        assert_eq!(reopened.active_count(), 1);
        assert_eq!(reopened.by_author(&alice()).len(), 2);
        assert!(reopened.contains_content(&ContentRef::new("b")));
        assert_eq!(reopened.by_language(Language::Solidity).len(), 2);
    }

    /// Table whose writes always fail, standing in for a broken backend.
    #[derive(Default)]
    struct FailingTable {
        inner: MemoryRecordTable,
    }

    impl RecordTable for FailingTable {
        fn get(&self, id: RecordId) -> Option<&Record> {
            self.inner.get(id)
        }

        fn put(&mut self, _record: Record) -> RegistryResult<()> {
            Err(RegistryError::invalid_input("table write failed"))
        }

        fn next_id(&self) -> RecordId {
            self.inner.next_id()
        }
    }

    #[test]
    fn test_failed_table_write_leaves_no_index_entry() {
        let mut store: RecordStore<FailingTable> = RecordStore::new(RecordPolicy::default());
        let now = Utc::now();

        for _ in 0..2 {
            let err = store
                .register(&alice(), new_record("x", &[]), FeeProof::none(), now)
                .unwrap_err();
            assert_eq!(err.code(), RegistryErrorCode::InvalidInput);
        }

        assert_eq!(store.total_records(), 0);
        assert_eq!(store.active_count(), 0);
        assert!(!store.contains_content(&ContentRef::new("x")));
        assert!(store.by_author(&alice()).is_empty());
        assert!(store.by_language(Language::Solidity).is_empty());
    }

    #[test]
    fn test_open_rejects_repeated_dependency() {
        let mut table = MemoryRecordTable::new();
        table.put(crate::registry::table::tests::record(1, "alice")).unwrap();
        let mut second = crate::registry::table::tests::record(2, "alice");
        second.dependencies = vec![RecordId::new(1), RecordId::new(1)];
        table.put(second).unwrap();

        let err = RecordStore::open(table, RecordPolicy::default()).unwrap_err();
        assert_eq!(err.code(), RegistryErrorCode::InvalidInput);
    }

    #[test]
    fn test_open_rejects_forward_dependency() {
        let mut table = MemoryRecordTable::new();
        let mut first = crate::registry::table::tests::record(1, "alice");
        first.dependencies = vec![RecordId::new(1)];
        table.put(first).unwrap();

        let err = RecordStore::open(table, RecordPolicy::default()).unwrap_err();
        assert_eq!(err.code(), RegistryErrorCode::InvalidInput);
    }
}
