//! Dependency validation
//!
//! A candidate dependency list is accepted only if every entry:
//! - lies in `1..=max_id` (so it is strictly below the id about to be assigned)
//! - names a record that is currently active
//! - appears exactly once in the list
//!
//! Because a dependency always points at an already assigned, smaller id, the
//! dependency relation is acyclic by construction. No graph walk is done.

use super::errors::{RegistryError, RegistryResult};
use super::table::RecordTable;
use super::types::{Record, RecordId};

/// Validates dependency lists against the current table.
///
/// Validation does not mutate anything.
pub struct DependencyValidator<'a, T: RecordTable + ?Sized> {
    table: &'a T,
}

impl<'a, T: RecordTable + ?Sized> DependencyValidator<'a, T> {
    pub fn new(table: &'a T) -> Self {
        Self { table }
    }

    /// Validates `candidates` in order and fails on the first offending entry.
    pub fn validate(&self, candidates: &[RecordId]) -> RegistryResult<()> {
        let max_id = self.table.max_id();

        for (position, &dependency) in candidates.iter().enumerate() {
            if dependency.is_zero() || dependency.value() > max_id {
                return Err(RegistryError::invalid_dependency(dependency, max_id));
            }

            let record = self
                .table
                .get(dependency)
                .ok_or_else(|| RegistryError::invalid_dependency(dependency, max_id))?;
            if !record.active {
                return Err(RegistryError::inactive_dependency(dependency));
            }

            if candidates[position + 1..].contains(&dependency) {
                return Err(RegistryError::duplicate_dependency(dependency));
            }
        }

        Ok(())
    }
}

/// Dependency list of a fork: the parent's dependencies, then the parent
/// itself, then the additional ones. Not deduplicated; the validator rejects
/// repeats.
pub fn fork_dependencies(parent: &Record, additional: &[RecordId]) -> Vec<RecordId> {
    let mut merged = Vec::with_capacity(parent.dependencies.len() + 1 + additional.len());
    merged.extend_from_slice(&parent.dependencies);
    merged.push(parent.id);
    merged.extend_from_slice(additional);
    merged
}
