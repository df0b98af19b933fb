//! In-memory cache: the ordered record sequence plus an id -> position index.
//!
//! The sequence is the source of truth (it is what gets encoded). The index
//! is derived from it and rebuilt whenever positions shift.

use crate::error::{Error, Result};
use crate::record::{IdGenerator, Record, RecordId};
use std::collections::HashMap;

pub(crate) struct Collection<R: Record> {
    records: Vec<R>,
    index: HashMap<R::Id, usize>,
}

impl<R: Record> Collection<R> {
    /// Build from decoded records. When ids repeat, the index points at the
    /// last occurrence while the sequence keeps every copy.
    pub(crate) fn from_records(records: Vec<R>) -> Self {
        let mut collection = Self {
            index: HashMap::with_capacity(records.len()),
            records,
        };
        let duplicates = collection.reindex();
        if duplicates > 0 {
            tracing::warn!(
                duplicates,
                "decoded records share ids; lookups resolve to the last occurrence"
            );
        }
        collection
    }

    /// Returns how many records were shadowed by a later one with the same id.
    fn reindex(&mut self) -> usize {
        self.index.clear();
        let mut shadowed = 0;
        for (pos, record) in self.records.iter().enumerate() {
            if self.index.insert(record.id().clone(), pos).is_some() {
                shadowed += 1;
            }
        }
        shadowed
    }

    pub(crate) fn records(&self) -> &[R] {
        &self.records
    }

    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }

    pub(crate) fn position(&self, id: &R::Id) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub(crate) fn get(&self, id: &R::Id) -> Option<&R> {
        self.position(id).map(|pos| &self.records[pos])
    }

    pub(crate) fn contains(&self, id: &R::Id) -> bool {
        self.index.contains_key(id)
    }

    /// Append. Callers check for id collisions first.
    pub(crate) fn push(&mut self, record: R) {
        self.index.insert(record.id().clone(), self.records.len());
        self.records.push(record);
    }

    /// Swap the record at `pos`, keeping its place in the sequence.
    /// The new record must carry the same id as the old one.
    pub(crate) fn replace(&mut self, pos: usize, record: R) -> R {
        debug_assert_eq!(self.records[pos].id(), record.id());
        std::mem::replace(&mut self.records[pos], record)
    }

    /// Order-preserving removal of the indexed record for `id`.
    pub(crate) fn remove(&mut self, id: &R::Id) -> Option<R> {
        let pos = self.position(id)?;
        let removed = self.records.remove(pos);
        self.reindex();
        Some(removed)
    }

    /// Pick an id for a record about to be created: keep a set one, else ask
    /// the generator, else fall back to the id kind's own policy.
    pub(crate) fn assign_id(
        &self,
        candidate: &R,
        generator: Option<&IdGenerator<R>>,
    ) -> Result<R::Id> {
        let current = candidate.id();
        if !current.is_unset() {
            return Ok(current.clone());
        }
        if let Some(generate) = generator {
            return Ok(generate(self.records.as_slice(), candidate));
        }
        <R::Id as RecordId>::generate(self.records.iter().map(|r| r.id()))
            .ok_or(Error::MissingId)
    }
}
