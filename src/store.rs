//! Allocation store: trait and in-memory implementation.
//!
//! The store is the durable set of committed allocations. Its only
//! integrity rule is the primary key on the full allocation tuple: an
//! exact duplicate insert fails with [`StoreError::Duplicate`]. Every
//! other rule is enforced by the engine before a write.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use crate::error::{StoreError, StoreResult};
use crate::models::{Allocation, Term};

/// Orders rows by weekly grid position, then by identity.
pub fn sort_by_grid(rows: &mut [Allocation]) {
    rows.sort_by(|a, b| {
        (a.day, a.time, &a.slot_name, &a.course_code, &a.faculty_id, &a.venue).cmp(&(
            b.day,
            b.time,
            &b.slot_name,
            &b.course_code,
            &b.faculty_id,
            &b.venue,
        ))
    });
}

fn row_key(a: &Allocation) -> String {
    format!(
        "{} {} {} {} {} {} {}",
        a.term, a.course_code, a.faculty_id, a.venue, a.day, a.slot_name, a.time
    )
}

/// Storage for committed allocations.
pub trait AllocationStore: Send + Sync {
    /// Inserts a row; fails with `Duplicate` if the exact tuple exists.
    fn insert(&self, allocation: &Allocation) -> StoreResult<()>;

    /// Removes a row. Returns whether it existed.
    fn remove(&self, allocation: &Allocation) -> StoreResult<bool>;

    /// Whether the exact tuple exists.
    fn contains(&self, allocation: &Allocation) -> StoreResult<bool>;

    /// All rows of a term, in grid order.
    fn list_term(&self, term: &Term) -> StoreResult<Vec<Allocation>>;

    /// Rows of one faculty member in a term, in grid order.
    fn list_by_faculty(&self, term: &Term, faculty_id: &str) -> StoreResult<Vec<Allocation>> {
        Ok(self
            .list_term(term)?
            .into_iter()
            .filter(|a| a.faculty_id == faculty_id)
            .collect())
    }

    /// Rows held in one venue in a term, in grid order.
    fn list_by_venue(&self, term: &Term, venue: &str) -> StoreResult<Vec<Allocation>> {
        Ok(self
            .list_term(term)?
            .into_iter()
            .filter(|a| a.venue == venue)
            .collect())
    }
}

impl<S: AllocationStore + ?Sized> AllocationStore for Arc<S> {
    fn insert(&self, allocation: &Allocation) -> StoreResult<()> {
        (**self).insert(allocation)
    }

    fn remove(&self, allocation: &Allocation) -> StoreResult<bool> {
        (**self).remove(allocation)
    }

    fn contains(&self, allocation: &Allocation) -> StoreResult<bool> {
        (**self).contains(allocation)
    }

    fn list_term(&self, term: &Term) -> StoreResult<Vec<Allocation>> {
        (**self).list_term(term)
    }

    fn list_by_faculty(&self, term: &Term, faculty_id: &str) -> StoreResult<Vec<Allocation>> {
        (**self).list_by_faculty(term, faculty_id)
    }

    fn list_by_venue(&self, term: &Term, venue: &str) -> StoreResult<Vec<Allocation>> {
        (**self).list_by_venue(term, venue)
    }
}

/// In-memory store keyed by term.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAllocationStore {
    rows: Arc<RwLock<HashMap<Term, HashSet<Allocation>>>>,
}

impl InMemoryAllocationStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with rows (duplicates collapse).
    pub fn with_rows(rows: impl IntoIterator<Item = Allocation>) -> Self {
        let mut by_term: HashMap<Term, HashSet<Allocation>> = HashMap::new();
        for row in rows {
            by_term.entry(row.term.clone()).or_default().insert(row);
        }
        Self {
            rows: Arc::new(RwLock::new(by_term)),
        }
    }

    /// Total number of rows across terms.
    pub fn len(&self) -> StoreResult<usize> {
        let rows = self.rows.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(rows.values().map(HashSet::len).sum())
    }

    /// Whether the store holds no rows.
    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }
}

impl AllocationStore for InMemoryAllocationStore {
    fn insert(&self, allocation: &Allocation) -> StoreResult<()> {
        let mut rows = self.rows.write().map_err(|_| StoreError::LockPoisoned)?;
        let term_rows = rows.entry(allocation.term.clone()).or_default();
        if !term_rows.insert(allocation.clone()) {
            return Err(StoreError::Duplicate {
                key: row_key(allocation),
            });
        }
        Ok(())
    }

    fn remove(&self, allocation: &Allocation) -> StoreResult<bool> {
        let mut rows = self.rows.write().map_err(|_| StoreError::LockPoisoned)?;
        Ok(rows
            .get_mut(&allocation.term)
            .is_some_and(|term_rows| term_rows.remove(allocation)))
    }

    fn contains(&self, allocation: &Allocation) -> StoreResult<bool> {
        let rows = self.rows.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(rows
            .get(&allocation.term)
            .is_some_and(|term_rows| term_rows.contains(allocation)))
    }

    fn list_term(&self, term: &Term) -> StoreResult<Vec<Allocation>> {
        let rows = self.rows.read().map_err(|_| StoreError::LockPoisoned)?;
        let mut out: Vec<Allocation> = rows
            .get(term)
            .map(|term_rows| term_rows.iter().cloned().collect())
            .unwrap_or_default();
        sort_by_grid(&mut out);
        Ok(out)
    }
}
