//! Slot catalog: the fixed weekly grid of a term.

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::models::{Day, Slot, Term, TimeRange};

/// Canonical `(term, day, slot-name, time)` occurrences.
///
/// Read-only reference data. A slot name may occur on several days with
/// different times; lookups by name return every occurrence in day order.
#[derive(Debug, Clone, Default)]
pub struct SlotCatalog {
    slots: HashMap<Term, Vec<Slot>>,
    seen: HashSet<Slot>,
}

impl SlotCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a slot. Returns `false` if the identical slot already exists.
    pub fn add(&mut self, slot: Slot) -> bool {
        if !self.seen.insert(slot.clone()) {
            return false;
        }
        let term_slots = self.slots.entry(slot.term.clone()).or_default();
        term_slots.push(slot);
        term_slots.sort_by(|a, b| (a.day, a.time, &a.name).cmp(&(b.day, b.time, &b.name)));
        true
    }

    /// Builder: adds a slot occurrence.
    pub fn with_slot(mut self, term: &Term, day: Day, name: &str, time: TimeRange) -> Self {
        self.add(Slot::new(term.clone(), day, name, time));
        self
    }

    /// All slots of a term in (day, time) order.
    pub fn slots(&self, term: &Term) -> &[Slot] {
        self.slots.get(term).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every weekly occurrence of `name` in the term.
    pub fn occurrences<'a>(&'a self, term: &Term, name: &'a str) -> impl Iterator<Item = &'a Slot> + 'a {
        self.slots(term).iter().filter(move |s| s.name == name)
    }

    /// Occurrences of `name` on a given day.
    pub fn occurrences_on<'a>(
        &'a self,
        term: &Term,
        day: Day,
        name: &'a str,
    ) -> impl Iterator<Item = &'a Slot> + 'a {
        self.occurrences(term, name).filter(move |s| s.day == day)
    }

    /// Whether `name` occurs anywhere in the term grid.
    pub fn contains_name(&self, term: &Term, name: &str) -> bool {
        self.occurrences(term, name).next().is_some()
    }

    /// Whether the exact `(day, name, time)` occurrence exists.
    pub fn contains(&self, term: &Term, day: Day, name: &str, time: TimeRange) -> bool {
        self.occurrences_on(term, day, name).any(|s| s.time == time)
    }

    /// Distinct slot names of a term.
    pub fn names(&self, term: &Term) -> BTreeSet<&str> {
        self.slots(term).iter().map(|s| s.name.as_str()).collect()
    }

    /// Terms with catalog data.
    pub fn terms(&self) -> impl Iterator<Item = &Term> {
        self.slots.keys()
    }

    /// Total number of slot occurrences across terms.
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
