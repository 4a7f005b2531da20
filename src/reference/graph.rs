//! Declared slot-conflict graph.
//!
//! An edge `(A, B)` within a term means a faculty member holding slot A
//! anywhere in the week may not hold slot B anywhere in the same term,
//! whether or not the canonical times coincide. Edges are undirected and
//! stored in both directions.

use std::collections::{BTreeSet, HashMap};

use crate::models::Term;

/// Undirected conflict edges between slot names, per term.
#[derive(Debug, Clone, Default)]
pub struct ConflictGraph {
    adjacency: HashMap<Term, HashMap<String, BTreeSet<String>>>,
}

impl ConflictGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a conflict between `a` and `b` in both directions.
    ///
    /// Returns `false` if the edge was already present.
    pub fn add_edge(&mut self, term: &Term, a: impl Into<String>, b: impl Into<String>) -> bool {
        let (a, b) = (a.into(), b.into());
        let term_edges = self.adjacency.entry(term.clone()).or_default();
        let forward = term_edges.entry(a.clone()).or_default().insert(b.clone());
        let backward = term_edges.entry(b).or_default().insert(a);
        forward || backward
    }

    /// Builder: declares a conflict edge.
    pub fn with_edge(mut self, term: &Term, a: &str, b: &str) -> Self {
        self.add_edge(term, a, b);
        self
    }

    /// Slot names declared to conflict with `slot_name`.
    ///
    /// Unknown terms and undeclared names yield an empty set.
    pub fn conflicts_of(&self, term: &Term, slot_name: &str) -> BTreeSet<String> {
        self.adjacency
            .get(term)
            .and_then(|edges| edges.get(slot_name))
            .cloned()
            .unwrap_or_default()
    }

    /// Whether `a` and `b` are declared to conflict.
    pub fn are_conflicting(&self, term: &Term, a: &str, b: &str) -> bool {
        self.adjacency
            .get(term)
            .and_then(|edges| edges.get(a))
            .is_some_and(|set| set.contains(b))
    }

    /// Each undirected edge of a term once, as `(smaller, larger)`.
    pub fn edges(&self, term: &Term) -> Vec<(&str, &str)> {
        let mut out = Vec::new();
        if let Some(edges) = self.adjacency.get(term) {
            for (a, targets) in edges {
                for b in targets {
                    if a.as_str() <= b.as_str() {
                        out.push((a.as_str(), b.as_str()));
                    }
                }
            }
        }
        out.sort_unstable();
        out
    }

    /// Terms with declared edges.
    pub fn terms(&self) -> impl Iterator<Item = &Term> {
        self.adjacency.keys()
    }
}
