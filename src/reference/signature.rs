//! Slot signature configuration.
//!
//! Maps a course's contact-hour signature, within a term, to the slot
//! codes it may be booked under and to the linked groups each code drags
//! along. Keyed by `(term, signature)`, in the order rows were seeded.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::models::{Signature, SlotCode, Term};

/// One eligible slot code for a signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureEntry {
    /// Primary slot code (single or compound).
    pub slot: SlotCode,
    /// Contact-hour signature this entry serves.
    pub signature: Signature,
    /// Linked groups that must be booked together with `slot`.
    pub linked: Vec<SlotCode>,
}

impl SignatureEntry {
    /// Creates an entry without linkage.
    pub fn new(slot: impl Into<SlotCode>, signature: Signature) -> Self {
        Self {
            slot: slot.into(),
            signature,
            linked: Vec::new(),
        }
    }

    /// Adds a linked group.
    pub fn with_linked(mut self, group: impl Into<SlotCode>) -> Self {
        self.linked.push(group.into());
        self
    }

    /// Whether the entry declares any linkage.
    pub fn has_linkage(&self) -> bool {
        self.linked.iter().any(|g| !g.is_empty())
    }
}

/// Signature table for all terms.
#[derive(Debug, Clone, Default)]
pub struct SlotSignatureConfig {
    entries: HashMap<(Term, Signature), Vec<SignatureEntry>>,
}

impl SlotSignatureConfig {
    /// Creates an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entry. A later entry for the same slot code replaces the
    /// earlier one in place.
    pub fn add(&mut self, term: &Term, entry: SignatureEntry) {
        let rows = self
            .entries
            .entry((term.clone(), entry.signature))
            .or_default();
        match rows.iter_mut().find(|e| e.slot == entry.slot) {
            Some(existing) => *existing = entry,
            None => rows.push(entry),
        }
    }

    /// Builder: adds an entry.
    pub fn with_entry(mut self, term: &Term, entry: SignatureEntry) -> Self {
        self.add(term, entry);
        self
    }

    /// Entries eligible for a signature, in seed order.
    pub fn candidates(&self, term: &Term, signature: Signature) -> &[SignatureEntry] {
        self.entries
            .get(&(term.clone(), signature))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Entry for an exact slot code and signature.
    pub fn entry(&self, term: &Term, slot: &SlotCode, signature: Signature) -> Option<&SignatureEntry> {
        self.candidates(term, signature)
            .iter()
            .find(|e| &e.slot == slot)
    }

    /// Entry whose primary code, or failing that one of its linked
    /// groups, contains `token`.
    ///
    /// Lets callers that only know one stored slot of a booking find the
    /// entry the booking was made under.
    pub fn entry_linking(
        &self,
        term: &Term,
        token: &str,
        signature: Signature,
    ) -> Option<&SignatureEntry> {
        let candidates = self.candidates(term, signature);
        candidates
            .iter()
            .find(|e| e.slot.contains(token))
            .or_else(|| {
                candidates
                    .iter()
                    .find(|e| e.linked.iter().any(|g| g.contains(token)))
            })
    }

    /// All entries of a term, in unspecified signature order.
    pub fn entries<'a>(&'a self, term: &'a Term) -> impl Iterator<Item = &'a SignatureEntry> + 'a {
        self.entries
            .iter()
            .filter(move |((t, _), _)| t == term)
            .flat_map(|(_, rows)| rows.iter())
    }

    /// Terms with signature data.
    pub fn terms(&self) -> HashSet<&Term> {
        self.entries.keys().map(|(t, _)| t).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn term() -> Term {
        Term::odd("2024-25")
    }

    fn sample_config() -> SlotSignatureConfig {
        let t = term();
        SlotSignatureConfig::new()
            .with_entry(&t, SignatureEntry::new("E", Signature::theory(4)).with_linked("F"))
            .with_entry(&t, SignatureEntry::new("A", Signature::theory(4)))
            .with_entry(
                &t,
                SignatureEntry::new("L1+L2, L3+L4", Signature::lab(4)).with_linked("L21+L22, L23+L24"),
            )
            .with_entry(&t, SignatureEntry::new("L5+L6", Signature::lab(2)).with_linked("L25+L26"))
    }

    #[test]
    fn test_candidates_in_seed_order() {
        let cfg = sample_config();
        let slots: Vec<String> = cfg
            .candidates(&term(), Signature::theory(4))
            .iter()
            .map(|e| e.slot.display())
            .collect();
        assert_eq!(slots, vec!["E", "A"]);
        assert!(cfg.candidates(&term(), Signature::theory(3)).is_empty());
    }

    #[test]
    fn test_exact_entry_lookup() {
        let cfg = sample_config();
        let e = cfg
            .entry(&term(), &SlotCode::parse("L1+L2, L3+L4"), Signature::lab(4))
            .unwrap();
        assert!(e.has_linkage());
        assert_eq!(e.linked[0].tokens().len(), 2);
        assert!(cfg.entry(&term(), &SlotCode::single("E"), Signature::lab(4)).is_none());
    }

    #[test]
    fn test_entry_linking() {
        let cfg = sample_config();
        let e = cfg.entry_linking(&term(), "L3+L4", Signature::lab(4)).unwrap();
        assert_eq!(e.slot.display(), "L1+L2, L3+L4");
        let mirror = cfg.entry_linking(&term(), "L23+L24", Signature::lab(4)).unwrap();
        assert_eq!(mirror.slot.display(), "L1+L2, L3+L4");
        let counterpart = cfg.entry_linking(&term(), "L25+L26", Signature::lab(2)).unwrap();
        assert_eq!(counterpart.slot.display(), "L5+L6");
        assert!(cfg.entry_linking(&term(), "L25+L26", Signature::lab(4)).is_none());
        assert!(cfg.entry_linking(&term(), "L7+L8", Signature::lab(2)).is_none());
    }

    #[test]
    fn test_later_entry_replaces() {
        let t = term();
        let mut cfg = sample_config();
        cfg.add(&t, SignatureEntry::new("E", Signature::theory(4)));
        let e = cfg.entry(&t, &SlotCode::single("E"), Signature::theory(4)).unwrap();
        assert!(!e.has_linkage());
        assert_eq!(cfg.candidates(&t, Signature::theory(4)).len(), 2);
    }
}
