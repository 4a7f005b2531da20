//! Conflict report model.
//!
//! A conflict report is the transient outcome of checking a proposed
//! booking against committed allocations and the term's slot rules.
//! Reports are never persisted.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::Allocation;

/// Classification of conflicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    /// Venue already taken at the same day/time by another faculty member.
    VenueClash,
    /// Faculty already teaching another course at the same day/time.
    FacultyClash,
    /// Faculty holds a slot declared to conflict with the proposed one.
    SlotConflict,
    /// A linked member's venue is taken at the member's day/time.
    LinkedSlotVenueClash,
    /// Faculty busy with another course at a linked member's day/time.
    LinkedSlotFacultyClash,
    /// No signature entry allows the course in this slot.
    SignatureMismatch,
    /// The exact row was inserted concurrently by another writer.
    DuplicateAllocation,
}

impl ConflictKind {
    /// Stable snake_case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictKind::VenueClash => "venue_clash",
            ConflictKind::FacultyClash => "faculty_clash",
            ConflictKind::SlotConflict => "slot_conflict",
            ConflictKind::LinkedSlotVenueClash => "linked_slot_venue_clash",
            ConflictKind::LinkedSlotFacultyClash => "linked_slot_faculty_clash",
            ConflictKind::SignatureMismatch => "signature_mismatch",
            ConflictKind::DuplicateAllocation => "duplicate_allocation",
        }
    }

    /// Default severity for this kind.
    pub fn default_severity(&self) -> Severity {
        match self {
            ConflictKind::SignatureMismatch => Severity::Warning,
            _ => Severity::Blocking,
        }
    }
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a conflict prevents a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Rejects the write.
    Blocking,
    /// Reported in dry runs only.
    Warning,
}

/// One detected conflict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictItem {
    /// Conflict classification.
    pub kind: ConflictKind,
    /// Blocking or advisory.
    pub severity: Severity,
    /// Slot name of the proposal (or linked member) that triggered the item.
    pub slot_name: String,
    /// Existing allocation that the proposal collides with, if any.
    pub offending: Option<Allocation>,
    /// Human-readable explanation.
    pub message: String,
}

impl ConflictItem {
    /// Creates an item with the kind's default severity.
    pub fn new(
        kind: ConflictKind,
        slot_name: impl Into<String>,
        offending: Option<Allocation>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            severity: kind.default_severity(),
            slot_name: slot_name.into(),
            offending,
            message: message.into(),
        }
    }

    /// Creates a venue clash against `existing`.
    pub fn venue_clash(slot_name: impl Into<String>, existing: &Allocation) -> Self {
        let message = format!(
            "Venue {} is already allocated to faculty {} for {} on {} {} (slot {})",
            existing.venue,
            existing.faculty_id,
            existing.course_code,
            existing.day,
            existing.time,
            existing.slot_name
        );
        Self::new(ConflictKind::VenueClash, slot_name, Some(existing.clone()), message)
    }

    /// Creates a faculty clash against `existing`.
    pub fn faculty_clash(slot_name: impl Into<String>, existing: &Allocation) -> Self {
        let message = format!(
            "Faculty {} already teaches {} on {} {} (slot {})",
            existing.faculty_id, existing.course_code, existing.day, existing.time, existing.slot_name
        );
        Self::new(ConflictKind::FacultyClash, slot_name, Some(existing.clone()), message)
    }

    /// Creates a declared slot conflict against `existing`.
    pub fn slot_conflict(slot_name: impl Into<String>, existing: &Allocation) -> Self {
        let slot_name = slot_name.into();
        let message = format!(
            "Slot {} conflicts with slot {} already held by faculty {} for {}",
            slot_name, existing.slot_name, existing.faculty_id, existing.course_code
        );
        Self::new(ConflictKind::SlotConflict, slot_name, Some(existing.clone()), message)
    }

    /// Re-labels a venue or faculty clash as occurring on a linked member.
    pub fn into_linked(mut self) -> Self {
        self.kind = match self.kind {
            ConflictKind::VenueClash => ConflictKind::LinkedSlotVenueClash,
            ConflictKind::FacultyClash => ConflictKind::LinkedSlotFacultyClash,
            other => other,
        };
        self.message = format!("Linked slot {}: {}", self.slot_name, self.message);
        self
    }

    /// Whether this item prevents a write.
    pub fn is_blocking(&self) -> bool {
        self.severity == Severity::Blocking
    }
}

/// Ordered list of conflicts found for one proposal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictReport {
    /// Items in detection order.
    pub items: Vec<ConflictItem>,
}

impl ConflictReport {
    /// Creates an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a report holding a single item.
    pub fn single(item: ConflictItem) -> Self {
        Self { items: vec![item] }
    }

    /// Appends an item.
    pub fn push(&mut self, item: ConflictItem) {
        self.items.push(item);
    }

    /// Whether nothing was found (warnings included).
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether no blocking item was found.
    pub fn is_clean(&self) -> bool {
        !self.items.iter().any(ConflictItem::is_blocking)
    }

    /// First blocking item in detection order.
    pub fn first_blocking(&self) -> Option<&ConflictItem> {
        self.items.iter().find(|i| i.is_blocking())
    }

    /// Whether any item has the given kind.
    pub fn has_kind(&self, kind: ConflictKind) -> bool {
        self.items.iter().any(|i| i.kind == kind)
    }

    /// Kinds in detection order (duplicates kept).
    pub fn kinds(&self) -> Vec<ConflictKind> {
        self.items.iter().map(|i| i.kind).collect()
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }
}

impl fmt::Display for ConflictReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.first_blocking().or_else(|| self.items.first()) {
            None => f.write_str("no conflicts"),
            Some(item) if self.items.len() == 1 => write!(f, "{}: {}", item.kind, item.message),
            Some(item) => write!(
                f,
                "{}: {} (+{} more)",
                item.kind,
                item.message,
                self.items.len() - 1
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Day, Term, TimeRange};

    fn existing() -> Allocation {
        Allocation::new(
            Term::odd("2024-25"),
            "CS101",
            "F001",
            "R101",
            Day::Mon,
            "A",
            TimeRange::hm(8, 0, 8, 50),
        )
    }

    #[test]
    fn test_item_factories() {
        let v = ConflictItem::venue_clash("B", &existing());
        assert_eq!(v.kind, ConflictKind::VenueClash);
        assert!(v.is_blocking());
        assert!(v.message.contains("R101"));

        let f = ConflictItem::faculty_clash("B", &existing());
        assert_eq!(f.kind, ConflictKind::FacultyClash);

        let s = ConflictItem::slot_conflict("TA", &existing());
        assert_eq!(s.kind, ConflictKind::SlotConflict);
        assert_eq!(s.slot_name, "TA");
    }

    #[test]
    fn test_into_linked() {
        let v = ConflictItem::venue_clash("L21+L22", &existing()).into_linked();
        assert_eq!(v.kind, ConflictKind::LinkedSlotVenueClash);
        assert!(v.message.starts_with("Linked slot L21+L22"));

        let f = ConflictItem::faculty_clash("L21+L22", &existing()).into_linked();
        assert_eq!(f.kind, ConflictKind::LinkedSlotFacultyClash);
    }

    #[test]
    fn test_warning_does_not_block() {
        let mut report = ConflictReport::new();
        report.push(ConflictItem::new(
            ConflictKind::SignatureMismatch,
            "E",
            None,
            "no signature entry",
        ));
        assert!(!report.is_empty());
        assert!(report.is_clean());
        assert!(report.first_blocking().is_none());

        report.push(ConflictItem::faculty_clash("E", &existing()));
        assert!(!report.is_clean());
        assert_eq!(report.first_blocking().unwrap().kind, ConflictKind::FacultyClash);
        assert_eq!(
            report.kinds(),
            vec![ConflictKind::SignatureMismatch, ConflictKind::FacultyClash]
        );
    }

    #[test]
    fn test_kind_serde_names() {
        let json = serde_json::to_string(&ConflictKind::LinkedSlotVenueClash).unwrap();
        assert_eq!(json, "\"linked_slot_venue_clash\"");
        assert_eq!(ConflictKind::SlotConflict.to_string(), "slot_conflict");
    }
}
