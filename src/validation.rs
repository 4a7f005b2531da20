//! Integrity checks for seeded reference data.
//!
//! Reference tables are seeded by administrators and read as-is by the
//! engine. These checks find seeding mistakes before they surface as
//! confusing availability results. Detects:
//! - Duplicate slot rows and course codes
//! - A slot name listed twice on one day at different times
//! - Conflict edges naming unknown slots, or a slot conflicting with itself
//! - Signature rows naming unknown slots
//! - 4-hour lab entries whose mirror group is missing or mis-sized
//! - Linkage groups whose members are declared to conflict with each other
//!
//! All problems are collected; nothing short-circuits.

use std::collections::{BTreeMap, HashSet};

use crate::engine::COMPOUND_LAB_HOURS;
use crate::models::{Signature, Term};
use crate::reference::{ReferenceData, ReferenceRows};

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// The same slot row appears twice.
    DuplicateSlot,
    /// Two course records share a code.
    DuplicateCourse,
    /// A slot name occurs twice on the same day with different times.
    AmbiguousSlot,
    /// A conflict edge names a slot absent from the grid.
    UnknownConflictSlot,
    /// A slot is declared to conflict with itself.
    SelfConflict,
    /// A signature row names a slot absent from the grid.
    UnknownSignatureSlot,
    /// A 4-hour lab entry lacks exactly one mirror group of equal size.
    MirrorCardinality,
    /// Members booked together are declared to conflict.
    ConflictingLinkage,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates raw rows, then the tables they build.
///
/// Duplicates collapse silently when rows are loaded, so they can only be
/// seen here.
pub fn validate_reference_rows(rows: &ReferenceRows) -> ValidationResult {
    let mut errors = Vec::new();

    let mut slots = HashSet::new();
    for row in &rows.slots {
        if !slots.insert((&row.term, row.day, row.name.as_str(), row.time)) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateSlot,
                format!("Duplicate slot {} on {} {} in {}", row.name, row.day, row.time, row.term),
            ));
        }
    }

    let mut courses = HashSet::new();
    for course in &rows.courses {
        if !courses.insert(course.code.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateCourse,
                format!("Duplicate course code: {}", course.code),
            ));
        }
    }

    let data = ReferenceData::from_rows(rows.clone());
    if let Err(more) = validate_reference_data(&data) {
        errors.extend(more);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validates the built reference tables.
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_reference_data(data: &ReferenceData) -> ValidationResult {
    let mut errors = Vec::new();

    for term in terms_of(data) {
        check_grid(data, &term, &mut errors);
        check_conflicts(data, &term, &mut errors);
        check_signatures(data, &term, &mut errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Every term mentioned by any table, in display order.
fn terms_of(data: &ReferenceData) -> Vec<Term> {
    let mut terms: BTreeMap<String, Term> = BTreeMap::new();
    let all = data
        .catalog
        .terms()
        .chain(data.conflicts.terms())
        .chain(data.signatures.terms());
    for term in all {
        terms.entry(term.to_string()).or_insert_with(|| term.clone());
    }
    terms.into_values().collect()
}

fn check_grid(data: &ReferenceData, term: &Term, errors: &mut Vec<ValidationError>) {
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    for slot in data.catalog.slots(term) {
        let key = (slot.day, slot.name.as_str());
        if !seen.insert(key) && reported.insert(key) {
            errors.push(ValidationError::new(
                ValidationErrorKind::AmbiguousSlot,
                format!("Slot {} occurs more than once on {} in {}", slot.name, slot.day, term),
            ));
        }
    }
}

fn check_conflicts(data: &ReferenceData, term: &Term, errors: &mut Vec<ValidationError>) {
    for (a, b) in data.conflicts.edges(term) {
        if a == b {
            errors.push(ValidationError::new(
                ValidationErrorKind::SelfConflict,
                format!("Slot {a} is declared to conflict with itself in {term}"),
            ));
        }
        for name in [a, b] {
            if !data.catalog.contains_name(term, name) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::UnknownConflictSlot,
                    format!("Conflict {a}/{b} names unknown slot {name} in {term}"),
                ));
            }
            if a == b {
                break;
            }
        }
    }
}

fn check_signatures(data: &ReferenceData, term: &Term, errors: &mut Vec<ValidationError>) {
    let mut entries: Vec<_> = data.signatures.entries(term).collect();
    entries.sort_by_key(|e| (e.signature, e.slot.display()));

    let mut unknown = HashSet::new();
    for entry in &entries {
        let tokens = entry
            .slot
            .tokens()
            .iter()
            .chain(entry.linked.iter().flat_map(|g| g.tokens().iter()));
        for token in tokens {
            if !data.catalog.contains_name(term, token) && unknown.insert(token.as_str()) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::UnknownSignatureSlot,
                    format!(
                        "Signature {} for {} names unknown slot {} in {}",
                        entry.signature, entry.slot, token, term
                    ),
                ));
            }
        }

        if entry.signature == Signature::lab(COMPOUND_LAB_HOURS) && entry.slot.is_compound() {
            let mirrors: Vec<_> = entry.linked.iter().filter(|g| !g.is_empty()).collect();
            let sized = matches!(mirrors.as_slice(), [mirror] if mirror.len() == entry.slot.len());
            if !sized {
                errors.push(ValidationError::new(
                    ValidationErrorKind::MirrorCardinality,
                    format!(
                        "Compound lab {} needs one mirror group of {} slots in {}",
                        entry.slot,
                        entry.slot.len(),
                        term
                    ),
                ));
            }
        }

        let members: Vec<&str> = entry
            .slot
            .tokens()
            .iter()
            .chain(entry.linked.iter().flat_map(|g| g.tokens().iter()))
            .map(String::as_str)
            .collect();
        'pairs: for (i, a) in members.iter().enumerate() {
            for b in &members[i + 1..] {
                if a != b && data.conflicts.are_conflicting(term, a, b) {
                    errors.push(ValidationError::new(
                        ValidationErrorKind::ConflictingLinkage,
                        format!(
                            "Slots {} and {} are booked together by {} but declared conflicting in {}",
                            a, b, entry.slot, term
                        ),
                    ));
                    break 'pairs;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Course, Day, TimeRange};
    use crate::reference::{ConflictGraph, SignatureEntry, SlotCatalog, SlotSignatureConfig};

    fn term() -> Term {
        Term::odd("2024-25")
    }

    fn catalog() -> SlotCatalog {
        let t = term();
        SlotCatalog::new()
            .with_slot(&t, Day::Mon, "A", TimeRange::hm(8, 0, 8, 50))
            .with_slot(&t, Day::Tue, "TA", TimeRange::hm(8, 0, 8, 50))
            .with_slot(&t, Day::Mon, "L1+L2", TimeRange::hm(8, 0, 9, 40))
            .with_slot(&t, Day::Mon, "L3+L4", TimeRange::hm(9, 50, 11, 30))
            .with_slot(&t, Day::Thu, "L21+L22", TimeRange::hm(14, 0, 15, 40))
            .with_slot(&t, Day::Thu, "L23+L24", TimeRange::hm(15, 50, 17, 30))
    }

    fn kinds(result: ValidationResult) -> Vec<ValidationErrorKind> {
        result.unwrap_err().into_iter().map(|e| e.kind).collect()
    }

    #[test]
    fn test_valid_reference_data() {
        let t = term();
        let data = ReferenceData::new()
            .with_catalog(catalog())
            .with_conflicts(ConflictGraph::new().with_edge(&t, "A", "TA"))
            .with_signatures(SlotSignatureConfig::new().with_entry(
                &t,
                SignatureEntry::new("L1+L2, L3+L4", Signature::lab(4)).with_linked("L21+L22, L23+L24"),
            ));
        assert!(validate_reference_data(&data).is_ok());
    }

    #[test]
    fn test_unknown_and_self_conflict() {
        let t = term();
        let data = ReferenceData::new().with_catalog(catalog()).with_conflicts(
            ConflictGraph::new()
                .with_edge(&t, "A", "ZZ")
                .with_edge(&t, "TA", "TA"),
        );
        assert_eq!(
            kinds(validate_reference_data(&data)),
            vec![ValidationErrorKind::UnknownConflictSlot, ValidationErrorKind::SelfConflict]
        );
    }

    #[test]
    fn test_mirror_cardinality() {
        let t = term();
        let data = ReferenceData::new().with_catalog(catalog()).with_signatures(
            SlotSignatureConfig::new()
                .with_entry(&t, SignatureEntry::new("L1+L2, L3+L4", Signature::lab(4)).with_linked("L21+L22")),
        );
        assert_eq!(
            kinds(validate_reference_data(&data)),
            vec![ValidationErrorKind::MirrorCardinality]
        );

        let unlinked = ReferenceData::new().with_catalog(catalog()).with_signatures(
            SlotSignatureConfig::new().with_entry(&t, SignatureEntry::new("L1+L2, L3+L4", Signature::lab(4))),
        );
        assert_eq!(
            kinds(validate_reference_data(&unlinked)),
            vec![ValidationErrorKind::MirrorCardinality]
        );
    }

    #[test]
    fn test_unknown_signature_slot() {
        let t = term();
        let data = ReferenceData::new().with_catalog(catalog()).with_signatures(
            SlotSignatureConfig::new().with_entry(&t, SignatureEntry::new("Q", Signature::theory(3))),
        );
        let errors = validate_reference_data(&data).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ValidationErrorKind::UnknownSignatureSlot);
        assert!(errors[0].message.contains("unknown slot Q"));
    }

    #[test]
    fn test_conflicting_linkage() {
        let t = term();
        let data = ReferenceData::new()
            .with_catalog(catalog())
            .with_conflicts(ConflictGraph::new().with_edge(&t, "L3+L4", "L21+L22"))
            .with_signatures(SlotSignatureConfig::new().with_entry(
                &t,
                SignatureEntry::new("L1+L2, L3+L4", Signature::lab(4)).with_linked("L21+L22, L23+L24"),
            ));
        assert_eq!(
            kinds(validate_reference_data(&data)),
            vec![ValidationErrorKind::ConflictingLinkage]
        );
    }

    #[test]
    fn test_ambiguous_slot() {
        let t = term();
        let data = ReferenceData::new().with_catalog(
            catalog().with_slot(&t, Day::Mon, "A", TimeRange::hm(14, 0, 14, 50)),
        );
        assert_eq!(
            kinds(validate_reference_data(&data)),
            vec![ValidationErrorKind::AmbiguousSlot]
        );
    }

    #[test]
    fn test_rows_report_duplicates() {
        let json = r#"{
            "slots": [
                {"year": "2024-25", "semester": "ODD", "day": "MON", "name": "A", "time": "08:00-08:50"},
                {"year": "2024-25", "semester": "ODD", "day": "MON", "name": "A", "time": "08:00-08:50"}
            ],
            "conflicts": [{"year": "2024-25", "semester": "ODD", "a": "A", "b": "B"}]
        }"#;
        let mut rows: ReferenceRows = serde_json::from_str(json).unwrap();
        rows.courses.push(Course::theory("CS101", 3));
        rows.courses.push(Course::theory("CS101", 4));
        assert_eq!(
            kinds(validate_reference_rows(&rows)),
            vec![
                ValidationErrorKind::DuplicateSlot,
                ValidationErrorKind::DuplicateCourse,
                ValidationErrorKind::UnknownConflictSlot
            ]
        );
    }
}
