//! Create and delete of linked slot groups.
//!
//! A booking is written as one row per atomic slot occurrence: the
//! primary row at the caller's day/time, then one row per other member
//! of its linkage group at the member's catalog occurrence. Either every
//! row is written or the rows written by this call are removed again.

use serde::{Deserialize, Serialize};

use crate::engine::checker::{CheckMode, ConflictChecker};
use crate::engine::linkage::{resolve_booking, resolve_group};
use crate::error::{StoreError, TimetableError, TimetableResult};
use crate::models::{
    Allocation, AllocationRequest, ConflictItem, ConflictKind, ConflictReport, ProposedAllocation,
};
use crate::reference::ReferenceData;
use crate::store::AllocationStore;

/// Result of a successful create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateOutcome {
    /// The primary row.
    pub allocation: Allocation,
    /// Rows of the other linkage members, in member order.
    pub linked_allocations: Vec<Allocation>,
    /// The primary row was already stored before this call.
    pub primary_allocation_exists: bool,
}

impl CreateOutcome {
    /// Every row of the booking, primary first.
    pub fn rows(&self) -> impl Iterator<Item = &Allocation> {
        std::iter::once(&self.allocation).chain(self.linked_allocations.iter())
    }
}

/// Writes bookings to a store after enforce-mode checks.
pub struct AllocationTransaction<'a, S: AllocationStore + ?Sized> {
    reference: &'a ReferenceData,
    store: &'a S,
}

impl<'a, S: AllocationStore + ?Sized> AllocationTransaction<'a, S> {
    pub fn new(reference: &'a ReferenceData, store: &'a S) -> Self {
        Self { reference, store }
    }

    /// Creates a booking and every row of its linkage group.
    ///
    /// # Errors
    /// - `Validation` / `NotFound` from request validation and lookups.
    /// - `Conflict` when a check blocks the write, or when the primary row
    ///   was inserted concurrently (`duplicate_allocation`). No row is
    ///   written in either case.
    /// - `PartialFailureCompensated` when a member insert failed after a
    ///   new primary row; the rows written by this call were removed.
    pub fn create(&self, request: &AllocationRequest) -> TimetableResult<CreateOutcome> {
        request.validate()?;
        let existing = self.store.list_term(&request.term)?;
        let proposed = ProposedAllocation::from(request.clone());
        let report = ConflictChecker::new(self.reference).check(&proposed, &existing, CheckMode::Enforce)?;
        if !report.is_clean() {
            tracing::info!(
                course = %request.course_code,
                faculty = %request.faculty_id,
                slot = %request.slot,
                kinds = ?report.kinds(),
                "allocation blocked by conflict"
            );
            return Err(TimetableError::Conflict(report));
        }

        let course = self.reference.courses.require(&request.course_code)?;
        let group = resolve_group(&self.reference.signatures, &request.term, course, &request.slot);
        let members = group.member_occurrences(&self.reference.catalog, &request.term)?;
        let primary = request.primary_row()?;

        let primary_allocation_exists = self.store.contains(&primary)?;
        if !primary_allocation_exists {
            match self.store.insert(&primary) {
                Ok(()) => {}
                Err(StoreError::Duplicate { .. }) => {
                    return Err(TimetableError::Conflict(duplicate_report(&primary)));
                }
                Err(e) => return Err(e.into()),
            }
        }

        let mut linked_allocations = Vec::with_capacity(members.len());
        let mut created: Vec<Allocation> = Vec::new();
        for slot in members {
            let row = primary.at(slot.day, slot.name.clone(), slot.time);
            match self.insert_if_absent(&row) {
                Ok(true) => created.push(row.clone()),
                Ok(false) => {}
                Err(e) if primary_allocation_exists => {
                    tracing::warn!(
                        slot = %row.slot_name,
                        error = %e,
                        "treating linked slot as already allocated"
                    );
                }
                Err(e) => return Err(self.compensate(&primary, created, e)),
            }
            linked_allocations.push(row);
        }

        tracing::info!(
            course = %primary.course_code,
            faculty = %primary.faculty_id,
            venue = %primary.venue,
            slot = %request.slot,
            rows = linked_allocations.len() + 1,
            existed = primary_allocation_exists,
            "allocation created"
        );
        Ok(CreateOutcome {
            allocation: primary,
            linked_allocations,
            primary_allocation_exists,
        })
    }

    /// Deletes a booking and the rows of its linkage group.
    ///
    /// `request.slot` may name the whole code or any single stored slot of
    /// a linked booking. Returns the removed slot names, primary first.
    pub fn delete(&self, request: &AllocationRequest) -> TimetableResult<Vec<String>> {
        request.validate()?;
        let course = self.reference.courses.require(&request.course_code)?;
        let primary = request.primary_row()?;
        if !self.store.remove(&primary)? {
            return Err(TimetableError::not_found(
                "Allocation",
                format!(
                    "{} {} {} {} {}",
                    primary.course_code, primary.faculty_id, primary.venue, primary.day, primary.slot_name
                ),
            ));
        }

        let group = resolve_booking(&self.reference.signatures, &request.term, course, &request.slot);
        let members = group.members();
        let mut removed = vec![primary.slot_name.clone()];
        for row in self.store.list_term(&request.term)? {
            if !row.same_booking(&primary) || !members.contains(&row.slot_name.as_str()) {
                continue;
            }
            if self.store.remove(&row)? && !removed.contains(&row.slot_name) {
                removed.push(row.slot_name);
            }
        }

        tracing::info!(
            course = %primary.course_code,
            faculty = %primary.faculty_id,
            removed = ?removed,
            "allocation deleted"
        );
        Ok(removed)
    }

    /// Inserts a row unless present. Returns whether it was written.
    fn insert_if_absent(&self, row: &Allocation) -> Result<bool, StoreError> {
        if self.store.contains(row)? {
            return Ok(false);
        }
        match self.store.insert(row) {
            Ok(()) => Ok(true),
            Err(StoreError::Duplicate { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Removes rows written by a failed create, newest first.
    fn compensate(&self, primary: &Allocation, created: Vec<Allocation>, cause: StoreError) -> TimetableError {
        let mut rolled_back = Vec::with_capacity(created.len() + 1);
        for row in created.iter().rev().chain(std::iter::once(primary)) {
            match self.store.remove(row) {
                Ok(_) => rolled_back.push(row.slot_name.clone()),
                Err(e) => tracing::warn!(slot = %row.slot_name, error = %e, "rollback of row failed"),
            }
        }
        tracing::warn!(
            course = %primary.course_code,
            faculty = %primary.faculty_id,
            rolled_back = ?rolled_back,
            error = %cause,
            "linked slot insert failed; rolled back"
        );
        TimetableError::PartialFailureCompensated {
            rolled_back,
            source: Box::new(cause.into()),
        }
    }
}

fn duplicate_report(primary: &Allocation) -> ConflictReport {
    ConflictReport::single(ConflictItem::new(
        ConflictKind::DuplicateAllocation,
        primary.slot_name.clone(),
        Some(primary.clone()),
        format!(
            "Allocation of {} to faculty {} in {} on {} {} was created concurrently",
            primary.course_code, primary.faculty_id, primary.venue, primary.day, primary.time
        ),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreResult;
    use crate::models::{Course, Day, Signature, SlotCode, Term, TimeRange};
    use crate::reference::{CourseRegistry, SignatureEntry, SlotCatalog, SlotSignatureConfig};
    use crate::store::InMemoryAllocationStore;

    fn term() -> Term {
        Term::odd("2024-25")
    }

    fn reference() -> ReferenceData {
        let t = term();
        let catalog = SlotCatalog::new()
            .with_slot(&t, Day::Mon, "A", TimeRange::hm(8, 0, 8, 50))
            .with_slot(&t, Day::Mon, "L1+L2", TimeRange::hm(8, 0, 9, 40))
            .with_slot(&t, Day::Mon, "L3+L4", TimeRange::hm(9, 50, 11, 30))
            .with_slot(&t, Day::Thu, "L21+L22", TimeRange::hm(14, 0, 15, 40))
            .with_slot(&t, Day::Thu, "L23+L24", TimeRange::hm(15, 50, 17, 30))
            .with_slot(&t, Day::Tue, "L5+L6", TimeRange::hm(14, 0, 15, 40))
            .with_slot(&t, Day::Fri, "L25+L26", TimeRange::hm(14, 0, 15, 40));
        let signatures = SlotSignatureConfig::new()
            .with_entry(
                &t,
                SignatureEntry::new("L1+L2, L3+L4", Signature::lab(4)).with_linked("L21+L22, L23+L24"),
            )
            .with_entry(&t, SignatureEntry::new("L5+L6", Signature::lab(2)).with_linked("L25+L26"));
        let courses = CourseRegistry::new()
            .with_course(Course::theory("CS101", 3))
            .with_course(Course::lab("CS191", 4))
            .with_course(Course::lab("CS192", 2));
        ReferenceData::new()
            .with_catalog(catalog)
            .with_signatures(signatures)
            .with_courses(courses)
    }

    fn compound_request() -> AllocationRequest {
        AllocationRequest::new(
            term(),
            "CS191",
            "F1",
            "LAB1",
            Day::Mon,
            SlotCode::parse("L1+L2, L3+L4"),
            TimeRange::hm(8, 0, 9, 40),
        )
    }

    /// Fails every insert of one slot name.
    struct FailingStore {
        inner: InMemoryAllocationStore,
        fail_slot: &'static str,
    }

    impl AllocationStore for FailingStore {
        fn insert(&self, allocation: &Allocation) -> StoreResult<()> {
            if allocation.slot_name == self.fail_slot {
                return Err(StoreError::Backend {
                    reason: "disk full".to_string(),
                });
            }
            self.inner.insert(allocation)
        }

        fn remove(&self, allocation: &Allocation) -> StoreResult<bool> {
            self.inner.remove(allocation)
        }

        fn contains(&self, allocation: &Allocation) -> StoreResult<bool> {
            self.inner.contains(allocation)
        }

        fn list_term(&self, term: &Term) -> StoreResult<Vec<Allocation>> {
            self.inner.list_term(term)
        }
    }

    /// Reports every row absent, then loses the insert race for one slot.
    struct RacingStore {
        inner: InMemoryAllocationStore,
        lost_slot: &'static str,
    }

    impl AllocationStore for RacingStore {
        fn insert(&self, allocation: &Allocation) -> StoreResult<()> {
            if allocation.slot_name == self.lost_slot {
                return Err(StoreError::Duplicate {
                    key: allocation.slot_name.clone(),
                });
            }
            self.inner.insert(allocation)
        }

        fn remove(&self, allocation: &Allocation) -> StoreResult<bool> {
            self.inner.remove(allocation)
        }

        fn contains(&self, _allocation: &Allocation) -> StoreResult<bool> {
            Ok(false)
        }

        fn list_term(&self, term: &Term) -> StoreResult<Vec<Allocation>> {
            self.inner.list_term(term)
        }
    }

    fn paired_request(day: Day, slot: &str) -> AllocationRequest {
        AllocationRequest::new(term(), "CS192", "F1", "LAB1", day, slot, TimeRange::hm(14, 0, 15, 40))
    }

    #[test]
    fn test_create_compound_writes_four_rows() {
        let refs = reference();
        let store = InMemoryAllocationStore::new();
        let tx = AllocationTransaction::new(&refs, &store);
        let outcome = tx.create(&compound_request()).unwrap();
        assert!(!outcome.primary_allocation_exists);
        assert_eq!(outcome.allocation.slot_name, "L1+L2");
        let names: Vec<&str> = outcome.rows().map(|a| a.slot_name.as_str()).collect();
        assert_eq!(names, vec!["L1+L2", "L3+L4", "L21+L22", "L23+L24"]);
        assert_eq!(store.len().unwrap(), 4);
        let thu = &outcome.linked_allocations[1];
        assert_eq!(thu.day, Day::Thu);
        assert_eq!(thu.time, TimeRange::hm(14, 0, 15, 40));
    }

    #[test]
    fn test_create_is_idempotent() {
        let refs = reference();
        let store = InMemoryAllocationStore::new();
        let tx = AllocationTransaction::new(&refs, &store);
        let first = tx.create(&compound_request()).unwrap();
        let second = tx.create(&compound_request()).unwrap();
        assert!(second.primary_allocation_exists);
        assert_eq!(first.linked_allocations, second.linked_allocations);
        assert_eq!(store.len().unwrap(), 4);
    }

    #[test]
    fn test_conflict_writes_nothing() {
        let refs = reference();
        let taken = Allocation::new(term(), "CS101", "F2", "LAB1", Day::Mon, "A", TimeRange::hm(8, 0, 9, 40));
        let store = InMemoryAllocationStore::with_rows(vec![taken]);
        let tx = AllocationTransaction::new(&refs, &store);
        let err = tx.create(&compound_request()).unwrap_err();
        let report = err.conflict_report().unwrap();
        assert_eq!(report.kinds(), vec![ConflictKind::VenueClash]);
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn test_member_failure_rolls_back() {
        let refs = reference();
        let store = FailingStore {
            inner: InMemoryAllocationStore::new(),
            fail_slot: "L23+L24",
        };
        let tx = AllocationTransaction::new(&refs, &store);
        let err = tx.create(&compound_request()).unwrap_err();
        match err {
            TimetableError::PartialFailureCompensated { rolled_back, source } => {
                assert_eq!(rolled_back, vec!["L21+L22", "L3+L4", "L1+L2"]);
                assert!(matches!(*source, TimetableError::Store(StoreError::Backend { .. })));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(store.inner.is_empty().unwrap());
    }

    #[test]
    fn test_member_failure_after_existing_primary_is_tolerated() {
        let refs = reference();
        let primary = compound_request().primary_row().unwrap();
        let store = FailingStore {
            inner: InMemoryAllocationStore::with_rows(vec![primary]),
            fail_slot: "L23+L24",
        };
        let tx = AllocationTransaction::new(&refs, &store);
        let outcome = tx.create(&compound_request()).unwrap();
        assert!(outcome.primary_allocation_exists);
        assert_eq!(outcome.linked_allocations.len(), 3);
        assert_eq!(store.inner.len().unwrap(), 3);
    }

    #[test]
    fn test_delete_removes_group() {
        let refs = reference();
        let store = InMemoryAllocationStore::new();
        let tx = AllocationTransaction::new(&refs, &store);
        tx.create(&compound_request()).unwrap();
        let removed = tx.delete(&compound_request()).unwrap();
        assert_eq!(removed, vec!["L1+L2", "L3+L4", "L21+L22", "L23+L24"]);
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn test_delete_from_single_lab_pair() {
        let refs = reference();
        let store = InMemoryAllocationStore::new();
        let tx = AllocationTransaction::new(&refs, &store);
        tx.create(&compound_request()).unwrap();
        let member = AllocationRequest::new(
            term(),
            "CS191",
            "F1",
            "LAB1",
            Day::Thu,
            "L21+L22",
            TimeRange::hm(14, 0, 15, 40),
        );
        let removed = tx.delete(&member).unwrap();
        assert_eq!(removed.len(), 4);
        assert_eq!(removed[0], "L21+L22");
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn test_delete_from_counterpart_pair() {
        let refs = reference();
        let store = InMemoryAllocationStore::new();
        let tx = AllocationTransaction::new(&refs, &store);
        let outcome = tx.create(&paired_request(Day::Tue, "L5+L6")).unwrap();
        assert_eq!(outcome.linked_allocations[0].slot_name, "L25+L26");
        assert_eq!(store.len().unwrap(), 2);

        let removed = tx.delete(&paired_request(Day::Fri, "L25+L26")).unwrap();
        assert_eq!(removed, vec!["L25+L26", "L5+L6"]);
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn test_duplicate_race_is_conflict() {
        let refs = reference();
        let store = RacingStore {
            inner: InMemoryAllocationStore::new(),
            lost_slot: "L5+L6",
        };
        let tx = AllocationTransaction::new(&refs, &store);
        let err = tx.create(&paired_request(Day::Tue, "L5+L6")).unwrap_err();
        let report = err.conflict_report().unwrap();
        assert!(report.has_kind(ConflictKind::DuplicateAllocation));
        assert_eq!(report.kinds(), vec![ConflictKind::DuplicateAllocation]);
        assert!(store.inner.is_empty().unwrap());
    }

    #[test]
    fn test_delete_missing_is_not_found() {
        let refs = reference();
        let store = InMemoryAllocationStore::new();
        let tx = AllocationTransaction::new(&refs, &store);
        let err = tx.delete(&compound_request()).unwrap_err();
        assert!(matches!(err, TimetableError::NotFound { entity: "Allocation", .. }));
    }

    #[test]
    fn test_delete_keeps_other_bookings() {
        let refs = reference();
        let store = InMemoryAllocationStore::new();
        let tx = AllocationTransaction::new(&refs, &store);
        let theory = AllocationRequest::new(term(), "CS101", "F1", "R1", Day::Mon, "A", TimeRange::hm(8, 0, 8, 50));
        tx.create(&theory).unwrap();
        let removed = tx.delete(&theory).unwrap();
        assert_eq!(removed, vec!["A"]);
    }
}
