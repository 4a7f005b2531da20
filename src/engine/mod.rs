//! Slot allocation and conflict resolution.
//!
//! [`TimetableEngine`] is the entry point used by the surrounding
//! application. It owns the reference tables, the configuration and an
//! [`AllocationStore`], and exposes:
//!
//! - dry-run conflict checks ([`TimetableEngine::check_conflicts`]),
//! - create/delete of linked bookings ([`TimetableEngine::create_allocation`],
//!   [`TimetableEngine::delete_allocation`]),
//! - availability for a faculty member or for a course alone,
//! - faculty and venue timetable views.
//!
//! Writers are serialized so that check-then-insert is atomic within the
//! process; the store's primary key remains the final authority across
//! processes. Reads run concurrently with writes.
//!
//! # Example
//! ```
//! use u_timetable::engine::TimetableEngine;
//! use u_timetable::config::EngineConfig;
//! use u_timetable::models::{AllocationRequest, Course, Day, Signature, Term, TimeRange};
//! use u_timetable::reference::{CourseRegistry, ReferenceData, SignatureEntry, SlotCatalog, SlotSignatureConfig};
//! use u_timetable::store::InMemoryAllocationStore;
//!
//! let term = Term::odd("2024-25");
//! let reference = ReferenceData::new()
//!     .with_catalog(SlotCatalog::new().with_slot(&term, Day::Mon, "A", TimeRange::hm(8, 0, 8, 50)))
//!     .with_signatures(SlotSignatureConfig::new().with_entry(&term, SignatureEntry::new("A", Signature::theory(3))))
//!     .with_courses(CourseRegistry::new().with_course(Course::theory("CS101", 3)));
//! let engine = TimetableEngine::new(reference, EngineConfig::default(), InMemoryAllocationStore::new()).unwrap();
//!
//! let request = AllocationRequest::new(term.clone(), "CS101", "F001", "R101", Day::Mon, "A", TimeRange::hm(8, 0, 8, 50));
//! let created = engine.create_allocation(&request).unwrap();
//! assert_eq!(created.allocation.slot_name, "A");
//! assert_eq!(engine.faculty_timetable(&term, "F001").unwrap().len(), 1);
//! ```

mod availability;
mod checker;
mod linkage;
mod transaction;

pub use availability::{
    AvailabilityComputer, AvailabilityStrategy, ConfigDrivenStrategy, CourseSlotOptions, DisabledSlot,
    LegacyAvailabilityStrategy, SlotAvailability, ALREADY_ALLOCATED,
};
pub use checker::{CheckMode, ConflictChecker};
pub use linkage::{resolve_booking, resolve_group, LinkageGroup, COMPOUND_LAB_HOURS};
pub use transaction::{AllocationTransaction, CreateOutcome};

use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::config::EngineConfig;
use crate::error::{StoreError, TimetableError, TimetableResult};
use crate::models::{Allocation, AllocationRequest, Component, ConflictReport, ProposedAllocation, Term};
use crate::reference::ReferenceData;
use crate::store::AllocationStore;

/// Wall-clock budget for one engine call.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Deadline {
    operation: &'static str,
    started: Instant,
    limit: Duration,
}

impl Deadline {
    pub(crate) fn start(operation: &'static str, limit: Duration) -> Self {
        Self {
            operation,
            started: Instant::now(),
            limit,
        }
    }

    /// Fails once the budget is spent.
    pub(crate) fn check(&self) -> TimetableResult<()> {
        let elapsed = self.started.elapsed();
        if elapsed <= self.limit {
            return Ok(());
        }
        let elapsed_ms: u64 = elapsed.as_millis().try_into().unwrap_or(u64::MAX);
        tracing::warn!(operation = self.operation, elapsed_ms, "deadline exceeded");
        Err(TimetableError::DeadlineExceeded {
            operation: self.operation,
            elapsed_ms,
        })
    }
}

/// Allocation engine over a store.
#[derive(Debug)]
pub struct TimetableEngine<S: AllocationStore> {
    reference: ReferenceData,
    config: EngineConfig,
    store: S,
    write_lock: Mutex<()>,
}

impl<S: AllocationStore> TimetableEngine<S> {
    /// Creates an engine. Fails if the configuration is inconsistent.
    pub fn new(reference: ReferenceData, config: EngineConfig, store: S) -> TimetableResult<Self> {
        config.validate()?;
        Ok(Self {
            reference,
            config,
            store,
            write_lock: Mutex::new(()),
        })
    }

    /// Reference tables.
    pub fn reference(&self) -> &ReferenceData {
        &self.reference
    }

    /// Engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Dry-run check of a possibly partial proposal.
    ///
    /// Lists every finding; missing fields skip the checks that need them.
    /// A proposal without a term yields an empty report.
    pub fn check_conflicts(&self, proposed: &ProposedAllocation) -> TimetableResult<ConflictReport> {
        let Some(term) = proposed.term.as_ref().filter(|t| t.is_specified()) else {
            return Ok(ConflictReport::new());
        };
        let deadline = self.deadline("check_conflicts");
        let existing = self.store.list_term(term)?;
        let report = ConflictChecker::new(&self.reference).check(proposed, &existing, CheckMode::Report)?;
        deadline.check()?;
        Ok(report)
    }

    /// Creates a booking with all of its linked rows.
    ///
    /// Creating an existing booking again succeeds with
    /// `primary_allocation_exists` set.
    pub fn create_allocation(&self, request: &AllocationRequest) -> TimetableResult<CreateOutcome> {
        let deadline = self.deadline("create_allocation");
        let _guard = self.write_lock.lock().map_err(|_| StoreError::LockPoisoned)?;
        deadline.check()?;
        AllocationTransaction::new(&self.reference, &self.store).create(request)
    }

    /// Deletes a booking with all of its linked rows. Returns the removed
    /// slot names, primary first.
    pub fn delete_allocation(&self, request: &AllocationRequest) -> TimetableResult<Vec<String>> {
        let deadline = self.deadline("delete_allocation");
        let _guard = self.write_lock.lock().map_err(|_| StoreError::LockPoisoned)?;
        deadline.check()?;
        AllocationTransaction::new(&self.reference, &self.store).delete(request)
    }

    /// Slots a faculty member can still take for a course.
    pub fn available_slots(
        &self,
        term: &Term,
        faculty_id: &str,
        course_code: &str,
        component: Option<Component>,
    ) -> TimetableResult<SlotAvailability> {
        let deadline = self.deadline("available_slots");
        let course = self.reference.courses.require(course_code)?;
        let rows = self.store.list_by_faculty(term, faculty_id)?;
        let result = AvailabilityComputer::new(&self.reference, &self.config)
            .available_slots(term, course, &rows, component);
        deadline.check()?;
        Ok(result)
    }

    /// Slot options for a course, ignoring any faculty.
    pub fn available_slots_for_course(
        &self,
        term: &Term,
        course_code: &str,
        component: Option<Component>,
    ) -> TimetableResult<CourseSlotOptions> {
        let course = self.reference.courses.require(course_code)?;
        Ok(AvailabilityComputer::new(&self.reference, &self.config).course_options(term, course, component))
    }

    /// A faculty member's allocations, by day and time.
    pub fn faculty_timetable(&self, term: &Term, faculty_id: &str) -> TimetableResult<Vec<Allocation>> {
        Ok(self.store.list_by_faculty(term, faculty_id)?)
    }

    /// A venue's allocations, by day and time.
    pub fn venue_timetable(&self, term: &Term, venue: &str) -> TimetableResult<Vec<Allocation>> {
        Ok(self.store.list_by_venue(term, venue)?)
    }

    fn deadline(&self, operation: &'static str) -> Deadline {
        Deadline::start(operation, self.config.deadline())
    }
}
