//! Conflict checking.
//!
//! Classifies a proposed booking against the committed allocations of its
//! term. All comparisons of occupancy use `(day, time)` equality, never
//! slot names, because semantically different slots (a theory slot and a
//! lab pair) can occupy the same wall-clock hour.
//!
//! # Checks, in order
//!
//! 1. Venue clash: same venue/day/time held by a different faculty member.
//! 2. Faculty clash: same faculty/day/time held for a different course.
//! 3. Declared slot conflict: the faculty holds a slot declared to
//!    conflict with any slot of the booking.
//! 4. Linked-slot clash: checks 1 and 2 at each linked member's own
//!    catalog day/time.
//! 5. Signature mismatch (warning, report mode only).
//!
//! In [`CheckMode::Report`] every check runs and every finding is listed;
//! checks whose inputs are missing are skipped. In [`CheckMode::Enforce`]
//! all identifying fields are required and the first blocking finding
//! ends the check.

use crate::engine::linkage::{resolve_group, LinkageGroup};
use crate::error::{TimetableError, TimetableResult};
use crate::models::{
    Allocation, Component, ConflictItem, ConflictKind, ConflictReport, Course, Day,
    ProposedAllocation, SlotCode, Term, TimeRange,
};
use crate::reference::ReferenceData;

/// How a check reacts to findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckMode {
    /// Run every check and list all findings (dry run).
    Report,
    /// Stop at the first blocking finding (write gate).
    Enforce,
}

/// Fields of a proposal that survived validation for the current mode.
struct Proposal<'p> {
    term: &'p Term,
    course_code: Option<&'p str>,
    course: Option<&'p Course>,
    faculty: Option<&'p str>,
    venue: Option<&'p str>,
    day: Option<Day>,
    time: Option<TimeRange>,
    slot: Option<&'p SlotCode>,
    group: Option<LinkageGroup>,
}

impl Proposal<'_> {
    fn head(&self) -> &str {
        self.slot.and_then(SlotCode::head).unwrap_or("")
    }
}

/// Checks proposals against reference data and committed allocations.
#[derive(Debug, Clone, Copy)]
pub struct ConflictChecker<'a> {
    reference: &'a ReferenceData,
}

impl<'a> ConflictChecker<'a> {
    /// Creates a checker over the given reference tables.
    pub fn new(reference: &'a ReferenceData) -> Self {
        Self { reference }
    }

    /// Checks a proposal against `existing` allocations.
    ///
    /// `existing` may span terms; rows of other terms are ignored.
    ///
    /// # Errors
    /// Report mode never fails. Enforce mode fails with `Validation` for
    /// missing fields and `NotFound` for an unknown course, a slot absent
    /// from the grid at the given day/time, or a linked member absent from
    /// the grid. A returned report may still contain a blocking item; the
    /// caller decides how to surface it.
    pub fn check(
        &self,
        proposed: &ProposedAllocation,
        existing: &[Allocation],
        mode: CheckMode,
    ) -> TimetableResult<ConflictReport> {
        let mut report = ConflictReport::new();
        let proposal = match mode {
            CheckMode::Report => match self.partial(proposed) {
                Some(p) => p,
                None => return Ok(report),
            },
            CheckMode::Enforce => self.complete(proposed)?,
        };
        let existing: Vec<&Allocation> = existing
            .iter()
            .filter(|a| &a.term == proposal.term)
            .collect();

        let halted = |report: &ConflictReport| mode == CheckMode::Enforce && !report.is_clean();

        self.venue_clashes(&proposal, &existing, mode, &mut report);
        if halted(&report) {
            return Ok(report);
        }
        self.faculty_clashes(&proposal, &existing, mode, &mut report);
        if halted(&report) {
            return Ok(report);
        }
        self.slot_conflicts(&proposal, &existing, mode, &mut report);
        if halted(&report) {
            return Ok(report);
        }
        self.linked_clashes(&proposal, &existing, mode, &mut report)?;
        if halted(&report) {
            return Ok(report);
        }
        if mode == CheckMode::Report {
            self.signature_mismatch(&proposal, &mut report);
        }
        Ok(report)
    }

    /// Report mode: keep whatever is present; no term means nothing to check.
    fn partial<'p>(&self, proposed: &'p ProposedAllocation) -> Option<Proposal<'p>>
    where
        'a: 'p,
    {
        let term = proposed.term.as_ref().filter(|t| t.is_specified())?;
        let course = proposed
            .course()
            .and_then(|code| self.reference.courses.get(code));
        let slot = proposed.slot_code();
        let group = match (course, slot) {
            (Some(c), Some(s)) => Some(resolve_group(&self.reference.signatures, term, c, s)),
            _ => None,
        };
        Some(Proposal {
            term,
            course_code: proposed.course(),
            course,
            faculty: proposed.faculty(),
            venue: proposed.venue_id(),
            day: proposed.day,
            time: proposed.time,
            slot,
            group,
        })
    }

    /// Enforce mode: every identifying field must be present and resolvable.
    fn complete<'p>(&self, proposed: &'p ProposedAllocation) -> TimetableResult<Proposal<'p>>
    where
        'a: 'p,
    {
        proposed.require()?;
        let term = proposed
            .term
            .as_ref()
            .ok_or_else(|| TimetableError::validation("year"))?;
        let course_code = proposed
            .course()
            .ok_or_else(|| TimetableError::validation("course_code"))?;
        let course = self.reference.courses.require(course_code)?;
        let slot = proposed
            .slot_code()
            .ok_or_else(|| TimetableError::validation("slot"))?;
        let (day, time) = proposed
            .day
            .zip(proposed.time)
            .ok_or_else(|| TimetableError::validation("day"))?;
        let head = slot.head().unwrap_or_default();
        if !self.reference.catalog.contains(term, day, head, time) {
            return Err(TimetableError::not_found(
                "Slot",
                format!("{head} on {day} {time} in {term}"),
            ));
        }
        let group = resolve_group(&self.reference.signatures, term, course, slot);
        Ok(Proposal {
            term,
            course_code: Some(course_code),
            course: Some(course),
            faculty: proposed.faculty(),
            venue: proposed.venue_id(),
            day: Some(day),
            time: Some(time),
            slot: Some(slot),
            group: Some(group),
        })
    }

    fn venue_clashes(
        &self,
        p: &Proposal<'_>,
        existing: &[&Allocation],
        mode: CheckMode,
        report: &mut ConflictReport,
    ) {
        let (Some(venue), Some(faculty), Some(day), Some(time)) = (p.venue, p.faculty, p.day, p.time)
        else {
            return;
        };
        for item in venue_clash_items(p.head(), venue, faculty, day, time, existing) {
            report.push(item);
            if mode == CheckMode::Enforce {
                return;
            }
        }
    }

    fn faculty_clashes(
        &self,
        p: &Proposal<'_>,
        existing: &[&Allocation],
        mode: CheckMode,
        report: &mut ConflictReport,
    ) {
        let (Some(faculty), Some(course), Some(day), Some(time)) =
            (p.faculty, p.course_code, p.day, p.time)
        else {
            return;
        };
        for item in faculty_clash_items(p.head(), faculty, course, day, time, existing) {
            report.push(item);
            if mode == CheckMode::Enforce {
                return;
            }
        }
    }

    fn slot_conflicts(
        &self,
        p: &Proposal<'_>,
        existing: &[&Allocation],
        mode: CheckMode,
        report: &mut ConflictReport,
    ) {
        let (Some(faculty), Some(slot)) = (p.faculty, p.slot) else {
            return;
        };
        let members: Vec<&str> = match &p.group {
            Some(group) => group.members(),
            None => slot.tokens().iter().map(String::as_str).collect(),
        };
        let held: Vec<&&Allocation> = existing.iter().filter(|a| a.faculty_id == faculty).collect();
        for member in members {
            let declared = self.reference.conflicts.conflicts_of(p.term, member);
            if declared.is_empty() {
                continue;
            }
            for a in held.iter().filter(|a| declared.contains(&a.slot_name)) {
                report.push(ConflictItem::slot_conflict(member, a));
                if mode == CheckMode::Enforce {
                    return;
                }
            }
        }
    }

    fn linked_clashes(
        &self,
        p: &Proposal<'_>,
        existing: &[&Allocation],
        mode: CheckMode,
        report: &mut ConflictReport,
    ) -> TimetableResult<()> {
        let Some(group) = p.group.as_ref().filter(|g| g.has_linkage()) else {
            return Ok(());
        };
        let occurrences = match group.member_occurrences(&self.reference.catalog, p.term) {
            Ok(occurrences) => occurrences,
            Err(e) if mode == CheckMode::Enforce => return Err(e),
            Err(e) => {
                tracing::debug!(error = %e, "skipping linked-slot check");
                return Ok(());
            }
        };
        for slot in occurrences {
            if let (Some(venue), Some(faculty)) = (p.venue, p.faculty) {
                for item in venue_clash_items(&slot.name, venue, faculty, slot.day, slot.time, existing) {
                    report.push(item.into_linked());
                    if mode == CheckMode::Enforce {
                        return Ok(());
                    }
                }
            }
            if let (Some(faculty), Some(course)) = (p.faculty, p.course_code) {
                for item in faculty_clash_items(&slot.name, faculty, course, slot.day, slot.time, existing) {
                    report.push(item.into_linked());
                    if mode == CheckMode::Enforce {
                        return Ok(());
                    }
                }
            }
        }
        Ok(())
    }

    fn signature_mismatch(&self, p: &Proposal<'_>, report: &mut ConflictReport) {
        let (Some(course), Some(slot)) = (p.course, p.slot) else {
            return;
        };
        let signatures = &self.reference.signatures;
        let mut accepted = vec![course.signature()];
        if course.is_embedded() {
            accepted.push(course.booking_signature(Some(Component::Theory)));
            accepted.push(course.booking_signature(Some(Component::Lab)));
        }
        // Terms that never seeded the table for this course are not judged.
        if accepted
            .iter()
            .all(|sig| signatures.candidates(p.term, *sig).is_empty())
        {
            return;
        }
        if accepted
            .iter()
            .any(|sig| signatures.entry(p.term, slot, *sig).is_some())
        {
            return;
        }
        report.push(ConflictItem::new(
            ConflictKind::SignatureMismatch,
            slot.display(),
            None,
            format!(
                "Slot {} is not configured for course {} ({})",
                slot,
                course.code,
                course.signature()
            ),
        ));
    }
}

fn venue_clash_items(
    slot_name: &str,
    venue: &str,
    faculty: &str,
    day: Day,
    time: TimeRange,
    existing: &[&Allocation],
) -> Vec<ConflictItem> {
    existing
        .iter()
        .filter(|a| a.venue == venue && a.occupies(day, time) && a.faculty_id != faculty)
        .map(|a| ConflictItem::venue_clash(slot_name, a))
        .collect()
}

fn faculty_clash_items(
    slot_name: &str,
    faculty: &str,
    course: &str,
    day: Day,
    time: TimeRange,
    existing: &[&Allocation],
) -> Vec<ConflictItem> {
    existing
        .iter()
        .filter(|a| a.faculty_id == faculty && a.occupies(day, time) && a.course_code != course)
        .map(|a| ConflictItem::faculty_clash(slot_name, a))
        .collect()
}
