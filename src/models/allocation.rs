//! Allocation model.
//!
//! An allocation is a committed booking of one course, taught by one
//! faculty member in one venue, at one weekly slot occurrence. The full
//! tuple is the primary key; allocations are never updated in place.

use serde::{Deserialize, Serialize};

use super::{Day, SlotCode, Term, TimeRange};
use crate::error::{TimetableError, TimetableResult};

/// A committed `(term, course, faculty, venue, day, slot, time)` booking.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Allocation {
    /// Owning term.
    pub term: Term,
    /// Booked course.
    pub course_code: String,
    /// Teaching faculty member.
    pub faculty_id: String,
    /// Venue (room or lab) identifier.
    pub venue: String,
    /// Day of week.
    pub day: Day,
    /// Atomic slot name.
    pub slot_name: String,
    /// Wall-clock range on `day`.
    pub time: TimeRange,
}

impl Allocation {
    /// Creates a new allocation row.
    pub fn new(
        term: Term,
        course_code: impl Into<String>,
        faculty_id: impl Into<String>,
        venue: impl Into<String>,
        day: Day,
        slot_name: impl Into<String>,
        time: TimeRange,
    ) -> Self {
        Self {
            term,
            course_code: course_code.into(),
            faculty_id: faculty_id.into(),
            venue: venue.into(),
            day,
            slot_name: slot_name.into(),
            time,
        }
    }

    /// Same row moved to another slot occurrence.
    pub fn at(&self, day: Day, slot_name: impl Into<String>, time: TimeRange) -> Self {
        Self {
            day,
            slot_name: slot_name.into(),
            time,
            ..self.clone()
        }
    }

    /// Whether this row occupies the given wall-clock occurrence.
    #[inline]
    pub fn occupies(&self, day: Day, time: TimeRange) -> bool {
        self.day == day && self.time == time
    }

    /// Whether this row belongs to the same `(term, course, faculty, venue)` booking.
    pub fn same_booking(&self, other: &Allocation) -> bool {
        self.term == other.term
            && self.course_code == other.course_code
            && self.faculty_id == other.faculty_id
            && self.venue == other.venue
    }
}

/// A fully specified request to create or delete a booking.
///
/// `slot` may be compound; the caller's `day`/`time` belong to its head
/// token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationRequest {
    pub term: Term,
    pub course_code: String,
    pub faculty_id: String,
    pub venue: String,
    pub day: Day,
    pub slot: SlotCode,
    pub time: TimeRange,
}

impl AllocationRequest {
    /// Creates a new request.
    pub fn new(
        term: Term,
        course_code: impl Into<String>,
        faculty_id: impl Into<String>,
        venue: impl Into<String>,
        day: Day,
        slot: impl Into<SlotCode>,
        time: TimeRange,
    ) -> Self {
        Self {
            term,
            course_code: course_code.into(),
            faculty_id: faculty_id.into(),
            venue: venue.into(),
            day,
            slot: slot.into(),
            time,
        }
    }

    /// The row recorded for the head token at the caller's day/time.
    pub fn primary_row(&self) -> TimetableResult<Allocation> {
        let head = self
            .slot
            .head()
            .ok_or_else(|| TimetableError::validation("slot"))?;
        Ok(Allocation::new(
            self.term.clone(),
            self.course_code.clone(),
            self.faculty_id.clone(),
            self.venue.clone(),
            self.day,
            head,
            self.time,
        ))
    }

    /// Rejects blank identifying fields.
    pub fn validate(&self) -> TimetableResult<()> {
        if !self.term.is_specified() {
            return Err(TimetableError::validation("year"));
        }
        for (field, value) in [
            ("course_code", &self.course_code),
            ("faculty_id", &self.faculty_id),
            ("venue", &self.venue),
        ] {
            if value.trim().is_empty() {
                return Err(TimetableError::validation(field));
            }
        }
        if self.slot.is_empty() {
            return Err(TimetableError::validation("slot"));
        }
        Ok(())
    }
}

/// A possibly partial proposal, as submitted to a dry-run conflict check.
///
/// Missing fields disable the checks that need them; a proposal with
/// only a term yields an empty report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposedAllocation {
    pub term: Option<Term>,
    pub course_code: Option<String>,
    pub faculty_id: Option<String>,
    pub venue: Option<String>,
    pub day: Option<Day>,
    pub slot: Option<SlotCode>,
    pub time: Option<TimeRange>,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

impl ProposedAllocation {
    /// Creates a proposal scoped to a term.
    pub fn new(term: Term) -> Self {
        Self {
            term: Some(term),
            ..Default::default()
        }
    }

    pub fn with_course(mut self, course_code: impl Into<String>) -> Self {
        self.course_code = Some(course_code.into());
        self
    }

    pub fn with_faculty(mut self, faculty_id: impl Into<String>) -> Self {
        self.faculty_id = Some(faculty_id.into());
        self
    }

    pub fn with_venue(mut self, venue: impl Into<String>) -> Self {
        self.venue = Some(venue.into());
        self
    }

    pub fn with_slot(mut self, day: Day, slot: impl Into<SlotCode>, time: TimeRange) -> Self {
        self.day = Some(day);
        self.slot = Some(slot.into());
        self.time = Some(time);
        self
    }

    /// Course code, if present and non-blank.
    pub fn course(&self) -> Option<&str> {
        non_blank(&self.course_code)
    }

    /// Faculty id, if present and non-blank.
    pub fn faculty(&self) -> Option<&str> {
        non_blank(&self.faculty_id)
    }

    /// Venue, if present and non-blank.
    pub fn venue_id(&self) -> Option<&str> {
        non_blank(&self.venue)
    }

    /// Slot code, if present and non-empty.
    pub fn slot_code(&self) -> Option<&SlotCode> {
        self.slot.as_ref().filter(|s| !s.is_empty())
    }

    /// Converts to a complete request, naming the first missing field.
    pub fn require(&self) -> TimetableResult<AllocationRequest> {
        let term = self
            .term
            .clone()
            .filter(Term::is_specified)
            .ok_or_else(|| TimetableError::validation("year"))?;
        let course_code = self
            .course()
            .ok_or_else(|| TimetableError::validation("course_code"))?;
        let faculty_id = self
            .faculty()
            .ok_or_else(|| TimetableError::validation("faculty_id"))?;
        let venue = self
            .venue_id()
            .ok_or_else(|| TimetableError::validation("venue"))?;
        let day = self.day.ok_or_else(|| TimetableError::validation("day"))?;
        let slot = self
            .slot_code()
            .cloned()
            .ok_or_else(|| TimetableError::validation("slot"))?;
        let time = self.time.ok_or_else(|| TimetableError::validation("time"))?;
        Ok(AllocationRequest {
            term,
            course_code: course_code.to_string(),
            faculty_id: faculty_id.to_string(),
            venue: venue.to_string(),
            day,
            slot,
            time,
        })
    }
}

impl From<AllocationRequest> for ProposedAllocation {
    fn from(req: AllocationRequest) -> Self {
        Self {
            term: Some(req.term),
            course_code: Some(req.course_code),
            faculty_id: Some(req.faculty_id),
            venue: Some(req.venue),
            day: Some(req.day),
            slot: Some(req.slot),
            time: Some(req.time),
        }
    }
}
