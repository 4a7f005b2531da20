//! Timetabling domain models.
//!
//! Provides the core data types shared by the reference tables, the
//! allocation store and the engine.
//!
//! # Domain Mappings
//!
//! | u-timetable | Meaning |
//! |-------------|---------|
//! | Term | Academic year + semester scoping all data |
//! | Slot | One weekly occurrence of a named slot |
//! | SlotCode | Single or compound slot identity a course is booked under |
//! | Allocation | Committed course/faculty/venue/slot booking |
//! | ConflictReport | Transient result of a conflict check |

mod allocation;
mod calendar;
mod conflict;
mod course;
mod slot;
mod term;

pub use allocation::{Allocation, AllocationRequest, ProposedAllocation};
pub use calendar::{Day, TimeRange};
pub use conflict::{ConflictItem, ConflictKind, ConflictReport, Severity};
pub use course::{Component, Course, CourseType, Signature};
pub use slot::{Slot, SlotCode, COMPOUND_SEPARATOR};
pub use term::{SemesterType, Term};
