//! Slot allocation and conflict resolution for university timetables.
//!
//! Assigns courses, faculty and venues to the fixed weekly slot grid of an
//! academic term while preventing double-booking and enforcing the
//! institution's slot rules: multi-hour lab pairs, compound labs split
//! across two half-days, declared slot conflicts, and theory slot
//! combinations that hold across the whole week.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Term`, `Day`, `TimeRange`, `SlotCode`,
//!   `Course`, `Allocation`, `ConflictReport`
//! - **`reference`**: Seeded read-only tables: slot grid, conflict graph,
//!   signature table, courses
//! - **`store`**: `AllocationStore` trait and an in-memory implementation
//! - **`engine`**: Linkage resolution, conflict checking, availability,
//!   transactional create/delete, and the `TimetableEngine` facade
//! - **`config`**: `EngineConfig` (teaching week, theory combinations, deadline)
//! - **`validation`**: Integrity checks for seeded reference data
//! - **`error`**: `TimetableError` and friends
//!
//! # Conventions
//!
//! Occupancy is always compared by `(day, time)`, never by slot name: a
//! slot name recurs on several days at different times, and different
//! names can share an hour. Declared conflicts, in contrast, are between
//! slot names and hold across the whole week.

pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod reference;
pub mod store;
pub mod validation;

pub use config::{EngineConfig, TheoryCombination};
pub use engine::{CreateOutcome, SlotAvailability, TimetableEngine};
pub use error::{TimetableError, TimetableResult};
