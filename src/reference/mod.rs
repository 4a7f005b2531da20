//! Administratively seeded reference tables.
//!
//! The slot grid, the declared conflict graph, the signature table and
//! course records are owned by record-management modules outside this
//! crate. The engine treats them as read-only.
//!
//! # Loading
//!
//! [`ReferenceData::from_json_str`] accepts the seeded tables as flat rows:
//!
//! ```
//! use u_timetable::reference::ReferenceData;
//!
//! let json = r#"{
//!   "slots": [
//!     {"year": "2024-25", "semester": "ODD", "day": "MON", "name": "E", "time": "11:00-11:50"}
//!   ],
//!   "conflicts": [
//!     {"year": "2024-25", "semester": "ODD", "a": "E", "b": "TE"}
//!   ],
//!   "signatures": [
//!     {"year": "2024-25", "semester": "ODD", "slot": "E", "theory": 4, "practical": 0, "linked": ["F"]}
//!   ],
//!   "courses": []
//! }"#;
//! let data = ReferenceData::from_json_str(json).unwrap();
//! assert_eq!(data.catalog.len(), 1);
//! ```

mod catalog;
mod courses;
mod graph;
mod signature;

pub use catalog::SlotCatalog;
pub use courses::CourseRegistry;
pub use graph::ConflictGraph;
pub use signature::{SignatureEntry, SlotSignatureConfig};

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, TimetableResult};
use crate::models::{Course, Day, Signature, Slot, SlotCode, Term, TimeRange};

/// Slot catalog row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotRow {
    #[serde(flatten)]
    pub term: Term,
    pub day: Day,
    pub name: String,
    pub time: TimeRange,
}

/// Declared conflict edge row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConflictRow {
    #[serde(flatten)]
    pub term: Term,
    pub a: String,
    pub b: String,
}

/// Signature table row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignatureRow {
    #[serde(flatten)]
    pub term: Term,
    pub slot: SlotCode,
    pub theory: u8,
    pub practical: u8,
    #[serde(default)]
    pub linked: Vec<SlotCode>,
}

/// The seeded tables as flat rows.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReferenceRows {
    #[serde(default)]
    pub slots: Vec<SlotRow>,
    #[serde(default)]
    pub conflicts: Vec<ConflictRow>,
    #[serde(default)]
    pub signatures: Vec<SignatureRow>,
    #[serde(default)]
    pub courses: Vec<Course>,
}

/// All reference tables the engine reads.
#[derive(Debug, Clone, Default)]
pub struct ReferenceData {
    pub catalog: SlotCatalog,
    pub conflicts: ConflictGraph,
    pub signatures: SlotSignatureConfig,
    pub courses: CourseRegistry,
}

impl ReferenceData {
    /// Creates empty reference data.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the tables from flat rows.
    ///
    /// Exact duplicate slot rows are ignored; integrity problems are not
    /// checked here (see [`crate::validation::validate_reference_data`]).
    pub fn from_rows(rows: ReferenceRows) -> Self {
        let mut data = Self::new();
        for row in rows.slots {
            if !data
                .catalog
                .add(Slot::new(row.term, row.day, row.name, row.time))
            {
                tracing::debug!("ignoring duplicate slot row");
            }
        }
        for row in rows.conflicts {
            data.conflicts.add_edge(&row.term, row.a, row.b);
        }
        for row in rows.signatures {
            let entry = SignatureEntry {
                slot: row.slot,
                signature: Signature::new(row.theory, row.practical),
                linked: row.linked,
            };
            data.signatures.add(&row.term, entry);
        }
        data.courses = rows.courses.into_iter().collect();
        tracing::debug!(
            slots = data.catalog.len(),
            courses = data.courses.len(),
            "reference data loaded"
        );
        data
    }

    /// Parses flat rows from JSON and builds the tables.
    pub fn from_json_str(json: &str) -> TimetableResult<Self> {
        let rows: ReferenceRows = serde_json::from_str(json).map_err(|source| ConfigError::Parse {
            what: "reference data",
            source,
        })?;
        Ok(Self::from_rows(rows))
    }

    /// Builder: replaces the slot catalog.
    pub fn with_catalog(mut self, catalog: SlotCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Builder: replaces the conflict graph.
    pub fn with_conflicts(mut self, conflicts: ConflictGraph) -> Self {
        self.conflicts = conflicts;
        self
    }

    /// Builder: replaces the signature table.
    pub fn with_signatures(mut self, signatures: SlotSignatureConfig) -> Self {
        self.signatures = signatures;
        self
    }

    /// Builder: replaces the course registry.
    pub fn with_courses(mut self, courses: CourseRegistry) -> Self {
        self.courses = courses;
        self
    }
}
