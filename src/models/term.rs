//! Academic term model.
//!
//! A term scopes every piece of timetable data: the slot grid, declared
//! conflicts, slot signatures and allocations. No allocation outlives
//! its term.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Semester classification within an academic year.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SemesterType {
    /// Odd (autumn) semester.
    Odd,
    /// Even (spring) semester.
    Even,
    /// Summer or short term.
    Summer,
    /// Institution-specific term name.
    Custom(String),
}

impl fmt::Display for SemesterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SemesterType::Odd => f.write_str("ODD"),
            SemesterType::Even => f.write_str("EVEN"),
            SemesterType::Summer => f.write_str("SUMMER"),
            SemesterType::Custom(name) => f.write_str(name),
        }
    }
}

/// An academic term: `(year, semester type)`.
///
/// The year is kept verbatim (`"2024-25"`, `"2025"`) since institutions
/// label academic years differently.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Term {
    /// Academic year label.
    pub year: String,
    /// Semester within the year.
    pub semester: SemesterType,
}

impl Term {
    /// Creates a new term.
    pub fn new(year: impl Into<String>, semester: SemesterType) -> Self {
        Self {
            year: year.into(),
            semester,
        }
    }

    /// Odd semester of the given year.
    pub fn odd(year: impl Into<String>) -> Self {
        Self::new(year, SemesterType::Odd)
    }

    /// Even semester of the given year.
    pub fn even(year: impl Into<String>) -> Self {
        Self::new(year, SemesterType::Even)
    }

    /// Whether the term identity is usable (non-blank year).
    pub fn is_specified(&self) -> bool {
        !self.year.trim().is_empty()
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.year, self.semester)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_term_display() {
        assert_eq!(Term::odd("2024-25").to_string(), "2024-25 ODD");
        let custom = Term::new("2025", SemesterType::Custom("WINTER".into()));
        assert_eq!(custom.to_string(), "2025 WINTER");
    }

    #[test]
    fn test_term_equality_scopes_data() {
        assert_eq!(Term::odd("2024-25"), Term::odd("2024-25"));
        assert_ne!(Term::odd("2024-25"), Term::even("2024-25"));
        assert!(!Term::odd("  ").is_specified());
    }
}
