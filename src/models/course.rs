//! Course model.
//!
//! Courses are external reference records. The engine only reads their
//! contact-hour signature and course type, which decide the slot names a
//! course may be booked under.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Weekly contact hours `(theory, practical)`.
///
/// The key used to look up eligible slots in the signature table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Signature {
    /// Theory (lecture) hours per week.
    pub theory: u8,
    /// Practical (lab) hours per week.
    pub practical: u8,
}

impl Signature {
    /// Creates a new signature.
    pub const fn new(theory: u8, practical: u8) -> Self {
        Self { theory, practical }
    }

    /// Lab-only signature with the given practical hours.
    pub const fn lab(practical: u8) -> Self {
        Self::new(0, practical)
    }

    /// Theory-only signature with the given theory hours.
    pub const fn theory(theory: u8) -> Self {
        Self::new(theory, 0)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}P{}", self.theory, self.practical)
    }
}

/// Course classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CourseType {
    /// Lecture-only course.
    Theory,
    /// Lab-only course.
    Lab,
    /// Theory course with an embedded lab, booked as two components.
    TheoryEmbeddedLab,
    /// Project or thesis work (no weekly slots).
    Project,
    /// Institution-specific type.
    Custom(String),
}

/// One bookable half of a Theory-Embedded-Lab course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Component {
    Theory,
    Lab,
}

/// A course offered in a term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    /// Course code (unique within the institution).
    pub code: String,
    /// Human-readable title.
    pub name: String,
    /// Theory hours per week.
    pub theory_hours: u8,
    /// Practical hours per week.
    pub practical_hours: u8,
    /// Credit value.
    pub credits: u8,
    /// Course classification.
    pub course_type: CourseType,
}

impl Course {
    /// Creates a course with the given type and no contact hours.
    pub fn new(code: impl Into<String>, course_type: CourseType) -> Self {
        Self {
            code: code.into(),
            name: String::new(),
            theory_hours: 0,
            practical_hours: 0,
            credits: 0,
            course_type,
        }
    }

    /// Creates a lecture-only course.
    pub fn theory(code: impl Into<String>, hours: u8) -> Self {
        Self::new(code, CourseType::Theory)
            .with_hours(hours, 0)
            .with_credits(hours)
    }

    /// Creates a lab-only course.
    pub fn lab(code: impl Into<String>, hours: u8) -> Self {
        Self::new(code, CourseType::Lab)
            .with_hours(0, hours)
            .with_credits(hours / 2)
    }

    /// Creates a Theory-Embedded-Lab course.
    pub fn embedded(code: impl Into<String>, theory: u8, practical: u8) -> Self {
        Self::new(code, CourseType::TheoryEmbeddedLab)
            .with_hours(theory, practical)
            .with_credits(theory + practical / 2)
    }

    /// Sets the course title.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the weekly contact hours.
    pub fn with_hours(mut self, theory: u8, practical: u8) -> Self {
        self.theory_hours = theory;
        self.practical_hours = practical;
        self
    }

    /// Sets the credit value.
    pub fn with_credits(mut self, credits: u8) -> Self {
        self.credits = credits;
        self
    }

    /// Full contact-hour signature.
    pub fn signature(&self) -> Signature {
        Signature::new(self.theory_hours, self.practical_hours)
    }

    /// Whether the course is booked in separate theory and lab components.
    pub fn is_embedded(&self) -> bool {
        self.course_type == CourseType::TheoryEmbeddedLab
    }

    /// Signature to book under, narrowed to a component when relevant.
    ///
    /// Only Theory-Embedded-Lab courses split by component; every other
    /// course ignores the filter.
    pub fn booking_signature(&self, component: Option<Component>) -> Signature {
        match (self.is_embedded(), component) {
            (true, Some(Component::Theory)) => Signature::theory(self.theory_hours),
            (true, Some(Component::Lab)) => Signature::lab(self.practical_hours),
            _ => self.signature(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_course_builder() {
        let c = Course::theory("CS101", 4).with_name("Programming");
        assert_eq!(c.code, "CS101");
        assert_eq!(c.name, "Programming");
        assert_eq!(c.signature(), Signature::new(4, 0));
        assert_eq!(c.credits, 4);
        assert!(!c.is_embedded());
    }

    #[test]
    fn test_lab_course() {
        let c = Course::lab("CS191", 4);
        assert_eq!(c.signature(), Signature::lab(4));
        assert_eq!(c.course_type, CourseType::Lab);
    }

    #[test]
    fn test_embedded_component_signature() {
        let c = Course::embedded("EE201", 3, 2);
        assert_eq!(c.booking_signature(None), Signature::new(3, 2));
        assert_eq!(c.booking_signature(Some(Component::Theory)), Signature::theory(3));
        assert_eq!(c.booking_signature(Some(Component::Lab)), Signature::lab(2));
    }

    #[test]
    fn test_component_ignored_for_plain_courses() {
        let c = Course::theory("MA101", 3);
        assert_eq!(c.booking_signature(Some(Component::Lab)), Signature::theory(3));
    }

    #[test]
    fn test_signature_display() {
        assert_eq!(Signature::new(3, 2).to_string(), "T3P2");
    }
}
