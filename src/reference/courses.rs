//! Course registry.

use std::collections::HashMap;

use crate::error::{TimetableError, TimetableResult};
use crate::models::Course;

/// Read-only lookup of course records by code.
#[derive(Debug, Clone, Default)]
pub struct CourseRegistry {
    courses: HashMap<String, Course>,
}

impl CourseRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a course.
    pub fn add(&mut self, course: Course) {
        self.courses.insert(course.code.clone(), course);
    }

    /// Builder: adds a course.
    pub fn with_course(mut self, course: Course) -> Self {
        self.add(course);
        self
    }

    /// Course by code.
    pub fn get(&self, code: &str) -> Option<&Course> {
        self.courses.get(code)
    }

    /// Course by code, or `NotFound`.
    pub fn require(&self, code: &str) -> TimetableResult<&Course> {
        self.get(code)
            .ok_or_else(|| TimetableError::not_found("Course", code))
    }

    /// Number of courses.
    pub fn len(&self) -> usize {
        self.courses.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
    }
}

impl FromIterator<Course> for CourseRegistry {
    fn from_iter<I: IntoIterator<Item = Course>>(iter: I) -> Self {
        let mut registry = Self::new();
        for course in iter {
            registry.add(course);
        }
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_unknown_course() {
        let reg: CourseRegistry = vec![Course::theory("CS101", 4)].into_iter().collect();
        assert_eq!(reg.require("CS101").unwrap().theory_hours, 4);
        let err = reg.require("CS999").unwrap_err();
        assert!(matches!(err, TimetableError::NotFound { entity: "Course", .. }));
    }
}
