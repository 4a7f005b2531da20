//! Error types for timetable operations.

use thiserror::Error;

use crate::models::ConflictReport;

/// Allocation store errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Allocation already exists: {key}")]
    Duplicate { key: String },

    #[error("Allocation store lock poisoned")]
    LockPoisoned,

    #[error("Store backend failed: {reason}")]
    Backend { reason: String },
}

/// Configuration and reference-data loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse {what}: {source}")]
    Parse {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Top-level error for engine operations.
#[derive(Debug, Error)]
pub enum TimetableError {
    /// A required identifying field is missing; nothing was written.
    #[error("Required field missing: {field}")]
    Validation { field: String },

    /// The proposal violates a blocking rule; nothing was written.
    #[error("Allocation conflict: {0}")]
    Conflict(ConflictReport),

    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    /// A linked member failed after a new primary row was written; the
    /// listed rows were removed again before returning.
    #[error("Linked allocation failed, rolled back {rolled_back:?}: {source}")]
    PartialFailureCompensated {
        rolled_back: Vec<String>,
        #[source]
        source: Box<TimetableError>,
    },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{operation} exceeded its deadline after {elapsed_ms}ms")]
    DeadlineExceeded {
        operation: &'static str,
        elapsed_ms: u64,
    },
}

impl TimetableError {
    /// Missing-field validation error.
    pub fn validation(field: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
        }
    }

    /// Lookup failure for an entity.
    pub fn not_found(entity: &'static str, key: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            key: key.into(),
        }
    }

    /// The conflict report, if this is a conflict.
    pub fn conflict_report(&self) -> Option<&ConflictReport> {
        match self {
            Self::Conflict(report) => Some(report),
            _ => None,
        }
    }
}

/// Result alias for engine operations.
pub type TimetableResult<T> = Result<T, TimetableError>;

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ConflictItem, ConflictKind};

    #[test]
    fn test_error_messages() {
        assert_eq!(
            TimetableError::validation("venue").to_string(),
            "Required field missing: venue"
        );
        assert_eq!(
            TimetableError::not_found("Course", "CS999").to_string(),
            "Course not found: CS999"
        );
    }

    #[test]
    fn test_store_error_converts() {
        fn fails() -> TimetableResult<()> {
            let result: StoreResult<()> = Err(StoreError::LockPoisoned);
            result?;
            Ok(())
        }
        assert!(matches!(fails(), Err(TimetableError::Store(StoreError::LockPoisoned))));
    }

    #[test]
    fn test_partial_failure_keeps_source() {
        use std::error::Error as _;
        let err = TimetableError::PartialFailureCompensated {
            rolled_back: vec!["L1+L2".into()],
            source: Box::new(StoreError::Backend { reason: "disk full".into() }.into()),
        };
        assert!(err.source().is_some());
        assert!(err.to_string().contains("disk full"));
    }

    #[test]
    fn test_conflict_report_accessor() {
        let report = ConflictReport::single(ConflictItem::new(
            ConflictKind::SlotConflict,
            "E",
            None,
            "declared conflict",
        ));
        let err = TimetableError::Conflict(report.clone());
        assert_eq!(err.conflict_report(), Some(&report));
        assert!(TimetableError::validation("x").conflict_report().is_none());
    }
}
