//! Engine configuration.
//!
//! Institution-specific rules that are data rather than code: the teaching
//! week, the theory slot combinations that must be validated across every
//! day, the per-call deadline, and the legacy availability fallback.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

use crate::error::{ConfigError, TimetableResult};
use crate::models::{Course, Day};

/// A theory slot that implicitly claims a partner slot on every day the
/// partner occurs.
///
/// A course with at least `min_theory_hours` taught in `slot` also holds
/// `partner` wherever it appears in the week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TheoryCombination {
    pub slot: String,
    pub partner: String,
    pub min_theory_hours: u8,
}

impl TheoryCombination {
    /// Creates a combination.
    pub fn new(slot: impl Into<String>, partner: impl Into<String>, min_theory_hours: u8) -> Self {
        Self {
            slot: slot.into(),
            partner: partner.into(),
            min_theory_hours,
        }
    }

    /// Whether booking `course` in `slot_name` triggers this combination.
    pub fn applies_to(&self, slot_name: &str, course: &Course) -> bool {
        self.slot == slot_name && course.theory_hours >= self.min_theory_hours
    }
}

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Days that make up the teaching week.
    pub week_days: Vec<Day>,
    /// Theory combinations checked across the whole week.
    pub theory_combinations: Vec<TheoryCombination>,
    /// Per-call deadline in milliseconds.
    pub call_deadline_ms: u64,
    /// Use the legacy strategy when the signature table has no candidates.
    pub legacy_fallback: bool,
    /// Prefix identifying lab-pair slot names for the legacy strategy.
    pub lab_slot_prefix: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            week_days: Day::weekdays(),
            theory_combinations: vec![TheoryCombination::new("E", "F", 4)],
            call_deadline_ms: 5_000,
            legacy_fallback: true,
            lab_slot_prefix: "L".to_string(),
        }
    }
}

impl EngineConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a configuration from JSON; missing fields take defaults.
    pub fn from_json_str(json: &str) -> TimetableResult<Self> {
        let config: Self = serde_json::from_str(json).map_err(|source| ConfigError::Parse {
            what: "engine config",
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Sets the teaching week.
    pub fn with_week_days(mut self, days: Vec<Day>) -> Self {
        self.week_days = days;
        self
    }

    /// Replaces the theory combinations.
    pub fn with_theory_combinations(mut self, combinations: Vec<TheoryCombination>) -> Self {
        self.theory_combinations = combinations;
        self
    }

    /// Adds a theory combination.
    pub fn with_theory_combination(mut self, combination: TheoryCombination) -> Self {
        self.theory_combinations.push(combination);
        self
    }

    /// Sets the per-call deadline.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.call_deadline_ms = deadline.as_millis().try_into().unwrap_or(u64::MAX);
        self
    }

    /// Enables or disables the legacy fallback.
    pub fn with_legacy_fallback(mut self, enabled: bool) -> Self {
        self.legacy_fallback = enabled;
        self
    }

    /// Per-call deadline.
    pub fn deadline(&self) -> Duration {
        Duration::from_millis(self.call_deadline_ms)
    }

    /// Combinations triggered by booking `course` in `slot_name`.
    pub fn combinations_for<'a>(
        &'a self,
        slot_name: &'a str,
        course: &'a Course,
    ) -> impl Iterator<Item = &'a TheoryCombination> + 'a {
        self.theory_combinations
            .iter()
            .filter(move |c| c.applies_to(slot_name, course))
    }

    /// Checks internal consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.week_days.is_empty() {
            return Err(invalid("week_days", "at least one day is required"));
        }
        let mut seen = HashSet::new();
        for day in &self.week_days {
            if !seen.insert(day) {
                return Err(invalid("week_days", format!("{day} listed twice")));
            }
        }
        if self.call_deadline_ms == 0 {
            return Err(invalid("call_deadline_ms", "must be positive"));
        }
        for c in &self.theory_combinations {
            if c.slot.trim().is_empty() || c.partner.trim().is_empty() {
                return Err(invalid("theory_combinations", "slot and partner are required"));
            }
            if c.slot == c.partner {
                return Err(invalid(
                    "theory_combinations",
                    format!("slot {} cannot partner itself", c.slot),
                ));
            }
        }
        Ok(())
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        reason: reason.into(),
    }
}
