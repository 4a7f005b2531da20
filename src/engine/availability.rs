//! Slot availability for a faculty member and course.
//!
//! Candidates come from an [`AvailabilityStrategy`]. The config-driven
//! strategy reads the signature table; the legacy strategy derives
//! candidates from slot names in the grid and is consulted only when the
//! signature table offers nothing for the course.
//!
//! Every candidate ends up either available or disabled with a reason.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt::Debug;

use crate::config::EngineConfig;
use crate::engine::linkage::{resolve_group, COMPOUND_LAB_HOURS};
use crate::models::{Allocation, Component, Course, Day, Slot, SlotCode, Term, TimeRange};
use crate::reference::ReferenceData;

/// Reason given for a candidate the faculty already holds.
pub const ALREADY_ALLOCATED: &str = "Already allocated";

/// A candidate that cannot be offered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisabledSlot {
    pub slot: SlotCode,
    pub reason: String,
}

/// Candidates partitioned into available and disabled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotAvailability {
    pub available: Vec<SlotCode>,
    pub disabled: Vec<DisabledSlot>,
}

impl SlotAvailability {
    /// Whether `slot` is offered.
    pub fn is_available(&self, slot: &SlotCode) -> bool {
        self.available.contains(slot)
    }

    /// Disable reason for `slot`, if disabled.
    pub fn reason_for(&self, slot: &SlotCode) -> Option<&str> {
        self.disabled
            .iter()
            .find(|d| &d.slot == slot)
            .map(|d| d.reason.as_str())
    }

    /// Total number of candidates considered.
    pub fn len(&self) -> usize {
        self.available.len() + self.disabled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Faculty-independent slot options for a course.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseSlotOptions {
    /// Candidate slot codes.
    pub available_slots: Vec<SlotCode>,
    /// Display code of a candidate to the slot names booked along with it.
    pub slot_links: BTreeMap<String, Vec<String>>,
}

/// Source of candidate slot codes for a course.
pub trait AvailabilityStrategy: Send + Sync + Debug {
    /// Strategy name for logs.
    fn name(&self) -> &'static str;

    /// Candidate slot codes for booking `course` (or one of its components).
    fn candidates(
        &self,
        reference: &ReferenceData,
        term: &Term,
        course: &Course,
        component: Option<Component>,
    ) -> Vec<SlotCode>;
}

/// Candidates from the signature table.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigDrivenStrategy;

impl AvailabilityStrategy for ConfigDrivenStrategy {
    fn name(&self) -> &'static str {
        "config"
    }

    fn candidates(
        &self,
        reference: &ReferenceData,
        term: &Term,
        course: &Course,
        component: Option<Component>,
    ) -> Vec<SlotCode> {
        reference
            .signatures
            .candidates(term, course.booking_signature(component))
            .iter()
            .map(|e| e.slot.clone())
            .collect()
    }
}

/// Candidates derived from slot names for terms without signature rows.
///
/// Lab courses get lab-pair names (`prefix` + `'+'`, e.g. `L1+L2`);
/// 4-hour labs get two consecutive lab pairs of the same half-day as one
/// compound. Theory courses get every other slot name.
#[derive(Debug, Clone)]
pub struct LegacyAvailabilityStrategy {
    lab_slot_prefix: String,
}

impl LegacyAvailabilityStrategy {
    pub fn new(lab_slot_prefix: impl Into<String>) -> Self {
        Self {
            lab_slot_prefix: lab_slot_prefix.into(),
        }
    }

    fn is_lab_name(&self, name: &str) -> bool {
        name.starts_with(self.lab_slot_prefix.as_str()) && name.contains('+')
    }

    fn compound_labs(&self, reference: &ReferenceData, term: &Term) -> Vec<SlotCode> {
        let mut by_day: BTreeMap<Day, Vec<&Slot>> = BTreeMap::new();
        for slot in reference.catalog.slots(term) {
            if self.is_lab_name(&slot.name) {
                by_day.entry(slot.day).or_default().push(slot);
            }
        }
        let mut out: Vec<SlotCode> = Vec::new();
        for slots in by_day.values() {
            // Catalog order is (day, time, name) already.
            for pair in slots.windows(2) {
                let (first, second) = (pair[0], pair[1]);
                if first.time.is_morning() != second.time.is_morning() || first.name == second.name {
                    continue;
                }
                let code = SlotCode::from_tokens([first.name.as_str(), second.name.as_str()]);
                if !out.contains(&code) {
                    out.push(code);
                }
            }
        }
        out
    }
}

impl Default for LegacyAvailabilityStrategy {
    fn default() -> Self {
        Self::new("L")
    }
}

impl AvailabilityStrategy for LegacyAvailabilityStrategy {
    fn name(&self) -> &'static str {
        "legacy"
    }

    fn candidates(
        &self,
        reference: &ReferenceData,
        term: &Term,
        course: &Course,
        component: Option<Component>,
    ) -> Vec<SlotCode> {
        let signature = course.booking_signature(component);
        if signature.practical == COMPOUND_LAB_HOURS {
            return self.compound_labs(reference, term);
        }
        let want_lab = signature.practical > 0;
        reference
            .catalog
            .names(term)
            .into_iter()
            .filter(|name| self.is_lab_name(name) == want_lab)
            .map(SlotCode::single)
            .collect()
    }
}

/// What a faculty member already holds in a term.
struct FacultyLoad<'r> {
    rows: &'r [Allocation],
    held: HashSet<&'r str>,
    by_day: HashMap<Day, HashMap<TimeRange, &'r str>>,
}

impl<'r> FacultyLoad<'r> {
    fn new(rows: &'r [Allocation]) -> Self {
        let mut held = HashSet::new();
        let mut by_day: HashMap<Day, HashMap<TimeRange, &str>> = HashMap::new();
        for row in rows {
            held.insert(row.slot_name.as_str());
            by_day
                .entry(row.day)
                .or_default()
                .insert(row.time, row.slot_name.as_str());
        }
        Self { rows, held, by_day }
    }

    fn holds(&self, name: &str) -> bool {
        self.held.contains(name)
    }

    fn holds_on(&self, name: &str, day: Day) -> bool {
        self.rows.iter().any(|r| r.slot_name == name && r.day == day)
    }

    fn at(&self, day: Day, time: TimeRange) -> Option<&'r str> {
        self.by_day.get(&day).and_then(|m| m.get(&time)).copied()
    }
}

/// Computes availability from reference data and a faculty's holdings.
#[derive(Debug)]
pub struct AvailabilityComputer<'a> {
    reference: &'a ReferenceData,
    config: &'a EngineConfig,
    primary: ConfigDrivenStrategy,
    fallback: LegacyAvailabilityStrategy,
}

impl<'a> AvailabilityComputer<'a> {
    pub fn new(reference: &'a ReferenceData, config: &'a EngineConfig) -> Self {
        Self {
            reference,
            config,
            primary: ConfigDrivenStrategy,
            fallback: LegacyAvailabilityStrategy::new(config.lab_slot_prefix.clone()),
        }
    }

    /// Candidate slot codes for a course.
    pub fn candidates(&self, term: &Term, course: &Course, component: Option<Component>) -> Vec<SlotCode> {
        let found = self.primary.candidates(self.reference, term, course, component);
        if !found.is_empty() || !self.config.legacy_fallback {
            return found;
        }
        let legacy = self.fallback.candidates(self.reference, term, course, component);
        tracing::debug!(
            course = %course.code,
            term = %term,
            strategy = self.fallback.name(),
            candidates = legacy.len(),
            "no configured candidates; using fallback"
        );
        legacy
    }

    /// Partitions the course's candidates for a faculty member.
    ///
    /// `faculty_rows` are that faculty member's allocations; rows of other
    /// terms are ignored.
    pub fn available_slots(
        &self,
        term: &Term,
        course: &Course,
        faculty_rows: &[Allocation],
        component: Option<Component>,
    ) -> SlotAvailability {
        let rows: Vec<Allocation> = faculty_rows
            .iter()
            .filter(|a| &a.term == term)
            .cloned()
            .collect();
        let load = FacultyLoad::new(&rows);
        let mut result = SlotAvailability::default();
        for candidate in self.candidates(term, course, component) {
            let reasons = self.disable_reasons(term, course, &candidate, &load);
            if reasons.is_empty() {
                result.available.push(candidate);
            } else {
                result.disabled.push(DisabledSlot {
                    slot: candidate,
                    reason: reasons.join("; "),
                });
            }
        }
        result
    }

    /// Faculty-independent options and their linked slot names.
    pub fn course_options(&self, term: &Term, course: &Course, component: Option<Component>) -> CourseSlotOptions {
        let mut options = CourseSlotOptions::default();
        for candidate in self.candidates(term, course, component) {
            let group = resolve_group(&self.reference.signatures, term, course, &candidate);
            let mut links = group.linked_names();
            for token in candidate.tokens() {
                for combo in self.config.combinations_for(token, course) {
                    if !links.contains(&combo.partner) {
                        links.push(combo.partner.clone());
                    }
                }
            }
            if !links.is_empty() {
                options.slot_links.insert(candidate.display(), links);
            }
            options.available_slots.push(candidate);
        }
        options
    }

    fn disable_reasons(&self, term: &Term, course: &Course, candidate: &SlotCode, load: &FacultyLoad<'_>) -> Vec<String> {
        if candidate.tokens().iter().any(|t| load.holds(t)) {
            return vec![ALREADY_ALLOCATED.to_string()];
        }
        let mut reasons: Vec<String> = Vec::new();
        let mut note = |reason: String| {
            if !reasons.contains(&reason) {
                reasons.push(reason);
            }
        };

        let group = resolve_group(&self.reference.signatures, term, course, candidate);
        let members = group.members();

        for linked in group.linked_names() {
            if load.holds(&linked) {
                note(format!("Linked slot {linked} already allocated"));
            }
        }

        for member in &members {
            for slot in self.reference.catalog.occurrences(term, member) {
                if let Some(held) = load.at(slot.day, slot.time) {
                    note(format!(
                        "Slot {} on {} {} clashes with allocated slot {}",
                        member, slot.day, slot.time, held
                    ));
                }
            }
        }

        let held_sorted: BTreeSet<&str> = load.held.iter().copied().collect();
        for member in &members {
            for held in &held_sorted {
                if self.reference.conflicts.are_conflicting(term, member, held) {
                    note(format!("Slot {member} conflicts with allocated slot {held}"));
                }
            }
        }

        for token in candidate.tokens() {
            for combo in self.config.combinations_for(token, course) {
                let partner = combo.partner.as_str();
                for &day in &self.config.week_days {
                    if load.holds_on(partner, day) {
                        note(format!("Partner slot {partner} already allocated on {day}"));
                    }
                    for slot in self.reference.catalog.occurrences_on(term, day, partner) {
                        if let Some(held) = load.at(day, slot.time) {
                            if held != partner {
                                note(format!(
                                    "Partner slot {} on {} {} clashes with allocated slot {}",
                                    partner, day, slot.time, held
                                ));
                            }
                        }
                    }
                    for held in &held_sorted {
                        if self.reference.conflicts.are_conflicting(term, partner, held) {
                            note(format!("Partner slot {partner} conflicts with allocated slot {held}"));
                        }
                    }
                }
                if load.holds(partner) {
                    note(format!("Partner slot {partner} already allocated"));
                }
            }
        }

        reasons
    }
}
