//! Linkage resolution.
//!
//! Expands the slot code a course is booked under into every atomic slot
//! name that must be held together with it:
//!
//! 1. **Compound labs**: a 4-hour practical course booked under a compound
//!    code (`"L1+L2, L3+L4"`) also books the mirror compound declared for
//!    it (`"L21+L22, L23+L24"`).
//! 2. **Paired labs**: a 2- or 3-hour practical course booked under a lab
//!    pair also books the counterpart pair declared for it, if any.
//! 3. Anything else has no linkage.
//!
//! A missing signature row means "no linkage". Resolution is a pure
//! function of the signature table; callers may memoize per request.

use serde::{Deserialize, Serialize};

use crate::error::{TimetableError, TimetableResult};
use crate::models::{Course, Signature, Slot, SlotCode, Term};
use crate::reference::{SlotCatalog, SlotSignatureConfig};

/// Practical hours that book a compound lab (two lab pairs on two half-days).
pub const COMPOUND_LAB_HOURS: u8 = 4;

/// The slot names a booking holds together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkageGroup {
    /// Code the caller booked under.
    pub primary: SlotCode,
    /// Linked groups declared for the primary, in declaration order.
    pub linked: Vec<SlotCode>,
    /// Resolved through the compound-lab rule.
    pub is_compound: bool,
}

impl LinkageGroup {
    /// A group with no linkage.
    pub fn unlinked(primary: SlotCode) -> Self {
        Self {
            primary,
            linked: Vec::new(),
            is_compound: false,
        }
    }

    /// Head token of the primary code.
    pub fn head(&self) -> Option<&str> {
        self.primary.head()
    }

    /// Every atomic slot name: primary tokens, then linked tokens.
    pub fn members(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        let tokens = self
            .primary
            .tokens()
            .iter()
            .chain(self.linked.iter().flat_map(|g| g.tokens().iter()));
        for token in tokens {
            if !out.contains(&token.as_str()) {
                out.push(token.as_str());
            }
        }
        out
    }

    /// Members other than the head token.
    pub fn others(&self) -> Vec<&str> {
        self.members().into_iter().skip(1).collect()
    }

    /// Flat list of linked slot names (excluding the primary's own tokens).
    pub fn linked_names(&self) -> Vec<String> {
        let members = self.members();
        members
            .into_iter()
            .filter(|m| !self.primary.contains(m))
            .map(str::to_string)
            .collect()
    }

    /// Whether booking the primary drags any other slot along.
    pub fn has_linkage(&self) -> bool {
        self.members().len() > 1
    }

    /// Catalog occurrences of every non-head member.
    ///
    /// Fails with `NotFound` naming the first member absent from the grid.
    pub fn member_occurrences<'a>(
        &self,
        catalog: &'a SlotCatalog,
        term: &Term,
    ) -> TimetableResult<Vec<&'a Slot>> {
        let mut out = Vec::new();
        for member in self.others() {
            let before = out.len();
            out.extend(
                catalog
                    .slots(term)
                    .iter()
                    .filter(|s| s.name == member),
            );
            if out.len() == before {
                return Err(TimetableError::not_found(
                    "Slot",
                    format!("{member} in {term}"),
                ));
            }
        }
        Ok(out)
    }
}

/// Resolves the linkage group for booking `course` under `primary`.
pub fn resolve_group(
    signatures: &SlotSignatureConfig,
    term: &Term,
    course: &Course,
    primary: &SlotCode,
) -> LinkageGroup {
    let practical = course.practical_hours;

    if practical == COMPOUND_LAB_HOURS && primary.is_compound() {
        return match signatures.entry(term, primary, Signature::lab(COMPOUND_LAB_HOURS)) {
            Some(entry) => LinkageGroup {
                primary: primary.clone(),
                linked: entry.linked.iter().take(1).cloned().collect(),
                is_compound: true,
            },
            None => LinkageGroup::unlinked(primary.clone()),
        };
    }

    if practical > 0 && practical < COMPOUND_LAB_HOURS {
        if let Some(entry) = signatures.entry(term, primary, Signature::lab(practical)) {
            return LinkageGroup {
                primary: primary.clone(),
                linked: entry.linked.iter().take(1).cloned().collect(),
                is_compound: false,
            };
        }
    }

    LinkageGroup::unlinked(primary.clone())
}

/// Like [`resolve_group`], but accepts any single stored slot of a
/// booking: one lab pair of a compound, a mirror pair, or the counterpart
/// pair of a 2- or 3-hour lab. The slot is widened to the entry the
/// booking was made under.
///
/// Used when only one stored row of a booking is known, as on delete.
pub fn resolve_booking(
    signatures: &SlotSignatureConfig,
    term: &Term,
    course: &Course,
    slot: &SlotCode,
) -> LinkageGroup {
    let practical = course.practical_hours;
    let signature = Signature::lab(practical);
    let widen = if practical == COMPOUND_LAB_HOURS {
        !slot.is_compound()
    } else {
        practical > 0
            && practical < COMPOUND_LAB_HOURS
            && signatures.entry(term, slot, signature).is_none()
    };
    if widen {
        let entry = slot
            .head()
            .and_then(|head| signatures.entry_linking(term, head, signature))
            .filter(|e| practical != COMPOUND_LAB_HOURS || e.slot.is_compound());
        if let Some(entry) = entry {
            return resolve_group(signatures, term, course, &entry.slot);
        }
    }
    resolve_group(signatures, term, course, slot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Day, TimeRange};
    use crate::reference::SignatureEntry;

    fn term() -> Term {
        Term::odd("2024-25")
    }

    fn signatures() -> SlotSignatureConfig {
        let t = term();
        SlotSignatureConfig::new()
            .with_entry(
                &t,
                SignatureEntry::new("L1+L2, L3+L4", Signature::lab(4)).with_linked("L21+L22, L23+L24"),
            )
            .with_entry(&t, SignatureEntry::new("L5+L6", Signature::lab(2)).with_linked("L25+L26"))
            .with_entry(&t, SignatureEntry::new("L7+L8", Signature::lab(2)))
            .with_entry(&t, SignatureEntry::new("E", Signature::theory(4)).with_linked("F"))
    }

    #[test]
    fn test_compound_lab_group() {
        let course = Course::lab("CS191", 4);
        let g = resolve_group(&signatures(), &term(), &course, &SlotCode::parse("L1+L2, L3+L4"));
        assert!(g.is_compound);
        assert_eq!(g.members(), vec!["L1+L2", "L3+L4", "L21+L22", "L23+L24"]);
        assert_eq!(g.others(), vec!["L3+L4", "L21+L22", "L23+L24"]);
        assert_eq!(g.linked_names(), vec!["L21+L22", "L23+L24"]);
    }

    #[test]
    fn test_compound_without_entry_falls_back() {
        let course = Course::lab("CS191", 4);
        let g = resolve_group(&signatures(), &term(), &course, &SlotCode::parse("L9+L10, L11+L12"));
        assert!(!g.is_compound);
        assert!(g.linked.is_empty());
        // Both primary lab pairs are still held together.
        assert_eq!(g.members(), vec!["L9+L10", "L11+L12"]);
    }

    #[test]
    fn test_two_hour_lab_counterpart() {
        let course = Course::lab("CS192", 2);
        let g = resolve_group(&signatures(), &term(), &course, &SlotCode::single("L5+L6"));
        assert!(!g.is_compound);
        assert_eq!(g.linked_names(), vec!["L25+L26"]);

        let plain = resolve_group(&signatures(), &term(), &course, &SlotCode::single("L7+L8"));
        assert!(!plain.has_linkage());
    }

    #[test]
    fn test_theory_has_no_linkage() {
        let course = Course::theory("CS101", 4);
        let g = resolve_group(&signatures(), &term(), &course, &SlotCode::single("E"));
        assert!(!g.has_linkage());
    }

    #[test]
    fn test_unknown_term_is_permissive() {
        let course = Course::lab("CS191", 4);
        let g = resolve_group(
            &signatures(),
            &Term::even("2030"),
            &course,
            &SlotCode::parse("L1+L2, L3+L4"),
        );
        assert!(!g.is_compound);
        assert!(g.linked.is_empty());
    }

    #[test]
    fn test_resolve_booking_from_member() {
        let course = Course::lab("CS191", 4);
        let g = resolve_booking(&signatures(), &term(), &course, &SlotCode::single("L1+L2"));
        assert!(g.is_compound);
        assert_eq!(g.members().len(), 4);
    }

    #[test]
    fn test_resolve_booking_from_counterpart() {
        let course = Course::lab("CS192", 2);
        let g = resolve_booking(&signatures(), &term(), &course, &SlotCode::single("L25+L26"));
        assert_eq!(g.primary, SlotCode::single("L5+L6"));
        assert_eq!(g.members(), vec!["L5+L6", "L25+L26"]);

        let plain = resolve_booking(&signatures(), &term(), &course, &SlotCode::single("L7+L8"));
        assert!(!plain.has_linkage());
    }

    #[test]
    fn test_member_occurrences() {
        let t = term();
        let catalog = SlotCatalog::new()
            .with_slot(&t, Day::Mon, "L1+L2", TimeRange::hm(8, 0, 9, 40))
            .with_slot(&t, Day::Mon, "L3+L4", TimeRange::hm(9, 50, 11, 30))
            .with_slot(&t, Day::Thu, "L21+L22", TimeRange::hm(14, 0, 15, 40))
            .with_slot(&t, Day::Thu, "L23+L24", TimeRange::hm(15, 50, 17, 30));
        let course = Course::lab("CS191", 4);
        let g = resolve_group(&signatures(), &t, &course, &SlotCode::parse("L1+L2, L3+L4"));
        let occ = g.member_occurrences(&catalog, &t).unwrap();
        let names: Vec<&str> = occ.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["L3+L4", "L21+L22", "L23+L24"]);

        let sparse = SlotCatalog::new().with_slot(&t, Day::Mon, "L1+L2", TimeRange::hm(8, 0, 9, 40));
        let err = g.member_occurrences(&sparse, &t).unwrap_err();
        assert!(matches!(err, TimetableError::NotFound { entity: "Slot", .. }));
    }
}
