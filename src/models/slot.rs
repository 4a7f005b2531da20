//! Slot identities.
//!
//! A [`Slot`] is one weekly occurrence of a named slot in the term grid.
//! A [`SlotCode`] is the identity a course is booked under: either a single
//! slot name (`"E"`, `"L5+L6"`) or a compound of several lab pairs
//! (`"L1+L2, L3+L4"`) that must be held together.
//!
//! Compound codes are stored as an ordered token list. The comma-joined
//! string only exists at the persistence and display boundary.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{Day, Term, TimeRange};

/// Separator used in the display form of compound codes.
pub const COMPOUND_SEPARATOR: &str = ", ";

/// A canonical weekly slot occurrence.
///
/// Unique per `(term, day, name, time)`. A name may occur on several days
/// with different times; each occurrence is its own `Slot`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Slot {
    /// Owning term.
    pub term: Term,
    /// Day of week.
    pub day: Day,
    /// Atomic slot name.
    pub name: String,
    /// Wall-clock range on `day`.
    pub time: TimeRange,
}

impl Slot {
    /// Creates a new slot occurrence.
    pub fn new(term: Term, day: Day, name: impl Into<String>, time: TimeRange) -> Self {
        Self {
            term,
            day,
            name: name.into(),
            time,
        }
    }
}

/// Ordered list of atomic slot-name tokens.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SlotCode {
    tokens: Vec<String>,
}

impl SlotCode {
    /// A code of exactly one token.
    pub fn single(name: impl Into<String>) -> Self {
        Self {
            tokens: vec![name.into()],
        }
    }

    /// Builds a code from already-split tokens. Blank tokens are dropped.
    pub fn from_tokens<I, T>(tokens: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            tokens: tokens
                .into_iter()
                .map(|t| {
                    let t: String = t.into();
                    t.trim().to_string()
                })
                .filter(|t| !t.is_empty())
                .collect(),
        }
    }

    /// Parses the display form; tolerant of missing spaces after commas.
    pub fn parse(raw: &str) -> Self {
        Self::from_tokens(raw.split(','))
    }

    /// Atomic tokens in booking order.
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// First token: the row the caller's day/time is recorded against.
    pub fn head(&self) -> Option<&str> {
        self.tokens.first().map(String::as_str)
    }

    /// Whether this code combines several slot names.
    pub fn is_compound(&self) -> bool {
        self.tokens.len() > 1
    }

    /// Number of tokens.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether there are no tokens.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Whether `name` is one of the tokens.
    pub fn contains(&self, name: &str) -> bool {
        self.tokens.iter().any(|t| t == name)
    }

    /// Comma-joined display form.
    pub fn display(&self) -> String {
        self.tokens.join(COMPOUND_SEPARATOR)
    }
}

impl fmt::Display for SlotCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

impl FromStr for SlotCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = Self::parse(s);
        if code.is_empty() {
            return Err("empty slot code".to_string());
        }
        Ok(code)
    }
}

impl From<&str> for SlotCode {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

impl TryFrom<String> for SlotCode {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SlotCode> for String {
    fn from(value: SlotCode) -> Self {
        value.display()
    }
}
