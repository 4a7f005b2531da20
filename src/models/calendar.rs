//! Weekly calendar primitives.
//!
//! Defines the day-of-week and wall-clock time range that together place
//! a slot occurrence on the institution's fixed weekly grid.
//!
//! # Time Model
//! Times are minutes since midnight. A slot name recurs weekly, so there
//! is no date component: a `(Day, TimeRange)` pair identifies one weekly
//! occurrence.
//!
//! # Equality
//! Clash detection compares time ranges by equality, never by overlap.
//! Two slot names occupying the same wall-clock hour share an identical
//! `TimeRange` in the catalog.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Day of the teaching week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Day {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

impl Day {
    /// All seven days, Monday first.
    pub const ALL: [Day; 7] = [
        Day::Mon,
        Day::Tue,
        Day::Wed,
        Day::Thu,
        Day::Fri,
        Day::Sat,
        Day::Sun,
    ];

    /// Monday through Friday.
    pub fn weekdays() -> Vec<Day> {
        Self::ALL[..5].to_vec()
    }

    /// Three-letter upper-case code (`"MON"`).
    pub fn code(&self) -> &'static str {
        match self {
            Day::Mon => "MON",
            Day::Tue => "TUE",
            Day::Wed => "WED",
            Day::Thu => "THU",
            Day::Fri => "FRI",
            Day::Sat => "SAT",
            Day::Sun => "SUN",
        }
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Day {
    type Err = String;

    /// Accepts three-letter codes and full English names, any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim().to_ascii_uppercase();
        let prefix = token.get(..3).unwrap_or(token.as_str());
        match prefix {
            "MON" => Ok(Day::Mon),
            "TUE" => Ok(Day::Tue),
            "WED" => Ok(Day::Wed),
            "THU" => Ok(Day::Thu),
            "FRI" => Ok(Day::Fri),
            "SAT" => Ok(Day::Sat),
            "SUN" => Ok(Day::Sun),
            _ => Err(format!("unknown day '{s}'")),
        }
    }
}

/// A wall-clock interval [start, end) within one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeRange {
    /// Start (minutes since midnight, inclusive).
    pub start_min: u16,
    /// End (minutes since midnight, exclusive).
    pub end_min: u16,
}

impl TimeRange {
    /// Creates a new time range.
    pub fn new(start_min: u16, end_min: u16) -> Self {
        Self { start_min, end_min }
    }

    /// Creates a range from hour/minute pairs.
    pub fn hm(start_h: u16, start_m: u16, end_h: u16, end_m: u16) -> Self {
        Self::new(start_h * 60 + start_m, end_h * 60 + end_m)
    }

    /// Duration in minutes.
    #[inline]
    pub fn duration_min(&self) -> u16 {
        self.end_min.saturating_sub(self.start_min)
    }

    /// Whether the range starts before noon.
    #[inline]
    pub fn is_morning(&self) -> bool {
        self.start_min < 12 * 60
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}-{:02}:{:02}",
            self.start_min / 60,
            self.start_min % 60,
            self.end_min / 60,
            self.end_min % 60
        )
    }
}

fn parse_clock(token: &str) -> Option<u16> {
    let (h, m) = token.trim().split_once(':')?;
    let h: u16 = h.trim().parse().ok()?;
    let m: u16 = m.trim().parse().ok()?;
    if h > 23 || m > 59 {
        return None;
    }
    Some(h * 60 + m)
}

impl FromStr for TimeRange {
    type Err = String;

    /// Parses `"HH:MM-HH:MM"`; spaces around the dash are allowed.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (start, end) = s
            .split_once('-')
            .ok_or_else(|| format!("time range '{s}' has no '-'"))?;
        let start_min = parse_clock(start).ok_or_else(|| format!("bad start time in '{s}'"))?;
        let end_min = parse_clock(end).ok_or_else(|| format!("bad end time in '{s}'"))?;
        if end_min <= start_min {
            return Err(format!("time range '{s}' ends before it starts"));
        }
        Ok(Self { start_min, end_min })
    }
}

impl TryFrom<String> for TimeRange {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeRange> for String {
    fn from(value: TimeRange) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_parse() {
        assert_eq!("MON".parse::<Day>().unwrap(), Day::Mon);
        assert_eq!("wednesday".parse::<Day>().unwrap(), Day::Wed);
        assert_eq!(" Fri ".parse::<Day>().unwrap(), Day::Fri);
        assert!("XYZ".parse::<Day>().is_err());
    }

    #[test]
    fn test_weekdays() {
        let days = Day::weekdays();
        assert_eq!(days.len(), 5);
        assert_eq!(days[0], Day::Mon);
        assert_eq!(days[4], Day::Fri);
    }

    #[test]
    fn test_time_range_parse_and_display() {
        let t: TimeRange = "08:00 - 08:50".parse().unwrap();
        assert_eq!(t, TimeRange::hm(8, 0, 8, 50));
        assert_eq!(t.duration_min(), 50);
        assert_eq!(t.to_string(), "08:00-08:50");
        assert!(t.is_morning());
    }

    #[test]
    fn test_time_range_rejects_inverted() {
        assert!("10:00-09:00".parse::<TimeRange>().is_err());
        assert!("10:00".parse::<TimeRange>().is_err());
        assert!("25:00-26:00".parse::<TimeRange>().is_err());
    }

    #[test]
    fn test_time_range_serde_string_form() {
        let t = TimeRange::hm(14, 0, 15, 40);
        let json = serde_json::to_string(&t).unwrap();
        assert_eq!(json, "\"14:00-15:40\"");
        let back: TimeRange = serde_json::from_str(&json).unwrap();
        assert_eq!(back, t);
    }
}
