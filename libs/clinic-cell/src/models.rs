// libs/clinic-cell/src/models.rs
use chrono::{DateTime, Datelike, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

// ==============================================================================
// CLINIC-LOCAL TIME
// ==============================================================================

#[derive(Debug, Error)]
#[error("invalid time of day: {0}")]
pub struct TimeParseError(String);

/// A clinic-local wall-clock time with whole-minute precision, stored as
/// minutes since midnight. Comparisons are numeric, so `09:00 < 17:00` holds
/// for the same inputs the storage layer renders as `HH:MM` strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay(u16);

pub const MINUTES_PER_DAY: u16 = 24 * 60;

impl TimeOfDay {
    pub fn from_hm(hours: u16, minutes: u16) -> Option<Self> {
        if hours > 23 || minutes > 59 {
            return None;
        }
        Some(Self(hours * 60 + minutes))
    }

    pub fn from_minutes(minutes: u16) -> Option<Self> {
        if minutes >= MINUTES_PER_DAY {
            return None;
        }
        Some(Self(minutes))
    }

    pub fn minutes(&self) -> u16 {
        self.0
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.0 / 60, self.0 % 60)
    }
}

impl FromStr for TimeOfDay {
    type Err = TimeParseError;

    /// Parses `HH:MM`; a trailing `:SS` (as rendered by Postgres `time`
    /// columns) is accepted and ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(3, ':');

        let hours = parts
            .next()
            .and_then(|p| p.parse::<u16>().ok())
            .ok_or_else(|| TimeParseError(s.to_string()))?;
        let minutes = parts
            .next()
            .and_then(|p| p.parse::<u16>().ok())
            .ok_or_else(|| TimeParseError(s.to_string()))?;

        Self::from_hm(hours, minutes).ok_or_else(|| TimeParseError(s.to_string()))
    }
}

impl Serialize for TimeOfDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeOfDay {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Day-of-week index used by `clinic_schedules`: 0 = Sunday .. 6 = Saturday.
pub fn day_index(date: NaiveDate) -> u8 {
    match date.weekday() {
        Weekday::Sun => 0,
        Weekday::Mon => 1,
        Weekday::Tue => 2,
        Weekday::Wed => 3,
        Weekday::Thu => 4,
        Weekday::Fri => 5,
        Weekday::Sat => 6,
    }
}

// ==============================================================================
// CORE CLINIC MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Clinic {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// One weekly operating window for a clinic. Rows are owned by clinic
/// administration; the scheduler only reads them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClinicSchedule {
    pub id: Uuid,
    pub clinic_id: Uuid,
    pub day_of_week: u8,
    pub opening_time: TimeOfDay,
    pub closing_time: TimeOfDay,
    pub lunch_start: Option<TimeOfDay>,
    pub lunch_end: Option<TimeOfDay>,
    pub is_open: bool,
}

impl ClinicSchedule {
    /// Whether `time` falls inside operating hours, both bounds inclusive
    /// (a booking at closing time is accepted).
    pub fn within_hours(&self, time: TimeOfDay) -> bool {
        self.opening_time <= time && time <= self.closing_time
    }

    /// Whether `time` falls inside the lunch break, `[lunch_start, lunch_end)`.
    pub fn in_lunch(&self, time: TimeOfDay) -> bool {
        match (self.lunch_start, self.lunch_end) {
            (Some(start), Some(end)) => start <= time && time < end,
            _ => false,
        }
    }
}

// ==============================================================================
// AVAILABILITY VIEW
// ==============================================================================

/// A candidate bookable time point, computed per query and never stored.
/// `duration_minutes` is caller-facing metadata; the slot grid itself always
/// advances in fixed steps (see `services::slots`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilitySlot {
    pub clinic_id: Uuid,
    pub date: NaiveDate,
    pub time: TimeOfDay,
    pub duration_minutes: i32,
    pub available: bool,
}
