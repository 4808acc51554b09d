//! Reminder thresholds for upcoming warranty expiry

use chrono::{DateTime, Duration, Utc};
use std::fmt;

/// Reminder threshold; each one is delivered at most once per code and term
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReminderThreshold {
    /// Expiry more than 7 and at most 30 days away
    ThirtyDays,
    /// Expiry at most 7 days away
    SevenDays,
}

impl ReminderThreshold {
    pub const ALL: [Self; 2] = [Self::ThirtyDays, Self::SevenDays];

    pub fn days(&self) -> i64 {
        match self {
            Self::ThirtyDays => 30,
            Self::SevenDays => 7,
        }
    }

    /// Expiry window `(now + lower, now + upper]` covered by this threshold
    pub fn window(&self, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        let lower = match self {
            Self::ThirtyDays => Self::SevenDays.days(),
            Self::SevenDays => 0,
        };
        (now + Duration::days(lower), now + Duration::days(self.days()))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ThirtyDays => "30d",
            Self::SevenDays => "7d",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "30d" => Some(Self::ThirtyDays),
            "7d" => Some(Self::SevenDays),
            _ => None,
        }
    }
}

impl fmt::Display for ReminderThreshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
