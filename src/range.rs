//! Time-range presets and sampling resolution policy.
//!
//! Everything here is pure: ranges resolve against an explicit `now` so the
//! policy can be exercised without a clock.
//!
//! | Span (hours) | Resolution |
//! |--------------|------------|
//! | ≤ 6          | `1m`       |
//! | ≤ 24         | `5m`       |
//! | ≤ 168        | `30m`      |
//! | ≤ 720        | `1h`       |
//! | otherwise    | `3h`       |

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};

use crate::error::ValidationError;

/// Spacing between observations returned by a series query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resolution {
    OneMinute,
    FiveMinutes,
    ThirtyMinutes,
    OneHour,
    ThreeHours,
}

impl Resolution {
    /// Wire representation used in the `resolution` query parameter.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OneMinute => "1m",
            Self::FiveMinutes => "5m",
            Self::ThirtyMinutes => "30m",
            Self::OneHour => "1h",
            Self::ThreeHours => "3h",
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarsest resolution that still keeps a span of `hours` informative.
#[must_use]
pub fn resolution_for(hours: f64) -> Resolution {
    if hours <= 6.0 {
        Resolution::OneMinute
    } else if hours <= 24.0 {
        Resolution::FiveMinutes
    } else if hours <= 168.0 {
        Resolution::ThirtyMinutes
    } else if hours <= 720.0 {
        Resolution::OneHour
    } else {
        Resolution::ThreeHours
    }
}

/// Named time-range shortcut.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Preset {
    SixHours,
    Day,
    Week,
    Month,
    Quarter,
}

impl Preset {
    pub const ALL: [Self; 5] = [
        Self::SixHours,
        Self::Day,
        Self::Week,
        Self::Month,
        Self::Quarter,
    ];

    #[must_use]
    pub const fn hours(self) -> i64 {
        match self {
            Self::SixHours => 6,
            Self::Day => 24,
            Self::Week => 168,
            Self::Month => 720,
            Self::Quarter => 2160,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SixHours => "6h",
            Self::Day => "24h",
            Self::Week => "7d",
            Self::Month => "30d",
            Self::Quarter => "90d",
        }
    }

    #[must_use]
    pub fn resolution(self) -> Resolution {
        resolution_for(self.hours() as f64)
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Preset {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s.trim())
            .ok_or_else(|| ValidationError::UnknownPreset(s.to_string()))
    }
}

/// The window of history being viewed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeRange {
    /// Live window ending at the moment it is resolved.
    Preset(Preset),
    /// Fixed window; `start < end` always holds.
    Custom {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

impl TimeRange {
    /// Build a fixed range.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::EmptyRange` when `start >= end`.
    pub fn custom(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, ValidationError> {
        if start >= end {
            return Err(ValidationError::EmptyRange);
        }
        Ok(Self::Custom { start, end })
    }

    /// Span of the range in hours.
    #[must_use]
    pub fn hours(&self) -> f64 {
        match self {
            Self::Preset(p) => p.hours() as f64,
            Self::Custom { start, end } => span_hours(*start, *end),
        }
    }

    #[must_use]
    pub fn resolution(&self) -> Resolution {
        resolution_for(self.hours())
    }

    /// Absolute `(start, end)` of the range as seen at `now`.
    #[must_use]
    pub fn bounds(&self, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        match self {
            Self::Preset(p) => (now - Duration::hours(p.hours()), now),
            Self::Custom { start, end } => (*start, *end),
        }
    }

    /// Live ranges slide forward on every refresh.
    #[must_use]
    pub const fn is_live(&self) -> bool {
        matches!(self, Self::Preset(_))
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Preset(p) => write!(f, "{p}"),
            Self::Custom { start, end } => {
                write!(f, "{} .. {}", start.to_rfc3339(), end.to_rfc3339())
            }
        }
    }
}

/// Hours between two instants, as `(end - start) / 3600s`.
#[must_use]
pub fn span_hours(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    (end - start).num_seconds() as f64 / 3600.0
}
