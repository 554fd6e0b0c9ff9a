//! Input boundary for operator actions.
//!
//! Everything coming from the outside (station picker, unit toggle, preset
//! buttons, custom range form) is validated here. Invalid input is rejected
//! with a [`ValidationError`] and leaves the session untouched, so it never
//! triggers a fetch.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::error::ValidationError;
use crate::range::{Preset, TimeRange};
use crate::session::Session;
use crate::tempestd::models::{Station, UnitSystem};

/// Replace the station list and keep a valid selection.
///
/// The previous selection survives if it is still listed, otherwise the
/// first station is selected. Returns the selected id.
pub fn populate_stations(session: &Session, stations: Vec<Station>) -> Option<u32> {
    let previous = session.station_id();
    let keep = previous.filter(|id| stations.iter().any(|s| s.station_id == *id));
    let first = stations.first().map(|s| s.station_id);
    session.set_stations(stations);

    match keep {
        Some(id) => Some(id),
        None => {
            if first.is_some() {
                session.set_station_id(first);
            }
            first
        }
    }
}

/// Select a station from its textual id.
///
/// # Errors
///
/// Returns `ValidationError::InvalidStationId` for non-numeric or zero ids and
/// `ValidationError::UnknownStation` when a station list is loaded and does
/// not contain the id.
pub fn select_station(session: &Session, raw: &str) -> Result<u32, ValidationError> {
    let id: u32 = raw
        .trim()
        .parse()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| ValidationError::InvalidStationId(raw.to_string()))?;

    let stations = session.stations();
    if !stations.is_empty() && !stations.iter().any(|s| s.station_id == id) {
        return Err(ValidationError::UnknownStation(id));
    }

    session.set_station_id(Some(id));
    Ok(id)
}

/// Stop refreshing by clearing the station selection.
pub fn deselect_station(session: &Session) {
    session.set_station_id(None);
}

/// # Errors
///
/// Returns `ValidationError::UnknownUnits` unless `raw` is `metric` or `imperial`.
pub fn switch_units(session: &Session, raw: &str) -> Result<UnitSystem, ValidationError> {
    let units: UnitSystem = raw.parse()?;
    session.set_units(units);
    Ok(units)
}

/// # Errors
///
/// Returns `ValidationError::UnknownPreset` for anything but the known presets.
pub fn select_preset(session: &Session, raw: &str) -> Result<Preset, ValidationError> {
    let preset: Preset = raw.parse()?;
    session.set_time_range(TimeRange::Preset(preset));
    Ok(preset)
}

/// Apply a fixed range entered by the operator.
///
/// # Errors
///
/// Rejects unparsable timestamps, `start >= end`, and an `end` after `now`.
/// The active range is unchanged on error.
pub fn apply_custom_range(
    session: &Session,
    start: &str,
    end: &str,
    now: DateTime<Utc>,
) -> Result<TimeRange, ValidationError> {
    let start = parse_timestamp(start)?;
    let end = parse_timestamp(end)?;
    let range = TimeRange::custom(start, end)?;
    if end > now {
        return Err(ValidationError::FutureEnd);
    }
    session.set_time_range(range);
    Ok(range)
}

/// Accepts RFC 3339, `YYYY-MM-DDTHH:MM[:SS]` (read as UTC) or a bare date.
///
/// # Errors
///
/// Returns `ValidationError::InvalidTimestamp` if no format matches.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, ValidationError> {
    let s = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Ok(ts.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| ValidationError::InvalidTimestamp(raw.to_string()))
}
