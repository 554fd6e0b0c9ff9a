use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};

use crate::controls;
use crate::error::ApiResult;
use crate::session::{Selection, Session};
use crate::tempestd::{ObservationQuery, TelemetrySource};

/// What became of a fetch that reached the backend successfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The result was written to the session.
    Applied,
    /// The selection changed while the request was in flight.
    Discarded,
    /// Nothing to fetch for the current session.
    Skipped,
}

/// Issue order of one kind of fetch. A response is applied only if no
/// response issued after it has been applied already.
#[derive(Debug, Default)]
pub struct FetchSequence {
    issued: AtomicU64,
    applied: Mutex<u64>,
}

impl FetchSequence {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ticket for a fetch about to be sent.
    pub fn issue(&self) -> u64 {
        self.issued.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Run `apply` unless a newer ticket was applied. Returns whether it ran.
    pub fn apply_if_latest(&self, ticket: u64, apply: impl FnOnce()) -> bool {
        let mut applied = self.applied.lock().unwrap_or_else(PoisonError::into_inner);
        if ticket <= *applied {
            return false;
        }
        *applied = ticket;
        apply();
        true
    }
}

/// Load the station list and keep a valid station selected.
///
/// `preferred` wins over any previous selection when it is listed.
pub async fn sync_stations<S: TelemetrySource>(
    source: &S,
    session: &Session,
    preferred: Option<u32>,
) -> ApiResult<Option<u32>> {
    tracing::debug!("Loading station list...");
    let stations = source.fetch_stations().await?;

    if let Some(id) = preferred {
        if stations.iter().any(|s| s.station_id == id) {
            if session.station_id() != Some(id) {
                session.set_station_id(Some(id));
            }
        } else {
            tracing::warn!(station_id = id, "Configured station not found on backend");
        }
    }

    let count = stations.len();
    let selected = controls::populate_stations(session, stations);
    tracing::info!(count, selected = ?selected, "Station list loaded");
    Ok(selected)
}

/// Fetch current conditions for `selection` and apply them if still relevant.
pub async fn fetch_current<S: TelemetrySource>(
    source: &S,
    session: &Session,
    selection: Selection,
    sequence: &FetchSequence,
) -> ApiResult<FetchOutcome> {
    let ticket = sequence.issue();
    let current = source
        .fetch_current(selection.station_id, selection.units)
        .await?;

    if session.selection() != Some(selection) {
        tracing::debug!(
            station_id = selection.station_id,
            units = %selection.units,
            "Discarding current conditions for a stale selection"
        );
        return Ok(FetchOutcome::Discarded);
    }

    if !sequence.apply_if_latest(ticket, || session.set_current(current)) {
        tracing::debug!(ticket, "Discarding current conditions overtaken by a newer response");
        return Ok(FetchOutcome::Discarded);
    }
    Ok(FetchOutcome::Applied)
}

/// Fetch the observation series for `selection` as seen at `now`.
pub async fn fetch_series<S: TelemetrySource>(
    source: &S,
    session: &Session,
    selection: Selection,
    now: DateTime<Utc>,
    sequence: &FetchSequence,
) -> ApiResult<FetchOutcome> {
    let ticket = sequence.issue();
    let query = ObservationQuery::for_range(&selection.range, now, selection.units);
    tracing::debug!(
        station_id = selection.station_id,
        range = %selection.range,
        resolution = %query.effective_resolution(),
        "Fetching observation series"
    );

    let page = source
        .fetch_observations(selection.station_id, query)
        .await?;

    if session.selection() != Some(selection) {
        tracing::debug!(
            station_id = selection.station_id,
            range = %selection.range,
            "Discarding observation series for a stale selection"
        );
        return Ok(FetchOutcome::Discarded);
    }

    let count = page.observations.len();
    let total = page.total;
    if !sequence.apply_if_latest(ticket, || session.set_observations(page)) {
        tracing::debug!(ticket, "Discarding observation series overtaken by a newer response");
        return Ok(FetchOutcome::Discarded);
    }
    tracing::debug!(count, total, "Observation series applied");
    Ok(FetchOutcome::Applied)
}
