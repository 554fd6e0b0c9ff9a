//! Typed view of the dashboard session held in a [`StateStore`].
//!
//! `Session` is the only writer of application state. Other components read
//! through its accessors or subscribe to a [`StateKey`].

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::range::TimeRange;
use crate::store::{StateStore, Subscription};
use crate::sync::connection::ConnectionStatus;
use crate::tempestd::models::{CurrentObservation, ObservationPage, Station, UnitSystem};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateKey {
    StationId,
    Stations,
    Units,
    TimeRange,
    CurrentObservation,
    Observations,
    Connection,
    LastUpdated,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StateValue {
    StationId(Option<u32>),
    Stations(Arc<Vec<Station>>),
    Units(UnitSystem),
    TimeRange(TimeRange),
    CurrentObservation(Arc<CurrentObservation>),
    Observations(Arc<ObservationPage>),
    Connection(ConnectionStatus),
    LastUpdated(DateTime<Utc>),
}

impl StateValue {
    #[must_use]
    pub const fn key(&self) -> StateKey {
        match self {
            Self::StationId(_) => StateKey::StationId,
            Self::Stations(_) => StateKey::Stations,
            Self::Units(_) => StateKey::Units,
            Self::TimeRange(_) => StateKey::TimeRange,
            Self::CurrentObservation(_) => StateKey::CurrentObservation,
            Self::Observations(_) => StateKey::Observations,
            Self::Connection(_) => StateKey::Connection,
            Self::LastUpdated(_) => StateKey::LastUpdated,
        }
    }
}

/// The identifiers a fetch was issued for. A result is only applied while
/// the session still has the same selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub station_id: u32,
    pub units: UnitSystem,
    pub range: TimeRange,
}

pub type SessionSubscription = Subscription<StateKey, StateValue>;

#[derive(Clone, Default)]
pub struct Session {
    store: StateStore<StateKey, StateValue>,
}

impl Session {
    /// Fresh session with the given unit system and range, no station and
    /// no published connection status.
    #[must_use]
    pub fn new(units: UnitSystem, range: TimeRange) -> Self {
        let session = Self::default();
        session.store.set(StateKey::Units, StateValue::Units(units));
        session
            .store
            .set(StateKey::TimeRange, StateValue::TimeRange(range));
        session
    }

    #[must_use]
    pub const fn store(&self) -> &StateStore<StateKey, StateValue> {
        &self.store
    }

    pub fn on<F>(&self, key: StateKey, callback: F) -> SessionSubscription
    where
        F: Fn(&StateValue, Option<&StateValue>) + Send + Sync + 'static,
    {
        self.store.on(key, callback)
    }

    fn write(&self, value: StateValue) {
        self.store.set(value.key(), value);
    }

    #[must_use]
    pub fn station_id(&self) -> Option<u32> {
        match self.store.get(&StateKey::StationId) {
            Some(StateValue::StationId(id)) => id,
            _ => None,
        }
    }

    pub fn set_station_id(&self, station_id: Option<u32>) {
        self.write(StateValue::StationId(station_id));
    }

    #[must_use]
    pub fn stations(&self) -> Arc<Vec<Station>> {
        match self.store.get(&StateKey::Stations) {
            Some(StateValue::Stations(stations)) => stations,
            _ => Arc::default(),
        }
    }

    pub fn set_stations(&self, stations: Vec<Station>) {
        self.write(StateValue::Stations(Arc::new(stations)));
    }

    #[must_use]
    pub fn units(&self) -> UnitSystem {
        match self.store.get(&StateKey::Units) {
            Some(StateValue::Units(units)) => units,
            _ => UnitSystem::default(),
        }
    }

    pub fn set_units(&self, units: UnitSystem) {
        self.write(StateValue::Units(units));
    }

    #[must_use]
    pub fn time_range(&self) -> Option<TimeRange> {
        match self.store.get(&StateKey::TimeRange) {
            Some(StateValue::TimeRange(range)) => Some(range),
            _ => None,
        }
    }

    pub fn set_time_range(&self, range: TimeRange) {
        self.write(StateValue::TimeRange(range));
    }

    #[must_use]
    pub fn current(&self) -> Option<Arc<CurrentObservation>> {
        match self.store.get(&StateKey::CurrentObservation) {
            Some(StateValue::CurrentObservation(obs)) => Some(obs),
            _ => None,
        }
    }

    pub fn set_current(&self, observation: CurrentObservation) {
        self.write(StateValue::CurrentObservation(Arc::new(observation)));
    }

    #[must_use]
    pub fn observations(&self) -> Option<Arc<ObservationPage>> {
        match self.store.get(&StateKey::Observations) {
            Some(StateValue::Observations(page)) => Some(page),
            _ => None,
        }
    }

    pub fn set_observations(&self, page: ObservationPage) {
        self.write(StateValue::Observations(Arc::new(page)));
    }

    /// Connection status, `Disconnected` until one has been published.
    #[must_use]
    pub fn connection(&self) -> ConnectionStatus {
        self.published_connection().unwrap_or_default()
    }

    /// Last published connection status, if any.
    #[must_use]
    pub fn published_connection(&self) -> Option<ConnectionStatus> {
        match self.store.get(&StateKey::Connection) {
            Some(StateValue::Connection(status)) => Some(status),
            _ => None,
        }
    }

    pub fn set_connection(&self, status: ConnectionStatus) {
        self.write(StateValue::Connection(status));
    }

    #[must_use]
    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        match self.store.get(&StateKey::LastUpdated) {
            Some(StateValue::LastUpdated(ts)) => Some(ts),
            _ => None,
        }
    }

    pub fn set_last_updated(&self, ts: DateTime<Utc>) {
        self.write(StateValue::LastUpdated(ts));
    }

    /// Current selection, or `None` while no station is selected.
    #[must_use]
    pub fn selection(&self) -> Option<Selection> {
        Some(Selection {
            station_id: self.station_id()?,
            units: self.units(),
            range: self.time_range()?,
        })
    }
}
