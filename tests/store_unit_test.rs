//! Unit tests for the state store and the typed session on top of it.
//!
//! Run with: cargo test --test store_unit_test

use std::sync::{Arc, Mutex};

use tempest_dashboard::range::{Preset, TimeRange};
use tempest_dashboard::session::{Session, StateKey, StateValue};
use tempest_dashboard::store::StateStore;
use tempest_dashboard::sync::ConnectionStatus;
use tempest_dashboard::tempestd::models::UnitSystem;

#[test]
fn get_returns_last_written_value() {
    let store: StateStore<&str, i32> = StateStore::new();
    assert_eq!(store.get(&"a"), None);
    assert!(!store.contains(&"a"));

    store.set("a", 1);
    store.set("a", 2);
    assert_eq!(store.get(&"a"), Some(2));
    assert!(store.contains(&"a"));
    assert_eq!(store.keys(), vec!["a"]);
}

#[test]
fn subscribers_receive_new_and_previous_in_order() {
    let store: StateStore<&str, i32> = StateStore::new();
    let seen = Arc::new(Mutex::new(Vec::new()));

    let first = {
        let seen = Arc::clone(&seen);
        store.on("a", move |new, prev| {
            seen.lock().unwrap().push(("first", *new, prev.copied()));
        })
    };
    let _second = {
        let seen = Arc::clone(&seen);
        store.on("a", move |new, prev| {
            seen.lock().unwrap().push(("second", *new, prev.copied()));
        })
    };

    store.set("a", 1);
    store.set("b", 5);
    store.set("a", 2);

    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            ("first", 1, None),
            ("second", 1, None),
            ("first", 2, Some(1)),
            ("second", 2, Some(1)),
        ]
    );

    first.unsubscribe();
    store.set("a", 3);
    assert_eq!(seen.lock().unwrap().last(), Some(&("second", 3, Some(2))));
    assert_eq!(store.subscriber_count(&"a"), 1);
}

#[test]
fn subscriber_may_write_other_keys() {
    let store: StateStore<&str, i32> = StateStore::new();
    let _sub = {
        let store = store.clone();
        store.clone().on("input", move |new, _| store.set("doubled", new * 2))
    };

    store.set("input", 21);
    assert_eq!(store.get(&"doubled"), Some(42));
}

#[test]
fn unsubscribe_after_store_dropped_is_harmless() {
    let store: StateStore<&str, i32> = StateStore::new();
    let sub = store.on("a", |_, _| {});
    drop(store);
    sub.unsubscribe();
}

#[test]
fn new_session_is_seeded() {
    let session = Session::new(UnitSystem::Imperial, TimeRange::Preset(Preset::Week));
    assert_eq!(session.units(), UnitSystem::Imperial);
    assert_eq!(session.time_range(), Some(TimeRange::Preset(Preset::Week)));
    assert_eq!(session.connection(), ConnectionStatus::Disconnected);
    assert_eq!(session.station_id(), None);
    assert!(session.selection().is_none());
    assert!(session.current().is_none());
}

#[test]
fn selection_tracks_station_units_and_range() {
    let session = Session::new(UnitSystem::Metric, TimeRange::Preset(Preset::Day));
    session.set_station_id(Some(7));

    let selection = session.selection().unwrap();
    assert_eq!(selection.station_id, 7);
    assert_eq!(selection.units, UnitSystem::Metric);

    session.set_units(UnitSystem::Imperial);
    assert_ne!(session.selection(), Some(selection));
}

#[test]
fn session_notifies_typed_values() {
    let session = Session::new(UnitSystem::Metric, TimeRange::Preset(Preset::Day));
    let seen = Arc::new(Mutex::new(Vec::new()));
    let _sub = {
        let seen = Arc::clone(&seen);
        session.on(StateKey::Units, move |new, prev| {
            seen.lock().unwrap().push((new.clone(), prev.cloned()));
        })
    };

    session.set_units(UnitSystem::Imperial);

    assert_eq!(
        *seen.lock().unwrap(),
        vec![(
            StateValue::Units(UnitSystem::Imperial),
            Some(StateValue::Units(UnitSystem::Metric))
        )]
    );
}
