//! Unit tests for stat boxes, chart datasets and the terminal renderer.
//!
//! Run with: cargo test --test render_unit_test

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use chrono::{Duration, TimeZone, Utc};

use tempest_dashboard::range::{Preset, TimeRange};
use tempest_dashboard::render::charts::{build_charts, latest_values, Axis, ChartPanel};
use tempest_dashboard::render::current::{format_value, loading_boxes, stat_boxes, uv_level, UvLevel};
use tempest_dashboard::render::terminal::{TerminalRenderer, DISCONNECTED_BANNER};
use tempest_dashboard::render::UnitLabels;
use tempest_dashboard::session::Session;
use tempest_dashboard::sync::ConnectionStatus;
use tempest_dashboard::tempestd::models::{CurrentObservation, Observation, UnitSystem};

fn observation(minute: i64) -> Observation {
    Observation {
        timestamp: Utc.with_ymd_and_hms(2026, 5, 1, 12, 0, 0).unwrap() + Duration::minutes(minute),
        station_id: Some(99999),
        wind_lull: Some(1.2),
        wind_avg: Some(2.5),
        wind_gust: Some(4.1),
        wind_direction: Some(225.0),
        station_pressure: Some(1013.25),
        air_temperature: Some(22.5),
        relative_humidity: Some(65.0),
        uv_index: Some(5.0),
        solar_radiation: Some(800.0),
        rain_accumulation: Some(0.0),
        precipitation_type: Some(0),
        lightning_avg_distance: Some(0.0),
        lightning_strike_count: Some(0),
        battery: Some(2.6),
        feels_like: Some(22.1),
        dew_point: Some(15.3),
    }
}

fn current(units: UnitSystem) -> CurrentObservation {
    CurrentObservation {
        observation: observation(0),
        wind_direction_cardinal: Some("SW".to_string()),
        units,
    }
}

#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn uv_levels_follow_thresholds() {
    assert_eq!(uv_level(0.0), UvLevel::Low);
    assert_eq!(uv_level(2.0), UvLevel::Low);
    assert_eq!(uv_level(3.0), UvLevel::Moderate);
    assert_eq!(uv_level(6.0), UvLevel::High);
    assert_eq!(uv_level(8.0), UvLevel::VeryHigh);
    assert_eq!(uv_level(11.0), UvLevel::Extreme);
    assert_eq!(UvLevel::VeryHigh.class_name(), "uv-very-high");
}

#[test]
fn missing_values_render_as_dashes() {
    assert_eq!(format_value(None, 1), "--");
    assert_eq!(format_value(Some(1013.256), 2), "1013.26");

    let boxes = stat_boxes(None);
    assert_eq!(boxes.len(), 1);
    assert_eq!(boxes[0].value, "--");
    assert!(loading_boxes().iter().all(|b| b.loading));
}

#[test]
fn stat_boxes_use_observation_units() {
    let boxes = stat_boxes(Some(&current(UnitSystem::Imperial)));
    let temp = &boxes[0];
    assert_eq!(temp.label, "Temperature");
    assert_eq!(temp.value, "22.5");
    assert_eq!(temp.unit, "\u{00B0}F");
    assert_eq!(temp.secondary.as_deref(), Some("Feels like 22.1\u{00B0}F"));

    let wind = boxes.iter().find(|b| b.label == "Wind").unwrap();
    assert_eq!(wind.unit, "mph");
    assert_eq!(wind.secondary.as_deref(), Some("Gust 4.1 mph SW"));

    let pressure = boxes.iter().find(|b| b.label == "Pressure").unwrap();
    assert_eq!(pressure.value, "1013.25");

    let uv = boxes.iter().find(|b| b.label == "UV Index").unwrap();
    assert_eq!(uv.secondary.as_deref(), Some("Moderate"));
    assert_eq!(uv.class_name, Some("uv-moderate"));

    assert!(boxes.iter().all(|b| b.label != "Lightning"));
}

#[test]
fn lightning_box_only_with_strikes() {
    let mut obs = current(UnitSystem::Metric);
    obs.observation.lightning_strike_count = Some(3);
    obs.observation.lightning_avg_distance = Some(12.0);

    let boxes = stat_boxes(Some(&obs));
    let lightning = boxes.iter().find(|b| b.label == "Lightning").unwrap();
    assert_eq!(lightning.value, "3");
    assert_eq!(lightning.secondary.as_deref(), Some("Avg distance 12.0 km"));
}

#[test]
fn charts_cover_all_panels() {
    let mut series = vec![observation(0), observation(5), observation(10)];
    series[1].air_temperature = None;
    series[2].air_temperature = Some(23.0);

    let charts = build_charts(&series, UnitSystem::Metric);
    let panels: Vec<ChartPanel> = charts.iter().map(|c| c.panel).collect();
    assert_eq!(panels, ChartPanel::ALL.to_vec());

    let temperature = &charts[0];
    assert_eq!(temperature.y_label, UnitLabels::for_units(UnitSystem::Metric).temp);
    assert_eq!(temperature.datasets[0].points.len(), 2);
    assert_eq!(latest_values(temperature)[0], ("Temperature", Some(23.0)));

    let humidity = charts.iter().find(|c| c.panel == ChartPanel::Humidity).unwrap();
    assert_eq!((humidity.y_min, humidity.y_max), (Some(0.0), Some(100.0)));

    let solar = charts.iter().find(|c| c.panel == ChartPanel::Solar).unwrap();
    assert_eq!(solar.y2_label.as_deref(), Some("UV Index"));
    assert_eq!(solar.datasets[1].axis, Axis::Secondary);
    assert_eq!(ChartPanel::Solar.id(), "chart-solar");
}

#[test]
fn banner_follows_connection_status() {
    let session = Session::new(UnitSystem::Metric, TimeRange::Preset(Preset::Day));
    let out = SharedBuffer::default();
    let renderer = TerminalRenderer::attach(&session, out.clone(), None);

    session.set_connection(ConnectionStatus::Disconnected);
    assert!(renderer.banner_visible());
    session.set_connection(ConnectionStatus::Disconnected);
    assert_eq!(out.contents().matches(DISCONNECTED_BANNER).count(), 1);

    session.set_connection(ConnectionStatus::Connected);
    assert!(!renderer.banner_visible());
    assert!(out.contents().contains("Connection restored"));

    renderer.detach();
    session.set_connection(ConnectionStatus::Disconnected);
    assert_eq!(out.contents().matches(DISCONNECTED_BANNER).count(), 1);
}

#[test]
fn renders_conditions_and_history() {
    let session = Session::new(UnitSystem::Metric, TimeRange::Preset(Preset::Day));
    let out = SharedBuffer::default();
    let renderer = TerminalRenderer::attach(&session, out.clone(), None);

    session.set_station_id(Some(99999));
    session.set_current(current(UnitSystem::Metric));
    session.set_last_updated(Utc::now());

    let text = out.contents();
    assert!(text.contains("Station 99999"));
    assert!(text.contains("22.5 \u{00B0}C"));
    assert!(text.contains("Last updated:"));
    renderer.detach();
}
