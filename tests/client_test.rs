//! tempestd client against an in-process mock backend.
//!
//! Run with: cargo test --test client_test

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Duration as ChronoDuration, NaiveDate, SecondsFormat, Utc};
use serde_json::{json, Value};

use tempest_dashboard::config::Config;
use tempest_dashboard::error::ApiError;
use tempest_dashboard::range::{Preset, Resolution, TimeRange};
use tempest_dashboard::session::Session;
use tempest_dashboard::sync::{ConnectionStatus, FetchOutcome, RefreshCoordinator, RefreshSettings};
use tempest_dashboard::tempestd::models::UnitSystem;
use tempest_dashboard::tempestd::{ObservationQuery, TempestClient};

const STATION_ID: u32 = 99999;
const FAILING_ID: u32 = 500;
const GATEWAY_ID: u32 = 502;
const SLOW_ID: u32 = 777;

type Params = Query<HashMap<String, String>>;

fn iso(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn observation(ts: DateTime<Utc>) -> Value {
    json!({
        "timestamp": iso(ts),
        "station_id": STATION_ID,
        "wind_lull": 1.2,
        "wind_avg": 2.5,
        "wind_gust": 4.1,
        "wind_direction": 225.0,
        "station_pressure": 1013.25,
        "air_temperature": 22.5,
        "relative_humidity": 65.0,
        "uv_index": 5.0,
        "solar_radiation": 800.0,
        "rain_accumulation": 0.0,
        "precipitation_type": 0,
        "lightning_avg_distance": 0.0,
        "lightning_strike_count": 0,
        "battery": 2.6,
        "feels_like": 22.1,
        "dew_point": 15.3,
    })
}

fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({"error": "station not found", "code": 404})),
    )
        .into_response()
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "version": "mock-1.0.0",
        "uptime": "0m",
        "stations": [{
            "station_id": STATION_ID,
            "name": "Mock Station",
            "websocket": "connected",
            "last_observation": iso(Utc::now()),
            "observation_age_seconds": 10.0,
        }],
        "database": {"driver": "sqlite", "status": "ok", "total_observations": 1000},
    }))
}

async fn stations() -> Json<Value> {
    Json(json!([{
        "station_id": STATION_ID,
        "device_id": 88888,
        "name": "Mock Station",
        "latitude": 37.7749,
        "longitude": -122.4194,
        "elevation": 10.0,
        "status": "online",
        "last_observation": iso(Utc::now()),
    }]))
}

async fn station(Path(id): Path<u32>) -> Response {
    if id != STATION_ID {
        return not_found();
    }
    Json(json!({
        "station_id": STATION_ID,
        "device_id": 88888,
        "name": "Mock Station",
        "latitude": 37.7749,
        "longitude": -122.4194,
        "elevation": 10.0,
        "created_at": "2025-01-01T00:00:00Z",
    }))
    .into_response()
}

async fn current(Path(id): Path<u32>, Query(params): Params) -> Response {
    match id {
        FAILING_ID => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "database unavailable", "code": 500})),
            )
                .into_response();
        }
        GATEWAY_ID => return (StatusCode::BAD_GATEWAY, "upstream down").into_response(),
        SLOW_ID => tokio::time::sleep(Duration::from_secs(3)).await,
        _ => {}
    }

    let units = params.get("units").map_or("metric", String::as_str);
    let mut obs = observation(Utc::now());
    obs["wind_direction_cardinal"] = json!("SW");
    obs["units"] = json!(units);
    if units == "imperial" {
        obs["air_temperature"] = json!(72.5);
        obs["feels_like"] = json!(71.8);
        obs["wind_avg"] = json!(5.6);
        obs["station_pressure"] = json!(29.92);
    }
    Json(obs).into_response()
}

async fn observations(Path(id): Path<u32>, Query(params): Params) -> Response {
    if id != STATION_ID {
        return not_found();
    }
    // Timestamps must be whole seconds in UTC
    for key in ["start", "end"] {
        let valid = params
            .get(key)
            .is_some_and(|v| v.ends_with('Z') && !v.contains('.'));
        if !valid {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({"error": format!("invalid {key}"), "code": 400})),
            )
                .into_response();
        }
    }

    let limit: usize = params.get("limit").and_then(|v| v.parse().ok()).unwrap_or(1000);
    let offset: usize = params.get("offset").and_then(|v| v.parse().ok()).unwrap_or(0);
    let now = Utc::now();
    let all: Vec<Value> = (0..10)
        .rev()
        .map(|i| observation(now - ChronoDuration::minutes(i * 5)))
        .collect();
    let page: Vec<Value> = all.iter().skip(offset).take(limit).cloned().collect();

    Json(json!({
        "station_id": STATION_ID,
        "start": params["start"],
        "end": params["end"],
        "resolution": params.get("resolution").map_or("1m", String::as_str),
        "units": params.get("units").map_or("metric", String::as_str),
        "total": all.len(),
        "limit": limit,
        "offset": offset,
        "observations": page,
    }))
    .into_response()
}

async fn summary(Path(_id): Path<u32>, Query(params): Params) -> Json<Value> {
    Json(json!({
        "station_id": STATION_ID,
        "date": params.get("date").cloned().unwrap_or_default(),
        "units": params.get("units").map_or("metric", String::as_str),
        "temperature": {"high": 28.5, "low": 12.3, "avg": 20.4},
        "humidity": {"high": 85.0, "low": 40.0, "avg": 62.5},
        "wind": {"max": 12.5, "avg": 3.2},
        "pressure": {"high": 1020.0, "low": 1010.0},
        "rain_total": 2.5,
        "uv_max": 8.0,
        "solar_radiation_max": 1100.0,
        "lightning_total": 0,
        "observation_count": 1440,
    }))
}

async fn range(Path(_id): Path<u32>) -> Json<Value> {
    Json(json!({
        "station_id": STATION_ID,
        "oldest": "2025-01-01T00:00:00Z",
        "newest": iso(Utc::now()),
        "total_observations": 1000,
    }))
}

async fn spawn_mock() -> String {
    let app = Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/stations", get(stations))
        .route("/api/v1/stations/{id}", get(station))
        .route("/api/v1/stations/{id}/current", get(current))
        .route("/api/v1/stations/{id}/observations", get(observations))
        .route("/api/v1/stations/{id}/summary", get(summary))
        .route("/api/v1/stations/{id}/range", get(range));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

async fn client() -> TempestClient {
    let url = spawn_mock().await;
    TempestClient::new(&Config::with_server(&url).unwrap()).unwrap()
}

#[tokio::test]
async fn health_and_stations_parse() {
    let client = client().await;

    let health = client.get_health().await.unwrap();
    assert_eq!(health.status, "healthy");
    assert_eq!(health.version, "mock-1.0.0");
    assert_eq!(health.stations[0].websocket.as_deref(), Some("connected"));
    assert_eq!(health.database.unwrap().total_observations, 1000);

    let stations = client.list_stations().await.unwrap();
    assert_eq!(stations.len(), 1);
    assert_eq!(stations[0].station_id, STATION_ID);
    assert_eq!(stations[0].display_name(), "Mock Station");
    assert!(stations[0].is_online());
}

#[tokio::test]
async fn unknown_station_is_none() {
    let client = client().await;
    assert_eq!(client.get_station(STATION_ID).await.unwrap().unwrap().device_id, Some(88888));
    assert!(client.get_station(1).await.unwrap().is_none());
}

#[tokio::test]
async fn current_in_imperial_units() {
    let client = client().await;

    let current = client.get_current(STATION_ID, UnitSystem::Imperial).await.unwrap();
    assert_eq!(current.units, UnitSystem::Imperial);
    assert_eq!(current.observation.air_temperature, Some(72.5));
    assert_eq!(current.wind_direction_cardinal.as_deref(), Some("SW"));

    let current = client.get_current(STATION_ID, UnitSystem::Metric).await.unwrap();
    assert_eq!(current.units, UnitSystem::Metric);
    assert_eq!(current.observation.air_temperature, Some(22.5));
}

#[tokio::test]
async fn observations_are_paged_and_ascending() {
    let client = client().await;
    let now = Utc::now();
    let query = ObservationQuery::new(now - ChronoDuration::hours(6), now, UnitSystem::Metric);
    assert_eq!(query.effective_resolution(), Resolution::OneMinute);

    let page = client.get_observations(STATION_ID, &query).await.unwrap();
    assert_eq!(page.resolution, "1m");
    assert_eq!(page.total, 10);
    assert_eq!(page.observations.len(), 10);
    assert!(page
        .observations
        .windows(2)
        .all(|w| w[0].timestamp < w[1].timestamp));

    let query = ObservationQuery::for_range(&TimeRange::Preset(Preset::Week), now, UnitSystem::Imperial)
        .with_page(4, 8);
    let page = client.get_observations(STATION_ID, &query).await.unwrap();
    assert_eq!(page.resolution, "30m");
    assert_eq!(page.units, UnitSystem::Imperial);
    assert_eq!(page.offset, Some(8));
    assert_eq!(page.observations.len(), 2);
}

#[tokio::test]
async fn summary_and_range_parse() {
    let client = client().await;
    let date = NaiveDate::from_ymd_opt(2026, 5, 1).unwrap();

    let summary = client.get_summary(STATION_ID, date, UnitSystem::Metric).await.unwrap();
    assert_eq!(summary.date, date);
    assert_eq!(summary.temperature.high, Some(28.5));
    assert_eq!(summary.pressure.avg, None);
    assert_eq!(summary.observation_count, 1440);

    let range = client.get_range(STATION_ID).await.unwrap();
    assert_eq!(range.total_observations, 1000);
    assert!(range.oldest.unwrap() < range.newest.unwrap());
}

#[tokio::test]
async fn error_status_carries_backend_message() {
    let client = client().await;

    match client.get_current(FAILING_ID, UnitSystem::Metric).await {
        Err(ApiError::Http { status, message }) => {
            assert_eq!(status, 500);
            assert_eq!(message, "database unavailable");
        }
        other => panic!("expected HTTP error, got {other:?}"),
    }

    let err = client
        .get_current(GATEWAY_ID, UnitSystem::Metric)
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(502));
    assert_eq!(err.to_string(), "HTTP 502: Bad Gateway");
}

#[tokio::test]
async fn unreachable_backend_is_network_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = TempestClient::new(&Config::with_server(&format!("http://{addr}")).unwrap()).unwrap();
    let err = client.get_health().await.unwrap_err();
    assert!(matches!(err, ApiError::Network(_)));
    assert_eq!(err.status(), None);
}

#[tokio::test]
async fn slow_backend_times_out() {
    let url = spawn_mock().await;
    let mut config = Config::with_server(&url).unwrap();
    config.request_timeout_seconds = 1;
    let client = TempestClient::new(&config).unwrap();

    let err = client.get_current(SLOW_ID, UnitSystem::Metric).await.unwrap_err();
    assert!(matches!(err, ApiError::Network(ref msg) if msg.starts_with("Request timed out")));
}

#[tokio::test]
async fn coordinator_applies_backend_data() {
    let client = Arc::new(client().await);
    let session = Session::new(UnitSystem::Imperial, TimeRange::Preset(Preset::SixHours));
    let coordinator = RefreshCoordinator::new(client, session.clone(), RefreshSettings::default());

    assert_eq!(coordinator.load_stations(None).await.unwrap(), Some(STATION_ID));
    assert_eq!(
        coordinator.refresh_current().await.unwrap(),
        FetchOutcome::Applied
    );
    assert_eq!(
        coordinator.refresh_series(Utc::now()).await.unwrap(),
        FetchOutcome::Applied
    );

    let current = session.current().unwrap();
    assert_eq!(current.units, UnitSystem::Imperial);
    assert_eq!(current.observation.air_temperature, Some(72.5));
    assert_eq!(session.observations().unwrap().observations.len(), 10);
    assert_eq!(session.connection(), ConnectionStatus::Connected);
}
