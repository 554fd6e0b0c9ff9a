use std::future::Future;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;

use crate::config::Config;
use crate::error::{ApiError, ApiResult};
use crate::range::{span_hours, Resolution, TimeRange};
use crate::tempestd::models::{
    CurrentObservation, DailySummary, ErrorBody, Health, ObservationPage, ObservationRange,
    Station, UnitSystem,
};

/// Format a timestamp the way tempestd expects: UTC, second precision, `Z`.
#[must_use]
pub fn iso8601(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parameters of a series query against `/observations`.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationQuery {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Derived from the span when not set
    pub resolution: Option<Resolution>,
    pub units: UnitSystem,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl ObservationQuery {
    #[must_use]
    pub const fn new(start: DateTime<Utc>, end: DateTime<Utc>, units: UnitSystem) -> Self {
        Self {
            start,
            end,
            resolution: None,
            units,
            limit: None,
            offset: None,
        }
    }

    /// Query covering `range` as seen at `now`, at the range's resolution.
    #[must_use]
    pub fn for_range(range: &TimeRange, now: DateTime<Utc>, units: UnitSystem) -> Self {
        let (start, end) = range.bounds(now);
        Self::new(start, end, units).with_resolution(range.resolution())
    }

    #[must_use]
    pub const fn with_resolution(mut self, resolution: Resolution) -> Self {
        self.resolution = Some(resolution);
        self
    }

    #[must_use]
    pub const fn with_page(mut self, limit: u32, offset: u32) -> Self {
        self.limit = Some(limit);
        self.offset = Some(offset);
        self
    }

    /// Resolution sent to the backend.
    #[must_use]
    pub fn effective_resolution(&self) -> Resolution {
        self.resolution
            .unwrap_or_else(|| crate::range::resolution_for(span_hours(self.start, self.end)))
    }

    fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("start", iso8601(self.start)),
            ("end", iso8601(self.end)),
            ("resolution", self.effective_resolution().to_string()),
            ("units", self.units.to_string()),
        ];
        if let Some(limit) = self.limit {
            params.push(("limit", limit.to_string()));
        }
        if let Some(offset) = self.offset {
            params.push(("offset", offset.to_string()));
        }
        params
    }
}

/// Backend operations the refresh coordinator depends on.
pub trait TelemetrySource: Send + Sync + 'static {
    fn fetch_health(&self) -> impl Future<Output = ApiResult<Health>> + Send;

    fn fetch_stations(&self) -> impl Future<Output = ApiResult<Vec<Station>>> + Send;

    fn fetch_current(
        &self,
        station_id: u32,
        units: UnitSystem,
    ) -> impl Future<Output = ApiResult<CurrentObservation>> + Send;

    fn fetch_observations(
        &self,
        station_id: u32,
        query: ObservationQuery,
    ) -> impl Future<Output = ApiResult<ObservationPage>> + Send;
}

pub struct TempestClient {
    http_client: Client,
    base_url: Url,
}

impl TempestClient {
    /// Build a client for the configured tempestd origin.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Network` if the HTTP client cannot be constructed.
    pub fn new(config: &Config) -> ApiResult<Self> {
        let http_client = Client::builder()
            .user_agent(concat!("tempest-dashboard/", env!("CARGO_PKG_VERSION")))
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| ApiError::Network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            base_url: config.server_url.clone(),
        })
    }

    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Backend reachability, version and per-station summary.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails or returns an error status.
    pub async fn get_health(&self) -> ApiResult<Health> {
        self.get_json("/api/v1/health", &[]).await
    }

    /// All stations known to the backend, in backend order.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails or returns an error status.
    pub async fn list_stations(&self) -> ApiResult<Vec<Station>> {
        self.get_json("/api/v1/stations", &[]).await
    }

    /// A single station, or `None` when the backend does not know it.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` for any failure other than 404.
    pub async fn get_station(&self, station_id: u32) -> ApiResult<Option<Station>> {
        match self
            .get_json(&format!("/api/v1/stations/{station_id}"), &[])
            .await
        {
            Ok(station) => Ok(Some(station)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Latest observation with its cardinal wind direction.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails or returns an error status.
    pub async fn get_current(
        &self,
        station_id: u32,
        units: UnitSystem,
    ) -> ApiResult<CurrentObservation> {
        self.get_json(
            &format!("/api/v1/stations/{station_id}/current"),
            &[("units", units.to_string())],
        )
        .await
    }

    /// One page of observations, ascending in time.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails or returns an error status.
    pub async fn get_observations(
        &self,
        station_id: u32,
        query: &ObservationQuery,
    ) -> ApiResult<ObservationPage> {
        self.get_json(
            &format!("/api/v1/stations/{station_id}/observations"),
            &query.params(),
        )
        .await
    }

    /// Daily aggregates for `date`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails or returns an error status.
    pub async fn get_summary(
        &self,
        station_id: u32,
        date: NaiveDate,
        units: UnitSystem,
    ) -> ApiResult<DailySummary> {
        self.get_json(
            &format!("/api/v1/stations/{station_id}/summary"),
            &[
                ("date", date.format("%Y-%m-%d").to_string()),
                ("units", units.to_string()),
            ],
        )
        .await
    }

    /// Oldest/newest available timestamps and total observation count.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails or returns an error status.
    pub async fn get_range(&self, station_id: u32) -> ApiResult<ObservationRange> {
        self.get_json(&format!("/api/v1/stations/{station_id}/range"), &[])
            .await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> ApiResult<T> {
        let url = self
            .base_url
            .join(path)
            .map_err(|e| ApiError::Network(format!("Invalid request URL: {e}")))?;

        tracing::debug!(%url, "tempestd request");

        let response = self
            .http_client
            .get(url)
            .query(params)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ApiError::Network(format!("Request timed out: {e}"))
                } else {
                    ApiError::Network(format!("Request failed: {e}"))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(http_error(status, &body));
        }

        let text = response
            .text()
            .await
            .map_err(|e| ApiError::Network(format!("Failed to get response text: {e}")))?;

        serde_json::from_str(&text).map_err(|e| {
            tracing::error!(
                error = %e,
                path,
                body_preview = %text.chars().take(500).collect::<String>(),
                "Failed to parse tempestd response"
            );
            ApiError::Decode(e.to_string())
        })
    }
}

/// Turn a failure status into `ApiError::Http`, preferring the backend's own message.
fn http_error(status: StatusCode, body: &str) -> ApiError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .map(|b| b.error)
        .ok()
        .filter(|m| !m.is_empty())
        .or_else(|| status.canonical_reason().map(str::to_string))
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));

    ApiError::Http {
        status: status.as_u16(),
        message,
    }
}

impl TelemetrySource for TempestClient {
    async fn fetch_health(&self) -> ApiResult<Health> {
        self.get_health().await
    }

    async fn fetch_stations(&self) -> ApiResult<Vec<Station>> {
        self.list_stations().await
    }

    async fn fetch_current(
        &self,
        station_id: u32,
        units: UnitSystem,
    ) -> ApiResult<CurrentObservation> {
        self.get_current(station_id, units).await
    }

    async fn fetch_observations(
        &self,
        station_id: u32,
        query: ObservationQuery,
    ) -> ApiResult<ObservationPage> {
        self.get_observations(station_id, &query).await
    }
}
