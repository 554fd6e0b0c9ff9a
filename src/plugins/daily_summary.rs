use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use futures::future::{BoxFuture, FutureExt};

use crate::error::AppResult;
use crate::plugins::{Plugin, PluginContext};
use crate::render::current::format_value;
use crate::render::UnitLabels;
use crate::tempestd::models::{DailySummary, ObservationRange};
use crate::tempestd::TempestClient;

pub const NAME: &str = "daily-summary";

/// Today's aggregates and the station's data coverage.
pub struct DailySummaryPlugin {
    client: Arc<TempestClient>,
    latest: Mutex<Option<(DailySummary, Option<ObservationRange>)>>,
}

impl DailySummaryPlugin {
    #[must_use]
    pub const fn new(client: Arc<TempestClient>) -> Self {
        Self {
            client,
            latest: Mutex::new(None),
        }
    }

    async fn update(&self, ctx: &PluginContext) -> AppResult<()> {
        let Some(selection) = ctx.session().selection() else {
            return Ok(());
        };
        let station_id = selection.station_id;
        let today = Utc::now().date_naive();

        let summary = self
            .client
            .get_summary(station_id, today, selection.units)
            .await?;
        let range = match self.client.get_range(station_id).await {
            Ok(range) => Some(range),
            Err(e) => {
                tracing::debug!(error = %e, station_id, "Observation range unavailable");
                None
            }
        };

        // Range changes do not affect a daily summary
        let still_selected = ctx
            .session()
            .selection()
            .is_some_and(|now| now.station_id == station_id && now.units == selection.units);
        if !still_selected {
            tracing::debug!(station_id, "Discarding daily summary for a stale selection");
            return Ok(());
        }

        *self.latest.lock().unwrap_or_else(PoisonError::into_inner) = Some((summary, range));
        Ok(())
    }
}

impl Plugin for DailySummaryPlugin {
    fn name(&self) -> &str {
        NAME
    }

    fn label(&self) -> Option<&str> {
        Some("Today")
    }

    fn render(&self) -> Option<String> {
        let latest = self.latest.lock().unwrap_or_else(PoisonError::into_inner);
        let Some((summary, range)) = latest.as_ref() else {
            return Some("Waiting for data".to_string());
        };

        let labels = UnitLabels::for_units(summary.units);
        let mut lines = vec![
            format!(
                "{}  high {}{t}  low {}{t}  avg {}{t}",
                summary.date,
                format_value(summary.temperature.high, 1),
                format_value(summary.temperature.low, 1),
                format_value(summary.temperature.avg, 1),
                t = labels.temp
            ),
            format!(
                "wind max {} {w}  rain {} {r}  uv max {}  ({} obs)",
                format_value(summary.wind.max, 1),
                format_value(summary.rain_total, 1),
                format_value(summary.uv_max, 0),
                summary.observation_count,
                w = labels.wind,
                r = labels.rain
            ),
        ];
        if let Some(range) = range
            && let (Some(oldest), Some(newest)) = (range.oldest, range.newest)
        {
            lines.push(format!(
                "data {} .. {} ({} total)",
                oldest.format("%Y-%m-%d"),
                newest.format("%Y-%m-%d %H:%M"),
                range.total_observations
            ));
        }
        Some(lines.join("\n"))
    }

    fn refresh<'a>(&'a self, ctx: &'a PluginContext) -> BoxFuture<'a, AppResult<()>> {
        self.update(ctx).boxed()
    }
}
