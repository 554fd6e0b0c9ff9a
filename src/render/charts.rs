//! Chart datasets derived from an observation series.
//!
//! Only the data side lives here: panels, labelled series and axis units.
//! Drawing is left to whatever charting surface consumes them.

use chrono::{DateTime, Utc};

use crate::render::UnitLabels;
use crate::tempestd::models::{Observation, UnitSystem};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartPanel {
    Temperature,
    Humidity,
    Wind,
    Pressure,
    Rain,
    Solar,
}

impl ChartPanel {
    pub const ALL: [Self; 6] = [
        Self::Temperature,
        Self::Humidity,
        Self::Wind,
        Self::Pressure,
        Self::Rain,
        Self::Solar,
    ];

    /// Element id of the panel's canvas.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::Temperature => "chart-temperature",
            Self::Humidity => "chart-humidity",
            Self::Wind => "chart-wind",
            Self::Pressure => "chart-pressure",
            Self::Rain => "chart-rain",
            Self::Solar => "chart-solar",
        }
    }

    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Temperature => "Temperature",
            Self::Humidity => "Humidity",
            Self::Wind => "Wind",
            Self::Pressure => "Pressure",
            Self::Rain => "Rain",
            Self::Solar => "Solar / UV",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Primary,
    Secondary,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub label: &'static str,
    pub axis: Axis,
    /// Missing readings are left out rather than plotted as zero.
    pub points: Vec<(DateTime<Utc>, f64)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Chart {
    pub panel: ChartPanel,
    pub y_label: String,
    pub y2_label: Option<String>,
    pub y_min: Option<f64>,
    pub y_max: Option<f64>,
    pub datasets: Vec<Dataset>,
}

fn series(
    label: &'static str,
    axis: Axis,
    observations: &[Observation],
    pick: impl Fn(&Observation) -> Option<f64>,
) -> Dataset {
    Dataset {
        label,
        axis,
        points: observations
            .iter()
            .filter_map(|o| pick(o).map(|v| (o.timestamp, v)))
            .collect(),
    }
}

/// Build all six panels for `observations` in `units`.
#[must_use]
pub fn build_charts(observations: &[Observation], units: UnitSystem) -> Vec<Chart> {
    let labels = UnitLabels::for_units(units);

    ChartPanel::ALL
        .into_iter()
        .map(|panel| {
            let mut chart = Chart {
                panel,
                y_label: String::new(),
                y2_label: None,
                y_min: None,
                y_max: None,
                datasets: Vec::new(),
            };
            match panel {
                ChartPanel::Temperature => {
                    chart.y_label = labels.temp.to_string();
                    chart.datasets = vec![
                        series("Temperature", Axis::Primary, observations, |o| o.air_temperature),
                        series("Feels Like", Axis::Primary, observations, |o| o.feels_like),
                        series("Dew Point", Axis::Primary, observations, |o| o.dew_point),
                    ];
                }
                ChartPanel::Humidity => {
                    chart.y_label = "%".to_string();
                    chart.y_min = Some(0.0);
                    chart.y_max = Some(100.0);
                    chart.datasets = vec![series("Humidity", Axis::Primary, observations, |o| {
                        o.relative_humidity
                    })];
                }
                ChartPanel::Wind => {
                    chart.y_label = labels.wind.to_string();
                    chart.datasets = vec![
                        series("Average", Axis::Primary, observations, |o| o.wind_avg),
                        series("Gust", Axis::Primary, observations, |o| o.wind_gust),
                        series("Lull", Axis::Primary, observations, |o| o.wind_lull),
                    ];
                }
                ChartPanel::Pressure => {
                    chart.y_label = labels.pressure.to_string();
                    chart.datasets = vec![series("Pressure", Axis::Primary, observations, |o| {
                        o.station_pressure
                    })];
                }
                ChartPanel::Rain => {
                    chart.y_label = labels.rain.to_string();
                    chart.y_min = Some(0.0);
                    chart.datasets = vec![series("Rain", Axis::Primary, observations, |o| {
                        o.rain_accumulation
                    })];
                }
                ChartPanel::Solar => {
                    chart.y_label = "W/m\u{00B2}".to_string();
                    chart.y2_label = Some("UV Index".to_string());
                    chart.datasets = vec![
                        series("Solar Radiation", Axis::Primary, observations, |o| {
                            o.solar_radiation
                        }),
                        series("UV Index", Axis::Secondary, observations, |o| o.uv_index),
                    ];
                }
            }
            chart
        })
        .collect()
}

/// Latest value of every dataset, for compact textual summaries.
#[must_use]
pub fn latest_values(chart: &Chart) -> Vec<(&'static str, Option<f64>)> {
    chart
        .datasets
        .iter()
        .map(|d| (d.label, d.points.last().map(|(_, v)| *v)))
        .collect()
}
