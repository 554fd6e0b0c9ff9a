//! Current-conditions stat boxes.

use crate::render::UnitLabels;
use crate::tempestd::models::{CurrentObservation, UnitSystem};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatBox {
    pub label: &'static str,
    pub value: String,
    pub unit: String,
    pub secondary: Option<String>,
    /// Severity class for the secondary line (UV only)
    pub class_name: Option<&'static str>,
    pub loading: bool,
}

impl StatBox {
    fn new(label: &'static str, value: String, unit: &str, secondary: Option<String>) -> Self {
        Self {
            label,
            value,
            unit: unit.to_string(),
            secondary,
            class_name: None,
            loading: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UvLevel {
    Low,
    Moderate,
    High,
    VeryHigh,
    Extreme,
}

impl UvLevel {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Moderate => "Moderate",
            Self::High => "High",
            Self::VeryHigh => "Very High",
            Self::Extreme => "Extreme",
        }
    }

    #[must_use]
    pub const fn class_name(self) -> &'static str {
        match self {
            Self::Low => "uv-low",
            Self::Moderate => "uv-moderate",
            Self::High => "uv-high",
            Self::VeryHigh => "uv-very-high",
            Self::Extreme => "uv-extreme",
        }
    }
}

#[must_use]
pub fn uv_level(index: f64) -> UvLevel {
    if index <= 2.0 {
        UvLevel::Low
    } else if index <= 5.0 {
        UvLevel::Moderate
    } else if index <= 7.0 {
        UvLevel::High
    } else if index <= 10.0 {
        UvLevel::VeryHigh
    } else {
        UvLevel::Extreme
    }
}

/// Fixed-precision value, `--` when missing.
#[must_use]
pub fn format_value(value: Option<f64>, decimals: usize) -> String {
    value.map_or_else(|| "--".to_string(), |v| format!("{v:.decimals$}"))
}

/// Placeholder boxes shown while a station's data is loading.
#[must_use]
pub fn loading_boxes() -> Vec<StatBox> {
    ["Temperature", "Humidity", "Wind", "Pressure", "UV Index", "Rain"]
        .into_iter()
        .map(|label| StatBox {
            loading: true,
            ..StatBox::new(label, "--".to_string(), "", None)
        })
        .collect()
}

/// Stat boxes for `obs`, labelled in the observation's own unit system.
#[must_use]
pub fn stat_boxes(obs: Option<&CurrentObservation>) -> Vec<StatBox> {
    let Some(current) = obs else {
        let labels = UnitLabels::for_units(UnitSystem::default());
        return vec![StatBox::new("Temperature", "--".to_string(), labels.temp, None)];
    };

    let units = current.units;
    let labels = UnitLabels::for_units(units);
    let o = &current.observation;
    let metric = units.is_metric();

    let mut boxes = vec![
        StatBox::new(
            "Temperature",
            format_value(o.air_temperature, 1),
            labels.temp,
            Some(format!("Feels like {}{}", format_value(o.feels_like, 1), labels.temp)),
        ),
        StatBox::new(
            "Humidity",
            format_value(o.relative_humidity, 0),
            "%",
            Some(format!("Dew point {}{}", format_value(o.dew_point, 1), labels.temp)),
        ),
        StatBox::new(
            "Wind",
            format_value(o.wind_avg, 1),
            labels.wind,
            Some(
                format!(
                    "Gust {} {} {}",
                    format_value(o.wind_gust, 1),
                    labels.wind,
                    current.wind_direction_cardinal.as_deref().unwrap_or_default()
                )
                .trim_end()
                .to_string(),
            ),
        ),
        StatBox::new(
            "Pressure",
            format_value(o.station_pressure, if metric { 1 } else { 2 }),
            labels.pressure,
            None,
        ),
    ];

    let uv = uv_level(o.uv_index.unwrap_or(0.0));
    boxes.push(StatBox {
        class_name: Some(uv.class_name()),
        ..StatBox::new(
            "UV Index",
            format_value(o.uv_index, 0),
            "",
            Some(uv.label().to_string()),
        )
    });

    boxes.push(StatBox::new(
        "Rain",
        format_value(o.rain_accumulation, if metric { 1 } else { 2 }),
        labels.rain,
        None,
    ));
    boxes.push(StatBox::new(
        "Solar Radiation",
        format_value(o.solar_radiation, 0),
        "W/m\u{00B2}",
        None,
    ));

    if let Some(strikes) = o.lightning_strike_count.filter(|n| *n > 0) {
        boxes.push(StatBox::new(
            "Lightning",
            strikes.to_string(),
            "strikes",
            Some(format!(
                "Avg distance {} {}",
                format_value(o.lightning_avg_distance, 1),
                labels.distance
            )),
        ));
    }

    boxes
}
