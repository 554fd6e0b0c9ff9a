pub mod charts;
pub mod current;
pub mod terminal;

use crate::tempestd::models::UnitSystem;

/// Display unit suffixes for a unit system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitLabels {
    pub temp: &'static str,
    pub wind: &'static str,
    pub pressure: &'static str,
    pub rain: &'static str,
    pub distance: &'static str,
}

impl UnitLabels {
    #[must_use]
    pub const fn for_units(units: UnitSystem) -> Self {
        match units {
            UnitSystem::Metric => Self {
                temp: "\u{00B0}C",
                wind: "m/s",
                pressure: "hPa",
                rain: "mm",
                distance: "km",
            },
            UnitSystem::Imperial => Self {
                temp: "\u{00B0}F",
                wind: "mph",
                pressure: "inHg",
                rain: "in",
                distance: "mi",
            },
        }
    }
}
