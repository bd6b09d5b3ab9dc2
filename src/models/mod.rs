//! Domain models shared across the dashboard.

pub mod forecast;
pub mod production;

pub use forecast::{
    ForecastPoint, ForecastRow, ForecastSeries, ForecastTable, ForecastTarget, FORECAST_HORIZON,
};
pub use production::{Column, FilterTuple, ProductionRecord, ProductionTable, Species};
