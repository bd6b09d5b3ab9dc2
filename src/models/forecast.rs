//! # models::forecast
//!
//! Forecast output types. A [`ForecastSeries`] lives for a single render
//! pass: the presenter and the CSV exporter consume it, nothing persists it.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Number of future monthly periods every forecast covers.
pub const FORECAST_HORIZON: usize = 12;

/// Which of the two models produced a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ForecastTarget {
    Yield,
    Price,
}

impl ForecastTarget {
    /// Human label used in headings and error messages.
    pub fn label(&self) -> &'static str {
        match self {
            ForecastTarget::Yield => "Yield",
            ForecastTarget::Price => "Price",
        }
    }

    /// Column name in the merged export, e.g. `forecast_yield`.
    pub fn column(&self) -> &'static str {
        match self {
            ForecastTarget::Yield => "forecast_yield",
            ForecastTarget::Price => "forecast_price",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ForecastPoint {
    pub date:  NaiveDate,
    pub value: f64,
}

/// Ordered `(date, value)` pairs. Either empty or exactly
/// [`FORECAST_HORIZON`] consecutive month-end points.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastSeries {
    pub target: ForecastTarget,
    pub points: Vec<ForecastPoint>,
}

impl ForecastSeries {
    pub fn empty(target: ForecastTarget) -> Self {
        Self { target, points: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

// ─── ForecastTable ────────────────────────────────────────────────────────────

/// One row of the merged export.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastRow {
    pub date:           NaiveDate,
    pub forecast_yield: f64,
    pub forecast_price: f64,
}

/// Yield and price series joined on date (inner join).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ForecastTable {
    pub rows: Vec<ForecastRow>,
}

impl ForecastTable {
    /// Returns `None` unless both series are non-empty.
    pub fn merge(yield_series: &ForecastSeries, price_series: &ForecastSeries) -> Option<Self> {
        if yield_series.is_empty() || price_series.is_empty() {
            return None;
        }

        let rows = yield_series
            .points
            .iter()
            .filter_map(|y| {
                price_series
                    .points
                    .iter()
                    .find(|p| p.date == y.date)
                    .map(|p| ForecastRow {
                        date:           y.date,
                        forecast_yield: y.value,
                        forecast_price: p.value,
                    })
            })
            .collect();

        Some(Self { rows })
    }
}
