//! # models::production
//!
//! The observed side of the pipeline: [`Species`], the [`FilterTuple`] that
//! parameterises the one supported query, and the read-only
//! [`ProductionTable`] snapshot the loader materialises per query.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

// ─── Species ──────────────────────────────────────────────────────────────────

/// Species offered by the dashboard's selection control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Species {
    Shrimp,
    Rohu,
    Catla,
}

impl Species {
    pub const ALL: [Species; 3] = [Species::Shrimp, Species::Rohu, Species::Catla];

    /// Value stored in the `species` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Species::Shrimp => "Shrimp",
            Species::Rohu   => "Rohu",
            Species::Catla  => "Catla",
        }
    }
}

impl std::fmt::Display for Species {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Species {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Species::ALL
            .into_iter()
            .find(|sp| sp.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| AppError::BadRequest(format!("Unknown species '{s}'")))
    }
}

// ─── FilterTuple ──────────────────────────────────────────────────────────────

/// `(species, region)` — the query parameters and the loader's cache key.
///
/// `region` is matched as a substring, so it is stored trimmed and must not
/// be blank (a blank region would match every row).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct FilterTuple {
    pub species: Species,
    pub region:  String,
}

impl FilterTuple {
    pub fn new(species: Species, region: &str) -> Result<Self, AppError> {
        let region = region.trim();
        if region.is_empty() {
            return Err(AppError::BadRequest("Region must not be empty".into()));
        }
        Ok(Self { species, region: region.to_string() })
    }
}

impl std::fmt::Display for FilterTuple {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} in '{}'", self.species, self.region)
    }
}

// ─── ProductionRecord ─────────────────────────────────────────────────────────

/// One row of the external `production` table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductionRecord {
    pub date:      NaiveDate,
    pub species:   String,
    pub region:    String,
    #[serde(rename = "yield")]
    pub yield_value: f64,
    pub price:     f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude:  Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

/// Numeric columns a model may draw features from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Column {
    Yield,
    Price,
}

impl Column {
    pub fn name(&self) -> &'static str {
        match self {
            Column::Yield => "yield",
            Column::Price => "price",
        }
    }

    fn value(&self, record: &ProductionRecord) -> f64 {
        match self {
            Column::Yield => record.yield_value,
            Column::Price => record.price,
        }
    }
}

// ─── ProductionTable ──────────────────────────────────────────────────────────

/// Read-only snapshot of the rows matching one [`FilterTuple`].
///
/// Records are kept sorted by date ascending so "most recent" is always the
/// tail of the vector.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProductionTable {
    pub records:         Vec<ProductionRecord>,
    /// `true` only when the source exposes both `latitude` and `longitude`.
    pub has_coordinates: bool,
}

impl ProductionTable {
    pub fn new(mut records: Vec<ProductionRecord>, has_coordinates: bool) -> Self {
        records.sort_by_key(|r| r.date);
        Self { records, has_coordinates }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn max_date(&self) -> Option<NaiveDate> {
        self.records.last().map(|r| r.date)
    }

    /// Value of `column` observed `lag` rows before the most recent one.
    pub fn lagged_value(&self, column: Column, lag: usize) -> Option<f64> {
        let idx = self.records.len().checked_sub(lag + 1)?;
        self.records.get(idx).map(|r| column.value(r))
    }

    pub fn head(&self, n: usize) -> &[ProductionRecord] {
        &self.records[..n.min(self.records.len())]
    }

    /// Rows that actually carry a coordinate pair.
    pub fn located(&self) -> impl Iterator<Item = (&ProductionRecord, f64, f64)> {
        self.records
            .iter()
            .filter_map(|r| Some((r, r.latitude?, r.longitude?)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(date: &str, yield_value: f64) -> ProductionRecord {
        ProductionRecord {
            date: date.parse().unwrap(),
            species: "Shrimp".into(),
            region: "Andhra Pradesh".into(),
            yield_value,
            price: yield_value * 10.0,
            latitude: None,
            longitude: None,
        }
    }

    #[test]
    fn species_parses_case_insensitively() {
        assert_eq!("shrimp".parse::<Species>().unwrap(), Species::Shrimp);
        assert_eq!(" CATLA ".parse::<Species>().unwrap(), Species::Catla);
        assert!(matches!("Tuna".parse::<Species>(), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn filter_tuple_trims_and_rejects_blank_region() {
        let f = FilterTuple::new(Species::Shrimp, "  Andhra Pradesh ").unwrap();
        assert_eq!(f.region, "Andhra Pradesh");
        assert!(FilterTuple::new(Species::Shrimp, "   ").is_err());
    }

    #[test]
    fn table_sorts_by_date_and_exposes_latest() {
        let table = ProductionTable::new(
            vec![
                record("2024-01-31", 14.0),
                record("2023-11-30", 10.0),
                record("2023-12-31", 12.0),
            ],
            false,
        );
        assert_eq!(table.max_date(), Some("2024-01-31".parse().unwrap()));
        assert_eq!(table.lagged_value(Column::Yield, 0), Some(14.0));
        assert_eq!(table.lagged_value(Column::Yield, 2), Some(10.0));
        assert_eq!(table.lagged_value(Column::Price, 1), Some(120.0));
        assert_eq!(table.lagged_value(Column::Yield, 3), None);
    }

    #[test]
    fn head_is_bounded_by_len() {
        let table = ProductionTable::new(vec![record("2024-01-31", 1.0)], false);
        assert_eq!(table.head(5).len(), 1);
        assert!(ProductionTable::default().head(5).is_empty());
    }

    #[test]
    fn located_skips_rows_without_coordinates() {
        let mut with = record("2024-01-31", 1.0);
        with.latitude = Some(16.5);
        with.longitude = Some(81.5);
        let table = ProductionTable::new(vec![with, record("2024-02-29", 2.0)], true);
        let points: Vec<_> = table.located().collect();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].1, 16.5);
    }
}
