//! # engine::forecaster
//!
//! **Forecast invoker** — turns the latest observations into a 12-month
//! forecast by calling a pre-trained model exactly once.
//!
//! ```text
//! ProductionTable ──▶ features (per artifact contract) ──▶ predict() ──▶ 12 values
//!        │                                                                 │
//!        └── max(date) ──▶ 12 month-end dates ───────────── zip ───────────┘
//! ```
//!
//! A failing model yields an empty series plus a message; it never blocks
//! the other forecast or the page.

use std::path::{Path, PathBuf};

use chrono::{Datelike, Months, NaiveDate};
use serde::Serialize;
use tracing::{info, warn};

use crate::{
    config::ModelPaths,
    engine::model::{LinearArtifact, Model},
    error::{AppError, ModelError},
    models::{ForecastPoint, ForecastSeries, ForecastTarget, ProductionTable, FORECAST_HORIZON},
};

// ─── Outcome ──────────────────────────────────────────────────────────────────

/// Both series for one render pass, plus any per-model failure messages.
#[derive(Debug, Clone, Serialize)]
pub struct ForecastOutcome {
    pub yield_series: ForecastSeries,
    pub price_series: ForecastSeries,
    pub errors:       Vec<String>,
}

// ─── Forecaster ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Forecaster {
    paths: ModelPaths,
}

impl Forecaster {
    pub fn new(paths: ModelPaths) -> Self {
        Self { paths }
    }

    fn path_for(&self, target: ForecastTarget) -> &PathBuf {
        match target {
            ForecastTarget::Yield => &self.paths.yield_model,
            ForecastTarget::Price => &self.paths.price_model,
        }
    }

    /// Run both models against `table`. The caller guarantees the table is
    /// non-empty; the pipeline halts before this point otherwise.
    pub async fn run(&self, table: &ProductionTable) -> ForecastOutcome {
        let mut errors = Vec::new();

        let yield_series = self
            .forecast_or_empty(ForecastTarget::Yield, table, &mut errors)
            .await;
        let price_series = self
            .forecast_or_empty(ForecastTarget::Price, table, &mut errors)
            .await;

        ForecastOutcome { yield_series, price_series, errors }
    }

    /// One forecast, failing the request when the model fails.
    pub async fn predict_series(
        &self,
        target: ForecastTarget,
        table: &ProductionTable,
    ) -> Result<ForecastSeries, AppError> {
        forecast(target, self.path_for(target), table)
            .await
            .map_err(|source| AppError::Model { target: target.label(), source })
    }

    async fn forecast_or_empty(
        &self,
        target: ForecastTarget,
        table: &ProductionTable,
        errors: &mut Vec<String>,
    ) -> ForecastSeries {
        match self.predict_series(target, table).await {
            Ok(series) => series,
            Err(err) => {
                warn!(target = target.label(), error = %err, "forecast unavailable");
                errors.push(err.to_string());
                ForecastSeries::empty(target)
            }
        }
    }
}

// ─── Single Forecast ──────────────────────────────────────────────────────────

/// Load the artifact at `model_path` and forecast `target` from `table`.
pub async fn forecast(
    target: ForecastTarget,
    model_path: &Path,
    table: &ProductionTable,
) -> Result<ForecastSeries, ModelError> {
    let model = LinearArtifact::load(model_path).await?;
    let series = forecast_with(&model, target, table)?;

    info!(
        target = target.label(),
        model  = %model_path.display(),
        from   = ?series.points.first().map(|p| p.date),
        "📈 forecast produced"
    );
    Ok(series)
}

/// Invoke an already-loaded model once and date its output.
pub fn forecast_with(
    model: &dyn Model,
    target: ForecastTarget,
    table: &ProductionTable,
) -> Result<ForecastSeries, ModelError> {
    let sample = build_features(model, table)?;
    let last_date = table.max_date().ok_or_else(|| {
        ModelError::Predict("no observations to forecast from".into())
    })?;

    let mut outputs = model.predict(&[sample])?;
    if outputs.len() != 1 {
        return Err(ModelError::Predict(format!(
            "expected one output vector, got {}",
            outputs.len()
        )));
    }
    let values = outputs.remove(0);
    if values.len() != FORECAST_HORIZON {
        return Err(ModelError::Predict(format!(
            "expected {FORECAST_HORIZON} forecast values, got {}",
            values.len()
        )));
    }

    let points = month_ends_after(last_date, FORECAST_HORIZON)
        .into_iter()
        .zip(values)
        .map(|(date, value)| ForecastPoint { date, value })
        .collect();

    Ok(ForecastSeries { target, points })
}

/// Single-sample feature vector in the order the model declares.
fn build_features(model: &dyn Model, table: &ProductionTable) -> Result<Vec<f64>, ModelError> {
    model
        .features()
        .iter()
        .map(|spec| {
            table
                .lagged_value(spec.column, spec.lag)
                .ok_or_else(|| ModelError::MissingFeature {
                    column: spec.column.name().to_string(),
                    lag:    spec.lag,
                })
        })
        .collect()
}

/// Last day of each of the `periods` months following `date`'s month.
///
/// `2024-01-31` → `2024-02-29, 2024-03-31, …, 2025-01-31`.
pub fn month_ends_after(date: NaiveDate, periods: usize) -> Vec<NaiveDate> {
    let Some(month_start) = NaiveDate::from_ymd_opt(date.year(), date.month(), 1) else {
        return Vec::new();
    };

    (1..=periods as u32)
        .filter_map(|k| {
            month_start
                .checked_add_months(Months::new(k + 1))
                .and_then(|next| next.pred_opt())
        })
        .collect()
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::model::FeatureSpec;
    use crate::models::{Column, ProductionRecord};
    use std::io::Write;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    /// Shrimp / Andhra Pradesh, last observation 2024-01-31, yield 10, 12, 14.
    fn shrimp_table() -> ProductionTable {
        let rows = [("2023-11-30", 10.0), ("2023-12-31", 12.0), ("2024-01-31", 14.0)];
        ProductionTable::new(
            rows.iter()
                .map(|(date, y)| ProductionRecord {
                    date:        d(date),
                    species:     "Shrimp".into(),
                    region:      "Andhra Pradesh".into(),
                    yield_value: *y,
                    price:       300.0 + y,
                    latitude:    None,
                    longitude:   None,
                })
                .collect(),
            false,
        )
    }

    /// Returns a fixed vector regardless of input.
    struct StubModel {
        features: Vec<FeatureSpec>,
        output:   Vec<Vec<f64>>,
    }

    impl Model for StubModel {
        fn features(&self) -> &[FeatureSpec] {
            &self.features
        }

        fn predict(&self, _: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, ModelError> {
            Ok(self.output.clone())
        }
    }

    fn stub(output: Vec<Vec<f64>>) -> StubModel {
        StubModel {
            features: vec![FeatureSpec { column: Column::Yield, lag: 0 }],
            output,
        }
    }

    #[test]
    fn month_ends_handle_leap_years_and_rollover() {
        let dates = month_ends_after(d("2024-01-31"), 12);
        assert_eq!(dates.len(), 12);
        assert_eq!(dates[0], d("2024-02-29"));
        assert_eq!(dates[1], d("2024-03-31"));
        assert_eq!(dates[2], d("2024-04-30"));
        assert_eq!(dates[11], d("2025-01-31"));
    }

    #[test]
    fn month_ends_start_after_mid_month_dates() {
        let dates = month_ends_after(d("2023-11-15"), 2);
        assert_eq!(dates, vec![d("2023-12-31"), d("2024-01-31")]);
    }

    #[test]
    fn month_ends_are_strictly_increasing_and_consecutive() {
        let dates = month_ends_after(d("2022-12-31"), 12);
        for pair in dates.windows(2) {
            assert!(pair[0] < pair[1]);
            let next_month = pair[0].succ_opt().unwrap();
            assert_eq!(next_month.day(), 1);
            assert_eq!(next_month.month(), pair[1].month());
        }
    }

    #[test]
    fn shrimp_example_scenario() {
        let table = shrimp_table();
        let series =
            forecast_with(&stub(vec![vec![15.0; 12]]), ForecastTarget::Yield, &table).unwrap();

        assert_eq!(series.points.len(), 12);
        assert_eq!(series.points[0].date, d("2024-02-29"));
        assert_eq!(series.points[11].date, d("2025-01-31"));
        assert!(series.points.iter().all(|p| p.value == 15.0));
    }

    #[test]
    fn features_follow_the_declared_contract() {
        struct Echo(Vec<FeatureSpec>);
        impl Model for Echo {
            fn features(&self) -> &[FeatureSpec] {
                &self.0
            }
            fn predict(&self, x: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, ModelError> {
                // first two outputs echo the inputs, rest zero
                let mut out = x[0].clone();
                out.resize(12, 0.0);
                Ok(vec![out])
            }
        }

        let model = Echo(vec![
            FeatureSpec { column: Column::Yield, lag: 2 },
            FeatureSpec { column: Column::Price, lag: 0 },
        ]);
        let series = forecast_with(&model, ForecastTarget::Price, &shrimp_table()).unwrap();
        assert_eq!(series.points[0].value, 10.0);
        assert_eq!(series.points[1].value, 314.0);
    }

    #[test]
    fn lag_beyond_history_is_a_missing_feature() {
        let model = StubModel {
            features: vec![FeatureSpec { column: Column::Yield, lag: 5 }],
            output:   vec![vec![1.0; 12]],
        };
        let err = forecast_with(&model, ForecastTarget::Yield, &shrimp_table()).unwrap_err();
        assert!(matches!(err, ModelError::MissingFeature { lag: 5, .. }));
    }

    #[test]
    fn wrong_output_shape_is_rejected() {
        let table = shrimp_table();
        let short = forecast_with(&stub(vec![vec![1.0; 6]]), ForecastTarget::Yield, &table);
        assert!(matches!(short, Err(ModelError::Predict(_))));

        let two = forecast_with(&stub(vec![vec![1.0; 12]; 2]), ForecastTarget::Yield, &table);
        assert!(matches!(two, Err(ModelError::Predict(_))));
    }

    #[tokio::test]
    async fn one_failing_model_does_not_block_the_other() {
        let mut good = tempfile::NamedTempFile::new().unwrap();
        write!(
            good,
            r#"{{"features":[{{"column":"price","lag":0}}],"coefficients":{},"intercepts":{}}}"#,
            serde_json::to_string(&vec![vec![1.0]; 12]).unwrap(),
            serde_json::to_string(&vec![0.0; 12]).unwrap(),
        )
        .unwrap();

        let forecaster = Forecaster::new(ModelPaths {
            yield_model: "/missing/yield_model.json".into(),
            price_model: good.path().to_path_buf(),
        });

        let outcome = forecaster.run(&shrimp_table()).await;

        assert!(outcome.yield_series.is_empty());
        assert_eq!(outcome.price_series.points.len(), 12);
        assert!(outcome.price_series.points.iter().all(|p| p.value == 314.0));
        assert_eq!(outcome.errors.len(), 1);
        assert!(outcome.errors[0].starts_with("Yield prediction error"));
    }
}
