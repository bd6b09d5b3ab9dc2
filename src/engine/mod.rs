//! Data and forecasting pipeline.
//!
//! * [`loader`] — memoised, parameterised `production` query.
//! * [`model`] — on-disk model artifacts and the [`model::Model`] seam.
//! * [`forecaster`] — 12-month forecasts dated from the last observation.

pub mod forecaster;
pub mod loader;
pub mod model;
