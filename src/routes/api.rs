//! # routes::api
//!
//! JSON / CSV endpoints behind the same session as the dashboard.
//!
//! | Method | Path                    | Description                            |
//! |--------|-------------------------|----------------------------------------|
//! | GET    | `/api/data`             | production rows for the filter tuple   |
//! | GET    | `/api/forecast`         | yield + price series, per-model errors |
//! | GET    | `/api/forecast.csv`     | merged forecast download               |
//! | POST   | `/api/cache/invalidate` | drop cached query results              |
//! | GET    | `/api/health`           | liveness (no session needed)           |

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;

use crate::{
    error::AppError,
    models::{FilterTuple, ForecastTable, ForecastTarget},
    routes::FilterQuery,
    state::SharedState,
    view,
};

/// GET /api/data
pub async fn get_data(
    State(state): State<SharedState>,
    Query(query): Query<FilterQuery>,
) -> Result<impl IntoResponse, AppError> {
    let filter = query.to_filter()?;
    let table = state.loader.load_non_empty(&filter).await?;

    Ok(Json(json!({
        "ok":              true,
        "filter":          filter,
        "count":           table.len(),
        "has_coordinates": table.has_coordinates,
        "records":         table.records,
    })))
}

/// GET /api/forecast
pub async fn get_forecast(
    State(state): State<SharedState>,
    Query(query): Query<FilterQuery>,
) -> Result<impl IntoResponse, AppError> {
    let filter = query.to_filter()?;
    let table = state.loader.load_non_empty(&filter).await?;
    let outcome = state.forecaster.run(&table).await;

    Ok(Json(json!({
        "ok":       true,
        "filter":   filter,
        "yield":    outcome.yield_series.points,
        "price":    outcome.price_series.points,
        "errors":   outcome.errors,
    })))
}

/// GET /api/forecast.csv — both forecasts must succeed
pub async fn download_forecast_csv(
    State(state): State<SharedState>,
    Query(query): Query<FilterQuery>,
) -> Result<impl IntoResponse, AppError> {
    let filter = query.to_filter()?;
    let table = state.loader.load_non_empty(&filter).await?;

    let yield_series = state.forecaster.predict_series(ForecastTarget::Yield, &table).await?;
    let price_series = state.forecaster.predict_series(ForecastTarget::Price, &table).await?;

    let merged = ForecastTable::merge(&yield_series, &price_series).unwrap_or_default();
    let csv = view::forecast_csv(&merged)?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", view::EXPORT_FILE_NAME),
            ),
        ],
        csv,
    ))
}

#[derive(Deserialize)]
pub struct InvalidateBody {
    pub species: String,
    pub region:  String,
}

/// POST /api/cache/invalidate — whole cache when the body is empty, one
/// filter tuple for a `{species, region}` body
pub async fn invalidate_cache(
    State(state): State<SharedState>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        state.loader.invalidate_all();
        return Ok(Json(json!({ "ok": true, "invalidated": "all" })));
    }

    let body: InvalidateBody = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("invalid invalidation body: {e}")))?;
    let filter = FilterTuple::new(body.species.parse()?, &body.region)?;
    state.loader.invalidate(&filter).await;
    Ok(Json(json!({ "ok": true, "invalidated": filter })))
}

/// GET /health, /api/health
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "ok":      true,
        "service": "aquacast",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
