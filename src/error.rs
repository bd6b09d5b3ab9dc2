//! # error
//!
//! Centralised application error type.
//!
//! JSON handlers return `Result<_, AppError>`; Axum's `IntoResponse` impl
//! turns these into `{"ok": false, "error": ...}` bodies. The dashboard page
//! renders the same messages inline instead of failing the whole response.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::models::FilterTuple;

/// Failures of the relational source.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("database query failed: {0}")]
    Query(#[from] sqlx::Error),

    #[error("database query timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("unexpected value in column '{column}': {detail}")]
    Decode { column: &'static str, detail: String },
}

/// Failures around a single model artifact. Always scoped to one forecast.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model file '{path}' could not be read: {source}")]
    Missing {
        path:   String,
        #[source]
        source: std::io::Error,
    },

    #[error("model file '{path}' is malformed: {detail}")]
    Malformed { path: String, detail: String },

    #[error("feature shape mismatch: model expects {expected} features, got {actual}")]
    Shape { expected: usize, actual: usize },

    #[error("feature '{column}' (lag {lag}) is not available in the data")]
    MissingFeature { column: String, lag: usize },

    #[error("prediction failed: {0}")]
    Predict(String),
}

#[derive(Debug, Error)]
pub enum AppError {
    /// Missing, wrong or expired credentials.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The request parameters are invalid (unknown species, blank region).
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Connection, query or timeout failure talking to the database.
    #[error("Failed to load data: {0}")]
    DataAccess(#[from] DataError),

    /// Zero rows matched the filter tuple. Correctable by the user.
    #[error("No data found for {0}")]
    EmptyResult(FilterTuple),

    /// A forecast model could not produce a result.
    #[error("{target} prediction error: {source}")]
    Model {
        target: &'static str,
        #[source]
        source: ModelError,
    },

    /// Catch-all for unexpected failures.
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::DataAccess(_) => StatusCode::BAD_GATEWAY,
            AppError::EmptyResult(_) => StatusCode::NOT_FOUND,
            AppError::Model { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "ok":    false,
            "error": self.to_string(),
        }));

        (self.status(), body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Species;

    #[test]
    fn empty_result_is_user_correctable_not_found() {
        let filter = FilterTuple::new(Species::Rohu, "Kerala").unwrap();
        let err = AppError::EmptyResult(filter);
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "No data found for Rohu in 'Kerala'");
    }

    #[test]
    fn model_error_names_the_forecast() {
        let err = AppError::Model {
            target: "Yield",
            source: ModelError::Shape { expected: 3, actual: 1 },
        };
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(err.to_string().starts_with("Yield prediction error"));
    }
}
