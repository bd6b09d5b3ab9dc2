//! HTTP surface. [`app`] wires every route, the session middleware and the
//! tower layers onto a [`Router`].

pub mod api;
pub mod dashboard;
pub mod session;

use axum::{
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::{
    auth::require_session,
    error::AppError,
    models::{FilterTuple, Species},
    state::SharedState,
};

/// Region pre-filled in the sidebar.
pub const DEFAULT_REGION: &str = "Andhra Pradesh";

// ─── Filter Query ─────────────────────────────────────────────────────────────

/// `?species=Shrimp&region=Andhra%20Pradesh`; both optional.
#[derive(Debug, Default, Deserialize)]
pub struct FilterQuery {
    pub species: Option<String>,
    pub region:  Option<String>,
}

impl FilterQuery {
    pub fn species(&self) -> Result<Species, AppError> {
        match &self.species {
            Some(raw) => raw.parse(),
            None => Ok(Species::Shrimp),
        }
    }

    pub fn region_or_default(&self) -> &str {
        self.region.as_deref().unwrap_or(DEFAULT_REGION)
    }

    pub fn to_filter(&self) -> Result<FilterTuple, AppError> {
        FilterTuple::new(self.species()?, self.region_or_default())
    }
}

// ─── Router ───────────────────────────────────────────────────────────────────

pub fn app(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // ── Credential gate ───────────────────────────────────────────────────
        .route("/login",                 get(session::login_form).post(session::login))
        .route("/logout",                post(session::logout))
        // ── Dashboard ─────────────────────────────────────────────────────────
        .route("/",                      get(dashboard::dashboard))
        // ── API ───────────────────────────────────────────────────────────────
        .route("/api/data",              get(api::get_data))
        .route("/api/forecast",          get(api::get_forecast))
        .route("/api/forecast.csv",      get(api::download_forecast_csv))
        .route("/api/cache/invalidate",  post(api::invalidate_cache))
        .route("/api/health",            get(api::health_check))
        .route("/health",                get(api::health_check))
        // ── Middleware ────────────────────────────────────────────────────────
        .layer(axum::middleware::from_fn_with_state(state.clone(), require_session))
        .layer(TimeoutLayer::new(state.config.request_timeout))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

// ─── Tests ────────────────────────────────────────────────────────────────────
