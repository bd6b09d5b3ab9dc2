//! # routes::dashboard
//!
//! `GET /` — one full top-to-bottom render pass:
//! filters → loader → forecaster → page.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse},
    Extension,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    auth::Identity,
    models::Species,
    routes::FilterQuery,
    state::SharedState,
    view::{self, DashboardView},
};

pub async fn dashboard(
    State(state): State<SharedState>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<FilterQuery>,
) -> impl IntoResponse {
    let pass = Uuid::new_v4();
    let region = query.region_or_default().to_string();
    let species = query.species().unwrap_or(Species::Shrimp);

    let mut view = DashboardView {
        identity:     &identity,
        species,
        region:       &region,
        error:        None,
        table:        None,
        outcome:      None,
        preview_rows: state.config.preview_rows,
    };

    // ── 1. Filters ────────────────────────────────────────────────────────────
    let filter = match query.to_filter() {
        Ok(filter) => filter,
        Err(err) => {
            view.error = Some(err.to_string());
            return (err.status(), Html(view::dashboard_page(&view)));
        }
    };

    // ── 2. Data (halts on failure or no rows) ─────────────────────────────────
    let table = match state.loader.load_non_empty(&filter).await {
        Ok(table) => table,
        Err(err) => {
            warn!(%pass, %filter, error = %err, "render halted");
            view.error = Some(err.to_string());
            return (err.status(), Html(view::dashboard_page(&view)));
        }
    };

    // ── 3. Forecasts (per-model failures stay inline) ─────────────────────────
    let outcome = state.forecaster.run(&table).await;

    info!(
        %pass,
        user   = %identity.username,
        %filter,
        rows   = table.len(),
        failed = outcome.errors.len(),
        "dashboard rendered"
    );

    view.table = Some(table.as_ref());
    view.outcome = Some(&outcome);
    (StatusCode::OK, Html(view::dashboard_page(&view)))
}
