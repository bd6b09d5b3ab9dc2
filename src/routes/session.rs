//! # routes::session
//!
//! Login / logout. The only routes reachable without a session (besides
//! health checks).

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;
use tracing::{info, warn};

use crate::{error::AppError, state::SharedState, view};

#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// GET /login
pub async fn login_form() -> impl IntoResponse {
    Html(view::login_page(Some("Please login to access the dashboard.")))
}

/// POST /login — verify credentials, set the session cookie, go to `/`
pub async fn login(
    State(state): State<SharedState>,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let credentials = state.credentials.clone();
    let username = form.username.trim().to_string();

    // Argon2 verification is CPU-bound; keep it off the async workers.
    let identity = tokio::task::spawn_blocking({
        let username = username.clone();
        move || credentials.verify(&username, &form.password)
    })
    .await
    .map_err(|e| AppError::Internal(e.into()))?;

    match identity {
        Some(identity) => {
            info!(user = %identity.username, "🔐 login succeeded");
            let cookie = state.sessions.set_cookie(&identity.username);
            Ok(([(header::SET_COOKIE, cookie)], Redirect::to("/")).into_response())
        }
        None => {
            warn!(user = %username, "❌ login failed");
            Ok((
                StatusCode::UNAUTHORIZED,
                Html(view::login_page(Some("Username/password is incorrect"))),
            )
                .into_response())
        }
    }
}

/// POST /logout — drop the session cookie
pub async fn logout(State(state): State<SharedState>) -> impl IntoResponse {
    ([(header::SET_COOKIE, state.sessions.clear_cookie())], Redirect::to("/login"))
}
