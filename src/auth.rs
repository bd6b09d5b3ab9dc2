//! # auth — Credential gate and session cookies
//!
//! ## Flow
//! 1. `POST /login` checks the form against a [`CredentialStore`]
//! 2. On success the browser receives an HTTP-only session cookie signed
//!    with HMAC-SHA256 (`SESSION_SECRET`), valid for `SESSION_EXPIRY_DAYS`
//! 3. [`require_session`] guards every other route; it fails closed
//!
//! ## Exempt
//! `/login`, `/health` and `/api/health`
//!
//! ## Credentials
//! `CREDENTIALS="alice:Alice:$argon2id$...;bob:Bob:$argon2id$..."`
//! Hashes are produced with `aquacast hash-password <password>`.

use std::collections::HashMap;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::Sha256;
use tracing::{debug, warn};

use crate::{config::SessionConfig, state::SharedState};

type HmacSha256 = Hmac<Sha256>;

const PUBLIC_PATHS: [&str; 3] = ["/login", "/health", "/api/health"];

// ─── Identity ─────────────────────────────────────────────────────────────────

/// Who is logged in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub username:     String,
    pub display_name: String,
}

// ─── Credential Store ─────────────────────────────────────────────────────────

/// Source of truth for who may log in. Swap for a real identity provider
/// without touching the routes.
pub trait CredentialStore: Send + Sync {
    /// `Some` only when `user` exists and `secret` matches.
    fn verify(&self, user: &str, secret: &str) -> Option<Identity>;

    /// Resolve a username from a valid session back to its identity.
    fn lookup(&self, user: &str) -> Option<Identity>;
}

struct StoredUser {
    display_name: String,
    hash:         String,
}

/// Users and Argon2id hashes parsed from configuration.
pub struct StaticCredentialStore {
    users:      HashMap<String, StoredUser>,
    /// Verified against for unknown users so every attempt costs one Argon2 run.
    dummy_hash: String,
}

impl StaticCredentialStore {
    /// Parse `user:Display Name:<phc hash>` entries separated by `;`.
    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        let mut users = HashMap::new();

        for entry in raw.split(';').map(str::trim).filter(|e| !e.is_empty()) {
            // PHC strings contain '$' and ',' but never ':'
            let mut parts = entry.splitn(3, ':');
            let (Some(user), Some(name), Some(hash)) = (parts.next(), parts.next(), parts.next())
            else {
                anyhow::bail!("credential entry must be 'user:Display Name:hash', got '{entry}'");
            };

            let user = user.trim();
            if user.is_empty() || user.contains('|') {
                anyhow::bail!("invalid username '{user}' in CREDENTIALS");
            }
            PasswordHash::new(hash.trim())
                .map_err(|e| anyhow::anyhow!("password hash for '{user}' is not a PHC string: {e}"))?;

            users.insert(
                user.to_string(),
                StoredUser { display_name: name.trim().to_string(), hash: hash.trim().to_string() },
            );
        }

        if users.is_empty() {
            anyhow::bail!("CREDENTIALS contains no users");
        }
        let dummy_hash = hash_password("aquacast-unknown-user")
            .map_err(|e| anyhow::anyhow!("failed to prepare dummy password hash: {e}"))?;
        Ok(Self { users, dummy_hash })
    }

    fn identity(&self, user: &str, stored: &StoredUser) -> Identity {
        Identity { username: user.to_string(), display_name: stored.display_name.clone() }
    }
}

impl CredentialStore for StaticCredentialStore {
    fn verify(&self, user: &str, secret: &str) -> Option<Identity> {
        let stored = self.users.get(user);
        let hash = stored.map_or(self.dummy_hash.as_str(), |s| s.hash.as_str());

        let parsed = PasswordHash::new(hash).ok()?;
        let matches = Argon2::default().verify_password(secret.as_bytes(), &parsed).is_ok();

        match stored {
            Some(stored) if matches => Some(self.identity(user, stored)),
            _ => None,
        }
    }

    fn lookup(&self, user: &str) -> Option<Identity> {
        self.users.get(user).map(|stored| self.identity(user, stored))
    }
}

/// Argon2id PHC hash with a random salt.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

// ─── Session Tokens ───────────────────────────────────────────────────────────

/// Issues and checks `<username>|<expires_unix>|<hex mac>` cookie values.
#[derive(Clone)]
pub struct SessionKeys {
    cookie_name: String,
    keyed:       HmacSha256,
    expiry:      chrono::Duration,
}

impl SessionKeys {
    pub fn new(config: &SessionConfig) -> anyhow::Result<Self> {
        let keyed = HmacSha256::new_from_slice(config.secret.as_bytes())
            .map_err(|e| anyhow::anyhow!("invalid SESSION_SECRET: {e}"))?;

        Ok(Self {
            cookie_name: config.cookie_name.clone(),
            keyed,
            expiry:      config.expiry,
        })
    }

    fn mac(&self, payload: &str) -> HmacSha256 {
        let mut mac = self.keyed.clone();
        mac.update(payload.as_bytes());
        mac
    }

    pub fn issue(&self, username: &str) -> String {
        let expires = (Utc::now() + self.expiry).timestamp();
        let payload = format!("{username}|{expires}");
        let sig = hex::encode(self.mac(&payload).finalize().into_bytes());
        format!("{payload}|{sig}")
    }

    /// Username carried by a valid, unexpired token.
    pub fn verify(&self, token: &str) -> Option<String> {
        let (payload, sig) = token.rsplit_once('|')?;
        let (username, expires) = payload.split_once('|')?;

        let sig = hex::decode(sig).ok()?;
        self.mac(payload).verify_slice(&sig).ok()?;

        let expires: i64 = expires.parse().ok()?;
        (Utc::now().timestamp() < expires).then(|| username.to_string())
    }

    /// `Set-Cookie` value carrying a fresh token.
    pub fn set_cookie(&self, username: &str) -> String {
        format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            self.cookie_name,
            self.issue(username),
            self.expiry.num_seconds()
        )
    }

    /// `Set-Cookie` value that removes the session.
    pub fn clear_cookie(&self) -> String {
        format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", self.cookie_name)
    }

    /// Token from the request's `Cookie` header, if present.
    pub fn token_from(&self, headers: &HeaderMap) -> Option<String> {
        headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == self.cookie_name)
            .map(|(_, value)| value.to_string())
    }
}

// ─── Middleware ───────────────────────────────────────────────────────────────

/// Axum middleware — requires a valid session cookie.
///
/// On success the [`Identity`] is placed in request extensions. Page
/// requests without a session are redirected to `/login`; API requests get
/// a 401 JSON body.
pub async fn require_session(
    State(state): State<SharedState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    if PUBLIC_PATHS.contains(&path.as_str()) {
        return next.run(request).await;
    }

    let identity = state
        .sessions
        .token_from(request.headers())
        .and_then(|token| state.sessions.verify(&token))
        .and_then(|user| state.credentials.lookup(&user));

    match identity {
        Some(identity) => {
            debug!(user = %identity.username, path, "session ok");
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        None if path.starts_with("/api/") => {
            warn!(path, "❌ Unauthorized API request — missing or invalid session");
            (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({
                    "ok":    false,
                    "error": "Unauthorized: please login to access the dashboard",
                })),
            )
                .into_response()
        }
        None => Redirect::to("/login").into_response(),
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
