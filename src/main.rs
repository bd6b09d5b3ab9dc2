//! # Aquacast — Aquaculture Yield & Price Forecast Dashboard
//!
//! ## Architecture Overview
//!
//! ```text
//!  ┌──────────────┐  POST /login            ┌───────────────────────────────┐
//!  │   Browser    │ ───────────────────────▶│  require_session (cookie)     │
//!  │              │  GET /?species&region   │                               │
//!  │              │ ───────────────────────▶│  DataLoader ──▶ moka cache    │──▶ SQLite `production`
//!  │              │                         │      │                        │
//!  │              │ ◀─── HTML + SVG ────────│  Forecaster ──▶ model files   │
//!  │              │ ◀─── forecast_results.csv│                              │
//!  └──────────────┘                         └───────────────────────────────┘
//! ```
//!
//! ## Commands
//!
//! | Command                        | Effect                                   |
//! |--------------------------------|------------------------------------------|
//! | `aquacast`                     | serve the dashboard                      |
//! | `aquacast init-db`             | create the `production` table            |
//! | `aquacast hash-password <pwd>` | print an argon2 hash for `CREDENTIALS`   |
//!
//! ## Environment Variables
//!
//! | Variable               | Default                       | Description                         |
//! |------------------------|-------------------------------|-------------------------------------|
//! | `BIND_ADDR`            | `0.0.0.0:3000`                | Address Axum listens on             |
//! | `DATABASE_URL`         | `sqlite://aquadb.sqlite`      | Production database                 |
//! | `YIELD_MODEL_PATH`     | `artifacts/yield_model.json`  | Yield model artifact                |
//! | `PRICE_MODEL_PATH`     | `artifacts/price_model.json`  | Price model artifact                |
//! | `CREDENTIALS`          | *(required)*                  | `user:Name:<argon2>;...`            |
//! | `SESSION_SECRET`       | *(required, ≥ 16 bytes)*      | Cookie signing key                  |
//! | `SESSION_COOKIE_NAME`  | `aqua_cookie`                 | Cookie name                         |
//! | `SESSION_EXPIRY_DAYS`  | `1`                           | Cookie lifetime                     |
//! | `CACHE_TTL_SECS`       | `600`                         | Query cache time-to-live            |
//! | `CACHE_MAX_ENTRIES`    | `256`                         | Query cache capacity                |
//! | `DB_CONNECT_TIMEOUT_SECS` | `5`                        | Pool acquire timeout                |
//! | `DB_QUERY_TIMEOUT_SECS`| `10`                          | Per-query deadline                  |
//! | `REQUEST_TIMEOUT_SECS` | `30`                          | Per-request deadline                |
//! | `PREVIEW_ROWS`         | `5`                           | Rows in the data preview            |
//! | `RUST_LOG`             | `aquacast=debug`              | Tracing filter                      |

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod auth;
mod config;
mod db;
mod engine;
mod error;
mod models;
mod routes;
mod state;
mod view;

use auth::StaticCredentialStore;
use config::{AppConfig, DatabaseConfig};
use db::SqlProductionSource;
use state::build_state;

// ─── Entry Point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Load .env (optional — prod can use real env vars) ─────────────────
    dotenvy::dotenv().ok();

    // ── 2. Initialise structured logging ─────────────────────────────────────
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env()
            .add_directive("aquacast=debug".parse()?)
            .add_directive("tower_http=info".parse()?))
        .init();

    let mut args = std::env::args().skip(1);
    match args.next().as_deref() {
        Some("hash-password") => {
            let Some(password) = args.next() else {
                anyhow::bail!("usage: aquacast hash-password <password>");
            };
            let hash = auth::hash_password(&password)
                .map_err(|e| anyhow::anyhow!("failed to hash password: {e}"))?;
            println!("{hash}");
            Ok(())
        }
        Some("init-db") => init_db().await,
        Some(other) => anyhow::bail!("unknown command '{other}' (expected init-db or hash-password)"),
        None => serve().await,
    }
}

// ─── Commands ─────────────────────────────────────────────────────────────────

async fn init_db() -> anyhow::Result<()> {
    let pool = db::init_pool(&DatabaseConfig::from_env()?, false).await?;
    db::run_migrations(&pool).await?;
    info!("🗄️  production table ready");
    Ok(())
}

async fn serve() -> anyhow::Result<()> {
    info!(
        r#"

  ╔═══════════════════════════════════════════════╗
  ║      AQUACAST — Aquaculture Forecasts         ║
  ║      Rust + Axum  ·  Yield & Price            ║
  ╚═══════════════════════════════════════════════╝"#
    );

    // ── 1. Configuration ─────────────────────────────────────────────────────
    let config = AppConfig::from_env()?;
    let credentials = StaticCredentialStore::parse(&config.credentials)?;

    for path in [&config.models.yield_model, &config.models.price_model] {
        if !path.exists() {
            tracing::warn!(path = %path.display(), "⚠️  model artifact not found; its forecast will fail");
        }
    }

    // ── 2. Database (read-only for the dashboard) ────────────────────────────
    let pool = db::init_pool(&config.database, true).await?;
    let source = SqlProductionSource::new(pool, config.database.query_timeout);

    // ── 3. Shared state + router ─────────────────────────────────────────────
    let addr = config.bind_addr;
    let state = build_state(config, Arc::new(credentials), Arc::new(source))?;
    let app = routes::app(state);

    info!(?addr, "🚀 Aquacast dashboard starting");

    // ── 4. Start the server ──────────────────────────────────────────────────
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
