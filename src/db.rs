//! # db — Relational source for production rows
//!
//! Uses `sqlx` (SQLite driver) for async access to the external
//! `production` table. The service only ever reads from it.
//!
//! ## Setup
//! 1. Point `DATABASE_URL` at the database, e.g. `sqlite://aquadb.sqlite`
//! 2. For a fresh local database: `aquacast init-db` applies
//!    `migrations/001_production.sql`

use std::{str::FromStr, time::Duration};

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Column as _, Row, SqlitePool, TypeInfo as _, ValueRef as _,
};
use tracing::{debug, info};

use crate::{
    config::DatabaseConfig,
    error::DataError,
    models::{FilterTuple, ProductionRecord, ProductionTable},
};

/// The one supported query. Both filters are bound parameters.
const PRODUCTION_QUERY: &str =
    r"SELECT * FROM production WHERE species = ? AND region LIKE ? ESCAPE '\'";

// ─── Source Trait ─────────────────────────────────────────────────────────────

/// Anything that can answer the filtered production query.
///
/// The loader depends on this trait rather than on a pool so the query can
/// be swapped (or spied on in tests).
#[async_trait]
pub trait ProductionSource: Send + Sync {
    async fn fetch(&self, filter: &FilterTuple) -> Result<ProductionTable, DataError>;
}

// ─── Pool Init ────────────────────────────────────────────────────────────────

/// Open a pool against `DATABASE_URL`.
///
/// The dashboard opens it `read_only`; `init-db` opens it writable.
pub async fn init_pool(config: &DatabaseConfig, read_only: bool) -> anyhow::Result<SqlitePool> {
    info!(read_only, "Connecting to database...");

    let options = SqliteConnectOptions::from_str(&config.url)
        .context("DATABASE_URL is not a valid SQLite URL")?
        .read_only(read_only)
        .create_if_missing(!read_only);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .acquire_timeout(config.connect_timeout)
        .connect_with(options)
        .await
        .context("Failed to connect to the database")?;

    info!("✅ Database connected");
    Ok(pool)
}

/// Create the `production` table if it does not exist yet.
pub async fn run_migrations(pool: &SqlitePool) -> anyhow::Result<()> {
    sqlx::query(include_str!("../migrations/001_production.sql"))
        .execute(pool)
        .await
        .context("Failed to run migration 001_production.sql")?;

    Ok(())
}

// ─── SQL Source ───────────────────────────────────────────────────────────────

pub struct SqlProductionSource {
    pool:          SqlitePool,
    query_timeout: Duration,
}

impl SqlProductionSource {
    pub fn new(pool: SqlitePool, query_timeout: Duration) -> Self {
        Self { pool, query_timeout }
    }
}

#[async_trait]
impl ProductionSource for SqlProductionSource {
    async fn fetch(&self, filter: &FilterTuple) -> Result<ProductionTable, DataError> {
        let started = std::time::Instant::now();

        let query = sqlx::query(PRODUCTION_QUERY)
            .bind(filter.species.as_str())
            .bind(region_pattern(&filter.region))
            .fetch_all(&self.pool);

        let rows = with_deadline(self.query_timeout, query).await?;

        let has_coordinates = rows.first().map(has_coordinate_columns).unwrap_or(false);
        let records = rows
            .iter()
            .map(|row| decode_record(row, has_coordinates))
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            %filter,
            rows       = records.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "production query finished"
        );

        Ok(ProductionTable::new(records, has_coordinates))
    }
}

/// Runs a query future, giving up after `limit`.
pub(crate) async fn with_deadline<T, F>(limit: Duration, query: F) -> Result<T, DataError>
where
    F: std::future::Future<Output = Result<T, sqlx::Error>>,
{
    tokio::time::timeout(limit, query)
        .await
        .map_err(|_| DataError::Timeout(limit))?
        .map_err(DataError::from)
}

/// `%region%` with LIKE wildcards in the user input escaped.
fn region_pattern(region: &str) -> String {
    let mut pattern = String::with_capacity(region.len() + 2);
    pattern.push('%');
    for ch in region.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

fn has_coordinate_columns(row: &SqliteRow) -> bool {
    let names: Vec<&str> = row.columns().iter().map(|c| c.name()).collect();
    names.contains(&"latitude") && names.contains(&"longitude")
}

fn decode_record(row: &SqliteRow, with_coordinates: bool) -> Result<ProductionRecord, DataError> {
    let (latitude, longitude) = if with_coordinates {
        (number(row, "latitude")?, number(row, "longitude")?)
    } else {
        (None, None)
    };

    Ok(ProductionRecord {
        date:        date(row, "date")?,
        species:     get(row, "species")?,
        region:      get(row, "region")?,
        yield_value: required(number(row, "yield")?, "yield")?,
        price:       required(number(row, "price")?, "price")?,
        latitude,
        longitude,
    })
}

fn get<'r, T>(row: &'r SqliteRow, column: &'static str) -> Result<T, DataError>
where
    T: sqlx::Decode<'r, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite>,
{
    row.try_get(column).map_err(|e| DataError::Decode {
        column,
        detail: e.to_string(),
    })
}

/// SQLite storage class of the value in `column` (`None` for NULL).
fn storage_class(row: &SqliteRow, column: &'static str) -> Result<Option<String>, DataError> {
    let raw = row.try_get_raw(column).map_err(|e| DataError::Decode {
        column,
        detail: e.to_string(),
    })?;
    if raw.is_null() {
        return Ok(None);
    }
    Ok(Some(raw.type_info().name().to_string()))
}

/// Numeric column regardless of declared type: REAL, INTEGER, or numeric text
/// (what DECIMAL / NUMERIC columns often hold).
fn number(row: &SqliteRow, column: &'static str) -> Result<Option<f64>, DataError> {
    match storage_class(row, column)?.as_deref() {
        None => Ok(None),
        Some("REAL") => get::<f64>(row, column).map(Some),
        Some("INTEGER") => get::<i64>(row, column).map(|v| Some(v as f64)),
        Some("TEXT") => {
            let text: String = get(row, column)?;
            text.trim().parse().map(Some).map_err(|_| DataError::Decode {
                column,
                detail: format!("'{text}' is not a number"),
            })
        }
        Some(other) => Err(DataError::Decode {
            column,
            detail: format!("expected a number, found {other}"),
        }),
    }
}

/// Calendar date from `YYYY-MM-DD`, a timestamp string, or a unix time.
fn date(row: &SqliteRow, column: &'static str) -> Result<NaiveDate, DataError> {
    match storage_class(row, column)?.as_deref() {
        Some("TEXT") => {
            let text: String = get(row, column)?;
            parse_date(&text).ok_or_else(|| DataError::Decode {
                column,
                detail: format!("'{text}' is not a date"),
            })
        }
        Some("INTEGER" | "REAL") => get::<NaiveDateTime>(row, column).map(|ts| ts.date()),
        Some(other) => Err(DataError::Decode {
            column,
            detail: format!("expected a date, found {other}"),
        }),
        None => Err(DataError::Decode { column, detail: "NULL".into() }),
    }
}

fn required(value: Option<f64>, column: &'static str) -> Result<f64, DataError> {
    value.ok_or_else(|| DataError::Decode { column, detail: "NULL".into() })
}

/// Keeps the date part of `2024-01-31`, `2024-01-31 00:00:00[.fff]`,
/// `2024-01-31T00:00:00` and RFC 3339 timestamps.
fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(date);
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(text, format) {
            return Some(ts.date());
        }
    }
    DateTime::parse_from_rfc3339(text).ok().map(|ts| ts.date_naive())
}

// ─── Tests ────────────────────────────────────────────────────────────────────
