//! # state
//!
//! The shared application state injected into every Axum handler.
//!
//! Everything in here is either immutable after start-up (config, credential
//! store, session keys, model paths) or internally synchronised (the loader's
//! query cache), so `Arc<AppState>` needs no outer lock.

use std::sync::Arc;

use crate::{
    auth::{CredentialStore, SessionKeys},
    config::AppConfig,
    db::ProductionSource,
    engine::{forecaster::Forecaster, loader::DataLoader},
};

// ─── AppState ─────────────────────────────────────────────────────────────────

pub struct AppState {
    pub config:      AppConfig,
    /// Who may log in.
    pub credentials: Arc<dyn CredentialStore>,
    /// Issues and checks session cookies.
    pub sessions:    SessionKeys,
    /// Memoised `production` query.
    pub loader:      DataLoader,
    /// Yield / price model invoker.
    pub forecaster:  Forecaster,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        credentials: Arc<dyn CredentialStore>,
        source: Arc<dyn ProductionSource>,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            sessions:   SessionKeys::new(&config.session)?,
            loader:     DataLoader::new(source, &config.cache),
            forecaster: Forecaster::new(config.models.clone()),
            credentials,
            config,
        })
    }
}

/// Convenience type alias
pub type SharedState = Arc<AppState>;

pub fn build_state(
    config: AppConfig,
    credentials: Arc<dyn CredentialStore>,
    source: Arc<dyn ProductionSource>,
) -> anyhow::Result<SharedState> {
    Ok(Arc::new(AppState::new(config, credentials, source)?))
}
