use std::sync::Arc;

use sqlx::SqlitePool;

use crate::profile::store::ProfileStore;
use crate::tailoring::Tailor;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    /// Repository for the singleton profile row.
    pub profiles: ProfileStore,
    /// Pluggable tailoring backend. `LlmTailor` when an API key is
    /// configured, `MockTailor` otherwise.
    pub tailor: Arc<dyn Tailor>,
}
