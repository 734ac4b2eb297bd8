use std::sync::Arc;

use coursegate_db::store::PgStore;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: the pool and config are reference counted.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: coursegate_db::DbPool,
    /// Server configuration (JWT settings are read by the auth extractor).
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Storage handle the domain services run against.
    pub fn store(&self) -> PgStore {
        PgStore::new(self.pool.clone())
    }
}
