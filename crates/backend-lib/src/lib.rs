// ============================
// crates/backend-lib/src/lib.rs
// ============================
//! Core functionality for the linkshelf REST API.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod router;
pub mod storage;
pub mod validation;

use std::sync::Arc;

use crate::auth::{AuthService, Clock, DefaultAuth};
use crate::config::Settings;
use crate::storage::{SqliteStorage, Storage};

pub use router::create_router;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Credential hashing and session tokens
    pub auth: Arc<dyn AuthService>,
    /// Storage backend
    pub storage: Arc<dyn Storage>,
    pub settings: Arc<Settings>,
}

impl AppState {
    /// Create a new application state from its parts
    pub fn new(auth: Arc<dyn AuthService>, storage: Arc<dyn Storage>, settings: Settings) -> Self {
        Self {
            auth,
            storage,
            settings: Arc::new(settings),
        }
    }

    /// State with the default auth service driven by the given clock
    pub fn with_clock(storage: Arc<dyn Storage>, settings: Settings, clock: Arc<dyn Clock>) -> Self {
        let auth = Arc::new(DefaultAuth::with_clock(&settings, clock));
        Self::new(auth, storage, settings)
    }

    /// Open the configured SQLite database and wire up the default services
    pub fn open(settings: Settings) -> anyhow::Result<Self> {
        let storage = Arc::new(SqliteStorage::open(&settings.database_path)?);
        let auth = Arc::new(DefaultAuth::new(&settings));
        Ok(Self::new(auth, storage, settings))
    }
}
