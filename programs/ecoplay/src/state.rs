//! Shared service state

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use rand::RngCore;
use settlement_logic::{GameError, GameMode, PersonalityCatalog};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::consent::{ConsentStore, MemoryConsentStore};
use crate::controller::SessionController;
use crate::error::{LabError, Result};
use crate::identity::{IdentityProvider, MemoryIdentityProvider};
use crate::sink::{MemoryRecordSink, RecordSink};

pub type SharedState = Arc<AppState>;

/// Each session sits behind its own lock, so one session's rounds are
/// strictly serialized while different sessions proceed independently.
pub type SessionHandle = Arc<Mutex<SessionController>>;

pub struct AppState {
    pub identity: Arc<dyn IdentityProvider>,
    pub consent: Arc<dyn ConsentStore>,
    pub sink: Arc<dyn RecordSink>,
    catalog: std::result::Result<PersonalityCatalog, GameError>,
    sessions: DashMap<Uuid, SessionHandle>,
}

impl AppState {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        consent: Arc<dyn ConsentStore>,
        sink: Arc<dyn RecordSink>,
        catalog: std::result::Result<PersonalityCatalog, GameError>,
    ) -> Self {
        Self {
            identity,
            consent,
            sink,
            catalog,
            sessions: DashMap::new(),
        }
    }

    /// Everything in memory with the standard catalog
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(MemoryIdentityProvider::new()),
            Arc::new(MemoryConsentStore::new()),
            Arc::new(MemoryRecordSink::new()),
            Ok(PersonalityCatalog::standard()),
        )
    }

    pub fn shared(self) -> SharedState {
        Arc::new(self)
    }

    /// The opponent catalog, or why it could not be loaded
    pub fn catalog(&self) -> Result<&PersonalityCatalog> {
        self.catalog
            .as_ref()
            .map_err(|e| LabError::CatalogUnavailable(e.to_string()))
    }

    /// Start a new session for `user_id`, seeded from the OS RNG
    pub fn start_session(&self, user_id: &str, mode: GameMode) -> Result<SessionHandle> {
        let catalog = match mode {
            GameMode::TrustTrustor => {
                let catalog = self.catalog()?;
                catalog
                    .check_lineup(mode.config().num_opponents)
                    .map_err(|e| LabError::CatalogUnavailable(e.to_string()))?;
                catalog.clone()
            }
            GameMode::PublicGoods | GameMode::TrustTrustee => PersonalityCatalog::standard(),
        };
        let seed = rand::rngs::OsRng.next_u64();
        let id = Uuid::new_v4();

        let handle = Arc::new(Mutex::new(SessionController::new(id, user_id, mode, catalog, seed)));
        self.sessions.insert(id, handle.clone());
        Ok(handle)
    }

    pub fn session(&self, id: Uuid) -> Result<SessionHandle> {
        self.sessions
            .get(&id)
            .map(|h| h.value().clone())
            .ok_or(LabError::SessionNotFound(id))
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Drop sessions nobody has touched for `max_idle`. Sessions in use right
    /// now are kept. Returns how many were dropped.
    pub fn prune_idle_sessions(&self, max_idle: Duration) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, handle| match handle.try_lock() {
            Ok(controller) => controller.idle_for() < max_idle,
            Err(_) => true,
        });
        let pruned = before.saturating_sub(self.sessions.len());
        if pruned > 0 {
            tracing::info!(pruned, remaining = self.sessions.len(), "idle sessions dropped");
        }
        pruned
    }
}
