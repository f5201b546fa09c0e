pub mod live;
pub mod rooms;
pub mod stage;

use std::sync::Arc;

use dashmap::DashSet;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{config::AppConfig, dao::Stores, error::ServiceError};

pub use self::live::LiveQuestion;
pub use self::rooms::{Audience, SessionHandle, SessionIdentity, SessionKind, SessionRegistry};

/// Shared handle to the central application state.
pub type SharedState = Arc<AppState>;

/// Central application state owning the live session and persistent handles.
pub struct AppState {
    config: AppConfig,
    stores: RwLock<Option<Stores>>,
    sessions: SessionRegistry,
    live: RwLock<Option<LiveQuestion>>,
    batch_scored: DashSet<(Uuid, Uuid)>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a store bundle is installed.
    pub fn new(config: AppConfig) -> SharedState {
        Arc::new(Self {
            config,
            stores: RwLock::new(None),
            sessions: SessionRegistry::new(),
            live: RwLock::new(None),
            batch_scored: DashSet::new(),
        })
    }

    /// Immutable runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Obtain the installed store bundle, if any.
    pub async fn stores(&self) -> Option<Stores> {
        let guard = self.stores.read().await;
        guard.as_ref().cloned()
    }

    /// Obtain the store bundle or fail with a degraded-mode error.
    pub async fn require_stores(&self) -> Result<Stores, ServiceError> {
        self.stores().await.ok_or(ServiceError::Degraded)
    }

    /// Install a store bundle and leave degraded mode.
    pub async fn install_stores(&self, stores: Stores) {
        let mut guard = self.stores.write().await;
        *guard = Some(stores);
    }

    /// Remove the store bundle and enter degraded mode.
    pub async fn clear_stores(&self) {
        let mut guard = self.stores.write().await;
        guard.take();
    }

    /// Whether the backend currently runs without storage.
    pub async fn is_degraded(&self) -> bool {
        let guard = self.stores.read().await;
        guard.is_none()
    }

    /// Registry of connected WebSocket sessions.
    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    /// The single live question slot; written only by the game controller.
    pub fn live(&self) -> &RwLock<Option<LiveQuestion>> {
        &self.live
    }

    /// Record that `participant` has been scored for `question` in the current
    /// batch. Returns false when the pair was already scored, making duplicate
    /// submissions harmless.
    pub fn mark_batch_scored(&self, participant: Uuid, question: Uuid) -> bool {
        self.batch_scored.insert((participant, question))
    }

    /// Forget batch scoring progress; called when a new batch starts or the
    /// game is reset.
    pub fn clear_batch_progress(&self) {
        self.batch_scored.clear();
    }
}
