/// Global game lifecycle state machine.
pub mod lifecycle;
/// Session token registry and live participant progress.
pub mod registry;
/// Frozen per-run question snapshot.
pub mod snapshot;

use std::{
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

use axum::extract::ws::Message;
use dashmap::DashMap;
use tokio::sync::{Mutex, RwLock, mpsc, watch};
use uuid::Uuid;

use crate::{
    config::AppConfig,
    dao::quiz_store::QuizStore,
    error::ServiceError,
    state::{lifecycle::GameState, registry::SessionRegistry, snapshot::QuestionSnapshot},
};

/// Shared handle to the application state.
pub type SharedState = Arc<AppState>;

#[derive(Clone)]
/// Handle used to push messages to one connected participant socket.
pub struct PlayerConnection {
    /// Unique id of this connection, distinguishing reconnects on one token.
    pub id: Uuid,
    /// Outbound channel consumed by the connection's writer task.
    pub tx: mpsc::UnboundedSender<Message>,
}

/// Central application state: the single consistency boundary for all
/// cross-connection visible game state.
///
/// Every component re-reads through this handle on each event; nothing but
/// the immutable question snapshot may be cached across an event boundary.
pub struct AppState {
    config: AppConfig,
    quiz_store: RwLock<Option<Arc<dyn QuizStore>>>,
    degraded: watch::Sender<bool>,
    game: RwLock<GameState>,
    snapshot: RwLock<Option<Arc<QuestionSnapshot>>>,
    registry: SessionRegistry,
    connections: DashMap<String, PlayerConnection>,
    transition_gate: Mutex<()>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(config: AppConfig) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            config,
            quiz_store: RwLock::new(None),
            degraded: degraded_tx,
            game: RwLock::new(GameState::new()),
            snapshot: RwLock::new(None),
            registry: SessionRegistry::new(),
            connections: DashMap::new(),
            transition_gate: Mutex::new(()),
        })
    }

    /// Immutable runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Obtain a handle to the current quiz store, if one is installed.
    pub async fn quiz_store(&self) -> Option<Arc<dyn QuizStore>> {
        let guard = self.quiz_store.read().await;
        guard.as_ref().cloned()
    }

    /// Quiz store handle, or [`ServiceError::Degraded`] when none is installed.
    pub async fn require_quiz_store(&self) -> Result<Arc<dyn QuizStore>, ServiceError> {
        self.quiz_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a storage backend and leave degraded mode.
    pub async fn set_quiz_store(&self, store: Arc<dyn QuizStore>) {
        {
            let mut guard = self.quiz_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false).await;
    }

    /// Remove the current storage backend and enter degraded mode.
    pub async fn clear_quiz_store(&self) {
        {
            let mut guard = self.quiz_store.write().await;
            guard.take();
        }
        self.update_degraded(true).await;
    }

    /// Current degraded flag.
    pub async fn is_degraded(&self) -> bool {
        let guard = self.quiz_store.read().await;
        guard.is_none()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Broadcast the degraded flag when the value changes.
    pub async fn update_degraded(&self, value: bool) {
        if self.is_degraded().await == value {
            return;
        }

        let _ = self.degraded.send(value);
    }

    /// Lifecycle controller lock; all mutation goes through
    /// [`GameState::apply`](lifecycle::GameState::apply) under the write half.
    pub fn game(&self) -> &RwLock<GameState> {
        &self.game
    }

    /// Snapshot the current lifecycle state.
    pub async fn game_state(&self) -> GameState {
        self.game.read().await.clone()
    }

    /// The frozen question snapshot for the active run, if captured.
    pub async fn question_snapshot(&self) -> Option<Arc<QuestionSnapshot>> {
        let guard = self.snapshot.read().await;
        guard.as_ref().cloned()
    }

    /// Install the frozen snapshot at the pending → running transition.
    pub async fn install_question_snapshot(&self, snapshot: Arc<QuestionSnapshot>) {
        let mut guard = self.snapshot.write().await;
        *guard = Some(snapshot);
    }

    /// Drop the cached snapshot (question-bank edit or reset).
    pub async fn clear_question_snapshot(&self) {
        let mut guard = self.snapshot.write().await;
        guard.take();
    }

    /// Registry of live session progress records.
    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Registry of active participant sockets keyed by session token.
    pub fn connections(&self) -> &DashMap<String, PlayerConnection> {
        &self.connections
    }

    /// Gate serializing admin lifecycle commands (start/end/reset).
    pub fn transition_gate(&self) -> &Mutex<()> {
        &self.transition_gate
    }
}

/// Current wall-clock time as epoch milliseconds.
pub fn epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}
