pub mod game;
pub mod rate_limit;
mod room;
mod sse;
pub mod state_machine;
pub mod transitions;

use std::{sync::Arc, time::Duration};

use anyhow::Context;
use axum::extract::ws::Message;
use dashmap::DashMap;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::{
    ai::AiBrain,
    config::AppConfig,
    error::ServiceError,
    state::rate_limit::FixedWindowLimiter,
};

pub use self::room::GameRoom;
pub use self::sse::SseHub;
pub use self::state_machine::{AbortError, ApplyError, Plan, PlanError, PlanId, Snapshot};

pub type SharedState = Arc<AppState>;
pub const DEFAULT_TRANSITION_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone)]
/// Handle used to push messages to a connected swimmer socket.
pub struct SwimmerConnection {
    pub game_id: Uuid,
    pub player_id: Uuid,
    pub tx: mpsc::UnboundedSender<Message>,
}

/// Central application state: the room registry, live swimmer sockets,
/// request limiters, and the AI brain shared by every session.
pub struct AppState {
    config: AppConfig,
    ai: AiBrain,
    rooms: DashMap<Uuid, Arc<GameRoom>>,
    swimmers: DashMap<Uuid, SwimmerConnection>,
    shark_limiter: FixedWindowLimiter,
    npc_limiter: FixedWindowLimiter,
    commentary_limiter: FixedWindowLimiter,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    pub fn new(config: AppConfig) -> anyhow::Result<SharedState> {
        let ai = AiBrain::new(config.ai()).context("initialising ai brain")?;
        let rate = config.rate_limit();
        let shark_limiter = FixedWindowLimiter::new(rate.max_requests, rate.window());
        let npc_limiter = FixedWindowLimiter::new(rate.max_requests, rate.window());
        let commentary_limiter = FixedWindowLimiter::new(rate.max_requests, rate.window());

        Ok(Arc::new(Self {
            config,
            ai,
            rooms: DashMap::new(),
            swimmers: DashMap::new(),
            shark_limiter,
            npc_limiter,
            commentary_limiter,
        }))
    }

    /// Immutable runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// The AI brain handling generation, budgeting, and fallback.
    pub fn ai(&self) -> &AiBrain {
        &self.ai
    }

    /// Register a freshly created room.
    pub fn insert_room(&self, room: Arc<GameRoom>) {
        self.rooms.insert(room.id(), room);
    }

    /// Look up a room by session id.
    pub fn room(&self, id: Uuid) -> Option<Arc<GameRoom>> {
        self.rooms.get(&id).map(|entry| entry.value().clone())
    }

    /// Look up a room by session id, failing with a not-found service error.
    pub fn require_room(&self, id: Uuid) -> Result<Arc<GameRoom>, ServiceError> {
        self.room(id)
            .ok_or_else(|| ServiceError::NotFound(format!("unknown game {id}")))
    }

    /// Remove a room from the registry. Streams subscribed to its hub end
    /// once the last strong reference is dropped.
    pub fn remove_room(&self, id: Uuid) -> Option<Arc<GameRoom>> {
        self.rooms.remove(&id).map(|(_, room)| room)
    }

    /// All live rooms, in no particular order.
    pub fn list_rooms(&self) -> Vec<Arc<GameRoom>> {
        self.rooms.iter().map(|entry| entry.value().clone()).collect()
    }

    /// Number of live rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Registry of active swimmer sockets keyed by player id.
    pub fn swimmers(&self) -> &DashMap<Uuid, SwimmerConnection> {
        &self.swimmers
    }

    /// Limiter guarding the shark brain endpoint.
    pub fn shark_limiter(&self) -> &FixedWindowLimiter {
        &self.shark_limiter
    }

    /// Limiter guarding the NPC chat endpoint.
    pub fn npc_limiter(&self) -> &FixedWindowLimiter {
        &self.npc_limiter
    }

    /// Limiter guarding the commentary endpoint.
    pub fn commentary_limiter(&self) -> &FixedWindowLimiter {
        &self.commentary_limiter
    }

    /// Drop elapsed limiter windows across all route groups.
    pub fn sweep_limiters(&self) {
        self.shark_limiter.sweep();
        self.npc_limiter.sweep();
        self.commentary_limiter.sweep();
    }
}
