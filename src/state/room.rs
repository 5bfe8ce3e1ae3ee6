use std::{sync::Arc, time::Duration};

use tokio::sync::{Mutex, RwLock};
use tokio::time::timeout;
use tracing::warn;
use uuid::Uuid;

use crate::{
    error::ServiceError,
    state::{
        DEFAULT_TRANSITION_TIMEOUT, SseHub,
        game::GameSession,
        state_machine::{
            AbortError, ApplyError, GameEvent, GamePhase, PhaseMachine, Plan, PlanError, PlanId,
            Snapshot,
        },
    },
};

/// Broadcast channel capacity per room. Action spam from a full lobby can be
/// bursty, so this is roomier than a one-event-at-a-time feed would need.
const ROOM_HUB_CAPACITY: usize = 64;

/// Everything the server keeps for one running beach session: the session
/// data itself, its phase machine, and the broadcast hub its watchers and
/// swimmers listen on.
pub struct GameRoom {
    id: Uuid,
    session: RwLock<GameSession>,
    machine: RwLock<PhaseMachine>,
    hub: SseHub,
    transition_gate: Mutex<()>,
    transition_timeout: Option<Duration>,
}

impl GameRoom {
    /// Wrap a fresh session into a room, starting the phase machine in the lobby.
    pub fn new(session: GameSession) -> Arc<Self> {
        Arc::new(Self {
            id: session.id,
            session: RwLock::new(session),
            machine: RwLock::new(PhaseMachine::new()),
            hub: SseHub::new(ROOM_HUB_CAPACITY),
            transition_gate: Mutex::new(()),
            transition_timeout: Some(DEFAULT_TRANSITION_TIMEOUT),
        })
    }

    /// Stable identifier of the session this room hosts.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Broadcast hub shared by the room's SSE watchers and websocket swimmers.
    pub fn hub(&self) -> &SseHub {
        &self.hub
    }

    /// Snapshot the current phase.
    pub async fn phase(&self) -> GamePhase {
        self.machine.read().await.phase()
    }

    /// Snapshot the full phase machine state.
    pub async fn snapshot(&self) -> Snapshot {
        self.machine.read().await.snapshot()
    }

    /// Run a closure against the session data behind the read lock.
    pub async fn read_session<R>(&self, f: impl FnOnce(&GameSession) -> R) -> R {
        let guard = self.session.read().await;
        f(&guard)
    }

    /// Run a closure against the session data behind the write lock.
    pub async fn with_session<R>(&self, f: impl FnOnce(&mut GameSession) -> R) -> R {
        let mut guard = self.session.write().await;
        f(&mut guard)
    }

    /// Plan a phase transition, returning the plan.
    async fn plan_transition(&self, event: GameEvent) -> Result<Plan, PlanError> {
        let mut machine = self.machine.write().await;
        machine.plan(event)
    }

    /// Apply the planned transition, returning the next phase.
    async fn apply_planned_transition(&self, plan_id: PlanId) -> Result<GamePhase, ApplyError> {
        let mut machine = self.machine.write().await;
        machine.apply(plan_id)
    }

    /// Abort a planned transition.
    async fn abort_transition(&self, plan_id: PlanId) -> Result<(), AbortError> {
        let mut machine = self.machine.write().await;
        machine.abort(plan_id)
    }

    /// Execute `work` bracketed by a planned phase transition.
    ///
    /// The transition is planned first so an invalid event fails before any
    /// side effect runs; the plan is applied only after `work` succeeds and
    /// aborted if it errors or outlives the timeout. A gate serialises
    /// concurrent transitions on the same room.
    pub async fn run_transition<F, Fut, T>(
        &self,
        event: GameEvent,
        work: F,
    ) -> Result<(T, GamePhase), ServiceError>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<T, ServiceError>>,
    {
        let gate = self.transition_gate.lock().await;
        let Plan { id: plan_id, .. } = self.plan_transition(event.clone()).await?;

        let work_future = work();
        let outcome = if let Some(limit) = self.transition_timeout {
            match timeout(limit, work_future).await {
                Ok(result) => result,
                Err(_) => {
                    if let Err(abort_err) = self.abort_transition(plan_id).await {
                        warn!(
                            room = %self.id,
                            event = ?event,
                            plan_id = %plan_id,
                            error = ?abort_err,
                            "failed to abort transition after timeout"
                        );
                    }
                    drop(gate);
                    return Err(ServiceError::Timeout);
                }
            }
        } else {
            work_future.await
        };

        match outcome {
            Ok(value) => {
                let next = self.apply_planned_transition(plan_id).await?;
                drop(gate);
                Ok((value, next))
            }
            Err(err) => {
                if let Err(abort_err) = self.abort_transition(plan_id).await {
                    warn!(
                        room = %self.id,
                        event = ?event,
                        plan_id = %plan_id,
                        error = ?abort_err,
                        "failed to abort transition after work error"
                    );
                }
                drop(gate);
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::game::{Player, default_roster};
    use crate::state::state_machine::ActivePhase;

    fn room() -> Arc<GameRoom> {
        let host = Player::new("ada".into());
        GameRoom::new(GameSession::new(
            "sandy-cove".into(),
            host,
            Vec::new(),
            default_roster(),
        ))
    }

    #[tokio::test]
    async fn transition_applies_after_work_succeeds() {
        let room = room();
        let (value, next) = room
            .run_transition(GameEvent::StartGame, || async { Ok(42) })
            .await
            .unwrap();

        assert_eq!(value, 42);
        assert_eq!(next, GamePhase::Active(ActivePhase::Calm));
        assert_eq!(room.phase().await, GamePhase::Active(ActivePhase::Calm));
    }

    #[tokio::test]
    async fn transition_aborts_when_work_fails() {
        let room = room();
        let result = room
            .run_transition::<_, _, ()>(GameEvent::StartGame, || async {
                Err(ServiceError::InvalidInput("nope".into()))
            })
            .await;

        assert!(result.is_err());
        assert_eq!(room.phase().await, GamePhase::Lobby);
        assert!(room.snapshot().await.pending.is_none());
    }

    #[tokio::test]
    async fn invalid_event_fails_before_work_runs() {
        let room = room();
        let result = room
            .run_transition::<_, _, ()>(GameEvent::SharkFrenzies, || async {
                panic!("work must not run for an invalid transition")
            })
            .await;

        assert!(matches!(result, Err(ServiceError::InvalidState(_))));
    }
}
