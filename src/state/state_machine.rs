use std::time::Instant;

use thiserror::Error;
use uuid::Uuid;

/// High-level phases a game session can be in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GamePhase {
    /// Players gather on the beach; the shark is not in the water yet.
    Lobby,
    /// The session is live and the shark is in one of its behaviour sub-phases.
    Active(ActivePhase),
    /// The session is over; the results screen is shown until a reset.
    Ended(FinishReason),
}

/// Fine-grained shark behaviour while the session is active.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivePhase {
    /// The shark patrols open water without a target.
    Calm,
    /// The shark is actively hunting one swimmer.
    Alert {
        /// Identifier of the swimmer being hunted.
        target: Uuid,
    },
    /// The shark attacks anything that moves.
    Frenzy,
}

/// Indicates why a session transitioned to the results screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    /// Nobody is left swimming.
    AllSwimmersDown,
    /// Every objective was completed.
    ObjectivesComplete,
    /// The host decided to stop the session early.
    HostEnded,
}

/// Events that can be applied to the phase machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    /// The host starts the session from the lobby.
    StartGame,
    /// The shark locks onto a swimmer.
    SharkHunts {
        /// Identifier of the swimmer being hunted.
        target: Uuid,
    },
    /// The shark escalates into an indiscriminate frenzy.
    SharkFrenzies,
    /// The shark loses interest and the water calms down.
    WatersCalm,
    /// Transition to the results screen.
    Finish(FinishReason),
    /// Return from the results screen to the lobby.
    Reset,
}

/// Error returned when attempting to apply an invalid transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// The phase the machine was in when the invalid event was received.
    pub from: GamePhase,
    /// The event that cannot be applied from this phase.
    pub event: GameEvent,
}

/// Errors that can occur when planning a phase transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    /// A transition is already pending and must be applied or aborted.
    AlreadyPending,
    /// The requested transition is not valid from the current phase.
    InvalidTransition(InvalidTransition),
}

/// Errors that can occur when applying a planned phase transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyError {
    /// No transition is currently pending.
    NoPending,
    /// Plan ID does not match the pending plan.
    IdMismatch {
        /// Expected plan ID.
        expected: PlanId,
        /// Provided plan ID.
        got: PlanId,
    },
    /// Phase changed since the plan was created.
    PhaseMismatch {
        /// Phase when plan was created.
        expected: GamePhase,
        /// Current phase.
        actual: GamePhase,
    },
    /// Version changed since the plan was created.
    VersionMismatch {
        /// Version when plan was created.
        expected: usize,
        /// Current version.
        actual: usize,
    },
}

/// Errors that can occur when aborting a planned phase transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortError {
    /// No transition is currently pending.
    NoPending,
    /// Plan ID does not match the pending plan.
    IdMismatch {
        /// Expected plan ID.
        expected: PlanId,
        /// Provided plan ID.
        got: PlanId,
    },
}

/// Unique identifier for a planned phase transition.
pub type PlanId = Uuid;

/// A planned phase transition that has been validated but not yet applied.
#[derive(Debug, Clone)]
pub struct Plan {
    /// Unique identifier for this plan.
    pub id: PlanId,
    /// Phase the machine is currently in.
    pub from: GamePhase,
    /// Phase the machine will transition to.
    pub to: GamePhase,
    /// Event that triggered this transition.
    pub event: GameEvent,
    /// Version number after applying this transition.
    pub version_next: usize,
    /// Timestamp when this plan was created.
    pub pending_since: Instant,
}

/// Snapshot of the current phase machine state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Current phase of the machine.
    pub phase: GamePhase,
    /// Version number of the machine (increments on each transition).
    pub version: usize,
    /// Pending transition phase, if a transition is planned but not yet applied.
    pub pending: Option<GamePhase>,
}

/// Phase machine implementing the session flow from lobby to results screen.
#[derive(Debug, Clone)]
pub struct PhaseMachine {
    phase: GamePhase,
    version: usize,
    pending: Option<Plan>,
}

impl Default for PhaseMachine {
    fn default() -> Self {
        Self {
            phase: GamePhase::Lobby,
            version: 0,
            pending: None,
        }
    }
}

impl PhaseMachine {
    /// Create a new phase machine initialised in the lobby.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inspect the current phase.
    pub fn phase(&self) -> GamePhase {
        self.phase.clone()
    }

    /// Identifier of the swimmer currently hunted, if the shark is alert.
    pub fn hunted_target(&self) -> Option<Uuid> {
        match &self.phase {
            GamePhase::Active(ActivePhase::Alert { target }) => Some(*target),
            _ => None,
        }
    }

    /// Create a snapshot of the current machine state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            phase: self.phase.clone(),
            version: self.version,
            pending: self.pending.as_ref().map(|plan| plan.to.clone()),
        }
    }

    /// Plan a transition by validating that the event can be applied from the current phase.
    /// Returns a Plan that can later be applied or aborted.
    pub fn plan(&mut self, event: GameEvent) -> Result<Plan, PlanError> {
        if self.pending.is_some() {
            return Err(PlanError::AlreadyPending);
        }

        let next = self
            .compute_transition(event.clone())
            .map_err(PlanError::InvalidTransition)?;

        let plan = Plan {
            id: Uuid::new_v4(),
            from: self.phase.clone(),
            to: next,
            event,
            version_next: self.version + 1,
            pending_since: Instant::now(),
        };

        self.pending = Some(plan.clone());

        Ok(plan)
    }

    /// Apply a planned transition, moving the machine to the next phase.
    /// Returns the new phase after the transition.
    pub fn apply(&mut self, plan_id: PlanId) -> Result<GamePhase, ApplyError> {
        let plan = self.pending.take().ok_or(ApplyError::NoPending)?;

        if plan.id != plan_id {
            let expected_plan_id = plan.id;
            self.pending = Some(plan);
            return Err(ApplyError::IdMismatch {
                expected: expected_plan_id,
                got: plan_id,
            });
        }

        if self.phase != plan.from {
            return Err(ApplyError::PhaseMismatch {
                expected: plan.from,
                actual: self.phase.clone(),
            });
        }

        if self.version + 1 != plan.version_next {
            return Err(ApplyError::VersionMismatch {
                expected: plan.version_next,
                actual: self.version + 1,
            });
        }

        self.phase = plan.to;
        self.version = plan.version_next;
        self.pending = None;

        Ok(self.phase.clone())
    }

    /// Abort a planned transition without applying it, leaving the machine untouched.
    pub fn abort(&mut self, plan_id: PlanId) -> Result<(), AbortError> {
        let plan = self.pending.as_ref().ok_or(AbortError::NoPending)?;

        if plan.id != plan_id {
            return Err(AbortError::IdMismatch {
                expected: plan.id,
                got: plan_id,
            });
        }

        self.pending = None;
        Ok(())
    }

    /// Compute a transition from an event if the transition is valid.
    fn compute_transition(&self, event: GameEvent) -> Result<GamePhase, InvalidTransition> {
        let next = match (self.phase.clone(), event) {
            (GamePhase::Lobby, GameEvent::StartGame) => GamePhase::Active(ActivePhase::Calm),
            (GamePhase::Active(_), GameEvent::SharkHunts { target }) => {
                GamePhase::Active(ActivePhase::Alert { target })
            }
            (
                GamePhase::Active(ActivePhase::Calm | ActivePhase::Alert { .. }),
                GameEvent::SharkFrenzies,
            ) => GamePhase::Active(ActivePhase::Frenzy),
            (
                GamePhase::Active(ActivePhase::Alert { .. } | ActivePhase::Frenzy),
                GameEvent::WatersCalm,
            ) => GamePhase::Active(ActivePhase::Calm),
            (GamePhase::Active(_), GameEvent::Finish(reason)) => GamePhase::Ended(reason),
            (GamePhase::Ended(_), GameEvent::Reset) => GamePhase::Lobby,
            (from, event) => return Err(InvalidTransition { from, event }),
        };

        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(sm: &mut PhaseMachine, event: GameEvent) -> GamePhase {
        let plan = sm.plan(event).unwrap();
        sm.apply(plan.id).unwrap()
    }

    #[test]
    fn initial_state_is_lobby() {
        let sm = PhaseMachine::new();
        assert_eq!(sm.phase(), GamePhase::Lobby);
    }

    #[test]
    fn full_happy_path_through_session() {
        let mut sm = PhaseMachine::new();
        let swimmer = Uuid::new_v4();

        assert_eq!(
            apply(&mut sm, GameEvent::StartGame),
            GamePhase::Active(ActivePhase::Calm)
        );
        assert_eq!(
            apply(&mut sm, GameEvent::SharkHunts { target: swimmer }),
            GamePhase::Active(ActivePhase::Alert { target: swimmer })
        );
        assert_eq!(
            apply(&mut sm, GameEvent::SharkFrenzies),
            GamePhase::Active(ActivePhase::Frenzy)
        );
        assert_eq!(
            apply(&mut sm, GameEvent::WatersCalm),
            GamePhase::Active(ActivePhase::Calm)
        );
        assert_eq!(
            apply(&mut sm, GameEvent::Finish(FinishReason::ObjectivesComplete)),
            GamePhase::Ended(FinishReason::ObjectivesComplete)
        );
        assert_eq!(apply(&mut sm, GameEvent::Reset), GamePhase::Lobby);
    }

    #[test]
    fn hunt_carries_the_target() {
        let mut sm = PhaseMachine::new();
        apply(&mut sm, GameEvent::StartGame);

        let swimmer = Uuid::new_v4();
        let plan = sm.plan(GameEvent::SharkHunts { target: swimmer }).unwrap();
        let next = sm.apply(plan.id).unwrap();

        match next {
            GamePhase::Active(ActivePhase::Alert { target }) => assert_eq!(target, swimmer),
            other => panic!("expected alert phase with target, got {other:?}"),
        }
        assert_eq!(sm.hunted_target(), Some(swimmer));
    }

    #[test]
    fn shark_can_switch_targets_while_alert() {
        let mut sm = PhaseMachine::new();
        apply(&mut sm, GameEvent::StartGame);

        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        apply(&mut sm, GameEvent::SharkHunts { target: first });
        assert_eq!(
            apply(&mut sm, GameEvent::SharkHunts { target: second }),
            GamePhase::Active(ActivePhase::Alert { target: second })
        );
    }

    #[test]
    fn frenzy_cools_down_through_alert_target() {
        let mut sm = PhaseMachine::new();
        apply(&mut sm, GameEvent::StartGame);
        apply(&mut sm, GameEvent::SharkFrenzies);

        let swimmer = Uuid::new_v4();
        assert_eq!(
            apply(&mut sm, GameEvent::SharkHunts { target: swimmer }),
            GamePhase::Active(ActivePhase::Alert { target: swimmer })
        );
    }

    #[test]
    fn calm_water_cannot_calm_further() {
        let mut sm = PhaseMachine::new();
        apply(&mut sm, GameEvent::StartGame);

        let err = sm.plan(GameEvent::WatersCalm).unwrap_err();
        match err {
            PlanError::InvalidTransition(invalid) => {
                assert_eq!(invalid.from, GamePhase::Active(ActivePhase::Calm));
                assert_eq!(invalid.event, GameEvent::WatersCalm);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn invalid_transition_returns_error() {
        let mut sm = PhaseMachine::new();
        let err = sm.plan(GameEvent::SharkFrenzies).unwrap_err();
        match err {
            PlanError::InvalidTransition(invalid) => {
                assert_eq!(invalid.from, GamePhase::Lobby);
                assert_eq!(invalid.event, GameEvent::SharkFrenzies);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn reset_only_from_results_screen() {
        let mut sm = PhaseMachine::new();
        apply(&mut sm, GameEvent::StartGame);

        assert!(matches!(
            sm.plan(GameEvent::Reset),
            Err(PlanError::InvalidTransition(_))
        ));

        apply(&mut sm, GameEvent::Finish(FinishReason::HostEnded));
        assert_eq!(apply(&mut sm, GameEvent::Reset), GamePhase::Lobby);
    }

    #[test]
    fn abort_clears_pending() {
        let mut sm = PhaseMachine::new();
        let plan = sm.plan(GameEvent::StartGame).unwrap();
        sm.abort(plan.id).unwrap();
        assert!(sm.pending.is_none());
    }

    #[test]
    fn apply_rejects_mismatched_plan_id() {
        let mut sm = PhaseMachine::new();
        let plan = sm.plan(GameEvent::StartGame).unwrap();

        let err = sm.apply(Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, ApplyError::IdMismatch { .. }));

        // The original plan is still pending and can be applied.
        assert_eq!(
            sm.apply(plan.id).unwrap(),
            GamePhase::Active(ActivePhase::Calm)
        );
    }
}
