use serde::Serialize;
use utoipa::ToSchema;

use crate::state::state_machine::{ActivePhase, FinishReason, GamePhase};

/// Publicly visible game phase exposed to clients (REST/SSE).
#[derive(Debug, Serialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VisibleGamePhase {
    /// Waiting for swimmers to join; the shark is dormant.
    Lobby,
    /// Round running, shark patrolling without a mark.
    Calm,
    /// Round running, shark locked onto one swimmer.
    Alert,
    /// Round running, shark attacking indiscriminately.
    Frenzy,
    /// Round finished, final tally on display.
    Ended,
}

impl From<&GamePhase> for VisibleGamePhase {
    fn from(value: &GamePhase) -> Self {
        match value {
            GamePhase::Lobby => VisibleGamePhase::Lobby,
            GamePhase::Active(ActivePhase::Calm) => VisibleGamePhase::Calm,
            GamePhase::Active(ActivePhase::Alert { .. }) => VisibleGamePhase::Alert,
            GamePhase::Active(ActivePhase::Frenzy) => VisibleGamePhase::Frenzy,
            GamePhase::Ended(_) => VisibleGamePhase::Ended,
        }
    }
}

/// Why a finished round came to an end.
#[derive(Debug, Serialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VisibleFinishReason {
    /// Every swimmer went down; the shark won.
    AllSwimmersDown,
    /// All objectives were completed; the swimmers won.
    ObjectivesComplete,
    /// The host called the round off early.
    HostEnded,
}

impl From<&FinishReason> for VisibleFinishReason {
    fn from(value: &FinishReason) -> Self {
        match value {
            FinishReason::AllSwimmersDown => VisibleFinishReason::AllSwimmersDown,
            FinishReason::ObjectivesComplete => VisibleFinishReason::ObjectivesComplete,
            FinishReason::HostEnded => VisibleFinishReason::HostEnded,
        }
    }
}
