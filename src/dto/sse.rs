use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::dto::{
    common::GamePhaseSnapshot,
    game::{CommentarySummary, EventSummary, ObjectiveSummary, PlayerSummary},
    shark::{SharkActionDto, TauntTriggerDto},
};

#[derive(Clone, Debug, Serialize)]
/// Dispatched payload carried across SSE channels and socket envelopes.
pub struct ServerEvent {
    pub event: Option<String>,
    pub data: String,
}

impl ServerEvent {
    /// Build an event from a pre-serialised data field.
    pub fn new<E>(event: E, data: String) -> Self
    where
        E: Into<Option<String>>,
    {
        Self {
            event: event.into(),
            data,
        }
    }

    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Initial metadata sent to an SSE client when it connects.
pub struct Handshake {
    /// Game whose stream this subscription follows.
    pub game_id: Uuid,
    /// Human-readable message confirming the subscription.
    pub message: String,
    /// Whether the shark brain currently answers live or from canned lines.
    pub ai_mode: String,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when the shark brain switches between live and mock answers.
pub struct AiStatusEvent {
    pub mode: String,
    pub upstream_available: bool,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
/// Broadcast whenever the gameplay phase changes.
pub struct PhaseChangedEvent(pub GamePhaseSnapshot);

#[derive(Debug, Serialize, ToSchema)]
/// Event emitted when a player joins the game.
pub struct PlayerJoinedEvent {
    pub player: PlayerSummary,
}

#[derive(Debug, Serialize, ToSchema)]
/// Event emitted when a player's live state changed (position, health, status).
pub struct PlayerUpdatedEvent {
    pub player: PlayerSummary,
}

#[derive(Debug, Serialize, ToSchema)]
/// Event emitted when a player leaves the game.
pub struct PlayerLeftEvent {
    pub player_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
/// Event emitted when host rights move to another player.
pub struct HostChangedEvent {
    pub player_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
/// Event emitted when the shark brain settles on a move.
pub struct SharkDecisionEvent {
    pub action: SharkActionDto,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_player: Option<Uuid>,
    pub aggression: f32,
    pub reasoning: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub taunt: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
/// Event emitted when the shark taunts the swimmers.
pub struct SharkTauntEvent {
    pub trigger: TauntTriggerDto,
    pub intensity: u8,
    pub taunt: String,
}

#[derive(Debug, Serialize, ToSchema)]
/// Event emitted for every entry appended to the session event log.
pub struct EventRecordedEvent {
    pub event: EventSummary,
}

#[derive(Debug, Serialize, ToSchema)]
/// Event emitted when a narration line is recorded for the game.
pub struct CommentaryRecordedEvent {
    pub commentary: CommentarySummary,
}

#[derive(Debug, Serialize, ToSchema)]
/// Event emitted when an objective advances or completes.
pub struct ObjectiveUpdatedEvent {
    pub objective: ObjectiveSummary,
}

#[derive(Debug, Serialize, ToSchema)]
/// Event emitted when a game is deleted and its streams are about to close.
pub struct GameRemovedEvent {
    pub game_id: Uuid,
}
