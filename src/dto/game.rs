use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{
    dto::{
        commentary::CommentaryStyleDto,
        common::PositionDto,
        format_system_time,
        npc::NpcRoleDto,
        phase::VisibleGamePhase,
        shark::SharkSummary,
        validation::{validate_game_name, validate_player_name},
    },
    state::game::{
        CommentaryRecord, EventKind, EventRecord, GameSession, Npc, Objective, ObjectiveKind,
        Player, PlayerActionKind, PlayerStatus,
    },
};

/// Payload used to open a brand-new beach lobby.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateGameRequest {
    pub name: String,
    /// Display name of the creating player, who becomes host.
    pub host_name: String,
    /// Custom objectives. When omitted the backend picks a default set.
    #[serde(default)]
    pub objectives: Option<Vec<ObjectiveInput>>,
}

impl Validate for CreateGameRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Err(e) = validate_game_name(&self.name) {
            errors.add("name", e);
        }
        if let Err(e) = validate_player_name(&self.host_name) {
            errors.add("host_name", e);
        }
        if let Some(ref objectives) = self.objectives {
            for objective in objectives {
                if let Err(objective_errors) = objective.validate() {
                    errors.merge_self("objectives", Err(objective_errors));
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Incoming objective definition for game creation.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct ObjectiveInput {
    #[validate(length(min = 1, max = 120))]
    pub description: String,
    pub kind: ObjectiveKindDto,
    /// Progress needed to complete the objective.
    #[validate(range(min = 1))]
    pub target: u32,
}

/// Payload used to join an existing game.
#[derive(Debug, Deserialize, ToSchema)]
pub struct JoinGameRequest {
    pub name: String,
}

impl Validate for JoinGameRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Err(e) = validate_player_name(&self.name) {
            errors.add("name", e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Identifies the requesting player for host-gated operations.
#[derive(Debug, Deserialize, ToSchema)]
pub struct HostActionRequest {
    pub player_id: Uuid,
}

/// Payload announcing that a player is leaving the game.
#[derive(Debug, Deserialize, ToSchema)]
pub struct LeaveGameRequest {
    pub player_id: Uuid,
}

/// Partial update of one player's live state.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdatePlayerStateRequest {
    /// New position in arena coordinates, clamped server-side.
    #[serde(default)]
    pub position: Option<PositionDto>,
    /// Signed health change to apply, e.g. -10 for a shark hit.
    #[serde(default)]
    pub health_delta: Option<i16>,
}

impl Validate for UpdatePlayerStateRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.position.is_none() && self.health_delta.is_none() {
            let mut err = ValidationError::new("empty_update");
            err.message = Some("At least one of position or health_delta is required".into());
            errors.add("position", err);
        }
        if let Some(ref position) = self.position {
            if let Err(position_errors) = position.validate() {
                errors.merge_self("position", Err(position_errors));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// One gameplay action performed by a swimmer.
#[derive(Debug, Deserialize, ToSchema)]
pub struct PlayerActionRequest {
    pub action: PlayerActionDto,
    /// Swimmer being acted on. Required for rescues.
    #[serde(default)]
    pub target_player: Option<Uuid>,
}

/// What a player is currently doing, as exposed to clients.
#[derive(Debug, Serialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PlayerStatusDto {
    Swimming,
    Downed,
    Rescued,
    Left,
}

impl From<PlayerStatus> for PlayerStatusDto {
    fn from(value: PlayerStatus) -> Self {
        match value {
            PlayerStatus::Swimming => PlayerStatusDto::Swimming,
            PlayerStatus::Downed => PlayerStatusDto::Downed,
            PlayerStatus::Rescued => PlayerStatusDto::Rescued,
            PlayerStatus::Left => PlayerStatusDto::Left,
        }
    }
}

/// Moves a swimmer can make, as accepted on the wire.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PlayerActionDto {
    Splash,
    Dive,
    SwimBurst,
    Wave,
    CollectShell,
    Rescue,
    TauntShark,
}

impl From<PlayerActionDto> for PlayerActionKind {
    fn from(value: PlayerActionDto) -> Self {
        match value {
            PlayerActionDto::Splash => PlayerActionKind::Splash,
            PlayerActionDto::Dive => PlayerActionKind::Dive,
            PlayerActionDto::SwimBurst => PlayerActionKind::SwimBurst,
            PlayerActionDto::Wave => PlayerActionKind::Wave,
            PlayerActionDto::CollectShell => PlayerActionKind::CollectShell,
            PlayerActionDto::Rescue => PlayerActionKind::Rescue,
            PlayerActionDto::TauntShark => PlayerActionKind::TauntShark,
        }
    }
}

impl From<PlayerActionKind> for PlayerActionDto {
    fn from(value: PlayerActionKind) -> Self {
        match value {
            PlayerActionKind::Splash => PlayerActionDto::Splash,
            PlayerActionKind::Dive => PlayerActionDto::Dive,
            PlayerActionKind::SwimBurst => PlayerActionDto::SwimBurst,
            PlayerActionKind::Wave => PlayerActionDto::Wave,
            PlayerActionKind::CollectShell => PlayerActionDto::CollectShell,
            PlayerActionKind::Rescue => PlayerActionDto::Rescue,
            PlayerActionKind::TauntShark => PlayerActionDto::TauntShark,
        }
    }
}

/// Goal categories a game can carry.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ObjectiveKindDto {
    Rescue,
    Collect,
    Survive,
}

impl From<ObjectiveKindDto> for ObjectiveKind {
    fn from(value: ObjectiveKindDto) -> Self {
        match value {
            ObjectiveKindDto::Rescue => ObjectiveKind::Rescue,
            ObjectiveKindDto::Collect => ObjectiveKind::Collect,
            ObjectiveKindDto::Survive => ObjectiveKind::Survive,
        }
    }
}

impl From<ObjectiveKind> for ObjectiveKindDto {
    fn from(value: ObjectiveKind) -> Self {
        match value {
            ObjectiveKind::Rescue => ObjectiveKindDto::Rescue,
            ObjectiveKind::Collect => ObjectiveKindDto::Collect,
            ObjectiveKind::Survive => ObjectiveKindDto::Survive,
        }
    }
}

/// Categories of entries in the session event log.
#[derive(Debug, Serialize, ToSchema, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum EventKindDto {
    PlayerJoined,
    PlayerLeft,
    PlayerDowned,
    PlayerRescued,
    HostChanged,
    ActionPerformed,
    SharkDecision,
    SharkTaunt,
    ObjectiveProgress,
    ObjectiveComplete,
    PhaseChanged,
}

impl From<EventKind> for EventKindDto {
    fn from(value: EventKind) -> Self {
        match value {
            EventKind::PlayerJoined => EventKindDto::PlayerJoined,
            EventKind::PlayerLeft => EventKindDto::PlayerLeft,
            EventKind::PlayerDowned => EventKindDto::PlayerDowned,
            EventKind::PlayerRescued => EventKindDto::PlayerRescued,
            EventKind::HostChanged => EventKindDto::HostChanged,
            EventKind::ActionPerformed => EventKindDto::ActionPerformed,
            EventKind::SharkDecision => EventKindDto::SharkDecision,
            EventKind::SharkTaunt => EventKindDto::SharkTaunt,
            EventKind::ObjectiveProgress => EventKindDto::ObjectiveProgress,
            EventKind::ObjectiveComplete => EventKindDto::ObjectiveComplete,
            EventKind::PhaseChanged => EventKindDto::PhaseChanged,
        }
    }
}

/// Summary returned once a game has been created or fetched.
#[derive(Debug, Serialize, ToSchema)]
pub struct GameSummary {
    pub id: Uuid,
    pub name: String,
    pub created_at: String,
    pub updated_at: String,
    pub phase: VisibleGamePhase,
    pub host_player: Uuid,
    pub players: Vec<PlayerSummary>,
    pub shark: SharkSummary,
    pub objectives: Vec<ObjectiveSummary>,
    pub npcs: Vec<NpcSummary>,
    pub events: Vec<EventSummary>,
    pub commentary: Vec<CommentarySummary>,
}

impl GameSummary {
    /// Project a session together with its current phase.
    pub fn project(session: &GameSession, phase: VisibleGamePhase) -> Self {
        Self {
            id: session.id,
            name: session.name.clone(),
            created_at: format_system_time(session.created_at),
            updated_at: format_system_time(session.updated_at),
            phase,
            host_player: session.host_player,
            players: session.players.values().map(PlayerSummary::from).collect(),
            shark: SharkSummary::from(&session.shark),
            objectives: session.objectives.iter().map(Into::into).collect(),
            npcs: session.npcs.iter().map(Into::into).collect(),
            events: session.events.iter().map(Into::into).collect(),
            commentary: session.commentary.iter().map(Into::into).collect(),
        }
    }
}

/// Response returned when a player joins a game.
#[derive(Debug, Serialize, ToSchema)]
pub struct JoinGameResponse {
    /// Identifier assigned to the joining player.
    pub player_id: Uuid,
    pub game: GameSummary,
}

/// Minimal projection of a game when listed.
#[derive(Debug, Serialize, ToSchema)]
pub struct GameListItem {
    pub id: Uuid,
    pub name: String,
    pub phase: VisibleGamePhase,
    pub player_count: usize,
    pub created_at: String,
}

/// Response payload listing the games currently held in memory.
#[derive(Debug, Serialize, ToSchema)]
pub struct GamesResponse {
    pub games: Vec<GameListItem>,
}

/// Public projection of a player exposed to REST/SSE clients.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct PlayerSummary {
    pub id: Uuid,
    pub name: String,
    pub position: PositionDto,
    pub status: PlayerStatusDto,
    pub health: u8,
    pub score: u32,
    pub joined_at: String,
}

impl From<&Player> for PlayerSummary {
    fn from(player: &Player) -> Self {
        Self {
            id: player.id,
            name: player.name.clone(),
            position: player.position.into(),
            status: player.status.into(),
            health: player.health(),
            score: player.score,
            joined_at: format_system_time(player.joined_at),
        }
    }
}

/// Public projection of one objective.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct ObjectiveSummary {
    pub id: Uuid,
    pub description: String,
    pub kind: ObjectiveKindDto,
    pub target: u32,
    pub progress: u32,
    pub completed: bool,
}

impl From<&Objective> for ObjectiveSummary {
    fn from(objective: &Objective) -> Self {
        Self {
            id: objective.id,
            description: objective.description.clone(),
            kind: objective.kind.into(),
            target: objective.target,
            progress: objective.progress,
            completed: objective.completed,
        }
    }
}

/// Public projection of a beach character.
#[derive(Debug, Serialize, ToSchema)]
pub struct NpcSummary {
    pub id: Uuid,
    pub name: String,
    pub role: NpcRoleDto,
    pub persona: String,
    pub position: PositionDto,
}

impl From<&Npc> for NpcSummary {
    fn from(npc: &Npc) -> Self {
        Self {
            id: npc.id,
            name: npc.name.clone(),
            role: npc.role.into(),
            persona: npc.persona.clone(),
            position: npc.position.into(),
        }
    }
}

/// Public projection of one event log entry.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct EventSummary {
    pub id: Uuid,
    pub kind: EventKindDto,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player_id: Option<Uuid>,
    pub intensity: u8,
    pub at: String,
}

impl From<&EventRecord> for EventSummary {
    fn from(event: &EventRecord) -> Self {
        Self {
            id: event.id,
            kind: event.kind.into(),
            message: event.message.clone(),
            player_id: event.player_id,
            intensity: event.intensity,
            at: format_system_time(event.at),
        }
    }
}

/// Public projection of one narration line.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct CommentarySummary {
    pub id: Uuid,
    pub style: CommentaryStyleDto,
    pub text: String,
    pub subject: String,
    pub at: String,
}

impl From<&CommentaryRecord> for CommentarySummary {
    fn from(record: &CommentaryRecord) -> Self {
        Self {
            id: record.id,
            style: record.style.into(),
            text: record.text.clone(),
            subject: record.subject.clone(),
            at: format_system_time(record.at),
        }
    }
}
