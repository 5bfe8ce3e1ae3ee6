//! DTO definitions for the shark brain endpoint.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{
    ai::{AiStats, DecisionContext, SharkDecision, SwimmerContext},
    dto::{
        common::{GamePhaseSnapshot, PositionDto},
        format_system_time,
    },
    state::game::{SharkAction, SharkMemory, SharkMemoryPatch, SharkState, TauntTrigger},
};

fn default_taunt_intensity() -> u8 {
    3
}

/// Request body accepted by the shark brain endpoint, discriminated on `action`.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum SharkBrainRequest {
    /// Ask the brain for the shark's next move.
    Decide(DecideRequest),
    /// Patch what the shark remembers about one swimmer.
    UpdateMemory(UpdateMemoryRequest),
    /// Generate a one-liner for a game moment.
    Taunt(TauntRequest),
    /// Inspect usage counters and the active mode.
    Stats,
}

impl Validate for SharkBrainRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        match self {
            SharkBrainRequest::Decide(req) => req.validate(),
            SharkBrainRequest::UpdateMemory(req) => req.validate(),
            SharkBrainRequest::Taunt(req) => req.validate(),
            SharkBrainRequest::Stats => Ok(()),
        }
    }
}

/// Parameters for a decide call. The caller either names a game, in which
/// case the backend builds the context itself, or supplies one inline.
#[derive(Debug, Deserialize, ToSchema)]
pub struct DecideRequest {
    #[serde(default)]
    pub game_id: Option<Uuid>,
    #[serde(default)]
    pub context: Option<DecisionContextInput>,
}

impl Validate for DecideRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.game_id.is_none() && self.context.is_none() {
            let mut err = ValidationError::new("missing_context");
            err.message = Some("Either game_id or an inline context is required".into());
            errors.add("game_id", err);
        }
        if let Some(ref context) = self.context {
            if let Err(context_errors) = context.validate() {
                errors.merge_self("context", Err(context_errors));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Inline decision context for callers that manage game state themselves.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct DecisionContextInput {
    #[validate(nested)]
    pub shark: SharkContextInput,
    #[validate(nested, length(max = 16))]
    pub swimmers: Vec<SwimmerContextInput>,
}

/// Shark half of an inline decision context.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct SharkContextInput {
    #[validate(nested)]
    pub position: PositionDto,
    #[validate(range(min = 0.0, max = 1.0))]
    pub aggression: f32,
}

/// One swimmer in an inline decision context.
#[derive(Debug, Serialize, Deserialize, ToSchema, Validate)]
pub struct SwimmerContextInput {
    #[serde(default)]
    pub id: Option<Uuid>,
    #[validate(length(min = 1, max = 24))]
    pub name: String,
    #[validate(nested)]
    pub position: PositionDto,
    #[validate(range(max = 100))]
    pub health: u8,
    #[serde(default)]
    #[validate(range(min = 0.0, max = 1.0))]
    pub noise: f32,
    #[serde(default)]
    #[validate(range(min = 0.0, max = 1.0))]
    pub threat: f32,
}

impl From<&DecisionContextInput> for DecisionContext {
    fn from(input: &DecisionContextInput) -> Self {
        Self {
            shark_position: input.shark.position.into(),
            aggression: input.shark.aggression,
            swimmers: input
                .swimmers
                .iter()
                .map(|swimmer| SwimmerContext {
                    id: swimmer.id,
                    name: swimmer.name.clone(),
                    position: swimmer.position.into(),
                    health: swimmer.health,
                    noise: swimmer.noise,
                    threat: swimmer.threat,
                })
                .collect(),
        }
    }
}

/// Parameters for a memory update call.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct UpdateMemoryRequest {
    pub game_id: Uuid,
    pub player_id: Uuid,
    #[validate(nested)]
    pub patch: SharkMemoryPatchInput,
}

/// Partial shark memory update. Absent fields keep their stored value.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct SharkMemoryPatchInput {
    #[serde(default)]
    pub encounters: Option<u32>,
    #[serde(default)]
    pub strikes_landed: Option<u32>,
    #[serde(default)]
    pub escapes: Option<u32>,
    #[serde(default)]
    #[validate(range(min = 0.0, max = 1.0))]
    pub noise_level: Option<f32>,
    #[serde(default)]
    #[validate(nested)]
    pub last_seen: Option<PositionDto>,
}

impl From<&SharkMemoryPatchInput> for SharkMemoryPatch {
    fn from(input: &SharkMemoryPatchInput) -> Self {
        Self {
            encounters: input.encounters,
            strikes_landed: input.strikes_landed,
            escapes: input.escapes,
            noise_level: input.noise_level,
            last_seen: input.last_seen.map(Into::into),
        }
    }
}

/// Parameters for a taunt call.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct TauntRequest {
    pub trigger: TauntTriggerDto,
    /// Swimmer the taunt is aimed at, by display name.
    #[serde(default)]
    #[validate(length(max = 40))]
    pub target: Option<String>,
    /// How theatrical the line should be, `1..=5`.
    #[serde(default = "default_taunt_intensity")]
    #[validate(range(min = 1, max = 5))]
    pub intensity: u8,
    /// Game to log the taunt into, when any.
    #[serde(default)]
    pub game_id: Option<Uuid>,
}

/// Query form of the shark brain request for GET callers.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SharkBrainQuery {
    /// One of `decide`, `taunt` or `stats`.
    pub action: String,
    #[serde(default)]
    pub game_id: Option<Uuid>,
    #[serde(default)]
    pub trigger: Option<TauntTriggerDto>,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub intensity: Option<u8>,
}

impl SharkBrainQuery {
    /// Reshape the query into the request enum the POST handler consumes.
    ///
    /// Memory updates carry a nested patch, which a flat query string cannot
    /// express, so `updateMemory` is rejected here.
    pub fn into_request(self) -> Result<SharkBrainRequest, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        match self.action.as_str() {
            "decide" => Ok(SharkBrainRequest::Decide(DecideRequest {
                game_id: self.game_id,
                context: None,
            })),
            "taunt" => Ok(SharkBrainRequest::Taunt(TauntRequest {
                trigger: self.trigger.unwrap_or(TauntTriggerDto::Idle),
                target: self.target,
                intensity: self.intensity.unwrap_or_else(default_taunt_intensity),
                game_id: self.game_id,
            })),
            "stats" => Ok(SharkBrainRequest::Stats),
            "updateMemory" => {
                let mut err = ValidationError::new("requires_body");
                err.message = Some("updateMemory requires a POST body".into());
                errors.add("action", err);
                Err(errors)
            }
            other => {
                let mut err = ValidationError::new("unknown_action");
                err.message = Some(format!("Unknown shark brain action '{other}'").into());
                errors.add("action", err);
                Err(errors)
            }
        }
    }
}

/// Moments that can prompt a taunt.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TauntTriggerDto {
    Spotted,
    Missed,
    Struck,
    PlayerEscaped,
    ObjectiveDone,
    Idle,
}

impl From<TauntTriggerDto> for TauntTrigger {
    fn from(value: TauntTriggerDto) -> Self {
        match value {
            TauntTriggerDto::Spotted => TauntTrigger::Spotted,
            TauntTriggerDto::Missed => TauntTrigger::Missed,
            TauntTriggerDto::Struck => TauntTrigger::Struck,
            TauntTriggerDto::PlayerEscaped => TauntTrigger::PlayerEscaped,
            TauntTriggerDto::ObjectiveDone => TauntTrigger::ObjectiveDone,
            TauntTriggerDto::Idle => TauntTrigger::Idle,
        }
    }
}

/// The shark's observable behaviour, as exposed to clients.
#[derive(Debug, Serialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SharkActionDto {
    Patrol,
    Stalk,
    Circle,
    Attack,
    Retreat,
}

impl From<SharkAction> for SharkActionDto {
    fn from(value: SharkAction) -> Self {
        match value {
            SharkAction::Patrol => SharkActionDto::Patrol,
            SharkAction::Stalk => SharkActionDto::Stalk,
            SharkAction::Circle => SharkActionDto::Circle,
            SharkAction::Attack => SharkActionDto::Attack,
            SharkAction::Retreat => SharkActionDto::Retreat,
        }
    }
}

/// Public projection of the shark within a game summary.
#[derive(Debug, Serialize, ToSchema)]
pub struct SharkSummary {
    pub position: PositionDto,
    pub action: SharkActionDto,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<Uuid>,
    pub aggression: f32,
    pub memories: Vec<SharkMemorySummary>,
}

impl From<&SharkState> for SharkSummary {
    fn from(shark: &SharkState) -> Self {
        Self {
            position: shark.position.into(),
            action: shark.action.into(),
            target: shark.target,
            aggression: shark.aggression(),
            memories: shark.memories.values().map(Into::into).collect(),
        }
    }
}

/// Public projection of what the shark remembers about one swimmer.
#[derive(Debug, Serialize, ToSchema)]
pub struct SharkMemorySummary {
    pub player_id: Uuid,
    pub encounters: u32,
    pub strikes_landed: u32,
    pub escapes: u32,
    pub noise_level: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<PositionDto>,
    pub threat_score: f32,
    pub updated_at: String,
}

impl From<&SharkMemory> for SharkMemorySummary {
    fn from(memory: &SharkMemory) -> Self {
        Self {
            player_id: memory.player_id,
            encounters: memory.encounters,
            strikes_landed: memory.strikes_landed,
            escapes: memory.escapes,
            noise_level: memory.noise_level,
            last_seen: memory.last_seen.map(Into::into),
            threat_score: memory.threat_score,
            updated_at: format_system_time(memory.updated_at),
        }
    }
}

/// Response payload for a decide call.
#[derive(Debug, Serialize, ToSchema)]
pub struct SharkDecisionResponse {
    pub action: SharkActionDto,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_player: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_name: Option<String>,
    pub aggression: f32,
    pub reasoning: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub taunt: Option<String>,
    /// Phase the named game moved to as a result of the decision.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<GamePhaseSnapshot>,
}

impl From<&SharkDecision> for SharkDecisionResponse {
    fn from(decision: &SharkDecision) -> Self {
        Self {
            action: decision.action.into(),
            target_player: decision.target,
            target_name: decision.target_name.clone(),
            aggression: decision.aggression,
            reasoning: decision.reasoning.clone(),
            taunt: decision.taunt.clone(),
            phase: None,
        }
    }
}

/// Response payload for a memory update call.
#[derive(Debug, Serialize, ToSchema)]
pub struct MemoryUpdateResponse {
    pub player_id: Uuid,
    pub memory: SharkMemorySummary,
}

/// Response payload for a taunt call.
#[derive(Debug, Serialize, ToSchema)]
pub struct TauntResponse {
    pub trigger: TauntTriggerDto,
    pub intensity: u8,
    pub taunt: String,
}

/// Usage counters per shark brain action.
#[derive(Debug, Serialize, ToSchema)]
pub struct ActionCountsDto {
    pub decide: u64,
    pub update_memory: u64,
    pub taunt: u64,
    pub npc_chat: u64,
    pub commentary: u64,
}

/// Response payload for a stats call.
#[derive(Debug, Serialize, ToSchema)]
pub struct BrainStatsResponse {
    /// Mode the next call would run in ("live" or "mock").
    pub mode: String,
    pub upstream_available: bool,
    pub calls_used: u32,
    pub calls_remaining: u32,
    pub call_budget: u32,
    /// Responses served from the canned generators.
    pub mock_served: u64,
    pub actions: ActionCountsDto,
}

impl From<AiStats> for BrainStatsResponse {
    fn from(stats: AiStats) -> Self {
        Self {
            mode: stats.mode.as_str().to_owned(),
            upstream_available: stats.upstream_available,
            calls_used: stats.calls_used,
            calls_remaining: stats.calls_remaining,
            call_budget: stats.call_budget,
            mock_served: stats.mock_served,
            actions: ActionCountsDto {
                decide: stats.actions.decide,
                update_memory: stats.actions.update_memory,
                taunt: stats.actions.taunt,
                npc_chat: stats.actions.npc_chat,
                commentary: stats.actions.commentary,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_brain_request_tag_dispatch() {
        let decide: SharkBrainRequest =
            serde_json::from_value(serde_json::json!({"action": "decide", "game_id": null}))
                .unwrap();
        assert!(matches!(decide, SharkBrainRequest::Decide(_)));

        let stats: SharkBrainRequest =
            serde_json::from_value(serde_json::json!({"action": "stats"})).unwrap();
        assert!(matches!(stats, SharkBrainRequest::Stats));

        let taunt: SharkBrainRequest = serde_json::from_value(serde_json::json!({
            "action": "taunt",
            "trigger": "struck",
            "target": "Finn"
        }))
        .unwrap();
        match taunt {
            SharkBrainRequest::Taunt(req) => {
                assert_eq!(req.trigger, TauntTriggerDto::Struck);
                assert_eq!(req.intensity, 3); // default
            }
            other => panic!("unexpected request: {other:?}"),
        }
    }

    #[test]
    fn test_decide_requires_game_or_context() {
        let req = DecideRequest {
            game_id: None,
            context: None,
        };
        assert!(req.validate().is_err());

        let req = DecideRequest {
            game_id: Some(Uuid::new_v4()),
            context: None,
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_query_rejects_update_memory_and_unknown_actions() {
        let query = SharkBrainQuery {
            action: "updateMemory".into(),
            game_id: None,
            trigger: None,
            target: None,
            intensity: None,
        };
        assert!(query.into_request().is_err());

        let query = SharkBrainQuery {
            action: "sleep".into(),
            game_id: None,
            trigger: None,
            target: None,
            intensity: None,
        };
        assert!(query.into_request().is_err());
    }

    #[test]
    fn test_query_taunt_defaults() {
        let query = SharkBrainQuery {
            action: "taunt".into(),
            game_id: None,
            trigger: None,
            target: None,
            intensity: None,
        };
        match query.into_request().unwrap() {
            SharkBrainRequest::Taunt(req) => {
                assert_eq!(req.trigger, TauntTriggerDto::Idle);
                assert_eq!(req.intensity, 3);
            }
            other => panic!("unexpected request: {other:?}"),
        }
    }
}
