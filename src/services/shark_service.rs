//! Orchestration behind the shark brain endpoint: decisions, memory patches,
//! taunts, and usage stats.

use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;

use crate::{
    ai::{
        ActionKind, AiMode, DecisionContext, LlmRequest, SharkDecision, SwimmerContext, mock,
        prompt,
    },
    dto::{
        common::GamePhaseSnapshot,
        game::EventSummary,
        shark::{
            BrainStatsResponse, DecideRequest, MemoryUpdateResponse, SharkDecisionResponse,
            SharkMemorySummary, TauntRequest, TauntResponse,
        },
        sse::{SharkDecisionEvent, SharkTauntEvent},
    },
    error::ServiceError,
    state::{
        GameRoom, SharedState,
        game::{EventKind, EventRecord, SharkAction, TauntTrigger},
        state_machine::{ActivePhase, GameEvent, GamePhase},
        transitions::run_transition_with_broadcast,
    },
};

/// Aggression at which the shark stops picking targets and attacks everything.
const FRENZY_AGGRESSION: f32 = 0.8;

/// Decision shape the language model is asked to return.
#[derive(Debug, Deserialize)]
struct RawDecision {
    action: String,
    #[serde(default)]
    target: Option<String>,
    aggression: f32,
    reasoning: String,
    #[serde(default)]
    taunt: Option<String>,
}

impl RawDecision {
    fn from_decision(decision: SharkDecision) -> Self {
        Self {
            action: action_label(decision.action).to_owned(),
            target: decision.target.map(|id| id.to_string()),
            aggression: decision.aggression,
            reasoning: decision.reasoning,
            taunt: decision.taunt,
        }
    }

    /// Reconcile the model's answer with the actual water. A target the
    /// context does not contain is dropped, an unknown action falls back to
    /// the canned heuristic.
    fn into_decision(self, ctx: &DecisionContext) -> SharkDecision {
        let Some(action) = parse_action(&self.action) else {
            debug!(action = %self.action, "unknown shark action from upstream; using heuristic");
            return mock::decide(ctx);
        };

        let target = self
            .target
            .as_deref()
            .and_then(|raw| raw.parse::<Uuid>().ok())
            .and_then(|id| {
                ctx.swimmers
                    .iter()
                    .find(|swimmer| swimmer.id == Some(id))
            });

        SharkDecision {
            action,
            target: target.and_then(|swimmer| swimmer.id),
            target_name: target.map(|swimmer| swimmer.name.clone()),
            aggression: self.aggression.clamp(0.0, 1.0),
            reasoning: self.reasoning,
            taunt: self.taunt.filter(|line| !line.trim().is_empty()),
        }
    }
}

fn parse_action(raw: &str) -> Option<SharkAction> {
    match raw.trim().to_lowercase().as_str() {
        "patrol" => Some(SharkAction::Patrol),
        "stalk" => Some(SharkAction::Stalk),
        "circle" => Some(SharkAction::Circle),
        "attack" => Some(SharkAction::Attack),
        "retreat" => Some(SharkAction::Retreat),
        _ => None,
    }
}

fn action_label(action: SharkAction) -> &'static str {
    match action {
        SharkAction::Patrol => "patrol",
        SharkAction::Stalk => "stalk",
        SharkAction::Circle => "circle",
        SharkAction::Attack => "attack",
        SharkAction::Retreat => "retreat",
    }
}

fn trigger_label(trigger: TauntTrigger) -> &'static str {
    match trigger {
        TauntTrigger::Spotted => "the shark just spotted a swimmer",
        TauntTrigger::Missed => "the shark just missed its strike",
        TauntTrigger::Struck => "the shark just landed a hit",
        TauntTrigger::PlayerEscaped => "the prey made it back to the sand",
        TauntTrigger::ObjectiveDone => "the swimmers just finished an objective",
        TauntTrigger::Idle => "nothing has happened for a while",
    }
}

/// Ask the brain for the shark's next move.
///
/// With a `game_id` the context is built from the live session and the
/// decision is applied to it, possibly moving the phase machine. With an
/// inline context the decision is returned without touching any room.
pub async fn decide(
    state: &SharedState,
    request: DecideRequest,
) -> Result<(SharkDecisionResponse, AiMode), ServiceError> {
    state.ai().count_action(ActionKind::Decide);

    if let Some(game_id) = request.game_id {
        let room = state.require_room(game_id)?;
        if !matches!(room.phase().await, GamePhase::Active(_)) {
            return Err(ServiceError::InvalidState(
                "the shark only thinks while a round is running".into(),
            ));
        }

        let ctx = context_from_room(&room).await;
        let (decision, mode) = generate_decision(state, &ctx).await;
        let phase = apply_decision(&room, &decision).await?;

        let mut response = SharkDecisionResponse::from(&decision);
        response.phase = Some(GamePhaseSnapshot::from_phase(game_id, &phase));
        return Ok((response, mode));
    }

    let ctx: DecisionContext = request
        .context
        .as_ref()
        .map(Into::into)
        .ok_or_else(|| ServiceError::InvalidInput("a game_id or inline context is required".into()))?;
    let (decision, mode) = generate_decision(state, &ctx).await;
    Ok((SharkDecisionResponse::from(&decision), mode))
}

/// Patch what the shark remembers about one swimmer.
pub async fn update_memory(
    state: &SharedState,
    request: crate::dto::shark::UpdateMemoryRequest,
) -> Result<MemoryUpdateResponse, ServiceError> {
    state.ai().count_action(ActionKind::UpdateMemory);
    let room = state.require_room(request.game_id)?;

    let memory = room
        .with_session(|session| {
            if !session.players.contains_key(&request.player_id) {
                return Err(ServiceError::NotFound(format!(
                    "unknown player {}",
                    request.player_id
                )));
            }
            let memory = session.shark.memory_mut(request.player_id);
            memory.merge(&(&request.patch).into());
            let summary = SharkMemorySummary::from(&*memory);
            session.touch();
            Ok(summary)
        })
        .await?;

    Ok(MemoryUpdateResponse {
        player_id: request.player_id,
        memory,
    })
}

/// Generate a shark one-liner for a game moment, optionally logging it into a
/// session.
pub async fn taunt(
    state: &SharedState,
    request: TauntRequest,
) -> Result<(TauntResponse, AiMode), ServiceError> {
    state.ai().count_action(ActionKind::Taunt);

    let trigger: TauntTrigger = request.trigger.into();
    let target = request.target.as_deref();
    let intensity = request.intensity;

    let llm_request = LlmRequest {
        system: prompt::SHARK_TAUNT_SYSTEM.into(),
        user: prompt::render_template(
            prompt::SHARK_TAUNT_USER,
            &[
                ("trigger", trigger_label(trigger)),
                ("target", target.unwrap_or("no one in particular")),
                ("intensity", &intensity.to_string()),
            ],
        ),
        max_tokens: 80,
        temperature: 0.9,
    };
    let outcome = state
        .ai()
        .generate_text_or(&llm_request, || mock::taunt(trigger, target, intensity))
        .await;

    if let Some(game_id) = request.game_id {
        let room = state.require_room(game_id)?;
        record_taunt(&room, &request, &outcome.text).await;
    }

    Ok((
        TauntResponse {
            trigger: request.trigger,
            intensity,
            taunt: outcome.text,
        },
        outcome.mode,
    ))
}

/// Point-in-time usage snapshot of the brain.
pub fn stats(state: &SharedState) -> BrainStatsResponse {
    state.ai().stats().into()
}

async fn record_taunt(room: &GameRoom, request: &TauntRequest, line: &str) {
    let event_summary = room
        .with_session(|session| {
            let event = EventRecord::new(
                EventKind::SharkTaunt,
                line.to_owned(),
                None,
                request.intensity,
            );
            let summary = EventSummary::from(&event);
            session.record_event(event);
            summary
        })
        .await;

    crate::services::sse_events::broadcast_shark_taunt(
        room,
        &SharkTauntEvent {
            trigger: request.trigger,
            intensity: request.intensity,
            taunt: line.to_owned(),
        },
    );
    crate::services::sse_events::broadcast_event_recorded(room, event_summary);
}

/// Build the decision context out of a live session.
async fn context_from_room(room: &GameRoom) -> DecisionContext {
    room.read_session(|session| DecisionContext {
        shark_position: session.shark.position,
        aggression: session.shark.aggression(),
        swimmers: session
            .swimmers()
            .map(|player| {
                let memory = session.shark.memories.get(&player.id);
                SwimmerContext {
                    id: Some(player.id),
                    name: player.name.clone(),
                    position: player.position,
                    health: player.health(),
                    noise: memory.map(|m| m.noise_level).unwrap_or(0.0),
                    threat: memory.map(|m| m.threat_score).unwrap_or(0.0),
                }
            })
            .collect(),
    })
    .await
}

async fn generate_decision(state: &SharedState, ctx: &DecisionContext) -> (SharkDecision, AiMode) {
    let swimmers_formatted = if ctx.swimmers.is_empty() {
        "- nobody is in the water".to_owned()
    } else {
        ctx.swimmers
            .iter()
            .map(|swimmer| {
                format!(
                    "- {} (id {}) at ({:.0}, {:.0}), health {}, noise {:.2}",
                    swimmer.name,
                    swimmer
                        .id
                        .map(|id| id.to_string())
                        .unwrap_or_else(|| "unknown".into()),
                    swimmer.position.x,
                    swimmer.position.y,
                    swimmer.health,
                    swimmer.noise,
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    };
    let memories_formatted = if ctx.swimmers.iter().all(|swimmer| swimmer.threat == 0.0) {
        "- nothing yet".to_owned()
    } else {
        ctx.swimmers
            .iter()
            .filter(|swimmer| swimmer.threat > 0.0)
            .map(|swimmer| format!("- {}: threat {:.2}", swimmer.name, swimmer.threat))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let llm_request = LlmRequest {
        system: prompt::SHARK_DECIDE_SYSTEM.into(),
        user: prompt::render_template(
            prompt::SHARK_DECIDE_USER,
            &[
                (
                    "shark_position",
                    &format!("({:.0}, {:.0})", ctx.shark_position.x, ctx.shark_position.y),
                ),
                ("aggression", &format!("{:.2}", ctx.aggression)),
                ("swimmers_formatted", &swimmers_formatted),
                ("memories_formatted", &memories_formatted),
            ],
        ),
        max_tokens: 200,
        temperature: 0.7,
    };

    let (raw, mode) = state
        .ai()
        .generate_structured_or(&llm_request, || {
            RawDecision::from_decision(mock::decide(ctx))
        })
        .await;
    (raw.into_decision(ctx), mode)
}

/// Write a decision into the session and move the phase machine when the
/// shark's mood calls for it.
async fn apply_decision(
    room: &Arc<GameRoom>,
    decision: &SharkDecision,
) -> Result<GamePhase, ServiceError> {
    let phase = room.phase().await;
    match plan_phase_event(&phase, decision) {
        Some(event) => {
            run_transition_with_broadcast(room, event, || async {
                record_decision(room, decision).await;
                Ok(())
            })
            .await?;
        }
        None => record_decision(room, decision).await,
    }
    Ok(room.phase().await)
}

/// Pick the phase event a decision implies, if any.
fn plan_phase_event(phase: &GamePhase, decision: &SharkDecision) -> Option<GameEvent> {
    let GamePhase::Active(active) = phase else {
        return None;
    };
    let hunting = matches!(
        decision.action,
        SharkAction::Stalk | SharkAction::Circle | SharkAction::Attack
    );

    if hunting
        && decision.aggression >= FRENZY_AGGRESSION
        && !matches!(active, ActivePhase::Frenzy)
    {
        return Some(GameEvent::SharkFrenzies);
    }
    if hunting {
        if let Some(target) = decision.target {
            let already_hunted = matches!(active, ActivePhase::Alert { target: t } if *t == target);
            if !already_hunted && !matches!(active, ActivePhase::Frenzy) {
                return Some(GameEvent::SharkHunts { target });
            }
        }
    }
    if matches!(decision.action, SharkAction::Patrol | SharkAction::Retreat)
        && !matches!(active, ActivePhase::Calm)
    {
        return Some(GameEvent::WatersCalm);
    }
    None
}

async fn record_decision(room: &GameRoom, decision: &SharkDecision) {
    let event_summary = room
        .with_session(|session| {
            session.shark.action = decision.action;
            session.shark.target = decision.target;
            session.shark.set_aggression(decision.aggression);
            if let Some(target) = decision.target {
                if let Some(player) = session.players.get(&target) {
                    let at = player.position;
                    session.shark.note_encounter(target, at);
                }
            }

            let intensity = match decision.action {
                SharkAction::Attack => 4,
                SharkAction::Stalk | SharkAction::Circle => 3,
                SharkAction::Patrol | SharkAction::Retreat => 2,
            };
            let event = EventRecord::new(
                EventKind::SharkDecision,
                decision.reasoning.clone(),
                decision.target,
                intensity,
            );
            let summary = EventSummary::from(&event);
            session.record_event(event);
            summary
        })
        .await;

    crate::services::sse_events::broadcast_shark_decision(
        room,
        &SharkDecisionEvent {
            action: decision.action.into(),
            target_player: decision.target,
            aggression: decision.aggression,
            reasoning: decision.reasoning.clone(),
            taunt: decision.taunt.clone(),
        },
    );
    crate::services::sse_events::broadcast_event_recorded(room, event_summary);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AppConfig,
        dto::{
            game::{CreateGameRequest, JoinGameRequest},
            shark::{
                DecisionContextInput, SharkBrainQuery, SharkContextInput, SharkMemoryPatchInput,
                SwimmerContextInput, TauntTriggerDto, UpdateMemoryRequest,
            },
        },
        services::game_service,
        state::AppState,
        state::game::Vec2,
    };

    async fn started_game(state: &SharedState) -> (Uuid, Uuid) {
        let summary = game_service::create_game(
            state,
            CreateGameRequest {
                name: "sandy-cove".into(),
                host_name: "ada".into(),
                objectives: None,
            },
        )
        .await
        .expect("create");
        game_service::start_game(state, summary.id, summary.host_player)
            .await
            .expect("start");
        (summary.id, summary.host_player)
    }

    fn inline_context(aggression: f32) -> DecisionContextInput {
        DecisionContextInput {
            shark: SharkContextInput {
                position: Vec2 { x: 160.0, y: 200.0 }.into(),
                aggression,
            },
            swimmers: vec![SwimmerContextInput {
                id: Some(Uuid::new_v4()),
                name: "ada".into(),
                position: Vec2 { x: 165.0, y: 195.0 }.into(),
                health: 20,
                noise: 0.9,
                threat: 0.4,
            }],
        }
    }

    #[tokio::test]
    async fn inline_decide_answers_without_a_room() {
        let state = AppState::new(AppConfig::default()).expect("state");
        let (response, mode) = decide(
            &state,
            DecideRequest {
                game_id: None,
                context: Some(inline_context(0.7)),
            },
        )
        .await
        .unwrap();

        assert_eq!(mode, AiMode::Mock);
        assert!(response.phase.is_none());
        assert!(response.target_name.is_some());
    }

    #[tokio::test]
    async fn decide_against_a_lobby_is_rejected() {
        let state = AppState::new(AppConfig::default()).expect("state");
        let summary = game_service::create_game(
            &state,
            CreateGameRequest {
                name: "sandy-cove".into(),
                host_name: "ada".into(),
                objectives: None,
            },
        )
        .await
        .unwrap();

        let err = decide(
            &state,
            DecideRequest {
                game_id: Some(summary.id),
                context: None,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
    }

    #[tokio::test]
    async fn decide_applies_to_the_session_and_reports_the_phase() {
        let state = AppState::new(AppConfig::default()).expect("state");
        let (game_id, host_id) = started_game(&state).await;

        // Make the host an obvious target so the heuristic hunts.
        game_service::update_player_state(
            &state,
            game_id,
            host_id,
            crate::dto::game::UpdatePlayerStateRequest {
                position: Some(Vec2 { x: 160.0, y: 205.0 }.into()),
                health_delta: Some(-70),
            },
        )
        .await
        .unwrap();
        let room = state.room(game_id).unwrap();
        room.with_session(|session| session.shark.note_noise(host_id, 1.0))
            .await;

        let (response, _) = decide(
            &state,
            DecideRequest {
                game_id: Some(game_id),
                context: None,
            },
        )
        .await
        .unwrap();

        assert!(response.phase.is_some());
        let summary = game_service::get_game(&state, game_id).await.unwrap();
        assert_eq!(summary.shark.action, response.action);
    }

    #[tokio::test]
    async fn raw_decision_drops_targets_the_water_does_not_hold() {
        let ctx: DecisionContext = (&inline_context(0.5)).into();
        let raw = RawDecision {
            action: "attack".into(),
            target: Some(Uuid::new_v4().to_string()),
            aggression: 1.4,
            reasoning: "made up".into(),
            taunt: Some("  ".into()),
        };
        let decision = raw.into_decision(&ctx);

        assert_eq!(decision.action, SharkAction::Attack);
        assert!(decision.target.is_none());
        assert_eq!(decision.aggression, 1.0);
        assert!(decision.taunt.is_none());
    }

    #[tokio::test]
    async fn raw_decision_with_unknown_action_falls_back_to_the_heuristic() {
        let ctx: DecisionContext = (&inline_context(0.7)).into();
        let raw = RawDecision {
            action: "breach".into(),
            target: None,
            aggression: 0.5,
            reasoning: "made up".into(),
            taunt: None,
        };
        let decision = raw.into_decision(&ctx);
        assert!(parse_action(action_label(decision.action)).is_some());
        assert!(!decision.reasoning.contains("made up"));
    }

    #[test]
    fn frenzy_needs_high_aggression_and_a_hunt() {
        let calm = GamePhase::Active(ActivePhase::Calm);
        let decision = SharkDecision {
            action: SharkAction::Attack,
            target: Some(Uuid::new_v4()),
            target_name: Some("ada".into()),
            aggression: 0.9,
            reasoning: "hungry".into(),
            taunt: None,
        };
        assert!(matches!(
            plan_phase_event(&calm, &decision),
            Some(GameEvent::SharkFrenzies)
        ));

        let mellow = SharkDecision {
            aggression: 0.5,
            ..decision.clone()
        };
        assert!(matches!(
            plan_phase_event(&calm, &mellow),
            Some(GameEvent::SharkHunts { .. })
        ));
    }

    #[test]
    fn calming_down_only_fires_outside_calm() {
        let retreat = SharkDecision {
            action: SharkAction::Retreat,
            target: None,
            target_name: None,
            aggression: 0.2,
            reasoning: "tired".into(),
            taunt: None,
        };
        let calm = GamePhase::Active(ActivePhase::Calm);
        assert!(plan_phase_event(&calm, &retreat).is_none());

        let frenzy = GamePhase::Active(ActivePhase::Frenzy);
        assert!(matches!(
            plan_phase_event(&frenzy, &retreat),
            Some(GameEvent::WatersCalm)
        ));
    }

    #[tokio::test]
    async fn memory_update_merges_and_answers_the_new_record() {
        let state = AppState::new(AppConfig::default()).expect("state");
        let (game_id, host_id) = started_game(&state).await;

        let response = update_memory(
            &state,
            UpdateMemoryRequest {
                game_id,
                player_id: host_id,
                patch: SharkMemoryPatchInput {
                    encounters: Some(3),
                    strikes_landed: Some(1),
                    escapes: None,
                    noise_level: Some(0.6),
                    last_seen: None,
                },
            },
        )
        .await
        .unwrap();

        assert_eq!(response.memory.encounters, 3);
        assert!(response.memory.threat_score > 0.0);
    }

    #[tokio::test]
    async fn memory_update_for_a_stranger_is_not_found() {
        let state = AppState::new(AppConfig::default()).expect("state");
        let (game_id, _) = started_game(&state).await;

        let err = update_memory(
            &state,
            UpdateMemoryRequest {
                game_id,
                player_id: Uuid::new_v4(),
                patch: SharkMemoryPatchInput {
                    encounters: Some(1),
                    strikes_landed: None,
                    escapes: None,
                    noise_level: None,
                    last_seen: None,
                },
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn taunt_logs_into_the_session_when_a_game_is_named() {
        let state = AppState::new(AppConfig::default()).expect("state");
        let (game_id, _) = started_game(&state).await;

        let (response, mode) = taunt(
            &state,
            TauntRequest {
                trigger: TauntTriggerDto::Struck,
                target: Some("ada".into()),
                intensity: 4,
                game_id: Some(game_id),
            },
        )
        .await
        .unwrap();

        assert_eq!(mode, AiMode::Mock);
        assert!(response.taunt.contains("ada"));

        let summary = game_service::get_game(&state, game_id).await.unwrap();
        assert!(summary
            .events
            .iter()
            .any(|event| event.message == response.taunt));
    }

    #[tokio::test]
    async fn stats_reflect_the_served_operations() {
        let state = AppState::new(AppConfig::default()).expect("state");
        let _ = decide(
            &state,
            DecideRequest {
                game_id: None,
                context: Some(inline_context(0.3)),
            },
        )
        .await
        .unwrap();
        let _ = taunt(
            &state,
            TauntRequest {
                trigger: TauntTriggerDto::Idle,
                target: None,
                intensity: 2,
                game_id: None,
            },
        )
        .await
        .unwrap();

        let stats = stats(&state);
        assert_eq!(stats.mode, "mock");
        assert_eq!(stats.actions.decide, 1);
        assert_eq!(stats.actions.taunt, 1);
        assert_eq!(stats.mock_served, 2);
    }

    #[test]
    fn query_round_trips_into_the_request_enum() {
        let query = SharkBrainQuery {
            action: "decide".into(),
            game_id: Some(Uuid::new_v4()),
            trigger: None,
            target: None,
            intensity: None,
        };
        assert!(query.into_request().is_ok());
    }

    #[tokio::test]
    async fn two_swimmers_share_the_water_in_context() {
        let state = AppState::new(AppConfig::default()).expect("state");
        let summary = game_service::create_game(
            &state,
            CreateGameRequest {
                name: "sandy-cove".into(),
                host_name: "ada".into(),
                objectives: None,
            },
        )
        .await
        .unwrap();
        game_service::join_game(&state, summary.id, JoinGameRequest { name: "kai".into() })
            .await
            .unwrap();

        let room = state.room(summary.id).unwrap();
        let ctx = context_from_room(&room).await;
        assert_eq!(ctx.swimmers.len(), 2);
        assert!(ctx.swimmers.iter().all(|swimmer| swimmer.id.is_some()));
    }
}
