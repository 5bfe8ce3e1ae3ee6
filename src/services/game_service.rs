use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::{
    dto::game::{
        CreateGameRequest, EventSummary, GameListItem, GameSummary, GamesResponse,
        JoinGameRequest, JoinGameResponse, ObjectiveSummary, PlayerActionRequest, PlayerSummary,
        UpdatePlayerStateRequest,
    },
    error::ServiceError,
    services::sse_events,
    state::{
        GameRoom, SharedState,
        game::{
            EventKind, EventRecord, GameSession, MAX_PLAYERS, Objective, ObjectiveKind, Player,
            PlayerActionKind, PlayerStatus, Vec2, default_roster,
        },
        state_machine::{FinishReason, GameEvent, GamePhase},
        transitions::run_transition_with_broadcast,
    },
};

/// Points for pulling a downed swimmer back up.
const RESCUE_SCORE: u32 = 25;
/// Points for grabbing a shell.
const SHELL_SCORE: u32 = 10;

/// Open a brand-new beach lobby with the requesting player as host.
pub async fn create_game(
    state: &SharedState,
    request: CreateGameRequest,
) -> Result<GameSummary, ServiceError> {
    let CreateGameRequest {
        name,
        host_name,
        objectives,
    } = request;

    let host = Player::new(host_name.trim().to_owned());
    let objectives = match objectives {
        Some(inputs) => inputs
            .into_iter()
            .map(|input| Objective::new(input.description, input.kind.into(), input.target))
            .collect(),
        None => default_objectives(),
    };

    let session = GameSession::new(name.trim().to_owned(), host, objectives, default_roster());
    let room = GameRoom::new(session);
    let phase = room.phase().await;
    let summary = room
        .read_session(|session| GameSummary::project(session, (&phase).into()))
        .await;

    info!(game = %room.id(), name = %summary.name, "created game");
    state.insert_room(room);

    Ok(summary)
}

/// List the rooms currently held in memory.
pub async fn list_games(state: &SharedState) -> GamesResponse {
    let mut games = Vec::new();
    for room in state.list_rooms() {
        let phase = room.phase().await;
        let item = room
            .read_session(|session| GameListItem {
                id: session.id,
                name: session.name.clone(),
                phase: (&phase).into(),
                player_count: session
                    .players
                    .values()
                    .filter(|player| player.status != PlayerStatus::Left)
                    .count(),
                created_at: crate::dto::format_system_time(session.created_at),
            })
            .await;
        games.push(item);
    }
    GamesResponse { games }
}

/// Full snapshot of one room.
pub async fn get_game(state: &SharedState, id: Uuid) -> Result<GameSummary, ServiceError> {
    let room = state.require_room(id)?;
    Ok(summarize(&room).await)
}

/// Add a player to a room during the lobby or while the round runs.
pub async fn join_game(
    state: &SharedState,
    id: Uuid,
    request: JoinGameRequest,
) -> Result<JoinGameResponse, ServiceError> {
    let room = state.require_room(id)?;

    match room.phase().await {
        GamePhase::Lobby | GamePhase::Active(_) => {}
        GamePhase::Ended(_) => {
            return Err(ServiceError::InvalidState(
                "the round is over; wait for the host to reset".into(),
            ));
        }
    }

    let player = Player::new(request.name.trim().to_owned());
    let player_id = player.id;

    let summary = room
        .with_session(|session| {
            let active = session
                .players
                .values()
                .filter(|player| player.status != PlayerStatus::Left)
                .count();
            if active >= MAX_PLAYERS {
                return Err(ServiceError::InvalidState(format!(
                    "game is full ({MAX_PLAYERS} players)"
                )));
            }
            if session
                .players
                .values()
                .any(|existing| existing.status != PlayerStatus::Left && existing.name == player.name)
            {
                return Err(ServiceError::InvalidInput(format!(
                    "name `{}` is already taken",
                    player.name
                )));
            }

            let projected = PlayerSummary::from(&player);
            let event = EventRecord::new(
                EventKind::PlayerJoined,
                format!("{} wades into the water", player.name),
                Some(player_id),
                1,
            );
            session.players.insert(player_id, player);
            let event_summary = EventSummary::from(&event);
            session.record_event(event);
            Ok((projected, event_summary))
        })
        .await;

    let (projected, event_summary) = summary?;
    sse_events::broadcast_player_joined(&room, projected);
    sse_events::broadcast_event_recorded(&room, event_summary);
    info!(game = %id, player = %player_id, "player joined");

    Ok(JoinGameResponse {
        player_id,
        game: summarize(&room).await,
    })
}

/// Host starts the round; the shark enters the water.
pub async fn start_game(
    state: &SharedState,
    id: Uuid,
    requested_by: Uuid,
) -> Result<GameSummary, ServiceError> {
    let room = state.require_room(id)?;
    ensure_host(&room, requested_by).await?;

    run_transition_with_broadcast(&room, GameEvent::StartGame, || async {
        let event_summary = room
            .with_session(|session| {
                let event = EventRecord::new(
                    EventKind::PhaseChanged,
                    "A fin cuts the surface. The round begins.".into(),
                    None,
                    3,
                );
                let summary = EventSummary::from(&event);
                session.record_event(event);
                summary
            })
            .await;
        sse_events::broadcast_event_recorded(&room, event_summary);
        Ok(())
    })
    .await?;

    info!(game = %id, "game started");
    Ok(summarize(&room).await)
}

/// Outcome of a player state patch, reported back to the route layer.
struct StatePatchOutcome {
    player: PlayerSummary,
    downed_event: Option<EventSummary>,
    nobody_swimming: bool,
}

/// Apply a movement and/or health patch to one swimmer.
pub async fn update_player_state(
    state: &SharedState,
    id: Uuid,
    player_id: Uuid,
    request: UpdatePlayerStateRequest,
) -> Result<PlayerSummary, ServiceError> {
    let room = state.require_room(id)?;
    ensure_active(&room).await?;

    let outcome = room
        .with_session(|session| {
            let player = session
                .players
                .get_mut(&player_id)
                .ok_or_else(|| ServiceError::NotFound(format!("unknown player {player_id}")))?;
            if player.status == PlayerStatus::Left {
                return Err(ServiceError::InvalidState(
                    "player has left the game".into(),
                ));
            }

            let was_swimming = player.status == PlayerStatus::Swimming;
            if let Some(position) = request.position {
                player.position = Vec2::from(position).clamped_to_arena();
            }
            if let Some(delta) = request.health_delta {
                player.apply_health_delta(delta);
            }

            let downed = was_swimming && player.status == PlayerStatus::Downed;
            let projected = PlayerSummary::from(&*player);
            let name = player.name.clone();

            let downed_event = downed.then(|| {
                let event = EventRecord::new(
                    EventKind::PlayerDowned,
                    format!("{name} slips under the surface"),
                    Some(player_id),
                    4,
                );
                let summary = EventSummary::from(&event);
                session.record_event(event);
                summary
            });

            session.touch();
            Ok(StatePatchOutcome {
                player: projected,
                downed_event,
                nobody_swimming: session.no_swimmers_left(),
            })
        })
        .await?;

    sse_events::broadcast_player_updated(&room, outcome.player.clone());
    if let Some(event_summary) = outcome.downed_event {
        sse_events::broadcast_event_recorded(&room, event_summary);
    }
    if outcome.nobody_swimming {
        finish_game(&room, FinishReason::AllSwimmersDown).await?;
    }

    Ok(outcome.player)
}

/// Everything one gameplay action changed, gathered under the session lock.
struct ActionOutcome {
    actor: PlayerSummary,
    rescued: Option<PlayerSummary>,
    action_event: EventSummary,
    followup_events: Vec<EventSummary>,
    objectives: Vec<ObjectiveSummary>,
    objectives_complete: bool,
}

/// Record a gameplay action for one swimmer and apply its consequences.
pub async fn perform_action(
    state: &SharedState,
    id: Uuid,
    player_id: Uuid,
    request: PlayerActionRequest,
) -> Result<EventSummary, ServiceError> {
    let room = state.require_room(id)?;
    ensure_active(&room).await?;

    let kind: PlayerActionKind = request.action.into();
    let outcome = room
        .with_session(|session| apply_action(session, player_id, kind, request.target_player))
        .await?;

    sse_events::broadcast_player_updated(&room, outcome.actor.clone());
    if let Some(rescued) = outcome.rescued {
        sse_events::broadcast_player_updated(&room, rescued);
    }
    for objective in outcome.objectives {
        sse_events::broadcast_objective_updated(&room, objective);
    }
    sse_events::broadcast_event_recorded(&room, outcome.action_event.clone());
    for event in outcome.followup_events {
        sse_events::broadcast_event_recorded(&room, event);
    }

    if outcome.objectives_complete {
        finish_game(&room, FinishReason::ObjectivesComplete).await?;
    }

    Ok(outcome.action_event)
}

fn apply_action(
    session: &mut GameSession,
    player_id: Uuid,
    kind: PlayerActionKind,
    target_player: Option<Uuid>,
) -> Result<ActionOutcome, ServiceError> {
    let actor = session
        .players
        .get(&player_id)
        .ok_or_else(|| ServiceError::NotFound(format!("unknown player {player_id}")))?;
    if actor.status != PlayerStatus::Swimming {
        return Err(ServiceError::InvalidState(
            "only swimmers in the water can act".into(),
        ));
    }
    let actor_name = actor.name.clone();
    let actor_position = actor.position;

    let mut completed_descriptions = Vec::new();
    let mut rescued = None;

    let action_event = match kind {
        PlayerActionKind::Rescue => {
            let target_id = target_player.ok_or_else(|| {
                ServiceError::InvalidInput("a rescue requires a target_player".into())
            })?;
            let target = session
                .players
                .get_mut(&target_id)
                .ok_or_else(|| ServiceError::NotFound(format!("unknown player {target_id}")))?;
            if target.status != PlayerStatus::Downed {
                return Err(ServiceError::InvalidState(format!(
                    "{} does not need rescuing",
                    target.name
                )));
            }
            target.rescue();
            let target_name = target.name.clone();
            rescued = Some(PlayerSummary::from(&*target));

            if let Some(actor) = session.players.get_mut(&player_id) {
                actor.score += RESCUE_SCORE;
            }
            completed_descriptions = session.advance_objectives(ObjectiveKind::Rescue, 1);

            EventRecord::new(
                EventKind::PlayerRescued,
                format!("{actor_name} hauls {target_name} back to the sand"),
                Some(target_id),
                4,
            )
        }
        PlayerActionKind::CollectShell => {
            if let Some(actor) = session.players.get_mut(&player_id) {
                actor.score += SHELL_SCORE;
            }
            completed_descriptions = session.advance_objectives(ObjectiveKind::Collect, 1);

            EventRecord::new(
                EventKind::ActionPerformed,
                format!("{actor_name} scoops up a shell"),
                Some(player_id),
                1,
            )
        }
        PlayerActionKind::Splash
        | PlayerActionKind::Dive
        | PlayerActionKind::SwimBurst
        | PlayerActionKind::Wave
        | PlayerActionKind::TauntShark => {
            let description = match kind {
                PlayerActionKind::Splash => format!("{actor_name} splashes around loudly"),
                PlayerActionKind::Dive => format!("{actor_name} slips under the surface"),
                PlayerActionKind::SwimBurst => format!("{actor_name} sprints through the water"),
                PlayerActionKind::Wave => format!("{actor_name} waves towards the beach"),
                _ => format!("{actor_name} taunts the shark. Bold."),
            };
            let intensity = if kind == PlayerActionKind::TauntShark { 3 } else { 2 };
            EventRecord::new(EventKind::ActionPerformed, description, Some(player_id), intensity)
        }
    };

    // Every move the shark can hear feeds its memory of the actor.
    session.shark.note_noise(player_id, kind.noise_delta());
    if kind.noise_delta() > 0.0 {
        session.shark.note_encounter(player_id, actor_position);
    }

    let followups: Vec<EventRecord> = completed_descriptions
        .into_iter()
        .map(|description| {
            EventRecord::new(
                EventKind::ObjectiveComplete,
                format!("Objective complete: {description}"),
                Some(player_id),
                3,
            )
        })
        .collect();

    let action_summary = EventSummary::from(&action_event);
    let followup_summaries: Vec<EventSummary> = followups.iter().map(EventSummary::from).collect();
    session.record_event(action_event);
    for event in followups {
        session.record_event(event);
    }

    let objectives = session
        .objectives
        .iter()
        .filter(|objective| match kind {
            PlayerActionKind::Rescue => objective.kind == ObjectiveKind::Rescue,
            PlayerActionKind::CollectShell => objective.kind == ObjectiveKind::Collect,
            _ => false,
        })
        .map(ObjectiveSummary::from)
        .collect();

    let actor = session
        .players
        .get(&player_id)
        .map(PlayerSummary::from)
        .ok_or_else(|| ServiceError::NotFound(format!("unknown player {player_id}")))?;

    Ok(ActionOutcome {
        actor,
        rescued,
        action_event: action_summary,
        followup_events: followup_summaries,
        objectives,
        objectives_complete: session.objectives_complete(),
    })
}

/// Mark a player as gone; reap the room once nobody is left in it.
pub async fn leave_game(
    state: &SharedState,
    id: Uuid,
    player_id: Uuid,
) -> Result<(), ServiceError> {
    let room = state.require_room(id)?;

    let (event_summary, new_host, room_empty) = room
        .with_session(|session| {
            let player = session
                .players
                .get_mut(&player_id)
                .ok_or_else(|| ServiceError::NotFound(format!("unknown player {player_id}")))?;
            let name = player.name.clone();
            player.status = PlayerStatus::Left;

            let event = EventRecord::new(
                EventKind::PlayerLeft,
                format!("{name} heads back up the beach"),
                Some(player_id),
                1,
            );
            let summary = EventSummary::from(&event);
            session.record_event(event);

            let mut new_host = None;
            if session.host_player == player_id {
                new_host = session
                    .players
                    .values()
                    .find(|candidate| candidate.status != PlayerStatus::Left)
                    .map(|candidate| candidate.id);
                if let Some(host_id) = new_host {
                    session.host_player = host_id;
                }
            }

            let room_empty = session
                .players
                .values()
                .all(|player| player.status == PlayerStatus::Left);
            Ok::<_, ServiceError>((summary, new_host, room_empty))
        })
        .await?;

    sse_events::broadcast_player_left(&room, player_id);
    sse_events::broadcast_event_recorded(&room, event_summary);
    if let Some(host_id) = new_host {
        sse_events::broadcast_host_changed(&room, host_id);
    }

    if room_empty {
        info!(game = %id, "last player left; reaping room");
        sse_events::broadcast_game_removed(&room);
        state.remove_room(id);
        return Ok(());
    }

    // An exodus can leave nobody swimming while the round still runs.
    let nobody_swimming = room.read_session(GameSession::no_swimmers_left).await;
    if nobody_swimming && matches!(room.phase().await, GamePhase::Active(_)) {
        finish_game(&room, FinishReason::AllSwimmersDown).await?;
    }

    Ok(())
}

/// Host calls the round off early.
pub async fn end_game(
    state: &SharedState,
    id: Uuid,
    requested_by: Uuid,
) -> Result<GameSummary, ServiceError> {
    let room = state.require_room(id)?;
    ensure_host(&room, requested_by).await?;
    finish_game(&room, FinishReason::HostEnded).await?;
    Ok(summarize(&room).await)
}

/// Host resets a finished round back to the lobby: players and scores stay,
/// the board (shark, objectives, logs) starts over.
pub async fn reset_game(
    state: &SharedState,
    id: Uuid,
    requested_by: Uuid,
) -> Result<GameSummary, ServiceError> {
    let room = state.require_room(id)?;
    ensure_host(&room, requested_by).await?;

    run_transition_with_broadcast(&room, GameEvent::Reset, || async {
        room.with_session(|session| {
            session.shark = Default::default();
            for objective in &mut session.objectives {
                objective.progress = 0;
                objective.completed = false;
            }
            for player in session.players.values_mut() {
                if player.status != PlayerStatus::Left {
                    player.status = PlayerStatus::Swimming;
                    player.set_health(crate::state::game::MAX_HEALTH);
                }
            }
            session.events.clear();
            session.commentary.clear();
            session.touch();
        })
        .await;
        Ok(())
    })
    .await?;

    info!(game = %id, "game reset to lobby");
    Ok(summarize(&room).await)
}

/// Remove a finished room entirely.
pub async fn delete_game(state: &SharedState, id: Uuid) -> Result<(), ServiceError> {
    let room = state.require_room(id)?;
    if !matches!(room.phase().await, GamePhase::Ended(_)) {
        return Err(ServiceError::InvalidState(
            "only a finished game can be deleted".into(),
        ));
    }

    sse_events::broadcast_game_removed(&room);
    state.remove_room(id);
    info!(game = %id, "game deleted");
    Ok(())
}

/// Project a room into its public summary.
pub async fn summarize(room: &GameRoom) -> GameSummary {
    let phase = room.phase().await;
    room.read_session(|session| GameSummary::project(session, (&phase).into()))
        .await
}

async fn finish_game(room: &Arc<GameRoom>, reason: FinishReason) -> Result<(), ServiceError> {
    run_transition_with_broadcast(room, GameEvent::Finish(reason), || async {
        let event_summary = room
            .with_session(|session| {
                let message = match reason {
                    FinishReason::AllSwimmersDown => {
                        "The water goes quiet. The shark wins.".to_owned()
                    }
                    FinishReason::ObjectivesComplete => {
                        "Every objective is done. The swimmers win.".to_owned()
                    }
                    FinishReason::HostEnded => "The host calls everyone out of the water.".to_owned(),
                };
                let event = EventRecord::new(EventKind::PhaseChanged, message, None, 3);
                let summary = EventSummary::from(&event);
                session.record_event(event);
                summary
            })
            .await;
        sse_events::broadcast_event_recorded(room, event_summary);
        Ok(())
    })
    .await
}

async fn ensure_host(room: &GameRoom, requested_by: Uuid) -> Result<(), ServiceError> {
    let host = room.read_session(|session| session.host_player).await;
    if host != requested_by {
        return Err(ServiceError::Unauthorized(
            "only the host can do that".into(),
        ));
    }
    Ok(())
}

async fn ensure_active(room: &GameRoom) -> Result<(), ServiceError> {
    match room.phase().await {
        GamePhase::Active(_) => Ok(()),
        GamePhase::Lobby => Err(ServiceError::InvalidState(
            "the round has not started yet".into(),
        )),
        GamePhase::Ended(_) => Err(ServiceError::InvalidState("the round is over".into())),
    }
}

fn default_objectives() -> Vec<Objective> {
    vec![
        Objective::new("Collect 5 shells".into(), ObjectiveKind::Collect, 5),
        Objective::new("Rescue a downed swimmer".into(), ObjectiveKind::Rescue, 1),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::AppConfig, dto::game::PlayerActionDto, state::AppState};

    async fn state_with_game() -> (SharedState, Uuid, Uuid) {
        let state = AppState::new(AppConfig::default()).expect("state");
        let summary = create_game(
            &state,
            CreateGameRequest {
                name: "sandy-cove".into(),
                host_name: "ada".into(),
                objectives: Some(vec![crate::dto::game::ObjectiveInput {
                    description: "Collect 2 shells".into(),
                    kind: crate::dto::game::ObjectiveKindDto::Collect,
                    target: 2,
                }]),
            },
        )
        .await
        .expect("create");
        let host_id = summary.host_player;
        (state, summary.id, host_id)
    }

    #[tokio::test]
    async fn create_then_get_round_trips() {
        let (state, game_id, _) = state_with_game().await;
        let fetched = get_game(&state, game_id).await.unwrap();
        assert_eq!(fetched.name, "sandy-cove");
        assert_eq!(fetched.players.len(), 1);
        assert_eq!(fetched.npcs.len(), 4);
    }

    #[tokio::test]
    async fn join_rejects_duplicate_names_and_full_rooms() {
        let (state, game_id, _) = state_with_game().await;

        join_game(&state, game_id, JoinGameRequest { name: "kai".into() })
            .await
            .unwrap();
        let err = join_game(&state, game_id, JoinGameRequest { name: "kai".into() })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));

        for index in 2..MAX_PLAYERS {
            join_game(
                &state,
                game_id,
                JoinGameRequest {
                    name: format!("swimmer-{index}"),
                },
            )
            .await
            .unwrap();
        }
        let err = join_game(&state, game_id, JoinGameRequest { name: "late".into() })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
    }

    #[tokio::test]
    async fn only_the_host_can_start() {
        let (state, game_id, host_id) = state_with_game().await;
        let joined = join_game(&state, game_id, JoinGameRequest { name: "kai".into() })
            .await
            .unwrap();

        let err = start_game(&state, game_id, joined.player_id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));

        let summary = start_game(&state, game_id, host_id).await.unwrap();
        assert_eq!(summary.phase, crate::dto::phase::VisibleGamePhase::Calm);
    }

    #[tokio::test]
    async fn state_patch_requires_a_running_round() {
        let (state, game_id, host_id) = state_with_game().await;
        let err = update_player_state(
            &state,
            game_id,
            host_id,
            UpdatePlayerStateRequest {
                position: None,
                health_delta: Some(-10),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
    }

    #[tokio::test]
    async fn last_swimmer_down_ends_the_round() {
        let (state, game_id, host_id) = state_with_game().await;
        start_game(&state, game_id, host_id).await.unwrap();

        update_player_state(
            &state,
            game_id,
            host_id,
            UpdatePlayerStateRequest {
                position: None,
                health_delta: Some(-200),
            },
        )
        .await
        .unwrap();

        let summary = get_game(&state, game_id).await.unwrap();
        assert_eq!(summary.phase, crate::dto::phase::VisibleGamePhase::Ended);
    }

    #[tokio::test]
    async fn collecting_shells_completes_objectives_and_the_round() {
        let (state, game_id, host_id) = state_with_game().await;
        start_game(&state, game_id, host_id).await.unwrap();

        for _ in 0..2 {
            perform_action(
                &state,
                game_id,
                host_id,
                PlayerActionRequest {
                    action: PlayerActionDto::CollectShell,
                    target_player: None,
                },
            )
            .await
            .unwrap();
        }

        let summary = get_game(&state, game_id).await.unwrap();
        assert!(summary.objectives[0].completed);
        assert_eq!(summary.phase, crate::dto::phase::VisibleGamePhase::Ended);
        let host = summary
            .players
            .iter()
            .find(|player| player.id == host_id)
            .unwrap();
        assert_eq!(host.score, 2 * SHELL_SCORE);
    }

    #[tokio::test]
    async fn rescue_revives_the_target_and_credits_the_rescuer() {
        let (state, game_id, host_id) = state_with_game().await;
        let joined = join_game(&state, game_id, JoinGameRequest { name: "kai".into() })
            .await
            .unwrap();
        start_game(&state, game_id, host_id).await.unwrap();

        update_player_state(
            &state,
            game_id,
            joined.player_id,
            UpdatePlayerStateRequest {
                position: None,
                health_delta: Some(-200),
            },
        )
        .await
        .unwrap();

        perform_action(
            &state,
            game_id,
            host_id,
            PlayerActionRequest {
                action: PlayerActionDto::Rescue,
                target_player: Some(joined.player_id),
            },
        )
        .await
        .unwrap();

        let summary = get_game(&state, game_id).await.unwrap();
        let rescued = summary
            .players
            .iter()
            .find(|player| player.id == joined.player_id)
            .unwrap();
        assert_eq!(rescued.status, crate::dto::game::PlayerStatusDto::Rescued);
        let host = summary
            .players
            .iter()
            .find(|player| player.id == host_id)
            .unwrap();
        assert_eq!(host.score, RESCUE_SCORE);
    }

    #[tokio::test]
    async fn rescue_without_a_downed_target_is_rejected() {
        let (state, game_id, host_id) = state_with_game().await;
        let joined = join_game(&state, game_id, JoinGameRequest { name: "kai".into() })
            .await
            .unwrap();
        start_game(&state, game_id, host_id).await.unwrap();

        let err = perform_action(
            &state,
            game_id,
            host_id,
            PlayerActionRequest {
                action: PlayerActionDto::Rescue,
                target_player: Some(joined.player_id),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
    }

    #[tokio::test]
    async fn leave_migrates_the_host_and_reaps_empty_rooms() {
        let (state, game_id, host_id) = state_with_game().await;
        let joined = join_game(&state, game_id, JoinGameRequest { name: "kai".into() })
            .await
            .unwrap();

        leave_game(&state, game_id, host_id).await.unwrap();
        let summary = get_game(&state, game_id).await.unwrap();
        assert_eq!(summary.host_player, joined.player_id);

        leave_game(&state, game_id, joined.player_id).await.unwrap();
        assert!(state.room(game_id).is_none());
    }

    #[tokio::test]
    async fn delete_requires_a_finished_game() {
        let (state, game_id, host_id) = state_with_game().await;
        let err = delete_game(&state, game_id).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));

        start_game(&state, game_id, host_id).await.unwrap();
        end_game(&state, game_id, host_id).await.unwrap();
        delete_game(&state, game_id).await.unwrap();
        assert!(state.room(game_id).is_none());
    }

    #[tokio::test]
    async fn reset_clears_the_board_but_keeps_scores() {
        let (state, game_id, host_id) = state_with_game().await;
        start_game(&state, game_id, host_id).await.unwrap();
        perform_action(
            &state,
            game_id,
            host_id,
            PlayerActionRequest {
                action: PlayerActionDto::CollectShell,
                target_player: None,
            },
        )
        .await
        .unwrap();
        end_game(&state, game_id, host_id).await.unwrap();

        let summary = reset_game(&state, game_id, host_id).await.unwrap();
        assert_eq!(summary.phase, crate::dto::phase::VisibleGamePhase::Lobby);
        assert_eq!(summary.objectives[0].progress, 0);
        assert!(summary.events.is_empty());
        let host = summary
            .players
            .iter()
            .find(|player| player.id == host_id)
            .unwrap();
        assert_eq!(host.score, SHELL_SCORE);
        assert_eq!(host.health, 100);
    }
}
