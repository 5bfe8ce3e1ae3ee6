use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::{
    dto::{
        common::GamePhaseSnapshot,
        game::{CommentarySummary, EventSummary, ObjectiveSummary, PlayerSummary},
        sse::{
            AiStatusEvent, CommentaryRecordedEvent, EventRecordedEvent, GameRemovedEvent,
            HostChangedEvent, ObjectiveUpdatedEvent, PhaseChangedEvent, PlayerJoinedEvent,
            PlayerLeftEvent, PlayerUpdatedEvent, ServerEvent, SharkDecisionEvent, SharkTauntEvent,
        },
    },
    state::{GameRoom, state_machine::GamePhase},
};

const EVENT_PHASE_CHANGED: &str = "phase_changed";
const EVENT_PLAYER_JOINED: &str = "player.joined";
const EVENT_PLAYER_UPDATED: &str = "player.updated";
const EVENT_PLAYER_LEFT: &str = "player.left";
const EVENT_HOST_CHANGED: &str = "host.changed";
const EVENT_SHARK_DECISION: &str = "shark.decision";
const EVENT_SHARK_TAUNT: &str = "shark.taunt";
const EVENT_RECORDED: &str = "event.recorded";
const EVENT_COMMENTARY_RECORDED: &str = "commentary.recorded";
const EVENT_OBJECTIVE_UPDATED: &str = "objective.updated";
const EVENT_GAME_REMOVED: &str = "game.removed";
const EVENT_AI_STATUS: &str = "ai.status";

/// Broadcast a gameplay phase change to the room's watchers.
pub fn broadcast_phase_changed(room: &GameRoom, phase: &GamePhase) {
    let payload = PhaseChangedEvent(GamePhaseSnapshot::from_phase(room.id(), phase));
    send_room_event(room, EVENT_PHASE_CHANGED, &payload);
}

/// Broadcast that a player joined the game.
pub fn broadcast_player_joined(room: &GameRoom, player: PlayerSummary) {
    send_room_event(room, EVENT_PLAYER_JOINED, &PlayerJoinedEvent { player });
}

/// Broadcast a change to one player's live state (position, health, status).
pub fn broadcast_player_updated(room: &GameRoom, player: PlayerSummary) {
    send_room_event(room, EVENT_PLAYER_UPDATED, &PlayerUpdatedEvent { player });
}

/// Broadcast that a player left the game.
pub fn broadcast_player_left(room: &GameRoom, player_id: Uuid) {
    send_room_event(room, EVENT_PLAYER_LEFT, &PlayerLeftEvent { player_id });
}

/// Broadcast that host rights moved to another player.
pub fn broadcast_host_changed(room: &GameRoom, player_id: Uuid) {
    send_room_event(room, EVENT_HOST_CHANGED, &HostChangedEvent { player_id });
}

/// Broadcast the shark brain's latest move.
pub fn broadcast_shark_decision(room: &GameRoom, payload: &SharkDecisionEvent) {
    send_room_event(room, EVENT_SHARK_DECISION, payload);
}

/// Broadcast a shark taunt to the room.
pub fn broadcast_shark_taunt(room: &GameRoom, payload: &SharkTauntEvent) {
    send_room_event(room, EVENT_SHARK_TAUNT, payload);
}

/// Broadcast an entry appended to the session event log.
pub fn broadcast_event_recorded(room: &GameRoom, event: EventSummary) {
    send_room_event(room, EVENT_RECORDED, &EventRecordedEvent { event });
}

/// Broadcast a narration line recorded for the game.
pub fn broadcast_commentary_recorded(room: &GameRoom, commentary: CommentarySummary) {
    send_room_event(
        room,
        EVENT_COMMENTARY_RECORDED,
        &CommentaryRecordedEvent { commentary },
    );
}

/// Broadcast objective progress or completion.
pub fn broadcast_objective_updated(room: &GameRoom, objective: ObjectiveSummary) {
    send_room_event(
        room,
        EVENT_OBJECTIVE_UPDATED,
        &ObjectiveUpdatedEvent { objective },
    );
}

/// Broadcast that a game is being deleted and its streams are about to close.
pub fn broadcast_game_removed(room: &GameRoom) {
    send_room_event(
        room,
        EVENT_GAME_REMOVED,
        &GameRemovedEvent { game_id: room.id() },
    );
}

/// Broadcast that the shark brain switched between live and canned answers.
pub fn broadcast_ai_status(room: &GameRoom, status: &AiStatusEvent) {
    send_room_event(room, EVENT_AI_STATUS, status);
}

fn send_room_event(room: &GameRoom, event: &str, payload: &impl Serialize) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => room.hub().broadcast(event),
        Err(err) => {
            warn!(room = %room.id(), event, error = %err, "failed to serialize SSE payload")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::game::{GameSession, Player};

    #[test]
    fn ai_status_reaches_a_room_subscriber() {
        let session = GameSession::new(
            "sandy-cove".into(),
            Player::new("ada".into()),
            Vec::new(),
            Vec::new(),
        );
        let room = GameRoom::new(session);
        let mut receiver = room.hub().subscribe();

        broadcast_ai_status(
            &room,
            &AiStatusEvent {
                mode: "mock".into(),
                upstream_available: false,
            },
        );

        let event = receiver.try_recv().expect("broadcast event");
        assert_eq!(event.event.as_deref(), Some("ai.status"));
        assert!(event.data.contains("mock"));
    }
}
