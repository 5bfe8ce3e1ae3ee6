use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    dto::{
        game::{PlayerActionRequest, UpdatePlayerStateRequest},
        ws::{SwimmerAck, SwimmerErrorMessage, SwimmerInboundMessage},
    },
    services::game_service,
    state::{SharedState, SwimmerConnection, game::PlayerStatus},
};

const IDENT_TIMEOUT: Duration = Duration::from_secs(10);

/// Handle the full lifecycle for an individual swimmer WebSocket connection.
///
/// The client must identify with a game and player id within
/// [`IDENT_TIMEOUT`]; after that, position and action frames are applied
/// through the same paths as the REST endpoints, and everything broadcast on
/// the room hub is forwarded down the socket.
pub async fn handle_socket(state: SharedState, socket: WebSocket) {
    let (mut sender, mut receiver) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Message>();

    // Dedicated writer task keeps outbound messages flowing even while we await inbound frames.
    let writer_task = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            if sender.send(message).await.is_err() {
                break;
            }
        }
    });

    let initial_message = match tokio::time::timeout(IDENT_TIMEOUT, receiver.next()).await {
        Ok(Some(Ok(Message::Text(text)))) => text,
        Ok(Some(Ok(Message::Close(_)))) => {
            finalize(writer_task, outbound_tx).await;
            return;
        }
        Ok(Some(Ok(_))) => {
            let _ = outbound_tx.send(Message::Close(None));
            finalize(writer_task, outbound_tx).await;
            return;
        }
        Ok(Some(Err(err))) => {
            warn!(error = %err, "websocket receive error");
            finalize(writer_task, outbound_tx).await;
            return;
        }
        Ok(None) | Err(_) => {
            warn!("websocket identification timed out");
            finalize(writer_task, outbound_tx).await;
            return;
        }
    };

    let inbound = match SwimmerInboundMessage::from_json_str(&initial_message) {
        Ok(message) => message,
        Err(err) => {
            warn!(error = %err, "failed to parse swimmer message");
            let _ = outbound_tx.send(Message::Close(None));
            finalize(writer_task, outbound_tx).await;
            return;
        }
    };

    let Some((game_id, player_id)) = inbound.identity() else {
        warn!("first message was not an identification");
        let _ = outbound_tx.send(Message::Close(None));
        finalize(writer_task, outbound_tx).await;
        return;
    };

    if let Err(message) = verify_identity(&state, game_id, player_id).await {
        let _ = send_json(&outbound_tx, &SwimmerErrorMessage { message });
        let _ = outbound_tx.send(Message::Close(None));
        finalize(writer_task, outbound_tx).await;
        return;
    }

    state.swimmers().insert(
        player_id,
        SwimmerConnection {
            game_id,
            player_id,
            tx: outbound_tx.clone(),
        },
    );
    let _ = send_json(
        &outbound_tx,
        &SwimmerAck {
            game_id,
            player_id,
            status: "connected".into(),
        },
    );
    info!(game = %game_id, player = %player_id, "swimmer connected");

    // Forward the room's broadcast hub down this socket.
    let hub_task = spawn_hub_forwarder(&state, game_id, outbound_tx.clone());

    while let Some(message) = receiver.next().await {
        match message {
            Ok(Message::Text(text)) => match SwimmerInboundMessage::from_json_str(&text) {
                Ok(inbound) => {
                    handle_inbound(&state, game_id, player_id, inbound, &outbound_tx).await;
                }
                Err(err) => {
                    warn!(player = %player_id, error = %err, "failed to parse swimmer message");
                    let _ = send_json(
                        &outbound_tx,
                        &SwimmerErrorMessage {
                            message: "malformed message".into(),
                        },
                    );
                }
            },
            Ok(Message::Ping(payload)) => {
                let _ = outbound_tx.send(Message::Pong(payload));
            }
            Ok(Message::Close(frame)) => {
                info!(player = %player_id, "swimmer closed");
                let _ = outbound_tx.send(Message::Close(frame));
                break;
            }
            Ok(Message::Binary(_)) => {}
            Ok(Message::Pong(_)) => {}
            Err(err) => {
                warn!(player = %player_id, error = %err, "websocket error");
                break;
            }
        }
    }

    state.swimmers().remove(&player_id);
    if let Some(task) = hub_task {
        task.abort();
    }
    info!(game = %game_id, player = %player_id, "swimmer disconnected");

    finalize(writer_task, outbound_tx).await;
}

/// Check the identification against the room registry. A disconnect later
/// keeps the player in the session; only an unknown game or player is
/// rejected outright.
async fn verify_identity(
    state: &SharedState,
    game_id: Uuid,
    player_id: Uuid,
) -> Result<(), String> {
    let Some(room) = state.room(game_id) else {
        return Err(format!("unknown game {game_id}"));
    };
    let known = room
        .read_session(|session| {
            session
                .players
                .get(&player_id)
                .is_some_and(|player| player.status != PlayerStatus::Left)
        })
        .await;
    if !known {
        return Err(format!("unknown player {player_id}"));
    }
    Ok(())
}

async fn handle_inbound(
    state: &SharedState,
    game_id: Uuid,
    player_id: Uuid,
    inbound: SwimmerInboundMessage,
    outbound_tx: &mpsc::UnboundedSender<Message>,
) {
    match inbound {
        SwimmerInboundMessage::Position { x, y } => {
            let result = game_service::update_player_state(
                state,
                game_id,
                player_id,
                UpdatePlayerStateRequest {
                    position: Some(crate::dto::common::PositionDto { x, y }),
                    health_delta: None,
                },
            )
            .await;
            if let Err(err) = result {
                let _ = send_json(
                    outbound_tx,
                    &SwimmerErrorMessage {
                        message: err.to_string(),
                    },
                );
            }
        }
        SwimmerInboundMessage::Action {
            action,
            target_player,
        } => {
            let result = game_service::perform_action(
                state,
                game_id,
                player_id,
                PlayerActionRequest {
                    action,
                    target_player,
                },
            )
            .await;
            if let Err(err) = result {
                let _ = send_json(
                    outbound_tx,
                    &SwimmerErrorMessage {
                        message: err.to_string(),
                    },
                );
            }
        }
        SwimmerInboundMessage::Identify { .. } => {
            warn!(player = %player_id, "ignoring duplicate identification message");
        }
        SwimmerInboundMessage::Unknown => {
            warn!(player = %player_id, "ignoring unknown message type");
        }
    }
}

/// Mirror the room's broadcast hub onto this socket as JSON text frames.
fn spawn_hub_forwarder(
    state: &SharedState,
    game_id: Uuid,
    outbound_tx: mpsc::UnboundedSender<Message>,
) -> Option<JoinHandle<()>> {
    let room = state.room(game_id)?;
    let mut updates = room.hub().subscribe();
    drop(room);

    Some(tokio::spawn(async move {
        loop {
            match updates.recv().await {
                Ok(event) => {
                    if send_json(&outbound_tx, &event).is_err() {
                        break;
                    }
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    }))
}

/// Serialize a payload and push it onto the socket's writer channel.
fn send_json<T>(tx: &mpsc::UnboundedSender<Message>, value: &T) -> Result<(), ()>
where
    T: ?Sized + serde::Serialize,
{
    let payload = match serde_json::to_string(value) {
        Ok(p) => p,
        Err(err) => {
            // Serialization failure is a bug here, not a connection problem.
            warn!(error = %err, "failed to serialize outbound websocket payload");
            return Ok(());
        }
    };
    tx.send(Message::Text(payload.into())).map_err(|_| ())
}

/// Ensure the writer task winds down before we return from the socket handler.
async fn finalize(writer_task: JoinHandle<()>, outbound_tx: mpsc::UnboundedSender<Message>) {
    drop(outbound_tx);
    let _ = writer_task.await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AppConfig,
        dto::game::{CreateGameRequest, JoinGameRequest},
        state::AppState,
    };

    #[tokio::test]
    async fn identity_check_rejects_unknown_games_and_players() {
        let state = AppState::new(AppConfig::default()).expect("state");
        assert!(
            verify_identity(&state, Uuid::new_v4(), Uuid::new_v4())
                .await
                .is_err()
        );

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
        assert!(
            verify_identity(&state, summary.id, Uuid::new_v4())
                .await
                .is_err()
        );
        assert!(
            verify_identity(&state, summary.id, summary.host_player)
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn identity_check_rejects_players_who_left() {
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
        let joined =
            game_service::join_game(&state, summary.id, JoinGameRequest { name: "kai".into() })
                .await
                .unwrap();
        game_service::leave_game(&state, summary.id, joined.player_id)
            .await
            .unwrap();

        assert!(
            verify_identity(&state, summary.id, joined.player_id)
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn inbound_position_frames_move_the_player() {
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
        game_service::start_game(&state, summary.id, summary.host_player)
            .await
            .unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        handle_inbound(
            &state,
            summary.id,
            summary.host_player,
            SwimmerInboundMessage::Position { x: 42.0, y: 99.0 },
            &tx,
        )
        .await;
        assert!(rx.try_recv().is_err(), "no error frame expected");

        let fetched = game_service::get_game(&state, summary.id).await.unwrap();
        let host = fetched
            .players
            .iter()
            .find(|player| player.id == summary.host_player)
            .unwrap();
        assert_eq!(host.position.x, 42.0);
        assert_eq!(host.position.y, 99.0);
    }

    #[tokio::test]
    async fn inbound_action_in_the_lobby_reports_an_error_frame() {
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

        let (tx, mut rx) = mpsc::unbounded_channel();
        handle_inbound(
            &state,
            summary.id,
            summary.host_player,
            SwimmerInboundMessage::Action {
                action: crate::dto::game::PlayerActionDto::Splash,
                target_player: None,
            },
            &tx,
        )
        .await;

        let frame = rx.try_recv().expect("an error frame");
        match frame {
            Message::Text(text) => assert!(text.contains("message")),
            other => panic!("unexpected frame: {other:?}"),
        }
    }
}
