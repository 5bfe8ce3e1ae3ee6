use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use serde::Serialize;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use uuid::Uuid;

use crate::{
    dto::sse::{Handshake, ServerEvent},
    error::ServiceError,
    state::SharedState,
};

/// Pause between chunks of a streamed generation, to read like typing rather
/// than a single paste.
const CHUNK_PACING: Duration = Duration::from_millis(40);
/// How many words one `chunk` event carries.
const CHUNK_WORDS: usize = 3;

/// Subscribe to one room's live event feed as an SSE response.
///
/// The stream opens with a `handshake` event naming the game and the current
/// AI mode, then forwards everything broadcast on the room's hub until the
/// client disconnects or the room is removed.
pub fn watch_game(
    state: &SharedState,
    game_id: Uuid,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>> + use<>>, ServiceError> {
    let room = state.require_room(game_id)?;
    let mut receiver = room.hub().subscribe();

    let handshake = ServerEvent::json(
        Some("handshake".to_string()),
        &Handshake {
            game_id,
            message: format!("watching game {game_id}"),
            ai_mode: state.ai().current_mode().as_str().to_owned(),
        },
    )
    .map_err(|e| ServiceError::InvalidState(format!("handshake serialisation failed: {e}")))?;

    // small bounded channel between forwarder and response
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(8);

    // forwarder task: reads from broadcast and pushes into mpsc
    tokio::spawn(async move {
        if tx.send(Ok(to_event(handshake))).await.is_err() {
            return;
        }

        loop {
            tokio::select! {
                _ = tx.closed() => break,
                recv_result = receiver.recv() => {
                    match recv_result {
                        Ok(payload) => {
                            if tx.send(Ok(to_event(payload))).await.is_err() {
                                break;
                            }
                        }
                        Err(RecvError::Closed) => break,
                        Err(RecvError::Lagged(_)) => {
                            // Skip lagged messages but keep the stream alive.
                            continue;
                        }
                    }
                }
            }
        }

        tracing::info!(game = %game_id, "game SSE stream disconnected");
    });

    // response stream reads from mpsc; when client disconnects axum drops this stream
    let stream = ReceiverStream::new(rx);
    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    ))
}

/// Serve a finished generation as a chunked SSE stream: the text arrives as a
/// series of `chunk` events a few words at a time, followed by one `done`
/// event carrying the full payload.
pub fn stream_generated<T>(
    text: String,
    done: T,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>>
where
    T: Serialize + Send + 'static,
{
    let stream = async_stream::stream! {
        let words: Vec<&str> = text.split_whitespace().collect();
        for group in words.chunks(CHUNK_WORDS) {
            yield Ok(Event::default().event("chunk").data(group.join(" ")));
            tokio::time::sleep(CHUNK_PACING).await;
        }

        match serde_json::to_string(&done) {
            Ok(payload) => yield Ok(Event::default().event("done").data(payload)),
            Err(e) => {
                tracing::warn!(error = %e, "failed to serialise terminal stream payload");
                yield Ok(Event::default().event("error").data("stream payload serialisation failed"));
            }
        }
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

fn to_event(payload: ServerEvent) -> Event {
    let mut event = Event::default().data(payload.data);
    if let Some(name) = payload.event {
        event = event.event(name);
    }
    event
}
