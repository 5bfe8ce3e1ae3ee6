use std::convert::Infallible;

use axum::{
    Router,
    extract::{Path, State},
    response::sse::Sse,
    routing::get,
};
use futures::Stream;
use tracing::info;
use uuid::Uuid;

use crate::{error::AppError, services::sse_service, state::SharedState};

/// Configure the SSE endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/api/games/{id}/events", get(game_events))
}

/// Stream one room's live events to a connected watcher.
#[utoipa::path(
    get,
    path = "/api/games/{id}/events",
    tag = "sse",
    params(("id" = Uuid, Path, description = "Game identifier")),
    responses(
        (status = 200, description = "Game event stream", content_type = "text/event-stream", body = String),
        (status = 404, description = "Unknown game")
    )
)]
pub async fn game_events(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Sse<impl Stream<Item = Result<axum::response::sse::Event, Infallible>>>, AppError> {
    let stream = sse_service::watch_game(&state, id)?;
    info!(game = %id, "new game SSE connection");
    Ok(stream)
}
