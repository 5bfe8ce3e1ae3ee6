use std::net::SocketAddr;

use axum::{
    Json, Router,
    extract::{ConnectInfo, Query, State},
    http::HeaderMap,
    response::Response,
    routing::get,
};
use axum_valid::Valid;
use validator::Validate;

use crate::{
    dto::commentary::{CommentaryDone, CommentaryQuery, CommentaryRequest},
    error::AppError,
    routes::{client_ip, enforce_limit, with_ai_headers},
    services::{commentary_service, sse_service},
    state::SharedState,
};

/// Routes serving event narration.
pub fn router() -> Router<SharedState> {
    Router::new().route("/api/commentary", get(commentary_query).post(commentary))
}

/// Narrate a game moment in one of the commentary voices.
///
/// The narration arrives as an SSE stream: `chunk` events a few words at a
/// time, then one `done` event carrying the full line.
#[utoipa::path(
    post,
    path = "/api/commentary",
    tag = "commentary",
    request_body = CommentaryRequest,
    responses(
        (status = 200, description = "Streamed narration", content_type = "text/event-stream", body = CommentaryDone),
        (status = 404, description = "Unknown game"),
        (status = 429, description = "Rate limit exceeded")
    )
)]
pub async fn commentary(
    State(state): State<SharedState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Valid(Json(payload)): Valid<Json<CommentaryRequest>>,
) -> Result<Response, AppError> {
    let client = client_ip(&addr, &headers);
    enforce_limit(state.commentary_limiter(), client)?;
    respond(&state, payload).await
}

/// Query form of the commentary request for GET callers.
#[utoipa::path(
    get,
    path = "/api/commentary",
    tag = "commentary",
    params(
        ("event" = String, Query, description = "Short description of the moment"),
        ("intensity" = Option<u8>, Query, description = "Drama level, 1-5"),
        ("style" = Option<String>, Query, description = "documentary, sports or horror"),
        ("game_id" = Option<uuid::Uuid>, Query, description = "Game to log the line into")
    ),
    responses(
        (status = 200, description = "Streamed narration", content_type = "text/event-stream", body = CommentaryDone),
        (status = 429, description = "Rate limit exceeded")
    )
)]
pub async fn commentary_query(
    State(state): State<SharedState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Query(query): Query<CommentaryQuery>,
) -> Result<Response, AppError> {
    let client = client_ip(&addr, &headers);
    enforce_limit(state.commentary_limiter(), client)?;
    let request: CommentaryRequest = query.into();
    request.validate()?;
    respond(&state, request).await
}

async fn respond(state: &SharedState, request: CommentaryRequest) -> Result<Response, AppError> {
    let (done, mode) = commentary_service::narrate(state, request).await?;
    let stream = sse_service::stream_generated(done.text.clone(), done);
    Ok(with_ai_headers(stream, mode, None))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_moment_fails_the_query_path_too() {
        let query = CommentaryQuery {
            event: String::new(),
            intensity: Some(6),
            style: None,
            game_id: None,
        };
        let request: CommentaryRequest = query.into();
        assert!(request.validate().is_err());
    }
}
