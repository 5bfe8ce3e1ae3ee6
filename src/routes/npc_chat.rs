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
    dto::npc::{NpcChatDone, NpcChatQuery, NpcChatRequest},
    error::AppError,
    routes::{client_ip, enforce_limit, with_ai_headers},
    services::{npc_service, sse_service},
    state::SharedState,
};

/// Routes serving beach character dialogue.
pub fn router() -> Router<SharedState> {
    Router::new().route("/api/npc-chat", get(npc_chat_query).post(npc_chat))
}

/// Ask a beach character to reply to a message.
///
/// The reply arrives as an SSE stream: `chunk` events a few words at a time,
/// then one `done` event carrying the full reply and the mode it was
/// generated in.
#[utoipa::path(
    post,
    path = "/api/npc-chat",
    tag = "npc-chat",
    request_body = NpcChatRequest,
    responses(
        (status = 200, description = "Streamed reply", content_type = "text/event-stream", body = NpcChatDone),
        (status = 404, description = "Unknown game"),
        (status = 429, description = "Rate limit exceeded")
    )
)]
pub async fn npc_chat(
    State(state): State<SharedState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Valid(Json(payload)): Valid<Json<NpcChatRequest>>,
) -> Result<Response, AppError> {
    let client = client_ip(&addr, &headers);
    enforce_limit(state.npc_limiter(), client)?;
    respond(&state, payload).await
}

/// Query form of the chat request. History cannot be carried in a query
/// string and is treated as empty.
#[utoipa::path(
    get,
    path = "/api/npc-chat",
    tag = "npc-chat",
    params(
        ("npc" = String, Query, description = "Which character replies"),
        ("message" = String, Query, description = "What the swimmer says"),
        ("game_id" = Option<uuid::Uuid>, Query, description = "Game whose situation colours the reply")
    ),
    responses(
        (status = 200, description = "Streamed reply", content_type = "text/event-stream", body = NpcChatDone),
        (status = 429, description = "Rate limit exceeded")
    )
)]
pub async fn npc_chat_query(
    State(state): State<SharedState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Query(query): Query<NpcChatQuery>,
) -> Result<Response, AppError> {
    let client = client_ip(&addr, &headers);
    enforce_limit(state.npc_limiter(), client)?;
    let request: NpcChatRequest = query.into();
    request.validate()?;
    respond(&state, request).await
}

async fn respond(state: &SharedState, request: NpcChatRequest) -> Result<Response, AppError> {
    let (done, mode) = npc_service::chat(state, request).await?;
    let stream = sse_service::stream_generated(done.text.clone(), done);
    Ok(with_ai_headers(stream, mode, None))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::npc::NpcRoleDto;

    #[test]
    fn empty_message_fails_the_query_path_too() {
        let query = NpcChatQuery {
            npc: NpcRoleDto::Lifeguard,
            message: String::new(),
            game_id: None,
        };
        let request: NpcChatRequest = query.into();
        assert!(request.validate().is_err());
    }
}
