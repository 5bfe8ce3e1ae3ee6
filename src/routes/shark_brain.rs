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
    dto::shark::{
        BrainStatsResponse, MemoryUpdateResponse, SharkBrainQuery, SharkBrainRequest,
        SharkDecisionResponse, TauntResponse,
    },
    error::AppError,
    routes::{client_ip, enforce_limit, with_ai_headers},
    services::shark_service,
    state::SharedState,
};

/// Routes serving the shark brain.
pub fn router() -> Router<SharedState> {
    Router::new().route("/api/shark-brain", get(shark_brain_query).post(shark_brain))
}

/// Run one shark brain action.
///
/// The body is discriminated on `action`: `decide`, `updateMemory`, `taunt`
/// or `stats`. Every response carries `X-AI-Mode` and
/// `X-API-Calls-Remaining` headers.
#[utoipa::path(
    post,
    path = "/api/shark-brain",
    tag = "shark-brain",
    request_body = SharkBrainRequest,
    responses(
        (status = 200, description = "Decision", body = SharkDecisionResponse),
        (status = 200, description = "Updated memory", body = MemoryUpdateResponse),
        (status = 200, description = "Taunt", body = TauntResponse),
        (status = 200, description = "Usage stats", body = BrainStatsResponse),
        (status = 404, description = "Unknown game or player"),
        (status = 409, description = "No round is running"),
        (status = 429, description = "Rate limit exceeded")
    )
)]
pub async fn shark_brain(
    State(state): State<SharedState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Valid(Json(payload)): Valid<Json<SharkBrainRequest>>,
) -> Result<Response, AppError> {
    let client = client_ip(&addr, &headers);
    enforce_limit(state.shark_limiter(), client)?;
    dispatch(&state, payload).await
}

/// Query-string form of the shark brain for GET callers. `updateMemory`
/// requires a body and is rejected here.
#[utoipa::path(
    get,
    path = "/api/shark-brain",
    tag = "shark-brain",
    params(
        ("action" = String, Query, description = "One of decide, taunt or stats"),
        ("game_id" = Option<uuid::Uuid>, Query, description = "Game to run against"),
        ("trigger" = Option<String>, Query, description = "Taunt trigger"),
        ("target" = Option<String>, Query, description = "Taunt target name"),
        ("intensity" = Option<u8>, Query, description = "Taunt intensity, 1-5")
    ),
    responses(
        (status = 200, description = "Action result"),
        (status = 400, description = "Unknown action or one that needs a body"),
        (status = 429, description = "Rate limit exceeded")
    )
)]
pub async fn shark_brain_query(
    State(state): State<SharedState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Query(query): Query<SharkBrainQuery>,
) -> Result<Response, AppError> {
    let client = client_ip(&addr, &headers);
    enforce_limit(state.shark_limiter(), client)?;
    let request = query.into_request()?;
    request.validate()?;
    dispatch(&state, request).await
}

async fn dispatch(state: &SharedState, request: SharkBrainRequest) -> Result<Response, AppError> {
    let calls_remaining = state.ai().calls_remaining();
    let response = match request {
        SharkBrainRequest::Decide(req) => {
            let (decision, mode) = shark_service::decide(state, req).await?;
            with_ai_headers(Json(decision), mode, Some(calls_remaining))
        }
        SharkBrainRequest::UpdateMemory(req) => {
            let updated = shark_service::update_memory(state, req).await?;
            with_ai_headers(
                Json(updated),
                state.ai().current_mode(),
                Some(calls_remaining),
            )
        }
        SharkBrainRequest::Taunt(req) => {
            let (taunt, mode) = shark_service::taunt(state, req).await?;
            with_ai_headers(Json(taunt), mode, Some(calls_remaining))
        }
        SharkBrainRequest::Stats => {
            let stats = shark_service::stats(state);
            with_ai_headers(
                Json(stats),
                state.ai().current_mode(),
                Some(calls_remaining),
            )
        }
    };
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::AppConfig, routes::CALLS_REMAINING_HEADER, state::AppState};

    #[tokio::test]
    async fn remaining_header_reports_the_ai_budget() {
        let state = AppState::new(AppConfig::default()).expect("state");
        let response = dispatch(&state, SharkBrainRequest::Stats).await.unwrap();

        let header = response
            .headers()
            .get(CALLS_REMAINING_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned)
            .expect("remaining header");
        assert_eq!(header, state.ai().calls_remaining().to_string());
    }

    #[test]
    fn query_requests_are_validated_like_bodies() {
        let query = SharkBrainQuery {
            action: "taunt".into(),
            game_id: None,
            trigger: Some(crate::dto::shark::TauntTriggerDto::Struck),
            target: None,
            intensity: Some(9),
        };
        let request = query.into_request().expect("parse");
        assert!(request.validate().is_err());
    }
}
