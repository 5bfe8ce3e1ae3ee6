use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch, post},
};
use axum_valid::Valid;
use uuid::Uuid;

use crate::{
    dto::game::{
        CreateGameRequest, GameSummary, GamesResponse, HostActionRequest, JoinGameRequest,
        JoinGameResponse, LeaveGameRequest, PlayerActionRequest, PlayerSummary,
        UpdatePlayerStateRequest,
    },
    error::AppError,
    services::game_service,
    state::SharedState,
};

/// Routes handling game room lifecycle and player state.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/api/games", post(create_game).get(list_games))
        .route("/api/games/{id}", get(get_game).delete(delete_game))
        .route("/api/games/{id}/join", post(join_game))
        .route("/api/games/{id}/start", post(start_game))
        .route("/api/games/{id}/leave", post(leave_game))
        .route("/api/games/{id}/end", post(end_game))
        .route("/api/games/{id}/reset", post(reset_game))
        .route(
            "/api/games/{id}/players/{player_id}/state",
            patch(update_player_state),
        )
        .route(
            "/api/games/{id}/players/{player_id}/actions",
            post(perform_action),
        )
}

/// Open a new beach lobby.
#[utoipa::path(
    post,
    path = "/api/games",
    tag = "games",
    request_body = CreateGameRequest,
    responses(
        (status = 200, description = "Game created", body = GameSummary),
        (status = 400, description = "Invalid names or objectives")
    )
)]
pub async fn create_game(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<CreateGameRequest>>,
) -> Result<Json<GameSummary>, AppError> {
    let summary = game_service::create_game(&state, payload).await?;
    Ok(Json(summary))
}

/// List the rooms currently held in memory.
#[utoipa::path(
    get,
    path = "/api/games",
    tag = "games",
    responses((status = 200, description = "Current rooms", body = GamesResponse))
)]
pub async fn list_games(State(state): State<SharedState>) -> Json<GamesResponse> {
    Json(game_service::list_games(&state).await)
}

/// Fetch one room's full snapshot.
#[utoipa::path(
    get,
    path = "/api/games/{id}",
    tag = "games",
    params(("id" = Uuid, Path, description = "Game identifier")),
    responses(
        (status = 200, description = "Game snapshot", body = GameSummary),
        (status = 404, description = "Unknown game")
    )
)]
pub async fn get_game(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<GameSummary>, AppError> {
    let summary = game_service::get_game(&state, id).await?;
    Ok(Json(summary))
}

/// Remove a finished room.
#[utoipa::path(
    delete,
    path = "/api/games/{id}",
    tag = "games",
    params(("id" = Uuid, Path, description = "Game identifier")),
    responses(
        (status = 204, description = "Game deleted"),
        (status = 404, description = "Unknown game"),
        (status = 409, description = "Game is not finished")
    )
)]
pub async fn delete_game(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    game_service::delete_game(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Join a room as a new swimmer.
#[utoipa::path(
    post,
    path = "/api/games/{id}/join",
    tag = "games",
    params(("id" = Uuid, Path, description = "Game identifier")),
    request_body = JoinGameRequest,
    responses(
        (status = 200, description = "Joined", body = JoinGameResponse),
        (status = 404, description = "Unknown game"),
        (status = 409, description = "Game is full or finished")
    )
)]
pub async fn join_game(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<JoinGameRequest>>,
) -> Result<Json<JoinGameResponse>, AppError> {
    let response = game_service::join_game(&state, id, payload).await?;
    Ok(Json(response))
}

/// Start the round. Host only.
#[utoipa::path(
    post,
    path = "/api/games/{id}/start",
    tag = "games",
    params(("id" = Uuid, Path, description = "Game identifier")),
    request_body = HostActionRequest,
    responses(
        (status = 200, description = "Round started", body = GameSummary),
        (status = 401, description = "Requester is not the host"),
        (status = 409, description = "Round already running or finished")
    )
)]
pub async fn start_game(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<HostActionRequest>,
) -> Result<Json<GameSummary>, AppError> {
    let summary = game_service::start_game(&state, id, payload.player_id).await?;
    Ok(Json(summary))
}

/// Leave a room. The last player out reaps it.
#[utoipa::path(
    post,
    path = "/api/games/{id}/leave",
    tag = "games",
    params(("id" = Uuid, Path, description = "Game identifier")),
    request_body = LeaveGameRequest,
    responses(
        (status = 204, description = "Player left"),
        (status = 404, description = "Unknown game or player")
    )
)]
pub async fn leave_game(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<LeaveGameRequest>,
) -> Result<StatusCode, AppError> {
    game_service::leave_game(&state, id, payload.player_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// End the round early. Host only.
#[utoipa::path(
    post,
    path = "/api/games/{id}/end",
    tag = "games",
    params(("id" = Uuid, Path, description = "Game identifier")),
    request_body = HostActionRequest,
    responses(
        (status = 200, description = "Round ended", body = GameSummary),
        (status = 401, description = "Requester is not the host"),
        (status = 409, description = "No round is running")
    )
)]
pub async fn end_game(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<HostActionRequest>,
) -> Result<Json<GameSummary>, AppError> {
    let summary = game_service::end_game(&state, id, payload.player_id).await?;
    Ok(Json(summary))
}

/// Reset a finished round back to the lobby. Host only.
#[utoipa::path(
    post,
    path = "/api/games/{id}/reset",
    tag = "games",
    params(("id" = Uuid, Path, description = "Game identifier")),
    request_body = HostActionRequest,
    responses(
        (status = 200, description = "Back in the lobby", body = GameSummary),
        (status = 401, description = "Requester is not the host"),
        (status = 409, description = "Round is not finished")
    )
)]
pub async fn reset_game(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<HostActionRequest>,
) -> Result<Json<GameSummary>, AppError> {
    let summary = game_service::reset_game(&state, id, payload.player_id).await?;
    Ok(Json(summary))
}

/// Patch one swimmer's live position and/or health.
#[utoipa::path(
    patch,
    path = "/api/games/{id}/players/{player_id}/state",
    tag = "games",
    params(
        ("id" = Uuid, Path, description = "Game identifier"),
        ("player_id" = Uuid, Path, description = "Player identifier")
    ),
    request_body = UpdatePlayerStateRequest,
    responses(
        (status = 200, description = "Updated player", body = PlayerSummary),
        (status = 404, description = "Unknown game or player"),
        (status = 409, description = "No round is running")
    )
)]
pub async fn update_player_state(
    State(state): State<SharedState>,
    Path((id, player_id)): Path<(Uuid, Uuid)>,
    Valid(Json(payload)): Valid<Json<UpdatePlayerStateRequest>>,
) -> Result<Json<PlayerSummary>, AppError> {
    let player = game_service::update_player_state(&state, id, player_id, payload).await?;
    Ok(Json(player))
}

/// Record one gameplay action for a swimmer.
#[utoipa::path(
    post,
    path = "/api/games/{id}/players/{player_id}/actions",
    tag = "games",
    params(
        ("id" = Uuid, Path, description = "Game identifier"),
        ("player_id" = Uuid, Path, description = "Player identifier")
    ),
    request_body = PlayerActionRequest,
    responses(
        (status = 200, description = "Recorded action event", body = crate::dto::game::EventSummary),
        (status = 400, description = "Rescue without a target"),
        (status = 404, description = "Unknown game or player"),
        (status = 409, description = "Actor cannot act right now")
    )
)]
pub async fn perform_action(
    State(state): State<SharedState>,
    Path((id, player_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<PlayerActionRequest>,
) -> Result<Json<crate::dto::game::EventSummary>, AppError> {
    let event = game_service::perform_action(&state, id, player_id, payload).await?;
    Ok(Json(event))
}
