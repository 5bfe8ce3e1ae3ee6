use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the Riptide backend.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::game::create_game,
        crate::routes::game::list_games,
        crate::routes::game::get_game,
        crate::routes::game::delete_game,
        crate::routes::game::join_game,
        crate::routes::game::start_game,
        crate::routes::game::leave_game,
        crate::routes::game::end_game,
        crate::routes::game::reset_game,
        crate::routes::game::update_player_state,
        crate::routes::game::perform_action,
        crate::routes::shark_brain::shark_brain,
        crate::routes::shark_brain::shark_brain_query,
        crate::routes::npc_chat::npc_chat,
        crate::routes::npc_chat::npc_chat_query,
        crate::routes::commentary::commentary,
        crate::routes::commentary::commentary_query,
        crate::routes::sse::game_events,
        crate::routes::websocket::ws_handler,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::common::PositionDto,
            crate::dto::common::GamePhaseSnapshot,
            crate::dto::phase::VisibleGamePhase,
            crate::dto::phase::VisibleFinishReason,
            crate::dto::game::CreateGameRequest,
            crate::dto::game::ObjectiveInput,
            crate::dto::game::JoinGameRequest,
            crate::dto::game::JoinGameResponse,
            crate::dto::game::HostActionRequest,
            crate::dto::game::LeaveGameRequest,
            crate::dto::game::UpdatePlayerStateRequest,
            crate::dto::game::PlayerActionRequest,
            crate::dto::game::PlayerActionDto,
            crate::dto::game::PlayerStatusDto,
            crate::dto::game::ObjectiveKindDto,
            crate::dto::game::EventKindDto,
            crate::dto::game::GameSummary,
            crate::dto::game::GameListItem,
            crate::dto::game::GamesResponse,
            crate::dto::game::PlayerSummary,
            crate::dto::game::ObjectiveSummary,
            crate::dto::game::NpcSummary,
            crate::dto::game::EventSummary,
            crate::dto::game::CommentarySummary,
            crate::dto::shark::SharkBrainRequest,
            crate::dto::shark::DecideRequest,
            crate::dto::shark::DecisionContextInput,
            crate::dto::shark::SharkContextInput,
            crate::dto::shark::SwimmerContextInput,
            crate::dto::shark::UpdateMemoryRequest,
            crate::dto::shark::SharkMemoryPatchInput,
            crate::dto::shark::TauntRequest,
            crate::dto::shark::TauntTriggerDto,
            crate::dto::shark::SharkActionDto,
            crate::dto::shark::SharkSummary,
            crate::dto::shark::SharkMemorySummary,
            crate::dto::shark::SharkDecisionResponse,
            crate::dto::shark::MemoryUpdateResponse,
            crate::dto::shark::TauntResponse,
            crate::dto::shark::ActionCountsDto,
            crate::dto::shark::BrainStatsResponse,
            crate::dto::npc::NpcRoleDto,
            crate::dto::npc::ChatSpeakerDto,
            crate::dto::npc::ChatTurnInput,
            crate::dto::npc::NpcChatRequest,
            crate::dto::npc::NpcChatDone,
            crate::dto::commentary::CommentaryStyleDto,
            crate::dto::commentary::CommentaryRequest,
            crate::dto::commentary::CommentaryDone,
            crate::dto::sse::Handshake,
            crate::dto::ws::SwimmerInboundMessage,
            crate::dto::ws::SwimmerAck,
            crate::dto::ws::SwimmerErrorMessage,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "games", description = "Game room lifecycle and player state"),
        (name = "shark-brain", description = "Shark decisions, memory, taunts and stats"),
        (name = "npc-chat", description = "Dialogue with the characters on the sand"),
        (name = "commentary", description = "Narration of game moments"),
        (name = "sse", description = "Server-sent events streams"),
        (name = "swimmers", description = "WebSocket operations for swimmer clients"),
    )
)]
pub struct ApiDoc;
