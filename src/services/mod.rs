/// Narration generation for game moments.
pub mod commentary_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Core game room logic and state management.
pub mod game_service;
/// Health check service.
pub mod health_service;
/// Beach character dialogue generation.
pub mod npc_service;
/// Shark brain orchestration (decide, memory, taunt, stats).
pub mod shark_service;
/// Server-Sent Events message generation.
pub mod sse_events;
/// Server-Sent Events broadcasting service.
pub mod sse_service;
/// WebSocket connection and message handling service.
pub mod websocket_service;
