use serde::Serialize;
use utoipa::ToSchema;

/// Health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status ("ok" or "degraded").
    pub status: String,
    /// Mode the shark brain would answer in right now ("live" or "mock").
    pub ai_mode: String,
    /// Whether the configured model endpoint answered the last probe.
    pub upstream_available: bool,
    /// Number of games currently held in memory.
    pub games: usize,
}

impl HealthResponse {
    /// Create a health response indicating the system is fully operational.
    pub fn ok(ai_mode: String, games: usize) -> Self {
        Self {
            status: "ok".to_string(),
            ai_mode,
            upstream_available: true,
            games,
        }
    }

    /// Create a health response indicating the brain runs on canned answers.
    pub fn degraded(ai_mode: String, games: usize) -> Self {
        Self {
            status: "degraded".to_string(),
            ai_mode,
            upstream_available: false,
            games,
        }
    }
}
