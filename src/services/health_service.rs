use crate::{dto::health::HealthResponse, state::SharedState};

/// Respond with the current health of the backend.
///
/// The service is healthy as long as it can answer; it reports degraded when
/// a configured upstream stopped answering probes, because generation quality
/// drops to canned lines in that case.
pub fn health_status(state: &SharedState) -> HealthResponse {
    let brain = state.ai();
    let ai_mode = brain.current_mode().as_str().to_owned();
    let games = state.room_count();

    if brain.is_configured() && !brain.upstream_available() {
        HealthResponse::degraded(ai_mode, games)
    } else {
        HealthResponse::ok(ai_mode, games)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::AppConfig, state::AppState};

    #[test]
    fn unconfigured_brain_is_still_ok() {
        let state = AppState::new(AppConfig::default()).expect("state");
        let health = health_status(&state);
        assert_eq!(health.status, "ok");
        assert_eq!(health.ai_mode, "mock");
        assert_eq!(health.games, 0);
    }
}
