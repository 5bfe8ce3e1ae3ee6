use std::net::{IpAddr, SocketAddr};

use axum::{
    Router,
    http::{HeaderMap, HeaderValue, header::HeaderName},
    response::{IntoResponse, Response},
};

use crate::{
    ai::AiMode,
    error::AppError,
    state::{SharedState, rate_limit::{FixedWindowLimiter, RateVerdict}},
};

pub mod commentary;
pub mod docs;
pub mod game;
pub mod health;
pub mod npc_chat;
pub mod shark_brain;
pub mod sse;
pub mod websocket;

/// Response header reporting whether an answer came from the live model.
pub const AI_MODE_HEADER: &str = "x-ai-mode";
/// Response header reporting the AI calls left in the budget.
pub const CALLS_REMAINING_HEADER: &str = "x-api-calls-remaining";

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(game::router())
        .merge(shark_brain::router())
        .merge(npc_chat::router())
        .merge(commentary::router())
        .merge(sse::router())
        .merge(websocket::router());

    let docs_router = docs::router(state.clone());

    api_router.merge(docs_router).with_state(state)
}

/// Resolve the client address for rate limiting, honouring the first hop of
/// `X-Forwarded-For` when a proxy sits in front of the service.
pub(crate) fn client_ip(addr: &SocketAddr, headers: &HeaderMap) -> IpAddr {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .and_then(|first| first.trim().parse().ok())
        .unwrap_or_else(|| addr.ip())
}

/// Check one request against a limiter, answering the remaining allowance or
/// the 429 to return.
pub(crate) fn enforce_limit(
    limiter: &FixedWindowLimiter,
    client: IpAddr,
) -> Result<u32, AppError> {
    match limiter.check(client) {
        RateVerdict::Allowed { remaining } => Ok(remaining),
        RateVerdict::Limited { retry_after } => Err(AppError::RateLimited {
            retry_after_secs: retry_after.as_secs().max(1),
        }),
    }
}

/// Attach the AI mode and remaining-calls headers to a response.
pub(crate) fn with_ai_headers(
    body: impl IntoResponse,
    mode: AiMode,
    calls_remaining: Option<u32>,
) -> Response {
    let mut response = body.into_response();
    response.headers_mut().insert(
        HeaderName::from_static(AI_MODE_HEADER),
        HeaderValue::from_static(mode.as_str()),
    );
    if let Some(remaining) = calls_remaining {
        if let Ok(value) = HeaderValue::from_str(&remaining.to_string()) {
            response
                .headers_mut()
                .insert(HeaderName::from_static(CALLS_REMAINING_HEADER), value);
        }
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn forwarded_header_wins_over_the_socket_address() {
        let addr: SocketAddr = "10.0.0.1:9999".parse().unwrap();

        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "203.0.113.7, 10.0.0.1".parse().unwrap());
        assert_eq!(
            client_ip(&addr, &headers),
            "203.0.113.7".parse::<IpAddr>().unwrap()
        );

        let empty = HeaderMap::new();
        assert_eq!(client_ip(&addr, &empty), "10.0.0.1".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn garbage_forwarded_header_falls_back_to_the_socket() {
        let addr: SocketAddr = "10.0.0.1:9999".parse().unwrap();
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "not-an-address".parse().unwrap());
        assert_eq!(client_ip(&addr, &headers), "10.0.0.1".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn limiter_verdicts_map_onto_the_http_contract() {
        let limiter = FixedWindowLimiter::new(2, Duration::from_secs(60));
        let client: IpAddr = "198.51.100.2".parse().unwrap();

        assert_eq!(enforce_limit(&limiter, client).unwrap(), 1);
        assert_eq!(enforce_limit(&limiter, client).unwrap(), 0);
        let err = enforce_limit(&limiter, client).unwrap_err();
        assert!(matches!(err, AppError::RateLimited { .. }));
    }
}
