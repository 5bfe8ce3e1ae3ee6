//! Riptide backend binary entrypoint wiring REST, WebSocket, SSE, and AI layers.

use std::{env, net::SocketAddr, time::Duration};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tokio::time::sleep;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod ai;
mod config;
mod dto;
mod error;
mod routes;
mod services;
mod state;

use config::AppConfig;
use state::{AppState, SharedState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let app_state = AppState::new(config)?;

    tokio::spawn(run_upstream_supervisor(app_state.clone()));
    tokio::spawn(run_limiter_sweeper(app_state.clone()));
    // Build the HTTP router once the shared state is ready.
    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service_with_connect_info::<SocketAddr>();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Supervises the AI upstream by probing it in the background and toggling
/// mock mode when reachability changes.
async fn run_upstream_supervisor(state: SharedState) {
    if !state.ai().is_configured() {
        info!("no AI upstream configured; serving mock responses only");
        return;
    }

    let initial_delay_ms = 1000;
    let mut delay = Duration::from_millis(initial_delay_ms);
    let max_delay = Duration::from_secs(10);
    let mut last_available: Option<bool> = None;

    loop {
        let available = state.ai().probe().await;
        if last_available != Some(available) {
            last_available = Some(available);
            announce_ai_status(&state);
        }

        if available {
            // Healthy upstream: reset the retry backoff and avoid hammering
            // the provider with probes.
            delay = Duration::from_millis(initial_delay_ms);
            sleep(Duration::from_secs(5)).await;
        } else {
            // Upstream unreachable: stay in mock mode and retry with
            // exponential backoff.
            warn!("AI upstream probe failed; serving mock responses");
            sleep(delay).await;
            delay = (delay * 2).min(max_delay);
        }
    }
}

/// Tell every room's watchers which mode the brain now answers in.
fn announce_ai_status(state: &SharedState) {
    let status = dto::sse::AiStatusEvent {
        mode: state.ai().current_mode().as_str().to_owned(),
        upstream_available: state.ai().upstream_available(),
    };
    for room in state.list_rooms() {
        services::sse_events::broadcast_ai_status(&room, &status);
    }
}

/// Periodically drops elapsed rate-limit windows so idle clients do not
/// accumulate in the limiter maps.
async fn run_limiter_sweeper(state: SharedState) {
    let period = state.config().rate_limit().window();
    loop {
        sleep(period).await;
        state.sweep_limiters();
    }
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: state::SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut term = signal(SignalKind::terminate()).expect("install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
