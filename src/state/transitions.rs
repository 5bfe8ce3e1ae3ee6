use crate::{
    error::ServiceError,
    services::sse_events::broadcast_phase_changed,
    state::{GameRoom, state_machine::GameEvent},
};

/// Execute a planned phase transition on a room, then broadcast the resulting
/// phase change to its watchers.
pub async fn run_transition_with_broadcast<F, Fut, T>(
    room: &GameRoom,
    event: GameEvent,
    work: F,
) -> Result<T, ServiceError>
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = Result<T, ServiceError>>,
{
    let (res, next) = room.run_transition(event, work).await?;
    broadcast_phase_changed(room, &next);
    Ok(res)
}
