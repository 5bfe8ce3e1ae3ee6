//! Narration of game moments in one of the commentary voices.

use uuid::Uuid;

use crate::{
    ai::{ActionKind, AiMode, LlmRequest, mock, prompt},
    dto::{commentary::{CommentaryDone, CommentaryRequest}, game::CommentarySummary},
    error::ServiceError,
    services::sse_events,
    state::{
        SharedState,
        game::{CommentaryRecord, CommentaryStyle},
    },
};

/// Narrate one game moment, optionally logging the line into a session.
pub async fn narrate(
    state: &SharedState,
    request: CommentaryRequest,
) -> Result<(CommentaryDone, AiMode), ServiceError> {
    state.ai().count_action(ActionKind::Commentary);

    let style: CommentaryStyle = request.style.into();
    let llm_request = LlmRequest {
        system: prompt::render_template(
            prompt::COMMENTARY_SYSTEM,
            &[("style_brief", prompt::style_brief(style))],
        ),
        user: prompt::render_template(
            prompt::COMMENTARY_USER,
            &[
                ("event", &request.event),
                ("intensity", &request.intensity.to_string()),
            ],
        ),
        max_tokens: 120,
        temperature: 0.85,
    };

    let outcome = state
        .ai()
        .generate_text_or(&llm_request, || {
            mock::narration(style, &request.event, request.intensity)
        })
        .await;

    if let Some(game_id) = request.game_id {
        record_line(state, game_id, style, &request.event, &outcome.text).await?;
    }

    Ok((
        CommentaryDone {
            style: request.style,
            intensity: request.intensity,
            text: outcome.text,
            mode: outcome.mode.as_str().to_owned(),
        },
        outcome.mode,
    ))
}

async fn record_line(
    state: &SharedState,
    game_id: Uuid,
    style: CommentaryStyle,
    subject: &str,
    text: &str,
) -> Result<(), ServiceError> {
    let room = state.require_room(game_id)?;
    let summary = room
        .with_session(|session| {
            let record = CommentaryRecord {
                id: Uuid::new_v4(),
                style,
                text: text.to_owned(),
                subject: subject.to_owned(),
                at: std::time::SystemTime::now(),
            };
            let summary = CommentarySummary::from(&record);
            session.record_commentary(record);
            summary
        })
        .await;
    sse_events::broadcast_commentary_recorded(&room, summary);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AppConfig,
        dto::{commentary::CommentaryStyleDto, game::CreateGameRequest},
        services::game_service,
        state::AppState,
    };

    #[tokio::test]
    async fn narration_embeds_the_moment() {
        let state = AppState::new(AppConfig::default()).expect("state");
        let (done, mode) = narrate(
            &state,
            CommentaryRequest {
                event: "Ada grabs the last shell".into(),
                intensity: 4,
                style: CommentaryStyleDto::Sports,
                game_id: None,
            },
        )
        .await
        .unwrap();

        assert_eq!(mode, AiMode::Mock);
        assert!(done.text.contains("Ada grabs the last shell"));
        assert_eq!(done.mode, "mock");
    }

    #[tokio::test]
    async fn narration_is_logged_into_the_named_game() {
        let state = AppState::new(AppConfig::default()).expect("state");
        let summary = game_service::create_game(
            &state,
            CreateGameRequest {
                name: "sandy-cove".into(),
                host_name: "ada".into(),
                objectives: None,
            },
        )
        .await
        .unwrap();

        let (done, _) = narrate(
            &state,
            CommentaryRequest {
                event: "the tide rolls in".into(),
                intensity: 1,
                style: CommentaryStyleDto::Horror,
                game_id: Some(summary.id),
            },
        )
        .await
        .unwrap();

        let fetched = game_service::get_game(&state, summary.id).await.unwrap();
        assert_eq!(fetched.commentary.len(), 1);
        assert_eq!(fetched.commentary[0].text, done.text);
        assert_eq!(fetched.commentary[0].subject, "the tide rolls in");
    }

    #[tokio::test]
    async fn unknown_game_is_rejected_before_anything_is_logged() {
        let state = AppState::new(AppConfig::default()).expect("state");
        let err = narrate(
            &state,
            CommentaryRequest {
                event: "a fin surfaces".into(),
                intensity: 3,
                style: CommentaryStyleDto::Documentary,
                game_id: Some(Uuid::new_v4()),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }
}
