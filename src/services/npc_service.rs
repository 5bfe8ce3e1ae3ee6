//! Dialogue for the characters on the sand.

use crate::{
    ai::{ActionKind, AiMode, LlmRequest, mock, prompt},
    dto::npc::{ChatSpeakerDto, NpcChatDone, NpcChatRequest},
    error::ServiceError,
    state::{SharedState, game::NpcRole},
};

/// Generate one in-character reply to a swimmer's message.
///
/// When the request names a game the reply is coloured by that session's
/// situation and uses the roster's name and persona for the character.
pub async fn chat(
    state: &SharedState,
    request: NpcChatRequest,
) -> Result<(NpcChatDone, AiMode), ServiceError> {
    state.ai().count_action(ActionKind::NpcChat);

    let role: NpcRole = request.npc.into();
    let (npc_name, persona, situation) = match request.game_id {
        Some(game_id) => {
            let room = state.require_room(game_id)?;
            room.read_session(|session| {
                let (name, persona) = session
                    .npcs
                    .iter()
                    .find(|npc| npc.role == role)
                    .map(|npc| (npc.name.clone(), npc.persona.clone()))
                    .unwrap_or_else(|| {
                        (role.default_name().to_owned(), role.default_persona().to_owned())
                    });
                (name, persona, describe_situation(session))
            })
            .await
        }
        None => (
            role.default_name().to_owned(),
            role.default_persona().to_owned(),
            "An ordinary day at the beach, as far as anyone on the sand knows.".to_owned(),
        ),
    };

    let history_formatted = format_history(&request, &npc_name);
    let llm_request = LlmRequest {
        system: prompt::render_template(
            prompt::NPC_CHAT_SYSTEM,
            &[("npc_name", &npc_name), ("persona", &persona)],
        ),
        user: prompt::render_template(
            prompt::NPC_CHAT_USER,
            &[
                ("situation", &situation),
                ("history_formatted", &history_formatted),
                ("message", &request.message),
                ("npc_name", &npc_name),
            ],
        ),
        max_tokens: 160,
        temperature: 0.8,
    };

    let outcome = state
        .ai()
        .generate_text_or(&llm_request, || mock::npc_line(role, &request.message))
        .await;

    Ok((
        NpcChatDone {
            npc: request.npc,
            npc_name,
            text: outcome.text,
            mode: outcome.mode.as_str().to_owned(),
        },
        outcome.mode,
    ))
}

/// One-paragraph summary of the beach for the dialogue prompt.
fn describe_situation(session: &crate::state::game::GameSession) -> String {
    let swimmers = session.swimmers().count();
    let shark = &session.shark;
    let mut situation = format!(
        "{swimmers} swimmer(s) in the water; the shark is on {:?} with aggression {:.1}.",
        shark.action,
        shark.aggression(),
    );
    if let Some(event) = session.events.back() {
        situation.push_str(&format!(" Most recently: {}.", event.message));
    }
    situation
}

fn format_history(request: &NpcChatRequest, npc_name: &str) -> String {
    if request.history.is_empty() {
        return "(no earlier conversation)".to_owned();
    }
    request
        .history
        .iter()
        .map(|turn| match turn.speaker {
            ChatSpeakerDto::Player => format!("Swimmer: {}", turn.text),
            ChatSpeakerDto::Npc => format!("{npc_name}: {}", turn.text),
        })
        .collect::<Vec<_>>()
        .join("\n")
}
