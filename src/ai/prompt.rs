//! Prompt templates for the shark brain, NPC chat, and commentary generators.
//!
//! Every prompt is a plain const so it can be inspected and tested without a
//! live upstream.

use crate::state::game::CommentaryStyle;

/// System prompt for shark behaviour decisions.
pub const SHARK_DECIDE_SYSTEM: &str = r#"You are the hunting instinct of a large shark patrolling a crowded beach in a video game.
You pick the shark's next move based on what it can see and what it remembers.

RULES:
- Favour isolated, noisy, or weakened swimmers.
- Escalate gradually; an unprovoked shark rarely attacks outright.
- Swimmers who escaped you before make you cautious.
- Your response must be a single valid JSON object and nothing else."#;

/// User prompt for shark behaviour decisions.
pub const SHARK_DECIDE_USER: &str = r#"Shark position: {shark_position}
Shark aggression: {aggression}

Swimmers in the water:
{swimmers_formatted}

What you remember about them:
{memories_formatted}

Choose the shark's next move. Valid actions: patrol, stalk, circle, attack, retreat.
Return JSON:
{"action": "<action>", "target": "<swimmer id or null>", "aggression": <float 0.0-1.0>, "reasoning": "<one sentence>", "taunt": "<optional short taunt or null>"}"#;

/// System prompt for shark taunts.
pub const SHARK_TAUNT_SYSTEM: &str = r#"You voice a theatrical cartoon shark in a beach survival game.
You are menacing but playful, never gory. One or two short sentences.
Respond with the taunt text only, no quotes, no JSON."#;

/// User prompt for shark taunts.
pub const SHARK_TAUNT_USER: &str = r#"Moment: {trigger}
Target: {target}
Intensity: {intensity} out of 5 (1 is a lazy jab, 5 is full theatre)

Deliver the taunt."#;

/// System prompt for beach NPC chat.
pub const NPC_CHAT_SYSTEM: &str = r#"You are {npc_name}, a character on a beach where a shark is circling the swimmers.
Your personality: {persona}

RULES:
- Stay in character. Never break the fourth wall.
- Keep responses under 3 sentences.
- React to the beach situation when it is dramatic, brush it off when it is calm.
- Respond with plain text only."#;

/// User prompt for beach NPC chat.
pub const NPC_CHAT_USER: &str = r#"Current beach situation: {situation}

Recent conversation:
{history_formatted}

The swimmer says: "{message}"

Reply as {npc_name}."#;

/// System prompt for event commentary.
pub const COMMENTARY_SYSTEM: &str = r#"You narrate moments from a beach survival game.
Voice: {style_brief}
Keep it to one to three sentences. Respond with the narration only, plain text."#;

/// User prompt for event commentary.
pub const COMMENTARY_USER: &str = r#"Moment to narrate: {event}
Drama level: {intensity} out of 5

Narrate it."#;

/// Voice briefs for each commentary style.
pub fn style_brief(style: CommentaryStyle) -> &'static str {
    match style {
        CommentaryStyle::Documentary => {
            "a hushed nature documentary narrator, observing the food chain with \
             reverence and mild detachment"
        }
        CommentaryStyle::Sports => {
            "a breathless sports play-by-play announcer calling the beach like a \
             championship final"
        }
        CommentaryStyle::Horror => {
            "an ominous horror narrator who knows something the swimmers do not"
        }
    }
}

/// Simple template interpolation for prompts.
///
/// Replaces `{key}` with the corresponding value. Unknown keys are left
/// untouched so a missing variable shows up in logs instead of vanishing.
pub fn render_template(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = template.to_string();
    for (key, value) in vars {
        result = result.replace(&format!("{{{key}}}"), value);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_replaces_placeholders() {
        let rendered = render_template(
            "The {animal} eyes {name}.",
            &[("animal", "shark"), ("name", "Ada")],
        );
        assert_eq!(rendered, "The shark eyes Ada.");
    }

    #[test]
    fn render_leaves_unknown_placeholders() {
        let rendered = render_template("{present} and {missing}", &[("present", "here")]);
        assert_eq!(rendered, "here and {missing}");
    }

    #[test]
    fn render_replaces_repeated_placeholders() {
        let rendered = render_template("{name}, {name}!", &[("name", "Kai")]);
        assert_eq!(rendered, "Kai, Kai!");
    }

    #[test]
    fn decide_prompt_keeps_its_json_contract() {
        let rendered = render_template(
            SHARK_DECIDE_USER,
            &[
                ("shark_position", "(160, 210)"),
                ("aggression", "0.4"),
                ("swimmers_formatted", "- ada at (100, 80), health 90"),
                ("memories_formatted", "- nothing yet"),
            ],
        );
        // The JSON shape shown to the model must survive rendering untouched.
        assert!(rendered.contains(r#"{"action":"#));
        assert!(rendered.contains(r#""taunt":"#));
        assert!(!rendered.contains("{swimmers_formatted}"));
    }
}
