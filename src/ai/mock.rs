//! Canned generators used whenever live generation is unavailable.
//!
//! Everything here is cheap, offline, and good enough to keep a session
//! playable: the shark decision is a scored heuristic and the text pools are
//! small hand-written libraries.

use rand::seq::IndexedRandom;

use crate::{
    ai::{DecisionContext, SharkDecision, SwimmerContext},
    state::game::{CommentaryStyle, NpcRole, SharkAction, TauntTrigger},
};

/// Diagonal of the arena; the longest distance two actors can be apart.
const MAX_DISTANCE: f32 = 400.0;

/// Score one swimmer as prey. Higher is more interesting to the shark.
fn prey_score(ctx: &DecisionContext, swimmer: &SwimmerContext) -> f32 {
    let distance = ctx.shark_position.distance(&swimmer.position);
    let proximity = 1.0 - (distance / MAX_DISTANCE).clamp(0.0, 1.0);
    let frailty = 1.0 - f32::from(swimmer.health) / 100.0;
    0.35 * proximity + 0.25 * frailty + 0.25 * swimmer.noise + 0.15 * swimmer.threat
}

/// Pick the shark's next move without a language model.
///
/// The heuristic favours close, weakened, and noisy swimmers, escalates with
/// aggression, and backs off when nothing in the water is worth the energy.
pub fn decide(ctx: &DecisionContext) -> SharkDecision {
    let Some((best, score)) = ctx
        .swimmers
        .iter()
        .map(|swimmer| (swimmer, prey_score(ctx, swimmer)))
        .max_by(|a, b| a.1.total_cmp(&b.1))
    else {
        return SharkDecision {
            action: SharkAction::Patrol,
            target: None,
            target_name: None,
            aggression: (ctx.aggression * 0.8).clamp(0.0, 1.0),
            reasoning: "The water is empty; cruising the deep end.".into(),
            taunt: None,
        };
    };

    let aggression = (0.6 * ctx.aggression + 0.5 * score).clamp(0.0, 1.0);
    let distance = ctx.shark_position.distance(&best.position);

    if score < 0.2 {
        return SharkDecision {
            action: SharkAction::Patrol,
            target: None,
            target_name: None,
            aggression,
            reasoning: "No swimmer is worth the energy right now.".into(),
            taunt: None,
        };
    }

    let (action, reasoning, taunt) = if distance > 120.0 {
        (
            SharkAction::Stalk,
            format!("{} looks promising; closing the distance quietly.", best.name),
            None,
        )
    } else if distance > 50.0 {
        (
            SharkAction::Circle,
            format!("Tightening circles around {}; no need to rush.", best.name),
            None,
        )
    } else if aggression > 0.55 {
        (
            SharkAction::Attack,
            format!(
                "{} is close, loud, and slow. Committing to the strike.",
                best.name
            ),
            Some(format!("Nowhere left to swim, {}.", best.name)),
        )
    } else {
        (
            SharkAction::Circle,
            format!("{} is within reach but the mood is not right yet.", best.name),
            None,
        )
    };

    SharkDecision {
        action,
        target: best.id,
        target_name: Some(best.name.clone()),
        aggression,
        reasoning,
        taunt,
    }
}

/// Taunt lines per trigger, ordered from a lazy jab to full theatre.
fn taunt_pool(trigger: TauntTrigger) -> [&'static str; 5] {
    match trigger {
        TauntTrigger::Spotted => [
            "Oh. {target}. Didn't see you there.",
            "Well well, {target} picked the wrong beach.",
            "I see you, {target}. The water told me.",
            "{target}! Stay right there, I'll come to you.",
            "THERE you are, {target}. I've been saving an appetite just for this.",
        ],
        TauntTrigger::Missed => [
            "Hm. Slippery.",
            "That one was practice, {target}.",
            "Lucky kick, {target}. I never miss twice.",
            "You FELT that one go by, didn't you, {target}?",
            "MISSED?! Fine. FINE. Now it's personal, {target}!",
        ],
        TauntTrigger::Struck => [
            "Tag. You're it.",
            "Just a nibble, {target}. For now.",
            "That's one bite, {target}. I count in threes.",
            "Did you hear that crunch, {target}? The whole beach did.",
            "DELICIOUS. {target}, you and I are not done. Not even close!",
        ],
        TauntTrigger::PlayerEscaped => [
            "Go on then. Dry land is boring anyway.",
            "Run along, {target}. The tide comes back.",
            "You swim fast for lunch, {target}.",
            "Enjoy the sand, {target}. I have a very good memory.",
            "ESCAPED?! Nobody escapes! {target}, I will learn your SCHEDULE!",
        ],
        TauntTrigger::ObjectiveDone => [
            "Congratulations. Nobody cares.",
            "Cute little shells. I collect things too.",
            "Finish all the chores you like, {target}. The exit is through me.",
            "Every shell you grab is time you're not watching the water.",
            "CELEBRATE LOUDER, {target}! I love it when dinner rings the bell!",
        ],
        TauntTrigger::Idle => [
            "Boring beach today.",
            "Anyone going to actually swim, or just paddle?",
            "I can do this all day. Can you, {target}?",
            "The longer it's quiet, the hungrier I get.",
            "SOMEBODY SPLASH SOMETHING! A shark could starve down here!",
        ],
    }
}

/// Fill the taunt template for one trigger at the given intensity.
///
/// Intensity maps onto the pool index, so 1 is mild and 5 is theatrical.
pub fn taunt(trigger: TauntTrigger, target: Option<&str>, intensity: u8) -> String {
    let pool = taunt_pool(trigger);
    let index = usize::from(intensity.clamp(1, 5)) - 1;
    pool[index].replace("{target}", target.unwrap_or("little swimmer"))
}

/// One NPC chat reply, matched on keywords with a per-role idle fallback.
pub fn npc_line(role: NpcRole, message: &str) -> String {
    let lowered = message.to_lowercase();

    if lowered.contains("shark") {
        return match role {
            NpcRole::Lifeguard => {
                "Eyes on it since sunrise. Stay in pairs, stay noisy on the sand, \
                 quiet in the water."
            }
            NpcRole::Surfer => {
                "Oh, Finn? Yeah, we've met. Gnarly dude. Just don't paddle like a \
                 seal and you're mostly fine."
            }
            NpcRole::IceCreamVendor => {
                "Shark weather is cone weather, friend. Fear burns calories. \
                 Double scoop?"
            }
            NpcRole::OldSalt => {
                "That fish has outlived three piers and every man who laughed at \
                 it. Mind the deep channel."
            }
        }
        .to_string();
    }

    if lowered.contains("help") || lowered.contains("rescue") || lowered.contains("drown") {
        return match role {
            NpcRole::Lifeguard => {
                "Point me at them. You swim to a downed friend, you grab them \
                 under the arms, you kick for shore. Go!"
            }
            NpcRole::Surfer => {
                "Whoa, okay, breathe. Paddle out with the rip, not against it. \
                 I've pulled three tourists out that way."
            }
            NpcRole::IceCreamVendor => {
                "I sell ice cream, not miracles. The tall lady with the whistle \
                 is your best bet."
            }
            NpcRole::OldSalt => {
                "Seen a hundred rescues. The ones that work are fast and quiet. \
                 Stop talking to me and go."
            }
        }
        .to_string();
    }

    if lowered.contains("ice cream") || lowered.contains("buy") || lowered.contains("flavour")
        || lowered.contains("flavor")
    {
        return match role {
            NpcRole::IceCreamVendor => {
                "Today's special is Riptide Swirl. Sea salt, caramel, a little \
                 dread. Two scoops and I throw in a shell."
            }
            NpcRole::Lifeguard => {
                "Wait half an hour after eating. I don't make the rules. \
                 Actually, I do."
            }
            NpcRole::Surfer => "Scoops has the good stuff. Tell him Kai sent you.",
            NpcRole::OldSalt => {
                "Ice cream. On this beach. With that thing in the water. \
                 Youth is wasted on the young."
            }
        }
        .to_string();
    }

    if lowered.contains("shell") || lowered.contains("objective") || lowered.contains("score") {
        return match role {
            NpcRole::Lifeguard => {
                "Shells wash up thickest by the sandbar. Collect fast and keep \
                 your head on a swivel."
            }
            NpcRole::Surfer => "Best shells are past the break. Worth the paddle, probably.",
            NpcRole::IceCreamVendor => {
                "Bring me ten nice shells and we'll talk discounts."
            }
            NpcRole::OldSalt => {
                "Chasing trinkets while the water watches you back. Your funeral."
            }
        }
        .to_string();
    }

    idle_line(role)
}

fn idle_line(role: NpcRole) -> String {
    let pool: [&str; 3] = match role {
        NpcRole::Lifeguard => [
            "Keep it between the flags and we'll all have a quiet day.",
            "Swim near the group. Stragglers make my job interesting.",
            "Nice day. Too nice. Stay sharp out there.",
        ],
        NpcRole::Surfer => [
            "Waves are mellow, vibes are high. Mostly.",
            "You ever just float and let the ocean do the thinking?",
            "If the water goes quiet, that's your cue to not be in it.",
        ],
        NpcRole::IceCreamVendor => [
            "Beautiful day for commerce! I mean swimming. Commerce.",
            "Everything's better with sprinkles. Even evacuation drills.",
            "Fresh waffle cones! Limited stock, unlimited optimism.",
        ],
        NpcRole::OldSalt => [
            "The sea gives and the sea takes. Mostly takes.",
            "I've seen calmer water turn ugly between two breaths.",
            "Sit down, I'll tell you about the summer of the red buoy. Or don't.",
        ],
    };

    let mut rng = rand::rng();
    pool.choose(&mut rng).copied().unwrap_or(pool[0]).to_string()
}

/// One canned narration line for an event, in the requested style.
pub fn narration(style: CommentaryStyle, event: &str, intensity: u8) -> String {
    let intensity = intensity.clamp(1, 5);
    match style {
        CommentaryStyle::Documentary => match intensity {
            1..=2 => format!(
                "Here, in the sunlit shallows, {event}. The colony is untroubled, for now."
            ),
            3 => format!(
                "{event}. The apex predator takes note, as it has for forty million years."
            ),
            _ => format!(
                "{event}. And in this instant the ancient arithmetic of the ocean asserts itself."
            ),
        },
        CommentaryStyle::Sports => match intensity {
            1..=2 => format!("{event}, and the crowd on the sand barely looks up from its towels."),
            3 => format!("{event}! That's going to shake up the leaderboard, folks!"),
            _ => format!(
                "UNBELIEVABLE! {event}! I have never seen anything like this on any beach, ever!"
            ),
        },
        CommentaryStyle::Horror => match intensity {
            1..=2 => format!("{event}. The water is calm. That is precisely the problem."),
            3 => format!("{event}, and somewhere below, something changes its mind."),
            _ => format!(
                "{event}. The gulls stop screaming all at once, and the beach finally understands."
            ),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::game::Vec2;

    fn swimmer(name: &str, x: f32, y: f32, health: u8, noise: f32) -> SwimmerContext {
        SwimmerContext {
            id: Some(uuid::Uuid::new_v4()),
            name: name.into(),
            position: Vec2 { x, y },
            health,
            noise,
            threat: 0.0,
        }
    }

    fn context(aggression: f32, swimmers: Vec<SwimmerContext>) -> DecisionContext {
        DecisionContext {
            shark_position: Vec2 { x: 160.0, y: 200.0 },
            aggression,
            swimmers,
        }
    }

    #[test]
    fn empty_water_means_patrol() {
        let decision = decide(&context(0.5, Vec::new()));
        assert_eq!(decision.action, SharkAction::Patrol);
        assert!(decision.target.is_none());
    }

    #[test]
    fn quiet_healthy_distant_swimmers_are_ignored() {
        let decision = decide(&context(
            0.1,
            vec![swimmer("ada", 20.0, 45.0, 100, 0.0)],
        ));
        assert_eq!(decision.action, SharkAction::Patrol);
        assert!(decision.target.is_none());
    }

    #[test]
    fn wounded_noisy_neighbour_gets_attacked() {
        let prey = swimmer("ada", 165.0, 195.0, 20, 0.9);
        let prey_id = prey.id;
        let decision = decide(&context(0.7, vec![prey]));

        assert_eq!(decision.action, SharkAction::Attack);
        assert_eq!(decision.target, prey_id);
        assert!(decision.taunt.is_some());
        assert!(decision.aggression > 0.5);
    }

    #[test]
    fn distant_prey_is_stalked_first() {
        let decision = decide(&context(
            0.6,
            vec![swimmer("ada", 20.0, 50.0, 30, 0.8)],
        ));
        assert_eq!(decision.action, SharkAction::Stalk);
    }

    #[test]
    fn the_louder_swimmer_draws_the_shark() {
        let quiet = swimmer("quiet", 150.0, 150.0, 80, 0.0);
        let loud = swimmer("loud", 170.0, 150.0, 80, 1.0);
        let loud_id = loud.id;

        let decision = decide(&context(0.5, vec![quiet, loud]));
        assert_eq!(decision.target, loud_id);
    }

    #[test]
    fn taunt_intensity_selects_the_register() {
        let mild = taunt(TauntTrigger::Spotted, Some("Ada"), 1);
        let wild = taunt(TauntTrigger::Spotted, Some("Ada"), 5);
        assert!(mild.contains("Ada"));
        assert!(wild.contains("Ada"));
        assert_ne!(mild, wild);
    }

    #[test]
    fn taunt_without_target_uses_the_generic_address() {
        let line = taunt(TauntTrigger::Idle, None, 3);
        assert!(line.contains("little swimmer"));
    }

    #[test]
    fn npc_reacts_to_shark_questions_in_role() {
        let line = npc_line(NpcRole::OldSalt, "Have you seen the shark?");
        assert!(line.contains("pier") || line.contains("channel"));

        let pitch = npc_line(NpcRole::IceCreamVendor, "What flavours do you have?");
        assert!(pitch.contains("Riptide Swirl"));
    }

    #[test]
    fn npc_falls_back_to_idle_chatter() {
        let line = npc_line(NpcRole::Surfer, "nice weather today");
        assert!(!line.is_empty());
    }

    #[test]
    fn narration_embeds_the_event_and_matches_the_style() {
        let line = narration(CommentaryStyle::Sports, "Ada grabs the last shell", 4);
        assert!(line.contains("Ada grabs the last shell"));
        assert!(line.contains("UNBELIEVABLE"));

        let calm = narration(CommentaryStyle::Horror, "the tide rolls in", 1);
        assert!(calm.contains("precisely the problem"));
    }
}
