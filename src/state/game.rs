use std::{collections::VecDeque, time::SystemTime};

use indexmap::IndexMap;
use rand::Rng;
use uuid::Uuid;

/// Width of the playable water area, in world units.
pub const ARENA_WIDTH: f32 = 320.0;
/// Height of the playable water area, in world units.
pub const ARENA_HEIGHT: f32 = 240.0;
/// Everything with `y` below this line is sand and out of the shark's reach.
pub const SHORE_DEPTH: f32 = 40.0;
/// Upper bound for player health.
pub const MAX_HEALTH: u8 = 100;
/// Maximum number of players a session accepts.
pub const MAX_PLAYERS: usize = 8;
/// How many recent events a session keeps in memory.
pub const EVENT_LOG_CAP: usize = 64;
/// How many commentary lines a session keeps in memory.
pub const COMMENTARY_LOG_CAP: usize = 32;
/// Health restored to a swimmer pulled back up by a rescuer.
pub const RESCUE_HEALTH: u8 = 25;

/// A position in the beach coordinate space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vec2 {
    /// Distance along the shoreline.
    pub x: f32,
    /// Distance from the back of the beach towards open water.
    pub y: f32,
}

impl Vec2 {
    /// Euclidean distance to another point.
    pub fn distance(&self, other: &Vec2) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Clamp the point into the playable arena.
    pub fn clamped_to_arena(self) -> Vec2 {
        Vec2 {
            x: self.x.clamp(0.0, ARENA_WIDTH),
            y: self.y.clamp(0.0, ARENA_HEIGHT),
        }
    }
}

/// What a player is currently doing, from the session's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerStatus {
    /// In the water and in play.
    Swimming,
    /// Health reached zero; waiting for a rescue.
    Downed,
    /// Carried back to the sand; out of the water and safe.
    Rescued,
    /// Disconnected or quit.
    Left,
}

/// Player info tracked during a game session.
#[derive(Debug, Clone)]
pub struct Player {
    /// Stable identifier handed out when the player joins.
    pub id: Uuid,
    /// Display name chosen by the player.
    pub name: String,
    /// Current position in the water.
    pub position: Vec2,
    /// Current state of the player within the session.
    pub status: PlayerStatus,
    /// Points collected from objectives and rescues.
    pub score: u32,
    /// When the player joined the session.
    pub joined_at: SystemTime,
    health: u8,
}

impl Player {
    /// Build a new swimmer with full health at a randomized spot in the shallows.
    pub fn new(name: String) -> Self {
        let mut rng = rand::rng();
        let position = Vec2 {
            x: rng.random_range(40.0..ARENA_WIDTH - 40.0),
            y: rng.random_range(SHORE_DEPTH + 10.0..SHORE_DEPTH + 50.0),
        };
        Self {
            id: Uuid::new_v4(),
            name,
            position,
            status: PlayerStatus::Swimming,
            score: 0,
            joined_at: SystemTime::now(),
            health: MAX_HEALTH,
        }
    }

    /// Current health, always within `0..=MAX_HEALTH`.
    pub fn health(&self) -> u8 {
        self.health
    }

    /// Apply a signed health change, clamping the result into `0..=MAX_HEALTH`.
    ///
    /// A swimmer whose health reaches zero goes down and stays down until
    /// rescued; healing alone does not put them back in play.
    pub fn apply_health_delta(&mut self, delta: i16) -> u8 {
        let next = (i16::from(self.health) + delta).clamp(0, i16::from(MAX_HEALTH)) as u8;
        self.health = next;
        if next == 0 && self.status == PlayerStatus::Swimming {
            self.status = PlayerStatus::Downed;
        }
        next
    }

    /// Set health to an absolute value, capped at `MAX_HEALTH`.
    pub fn set_health(&mut self, value: u8) {
        self.health = value.min(MAX_HEALTH);
        if self.health == 0 && self.status == PlayerStatus::Swimming {
            self.status = PlayerStatus::Downed;
        }
    }

    /// Mark the player as rescued and restore a sliver of health.
    pub fn rescue(&mut self) {
        self.status = PlayerStatus::Rescued;
        self.health = self.health.max(RESCUE_HEALTH);
    }
}

/// The shark's observable behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SharkAction {
    /// Cruising open water with no particular target.
    Patrol,
    /// Shadowing a swimmer from below.
    Stalk,
    /// Tightening circles around a swimmer.
    Circle,
    /// Committed strike.
    Attack,
    /// Backing off into deeper water.
    Retreat,
}

/// Aggregated shark state for one session.
#[derive(Debug, Clone)]
pub struct SharkState {
    /// Where the shark currently is.
    pub position: Vec2,
    /// What the shark is currently doing.
    pub action: SharkAction,
    /// Swimmer the shark is focused on, when any.
    pub target: Option<Uuid>,
    /// What the shark knows about individual swimmers.
    pub memories: IndexMap<Uuid, SharkMemory>,
    aggression: f32,
}

impl SharkState {
    /// A fresh shark patrolling deep water.
    pub fn new() -> Self {
        Self {
            position: Vec2 {
                x: ARENA_WIDTH / 2.0,
                y: ARENA_HEIGHT - 30.0,
            },
            action: SharkAction::Patrol,
            target: None,
            memories: IndexMap::new(),
            aggression: 0.2,
        }
    }

    /// Current aggression, always within `0.0..=1.0`.
    pub fn aggression(&self) -> f32 {
        self.aggression
    }

    /// Set aggression, clamping into `0.0..=1.0`.
    pub fn set_aggression(&mut self, value: f32) {
        self.aggression = value.clamp(0.0, 1.0);
    }

    /// Memory record for a swimmer, created lazily on first contact.
    pub fn memory_mut(&mut self, player_id: Uuid) -> &mut SharkMemory {
        self.memories
            .entry(player_id)
            .or_insert_with(|| SharkMemory::new(player_id))
    }

    /// Record that the shark noticed a swimmer at a position.
    pub fn note_encounter(&mut self, player_id: Uuid, at: Vec2) {
        let memory = self.memory_mut(player_id);
        memory.encounters += 1;
        memory.last_seen = Some(at);
        memory.touch();
    }

    /// Record noise made by a swimmer. Noise accumulates and saturates at 1.0.
    pub fn note_noise(&mut self, player_id: Uuid, amount: f32) {
        let memory = self.memory_mut(player_id);
        memory.noise_level = (memory.noise_level + amount).clamp(0.0, 1.0);
        memory.touch();
    }
}

impl Default for SharkState {
    fn default() -> Self {
        Self::new()
    }
}

/// Moments that can prompt the shark to taunt the swimmers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TauntTrigger {
    /// The shark just noticed someone.
    Spotted,
    /// A strike that met nothing but water.
    Missed,
    /// A strike that landed.
    Struck,
    /// The prey got away.
    PlayerEscaped,
    /// The swimmers finished an objective.
    ObjectiveDone,
    /// Nothing is happening and the shark is bored.
    Idle,
}

/// What the shark remembers about one swimmer.
#[derive(Debug, Clone)]
pub struct SharkMemory {
    /// Swimmer this record is about.
    pub player_id: Uuid,
    /// Times the shark has noticed this swimmer.
    pub encounters: u32,
    /// Successful strikes against this swimmer.
    pub strikes_landed: u32,
    /// Times this swimmer got away mid-hunt.
    pub escapes: u32,
    /// Accumulated noise attributed to this swimmer, `0.0..=1.0`.
    pub noise_level: f32,
    /// Last position the shark saw this swimmer at.
    pub last_seen: Option<Vec2>,
    /// Derived appeal of this swimmer as prey, `0.0..=1.0`.
    pub threat_score: f32,
    /// Last time this record changed.
    pub updated_at: SystemTime,
}

/// Partial update for a [`SharkMemory`]. Absent fields keep their value.
#[derive(Debug, Clone, Default)]
pub struct SharkMemoryPatch {
    /// New encounter count.
    pub encounters: Option<u32>,
    /// New landed-strike count.
    pub strikes_landed: Option<u32>,
    /// New escape count.
    pub escapes: Option<u32>,
    /// New noise level, clamped into `0.0..=1.0`.
    pub noise_level: Option<f32>,
    /// New last-seen position.
    pub last_seen: Option<Vec2>,
}

impl SharkMemory {
    /// Blank record for a swimmer the shark just met.
    pub fn new(player_id: Uuid) -> Self {
        Self {
            player_id,
            encounters: 0,
            strikes_landed: 0,
            escapes: 0,
            noise_level: 0.0,
            last_seen: None,
            threat_score: 0.0,
            updated_at: SystemTime::now(),
        }
    }

    /// Apply a patch, then refresh the derived threat score and timestamp.
    pub fn merge(&mut self, patch: &SharkMemoryPatch) {
        if let Some(encounters) = patch.encounters {
            self.encounters = encounters;
        }
        if let Some(strikes) = patch.strikes_landed {
            self.strikes_landed = strikes;
        }
        if let Some(escapes) = patch.escapes {
            self.escapes = escapes;
        }
        if let Some(noise) = patch.noise_level {
            self.noise_level = noise.clamp(0.0, 1.0);
        }
        if let Some(seen) = patch.last_seen {
            self.last_seen = Some(seen);
        }
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = SystemTime::now();
        self.recompute_threat();
    }

    /// Refresh the derived threat score from the raw counters.
    ///
    /// Strikes and noise make a swimmer more interesting, escapes make the
    /// shark wary. Counters saturate so one lucky streak cannot dominate.
    fn recompute_threat(&mut self) {
        let strikes = self.strikes_landed.min(10) as f32 / 10.0;
        let encounters = self.encounters.min(20) as f32 / 20.0;
        let escapes = self.escapes.min(10) as f32 / 10.0;
        let raw = 0.35 * strikes + 0.15 * encounters + 0.4 * self.noise_level - 0.3 * escapes;
        self.threat_score = raw.clamp(0.0, 1.0);
    }
}

/// Goal categories a session can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectiveKind {
    /// Pull downed swimmers back up.
    Rescue,
    /// Gather shells scattered in the shallows.
    Collect,
    /// Stay in the water for a while.
    Survive,
}

/// One goal the swimmers work towards.
#[derive(Debug, Clone)]
pub struct Objective {
    /// Stable identifier.
    pub id: Uuid,
    /// Player-facing description.
    pub description: String,
    /// What counts towards this objective.
    pub kind: ObjectiveKind,
    /// Progress needed to complete the objective.
    pub target: u32,
    /// Progress so far.
    pub progress: u32,
    /// Whether the objective has been completed.
    pub completed: bool,
}

impl Objective {
    /// Build a fresh objective with zero progress.
    pub fn new(description: String, kind: ObjectiveKind, target: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            description,
            kind,
            target: target.max(1),
            progress: 0,
            completed: false,
        }
    }

    /// Advance progress and report whether this call completed the objective.
    pub fn advance(&mut self, by: u32) -> bool {
        if self.completed {
            return false;
        }
        self.progress = (self.progress + by).min(self.target);
        if self.progress >= self.target {
            self.completed = true;
            return true;
        }
        false
    }
}

/// Beach characters the players can talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NpcRole {
    /// Watches the water from the tower.
    Lifeguard,
    /// Has seen the shark up close and lived.
    Surfer,
    /// Sells ice cream, rain or shine or shark.
    IceCreamVendor,
    /// Retired fisherman full of dark stories.
    OldSalt,
}

impl NpcRole {
    /// All roles in roster order.
    pub const ALL: [NpcRole; 4] = [
        NpcRole::Lifeguard,
        NpcRole::Surfer,
        NpcRole::IceCreamVendor,
        NpcRole::OldSalt,
    ];

    /// Default display name for this role.
    pub fn default_name(&self) -> &'static str {
        match self {
            NpcRole::Lifeguard => "Marina",
            NpcRole::Surfer => "Kai",
            NpcRole::IceCreamVendor => "Scoops",
            NpcRole::OldSalt => "Captain Briggs",
        }
    }

    /// Default persona description used to brief the dialogue generator.
    pub fn default_persona(&self) -> &'static str {
        match self {
            NpcRole::Lifeguard => {
                "A no-nonsense lifeguard who takes water safety personally and \
                 never quite trusts a calm sea."
            }
            NpcRole::Surfer => {
                "A laid-back surfer who talks in waves and swears the shark once \
                 winked at them."
            }
            NpcRole::IceCreamVendor => {
                "A cheerful ice cream vendor who sees every crisis as a sales \
                 opportunity."
            }
            NpcRole::OldSalt => {
                "A retired fisherman who speaks in grim proverbs and claims to \
                 know the shark by name."
            }
        }
    }
}

/// One character standing on the sand.
#[derive(Debug, Clone)]
pub struct Npc {
    /// Stable identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Which stock character this is.
    pub role: NpcRole,
    /// Personality brief used when generating dialogue.
    pub persona: String,
    /// Where the character stands on the beach.
    pub position: Vec2,
}

/// The default cast present on every beach.
pub fn default_roster() -> Vec<Npc> {
    NpcRole::ALL
        .iter()
        .enumerate()
        .map(|(index, role)| Npc {
            id: Uuid::new_v4(),
            name: role.default_name().to_owned(),
            role: *role,
            persona: role.default_persona().to_owned(),
            position: Vec2 {
                x: 40.0 + index as f32 * 80.0,
                y: SHORE_DEPTH / 2.0,
            },
        })
        .collect()
}

/// Kinds of moves a swimmer can make.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerActionKind {
    /// Loud splashing. Attracts attention.
    Splash,
    /// Slip under the surface. Quieter, briefly.
    Dive,
    /// A burst of fast swimming.
    SwimBurst,
    /// Wave towards the beach.
    Wave,
    /// Pick up a shell for the collection objective.
    CollectShell,
    /// Pull a downed swimmer back up.
    Rescue,
    /// Taunt the shark directly. Bold.
    TauntShark,
}

impl PlayerActionKind {
    /// How much noise this action adds to the actor's shark memory.
    /// Negative values make the swimmer harder to notice.
    pub fn noise_delta(&self) -> f32 {
        match self {
            PlayerActionKind::Splash => 0.3,
            PlayerActionKind::Dive => -0.2,
            PlayerActionKind::SwimBurst => 0.25,
            PlayerActionKind::Wave => 0.15,
            PlayerActionKind::CollectShell => 0.05,
            PlayerActionKind::Rescue => 0.2,
            PlayerActionKind::TauntShark => 0.5,
        }
    }
}

/// Categories of entries in the session event log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// A player joined the session.
    PlayerJoined,
    /// A player left the session.
    PlayerLeft,
    /// A swimmer went down.
    PlayerDowned,
    /// A downed swimmer was rescued.
    PlayerRescued,
    /// Host role moved to another player.
    HostChanged,
    /// A swimmer performed an action.
    ActionPerformed,
    /// The shark made a decision.
    SharkDecision,
    /// The shark taunted the swimmers.
    SharkTaunt,
    /// An objective advanced.
    ObjectiveProgress,
    /// An objective was completed.
    ObjectiveComplete,
    /// The session phase changed.
    PhaseChanged,
}

/// One entry in the capped session event log.
#[derive(Debug, Clone)]
pub struct EventRecord {
    /// Stable identifier.
    pub id: Uuid,
    /// What kind of thing happened.
    pub kind: EventKind,
    /// Player-facing description.
    pub message: String,
    /// Player involved, when one is.
    pub player_id: Option<Uuid>,
    /// How dramatic the moment was, `1..=5`.
    pub intensity: u8,
    /// When it happened.
    pub at: SystemTime,
}

impl EventRecord {
    /// Build a new event, clamping the intensity into `1..=5`.
    pub fn new(kind: EventKind, message: String, player_id: Option<Uuid>, intensity: u8) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            message,
            player_id,
            intensity: intensity.clamp(1, 5),
            at: SystemTime::now(),
        }
    }
}

/// Voice used when narrating a moment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentaryStyle {
    /// Hushed nature-documentary narrator.
    Documentary,
    /// Breathless play-by-play announcer.
    Sports,
    /// Something is wrong with this beach.
    Horror,
}

/// One narration line kept with the session.
#[derive(Debug, Clone)]
pub struct CommentaryRecord {
    /// Stable identifier.
    pub id: Uuid,
    /// Voice the line was delivered in.
    pub style: CommentaryStyle,
    /// The narration itself.
    pub text: String,
    /// What the line was about.
    pub subject: String,
    /// When it was recorded.
    pub at: SystemTime,
}

/// Aggregated state for one beach session.
#[derive(Debug, Clone)]
pub struct GameSession {
    /// Primary key of the session.
    pub id: Uuid,
    /// Display name of the beach / lobby.
    pub name: String,
    /// Creation timestamp for auditing/debugging.
    pub created_at: SystemTime,
    /// Last time the session changed.
    pub updated_at: SystemTime,
    /// Player currently holding host rights.
    pub host_player: Uuid,
    /// Participating players keyed by id, in join order.
    pub players: IndexMap<Uuid, Player>,
    /// The one shark this beach has.
    pub shark: SharkState,
    /// Goals the swimmers work towards.
    pub objectives: Vec<Objective>,
    /// Characters on the sand.
    pub npcs: Vec<Npc>,
    /// Recent happenings, oldest first, capped at [`EVENT_LOG_CAP`].
    pub events: VecDeque<EventRecord>,
    /// Recent narration, oldest first, capped at [`COMMENTARY_LOG_CAP`].
    pub commentary: VecDeque<CommentaryRecord>,
}

impl GameSession {
    /// Build a new in-memory session with the provided host and goals.
    pub fn new(name: String, host: Player, objectives: Vec<Objective>, npcs: Vec<Npc>) -> Self {
        let timestamp = SystemTime::now();
        let host_id = host.id;
        let mut players = IndexMap::new();
        players.insert(host_id, host);

        Self {
            id: Uuid::new_v4(),
            name,
            created_at: timestamp,
            updated_at: timestamp,
            host_player: host_id,
            players,
            shark: SharkState::new(),
            objectives,
            npcs,
            events: VecDeque::new(),
            commentary: VecDeque::new(),
        }
    }

    /// Refresh the update timestamp.
    pub fn touch(&mut self) {
        self.updated_at = SystemTime::now();
    }

    /// Append an event, evicting the oldest entry once the log is full.
    pub fn record_event(&mut self, event: EventRecord) {
        if self.events.len() >= EVENT_LOG_CAP {
            self.events.pop_front();
        }
        self.events.push_back(event);
        self.touch();
    }

    /// Append a narration line, evicting the oldest once the log is full.
    pub fn record_commentary(&mut self, record: CommentaryRecord) {
        if self.commentary.len() >= COMMENTARY_LOG_CAP {
            self.commentary.pop_front();
        }
        self.commentary.push_back(record);
        self.touch();
    }

    /// Players still actively swimming.
    pub fn swimmers(&self) -> impl Iterator<Item = &Player> {
        self.players
            .values()
            .filter(|player| player.status == PlayerStatus::Swimming)
    }

    /// Whether nobody is left in the water.
    pub fn no_swimmers_left(&self) -> bool {
        self.swimmers().next().is_none()
    }

    /// Whether every objective has been completed.
    pub fn objectives_complete(&self) -> bool {
        !self.objectives.is_empty() && self.objectives.iter().all(|objective| objective.completed)
    }

    /// Advance every objective of the given kind, returning descriptions of
    /// the ones this call completed.
    pub fn advance_objectives(&mut self, kind: ObjectiveKind, by: u32) -> Vec<String> {
        let mut completed = Vec::new();
        for objective in &mut self.objectives {
            if objective.kind == kind && objective.advance(by) {
                completed.push(objective.description.clone());
            }
        }
        if !completed.is_empty() {
            self.touch();
        }
        completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_with_host() -> (GameSession, Uuid) {
        let host = Player::new("ada".into());
        let host_id = host.id;
        let session = GameSession::new(
            "sandy-cove".into(),
            host,
            vec![Objective::new("collect 3 shells".into(), ObjectiveKind::Collect, 3)],
            default_roster(),
        );
        (session, host_id)
    }

    #[test]
    fn health_delta_clamps_at_zero_and_downs_the_swimmer() {
        let mut player = Player::new("ada".into());
        assert_eq!(player.apply_health_delta(-250), 0);
        assert_eq!(player.status, PlayerStatus::Downed);
    }

    #[test]
    fn health_delta_clamps_at_max() {
        let mut player = Player::new("ada".into());
        player.apply_health_delta(-30);
        assert_eq!(player.apply_health_delta(90), MAX_HEALTH);
    }

    #[test]
    fn healing_does_not_revive_a_downed_swimmer() {
        let mut player = Player::new("ada".into());
        player.apply_health_delta(-200);
        player.apply_health_delta(50);
        assert_eq!(player.status, PlayerStatus::Downed);
        assert_eq!(player.health(), 50);
    }

    #[test]
    fn set_health_caps_at_max() {
        let mut player = Player::new("ada".into());
        player.set_health(255);
        assert_eq!(player.health(), MAX_HEALTH);
    }

    #[test]
    fn rescue_restores_a_floor_of_health() {
        let mut player = Player::new("ada".into());
        player.apply_health_delta(-200);
        player.rescue();
        assert_eq!(player.status, PlayerStatus::Rescued);
        assert_eq!(player.health(), RESCUE_HEALTH);
    }

    #[test]
    fn aggression_is_clamped() {
        let mut shark = SharkState::new();
        shark.set_aggression(3.5);
        assert_eq!(shark.aggression(), 1.0);
        shark.set_aggression(-1.0);
        assert_eq!(shark.aggression(), 0.0);
    }

    #[test]
    fn noise_accumulates_and_saturates() {
        let mut shark = SharkState::new();
        let swimmer = Uuid::new_v4();
        shark.note_noise(swimmer, 0.7);
        shark.note_noise(swimmer, 0.7);
        assert_eq!(shark.memories[&swimmer].noise_level, 1.0);
    }

    #[test]
    fn memory_merge_recomputes_threat() {
        let mut memory = SharkMemory::new(Uuid::new_v4());
        assert_eq!(memory.threat_score, 0.0);

        memory.merge(&SharkMemoryPatch {
            strikes_landed: Some(4),
            noise_level: Some(0.8),
            ..Default::default()
        });
        let excited = memory.threat_score;
        assert!(excited > 0.3, "strikes and noise should raise the score");

        memory.merge(&SharkMemoryPatch {
            escapes: Some(8),
            ..Default::default()
        });
        assert!(
            memory.threat_score < excited,
            "escapes should make the shark wary"
        );
    }

    #[test]
    fn memory_merge_clamps_noise() {
        let mut memory = SharkMemory::new(Uuid::new_v4());
        memory.merge(&SharkMemoryPatch {
            noise_level: Some(7.0),
            ..Default::default()
        });
        assert_eq!(memory.noise_level, 1.0);
    }

    #[test]
    fn event_log_is_capped() {
        let (mut session, _) = session_with_host();
        for index in 0..(EVENT_LOG_CAP + 10) {
            session.record_event(EventRecord::new(
                EventKind::ActionPerformed,
                format!("splash {index}"),
                None,
                2,
            ));
        }
        assert_eq!(session.events.len(), EVENT_LOG_CAP);
        assert_eq!(session.events.front().map(|e| e.message.as_str()), Some("splash 10"));
    }

    #[test]
    fn event_intensity_is_clamped() {
        let event = EventRecord::new(EventKind::SharkTaunt, "chomp".into(), None, 9);
        assert_eq!(event.intensity, 5);
        let event = EventRecord::new(EventKind::SharkTaunt, "chomp".into(), None, 0);
        assert_eq!(event.intensity, 1);
    }

    #[test]
    fn objectives_complete_when_target_reached() {
        let (mut session, _) = session_with_host();
        assert!(!session.objectives_complete());

        let completed = session.advance_objectives(ObjectiveKind::Collect, 2);
        assert!(completed.is_empty());

        let completed = session.advance_objectives(ObjectiveKind::Collect, 1);
        assert_eq!(completed.len(), 1);
        assert!(session.objectives_complete());

        // Further progress on a completed objective is a no-op.
        assert!(session.advance_objectives(ObjectiveKind::Collect, 5).is_empty());
    }

    #[test]
    fn no_swimmers_left_tracks_statuses() {
        let (mut session, host_id) = session_with_host();
        assert!(!session.no_swimmers_left());

        if let Some(host) = session.players.get_mut(&host_id) {
            host.apply_health_delta(-200);
        }
        assert!(session.no_swimmers_left());
    }

    #[test]
    fn position_clamps_into_arena() {
        let clamped = Vec2 { x: -5.0, y: 900.0 }.clamped_to_arena();
        assert_eq!(clamped.x, 0.0);
        assert_eq!(clamped.y, ARENA_HEIGHT);
    }
}
