//! The AI brain: live language model access with budgeting and a canned
//! fallback for every generation path.
//!
//! Requests never fail because the upstream is down or the call budget is
//! spent; they degrade to the canned generator and report which mode served
//! them.

mod budget;
mod client;
pub mod mock;
pub mod prompt;

use std::sync::atomic::{AtomicU64, Ordering};

use serde::de::DeserializeOwned;
use tokio::sync::watch;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    config::AiConfig,
    state::game::{SharkAction, Vec2},
};

pub use self::budget::CallBudget;
pub use self::client::{LlmClient, LlmError, LlmProvider, LlmRequest, LlmResponse};

/// Which generator produced a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiMode {
    /// A live language model call.
    Live,
    /// The canned in-process generator.
    Mock,
}

impl AiMode {
    /// Stable lowercase name used in headers and payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            AiMode::Live => "live",
            AiMode::Mock => "mock",
        }
    }
}

/// Everything the brain needs to know to decide the shark's next move.
#[derive(Debug, Clone)]
pub struct DecisionContext {
    /// Where the shark is.
    pub shark_position: Vec2,
    /// Current aggression, `0.0..=1.0`.
    pub aggression: f32,
    /// Swimmers currently in the water.
    pub swimmers: Vec<SwimmerContext>,
}

/// One swimmer as seen by the shark brain.
#[derive(Debug, Clone)]
pub struct SwimmerContext {
    /// Session player id, when the context comes from a live room.
    pub id: Option<Uuid>,
    /// Display name.
    pub name: String,
    /// Position in the water.
    pub position: Vec2,
    /// Health, `0..=100`.
    pub health: u8,
    /// Accumulated noise, `0.0..=1.0`.
    pub noise: f32,
    /// Remembered appeal as prey, `0.0..=1.0`.
    pub threat: f32,
}

/// The shark brain's verdict.
#[derive(Debug, Clone)]
pub struct SharkDecision {
    /// What the shark does next.
    pub action: SharkAction,
    /// Swimmer the move is aimed at, when one is.
    pub target: Option<Uuid>,
    /// Display name of the target, when one is.
    pub target_name: Option<String>,
    /// Updated aggression, `0.0..=1.0`.
    pub aggression: f32,
    /// One-line justification for the move.
    pub reasoning: String,
    /// Optional quip delivered with the move.
    pub taunt: Option<String>,
}

/// A text generation together with the mode that produced it.
#[derive(Debug, Clone)]
pub struct AiOutcome {
    /// The generated text.
    pub text: String,
    /// Which generator produced it.
    pub mode: AiMode,
}

/// Operations the brain counts individually.
#[derive(Debug, Clone, Copy)]
pub enum ActionKind {
    /// Shark behaviour decision.
    Decide,
    /// Shark memory update.
    UpdateMemory,
    /// Shark taunt.
    Taunt,
    /// NPC dialogue.
    NpcChat,
    /// Event narration.
    Commentary,
}

/// Per-operation call counts.
#[derive(Debug, Clone, Copy, Default)]
pub struct ActionCounts {
    /// Shark behaviour decisions served.
    pub decide: u64,
    /// Memory updates applied.
    pub update_memory: u64,
    /// Taunts served.
    pub taunt: u64,
    /// NPC chats served.
    pub npc_chat: u64,
    /// Narrations served.
    pub commentary: u64,
}

/// Point-in-time usage snapshot of the brain.
#[derive(Debug, Clone)]
pub struct AiStats {
    /// Mode the next request would be served in, assuming the upstream answers.
    pub mode: AiMode,
    /// Result of the most recent upstream probe.
    pub upstream_available: bool,
    /// Live calls spent so far.
    pub calls_used: u32,
    /// Live calls left in the allowance.
    pub calls_remaining: u32,
    /// The configured allowance.
    pub call_budget: u32,
    /// Responses served by the canned generator.
    pub mock_served: u64,
    /// Per-operation counts.
    pub actions: ActionCounts,
}

#[derive(Debug, Default)]
struct UsageCounters {
    decide: AtomicU64,
    update_memory: AtomicU64,
    taunt: AtomicU64,
    npc_chat: AtomicU64,
    commentary: AtomicU64,
    mock_served: AtomicU64,
}

impl UsageCounters {
    fn count(&self, kind: ActionKind) {
        let counter = match kind {
            ActionKind::Decide => &self.decide,
            ActionKind::UpdateMemory => &self.update_memory,
            ActionKind::Taunt => &self.taunt,
            ActionKind::NpcChat => &self.npc_chat,
            ActionKind::Commentary => &self.commentary,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn note_mock(&self) {
        self.mock_served.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> ActionCounts {
        ActionCounts {
            decide: self.decide.load(Ordering::Relaxed),
            update_memory: self.update_memory.load(Ordering::Relaxed),
            taunt: self.taunt.load(Ordering::Relaxed),
            npc_chat: self.npc_chat.load(Ordering::Relaxed),
            commentary: self.commentary.load(Ordering::Relaxed),
        }
    }
}

/// Shared handle bundling the upstream client, the call budget, and the
/// forced-mock switch.
pub struct AiBrain {
    client: LlmClient,
    budget: CallBudget,
    mock_override: bool,
    upstream: watch::Sender<bool>,
    usage: UsageCounters,
}

impl AiBrain {
    /// Build the brain from configuration.
    ///
    /// Without a base URL and API key the brain starts with a disabled
    /// upstream and serves canned responses only.
    pub fn new(config: &AiConfig) -> anyhow::Result<Self> {
        let provider = match (&config.base_url, &config.api_key) {
            (Some(base_url), Some(api_key)) => LlmProvider::OpenAiCompatible {
                base_url: base_url.trim_end_matches('/').to_owned(),
                api_key: api_key.clone(),
            },
            _ => {
                info!("no ai upstream configured; serving canned responses only");
                LlmProvider::Disabled
            }
        };

        let client = LlmClient::new(
            provider,
            config.model.clone(),
            config.request_timeout(),
            config.max_retries,
        )?;

        if config.mock_mode_override {
            info!("mock mode override active; live calls disabled");
        }

        let (upstream, _) = watch::channel(client.is_configured());

        Ok(Self {
            client,
            budget: CallBudget::new(config.call_budget),
            mock_override: config.mock_mode_override,
            upstream,
            usage: UsageCounters::default(),
        })
    }

    /// Whether every response is forced onto the canned generator.
    pub fn forced_mock(&self) -> bool {
        self.mock_override || !self.client.is_configured()
    }

    /// Mode the next request would be served in, assuming the upstream answers.
    pub fn current_mode(&self) -> AiMode {
        if self.forced_mock() || self.budget.remaining() == 0 {
            AiMode::Mock
        } else {
            AiMode::Live
        }
    }

    /// Live calls left in the allowance.
    pub fn calls_remaining(&self) -> u32 {
        self.budget.remaining()
    }

    /// Result of the most recent upstream probe.
    pub fn upstream_available(&self) -> bool {
        *self.upstream.borrow()
    }

    /// Watch upstream availability changes.
    pub fn upstream_watcher(&self) -> watch::Receiver<bool> {
        self.upstream.subscribe()
    }

    /// Whether an upstream is configured at all, regardless of reachability.
    pub fn is_configured(&self) -> bool {
        self.client.is_configured()
    }

    /// Count one served operation.
    pub fn count_action(&self, kind: ActionKind) {
        self.usage.count(kind);
    }

    /// Probe the upstream once and record the result.
    pub async fn probe(&self) -> bool {
        let healthy = match self.client.probe().await {
            Ok(()) => true,
            Err(err) => {
                warn!(error = %err, "ai upstream probe failed");
                false
            }
        };
        self.upstream.send_replace(healthy);
        healthy
    }

    /// Generate text, falling back to `fallback` when live generation is not
    /// available or fails.
    pub async fn generate_text_or<F>(&self, request: &LlmRequest, fallback: F) -> AiOutcome
    where
        F: FnOnce() -> String,
    {
        if self.forced_mock() {
            self.usage.note_mock();
            return AiOutcome {
                text: fallback(),
                mode: AiMode::Mock,
            };
        }

        if self.budget.try_consume().is_none() {
            self.usage.note_mock();
            return AiOutcome {
                text: fallback(),
                mode: AiMode::Mock,
            };
        }

        match self.client.complete(request).await {
            Ok(response) => AiOutcome {
                text: response.text,
                mode: AiMode::Live,
            },
            Err(err) => {
                warn!(error = %err, "live generation failed; serving canned response");
                self.usage.note_mock();
                AiOutcome {
                    text: fallback(),
                    mode: AiMode::Mock,
                }
            }
        }
    }

    /// Generate a structured value, falling back to `fallback` when live
    /// generation is not available, fails, or does not parse.
    pub async fn generate_structured_or<T, F>(
        &self,
        request: &LlmRequest,
        fallback: F,
    ) -> (T, AiMode)
    where
        T: DeserializeOwned,
        F: FnOnce() -> T,
    {
        if self.forced_mock() || self.budget.try_consume().is_none() {
            self.usage.note_mock();
            return (fallback(), AiMode::Mock);
        }

        match self.client.complete(request).await {
            Ok(response) => match client::parse_structured::<T>(&response.text) {
                Ok(value) => (value, AiMode::Live),
                Err(err) => {
                    warn!(error = %err, "live completion did not parse; serving canned response");
                    self.usage.note_mock();
                    (fallback(), AiMode::Mock)
                }
            },
            Err(err) => {
                warn!(error = %err, "live generation failed; serving canned response");
                self.usage.note_mock();
                (fallback(), AiMode::Mock)
            }
        }
    }

    /// Point-in-time usage snapshot.
    pub fn stats(&self) -> AiStats {
        AiStats {
            mode: self.current_mode(),
            upstream_available: self.upstream_available(),
            calls_used: self.budget.used(),
            calls_remaining: self.budget.remaining(),
            call_budget: self.budget.limit(),
            mock_served: self.usage.mock_served.load(Ordering::Relaxed),
            actions: self.usage.snapshot(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    fn disabled_brain() -> AiBrain {
        AiBrain::new(AppConfig::default().ai()).expect("brain")
    }

    fn request() -> LlmRequest {
        LlmRequest {
            system: "system".into(),
            user: "user".into(),
            max_tokens: 32,
            temperature: 0.5,
        }
    }

    #[tokio::test]
    async fn disabled_upstream_serves_the_fallback() {
        let brain = disabled_brain();
        assert_eq!(brain.current_mode(), AiMode::Mock);

        let outcome = brain
            .generate_text_or(&request(), || "canned line".into())
            .await;
        assert_eq!(outcome.mode, AiMode::Mock);
        assert_eq!(outcome.text, "canned line");
        assert_eq!(brain.stats().mock_served, 1);
    }

    #[tokio::test]
    async fn exhausted_budget_skips_the_upstream() {
        let mut config = AppConfig::default().ai().clone();
        // Unreachable but syntactically valid upstream; the zero budget must
        // short-circuit before any network attempt.
        config.base_url = Some("http://127.0.0.1:9".into());
        config.api_key = Some("test-key".into());
        config.call_budget = 0;

        let brain = AiBrain::new(&config).expect("brain");
        assert_eq!(brain.current_mode(), AiMode::Mock);
        assert!(brain.is_configured());

        let outcome = brain.generate_text_or(&request(), || "canned".into()).await;
        assert_eq!(outcome.mode, AiMode::Mock);
        assert_eq!(brain.calls_remaining(), 0);
    }

    #[tokio::test]
    async fn structured_fallback_is_used_when_disabled() {
        let brain = disabled_brain();
        let (value, mode) = brain
            .generate_structured_or(&request(), || 7_u32)
            .await;
        assert_eq!(value, 7);
        assert_eq!(mode, AiMode::Mock);
    }

    #[test]
    fn action_counters_accumulate() {
        let brain = disabled_brain();
        brain.count_action(ActionKind::Decide);
        brain.count_action(ActionKind::Decide);
        brain.count_action(ActionKind::Taunt);

        let stats = brain.stats();
        assert_eq!(stats.actions.decide, 2);
        assert_eq!(stats.actions.taunt, 1);
        assert_eq!(stats.actions.npc_chat, 0);
    }
}
