//! Application-level configuration loading, including rate limiting and AI upstream settings.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "RIPTIDE_BACK_CONFIG_PATH";
/// Environment variable carrying the upstream API key. Never read from the config file.
const AI_API_KEY_ENV: &str = "RIPTIDE_AI_API_KEY";
/// Environment variable overriding the upstream base URL.
const AI_BASE_URL_ENV: &str = "RIPTIDE_AI_BASE_URL";
/// Environment variable overriding the model identifier.
const AI_MODEL_ENV: &str = "RIPTIDE_AI_MODEL";
/// Environment variable forcing every AI response onto the canned generator.
const MOCK_MODE_ENV: &str = "RIPTIDE_MOCK_MODE";

const DEFAULT_RATE_MAX_REQUESTS: u32 = 30;
const DEFAULT_RATE_WINDOW_SECS: u64 = 60;
const DEFAULT_AI_MODEL: &str = "gpt-4o-mini";
const DEFAULT_CALL_BUDGET: u32 = 200;
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 8_000;
const DEFAULT_MAX_RETRIES: u32 = 2;

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    rate_limit: RateLimitConfig,
    ai: AiConfig,
}

#[derive(Debug, Clone)]
/// Fixed-window rate limiting knobs applied to the AI-backed endpoints.
pub struct RateLimitConfig {
    /// Requests allowed per window and client address.
    pub max_requests: u32,
    /// Window length in seconds.
    pub window_secs: u64,
}

impl RateLimitConfig {
    /// Window length as a [`Duration`].
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

#[derive(Debug, Clone)]
/// Upstream language model settings.
pub struct AiConfig {
    /// Base URL of an OpenAI-compatible completion API. `None` disables live calls.
    pub base_url: Option<String>,
    /// Bearer token for the upstream API, sourced from the environment.
    pub api_key: Option<String>,
    /// Model identifier sent with each completion request.
    pub model: String,
    /// Total number of live completions the process may spend before
    /// falling back to canned responses.
    pub call_budget: u32,
    /// Per-request timeout in milliseconds.
    pub request_timeout_ms: u64,
    /// Retries attempted per completion before giving up on the upstream.
    pub max_retries: u32,
    /// Force canned responses even when an upstream is configured.
    pub mock_mode_override: bool,
}

impl AiConfig {
    /// Per-request timeout as a [`Duration`].
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults,
    /// then apply environment overrides for secrets and the mock switch.
    pub fn load() -> Self {
        let path = resolve_config_path();
        let mut config = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(path = %path.display(), "loaded configuration file");
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        };

        config.apply_env_overrides();
        config
    }

    /// Rate limiting settings.
    pub fn rate_limit(&self) -> &RateLimitConfig {
        &self.rate_limit
    }

    /// Upstream AI settings.
    pub fn ai(&self) -> &AiConfig {
        &self.ai
    }

    fn apply_env_overrides(&mut self) {
        if let Some(key) = non_empty_env(AI_API_KEY_ENV) {
            self.ai.api_key = Some(key);
        }
        if let Some(url) = non_empty_env(AI_BASE_URL_ENV) {
            self.ai.base_url = Some(url);
        }
        if let Some(model) = non_empty_env(AI_MODEL_ENV) {
            self.ai.model = model;
        }
        if let Some(flag) = non_empty_env(MOCK_MODE_ENV) {
            self.ai.mock_mode_override = matches!(flag.as_str(), "1" | "true" | "yes");
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            rate_limit: RateLimitConfig {
                max_requests: DEFAULT_RATE_MAX_REQUESTS,
                window_secs: DEFAULT_RATE_WINDOW_SECS,
            },
            ai: AiConfig {
                base_url: None,
                api_key: None,
                model: DEFAULT_AI_MODEL.to_owned(),
                call_budget: DEFAULT_CALL_BUDGET,
                request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
                max_retries: DEFAULT_MAX_RETRIES,
                mock_mode_override: false,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    #[serde(default)]
    rate_limit: RawRateLimit,
    #[serde(default)]
    ai: RawAi,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        Self {
            rate_limit: RateLimitConfig {
                max_requests: value.rate_limit.max_requests,
                window_secs: value.rate_limit.window_secs,
            },
            ai: AiConfig {
                base_url: value.ai.base_url,
                api_key: None,
                model: value.ai.model,
                call_budget: value.ai.call_budget,
                request_timeout_ms: value.ai.request_timeout_ms,
                max_retries: value.ai.max_retries,
                mock_mode_override: value.ai.mock_mode_override,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the `rate_limit` section.
struct RawRateLimit {
    #[serde(default = "default_rate_max_requests")]
    max_requests: u32,
    #[serde(default = "default_rate_window_secs")]
    window_secs: u64,
}

impl Default for RawRateLimit {
    fn default() -> Self {
        Self {
            max_requests: DEFAULT_RATE_MAX_REQUESTS,
            window_secs: DEFAULT_RATE_WINDOW_SECS,
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the `ai` section.
struct RawAi {
    #[serde(default)]
    base_url: Option<String>,
    #[serde(default = "default_ai_model")]
    model: String,
    #[serde(default = "default_call_budget")]
    call_budget: u32,
    #[serde(default = "default_request_timeout_ms")]
    request_timeout_ms: u64,
    #[serde(default = "default_max_retries")]
    max_retries: u32,
    #[serde(default)]
    mock_mode_override: bool,
}

impl Default for RawAi {
    fn default() -> Self {
        Self {
            base_url: None,
            model: DEFAULT_AI_MODEL.to_owned(),
            call_budget: DEFAULT_CALL_BUDGET,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            max_retries: DEFAULT_MAX_RETRIES,
            mock_mode_override: false,
        }
    }
}

fn default_rate_max_requests() -> u32 {
    DEFAULT_RATE_MAX_REQUESTS
}

fn default_rate_window_secs() -> u64 {
    DEFAULT_RATE_WINDOW_SECS
}

fn default_ai_model() -> String {
    DEFAULT_AI_MODEL.to_owned()
}

fn default_call_budget() -> u32 {
    DEFAULT_CALL_BUDGET
}

fn default_request_timeout_ms() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_MS
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

fn non_empty_env(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_overrides_land_in_the_ai_section() {
        unsafe {
            env::set_var(AI_MODEL_ENV, "test-model");
            env::set_var(MOCK_MODE_ENV, "1");
        }

        let mut config = AppConfig::default();
        config.apply_env_overrides();

        unsafe {
            env::remove_var(AI_MODEL_ENV);
            env::remove_var(MOCK_MODE_ENV);
        }

        assert_eq!(config.ai.model, "test-model");
        assert!(config.ai.mock_mode_override);
    }
}
