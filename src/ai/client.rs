//! Thin client for an OpenAI-compatible chat completion API.

use std::time::{Duration, Instant};

use reqwest::Client;
use serde_json::json;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors that can occur when talking to the language model upstream.
#[derive(Debug, Error)]
pub enum LlmError {
    /// HTTP request failed.
    #[error("upstream request failed: {0}")]
    RequestFailed(String),

    /// Upstream response could not be decoded.
    #[error("failed to parse upstream response: {0}")]
    Parse(String),

    /// No upstream is configured or it cannot be reached.
    #[error("upstream unavailable: {0}")]
    Unavailable(String),

    /// All retry attempts exhausted.
    #[error("all retry attempts exhausted after {attempts} tries: {last_error}")]
    RetriesExhausted {
        /// Number of attempts made.
        attempts: u32,
        /// Error from the final attempt.
        last_error: String,
    },

    /// Client-side configuration problem.
    #[error("upstream client configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() {
            LlmError::Unavailable(err.to_string())
        } else {
            LlmError::RequestFailed(err.to_string())
        }
    }
}

/// Provider backend for text generation.
#[derive(Debug, Clone)]
pub enum LlmProvider {
    /// OpenAI-compatible API (OpenAI, Together, a local llama.cpp server, ...).
    OpenAiCompatible {
        /// Base URL without the `/v1/...` suffix.
        base_url: String,
        /// Bearer token sent with every request.
        api_key: String,
    },
    /// No upstream available. Every call errors so callers fall back to
    /// canned responses.
    Disabled,
}

/// One completion request.
#[derive(Debug, Clone)]
pub struct LlmRequest {
    /// System prompt establishing the role.
    pub system: String,
    /// User prompt carrying the situation.
    pub user: String,
    /// Upper bound on generated tokens.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
}

/// A completed generation.
#[derive(Debug, Clone)]
pub struct LlmResponse {
    /// Generated text.
    pub text: String,
    /// Wall-clock time the winning attempt took.
    pub latency_ms: u64,
    /// Model that produced the text.
    pub model: String,
}

/// Client routing completion requests to the configured backend.
pub struct LlmClient {
    provider: LlmProvider,
    http: Client,
    model: String,
    request_timeout: Duration,
    max_retries: u32,
}

impl LlmClient {
    /// Create a new client.
    pub fn new(
        provider: LlmProvider,
        model: impl Into<String>,
        request_timeout: Duration,
        max_retries: u32,
    ) -> Result<Self, LlmError> {
        let http = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|err| LlmError::Config(err.to_string()))?;

        Ok(Self {
            provider,
            http,
            model: model.into(),
            request_timeout,
            max_retries,
        })
    }

    /// Whether a live backend is configured at all.
    pub fn is_configured(&self) -> bool {
        !matches!(self.provider, LlmProvider::Disabled)
    }

    /// Model identifier sent with each request.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Generate a completion.
    ///
    /// Returns `Err` if no backend is configured or all retries fail; the
    /// caller is expected to fall back to a canned response.
    pub async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        match &self.provider {
            LlmProvider::Disabled => {
                Err(LlmError::Unavailable("no upstream configured".into()))
            }
            LlmProvider::OpenAiCompatible { base_url, api_key } => {
                self.complete_openai(base_url, api_key, request).await
            }
        }
    }

    /// Cheap reachability check against the models listing endpoint.
    pub async fn probe(&self) -> Result<(), LlmError> {
        let LlmProvider::OpenAiCompatible { base_url, api_key } = &self.provider else {
            return Err(LlmError::Unavailable("no upstream configured".into()));
        };

        let url = format!("{base_url}/v1/models");
        let response = self
            .http
            .get(&url)
            .header("Authorization", format!("Bearer {api_key}"))
            .timeout(Duration::from_secs(3))
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(LlmError::RequestFailed(format!(
                "HTTP {}",
                response.status()
            )))
        }
    }

    async fn complete_openai(
        &self,
        base_url: &str,
        api_key: &str,
        request: &LlmRequest,
    ) -> Result<LlmResponse, LlmError> {
        let url = format!("{base_url}/v1/chat/completions");
        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": request.system },
                { "role": "user", "content": request.user },
            ],
            "max_tokens": request.max_tokens,
            "temperature": request.temperature,
        });

        let mut last_error = String::new();
        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                debug!(
                    attempt = attempt + 1,
                    of = self.max_retries + 1,
                    "retrying upstream call"
                );
            }

            let start = Instant::now();
            let result = self
                .http
                .post(&url)
                .header("Authorization", format!("Bearer {api_key}"))
                .json(&body)
                .timeout(self.request_timeout)
                .send()
                .await;

            let latency_ms = start.elapsed().as_millis() as u64;

            match result {
                Ok(response) => {
                    if response.status().is_success() {
                        let json: serde_json::Value = response
                            .json()
                            .await
                            .map_err(|err| LlmError::Parse(err.to_string()))?;

                        let text = json["choices"][0]["message"]["content"]
                            .as_str()
                            .unwrap_or("")
                            .trim()
                            .to_string();

                        if text.is_empty() {
                            last_error = "empty completion".into();
                            warn!("upstream returned an empty completion");
                            continue;
                        }

                        return Ok(LlmResponse {
                            text,
                            latency_ms,
                            model: self.model.clone(),
                        });
                    }

                    last_error = format!("HTTP {}", response.status());
                    warn!(status = %response.status(), "upstream returned an error");
                }
                Err(err) => {
                    last_error = err.to_string();
                    if err.is_timeout() {
                        warn!(timeout_ms = latency_ms, "upstream request timed out");
                    } else {
                        warn!(error = %last_error, "upstream request failed");
                    }
                }
            }
        }

        Err(LlmError::RetriesExhausted {
            attempts: self.max_retries + 1,
            last_error,
        })
    }
}

/// Parse a raw completion as structured JSON, tolerating surrounding prose
/// and markdown fences.
pub fn parse_structured<T: serde::de::DeserializeOwned>(text: &str) -> Result<T, LlmError> {
    let candidate = extract_json_object(text).unwrap_or(text);
    serde_json::from_str(candidate)
        .map_err(|err| LlmError::Parse(format!("{err} in completion: '{text}'")))
}

/// Find the outermost `{...}` span in a completion, if any.
///
/// Models occasionally wrap JSON in code fences or lead with a sentence;
/// cutting to the first opening brace and last closing brace recovers most
/// of those cases.
fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end > start { Some(&text[start..=end]) } else { None }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Probe {
        action: String,
        aggression: f32,
    }

    #[test]
    fn parses_a_bare_json_object() {
        let parsed: Probe =
            parse_structured(r#"{"action": "stalk", "aggression": 0.6}"#).unwrap();
        assert_eq!(parsed.action, "stalk");
    }

    #[test]
    fn parses_json_wrapped_in_a_code_fence() {
        let text = "```json\n{\"action\": \"attack\", \"aggression\": 0.9}\n```";
        let parsed: Probe = parse_structured(text).unwrap();
        assert_eq!(parsed.action, "attack");
        assert_eq!(parsed.aggression, 0.9);
    }

    #[test]
    fn parses_json_with_leading_prose() {
        let text = "Here is my decision: {\"action\": \"circle\", \"aggression\": 0.4}";
        let parsed: Probe = parse_structured(text).unwrap();
        assert_eq!(parsed.action, "circle");
    }

    #[test]
    fn rejects_text_without_json() {
        let result: Result<Probe, _> = parse_structured("the shark shrugs");
        assert!(matches!(result, Err(LlmError::Parse(_))));
    }

    #[tokio::test]
    async fn disabled_provider_errors_immediately() {
        let client = LlmClient::new(
            LlmProvider::Disabled,
            "unused",
            Duration::from_secs(1),
            0,
        )
        .unwrap();

        let request = LlmRequest {
            system: "s".into(),
            user: "u".into(),
            max_tokens: 16,
            temperature: 0.2,
        };

        assert!(matches!(
            client.complete(&request).await,
            Err(LlmError::Unavailable(_))
        ));
        assert!(!client.is_configured());
    }
}
