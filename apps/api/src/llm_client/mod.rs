//! LLM client: the single point of entry for all chat-completion calls.
//!
//! ARCHITECTURAL RULE: No other module may call a provider API directly.
//! All LLM interactions MUST go through this module (embeddings included).
//!
//! The provider and model come from configuration; temperature is pinned low
//! because every caller expects structured, repeatable output.
use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::{Config, LlmProvider};

pub mod embeddings;
pub mod prompts;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 4096;
const TEMPERATURE: f32 = 0.1;
const MAX_RETRIES: u32 = 3;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("LLM returned empty content")]
    EmptyContent,
}

// ── Anthropic wire types ─────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContentBlock>,
    usage: AnthropicUsage,
}

#[derive(Debug, Deserialize)]
struct AnthropicContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    input_tokens: u32,
    output_tokens: u32,
}

// ── OpenAI wire types ────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct OpenAiChatRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct OpenAiChatResponse {
    choices: Vec<OpenAiChoice>,
    #[serde(default)]
    usage: Option<OpenAiUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

/// Provider-independent completion result.
#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub text: Option<String>,
    pub usage: Usage,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl LlmResponse {
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref().filter(|t| !t.trim().is_empty())
    }
}

impl From<AnthropicResponse> for LlmResponse {
    fn from(r: AnthropicResponse) -> Self {
        let text = r
            .content
            .into_iter()
            .find(|b| b.block_type == "text")
            .and_then(|b| b.text);
        LlmResponse {
            text,
            usage: Usage {
                input_tokens: r.usage.input_tokens,
                output_tokens: r.usage.output_tokens,
            },
        }
    }
}

impl From<OpenAiChatResponse> for LlmResponse {
    fn from(r: OpenAiChatResponse) -> Self {
        let usage = r
            .usage
            .map(|u| Usage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            })
            .unwrap_or_default();
        LlmResponse {
            text: r.choices.into_iter().next().and_then(|c| c.message.content),
            usage,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ProviderError {
    error: ProviderErrorBody,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    message: String,
}

#[derive(Debug, Clone)]
enum Backend {
    OpenAi { api_key: String, base_url: String },
    Anthropic { api_key: String },
}

/// The single LLM client used by all services.
/// Wraps the configured chat API with retry logic and structured output helpers.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    backend: Backend,
    model: String,
}

impl LlmClient {
    pub fn from_config(config: &Config) -> Self {
        let (backend, model) = match config.llm_provider {
            LlmProvider::OpenAi => (
                Backend::OpenAi {
                    api_key: config.openai_api_key.clone(),
                    base_url: config.openai_base_url.clone(),
                },
                config.openai_llm_model.clone(),
            ),
            LlmProvider::Anthropic => (
                Backend::Anthropic {
                    api_key: config.anthropic_api_key.clone().unwrap_or_default(),
                },
                config.anthropic_model.clone(),
            ),
        };
        Self {
            client: http_client(Duration::from_secs(120)),
            backend,
            model,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Makes a raw completion call, returning the provider-independent response.
    /// Retries on 429 (rate limit) and 5xx errors with exponential backoff.
    pub async fn call(&self, prompt: &str, system: &str) -> Result<LlmResponse, LlmError> {
        let messages = |with_system: bool| {
            let mut m = Vec::with_capacity(2);
            if with_system {
                m.push(ChatMessage {
                    role: "system",
                    content: system,
                });
            }
            m.push(ChatMessage {
                role: "user",
                content: prompt,
            });
            m
        };

        let response = match &self.backend {
            Backend::OpenAi { api_key, base_url } => {
                let body = OpenAiChatRequest {
                    model: &self.model,
                    max_tokens: MAX_TOKENS,
                    temperature: TEMPERATURE,
                    messages: messages(true),
                };
                let url = format!("{base_url}/chat/completions");
                let response = send_with_retry(|| {
                    self.client.post(&url).bearer_auth(api_key).json(&body)
                })
                .await?;
                let parsed: OpenAiChatResponse = response.json().await?;
                LlmResponse::from(parsed)
            }
            Backend::Anthropic { api_key } => {
                let body = AnthropicRequest {
                    model: &self.model,
                    max_tokens: MAX_TOKENS,
                    temperature: TEMPERATURE,
                    system,
                    messages: messages(false),
                };
                let response = send_with_retry(|| {
                    self.client
                        .post(ANTHROPIC_API_URL)
                        .header("x-api-key", api_key)
                        .header("anthropic-version", ANTHROPIC_VERSION)
                        .json(&body)
                })
                .await?;
                let parsed: AnthropicResponse = response.json().await?;
                LlmResponse::from(parsed)
            }
        };

        debug!(
            "LLM call succeeded: model={}, input_tokens={}, output_tokens={}",
            self.model, response.usage.input_tokens, response.usage.output_tokens
        );

        Ok(response)
    }

    /// Calls the LLM and returns the fence-stripped text of the answer.
    pub async fn call_text(&self, prompt: &str, system: &str) -> Result<String, LlmError> {
        let response = self.call(prompt, system).await?;
        let text = response.text().ok_or(LlmError::EmptyContent)?;
        Ok(strip_code_fences(text).to_string())
    }

    /// Convenience method that calls the LLM and deserializes the text response as JSON.
    /// The prompt must instruct the model to return valid JSON.
    pub async fn call_json<T: DeserializeOwned>(
        &self,
        prompt: &str,
        system: &str,
    ) -> Result<T, LlmError> {
        let text = self.call_text(prompt, system).await?;
        serde_json::from_str(&text).map_err(LlmError::Parse)
    }
}

pub(crate) fn http_client(timeout: Duration) -> Client {
    Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|e| {
            warn!("Falling back to default HTTP client: {e}");
            Client::new()
        })
}

/// Sends the request built by `make_request`, retrying transport errors,
/// 429 and 5xx responses. Any other non-success status fails immediately.
pub(crate) async fn send_with_retry<F>(make_request: F) -> Result<Response, LlmError>
where
    F: Fn() -> RequestBuilder,
{
    let mut last_error: Option<LlmError> = None;

    for attempt in 0..MAX_RETRIES {
        if attempt > 0 {
            // Exponential backoff: 1s, 2s
            let delay = Duration::from_millis(1000 * (1 << (attempt - 1)));
            warn!(
                "Provider call attempt {} failed, retrying after {}ms...",
                attempt,
                delay.as_millis()
            );
            tokio::time::sleep(delay).await;
        }

        let response = match make_request().send().await {
            Ok(r) => r,
            Err(e) => {
                last_error = Some(LlmError::Http(e));
                continue;
            }
        };

        let status = response.status();

        if status.as_u16() == 429 || status.is_server_error() {
            let body = response.text().await.unwrap_or_default();
            warn!("Provider API returned {}: {}", status, body);
            last_error = Some(LlmError::Api {
                status: status.as_u16(),
                message: body,
            });
            continue;
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                message: provider_error_message(body),
            });
        }

        return Ok(response);
    }

    Err(last_error.unwrap_or(LlmError::RateLimited {
        retries: MAX_RETRIES,
    }))
}

/// Extracts `error.message` from a provider error body, falling back to the raw body.
fn provider_error_message(body: String) -> String {
    serde_json::from_str::<ProviderError>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body)
}

/// Strips ```json / ```html / ``` code fences from LLM output.
pub fn strip_code_fences(text: &str) -> &str {
    let text = text.trim();
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop an optional language tag on the opening fence line.
    let rest = match rest.find('\n') {
        Some(idx) if rest[..idx].chars().all(|c| c.is_ascii_alphanumeric()) => &rest[idx + 1..],
        _ => rest,
    };
    let rest = rest.trim_start();
    rest.strip_suffix("```").map(str::trim).unwrap_or(rest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_json_fences_with_json_tag() {
        let input = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_code_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_without_tag() {
        let input = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_code_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_html_fences() {
        let input = "```html\n<div>content</div>\n```";
        assert_eq!(strip_code_fences(input), "<div>content</div>");
    }

    #[test]
    fn test_strip_fences_no_fences() {
        let input = "  [\"01.11\", \"01.12\"]  ";
        assert_eq!(strip_code_fences(input), "[\"01.11\", \"01.12\"]");
    }

    #[test]
    fn test_strip_fences_unterminated() {
        let input = "```json\n{\"a\": 1}";
        assert_eq!(strip_code_fences(input), "{\"a\": 1}");
    }

    #[test]
    fn test_openai_response_conversion() {
        let raw = r#"{
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "[\"62.01\"]"}}],
            "usage": {"prompt_tokens": 120, "completion_tokens": 8, "total_tokens": 128}
        }"#;
        let parsed: OpenAiChatResponse = serde_json::from_str(raw).unwrap();
        let response = LlmResponse::from(parsed);
        assert_eq!(response.text(), Some("[\"62.01\"]"));
        assert_eq!(response.usage.input_tokens, 120);
        assert_eq!(response.usage.output_tokens, 8);
    }

    #[test]
    fn test_anthropic_response_conversion() {
        let raw = r#"{
            "content": [{"type": "text", "text": "<html></html>"}],
            "usage": {"input_tokens": 10, "output_tokens": 3}
        }"#;
        let parsed: AnthropicResponse = serde_json::from_str(raw).unwrap();
        let response = LlmResponse::from(parsed);
        assert_eq!(response.text(), Some("<html></html>"));
    }

    #[test]
    fn test_blank_text_counts_as_empty() {
        let response = LlmResponse {
            text: Some("   ".into()),
            usage: Usage::default(),
        };
        assert!(response.text().is_none());
    }

    #[test]
    fn test_provider_error_message_extraction() {
        let body = r#"{"error": {"message": "Invalid API key", "type": "auth"}}"#.to_string();
        assert_eq!(provider_error_message(body), "Invalid API key");
        assert_eq!(provider_error_message("gateway".into()), "gateway");
    }
}
