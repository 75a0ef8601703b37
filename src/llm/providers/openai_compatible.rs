//! OpenAI-compatible chat completion provider (`/v1/chat/completions`).
//!
//! Used against Groq by default, but any endpoint speaking the OpenAI chat
//! completions wire format works. All wire types are private to this module.
//! The provider is stateless: one persona + one user message per call.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, trace};

use crate::llm::ProviderError;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

// ── Public provider ───────────────────────────────────────────────────────────

/// Adapter for any HTTP endpoint implementing `/v1/chat/completions`.
///
/// Constructed once at startup, then cheaply cloned because
/// `reqwest::Client` is an `Arc` internally.
#[derive(Debug, Clone)]
pub struct OpenAiCompatibleProvider {
    client: Client,
    api_base_url: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    api_key: Option<String>,
}

impl OpenAiCompatibleProvider {
    /// Build a provider from config values and an optional API key.
    ///
    /// When `api_key` is present it is sent as `Authorization: Bearer <key>`
    /// on every request.
    pub fn new(
        api_base_url: String,
        model: String,
        temperature: f32,
        max_tokens: u32,
        timeout_seconds: u64,
        api_key: Option<String>,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| ProviderError::Client(e.to_string()))?;

        Ok(Self { client, api_base_url, model, temperature, max_tokens, api_key })
    }

    /// One round-trip: `system` as the persona, `content` as the user turn.
    ///
    /// The reply is returned verbatim. The HTTP status of a failed call is
    /// logged here and only travels upward inside [`ProviderError::Status`].
    pub async fn complete(&self, system: &str, content: &str) -> Result<String, ProviderError> {
        let payload = self.request(system, content);

        debug!(
            model = %payload.model,
            temperature = payload.temperature,
            max_tokens = payload.max_tokens,
            content_len = content.len(),
            "sending completion request"
        );
        if tracing::enabled!(tracing::Level::TRACE) {
            let json = serde_json::to_string_pretty(&payload)
                .unwrap_or_else(|e| format!("<serialization failed: {e}>"));
            trace!(payload = %json, "full completion request payload");
        }

        // `.json()` sets `Content-Type: application/json`.
        let mut req = self.client.post(&self.api_base_url).json(&payload);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let response = req.send().await.map_err(|e| {
            error!(url = %self.api_base_url, error = %e, timeout = e.is_timeout(), "completion request failed (transport)");
            ProviderError::Transport(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            error!(%status, "completion endpoint returned HTTP error");
            return Err(ProviderError::Status(status.as_u16()));
        }

        let body = response.text().await.map_err(|e| {
            error!(error = %e, "failed to read completion response body");
            ProviderError::Transport(e.to_string())
        })?;
        trace!(body = %body, "completion response body");

        let text = parse_completion(&body)?;
        debug!(reply_len = text.len(), "received completion");
        Ok(text)
    }

    fn request<'a>(&'a self, system: &'a str, content: &'a str) -> ChatCompletionRequest<'a> {
        ChatCompletionRequest {
            model: &self.model,
            messages: [
                Message { role: "system", content: system },
                Message { role: "user", content },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }
}

/// Extract `choices[0].message.content` from a success body.
fn parse_completion(body: &str) -> Result<String, ProviderError> {
    if body.trim().is_empty() {
        error!("completion endpoint returned an empty body");
        return Err(ProviderError::EmptyBody);
    }

    let parsed: ChatCompletionResponse = serde_json::from_str(body).map_err(|e| {
        error!(error = %e, "failed to deserialize completion response");
        ProviderError::Malformed(e.to_string())
    })?;

    parsed
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::Malformed("response has no choices".into()))?
        .message
        .content
        .ok_or_else(|| ProviderError::Malformed("first choice has no content".into()))
}

// ── Private wire types ────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: [Message<'a>; 2],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}
