//! Public configuration types.
//!
//! These are the resolved, ready-to-use structs that subsystems consume.
//! Raw TOML deserialization types live in `raw.rs`.

use serde::Deserialize;

// ── Comms ───────────────────────────────────────────────────────────────────

/// Telegram channel configuration.
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    /// Whether the Telegram channel is loaded.
    pub enabled: bool,
    /// Bot token from `TELEGRAM_BOT_TOKEN` — never sourced from TOML.
    pub token: Option<String>,
    /// Expected bot username from `TELEGRAM_BOT_USERNAME`.
    pub username: Option<String>,
}

/// Liveness endpoint configuration.
#[derive(Debug, Clone)]
pub struct HealthConfig {
    pub enabled: bool,
    /// Socket address to bind the liveness server to.
    pub bind: String,
}

#[derive(Debug, Clone)]
pub struct CommsConfig {
    pub telegram: TelegramConfig,
    pub health: HealthConfig,
}

// ── Relay ───────────────────────────────────────────────────────────────────

/// What to do with a message when every in-flight slot is taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverflowPolicy {
    /// Wait for a free slot.
    Queue,
    /// Answer with the busy reply and drop the message.
    Reject,
}

/// Canned replies sent to the chat.
#[derive(Debug, Clone)]
pub struct Replies {
    pub welcome: String,
    /// Completion service unreachable, refused the call, or sent nothing.
    pub unavailable: String,
    /// Anything else that went wrong while handling the message.
    pub error: String,
    pub busy: String,
}

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub start_command: String,
    /// System persona prepended to every completion request.
    pub persona: String,
    pub replies: Replies,
    /// Upper bound on concurrently running completion exchanges (>= 1).
    pub max_in_flight: usize,
    pub overflow: OverflowPolicy,
    /// How long in-flight exchanges may run after shutdown is requested.
    pub shutdown_grace_seconds: u64,
}

// ── LLM ─────────────────────────────────────────────────────────────────────

/// OpenAI-compatible provider configuration (`[llm.openai]`).
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// Full chat completions endpoint URL.
    pub api_base_url: String,
    /// Model name passed in the request body.
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Per-request HTTP timeout in seconds.
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Which provider is active (`"openai"`, `"dummy"`).
    /// Maps to `default` in `[llm]` TOML.
    pub provider: String,
    pub openai: OpenAiConfig,
}

// ── Top-level ───────────────────────────────────────────────────────────────

/// Fully-resolved configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub bot_name: String,
    pub log_level: String,
    pub comms: CommsConfig,
    pub relay: RelayConfig,
    pub llm: LlmConfig,
    /// API key from `LLM_API_KEY` env var. Never sourced from TOML.
    pub llm_api_key: Option<String>,
}

impl Config {
    /// Returns `true` if the Telegram channel should be loaded.
    pub fn comms_telegram_should_load(&self) -> bool {
        self.comms.telegram.enabled
    }

    /// Returns `true` if the liveness server should be loaded.
    pub fn comms_health_should_load(&self) -> bool {
        self.comms.health.enabled
    }
}
