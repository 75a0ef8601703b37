//! Raw TOML deserialization types.
//!
//! These structs mirror the TOML file shape and use `serde` defaults, so an
//! empty file is a valid configuration. The `load` module converts them into
//! the public `types` structs.

use serde::Deserialize;

use super::types::OverflowPolicy;

/// Persona used when `[relay]` names no `persona` or `persona_file`.
pub(super) const DEFAULT_PERSONA: &str = include_str!("../../config/prompts/travel_guide.txt");

// ── Top-level ────────────────────────────────────────────────────────────────

#[derive(Deserialize, Default)]
pub(super) struct RawConfig {
    #[serde(default)]
    pub bot: RawBot,
    #[serde(default)]
    pub comms: RawComms,
    #[serde(default)]
    pub relay: RawRelay,
    #[serde(default)]
    pub llm: RawLlm,
}

#[derive(Deserialize)]
pub(super) struct RawBot {
    #[serde(default = "default_bot_name")]
    pub name: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for RawBot {
    fn default() -> Self {
        Self { name: default_bot_name(), log_level: default_log_level() }
    }
}

// ── Comms ───────────────────────────────────────────────────────────────────

#[derive(Deserialize, Default)]
pub(super) struct RawComms {
    #[serde(default)]
    pub telegram: RawTelegram,
    #[serde(default)]
    pub health: RawHealth,
}

#[derive(Deserialize)]
pub(super) struct RawTelegram {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for RawTelegram {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Deserialize)]
pub(super) struct RawHealth {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_health_bind")]
    pub bind: String,
}

impl Default for RawHealth {
    fn default() -> Self {
        Self { enabled: false, bind: default_health_bind() }
    }
}

// ── Relay ───────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub(super) struct RawRelay {
    #[serde(default = "default_start_command")]
    pub start_command: String,
    /// Inline persona; wins over `persona_file`.
    #[serde(default)]
    pub persona: Option<String>,
    #[serde(default)]
    pub persona_file: Option<String>,
    #[serde(default = "default_welcome")]
    pub welcome: String,
    #[serde(default = "default_unavailable_reply")]
    pub unavailable_reply: String,
    #[serde(default = "default_error_reply")]
    pub error_reply: String,
    #[serde(default = "default_busy_reply")]
    pub busy_reply: String,
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,
    #[serde(default = "default_overflow")]
    pub overflow: OverflowPolicy,
    #[serde(default = "default_shutdown_grace_seconds")]
    pub shutdown_grace_seconds: u64,
}

impl Default for RawRelay {
    fn default() -> Self {
        Self {
            start_command: default_start_command(),
            persona: None,
            persona_file: None,
            welcome: default_welcome(),
            unavailable_reply: default_unavailable_reply(),
            error_reply: default_error_reply(),
            busy_reply: default_busy_reply(),
            max_in_flight: default_max_in_flight(),
            overflow: default_overflow(),
            shutdown_grace_seconds: default_shutdown_grace_seconds(),
        }
    }
}

// ── LLM ─────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub(super) struct RawLlm {
    #[serde(rename = "default", default = "default_llm_provider")]
    pub provider: String,
    #[serde(default)]
    pub openai: RawOpenAiConfig,
}

impl Default for RawLlm {
    fn default() -> Self {
        Self { provider: default_llm_provider(), openai: RawOpenAiConfig::default() }
    }
}

#[derive(Deserialize)]
pub(super) struct RawOpenAiConfig {
    #[serde(default = "default_openai_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_openai_model")]
    pub model: String,
    #[serde(default = "default_openai_temperature")]
    pub temperature: f32,
    #[serde(default = "default_openai_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_openai_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for RawOpenAiConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_openai_api_base_url(),
            model: default_openai_model(),
            temperature: default_openai_temperature(),
            max_tokens: default_openai_max_tokens(),
            timeout_seconds: default_openai_timeout_seconds(),
        }
    }
}

// ── Defaults ────────────────────────────────────────────────────────────────

fn default_true() -> bool {
    true
}

fn default_bot_name() -> String {
    "travelbot".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_health_bind() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_start_command() -> String {
    "/start".to_string()
}
fn default_welcome() -> String {
    "¡Hola! 👋 Soy tu guía turístico virtual.\n\n\
     Pregúntame lo que quieras sobre cualquier destino del mundo:\n\
     🗺️ ¿Qué ver en París?\n\
     🍽️ ¿Dónde comer la mejor pasta en Roma?\n"
        .to_string()
}
fn default_unavailable_reply() -> String {
    "❌ Error al contactar al servicio de IA.".to_string()
}
fn default_error_reply() -> String {
    "❌ Lo siento, ocurrió un error al procesar tu consulta.".to_string()
}
fn default_busy_reply() -> String {
    "⏳ Estoy atendiendo muchas consultas, inténtalo de nuevo en un momento.".to_string()
}
fn default_max_in_flight() -> usize {
    32
}
fn default_overflow() -> OverflowPolicy {
    OverflowPolicy::Queue
}
fn default_shutdown_grace_seconds() -> u64 {
    10
}

fn default_llm_provider() -> String {
    "openai".to_string()
}
fn default_openai_api_base_url() -> String {
    "https://api.groq.com/openai/v1/chat/completions".to_string()
}
fn default_openai_model() -> String {
    "llama-3.3-70b-versatile".to_string()
}
fn default_openai_temperature() -> f32 {
    0.7
}
fn default_openai_max_tokens() -> u32 {
    1024
}
fn default_openai_timeout_seconds() -> u64 {
    60
}
