//! Configuration loading with env-var overrides.
//!
//! # Module layout
//!
//! - **types** — Public configuration structs consumed by subsystems
//!   (`Config`, `RelayConfig`, `LlmConfig`, …).
//! - **raw** — Raw TOML deserialization types. These mirror the file shape
//!   and carry the serde defaults; kept private.
//! - **load** — `merge_toml`, `[meta] base` chains, `load`, `load_from`.

mod load;
mod raw;
mod types;

pub use load::{load, load_from};
pub use types::*;

impl Config {
    /// Safe `Config` for tests — dummy LLM, no secrets, no external calls.
    #[doc(hidden)]
    pub fn test_default() -> Self {
        Self {
            bot_name: "test".into(),
            log_level: "info".into(),
            comms: CommsConfig {
                telegram: TelegramConfig { enabled: false, token: None, username: None },
                health: HealthConfig { enabled: false, bind: "127.0.0.1:0".into() },
            },
            relay: RelayConfig {
                start_command: "/start".into(),
                persona: raw::DEFAULT_PERSONA.trim_end().to_string(),
                replies: Replies {
                    welcome: "welcome".into(),
                    unavailable: "service unavailable".into(),
                    error: "processing error".into(),
                    busy: "busy".into(),
                },
                max_in_flight: 4,
                overflow: OverflowPolicy::Queue,
                shutdown_grace_seconds: 1,
            },
            llm: LlmConfig {
                provider: "dummy".into(),
                openai: OpenAiConfig {
                    api_base_url: "http://127.0.0.1:0/v1/chat/completions".into(),
                    model: "test-model".into(),
                    temperature: 0.7,
                    max_tokens: 1024,
                    timeout_seconds: 1,
                },
            },
            llm_api_key: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::Path;
    use tempfile::{NamedTempFile, TempDir};

    fn write_toml(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn empty_file_uses_defaults() {
        let f = write_toml("");
        let cfg = load_from(f.path(), None, None).unwrap();
        assert_eq!(cfg.bot_name, "travelbot");
        assert_eq!(cfg.log_level, "info");
        assert!(cfg.comms_telegram_should_load());
        assert!(!cfg.comms_health_should_load());
        assert_eq!(cfg.relay.start_command, "/start");
        assert_eq!(cfg.relay.max_in_flight, 32);
        assert_eq!(cfg.relay.overflow, OverflowPolicy::Queue);
        assert_eq!(cfg.llm.provider, "openai");
        assert_eq!(cfg.llm.openai.model, "llama-3.3-70b-versatile");
        assert_eq!(cfg.llm.openai.temperature, 0.7);
        assert_eq!(cfg.llm.openai.max_tokens, 1024);
        assert!(cfg.llm.openai.api_base_url.starts_with("https://api.groq.com/"));
    }

    #[test]
    fn default_persona_is_compiled_in() {
        let cfg = load_from(write_toml("").path(), None, None).unwrap();
        assert!(cfg.relay.persona.contains("TravelBot"));
        assert!(!cfg.relay.persona.ends_with('\n'));
    }

    #[test]
    fn default_replies() {
        let cfg = load_from(write_toml("").path(), None, None).unwrap();
        assert!(cfg.relay.replies.welcome.starts_with("¡Hola! 👋"));
        assert_eq!(cfg.relay.replies.unavailable, "❌ Error al contactar al servicio de IA.");
        assert_eq!(
            cfg.relay.replies.error,
            "❌ Lo siento, ocurrió un error al procesar tu consulta."
        );
    }

    #[test]
    fn inline_persona_wins_over_file() {
        let toml = r#"
[relay]
persona = "You are a terse assistant."
persona_file = "/nonexistent/persona.txt"
"#;
        let cfg = load_from(write_toml(toml).path(), None, None).unwrap();
        assert_eq!(cfg.relay.persona, "You are a terse assistant.");
    }

    #[test]
    fn persona_file_is_read() {
        let persona = write_toml("You are a sommelier.\n");
        let toml = format!("[relay]\npersona_file = \"{}\"\n", persona.path().display());
        let cfg = load_from(write_toml(&toml).path(), None, None).unwrap();
        assert_eq!(cfg.relay.persona, "You are a sommelier.");
    }

    #[test]
    fn missing_persona_file_errors() {
        let toml = "[relay]\npersona_file = \"/nonexistent/persona.txt\"\n";
        let err = load_from(write_toml(toml).path(), None, None).unwrap_err();
        assert!(err.to_string().contains("persona file"));
    }

    #[test]
    fn reject_policy_and_zero_cap() {
        let toml = r#"
[relay]
overflow = "reject"
max_in_flight = 0
"#;
        let cfg = load_from(write_toml(toml).path(), None, None).unwrap();
        assert_eq!(cfg.relay.overflow, OverflowPolicy::Reject);
        assert_eq!(cfg.relay.max_in_flight, 1);
    }

    #[test]
    fn unknown_overflow_policy_errors() {
        let toml = "[relay]\noverflow = \"drop\"\n";
        let err = load_from(write_toml(toml).path(), None, None).unwrap_err();
        assert!(err.to_string().contains("config error"));
    }

    #[test]
    fn empty_start_command_errors() {
        let toml = "[relay]\nstart_command = \"  \"\n";
        assert!(load_from(write_toml(toml).path(), None, None).is_err());
    }

    #[test]
    fn missing_file_errors() {
        let result = load_from(Path::new("/nonexistent/config.toml"), None, None);
        let msg = result.unwrap_err().to_string();
        assert!(msg.contains("config error"));
    }

    #[test]
    fn env_overrides() {
        let f = write_toml("[bot]\nlog_level = \"warn\"\n");
        let cfg = load_from(f.path(), Some("debug"), Some("127.0.0.1:9999")).unwrap();
        assert_eq!(cfg.log_level, "debug");
        assert_eq!(cfg.comms.health.bind, "127.0.0.1:9999");
    }

    const BASE_TOML: &str = r#"
[bot]
name = "base-bot"
log_level = "info"

[llm]
default = "dummy"

[llm.openai]
model = "base-model"
temperature = 0.1
"#;

    fn write_named(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let p = dir.path().join(name);
        std::fs::write(&p, content).unwrap();
        p
    }

    #[test]
    fn overlay_keeps_base_fields() {
        let dir = TempDir::new().unwrap();
        write_named(&dir, "base.toml", BASE_TOML);
        let overlay = r#"
[meta]
base = "base.toml"

[llm.openai]
model = "overlay-model"
"#;
        let overlay_path = write_named(&dir, "overlay.toml", overlay);
        let cfg = load_from(&overlay_path, None, None).unwrap();
        assert_eq!(cfg.bot_name, "base-bot");
        assert_eq!(cfg.llm.provider, "dummy");
        assert_eq!(cfg.llm.openai.model, "overlay-model");
        assert_eq!(cfg.llm.openai.temperature, 0.1);
    }

    #[test]
    fn missing_base_errors() {
        let dir = TempDir::new().unwrap();
        let overlay = "[meta]\nbase = \"nonexistent.toml\"\n";
        let overlay_path = write_named(&dir, "overlay.toml", overlay);
        let msg = load_from(&overlay_path, None, None).unwrap_err().to_string();
        assert!(msg.contains("cannot read"));
    }

    #[test]
    fn cycle_detection() {
        let dir = TempDir::new().unwrap();
        let self_path = dir.path().join("self.toml");
        let content = format!("[meta]\nbase = \"{}\"\n\n{BASE_TOML}", self_path.display());
        std::fs::write(&self_path, content).unwrap();
        let msg = load_from(&self_path, None, None).unwrap_err().to_string();
        assert!(msg.contains("circular"));
    }
}
