//! Configuration loading with env-var overrides.
//!
//! Reads TOML files, supports `[meta] base = "..."` inheritance chains,
//! and applies `TRAVELBOT_LOG_LEVEL` and `TRAVELBOT_HEALTH_BIND` env
//! overrides. Secrets only ever come from the environment.

use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::AppError;

use super::raw::{self, RawConfig};
use super::types::*;

/// Deep-merge two TOML values.
/// Tables are merged recursively — the overlay only needs to specify keys that
/// differ from the base. For every other type (string, integer, array, …)
/// the overlay value replaces the base value wholesale.
fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_tbl), toml::Value::Table(overlay_tbl)) => {
            for (key, ov_val) in overlay_tbl {
                let merged = match base_tbl.remove(&key) {
                    Some(base_val) => merge_toml(base_val, ov_val),
                    None => ov_val,
                };
                base_tbl.insert(key, merged);
            }
            toml::Value::Table(base_tbl)
        }
        (_, overlay) => overlay,
    }
}

/// Read a config file, follow any `[meta] base = "..."` chain, and return the
/// fully merged `toml::Value`. `visited` carries canonicalized paths already
/// seen in this chain so circular references are caught early.
fn load_raw_merged(path: &Path, visited: &mut HashSet<PathBuf>) -> Result<toml::Value, AppError> {
    let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    if !visited.insert(canonical) {
        return Err(AppError::Config(format!(
            "circular base reference detected at: {}",
            path.display()
        )));
    }

    let raw = fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("cannot read {}: {e}", path.display())))?;

    let overlay_val: toml::Value = toml::from_str(&raw)
        .map_err(|e| AppError::Config(format!("parse error in {}: {e}", path.display())))?;

    if let Some(base_str) = overlay_val
        .get("meta")
        .and_then(|m| m.get("base"))
        .and_then(|b| b.as_str())
    {
        let base_path = if Path::new(base_str).is_absolute() {
            PathBuf::from(base_str)
        } else {
            path.parent().unwrap_or(Path::new(".")).join(base_str)
        };
        let base_val = load_raw_merged(&base_path, visited)?;
        Ok(merge_toml(base_val, overlay_val))
    } else {
        Ok(overlay_val)
    }
}

/// Load config from the given path, or `config/default.toml`, then apply
/// env-var overrides. With neither present the built-in defaults are used.
pub fn load(config_path: Option<&str>) -> Result<Config, AppError> {
    let log_level_override = env::var("TRAVELBOT_LOG_LEVEL").ok();
    let health_bind_override = env::var("TRAVELBOT_HEALTH_BIND").ok();

    if let Some(path) = config_path {
        return load_from(
            Path::new(path),
            log_level_override.as_deref(),
            health_bind_override.as_deref(),
        );
    }

    let default_path = Path::new("config/default.toml");
    if default_path.exists() {
        load_from(
            default_path,
            log_level_override.as_deref(),
            health_bind_override.as_deref(),
        )
    } else {
        resolve(
            RawConfig::default(),
            log_level_override.as_deref(),
            health_bind_override.as_deref(),
        )
    }
}

/// Internal loader — accepts an explicit path and optional overrides.
/// Tests pass overrides directly instead of mutating env vars.
pub fn load_from(
    path: &Path,
    log_level_override: Option<&str>,
    health_bind_override: Option<&str>,
) -> Result<Config, AppError> {
    let merged_val = load_raw_merged(path, &mut HashSet::new())?;

    let parsed: RawConfig = Deserialize::deserialize(merged_val).map_err(|e: toml::de::Error| {
        AppError::Config(format!("config error in {}: {e}", path.display()))
    })?;

    resolve(parsed, log_level_override, health_bind_override)
}

/// Turn the raw TOML shape into the resolved [`Config`], reading secrets
/// from the environment.
fn resolve(
    parsed: RawConfig,
    log_level_override: Option<&str>,
    health_bind_override: Option<&str>,
) -> Result<Config, AppError> {
    let relay = parsed.relay;

    if relay.start_command.trim().is_empty() {
        return Err(AppError::Config("relay.start_command must not be empty".into()));
    }

    let persona = match (relay.persona, relay.persona_file) {
        (Some(inline), _) => inline,
        (None, Some(file)) => fs::read_to_string(&file).map_err(|e| {
            AppError::Config(format!("cannot read persona file {file}: {e}"))
        })?,
        (None, None) => raw::DEFAULT_PERSONA.to_string(),
    };
    let persona = persona.trim_end().to_string();
    if persona.is_empty() {
        return Err(AppError::Config("relay persona must not be empty".into()));
    }

    Ok(Config {
        bot_name: parsed.bot.name,
        log_level: log_level_override.unwrap_or(&parsed.bot.log_level).to_string(),
        comms: CommsConfig {
            telegram: TelegramConfig {
                enabled: parsed.comms.telegram.enabled,
                token: non_empty_env("TELEGRAM_BOT_TOKEN"),
                username: non_empty_env("TELEGRAM_BOT_USERNAME")
                    .map(|u| u.trim_start_matches('@').to_string()),
            },
            health: HealthConfig {
                enabled: parsed.comms.health.enabled,
                bind: health_bind_override.unwrap_or(&parsed.comms.health.bind).to_string(),
            },
        },
        relay: RelayConfig {
            start_command: relay.start_command,
            persona,
            replies: Replies {
                welcome: relay.welcome,
                unavailable: relay.unavailable_reply,
                error: relay.error_reply,
                busy: relay.busy_reply,
            },
            max_in_flight: relay.max_in_flight.max(1),
            overflow: relay.overflow,
            shutdown_grace_seconds: relay.shutdown_grace_seconds,
        },
        llm: LlmConfig {
            provider: parsed.llm.provider,
            openai: OpenAiConfig {
                api_base_url: parsed.llm.openai.api_base_url,
                model: parsed.llm.openai.model,
                temperature: parsed.llm.openai.temperature,
                max_tokens: parsed.llm.openai.max_tokens,
                timeout_seconds: parsed.llm.openai.timeout_seconds,
            },
        },
        llm_api_key: non_empty_env("LLM_API_KEY"),
    })
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
