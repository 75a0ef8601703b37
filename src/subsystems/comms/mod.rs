//! Comms subsystem — the bot's external I/O channels.
//!
//! Each channel (Telegram, liveness HTTP) implements [`Component`] and is
//! spawned as an independent task by [`start`] via [`spawn_components`].
//! The Telegram channel owns the relay; the provider is injected here.

#[cfg(feature = "channel-health")]
pub mod health;
#[cfg(feature = "channel-telegram")]
pub mod telegram;

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::Config;
use crate::error::AppError;
use crate::llm::LlmProvider;
use crate::subsystems::runtime::{Component, SubsystemHandle, spawn_components};

/// Spawn all configured channels and return a [`SubsystemHandle`].
///
/// Fails before spawning anything if an enabled channel is missing a secret.
#[cfg_attr(not(feature = "channel-telegram"), allow(unused_variables))]
pub fn start(
    config: &Config,
    provider: LlmProvider,
    shutdown: CancellationToken,
) -> Result<SubsystemHandle, AppError> {
    let mut components: Vec<Box<dyn Component>> = Vec::new();

    #[cfg(feature = "channel-telegram")]
    {
        if config.comms_telegram_should_load() {
            let token = config
                .comms
                .telegram
                .token
                .clone()
                .ok_or_else(|| AppError::Config("TELEGRAM_BOT_TOKEN is not set".into()))?;
            info!("loading telegram channel");
            components.push(Box::new(telegram::TelegramChannel::new(
                "telegram0",
                token,
                config.comms.telegram.username.clone(),
                config.relay.clone(),
                provider,
            )));
        }
    }

    #[cfg(feature = "channel-health")]
    {
        if config.comms_health_should_load() {
            info!(bind = %config.comms.health.bind, "loading health endpoint");
            components.push(Box::new(health::HealthServer::new(
                "health0",
                config.comms.health.bind.clone(),
            )));
        }
    }

    Ok(spawn_components(components, shutdown))
}
