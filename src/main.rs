//! travelbot — entry point.
//!
//! Startup sequence:
//!   1. Load .env (if present)
//!   2. Load config
//!   3. Resolve effective log level (CLI `-v` flags > env > config)
//!   4. Init logger once
//!   5. Build the LLM provider (owns the process's HTTP client)
//!   6. Spawn Ctrl-C → shutdown signal watcher
//!   7. Run comms channels until shutdown or a channel error

use tokio_util::sync::CancellationToken;
use tracing::info;

use travelbot::config::{self, Config};
use travelbot::error::AppError;
use travelbot::llm::providers;
use travelbot::logger;
use travelbot::subsystems::comms;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    // .env is optional.
    let _ = dotenvy::dotenv();

    let args = parse_cli_args();

    let config = config::load(args.config_path.as_deref())?;

    let effective_log_level = args.log_level.unwrap_or(config.log_level.as_str());
    logger::init(effective_log_level, args.log_level.is_some())?;

    log_startup_summary(&config, effective_log_level);

    let provider = providers::build(&config.llm, config.llm_api_key.clone())?;
    info!(provider = provider.name(), "llm provider ready");

    let shutdown = CancellationToken::new();

    let ctrlc_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("ctrl-c received — initiating shutdown");
            ctrlc_token.cancel();
        }
    });

    let channels = comms::start(&config, provider, shutdown.clone())?;
    let result = channels.join().await;

    shutdown.cancel();
    info!("travelbot stopped");
    result
}

fn log_startup_summary(config: &Config, effective_log_level: &str) {
    info!(
        bot_name = %config.bot_name,
        configured_log_level = %config.log_level,
        effective_log_level = %effective_log_level,
        "config loaded"
    );
    info!(
        provider = %config.llm.provider,
        model = %config.llm.openai.model,
        temperature = config.llm.openai.temperature,
        max_tokens = config.llm.openai.max_tokens,
        timeout_seconds = config.llm.openai.timeout_seconds,
        api_key_set = config.llm_api_key.is_some(),
        "llm"
    );
    info!(
        max_in_flight = config.relay.max_in_flight,
        overflow = ?config.relay.overflow,
        telegram = config.comms_telegram_should_load(),
        health = config.comms_health_should_load(),
        "relay"
    );
}

struct CliArgs {
    log_level: Option<&'static str>,
    config_path: Option<String>,
}

fn parse_cli_args() -> CliArgs {
    let mut verbosity = 0u8;
    let mut config_path = None;

    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        if arg == "--" {
            break;
        }

        match arg.as_str() {
            "-h" | "--help" => {
                println!("Usage: travelbot [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -h, --help                 Print help");
                println!("  -f, --config <PATH>        Path to configuration file (default: config/default.toml)");
                println!("  -v, -vv, -vvv, -vvvv       Increase logging verbosity");
                println!();
                println!("Environment:");
                println!("  TELEGRAM_BOT_TOKEN         Bot API token (required)");
                println!("  TELEGRAM_BOT_USERNAME      Expected bot username");
                println!("  LLM_API_KEY                Completion service API key");
                std::process::exit(0);
            }
            "-f" | "--config" => {
                if let Some(path) = iter.next() {
                    config_path = Some(path);
                } else {
                    eprintln!("error: -f/--config requires a path argument");
                    std::process::exit(1);
                }
            }
            "--verbose" => verbosity = verbosity.saturating_add(1),
            a if a.starts_with('-') && a.len() > 1 && a.chars().skip(1).all(|c| c == 'v') => {
                verbosity = verbosity.saturating_add((a.len() - 1) as u8);
            }
            _ => {}
        }
    }

    // Each -v raises verbosity one tier:
    //   -v → warn, -vv → info, -vvv → debug, -vvvv+ → trace
    let log_level = match verbosity {
        0 => None,
        1 => Some("warn"),
        2 => Some("info"),
        3 => Some("debug"),
        _ => Some("trace"),
    };

    CliArgs { log_level, config_path }
}
