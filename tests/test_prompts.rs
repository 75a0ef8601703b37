//! Tests for the shipped persona prompt and default config.

use std::fs;
use std::path::Path;

use travelbot::config::{self, OverflowPolicy};

#[test]
fn test_travel_guide_prompt_file_exists() {
    let path = "config/prompts/travel_guide.txt";
    assert!(fs::metadata(path).is_ok(), "travel_guide.txt prompt file missing");
}

#[test]
fn test_travel_guide_prompt_names_the_bot() {
    let text = fs::read_to_string("config/prompts/travel_guide.txt").unwrap();
    assert!(text.contains("TravelBot"), "persona should introduce itself as TravelBot");
    assert!(!text.trim().is_empty());
}

#[test]
fn test_default_config_loads() {
    let cfg = config::load_from(Path::new("config/default.toml"), None, None).unwrap();

    assert_eq!(cfg.relay.start_command, "/start");
    assert_eq!(cfg.relay.overflow, OverflowPolicy::Queue);
    assert!(cfg.relay.max_in_flight >= 1);

    let openai = &cfg.llm.openai;
    assert_eq!(cfg.llm.provider, "openai");
    assert_eq!(openai.model, "llama-3.3-70b-versatile");
    assert_eq!(openai.temperature, 0.7);
    assert_eq!(openai.max_tokens, 1024);
}

#[test]
fn test_default_config_uses_prompt_file() {
    let cfg = config::load_from(Path::new("config/default.toml"), None, None).unwrap();
    let file = fs::read_to_string("config/prompts/travel_guide.txt").unwrap();
    assert_eq!(cfg.relay.persona, file.trim_end());
}
