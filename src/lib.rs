//! travelbot — a Telegram travel-guide bot that relays each chat message to
//! an OpenAI-compatible completion endpoint and sends the reply back.
//!
//! The binary entry point is `src/main.rs`; the library exposes the pieces
//! for integration tests.

pub mod config;
pub mod error;
pub mod llm;
pub mod logger;
pub mod subsystems;
