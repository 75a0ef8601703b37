//! LLM provider abstraction.
//!
//! `LlmProvider` is an enum over concrete provider implementations.
//! Add a new variant + module in `providers/` for each additional backend.
//!
//! Provider instances are shared immutable capabilities — clone them freely.
//! Every call is a single round-trip with exactly two messages: the system
//! persona followed by the user's text. There is no history.

pub mod providers;

use thiserror::Error;

// ── Error ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("unknown provider: {0}")]
    UnknownProvider(String),
    #[error("failed to build HTTP client: {0}")]
    Client(String),
    /// Connection, TLS or timeout failure before a status line was read.
    #[error("completion request failed: {0}")]
    Transport(String),
    /// The endpoint answered with a non-success status.
    #[error("completion endpoint returned HTTP {0}")]
    Status(u16),
    /// Success status but nothing in the body.
    #[error("completion endpoint returned an empty body")]
    EmptyBody,
    /// The body was not the `{choices:[{message:{content}}]}` shape.
    #[error("malformed completion response: {0}")]
    Malformed(String),
}

impl ProviderError {
    /// `true` when the completion service could not be reached or refused the
    /// request, as opposed to answering with something we could not read.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            ProviderError::Transport(_) | ProviderError::Status(_) | ProviderError::EmptyBody
        )
    }
}

// ── Provider enum ─────────────────────────────────────────────────────────────

/// All available provider backends.
///
/// Enum dispatch avoids `dyn` trait objects and the `async-trait` dependency.
/// Adding a backend = new module + new variant + new `complete` arm.
#[derive(Debug, Clone)]
pub enum LlmProvider {
    Dummy(providers::dummy::DummyProvider),
    OpenAiCompatible(providers::openai_compatible::OpenAiCompatibleProvider),
    /// Panics on every call; exercises the relay's panic containment.
    #[cfg(test)]
    Panicking,
}

impl LlmProvider {
    /// Send `system` + `content` to the provider and return its text reply
    /// exactly as the provider produced it.
    pub async fn complete(&self, system: &str, content: &str) -> Result<String, ProviderError> {
        match self {
            LlmProvider::Dummy(p) => p.complete(system, content).await,
            LlmProvider::OpenAiCompatible(p) => p.complete(system, content).await,
            #[cfg(test)]
            LlmProvider::Panicking => panic!("provider blew up on {content:?}"),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            LlmProvider::Dummy(_) => "dummy",
            LlmProvider::OpenAiCompatible(_) => "openai",
            #[cfg(test)]
            LlmProvider::Panicking => "panicking",
        }
    }
}
