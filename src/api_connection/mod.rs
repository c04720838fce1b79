//! Text-generation service access.
//!
//! The planner only depends on the [`TextGenerator`] trait; [`OpenRouterClient`]
//! talks to the OpenRouter chat-completions API and [`ScriptedGenerator`] replays
//! canned responses for tests.

pub mod connection;
pub mod endpoints;
pub mod fake;

pub use connection::{ApiConnectionError, OpenRouterClient};
pub use fake::ScriptedGenerator;

use async_trait::async_trait;
use std::fmt;

/// A prompt split into the fixed instruction block and the request-specific body.
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

/// Sampling settings forwarded to the provider.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOptions {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Ask the provider for a bare JSON object response.
    pub json_mode: bool,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            model: endpoints::DEFAULT_MODEL.to_string(),
            temperature: 0.2,
            max_tokens: 2048,
            json_mode: true,
        }
    }
}

/// A service that turns a prompt into free-form text.
///
/// Nothing about the returned text is guaranteed; callers parse it defensively.
#[async_trait]
pub trait TextGenerator: Send + Sync + fmt::Debug {
    async fn generate(
        &self,
        prompt: &Prompt,
        options: &GenerationOptions,
    ) -> Result<String, ApiConnectionError>;

    /// Short provider name used in log lines.
    fn provider_name(&self) -> &'static str;
}
