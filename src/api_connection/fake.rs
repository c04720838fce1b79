//! Scripted text generator for tests and offline runs.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use super::{ApiConnectionError, GenerationOptions, Prompt, TextGenerator};

#[derive(Debug)]
enum Reply {
    Text(String),
    Failure(String),
}

/// Replays queued replies in order, optionally after a delay.
///
/// Once the queue is drained the last reply keeps being returned. Every prompt
/// it receives is recorded so tests can inspect what was sent.
#[derive(Debug, Default)]
pub struct ScriptedGenerator {
    replies: Mutex<VecDeque<Reply>>,
    last: Mutex<Option<Reply>>,
    delay: Option<Duration>,
    prompts: Mutex<Vec<Prompt>>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(response: &str) -> Self {
        let generator = Self::new();
        generator.push_response(response);
        generator
    }

    /// A generator whose every call fails the way an unreachable provider would.
    pub fn failing(message: &str) -> Self {
        let generator = Self::new();
        lock(&generator.replies).push_back(Reply::Failure(message.to_string()));
        generator
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn push_response(&self, response: &str) {
        lock(&self.replies).push_back(Reply::Text(response.to_string()));
    }

    pub fn prompts(&self) -> Vec<Prompt> {
        lock(&self.prompts).clone()
    }

    fn next_reply(&self) -> Result<String, ApiConnectionError> {
        let mut replies = lock(&self.replies);
        let mut last = lock(&self.last);
        if let Some(reply) = replies.pop_front() {
            *last = Some(reply);
        }
        match last.as_ref() {
            Some(Reply::Text(text)) => Ok(text.clone()),
            Some(Reply::Failure(message)) => Err(ApiConnectionError::ApiError {
                status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
                error_body: message.clone(),
            }),
            None => Err(ApiConnectionError::EmptyResponse),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(
        &self,
        prompt: &Prompt,
        _options: &GenerationOptions,
    ) -> Result<String, ApiConnectionError> {
        lock(&self.prompts).push(prompt.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.next_reply()
    }

    fn provider_name(&self) -> &'static str {
        "scripted"
    }
}
