use async_trait::async_trait;
use reqwest::Client;
use std::env;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use super::endpoints::{
    ChatCompletionRequest, ChatCompletionResponse, ChatMessage, ProviderPreference,
    ResponseFormat, OPENROUTER_CHAT_URL,
};
use super::{GenerationOptions, Prompt, TextGenerator};

#[derive(Debug, Error)]
pub enum ApiConnectionError {
    #[error("API key not found in environment: {0}")]
    MissingApiKey(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("API error {status}: {error_body}")]
    ApiError {
        status: reqwest::StatusCode,
        error_body: String,
    },

    #[error("API returned no content")]
    EmptyResponse,

    #[error("No response within {0:?}")]
    Timeout(Duration),
}

/// Chat-completions client for OpenRouter.
///
/// The API key is read once at construction; the underlying `reqwest::Client`
/// is reused for every call.
#[derive(Debug, Clone)]
pub struct OpenRouterClient {
    api_key: String,
    client: Client,
    endpoint: String,
    site_url: String,
    app_name: String,
    provider: Option<ProviderPreference>,
}

impl OpenRouterClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            client: Client::new(),
            endpoint: OPENROUTER_CHAT_URL.to_string(),
            site_url: "http://localhost:3000".to_string(),
            app_name: "MealPlanner".to_string(),
            provider: None,
        }
    }

    /// Build a client from the key stored in `api_key_env_var`.
    ///
    /// `SITE_URL` and `APP_NAME` are picked up for the attribution headers
    /// OpenRouter expects.
    pub fn from_env(api_key_env_var: &str) -> Result<Self, ApiConnectionError> {
        let api_key = env::var(api_key_env_var)
            .map_err(|_| ApiConnectionError::MissingApiKey(api_key_env_var.to_string()))?;
        let mut client = Self::new(api_key);
        if let Ok(site_url) = env::var("SITE_URL") {
            client.site_url = site_url;
        }
        if let Ok(app_name) = env::var("APP_NAME") {
            client.app_name = app_name;
        }
        Ok(client)
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Pin requests to specific upstream providers (e.g. `["Cerebras"]`).
    pub fn with_providers(mut self, providers: Vec<String>) -> Self {
        self.provider = if providers.is_empty() {
            None
        } else {
            Some(ProviderPreference { only: providers })
        };
        self
    }

    pub async fn call_chat_completion(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, ApiConnectionError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .header("HTTP-Referer", &self.site_url)
            .header("X-Title", &self.app_name)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            warn!(%status, "chat completion rejected");
            return Err(ApiConnectionError::ApiError { status, error_body });
        }

        let body = response.text().await?;
        let parsed: ChatCompletionResponse = serde_json::from_str(&body)?;
        if let Some(usage) = &parsed.usage {
            debug!(
                prompt_tokens = usage.prompt_tokens,
                total_tokens = usage.total_tokens,
                "chat completion usage"
            );
        }
        Ok(parsed)
    }

    fn build_request(&self, prompt: &Prompt, options: &GenerationOptions) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: options.model.clone(),
            messages: vec![
                ChatMessage::system(prompt.system.clone()),
                ChatMessage::user(prompt.user.clone()),
            ],
            response_format: options.json_mode.then(ResponseFormat::json_object),
            temperature: Some(options.temperature),
            max_tokens: Some(options.max_tokens),
            provider: self.provider.clone(),
        }
    }
}

#[async_trait]
impl TextGenerator for OpenRouterClient {
    async fn generate(
        &self,
        prompt: &Prompt,
        options: &GenerationOptions,
    ) -> Result<String, ApiConnectionError> {
        let request = self.build_request(prompt, options);
        let response = self.call_chat_completion(&request).await?;
        match response.first_content().map(str::trim) {
            Some(content) if !content.is_empty() => Ok(content.to_string()),
            _ => Err(ApiConnectionError::EmptyResponse),
        }
    }

    fn provider_name(&self) -> &'static str {
        "openrouter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_request_carries_options() {
        let client = OpenRouterClient::new("key").with_providers(vec!["Cerebras".to_string()]);
        let prompt = Prompt {
            system: "plan meals".to_string(),
            user: "recipes here".to_string(),
        };
        let options = GenerationOptions {
            temperature: 0.1,
            max_tokens: 512,
            ..Default::default()
        };
        let request = client.build_request(&prompt, &options);

        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, "system");
        assert_eq!(request.messages[1].content, "recipes here");
        assert_eq!(request.temperature, Some(0.1));
        assert_eq!(request.max_tokens, Some(512));
        assert!(request.response_format.is_some());
        assert_eq!(request.provider.unwrap().only, vec!["Cerebras".to_string()]);
    }

    #[test]
    fn test_json_mode_off_omits_response_format() {
        let client = OpenRouterClient::new("key");
        let prompt = Prompt {
            system: String::new(),
            user: String::new(),
        };
        let options = GenerationOptions {
            json_mode: false,
            ..Default::default()
        };
        assert!(client.build_request(&prompt, &options).response_format.is_none());
    }
}
