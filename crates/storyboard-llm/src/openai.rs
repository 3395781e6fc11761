//! Completion Client for OpenAI-compatible endpoints
//!
//! One POST per call with a bounded timeout. There is no retry loop: a failed
//! call is reported as-is and the caller decides whether to run it again.
//!
//! # Examples
//!
//! ```no_run
//! use storyboard_llm::{ChatProvider, ChatRequest, OpenAiCompatibleProvider, Provider, ProviderConfig};
//!
//! # async fn example() -> Result<(), storyboard_llm::LlmError> {
//! let config = ProviderConfig::new(Provider::DeepSeek, "sk-...");
//! let provider = OpenAiCompatibleProvider::new(config)?;
//! let reply = provider
//!     .complete(&ChatRequest::new("You are a storyboard artist.", "他走进屋子。", 0.7))
//!     .await?;
//! println!("{}", reply);
//! # Ok(())
//! # }
//! ```

use crate::provider::{ProviderConfig, ResolvedEndpoint, MAX_TIMEOUT_SECS};
use crate::{ChatProvider, ChatRequest, LlmError};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Request body for the chat-completions API
#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

/// Response from the chat-completions API; only the fields we read
#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Option<Vec<Choice>>,
}

#[derive(Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ResponseMessage>,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Thin HTTP client that posts one chat request to a resolved endpoint
#[derive(Debug, Clone)]
pub struct ChatClient {
    client: reqwest::Client,
}

impl ChatClient {
    /// Create a client with the given request timeout
    ///
    /// # Errors
    /// Returns [`LlmError::Config`] if the underlying HTTP client cannot be built
    pub fn new(timeout: Duration) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    /// Send one request and return `choices[0].message.content` verbatim
    ///
    /// # Errors
    ///
    /// - [`LlmError::Transport`] for connection failures and timeouts
    /// - [`LlmError::Protocol`] for non-success statuses, with the raw body
    /// - [`LlmError::Schema`] for success bodies without message content
    pub async fn send(
        &self,
        endpoint: &ResolvedEndpoint,
        request: &ChatRequest,
    ) -> Result<String, LlmError> {
        let mut messages = Vec::with_capacity(2);
        if !request.system.is_empty() {
            messages.push(WireMessage {
                role: "system",
                content: &request.system,
            });
        }
        messages.push(WireMessage {
            role: "user",
            content: &request.user,
        });

        let body = ChatCompletionRequest {
            model: &endpoint.model,
            messages,
            temperature: request.temperature,
        };

        let mut builder = self.client.post(&endpoint.url).json(&body);
        for (name, value) in &endpoint.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.send().await.map_err(transport_error)?;
        let status = response.status();
        let raw = response.text().await.map_err(transport_error)?;

        debug!(status = status.as_u16(), body_len = raw.len(), "chat completion response");

        if !status.is_success() {
            return Err(LlmError::Protocol {
                status: status.as_u16(),
                body: raw,
            });
        }

        parse_completion(raw)
    }
}

/// Pull `choices[0].message.content` out of a success body
fn parse_completion(raw: String) -> Result<String, LlmError> {
    let parsed: ChatCompletionResponse = match serde_json::from_str(&raw) {
        Ok(parsed) => parsed,
        Err(e) => {
            return Err(LlmError::Schema {
                reason: format!("body is not valid JSON: {}", e),
                body: raw,
            })
        }
    };

    let Some(choices) = parsed.choices else {
        return Err(LlmError::Schema {
            reason: "missing 'choices' field".to_string(),
            body: raw,
        });
    };

    match choices.into_iter().next().and_then(|c| c.message).and_then(|m| m.content) {
        Some(content) => Ok(content),
        None => Err(LlmError::Schema {
            reason: "missing choices[0].message.content".to_string(),
            body: raw,
        }),
    }
}

fn transport_error(e: reqwest::Error) -> LlmError {
    if e.is_timeout() {
        LlmError::Transport(format!("Request timed out: {}", e))
    } else if e.is_connect() {
        LlmError::Transport(format!("Connection failed: {}", e))
    } else {
        LlmError::Transport(format!("Request failed: {}", e))
    }
}

/// [`ChatProvider`] backed by a real OpenAI-compatible endpoint
///
/// The [`ProviderConfig`] is resolved again on every call; configuration
/// problems therefore surface from `complete` before any network traffic.
#[derive(Debug, Clone)]
pub struct OpenAiCompatibleProvider {
    config: ProviderConfig,
    client: ChatClient,
}

impl OpenAiCompatibleProvider {
    /// Create a provider from a config
    ///
    /// # Errors
    /// Returns [`LlmError::Config`] if the timeout is outside `1..=600` seconds
    pub fn new(config: ProviderConfig) -> Result<Self, LlmError> {
        if config.timeout_secs == 0 || config.timeout_secs > MAX_TIMEOUT_SECS {
            return Err(LlmError::Config(format!(
                "timeout_secs must be between 1 and {}, got {}",
                MAX_TIMEOUT_SECS, config.timeout_secs
            )));
        }
        let client = ChatClient::new(Duration::from_secs(config.timeout_secs))?;
        Ok(Self { config, client })
    }

    /// The configuration this provider resolves on each call
    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }
}

impl ChatProvider for OpenAiCompatibleProvider {
    async fn complete(&self, request: &ChatRequest) -> Result<String, LlmError> {
        let endpoint = self.config.resolve()?;

        debug!(
            provider = %self.config.provider,
            model = %endpoint.model,
            url = endpoint.redacted_url(),
            system_len = request.system.len(),
            user_len = request.user.len(),
            "sending chat completion request"
        );

        let result = self.client.send(&endpoint, request).await;
        if let Err(e) = &result {
            warn!(provider = %self.config.provider, "chat completion failed: {}", e);
        }
        result
    }

    fn model_name(&self) -> String {
        self.config
            .effective_model()
            .unwrap_or_else(|| "<unset>".to_string())
    }
}
