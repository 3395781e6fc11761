//! Storyboard LLM Provider Layer
//!
//! Chat-completion plumbing for OpenAI-compatible endpoints.
//!
//! # Architecture
//!
//! - [`provider`]: the Provider Adapter. Maps a provider selection plus an
//!   optional model override to a URL, a model name and auth headers.
//! - [`openai`]: the Completion Client. One POST per call, bounded timeout,
//!   no retries, errors sorted into [`LlmError`] kinds.
//! - [`ChatProvider`]: the seam the pipeline depends on, so tests can swap in
//!   [`MockProvider`].
//!
//! # Examples
//!
//! ```
//! use storyboard_llm::{ChatProvider, ChatRequest, MockProvider};
//!
//! # async fn example() {
//! let provider = MockProvider::new("1. 他走进屋子。");
//! let request = ChatRequest::new("split it", "他走进屋子。", 0.7);
//! let reply = provider.complete(&request).await.unwrap();
//! assert_eq!(reply, "1. 他走进屋子。");
//! # }
//! ```

#![warn(missing_docs)]

pub mod openai;
pub mod provider;

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::{Arc, Mutex};
use thiserror::Error;

pub use openai::{ChatClient, OpenAiCompatibleProvider};
pub use provider::{Provider, ProviderConfig, ResolvedEndpoint};

/// Errors that can occur during a completion call
///
/// Every variant is terminal for the call that produced it. `Protocol` and
/// `Schema` keep the raw response body so users can diagnose wrong model ids
/// or exhausted quotas themselves.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LlmError {
    /// Caller-fixable problem detected before any network call
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network failure, DNS failure or timeout
    #[error("Transport error: {0}")]
    Transport(String),

    /// Provider answered with a non-success status
    #[error("Provider returned HTTP {status}: {body}")]
    Protocol {
        /// HTTP status code
        status: u16,
        /// Raw response body
        body: String,
    },

    /// Success status but no usable `choices[0].message.content`
    #[error("Unexpected response ({reason}): {body}")]
    Schema {
        /// What was missing or malformed
        reason: String,
        /// Raw response body
        body: String,
    },
}

/// One chat-completion request: a system instruction and a user message
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    /// Instruction prompt sent with the `system` role (omitted when empty)
    pub system: String,

    /// Content sent with the `user` role
    pub user: String,

    /// Sampling temperature
    pub temperature: f32,
}

impl ChatRequest {
    /// Create a new request
    pub fn new(system: impl Into<String>, user: impl Into<String>, temperature: f32) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            temperature,
        }
    }
}

/// A chat-completion backend
///
/// Implementations make at most one upstream call per `complete` and never
/// retry on their own.
#[allow(async_fn_in_trait)]
pub trait ChatProvider {
    /// Send one request and return the assistant message text verbatim
    async fn complete(&self, request: &ChatRequest) -> Result<String, LlmError>;

    /// Model name used for log lines and reports
    fn model_name(&self) -> String;
}

type Responder = Arc<dyn Fn(&ChatRequest) -> Result<String, LlmError> + Send + Sync>;

/// Mock provider for deterministic testing
///
/// Lookup order for each call: queued outcomes, responses keyed by the user
/// content, the responder function, then the default response. Every request
/// is recorded.
///
/// # Examples
///
/// ```
/// use storyboard_llm::{ChatProvider, ChatRequest, LlmError, MockProvider};
///
/// # async fn example() {
/// let mut provider = MockProvider::default();
/// provider.add_response("a", "1. a");
/// provider.push_error(LlmError::Transport("down".to_string()));
///
/// let request = ChatRequest::new("", "a", 0.0);
/// assert!(provider.complete(&request).await.is_err());
/// assert_eq!(provider.complete(&request).await.unwrap(), "1. a");
/// assert_eq!(provider.call_count(), 2);
/// # }
/// ```
#[derive(Clone)]
pub struct MockProvider {
    default_response: String,
    responses: Arc<Mutex<HashMap<String, String>>>,
    queued: Arc<Mutex<VecDeque<Result<String, LlmError>>>>,
    responder: Option<Responder>,
    requests: Arc<Mutex<Vec<ChatRequest>>>,
}

impl MockProvider {
    /// Create a new MockProvider with a fixed response for all requests
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            responses: Arc::new(Mutex::new(HashMap::new())),
            queued: Arc::new(Mutex::new(VecDeque::new())),
            responder: None,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a MockProvider that computes each reply from the request
    pub fn from_fn<F>(responder: F) -> Self
    where
        F: Fn(&ChatRequest) -> Result<String, LlmError> + Send + Sync + 'static,
    {
        let mut provider = Self::default();
        provider.responder = Some(Arc::new(responder));
        provider
    }

    /// Add a specific response for a given user content
    pub fn add_response(&mut self, user: impl Into<String>, response: impl Into<String>) {
        self.responses
            .lock()
            .unwrap()
            .insert(user.into(), response.into());
    }

    /// Queue a reply that is returned by the next call, ahead of everything else
    pub fn push_response(&self, response: impl Into<String>) {
        self.queued.lock().unwrap().push_back(Ok(response.into()));
    }

    /// Queue an error that is returned by the next call
    pub fn push_error(&self, error: LlmError) {
        self.queued.lock().unwrap().push_back(Err(error));
    }

    /// Get the number of times complete was called
    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Every request received so far, in order
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("Default mock response")
    }
}

impl fmt::Debug for MockProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockProvider")
            .field("default_response", &self.default_response)
            .field("has_responder", &self.responder.is_some())
            .field("call_count", &self.call_count())
            .finish()
    }
}

impl ChatProvider for MockProvider {
    async fn complete(&self, request: &ChatRequest) -> Result<String, LlmError> {
        self.requests.lock().unwrap().push(request.clone());

        if let Some(outcome) = self.queued.lock().unwrap().pop_front() {
            return outcome;
        }

        if let Some(response) = self.responses.lock().unwrap().get(&request.user) {
            return Ok(response.clone());
        }

        if let Some(responder) = &self.responder {
            return responder(request);
        }

        Ok(self.default_response.clone())
    }

    fn model_name(&self) -> String {
        "mock".to_string()
    }
}
