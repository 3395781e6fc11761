//! Error types for the pipeline

use storyboard_domain::StateError;
use storyboard_llm::LlmError;
use thiserror::Error;

/// Errors that can occur while splitting or describing
///
/// None of these are retried automatically. When an action fails, the
/// scheduler state it was working on is left exactly as it was.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// Missing or invalid input, caught before any network call
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

    /// Success status but an unusable body
    #[error("Unexpected response ({reason}): {body}")]
    Schema {
        /// What was missing or malformed
        reason: String,
        /// Raw response body
        body: String,
    },

    /// The model reply contained no numbered lines
    #[error("No numbered lines found in model output:\n{raw}")]
    Parse {
        /// The reply, verbatim
        raw: String,
    },

    /// Scheduler state rejected a transition
    #[error("State error: {0}")]
    State(#[from] StateError),
}

impl PipelineError {
    /// Stable short name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Config(_) => "config",
            PipelineError::Transport(_) => "transport",
            PipelineError::Protocol { .. } => "protocol",
            PipelineError::Schema { .. } => "schema",
            PipelineError::Parse { .. } => "parse",
            PipelineError::State(_) => "state",
        }
    }

    /// Raw provider output preserved with the error, if any
    pub fn raw_body(&self) -> Option<&str> {
        match self {
            PipelineError::Protocol { body, .. } | PipelineError::Schema { body, .. } => Some(body),
            PipelineError::Parse { raw } => Some(raw),
            _ => None,
        }
    }
}

impl From<LlmError> for PipelineError {
    fn from(e: LlmError) -> Self {
        match e {
            LlmError::Config(msg) => PipelineError::Config(msg),
            LlmError::Transport(msg) => PipelineError::Transport(msg),
            LlmError::Protocol { status, body } => PipelineError::Protocol { status, body },
            LlmError::Schema { reason, body } => PipelineError::Schema { reason, body },
        }
    }
}
