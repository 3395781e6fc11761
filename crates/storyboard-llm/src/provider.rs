//! Provider Adapter
//!
//! Resolves a provider selection into the concrete endpoint for one call.
//! Resolution is pure: the same [`ProviderConfig`] always yields the same
//! [`ResolvedEndpoint`], so callers re-resolve on every request instead of
//! caching anything.

use crate::LlmError;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Path every OpenAI-compatible chat endpoint ends with
pub const COMPLETIONS_PATH: &str = "/chat/completions";

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 180;

/// Upper bound accepted for the request timeout (seconds)
pub const MAX_TIMEOUT_SECS: u64 = 600;

/// Model used with custom relays when none is given
pub const DEFAULT_RELAY_MODEL: &str = "deepseek-chat";

/// An LLM vendor or relay implementing the chat-completions wire format
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Provider {
    /// DeepSeek platform
    DeepSeek,
    /// OpenAI platform
    OpenAi,
    /// Google Gemini through its OpenAI-compatible surface
    Gemini,
    /// Volcengine Ark (Doubao); requires an explicit endpoint id
    Doubao,
    /// Moonshot (Kimi)
    Moonshot,
    /// Alibaba DashScope compatible mode (Qwen)
    Qwen,
    /// Any relay speaking the same wire format
    Custom {
        /// Base URL as typed by the user; normalized at resolution time
        base_url: String,
    },
}

/// Providers with a fixed endpoint, in display order
pub const KNOWN_PROVIDERS: [Provider; 6] = [
    Provider::DeepSeek,
    Provider::OpenAi,
    Provider::Gemini,
    Provider::Doubao,
    Provider::Moonshot,
    Provider::Qwen,
];

impl Provider {
    /// Parse a provider name as used on the command line and in config files
    ///
    /// `base_url` is only consulted for the custom relay; an absent URL is
    /// kept as an empty string and rejected later, at resolution time.
    pub fn from_name(name: &str, base_url: Option<&str>) -> Result<Self, LlmError> {
        let provider = match name.trim().to_lowercase().as_str() {
            "deepseek" => Provider::DeepSeek,
            "openai" => Provider::OpenAi,
            "gemini" | "google" => Provider::Gemini,
            "doubao" | "ark" | "volcengine" => Provider::Doubao,
            "moonshot" | "kimi" => Provider::Moonshot,
            "qwen" | "dashscope" => Provider::Qwen,
            "custom" | "relay" => Provider::Custom {
                base_url: base_url.unwrap_or_default().to_string(),
            },
            other => {
                return Err(LlmError::Config(format!(
                    "Unknown provider '{}'. Expected one of: deepseek, openai, gemini, doubao, moonshot, qwen, custom",
                    other
                )))
            }
        };
        Ok(provider)
    }

    /// Short machine name
    pub fn name(&self) -> &'static str {
        match self {
            Provider::DeepSeek => "deepseek",
            Provider::OpenAi => "openai",
            Provider::Gemini => "gemini",
            Provider::Doubao => "doubao",
            Provider::Moonshot => "moonshot",
            Provider::Qwen => "qwen",
            Provider::Custom { .. } => "custom",
        }
    }

    /// Human-readable name
    pub fn display_name(&self) -> &'static str {
        match self {
            Provider::DeepSeek => "DeepSeek",
            Provider::OpenAi => "OpenAI",
            Provider::Gemini => "Google Gemini",
            Provider::Doubao => "Doubao (Volcengine Ark)",
            Provider::Moonshot => "Moonshot Kimi",
            Provider::Qwen => "Qwen (DashScope)",
            Provider::Custom { .. } => "Custom relay",
        }
    }

    /// Model used when the caller does not pick one
    pub fn default_model(&self) -> Option<&'static str> {
        match self {
            Provider::DeepSeek => Some("deepseek-chat"),
            Provider::OpenAi => Some("gpt-4o"),
            Provider::Gemini => Some("gemini-1.5-pro"),
            Provider::Doubao => None,
            Provider::Moonshot => Some("moonshot-v1-128k"),
            Provider::Qwen => Some("qwen-plus"),
            Provider::Custom { .. } => Some(DEFAULT_RELAY_MODEL),
        }
    }

    /// Whether the API key is also sent as a `key` query parameter
    pub fn accepts_query_key(&self) -> bool {
        matches!(self, Provider::Gemini)
    }

    /// Full completions URL for this provider
    ///
    /// # Errors
    /// Returns [`LlmError::Config`] for a custom relay with a blank or
    /// malformed base URL.
    pub fn endpoint_url(&self) -> Result<String, LlmError> {
        let url = match self {
            Provider::DeepSeek => "https://api.deepseek.com/chat/completions",
            Provider::OpenAi => "https://api.openai.com/v1/chat/completions",
            Provider::Gemini => {
                "https://generativelanguage.googleapis.com/v1beta/openai/chat/completions"
            }
            Provider::Doubao => "https://ark.cn-beijing.volces.com/api/v3/chat/completions",
            Provider::Moonshot => "https://api.moonshot.cn/v1/chat/completions",
            Provider::Qwen => "https://dashscope.aliyuncs.com/compatible-mode/v1/chat/completions",
            Provider::Custom { base_url } => return normalize_base_url(base_url),
        };
        Ok(url.to_string())
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Normalize a relay base URL into a completions URL
///
/// Trailing slashes are stripped and [`COMPLETIONS_PATH`] is appended unless
/// the URL already ends with it.
pub fn normalize_base_url(raw: &str) -> Result<String, LlmError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(LlmError::Config(
            "Custom provider requires a base URL".to_string(),
        ));
    }

    let full = if trimmed.ends_with(COMPLETIONS_PATH) {
        trimmed.to_string()
    } else {
        format!("{}{}", trimmed, COMPLETIONS_PATH)
    };

    let parsed = Url::parse(&full)
        .map_err(|e| LlmError::Config(format!("Invalid base URL '{}': {}", raw.trim(), e)))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(LlmError::Config(format!(
            "Base URL must use http or https, got '{}'",
            parsed.scheme()
        )));
    }

    Ok(full)
}

/// Everything needed to reach a provider for one call
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    /// Selected provider
    pub provider: Provider,

    /// API key (sent as a bearer token)
    pub api_key: String,

    /// Explicit model id; overrides the provider default
    pub model: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl ProviderConfig {
    /// Create a config with the default timeout
    pub fn new(provider: Provider, api_key: impl Into<String>) -> Self {
        Self {
            provider,
            api_key: api_key.into(),
            model: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Set an explicit model id
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the request timeout in seconds
    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Model that a call would use, if one can be determined
    pub fn effective_model(&self) -> Option<String> {
        self.model
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_string)
            .or_else(|| self.provider.default_model().map(str::to_string))
    }

    /// Resolve the URL, model and headers for one call
    ///
    /// # Errors
    /// Returns [`LlmError::Config`] when the API key is blank, a custom relay
    /// has no usable base URL, or the provider needs an explicit model id and
    /// none was given. No network access happens here.
    pub fn resolve(&self) -> Result<ResolvedEndpoint, LlmError> {
        let api_key = self.api_key.trim();
        if api_key.is_empty() {
            return Err(LlmError::Config("API key is required".to_string()));
        }

        let model = self.effective_model().ok_or_else(|| {
            LlmError::Config(format!(
                "{} requires an explicit model or endpoint id",
                self.provider.display_name()
            ))
        })?;

        let mut url = Url::parse(&self.provider.endpoint_url()?)
            .map_err(|e| LlmError::Config(format!("Invalid endpoint URL: {}", e)))?;
        if self.provider.accepts_query_key() {
            url.query_pairs_mut().append_pair("key", api_key);
        }

        Ok(ResolvedEndpoint {
            url: url.to_string(),
            model,
            headers: vec![(
                "Authorization".to_string(),
                format!("Bearer {}", api_key),
            )],
        })
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("provider", &self.provider)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Result of resolving a [`ProviderConfig`]
#[derive(Clone, PartialEq, Eq)]
pub struct ResolvedEndpoint {
    /// Completions URL, including the key query parameter where applicable
    pub url: String,

    /// Model id to put in the request body
    pub model: String,

    /// Extra request headers
    pub headers: Vec<(String, String)>,
}

impl ResolvedEndpoint {
    /// URL without its query string, safe to log
    pub fn redacted_url(&self) -> &str {
        self.url.split('?').next().unwrap_or(&self.url)
    }
}

impl fmt::Debug for ResolvedEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let header_names: Vec<&str> = self.headers.iter().map(|(name, _)| name.as_str()).collect();
        f.debug_struct("ResolvedEndpoint")
            .field("url", &self.redacted_url())
            .field("model", &self.model)
            .field("headers", &header_names)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_provider_defaults() {
        let resolved = ProviderConfig::new(Provider::DeepSeek, "sk-1").resolve().unwrap();
        assert_eq!(resolved.url, "https://api.deepseek.com/chat/completions");
        assert_eq!(resolved.model, "deepseek-chat");
        assert_eq!(
            resolved.headers,
            vec![("Authorization".to_string(), "Bearer sk-1".to_string())]
        );
    }

    #[test]
    fn test_explicit_model_overrides_default() {
        let resolved = ProviderConfig::new(Provider::OpenAi, "k")
            .with_model("gpt-4.1")
            .resolve()
            .unwrap();
        assert_eq!(resolved.model, "gpt-4.1");
    }

    #[test]
    fn test_blank_model_falls_back_to_default() {
        let resolved = ProviderConfig::new(Provider::Qwen, "k")
            .with_model("  ")
            .resolve()
            .unwrap();
        assert_eq!(resolved.model, "qwen-plus");
    }

    #[test]
    fn test_doubao_requires_endpoint_id() {
        let err = ProviderConfig::new(Provider::Doubao, "k").resolve().unwrap_err();
        assert!(matches!(err, LlmError::Config(_)));

        let resolved = ProviderConfig::new(Provider::Doubao, "k")
            .with_model("ep-20240101-abcde")
            .resolve()
            .unwrap();
        assert_eq!(resolved.model, "ep-20240101-abcde");
    }

    #[test]
    fn test_missing_api_key() {
        let err = ProviderConfig::new(Provider::DeepSeek, "   ").resolve().unwrap_err();
        assert_eq!(err, LlmError::Config("API key is required".to_string()));
    }

    #[test]
    fn test_gemini_sends_key_both_ways() {
        let resolved = ProviderConfig::new(Provider::Gemini, "g-key").resolve().unwrap();
        assert!(resolved.url.ends_with("/chat/completions?key=g-key"));
        assert_eq!(resolved.headers[0].1, "Bearer g-key");
        assert_eq!(
            resolved.redacted_url(),
            "https://generativelanguage.googleapis.com/v1beta/openai/chat/completions"
        );
    }

    #[test]
    fn test_custom_relay_normalization() {
        for raw in [
            "https://relay.example.com/v1",
            "https://relay.example.com/v1/",
            "https://relay.example.com/v1///",
            " https://relay.example.com/v1/chat/completions ",
            "https://relay.example.com/v1/chat/completions/",
        ] {
            assert_eq!(
                normalize_base_url(raw).unwrap(),
                "https://relay.example.com/v1/chat/completions",
                "input {raw:?}"
            );
        }
    }

    #[test]
    fn test_custom_relay_requires_base_url() {
        let provider = Provider::Custom {
            base_url: String::new(),
        };
        let err = ProviderConfig::new(provider, "k").resolve().unwrap_err();
        assert!(matches!(err, LlmError::Config(_)));
    }

    #[test]
    fn test_custom_relay_rejects_bad_scheme() {
        assert!(normalize_base_url("ftp://relay.example.com").is_err());
        assert!(normalize_base_url("not a url").is_err());
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let config = ProviderConfig::new(
            Provider::Custom {
                base_url: "http://127.0.0.1:9000/v1/".to_string(),
            },
            "k",
        );
        let first = config.resolve().unwrap();
        let second = config.resolve().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_from_name() {
        assert_eq!(Provider::from_name("DeepSeek", None).unwrap(), Provider::DeepSeek);
        assert_eq!(Provider::from_name("kimi", None).unwrap(), Provider::Moonshot);
        assert_eq!(
            Provider::from_name("relay", Some("https://r.example.com")).unwrap(),
            Provider::Custom {
                base_url: "https://r.example.com".to_string()
            }
        );
        assert!(Provider::from_name("nope", None).is_err());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = ProviderConfig::new(Provider::Gemini, "secret-key");
        assert!(!format!("{:?}", config).contains("secret-key"));
        let resolved = config.resolve().unwrap();
        assert!(!format!("{:?}", resolved).contains("secret-key"));
    }

    #[test]
    fn test_provider_serde_tagging() {
        let provider = Provider::Custom {
            base_url: "https://r.example.com".to_string(),
        };
        let json = serde_json::to_string(&provider).unwrap();
        assert_eq!(json, r#"{"kind":"custom","base_url":"https://r.example.com"}"#);

        let parsed: Provider = serde_json::from_str(r#"{"kind":"deepseek"}"#).unwrap();
        assert_eq!(parsed, Provider::DeepSeek);
    }
}
