//! Configuration management for the CLI.

use crate::error::{CliError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use storyboard_llm::provider::DEFAULT_TIMEOUT_SECS;
use storyboard_llm::{Provider, ProviderConfig};
use storyboard_pipeline::PipelineConfig;

/// Environment variable consulted by `--api-key`
pub const API_KEY_ENV: &str = "STORYBOARD_API_KEY";

/// CLI configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name
    #[serde(default = "default_profile")]
    pub active_profile: String,

    /// Available profiles
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,

    /// Global settings
    #[serde(default)]
    pub settings: Settings,
}

/// Provider profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Provider name (deepseek, openai, gemini, doubao, moonshot, qwen, custom)
    pub provider: String,

    /// Base URL, only used by the custom relay
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Model id; the provider default is used when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Name of the environment variable holding the API key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Global CLI settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Enable colored output
    #[serde(default = "default_true")]
    pub color: bool,

    /// Default output format
    #[serde(default = "default_format")]
    pub format: OutputFormat,

    /// Style flags appended to image descriptions when none is given
    #[serde(default = "default_style")]
    pub style_suffix: String,

    /// Split and describe settings
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Table format
    Table,
    /// JSON format
    Json,
    /// Quiet (minimal) format
    Quiet,
}

impl Config {
    /// Get the default configuration file path.
    pub fn path() -> Result<PathBuf> {
        Ok(storyboard_dir()?.join("config.toml"))
    }

    /// Load configuration from the default path, or the defaults if absent.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    /// Load configuration from a file, or the defaults if it does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config
            .settings
            .pipeline
            .validate()
            .map_err(CliError::Config)?;
        Ok(config)
    }

    /// Save configuration to the default path.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    /// Save configuration to a file, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| CliError::Config(format!("Failed to serialize config: {}", e)))?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Get the active profile.
    pub fn get_active_profile(&self) -> Result<&Profile> {
        self.profiles
            .get(&self.active_profile)
            .ok_or_else(|| CliError::Config(format!("Profile '{}' not found", self.active_profile)))
    }

    /// Add or update a profile.
    pub fn set_profile(&mut self, name: String, profile: Profile) {
        self.profiles.insert(name, profile);
    }

    /// Switch to a different profile.
    pub fn switch_profile(&mut self, name: String) -> Result<()> {
        if !self.profiles.contains_key(&name) {
            return Err(CliError::Config(format!("Profile '{}' does not exist", name)));
        }
        self.active_profile = name;
        Ok(())
    }

    /// Build the provider config of the active profile.
    ///
    /// The API key comes from `api_key` (the `--api-key` flag or
    /// `STORYBOARD_API_KEY`) if given, otherwise from the variable named by
    /// the profile's `api_key_env`.
    pub fn provider_config(&self, api_key: Option<&str>) -> Result<ProviderConfig> {
        let profile = self.get_active_profile()?;
        profile.provider_config(api_key, |name| std::env::var(name).ok())
    }
}

impl Profile {
    /// Create a profile for a provider with its default model
    pub fn new(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            base_url: None,
            model: None,
            api_key_env: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Build a provider config, looking up `api_key_env` through `lookup`.
    pub fn provider_config<F>(&self, api_key: Option<&str>, lookup: F) -> Result<ProviderConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let provider = Provider::from_name(&self.provider, self.base_url.as_deref())?;

        let key = match api_key.map(str::trim).filter(|k| !k.is_empty()) {
            Some(key) => key.to_string(),
            None => self
                .api_key_env
                .as_deref()
                .and_then(|name| lookup(name))
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty())
                .ok_or_else(|| {
                    CliError::Config(format!(
                        "No API key: pass --api-key, set {}, or set api_key_env in the profile",
                        API_KEY_ENV
                    ))
                })?,
        };

        let mut config = ProviderConfig::new(provider, key).with_timeout_secs(self.timeout_secs);
        if let Some(model) = self.model.as_deref().filter(|m| !m.trim().is_empty()) {
            config = config.with_model(model.trim());
        }
        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        let mut profiles = BTreeMap::new();
        profiles.insert(
            "default".to_string(),
            Profile {
                api_key_env: Some("DEEPSEEK_API_KEY".to_string()),
                ..Profile::new("deepseek")
            },
        );

        Self {
            active_profile: "default".to_string(),
            profiles,
            settings: Settings::default(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            color: true,
            format: OutputFormat::Table,
            style_suffix: default_style(),
            pipeline: PipelineConfig::default(),
        }
    }
}

/// `~/.storyboard`, where the config and the REPL history live
pub fn storyboard_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| CliError::Config("Could not find home directory".into()))?;
    Ok(home.join(".storyboard"))
}

fn default_profile() -> String {
    "default".to_string()
}

fn default_true() -> bool {
    true
}

fn default_format() -> OutputFormat {
    OutputFormat::Table
}

fn default_style() -> String {
    "--ar 9:16".to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.active_profile, "default");
        assert_eq!(config.get_active_profile().unwrap().provider, "deepseek");
        assert!(config.settings.color);
        assert_eq!(config.settings.style_suffix, "--ar 9:16");
        assert_eq!(config.settings.pipeline.max_line_chars, 35);
    }

    #[test]
    fn test_profile_management() {
        let mut config = Config::default();

        config.set_profile("relay".to_string(), Profile::new("custom"));
        assert!(config.profiles.contains_key("relay"));

        config.switch_profile("relay".to_string()).unwrap();
        assert_eq!(config.active_profile, "relay");
    }

    #[test]
    fn test_switch_to_nonexistent_profile() {
        let mut config = Config::default();
        let result = config.switch_profile("nonexistent".to_string());
        assert!(result.is_err());
    }

    #[test]
    fn test_explicit_key_wins() {
        let profile = Profile {
            api_key_env: Some("SOME_KEY".to_string()),
            model: Some("deepseek-reasoner".to_string()),
            ..Profile::new("deepseek")
        };
        let config = profile
            .provider_config(Some("sk-flag"), |_| Some("sk-env".to_string()))
            .unwrap();

        assert_eq!(config.api_key, "sk-flag");
        assert_eq!(config.provider, Provider::DeepSeek);
        assert_eq!(config.model.as_deref(), Some("deepseek-reasoner"));
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn test_key_from_profile_env() {
        let profile = Profile {
            api_key_env: Some("MOONSHOT_KEY".to_string()),
            ..Profile::new("kimi")
        };
        let config = profile
            .provider_config(None, |name| {
                (name == "MOONSHOT_KEY").then(|| "sk-moon".to_string())
            })
            .unwrap();

        assert_eq!(config.api_key, "sk-moon");
        assert_eq!(config.provider, Provider::Moonshot);
    }

    #[test]
    fn test_missing_key() {
        let profile = Profile::new("openai");
        assert!(matches!(
            profile.provider_config(None, no_env),
            Err(CliError::Config(_))
        ));
        assert!(matches!(
            profile.provider_config(Some("  "), no_env),
            Err(CliError::Config(_))
        ));
    }

    #[test]
    fn test_unknown_provider() {
        let profile = Profile::new("nope");
        assert!(matches!(
            profile.provider_config(Some("sk"), no_env),
            Err(CliError::Llm(_))
        ));
    }

    #[test]
    fn test_custom_relay_profile() {
        let profile = Profile {
            base_url: Some("https://relay.example.com/v1/".to_string()),
            ..Profile::new("relay")
        };
        let config = profile.provider_config(Some("sk"), no_env).unwrap();
        let endpoint = config.resolve().unwrap();
        assert_eq!(endpoint.url, "https://relay.example.com/v1/chat/completions");
    }
}
