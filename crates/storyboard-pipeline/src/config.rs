//! Configuration for the pipeline

use serde::{Deserialize, Serialize};
use std::time::Duration;
use storyboard_domain::DEFAULT_BATCH_SIZE;

/// Rules that shape how text is cut into segments and how long a shot runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentPolicy {
    /// Per-line character ceiling, numeral excluded
    pub max_line_chars: usize,

    /// Allow adjacent short sentences to share a line
    pub merge_short_lines: bool,

    /// Time budget of one shot in seconds
    pub shot_seconds: u32,
}

/// Configuration for splitting and describing
///
/// The per-line ceiling has been run at both 35 and 40 characters, and both
/// merging and atomic short sentences are in use, so neither is hard-coded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Maximum characters per segment line (numeral excluded)
    pub max_line_chars: usize,

    /// Merge adjacent short sentences up to the ceiling
    pub merge_short_lines: bool,

    /// Segments per describe call
    pub batch_size: usize,

    /// Sampling temperature for every call
    pub temperature: f32,

    /// Time budget of one shot in seconds, used by the describe prompt
    pub shot_seconds: u32,

    /// Pause between batches in full-auto mode (milliseconds)
    pub batch_delay_ms: u64,

    /// Longest source text sent in a single split call (characters)
    pub max_chunk_chars: usize,
}

impl PipelineConfig {
    /// Rules passed to the prompt builder
    pub fn segment_policy(&self) -> SegmentPolicy {
        SegmentPolicy {
            max_line_chars: self.max_line_chars,
            merge_short_lines: self.merge_short_lines,
            shot_seconds: self.shot_seconds,
        }
    }

    /// Get the inter-batch delay as a Duration
    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_line_chars == 0 {
            return Err("max_line_chars must be greater than 0".to_string());
        }
        if self.batch_size == 0 {
            return Err("batch_size must be greater than 0".to_string());
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(format!(
                "temperature must be between 0.0 and 2.0, got {}",
                self.temperature
            ));
        }
        if self.shot_seconds == 0 {
            return Err("shot_seconds must be greater than 0".to_string());
        }
        if self.max_chunk_chars < self.max_line_chars {
            return Err("max_chunk_chars cannot be smaller than max_line_chars".to_string());
        }
        Ok(())
    }

    /// Wide preset: 40-character lines, every sentence kept on its own line
    pub fn wide() -> Self {
        Self {
            max_line_chars: 40,
            merge_short_lines: false,
            ..Self::default()
        }
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}

impl Default for PipelineConfig {
    /// 35-character lines, short sentences merged, 20 segments per batch
    fn default() -> Self {
        Self {
            max_line_chars: 35,
            merge_short_lines: true,
            batch_size: DEFAULT_BATCH_SIZE,
            temperature: 0.7,
            shot_seconds: 5,
            batch_delay_ms: 1000,
            max_chunk_chars: 6000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_line_chars, 35);
        assert_eq!(config.batch_size, 20);
    }

    #[test]
    fn test_wide_config_is_valid() {
        let config = PipelineConfig::wide();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_line_chars, 40);
        assert!(!config.merge_short_lines);
    }

    #[test]
    fn test_invalid_batch_size() {
        let mut config = PipelineConfig::default();
        config.batch_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_temperature() {
        let mut config = PipelineConfig::default();
        config.temperature = 3.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_chunk_smaller_than_line_rejected() {
        let mut config = PipelineConfig::default();
        config.max_chunk_chars = 10;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = PipelineConfig::wide();
        let toml_str = config.to_toml().unwrap();
        let parsed = PipelineConfig::from_toml(&toml_str).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let parsed = PipelineConfig::from_toml("max_line_chars = 40\nbatch_size = 10\n").unwrap();
        assert_eq!(parsed.max_line_chars, 40);
        assert_eq!(parsed.batch_size, 10);
        assert_eq!(parsed.shot_seconds, 5);
        assert!(parsed.merge_short_lines);
    }

    #[test]
    fn test_segment_policy() {
        let policy = PipelineConfig::default().segment_policy();
        assert_eq!(
            policy,
            SegmentPolicy {
                max_line_chars: 35,
                merge_short_lines: true,
                shot_seconds: 5,
            }
        );
    }
}
