//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use serde_json::json;
use storyboard_domain::{SchedulerState, Segment};
use storyboard_llm::Provider;
use storyboard_pipeline::render_numbered;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Selected output format.
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Format a segment list, flagging lines over `max_chars`.
    pub fn format_segments(&self, segments: &[Segment], max_chars: usize) -> Result<String> {
        match self.format {
            OutputFormat::Json => self.format_segments_json(segments, max_chars),
            OutputFormat::Table => Ok(self.format_segments_table(segments, max_chars)),
            OutputFormat::Quiet => Ok(render_numbered(segments)),
        }
    }

    fn format_segments_json(&self, segments: &[Segment], max_chars: usize) -> Result<String> {
        let rows: Vec<serde_json::Value> = segments
            .iter()
            .map(|s| {
                json!({
                    "index": s.index,
                    "text": s.text,
                    "content": s.content(),
                    "chars": s.char_count(),
                    "over_limit": s.exceeds(max_chars),
                })
            })
            .collect();

        Ok(serde_json::to_string_pretty(&rows)?)
    }

    fn format_segments_table(&self, segments: &[Segment], max_chars: usize) -> String {
        if segments.is_empty() {
            return self.colorize("No segments loaded.", "yellow");
        }

        let mut builder = Builder::default();
        builder.push_record(["#", "Chars", "Text"]);

        for segment in segments {
            let count = segment.char_count();
            let chars = if count > max_chars {
                self.colorize(&format!("{} !", count), "red")
            } else {
                count.to_string()
            };
            builder.push_record([segment.index.to_string(), chars, segment.content().to_string()]);
        }

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));

        let over = segments.iter().filter(|s| s.exceeds(max_chars)).count();
        let mut out = table.to_string();
        out.push('\n');
        if over > 0 {
            out.push_str(&self.warning(&format!(
                "{} of {} segment(s) exceed {} characters",
                over,
                segments.len(),
                max_chars
            )));
        } else {
            out.push_str(&self.success(&format!(
                "{} segment(s), all within {} characters",
                segments.len(),
                max_chars
            )));
        }
        out
    }

    /// Format describe progress.
    pub fn format_status(&self, state: &SchedulerState) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&json!({
                "total": state.total(),
                "current_index": state.current_index(),
                "remaining": state.remaining(),
                "batch_size": state.batch_size(),
                "complete": state.total() > 0 && state.is_complete(),
                "output_chars": state.accumulated_output().chars().count(),
            }))?),
            OutputFormat::Quiet => Ok(format!("{}/{}", state.current_index(), state.total())),
            OutputFormat::Table => {
                if state.total() == 0 {
                    return Ok(self.info("No segments loaded"));
                }
                let mut builder = Builder::default();
                builder.push_record(["Segments", "Described", "Remaining", "Batch size"]);
                builder.push_record([
                    state.total().to_string(),
                    state.current_index().to_string(),
                    state.remaining().to_string(),
                    state.batch_size().to_string(),
                ]);
                let mut table = builder.build();
                table.with(Style::rounded());
                Ok(table.to_string())
            }
        }
    }

    /// Format the provider catalog.
    pub fn format_providers(&self, providers: &[Provider]) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let rows: Vec<serde_json::Value> = providers
                    .iter()
                    .map(|p| {
                        json!({
                            "name": p.name(),
                            "display_name": p.display_name(),
                            "url": p.endpoint_url().ok(),
                            "default_model": p.default_model(),
                        })
                    })
                    .collect();
                Ok(serde_json::to_string_pretty(&rows)?)
            }
            OutputFormat::Quiet => Ok(providers
                .iter()
                .map(|p| p.name())
                .collect::<Vec<_>>()
                .join("\n")),
            OutputFormat::Table => {
                let mut builder = Builder::default();
                builder.push_record(["Name", "Provider", "Endpoint", "Default model"]);
                for p in providers {
                    builder.push_record([
                        p.name().to_string(),
                        p.display_name().to_string(),
                        p.endpoint_url().unwrap_or_default(),
                        p.default_model().unwrap_or("(endpoint id required)").to_string(),
                    ]);
                }
                let mut table = builder.build();
                table
                    .with(Style::rounded())
                    .with(Modify::new(Rows::first()).with(Alignment::center()));
                Ok(table.to_string())
            }
        }
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            _ => text.to_string(),
        }
    }
}
