//! Split command implementation.

use super::{read_text, write_text};
use crate::cli::{SplitArgs, SplitOptions};
use crate::error::Result;
use crate::output::Formatter;
use std::sync::Arc;
use storyboard_domain::Segment;
use storyboard_llm::ChatProvider;
use storyboard_pipeline::{render_numbered, PipelineConfig, Splitter};

/// Execute the split command.
pub async fn execute_split<P: ChatProvider>(
    args: SplitArgs,
    provider: Arc<P>,
    pipeline: &PipelineConfig,
    formatter: &Formatter,
) -> Result<Vec<Segment>> {
    let source = read_text(&args.input)?;
    let config = with_split_options(pipeline, &args.options);

    let segments = split_source(&source, provider, &config).await?;
    println!("{}", formatter.format_segments(&segments, config.max_line_chars)?);

    if let Some(path) = &args.output {
        write_text(path, &render_numbered(&segments))?;
        eprintln!(
            "{}",
            formatter.success(&format!("Saved {} segments to {}", segments.len(), path.display()))
        );
    }

    Ok(segments)
}

/// Split source text with the given settings.
pub async fn split_source<P: ChatProvider>(
    source: &str,
    provider: Arc<P>,
    config: &PipelineConfig,
) -> Result<Vec<Segment>> {
    let splitter = Splitter::new(provider, config.clone());
    Ok(splitter.split(source).await?)
}

/// Apply command-line overrides to the configured split settings
pub fn with_split_options(pipeline: &PipelineConfig, options: &SplitOptions) -> PipelineConfig {
    let mut config = pipeline.clone();
    if let Some(max_chars) = options.max_chars {
        config.max_line_chars = max_chars;
    }
    if options.no_merge {
        config.merge_short_lines = false;
    }
    config
}
