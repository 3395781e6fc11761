//! Run command implementation: split, then describe.

use super::describe::describe_segments;
use super::split::{split_source, with_split_options};
use super::{read_text, write_text};
use crate::cli::RunArgs;
use crate::error::Result;
use crate::output::Formatter;
use std::sync::Arc;
use storyboard_domain::SchedulerState;
use storyboard_llm::ChatProvider;
use storyboard_pipeline::{over_limit, render_numbered, PipelineConfig};

/// Execute the run command.
pub async fn execute_run<P: ChatProvider>(
    args: RunArgs,
    provider: Arc<P>,
    pipeline: &PipelineConfig,
    default_style: &str,
    formatter: &Formatter,
) -> Result<SchedulerState> {
    let source = read_text(&args.input)?;
    let split_config = with_split_options(pipeline, &args.split);

    let segments = split_source(&source, provider.clone(), &split_config).await?;
    let flagged = over_limit(&segments, split_config.max_line_chars).len();
    eprintln!(
        "{}",
        formatter.info(&format!(
            "Split into {} segments ({} over {} characters)",
            segments.len(),
            flagged,
            split_config.max_line_chars
        ))
    );

    if let Some(path) = &args.segments_output {
        write_text(path, &render_numbered(&segments))?;
    }

    describe_segments(
        segments,
        &args.describe,
        provider,
        &split_config,
        default_style,
        args.output.as_deref(),
        formatter,
    )
    .await
}
