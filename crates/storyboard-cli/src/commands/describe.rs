//! Describe command implementation.

use super::{read_text, write_text};
use crate::cli::{DescribeArgs, DescribeOptions};
use crate::error::Result;
use crate::output::Formatter;
use std::path::Path;
use std::sync::Arc;
use storyboard_domain::{SchedulerState, Segment};
use storyboard_llm::ChatProvider;
use storyboard_pipeline::{parse_segments, BatchScheduler, PipelineConfig, PipelineError};

/// Execute the describe command.
pub async fn execute_describe<P: ChatProvider>(
    args: DescribeArgs,
    provider: Arc<P>,
    pipeline: &PipelineConfig,
    default_style: &str,
    formatter: &Formatter,
) -> Result<SchedulerState> {
    let text = read_text(&args.input)?;
    let segments = parse_segments(&text)?;

    describe_segments(
        segments,
        &args.options,
        provider,
        pipeline,
        default_style,
        args.output.as_deref(),
        formatter,
    )
    .await
}

/// Describe every segment in batches and emit the storyboard.
///
/// The storyboard goes to `output` when given, otherwise to stdout. When a
/// batch fails, whatever was described before it is still emitted and the
/// position of the failed batch is reported.
pub async fn describe_segments<P: ChatProvider>(
    segments: Vec<Segment>,
    options: &DescribeOptions,
    provider: Arc<P>,
    pipeline: &PipelineConfig,
    default_style: &str,
    output: Option<&Path>,
    formatter: &Formatter,
) -> Result<SchedulerState> {
    let config = with_describe_options(pipeline, options);
    config
        .validate()
        .map_err(PipelineError::Config)?;

    let characters = match &options.characters {
        Some(path) => read_text(path)?,
        None => String::new(),
    };
    let style = options.style.as_deref().unwrap_or(default_style);

    let mut state = SchedulerState::new(segments, config.batch_size).map_err(PipelineError::from)?;
    let scheduler = BatchScheduler::describe(provider, &characters, style, &config);

    let result = scheduler.run_to_completion(&mut state).await;

    if !state.accumulated_output().is_empty() {
        emit(state.accumulated_output(), output, formatter)?;
    }

    match result {
        Ok(batches) => {
            eprintln!(
                "{}",
                formatter.success(&format!(
                    "Described {} segments in {} batch(es)",
                    state.total(),
                    batches
                ))
            );
            Ok(state)
        }
        Err(e) => {
            eprintln!(
                "{}",
                formatter.warning(&format!(
                    "Stopped after {} of {} segments; the next batch starts at segment {}",
                    state.current_index(),
                    state.total(),
                    state.current_index() + 1
                ))
            );
            Err(e.into())
        }
    }
}

/// Apply command-line overrides to the configured describe settings
pub fn with_describe_options(pipeline: &PipelineConfig, options: &DescribeOptions) -> PipelineConfig {
    let mut config = pipeline.clone();
    if let Some(batch_size) = options.batch_size {
        config.batch_size = batch_size;
    }
    if let Some(delay_ms) = options.delay_ms {
        config.batch_delay_ms = delay_ms;
    }
    config
}

fn emit(storyboard: &str, output: Option<&Path>, formatter: &Formatter) -> Result<()> {
    match output {
        Some(path) => {
            write_text(path, storyboard)?;
            eprintln!(
                "{}",
                formatter.success(&format!("Storyboard saved to {}", path.display()))
            );
        }
        None => println!("{}", storyboard),
    }
    Ok(())
}
