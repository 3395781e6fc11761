//! Storyboard Pipeline
//!
//! Turns narrative text into a storyboard with an LLM, in two steps.
//!
//! # Architecture
//!
//! ```text
//! source ─▶ Splitter ─▶ LLM ─▶ parser ─▶ Vec<Segment>
//!                                            │
//!                          SchedulerState ◀──┘
//!                                │
//!        BatchScheduler::advance ─▶ LLM ─▶ accumulated storyboard
//! ```
//!
//! - **Split**: the source (chunked when long) is sent with the split prompt
//!   and the reply is parsed into numbered segments.
//! - **Describe**: segments are sent in fixed-size batches with the describe
//!   prompt. Each success moves the cursor; each failure leaves it alone.
//!
//! # Example Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use storyboard_domain::SchedulerState;
//! use storyboard_llm::{OpenAiCompatibleProvider, Provider, ProviderConfig};
//! use storyboard_pipeline::{BatchScheduler, PipelineConfig, Splitter};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = Arc::new(OpenAiCompatibleProvider::new(ProviderConfig::new(
//!     Provider::DeepSeek,
//!     std::env::var("DEEPSEEK_API_KEY")?,
//! ))?);
//! let config = PipelineConfig::default();
//!
//! let segments = Splitter::new(provider.clone(), config.clone())
//!     .split("他走进屋子。他坐下。他叹了口气。")
//!     .await?;
//!
//! let mut state = SchedulerState::new(segments, config.batch_size)?;
//! let scheduler = BatchScheduler::describe(provider, "", "--ar 9:16", &config);
//! scheduler.run_to_completion(&mut state).await?;
//!
//! println!("{}", state.accumulated_output());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod chunking;
mod config;
mod error;
mod parser;
mod prompt;
mod scheduler;
mod splitter;

#[cfg(test)]
mod tests;

pub use chunking::SourceChunker;
pub use config::{PipelineConfig, SegmentPolicy};
pub use error::PipelineError;
pub use parser::{over_limit, parse_segments, render_numbered};
pub use prompt::{PromptBuilder, PromptMode, STORYBOARD_DELIMITER};
pub use scheduler::{Advance, BatchScheduler};
pub use splitter::Splitter;
