//! The describe step: paginate segments into batches, one call per batch

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::prompt::PromptBuilder;
use std::sync::Arc;
use std::time::Duration;
use storyboard_domain::{Batch, SchedulerState};
use storyboard_llm::ChatProvider;
use tracing::{debug, info, warn};

/// Outcome of one [`BatchScheduler::advance`] call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// A batch was described and committed
    Progressed {
        /// The batch that was processed
        batch: Batch,
        /// Segments still to be described
        remaining: usize,
    },

    /// Every segment was already consumed; nothing was sent
    Complete,
}

/// Drives the describe step over a caller-owned [`SchedulerState`]
///
/// The scheduler itself holds no progress. Because `advance` borrows the
/// state mutably, two batches over the same state can never be in flight.
pub struct BatchScheduler<P> {
    provider: Arc<P>,
    prompt: PromptBuilder,
    temperature: f32,
    batch_delay: Duration,
}

impl<P: ChatProvider> BatchScheduler<P> {
    /// Create a scheduler with a prepared prompt builder
    pub fn new(provider: Arc<P>, prompt: PromptBuilder, config: &PipelineConfig) -> Self {
        Self {
            provider,
            prompt,
            temperature: config.temperature,
            batch_delay: config.batch_delay(),
        }
    }

    /// Create a scheduler with the describe prompt for a character sheet and style
    pub fn describe(
        provider: Arc<P>,
        characters: &str,
        style_suffix: &str,
        config: &PipelineConfig,
    ) -> Self {
        let prompt = PromptBuilder::describe(characters, style_suffix, config.segment_policy());
        Self::new(provider, prompt, config)
    }

    /// Prompt builder in use
    pub fn prompt(&self) -> &PromptBuilder {
        &self.prompt
    }

    /// Describe the next batch
    ///
    /// On success the output is appended and the cursor moves to the end of
    /// the batch. On failure `state` is not modified, so the same batch is
    /// sent again by the next call.
    ///
    /// # Errors
    /// [`PipelineError::Config`] for an empty segment list, otherwise
    /// whatever the completion call returns.
    pub async fn advance(&self, state: &mut SchedulerState) -> Result<Advance, PipelineError> {
        if state.total() == 0 {
            return Err(PipelineError::Config(
                "No segments loaded; split a document first".to_string(),
            ));
        }

        let Some(batch) = state.next_batch() else {
            debug!("All {} segments described", state.total());
            return Ok(Advance::Complete);
        };

        let body = state.batch_text(&batch);
        let request = self.prompt.request(&body, self.temperature);
        info!(
            "Describing segments {}-{} of {} with {}",
            batch.start + 1,
            batch.end,
            state.total(),
            self.provider.model_name()
        );

        let output = self.provider.complete(&request).await.map_err(|e| {
            warn!("Batch {}-{} failed: {}", batch.start + 1, batch.end, e);
            PipelineError::from(e)
        })?;
        debug!("Batch reply: {} chars", output.chars().count());

        state.commit(batch, &output)?;
        Ok(Advance::Progressed {
            batch,
            remaining: state.remaining(),
        })
    }

    /// Advance until every segment is described
    ///
    /// Sleeps for the configured batch delay between calls. Stops at the
    /// first error; batches committed before it are kept in `state`.
    /// Returns the number of batches processed by this call.
    pub async fn run_to_completion(&self, state: &mut SchedulerState) -> Result<usize, PipelineError> {
        let mut processed = 0usize;

        loop {
            match self.advance(state).await? {
                Advance::Complete => break,
                Advance::Progressed { remaining, .. } => {
                    processed += 1;
                    if remaining == 0 {
                        break;
                    }
                    if !self.batch_delay.is_zero() {
                        tokio::time::sleep(self.batch_delay).await;
                    }
                }
            }
        }

        info!("Full run finished after {} batch(es)", processed);
        Ok(processed)
    }
}
