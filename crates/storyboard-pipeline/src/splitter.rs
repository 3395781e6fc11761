//! The split step: source document in, numbered segments out

use crate::chunking::SourceChunker;
use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::parser::{over_limit, parse_segments};
use crate::prompt::PromptBuilder;
use std::sync::Arc;
use storyboard_domain::Segment;
use storyboard_llm::ChatProvider;
use tracing::{debug, info, warn};

/// Turns a source document into a segment list
pub struct Splitter<P> {
    provider: Arc<P>,
    config: PipelineConfig,
    prompt: PromptBuilder,
}

impl<P: ChatProvider> Splitter<P> {
    /// Create a new splitter
    pub fn new(provider: Arc<P>, config: PipelineConfig) -> Self {
        let prompt = PromptBuilder::split(config.segment_policy());
        Self {
            provider,
            config,
            prompt,
        }
    }

    /// Configuration in use
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Split a source document
    ///
    /// Sources longer than `max_chunk_chars` are sent in several calls and
    /// the later chunks are renumbered to continue the sequence. Any failed
    /// call fails the whole split; no partial list is returned.
    ///
    /// Lines over the character ceiling are reported with a warning only.
    pub async fn split(&self, source: &str) -> Result<Vec<Segment>, PipelineError> {
        self.config.validate().map_err(PipelineError::Config)?;
        if source.trim().is_empty() {
            return Err(PipelineError::Config("Source text is empty".to_string()));
        }

        let chunker = SourceChunker::new(self.config.max_chunk_chars);
        let chunks: Vec<&str> = chunker
            .chunk(source)
            .into_iter()
            .filter(|chunk| !chunk.trim().is_empty())
            .collect();

        info!(
            "Splitting {} characters in {} call(s) with {}",
            source.chars().count(),
            chunks.len(),
            self.provider.model_name()
        );

        let mut segments: Vec<Segment> = Vec::new();
        for (i, chunk) in chunks.iter().enumerate() {
            let request = self.prompt.request(chunk, self.config.temperature);
            debug!("Chunk {}: prompt {} chars", i + 1, request.user.chars().count());

            let reply = self.provider.complete(&request).await?;
            debug!("Chunk {}: reply {} chars", i + 1, reply.chars().count());

            let parsed = parse_segments(&reply)?;
            if segments.is_empty() {
                segments = parsed;
            } else {
                for segment in &parsed {
                    let index = segments
                        .last()
                        .and_then(|s| s.index.checked_add(1))
                        .ok_or_else(|| PipelineError::Parse { raw: reply.clone() })?;
                    segments.push(segment.renumbered(index));
                }
            }
        }

        let flagged = over_limit(&segments, self.config.max_line_chars);
        if !flagged.is_empty() {
            warn!(
                "{} segment(s) exceed {} characters: {:?}",
                flagged.len(),
                self.config.max_line_chars,
                flagged.iter().map(|s| s.index).collect::<Vec<_>>()
            );
        }

        info!("Split produced {} segments", segments.len());
        Ok(segments)
    }
}
