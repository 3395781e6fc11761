//! Scheduler state - segment list, resumable cursor and accumulated output
//!
//! The state is a plain value owned by the caller. The scheduler borrows it
//! mutably for one batch at a time and only writes to it through
//! [`SchedulerState::commit`], after the completion call has succeeded.

use crate::batch::Batch;
use crate::segment::Segment;
use std::fmt;
use std::num::NonZeroUsize;

/// Default number of segments per batch
pub const DEFAULT_BATCH_SIZE: usize = 20;

/// Separator placed between the outputs of consecutive batches
const BATCH_SEPARATOR: &str = "\n\n";

/// Errors raised by state transitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    /// Batch size must be at least one
    ZeroBatchSize,

    /// A batch was committed that does not start at the cursor
    StaleBatch {
        /// Cursor position at commit time
        expected: usize,
        /// Start of the batch that was committed
        found: usize,
    },

    /// A batch was committed that is empty or runs past the segment list
    BatchOutOfRange {
        /// The offending batch
        batch: Batch,
        /// Number of segments in the list
        total: usize,
    },
}

impl fmt::Display for StateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateError::ZeroBatchSize => write!(f, "batch size must be greater than 0"),
            StateError::StaleBatch { expected, found } => write!(
                f,
                "stale batch: cursor is at {} but batch starts at {}",
                expected, found
            ),
            StateError::BatchOutOfRange { batch, total } => write!(
                f,
                "batch [{}, {}) is out of range for {} segments",
                batch.start, batch.end, total
            ),
        }
    }
}

impl std::error::Error for StateError {}

/// Resumable progress over a segment list
///
/// Invariants:
/// - `current_index <= segments.len()`
/// - `current_index` only moves forward, except on [`reset`](Self::reset) or
///   [`load`](Self::load), which zero it together with the output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerState {
    segments: Vec<Segment>,
    batch_size: NonZeroUsize,
    current_index: usize,
    accumulated_output: String,
}

impl SchedulerState {
    /// Create a state for a segment list
    ///
    /// # Errors
    /// Returns [`StateError::ZeroBatchSize`] if `batch_size` is 0
    pub fn new(segments: Vec<Segment>, batch_size: usize) -> Result<Self, StateError> {
        let batch_size = NonZeroUsize::new(batch_size).ok_or(StateError::ZeroBatchSize)?;
        Ok(Self {
            segments,
            batch_size,
            current_index: 0,
            accumulated_output: String::new(),
        })
    }

    /// Replace the segment list and start over
    pub fn load(&mut self, segments: Vec<Segment>) {
        self.segments = segments;
        self.current_index = 0;
        self.accumulated_output.clear();
    }

    /// Discard the segment list, the cursor and the accumulated output
    pub fn reset(&mut self) {
        self.load(Vec::new());
    }

    /// Change the batch size for the remaining batches
    pub fn set_batch_size(&mut self, batch_size: usize) -> Result<(), StateError> {
        self.batch_size = NonZeroUsize::new(batch_size).ok_or(StateError::ZeroBatchSize)?;
        Ok(())
    }

    /// The next batch to process, or `None` when every segment is consumed
    pub fn next_batch(&self) -> Option<Batch> {
        Batch::starting_at(self.current_index, self.segments.len(), self.batch_size)
    }

    /// Segment texts of a batch joined with newlines
    pub fn batch_text(&self, batch: &Batch) -> String {
        let end = batch.end.min(self.segments.len());
        let start = batch.start.min(end);
        self.segments[start..end]
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Record the output of a finished batch and move the cursor past it
    ///
    /// # Errors
    /// The state is left untouched if the batch does not start at the cursor
    /// or does not fit the segment list.
    pub fn commit(&mut self, batch: Batch, output: &str) -> Result<(), StateError> {
        if batch.start != self.current_index {
            return Err(StateError::StaleBatch {
                expected: self.current_index,
                found: batch.start,
            });
        }
        if batch.is_empty() || batch.end > self.segments.len() {
            return Err(StateError::BatchOutOfRange {
                batch,
                total: self.segments.len(),
            });
        }

        if !self.accumulated_output.is_empty() {
            self.accumulated_output.push_str(BATCH_SEPARATOR);
        }
        self.accumulated_output.push_str(output);
        self.current_index = batch.end;
        Ok(())
    }

    /// Whether every segment has been consumed
    pub fn is_complete(&self) -> bool {
        self.current_index >= self.segments.len()
    }

    /// Number of segments not yet consumed
    pub fn remaining(&self) -> usize {
        self.segments.len() - self.current_index
    }

    /// Number of segments in the list
    pub fn total(&self) -> usize {
        self.segments.len()
    }

    /// Position of the next unconsumed segment
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// Current batch size
    pub fn batch_size(&self) -> usize {
        self.batch_size.get()
    }

    /// The segment list
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Everything produced so far, in batch order
    pub fn accumulated_output(&self) -> &str {
        &self.accumulated_output
    }
}

impl Default for SchedulerState {
    fn default() -> Self {
        Self {
            segments: Vec::new(),
            batch_size: NonZeroUsize::new(DEFAULT_BATCH_SIZE).unwrap_or(NonZeroUsize::MIN),
            current_index: 0,
            accumulated_output: String::new(),
        }
    }
}
