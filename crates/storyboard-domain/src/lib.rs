//! Storyboard Domain Layer
//!
//! Value types shared by every other crate in the workspace. Nothing here
//! performs I/O; the LLM plumbing and the CLI live in their own crates.
//!
//! ## Key Concepts
//!
//! - **Segment**: one numbered line of source text, meant to become one shot
//! - **Batch**: a contiguous `[start, end)` slice of segments sent in one call
//! - **SchedulerState**: the segment list plus the resumable cursor and the
//!   accumulated storyboard text
//! - **Numbering grammar**: the single definition of what a numbered line is

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod batch;
pub mod numbering;
pub mod segment;
pub mod state;

// Re-exports for convenience
pub use batch::{Batch, BatchPlan};
pub use segment::Segment;
pub use state::{SchedulerState, StateError, DEFAULT_BATCH_SIZE};
