//! Batch module - contiguous windows over the segment list

use std::num::NonZeroUsize;
use std::ops::Range;

/// A half-open range `[start, end)` of segment positions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Batch {
    /// First position in the batch (0-based)
    pub start: usize,

    /// One past the last position in the batch
    pub end: usize,
}

impl Batch {
    /// Create a new batch
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// The batch that starts at `start` for a list of `total` segments
    ///
    /// Returns `None` once `start` has reached `total`.
    pub fn starting_at(start: usize, total: usize, size: NonZeroUsize) -> Option<Self> {
        if start >= total {
            return None;
        }
        let end = start.saturating_add(size.get()).min(total);
        Some(Self { start, end })
    }

    /// Plan every batch for a list of `total` segments
    ///
    /// # Examples
    ///
    /// ```
    /// use std::num::NonZeroUsize;
    /// use storyboard_domain::Batch;
    ///
    /// let size = NonZeroUsize::new(20).unwrap();
    /// let batches: Vec<_> = Batch::plan(45, size).collect();
    /// assert_eq!(batches, vec![Batch::new(0, 20), Batch::new(20, 40), Batch::new(40, 45)]);
    /// ```
    pub fn plan(total: usize, size: NonZeroUsize) -> BatchPlan {
        BatchPlan {
            next: 0,
            total,
            size,
        }
    }

    /// Number of segments in the batch
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Whether the batch covers no segments
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The batch as a slice range
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// Iterator over the batches of a segment list
#[derive(Debug, Clone)]
pub struct BatchPlan {
    next: usize,
    total: usize,
    size: NonZeroUsize,
}

impl Iterator for BatchPlan {
    type Item = Batch;

    fn next(&mut self) -> Option<Self::Item> {
        let batch = Batch::starting_at(self.next, self.total, self.size)?;
        self.next = batch.end;
        Some(batch)
    }
}
