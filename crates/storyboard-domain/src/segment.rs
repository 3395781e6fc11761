//! Segment module - one numbered unit of source text

use crate::numbering::strip_number_prefix;
use std::fmt;

/// A numbered line produced by the split step
///
/// `text` keeps the numeral and separator exactly as the model emitted them,
/// because downstream prompts and saved files re-display the numbering.
/// [`Segment::content`] gives the same line without the prefix, which is what
/// character limits are measured against.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Segment {
    /// Position in the segment list, starting at 1
    pub index: usize,

    /// Full line text including the numeric prefix
    pub text: String,
}

impl Segment {
    /// Create a new segment
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        Self {
            index,
            text: text.into(),
        }
    }

    /// Line text without the numeric prefix
    ///
    /// # Examples
    ///
    /// ```
    /// use storyboard_domain::Segment;
    ///
    /// let segment = Segment::new(1, "1、他坐下。");
    /// assert_eq!(segment.content(), "他坐下。");
    /// ```
    pub fn content(&self) -> &str {
        strip_number_prefix(&self.text)
    }

    /// Number of characters in the content (Unicode scalar values)
    pub fn char_count(&self) -> usize {
        self.content().chars().count()
    }

    /// Check the content against a per-line character ceiling
    pub fn exceeds(&self, max_chars: usize) -> bool {
        self.char_count() > max_chars
    }

    /// Copy of this segment under a new index, with the prefix rewritten
    pub fn renumbered(&self, index: usize) -> Self {
        Self {
            index,
            text: format!("{}. {}", index, self.content()),
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_and_count() {
        let segment = Segment::new(3, "3. 他走进屋子。");
        assert_eq!(segment.content(), "他走进屋子。");
        assert_eq!(segment.char_count(), 6);
        assert!(!segment.exceeds(6));
        assert!(segment.exceeds(5));
    }

    #[test]
    fn test_renumbered() {
        let segment = Segment::new(2, "2、雨停了。");
        let moved = segment.renumbered(14);
        assert_eq!(moved.index, 14);
        assert_eq!(moved.text, "14. 雨停了。");
        assert_eq!(moved.content(), segment.content());
    }

    #[test]
    fn test_display_is_full_text() {
        let segment = Segment::new(1, "1. 开场");
        assert_eq!(segment.to_string(), "1. 开场");
    }
}
