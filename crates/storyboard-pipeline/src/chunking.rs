//! Cut long source documents into pieces that fit one split call
//!
//! Chunks are contiguous slices of the source: concatenating them gives the
//! source back exactly. Limits are counted in characters, not bytes, since
//! most input is CJK text.

/// Splits source text into chunks of at most `max_chars` characters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceChunker {
    max_chars: usize,
}

const SENTENCE_ENDS: &[char] = &['。', '！', '？', '!', '?', '；', ';', '…'];
const CLOSING_MARKS: &[char] = &['”', '’', '」', '』', '）', ')', '"', '\''];

impl SourceChunker {
    /// Create a chunker; a zero limit is treated as one character
    pub fn new(max_chars: usize) -> Self {
        Self {
            max_chars: max_chars.max(1),
        }
    }

    /// Character limit per chunk
    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    /// Chunk the given text
    ///
    /// Paragraphs are kept whole where possible; a paragraph over the limit
    /// is cut after sentence punctuation, and a sentence over the limit is
    /// cut at the character limit.
    pub fn chunk<'a>(&self, text: &'a str) -> Vec<&'a str> {
        if text.chars().count() <= self.max_chars {
            return vec![text];
        }

        let mut units = Vec::new();
        for paragraph in text.split_inclusive("\n\n") {
            if char_len(paragraph) <= self.max_chars {
                units.push(paragraph);
                continue;
            }
            for sentence in split_sentences(paragraph) {
                if char_len(sentence) <= self.max_chars {
                    units.push(sentence);
                } else {
                    units.extend(hard_split(sentence, self.max_chars));
                }
            }
        }

        self.combine_until_limit(text, &units)
    }

    /// Merge adjacent units while the running total stays within the limit
    fn combine_until_limit<'a>(&self, text: &'a str, units: &[&'a str]) -> Vec<&'a str> {
        let mut chunks = Vec::new();
        let mut start = 0usize;
        let mut end = 0usize;
        let mut chars = 0usize;

        for unit in units {
            let unit_chars = char_len(unit);
            if chars > 0 && chars + unit_chars > self.max_chars {
                chunks.push(&text[start..end]);
                start = end;
                chars = 0;
            }
            end += unit.len();
            chars += unit_chars;
        }
        if start < end {
            chunks.push(&text[start..end]);
        }

        chunks
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Split after sentence-ending punctuation, keeping trailing closing quotes
/// with the sentence they close
fn split_sentences(text: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut start = 0usize;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if !SENTENCE_ENDS.contains(&c) {
            continue;
        }
        let mut end = i + c.len_utf8();
        while let Some(&(j, next)) = chars.peek() {
            if SENTENCE_ENDS.contains(&next) || CLOSING_MARKS.contains(&next) {
                end = j + next.len_utf8();
                chars.next();
            } else {
                break;
            }
        }
        pieces.push(&text[start..end]);
        start = end;
    }
    if start < text.len() {
        pieces.push(&text[start..]);
    }

    pieces
}

/// Cut at every `max_chars` characters
fn hard_split(text: &str, max_chars: usize) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut start = 0usize;
    let mut count = 0usize;

    for (i, _) in text.char_indices() {
        if count == max_chars {
            pieces.push(&text[start..i]);
            start = i;
            count = 0;
        }
        count += 1;
    }
    if start < text.len() {
        pieces.push(&text[start..]);
    }

    pieces
}
