//! Parse model replies into numbered segments

use crate::error::PipelineError;
use storyboard_domain::numbering::leading_number;
use storyboard_domain::Segment;
use tracing::{debug, warn};

/// Parse a split reply into segments
///
/// Every line is trimmed; only numbered lines are kept, with their prefix
/// left in place. Commentary, headings and blank lines are dropped.
///
/// Indices follow the model's numerals while they increase. A numeral that
/// does not exceed its predecessor (a restart, a duplicate, or one too large
/// to represent) is replaced by `previous + 1`, so the returned indices are
/// always strictly increasing.
///
/// # Errors
/// [`PipelineError::Parse`] with the full reply when no line is numbered, or
/// when a line follows the largest representable numeral.
pub fn parse_segments(raw: &str) -> Result<Vec<Segment>, PipelineError> {
    let mut segments: Vec<Segment> = Vec::new();
    let mut skipped = 0usize;

    for line in raw.lines().map(str::trim) {
        let Some(numeral) = leading_number(line) else {
            if !line.is_empty() {
                skipped += 1;
            }
            continue;
        };

        let previous = segments.last().map(|s| s.index).unwrap_or(0);
        let index = match numeral {
            Some(n) if n > previous => n,
            other => {
                let Some(next) = previous.checked_add(1) else {
                    warn!("Segment numbering exhausted after {}", previous);
                    return Err(PipelineError::Parse {
                        raw: raw.to_string(),
                    });
                };
                warn!(
                    "Segment numeral {:?} does not follow {}; using {}",
                    other, previous, next
                );
                next
            }
        };
        segments.push(Segment::new(index, line));
    }

    if segments.is_empty() {
        return Err(PipelineError::Parse {
            raw: raw.to_string(),
        });
    }

    debug!(
        "Parsed {} segments ({} non-numbered lines ignored)",
        segments.len(),
        skipped
    );
    Ok(segments)
}

/// Segments whose content is longer than `max_chars`
///
/// Advisory only: nothing is shortened or re-split.
pub fn over_limit(segments: &[Segment], max_chars: usize) -> Vec<&Segment> {
    segments.iter().filter(|s| s.exceeds(max_chars)).collect()
}

/// Render segments one per line, prefixes as stored
pub fn render_numbered(segments: &[Segment]) -> String {
    segments
        .iter()
        .map(|s| s.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_plain_list() {
        let raw = "1. 他走进屋子。\n2. 他坐下。\n3. 他叹了口气。";
        let segments = parse_segments(raw).unwrap();

        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0], Segment::new(1, "1. 他走进屋子。"));
        assert_eq!(segments[2].content(), "他叹了口气。");
    }

    #[test]
    fn test_parse_ignores_commentary() {
        let raw = "好的，以下是分镜：\n\n  1、他走进屋子。  \n说明：共两行\n2．他坐下。\n";
        let segments = parse_segments(raw).unwrap();

        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].text, "1、他走进屋子。");
        assert_eq!(segments[1].text, "2．他坐下。");
    }

    #[test]
    fn test_parse_tolerates_gaps() {
        let segments = parse_segments("1. a\n3. b\n7. c").unwrap();
        let indices: Vec<usize> = segments.iter().map(|s| s.index).collect();
        assert_eq!(indices, vec![1, 3, 7]);
    }

    #[test]
    fn test_parse_repairs_restart_and_duplicate() {
        let segments = parse_segments("1. a\n2. b\n2. c\n1. d").unwrap();
        let indices: Vec<usize> = segments.iter().map(|s| s.index).collect();
        assert_eq!(indices, vec![1, 2, 3, 4]);
        // Text keeps the model's own numeral
        assert_eq!(segments[3].text, "1. d");
    }

    #[test]
    fn test_parse_overflowing_numeral() {
        let segments = parse_segments("1. a\n99999999999999999999999. b").unwrap();
        assert_eq!(segments[1].index, 2);
    }

    #[test]
    fn test_parse_line_after_max_numeral() {
        let raw = format!("{}. a\n1. b", usize::MAX);
        match parse_segments(&raw) {
            Err(PipelineError::Parse { raw: kept }) => assert_eq!(kept, raw),
            other => panic!("expected parse error, got {:?}", other),
        }

        let segments = parse_segments(&format!("{}. a", usize::MAX)).unwrap();
        assert_eq!(segments[0].index, usize::MAX);
    }

    #[test]
    fn test_parse_without_numbered_lines() {
        let raw = "抱歉，我无法处理这段文字。";
        match parse_segments(raw) {
            Err(PipelineError::Parse { raw: kept }) => assert_eq!(kept, raw),
            other => panic!("expected parse error, got {:?}", other),
        }
        assert!(parse_segments("").is_err());
    }

    #[test]
    fn test_digit_without_separator_is_not_numbered() {
        assert!(parse_segments("2024年春天").is_err());
    }

    #[test]
    fn test_over_limit() {
        let segments = vec![
            Segment::new(1, "1. 短句。"),
            Segment::new(2, "2. 这一行明显超过了十个字的上限。"),
        ];
        let flagged = over_limit(&segments, 10);
        assert_eq!(flagged.len(), 1);
        assert_eq!(flagged[0].index, 2);
        assert!(over_limit(&segments, 100).is_empty());
    }

    #[test]
    fn test_render_numbered_reparses() {
        let segments = parse_segments("1. 甲\n2、乙\n3 丙").unwrap();
        let rendered = render_numbered(&segments);
        assert_eq!(rendered, "1. 甲\n2、乙\n3 丙");
        assert_eq!(parse_segments(&rendered).unwrap(), segments);
    }

    proptest! {
        #[test]
        fn parse_never_panics(raw in "\\PC*") {
            let _ = parse_segments(&raw);
        }

        #[test]
        fn parsed_indices_strictly_increase(
            numerals in proptest::collection::vec(0usize..50, 1..30)
        ) {
            let raw = numerals
                .iter()
                .map(|n| format!("{}. 行", n))
                .collect::<Vec<_>>()
                .join("\n");
            let segments = parse_segments(&raw).unwrap();
            prop_assert_eq!(segments.len(), numerals.len());
            for pair in segments.windows(2) {
                prop_assert!(pair[0].index < pair[1].index);
            }
        }
    }
}
