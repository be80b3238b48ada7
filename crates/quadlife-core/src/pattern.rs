//! Pattern header parsing.
//!
//! Patterns are exchanged as plain text: any number of `#` comment lines,
//! then a header line whose first two integers are the declared width and
//! height, then a run-length encoded cell grid. Only the header matters
//! to the viewport; the body is left to the engine.

use crate::error::PatternError;

/// Declared bounding box of a pattern.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PatternHeader {
    /// Declared width in cells.
    pub width: u64,
    /// Declared height in cells.
    pub height: u64,
}

impl PatternHeader {
    /// Parse the header line of `text`.
    ///
    /// Blank lines before the header are skipped along with comments.
    pub fn parse(text: &str) -> Result<Self, PatternError> {
        let line = header_line(text).ok_or_else(|| PatternError::MalformedHeader {
            reason: "no header line".into(),
        })?;

        let mut numbers = integers(line);
        let width = numbers.next();
        let height = numbers.next();
        match (width, height) {
            (Some(Some(width)), Some(Some(height))) => Ok(Self { width, height }),
            (Some(None), _) | (_, Some(None)) => Err(PatternError::MalformedHeader {
                reason: format!("dimension out of range in {line:?}"),
            }),
            _ => Err(PatternError::MalformedHeader {
                reason: format!("expected two integers in {line:?}"),
            }),
        }
    }
}

/// The first line that is neither a comment nor blank.
pub fn header_line(text: &str) -> Option<&str> {
    text.lines()
        .map(str::trim)
        .find(|l| !l.is_empty() && !l.starts_with('#'))
}

/// Maximal digit runs in `line`, parsed as `u64` (`None` on overflow).
fn integers(line: &str) -> impl Iterator<Item = Option<u64>> + '_ {
    line.split(|c: char| !c.is_ascii_digit())
        .filter(|s| !s.is_empty())
        .map(|s| s.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_standard_header() {
        let text = "x = 12, y = 8, rule = B3/S23\n5bob2o!\n";
        assert_eq!(
            PatternHeader::parse(text).unwrap(),
            PatternHeader {
                width: 12,
                height: 8
            }
        );
    }

    #[test]
    fn skips_comment_lines() {
        let text = "#N Spaceship\n#C a comment with 99 numbers\nx = 49, y = 22\n!";
        let h = PatternHeader::parse(text).unwrap();
        assert_eq!((h.width, h.height), (49, 22));
    }

    #[test]
    fn takes_first_two_integers_only() {
        let h = PatternHeader::parse("x=3,y=4,rule=B36/S23").unwrap();
        assert_eq!((h.width, h.height), (3, 4));
    }

    #[test]
    fn missing_header_is_malformed() {
        let err = PatternHeader::parse("#C only comments\n").unwrap_err();
        assert!(matches!(err, PatternError::MalformedHeader { .. }));
    }

    #[test]
    fn single_integer_is_malformed() {
        let err = PatternHeader::parse("x = 12\n!").unwrap_err();
        assert!(matches!(err, PatternError::MalformedHeader { .. }));
    }

    #[test]
    fn overflowing_dimension_is_malformed() {
        let err = PatternHeader::parse("x = 99999999999999999999999, y = 1").unwrap_err();
        assert!(matches!(err, PatternError::MalformedHeader { .. }));
    }
}
