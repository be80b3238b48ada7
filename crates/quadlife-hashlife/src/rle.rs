//! Run-length encoded pattern text.
//!
//! Parsing skips `#` comment lines, validates the header line, then reads
//! the body: `b` (dead run), `o` (live run), `$` (end of row), `!` (end of
//! pattern), each optionally prefixed by a repeat count. Whitespace is
//! ignored. Writing emits the header for the live bounding box and wraps
//! the body at [`LINE_WIDTH`] columns.

use quadlife_core::pattern::header_line;
use quadlife_core::{PatternError, PatternHeader, Point};

use crate::rule::RULE;

/// Maximum body line length when writing.
pub const LINE_WIDTH: usize = 70;

/// Parse pattern text into live cell positions.
///
/// Coordinates are relative to the top-left of the declared grid.
pub fn parse(text: &str) -> Result<Vec<Point>, PatternError> {
    PatternHeader::parse(text)?;
    let header = header_line(text).unwrap_or_default();

    let mut cells = Vec::new();
    let mut x: i64 = 0;
    let mut y: i64 = 0;
    let mut run: Option<i64> = None;
    let mut past_header = false;

    'lines: for (line_no, line) in text.lines().enumerate() {
        let line_no = line_no + 1;
        let trimmed = line.trim();
        if !past_header {
            if trimmed == header {
                past_header = true;
            }
            continue;
        }
        if trimmed.starts_with('#') {
            continue;
        }
        for c in trimmed.chars() {
            if let Some(d) = c.to_digit(10) {
                let next = run
                    .unwrap_or(0)
                    .checked_mul(10)
                    .and_then(|v| v.checked_add(i64::from(d)))
                    .ok_or(PatternError::RunTooLong { line: line_no })?;
                run = Some(next);
                continue;
            }
            let count = run.take().unwrap_or(1);
            match c {
                'b' | '.' => x += count,
                'o' => {
                    cells.extend((x..x + count).map(|cx| Point::new(cx, y)));
                    x += count;
                }
                '$' => {
                    y += count;
                    x = 0;
                }
                '!' => break 'lines,
                c if c.is_whitespace() => {}
                other => {
                    return Err(PatternError::InvalidCell {
                        found: other,
                        line: line_no,
                    })
                }
            }
        }
    }
    Ok(cells)
}

/// Write live cells as pattern text.
///
/// `cells` may be in any order; output is normalised to the live
/// bounding box.
pub fn write(cells: &[Point]) -> String {
    if cells.is_empty() {
        return format!("x = 0, y = 0, rule = {RULE}\n!\n");
    }
    let mut sorted = cells.to_vec();
    sorted.sort();
    sorted.dedup();

    let min_x = sorted.iter().map(|p| p.x).min().unwrap_or(0);
    let max_x = sorted.iter().map(|p| p.x).max().unwrap_or(0);
    let min_y = sorted[0].y;
    let max_y = sorted[sorted.len() - 1].y;

    let mut tokens: Vec<String> = Vec::new();
    let mut row = min_y;
    let mut i = 0;
    while i < sorted.len() {
        let p = sorted[i];
        if p.y > row {
            tokens.push(run_token(p.y - row, '$'));
            row = p.y;
        }
        // Collect a horizontal run of live cells.
        let start = i;
        while i + 1 < sorted.len() && sorted[i + 1].y == p.y && sorted[i + 1].x == sorted[i].x + 1
        {
            i += 1;
        }
        let gap = if start > 0 && sorted[start - 1].y == p.y {
            p.x - sorted[start - 1].x - 1
        } else {
            p.x - min_x
        };
        if gap > 0 {
            tokens.push(run_token(gap, 'b'));
        }
        tokens.push(run_token((i - start) as i64 + 1, 'o'));
        i += 1;
    }
    tokens.push("!".into());

    let mut out = format!(
        "x = {}, y = {}, rule = {RULE}\n",
        max_x - min_x + 1,
        max_y - min_y + 1
    );
    let mut line_len = 0;
    for token in tokens {
        if line_len + token.len() > LINE_WIDTH {
            out.push('\n');
            line_len = 0;
        }
        line_len += token.len();
        out.push_str(&token);
    }
    out.push('\n');
    out
}

fn run_token(count: i64, tag: char) -> String {
    if count == 1 {
        tag.to_string()
    } else {
        format!("{count}{tag}")
    }
}
