//! The B3/S23 transition rule.

/// Rule string written into pattern headers.
pub const RULE: &str = "B3/S23";

/// Next state of the interior cell `(x, y)` of a 4×4 block.
///
/// `x` and `y` must be in `1..=2` so that all eight neighbours exist.
pub fn next_state(cells: &[[bool; 4]; 4], x: usize, y: usize) -> bool {
    let mut neighbours = 0;
    for ny in y - 1..=y + 1 {
        for nx in x - 1..=x + 1 {
            if (nx, ny) != (x, y) && cells[ny][nx] {
                neighbours += 1;
            }
        }
    }
    matches!((cells[y][x], neighbours), (true, 2) | (_, 3))
}
