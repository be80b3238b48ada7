//! Reusable pattern text.
//!
//! - [`SPACESHIP_RLE`]: the default pattern, a 12×8 period-4 spaceship.
//! - [`GLIDER_RLE`]: the smallest spaceship.
//! - [`BLINKER_RLE`]: period-2 oscillator.
//! - [`BLOCK_RLE`]: still life.

/// Default startup pattern.
pub const SPACESHIP_RLE: &str = concat!(
    "x = 12, y = 8, rule = B3/S23\n",
    "5bob2o$4bo6bo$3b2o3bo2bo$2obo5b2o$2obo5b2o$3b2o3bo2bo$4bo6bo$5bob2o!\n"
);

/// A glider heading south-east.
pub const GLIDER_RLE: &str = "#N Glider\nx = 3, y = 3, rule = B3/S23\nbo$2bo$3o!\n";

/// Three cells in a row.
pub const BLINKER_RLE: &str = "x = 3, y = 1, rule = B3/S23\n3o!\n";

/// A 2×2 block.
pub const BLOCK_RLE: &str = "x = 2, y = 2, rule = B3/S23\n2o$2o!\n";

/// Text with no usable header line.
pub const HEADERLESS_TEXT: &str = "#C only comments here\n\n";
