//! Integer cell coordinates.

use std::cmp::Ordering;
use std::ops::{Add, Sub};

/// A cell position in simulation space.
///
/// Ordered row-major (`y` first, then `x`), which is the order cells are
/// emitted in when writing run-length text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Point {
    /// Column, growing rightwards.
    pub x: i64,
    /// Row, growing downwards.
    pub y: i64,
}

impl Point {
    /// Construct a point.
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

impl Ord for Point {
    fn cmp(&self, other: &Self) -> Ordering {
        self.y.cmp(&other.y).then(self.x.cmp(&other.x))
    }
}

impl PartialOrd for Point {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Add for Point {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}
