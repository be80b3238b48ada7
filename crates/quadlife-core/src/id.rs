//! Strongly-typed identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Sequence number of a pattern load.
///
/// The render context bumps this every time it sends a new input to the
/// worker. Results are stamped with the generation their handle was
/// built from, so a result computed against a superseded input can be
/// recognised and dropped.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct InputGeneration(pub u64);

impl InputGeneration {
    /// The generation that follows this one.
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Display for InputGeneration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for InputGeneration {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_is_monotonic() {
        let g = InputGeneration(7);
        assert_eq!(g.next(), InputGeneration(8));
        assert!(g.next() > g);
    }

    #[test]
    fn displays_inner_value() {
        assert_eq!(InputGeneration(3).to_string(), "3");
    }
}
