//! The engine handle contract.

use crate::error::{EngineError, PatternError};
use crate::window::{PixelBuffer, RenderWindow};

/// An exclusively-owned simulation handle.
///
/// Both execution contexts hold their own handle and mutate only that
/// one. Consistency between them is achieved by [`serialize`] on one
/// side and [`deserialize`] on the other, never by sharing a handle.
///
/// Releasing a handle is dropping it. Because a value can be dropped only
/// once and cannot be used afterwards, the "exactly one release, no use
/// after release" rule is enforced by ownership: replacing a handle with
/// `std::mem::replace` or plain assignment releases the old one.
///
/// [`serialize`]: Engine::serialize
/// [`deserialize`]: Engine::deserialize
pub trait Engine: Send + Sized + 'static {
    /// Build a handle from pattern text.
    fn from_text(text: &str) -> Result<Self, PatternError>;

    /// A handle with no live cells at age zero.
    fn empty() -> Self;

    /// Advance by `generations` steps in place.
    fn step(&mut self, generations: u64);

    /// Number of hash-consed nodes held by this handle.
    fn node_count(&self) -> u64;

    /// Number of live cells.
    fn alive_count(&self) -> u64;

    /// Generations elapsed since the pattern was loaded.
    fn age(&self) -> u64;

    /// A reduced-memory copy with identical cells and age.
    ///
    /// `self` remains valid; the caller decides which one to keep.
    #[must_use]
    fn prune(&self) -> Self;

    /// Encode the full handle state into a self-contained snapshot.
    fn serialize(&self) -> Vec<u8>;

    /// Rebuild a handle from a snapshot produced by [`Engine::serialize`].
    fn deserialize(bytes: &[u8]) -> Result<Self, EngineError>;

    /// Sample `window` into an RGBA buffer.
    fn render_window(&self, window: &RenderWindow) -> PixelBuffer;

    /// Encode the live cells as pattern text.
    fn to_text(&self) -> String;
}
