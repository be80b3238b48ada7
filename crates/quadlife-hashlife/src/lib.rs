//! Hash-consed quadtree Life engine for Quadlife.
//!
//! [`Universe`] implements the [`Engine`] handle contract from
//! `quadlife-core`. Identical sub-squares are interned once in a
//! [`NodeStore`](node::NodeStore) and their successors are memoized, so
//! stepping by `2^k` generations costs roughly the same as stepping by one
//! once the pattern's structure has been seen.
//!
//! # Modules
//!
//! - [`node`]: interning store and the recursive successor
//! - [`universe`]: root placement, expansion, stepping and pruning
//! - [`codec`]: binary snapshots for crossing between execution contexts
//! - [`rle`]: run-length encoded pattern text
//! - [`render`]: windowed grayscale sampling

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod codec;
pub mod node;
pub mod render;
pub mod rle;
pub mod rule;
pub mod universe;

pub use universe::Universe;

use quadlife_core::{Engine, EngineError, PatternError, PixelBuffer, RenderWindow};

impl Engine for Universe {
    fn from_text(text: &str) -> Result<Self, PatternError> {
        let cells = rle::parse(text)?;
        Ok(Self::from_cells(&cells))
    }

    fn empty() -> Self {
        Self::new()
    }

    fn step(&mut self, generations: u64) {
        Universe::step(self, generations);
    }

    fn node_count(&self) -> u64 {
        Universe::node_count(self) as u64
    }

    fn alive_count(&self) -> u64 {
        self.population()
    }

    fn age(&self) -> u64 {
        Universe::age(self)
    }

    fn prune(&self) -> Self {
        self.pruned()
    }

    fn serialize(&self) -> Vec<u8> {
        codec::encode(self)
    }

    fn deserialize(bytes: &[u8]) -> Result<Self, EngineError> {
        codec::decode(bytes)
    }

    fn render_window(&self, window: &RenderWindow) -> PixelBuffer {
        render::render(self, window)
    }

    fn to_text(&self) -> String {
        rle::write(&self.live_cells())
    }
}
