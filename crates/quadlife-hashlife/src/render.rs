//! Windowed grayscale sampling of a universe.
//!
//! Each sample covers a `2^zoom_level` square of cells. Its gray level is
//! the live-cell density of that square scaled by the window brightness:
//! `min(255, 255 * brightness * live / 4^zoom_level)`.

use quadlife_core::{PixelBuffer, Point, RenderWindow};

use crate::node::{NodeId, NodeKey, NodeStore};
use crate::universe::Universe;

/// Sample `window` into an RGBA buffer.
pub fn render(universe: &Universe, window: &RenderWindow) -> PixelBuffer {
    let samples_per_row = window.width as usize;
    let mut counts = vec![0u64; samples_per_row * window.height as usize];
    if counts.is_empty() {
        return PixelBuffer::default();
    }

    let sampler = Sampler {
        store: &universe.store,
        window,
        counts: &mut counts,
    };
    sampler.run(universe.root, universe.origin);

    let cells_per_sample = 4f64.powi(i32::from(window.zoom_level));
    let gray: Vec<u8> = counts
        .iter()
        .map(|&live| {
            let level = 255.0 * window.brightness * live as f64 / cells_per_sample;
            level.clamp(0.0, 255.0) as u8
        })
        .collect();
    PixelBuffer::from_gray(&gray, samples_per_row, window.cell_size as usize)
}

struct Sampler<'a> {
    store: &'a NodeStore,
    window: &'a RenderWindow,
    counts: &'a mut [u64],
}

impl Sampler<'_> {
    fn run(mut self, root: NodeId, origin: Point) {
        self.visit(root, i128::from(origin.x), i128::from(origin.y));
    }

    /// Sample index along one axis for world coordinate `v`.
    fn bin(&self, v: i128, start: i64) -> i128 {
        (v - i128::from(start)).div_euclid(1i128 << self.window.zoom_level)
    }

    fn visit(&mut self, id: NodeId, x: i128, y: i128) {
        let live = self.store.population(id);
        if live == 0 {
            return;
        }
        let key = self.store.key(id);
        let side = 1i128 << key.level();

        let (bx0, bx1) = (self.bin(x, self.window.x0), self.bin(x + side - 1, self.window.x0));
        let (by0, by1) = (self.bin(y, self.window.y0), self.bin(y + side - 1, self.window.y0));
        let (w, h) = (i128::from(self.window.width), i128::from(self.window.height));
        if bx1 < 0 || by1 < 0 || bx0 >= w || by0 >= h {
            return;
        }

        if bx0 == bx1 && by0 == by1 {
            let index = by0 as usize * self.window.width as usize + bx0 as usize;
            self.counts[index] += live;
            return;
        }

        if let NodeKey::Branch { children, .. } = key {
            let half = side / 2;
            for (i, child) in children.into_iter().enumerate() {
                let dx = (i as i128 % 2) * half;
                let dy = (i as i128 / 2) * half;
                self.visit(child, x + dx, y + dy);
            }
        }
    }
}
