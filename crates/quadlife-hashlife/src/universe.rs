//! A rooted quadtree positioned in world space.

use std::collections::HashMap;

use quadlife_core::Point;

use crate::node::{NodeId, NodeKey, NodeStore};

/// Smallest root level kept by a universe. Keeps every recursion at
/// least two levels above the base case.
pub(crate) const MIN_ROOT_LEVEL: u8 = 3;

/// Largest single stride (log2) taken by [`Universe::step`]. Larger
/// requests are split so the root stays well inside `i64` coordinates.
pub(crate) const MAX_STRIDE_LOG2: u8 = 40;

/// A Life universe: node store, root node, root position and age.
#[derive(Clone, Debug)]
pub struct Universe {
    pub(crate) store: NodeStore,
    pub(crate) root: NodeId,
    /// World coordinate of the root's north-west corner.
    pub(crate) origin: Point,
    pub(crate) age: u64,
}

impl Default for Universe {
    fn default() -> Self {
        Self::new()
    }
}

impl Universe {
    /// An empty universe at age zero.
    pub fn new() -> Self {
        let mut store = NodeStore::new();
        let root = store.empty(MIN_ROOT_LEVEL);
        let half = 1i64 << (MIN_ROOT_LEVEL - 1);
        Self {
            store,
            root,
            origin: Point::new(-half, -half),
            age: 0,
        }
    }

    /// Build a universe whose live cells are exactly `cells`.
    pub fn from_cells(cells: &[Point]) -> Self {
        let mut universe = Self::new();
        if cells.is_empty() {
            return universe;
        }
        let min_x = cells.iter().map(|p| p.x).min().unwrap_or(0);
        let min_y = cells.iter().map(|p| p.y).min().unwrap_or(0);
        let max_x = cells.iter().map(|p| p.x).max().unwrap_or(0);
        let max_y = cells.iter().map(|p| p.y).max().unwrap_or(0);
        let span = (max_x - min_x).max(max_y - min_y) as u64 + 1;

        let mut level = MIN_ROOT_LEVEL;
        while (1u64 << level) < span {
            level += 1;
        }
        let origin = Point::new(min_x, min_y);
        let mut owned = cells.to_vec();
        universe.root = universe.build(level, origin, &mut owned);
        universe.origin = origin;
        universe
    }

    fn build(&mut self, level: u8, corner: Point, cells: &mut [Point]) -> NodeId {
        if cells.is_empty() {
            return self.store.empty(level);
        }
        if level == 0 {
            return self.store.leaf(true);
        }
        let half = 1i64 << (level - 1);
        let mid = Point::new(corner.x + half, corner.y + half);

        // Partition rows first, then columns within each half.
        let (north, south) = partition(cells, |p| p.y < mid.y);
        let (nw, ne) = partition(north, |p| p.x < mid.x);
        let (sw, se) = partition(south, |p| p.x < mid.x);

        let quads = [
            self.build(level - 1, corner, nw),
            self.build(level - 1, Point::new(mid.x, corner.y), ne),
            self.build(level - 1, Point::new(corner.x, mid.y), sw),
            self.build(level - 1, mid, se),
        ];
        self.store.branch(quads)
    }

    /// Generations elapsed since construction.
    pub fn age(&self) -> u64 {
        self.age
    }

    /// Live cells.
    pub fn population(&self) -> u64 {
        self.store.population(self.root)
    }

    /// Interned node count.
    pub fn node_count(&self) -> usize {
        self.store.len()
    }

    /// Level of the root node.
    pub fn root_level(&self) -> u8 {
        self.store.level(self.root)
    }

    /// World coordinate of the root's north-west corner.
    pub fn origin(&self) -> Point {
        self.origin
    }

    /// Advance `generations` steps.
    ///
    /// The request is split into power-of-two strides, lowest bit first.
    pub fn step(&mut self, generations: u64) {
        let mut remaining = generations;
        while remaining > 0 {
            let stride = (remaining.trailing_zeros() as u8).min(MAX_STRIDE_LOG2);
            self.advance_pow2(stride);
            remaining -= 1u64 << stride;
        }
    }

    fn advance_pow2(&mut self, stride: u8) {
        while self.root_level() < stride + 2 || !self.population_is_centred() {
            self.expand();
        }
        self.expand();
        let level = self.root_level();
        self.root = self.store.successor(self.root, stride);
        let shift = 1i64 << (level - 2);
        self.origin = Point::new(self.origin.x + shift, self.origin.y + shift);
        self.age += 1u64 << stride;
    }

    fn population_is_centred(&self) -> bool {
        self.store.centre_population(self.root) == self.store.population(self.root)
    }

    /// Wrap the root in a node twice its size, keeping it centred.
    fn expand(&mut self) {
        let level = self.root_level();
        let [nw, ne, sw, se] = self.store.children(self.root);
        let e = self.store.empty(level - 1);
        let quads = [
            self.store.branch([e, e, e, nw]),
            self.store.branch([e, e, ne, e]),
            self.store.branch([e, sw, e, e]),
            self.store.branch([se, e, e, e]),
        ];
        self.root = self.store.branch(quads);
        let shift = 1i64 << (level - 1);
        self.origin = Point::new(self.origin.x - shift, self.origin.y - shift);
    }

    /// A copy holding only the nodes reachable from the root.
    ///
    /// Memoized successors are discarded; cells, origin and age carry over.
    pub fn pruned(&self) -> Self {
        let mut store = NodeStore::new();
        let mut remap = HashMap::new();
        let root = copy_reachable(&self.store, &mut store, &mut remap, self.root);
        Self {
            store,
            root,
            origin: self.origin,
            age: self.age,
        }
    }

    /// All live cells in row-major order.
    pub fn live_cells(&self) -> Vec<Point> {
        let mut cells = Vec::with_capacity(self.population() as usize);
        self.collect(self.root, self.origin, &mut cells);
        cells.sort();
        cells
    }

    fn collect(&self, id: NodeId, corner: Point, out: &mut Vec<Point>) {
        if self.store.population(id) == 0 {
            return;
        }
        match self.store.key(id) {
            NodeKey::Leaf(_) => out.push(corner),
            NodeKey::Branch { level, children } => {
                let half = 1i64 << (level - 1);
                for (i, child) in children.into_iter().enumerate() {
                    let offset = Point::new((i as i64 % 2) * half, (i as i64 / 2) * half);
                    self.collect(child, corner + offset, out);
                }
            }
        }
    }
}

fn copy_reachable(
    from: &NodeStore,
    to: &mut NodeStore,
    remap: &mut HashMap<NodeId, NodeId>,
    id: NodeId,
) -> NodeId {
    if let Some(&done) = remap.get(&id) {
        return done;
    }
    let copied = match from.key(id) {
        NodeKey::Leaf(alive) => to.leaf(alive),
        NodeKey::Branch { children, .. } => {
            let mut mapped = [NodeId(0); 4];
            for (slot, child) in mapped.iter_mut().zip(children) {
                *slot = copy_reachable(from, to, remap, child);
            }
            to.branch(mapped)
        }
    };
    remap.insert(id, copied);
    copied
}

/// In-place split of `cells` into `(matching, rest)`. Order within each
/// half is not preserved.
fn partition(cells: &mut [Point], pred: impl Fn(&Point) -> bool) -> (&mut [Point], &mut [Point]) {
    let mut split = 0;
    for i in 0..cells.len() {
        if pred(&cells[i]) {
            cells.swap(split, i);
            split += 1;
        }
    }
    cells.split_at_mut(split)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn glider() -> Vec<Point> {
        vec![
            Point::new(1, 0),
            Point::new(2, 1),
            Point::new(0, 2),
            Point::new(1, 2),
            Point::new(2, 2),
        ]
    }

    /// Brute-force reference stepping on a sparse set.
    fn naive_step(cells: &[Point], generations: u64) -> Vec<Point> {
        use std::collections::{HashMap, HashSet};
        let mut live: HashSet<Point> = cells.iter().copied().collect();
        for _ in 0..generations {
            let mut counts: HashMap<Point, u8> = HashMap::new();
            for p in &live {
                for dy in -1..=1 {
                    for dx in -1..=1 {
                        if dx != 0 || dy != 0 {
                            *counts.entry(Point::new(p.x + dx, p.y + dy)).or_default() += 1;
                        }
                    }
                }
            }
            live = counts
                .into_iter()
                .filter(|(p, n)| *n == 3 || (*n == 2 && live.contains(p)))
                .map(|(p, _)| p)
                .collect();
        }
        let mut out: Vec<Point> = live.into_iter().collect();
        out.sort();
        out
    }

    #[test]
    fn from_cells_round_trips() {
        let u = Universe::from_cells(&glider());
        let mut expected = glider();
        expected.sort();
        assert_eq!(u.live_cells(), expected);
        assert_eq!(u.population(), 5);
    }

    #[test]
    fn glider_translates_after_four_generations() {
        let mut u = Universe::from_cells(&glider());
        u.step(4);
        let mut expected: Vec<Point> = glider()
            .into_iter()
            .map(|p| Point::new(p.x + 1, p.y + 1))
            .collect();
        expected.sort();
        assert_eq!(u.live_cells(), expected);
        assert_eq!(u.age(), 4);
    }

    #[test]
    fn matches_naive_stepping_for_odd_counts() {
        let r_pentomino = vec![
            Point::new(1, 0),
            Point::new(2, 0),
            Point::new(0, 1),
            Point::new(1, 1),
            Point::new(1, 2),
        ];
        for generations in [1, 3, 7, 13, 30] {
            let mut u = Universe::from_cells(&r_pentomino);
            u.step(generations);
            assert_eq!(
                u.live_cells(),
                naive_step(&r_pentomino, generations),
                "diverged after {generations} generations"
            );
        }
    }

    #[test]
    fn split_steps_equal_single_step() {
        let mut a = Universe::from_cells(&glider());
        let mut b = Universe::from_cells(&glider());
        a.step(64);
        for _ in 0..8 {
            b.step(8);
        }
        assert_eq!(a.live_cells(), b.live_cells());
        assert_eq!(a.age(), b.age());
    }

    #[test]
    fn prune_keeps_cells_and_shrinks_store() {
        let mut u = Universe::from_cells(&glider());
        u.step(256);
        let pruned = u.pruned();
        assert!(pruned.node_count() <= u.node_count());
        assert_eq!(pruned.live_cells(), u.live_cells());
        assert_eq!(pruned.age(), u.age());
        assert_eq!(pruned.origin(), u.origin());
    }

    #[test]
    fn partition_separates_by_predicate() {
        let mut cells = vec![
            Point::new(5, 0),
            Point::new(1, 0),
            Point::new(7, 0),
            Point::new(2, 0),
            Point::new(9, 0),
        ];
        let (low, high) = partition(&mut cells, |p| p.x < 4);
        let mut low = low.to_vec();
        low.sort();
        let mut high = high.to_vec();
        high.sort();
        assert_eq!(low, [Point::new(1, 0), Point::new(2, 0)]);
        assert_eq!(high, [Point::new(5, 0), Point::new(7, 0), Point::new(9, 0)]);
    }

    #[test]
    fn prune_is_idempotent() {
        let mut u = Universe::from_cells(&glider());
        u.step(100);
        let once = u.pruned();
        let twice = once.pruned();
        assert_eq!(once.node_count(), twice.node_count());
    }

    #[test]
    fn empty_universe_stays_empty() {
        let mut u = Universe::new();
        u.step(1000);
        assert_eq!(u.population(), 0);
        assert_eq!(u.age(), 1000);
        assert!(u.live_cells().is_empty());
    }

    #[test]
    fn pruned_universe_keeps_stepping() {
        let mut a = Universe::from_cells(&glider());
        a.step(32);
        let mut b = a.pruned();
        a.step(32);
        b.step(32);
        assert_eq!(a.live_cells(), b.live_cells());
    }
}
