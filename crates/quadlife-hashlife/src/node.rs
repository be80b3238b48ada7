//! Hash-consed quadtree node storage.
//!
//! Every distinct node is interned exactly once; a node's [`NodeId`] is
//! its insertion index. Children are always interned before their
//! parents, so walking the store in index order visits every child
//! before any node that refers to it. The snapshot codec relies on this.

use std::collections::HashMap;

use indexmap::IndexSet;

/// Index of an interned node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Structural identity of a node.
///
/// Level 0 nodes are single cells. A node of level `k > 0` covers a
/// `2^k × 2^k` square split into quadrants `[nw, ne, sw, se]`, each of
/// level `k - 1`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKey {
    /// A single cell.
    Leaf(bool),
    /// Four quadrants one level down.
    Branch {
        /// Level of this node.
        level: u8,
        /// Quadrants in `[nw, ne, sw, se]` order.
        children: [NodeId; 4],
    },
}

impl NodeKey {
    /// Level of the node this key describes.
    pub fn level(&self) -> u8 {
        match self {
            Self::Leaf(_) => 0,
            Self::Branch { level, .. } => *level,
        }
    }
}

/// Interned nodes plus derived per-node data.
#[derive(Clone, Debug, Default)]
pub struct NodeStore {
    nodes: IndexSet<NodeKey>,
    population: Vec<u64>,
    empty: Vec<NodeId>,
    /// `(node, log2 stride)` → centre of `node` advanced `2^stride` generations.
    memo: HashMap<(NodeId, u8), NodeId>,
}

impl NodeStore {
    /// A store holding the two leaf cells.
    pub fn new() -> Self {
        let mut store = Self::default();
        store.leaf(false);
        store.leaf(true);
        store
    }

    /// Number of interned nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether nothing has been interned yet.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of memoized successor results.
    pub fn memo_len(&self) -> usize {
        self.memo.len()
    }

    /// Key of an interned node.
    pub fn key(&self, id: NodeId) -> NodeKey {
        self.nodes[id.index()]
    }

    /// Keys in interning order.
    pub fn keys(&self) -> impl Iterator<Item = &NodeKey> {
        self.nodes.iter()
    }

    /// Level of an interned node.
    pub fn level(&self, id: NodeId) -> u8 {
        self.key(id).level()
    }

    /// Live cells under an interned node.
    pub fn population(&self, id: NodeId) -> u64 {
        self.population[id.index()]
    }

    /// Quadrants of a branch node.
    ///
    /// # Panics
    ///
    /// Panics if `id` is a leaf; callers only descend into nodes of level
    /// one or more.
    pub fn children(&self, id: NodeId) -> [NodeId; 4] {
        match self.key(id) {
            NodeKey::Branch { children, .. } => children,
            NodeKey::Leaf(_) => unreachable!("leaf node {id:?} has no children"),
        }
    }

    /// Intern a key, returning its id and whether it was newly inserted.
    pub fn intern(&mut self, key: NodeKey) -> (NodeId, bool) {
        let (index, inserted) = self.nodes.insert_full(key);
        if inserted {
            let population = match key {
                NodeKey::Leaf(alive) => u64::from(alive),
                NodeKey::Branch { children, .. } => {
                    children.iter().map(|c| self.population[c.index()]).sum()
                }
            };
            self.population.push(population);
        }
        let id = NodeId(u32::try_from(index).expect("node store exceeds u32::MAX entries"));
        (id, inserted)
    }

    /// The leaf cell with the given state.
    pub fn leaf(&mut self, alive: bool) -> NodeId {
        self.intern(NodeKey::Leaf(alive)).0
    }

    /// Intern the node with quadrants `children`.
    pub fn branch(&mut self, children: [NodeId; 4]) -> NodeId {
        let level = self.level(children[0]) + 1;
        debug_assert!(
            children.iter().all(|&c| self.level(c) + 1 == level),
            "quadrants must share one level"
        );
        self.intern(NodeKey::Branch { level, children }).0
    }

    /// The all-dead node of `level`.
    pub fn empty(&mut self, level: u8) -> NodeId {
        while self.empty.len() <= level as usize {
            let next = match self.empty.last() {
                None => self.leaf(false),
                Some(&below) => self.branch([below; 4]),
            };
            self.empty.push(next);
        }
        self.empty[level as usize]
    }

    /// The centred sub-node one level down (level ≥ 2).
    pub fn centre(&mut self, id: NodeId) -> NodeId {
        let [nw, ne, sw, se] = self.children(id);
        let quads = [
            self.children(nw)[3],
            self.children(ne)[2],
            self.children(sw)[1],
            self.children(se)[0],
        ];
        self.branch(quads)
    }

    /// Live cells in the centred sub-node, without interning it.
    pub fn centre_population(&self, id: NodeId) -> u64 {
        let [nw, ne, sw, se] = self.children(id);
        self.population(self.children(nw)[3])
            + self.population(self.children(ne)[2])
            + self.population(self.children(sw)[1])
            + self.population(self.children(se)[0])
    }

    /// Centre of `id` advanced `2^stride` generations.
    ///
    /// Requires `level(id) >= 2` and `stride <= level(id) - 2`. The result
    /// has level `level(id) - 1`.
    pub fn successor(&mut self, id: NodeId, stride: u8) -> NodeId {
        let level = self.level(id);
        debug_assert!(level >= 2, "successor needs a level-2 node");
        debug_assert!(stride <= level - 2, "stride {stride} too large for level {level}");

        if self.population(id) == 0 {
            return self.empty(level - 1);
        }
        if let Some(&hit) = self.memo.get(&(id, stride)) {
            return hit;
        }

        let result = if level == 2 {
            self.base_step(id)
        } else {
            self.recursive_step(id, level, stride)
        };
        self.memo.insert((id, stride), result);
        result
    }

    fn recursive_step(&mut self, id: NodeId, level: u8, stride: u8) -> NodeId {
        let [nw, ne, sw, se] = self.children(id);
        let [_, nw_ne, nw_sw, nw_se] = self.children(nw);
        let [ne_nw, _, ne_sw, ne_se] = self.children(ne);
        let [sw_nw, sw_ne, _, sw_se] = self.children(sw);
        let [se_nw, se_ne, se_sw, _] = self.children(se);

        let grid = [
            nw,
            self.branch([nw_ne, ne_nw, nw_se, ne_sw]),
            ne,
            self.branch([nw_sw, nw_se, sw_nw, sw_ne]),
            self.branch([nw_se, ne_sw, sw_ne, se_nw]),
            self.branch([ne_sw, ne_se, se_nw, se_ne]),
            sw,
            self.branch([sw_ne, se_nw, sw_se, se_sw]),
            se,
        ];

        let full_speed = stride == level - 2;
        let mut inner = [NodeId(0); 9];
        for (slot, &n) in inner.iter_mut().zip(grid.iter()) {
            *slot = if full_speed {
                self.successor(n, level - 3)
            } else {
                self.centre(n)
            };
        }

        let next_stride = if full_speed { level - 3 } else { stride };
        let quads = [
            [inner[0], inner[1], inner[3], inner[4]],
            [inner[1], inner[2], inner[4], inner[5]],
            [inner[3], inner[4], inner[6], inner[7]],
            [inner[4], inner[5], inner[7], inner[8]],
        ];
        let mut out = [NodeId(0); 4];
        for (slot, quad) in out.iter_mut().zip(quads) {
            let joined = self.branch(quad);
            *slot = self.successor(joined, next_stride);
        }
        self.branch(out)
    }

    /// One generation of the 4×4 cells under a level-2 node.
    fn base_step(&mut self, id: NodeId) -> NodeId {
        let mut cells = [[false; 4]; 4];
        for (q, quad) in self.children(id).into_iter().enumerate() {
            for (c, cell) in self.children(quad).into_iter().enumerate() {
                let x = (q % 2) * 2 + c % 2;
                let y = (q / 2) * 2 + c / 2;
                cells[y][x] = matches!(self.key(cell), NodeKey::Leaf(true));
            }
        }
        let mut next = [NodeId(0); 4];
        for (i, slot) in next.iter_mut().enumerate() {
            let x = 1 + i % 2;
            let y = 1 + i / 2;
            *slot = self.leaf(crate::rule::next_state(&cells, x, y));
        }
        self.branch(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_store_holds_two_leaves() {
        let store = NodeStore::new();
        assert_eq!(store.len(), 2);
        assert_eq!(store.key(NodeId(0)), NodeKey::Leaf(false));
        assert_eq!(store.key(NodeId(1)), NodeKey::Leaf(true));
    }

    #[test]
    fn interning_deduplicates() {
        let mut store = NodeStore::new();
        let live = store.leaf(true);
        let dead = store.leaf(false);
        let a = store.branch([live, dead, dead, live]);
        let b = store.branch([live, dead, dead, live]);
        assert_eq!(a, b);
        assert_eq!(store.len(), 3);
        assert_eq!(store.population(a), 2);
        assert_eq!(store.level(a), 1);
    }

    #[test]
    fn empty_nodes_are_cached_per_level() {
        let mut store = NodeStore::new();
        let e3 = store.empty(3);
        assert_eq!(store.level(e3), 3);
        assert_eq!(store.population(e3), 0);
        let before = store.len();
        assert_eq!(store.empty(3), e3);
        assert_eq!(store.len(), before);
    }

    #[test]
    fn block_is_still_life_in_base_step() {
        let mut store = NodeStore::new();
        let live = store.leaf(true);
        let dead = store.leaf(false);
        // 2×2 block in the centre of a 4×4 square.
        let nw = store.branch([dead, dead, dead, live]);
        let ne = store.branch([dead, dead, live, dead]);
        let sw = store.branch([dead, live, dead, dead]);
        let se = store.branch([live, dead, dead, dead]);
        let root = store.branch([nw, ne, sw, se]);
        let next = store.successor(root, 0);
        assert_eq!(store.population(next), 4);
        assert_eq!(store.children(next), [live; 4]);
    }

    #[test]
    fn successor_of_empty_node_is_empty() {
        let mut store = NodeStore::new();
        let e4 = store.empty(4);
        let next = store.successor(e4, 2);
        assert_eq!(next, store.empty(3));
        assert_eq!(store.memo_len(), 0);
    }
}
