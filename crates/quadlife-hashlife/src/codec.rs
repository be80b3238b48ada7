//! Binary snapshot encode/decode.
//!
//! All integers are little-endian. The format is intentionally simple:
//! no compression, no alignment padding, no self-describing schema.
//!
//! ```text
//! [MAGIC "QLIF"] [VERSION u8]
//! [age u64] [origin.x i64] [origin.y i64] [root u32] [node_count u32]
//! [node 0] [node 1] ... [node N-1]
//! ```
//!
//! Each node is a tag byte (`0` dead leaf, `1` live leaf, `2` branch);
//! branches follow the tag with four `u32` child indices. Nodes are
//! written in interning order, so every child index is smaller than the
//! index of the node that refers to it.

use quadlife_core::{EngineError, Point};

use crate::node::{NodeId, NodeKey, NodeStore};
use crate::universe::Universe;

/// Magic bytes at the start of every snapshot.
pub const MAGIC: [u8; 4] = *b"QLIF";

/// Current snapshot format version.
pub const FORMAT_VERSION: u8 = 1;

const TAG_DEAD: u8 = 0;
const TAG_LIVE: u8 = 1;
const TAG_BRANCH: u8 = 2;

// ── Primitive writers ───────────────────────────────────────────

fn write_u8(out: &mut Vec<u8>, v: u8) {
    out.push(v);
}

fn write_u32_le(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_le_bytes());
}

fn write_u64_le(out: &mut Vec<u8>, v: u64) {
    out.extend_from_slice(&v.to_le_bytes());
}

fn write_i64_le(out: &mut Vec<u8>, v: i64) {
    out.extend_from_slice(&v.to_le_bytes());
}

// ── Primitive readers ───────────────────────────────────────────

/// Cursor over a snapshot byte slice.
struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn take<const N: usize>(&mut self, context: &'static str) -> Result<[u8; N], EngineError> {
        let end = self.pos + N;
        let bytes = self
            .buf
            .get(self.pos..end)
            .ok_or(EngineError::Truncated { context })?;
        self.pos = end;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    fn read_u8(&mut self, context: &'static str) -> Result<u8, EngineError> {
        Ok(self.take::<1>(context)?[0])
    }

    fn read_u32_le(&mut self, context: &'static str) -> Result<u32, EngineError> {
        Ok(u32::from_le_bytes(self.take(context)?))
    }

    fn read_u64_le(&mut self, context: &'static str) -> Result<u64, EngineError> {
        Ok(u64::from_le_bytes(self.take(context)?))
    }

    fn read_i64_le(&mut self, context: &'static str) -> Result<i64, EngineError> {
        Ok(i64::from_le_bytes(self.take(context)?))
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }
}

// ── Snapshot encode/decode ──────────────────────────────────────

/// Encode a universe, including every interned node.
pub fn encode(universe: &Universe) -> Vec<u8> {
    let store = &universe.store;
    let mut out = Vec::with_capacity(MAGIC.len() + 1 + 32 + store.len() * 17);
    out.extend_from_slice(&MAGIC);
    write_u8(&mut out, FORMAT_VERSION);

    write_u64_le(&mut out, universe.age);
    write_i64_le(&mut out, universe.origin.x);
    write_i64_le(&mut out, universe.origin.y);
    write_u32_le(&mut out, universe.root.0);
    write_u32_le(&mut out, store.len() as u32);

    for key in store.keys() {
        match key {
            NodeKey::Leaf(false) => write_u8(&mut out, TAG_DEAD),
            NodeKey::Leaf(true) => write_u8(&mut out, TAG_LIVE),
            NodeKey::Branch { children, .. } => {
                write_u8(&mut out, TAG_BRANCH);
                for child in children {
                    write_u32_le(&mut out, child.0);
                }
            }
        }
    }
    out
}

/// Decode and validate a snapshot.
pub fn decode(bytes: &[u8]) -> Result<Universe, EngineError> {
    let mut r = Reader::new(bytes);

    let magic: [u8; 4] = r.take("magic")?;
    if magic != MAGIC {
        return Err(EngineError::InvalidMagic);
    }
    let version = r.read_u8("version")?;
    if version != FORMAT_VERSION {
        return Err(EngineError::UnsupportedVersion { found: version });
    }

    let age = r.read_u64_le("age")?;
    let origin = Point::new(r.read_i64_le("origin")?, r.read_i64_le("origin")?);
    let root = r.read_u32_le("root index")?;
    let count = r.read_u32_le("node count")?;

    // Smallest possible encoding is one tag byte per node.
    if r.remaining() < count as usize {
        return Err(EngineError::Truncated { context: "nodes" });
    }

    let mut store = NodeStore::default();
    for index in 0..count {
        let key = match r.read_u8("node tag")? {
            TAG_DEAD => NodeKey::Leaf(false),
            TAG_LIVE => NodeKey::Leaf(true),
            TAG_BRANCH => {
                let mut children = [NodeId(0); 4];
                for slot in &mut children {
                    let child = r.read_u32_le("child index")?;
                    if child >= index {
                        return Err(EngineError::Corrupt {
                            detail: format!("node {index} refers forward to {child}"),
                        });
                    }
                    *slot = NodeId(child);
                }
                let level = store.level(children[0]);
                if children.iter().any(|&c| store.level(c) != level) {
                    return Err(EngineError::Corrupt {
                        detail: format!("node {index} has quadrants of mixed level"),
                    });
                }
                NodeKey::Branch {
                    level: level + 1,
                    children,
                }
            }
            tag => {
                return Err(EngineError::Corrupt {
                    detail: format!("unknown node tag {tag} at node {index}"),
                })
            }
        };
        let (_, inserted) = store.intern(key);
        if !inserted {
            return Err(EngineError::Corrupt {
                detail: format!("node {index} duplicates an earlier node"),
            });
        }
    }

    if root >= count {
        return Err(EngineError::Corrupt {
            detail: format!("root index {root} out of range for {count} nodes"),
        });
    }
    let root = NodeId(root);
    if store.level(root) < crate::universe::MIN_ROOT_LEVEL {
        return Err(EngineError::Corrupt {
            detail: format!("root level {} below minimum", store.level(root)),
        });
    }
    if r.remaining() != 0 {
        return Err(EngineError::Corrupt {
            detail: format!("{} trailing bytes", r.remaining()),
        });
    }

    Ok(Universe {
        store,
        root,
        origin,
        age,
    })
}
