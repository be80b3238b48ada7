//! Test utilities and mock engine for Quadlife development.
//!
//! [`MockEngine`] implements [`Engine`] with scripted node growth so the
//! worker's collection policy and handle lifecycle can be tested without
//! a real simulation. Every handle belongs to a [`Ledger`] that counts
//! creations, releases and steps across both execution contexts.
//!
//! A script is carried in pattern text as a `#mock` comment line, so the
//! same text loads through the normal pattern path:
//!
//! ```text
//! #mock tag=7 nodes=100 growth=50 prune_to=10 alive=3
//! x = 4, y = 4, rule = B3/S23
//! !
//! ```

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

pub use fixtures::{BLINKER_RLE, BLOCK_RLE, GLIDER_RLE, HEADERLESS_TEXT, SPACESHIP_RLE};

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

use quadlife_core::{Engine, EngineError, PatternError, PatternHeader, PixelBuffer, RenderWindow};

// ── Ledger ──────────────────────────────────────────────────────

/// Lifecycle counters shared by every handle with the same tag.
#[derive(Debug, Default)]
pub struct Ledger {
    created: AtomicU64,
    released: AtomicU64,
    generations: AtomicU64,
    step_calls: AtomicU64,
    prunes: AtomicU64,
}

impl Ledger {
    pub fn created(&self) -> u64 {
        self.created.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> u64 {
        self.released.load(Ordering::SeqCst)
    }

    /// Handles created and not yet released.
    pub fn live(&self) -> u64 {
        self.created() - self.released()
    }

    /// Total generations requested through [`Engine::step`].
    pub fn generations(&self) -> u64 {
        self.generations.load(Ordering::SeqCst)
    }

    pub fn step_calls(&self) -> u64 {
        self.step_calls.load(Ordering::SeqCst)
    }

    pub fn prunes(&self) -> u64 {
        self.prunes.load(Ordering::SeqCst)
    }
}

fn ledgers() -> &'static Mutex<HashMap<u64, Arc<Ledger>>> {
    static LEDGERS: OnceLock<Mutex<HashMap<u64, Arc<Ledger>>>> = OnceLock::new();
    LEDGERS.get_or_init(Default::default)
}

fn ledger_for(tag: u64) -> Arc<Ledger> {
    let mut map = ledgers().lock().expect("ledger registry poisoned");
    Arc::clone(map.entry(tag).or_default())
}

// ── Script ──────────────────────────────────────────────────────

/// Parameters of a mock handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MockScript {
    /// Ledger key. Unique per [`MockScript::new`].
    pub tag: u64,
    /// Node count right after loading.
    pub nodes: u64,
    /// Nodes added by every `step` call.
    pub growth: u64,
    /// Node count of a pruned copy.
    pub prune_to: u64,
    /// Reported live cells.
    pub alive: u64,
}

impl MockScript {
    /// A script with a fresh tag: 10 nodes, growing 10 per step, pruning to 5.
    pub fn new() -> Self {
        static NEXT_TAG: AtomicU64 = AtomicU64::new(1);
        Self {
            tag: NEXT_TAG.fetch_add(1, Ordering::SeqCst),
            nodes: 10,
            growth: 10,
            prune_to: 5,
            alive: 1,
        }
    }

    pub fn nodes(mut self, nodes: u64) -> Self {
        self.nodes = nodes;
        self
    }

    pub fn growth(mut self, growth: u64) -> Self {
        self.growth = growth;
        self
    }

    pub fn prune_to(mut self, prune_to: u64) -> Self {
        self.prune_to = prune_to;
        self
    }

    pub fn alive(mut self, alive: u64) -> Self {
        self.alive = alive;
        self
    }

    /// Counters for every handle built from this script.
    pub fn ledger(&self) -> Arc<Ledger> {
        ledger_for(self.tag)
    }

    /// Pattern text that loads as this script.
    pub fn text(&self) -> String {
        format!(
            "#mock tag={} nodes={} growth={} prune_to={} alive={}\nx = 4, y = 4, rule = B3/S23\n!\n",
            self.tag, self.nodes, self.growth, self.prune_to, self.alive
        )
    }

    /// A handle built directly from this script.
    pub fn build(&self) -> MockEngine {
        MockEngine::with(*self, self.nodes, 0)
    }

    fn from_comment(text: &str) -> Option<Self> {
        let line = text.lines().find_map(|l| l.trim().strip_prefix("#mock"))?;
        let mut script = Self {
            tag: 0,
            nodes: 10,
            growth: 10,
            prune_to: 5,
            alive: 1,
        };
        for pair in line.split_whitespace() {
            let (key, value) = pair.split_once('=')?;
            let value: u64 = value.parse().ok()?;
            match key {
                "tag" => script.tag = value,
                "nodes" => script.nodes = value,
                "growth" => script.growth = value,
                "prune_to" => script.prune_to = value,
                "alive" => script.alive = value,
                _ => return None,
            }
        }
        Some(script)
    }
}

impl Default for MockScript {
    fn default() -> Self {
        Self::new()
    }
}

// ── MockEngine ──────────────────────────────────────────────────

const SNAPSHOT_LEN: usize = 7 * 8;

/// Scripted [`Engine`] implementation.
#[derive(Debug)]
pub struct MockEngine {
    script: MockScript,
    nodes: u64,
    age: u64,
    ledger: Arc<Ledger>,
}

impl MockEngine {
    fn with(script: MockScript, nodes: u64, age: u64) -> Self {
        let ledger = ledger_for(script.tag);
        ledger.created.fetch_add(1, Ordering::SeqCst);
        Self {
            script,
            nodes,
            age,
            ledger,
        }
    }

    pub fn script(&self) -> MockScript {
        self.script
    }

    pub fn ledger(&self) -> &Arc<Ledger> {
        &self.ledger
    }
}

impl Drop for MockEngine {
    fn drop(&mut self) {
        self.ledger.released.fetch_add(1, Ordering::SeqCst);
    }
}

impl Engine for MockEngine {
    fn from_text(text: &str) -> Result<Self, PatternError> {
        PatternHeader::parse(text)?;
        let script = MockScript::from_comment(text).unwrap_or(MockScript {
            tag: 0,
            nodes: 10,
            growth: 10,
            prune_to: 5,
            alive: 1,
        });
        Ok(script.build())
    }

    fn empty() -> Self {
        MockScript {
            tag: 0,
            nodes: 3,
            growth: 0,
            prune_to: 3,
            alive: 0,
        }
        .build()
    }

    fn step(&mut self, generations: u64) {
        self.age += generations;
        self.nodes += self.script.growth;
        self.ledger.generations.fetch_add(generations, Ordering::SeqCst);
        self.ledger.step_calls.fetch_add(1, Ordering::SeqCst);
    }

    fn node_count(&self) -> u64 {
        self.nodes
    }

    fn alive_count(&self) -> u64 {
        self.script.alive
    }

    fn age(&self) -> u64 {
        self.age
    }

    fn prune(&self) -> Self {
        self.ledger.prunes.fetch_add(1, Ordering::SeqCst);
        Self::with(self.script, self.script.prune_to.min(self.nodes), self.age)
    }

    fn serialize(&self) -> Vec<u8> {
        let s = &self.script;
        let mut out = Vec::with_capacity(SNAPSHOT_LEN);
        for v in [s.tag, s.nodes, s.growth, s.prune_to, s.alive, self.nodes, self.age] {
            out.extend_from_slice(&v.to_le_bytes());
        }
        out
    }

    fn deserialize(bytes: &[u8]) -> Result<Self, EngineError> {
        if bytes.len() != SNAPSHOT_LEN {
            return Err(EngineError::Truncated {
                context: "mock snapshot",
            });
        }
        let mut words = bytes
            .chunks_exact(8)
            .map(|c| u64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]));
        let mut next = || words.next().unwrap_or(0);
        let script = MockScript {
            tag: next(),
            nodes: next(),
            growth: next(),
            prune_to: next(),
            alive: next(),
        };
        let nodes = next();
        let age = next();
        Ok(Self::with(script, nodes, age))
    }

    fn render_window(&self, window: &RenderWindow) -> PixelBuffer {
        let shade = self.script.alive.min(255) as u8;
        let samples = vec![shade; window.width as usize * window.height as usize];
        PixelBuffer::from_gray(&samples, window.width as usize, window.cell_size as usize)
    }

    fn to_text(&self) -> String {
        self.script.text()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ledger_counts_every_release() {
        let script = MockScript::new();
        let ledger = script.ledger();
        {
            let a = MockEngine::from_text(&script.text()).unwrap();
            let b = MockEngine::deserialize(&a.serialize()).unwrap();
            let c = b.prune();
            assert_eq!(ledger.live(), 3);
            drop((a, b, c));
        }
        assert_eq!(ledger.created(), 3);
        assert_eq!(ledger.released(), 3);
    }

    #[test]
    fn step_grows_by_script() {
        let mut e = MockScript::new().nodes(100).growth(7).build();
        e.step(4);
        e.step(4);
        assert_eq!(e.node_count(), 114);
        assert_eq!(e.age(), 8);
        assert_eq!(e.ledger().generations(), 8);
        assert_eq!(e.ledger().step_calls(), 2);
    }

    #[test]
    fn snapshot_carries_state() {
        let mut e = MockScript::new().prune_to(2).build();
        e.step(3);
        let back = MockEngine::deserialize(&e.serialize()).unwrap();
        assert_eq!(back.node_count(), e.node_count());
        assert_eq!(back.age(), 3);
        assert_eq!(back.prune().node_count(), 2);
    }

    #[test]
    fn text_without_header_is_rejected() {
        assert!(MockEngine::from_text(HEADERLESS_TEXT).is_err());
    }
}
