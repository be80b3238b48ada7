//! Node-count budget and the prune-on-overflow policy.
//!
//! A handle is over budget when `node_count > 0.9 * threshold`. The
//! policy replaces an over-budget handle with its pruned copy and
//! releases the original; under budget it does nothing at all.

use quadlife_core::Engine;

/// Fraction of the threshold at which pruning starts.
pub const TRIGGER_FRACTION: f64 = 0.9;

/// Approximate bytes held per node, used for the memory estimate.
pub const BYTES_PER_NODE: u64 = 112 + 3 * 8;

/// Node-count budget owned by the worker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GcBudget {
    threshold: u64,
}

impl GcBudget {
    /// A budget that never triggers. The worker starts with this until
    /// the render context sends its first `SetBudget`.
    pub const UNBOUNDED: Self = Self {
        threshold: u64::MAX,
    };

    /// A budget of `threshold` nodes.
    pub fn new(threshold: u64) -> Self {
        Self { threshold }
    }

    /// A budget of `2^exponent` nodes. Exponents of 64 and above saturate.
    pub fn from_exponent(exponent: u32) -> Self {
        Self::new(1u64.checked_shl(exponent).unwrap_or(u64::MAX))
    }

    /// Node-count threshold.
    pub fn threshold(&self) -> u64 {
        self.threshold
    }

    /// Node count above which the policy prunes.
    pub fn trigger_at(&self) -> f64 {
        TRIGGER_FRACTION * self.threshold as f64
    }

    /// Whether `node_count` exceeds the trigger.
    pub fn is_over(&self, node_count: u64) -> bool {
        node_count as f64 > self.trigger_at()
    }

    /// Memory the threshold corresponds to, in MiB.
    pub fn approx_memory_mib(&self) -> f64 {
        self.threshold as f64 * BYTES_PER_NODE as f64 / f64::from(1u32 << 20)
    }
}

impl Default for GcBudget {
    fn default() -> Self {
        Self::UNBOUNDED
    }
}

/// What [`enforce`] did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GcOutcome {
    /// Under budget; the handle was left untouched.
    Skipped,
    /// The handle was replaced by its pruned copy.
    Pruned {
        /// Node count before pruning.
        before: u64,
        /// Node count after pruning.
        after: u64,
    },
}

impl GcOutcome {
    /// Nodes released by this run.
    pub fn reclaimed(&self) -> u64 {
        match self {
            Self::Skipped => 0,
            Self::Pruned { before, after } => before.saturating_sub(*after),
        }
    }
}

/// Apply the policy to `handle`.
///
/// When over budget the pruned copy takes the handle's place and the old
/// handle is dropped here, before returning.
pub fn enforce<E: Engine>(budget: &GcBudget, handle: &mut E) -> GcOutcome {
    let before = handle.node_count();
    if !budget.is_over(before) {
        return GcOutcome::Skipped;
    }
    let pruned = handle.prune();
    drop(std::mem::replace(handle, pruned));
    let after = handle.node_count();
    tracing::info!(before, after, threshold = budget.threshold, "gc pruned handle");
    GcOutcome::Pruned { before, after }
}
