//! Worker counters and the render-side status report.
//!
//! [`WorkerMetrics`] accumulates over the worker's lifetime and is handed
//! back when the worker thread is joined. [`StatusReport`] is a snapshot of
//! what the render context would display alongside the canvas. Both
//! serialize to JSON for the CLI's `--json` output.

use serde::Serialize;

/// Counters and timings collected by the worker.
///
/// Durations are in microseconds and describe the most recent step.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct WorkerMetrics {
    /// `StepForward` messages applied.
    pub steps_applied: u64,
    /// Generations advanced across all steps.
    pub generations_advanced: u64,
    /// Times the collection policy replaced the handle.
    pub gc_runs: u64,
    /// Nodes released by those runs.
    pub nodes_reclaimed: u64,
    /// Inputs that failed to load and were replaced by an empty handle.
    pub load_failures: u64,
    /// Wire frames dropped because they did not decode.
    pub frames_dropped: u64,
    /// Time spent advancing, in microseconds.
    pub last_step_us: u64,
    /// Time spent in the policy plus the transfer copy, in microseconds.
    pub last_prune_us: u64,
    /// Time spent serializing, in microseconds.
    pub last_serialize_us: u64,
}

/// Render-side readout.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StatusReport {
    /// Live cells in the canonical handle.
    pub live_cells: u64,
    /// Node count reported with the last applied result.
    pub worker_nodes: u64,
    /// Node count of the canonical handle.
    pub canonical_nodes: u64,
    /// Age of the canonical handle.
    pub age: u64,
    /// Memory the current budget corresponds to, in MiB.
    pub memory_budget_mib: f64,
    /// Brightness multiplier.
    pub brightness: f64,
    /// Generations requested per step.
    pub steps_per_frame: u64,
    /// Target step requests per second.
    pub frames_per_second: f64,
    /// World cells per device pixel.
    pub zoom_ratio: f64,
    /// Whether stepping is paused.
    pub paused: bool,
    /// Results dropped because their input had been superseded.
    pub stale_results: u64,
}
