//! Drive a session without a display.

use std::thread;
use std::time::{Duration, Instant};

use quadlife_core::Engine;
use quadlife_runtime::{Export, Poll, Session, SessionConfig, SessionError, StatusReport, WorkerMetrics};

/// How long to block for a worker reply before re-polling.
const REPLY_WAIT: Duration = Duration::from_millis(250);

/// Final state of a headless run.
#[derive(Debug)]
pub struct Outcome {
    /// Readout once the target age was reached.
    pub status: StatusReport,
    /// The canonical handle as `{name}.{age}` text.
    pub export: Export,
    /// Worker counters, if the worker was joined.
    pub worker: Option<WorkerMetrics>,
}

/// Run `config` until the canonical handle's age reaches `target_age`.
///
/// Pacing is honoured: requests go out no faster than the configured
/// frame rate, `2^speed_exponent` generations at a time. The age may
/// overshoot `target_age` by less than one batch.
pub fn run<E: Engine>(config: SessionConfig, target_age: u64) -> Result<Outcome, SessionError> {
    let mut session = Session::<E>::new(config)?;
    let mut last_logged = 0;
    while session.status().age < target_age {
        match session.pump(Instant::now())? {
            Poll::Wait(remaining) => thread::sleep(remaining),
            Poll::Send(_) | Poll::Idle => {
                session.wait_for_reply(REPLY_WAIT)?;
            }
        }
        let age = session.status().age;
        if age != last_logged {
            tracing::debug!(age, target_age, "advanced");
            last_logged = age;
        }
    }

    let status = session.status();
    let export = session.export();
    let report = session.shutdown();
    tracing::info!(
        age = status.age,
        live_cells = status.live_cells,
        shutdown_ms = report.total_ms,
        "headless run finished"
    );
    Ok(Outcome {
        status,
        export,
        worker: report.worker_metrics,
    })
}
