//! User-facing `Session` API and shutdown state machine.
//!
//! A session owns the render-side [`Controller`] and a worker thread
//! running the [`Orchestrator`](crate::worker::Orchestrator). The two
//! share nothing; every interaction is a [`Message`] on a bounded
//! channel.
//!
//! # Architecture
//!
//! ```text
//! Render context (caller)                    Worker thread
//!     |                                           |
//!     |                      [reply: bounded(N)]  |--Ready
//!     |--pump(now)                                |
//!     |   reply_rx.try_recv() ------------------> |
//!     |   controller.handle_worker_message()      |
//!     |   controller.poll(now) → StepForward      |
//!     |   outbox → [request: bounded(N)] -------->| req_rx.recv()
//!     |                                           | orchestrator.process()
//!     |<--SerializedResult------------------------| advance, GC, prune, serialize
//!     |--frame(surface)                           |
//!     |   render loop (dirty flag)                |
//! ```
//!
//! Messages the controller emits go through an outbox. When the request
//! channel is full they wait there and are retried on the next pump, so a
//! full channel never drops a `SetInput` or a `StepForward`.

use std::collections::VecDeque;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError, TrySendError};
use quadlife_core::Engine;

use crate::config::{ConfigError, SessionConfig};
use crate::controller::{ControlEvent, Controller, Export, Poll};
use crate::error::SessionError;
use crate::metrics::{StatusReport, WorkerMetrics};
use crate::protocol::Message;
use crate::render::{RenderLoop, Surface};
use crate::source::PatternSource;
use crate::worker::WorkerThread;

// ── ShutdownReport ───────────────────────────────────────────────

/// Report from the shutdown state machine.
#[derive(Debug)]
pub struct ShutdownReport {
    /// Total time spent in the shutdown sequence.
    pub total_ms: u64,
    /// Whether the worker thread was joined successfully.
    pub worker_joined: bool,
    /// Counters recovered from the worker, if it was joined.
    pub worker_metrics: Option<WorkerMetrics>,
}

// ── ShutdownState ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ShutdownState {
    Running,
    Draining,
    Stopped,
}

// ── Outbox ───────────────────────────────────────────────────────

/// Requests accepted from the controller but not yet taken by the
/// request channel.
///
/// A newer `SetInput` or `SetBudget` replaces a queued one of the same
/// kind, so the queue holds at most one of each plus the single
/// outstanding `StepForward`.
#[derive(Debug, Default)]
struct Outbox {
    queue: VecDeque<Message>,
}

impl Outbox {
    fn push(&mut self, msg: Message) {
        if matches!(msg, Message::SetInput { .. } | Message::SetBudget { .. }) {
            let tag = msg.tag();
            self.queue.retain(|queued| queued.tag() != tag);
        }
        self.queue.push_back(msg);
    }

    fn queue_all(&mut self, msgs: Vec<Message>) {
        msgs.into_iter().for_each(|msg| self.push(msg));
    }

    /// Move queued requests into `tx`, in order, until it is full.
    fn flush(&mut self, tx: &Sender<Message>) -> Result<(), SessionError> {
        while let Some(msg) = self.queue.pop_front() {
            tracing::trace!(tag = msg.tag(), "to worker");
            match tx.try_send(msg) {
                Ok(()) => {}
                Err(TrySendError::Full(msg)) => {
                    tracing::debug!(queued = self.queue.len() + 1, "request channel full");
                    self.queue.push_front(msg);
                    return Ok(());
                }
                Err(TrySendError::Disconnected(_)) => return Err(SessionError::Disconnected),
            }
        }
        Ok(())
    }
}

// ── Session ──────────────────────────────────────────────────────

/// A running simulation: controller, render loop and worker thread.
pub struct Session<E: Engine> {
    controller: Controller<E>,
    render_loop: RenderLoop,
    request_tx: Option<Sender<Message>>,
    outbox: Outbox,
    reply_rx: Receiver<Message>,
    worker: Option<JoinHandle<WorkerMetrics>>,
    state: ShutdownState,
}

impl<E: Engine> Session<E> {
    /// Validate `config`, build the canonical handle and spawn the worker.
    pub fn new(config: SessionConfig) -> Result<Self, SessionError> {
        let controller = Controller::new(&config)?;

        let (request_tx, request_rx) = crossbeam_channel::bounded(config.channel_capacity);
        let (reply_tx, reply_rx) = crossbeam_channel::bounded(config.channel_capacity);

        let worker = thread::Builder::new()
            .name("quadlife-worker".into())
            .spawn(move || WorkerThread::<E>::new(request_rx, reply_tx).run())
            .map_err(|e| ConfigError::ThreadSpawnFailed {
                reason: e.to_string(),
            })?;

        tracing::info!(
            canvas_width = config.canvas_width,
            canvas_height = config.canvas_height,
            gc_exponent = config.gc_threshold_exponent,
            "session started"
        );
        Ok(Self {
            controller,
            render_loop: RenderLoop::new(),
            request_tx: Some(request_tx),
            outbox: Outbox::default(),
            reply_rx,
            worker: Some(worker),
            state: ShutdownState::Running,
        })
    }

    /// Apply a user input and forward any resulting messages.
    pub fn apply(&mut self, event: ControlEvent) -> Result<(), SessionError> {
        let out = self.controller.apply(event)?;
        self.outbox.queue_all(out);
        self.flush()
    }

    /// Fetch `name` from `source` and load it.
    ///
    /// A failed fetch leaves the session unchanged.
    pub fn load_from<S: PatternSource + ?Sized>(
        &mut self,
        source: &S,
        name: &str,
    ) -> Result<(), SessionError> {
        let text = source.fetch(name).inspect_err(|e| {
            tracing::warn!(name, error = %e, "pattern fetch failed");
        })?;
        self.apply(ControlEvent::LoadPattern {
            name: name.to_string(),
            text,
        })
    }

    /// Drain worker replies, then run pacing.
    ///
    /// Never blocks. Returns the pacing decision so the caller can
    /// schedule its next pump.
    pub fn pump(&mut self, now: Instant) -> Result<Poll, SessionError> {
        self.flush()?;
        loop {
            match self.reply_rx.try_recv() {
                Ok(msg) => self.dispatch(msg)?,
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => return Err(SessionError::Disconnected),
            }
        }
        let poll = self.controller.poll(now);
        if let Poll::Send(msg) = &poll {
            self.outbox.push(msg.clone());
        }
        self.flush()?;
        Ok(poll)
    }

    /// Block up to `timeout` for one worker reply and apply it.
    ///
    /// Returns whether a reply arrived. For headless drivers that have
    /// nothing else to do between steps.
    pub fn wait_for_reply(&mut self, timeout: Duration) -> Result<bool, SessionError> {
        match self.reply_rx.recv_timeout(timeout) {
            Ok(msg) => {
                self.dispatch(msg)?;
                Ok(true)
            }
            Err(RecvTimeoutError::Timeout) => Ok(false),
            Err(RecvTimeoutError::Disconnected) => Err(SessionError::Disconnected),
        }
    }

    /// Run one render-loop frame.
    pub fn frame<S: Surface + ?Sized>(&mut self, surface: &mut S) -> bool {
        self.render_loop.frame(&mut self.controller, surface)
    }

    /// Current readout.
    pub fn status(&self) -> StatusReport {
        self.controller.status()
    }

    /// Export the canonical handle.
    pub fn export(&self) -> Export {
        self.controller.export()
    }

    /// The render-side controller.
    pub fn controller(&self) -> &Controller<E> {
        &self.controller
    }

    /// Render-loop counters.
    pub fn render_loop(&self) -> &RenderLoop {
        &self.render_loop
    }

    fn dispatch(&mut self, msg: Message) -> Result<(), SessionError> {
        let out = self.controller.handle_worker_message(msg);
        self.outbox.queue_all(out);
        self.flush()
    }

    fn flush(&mut self) -> Result<(), SessionError> {
        let tx = self.request_tx.as_ref().ok_or(SessionError::Disconnected)?;
        self.outbox.flush(tx)
    }

    /// Stop the worker.
    ///
    /// 1. **Running → Draining:** drop the request channel; the worker
    ///    finishes the message in hand and leaves its loop.
    /// 2. **Draining → Stopped:** drain pending replies so the worker is
    ///    never blocked on a full reply channel, then join it.
    pub fn shutdown(&mut self) -> ShutdownReport {
        if self.state == ShutdownState::Stopped {
            return ShutdownReport {
                total_ms: 0,
                worker_joined: true,
                worker_metrics: None,
            };
        }
        let start = Instant::now();

        self.state = ShutdownState::Draining;
        self.request_tx.take();

        let mut worker_metrics = None;
        let mut worker_joined = true;
        if let Some(handle) = self.worker.take() {
            while !handle.is_finished() {
                if self.reply_rx.recv_timeout(Duration::from_millis(1)).is_ok() {
                    tracing::trace!("discarding reply during shutdown");
                }
            }
            match handle.join() {
                Ok(metrics) => worker_metrics = Some(metrics),
                Err(_) => {
                    tracing::error!("worker thread panicked");
                    worker_joined = false;
                }
            }
        }
        self.state = ShutdownState::Stopped;

        let total_ms = start.elapsed().as_millis() as u64;
        tracing::info!(total_ms, worker_joined, "session stopped");
        ShutdownReport {
            total_ms,
            worker_joined,
            worker_metrics,
        }
    }
}

impl<E: Engine> Drop for Session<E> {
    fn drop(&mut self) {
        if self.state != ShutdownState::Stopped {
            self.shutdown();
        }
    }
}
