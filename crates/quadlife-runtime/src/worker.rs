//! Stepping orchestrator and the worker thread loop.
//!
//! The worker thread owns an [`Orchestrator`] exclusively (moved in via
//! `thread::Builder::spawn`). Requests arrive on a bounded crossbeam
//! channel and are processed one at a time, in arrival order; each
//! `StepForward` produces exactly one `SerializedResult` on the reply
//! channel.
//!
//! [`serve_lines`] runs the same orchestrator over newline-delimited JSON
//! for a worker living in another process. Frames that fail to decode are
//! logged and skipped.

use std::io::{self, BufRead, Write};
use std::time::Instant;

use crossbeam_channel::{Receiver, Sender};
use quadlife_core::{Engine, InputGeneration};

use crate::gc::{self, GcBudget, GcOutcome};
use crate::metrics::WorkerMetrics;
use crate::protocol::{Direction, Message};

/// Worker-side state: the working handle and its budget.
///
/// The handle always exists. Before the first `SetInput`, and after an
/// input that fails to load, it is an empty handle.
pub struct Orchestrator<E: Engine> {
    handle: E,
    generation: InputGeneration,
    budget: GcBudget,
    metrics: WorkerMetrics,
}

impl<E: Engine> Orchestrator<E> {
    /// An orchestrator holding an empty handle and an unbounded budget.
    pub fn new() -> Self {
        Self {
            handle: E::empty(),
            generation: InputGeneration::default(),
            budget: GcBudget::UNBOUNDED,
            metrics: WorkerMetrics::default(),
        }
    }

    /// The working handle.
    pub fn handle(&self) -> &E {
        &self.handle
    }

    /// Generation of the input the working handle descends from.
    pub fn generation(&self) -> InputGeneration {
        self.generation
    }

    /// Current budget.
    pub fn budget(&self) -> GcBudget {
        self.budget
    }

    /// Counters so far.
    pub fn metrics(&self) -> &WorkerMetrics {
        &self.metrics
    }

    /// Process one message, returning the reply if it has one.
    pub fn process(&mut self, msg: Message) -> Option<Message> {
        match msg {
            Message::SetInput { generation, text } => {
                self.set_input(generation, &text);
                None
            }
            Message::StepForward { amount } => Some(self.step_forward(amount)),
            Message::SetBudget { amount } => {
                self.set_budget(GcBudget::new(amount));
                None
            }
            Message::Ready | Message::SerializedResult { .. } => {
                debug_assert_eq!(msg.direction(), Direction::ToRender);
                tracing::warn!(tag = msg.tag(), "worker ignoring message addressed to render");
                None
            }
        }
    }

    /// Process one JSON frame, returning the encoded reply if it has one.
    ///
    /// A frame with an unknown tag, no tag or a bad payload is logged,
    /// counted in [`WorkerMetrics::frames_dropped`] and otherwise ignored.
    pub fn process_frame(&mut self, frame: &str) -> Option<String> {
        let msg = match Message::from_json(frame) {
            Ok(msg) => msg,
            Err(e) => {
                tracing::warn!(error = %e, "worker dropping frame");
                self.metrics.frames_dropped += 1;
                return None;
            }
        };
        let reply = self.process(msg)?;
        match reply.to_json() {
            Ok(frame) => Some(frame),
            Err(e) => {
                tracing::error!(tag = reply.tag(), error = %e, "failed to encode reply");
                None
            }
        }
    }

    fn set_input(&mut self, generation: InputGeneration, text: &str) {
        self.generation = generation;
        self.handle = match E::from_text(text) {
            Ok(handle) => {
                tracing::debug!(%generation, nodes = handle.node_count(), "worker loaded input");
                handle
            }
            Err(e) => {
                tracing::error!(%generation, error = %e, "worker failed to load input");
                self.metrics.load_failures += 1;
                E::empty()
            }
        };
    }

    fn set_budget(&mut self, budget: GcBudget) {
        tracing::debug!(threshold = budget.threshold(), "worker budget updated");
        self.budget = budget;
        self.collect();
    }

    fn collect(&mut self) {
        if let outcome @ GcOutcome::Pruned { .. } = gc::enforce(&self.budget, &mut self.handle) {
            self.metrics.gc_runs += 1;
            self.metrics.nodes_reclaimed += outcome.reclaimed();
        }
    }

    fn step_forward(&mut self, amount: u64) -> Message {
        let start = Instant::now();
        self.handle.step(amount);
        let stepped = Instant::now();
        self.metrics.last_step_us = stepped.duration_since(start).as_micros() as u64;

        self.collect();
        let transfer = self.handle.prune();
        let pruned = Instant::now();
        self.metrics.last_prune_us = pruned.duration_since(stepped).as_micros() as u64;

        let bytes = transfer.serialize();
        drop(transfer);
        self.metrics.last_serialize_us = pruned.elapsed().as_micros() as u64;

        self.metrics.steps_applied += 1;
        self.metrics.generations_advanced += amount;
        Message::SerializedResult {
            generation: self.generation,
            bytes,
            node_count: self.handle.node_count(),
        }
    }
}

impl<E: Engine> Default for Orchestrator<E> {
    fn default() -> Self {
        Self::new()
    }
}

// ── Thread loop ─────────────────────────────────────────────────

/// State held by the worker thread's main loop.
pub(crate) struct WorkerThread<E: Engine> {
    orchestrator: Orchestrator<E>,
    requests: Receiver<Message>,
    replies: Sender<Message>,
}

impl<E: Engine> WorkerThread<E> {
    pub fn new(requests: Receiver<Message>, replies: Sender<Message>) -> Self {
        Self {
            orchestrator: Orchestrator::new(),
            requests,
            replies,
        }
    }

    /// Main loop. Runs until the request channel disconnects or the reply
    /// channel is dropped.
    ///
    /// Consumes self; the working handle is released on return and the
    /// metrics are handed back through the `JoinHandle`.
    pub fn run(mut self) -> WorkerMetrics {
        if self.replies.send(Message::Ready).is_err() {
            return self.orchestrator.metrics;
        }
        while let Ok(msg) = self.requests.recv() {
            if let Some(reply) = self.orchestrator.process(msg) {
                if self.replies.send(reply).is_err() {
                    tracing::debug!("render side gone, worker stopping");
                    break;
                }
            }
        }
        self.orchestrator.metrics
    }
}

// ── Line transport ──────────────────────────────────────────────

/// Serve the worker side of the protocol over newline-delimited JSON.
///
/// Writes `Ready`, then answers each request line until `input` ends.
/// Blank lines are skipped. Returns the worker's counters.
pub fn serve_lines<E: Engine, R: BufRead, W: Write>(
    input: R,
    mut output: W,
) -> io::Result<WorkerMetrics> {
    let mut orchestrator = Orchestrator::<E>::new();
    let ready = Message::Ready.to_json().map_err(io::Error::other)?;
    writeln!(output, "{ready}")?;
    output.flush()?;
    for line in input.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        if let Some(reply) = orchestrator.process_frame(&line) {
            writeln!(output, "{reply}")?;
            output.flush()?;
        }
    }
    tracing::debug!(
        steps = orchestrator.metrics.steps_applied,
        dropped = orchestrator.metrics.frames_dropped,
        "line transport closed"
    );
    Ok(orchestrator.metrics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quadlife_test_utils::{MockEngine, MockScript};

    fn load(orch: &mut Orchestrator<MockEngine>, script: &MockScript, generation: u64) {
        let reply = orch.process(Message::SetInput {
            generation: InputGeneration(generation),
            text: script.text(),
        });
        assert!(reply.is_none());
    }

    #[test]
    fn step_replies_with_stamped_snapshot() {
        let script = MockScript::new().nodes(100).growth(10);
        let mut orch = Orchestrator::<MockEngine>::new();
        load(&mut orch, &script, 7);
        let reply = orch.process(Message::StepForward { amount: 2 }).unwrap();
        let Message::SerializedResult {
            generation,
            bytes,
            node_count,
        } = reply
        else {
            panic!("expected a result");
        };
        assert_eq!(generation, InputGeneration(7));
        assert_eq!(node_count, 110);
        let mirror = MockEngine::deserialize(&bytes).unwrap();
        assert_eq!(mirror.age(), 2);
        assert_eq!(script.ledger().generations(), 2);
    }

    #[test]
    fn transfer_copy_is_released_and_working_handle_kept() {
        let script = MockScript::new().nodes(100).growth(10);
        let ledger = script.ledger();
        let mut orch = Orchestrator::<MockEngine>::new();
        load(&mut orch, &script, 1);
        for _ in 0..5 {
            orch.process(Message::StepForward { amount: 2 });
        }
        assert_eq!(ledger.live(), 1);
        assert_eq!(ledger.prunes(), 5);
        assert_eq!(orch.handle().node_count(), 150);
    }

    #[test]
    fn step_over_budget_prunes_working_handle() {
        let script = MockScript::new().nodes(900_000).growth(50_000).prune_to(1_000);
        let mut orch = Orchestrator::<MockEngine>::new();
        load(&mut orch, &script, 1);
        orch.process(Message::SetBudget { amount: 1 << 20 });
        assert_eq!(orch.metrics().gc_runs, 0);

        let reply = orch.process(Message::StepForward { amount: 2 });
        assert!(matches!(
            reply,
            Some(Message::SerializedResult {
                node_count: 1_000,
                ..
            })
        ));
        assert_eq!(orch.metrics().gc_runs, 1);
        assert_eq!(orch.metrics().nodes_reclaimed, 949_000);
    }

    #[test]
    fn shrinking_budget_prunes_immediately() {
        let script = MockScript::new().nodes(5_000).prune_to(10);
        let mut orch = Orchestrator::<MockEngine>::new();
        load(&mut orch, &script, 1);
        assert!(orch.process(Message::SetBudget { amount: 1_000 }).is_none());
        assert_eq!(orch.handle().node_count(), 10);
        assert_eq!(orch.metrics().gc_runs, 1);
    }

    #[test]
    fn failed_input_falls_back_to_empty_handle() {
        let mut orch = Orchestrator::<MockEngine>::new();
        orch.process(Message::SetInput {
            generation: InputGeneration(4),
            text: "no header".into(),
        });
        assert_eq!(orch.metrics().load_failures, 1);
        assert_eq!(orch.handle().alive_count(), 0);
        assert!(matches!(
            orch.process(Message::StepForward { amount: 2 }),
            Some(Message::SerializedResult { generation: InputGeneration(4), .. })
        ));
    }

    #[test]
    fn misdirected_messages_are_ignored() {
        let mut orch = Orchestrator::<MockEngine>::new();
        assert!(orch.process(Message::Ready).is_none());
        assert!(orch
            .process(Message::SerializedResult {
                generation: InputGeneration(1),
                bytes: vec![],
                node_count: 0,
            })
            .is_none());
        assert_eq!(orch.metrics().steps_applied, 0);
    }

    #[test]
    fn thread_loop_announces_ready_and_answers_each_step() {
        let (req_tx, req_rx) = crossbeam_channel::bounded(8);
        let (rep_tx, rep_rx) = crossbeam_channel::bounded(8);
        let script = MockScript::new();
        let handle = std::thread::spawn(move || {
            WorkerThread::<MockEngine>::new(req_rx, rep_tx).run()
        });
        assert_eq!(rep_rx.recv().unwrap(), Message::Ready);
        req_tx
            .send(Message::SetInput {
                generation: InputGeneration(1),
                text: script.text(),
            })
            .unwrap();
        req_tx.send(Message::StepForward { amount: 4 }).unwrap();
        req_tx.send(Message::StepForward { amount: 4 }).unwrap();
        for _ in 0..2 {
            assert_eq!(rep_rx.recv().unwrap().tag(), "serialized_result");
        }
        drop(req_tx);
        let metrics = handle.join().unwrap();
        assert_eq!(metrics.steps_applied, 2);
        assert_eq!(metrics.generations_advanced, 8);
        assert_eq!(script.ledger().live(), 0);
    }

    #[test]
    fn unknown_frame_is_dropped_and_next_frame_processed() {
        let script = MockScript::new();
        let mut orch = Orchestrator::<MockEngine>::new();
        let set_input = Message::SetInput {
            generation: InputGeneration(2),
            text: script.text(),
        }
        .to_json()
        .unwrap();
        assert!(orch.process_frame(&set_input).is_none());
        assert!(orch.process_frame(r#"{"type":"set_rle","data":"!"}"#).is_none());
        assert!(orch.process_frame(r#"{"amount":2}"#).is_none());
        assert_eq!(orch.metrics().frames_dropped, 2);

        let reply = orch
            .process_frame(r#"{"type":"step_forward","amount":2}"#)
            .unwrap();
        let Message::SerializedResult { generation, .. } = Message::from_json(&reply).unwrap()
        else {
            panic!("expected a result");
        };
        assert_eq!(generation, InputGeneration(2));
        assert_eq!(orch.handle().age(), 2);
    }

    #[test]
    fn line_transport_skips_bad_frames() {
        let script = MockScript::new();
        let set_input = Message::SetInput {
            generation: InputGeneration(1),
            text: script.text(),
        }
        .to_json()
        .unwrap();
        let input = format!(
            "{set_input}\n\n{{\"type\":\"set_rle\"}}\nnot json\n{{\"type\":\"step_forward\",\"amount\":4}}\n"
        );
        let mut output = Vec::new();
        let metrics =
            serve_lines::<MockEngine, _, _>(io::Cursor::new(input), &mut output).unwrap();

        let text = String::from_utf8(output).unwrap();
        let tags: Vec<_> = text
            .lines()
            .map(|line| Message::from_json(line).unwrap().tag())
            .collect();
        assert_eq!(tags, ["ready", "serialized_result"]);
        assert_eq!(metrics.frames_dropped, 2);
        assert_eq!(metrics.steps_applied, 1);
        assert_eq!(script.ledger().live(), 0);
    }
}
