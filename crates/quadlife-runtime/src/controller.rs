//! Render-side state: canonical handle, viewport, pacing and step tracking.
//!
//! The controller never touches a channel. Input events and worker
//! messages go in through [`Controller::apply`] and
//! [`Controller::handle_worker_message`]; the messages to send come back
//! out. This keeps every transition deterministic and testable without a
//! worker thread.
//!
//! Step tracking is a two-state machine: `Idle → Requested → Idle`. While
//! a request is outstanding [`Controller::poll`] never emits another.

use std::time::{Duration, Instant};

use quadlife_core::{Engine, InputGeneration, PatternHeader, RenderWindow};

use crate::config::{check_gc_exponent, SessionConfig};
use crate::error::SessionError;
use crate::gc::GcBudget;
use crate::metrics::StatusReport;
use crate::pacing::{Pacing, PacingAction};
use crate::protocol::{Direction, Message};
use crate::viewport::{brightness_factor, Viewport};

/// A user input.
#[derive(Clone, Debug, PartialEq)]
pub enum ControlEvent {
    /// Wheel over the canvas at device pixel `(x, y)`.
    Wheel {
        /// Cursor x in device pixels.
        x: f64,
        /// Cursor y in device pixels.
        y: f64,
        /// Vertical wheel delta; positive values magnify.
        delta_y: f64,
    },
    /// Pointer drag by a device-pixel delta.
    Drag {
        /// Horizontal delta.
        dx: f64,
        /// Vertical delta.
        dy: f64,
    },
    /// Canvas resized.
    Resize {
        /// New width in device pixels.
        width: u32,
        /// New height in device pixels.
        height: u32,
    },
    /// Brightness level; the multiplier is `2^(level / 4)`.
    SetBrightness(i32),
    /// Re-fit the current pattern's bounding box.
    ResetView,
    /// Double generations per step.
    Faster,
    /// Halve generations per step.
    Slower,
    /// Raise the step rate.
    RaiseFps,
    /// Lower the step rate.
    LowerFps,
    /// Pause or resume stepping.
    TogglePause,
    /// Set the worker's node threshold to `2^exponent`.
    SetGcExponent(u32),
    /// Replace the pattern.
    LoadPattern {
        /// File name used for exports.
        name: String,
        /// Pattern text.
        text: String,
    },
}

/// What the caller should do after [`Controller::poll`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Poll {
    /// Send this message to the worker now.
    Send(Message),
    /// Poll again after this long.
    Wait(Duration),
    /// Nothing to do until the worker replies or stepping resumes.
    Idle,
}

/// Text export of the canonical handle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Export {
    /// `{pattern name}.{age}`.
    pub file_name: String,
    /// Pattern text.
    pub text: String,
}

/// Render-side orchestrator state.
pub struct Controller<E: Engine> {
    canonical: E,
    pattern_name: String,
    pattern_text: String,
    header: PatternHeader,
    generation: InputGeneration,
    outstanding: Option<InputGeneration>,
    worker_ready: bool,
    worker_nodes: u64,
    stale_results: u64,
    viewport: Viewport,
    pacing: Pacing,
    budget: GcBudget,
    canvas_width: u32,
    canvas_height: u32,
    brightness_level: i32,
    dirty: bool,
}

impl<E: Engine> Controller<E> {
    /// Build the controller and its canonical handle from `config`.
    pub fn new(config: &SessionConfig) -> Result<Self, SessionError> {
        config.validate()?;
        let header = PatternHeader::parse(&config.initial_pattern)?;
        let canonical = E::from_text(&config.initial_pattern)?;
        let mut controller = Self {
            canonical,
            pattern_name: config.pattern_name.clone(),
            pattern_text: config.initial_pattern.clone(),
            header,
            generation: InputGeneration::default().next(),
            outstanding: None,
            worker_ready: false,
            worker_nodes: 0,
            stale_results: 0,
            viewport: Viewport::default(),
            pacing: Pacing::new(&config.pacing),
            budget: GcBudget::from_exponent(config.gc_threshold_exponent),
            canvas_width: config.canvas_width,
            canvas_height: config.canvas_height,
            brightness_level: 1,
            dirty: true,
        };
        controller.reset_view();
        Ok(controller)
    }

    // ── Input events ────────────────────────────────────────────

    /// Apply a user input, returning the messages to send to the worker.
    ///
    /// On error nothing has changed.
    pub fn apply(&mut self, event: ControlEvent) -> Result<Vec<Message>, SessionError> {
        let mut out = Vec::new();
        match event {
            ControlEvent::Wheel { x, y, delta_y } => self.viewport.zoom_at(x, y, delta_y),
            ControlEvent::Drag { dx, dy } => self.viewport.pan(dx, dy),
            ControlEvent::Resize { width, height } => {
                self.canvas_width = width.max(1);
                self.canvas_height = height.max(1);
            }
            ControlEvent::SetBrightness(level) => self.brightness_level = level,
            ControlEvent::ResetView => self.reset_view(),
            ControlEvent::Faster => self.pacing.faster(),
            ControlEvent::Slower => self.pacing.slower(),
            ControlEvent::RaiseFps => self.pacing.raise_fps(),
            ControlEvent::LowerFps => self.pacing.lower_fps(),
            ControlEvent::TogglePause => self.pacing.toggle_pause(),
            ControlEvent::SetGcExponent(exponent) => {
                self.budget = GcBudget::from_exponent(check_gc_exponent(exponent)?);
                if self.worker_ready {
                    out.push(Message::SetBudget {
                        amount: self.budget.threshold(),
                    });
                }
            }
            ControlEvent::LoadPattern { name, text } => {
                if let Some(msg) = self.load_pattern(name, text)? {
                    out.push(msg);
                }
            }
        }
        self.dirty = true;
        Ok(out)
    }

    fn load_pattern(
        &mut self,
        name: String,
        text: String,
    ) -> Result<Option<Message>, SessionError> {
        let header = PatternHeader::parse(&text)?;
        self.canonical = E::from_text(&text)?;
        self.generation = self.generation.next();
        tracing::info!(
            name = %name,
            generation = %self.generation,
            width = header.width,
            height = header.height,
            "pattern loaded"
        );
        self.header = header;
        self.pattern_name = name;
        self.pattern_text = text;
        self.reset_view();
        self.pacing.reset_rates();
        Ok(self.worker_ready.then(|| self.set_input()))
    }

    fn reset_view(&mut self) {
        self.brightness_level = self
            .viewport
            .fit(self.header, self.canvas_width, self.canvas_height);
        self.dirty = true;
    }

    fn set_input(&self) -> Message {
        Message::SetInput {
            generation: self.generation,
            text: self.pattern_text.clone(),
        }
    }

    // ── Worker messages ─────────────────────────────────────────

    /// Apply a message from the worker, returning messages to send back.
    pub fn handle_worker_message(&mut self, msg: Message) -> Vec<Message> {
        match msg {
            Message::Ready => {
                tracing::debug!(generation = %self.generation, "worker ready");
                self.worker_ready = true;
                vec![
                    self.set_input(),
                    Message::SetBudget {
                        amount: self.budget.threshold(),
                    },
                ]
            }
            Message::SerializedResult {
                generation,
                bytes,
                node_count,
            } => {
                self.apply_result(generation, &bytes, node_count);
                Vec::new()
            }
            Message::SetInput { .. } | Message::StepForward { .. } | Message::SetBudget { .. } => {
                debug_assert_eq!(msg.direction(), Direction::ToWorker);
                tracing::warn!(tag = msg.tag(), "render ignoring message addressed to worker");
                Vec::new()
            }
        }
    }

    fn apply_result(&mut self, generation: InputGeneration, bytes: &[u8], node_count: u64) {
        match self.outstanding.take() {
            Some(sent) if sent != generation => {
                tracing::warn!(%sent, %generation, "result generation differs from request");
            }
            Some(_) => {}
            None => tracing::warn!(%generation, "result arrived with no step outstanding"),
        }
        if generation != self.generation {
            self.stale_results += 1;
            tracing::debug!(%generation, current = %self.generation, "dropping stale result");
            return;
        }
        match E::deserialize(bytes) {
            Ok(handle) => {
                self.canonical = handle;
                self.worker_nodes = node_count;
                self.dirty = true;
            }
            Err(e) => {
                tracing::error!(error = %e, "discarding undecodable result");
            }
        }
    }

    // ── Pacing ──────────────────────────────────────────────────

    /// Decide whether to request a step at `now`.
    pub fn poll(&mut self, now: Instant) -> Poll {
        if !self.worker_ready || self.outstanding.is_some() {
            return Poll::Idle;
        }
        match self.pacing.poll(now) {
            PacingAction::Send { amount } => {
                self.outstanding = Some(self.generation);
                Poll::Send(Message::StepForward { amount })
            }
            PacingAction::Wait(remaining) => Poll::Wait(remaining),
            PacingAction::Paused => Poll::Idle,
        }
    }

    // ── Rendering and readouts ──────────────────────────────────

    /// Whether the canvas needs redrawing.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub(crate) fn mark_drawn(&mut self) {
        self.dirty = false;
    }

    /// Brightness multiplier.
    pub fn brightness(&self) -> f64 {
        brightness_factor(self.brightness_level)
    }

    /// Sampling window for the current canvas and viewport.
    pub fn render_window(&self) -> RenderWindow {
        self.viewport
            .render_window(self.canvas_width, self.canvas_height, self.brightness())
    }

    /// Current readout.
    pub fn status(&self) -> StatusReport {
        StatusReport {
            live_cells: self.canonical.alive_count(),
            worker_nodes: self.worker_nodes,
            canonical_nodes: self.canonical.node_count(),
            age: self.canonical.age(),
            memory_budget_mib: self.budget.approx_memory_mib(),
            brightness: self.brightness(),
            steps_per_frame: self.pacing.step_batch(),
            frames_per_second: self.pacing.frames_per_second(),
            zoom_ratio: self.viewport.scale(),
            paused: self.pacing.is_paused(),
            stale_results: self.stale_results,
        }
    }

    /// Export the canonical handle as `{name}.{age}`.
    pub fn export(&self) -> Export {
        Export {
            file_name: format!("{}.{}", self.pattern_name, self.canonical.age()),
            text: self.canonical.to_text(),
        }
    }

    // ── Accessors ───────────────────────────────────────────────

    /// The render-visible handle.
    pub fn canonical(&self) -> &E {
        &self.canonical
    }

    /// Generation of the current input.
    pub fn generation(&self) -> InputGeneration {
        self.generation
    }

    /// Generation of the outstanding step request, if any.
    pub fn outstanding(&self) -> Option<InputGeneration> {
        self.outstanding
    }

    /// Whether the worker has announced itself.
    pub fn worker_ready(&self) -> bool {
        self.worker_ready
    }

    /// Viewport state.
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Pacing state.
    pub fn pacing(&self) -> &Pacing {
        &self.pacing
    }

    /// Current budget.
    pub fn budget(&self) -> GcBudget {
        self.budget
    }

    /// Name exports are written under.
    pub fn pattern_name(&self) -> &str {
        &self.pattern_name
    }

    /// Canvas size in device pixels.
    pub fn canvas(&self) -> (u32, u32) {
        (self.canvas_width, self.canvas_height)
    }
}
