//! Step cadence.
//!
//! Each step request asks for `2^speed_exponent` generations. Requests
//! are spaced at least `1000 / 2^(fps_exponent / 2)` ms apart, less a small
//! slack so a timer that fires a little early still sends. [`Pacing::poll`]
//! is a pure scheduling decision: send now, or wait for the remainder of
//! the interval and poll again.

use std::time::{Duration, Instant};

use crate::config::PacingConfig;

/// Largest fps exponent.
pub const MAX_FPS_EXPONENT: u32 = 12;

/// Scheduling decision for the current instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PacingAction {
    /// Request `amount` generations now.
    Send {
        /// Generations to request.
        amount: u64,
    },
    /// Poll again after this long.
    Wait(Duration),
    /// Stepping is paused.
    Paused,
}

/// Speed, frame rate and pause state.
#[derive(Clone, Debug)]
pub struct Pacing {
    speed_exponent: u32,
    fps_exponent: u32,
    paused: bool,
    last_send: Option<Instant>,
    slack: Duration,
    initial_speed: u32,
    initial_fps: u32,
    max_speed: u32,
}

impl Pacing {
    /// Pacing starting from `config`.
    pub fn new(config: &PacingConfig) -> Self {
        Self {
            speed_exponent: config.speed_exponent,
            fps_exponent: config.fps_exponent,
            paused: false,
            last_send: None,
            slack: Duration::from_millis(config.slack_ms),
            initial_speed: config.speed_exponent,
            initial_fps: config.fps_exponent,
            max_speed: config.max_speed_exponent,
        }
    }

    /// Log2 of the generations per request.
    pub fn speed_exponent(&self) -> u32 {
        self.speed_exponent
    }

    /// Frame-rate exponent.
    pub fn fps_exponent(&self) -> u32 {
        self.fps_exponent
    }

    /// Generations per request.
    pub fn step_batch(&self) -> u64 {
        1u64 << self.speed_exponent
    }

    /// Target requests per second: `2^(fps_exponent / 2)`.
    pub fn frames_per_second(&self) -> f64 {
        2f64.powf(f64::from(self.fps_exponent) / 2.0)
    }

    /// Desired spacing between requests.
    pub fn interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.frames_per_second())
    }

    /// Whether stepping is paused.
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Double the batch, up to the configured maximum.
    pub fn faster(&mut self) {
        self.speed_exponent = (self.speed_exponent + 1).min(self.max_speed);
    }

    /// Halve the batch, never below two generations.
    pub fn slower(&mut self) {
        self.speed_exponent = self.speed_exponent.saturating_sub(1).max(1);
    }

    /// Raise the frame rate one notch.
    pub fn raise_fps(&mut self) {
        self.fps_exponent = (self.fps_exponent + 1).min(MAX_FPS_EXPONENT);
    }

    /// Lower the frame rate one notch.
    pub fn lower_fps(&mut self) {
        self.fps_exponent = self.fps_exponent.saturating_sub(1);
    }

    /// Flip the pause state.
    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }

    /// Restore the configured speed and frame rate.
    pub fn reset_rates(&mut self) {
        self.speed_exponent = self.initial_speed;
        self.fps_exponent = self.initial_fps;
    }

    /// Decide whether to send a request at `now`.
    ///
    /// Sending records `now` as the last send time.
    pub fn poll(&mut self, now: Instant) -> PacingAction {
        if self.paused {
            return PacingAction::Paused;
        }
        let interval = self.interval();
        if let Some(last) = self.last_send {
            let elapsed = now.saturating_duration_since(last);
            if elapsed + self.slack <= interval {
                return PacingAction::Wait(interval - elapsed);
            }
        }
        self.last_send = Some(now);
        PacingAction::Send {
            amount: self.step_batch(),
        }
    }
}
