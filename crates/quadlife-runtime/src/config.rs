//! Session configuration, validation, and error types.
//!
//! [`SessionConfig`] is the input for constructing a
//! [`Session`](crate::session::Session). [`validate()`](SessionConfig::validate)
//! checks every structural invariant before any thread is spawned.

use std::error::Error;
use std::fmt;

use quadlife_core::{PatternError, PatternHeader};

use crate::pacing::MAX_FPS_EXPONENT;

/// Default startup pattern: a 12×8 period-4 spaceship.
pub const DEFAULT_PATTERN: &str = concat!(
    "x = 12, y = 8, rule = B3/S23\n",
    "5bob2o$4bo6bo$3b2o3bo2bo$2obo5b2o$2obo5b2o$3b2o3bo2bo$4bo6bo$5bob2o!\n"
);

/// File name the default pattern is exported under.
pub const DEFAULT_PATTERN_NAME: &str = "example_spaceship.rle";

/// Smallest allowed GC threshold exponent.
pub const MIN_GC_EXPONENT: u32 = 10;
/// Largest allowed GC threshold exponent.
pub const MAX_GC_EXPONENT: u32 = 40;

// ── PacingConfig ───────────────────────────────────────────────────

/// Initial step cadence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PacingConfig {
    /// Log2 of generations per step request. Default: 1. Minimum: 1.
    pub speed_exponent: u32,
    /// Frame-rate exponent; requests per second is `2^(fps/2)`.
    /// Default: 4. Range: `[0, 12]`.
    pub fps_exponent: u32,
    /// Early-fire tolerance in milliseconds. Default: 5.
    pub slack_ms: u64,
    /// Upper bound on `speed_exponent`. Default: 30.
    pub max_speed_exponent: u32,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            speed_exponent: 1,
            fps_exponent: 4,
            slack_ms: 5,
            max_speed_exponent: 30,
        }
    }
}

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected during [`SessionConfig::validate()`].
#[derive(Debug, PartialEq)]
pub enum ConfigError {
    /// Canvas has a zero dimension.
    EmptyCanvas {
        /// Configured width.
        width: u32,
        /// Configured height.
        height: u32,
    },
    /// GC threshold exponent outside `[MIN_GC_EXPONENT, MAX_GC_EXPONENT]`.
    GcExponentOutOfRange {
        /// The configured exponent.
        value: u32,
    },
    /// Speed exponent is zero or above the configured maximum.
    SpeedOutOfRange {
        /// The configured exponent.
        value: u32,
        /// The configured maximum.
        max: u32,
    },
    /// Frame-rate exponent above [`MAX_FPS_EXPONENT`].
    FpsOutOfRange {
        /// The configured exponent.
        value: u32,
    },
    /// Maximum speed exponent would overflow a `u64` batch.
    MaxSpeedTooLarge {
        /// The configured maximum.
        value: u32,
    },
    /// Channel capacity is zero.
    ChannelCapacityZero,
    /// The initial pattern has no usable header.
    InitialPattern(PatternError),
    /// The worker thread could not be spawned.
    ThreadSpawnFailed {
        /// OS error text.
        reason: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyCanvas { width, height } => {
                write!(f, "canvas {width}x{height} has a zero dimension")
            }
            Self::GcExponentOutOfRange { value } => write!(
                f,
                "gc threshold exponent {value} outside [{MIN_GC_EXPONENT}, {MAX_GC_EXPONENT}]"
            ),
            Self::SpeedOutOfRange { value, max } => {
                write!(f, "speed exponent {value} outside [1, {max}]")
            }
            Self::FpsOutOfRange { value } => {
                write!(f, "fps exponent {value} outside [0, {MAX_FPS_EXPONENT}]")
            }
            Self::MaxSpeedTooLarge { value } => {
                write!(f, "max speed exponent {value} exceeds 63")
            }
            Self::ChannelCapacityZero => write!(f, "channel_capacity must be at least 1"),
            Self::InitialPattern(e) => write!(f, "initial pattern: {e}"),
            Self::ThreadSpawnFailed { reason } => write!(f, "thread spawn failed: {reason}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InitialPattern(e) => Some(e),
            _ => None,
        }
    }
}

impl From<PatternError> for ConfigError {
    fn from(e: PatternError) -> Self {
        Self::InitialPattern(e)
    }
}

/// Check a GC threshold exponent against the allowed range.
pub fn check_gc_exponent(value: u32) -> Result<u32, ConfigError> {
    if (MIN_GC_EXPONENT..=MAX_GC_EXPONENT).contains(&value) {
        Ok(value)
    } else {
        Err(ConfigError::GcExponentOutOfRange { value })
    }
}

// ── SessionConfig ──────────────────────────────────────────────────

/// Complete configuration for a session.
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Canvas width in device pixels. Default: 800.
    pub canvas_width: u32,
    /// Canvas height in device pixels. Default: 600.
    pub canvas_height: u32,
    /// Pattern text loaded at startup. Default: [`DEFAULT_PATTERN`].
    pub initial_pattern: String,
    /// Name the initial pattern is exported under.
    pub pattern_name: String,
    /// Node-count threshold is `2^gc_threshold_exponent`. Default: 20.
    pub gc_threshold_exponent: u32,
    /// Step cadence.
    pub pacing: PacingConfig,
    /// Capacity of each direction's message channel. Default: 64.
    pub channel_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            canvas_width: 800,
            canvas_height: 600,
            initial_pattern: DEFAULT_PATTERN.to_string(),
            pattern_name: DEFAULT_PATTERN_NAME.to_string(),
            gc_threshold_exponent: 20,
            pacing: PacingConfig::default(),
            channel_capacity: 64,
        }
    }
}

impl SessionConfig {
    /// Validate all structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.canvas_width == 0 || self.canvas_height == 0 {
            return Err(ConfigError::EmptyCanvas {
                width: self.canvas_width,
                height: self.canvas_height,
            });
        }
        check_gc_exponent(self.gc_threshold_exponent)?;

        let p = &self.pacing;
        if p.max_speed_exponent > 63 {
            return Err(ConfigError::MaxSpeedTooLarge {
                value: p.max_speed_exponent,
            });
        }
        if p.speed_exponent == 0 || p.speed_exponent > p.max_speed_exponent {
            return Err(ConfigError::SpeedOutOfRange {
                value: p.speed_exponent,
                max: p.max_speed_exponent,
            });
        }
        if p.fps_exponent > MAX_FPS_EXPONENT {
            return Err(ConfigError::FpsOutOfRange {
                value: p.fps_exponent,
            });
        }
        if self.channel_capacity == 0 {
            return Err(ConfigError::ChannelCapacityZero);
        }
        PatternHeader::parse(&self.initial_pattern)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(SessionConfig::default().validate(), Ok(()));
    }

    #[test]
    fn rejects_zero_canvas() {
        let cfg = SessionConfig {
            canvas_height: 0,
            ..SessionConfig::default()
        };
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::EmptyCanvas {
                width: 800,
                height: 0
            })
        );
    }

    #[test]
    fn rejects_out_of_range_exponents() {
        let mut cfg = SessionConfig {
            gc_threshold_exponent: 41,
            ..SessionConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::GcExponentOutOfRange { value: 41 })
        ));
        cfg.gc_threshold_exponent = 20;
        cfg.pacing.speed_exponent = 0;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::SpeedOutOfRange { value: 0, .. })
        ));
        cfg.pacing.speed_exponent = 1;
        cfg.pacing.fps_exponent = 13;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::FpsOutOfRange { value: 13 })
        ));
        cfg.pacing.fps_exponent = 4;
        cfg.pacing.max_speed_exponent = 64;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::MaxSpeedTooLarge { value: 64 })
        ));
    }

    #[test]
    fn rejects_headerless_initial_pattern() {
        let cfg = SessionConfig {
            initial_pattern: "#C nothing else\n".into(),
            ..SessionConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InitialPattern(PatternError::MalformedHeader { .. }))
        ));
    }

    #[test]
    fn rejects_zero_channel_capacity() {
        let cfg = SessionConfig {
            channel_capacity: 0,
            ..SessionConfig::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::ChannelCapacityZero));
    }
}
