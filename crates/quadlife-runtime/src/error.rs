//! Errors surfaced by the render-side API.

use std::error::Error;
use std::fmt;

use quadlife_core::PatternError;

use crate::config::ConfigError;
use crate::source::LoadError;

/// Errors from a [`Controller`](crate::controller::Controller) or
/// [`Session`](crate::session::Session) operation.
///
/// `Config`, `Pattern` and `Load` leave the render-side state exactly as
/// it was before the call. `Disconnected` means the worker is gone; the
/// session can still render but no longer steps.
#[derive(Debug)]
pub enum SessionError {
    /// Configuration or a configuration-like control was out of range.
    Config(ConfigError),
    /// Pattern text could not be parsed.
    Pattern(PatternError),
    /// Pattern text could not be fetched.
    Load(LoadError),
    /// The worker has stopped.
    Disconnected,
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Pattern(e) => write!(f, "pattern: {e}"),
            Self::Load(e) => write!(f, "load: {e}"),
            Self::Disconnected => write!(f, "worker has shut down"),
        }
    }
}

impl Error for SessionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Pattern(e) => Some(e),
            Self::Load(e) => Some(e),
            Self::Disconnected => None,
        }
    }
}

impl From<ConfigError> for SessionError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<PatternError> for SessionError {
    fn from(e: PatternError) -> Self {
        Self::Pattern(e)
    }
}

impl From<LoadError> for SessionError {
    fn from(e: LoadError) -> Self {
        Self::Load(e)
    }
}
