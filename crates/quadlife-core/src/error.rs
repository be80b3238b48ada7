//! Error types shared by engine implementations and the runtime.
//!
//! Pattern errors come from parsing user-supplied text; engine errors
//! come from decoding snapshots that crossed the thread boundary.

use std::error::Error;
use std::fmt;

/// Errors from parsing a plain-text pattern.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PatternError {
    /// No header line, or the header line carries fewer than two integers.
    MalformedHeader {
        /// Description of what was wrong with the header.
        reason: String,
    },
    /// The run-length body contains a character outside `b`, `o`, `$`, `!`.
    InvalidCell {
        /// The offending character.
        found: char,
        /// 1-based line number within the text.
        line: usize,
    },
    /// A run count does not fit the coordinate space.
    RunTooLong {
        /// 1-based line number within the text.
        line: usize,
    },
}

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedHeader { reason } => write!(f, "malformed pattern header: {reason}"),
            Self::InvalidCell { found, line } => {
                write!(f, "invalid cell character {found:?} on line {line}")
            }
            Self::RunTooLong { line } => write!(f, "run count overflows on line {line}"),
        }
    }
}

impl Error for PatternError {}

/// Errors raised by an engine handle.
///
/// Any of these is fatal for the handle it concerns: the caller must
/// discard the handle rather than continue with partial state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EngineError {
    /// The snapshot does not start with the expected magic bytes.
    InvalidMagic,
    /// The snapshot format version is not supported by this build.
    UnsupportedVersion {
        /// The version found in the snapshot.
        found: u8,
    },
    /// The snapshot ended before all declared data was read.
    Truncated {
        /// What was being decoded when input ran out.
        context: &'static str,
    },
    /// The snapshot is structurally invalid (bad index, level mismatch).
    Corrupt {
        /// Human-readable description of the inconsistency.
        detail: String,
    },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidMagic => write!(f, "invalid snapshot magic bytes"),
            Self::UnsupportedVersion { found } => {
                write!(f, "unsupported snapshot version {found}")
            }
            Self::Truncated { context } => write!(f, "snapshot truncated while reading {context}"),
            Self::Corrupt { detail } => write!(f, "corrupt snapshot: {detail}"),
        }
    }
}

impl Error for EngineError {}
