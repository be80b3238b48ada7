//! Runtime for Quadlife: a worker thread that advances a pattern and a
//! render side that paces it, samples it and reports on it.
//!
//! The two sides never share an engine handle. The worker advances its
//! own handle, serializes a pruned copy and ships the bytes; the render
//! side deserializes them into its canonical handle. Every interaction is
//! a [`protocol::Message`].
//!
//! # Modules
//!
//! - [`protocol`]: the message set and its JSON form
//! - [`worker`]: the stepping orchestrator and worker loop
//! - [`gc`]: node-count budget and pruning
//! - [`controller`]: render-side state machine (pure transitions)
//! - [`viewport`]: zoom, pan and fit
//! - [`pacing`]: step batching and frame-rate pacing
//! - [`render`]: dirty-flag render loop and surfaces
//! - [`session`]: channels, worker thread and shutdown

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod controller;
pub mod error;
pub mod gc;
pub mod metrics;
pub mod pacing;
pub mod protocol;
pub mod render;
pub mod session;
pub mod source;
pub mod viewport;
pub mod worker;

pub use config::{ConfigError, PacingConfig, SessionConfig};
pub use controller::{ControlEvent, Controller, Export, Poll};
pub use error::SessionError;
pub use gc::{GcBudget, GcOutcome};
pub use metrics::{StatusReport, WorkerMetrics};
pub use protocol::{Direction, Message, ProtocolError};
pub use render::{MemorySurface, RenderLoop, Surface};
pub use session::{Session, ShutdownReport};
pub use source::{Catalog, FsPatternSource, LoadError, PatternSource};
pub use viewport::Viewport;
pub use worker::{serve_lines, Orchestrator};
