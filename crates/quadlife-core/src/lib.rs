//! Core types and traits for the Quadlife workspace.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the engine handle contract shared by the worker and render contexts,
//! the raster window types, pattern header parsing, and error types.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod id;
pub mod pattern;
pub mod point;
pub mod traits;
pub mod window;

pub use error::{EngineError, PatternError};
pub use id::InputGeneration;
pub use pattern::PatternHeader;
pub use point::Point;
pub use traits::Engine;
pub use window::{PixelBuffer, RenderWindow};
