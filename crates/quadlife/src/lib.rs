//! Quadlife: hashlife stepping on a background worker, paced and sampled
//! by a render-side controller.
//!
//! This is the facade crate. It re-exports the sub-crates and provides a
//! headless driver for running a pattern to a target age without a
//! display.
//!
//! # Quick start
//!
//! ```no_run
//! use quadlife::prelude::*;
//!
//! let outcome = quadlife::headless::run::<Universe>(SessionConfig::default(), 1024).unwrap();
//! assert!(outcome.status.age >= 1024);
//! println!("{}", outcome.export.file_name);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `quadlife-core` | Engine handle trait, headers, render windows, errors |
//! | [`hashlife`] | `quadlife-hashlife` | The hash-consed quadtree engine |
//! | [`runtime`] | `quadlife-runtime` | Protocol, worker, GC policy, viewport, pacing, sessions |
//! | [`headless`] | this crate | Run a session to a target age |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Engine handle contract and shared types (`quadlife-core`).
pub use quadlife_core as types;

/// The hashlife engine (`quadlife-hashlife`).
///
/// [`hashlife::Universe`] is the [`types::Engine`] implementation used by
/// the CLI.
pub use quadlife_hashlife as hashlife;

/// Worker, controller and session plumbing (`quadlife-runtime`).
pub use quadlife_runtime as runtime;

pub mod headless;

/// Common imports.
///
/// ```rust
/// use quadlife::prelude::*;
/// ```
pub mod prelude {
    // Core
    pub use quadlife_core::{Engine, InputGeneration, PatternHeader, PixelBuffer, RenderWindow};

    // Errors
    pub use quadlife_core::{EngineError, PatternError};
    pub use quadlife_runtime::{ConfigError, LoadError, SessionError};

    // Engine
    pub use quadlife_hashlife::Universe;

    // Runtime
    pub use quadlife_runtime::{
        ControlEvent, Export, FsPatternSource, MemorySurface, PacingConfig, PatternSource, Poll,
        Session, SessionConfig, StatusReport, Surface,
    };
}
