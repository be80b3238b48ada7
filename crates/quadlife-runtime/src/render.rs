//! Dirty-flag render loop and display surfaces.
//!
//! The loop runs once per display frame. It draws only when the
//! controller's dirty flag is set and is the only thing that clears it.

use quadlife_core::{Engine, PixelBuffer};

use crate::controller::Controller;

/// Blit target for rendered frames.
pub trait Surface {
    /// Display `frame`, replacing whatever was shown before.
    fn present(&mut self, frame: &PixelBuffer);
}

/// A surface that keeps the last frame in memory.
#[derive(Clone, Debug, Default)]
pub struct MemorySurface {
    last: Option<PixelBuffer>,
    presented: u64,
}

impl MemorySurface {
    /// An empty surface.
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recently presented frame.
    pub fn last_frame(&self) -> Option<&PixelBuffer> {
        self.last.as_ref()
    }

    /// Frames presented so far.
    pub fn presented(&self) -> u64 {
        self.presented
    }
}

impl Surface for MemorySurface {
    fn present(&mut self, frame: &PixelBuffer) {
        self.last = Some(frame.clone());
        self.presented += 1;
    }
}

/// Frame counters for the render loop.
#[derive(Clone, Debug, Default)]
pub struct RenderLoop {
    drawn: u64,
    skipped: u64,
}

impl RenderLoop {
    /// A loop that has not run yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run one frame. Returns whether anything was drawn.
    pub fn frame<E: Engine, S: Surface + ?Sized>(
        &mut self,
        controller: &mut Controller<E>,
        surface: &mut S,
    ) -> bool {
        if !controller.is_dirty() {
            self.skipped += 1;
            return false;
        }
        let window = controller.render_window();
        let buffer = controller.canonical().render_window(&window);
        surface.present(&buffer);
        controller.mark_drawn();
        self.drawn += 1;
        true
    }

    /// Frames that drew.
    pub fn drawn(&self) -> u64 {
        self.drawn
    }

    /// Frames skipped because nothing changed.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }
}
