//! Mapping between device pixels and world cells.
//!
//! The zoom is a continuous value in `[MIN_ZOOM, MAX_ZOOM]`. Negative zoom
//! magnifies: each cell becomes a `cell_size × cell_size` block of pixels.
//! Positive zoom shrinks: each pixel block covers a `2^zoom_level` square
//! of cells. Both derived values use the integer part of the zoom, so
//! rendering happens at whole powers of two while wheel input stays smooth.

use quadlife_core::{PatternHeader, RenderWindow};

/// Most magnified zoom.
pub const MIN_ZOOM: f64 = -5.0;
/// Most shrunk zoom.
pub const MAX_ZOOM: f64 = 15.0;
/// Zoom change per unit of wheel delta.
pub const WHEEL_RATE: f64 = 0.03;

/// Origin and zoom of the visible window.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    /// World x at the canvas's left edge.
    pub origin_x: f64,
    /// World y at the canvas's top edge.
    pub origin_y: f64,
    zoom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            origin_x: 0.0,
            origin_y: 0.0,
            zoom: -1.0,
        }
    }
}

impl Viewport {
    /// Continuous zoom.
    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Set the zoom, clamped to the allowed range.
    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = clamp_zoom(zoom);
    }

    /// Pixel edge length of one rendered sample.
    pub fn cell_size(&self) -> u32 {
        1 << (-self.zoom).max(0.0).floor() as u32
    }

    /// Log2 of the cell edge length covered by one sample.
    pub fn zoom_level(&self) -> u8 {
        self.zoom.max(0.0).floor() as u8
    }

    /// World cells per device pixel.
    pub fn scale(&self) -> f64 {
        f64::from(1u32 << self.zoom_level()) / f64::from(self.cell_size())
    }

    /// World coordinate under device pixel `(x, y)`.
    pub fn world_at(&self, x: f64, y: f64) -> (f64, f64) {
        let scale = self.scale();
        (self.origin_x + x * scale, self.origin_y + y * scale)
    }

    /// Zoom by wheel delta `dy` around device pixel `(x, y)`.
    ///
    /// The world point under `(x, y)` stays under it.
    pub fn zoom_at(&mut self, x: f64, y: f64, dy: f64) {
        let (cx, cy) = self.world_at(x, y);
        self.set_zoom(self.zoom - dy * WHEEL_RATE);
        let scale = self.scale();
        self.origin_x = cx - x * scale;
        self.origin_y = cy - y * scale;
    }

    /// Drag by `(dx, dy)` device pixels.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        let scale = self.scale();
        self.origin_x -= dx * scale;
        self.origin_y -= dy * scale;
    }

    /// Fit a pattern's declared bounding box into the canvas.
    ///
    /// The box gets roughly half the canvas and is centred. Returns the
    /// brightness level suited to the new zoom.
    pub fn fit(&mut self, header: PatternHeader, canvas_width: u32, canvas_height: u32) -> i32 {
        let (fx, fy) = (header.width as f64, header.height as f64);
        let (cw, ch) = (f64::from(canvas_width), f64::from(canvas_height));
        let zoom_x = (fx * 2.0 / cw).log2();
        let zoom_y = (fy * 2.0 / ch).log2();
        // log2(0) is -inf and clamps to the most magnified zoom.
        self.set_zoom(zoom_x.max(zoom_y));
        let scale = self.scale();
        self.origin_x = fx / 2.0 - scale * cw / 2.0;
        self.origin_y = fy / 2.0 - scale * ch / 2.0;
        default_brightness_level(self.zoom)
    }

    /// The sampling window covering a canvas of the given pixel size.
    pub fn render_window(
        &self,
        canvas_width: u32,
        canvas_height: u32,
        brightness: f64,
    ) -> RenderWindow {
        let cell = self.cell_size();
        RenderWindow {
            x0: self.origin_x.floor() as i64,
            y0: self.origin_y.floor() as i64,
            width: canvas_width.div_ceil(cell),
            height: canvas_height.div_ceil(cell),
            cell_size: cell,
            zoom_level: self.zoom_level(),
            brightness,
        }
    }
}

/// Clamp to `[MIN_ZOOM, MAX_ZOOM]`; NaN maps to `MIN_ZOOM`.
pub fn clamp_zoom(zoom: f64) -> f64 {
    if zoom.is_nan() {
        return MIN_ZOOM;
    }
    zoom.clamp(MIN_ZOOM, MAX_ZOOM)
}

/// Brightness level chosen after a fit: `max(1, floor(zoom) * 4)`.
pub fn default_brightness_level(zoom: f64) -> i32 {
    (zoom.floor() as i32 * 4).max(1)
}

/// Brightness multiplier for a level: `2^(level / 4)`.
pub fn brightness_factor(level: i32) -> f64 {
    2f64.powf(0.25 * f64::from(level))
}
