//! Raster sampling window and the RGBA buffer it produces.

/// Region of simulation space to sample into a pixel buffer.
///
/// `width × height` samples are taken starting at `(x0, y0)`. Each sample
/// covers a `2^zoom_level` square of cells and is drawn as a
/// `cell_size × cell_size` block of pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderWindow {
    /// World x of the first sample.
    pub x0: i64,
    /// World y of the first sample.
    pub y0: i64,
    /// Samples per row.
    pub width: u32,
    /// Sample rows.
    pub height: u32,
    /// Pixel edge length of one sample.
    pub cell_size: u32,
    /// Log2 of the cell edge length covered by one sample.
    pub zoom_level: u8,
    /// Multiplier applied to sample density before clamping to 255.
    pub brightness: f64,
}

impl RenderWindow {
    /// Pixel width of the buffer this window renders into.
    pub fn pixel_width(&self) -> usize {
        self.width as usize * self.cell_size as usize
    }

    /// Pixel height of the buffer this window renders into.
    pub fn pixel_height(&self) -> usize {
        self.height as usize * self.cell_size as usize
    }
}

/// Row-major RGBA8 pixels.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PixelBuffer {
    /// Width in pixels.
    pub width: usize,
    /// Height in pixels.
    pub height: usize,
    /// `width * height * 4` bytes.
    pub data: Vec<u8>,
}

impl PixelBuffer {
    /// Expand a grayscale sample grid into RGBA, replicating every sample
    /// into a `tile × tile` block.
    pub fn from_gray(samples: &[u8], samples_per_row: usize, tile: usize) -> Self {
        if samples_per_row == 0 || tile == 0 {
            return Self::default();
        }
        let rows = samples.len() / samples_per_row;
        let width = samples_per_row * tile;
        let height = rows * tile;
        let mut data = Vec::with_capacity(width * height * 4);
        for row in samples.chunks_exact(samples_per_row) {
            for _ in 0..tile {
                for &g in row {
                    for _ in 0..tile {
                        data.extend_from_slice(&[g, g, g, 255]);
                    }
                }
            }
        }
        Self {
            width,
            height,
            data,
        }
    }

    /// Gray level of the pixel at `(x, y)`, if in bounds.
    pub fn gray_at(&self, x: usize, y: usize) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get((y * self.width + x) * 4).copied()
    }
}
