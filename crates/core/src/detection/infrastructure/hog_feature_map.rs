//! HOG features of a whole pyramid level, shared by every window on it.
//!
//! Cell histograms follow the binning of `imageproc::hog` (Sobel gradients,
//! bilinear spatial and orientation interpolation, magnitude over cell
//! area). Blocks are L2-normalised once per cell origin, so a window that
//! starts on the cell grid reads its descriptor straight from the map.

use std::f32::consts::PI;

use image::imageops;
use image::GrayImage;
use imageproc::gradients::{horizontal_sobel, vertical_sobel};
use imageproc::hog::HogOptions;

pub struct HogFeatureMap {
    options: HogOptions,
    cells_wide: usize,
    cells_high: usize,
    /// Block origins per row and column (`cells - block_side + 1`).
    origins_wide: usize,
    origins_high: usize,
    block_len: usize,
    /// Normalised block at every cell origin, row-major.
    blocks: Vec<f32>,
}

impl HogFeatureMap {
    /// Builds the map over the largest top-left region of `image` that
    /// splits into whole cells. `options` must be non-zero.
    pub fn new(image: &GrayImage, options: HogOptions) -> Self {
        let side = options.cell_side;
        let cells_wide = image.width() as usize / side;
        let cells_high = image.height() as usize / side;
        let block_len = options.orientations * options.block_side * options.block_side;
        let origins_wide = (cells_wide + 1).saturating_sub(options.block_side);
        let origins_high = (cells_high + 1).saturating_sub(options.block_side);

        let mut map = Self {
            options,
            cells_wide,
            cells_high,
            origins_wide,
            origins_high,
            block_len,
            blocks: Vec::new(),
        };
        if origins_wide == 0 || origins_high == 0 {
            return map;
        }

        let (w, h) = ((cells_wide * side) as u32, (cells_high * side) as u32);
        let cells = if (w, h) == image.dimensions() {
            map.cell_histograms(image)
        } else {
            map.cell_histograms(&imageops::crop_imm(image, 0, 0, w, h).to_image())
        };
        map.blocks = map.normalised_blocks(&cells);
        map
    }

    pub fn cells_wide(&self) -> usize {
        self.cells_wide
    }

    pub fn cells_high(&self) -> usize {
        self.cells_high
    }

    pub fn block_len(&self) -> usize {
        self.block_len
    }

    /// Normalised block whose top-left cell is `(cell_x, cell_y)`.
    pub fn block(&self, cell_x: usize, cell_y: usize) -> &[f32] {
        debug_assert!(cell_x < self.origins_wide && cell_y < self.origins_high);
        let start = (cell_y * self.origins_wide + cell_x) * self.block_len;
        &self.blocks[start..start + self.block_len]
    }

    /// Descriptor of a window of `cells_wide` x `cells_high` cells starting
    /// at `(cell_x, cell_y)`, laid out as `imageproc::hog::hog` lays out a
    /// descriptor of the same window.
    #[cfg(test)]
    pub(crate) fn window_descriptor(
        &self,
        cell_x: usize,
        cell_y: usize,
        cells_wide: usize,
        cells_high: usize,
    ) -> Vec<f32> {
        let stride = self.options.block_stride;
        let blocks_wide = (cells_wide - self.options.block_side) / stride + 1;
        let blocks_high = (cells_high - self.options.block_side) / stride + 1;
        let mut descriptor = Vec::with_capacity(blocks_wide * blocks_high * self.block_len);
        for by in 0..blocks_high {
            for bx in 0..blocks_wide {
                descriptor.extend_from_slice(self.block(cell_x + bx * stride, cell_y + by * stride));
            }
        }
        descriptor
    }

    /// Orientation histograms, `orientations` bins per cell, cells row-major.
    fn cell_histograms(&self, image: &GrayImage) -> Vec<f32> {
        let bins = self.options.orientations;
        let side = self.options.cell_side as f32;
        let cell_area = side * side;
        let range = if self.options.signed { 2.0 * PI } else { PI };
        let interval = range / bins as f32;
        let horizontal = horizontal_sobel(image);
        let vertical = vertical_sobel(image);
        let mut cells = vec![0f32; self.cells_wide * self.cells_high * bins];

        for (x, y, gx) in horizontal.enumerate_pixels() {
            let h = gx[0] as f32;
            let v = vertical.get_pixel(x, y)[0] as f32;
            let magnitude = (h.powi(2) + v.powi(2)).sqrt();

            let mut direction = v.atan2(h);
            if direction < 0.0 {
                direction += range;
            }
            if !self.options.signed && direction >= PI {
                direction -= PI;
            }

            let (ys, wys) = split(y as f32 / side);
            let (xs, wxs) = split(x as f32 / side);
            let (mut os, wos) = split(direction / interval);
            os[0] %= bins;
            if os[1] >= bins {
                os[1] = 0;
            }

            for (cy, wy) in ys.into_iter().zip(wys) {
                for (cx, wx) in xs.into_iter().zip(wxs) {
                    if cx >= self.cells_wide || cy >= self.cells_high {
                        continue;
                    }
                    let cell = (cy * self.cells_wide + cx) * bins;
                    for (o, wo) in os.into_iter().zip(wos) {
                        cells[cell + o] += wy * wx * wo * magnitude / cell_area;
                    }
                }
            }
        }
        cells
    }

    fn normalised_blocks(&self, cells: &[f32]) -> Vec<f32> {
        let bins = self.options.orientations;
        let block_side = self.options.block_side;
        let mut blocks = Vec::with_capacity(self.origins_wide * self.origins_high * self.block_len);

        for oy in 0..self.origins_high {
            for ox in 0..self.origins_wide {
                let start = blocks.len();
                for iy in 0..block_side {
                    for ix in 0..block_side {
                        let cell = ((oy + iy) * self.cells_wide + ox + ix) * bins;
                        blocks.extend_from_slice(&cells[cell..cell + bins]);
                    }
                }
                let block = &mut blocks[start..];
                let norm = block.iter().fold(0f32, |acc, v| acc + v * v).sqrt();
                if norm > 0.0 {
                    block.iter_mut().for_each(|v| *v /= norm);
                }
            }
        }
        blocks
    }
}

/// Lower index and its neighbour with linear interpolation weights.
fn split(pos: f32) -> ([usize; 2], [f32; 2]) {
    let fraction = pos - pos.floor();
    let lower = pos as usize;
    ([lower, lower + 1], [1.0 - fraction, fraction])
}
