// THEORY:
// The `DepthField` is the per-frame owner of the sensor data. It takes raw buffers,
// keeps them in a spatially organized form, and slices them into the grid of cells
// the rest of the engine works on.
//
// Key architectural principles:
// 1.  **Aligned pair**: the depth image and the color image always have identical
//     dimensions. Every geometric operation (crop, compress) is applied to both.
// 2.  **Fresh copies**: cropping materializes new buffers and partitioning hands each
//     cell its own copy, so nothing downstream aliases the raw sensor frame.
// 3.  **Fail early**: shape problems are reported before any per-cell work starts.

use crate::core_modules::cell::Cell;
use crate::core_modules::grid_geometry::{CropBounds, GridLayout, compute_crop};
use crate::error::{Result, SceneError};
use image::imageops::{self, FilterType};
use image::{ImageBuffer, Luma, RgbImage};
use tracing::debug;

/// Row-major distance readings in sensor units (millimetres for z16 sensors).
pub type DepthImage = ImageBuffer<Luma<u16>, Vec<u16>>;
/// 8-bit RGB color image co-registered with a `DepthImage`.
pub type ColorImage = RgbImage;

/// One frame's depth and color images, kept pixel-aligned.
#[derive(Debug, Clone)]
pub struct DepthField {
    depth: DepthImage,
    color: ColorImage,
}

impl DepthField {
    pub fn new(depth: DepthImage, color: ColorImage) -> Result<Self> {
        let (width, height) = depth.dimensions();
        if width == 0 || height == 0 {
            return Err(SceneError::EmptyInput { width, height });
        }
        if color.dimensions() != depth.dimensions() {
            return Err(SceneError::ShapeMismatch(format!(
                "depth is {}x{} but color is {}x{}",
                width,
                height,
                color.width(),
                color.height()
            )));
        }
        Ok(Self { depth, color })
    }

    /// Builds a field from raw sensor buffers: one `u16` per depth pixel and three bytes per color pixel.
    pub fn from_raw(width: u32, height: u32, depth: Vec<u16>, color: Vec<u8>) -> Result<Self> {
        let depth_len = depth.len();
        let color_len = color.len();
        let depth = DepthImage::from_raw(width, height, depth).ok_or_else(|| {
            SceneError::ShapeMismatch(format!(
                "{depth_len} depth readings do not fill a {width}x{height} frame"
            ))
        })?;
        let color = ColorImage::from_raw(width, height, color).ok_or_else(|| {
            SceneError::ShapeMismatch(format!(
                "{color_len} color bytes do not fill a {width}x{height} frame"
            ))
        })?;
        Self::new(depth, color)
    }

    pub fn height(&self) -> u32 {
        self.depth.height()
    }

    pub fn width(&self) -> u32 {
        self.depth.width()
    }

    pub fn depth(&self) -> &DepthImage {
        &self.depth
    }

    pub fn color(&self) -> &ColorImage {
        &self.color
    }

    /// Caps every reading at `ceiling`. Returns how many readings were clamped.
    pub fn clamp_far(&mut self, ceiling: u16) -> usize {
        let mut clamped = 0;
        for pixel in self.depth.pixels_mut() {
            if pixel.0[0] > ceiling {
                pixel.0[0] = ceiling;
                clamped += 1;
            }
        }
        clamped
    }

    /// Keeps only the pixels inside `bounds`, for both images.
    pub fn crop(&mut self, bounds: &CropBounds) {
        let (x, y) = (bounds.cols.start, bounds.rows.start);
        let (width, height) = (bounds.width(), bounds.height());
        self.depth = imageops::crop_imm(&self.depth, x, y, width, height).to_image();
        self.color = imageops::crop_imm(&self.color, x, y, width, height).to_image();
    }

    /// Radially crops the field until it divides evenly into `layout`.
    pub fn crop_to_grid(&mut self, layout: &GridLayout) -> Result<CropBounds> {
        let bounds = compute_crop(self.height(), self.width(), layout)?;
        debug!(
            rows = ?(bounds.rows.start, bounds.rows.end),
            cols = ?(bounds.cols.start, bounds.cols.end),
            "cropping {}x{} frame to grid",
            self.height(),
            self.width()
        );
        self.crop(&bounds);
        Ok(bounds)
    }

    /// Down-samples both images to `height` x `width` with nearest-neighbour sampling.
    pub fn compress(&mut self, height: u32, width: u32) -> Result<()> {
        if height == 0 || width == 0 {
            return Err(SceneError::EmptyInput { width, height });
        }
        self.depth = imageops::resize(&self.depth, width, height, FilterType::Nearest);
        self.color = imageops::resize(&self.color, width, height, FilterType::Nearest);
        Ok(())
    }

    /// Splits the field into `layout` cells in row-major order.
    /// The field must already divide evenly; see `crop_to_grid`.
    pub fn partition(&self, layout: &GridLayout) -> Result<Vec<Cell>> {
        layout.validate(self.height(), self.width())?;
        if self.height() % layout.vertical_cells != 0 || self.width() % layout.horizontal_cells != 0
        {
            return Err(SceneError::ShapeMismatch(format!(
                "{}x{} frame does not divide into {}x{} cells",
                self.height(),
                self.width(),
                layout.vertical_cells,
                layout.horizontal_cells
            )));
        }

        let cell_height = self.height() / layout.vertical_cells;
        let cell_width = self.width() / layout.horizontal_cells;
        let mut cells = Vec::with_capacity(layout.cell_count());

        for grid_row in 0..layout.vertical_cells {
            for grid_col in 0..layout.horizontal_cells {
                let x = grid_col * cell_width;
                let y = grid_row * cell_height;
                let depth = imageops::crop_imm(&self.depth, x, y, cell_width, cell_height).to_image();
                let color = imageops::crop_imm(&self.color, x, y, cell_width, cell_height).to_image();
                cells.push(Cell::new(grid_row, grid_col, depth, color));
            }
        }

        Ok(cells)
    }
}
