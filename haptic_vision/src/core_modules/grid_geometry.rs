// THEORY:
// `grid_geometry` is pure arithmetic. A depth frame rarely divides evenly into the
// configured grid of haptic cells, so before partitioning we trim a few rows and
// columns off the edges. The trim is "radial": it is split between the leading and
// trailing edge of each axis so the grid stays centred on the sensor's optical axis.
//
// Rules per axis:
// 1.  `remainder = length % cells`.
// 2.  The leading edge loses `ceil(remainder / 2)`, the trailing edge `floor(remainder / 2)`.
// 3.  When the trailing edge loses nothing, the trailing bound is the full length.
//
// The same `CropBounds` are applied to the depth and color images so both stay
// pixel-aligned.

use crate::error::{Result, SceneError};
use serde::Deserialize;

/// The number of haptic cells along each axis of the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct GridLayout {
    /// Rows of cells (top to bottom).
    pub vertical_cells: u32,
    /// Columns of cells (left to right).
    pub horizontal_cells: u32,
}

impl GridLayout {
    pub fn new(vertical_cells: u32, horizontal_cells: u32) -> Self {
        Self {
            vertical_cells,
            horizontal_cells,
        }
    }

    pub fn cell_count(&self) -> usize {
        self.vertical_cells as usize * self.horizontal_cells as usize
    }

    /// Checks the layout against a frame of `height` x `width` pixels.
    pub fn validate(&self, height: u32, width: u32) -> Result<()> {
        if self.vertical_cells == 0 || self.horizontal_cells == 0 {
            return Err(SceneError::InvalidConfiguration(format!(
                "cell counts must be greater than 0, got {}x{}",
                self.vertical_cells, self.horizontal_cells
            )));
        }
        if self.vertical_cells > height || self.horizontal_cells > width {
            return Err(SceneError::InvalidConfiguration(format!(
                "{}x{} cells do not fit a {}x{} frame",
                self.vertical_cells, self.horizontal_cells, height, width
            )));
        }
        Ok(())
    }
}

/// Half-open `[start, end)` range kept along one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisCrop {
    pub start: u32,
    pub end: u32,
}

impl AxisCrop {
    /// Computes the radial crop of an axis of `length` pixels split into `cells`.
    /// `cells` must be non-zero.
    pub fn radial(length: u32, cells: u32) -> Self {
        let remainder = length % cells;
        let leading = remainder.div_ceil(2);
        let trailing = remainder / 2;
        let end = if trailing == 0 { length } else { length - trailing };
        Self {
            start: leading,
            end,
        }
    }

    pub fn len(&self) -> u32 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Pixels removed from the leading edge.
    pub fn leading_removed(&self) -> u32 {
        self.start
    }

    /// Pixels removed from the trailing edge of an axis of `length` pixels.
    pub fn trailing_removed(&self, length: u32) -> u32 {
        length - self.end
    }
}

/// The rows and columns that survive cropping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropBounds {
    pub rows: AxisCrop,
    pub cols: AxisCrop,
}

impl CropBounds {
    pub fn height(&self) -> u32 {
        self.rows.len()
    }

    pub fn width(&self) -> u32 {
        self.cols.len()
    }

    /// Height and width of one cell once the bounds are applied.
    pub fn cell_shape(&self, layout: &GridLayout) -> (u32, u32) {
        (
            self.height() / layout.vertical_cells,
            self.width() / layout.horizontal_cells,
        )
    }
}

/// Computes the symmetric crop that makes a `height` x `width` frame evenly divisible by `layout`.
pub fn compute_crop(height: u32, width: u32, layout: &GridLayout) -> Result<CropBounds> {
    layout.validate(height, width)?;
    Ok(CropBounds {
        rows: AxisCrop::radial(height, layout.vertical_cells),
        cols: AxisCrop::radial(width, layout.horizontal_cells),
    })
}
