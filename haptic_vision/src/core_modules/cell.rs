// THEORY:
// A `Cell` is one rectangle of the haptic grid. It is a self-contained block of
// pixels that knows how to summarize itself, and the summary it produces answers a
// single question: "how close is the nearest obstacle in my patch of the world?"
//
// Key principles:
// 1.  **Owned copies**: a cell owns its depth and color blocks. Shadow repair and
//     highlighting mutate the cell alone and can never leak into a neighbour.
// 2.  **Snapshot repair**: shadow readings are replaced using statistics taken before
//     the first replacement, so the result does not depend on scan order.
// 3.  **Pluggable reduction**: the two extraction strategies live side by side and are
//     selected through `ExtractionAlgorithm`.

use crate::core_modules::depth_field::{ColorImage, DepthImage};
use crate::core_modules::extraction::{ExtractionAlgorithm, NEAREST_FRACTION, TemplateParams};
use crate::core_modules::point::{CellLocation, Point};
use image::Rgb;
use tracing::trace;

/// Color painted over pixels at or nearer than a cell's salient distance.
pub const HIGHLIGHT_COLOR: Rgb<u8> = Rgb([255, 0, 127]);

/// One grid cell: a depth block and its co-located color block.
#[derive(Debug, Clone)]
pub struct Cell {
    /// Row index of this cell in the grid.
    pub grid_row: u32,
    /// Column index of this cell in the grid.
    pub grid_col: u32,
    depth: DepthImage,
    color: ColorImage,
}

impl Cell {
    pub fn new(grid_row: u32, grid_col: u32, depth: DepthImage, color: ColorImage) -> Self {
        Self {
            grid_row,
            grid_col,
            depth,
            color,
        }
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

    /// Depth reading at `(row, col)` inside the cell.
    pub fn reading(&self, row: u32, col: u32) -> u16 {
        self.depth.get_pixel(col, row).0[0]
    }

    pub fn min_reading(&self) -> Option<u16> {
        self.depth.as_raw().iter().copied().min()
    }

    pub fn max_reading(&self) -> Option<u16> {
        self.depth.as_raw().iter().copied().max()
    }

    /// Replaces every reading below `threshold` with the mean of the cell's other readings,
    /// truncated toward zero like any float stored into a `u16` depth buffer.
    /// Returns how many readings were replaced.
    pub fn repair_shadows(&mut self, threshold: u16) -> usize {
        let count = self.depth.as_raw().len();
        if count < 2 {
            return 0;
        }

        let sum: u64 = self.depth.as_raw().iter().map(|&v| v as u64).sum();
        let others = (count - 1) as f64;
        let mut repaired = 0;

        for pixel in self.depth.pixels_mut() {
            let reading = pixel.0[0];
            if reading < threshold {
                let mean = (sum - reading as u64) as f64 / others;
                pixel.0[0] = mean as u16;
                repaired += 1;
            }
        }

        if repaired > 0 {
            trace!(
                row = self.grid_row,
                col = self.grid_col,
                repaired,
                "repaired shadow readings"
            );
        }
        repaired
    }

    /// Reduces the cell with the chosen strategy.
    pub fn point(&self, algorithm: &ExtractionAlgorithm) -> Point {
        match algorithm {
            ExtractionAlgorithm::PercentileNearest => self.percentile_point(),
            ExtractionAlgorithm::TemplateMatch(params) => self.template_point(params),
        }
    }

    /// Mean of the nearest `NEAREST_FRACTION` of readings, at least one reading.
    /// Both the subset size and the mean round half to even.
    pub fn percentile_point(&self) -> Point {
        let mut readings = self.depth.as_raw().clone();
        if readings.is_empty() {
            return Point::no_match();
        }
        readings.sort_unstable();

        let scaled = readings.len() as f64 * NEAREST_FRACTION;
        let take = (scaled.round_ties_even() as usize).max(1);
        let nearest = &readings[..take];
        let sum: u64 = nearest.iter().map(|&v| v as u64).sum();
        let mean = sum as f64 / take as f64;

        Point::without_location(mean.round_ties_even() as i32)
    }

    /// Scans candidate depths from the farthest reading to the nearest and returns the first
    /// whose uniform template matches somewhere in the cell within the threshold.
    pub fn template_point(&self, params: &TemplateParams) -> Point {
        let (Some(min), Some(max)) = (self.min_reading(), self.max_reading()) else {
            return Point::no_match();
        };

        let (template_height, template_width) =
            params.template_shape(self.height(), self.width());
        let tables = SummedAreaTables::new(&self.depth);

        let mut candidate = max as i64;
        while candidate >= min as i64 {
            let (score, location) =
                tables.best_uniform_match(candidate, template_height, template_width);
            if score as f64 <= params.threshold() {
                trace!(
                    row = self.grid_row,
                    col = self.grid_col,
                    depth = candidate,
                    score,
                    "template matched"
                );
                return Point::new(candidate as i32, Some(location));
            }
            candidate -= params.step() as i64;
        }

        Point::no_match()
    }

    /// Copy of the color block with every pixel at or nearer than `distance` highlighted.
    pub fn highlight_near(&self, distance: i32) -> ColorImage {
        let mut highlighted = self.color.clone();
        for (col, row, pixel) in highlighted.enumerate_pixels_mut() {
            if (self.reading(row, col) as i32) <= distance {
                *pixel = HIGHLIGHT_COLOR;
            }
        }
        highlighted
    }
}

/// Prefix sums of readings and squared readings, `(height + 1) x (width + 1)`.
///
/// The sum of squared differences between a uniform template of value `d` and a window
/// is `sum(v^2) - 2 d sum(v) + n d^2`, so every window costs O(1) once the tables exist.
struct SummedAreaTables {
    stride: usize,
    height: u32,
    width: u32,
    sums: Vec<u64>,
    squares: Vec<u64>,
}

impl SummedAreaTables {
    fn new(depth: &DepthImage) -> Self {
        let (width, height) = depth.dimensions();
        let stride = width as usize + 1;
        let mut sums = vec![0u64; stride * (height as usize + 1)];
        let mut squares = vec![0u64; stride * (height as usize + 1)];

        for row in 0..height as usize {
            let mut row_sum = 0u64;
            let mut row_squares = 0u64;
            for col in 0..width as usize {
                let value = depth.get_pixel(col as u32, row as u32).0[0] as u64;
                row_sum += value;
                row_squares += value * value;
                let index = (row + 1) * stride + col + 1;
                sums[index] = sums[index - stride] + row_sum;
                squares[index] = squares[index - stride] + row_squares;
            }
        }

        Self {
            stride,
            height,
            width,
            sums,
            squares,
        }
    }

    fn window(table: &[u64], stride: usize, row: usize, col: usize, h: usize, w: usize) -> u64 {
        let bottom = (row + h) * stride;
        let top = row * stride;
        table[bottom + col + w] + table[top + col] - table[top + col + w] - table[bottom + col]
    }

    /// Lowest squared-difference score of a uniform `depth` template over every offset,
    /// with the first offset (row-major) that achieves it.
    fn best_uniform_match(
        &self,
        depth: i64,
        template_height: u32,
        template_width: u32,
    ) -> (u128, CellLocation) {
        let (h, w) = (template_height as usize, template_width as usize);
        let area = (h * w) as i128;
        let depth = depth as i128;

        let mut best_score = u128::MAX;
        let mut best_location = CellLocation::default();

        for row in 0..=(self.height - template_height) as usize {
            for col in 0..=(self.width - template_width) as usize {
                let sum = Self::window(&self.sums, self.stride, row, col, h, w) as i128;
                let squares = Self::window(&self.squares, self.stride, row, col, h, w) as i128;
                let score = (squares - 2 * depth * sum + area * depth * depth) as u128;
                if score < best_score {
                    best_score = score;
                    best_location = CellLocation::new(row as u32, col as u32);
                }
            }
        }

        (best_score, best_location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Luma};

    fn cell_from_rows(rows: &[&[u16]]) -> Cell {
        let height = rows.len() as u32;
        let width = rows[0].len() as u32;
        let data: Vec<u16> = rows.iter().flat_map(|r| r.iter().copied()).collect();
        let depth: DepthImage = ImageBuffer::from_raw(width, height, data).unwrap();
        Cell::new(0, 0, depth, ColorImage::new(width, height))
    }

    fn uniform_cell(height: u32, width: u32, value: u16) -> Cell {
        let depth: DepthImage = ImageBuffer::from_pixel(width, height, Luma([value]));
        Cell::new(0, 0, depth, ColorImage::new(width, height))
    }

    #[test]
    fn shadow_reading_takes_mean_of_the_others() {
        let mut cell = cell_from_rows(&[
            &[50, 1000, 1000],
            &[1000, 1000, 1000],
            &[1000, 1000, 1000],
        ]);
        assert_eq!(cell.repair_shadows(200), 1);
        assert!(cell.depth().as_raw().iter().all(|&v| v == 1000));
    }

    #[test]
    fn shadow_repair_uses_the_pre_repair_snapshot() {
        // Both shadows see the other shadow's original reading, whatever the scan order.
        let mut cell = cell_from_rows(&[&[0, 100], &[900, 900]]);
        assert_eq!(cell.repair_shadows(200), 2);
        // (100 + 900 + 900) / 3 = 633.3, (0 + 900 + 900) / 3 = 600
        assert_eq!(cell.depth().as_raw(), &vec![633, 600, 900, 900]);
    }

    #[test]
    fn shadow_replacement_truncates_the_mean() {
        // (1000 + 1001 + 1001) / 3 = 1000.67
        let mut cell = cell_from_rows(&[&[0, 1000], &[1001, 1001]]);
        assert_eq!(cell.repair_shadows(200), 1);
        assert_eq!(cell.reading(0, 0), 1000);
    }

    #[test]
    fn single_pixel_cell_is_left_alone() {
        let mut cell = uniform_cell(1, 1, 10);
        assert_eq!(cell.repair_shadows(200), 0);
        assert_eq!(cell.reading(0, 0), 10);
    }

    #[test]
    fn percentile_averages_the_nearest_five_percent() {
        let data: Vec<u16> = (0..100).rev().collect();
        let depth: DepthImage = ImageBuffer::from_raw(10, 10, data).unwrap();
        let cell = Cell::new(0, 0, depth, ColorImage::new(10, 10));
        assert_eq!(cell.percentile_point(), Point::without_location(2));
    }

    #[test]
    fn percentile_rounds_half_to_even() {
        // 50 readings * 0.05 = 2.5 -> 2, and (1000 + 1001) / 2 = 1000.5 -> 1000.
        let data: Vec<u16> = (1000..1050).rev().collect();
        let depth: DepthImage = ImageBuffer::from_raw(10, 5, data).unwrap();
        let cell = Cell::new(0, 0, depth, ColorImage::new(10, 5));
        assert_eq!(cell.percentile_point(), Point::without_location(1000));

        // Odd half rounds up: (1001 + 1002) / 2 = 1001.5 -> 1002.
        let data: Vec<u16> = (1001..1051).collect();
        let depth: DepthImage = ImageBuffer::from_raw(5, 10, data).unwrap();
        let cell = Cell::new(0, 0, depth, ColorImage::new(5, 10));
        assert_eq!(cell.percentile_point().distance, 1002);
    }

    #[test]
    fn percentile_keeps_at_least_one_reading() {
        // 3 readings * 0.05 rounds to 0.
        let cell = cell_from_rows(&[&[700, 300, 500]]);
        assert_eq!(cell.percentile_point().distance, 300);
    }

    #[test]
    fn template_finds_a_uniform_cell() {
        let cell = uniform_cell(6, 8, 1234);
        let params = TemplateParams::new(0.5, 0.0, 7).unwrap();
        let point = cell.template_point(&params);
        assert_eq!(point.distance, 1234);
        assert_eq!(point.location, Some(CellLocation::new(0, 0)));
    }

    #[test]
    fn template_locates_a_flat_patch() {
        // A 2x2 flat patch at 400 in the lower right, speckled background.
        let cell = cell_from_rows(&[
            &[2000, 2600, 2000, 2600],
            &[2600, 2000, 2600, 2000],
            &[2000, 2600, 400, 400],
            &[2600, 2000, 400, 400],
        ]);
        let params = TemplateParams::new(0.5, 0.0, 100).unwrap();
        let point = cell.template_point(&params);
        assert_eq!(point.distance, 400);
        assert_eq!(point.location, Some(CellLocation::new(2, 2)));
    }

    #[test]
    fn template_scan_starts_from_the_farthest_reading() {
        let cell = cell_from_rows(&[
            &[2000, 2000, 2000, 2000],
            &[2000, 2000, 2000, 2000],
            &[2000, 2000, 400, 400],
            &[2000, 2000, 400, 400],
        ]);
        let params = TemplateParams::new(0.5, 0.0, 100).unwrap();
        let point = cell.template_point(&params);
        assert_eq!(point.distance, 2000);
        assert_eq!(point.location, Some(CellLocation::new(0, 0)));
    }

    #[test]
    fn template_without_a_match_returns_the_sentinel() {
        // Checkerboard: no 2x2 window is anywhere near uniform.
        let cell = cell_from_rows(&[
            &[100, 900, 100, 900],
            &[900, 100, 900, 100],
            &[100, 900, 100, 900],
            &[900, 100, 900, 100],
        ]);
        let params = TemplateParams::new(0.5, 0.0, 50).unwrap();
        let point = cell.template_point(&params);
        assert_eq!(point, Point::no_match());
        assert_eq!(point.distance, -1);
        assert_eq!(point.location, Some(CellLocation::new(0, 0)));
    }

    #[test]
    fn template_threshold_accepts_near_uniform_regions() {
        let cell = cell_from_rows(&[&[500, 510], &[490, 500]]);
        let strict = TemplateParams::new(1.0, 0.0, 5).unwrap();
        let loose = TemplateParams::new(1.0, 200.0, 5).unwrap();
        // At 500 the score is 10^2 + 10^2 = 200.
        assert_eq!(cell.template_point(&strict), Point::no_match());
        assert_eq!(cell.template_point(&loose).distance, 500);
    }

    #[test]
    fn highlight_marks_only_near_pixels() {
        let cell = cell_from_rows(&[&[300, 800], &[300, 1200]]);
        let highlighted = cell.highlight_near(800);
        assert_eq!(*highlighted.get_pixel(0, 0), HIGHLIGHT_COLOR);
        assert_eq!(*highlighted.get_pixel(1, 0), HIGHLIGHT_COLOR);
        assert_eq!(*highlighted.get_pixel(0, 1), HIGHLIGHT_COLOR);
        assert_eq!(*highlighted.get_pixel(1, 1), Rgb([0, 0, 0]));
    }
}
