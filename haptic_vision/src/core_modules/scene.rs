// THEORY:
// The `Scene` is the orchestrator of a single frame. It owns the cropped depth field,
// the grid layout, the derived cells and, once extracted, the points. It lives for
// exactly one frame: the next frame builds a brand new `Scene`, so there is no
// cross-frame state to manage and nothing to lock.
//
// Flow: raw depth + color -> `DepthField` -> radial crop -> partition into `Cell`s
// -> per-cell shadow repair -> per-cell `Point` -> `PowerLevel`.

use crate::core_modules::cell::Cell;
use crate::core_modules::depth_field::{ColorImage, DepthField, DepthImage};
use crate::core_modules::extraction::ExtractionAlgorithm;
use crate::core_modules::grid_geometry::{CropBounds, GridLayout};
use crate::core_modules::point::Point;
use crate::core_modules::power_map::{PowerLevel, quantize};
use crate::error::Result;
use image::imageops;
use tracing::debug;

/// Readings below this distance are treated as sensor shadow (0.2 m for millimetre sensors).
pub const DEFAULT_SHADOW_THRESHOLD: u16 = 200;

/// One frame, cropped and partitioned into cells.
#[derive(Debug, Clone)]
pub struct Scene {
    field: DepthField,
    layout: GridLayout,
    crop: CropBounds,
    cells: Vec<Cell>,
    points: Vec<Point>,
}

impl Scene {
    /// Crops, partitions and shadow-repairs a frame with the default shadow threshold.
    pub fn reduce(depth: DepthImage, color: ColorImage, layout: GridLayout) -> Result<Self> {
        Self::from_field(DepthField::new(depth, color)?, layout, DEFAULT_SHADOW_THRESHOLD)
    }

    /// Crops, partitions and shadow-repairs an existing field.
    pub fn from_field(
        mut field: DepthField,
        layout: GridLayout,
        shadow_threshold: u16,
    ) -> Result<Self> {
        let crop = field.crop_to_grid(&layout)?;
        let mut cells = field.partition(&layout)?;

        let repaired: usize = cells
            .iter_mut()
            .map(|cell| cell.repair_shadows(shadow_threshold))
            .sum();
        debug!(
            cells = cells.len(),
            repaired, "partitioned {}x{} frame", field.height(), field.width()
        );

        Ok(Self {
            field,
            layout,
            crop,
            cells,
            points: Vec::new(),
        })
    }

    /// Reduces every cell to its salient point and keeps the result on the scene.
    pub fn extract_points(&mut self, algorithm: &ExtractionAlgorithm) -> &[Point] {
        self.points = extract_points(self, algorithm);
        &self.points
    }

    pub fn field(&self) -> &DepthField {
        &self.field
    }

    pub fn layout(&self) -> &GridLayout {
        &self.layout
    }

    /// The crop applied to the raw frame.
    pub fn crop_bounds(&self) -> &CropBounds {
        &self.crop
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Points from the last `extract_points` call; empty before the first.
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// One power level per cell. All channels are off when no points have been extracted.
    pub fn power_levels(&self) -> Vec<PowerLevel> {
        if self.points.is_empty() {
            return PowerLevel::all_off(self.cells.len());
        }
        self.points.iter().map(|p| quantize(p.distance)).collect()
    }

    /// Reassembles the color cells into one image, highlighting pixels at or nearer than
    /// their cell's point. Returns `None` before points are extracted.
    pub fn highlight_near_pixels(&self) -> Option<ColorImage> {
        if self.points.len() != self.cells.len() {
            return None;
        }

        let mut canvas = ColorImage::new(self.field.width(), self.field.height());
        for (cell, point) in self.cells.iter().zip(&self.points) {
            let x = (cell.grid_col * cell.width()) as i64;
            let y = (cell.grid_row * cell.height()) as i64;
            imageops::replace(&mut canvas, &cell.highlight_near(point.distance), x, y);
        }
        Some(canvas)
    }
}

/// Crops, partitions and shadow-repairs a frame. See `Scene::reduce`.
pub fn reduce(depth: DepthImage, color: ColorImage, layout: GridLayout) -> Result<Scene> {
    Scene::reduce(depth, color, layout)
}

/// Points for every cell of `scene`, in row-major cell order.
pub fn extract_points(scene: &Scene, algorithm: &ExtractionAlgorithm) -> Vec<Point> {
    scene.cells.iter().map(|cell| cell.point(algorithm)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::cell::HIGHLIGHT_COLOR;
    use crate::core_modules::extraction::TemplateParams;
    use crate::error::SceneError;
    use image::{Luma, Rgb};

    fn flat_frame(height: u32, width: u32, value: u16) -> (DepthImage, ColorImage) {
        (
            DepthImage::from_pixel(width, height, Luma([value])),
            ColorImage::new(width, height),
        )
    }

    #[test]
    fn reduce_crops_to_a_divisible_frame() {
        let (depth, color) = flat_frame(14, 29, 500);
        let scene = Scene::reduce(depth, color, GridLayout::new(5, 7)).unwrap();
        assert_eq!((scene.field().height(), scene.field().width()), (10, 28));
        assert_eq!(scene.cells().len(), 35);
        assert!(scene.cells().iter().all(|c| (c.height(), c.width()) == (2, 4)));
        assert!(scene.points().is_empty());
    }

    #[test]
    fn reduce_rejects_bad_layouts() {
        for layout in [
            GridLayout::new(0, 3),
            GridLayout::new(3, 0),
            GridLayout::new(9, 3),
            GridLayout::new(3, 7),
        ] {
            let (depth, color) = flat_frame(8, 6, 500);
            assert!(matches!(
                reduce(depth, color, layout),
                Err(SceneError::InvalidConfiguration(_))
            ));
        }
    }

    #[test]
    fn reduce_rejects_empty_frames() {
        let (depth, color) = flat_frame(0, 0, 0);
        assert!(matches!(
            reduce(depth, color, GridLayout::new(1, 1)),
            Err(SceneError::EmptyInput { .. })
        ));
    }

    #[test]
    fn shadow_repair_happens_per_cell() {
        // Left cell at 1000 with one shadow, right cell at 3000.
        let mut depth = DepthImage::from_fn(6, 3, |x, _| Luma([if x < 3 { 1000 } else { 3000 }]));
        depth.put_pixel(0, 0, Luma([50]));
        let scene = Scene::reduce(depth, ColorImage::new(6, 3), GridLayout::new(1, 2)).unwrap();
        assert!(scene.cells()[0].depth().as_raw().iter().all(|&v| v == 1000));
        assert!(scene.cells()[1].depth().as_raw().iter().all(|&v| v == 3000));
    }

    #[test]
    fn points_align_with_cells() {
        let depth = DepthImage::from_fn(4, 4, |x, y| Luma([300 + 200 * (y / 2 * 2 + x / 2) as u16]));
        let mut scene =
            Scene::reduce(depth, ColorImage::new(4, 4), GridLayout::new(2, 2)).unwrap();

        let distances: Vec<i32> = scene
            .extract_points(&ExtractionAlgorithm::PercentileNearest)
            .iter()
            .map(|p| p.distance)
            .collect();
        assert_eq!(distances, vec![300, 500, 700, 900]);
        assert_eq!(
            scene.power_levels(),
            vec![
                PowerLevel(55_000),
                PowerLevel(45_000),
                PowerLevel(35_000),
                PowerLevel(25_000)
            ]
        );

        let template = ExtractionAlgorithm::TemplateMatch(TemplateParams::new(0.5, 0.0, 1).unwrap());
        let matched = extract_points(&scene, &template);
        assert_eq!(matched.len(), 4);
        assert_eq!(matched[3].distance, 900);
    }

    #[test]
    fn power_levels_are_off_without_points() {
        let (depth, color) = flat_frame(6, 6, 100);
        let scene = reduce(depth, color, GridLayout::new(3, 2)).unwrap();
        assert_eq!(scene.power_levels(), PowerLevel::all_off(6));
    }

    #[test]
    fn highlight_reassembles_the_frame() {
        let depth = DepthImage::from_fn(4, 2, |x, _| Luma([if x % 2 == 0 { 400 } else { 2000 }]));
        let color = ColorImage::from_pixel(4, 2, Rgb([10, 20, 30]));
        let mut scene = Scene::reduce(depth, color, GridLayout::new(1, 2)).unwrap();
        assert!(scene.highlight_near_pixels().is_none());

        scene.extract_points(&ExtractionAlgorithm::PercentileNearest);
        let overlay = scene.highlight_near_pixels().unwrap();
        assert_eq!(overlay.dimensions(), (4, 2));
        for (x, _, pixel) in overlay.enumerate_pixels() {
            let expected = if x % 2 == 0 { HIGHLIGHT_COLOR } else { Rgb([10, 20, 30]) };
            assert_eq!(*pixel, expected);
        }
    }
}
