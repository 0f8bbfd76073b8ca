// THEORY:
// The `pipeline` module is the top-level API of the engine. It wraps the full stack
// (clamp, crop, partition, repair, extract) behind one call per frame so the control
// loop only ever deals with a depth/color pair going in and a `Scene` with points and
// power levels coming out.
//
// A failed frame is not a failed run: callers map an `Err` to `idle_levels()` so every
// actuator goes quiet for that frame, and carry on with the next one.

use crate::core_modules::depth_field::{ColorImage, DepthField, DepthImage};
use crate::core_modules::extraction::ExtractionAlgorithm;
use crate::core_modules::grid_geometry::GridLayout;
use crate::core_modules::power_map::PowerLevel;
use crate::core_modules::scene::{DEFAULT_SHADOW_THRESHOLD, Scene};
use crate::error::Result;
use tracing::debug;

/// Configuration for the DepthPipeline, fixed for the lifetime of a deployment.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub grid: GridLayout,
    /// Readings below this are sensor shadow and get repaired per cell.
    pub shadow_threshold: u16,
    /// Readings above this are clamped before reduction. `None` disables clamping.
    pub far_clamp: Option<u16>,
    pub extraction: ExtractionAlgorithm,
}

impl PipelineConfig {
    pub fn new(grid: GridLayout) -> Self {
        Self {
            grid,
            shadow_threshold: DEFAULT_SHADOW_THRESHOLD,
            far_clamp: None,
            extraction: ExtractionAlgorithm::PercentileNearest,
        }
    }

    pub fn with_extraction(mut self, extraction: ExtractionAlgorithm) -> Self {
        self.extraction = extraction;
        self
    }

    pub fn with_shadow_threshold(mut self, shadow_threshold: u16) -> Self {
        self.shadow_threshold = shadow_threshold;
        self
    }

    pub fn with_far_clamp(mut self, far_clamp: Option<u16>) -> Self {
        self.far_clamp = far_clamp;
        self
    }
}

/// The main, top-level struct for the reduction engine.
#[derive(Debug, Clone)]
pub struct DepthPipeline {
    config: PipelineConfig,
}

impl DepthPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Runs one frame through the full pipeline and returns the scene with its points extracted.
    pub fn process(&self, depth: DepthImage, color: ColorImage) -> Result<Scene> {
        // Stage 1: validation and far clamp
        let mut field = DepthField::new(depth, color)?;
        if let Some(ceiling) = self.config.far_clamp {
            let clamped = field.clamp_far(ceiling);
            debug!(clamped, ceiling, "clamped far readings");
        }

        // Stage 2: crop, partition and shadow repair
        let mut scene = Scene::from_field(field, self.config.grid, self.config.shadow_threshold)?;

        // Stage 3: salient point per cell
        scene.extract_points(&self.config.extraction);
        Ok(scene)
    }

    /// Power levels for one frame, one per cell; all off when `process` failed.
    pub fn process_levels(&self, depth: DepthImage, color: ColorImage) -> Vec<PowerLevel> {
        match self.process(depth, color) {
            Ok(scene) => scene.power_levels(),
            Err(_) => self.idle_levels(),
        }
    }

    /// One `OFF` level per configured cell.
    pub fn idle_levels(&self) -> Vec<PowerLevel> {
        PowerLevel::all_off(self.config.grid.cell_count())
    }
}
