// THEORY:
// A cell is reduced to a single distance by one of two interchangeable strategies.
// The strategy is picked once per deployment and handed to every frame, so it is a
// plain tagged enum rather than a trait object in the per-frame hot path.
//
// - `PercentileNearest`: mean of the nearest 5% of readings. Robust to speckle while
//   still reporting the nearest obstacle cluster instead of the cell average.
// - `TemplateMatch`: slides a uniform-depth template over the cell and reports the
//   nearest depth at which a flat region of the template's size exists.

use crate::error::{Result, SceneError};
use serde::Deserialize;

/// Fraction of a cell's sorted readings averaged by the percentile strategy.
pub const NEAREST_FRACTION: f64 = 0.05;

/// Validated parameters of the template cross-correlation strategy.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(try_from = "RawTemplateParams")]
pub struct TemplateParams {
    prominence: f64,
    threshold: f64,
    step: u32,
}

impl TemplateParams {
    /// `prominence` in (0, 1] sizes the template relative to the cell, `threshold` is the
    /// highest accepted sum of squared differences, `step` the decrement between candidates.
    pub fn new(prominence: f64, threshold: f64, step: u32) -> Result<Self> {
        if !(prominence > 0.0 && prominence <= 1.0) {
            return Err(SceneError::InvalidConfiguration(format!(
                "template prominence must be in (0, 1], got {prominence}"
            )));
        }
        if !(threshold >= 0.0) {
            return Err(SceneError::InvalidConfiguration(format!(
                "template threshold must be non-negative, got {threshold}"
            )));
        }
        if step == 0 {
            return Err(SceneError::InvalidConfiguration(
                "template step must be positive".to_string(),
            ));
        }
        Ok(Self {
            prominence,
            threshold,
            step,
        })
    }

    pub fn prominence(&self) -> f64 {
        self.prominence
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn step(&self) -> u32 {
        self.step
    }

    /// Template height and width for a cell of `height` x `width` pixels.
    pub fn template_shape(&self, height: u32, width: u32) -> (u32, u32) {
        let scaled = |length: u32| {
            ((length as f64 * self.prominence).ceil() as u32).clamp(1, length.max(1))
        };
        (scaled(height), scaled(width))
    }
}

#[derive(Deserialize)]
struct RawTemplateParams {
    prominence: f64,
    threshold: f64,
    step: u32,
}

impl TryFrom<RawTemplateParams> for TemplateParams {
    type Error = SceneError;

    fn try_from(raw: RawTemplateParams) -> Result<Self> {
        TemplateParams::new(raw.prominence, raw.threshold, raw.step)
    }
}

/// Strategy used to reduce each cell to its salient point.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Default)]
#[serde(tag = "algorithm")]
pub enum ExtractionAlgorithm {
    #[default]
    #[serde(rename = "percentile")]
    PercentileNearest,
    #[serde(rename = "template")]
    TemplateMatch(TemplateParams),
}

impl ExtractionAlgorithm {
    pub fn name(&self) -> &'static str {
        match self {
            ExtractionAlgorithm::PercentileNearest => "percentile",
            ExtractionAlgorithm::TemplateMatch(_) => "template",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_parameters() {
        for (prominence, threshold, step) in [
            (0.0, 0.0, 1),
            (-0.5, 0.0, 1),
            (1.5, 0.0, 1),
            (f64::NAN, 0.0, 1),
            (0.5, -1.0, 1),
            (0.5, f64::NAN, 1),
            (0.5, 0.0, 0),
        ] {
            assert!(matches!(
                TemplateParams::new(prominence, threshold, step),
                Err(SceneError::InvalidConfiguration(_))
            ));
        }
        assert!(TemplateParams::new(1.0, 0.0, 1).is_ok());
    }

    #[test]
    fn template_shape_rounds_up_and_fits() {
        let params = TemplateParams::new(0.1, 3000.0, 30).unwrap();
        assert_eq!(params.template_shape(160, 128), (16, 13));
        assert_eq!(params.template_shape(3, 3), (1, 1));

        let whole = TemplateParams::new(1.0, 0.0, 1).unwrap();
        assert_eq!(whole.template_shape(7, 5), (7, 5));
    }
}
