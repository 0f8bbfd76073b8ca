//! Configuration loading for the haptic runner

use crate::display::MapStyle;
use anyhow::{Context, Result};
use haptic_vision::{ExtractionAlgorithm, GridLayout, PipelineConfig, TemplateParams};
use serde::Deserialize;
use std::path::Path;

/// Main configuration structure
#[derive(Clone, Debug, Deserialize, Default)]
pub struct RunnerConfig {
    #[serde(default)]
    pub grid: GridConfig,
    #[serde(default)]
    pub depth: DepthConfig,
    #[serde(default)]
    pub extraction: ExtractionAlgorithm,
    #[serde(default)]
    pub actuator: ActuatorConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

/// Haptic grid layout
#[derive(Clone, Debug, Deserialize)]
pub struct GridConfig {
    /// Rows of motors (default: 3)
    #[serde(default = "default_vertical_cells")]
    pub vertical_cells: u32,

    /// Columns of motors (default: 5)
    #[serde(default = "default_horizontal_cells")]
    pub horizontal_cells: u32,
}

/// Depth preprocessing
#[derive(Clone, Debug, Deserialize)]
pub struct DepthConfig {
    /// Readings below this are shadow artifacts, in millimetres (default: 200)
    #[serde(default = "default_shadow_threshold")]
    pub shadow_threshold: u16,

    /// Readings above this are clamped, in millimetres; 0 disables clamping (default: 9999)
    #[serde(default = "default_far_clamp")]
    pub far_clamp: u16,
}

/// Motor driver settings
#[derive(Clone, Debug, Deserialize)]
pub struct ActuatorConfig {
    /// Number of PWM channels on the driver board (default: 16)
    #[serde(default = "default_channels")]
    pub channels: usize,

    /// PWM frequency in Hz (default: 100)
    #[serde(default = "default_pwm_frequency")]
    pub pwm_frequency_hz: u32,
}

/// Terminal output
#[derive(Clone, Debug, Deserialize)]
pub struct DisplayConfig {
    /// How the point grid is logged (default: meter)
    #[serde(default)]
    pub map: MapStyle,

    /// Log the map every N frames, 0 disables it (default: 1)
    #[serde(default = "default_every_n_frames")]
    pub every_n_frames: u64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            vertical_cells: default_vertical_cells(),
            horizontal_cells: default_horizontal_cells(),
        }
    }
}

impl Default for DepthConfig {
    fn default() -> Self {
        Self {
            shadow_threshold: default_shadow_threshold(),
            far_clamp: default_far_clamp(),
        }
    }
}

impl Default for ActuatorConfig {
    fn default() -> Self {
        Self {
            channels: default_channels(),
            pwm_frequency_hz: default_pwm_frequency(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            map: MapStyle::default(),
            every_n_frames: default_every_n_frames(),
        }
    }
}

// Default value functions
fn default_vertical_cells() -> u32 {
    3
}
fn default_horizontal_cells() -> u32 {
    5
}
fn default_shadow_threshold() -> u16 {
    haptic_vision::DEFAULT_SHADOW_THRESHOLD
}
fn default_far_clamp() -> u16 {
    9_999
} // ~10 m
fn default_channels() -> usize {
    16
}
fn default_pwm_frequency() -> u32 {
    100
}
fn default_every_n_frames() -> u64 {
    1
}

/// Template parameters used when the algorithm is switched on the command line.
pub fn default_template_params() -> Result<TemplateParams> {
    Ok(TemplateParams::new(0.1, 3000.0, 30)?)
}

impl DepthConfig {
    /// The clamp ceiling handed to the pipeline, `None` when disabled.
    pub fn far_clamp_ceiling(&self) -> Option<u16> {
        (self.far_clamp > 0).then_some(self.far_clamp)
    }
}

impl RunnerConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("invalid configuration")
    }

    pub fn layout(&self) -> GridLayout {
        GridLayout::new(self.grid.vertical_cells, self.grid.horizontal_cells)
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig::new(self.layout())
            .with_shadow_threshold(self.depth.shadow_threshold)
            .with_far_clamp(self.depth.far_clamp_ceiling())
            .with_extraction(self.extraction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = RunnerConfig::parse("").unwrap();
        assert_eq!(config.layout(), GridLayout::new(3, 5));
        assert_eq!(config.depth.shadow_threshold, 200);
        assert_eq!(config.pipeline_config().far_clamp, Some(9_999));
        assert_eq!(config.extraction, ExtractionAlgorithm::PercentileNearest);
        assert_eq!(config.actuator.channels, 16);
        assert_eq!(config.display.map, MapStyle::Meter);
    }

    #[test]
    fn parses_a_template_deployment() {
        let config = RunnerConfig::parse(
            r#"
            [grid]
            vertical_cells = 2
            horizontal_cells = 2

            [extraction]
            algorithm = "template"
            prominence = 0.25
            threshold = 1500.0
            step = 20

            [display]
            map = "ascii"
            "#,
        )
        .unwrap();

        assert_eq!(config.layout(), GridLayout::new(2, 2));
        assert_eq!(
            config.pipeline_config().extraction,
            ExtractionAlgorithm::TemplateMatch(TemplateParams::new(0.25, 1500.0, 20).unwrap())
        );
        assert_eq!(config.display.map, MapStyle::Ascii);
    }

    #[test]
    fn example_file_matches_the_defaults() {
        let config = RunnerConfig::parse(include_str!("../haptic.example.toml")).unwrap();
        let defaults = RunnerConfig::default();
        assert_eq!(config.pipeline_config(), defaults.pipeline_config());
        assert_eq!(config.actuator.channels, defaults.actuator.channels);
        assert_eq!(config.display.map, defaults.display.map);
    }

    #[test]
    fn zero_far_clamp_disables_clamping() {
        let config = RunnerConfig::parse("[depth]\nfar_clamp = 0\n").unwrap();
        assert_eq!(config.pipeline_config().far_clamp, None);

        let config = RunnerConfig::parse("[depth]\nfar_clamp = 4000\n").unwrap();
        assert_eq!(config.pipeline_config().far_clamp, Some(4_000));
    }

    #[test]
    fn rejects_invalid_template_parameters() {
        let result = RunnerConfig::parse(
            r#"
            [extraction]
            algorithm = "template"
            prominence = 1.5
            threshold = 0.0
            step = 1
            "#,
        );
        assert!(result.is_err());
    }
}
