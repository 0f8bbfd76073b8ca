// THEORY:
// `haptic_vision` turns what a depth camera sees into what a person can feel. Every
// frame, a dense depth map is cut into a small grid of cells, each cell is reduced to
// the distance of its nearest salient obstacle, and each distance becomes a duty cycle
// for one vibration motor.
//
// The public surface is the `DepthPipeline` facade plus the building blocks it is made
// of (`Scene`, `Cell`, `GridLayout`, `quantize`). Sensor acquisition, motor output
// and display are collaborator traits; the crate itself is pure, single-threaded
// computation on in-memory images and keeps no state between frames.

pub mod collaborators;
pub mod core_modules;
pub mod error;
pub mod pipeline;

pub use collaborators::{ActuatorBank, Frame, FrameSource, Visualizer};
pub use core_modules::cell::Cell;
pub use core_modules::depth_field::{ColorImage, DepthField, DepthImage};
pub use core_modules::extraction::{ExtractionAlgorithm, TemplateParams};
pub use core_modules::grid_geometry::{AxisCrop, CropBounds, GridLayout, compute_crop};
pub use core_modules::point::{CellLocation, Point};
pub use core_modules::power_map::{PowerLevel, quantize};
pub use core_modules::scene::{DEFAULT_SHADOW_THRESHOLD, Scene, extract_points, reduce};
pub use error::{Result, SceneError};
pub use pipeline::{DepthPipeline, PipelineConfig};
