// THEORY:
// The engine never talks to hardware. A `FrameSource` hands it depth/color pairs
// (blocking until the sensor has one), an `ActuatorBank` receives one power level
// per cell and a `Visualizer` is shown each reduced scene. They are traits so the
// control loop can run against a real sensor and motor driver, a recording, or a
// test double without the core knowing which.

use crate::core_modules::depth_field::{ColorImage, DepthImage};
use crate::core_modules::power_map::PowerLevel;
use crate::core_modules::scene::Scene;

/// A co-registered depth/color pair as delivered by the sensor.
#[derive(Debug, Clone)]
pub struct Frame {
    pub depth: DepthImage,
    pub color: ColorImage,
}

impl Frame {
    pub fn new(depth: DepthImage, color: ColorImage) -> Self {
        Self { depth, color }
    }
}

/// Produces frames on demand.
pub trait FrameSource {
    type Error;

    /// Blocks until the next frame pair is available. `Ok(None)` means the stream has ended.
    fn next_frame(&mut self) -> Result<Option<Frame>, Self::Error>;
}

/// Drives one vibration motor per grid cell. Writes are fire-and-forget.
pub trait ActuatorBank {
    /// Number of addressable channels.
    fn channel_count(&self) -> usize;

    /// Sets channel `i` to `levels[i]`. Levels past `channel_count` are ignored.
    fn apply(&mut self, levels: &[PowerLevel]);

    /// Silences every channel.
    fn zero_all(&mut self) {
        let off = PowerLevel::all_off(self.channel_count());
        self.apply(&off);
    }
}

/// Displays reduced frames. Only scenes that reduced successfully are presented.
pub trait Visualizer {
    fn present(&mut self, scene: &Scene);
}
