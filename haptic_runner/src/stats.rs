//! Frame-rate bookkeeping, passed explicitly through the control loop.

use std::time::Duration;

/// Reported when a frame completes in no measurable time.
const FPS_CEILING: f64 = 60.0;

/// Running frame-rate statistics.
#[derive(Debug, Clone, Default)]
pub struct FrameStats {
    /// Frames per second of the most recent frame.
    pub current_fps: f64,
    total_fps: f64,
    /// Frames processed, including failed ones.
    pub frames: u64,
    /// Frames whose reduction failed and were sent as all-off.
    pub failed_frames: u64,
}

impl FrameStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one frame that took `elapsed` from capture to actuation.
    pub fn record(&mut self, elapsed: Duration, failed: bool) {
        let seconds = elapsed.as_secs_f64();
        self.current_fps = if seconds > 0.0 {
            1.0 / seconds
        } else {
            FPS_CEILING
        };
        self.total_fps += self.current_fps;
        self.frames += 1;
        if failed {
            self.failed_frames += 1;
        }
    }

    pub fn average_fps(&self) -> f64 {
        if self.frames == 0 {
            return 0.0;
        }
        self.total_fps / self.frames as f64
    }
}
