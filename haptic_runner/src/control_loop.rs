//! The frame loop: capture, reduce, actuate, report.

use crate::stats::FrameStats;
use anyhow::Result;
use haptic_vision::{ActuatorBank, DepthPipeline, FrameSource, Visualizer};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Loop settings that are not part of the reduction itself.
#[derive(Debug, Clone, Default)]
pub struct LoopOptions {
    /// Stop after this many frames; `None` runs until the source ends or a stop is requested.
    pub frame_limit: Option<u64>,
}

/// The collaborators the loop drives.
pub struct Devices<'a, S: ?Sized, A: ?Sized, V: ?Sized> {
    pub source: &'a mut S,
    pub bank: &'a mut A,
    pub visualizer: &'a mut V,
}

/// Runs frames until `stop` is set, the source ends or the frame limit is reached.
/// Every actuator is zeroed before returning, including when the source fails.
pub fn run<S, A, V>(
    pipeline: &DepthPipeline,
    devices: Devices<'_, S, A, V>,
    stop: &AtomicBool,
    options: &LoopOptions,
    stats: &mut FrameStats,
) -> Result<()>
where
    S: FrameSource<Error = anyhow::Error> + ?Sized,
    A: ActuatorBank + ?Sized,
    V: Visualizer + ?Sized,
{
    let Devices {
        source,
        bank,
        visualizer,
    } = devices;
    let result = run_frames(pipeline, source, bank, visualizer, stop, options, stats);
    bank.zero_all();
    info!(
        frames = stats.frames,
        failed = stats.failed_frames,
        "stopped, average {:.1} fps",
        stats.average_fps()
    );
    result
}

fn run_frames<S, A, V>(
    pipeline: &DepthPipeline,
    source: &mut S,
    bank: &mut A,
    visualizer: &mut V,
    stop: &AtomicBool,
    options: &LoopOptions,
    stats: &mut FrameStats,
) -> Result<()>
where
    S: FrameSource<Error = anyhow::Error> + ?Sized,
    A: ActuatorBank + ?Sized,
    V: Visualizer + ?Sized,
{
    while !stop.load(Ordering::SeqCst) {
        if options.frame_limit.is_some_and(|limit| stats.frames >= limit) {
            break;
        }

        let start = Instant::now();
        let Some(frame) = source.next_frame()? else {
            info!("frame source ended");
            break;
        };

        match pipeline.process(frame.depth, frame.color) {
            Ok(scene) => {
                bank.apply(&scene.power_levels());
                stats.record(start.elapsed(), false);
                visualizer.present(&scene);
                debug!(
                    "------ {:.1} fps ----- {:.1} average fps ------",
                    stats.current_fps,
                    stats.average_fps()
                );
            }
            Err(e) => {
                warn!("frame {} dropped: {}", stats.frames, e);
                bank.apply(&pipeline.idle_levels());
                stats.record(start.elapsed(), true);
            }
        }
    }
    Ok(())
}
