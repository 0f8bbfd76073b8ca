//! Frame sources standing in for the depth camera.

use anyhow::{Context, Result, bail};
use haptic_vision::{ColorImage, DepthImage, Frame, FrameSource};
use image::{Luma, Rgb};
use std::path::{Path, PathBuf};
use tracing::info;

const BACKGROUND_MM: u16 = 3_000;
const OBSTACLE_MM: u16 = 600;
/// Width of the left-edge band with no stereo overlap, reported as 0.
const SHADOW_BAND: u32 = 8;

/// Deterministic scene: a speckled far wall with a near obstacle sweeping left to right.
#[derive(Debug, Clone)]
pub struct SyntheticSource {
    width: u32,
    height: u32,
    frame_index: u32,
}

impl SyntheticSource {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            frame_index: 0,
        }
    }

    fn render(&self) -> Frame {
        let (width, height) = (self.width, self.height);
        let obstacle_width = (width / 5).max(1);
        let obstacle_top = height / 3;
        let obstacle_bottom = obstacle_top + (height / 3).max(1);
        let obstacle_left = self.frame_index.wrapping_mul(8) % width.max(1);
        let frame = self.frame_index;

        let depth = DepthImage::from_fn(width, height, |x, y| {
            if x < SHADOW_BAND {
                return Luma([0]);
            }
            let in_obstacle = x >= obstacle_left
                && x < obstacle_left + obstacle_width
                && y >= obstacle_top
                && y < obstacle_bottom;
            if in_obstacle {
                Luma([OBSTACLE_MM])
            } else {
                let speckle = (x * 7 + y * 13).wrapping_add(frame.wrapping_mul(3)) % 64;
                Luma([BACKGROUND_MM + speckle as u16])
            }
        });
        let color = ColorImage::from_fn(width, height, |x, y| {
            Rgb([(x * 255 / width) as u8, (y * 255 / height) as u8, 96])
        });

        Frame::new(depth, color)
    }
}

impl FrameSource for SyntheticSource {
    type Error = anyhow::Error;

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        let frame = self.render();
        self.frame_index = self.frame_index.wrapping_add(1);
        Ok(Some(frame))
    }
}

/// Replays `depth_<n>.png` (16-bit grayscale, millimetres) and `color_<n>.png` pairs from a directory.
#[derive(Debug, Clone)]
pub struct ImageSequenceSource {
    pairs: Vec<(PathBuf, PathBuf)>,
    next: usize,
}

impl ImageSequenceSource {
    pub fn open(dir: &Path) -> Result<Self> {
        let mut depth_paths = Vec::new();
        for entry in std::fs::read_dir(dir)
            .with_context(|| format!("failed to read replay directory {}", dir.display()))?
        {
            let path = entry?.path();
            let is_depth = path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with("depth_") && name.ends_with(".png"));
            if is_depth {
                depth_paths.push(path);
            }
        }
        depth_paths.sort();

        let mut pairs = Vec::with_capacity(depth_paths.len());
        for depth_path in depth_paths {
            let color_path = color_path_for(&depth_path)?;
            if !color_path.exists() {
                bail!("missing color frame {}", color_path.display());
            }
            pairs.push((depth_path, color_path));
        }

        info!("Replaying {} frames from {}", pairs.len(), dir.display());
        Ok(Self { pairs, next: 0 })
    }
}

fn color_path_for(depth_path: &Path) -> Result<PathBuf> {
    let name = depth_path
        .file_name()
        .and_then(|name| name.to_str())
        .context("depth frame has no file name")?;
    let suffix = name.trim_start_matches("depth_");
    Ok(depth_path.with_file_name(format!("color_{suffix}")))
}

impl FrameSource for ImageSequenceSource {
    type Error = anyhow::Error;

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        let Some((depth_path, color_path)) = self.pairs.get(self.next) else {
            return Ok(None);
        };
        self.next += 1;

        let depth = image::open(depth_path)
            .with_context(|| format!("failed to load {}", depth_path.display()))?
            .into_luma16();
        let color = image::open(color_path)
            .with_context(|| format!("failed to load {}", color_path.display()))?
            .into_rgb8();
        Ok(Some(Frame::new(depth, color)))
    }
}
