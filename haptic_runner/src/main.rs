//! haptic_runner - drives the haptic grid from a depth frame source.
//!
//! Reads frames from a synthetic scene or a recorded PNG sequence, reduces each one
//! with `haptic_vision`, and pushes the power levels to the actuator bank until the
//! source ends, the frame limit is hit, or Ctrl+C is pressed.

mod actuator;
mod config;
mod control_loop;
mod display;
mod frame_source;
mod stats;

use actuator::LoggingActuatorBank;
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use config::RunnerConfig;
use control_loop::{Devices, LoopOptions};
use display::{MapStyle, MapVisualizer};
use frame_source::{ImageSequenceSource, SyntheticSource};
use haptic_vision::{DepthPipeline, ExtractionAlgorithm, FrameSource};
use stats::FrameStats;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::info;

const DEFAULT_CONFIG_FILE: &str = "haptic.toml";

#[derive(Parser)]
#[command(name = "haptic_runner")]
#[command(about = "Turn depth frames into haptic motor power levels")]
#[command(version)]
struct Cli {
    /// TOML configuration file (default: ./haptic.toml if present).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory of depth_<n>.png / color_<n>.png pairs to replay instead of the synthetic scene.
    #[arg(long)]
    replay: Option<PathBuf>,

    /// Synthetic frame width in pixels.
    #[arg(long, default_value_t = 640)]
    width: u32,

    /// Synthetic frame height in pixels.
    #[arg(long, default_value_t = 480)]
    height: u32,

    /// Stop after this many frames.
    #[arg(long)]
    frames: Option<u64>,

    /// Override the extraction algorithm from the configuration.
    #[arg(long, value_enum)]
    algorithm: Option<AlgorithmChoice>,

    /// Override the map style from the configuration.
    #[arg(long, value_enum)]
    map: Option<MapStyle>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum AlgorithmChoice {
    Percentile,
    Template,
}

fn load_config(path: Option<&Path>) -> Result<RunnerConfig> {
    if let Some(path) = path {
        info!("Loading configuration from {}", path.display());
        return RunnerConfig::load(path);
    }
    let default_path = Path::new(DEFAULT_CONFIG_FILE);
    if default_path.exists() {
        info!("Loading configuration from {}", DEFAULT_CONFIG_FILE);
        RunnerConfig::load(default_path)
    } else {
        info!("Using default configuration");
        Ok(RunnerConfig::default())
    }
}

fn main() -> Result<()> {
    // --- 1. Logging & Argument Parsing ---
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new("haptic_runner=info,haptic_vision=info")
            }),
        )
        .init();

    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_deref())?;

    match cli.algorithm {
        Some(AlgorithmChoice::Percentile) => {
            config.extraction = ExtractionAlgorithm::PercentileNearest;
        }
        Some(AlgorithmChoice::Template) => {
            if !matches!(config.extraction, ExtractionAlgorithm::TemplateMatch(_)) {
                config.extraction =
                    ExtractionAlgorithm::TemplateMatch(config::default_template_params()?);
            }
        }
        None => {}
    }
    if let Some(map) = cli.map {
        config.display.map = map;
    }

    info!("haptic_runner v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Grid {}x{}, {} extraction, shadow threshold {} mm",
        config.grid.vertical_cells,
        config.grid.horizontal_cells,
        config.extraction.name(),
        config.depth.shadow_threshold
    );

    // --- 2. Collaborators ---
    let mut source: Box<dyn FrameSource<Error = anyhow::Error>> = match &cli.replay {
        Some(dir) => Box::new(ImageSequenceSource::open(dir)?),
        None => Box::new(SyntheticSource::new(cli.width, cli.height)),
    };
    let mut bank =
        LoggingActuatorBank::new(config.actuator.channels, config.actuator.pwm_frequency_hz);
    let mut visualizer = MapVisualizer::new(config.display.map, config.display.every_n_frames);

    let stop = Arc::new(AtomicBool::new(false));
    let stop_handler = Arc::clone(&stop);
    ctrlc::set_handler(move || {
        stop_handler.store(true, Ordering::SeqCst);
    })
    .context("failed to install Ctrl+C handler")?;

    // --- 3. Frame Loop ---
    let pipeline = DepthPipeline::new(config.pipeline_config());
    let options = LoopOptions {
        frame_limit: cli.frames,
    };
    let devices = Devices {
        source: source.as_mut(),
        bank: &mut bank,
        visualizer: &mut visualizer,
    };
    let mut stats = FrameStats::new();

    control_loop::run(&pipeline, devices, &stop, &options, &mut stats)
}
