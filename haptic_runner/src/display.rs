//! Text renderings of the point grid for the terminal log.

use clap::ValueEnum;
use haptic_vision::{GridLayout, Point, Scene, Visualizer};
use serde::Deserialize;
use tracing::info;

/// How a frame's points are drawn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MapStyle {
    /// Distances in metres with one decimal.
    #[default]
    Meter,
    /// One glyph per distance band.
    Ascii,
    /// Raw sensor units.
    Int,
}

/// Glyph for a distance band, nearest obstacles drawn heaviest.
fn ascii_glyph(distance: i32) -> char {
    match distance {
        d if d >= 9_999 => ' ',
        d if d > 8_000 => '\'',
        d if d > 6_000 => '*',
        d if d > 4_000 => ':',
        d if d > 2_000 => '|',
        d if d > 0 => 'X',
        _ => '?',
    }
}

fn render_cell(point: &Point, style: MapStyle) -> String {
    match style {
        MapStyle::Meter => format!("{:.1}", point.distance as f64 / 1000.0),
        MapStyle::Ascii => ascii_glyph(point.distance).to_string(),
        MapStyle::Int => point.distance.to_string(),
    }
}

/// Renders `points` as `layout.vertical_cells` lines of right-aligned columns.
pub fn render_map(points: &[Point], layout: &GridLayout, style: MapStyle) -> String {
    let cells: Vec<String> = points.iter().map(|p| render_cell(p, style)).collect();
    let column_width = cells.iter().map(String::len).max().unwrap_or(0);

    cells
        .chunks(layout.horizontal_cells.max(1) as usize)
        .map(|row| {
            row.iter()
                .map(|cell| format!("{cell:>column_width$}"))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Logs the point grid of every `every_n_frames`-th scene; 0 disables it.
#[derive(Debug, Clone)]
pub struct MapVisualizer {
    style: MapStyle,
    every_n_frames: u64,
    presented: u64,
}

impl MapVisualizer {
    pub fn new(style: MapStyle, every_n_frames: u64) -> Self {
        Self {
            style,
            every_n_frames,
            presented: 0,
        }
    }

    /// Whether the scene presented next will be logged.
    fn due(&self) -> bool {
        self.every_n_frames > 0 && self.presented % self.every_n_frames == 0
    }
}

impl Visualizer for MapVisualizer {
    fn present(&mut self, scene: &Scene) {
        if self.due() {
            info!(
                "\n{}",
                render_map(scene.points(), scene.layout(), self.style)
            );
        }
        self.presented += 1;
    }
}
