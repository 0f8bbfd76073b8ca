// THEORY:
// A `Point` is what a whole `Cell` collapses to: one representative distance and,
// when the extraction algorithm can say where it was found, a pixel position inside
// the cell. Points are a "dumb" data container, ordered 1:1 with the scene's cells.

/// Pixel position inside a cell, `row` from the top and `col` from the left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CellLocation {
    pub row: u32,
    pub col: u32,
}

impl CellLocation {
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }
}

/// The salient distance of a single cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    /// Distance in sensor units. Negative values are sentinels (see `Point::NO_MATCH_DISTANCE`).
    pub distance: i32,
    /// Where the distance was found, or `None` when the algorithm has no notion of location.
    pub location: Option<CellLocation>,
}

impl Point {
    /// Distance reported by template matching when no candidate depth met the threshold.
    pub const NO_MATCH_DISTANCE: i32 = -1;

    pub fn new(distance: i32, location: Option<CellLocation>) -> Self {
        Self { distance, location }
    }

    pub fn without_location(distance: i32) -> Self {
        Self {
            distance,
            location: None,
        }
    }

    pub fn no_match() -> Self {
        Self {
            distance: Self::NO_MATCH_DISTANCE,
            location: Some(CellLocation::default()),
        }
    }

    pub fn is_no_match(&self) -> bool {
        self.distance == Self::NO_MATCH_DISTANCE
    }
}
