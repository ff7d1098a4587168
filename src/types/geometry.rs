use serde::{Deserialize, Serialize};

/// Fixed-point length in internal units. All grid arithmetic is exact.
pub type Coord = i64;

/// Internal units per typographic point.
pub const UNITS_PER_POINT: Coord = 1000;

/// Convert points to internal units, rounding to the nearest unit.
#[allow(clippy::cast_possible_truncation)]
pub fn from_points(points: f64) -> Coord {
    (points * 1000.0).round() as Coord
}

/// Convert internal units to points.
#[allow(clippy::cast_precision_loss)]
pub fn to_points(value: Coord) -> f64 {
    value as f64 / 1000.0
}

/// Move a vertical coordinate from a section's own frame into the page's
/// shared frame: `header_size + clamp(y - vertical_offset, 0, max_height)`.
pub fn shift_into_frame(
    y: Coord,
    vertical_offset: Coord,
    header_size: Coord,
    max_height: Coord,
) -> Coord {
    header_size + (y - vertical_offset).clamp(0, max_height.max(0))
}

/// Geometric bounds of a box in internal units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub x: Coord,
    pub y: Coord,
    pub width: Coord,
    pub height: Coord,
}

impl Bounds {
    pub const fn new(x: Coord, y: Coord, width: Coord, height: Coord) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub const fn right(&self) -> Coord {
        self.x + self.width
    }

    pub const fn bottom(&self) -> Coord {
        self.y + self.height
    }

    /// Neither a point nor a line.
    pub const fn has_area(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Zero width and zero height.
    pub const fn is_point(&self) -> bool {
        self.width == 0 && self.height == 0
    }
}

/// A box's bounds mapped into the grid.
///
/// The fields are boundary (cut) indices: the rectangle covers columns
/// `x1..x2` and rows `y1..y2`. A rectangle with `x1 == x2` is a vertical
/// line sitting on boundary `x1`; it covers no cell but still touches the
/// cells on either side of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct GridRectangle {
    pub x1: usize,
    pub y1: usize,
    pub x2: usize,
    pub y2: usize,
}

impl GridRectangle {
    pub fn new(x1: usize, y1: usize, x2: usize, y2: usize) -> Self {
        debug_assert!(x1 <= x2 && y1 <= y2, "inverted grid rectangle");
        Self { x1, y1, x2, y2 }
    }

    /// The rectangle of a single cell.
    pub fn cell(row: usize, column: usize) -> Self {
        Self::new(column, row, column + 1, row + 1)
    }

    /// Number of columns covered.
    pub fn width(&self) -> usize {
        self.x2 - self.x1
    }

    /// Number of rows covered.
    pub fn height(&self) -> usize {
        self.y2 - self.y1
    }

    /// Covers no cell at all.
    pub fn is_empty(&self) -> bool {
        self.x1 == self.x2 || self.y1 == self.y2
    }

    pub fn contains_cell(&self, row: usize, column: usize) -> bool {
        (self.y1..self.y2).contains(&row) && (self.x1..self.x2).contains(&column)
    }

    /// Spans every column of `other`.
    pub fn spans_columns_of(&self, other: &Self) -> bool {
        self.x1 <= other.x1 && self.x2 >= other.x2
    }

    /// Spans every row of `other`.
    pub fn spans_rows_of(&self, other: &Self) -> bool {
        self.y1 <= other.y1 && self.y2 >= other.y2
    }

    /// Iterate the covered cells as `(row, column)`, row-major.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize)> {
        let (x1, x2) = (self.x1, self.x2);
        (self.y1..self.y2).flat_map(move |row| (x1..x2).map(move |column| (row, column)))
    }
}
