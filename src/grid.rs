use serde::Serialize;

/// A cell coordinate on the simulation grid.
///
/// Rows grow downward, columns grow rightward. Coordinates are signed so
/// off-grid candidates (e.g. a head moving past row 0) are representable
/// and can be rejected by [`Grid::is_in_bounds`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Position {
    pub row: i32,
    pub col: i32,
}

impl Position {
    pub fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }
}

pub const DEFAULT_GRID_HEIGHT: i32 = 15;
pub const DEFAULT_GRID_WIDTH: i32 = 15;

/// Immutable shape descriptor for one agent's grid.
///
/// Every agent simulates on its own logical grid; instances share the same
/// dimensions but no occupancy state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Grid {
    pub height: i32,
    pub width: i32,
}

impl Default for Grid {
    fn default() -> Self {
        Self {
            height: DEFAULT_GRID_HEIGHT,
            width: DEFAULT_GRID_WIDTH,
        }
    }
}

impl Grid {
    pub fn new(height: i32, width: i32) -> Self {
        Self { height, width }
    }

    /// True iff `(row, col)` lies inside `[0, height) x [0, width)`.
    #[inline]
    pub fn is_in_bounds(&self, row: i32, col: i32) -> bool {
        row >= 0 && row < self.height && col >= 0 && col < self.width
    }

    #[inline]
    pub fn contains(&self, pos: Position) -> bool {
        self.is_in_bounds(pos.row, pos.col)
    }

    pub fn cell_count(&self) -> usize {
        (self.height as usize) * (self.width as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_cover_interior_and_edges() {
        let grid = Grid::default();
        assert!(grid.is_in_bounds(0, 0));
        assert!(grid.is_in_bounds(14, 14));
        assert!(grid.is_in_bounds(7, 3));
        assert!(!grid.is_in_bounds(-1, 0));
        assert!(!grid.is_in_bounds(0, -1));
        assert!(!grid.is_in_bounds(15, 0));
        assert!(!grid.is_in_bounds(0, 15));
    }

    #[test]
    fn cell_count_matches_dimensions() {
        assert_eq!(Grid::default().cell_count(), 225);
        assert_eq!(Grid::new(3, 4).cell_count(), 12);
    }
}
