//! The board: a fixed 4×4 grid of cell stacks.

use quadline_protocol::Color;

/// Side length of the square grid.
pub const GRID_DIMENSION: usize = 4;

/// A cell is an ordered stack of colors, bottom→top. The maximum logical
/// height of 3 is enforced by the placement rule in the engine, not by
/// the data structure; only the top color is "live" for win purposes.
pub type Cell = Vec<Color>;

/// A 4×4 grid of cell stacks.
///
/// Cell contents only ever change through a push (place) or a pop/push
/// pair (move) — never arbitrary overwrite. The engine pre-validates all
/// coordinates before touching a cell; diagonal win scans in particular
/// can generate coordinates outside the grid, and those never reach the
/// accessors here.
#[derive(Debug, Clone)]
pub struct Board {
    grid: [[Cell; GRID_DIMENSION]; GRID_DIMENSION],
}

impl Board {
    /// Creates an empty board.
    pub fn new() -> Self {
        Self {
            grid: std::array::from_fn(|_| std::array::from_fn(|_| Vec::new())),
        }
    }

    /// Empties every cell. Called at the start of every round.
    pub fn reset(&mut self) {
        for row in &mut self.grid {
            for cell in row {
                cell.clear();
            }
        }
    }

    /// Returns the stack at a coordinate.
    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        &self.grid[row][col]
    }

    /// Returns the stack at a coordinate for mutation.
    pub fn cell_mut(&mut self, row: usize, col: usize) -> &mut Cell {
        &mut self.grid[row][col]
    }

    /// Top color of the stack at a coordinate, `None` if empty.
    pub fn top(&self, row: usize, col: usize) -> Option<Color> {
        self.grid[row][col].last().copied()
    }

    /// The grid as nested vectors, for snapshots.
    pub fn to_grid(&self) -> Vec<Vec<Cell>> {
        self.grid.iter().map(|row| row.to_vec()).collect()
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

/// Returns `true` if the (possibly negative) coordinate lies on the grid.
pub(crate) fn in_bounds(row: isize, col: isize) -> bool {
    let dim = GRID_DIMENSION as isize;
    (0..dim).contains(&row) && (0..dim).contains(&col)
}
