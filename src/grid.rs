//! Playfield grid: settled puyos only, (0,0) is top-left, coordinates are (x, y).

use crate::groups::{self, Group};

/// Single cell: either empty or a puyo of a given colour index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Puyo(u8), // colour index 0..colors
}

impl Cell {
    #[inline]
    pub fn is_empty(self) -> bool {
        self == Self::Empty
    }
}

/// Settled cells. rows[y][x] = cell. rows[0] is top.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    pub cols: usize,
    pub rows: usize,
    cells: Vec<Vec<Cell>>,
}

impl Grid {
    pub fn new(cols: usize, rows: usize) -> Self {
        Self {
            cols,
            rows,
            cells: (0..rows).map(|_| vec![Cell::Empty; cols]).collect(),
        }
    }

    /// Build a grid from text rows, top first: `.` is empty, a digit is a colour index.
    #[cfg(test)]
    pub fn from_rows(rows: &[&str]) -> Self {
        let height = rows.len();
        let width = rows.first().map_or(0, |r| r.len());
        let mut grid = Self::new(width, height);
        for (y, line) in rows.iter().enumerate() {
            assert_eq!(line.len(), width, "row {y} has length {}, expected {width}", line.len());
            for (x, ch) in line.chars().enumerate() {
                let cell = match ch.to_digit(10) {
                    Some(d) => Cell::Puyo(d as u8),
                    None => Cell::Empty,
                };
                grid.set(x, y, cell);
            }
        }
        grid
    }

    #[inline]
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && (x as usize) < self.cols && y >= 0 && (y as usize) < self.rows
    }

    /// Cell at (x, y). Panics when out of bounds.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Cell {
        assert!(
            x < self.cols && y < self.rows,
            "grid read out of bounds: ({x}, {y}) on {}x{}",
            self.cols,
            self.rows
        );
        self.cells[y][x]
    }

    /// Write (x, y). Panics when out of bounds.
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, cell: Cell) {
        assert!(
            x < self.cols && y < self.rows,
            "grid write out of bounds: ({x}, {y}) on {}x{}",
            self.cols,
            self.rows
        );
        self.cells[y][x] = cell;
    }

    /// Checked lookup for signed coordinates; None when outside the grid.
    #[inline]
    pub fn cell(&self, x: i32, y: i32) -> Option<Cell> {
        self.in_bounds(x, y).then(|| self.cells[y as usize][x as usize])
    }

    /// True if (x, y) is inside the grid and empty.
    #[inline]
    pub fn is_free(&self, x: i32, y: i32) -> bool {
        self.cell(x, y) == Some(Cell::Empty)
    }

    /// Compact every column toward the bottom, keeping the top-to-bottom order of its puyos.
    pub fn apply_gravity(&mut self) {
        for x in 0..self.cols {
            let mut write = self.rows;
            for y in (0..self.rows).rev() {
                let cell = self.cells[y][x];
                if cell.is_empty() {
                    continue;
                }
                write -= 1;
                if write != y {
                    self.cells[write][x] = cell;
                    self.cells[y][x] = Cell::Empty;
                }
            }
        }
    }

    pub fn find_groups(&self) -> Vec<Group> {
        groups::find_groups(self)
    }

    #[cfg(test)]
    pub fn non_empty_count(&self) -> usize {
        self.cells
            .iter()
            .flatten()
            .filter(|c| !c.is_empty())
            .count()
    }

    /// Reset every cell to empty.
    pub fn clear(&mut self) {
        for row in &mut self.cells {
            row.fill(Cell::Empty);
        }
    }

    pub fn rows_iter(&self) -> impl Iterator<Item = &[Cell]> {
        self.cells.iter().map(Vec::as_slice)
    }
}
