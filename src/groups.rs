//! Same-colour connected groups (4-neighbour flood fill).

use crate::grid::{Cell, Grid};
use std::collections::VecDeque;

/// A group this large or larger vanishes.
pub const CLEAR_THRESHOLD: usize = 4;

const NEIGHBOURS_4: [(i32, i32); 4] = [(0, 1), (0, -1), (1, 0), (-1, 0)];

/// Maximal set of connected puyos sharing one colour. Cells are (x, y).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub color: u8,
    pub cells: Vec<(usize, usize)>,
}

impl Group {
    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn is_clearable(&self) -> bool {
        self.len() >= CLEAR_THRESHOLD
    }
}

/// Partition the non-empty cells of `grid` into groups, ordered row-major by first cell.
pub fn find_groups(grid: &Grid) -> Vec<Group> {
    let mut visited = vec![vec![false; grid.cols]; grid.rows];
    let mut groups = Vec::new();
    let mut queue = VecDeque::new();

    for start_y in 0..grid.rows {
        for start_x in 0..grid.cols {
            let Cell::Puyo(color) = grid.get(start_x, start_y) else {
                continue;
            };
            if visited[start_y][start_x] {
                continue;
            }
            visited[start_y][start_x] = true;
            queue.push_back((start_x, start_y));
            let mut cells = Vec::new();

            while let Some((x, y)) = queue.pop_front() {
                cells.push((x, y));
                for (dx, dy) in NEIGHBOURS_4 {
                    let (nx, ny) = (x as i32 + dx, y as i32 + dy);
                    if grid.cell(nx, ny) != Some(Cell::Puyo(color)) {
                        continue;
                    }
                    let (nx, ny) = (nx as usize, ny as usize);
                    if !visited[ny][nx] {
                        visited[ny][nx] = true;
                        queue.push_back((nx, ny));
                    }
                }
            }
            groups.push(Group { color, cells });
        }
    }
    groups
}

/// Union of the cells of every clearable group.
pub fn clearable_cells(groups: &[Group]) -> Vec<(usize, usize)> {
    groups
        .iter()
        .filter(|g| g.is_clearable())
        .flat_map(|g| g.cells.iter().copied())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn cell_set(group: &Group) -> HashSet<(usize, usize)> {
        group.cells.iter().copied().collect()
    }

    #[test]
    fn empty_grid_has_no_groups() {
        assert!(find_groups(&Grid::new(6, 12)).is_empty());
    }

    #[test]
    fn bottom_row_four_is_one_clearable_group() {
        let mut grid = Grid::new(6, 12);
        for x in 0..4 {
            grid.set(x, 11, Cell::Puyo(1));
        }
        let groups = find_groups(&grid);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].color, 1);
        assert_eq!(groups[0].len(), 4);
        assert!(groups[0].is_clearable());
        assert_eq!(
            cell_set(&groups[0]),
            [(0, 11), (1, 11), (2, 11), (3, 11)].into_iter().collect()
        );
    }

    #[test]
    fn diagonal_cells_are_not_connected() {
        let grid = Grid::from_rows(&[
            "0.", //
            ".0",
        ]);
        let groups = find_groups(&grid);
        assert_eq!(groups.len(), 2);
        assert!(groups.iter().all(|g| g.len() == 1));
    }

    #[test]
    fn groups_ordered_by_first_cell_row_major() {
        let grid = Grid::from_rows(&[
            "..2", //
            "11.",
            "1.3",
        ]);
        let groups = find_groups(&grid);
        let colors: Vec<u8> = groups.iter().map(|g| g.color).collect();
        assert_eq!(colors, vec![2, 1, 3]);
        assert_eq!(groups[1].len(), 3);
    }

    #[test]
    fn winding_group_found_whole() {
        let grid = Grid::from_rows(&[
            "000", //
            "1.0",
            "000",
        ]);
        let groups = find_groups(&grid);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].color, 0);
        assert_eq!(groups[0].len(), 7);
    }

    #[test]
    fn three_is_not_clearable() {
        let grid = Grid::from_rows(&["000.", "1111"]);
        let groups = find_groups(&grid);
        let cells = clearable_cells(&groups);
        assert_eq!(cells.len(), 4);
        assert!(cells.iter().all(|&(_, y)| y == 1));
    }

    fn arb_grid() -> impl Strategy<Value = Grid> {
        (1usize..8, 1usize..10).prop_flat_map(|(cols, rows)| {
            proptest::collection::vec(proptest::option::weighted(0.7, 0u8..3), cols * rows)
                .prop_map(move |cells| {
                    let mut grid = Grid::new(cols, rows);
                    for (i, c) in cells.into_iter().enumerate() {
                        grid.set(i % cols, i / cols, c.map_or(Cell::Empty, Cell::Puyo));
                    }
                    grid
                })
        })
    }

    proptest! {
        #[test]
        fn groups_partition_the_non_empty_cells(grid in arb_grid()) {
            let groups = find_groups(&grid);
            let mut owner = vec![vec![None; grid.cols]; grid.rows];
            for (i, g) in groups.iter().enumerate() {
                for &(x, y) in &g.cells {
                    prop_assert_eq!(grid.get(x, y), Cell::Puyo(g.color));
                    prop_assert!(owner[y][x].is_none(), "cell ({}, {}) in two groups", x, y);
                    owner[y][x] = Some(i);
                }
            }
            for y in 0..grid.rows {
                for x in 0..grid.cols {
                    let cell = grid.get(x, y);
                    prop_assert_eq!(owner[y][x].is_some(), !cell.is_empty());
                    if cell.is_empty() {
                        continue;
                    }
                    if x + 1 < grid.cols && grid.get(x + 1, y) == cell {
                        prop_assert_eq!(owner[y][x], owner[y][x + 1]);
                    }
                    if y + 1 < grid.rows && grid.get(x, y + 1) == cell {
                        prop_assert_eq!(owner[y][x], owner[y + 1][x]);
                    }
                }
            }
        }
    }
}
