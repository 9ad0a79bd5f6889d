//! Chain resolution: scan for clearable groups, clear them, settle, repeat until stable.
//!
//! The resolver is a plain state machine with no notion of time. Each call to
//! [`Cascade::step`] performs one stage and reports it, so the caller can pace
//! the stages (flash the marked cells, then let the rest fall) or run them
//! back to back with [`Cascade::resolve`].

use crate::grid::{Cell, Grid};
use crate::groups;

/// Base points per cleared puyo.
pub const SCORE_BASE: u32 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CascadeState {
    /// Looking for clearable groups.
    Scanning,
    /// These cells are marked and will be emptied on the next step.
    Clearing(Vec<(usize, usize)>),
    /// Cleared; gravity runs on the next step.
    Settling,
    Done,
}

/// What one [`Cascade::step`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CascadeEvent {
    /// A new chain round found groups; `cells` are now marked as clearing.
    Marked { cells: Vec<(usize, usize)>, depth: u32 },
    /// Marked cells were emptied.
    Cleared { count: u32 },
    /// Gravity applied.
    Settled,
    /// No clearable group remains.
    Finished(CascadeOutcome),
}

/// Totals of one resolution run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CascadeOutcome {
    pub total_cleared: u32,
    pub depth: u32,
}

impl CascadeOutcome {
    /// Every cleared puyo is worth SCORE_BASE times the final chain depth.
    pub fn score_delta(&self) -> u32 {
        self.total_cleared
            .saturating_mul(SCORE_BASE)
            .saturating_mul(self.depth)
    }

    pub fn cleared_anything(&self) -> bool {
        self.total_cleared > 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cascade {
    state: CascadeState,
    total_cleared: u32,
    depth: u32,
}

impl Default for Cascade {
    fn default() -> Self {
        Self::new()
    }
}

impl Cascade {
    pub fn new() -> Self {
        Self {
            state: CascadeState::Scanning,
            total_cleared: 0,
            depth: 0,
        }
    }

    pub fn is_done(&self) -> bool {
        self.state == CascadeState::Done
    }

    /// Cells currently flagged for clearing (empty outside the Clearing stage).
    pub fn clearing_cells(&self) -> &[(usize, usize)] {
        match &self.state {
            CascadeState::Clearing(cells) => cells,
            _ => &[],
        }
    }

    pub fn outcome(&self) -> CascadeOutcome {
        CascadeOutcome {
            total_cleared: self.total_cleared,
            depth: self.depth,
        }
    }

    /// Advance one stage. Panics if called after the cascade finished.
    pub fn step(&mut self, grid: &mut Grid) -> CascadeEvent {
        match std::mem::replace(&mut self.state, CascadeState::Done) {
            CascadeState::Scanning => {
                let cells = groups::clearable_cells(&grid.find_groups());
                if cells.is_empty() {
                    return CascadeEvent::Finished(self.outcome());
                }
                self.depth += 1;
                self.state = CascadeState::Clearing(cells.clone());
                CascadeEvent::Marked {
                    cells,
                    depth: self.depth,
                }
            }
            CascadeState::Clearing(cells) => {
                for &(x, y) in &cells {
                    grid.set(x, y, Cell::Empty);
                }
                let count = cells.len() as u32;
                self.total_cleared += count;
                self.state = CascadeState::Settling;
                CascadeEvent::Cleared { count }
            }
            CascadeState::Settling => {
                grid.apply_gravity();
                self.state = CascadeState::Scanning;
                CascadeEvent::Settled
            }
            CascadeState::Done => panic!("cascade stepped after it finished"),
        }
    }

    /// Run every remaining stage without pausing.
    pub fn resolve(&mut self, grid: &mut Grid) -> CascadeOutcome {
        while !self.is_done() {
            self.step(grid);
        }
        self.outcome()
    }
}
