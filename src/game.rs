//! Game session: spawn, fall and steer, lock, resolve chains, score, game over.

use crate::cascade::{Cascade, CascadeEvent, CascadeOutcome};
use crate::grid::{Cell, Grid};
use crate::piece::{self, ColorPicker, Pair};

/// Session phase. Exactly one of these holds at any time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    /// Pair is falling and accepts input.
    Falling(Pair),
    /// A lock happened; the chain is being resolved.
    Resolving(Cascade),
    /// Waiting to spawn the next pair.
    Spawning,
    GameOver,
}

/// Result of a move request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Moved,
    /// Illegal or no active pair; nothing changed.
    Rejected,
    /// A downward step failed (or a hard drop landed) and the pair was written to the grid.
    Locked,
}

/// What one call to [`GameSession::advance`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Cascade(CascadeEvent),
    Spawned(Pair),
    GameOver,
    /// Nothing to advance (falling or already over).
    Idle,
}

/// Game state: grid, phase, score and counters.
#[derive(Debug, Clone)]
pub struct GameSession {
    grid: Grid,
    phase: Phase,
    colors: ColorPicker,
    pub score: u32,
    /// Chain depth of the last locked pair; 0 when that lock cleared nothing.
    pub chain: u32,
    pub max_chain: u32,
    pub pieces_placed: u32,
    pub puyos_cleared: u32,
}

impl GameSession {
    /// New session with an empty grid and the first pair already falling.
    pub fn new(config: &crate::GameConfig) -> Self {
        let mut session = Self {
            grid: Grid::new(config.cols, config.rows),
            phase: Phase::Spawning,
            colors: ColorPicker::new(config.seed, config.colors),
            score: 0,
            chain: 0,
            max_chain: 0,
            pieces_placed: 0,
            puyos_cleared: 0,
        };
        session.spawn_next();
        session
    }

    /// Session over an existing grid, waiting to spawn. Used to set up positions.
    #[cfg(test)]
    pub fn with_grid(grid: Grid, seed: u32, colors: u8) -> Self {
        Self {
            grid,
            phase: Phase::Spawning,
            colors: ColorPicker::new(seed, colors),
            score: 0,
            chain: 0,
            max_chain: 0,
            pieces_placed: 0,
            puyos_cleared: 0,
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Number of colours pairs are drawn from.
    pub fn palette_size(&self) -> u8 {
        self.colors.colors()
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn active(&self) -> Option<&Pair> {
        match &self.phase {
            Phase::Falling(pair) => Some(pair),
            _ => None,
        }
    }

    pub fn is_game_over(&self) -> bool {
        self.phase == Phase::GameOver
    }

    #[cfg(test)]
    pub fn is_resolving(&self) -> bool {
        matches!(self.phase, Phase::Resolving(_))
    }

    /// Cells flashing before they vanish.
    pub fn clearing_cells(&self) -> &[(usize, usize)] {
        match &self.phase {
            Phase::Resolving(cascade) => cascade.clearing_cells(),
            _ => &[],
        }
    }

    /// Settled grid with the active pair drawn on top.
    pub fn display_grid(&self) -> Grid {
        let mut g = self.grid.clone();
        if let Some(pair) = self.active() {
            for ((x, y), color) in pair.cells() {
                if g.in_bounds(x, y) {
                    g.set(x as usize, y as usize, Cell::Puyo(color));
                }
            }
        }
        g
    }

    /// Rows the active pair would fall on a hard drop (for the landing shadow).
    pub fn ghost(&self) -> Option<Pair> {
        self.active()
            .map(|pair| pair.shifted(0, piece::drop_distance(&self.grid, pair), None))
    }

    pub fn move_left(&mut self) -> MoveOutcome {
        self.shift(-1)
    }

    pub fn move_right(&mut self) -> MoveOutcome {
        self.shift(1)
    }

    fn shift(&mut self, dx: i32) -> MoveOutcome {
        let Phase::Falling(pair) = &mut self.phase else {
            return MoveOutcome::Rejected;
        };
        match piece::try_move(&self.grid, pair, dx, 0, None) {
            Some(moved) => {
                *pair = moved;
                MoveOutcome::Moved
            }
            None => MoveOutcome::Rejected,
        }
    }

    pub fn rotate_cw(&mut self) -> MoveOutcome {
        self.rotate(1)
    }

    pub fn rotate_ccw(&mut self) -> MoveOutcome {
        self.rotate(-1)
    }

    fn rotate(&mut self, delta: i8) -> MoveOutcome {
        let Phase::Falling(pair) = &mut self.phase else {
            return MoveOutcome::Rejected;
        };
        match piece::rotate(&self.grid, pair, delta) {
            Some(turned) => {
                *pair = turned;
                MoveOutcome::Moved
            }
            None => MoveOutcome::Rejected,
        }
    }

    /// One row down; locks if blocked.
    pub fn soft_drop(&mut self) -> MoveOutcome {
        let Phase::Falling(pair) = &mut self.phase else {
            return MoveOutcome::Rejected;
        };
        match piece::try_move(&self.grid, pair, 0, 1, None) {
            Some(moved) => {
                *pair = moved;
                MoveOutcome::Moved
            }
            None => {
                self.lock_active();
                MoveOutcome::Locked
            }
        }
    }

    /// Automatic descent from the drop timer. Same rules as a soft drop.
    pub fn tick(&mut self) -> MoveOutcome {
        self.soft_drop()
    }

    pub fn hard_drop(&mut self) -> MoveOutcome {
        let Phase::Falling(pair) = &mut self.phase else {
            return MoveOutcome::Rejected;
        };
        let dy = piece::drop_distance(&self.grid, pair);
        *pair = pair.shifted(0, dy, None);
        self.lock_active();
        MoveOutcome::Locked
    }

    fn lock_active(&mut self) {
        let Phase::Falling(pair) = std::mem::replace(&mut self.phase, Phase::Spawning) else {
            return;
        };
        piece::lock(&mut self.grid, &pair);
        self.pieces_placed += 1;
        // Chain shows only the current drop's result.
        self.chain = 0;
        self.phase = Phase::Resolving(Cascade::new());
    }

    /// Run one cascade stage, or spawn when waiting to spawn.
    pub fn advance(&mut self) -> Step {
        match &mut self.phase {
            Phase::Resolving(cascade) => {
                let event = cascade.step(&mut self.grid);
                if let CascadeEvent::Finished(outcome) = event {
                    self.apply_outcome(outcome);
                    self.phase = Phase::Spawning;
                }
                Step::Cascade(event)
            }
            Phase::Spawning => self.spawn_next(),
            Phase::Falling(_) | Phase::GameOver => Step::Idle,
        }
    }

    /// Resolve any pending chain without pacing, then spawn. Ends Falling or GameOver.
    pub fn settle(&mut self) {
        if let Phase::Resolving(cascade) = &mut self.phase {
            let outcome = cascade.resolve(&mut self.grid);
            self.apply_outcome(outcome);
            self.phase = Phase::Spawning;
        }
        if self.phase == Phase::Spawning {
            self.spawn_next();
        }
    }

    fn apply_outcome(&mut self, outcome: CascadeOutcome) {
        if !outcome.cleared_anything() {
            return;
        }
        self.score = self.score.saturating_add(outcome.score_delta());
        self.chain = outcome.depth;
        self.max_chain = self.max_chain.max(outcome.depth);
        self.puyos_cleared += outcome.total_cleared;
    }

    fn spawn_next(&mut self) -> Step {
        match piece::spawn(&self.grid, &mut self.colors) {
            Some(pair) => {
                self.phase = Phase::Falling(pair);
                Step::Spawned(pair)
            }
            None => {
                self.phase = Phase::GameOver;
                Step::GameOver
            }
        }
    }

    /// Empty grid, zero score and chain, next pair falling. Accepted in any phase.
    pub fn restart(&mut self) {
        self.grid.clear();
        self.score = 0;
        self.chain = 0;
        self.max_chain = 0;
        self.pieces_placed = 0;
        self.puyos_cleared = 0;
        self.phase = Phase::Spawning;
        self.spawn_next();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::piece::Orientation;

    fn config() -> crate::GameConfig {
        crate::GameConfig {
            seed: 99,
            ..crate::GameConfig::default()
        }
    }

    /// Session over `grid` with `pair` falling.
    fn session_with(grid: Grid, pair: Pair) -> GameSession {
        let mut s = GameSession::with_grid(grid, 1, 4);
        s.phase = Phase::Falling(pair);
        s
    }

    #[test]
    fn new_session_spawns_at_anchor() {
        let s = GameSession::new(&config());
        let pair = s.active().copied().unwrap();
        assert_eq!((pair.x, pair.y, pair.dir), (2, 1, Orientation::Up));
        assert!(pair.main < 4 && pair.sub < 4);
        assert_eq!(s.score, 0);
        assert!(!s.is_game_over());
    }

    #[test]
    fn display_grid_overlays_active_pair_only() {
        let s = GameSession::new(&config());
        let pair = *s.active().unwrap();
        let shown = s.display_grid();
        assert_eq!(shown.get(2, 1), Cell::Puyo(pair.main));
        assert_eq!(shown.get(2, 0), Cell::Puyo(pair.sub));
        assert_eq!(s.grid().non_empty_count(), 0);
    }

    #[test]
    fn moves_and_walls() {
        let mut s = GameSession::new(&config());
        assert_eq!(s.move_left(), MoveOutcome::Moved);
        assert_eq!(s.move_left(), MoveOutcome::Moved);
        assert_eq!(s.move_left(), MoveOutcome::Rejected);
        assert_eq!(s.active().unwrap().x, 0);
        for _ in 0..5 {
            s.move_right();
        }
        assert_eq!(s.active().unwrap().x, 5);
        assert_eq!(s.move_right(), MoveOutcome::Rejected);
    }

    #[test]
    fn blocked_rotation_keeps_pair() {
        let mut s = GameSession::new(&config());
        while s.move_right() == MoveOutcome::Moved {}
        let before = *s.active().unwrap();
        assert_eq!(s.rotate_cw(), MoveOutcome::Rejected);
        assert_eq!(*s.active().unwrap(), before);
        assert_eq!(s.rotate_ccw(), MoveOutcome::Moved);
        assert_eq!(s.active().unwrap().dir, Orientation::Left);
    }

    #[test]
    fn tick_falls_then_locks_on_floor() {
        let mut s = GameSession::new(&config());
        for _ in 0..10 {
            assert_eq!(s.tick(), MoveOutcome::Moved);
        }
        assert_eq!(s.tick(), MoveOutcome::Locked);
        assert!(s.active().is_none());
        assert!(s.is_resolving());
        assert_eq!(s.grid().non_empty_count(), 2);
        assert_eq!(s.pieces_placed, 1);
    }

    #[test]
    fn input_ignored_while_resolving() {
        let mut s = GameSession::new(&config());
        s.hard_drop();
        assert!(s.is_resolving());
        assert_eq!(s.move_left(), MoveOutcome::Rejected);
        assert_eq!(s.rotate_cw(), MoveOutcome::Rejected);
        assert_eq!(s.soft_drop(), MoveOutcome::Rejected);
        assert_eq!(s.hard_drop(), MoveOutcome::Rejected);
        assert_eq!(s.tick(), MoveOutcome::Rejected);
        assert_eq!(s.grid().non_empty_count(), 2);
    }

    #[test]
    fn hard_drop_then_settle_spawns_next() {
        let mut s = GameSession::new(&config());
        assert_eq!(s.hard_drop(), MoveOutcome::Locked);
        assert!(!s.grid().get(2, 11).is_empty());
        assert!(!s.grid().get(2, 10).is_empty());
        s.settle();
        assert!(s.active().is_some());
        assert_eq!(s.score, 0);
        assert_eq!(s.chain, 0);
    }

    #[test]
    fn hard_drop_completing_group_scores() {
        // Lay two 0s at the bottom left; drop a 0-0 pair flat beside them.
        let mut grid = Grid::new(6, 12);
        grid.set(0, 11, Cell::Puyo(0));
        grid.set(1, 11, Cell::Puyo(0));
        let pair = Pair {
            x: 2,
            y: 1,
            dir: Orientation::Right,
            main: 0,
            sub: 0,
        };
        let mut s = session_with(grid, pair);
        assert_eq!(s.hard_drop(), MoveOutcome::Locked);

        let Step::Cascade(CascadeEvent::Marked { cells, depth }) = s.advance() else {
            panic!("expected the group to be marked");
        };
        assert_eq!(depth, 1);
        assert_eq!(cells.len(), 4);
        assert_eq!(s.clearing_cells().len(), 4);

        s.settle();
        assert_eq!(s.score, 40);
        assert_eq!(s.chain, 1);
        assert_eq!(s.puyos_cleared, 4);
        assert!(s.clearing_cells().is_empty());
        assert_eq!(s.grid().non_empty_count(), 0);
        assert!(s.active().is_some());
    }

    #[test]
    fn two_chain_scores_flat_depth_multiplier() {
        // Four 0s clear, then the 1s above fall onto the 1s below.
        let grid = Grid::from_rows(&[
            "......", //
            "......",
            "......",
            "......",
            "......",
            "......",
            "1.....",
            "1.....",
            "0.....",
            "0.....",
            "0.....",
            "11....",
        ]);
        let pair = Pair {
            x: 1,
            y: 1,
            dir: Orientation::Up,
            main: 0,
            sub: 2,
        };
        let mut s = session_with(grid, pair);
        s.hard_drop();
        // main (1, 10) joins the three 0s in column 0
        s.settle();
        assert_eq!(s.chain, 2);
        assert_eq!(s.puyos_cleared, 8);
        assert_eq!(s.score, 8 * 10 * 2);
        assert_eq!(s.max_chain, 2);
    }

    #[test]
    fn chain_display_overwrites() {
        let mut grid = Grid::new(6, 12);
        for x in 0..3 {
            grid.set(x, 11, Cell::Puyo(1));
        }
        let pair = Pair {
            x: 3,
            y: 1,
            dir: Orientation::Up,
            main: 1,
            sub: 2,
        };
        let mut s = session_with(grid, pair);
        s.chain = 5;
        s.hard_drop();
        s.settle();
        assert_eq!(s.chain, 1);
        assert_eq!(s.max_chain, 1);
        assert_eq!(s.score, 40);
    }

    #[test]
    fn quiet_lock_resets_chain_to_zero() {
        let mut grid = Grid::new(6, 12);
        for x in 0..3 {
            grid.set(x, 11, Cell::Puyo(1));
        }
        let scoring = Pair {
            x: 3,
            y: 1,
            dir: Orientation::Up,
            main: 1,
            sub: 2,
        };
        let mut s = session_with(grid, scoring);
        s.hard_drop();
        s.settle();
        assert_eq!(s.chain, 1);

        let quiet = Pair {
            x: 5,
            y: 1,
            dir: Orientation::Up,
            main: 3,
            sub: 2,
        };
        s.phase = Phase::Falling(quiet);
        s.hard_drop();
        assert_eq!(s.chain, 0);
        s.settle();
        assert_eq!(s.chain, 0);
        assert_eq!(s.max_chain, 1);
        assert_eq!(s.score, 40);
    }

    #[test]
    fn spawn_blocked_is_game_over() {
        let mut grid = Grid::new(6, 12);
        grid.set(2, 1, Cell::Puyo(0));
        grid.set(2, 0, Cell::Puyo(1));
        let mut s = GameSession::with_grid(grid, 3, 4);
        assert_eq!(s.advance(), Step::GameOver);
        assert!(s.is_game_over());
        assert!(s.active().is_none());
        assert_eq!(s.advance(), Step::Idle);
        assert_eq!(s.move_left(), MoveOutcome::Rejected);
    }

    #[test]
    fn stacking_to_the_top_ends_the_game() {
        let mut s = GameSession::new(&config());
        let mut drops = 0;
        while !s.is_game_over() {
            s.hard_drop();
            s.settle();
            drops += 1;
            assert!(drops < 100, "game never ended");
        }
        assert!(s.active().is_none());
    }

    #[test]
    fn restart_resets_everything() {
        let mut s = GameSession::new(&config());
        while !s.is_game_over() {
            s.hard_drop();
            s.settle();
        }
        s.score = 1234;
        s.chain = 3;
        s.restart();
        assert!(!s.is_game_over());
        assert_eq!(s.score, 0);
        assert_eq!(s.chain, 0);
        assert_eq!(s.max_chain, 0);
        assert_eq!(s.pieces_placed, 0);
        assert_eq!(s.grid().non_empty_count(), 0);
        assert!(s.active().is_some());
    }

    #[test]
    fn ghost_marks_landing_spot() {
        let s = GameSession::new(&config());
        let ghost = s.ghost().unwrap();
        assert_eq!((ghost.x, ghost.y), (2, 11));
    }
}
