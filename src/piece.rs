//! Falling pair: orientation, placement legality, movement, rotation, hard drop, lock.

use crate::grid::{Cell, Grid};

/// Where the sub puyo sits relative to the main one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    #[default]
    Up,
    Right,
    Down,
    Left,
}

impl Orientation {
    pub const ALL: [Self; 4] = [Self::Up, Self::Right, Self::Down, Self::Left];

    pub fn index(self) -> u8 {
        match self {
            Self::Up => 0,
            Self::Right => 1,
            Self::Down => 2,
            Self::Left => 3,
        }
    }

    pub fn from_index(i: u8) -> Self {
        Self::ALL[(i % 4) as usize]
    }

    /// Orientation after turning by `delta` quarter turns (+1 clockwise, -1 counter-clockwise).
    pub fn rotated(self, delta: i8) -> Self {
        let i = (i16::from(self.index()) + i16::from(delta)).rem_euclid(4);
        Self::from_index(i as u8)
    }

    /// (dx, dy) of the sub puyo from the main puyo.
    pub fn sub_offset(self) -> (i32, i32) {
        match self {
            Self::Up => (0, -1),
            Self::Right => (1, 0),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
        }
    }
}

/// Active pair: main puyo at (x, y), sub puyo beside it per `dir`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pair {
    pub x: i32,
    pub y: i32,
    pub dir: Orientation,
    pub main: u8,
    pub sub: u8,
}

impl Pair {
    /// Spawn anchor for a grid `cols` wide: column cols/2 - 1, row 1, sub above.
    pub fn spawn_at(cols: usize, main: u8, sub: u8) -> Self {
        Self {
            x: (cols / 2) as i32 - 1,
            y: 1,
            dir: Orientation::Up,
            main,
            sub,
        }
    }

    pub fn main_pos(&self) -> (i32, i32) {
        (self.x, self.y)
    }

    pub fn sub_pos(&self) -> (i32, i32) {
        let (dx, dy) = self.dir.sub_offset();
        (self.x + dx, self.y + dy)
    }

    /// Both cells with their colours, main first.
    pub fn cells(&self) -> [((i32, i32), u8); 2] {
        [(self.main_pos(), self.main), (self.sub_pos(), self.sub)]
    }

    /// Candidate after shifting by (dx, dy) and optionally turning to `dir`.
    pub fn shifted(&self, dx: i32, dy: i32, dir: Option<Orientation>) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            dir: dir.unwrap_or(self.dir),
            ..*self
        }
    }
}

/// True if both cells of `pair` are inside the grid and empty.
pub fn can_place(grid: &Grid, pair: &Pair) -> bool {
    pair.cells()
        .iter()
        .all(|&((x, y), _)| grid.is_free(x, y))
}

/// New pair at the spawn anchor, or None if the spawn cells are taken.
pub fn spawn(grid: &Grid, colors: &mut ColorPicker) -> Option<Pair> {
    let main = colors.next_color();
    let sub = colors.next_color();
    let candidate = Pair::spawn_at(grid.cols, main, sub);
    can_place(grid, &candidate).then_some(candidate)
}

/// The moved pair if the target is placeable, otherwise None.
pub fn try_move(
    grid: &Grid,
    pair: &Pair,
    dx: i32,
    dy: i32,
    dir: Option<Orientation>,
) -> Option<Pair> {
    let candidate = pair.shifted(dx, dy, dir);
    can_place(grid, &candidate).then_some(candidate)
}

/// Turn in place by `delta` (+1 / -1). No wall kicks: a blocked turn is None.
pub fn rotate(grid: &Grid, pair: &Pair, delta: i8) -> Option<Pair> {
    try_move(grid, pair, 0, 0, Some(pair.dir.rotated(delta)))
}

/// Rows the pair can fall before landing.
pub fn drop_distance(grid: &Grid, pair: &Pair) -> i32 {
    let mut dy = 0;
    while try_move(grid, pair, 0, dy + 1, None).is_some() {
        dy += 1;
    }
    dy
}

/// Write both puyos into the grid. Both target cells must be free.
pub fn lock(grid: &mut Grid, pair: &Pair) {
    assert!(
        can_place(grid, pair),
        "locking a pair onto occupied or out-of-bounds cells: {pair:?}"
    );
    for ((x, y), color) in pair.cells() {
        grid.set(x as usize, y as usize, Cell::Puyo(color));
    }
}

/// Uniform colour source (seeded LCG so a game is reproducible from its seed).
#[derive(Debug, Clone)]
pub struct ColorPicker {
    rng: u32,
    colors: u8,
}

impl ColorPicker {
    pub fn new(seed: u32, colors: u8) -> Self {
        assert!(colors > 0, "colour palette must not be empty");
        Self { rng: seed, colors }
    }

    fn next_rand(&mut self) -> u32 {
        self.rng = self.rng.wrapping_mul(1_103_515_245).wrapping_add(12345);
        self.rng >> 16
    }

    pub fn next_color(&mut self) -> u8 {
        (self.next_rand() % u32::from(self.colors)) as u8
    }

    pub fn colors(&self) -> u8 {
        self.colors
    }
}
