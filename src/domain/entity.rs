/// Entities: Player, plus the in-progress cut of a tree.
/// The player owns its position but is stored in the grid cell it
/// occupies (`Tile::Player`); the two are updated together by `sim::step`.

use super::tile::AxeColor;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }
}

/// Grid coordinate. Only non-negative values are representable;
/// the upper bound is checked against the grid by the caller.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Coord {
    pub x: usize,
    pub y: usize,
}

impl Coord {
    pub const fn new(x: usize, y: usize) -> Self {
        Coord { x, y }
    }

    /// Neighbouring coordinate, or None if it would go below zero.
    pub fn step(self, dir: Direction) -> Option<Coord> {
        let (dx, dy) = dir.delta();
        let x = self.x.checked_add_signed(dx as isize)?;
        let y = self.y.checked_add_signed(dy as isize)?;
        Some(Coord { x, y })
    }
}

/// Frame input: movement is level-triggered (held key), cut is edge-triggered.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameInput {
    pub movement: Option<Direction>,
    pub cut: bool,
}

#[derive(Clone, Debug)]
pub struct Player {
    pub pos: Coord,
    pub facing: Direction,
    pub held_axe: Option<AxeColor>,
    /// Transient dialogue, cleared on the next keypress.
    pub message: String,
    /// Frames left in the current step; > 0 means a move is in progress.
    step_ticks_remaining: u32,
}

impl Player {
    pub fn new(pos: Coord) -> Self {
        Player {
            pos,
            facing: Direction::Down,
            held_axe: None,
            message: String::new(),
            step_ticks_remaining: 0,
        }
    }

    pub fn is_moving(&self) -> bool {
        self.step_ticks_remaining > 0
    }

    /// Start a step lasting `ticks` frames. Refused while a step is underway.
    pub fn try_begin_step(&mut self, ticks: u32) -> bool {
        if self.is_moving() {
            return false;
        }
        self.step_ticks_remaining = ticks.max(1);
        true
    }

    /// Advance the step animation by one frame.
    pub fn advance_step(&mut self) {
        self.step_ticks_remaining = self.step_ticks_remaining.saturating_sub(1);
    }

    pub fn say(&mut self, msg: impl Into<String>) {
        self.message = msg.into();
    }
}

/// A tree being chopped. The tile stays solid (`CutState::BeingCut`)
/// until `ticks_remaining` reaches 0, then the tree falls.
#[derive(Clone, Debug)]
pub struct CutInProgress {
    pub at: Coord,
    pub ticks_remaining: u32,
    total_ticks: u32,
}

impl CutInProgress {
    pub fn new(at: Coord, duration: u32) -> Self {
        let duration = duration.max(1);
        CutInProgress { at, ticks_remaining: duration, total_ticks: duration }
    }

    /// Advance one frame. Returns true when the tree has fallen.
    pub fn tick(&mut self) -> bool {
        self.ticks_remaining = self.ticks_remaining.saturating_sub(1);
        self.ticks_remaining == 0
    }

    /// Stage index 0..=3 for rendering (0 = first swing, 3 = about to fall).
    pub fn stage(&self) -> u8 {
        let done = self.total_ticks - self.ticks_remaining;
        ((done * 4) / self.total_ticks).min(3) as u8
    }
}
