/// WorldState: the complete state of one level session.
///
/// ## Ownership
///
/// The grid, the player, the cut timers and the bonus countdown are owned
/// here and mutated only by `sim::step`. Nothing outside the session reads
/// them directly: the renderer gets a `Snapshot`.
///
/// ## Player occupancy
///
/// `player.pos` and the `Tile::Player` marker in the grid always agree
/// while the level is live. Once `finished` is set the marker is gone and
/// the player is no longer drawn.
///
/// ## State machine
///
/// ```text
///   Running ──pause──▶ Paused ──resume──▶ (state before pause)
///   Bonus   ──pause──▶ Paused
///   Running ──finish (Bonus mode)──▶ Bonus
///   Running ──finish / time up──▶ Finished
///   Bonus   ──finish / time up──▶ Finished
/// ```
/// `Finished` is terminal: walk and cut are no-ops.

use crate::config::TimingConfig;
use crate::domain::entity::{Coord, CutInProgress, Player};
use crate::domain::grid::Grid;
use crate::domain::tile::Tile;
use super::level::Level;
use super::timer::BonusTimer;

/// Fixed spawn cell of every level; the level source guarantees it is walkable.
pub const SPAWN: Coord = Coord::new(1, 1);

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum LevelMode {
    Normal,
    Tutorial,
    Bonus,
}

impl LevelMode {
    /// File-name prefix for level files (`normal-1.txt`, ...).
    pub fn slug(self) -> &'static str {
        match self {
            LevelMode::Normal => "normal",
            LevelMode::Tutorial => "tutorial",
            LevelMode::Bonus => "bonus",
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GameState {
    Running,
    Paused,
    Finished,
    Bonus,
}

pub struct WorldState {
    pub grid: Grid,
    pub player: Player,
    pub cuts: Vec<CutInProgress>,

    // ── Level ──
    pub mode: LevelMode,
    pub level_number: u32,
    pub level_name: String,
    /// Coin room entered when a Bonus-mode level is finished.
    pub bonus_room: Option<Level>,

    // ── State machine ──
    pub state: GameState,
    /// State to return to on resume.
    resume_state: GameState,
    /// Player reached the end (suppresses drawing and movement).
    pub finished: bool,

    // ── Bonus ──
    pub coins: u32,
    pub timer: Option<BonusTimer>,

    pub timing: TimingConfig,
}

impl WorldState {
    /// Start a level: place the player on the spawn cell and arm the
    /// countdown when the level is Bonus-capable.
    pub fn new(
        level: Level,
        mode: LevelMode,
        level_number: u32,
        bonus_room: Option<Level>,
        timing: TimingConfig,
        now: u64,
    ) -> Self {
        let mut grid = level.grid;
        grid.set(SPAWN, Tile::Player);
        let mut player = Player::new(SPAWN);
        if let Some(intro) = level.intro {
            player.say(intro);
        }
        let timer = (mode == LevelMode::Bonus).then(|| BonusTimer::start(now, timing.bonus_seconds));

        WorldState {
            grid,
            player,
            cuts: vec![],
            mode,
            level_number,
            level_name: level.name,
            bonus_room,
            state: GameState::Running,
            resume_state: GameState::Running,
            finished: false,
            coins: 0,
            timer,
            timing,
        }
    }

    /// Are walk/cut commands meaningful right now?
    pub fn accepts_input(&self) -> bool {
        matches!(self.state, GameState::Running | GameState::Bonus)
    }

    /// Running/Bonus → Paused. Returns false if there was nothing to pause.
    pub fn pause(&mut self) -> bool {
        if !self.accepts_input() {
            return false;
        }
        self.resume_state = self.state;
        self.state = GameState::Paused;
        true
    }

    /// Paused → the state it was paused from.
    pub fn resume(&mut self) -> bool {
        if self.state != GameState::Paused {
            return false;
        }
        self.state = self.resume_state;
        true
    }

    pub fn remaining_secs(&self) -> Option<u64> {
        self.timer.as_ref().map(BonusTimer::remaining_secs)
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            grid: &self.grid,
            player: &self.player,
            cuts: &self.cuts,
            state: self.state,
            mode: self.mode,
            level_number: self.level_number,
            level_name: &self.level_name,
            finished: self.finished,
            coins: self.coins,
            remaining_secs: self.remaining_secs(),
        }
    }
}

/// Read-only view handed to the renderer each frame.
#[derive(Clone, Copy, Debug)]
pub struct Snapshot<'a> {
    pub grid: &'a Grid,
    pub player: &'a Player,
    pub cuts: &'a [CutInProgress],
    pub state: GameState,
    pub mode: LevelMode,
    pub level_number: u32,
    pub level_name: &'a str,
    pub finished: bool,
    pub coins: u32,
    pub remaining_secs: Option<u64>,
}

impl Snapshot<'_> {
    /// Cut progress stage at `at`, if a tree is being chopped there.
    pub fn cut_stage(&self, at: Coord) -> Option<u8> {
        self.cuts.iter().find(|c| c.at == at).map(CutInProgress::stage)
    }
}
