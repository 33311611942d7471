/// Session: the command surface the front end drives.
///
/// Owns the clock, the level source and the live `WorldState`, and turns
/// discrete commands (direction pressed/released, cut, pause) into the
/// per-frame `FrameInput` that `step` consumes.
///
/// Any keypress clears the player's dialogue line.

use log::{info, warn};

use crate::config::TimingConfig;
use crate::domain::entity::{Direction, FrameInput};
use super::event::GameEvent;
use super::level::{LevelError, LevelSource, BONUS_ROOM};
use super::step;
use super::timer::Clock;
use super::world::{GameState, LevelMode, Snapshot, WorldState};

pub struct Session<C: Clock> {
    clock: C,
    levels: Box<dyn LevelSource>,
    timing: TimingConfig,
    world: Option<WorldState>,
    /// Direction currently held down (level-triggered).
    held: Option<Direction>,
    /// Cut pressed since the last frame (edge-triggered).
    pending_cut: bool,
}

impl<C: Clock> Session<C> {
    pub fn new(clock: C, levels: Box<dyn LevelSource>, timing: TimingConfig) -> Self {
        Session {
            clock,
            levels,
            timing,
            world: None,
            held: None,
            pending_cut: false,
        }
    }

    // ── Level lifecycle ──

    /// Load `(mode, number)` and start it. On error the current session
    /// (if any) is left untouched.
    pub fn new_game(&mut self, mode: LevelMode, number: u32) -> Result<(), LevelError> {
        if number == 0 {
            return Err(LevelError::NotFound { mode, number });
        }
        let level = self.levels.generate(mode, number)?;

        let bonus_room = if mode == LevelMode::Bonus {
            match self.levels.generate(LevelMode::Bonus, BONUS_ROOM) {
                Ok(room) => Some(room),
                Err(e) => {
                    warn!("bonus room unavailable: {e}");
                    None
                }
            }
        } else {
            None
        };

        info!("starting {} level {number}: {}", mode.slug(), level.name);
        let now = self.clock.now_millis();
        self.world = Some(WorldState::new(level, mode, number, bonus_room, self.timing, now));
        self.held = None;
        self.pending_cut = false;
        Ok(())
    }

    /// Start the current level over.
    pub fn restart(&mut self) -> Result<(), LevelError> {
        let (mode, number) = self.current_level().ok_or(LevelError::NotFound {
            mode: LevelMode::Normal,
            number: 0,
        })?;
        self.new_game(mode, number)
    }

    /// Start the level after the current one in the same mode.
    pub fn next_level(&mut self) -> Result<(), LevelError> {
        let (mode, number) = self.current_level().ok_or(LevelError::NotFound {
            mode: LevelMode::Normal,
            number: 0,
        })?;
        self.new_game(mode, number + 1)
    }

    fn current_level(&self) -> Option<(LevelMode, u32)> {
        self.world.as_ref().map(|w| (w.mode, w.level_number))
    }

    // ── Commands ──

    /// Freeze the level. A cut queued earlier in the frame is dropped.
    pub fn pause(&mut self) -> bool {
        let paused = self.with_keypress(WorldState::pause);
        if paused {
            self.pending_cut = false;
        }
        paused
    }

    pub fn resume(&mut self) -> bool {
        self.with_keypress(WorldState::resume)
    }

    pub fn toggle_pause(&mut self) -> bool {
        if self.state() == Some(GameState::Paused) {
            self.resume()
        } else {
            self.pause()
        }
    }

    /// A direction was pressed (`Some`) or every direction released (`None`).
    pub fn submit_direction(&mut self, dir: Option<Direction>) {
        if dir.is_some() {
            self.clear_message();
        }
        self.held = dir;
    }

    /// Release of one direction; only clears the intent if it was the held one.
    pub fn release_direction(&mut self, dir: Direction) {
        if self.held == Some(dir) {
            self.held = None;
        }
    }

    /// Cut on the next frame. Ignored unless the level accepts input.
    pub fn submit_cut(&mut self) {
        self.clear_message();
        if self.world.as_ref().map_or(false, WorldState::accepts_input) {
            self.pending_cut = true;
        }
    }

    /// Advance one frame.
    pub fn tick(&mut self) -> Vec<GameEvent> {
        let now = self.clock.now_millis();
        let world = match self.world.as_mut() {
            Some(w) => w,
            None => return vec![],
        };

        let accepting = world.accepts_input();
        let cut = std::mem::take(&mut self.pending_cut);
        let input = FrameInput {
            movement: if accepting { self.held } else { None },
            cut: accepting && cut,
        };
        step::step(world, input, now)
    }

    // ── Queries ──

    pub fn state(&self) -> Option<GameState> {
        self.world.as_ref().map(|w| w.state)
    }

    pub fn snapshot(&self) -> Option<Snapshot<'_>> {
        self.world.as_ref().map(WorldState::snapshot)
    }

    #[cfg(test)]
    pub fn world(&self) -> Option<&WorldState> {
        self.world.as_ref()
    }

    /// A key was pressed: drop the dialogue line.
    pub fn clear_message(&mut self) {
        if let Some(w) = self.world.as_mut() {
            w.player.message.clear();
        }
    }

    fn with_keypress(&mut self, f: impl FnOnce(&mut WorldState) -> bool) -> bool {
        self.clear_message();
        self.world.as_mut().map_or(false, f)
    }
}
