/// Keyboard tracker and key → command mapping.
///
/// Directions are level-triggered: a key counts as held from its press
/// until its release. When several direction keys are held, the most
/// recently pressed one wins. Everything else is a one-shot `Command`
/// fired on the initial press only.
///
/// Uses crossterm's keyboard enhancement for Release events when available.
/// Falls back to timeout-based release detection on terminals that don't support it.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::domain::entity::Direction;

/// After this duration without a Press/Repeat event, consider the key released.
/// Only used when the terminal doesn't report Release events.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

/// One-shot actions.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Command {
    Cut,
    TogglePause,
    Restart,
    NextLevel,
    Quit,
}

/// Movement keys: arrows and WASD.
pub fn key_direction(code: KeyCode) -> Option<Direction> {
    match code {
        KeyCode::Up | KeyCode::Char('w') | KeyCode::Char('W') => Some(Direction::Up),
        KeyCode::Down | KeyCode::Char('s') | KeyCode::Char('S') => Some(Direction::Down),
        KeyCode::Left | KeyCode::Char('a') | KeyCode::Char('A') => Some(Direction::Left),
        KeyCode::Right | KeyCode::Char('d') | KeyCode::Char('D') => Some(Direction::Right),
        _ => None,
    }
}

pub fn key_command(code: KeyCode) -> Option<Command> {
    match code {
        KeyCode::Char(' ') | KeyCode::Char('x') | KeyCode::Char('X') => Some(Command::Cut),
        KeyCode::Esc | KeyCode::Char('p') | KeyCode::Char('P') => Some(Command::TogglePause),
        KeyCode::Char('r') | KeyCode::Char('R') => Some(Command::Restart),
        KeyCode::Enter => Some(Command::NextLevel),
        KeyCode::Char('q') | KeyCode::Char('Q') => Some(Command::Quit),
        _ => None,
    }
}

pub struct InputState {
    /// Timestamp of the first press of each currently held key.
    pressed_at: HashMap<KeyCode, Instant>,
    /// Timestamp of the last Press/Repeat event for each held key.
    last_active: HashMap<KeyCode, Instant>,
    /// Keys that went from "not held" to "held" in the latest drain.
    fresh_presses: Vec<KeyCode>,
    ctrl_c: bool,

    /// Whether to honor Release events. Only true when keyboard
    /// enhancement is confirmed working.
    pub honor_release: bool,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            pressed_at: HashMap::with_capacity(8),
            last_active: HashMap::with_capacity(8),
            fresh_presses: Vec::with_capacity(8),
            ctrl_c: false,
            honor_release: false,
        }
    }

    /// Drain all pending terminal events and update key states.
    /// Call this once per frame, before the simulation tick.
    pub fn drain_events(&mut self) {
        self.fresh_presses.clear();
        self.ctrl_c = false;

        // Read all available events without blocking
        while poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                self.record(key, Instant::now());
            }
        }

        self.expire(Instant::now());
    }

    fn record(&mut self, key: KeyEvent, now: Instant) {
        if key.modifiers.contains(KeyModifiers::CONTROL)
            && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('C'))
        {
            self.ctrl_c = true;
            return;
        }

        match key.kind {
            KeyEventKind::Release if self.honor_release => {
                self.last_active.remove(&key.code);
                self.pressed_at.remove(&key.code);
            }
            // Without enhancement, rely on the timeout instead
            KeyEventKind::Release => {}
            _ => {
                if !self.last_active.contains_key(&key.code) {
                    self.fresh_presses.push(key.code);
                    self.pressed_at.insert(key.code, now);
                }
                self.last_active.insert(key.code, now);
            }
        }
    }

    /// Expire keys that timed out (terminals without Release events).
    fn expire(&mut self, now: Instant) {
        if self.honor_release {
            return;
        }
        self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
        let active = &self.last_active;
        self.pressed_at.retain(|code, _| active.contains_key(code));
    }

    /// The direction to walk this frame: the newest held direction key.
    pub fn held_direction(&self) -> Option<Direction> {
        self.pressed_at
            .iter()
            .filter_map(|(code, t)| key_direction(*code).map(|d| (t, d)))
            .max_by_key(|(t, _)| **t)
            .map(|(_, d)| d)
    }

    /// One-shot commands triggered this frame, in arrival order.
    pub fn commands(&self) -> impl Iterator<Item = Command> + '_ {
        self.fresh_presses.iter().filter_map(|c| key_command(*c))
    }

    /// Was any key freshly pressed this frame (clears dialogue)?
    /// Auto-repeat of a held key does not count.
    pub fn any_pressed(&self) -> bool {
        !self.fresh_presses.is_empty()
    }

    pub fn ctrl_c_pressed(&self) -> bool {
        self.ctrl_c
    }
}
