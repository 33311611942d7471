/// The step function: advances the world by one frame.
///
/// Processing order:
///   1. Step animation (frees the player for the next move)
///   2. Cut (edge-triggered key)
///   3. Walk (held direction; at most one per frame)
///   4. Cut progress (felled trees become walkable)
///   5. Bonus countdown
///
/// Input first, then time-based checks. Nothing here fails: illegal
/// actions are no-ops and user-facing failures become dialogue text.

use log::{debug, info, warn};

use crate::domain::entity::{Coord, CutInProgress, Direction, FrameInput, Player};
use crate::domain::rules::{self, CutVerdict};
use crate::domain::tile::{CutState, Tile};
use super::event::GameEvent;
use super::timer::BonusTimer;
use super::world::{GameState, LevelMode, WorldState, SPAWN};

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn step(world: &mut WorldState, input: FrameInput, now: u64) -> Vec<GameEvent> {
    let mut events: Vec<GameEvent> = Vec::new();

    if world.accepts_input() {
        world.player.advance_step();
        if input.cut {
            cut(world, &mut events);
        }
        if let Some(dir) = input.movement {
            walk(world, dir, now, &mut events);
        }
        resolve_cuts(world, &mut events);
    }
    tick_timer(world, now, &mut events);

    events
}

// ══════════════════════════════════════════════════════════════
// Walk
// ══════════════════════════════════════════════════════════════

/// Try to move the player one cell. Facing always turns, even when the
/// move is refused. Returns true if a move (or the finish) happened.
pub fn walk(world: &mut WorldState, dir: Direction, now: u64, events: &mut Vec<GameEvent>) -> bool {
    if world.state == GameState::Finished { return false; }
    if world.player.is_moving() { return false; }

    world.player.facing = dir;

    let from = world.player.pos;
    let (to, target) = match rules::walk_target(&world.grid, from, dir) {
        Some(t) => t,
        None => return false,
    };

    if !world.player.try_begin_step(world.timing.step_ticks) { return false; }

    if let Tile::Axe(color) = target {
        world.player.held_axe = Some(color);
        debug!("picked up {color} axe at {to:?}");
        events.push(GameEvent::AxePicked { color });
    }

    if target == Tile::Finish {
        world.player.pos = to;
        finish_level(world, from, now, events);
        return true;
    }

    if world.state == GameState::Bonus && target.has_coin() {
        world.coins += 1;
        events.push(GameEvent::CoinCollected { at: to, total: world.coins });
    }

    // Swap: vacated cell becomes grass, destination holds the player
    world.grid.set(from, Tile::GRASS);
    world.grid.set(to, Tile::Player);
    world.player.pos = to;
    true
}

// ══════════════════════════════════════════════════════════════
// Finish
// ══════════════════════════════════════════════════════════════

/// Reached a finish tile from `vacated`.
///
/// A Bonus-mode level that is not yet in its bonus phase opens the coin
/// room instead of ending; everything else ends the session.
fn finish_level(world: &mut WorldState, vacated: Coord, now: u64, events: &mut Vec<GameEvent>) {
    if world.mode == LevelMode::Bonus && world.state != GameState::Bonus {
        if enter_bonus(world, now) {
            events.push(GameEvent::BonusStarted);
            return;
        }
        warn!("bonus room missing for {}, ending level instead", world.level_name);
    }

    world.grid.set(vacated, Tile::GRASS);
    end_session(world);
    info!("level {} finished", world.level_name);
    events.push(GameEvent::Won);
}

/// Swap in the coin room: fresh grid, fresh player at the spawn,
/// a coin on every plain grass tile, counter and countdown reset.
fn enter_bonus(world: &mut WorldState, now: u64) -> bool {
    let room = match world.bonus_room.clone() {
        Some(r) => r,
        None => return false,
    };

    world.grid = room.grid;
    world.grid.set(SPAWN, Tile::Player);
    let placed = world.grid.scatter_coins();
    world.player = Player::new(SPAWN);
    world.level_name = room.name;
    world.cuts.clear();
    world.coins = 0;
    world.state = GameState::Bonus;
    world.timer = Some(BonusTimer::start(now, world.timing.bonus_seconds));

    info!("bonus room started with {placed} coins");
    true
}

/// Terminal transition shared by the finish tile and the countdown.
fn end_session(world: &mut WorldState) {
    world.state = GameState::Finished;
    world.finished = true;
    world.cuts.clear();
}

// ══════════════════════════════════════════════════════════════
// Cut
// ══════════════════════════════════════════════════════════════

/// Swing at the tile the player is facing.
pub fn cut(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    if world.state == GameState::Finished { return; }

    let at = match world.player.pos.step(world.player.facing) {
        Some(at) => at,
        None => return,
    };

    match rules::cut_verdict(world.grid.get(at), world.player.held_axe) {
        CutVerdict::NoTree | CutVerdict::Ignored => {}
        CutVerdict::Start => {
            if let Some(Tile::Tree { color, .. }) = world.grid.get(at) {
                world.grid.set(at, Tile::Tree { color, cut: CutState::BeingCut });
                world.cuts.push(CutInProgress::new(at, world.timing.cut_ticks));
                debug!("chopping {color} tree at {at:?}");
                events.push(GameEvent::ChoppingStarted { at });
            }
        }
        CutVerdict::WrongAxe(color) => {
            world.player.say(rules::wrong_axe_message(color));
        }
    }
}

/// Count down every chop in progress; finished ones fell their tree.
fn resolve_cuts(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    let mut felled = vec![];
    world.cuts.retain_mut(|c| {
        if c.tick() {
            felled.push(c.at);
            false
        } else {
            true
        }
    });

    for at in felled {
        if let Some(Tile::Tree { color, .. }) = world.grid.get(at) {
            world.grid.set(at, Tile::Tree { color, cut: CutState::Cut });
            events.push(GameEvent::TreeFelled { at });
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Countdown
// ══════════════════════════════════════════════════════════════

/// Recompute the bonus countdown. Frozen while paused or finished;
/// reaching zero ends the session like a finish would.
pub fn tick_timer(world: &mut WorldState, now: u64, events: &mut Vec<GameEvent>) {
    let frozen = matches!(world.state, GameState::Paused | GameState::Finished);
    let remaining = match world.timer.as_mut() {
        Some(t) => t.tick(now, frozen),
        None => return,
    };

    if !frozen && remaining == 0 {
        let at = world.player.pos;
        world.grid.set(at, Tile::GRASS);
        end_session(world);
        info!("time up with {} coins", world.coins);
        events.push(GameEvent::TimeUp);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TimingConfig;
    use crate::domain::grid::grid_from;
    use crate::domain::tile::AxeColor;
    use crate::sim::level::Level;

    fn timing() -> TimingConfig {
        TimingConfig { tick_rate_ms: 60, step_ticks: 2, cut_ticks: 3, bonus_seconds: 10 }
    }

    fn level(rows: &[&str]) -> Level {
        Level { name: "test".into(), intro: None, grid: grid_from(rows) }
    }

    fn world(rows: &[&str]) -> WorldState {
        WorldState::new(level(rows), LevelMode::Normal, 1, None, timing(), 0)
    }

    fn bonus_world(rows: &[&str], room: &[&str]) -> WorldState {
        WorldState::new(level(rows), LevelMode::Bonus, 1, Some(level(room)), timing(), 0)
    }

    /// Walk and let the step animation finish.
    fn walk_done(w: &mut WorldState, dir: Direction, events: &mut Vec<GameEvent>) -> bool {
        let moved = walk(w, dir, 0, events);
        for _ in 0..w.timing.step_ticks {
            w.player.advance_step();
        }
        moved
    }

    fn at(x: usize, y: usize) -> Coord {
        Coord::new(x, y)
    }

    // ── Walk ──

    #[test]
    fn walk_right_onto_grass() {
        let mut w = world(&[
            "gggg",
            "g..g",
            "gggg",
        ]);
        let mut ev = vec![];
        assert!(walk(&mut w, Direction::Right, 0, &mut ev));
        assert_eq!(w.player.pos, at(2, 1));
        assert_eq!(w.grid.get(at(1, 1)), Some(Tile::GRASS));
        assert_eq!(w.grid.get(at(2, 1)), Some(Tile::Player));
        assert!(ev.is_empty());
    }

    #[test]
    fn walk_into_tree_only_turns() {
        let mut w = world(&[
            "ggg",
            "g.g",
            "ggg",
        ]);
        let mut ev = vec![];
        for dir in [Direction::Up, Direction::Left, Direction::Right, Direction::Down] {
            assert!(!walk(&mut w, dir, 0, &mut ev));
            assert_eq!(w.player.facing, dir);
            assert_eq!(w.player.pos, SPAWN);
        }
        assert!(!w.player.is_moving());
    }

    #[test]
    fn walk_off_the_edge_rejected() {
        // No border: (1,1) is the bottom-right cell
        let mut w = world(&[
            "..",
            "..",
        ]);
        let mut ev = vec![];
        assert!(!walk(&mut w, Direction::Right, 0, &mut ev));
        assert!(!walk(&mut w, Direction::Down, 0, &mut ev));
        assert_eq!(w.player.facing, Direction::Down);
        assert_eq!(w.player.pos, SPAWN);
        assert_eq!(w.grid.get(SPAWN), Some(Tile::Player));
    }

    #[test]
    fn walk_is_gated_while_moving() {
        let mut w = world(&[
            "ggggg",
            "g...g",
            "ggggg",
        ]);
        let mut ev = vec![];
        assert!(walk(&mut w, Direction::Right, 0, &mut ev));
        assert!(!walk(&mut w, Direction::Right, 0, &mut ev));
        assert_eq!(w.player.pos, at(2, 1));
        // Turning is also suppressed while the step is underway.
        assert!(!walk(&mut w, Direction::Left, 0, &mut ev));
        assert_eq!(w.player.facing, Direction::Right);
    }

    #[test]
    fn walk_picks_up_axe() {
        let mut w = world(&[
            "gggg",
            "g.Bg",
            "gggg",
        ]);
        let mut ev = vec![];
        assert!(walk(&mut w, Direction::Right, 0, &mut ev));
        assert_eq!(w.player.held_axe, Some(AxeColor::Blue));
        assert_eq!(ev, vec![GameEvent::AxePicked { color: AxeColor::Blue }]);
        assert_eq!(ev[0].effect_name(), "pickup");
        assert_eq!(w.grid.get(at(2, 1)), Some(Tile::Player));
    }

    #[test]
    fn new_axe_replaces_old() {
        let mut w = world(&[
            "ggggg",
            "g.RBg",
            "ggggg",
        ]);
        let mut ev = vec![];
        walk_done(&mut w, Direction::Right, &mut ev);
        walk_done(&mut w, Direction::Right, &mut ev);
        assert_eq!(w.player.held_axe, Some(AxeColor::Blue));
        // The red axe was consumed.
        assert_eq!(w.grid.get(at(2, 1)), Some(Tile::GRASS));
    }

    // ── Cut ──

    #[test]
    fn matching_axe_cuts_exactly_once() {
        let mut w = world(&[
            "ggggg",
            "g.Rrg",
            "ggggg",
        ]);
        let mut ev = vec![];
        walk_done(&mut w, Direction::Right, &mut ev);
        ev.clear();

        cut(&mut w, &mut ev);
        assert_eq!(w.grid.get(at(3, 1)), Some(Tile::Tree { color: AxeColor::Red, cut: CutState::BeingCut }));
        assert_eq!(ev, vec![GameEvent::ChoppingStarted { at: at(3, 1) }]);
        assert_eq!(ev[0].effect_name(), "chopping");

        // A second swing while the tree is falling does nothing.
        cut(&mut w, &mut ev);
        assert_eq!(ev.len(), 1);
        assert_eq!(w.cuts.len(), 1);
        assert!(w.player.message.is_empty());
    }

    #[test]
    fn wrong_axe_sets_message() {
        let mut w = world(&[
            "ggggg",
            "g.Rbg",
            "ggggg",
        ]);
        let mut ev = vec![];
        walk_done(&mut w, Direction::Right, &mut ev);
        ev.clear();

        cut(&mut w, &mut ev);
        assert_eq!(w.grid.get(at(3, 1)), Some(Tile::tree(AxeColor::Blue)));
        assert_eq!(w.player.message, "I need a blue axe to cut this tree");
        assert!(ev.is_empty());
        assert!(w.cuts.is_empty());
    }

    #[test]
    fn cut_without_axe_sets_message() {
        let mut w = world(&[
            "ggg",
            "g.y",
            "ggg",
        ]);
        let mut ev = vec![];
        w.player.facing = Direction::Right;
        cut(&mut w, &mut ev);
        assert_eq!(w.player.message, "I need a yellow axe to cut this tree");
    }

    #[test]
    fn cut_at_nothing_is_ignored() {
        let mut w = world(&[
            "....",
            "....",
            "....",
        ]);
        let mut ev = vec![];
        w.player.held_axe = Some(AxeColor::Red);
        w.player.facing = Direction::Right;
        cut(&mut w, &mut ev);
        assert!(ev.is_empty());
        assert!(w.player.message.is_empty());
        assert_eq!(w.grid.get(at(2, 1)), Some(Tile::GRASS));
    }

    #[test]
    fn felled_tree_becomes_walkable() {
        let mut w = world(&[
            "gggg",
            "g.rg",
            "gggg",
        ]);
        w.player.held_axe = Some(AxeColor::Red);
        w.player.facing = Direction::Right;
        let mut ev = vec![];
        cut(&mut w, &mut ev);

        // Still solid while being chopped
        assert!(!walk(&mut w, Direction::Right, 0, &mut ev));

        ev.clear();
        for _ in 0..3 {
            resolve_cuts(&mut w, &mut ev);
        }
        assert_eq!(ev, vec![GameEvent::TreeFelled { at: at(2, 1) }]);
        assert!(w.cuts.is_empty());
        assert_eq!(w.grid.get(at(2, 1)), Some(Tile::Tree { color: AxeColor::Red, cut: CutState::Cut }));

        assert!(walk_done(&mut w, Direction::Right, &mut ev));
        assert_eq!(w.player.pos, at(2, 1));

        // The stump is trampled to grass once left behind.
        walk_done(&mut w, Direction::Left, &mut ev);
        assert_eq!(w.grid.get(at(2, 1)), Some(Tile::GRASS));
    }

    #[test]
    fn felled_tree_ignores_further_cuts() {
        let mut w = world(&[
            "gggg",
            "g.rg",
            "gggg",
        ]);
        w.grid.set(at(2, 1), Tile::Tree { color: AxeColor::Red, cut: CutState::Cut });
        w.player.held_axe = Some(AxeColor::Blue);
        w.player.facing = Direction::Right;
        let mut ev = vec![];
        cut(&mut w, &mut ev);
        assert!(ev.is_empty());
        assert!(w.player.message.is_empty());
    }

    // ── Finish ──

    #[test]
    fn normal_finish_ends_session() {
        let mut w = world(&[
            "gggg",
            "g.Fg",
            "gggg",
        ]);
        let mut ev = vec![];
        assert!(walk(&mut w, Direction::Right, 0, &mut ev));
        assert_eq!(w.state, GameState::Finished);
        assert!(w.finished);
        assert_eq!(w.grid.get(SPAWN), Some(Tile::GRASS));
        assert_eq!(w.grid.get(at(2, 1)), Some(Tile::Finish));
        assert_eq!(ev, vec![GameEvent::Won]);
        assert_eq!(ev[0].effect_name(), "win");
    }

    #[test]
    fn finished_blocks_walk_and_cut() {
        let mut w = world(&[
            "ggggg",
            "g.F.g",
            "ggggg",
        ]);
        let mut ev = vec![];
        walk_done(&mut w, Direction::Right, &mut ev);
        let grid = w.grid.clone();
        let pos = w.player.pos;

        assert!(!walk(&mut w, Direction::Right, 0, &mut ev));
        w.player.held_axe = Some(AxeColor::Green);
        w.player.facing = Direction::Up;
        cut(&mut w, &mut ev);
        assert_eq!(w.grid, grid);
        assert_eq!(w.player.pos, pos);
        assert!(w.player.message.is_empty());
    }

    #[test]
    fn bonus_level_finish_opens_coin_room() {
        let mut w = bonus_world(
            &["gggg", "g.Fg", "gggg"],
            &["ggggg", "g...g", "g.rFg", "ggggg"],
        );
        w.player.held_axe = Some(AxeColor::Red);
        let mut ev = vec![];
        assert!(walk(&mut w, Direction::Right, 5_000, &mut ev));

        assert_eq!(ev, vec![GameEvent::BonusStarted]);
        assert_eq!(w.state, GameState::Bonus);
        assert!(!w.finished);
        assert_eq!(w.coins, 0);
        assert_eq!(w.player.pos, SPAWN);
        assert_eq!(w.player.held_axe, None);
        assert_eq!(w.grid.get(SPAWN), Some(Tile::Player));
        // Every plain grass cell carries a coin, nothing else does.
        assert_eq!(w.grid.coins_left(), 3);
        assert_eq!(w.grid.get(at(2, 1)), Some(Tile::Empty { coin: true }));
        assert_eq!(w.grid.get(at(2, 2)), Some(Tile::tree(AxeColor::Red)));
        // Countdown re-armed from the moment of entry.
        assert_eq!(w.remaining_secs(), Some(10));
        let mut ev = vec![];
        tick_timer(&mut w, 5_000 + 2_500, &mut ev);
        assert_eq!(w.remaining_secs(), Some(8));
    }

    #[test]
    fn bonus_room_finish_ends_session() {
        let mut w = bonus_world(
            &["gggg", "g.Fg", "gggg"],
            &["gggg", "g.Fg", "gggg"],
        );
        let mut ev = vec![];
        walk_done(&mut w, Direction::Right, &mut ev);
        assert_eq!(w.state, GameState::Bonus);
        walk_done(&mut w, Direction::Right, &mut ev);
        assert_eq!(w.state, GameState::Finished);
        assert!(w.finished);
    }

    #[test]
    fn bonus_mode_without_room_finishes() {
        let mut w = WorldState::new(
            level(&["gggg", "g.Fg", "gggg"]),
            LevelMode::Bonus, 1, None, timing(), 0,
        );
        let mut ev = vec![];
        walk(&mut w, Direction::Right, 0, &mut ev);
        assert_eq!(w.state, GameState::Finished);
        assert_eq!(ev, vec![GameEvent::Won]);
    }

    // ── Coins ──

    #[test]
    fn coin_counted_once() {
        let mut w = bonus_world(
            &["gggg", "g.Fg", "gggg"],
            &["ggggg", "g...g", "ggggg"],
        );
        let mut ev = vec![];
        walk_done(&mut w, Direction::Right, &mut ev);
        ev.clear();

        walk_done(&mut w, Direction::Right, &mut ev);
        assert_eq!(w.coins, 1);
        assert_eq!(ev, vec![GameEvent::CoinCollected { at: at(2, 1), total: 1 }]);

        walk_done(&mut w, Direction::Right, &mut ev);
        assert_eq!(w.coins, 2);
        // Back over the two collected cells
        walk_done(&mut w, Direction::Left, &mut ev);
        walk_done(&mut w, Direction::Left, &mut ev);
        assert_eq!(w.coins, 2);
        assert_eq!(w.grid.get(at(2, 1)), Some(Tile::GRASS));
        assert_eq!(w.grid.get(at(3, 1)), Some(Tile::GRASS));
        assert_eq!(w.grid.coins_left(), 0);
    }

    #[test]
    fn coins_ignored_outside_bonus() {
        let mut w = world(&[
            "ggggg",
            "g.$.g",
            "ggggg",
        ]);
        let mut ev = vec![];
        walk_done(&mut w, Direction::Right, &mut ev);
        assert_eq!(w.coins, 0);
        assert!(ev.is_empty());
    }

    // ── Countdown ──

    #[test]
    fn time_up_forces_finish() {
        let mut w = bonus_world(&["gggg", "g..g", "gggg"], &["gggg", "g..g", "gggg"]);
        let mut ev = vec![];
        tick_timer(&mut w, 9_999, &mut ev);
        assert_eq!(w.remaining_secs(), Some(1));
        assert_eq!(w.state, GameState::Running);

        tick_timer(&mut w, 11_000, &mut ev);
        assert_eq!(w.state, GameState::Finished);
        assert!(w.finished);
        assert_eq!(w.grid.get(SPAWN), Some(Tile::GRASS));
        assert_eq!(ev, vec![GameEvent::TimeUp]);

        // Terminal: no second time-up
        tick_timer(&mut w, 20_000, &mut ev);
        assert_eq!(ev.len(), 1);
    }

    #[test]
    fn time_up_beats_same_frame_input() {
        let mut w = bonus_world(&["ggggg", "g...g", "ggggg"], &["gggg", "g..g", "gggg"]);
        let input = FrameInput { movement: Some(Direction::Right), cut: false };
        let ev = step(&mut w, input, 11_000);
        assert_eq!(w.player.pos, at(2, 1));
        assert_eq!(w.state, GameState::Finished);
        assert_eq!(ev.last(), Some(&GameEvent::TimeUp));
        assert_eq!(w.grid.get(at(2, 1)), Some(Tile::GRASS));
    }

    #[test]
    fn pause_freezes_countdown() {
        let mut w = bonus_world(&["gggg", "g..g", "gggg"], &["gggg", "g..g", "gggg"]);
        let mut ev = vec![];
        tick_timer(&mut w, 3_500, &mut ev);
        assert_eq!(w.remaining_secs(), Some(7));

        assert!(w.pause());
        tick_timer(&mut w, 3_600, &mut ev);
        tick_timer(&mut w, 1_000_000, &mut ev);
        assert_eq!(w.remaining_secs(), Some(7));
        assert_eq!(w.state, GameState::Paused);

        assert!(w.resume());
        tick_timer(&mut w, 1_000_000, &mut ev);
        assert_eq!(w.remaining_secs(), Some(7));
        tick_timer(&mut w, 1_001_001, &mut ev);
        assert_eq!(w.remaining_secs(), Some(5));
        assert!(ev.is_empty());
    }

    #[test]
    fn normal_mode_has_no_countdown() {
        let mut w = world(&["gggg", "g..g", "gggg"]);
        let mut ev = vec![];
        tick_timer(&mut w, u64::MAX / 2, &mut ev);
        assert_eq!(w.state, GameState::Running);
        assert!(ev.is_empty());
    }

    // ── Frame ──

    #[test]
    fn held_direction_moves_once_per_step() {
        let mut w = world(&[
            "gggggggg",
            "g......g",
            "gggggggg",
        ]);
        let input = FrameInput { movement: Some(Direction::Right), cut: false };
        // step_ticks = 2: one move every 2 frames
        for _ in 0..4 {
            step(&mut w, input, 0);
        }
        assert_eq!(w.player.pos, at(3, 1));
    }

    #[test]
    fn frame_cut_then_fall() {
        let mut w = world(&[
            "gggg",
            "g.rg",
            "gggg",
        ]);
        w.player.held_axe = Some(AxeColor::Red);
        w.player.facing = Direction::Right;
        let ev = step(&mut w, FrameInput { movement: None, cut: true }, 0);
        assert_eq!(ev, vec![GameEvent::ChoppingStarted { at: at(2, 1) }]);
        let mut all = vec![];
        for _ in 0..3 {
            all.extend(step(&mut w, FrameInput::default(), 0));
        }
        assert_eq!(all, vec![GameEvent::TreeFelled { at: at(2, 1) }]);
    }

    #[test]
    fn paused_frame_ignores_input() {
        let mut w = world(&[
            "ggggg",
            "g...g",
            "ggggg",
        ]);
        w.pause();
        step(&mut w, FrameInput { movement: Some(Direction::Right), cut: true }, 0);
        assert_eq!(w.player.pos, SPAWN);
    }
}
