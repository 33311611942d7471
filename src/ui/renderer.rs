/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Compose the next frame from a `Snapshot` into the `front` buffer
///   2. Compare each cell with the `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// The renderer never touches the world: everything it draws comes from
/// the read-only snapshot.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};
use log::debug;

use crate::domain::entity::Direction;
use crate::domain::tile::{AxeColor, CutState, Tile};
use crate::sim::world::{GameState, LevelMode, Snapshot};

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    const BASE_BG: Color = Color::Rgb { r: 18, g: 24, b: 18 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Sentinel that differs from every real cell; forces a full repaint.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            *self = FrameBuffer::new(w, h);
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    /// Write a string at (x, y). Each char occupies 1 column; clipped at the edge.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            self.set(x + i, y, Cell { ch, fg, bg });
        }
    }

    #[cfg(test)]
    fn row_text(&self, y: usize) -> String {
        (0..self.width).map(|x| self.get(x, y).ch).collect()
    }
}

// ── Palette ──

const GRASS_BG: Color = Color::Rgb { r: 34, g: 70, b: 34 };
const STUMP: Color = Color::Rgb { r: 140, g: 95, b: 50 };
const GOLD: Color = Color::Rgb { r: 255, g: 215, b: 0 };
const HUD_FG: Color = Color::Rgb { r: 230, g: 230, b: 230 };
const DIM: Color = Color::Rgb { r: 150, g: 150, b: 150 };
const OVERLAY_BG: Color = Color::Rgb { r: 40, g: 40, b: 40 };

fn axe_rgb(color: AxeColor) -> Color {
    match color {
        AxeColor::Red => Color::Rgb { r: 230, g: 60, b: 50 },
        AxeColor::Blue => Color::Rgb { r: 70, g: 130, b: 255 },
        AxeColor::Green => Color::Rgb { r: 60, g: 220, b: 90 },
        AxeColor::Yellow => Color::Rgb { r: 250, g: 220, b: 60 },
    }
}

// ── Layout ──

/// Each game cell is 2 terminal columns wide.
const CELL_W: usize = 2;
const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;
const MAP_COL: usize = 2;

/// Chopping animation, indexed by `CutInProgress::stage()`.
const CHOP_FRAMES: [&str; 4] = ["♣♣", "♣/", "/_", "__"];

/// Two-column glyph and colors for one tile.
fn tile_glyph(tile: Tile, chop_stage: Option<u8>, facing: Direction, held: Option<AxeColor>) -> (&'static str, Color, Color) {
    match tile {
        Tile::Empty { coin: false } => ("  ", HUD_FG, GRASS_BG),
        Tile::Empty { coin: true } => ("()", GOLD, GRASS_BG),
        Tile::Tree { color, cut: CutState::Idle } => ("♣♣", axe_rgb(color), GRASS_BG),
        Tile::Tree { color, cut: CutState::BeingCut } => {
            let stage = chop_stage.unwrap_or(0).min(3) as usize;
            (CHOP_FRAMES[stage], axe_rgb(color), GRASS_BG)
        }
        Tile::Tree { cut: CutState::Cut, .. } => ("__", STUMP, GRASS_BG),
        Tile::Axe(color) => ("/>", axe_rgb(color), GRASS_BG),
        Tile::Finish => ("[]", Color::White, Color::Rgb { r: 40, g: 60, b: 160 }),
        Tile::Player => {
            let glyph = match facing {
                Direction::Up => "@^",
                Direction::Down => "@v",
                Direction::Left => "<@",
                Direction::Right => "@>",
            };
            (glyph, held.map_or(Color::White, axe_rgb), GRASS_BG)
        }
    }
}

fn state_label(snap: &Snapshot) -> &'static str {
    match snap.state {
        GameState::Running => "",
        GameState::Paused => "PAUSED",
        GameState::Bonus => "BONUS",
        GameState::Finished if snap.remaining_secs == Some(0) => "TIME UP",
        GameState::Finished => "FINISHED",
    }
}

fn hud_line(snap: &Snapshot) -> String {
    let mode = match snap.mode {
        LevelMode::Normal => "Level",
        LevelMode::Tutorial => "Tutorial",
        LevelMode::Bonus => "Bonus",
    };
    let axe = snap.player.held_axe.map_or("none", AxeColor::name);
    let mut hud = format!(" {} {} : {}   Axe: {:<6}", mode, snap.level_number, snap.level_name, axe);
    if snap.state == GameState::Bonus || snap.coins > 0 {
        hud.push_str(&format!("  Coins: {:<3}", snap.coins));
    }
    if let Some(secs) = snap.remaining_secs {
        hud.push_str(&format!("  Time: {secs:>2}s"));
    }
    let label = state_label(snap);
    if !label.is_empty() {
        hud.push_str(&format!("  [{label}]"));
    }
    hud
}

/// Build one frame into `buf`. `blink` toggles overlay emphasis.
fn compose(buf: &mut FrameBuffer, snap: &Snapshot, blink: bool) {
    buf.put_str(0, HUD_ROW, &hud_line(snap), HUD_FG, Cell::BASE_BG);

    let (gw, gh) = snap.grid.dimensions();
    for at in snap.grid.positions() {
        let tile = match snap.grid.get(at) {
            // Once finished the player marker is gone; draw the ground.
            Some(Tile::Player) if snap.finished => Tile::GRASS,
            Some(t) => t,
            None => continue,
        };
        let (glyph, fg, bg) = tile_glyph(tile, snap.cut_stage(at), snap.player.facing, snap.player.held_axe);
        buf.put_str(MAP_COL + at.x * CELL_W, MAP_ROW + at.y, glyph, fg, bg);
    }

    let below = MAP_ROW + gh + 1;
    if !snap.player.message.is_empty() {
        let msg = format!(" \"{}\" ", snap.player.message);
        buf.put_str(MAP_COL, below, &msg, Color::Black, HUD_FG);
    }
    buf.put_str(
        MAP_COL,
        below + 2,
        "Arrows/WASD walk  Space cut  Esc pause  R restart  Enter next  Q quit",
        DIM,
        Cell::BASE_BG,
    );

    let map_w = gw * CELL_W;
    match snap.state {
        GameState::Paused => {
            let title = if blink { "> PAUSED <" } else { "  PAUSED  " };
            overlay(buf, map_w, gh, &[title, "", "Esc  resume", "R    restart", "Q    quit"]);
        }
        GameState::Finished => {
            let coins = format!("Coins: {}", snap.coins);
            let title = if snap.remaining_secs == Some(0) { "TIME UP" } else { "LEVEL COMPLETE" };
            let mut lines = vec![title, ""];
            if snap.mode == LevelMode::Bonus {
                lines.push(&coins);
            }
            lines.extend(["Enter  next level", "R      play again"]);
            overlay(buf, map_w, gh, &lines);
        }
        _ => {}
    }
}

/// Centered box over the map area.
fn overlay(buf: &mut FrameBuffer, map_w: usize, map_h: usize, lines: &[&str]) {
    let box_w = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0) + 4;
    let box_h = lines.len() + 2;
    let box_x = MAP_COL + map_w.saturating_sub(box_w) / 2;
    let box_y = MAP_ROW + map_h.saturating_sub(box_h) / 2;

    for y in box_y..box_y + box_h {
        for x in box_x..box_x + box_w {
            buf.set(x, y, Cell { ch: ' ', fg: HUD_FG, bg: OVERLAY_BG });
        }
    }
    for (i, line) in lines.iter().enumerate() {
        let fg = if i == 0 { GOLD } else { HUD_FG };
        buf.put_str(box_x + 2, box_y + 1 + i, line, fg, OVERLAY_BG);
    }
}

// ── Renderer ──

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    frame: u64,
    enhanced_keys: bool,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            frame: 0,
            enhanced_keys: false,
        }
    }

    /// Enter raw alternate screen. Returns whether key Release events
    /// will be reported.
    pub fn init(&mut self) -> io::Result<bool> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        if terminal::supports_keyboard_enhancement().unwrap_or(false) {
            execute!(self.writer, PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES))?;
            self.enhanced_keys = true;
        }
        debug!("keyboard release events: {}", self.enhanced_keys);

        self.resize_to_terminal();
        Ok(self.enhanced_keys)
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        if self.enhanced_keys {
            execute!(self.writer, PopKeyboardEnhancementFlags)?;
        }
        execute!(self.writer, ResetColor, cursor::Show, terminal::LeaveAlternateScreen)?;
        terminal::disable_raw_mode()
    }

    fn resize_to_terminal(&mut self) -> bool {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        let (tw, th) = (tw as usize, th as usize);
        let changed = tw != self.front.width || th != self.front.height;
        self.front.resize(tw, th);
        self.back.resize(tw, th);
        if changed {
            self.back.cells.fill(Cell::INVALID);
        }
        changed
    }

    pub fn render(&mut self, snap: &Snapshot) -> io::Result<()> {
        if self.resize_to_terminal() {
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        self.frame = self.frame.wrapping_add(1);
        self.front.clear();
        compose(&mut self.front, snap, (self.frame / 20) % 2 == 0);

        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    /// Draw a plain text screen (used when no level is loaded).
    pub fn render_message(&mut self, lines: &[&str]) -> io::Result<()> {
        self.resize_to_terminal();
        self.front.clear();
        for (i, line) in lines.iter().enumerate() {
            self.front.put_str(MAP_COL, MAP_ROW + i, line, HUD_FG, Cell::BASE_BG);
        }
        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut cursor_at: Option<(usize, usize)> = None;

        queue!(self.writer, SetForegroundColor(last_fg), SetBackgroundColor(last_bg))?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    continue;
                }

                if cursor_at != Some((x, y)) {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }
                queue!(self.writer, Print(cell.ch))?;
                cursor_at = Some((x + 1, y));
            }
        }

        self.writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TimingConfig;
    use crate::domain::entity::Coord;
    use crate::domain::grid::grid_from;
    use crate::sim::level::Level;
    use crate::sim::world::WorldState;

    fn world(mode: LevelMode) -> WorldState {
        let level = Level { name: "Grove".into(), intro: None, grid: grid_from(&["gggg", "g.Fg", "gggg"]) };
        WorldState::new(level, mode, 2, None, TimingConfig::default(), 0)
    }

    fn frame(w: &WorldState) -> FrameBuffer {
        let mut buf = FrameBuffer::new(80, 12);
        compose(&mut buf, &w.snapshot(), true);
        buf
    }

    #[test]
    fn hud_shows_level_and_axe() {
        let mut w = world(LevelMode::Normal);
        w.player.held_axe = Some(AxeColor::Red);
        let hud = hud_line(&w.snapshot());
        assert!(hud.contains("Level 2 : Grove"));
        assert!(hud.contains("Axe: red"));
        assert!(!hud.contains("Time"));
    }

    #[test]
    fn hud_shows_timer_in_bonus_mode() {
        let w = world(LevelMode::Bonus);
        assert!(hud_line(&w.snapshot()).contains("Time: 60s"));
    }

    #[test]
    fn map_draws_player_and_finish() {
        let w = world(LevelMode::Normal);
        let buf = frame(&w);
        let row: String = buf.row_text(MAP_ROW + 1).chars().skip(MAP_COL).take(8).collect();
        assert_eq!(row, "♣♣@v[]♣♣");
    }

    #[test]
    fn finished_hides_player_and_shows_overlay() {
        let mut w = world(LevelMode::Normal);
        w.state = GameState::Finished;
        w.finished = true;
        let snap = w.snapshot();
        let (glyph, _, _) = tile_glyph(Tile::GRASS, None, Direction::Down, None);
        assert_eq!(glyph, "  ");
        let mut buf = FrameBuffer::new(80, 12);
        compose(&mut buf, &snap, true);
        let all: String = (0..12).map(|y| buf.row_text(y)).collect();
        assert!(!all.contains("@v"));
        assert!(all.contains("LEVEL COMPLETE"));
    }

    #[test]
    fn chop_stage_animates() {
        let stage = |s| tile_glyph(Tile::Tree { color: AxeColor::Blue, cut: CutState::BeingCut }, Some(s), Direction::Up, None).0;
        assert_eq!(stage(0), "♣♣");
        assert_eq!(stage(3), "__");
        let cut = tile_glyph(Tile::Tree { color: AxeColor::Blue, cut: CutState::Cut }, None, Direction::Up, None);
        assert_eq!(cut.1, STUMP);
    }

    #[test]
    fn message_bar_under_map() {
        let mut w = world(LevelMode::Tutorial);
        w.player.say("I need a red axe to cut this tree");
        let buf = frame(&w);
        assert!(buf.row_text(MAP_ROW + 3 + 1).contains("I need a red axe"));
        assert!(w.snapshot().cut_stage(Coord::new(0, 0)).is_none());
    }
}
