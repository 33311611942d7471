/// Level source: turns `(mode, number)` into a starting grid.
///
/// ## Sources (priority order):
///   1. `levels/` directory: `<mode>-<n>.txt` (e.g. `normal-2.txt`)
///   2. Built-in embedded levels
///
/// ## Level format (`.txt`):
///   ```text
///   # Level Name
///   ! Optional line the player says when the level starts (tutorials)
///   <map rows>
///   ```
///
/// ## Tile legend:
///   '.' / ' ' = Grass            'F' = Finish
///   'r' 'b' 'g' 'y' = Tree       'R' 'B' 'G' 'Y' = Axe (same colors)
///   '$' = Grass with a coin
///
/// Every level must be at least 3x3 and have plain grass at (1,1),
/// where the player spawns. Rows shorter than the widest are padded
/// with grass.
///
/// Bonus level 0 is the coin room entered after finishing a Bonus-mode
/// level; playable levels are numbered from 1.

use std::path::{Path, PathBuf};

use log::{debug, warn};
use thiserror::Error;

use crate::domain::grid::Grid;
use crate::domain::tile::Tile;
use super::world::{LevelMode, SPAWN};

/// Number of the coin room within the Bonus family.
pub const BONUS_ROOM: u32 = 0;

/// A parsed level, ready to become a `WorldState`.
#[derive(Clone, Debug)]
pub struct Level {
    pub name: String,
    pub intro: Option<String>,
    pub grid: Grid,
}

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("no {} level {number}", .mode.slug())]
    NotFound { mode: LevelMode, number: u32 },
    #[error("could not read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("level has no map rows")]
    Empty,
    #[error("level is {width}x{height}, at least 3x3 is required")]
    TooSmall { width: usize, height: usize },
    #[error("unknown tile {ch:?} at ({x}, {y})")]
    UnknownTile { ch: char, x: usize, y: usize },
    #[error("spawn cell (1, 1) must be plain grass")]
    SpawnBlocked,
}

/// The level generator seen by the session.
pub trait LevelSource {
    fn generate(&self, mode: LevelMode, number: u32) -> Result<Level, LevelError>;
}

/// Level files on disk with the embedded set as fallback.
#[derive(Clone, Debug, Default)]
pub struct LevelLibrary {
    dir: Option<PathBuf>,
}

impl LevelLibrary {
    pub fn new(dir: Option<PathBuf>) -> Self {
        LevelLibrary { dir }
    }

    fn file_for(&self, mode: LevelMode, number: u32) -> Option<PathBuf> {
        let dir = self.dir.as_ref()?;
        let path = dir.join(format!("{}-{}.txt", mode.slug(), number));
        path.is_file().then_some(path)
    }
}

impl LevelSource for LevelLibrary {
    fn generate(&self, mode: LevelMode, number: u32) -> Result<Level, LevelError> {
        if let Some(path) = self.file_for(mode, number) {
            debug!("loading level from {}", path.display());
            return load_file(&path);
        }
        match embedded(mode, number) {
            Some(text) => parse_level(text),
            None => Err(LevelError::NotFound { mode, number }),
        }
    }
}

fn load_file(path: &Path) -> Result<Level, LevelError> {
    let text = std::fs::read_to_string(path).map_err(|source| {
        warn!("level file {} unreadable: {source}", path.display());
        LevelError::Io { path: path.to_path_buf(), source }
    })?;
    parse_level(&text)
}

// ══════════════════════════════════════════════════════════════
// Parsing
// ══════════════════════════════════════════════════════════════

/// Parse a single level from text content.
pub fn parse_level(content: &str) -> Result<Level, LevelError> {
    let mut name = String::new();
    let mut intro = None;
    let mut rows: Vec<&str> = vec![];

    for line in content.lines() {
        if let Some(rest) = line.strip_prefix('#') {
            if name.is_empty() {
                name = rest.trim().to_string();
            }
        } else if let Some(rest) = line.strip_prefix('!') {
            intro = Some(rest.trim().to_string());
        } else {
            rows.push(line.trim_end_matches('\r'));
        }
    }

    // Leading and trailing empty lines are layout, not map. A line of
    // spaces is a row of grass.
    while rows.last().map_or(false, |r| r.is_empty()) {
        rows.pop();
    }
    let first = rows.iter().position(|r| !r.is_empty()).unwrap_or(rows.len());
    let rows = &rows[first..];

    if rows.is_empty() {
        return Err(LevelError::Empty);
    }

    let width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0);
    let height = rows.len();
    if width < 3 || height < 3 {
        return Err(LevelError::TooSmall { width, height });
    }

    let mut tiles = Vec::with_capacity(height);
    for (y, row) in rows.iter().enumerate() {
        let mut line = Vec::with_capacity(width);
        for (x, ch) in row.chars().enumerate() {
            let tile = Tile::from_legend(ch).ok_or(LevelError::UnknownTile { ch, x, y })?;
            line.push(tile);
        }
        line.resize(width, Tile::GRASS);
        tiles.push(line);
    }

    let grid = Grid::from_rows(tiles).ok_or(LevelError::Empty)?;
    if !grid.get(SPAWN).map_or(false, Tile::is_plain_empty) {
        return Err(LevelError::SpawnBlocked);
    }

    if name.is_empty() {
        name = "Unnamed Grove".to_string();
    }

    Ok(Level { name, intro, grid })
}

// ══════════════════════════════════════════════════════════════
// Embedded fallback levels
// ══════════════════════════════════════════════════════════════

fn embedded(mode: LevelMode, number: u32) -> Option<&'static str> {
    let set: &[&str] = match mode {
        LevelMode::Normal => &NORMAL,
        LevelMode::Tutorial => &TUTORIAL,
        LevelMode::Bonus => &BONUS,
    };
    // Bonus numbering starts at the coin room (0); the others at 1.
    let index = match mode {
        LevelMode::Bonus => number as usize,
        _ => (number as usize).checked_sub(1)?,
    };
    set.get(index).copied()
}

const NORMAL: [&str; 3] = [
    "# Level 1 - Red Line
gggggggggg
g....r...g
g.R..r.F.g
g....r...g
gggggggggg
",
    "# Level 2 - Two Walls
gggggggggggg
g..Y.y.B.b.g
g....y...bFg
g....y...b.g
gggggggggggg
",
    "# Level 3 - Second Thoughts
gggggggggggggg
g.....r..y...g
g.R...r..y.F.g
g.....rB.y...g
g.Y...r..yyyyg
gggggggggggggg
",
];

const TUTORIAL: [&str; 2] = [
    "# Tutorial 1 - First Swing
! Grab the red axe, face the red tree and press SPACE.
gggggggg
g..R.rFg
g....r.g
gggggggg
",
    "# Tutorial 2 - Wrong Axe
! A tree only falls to an axe of its own color.
gggggggggg
g.R...b.Fg
g.B...b..g
g.....b..g
gggggggggg
",
];

const BONUS: [&str; 2] = [
    "# Bonus Room
gggggggggg
g........g
g..g..g..g
g........g
g..g..g.Fg
gggggggggg
",
    "# Bonus 1 - Golden Grove
gggggggggg
g...b....g
g.B.b..F.g
g...b....g
gggggggggg
",
];
