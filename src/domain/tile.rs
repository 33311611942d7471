/// Tile types and their properties.
/// Properties are queried via methods, not stored as flags,
/// so tile semantics are centralized here.

use std::fmt;

/// Axe / tree colors. Closed set: every tree color has a matching axe.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum AxeColor {
    Red,
    Blue,
    Green,
    Yellow,
}

impl AxeColor {
    /// Lowercase name used in dialogue ("I need a blue axe ...").
    pub fn name(self) -> &'static str {
        match self {
            AxeColor::Red => "red",
            AxeColor::Blue => "blue",
            AxeColor::Green => "green",
            AxeColor::Yellow => "yellow",
        }
    }
}

impl fmt::Display for AxeColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Tree lifecycle. Idle and BeingCut block movement; Cut is walkable.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CutState {
    Idle,
    BeingCut,
    Cut,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Tile {
    /// Grass. `coin` is only ever set in a bonus sub-level.
    Empty { coin: bool },
    Tree { color: AxeColor, cut: CutState },
    /// Axe lying on the ground, removed on pickup.
    Axe(AxeColor),
    Finish,
    /// Cell currently occupied by the player.
    Player,
}

impl Tile {
    pub const GRASS: Tile = Tile::Empty { coin: false };

    pub fn tree(color: AxeColor) -> Self {
        Tile::Tree { color, cut: CutState::Idle }
    }

    /// Can the player NOT step onto this tile?
    pub fn is_solid(self) -> bool {
        match self {
            Tile::Tree { cut, .. } => cut != CutState::Cut,
            // The player's own cell is never a valid target.
            Tile::Player => true,
            Tile::Empty { .. } | Tile::Axe(_) | Tile::Finish => false,
        }
    }

    /// Plain grass (with or without coin): the only tiles that get coins.
    pub fn is_plain_empty(self) -> bool {
        matches!(self, Tile::Empty { .. })
    }

    pub fn has_coin(self) -> bool {
        matches!(self, Tile::Empty { coin: true })
    }

    /// Level-file legend. Lowercase = tree, uppercase = axe.
    pub fn from_legend(ch: char) -> Option<Tile> {
        let tile = match ch {
            ' ' | '.' => Tile::GRASS,
            '$' => Tile::Empty { coin: true },
            'F' => Tile::Finish,
            'r' => Tile::tree(AxeColor::Red),
            'b' => Tile::tree(AxeColor::Blue),
            'g' => Tile::tree(AxeColor::Green),
            'y' => Tile::tree(AxeColor::Yellow),
            'R' => Tile::Axe(AxeColor::Red),
            'B' => Tile::Axe(AxeColor::Blue),
            'G' => Tile::Axe(AxeColor::Green),
            'Y' => Tile::Axe(AxeColor::Yellow),
            _ => return None,
        };
        Some(tile)
    }
}
