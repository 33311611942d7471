/// Walk and cut rules — truth-table driven.
///
/// Pure functions operating on the grid — no side effects.
/// These encode "what is legal" without performing the action;
/// `sim::step` applies the result.
///
/// ## Walk
/// ┌──────────────────────────────┬─────────┐
/// │ Condition                     │ Allow?  │
/// ├──────────────────────────────┼─────────┤
/// │ Step leaves grid (x<0 / y<0)  │ DENY    │
/// │ Target x >= width / y>=height │ DENY    │
/// │ Target tile solid             │ DENY    │
/// │ Otherwise                     │ ALLOW   │
/// └──────────────────────────────┴─────────┘
///
/// ## Cut (tile in facing direction)
/// ┌──────────────────────────────┬────────────────┐
/// │ Condition                     │ Verdict        │
/// ├──────────────────────────────┼────────────────┤
/// │ Not a tree / out of range     │ NoTree         │
/// │ Tree already Cut              │ Ignored        │
/// │ Tree BeingCut                 │ Ignored        │
/// │ Held axe color == tree color  │ Start          │
/// │ Otherwise (incl. no axe)      │ WrongAxe(tree) │
/// └──────────────────────────────┴────────────────┘

use super::entity::{Coord, Direction};
use super::grid::Grid;
use super::tile::{AxeColor, CutState, Tile};

/// Where a walk from `from` towards `dir` lands, with the tile found there.
/// None when the step is blocked or leaves the grid.
pub fn walk_target(grid: &Grid, from: Coord, dir: Direction) -> Option<(Coord, Tile)> {
    let to = from.step(dir).filter(|c| grid.contains(*c))?;
    let tile = grid.get(to)?;
    if tile.is_solid() {
        return None;
    }
    Some((to, tile))
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CutVerdict {
    NoTree,
    Ignored,
    Start,
    WrongAxe(AxeColor),
}

/// Decide what a cut attempt on `target` does.
pub fn cut_verdict(target: Option<Tile>, held: Option<AxeColor>) -> CutVerdict {
    let (color, cut) = match target {
        Some(Tile::Tree { color, cut }) => (color, cut),
        _ => return CutVerdict::NoTree,
    };
    if cut != CutState::Idle {
        return CutVerdict::Ignored;
    }
    if held == Some(color) {
        CutVerdict::Start
    } else {
        CutVerdict::WrongAxe(color)
    }
}

pub fn wrong_axe_message(tree: AxeColor) -> String {
    format!("I need a {tree} axe to cut this tree")
}
