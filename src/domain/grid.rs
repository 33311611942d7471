/// Grid: the 2-D tile container of one level.
///
/// Stored row-major (`tiles[y][x]`). Every accessor is bounds-checked and
/// fails closed: reads outside the grid return None, writes are dropped.

use super::entity::Coord;
use super::tile::Tile;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    tiles: Vec<Vec<Tile>>,
    width: usize,
    height: usize,
}

impl Grid {
    /// A grid of plain grass.
    #[cfg(test)]
    pub fn new(width: usize, height: usize) -> Self {
        Grid { tiles: vec![vec![Tile::GRASS; width]; height], width, height }
    }

    /// Build from rows. All rows must have the same length.
    pub fn from_rows(rows: Vec<Vec<Tile>>) -> Option<Self> {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|r| r.len() != width) {
            return None;
        }
        Some(Grid { tiles: rows, width, height })
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    #[inline]
    pub fn contains(&self, at: Coord) -> bool {
        at.x < self.width && at.y < self.height
    }

    #[inline]
    pub fn get(&self, at: Coord) -> Option<Tile> {
        self.tiles.get(at.y)?.get(at.x).copied()
    }

    /// Replace a tile. Returns false (and changes nothing) when out of range.
    #[inline]
    pub fn set(&mut self, at: Coord, tile: Tile) -> bool {
        match self.tiles.get_mut(at.y).and_then(|row| row.get_mut(at.x)) {
            Some(slot) => {
                *slot = tile;
                true
            }
            None => false,
        }
    }

    /// Every coordinate, row by row.
    pub fn positions(&self) -> impl Iterator<Item = Coord> + '_ {
        (0..self.height).flat_map(move |y| (0..self.width).map(move |x| Coord::new(x, y)))
    }

    /// Set `coin = true` on every plain Empty tile.
    pub fn scatter_coins(&mut self) -> usize {
        let mut placed = 0;
        for tile in self.tiles.iter_mut().flatten() {
            if tile.is_plain_empty() {
                *tile = Tile::Empty { coin: true };
                placed += 1;
            }
        }
        placed
    }

    pub fn coins_left(&self) -> usize {
        self.tiles.iter().flatten().filter(|t| t.has_coin()).count()
    }
}

/// Test helper: build a grid from legend rows (see `Tile::from_legend`),
/// with `@` marking the player.
#[cfg(test)]
pub fn grid_from(rows: &[&str]) -> Grid {
    let tiles = rows
        .iter()
        .map(|r| {
            r.chars()
                .map(|c| if c == '@' { Tile::Player } else { Tile::from_legend(c).unwrap() })
                .collect()
        })
        .collect();
    Grid::from_rows(tiles).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tile::AxeColor;

    #[test]
    fn out_of_range_fails_closed() {
        let mut g = Grid::new(3, 2);
        assert_eq!(g.dimensions(), (3, 2));
        assert_eq!(g.get(Coord::new(3, 0)), None);
        assert_eq!(g.get(Coord::new(0, 2)), None);
        assert!(!g.set(Coord::new(5, 5), Tile::Finish));
        assert!(g.set(Coord::new(2, 1), Tile::Finish));
        assert_eq!(g.get(Coord::new(2, 1)), Some(Tile::Finish));
    }

    #[test]
    fn ragged_rows_rejected() {
        let rows = vec![vec![Tile::GRASS; 3], vec![Tile::GRASS; 2]];
        assert!(Grid::from_rows(rows).is_none());
    }

    #[test]
    fn coins_only_on_plain_empty() {
        let mut g = Grid::new(3, 1);
        g.set(Coord::new(0, 0), Tile::tree(AxeColor::Red));
        g.set(Coord::new(1, 0), Tile::Player);
        assert_eq!(g.scatter_coins(), 1);
        assert_eq!(g.get(Coord::new(2, 0)), Some(Tile::Empty { coin: true }));
        assert_eq!(g.get(Coord::new(1, 0)), Some(Tile::Player));
        assert_eq!(g.coins_left(), 1);
    }

    #[test]
    fn positions_are_row_major() {
        let g = Grid::new(2, 2);
        let all: Vec<Coord> = g.positions().collect();
        assert_eq!(all, vec![Coord::new(0, 0), Coord::new(1, 0), Coord::new(0, 1), Coord::new(1, 1)]);
    }
}
