//! Board rules for Minesweeper: deferred first-click-safe mine placement,
//! adjacency numbers, flood-fill reveal, flags and win/loss detection.
//!
//! Rendering and input are left to the host, which maps clicks to coordinates,
//! calls [`Board::reveal`] or [`Board::toggle_flag`] and reads back
//! [`Tile::visual_state`] or a [`BoardSnapshot`].

use core::ops::Index;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

pub use board::*;
pub use error::*;
pub use generator::*;
pub use snapshot::*;
pub use tile::*;
pub use types::*;

mod board;
mod error;
mod generator;
mod snapshot;
mod tile;
mod types;

/// Tiles kept clear around the first click.
pub const SAFE_ZONE_TILES: CellCount = 9;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    /// Board size as `(cols, rows)`.
    pub size: Coord2,
    pub mines: CellCount,
    /// Fixed seed for mine placement, drawn from OS entropy when missing.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl GameConfig {
    pub const fn new_unchecked(size: Coord2, mines: CellCount) -> Self {
        Self {
            size,
            mines,
            seed: None,
        }
    }

    pub fn new(rows: Coord, cols: Coord, mines: CellCount) -> Result<Self> {
        let config = Self::new_unchecked((cols, rows), mines);
        config.validate()?;
        Ok(config)
    }

    pub const fn beginner() -> Self {
        Self::new_unchecked((9, 9), 10)
    }

    pub const fn intermediate() -> Self {
        Self::new_unchecked((16, 16), 40)
    }

    pub const fn expert() -> Self {
        Self::new_unchecked((30, 16), 99)
    }

    /// 15x15 with 20 mines.
    pub const fn classic() -> Self {
        Self::new_unchecked((15, 15), 20)
    }

    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub const fn rows(&self) -> Coord {
        self.size.1
    }

    pub const fn cols(&self) -> Coord {
        self.size.0
    }

    pub const fn total_tiles(&self) -> CellCount {
        mult(self.size.0, self.size.1)
    }

    /// Checks dimensions and that the mines leave room for a full safe zone.
    pub fn validate(&self) -> Result<()> {
        if self.size.0 == 0 || self.size.1 == 0 {
            return Err(GameError::InvalidDimensions);
        }
        if self.mines > 0 && self.mines.saturating_add(SAFE_ZONE_TILES) >= self.total_tiles() {
            return Err(GameError::TooManyMines);
        }
        Ok(())
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::classic()
    }
}

/// Where the mines are, independent of any play state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MineLayout {
    mine_mask: Array2<bool>,
    mine_count: CellCount,
}

impl MineLayout {
    pub fn from_mine_mask(mine_mask: Array2<bool>) -> Result<Self> {
        let (x, y) = mine_mask.dim();
        if x == 0 || y == 0 {
            return Err(GameError::InvalidDimensions);
        }
        if x > Coord::MAX.into() || y > Coord::MAX.into() {
            return Err(GameError::InvalidBoardShape);
        }
        // at most 255 * 255 tiles, always fits
        let mine_count = mine_mask.iter().filter(|&&is_mine| is_mine).count() as CellCount;
        Ok(Self {
            mine_mask,
            mine_count,
        })
    }

    pub(crate) fn new_unchecked(mine_mask: Array2<bool>, mine_count: CellCount) -> Self {
        Self {
            mine_mask,
            mine_count,
        }
    }

    pub fn from_mine_coords(size: Coord2, mine_coords: &[Coord2]) -> Result<Self> {
        let mut mine_mask: Array2<bool> = Array2::default(size.to_nd_index());

        for &coords in mine_coords {
            if !in_bounds(coords, size) {
                return Err(GameError::InvalidCoordinate);
            }
            mine_mask[coords.to_nd_index()] = true;
        }

        Self::from_mine_mask(mine_mask)
    }

    pub fn game_config(&self) -> GameConfig {
        GameConfig::new_unchecked(self.size(), self.mine_count)
    }

    pub fn validate_coords(&self, coords: Coord2) -> Result<Coord2> {
        if in_bounds(coords, self.size()) {
            Ok(coords)
        } else {
            Err(GameError::InvalidCoordinate)
        }
    }

    pub fn size(&self) -> Coord2 {
        let (x, y) = self.mine_mask.dim();
        // checked on construction
        (x as Coord, y as Coord)
    }

    pub fn safe_tile_count(&self) -> CellCount {
        self.total_tiles() - self.mine_count
    }

    pub fn total_tiles(&self) -> CellCount {
        let (x, y) = self.size();
        mult(x, y)
    }

    pub fn mine_count(&self) -> CellCount {
        self.mine_count
    }

    pub fn contains_mine(&self, coords: Coord2) -> bool {
        self[coords]
    }

    pub fn adjacent_mine_count(&self, coords: Coord2) -> u8 {
        // at most 8 neighbors
        self.iter_neighbors(coords).filter(|&pos| self[pos]).count() as u8
    }

    /// Mine or adjacency number for the tile at `coords`.
    pub fn kind_at(&self, coords: Coord2) -> TileKind {
        if self[coords] {
            TileKind::Mine
        } else {
            TileKind::from_adjacent_mines(self.adjacent_mine_count(coords))
        }
    }

    pub fn iter_neighbors(&self, coords: Coord2) -> NeighborIter {
        self.mine_mask.iter_neighbors(coords)
    }
}

impl Index<Coord2> for MineLayout {
    type Output = bool;

    fn index(&self, coords: Coord2) -> &Self::Output {
        &self.mine_mask[coords.to_nd_index()]
    }
}

/// Outcome of revealing a tile
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RevealOutcome {
    Safe,
    Exploded,
}

impl RevealOutcome {
    pub const fn is_exploded(self) -> bool {
        matches!(self, Self::Exploded)
    }
}
