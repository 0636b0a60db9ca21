use core::fmt;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::*;

/// Read-only copy of what a renderer may show, with mines hidden until revealed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoardSnapshot {
    pub size: Coord2,
    pub state: BoardState,
    pub mines_left: isize,
    pub tiles: Array2<VisualState>,
    /// Tiles revealed at game end because they were flagged without a mine
    pub misflagged: Array2<bool>,
    pub triggered_mine: Option<Coord2>,
}

impl BoardSnapshot {
    pub fn from_board(board: &Board) -> Self {
        let size = board.size();
        let mut tiles = Array2::from_elem(size.to_nd_index(), VisualState::Hidden);
        let mut misflagged = Array2::from_elem(size.to_nd_index(), false);
        for tile in board.tiles() {
            tiles[tile.position().to_nd_index()] = tile.visual_state();
            misflagged[tile.position().to_nd_index()] = tile.is_misflagged();
        }

        Self {
            size,
            state: board.state(),
            mines_left: board.mines_left(),
            tiles,
            misflagged,
            triggered_mine: board.triggered_mine(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let expected = (self.size.0 as usize, self.size.1 as usize);
        if self.tiles.dim() != expected || self.misflagged.dim() != expected {
            return Err(GameError::InvalidBoardShape);
        }
        if let Some(coords) = self.triggered_mine {
            if !in_bounds(coords, self.size) {
                return Err(GameError::InvalidCoordinate);
            }
        }
        Ok(())
    }

    pub fn visual_state_at(&self, coords: Coord2) -> Result<VisualState> {
        if in_bounds(coords, self.size) {
            self.tiles
                .get(coords.to_nd_index())
                .copied()
                .ok_or(GameError::InvalidBoardShape)
        } else {
            Err(GameError::InvalidCoordinate)
        }
    }

    pub fn is_misflagged_at(&self, coords: Coord2) -> Result<bool> {
        if in_bounds(coords, self.size) {
            self.misflagged
                .get(coords.to_nd_index())
                .copied()
                .ok_or(GameError::InvalidBoardShape)
        } else {
            Err(GameError::InvalidCoordinate)
        }
    }

    fn glyph_at(&self, coords: Coord2) -> char {
        if self.triggered_mine == Some(coords) {
            return '!';
        }
        let misflagged = self
            .misflagged
            .get(coords.to_nd_index())
            .copied()
            .unwrap_or_default();
        if misflagged {
            return 'X';
        }
        let state = self
            .tiles
            .get(coords.to_nd_index())
            .copied()
            .unwrap_or_default();
        glyph(state)
    }
}

fn glyph(state: VisualState) -> char {
    match state {
        VisualState::Hidden => '#',
        VisualState::Flagged => 'F',
        VisualState::Revealed(TileKind::Mine) => '*',
        VisualState::Revealed(TileKind::Blank) => '.',
        VisualState::Revealed(TileKind::Number(count)) => {
            char::from_digit(count.into(), 10).unwrap_or('?')
        }
    }
}

/// One row per line, top row first.
impl fmt::Display for BoardSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (x_end, y_end) = self.size;
        for y in 0..y_end {
            for x in 0..x_end {
                write!(f, "{}", self.glyph_at((x, y)))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
