use serde::{Deserialize, Serialize};

use crate::*;

/// What lies under a tile, fixed once mines are laid.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TileKind {
    Mine,
    /// Adjacent mine count, always in `1..=8`.
    Number(u8),
    Blank,
}

impl TileKind {
    pub const fn from_adjacent_mines(count: u8) -> Self {
        match count {
            0 => Self::Blank,
            count => Self::Number(count),
        }
    }

    pub const fn is_mine(self) -> bool {
        matches!(self, Self::Mine)
    }

    /// Adjacent mine count for safe tiles, `None` for mines.
    pub const fn adjacent_mines(self) -> Option<u8> {
        match self {
            Self::Mine => None,
            Self::Number(count) => Some(count),
            Self::Blank => Some(0),
        }
    }
}

impl Default for TileKind {
    fn default() -> Self {
        Self::Blank
    }
}

/// What a renderer should draw for a tile.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VisualState {
    Hidden,
    Flagged,
    Revealed(TileKind),
}

impl Default for VisualState {
    fn default() -> Self {
        Self::Hidden
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    position: Coord2,
    kind: TileKind,
    revealed: bool,
    flagged: bool,
    misflagged: bool,
}

impl Tile {
    pub(crate) const fn new(position: Coord2, kind: TileKind) -> Self {
        Self {
            position,
            kind,
            revealed: false,
            flagged: false,
            misflagged: false,
        }
    }

    pub const fn position(&self) -> Coord2 {
        self.position
    }

    pub const fn row(&self) -> Coord {
        self.position.1
    }

    pub const fn col(&self) -> Coord {
        self.position.0
    }

    pub const fn kind(&self) -> TileKind {
        self.kind
    }

    pub const fn is_mine(&self) -> bool {
        self.kind.is_mine()
    }

    pub const fn is_revealed(&self) -> bool {
        self.revealed
    }

    pub const fn is_flagged(&self) -> bool {
        self.flagged
    }

    /// Set once the game ended on a tile that was flagged without holding a mine.
    pub const fn is_misflagged(&self) -> bool {
        self.misflagged
    }

    pub const fn visual_state(&self) -> VisualState {
        if self.revealed {
            VisualState::Revealed(self.kind)
        } else if self.flagged {
            VisualState::Flagged
        } else {
            VisualState::Hidden
        }
    }

    pub(crate) fn set_kind(&mut self, kind: TileKind) {
        self.kind = kind;
    }

    pub(crate) fn reveal(&mut self) {
        self.revealed = true;
    }

    pub(crate) fn set_flagged(&mut self, flagged: bool) {
        self.flagged = flagged;
    }

    /// End-of-game cleanup, turns a wrong flag into a revealed safe tile.
    pub(crate) fn mark_misflagged(&mut self) {
        self.flagged = false;
        self.revealed = true;
        self.misflagged = true;
    }
}
