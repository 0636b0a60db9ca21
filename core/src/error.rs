use thiserror::Error;

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Invalid coordinates")]
    InvalidCoordinate,
    #[error("Move is not allowed in the current game state")]
    IllegalStateTransition,
    #[error("Too many mines, no room left for the first-click safe zone")]
    TooManyMines,
    #[error("Board must have at least one row and one column")]
    InvalidDimensions,
    #[error("Board shape does not match declared size")]
    InvalidBoardShape,
    #[error("Could not seed mine placement from OS entropy")]
    EntropyUnavailable,
}

pub type Result<T> = core::result::Result<T, GameError>;
