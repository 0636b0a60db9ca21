use hashbrown::HashSet;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::*;

/// Valid transitions:
/// - Unplaced -> Active, on the first reveal, once mines are laid
/// - Active -> Won, once every safe tile is revealed
/// - Active -> Lost, on revealing a mine
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoardState {
    /// Mines not laid yet, waiting for the first reveal
    Unplaced,
    Active,
    Won,
    Lost,
}

impl BoardState {
    pub const fn is_unplaced(self) -> bool {
        matches!(self, Self::Unplaced)
    }

    /// Indicates the game has ended and no moves can be made anymore
    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }
}

impl Default for BoardState {
    fn default() -> Self {
        Self::Unplaced
    }
}

/// Represents a game from the first click to a win or loss
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BoardParts")]
pub struct Board {
    config: GameConfig,
    seed: u64,
    tiles: Array2<Tile>,
    state: BoardState,
    triggered_mine: Option<Coord2>,
}

/// Unchecked deserialized form of a [`Board`], shape-checked before use.
#[derive(Deserialize)]
struct BoardParts {
    config: GameConfig,
    seed: u64,
    tiles: Array2<Tile>,
    state: BoardState,
    triggered_mine: Option<Coord2>,
}

impl TryFrom<BoardParts> for Board {
    type Error = GameError;

    fn try_from(parts: BoardParts) -> Result<Self> {
        let size = parts.config.size;
        if size.0 == 0 || size.1 == 0 {
            return Err(GameError::InvalidDimensions);
        }
        let expected = (size.0 as usize, size.1 as usize);
        if parts.tiles.dim() != expected {
            return Err(GameError::InvalidBoardShape);
        }
        let misplaced = parts
            .tiles
            .indexed_iter()
            .any(|((x, y), tile)| tile.position() != (x as Coord, y as Coord));
        if misplaced {
            return Err(GameError::InvalidBoardShape);
        }
        if let Some(coords) = parts.triggered_mine {
            if !in_bounds(coords, size) {
                return Err(GameError::InvalidCoordinate);
            }
        }

        Ok(Self {
            config: parts.config,
            seed: parts.seed,
            tiles: parts.tiles,
            state: parts.state,
            triggered_mine: parts.triggered_mine,
        })
    }
}

impl Board {
    pub fn new(rows: Coord, cols: Coord, mines: CellCount) -> Result<Self> {
        Self::with_config(GameConfig::new(rows, cols, mines)?)
    }

    /// Mines are laid on the first reveal, seeded from `config.seed` or OS entropy.
    pub fn with_config(config: GameConfig) -> Result<Self> {
        config.validate()?;
        let seed = match config.seed {
            Some(seed) => seed,
            None => RandomLayoutGenerator::from_entropy()?.seed(),
        };
        Ok(Self {
            config,
            seed,
            tiles: blank_tiles(config.size),
            state: Default::default(),
            triggered_mine: None,
        })
    }

    /// Board with mines already laid, skips first-click safety.
    pub fn from_layout(layout: MineLayout) -> Self {
        let config = layout.game_config();
        let mut board = Self {
            config,
            seed: 0,
            tiles: blank_tiles(config.size),
            state: BoardState::Active,
            triggered_mine: None,
        };
        board.lay_tiles(&layout);
        board
    }

    pub fn state(&self) -> BoardState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state.is_finished()
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn size(&self) -> Coord2 {
        self.config.size
    }

    pub fn rows(&self) -> Coord {
        self.config.rows()
    }

    pub fn cols(&self) -> Coord {
        self.config.cols()
    }

    pub fn total_mines(&self) -> CellCount {
        self.config.mines
    }

    /// How many mines have not been flagged yet, negative when over-flagged
    pub fn mines_left(&self) -> isize {
        (self.config.mines as isize) - (self.flagged_count() as isize)
    }

    pub fn revealed_count(&self) -> CellCount {
        self.count_tiles(Tile::is_revealed)
    }

    pub fn flagged_count(&self) -> CellCount {
        self.count_tiles(Tile::is_flagged)
    }

    /// The mine that ended the game, if it was lost
    pub fn triggered_mine(&self) -> Option<Coord2> {
        self.triggered_mine
    }

    pub fn tile_at(&self, coords: Coord2) -> Result<&Tile> {
        let coords = self.validate_coords(coords)?;
        Ok(&self.tiles[coords.to_nd_index()])
    }

    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter()
    }

    pub fn snapshot(&self) -> BoardSnapshot {
        BoardSnapshot::from_board(self)
    }

    pub fn validate_coords(&self, coords: Coord2) -> Result<Coord2> {
        if in_bounds(coords, self.size()) {
            Ok(coords)
        } else {
            Err(GameError::InvalidCoordinate)
        }
    }

    /// Reveal a tile, flood-filling from blank tiles. The first reveal lays the mines around it.
    pub fn reveal(&mut self, coords: Coord2) -> Result<RevealOutcome> {
        use RevealOutcome::*;

        let coords = self.validate_coords(coords)?;
        self.check_not_finished()?;

        if self.state.is_unplaced() {
            self.place_mines_avoiding(coords);
        }

        let tile = self.tiles[coords.to_nd_index()];
        if tile.is_revealed() || tile.is_flagged() {
            return Ok(Safe);
        }

        Ok(match tile.kind() {
            TileKind::Mine => {
                self.tiles[coords.to_nd_index()].reveal();
                self.triggered_mine = Some(coords);
                self.end_game(false);
                Exploded
            }
            TileKind::Number(count) => {
                self.tiles[coords.to_nd_index()].reveal();
                log::debug!("Revealed tile at {:?}, mine count: {}", coords, count);
                self.check_won();
                Safe
            }
            TileKind::Blank => {
                self.flood_reveal(coords);
                self.check_won();
                Safe
            }
        })
    }

    /// Flag or unflag a hidden tile, returns whether it is flagged afterwards
    pub fn toggle_flag(&mut self, coords: Coord2) -> Result<bool> {
        let coords = self.validate_coords(coords)?;
        self.check_not_finished()?;

        let tile = &mut self.tiles[coords.to_nd_index()];
        if tile.is_revealed() {
            return Ok(false);
        }
        let flagged = !tile.is_flagged();
        tile.set_flagged(flagged);
        Ok(flagged)
    }

    /// Whether every tile without a mine has been revealed
    pub fn check_victory(&self) -> bool {
        self.tiles.iter().all(|tile| tile.is_mine() || tile.is_revealed())
    }

    /// Shows every mine and turns wrong flags into revealed tiles, only once the game ended
    pub fn reveal_all_mines(&mut self) -> Result<()> {
        if !self.state.is_finished() {
            return Err(GameError::IllegalStateTransition);
        }
        self.reconcile_tiles();
        Ok(())
    }

    fn place_mines_avoiding(&mut self, safe: Coord2) {
        let safe_zone = SafeZone::around(safe, self.size());
        let layout = RandomLayoutGenerator::new(self.seed).generate(&self.config, safe_zone);
        self.lay_tiles(&layout);
        self.state = BoardState::Active;
        log::debug!("Mines laid around first reveal at {:?}", safe);
    }

    fn lay_tiles(&mut self, layout: &MineLayout) {
        for tile in self.tiles.iter_mut() {
            tile.set_kind(layout.kind_at(tile.position()));
        }
    }

    fn flood_reveal(&mut self, start: Coord2) {
        let size = self.size();
        let mut visited: HashSet<Coord2> = HashSet::new();
        visited.insert(start);
        let mut to_visit = vec![start];
        log::trace!("Starting flood-fill from {:?}", start);

        while let Some(visit_coords) = to_visit.pop() {
            let tile = &mut self.tiles[visit_coords.to_nd_index()];

            // flags stay protected inside the region
            if tile.is_revealed() || tile.is_flagged() {
                log::trace!("Skipping tile at {:?}", visit_coords);
                continue;
            }

            tile.reveal();
            log::trace!("Flood revealed tile at {:?}: {:?}", visit_coords, tile.kind());

            if tile.kind() == TileKind::Blank {
                to_visit.extend(
                    NeighborIter::new(visit_coords, size).filter(|&pos| visited.insert(pos)),
                );
            }
        }
    }

    fn check_won(&mut self) {
        if self.check_victory() {
            self.end_game(true);
        }
    }

    fn end_game(&mut self, won: bool) {
        if self.state.is_finished() {
            return;
        }

        self.state = if won { BoardState::Won } else { BoardState::Lost };
        log::debug!("Game ended: {:?}", self.state);
        self.reconcile_tiles();
    }

    fn reconcile_tiles(&mut self) {
        for tile in self.tiles.iter_mut() {
            if tile.is_mine() {
                tile.set_flagged(false);
                tile.reveal();
            } else if tile.is_flagged() {
                tile.mark_misflagged();
            }
        }
    }

    fn check_not_finished(&self) -> Result<()> {
        if self.state.is_finished() {
            Err(GameError::IllegalStateTransition)
        } else {
            Ok(())
        }
    }

    fn count_tiles(&self, predicate: impl Fn(&Tile) -> bool) -> CellCount {
        // at most 255 * 255 tiles
        self.tiles.iter().filter(|&tile| predicate(tile)).count() as CellCount
    }
}

fn blank_tiles(size: Coord2) -> Array2<Tile> {
    Array2::from_shape_fn(size.to_nd_index(), |(x, y)| {
        Tile::new((x as Coord, y as Coord), TileKind::Blank)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    fn layout(size: Coord2, mines: &[Coord2]) -> MineLayout {
        MineLayout::from_mine_coords(size, mines).unwrap()
    }

    fn seeded(config: GameConfig, seed: u64) -> Board {
        Board::with_config(config.with_seed(seed)).unwrap()
    }

    fn all_coords(size: Coord2) -> impl Iterator<Item = Coord2> {
        (0..size.0).flat_map(move |x| (0..size.1).map(move |y| (x, y)))
    }

    fn revealed_coords(board: &Board) -> Vec<Coord2> {
        board
            .tiles()
            .filter(|tile| tile.is_revealed())
            .map(Tile::position)
            .collect()
    }

    #[test]
    fn new_board_is_hidden_and_unplaced() {
        let board = Board::new(8, 6, 10).unwrap();

        assert_eq!(board.state(), BoardState::Unplaced);
        assert_eq!(board.size(), (6, 8));
        assert!(board.tiles().all(|tile| tile.visual_state() == VisualState::Hidden));
        assert!(board.tiles().all(|tile| !tile.is_mine()));
        assert!(!board.check_victory());
    }

    #[test]
    fn new_board_rejects_bad_config() {
        assert_eq!(Board::new(3, 3, 1), Err(GameError::TooManyMines));
        assert_eq!(Board::new(0, 3, 0), Err(GameError::InvalidDimensions));
    }

    #[test]
    fn first_reveal_is_always_safe() {
        let config = GameConfig::beginner();
        for seed in 0..4 {
            for coords in all_coords(config.size) {
                let mut board = seeded(config, seed);

                assert_eq!(board.reveal(coords), Ok(RevealOutcome::Safe));
                let zone = SafeZone::around(coords, config.size);
                for safe in zone.iter() {
                    assert!(!board.tile_at(safe).unwrap().is_mine());
                }
            }
        }
    }

    #[test]
    fn placement_lays_exact_mine_count() {
        let mut board = seeded(GameConfig::expert(), 11);
        board.reveal((0, 0)).unwrap();

        assert_eq!(board.state(), BoardState::Active);
        assert_eq!(board.tiles().filter(|tile| tile.is_mine()).count(), 99);
    }

    #[test]
    fn numbers_match_adjacent_mines() {
        let mut board = seeded(GameConfig::intermediate(), 5);
        board.reveal((8, 8)).unwrap();

        for tile in board.tiles().filter(|tile| !tile.is_mine()) {
            let adjacent = NeighborIter::new(tile.position(), board.size())
                .filter(|&pos| board.tile_at(pos).unwrap().is_mine())
                .count() as u8;
            assert_eq!(tile.kind(), TileKind::from_adjacent_mines(adjacent));
        }
    }

    #[test]
    fn same_seed_same_board() {
        let mut first = seeded(GameConfig::classic(), 99);
        let mut second = seeded(GameConfig::classic(), 99);
        first.reveal((7, 7)).unwrap();
        second.reveal((7, 7)).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn flood_fill_stops_at_numbers() {
        let mut board = Board::from_layout(layout((6, 1), &[(4, 0)]));

        assert_eq!(board.reveal((0, 0)), Ok(RevealOutcome::Safe));
        assert_eq!(revealed_coords(&board), vec![(0, 0), (1, 0), (2, 0), (3, 0)]);
        assert_eq!(
            board.tile_at((3, 0)).unwrap().visual_state(),
            VisualState::Revealed(TileKind::Number(1))
        );
        assert_eq!(
            board.tile_at((5, 0)).unwrap().visual_state(),
            VisualState::Hidden
        );
        assert_eq!(board.state(), BoardState::Active);
    }

    #[test]
    fn flood_fill_does_not_cross_mine_wall() {
        let mut board = Board::from_layout(layout((5, 3), &[(2, 0), (2, 1), (2, 2)]));

        board.reveal((0, 1)).unwrap();

        let revealed = revealed_coords(&board);
        assert_eq!(revealed.len(), 6);
        assert!(revealed.iter().all(|&(x, _)| x < 2));
        assert_eq!(board.state(), BoardState::Active);
    }

    #[test]
    fn flood_fill_reveals_exact_region() {
        let mut board = seeded(GameConfig::classic(), 3);
        let start = (4, 9);
        board.reveal(start).unwrap();

        // blank region plus its numbered border
        let mut expected = vec![start];
        let mut queue = VecDeque::from([start]);
        while let Some(coords) = queue.pop_front() {
            if board.tile_at(coords).unwrap().kind() != TileKind::Blank {
                continue;
            }
            for pos in NeighborIter::new(coords, board.size()) {
                if !expected.contains(&pos) {
                    expected.push(pos);
                    queue.push_back(pos);
                }
            }
        }
        expected.sort();

        // a lucky opening may win outright and reveal the mines too
        let revealed_safe: Vec<_> = revealed_coords(&board)
            .into_iter()
            .filter(|&coords| !board.tile_at(coords).unwrap().is_mine())
            .collect();
        assert_eq!(revealed_safe, expected);
    }

    #[test]
    fn repeated_reveal_is_idempotent() {
        let mut board = Board::from_layout(layout((5, 3), &[(2, 0), (2, 1), (2, 2)]));
        board.reveal((0, 1)).unwrap();
        let before = board.clone();

        assert_eq!(board.reveal((0, 1)), Ok(RevealOutcome::Safe));
        assert_eq!(board.reveal((1, 2)), Ok(RevealOutcome::Safe));
        assert_eq!(board, before);
    }

    #[test]
    fn flagged_tile_is_protected_from_reveal() {
        let mut board = Board::from_layout(layout((3, 3), &[(0, 0)]));

        assert_eq!(board.toggle_flag((0, 0)), Ok(true));
        assert_eq!(board.reveal((0, 0)), Ok(RevealOutcome::Safe));
        assert_eq!(
            board.tile_at((0, 0)).unwrap().visual_state(),
            VisualState::Flagged
        );
        assert_eq!(board.state(), BoardState::Active);
    }

    #[test]
    fn flood_fill_skips_flagged_tiles() {
        let mut board = Board::from_layout(layout((5, 1), &[(4, 0)]));
        board.toggle_flag((1, 0)).unwrap();

        board.reveal((0, 0)).unwrap();

        assert_eq!(revealed_coords(&board), vec![(0, 0)]);
        assert!(board.tile_at((1, 0)).unwrap().is_flagged());
    }

    #[test]
    fn flag_before_first_reveal_survives_placement() {
        let mut board = seeded(GameConfig::beginner(), 1);

        assert_eq!(board.toggle_flag((4, 4)), Ok(true));
        assert_eq!(board.reveal((4, 4)), Ok(RevealOutcome::Safe));
        assert_eq!(board.state(), BoardState::Active);
        assert!(board.tile_at((4, 4)).unwrap().is_flagged());
        assert_eq!(board.revealed_count(), 0);
    }

    #[test]
    fn toggle_flag_on_revealed_tile_is_noop() {
        let mut board = Board::from_layout(layout((3, 1), &[(0, 0)]));
        board.reveal((1, 0)).unwrap();

        assert_eq!(board.toggle_flag((1, 0)), Ok(false));
        assert!(!board.tile_at((1, 0)).unwrap().is_flagged());
    }

    #[test]
    fn toggle_flag_flips_and_tracks_mines_left() {
        let mut board = seeded(GameConfig::beginner(), 2);

        assert_eq!(board.toggle_flag((0, 0)), Ok(true));
        assert_eq!(board.toggle_flag((1, 0)), Ok(true));
        assert_eq!(board.mines_left(), 8);
        assert_eq!(board.toggle_flag((0, 0)), Ok(false));
        assert_eq!(board.flagged_count(), 1);
        assert_eq!(board.mines_left(), 9);
    }

    #[test]
    fn victory_ignores_mine_reveal_state() {
        let mut board = Board::from_layout(layout((2, 2), &[(0, 0)]));
        board.reveal((1, 0)).unwrap();
        board.reveal((0, 1)).unwrap();
        assert!(!board.check_victory());

        board.reveal((1, 1)).unwrap();

        assert!(board.check_victory());
        assert_eq!(board.state(), BoardState::Won);
        assert!(board.tile_at((0, 0)).unwrap().is_revealed());
        assert_eq!(board.triggered_mine(), None);
    }

    #[test]
    fn empty_board_is_won_in_one_reveal() {
        let mut board = Board::new(5, 5, 0).unwrap();

        assert_eq!(board.reveal((3, 1)), Ok(RevealOutcome::Safe));
        assert!(board.check_victory());
        assert_eq!(board.state(), BoardState::Won);
        assert_eq!(board.revealed_count(), 25);
    }

    #[test]
    fn largest_empty_board_floods_without_recursion() {
        let mut board = Board::new(Coord::MAX, Coord::MAX, 0).unwrap();

        board.reveal((0, 0)).unwrap();

        assert_eq!(board.revealed_count(), mult(Coord::MAX, Coord::MAX));
        assert_eq!(board.state(), BoardState::Won);
    }

    #[test]
    fn revealing_mine_loses_and_reconciles_flags() {
        let mut board = Board::from_layout(layout((4, 1), &[(0, 0), (3, 0)]));
        board.toggle_flag((2, 0)).unwrap();
        board.toggle_flag((3, 0)).unwrap();

        let outcome = board.reveal((0, 0)).unwrap();

        assert!(outcome.is_exploded());
        assert_eq!(board.state(), BoardState::Lost);
        assert_eq!(board.triggered_mine(), Some((0, 0)));

        let mine = board.tile_at((3, 0)).unwrap();
        assert!(mine.is_revealed() && !mine.is_flagged());
        let wrong = board.tile_at((2, 0)).unwrap();
        assert!(wrong.is_misflagged());
        assert_eq!(wrong.visual_state(), VisualState::Revealed(TileKind::Number(1)));
        assert_eq!(
            board.tile_at((1, 0)).unwrap().visual_state(),
            VisualState::Hidden
        );
        assert!(board.tiles().all(|tile| !(tile.is_flagged() && tile.is_revealed())));
    }

    #[test]
    fn finished_board_rejects_moves() {
        let mut board = Board::from_layout(layout((3, 3), &[(1, 1)]));
        board.reveal((1, 1)).unwrap();
        let before = board.clone();

        assert_eq!(board.reveal((0, 0)), Err(GameError::IllegalStateTransition));
        assert_eq!(board.toggle_flag((0, 0)), Err(GameError::IllegalStateTransition));
        assert_eq!(board, before);
    }

    #[test]
    fn won_board_rejects_moves() {
        let mut board = Board::new(4, 4, 0).unwrap();
        board.reveal((0, 0)).unwrap();
        let before = board.clone();

        assert_eq!(board.reveal((1, 1)), Err(GameError::IllegalStateTransition));
        assert_eq!(board.toggle_flag((1, 1)), Err(GameError::IllegalStateTransition));
        assert_eq!(board, before);
    }

    #[test]
    fn out_of_bounds_is_invalid_without_change() {
        let mut board = seeded(GameConfig::beginner(), 4);
        let before = board.clone();

        assert_eq!(board.reveal((9, 0)), Err(GameError::InvalidCoordinate));
        assert_eq!(board.toggle_flag((0, 9)), Err(GameError::InvalidCoordinate));
        assert_eq!(board.tile_at((9, 9)), Err(GameError::InvalidCoordinate));
        assert_eq!(board, before);
    }

    #[test]
    fn reveal_all_mines_requires_finished_game() {
        let mut board = Board::from_layout(layout((3, 1), &[(0, 0)]));
        assert_eq!(board.reveal_all_mines(), Err(GameError::IllegalStateTransition));

        board.reveal((0, 0)).unwrap();
        let after_loss = board.clone();

        assert_eq!(board.reveal_all_mines(), Ok(()));
        assert_eq!(board, after_loss);
    }

    #[test]
    fn board_survives_json() {
        let mut board = Board::from_layout(layout((3, 2), &[(2, 1)]));
        board.toggle_flag((2, 1)).unwrap();
        board.reveal((0, 0)).unwrap();

        let json = serde_json::to_string(&board).unwrap();
        let restored: Board = serde_json::from_str(&json).unwrap();

        assert_eq!(restored, board);
    }

    #[test]
    fn deserialize_rejects_size_not_matching_tiles() {
        let board = Board::from_layout(layout((1, 1), &[]));
        let mut value = serde_json::to_value(&board).unwrap();
        value["config"]["size"] = serde_json::json!([5, 5]);

        let restored = serde_json::from_value::<Board>(value);

        let err = restored.unwrap_err().to_string();
        assert!(err.contains("Board shape does not match declared size"), "{err}");
    }

    #[test]
    fn deserialize_rejects_triggered_mine_out_of_bounds() {
        let board = Board::from_layout(layout((2, 1), &[(0, 0)]));
        let mut value = serde_json::to_value(&board).unwrap();
        value["triggered_mine"] = serde_json::json!([4, 4]);

        assert!(serde_json::from_value::<Board>(value).is_err());
    }
}
