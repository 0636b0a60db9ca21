use crate::*;
pub use random::*;

mod random;

pub trait MineLayoutGenerator {
    fn generate(self, config: &GameConfig, safe_zone: SafeZone) -> MineLayout;
}

/// The 3x3 block around the first click, clipped at the board edges, that never holds a mine.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SafeZone {
    center: Coord2,
    bounds: Coord2,
}

impl SafeZone {
    pub const fn around(center: Coord2, bounds: Coord2) -> Self {
        Self { center, bounds }
    }

    pub const fn center(&self) -> Coord2 {
        self.center
    }

    pub const fn contains(&self, coords: Coord2) -> bool {
        in_bounds(coords, self.bounds)
            && self.center.0.abs_diff(coords.0) <= 1
            && self.center.1.abs_diff(coords.1) <= 1
    }

    pub fn iter(&self) -> impl Iterator<Item = Coord2> + use<> {
        core::iter::once(self.center).chain(NeighborIter::new(self.center, self.bounds))
    }

    pub fn len(&self) -> CellCount {
        // at most 9
        self.iter().count() as CellCount
    }
}
