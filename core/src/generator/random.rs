use super::*;

/// Places mines uniformly at random over every tile outside the safe zone.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RandomLayoutGenerator {
    seed: u64,
}

impl RandomLayoutGenerator {
    pub const fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Seed from OS entropy, for boards created without a fixed seed.
    pub fn from_entropy() -> Result<Self> {
        use rand::prelude::*;

        let mut rng = SmallRng::try_from_os_rng().map_err(|err| {
            log::warn!("OS entropy unavailable: {}", err);
            GameError::EntropyUnavailable
        })?;
        Ok(Self::new(rng.random()))
    }

    pub const fn seed(&self) -> u64 {
        self.seed
    }
}

impl MineLayoutGenerator for RandomLayoutGenerator {
    fn generate(self, config: &GameConfig, safe_zone: SafeZone) -> MineLayout {
        use rand::prelude::*;

        let (x_end, y_end) = config.size;
        let mut candidates: Vec<Coord2> = (0..x_end)
            .flat_map(|x| (0..y_end).map(move |y| (x, y)))
            .filter(|&coords| !safe_zone.contains(coords))
            .collect();

        let requested = usize::from(config.mines);
        let placed = if requested > candidates.len() {
            log::warn!(
                "Cannot fit all mines outside the safe zone, requested {} but only fits {}",
                requested,
                candidates.len()
            );
            candidates.len()
        } else {
            requested
        };

        let mut rng = SmallRng::seed_from_u64(self.seed);
        let (mines, _) = candidates.partial_shuffle(&mut rng, placed);

        let mut mine_mask: Array2<bool> = Array2::default(config.size.to_nd_index());
        for &coords in mines.iter() {
            mine_mask[coords.to_nd_index()] = true;
        }

        log::debug!(
            "Placed {} mines with seed {} avoiding {:?}",
            placed,
            self.seed,
            safe_zone.center()
        );

        MineLayout::new_unchecked(mine_mask, placed as CellCount)
    }
}
