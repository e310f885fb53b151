//! Deterministic star placement inside one cell.
//!
//! A cell's stars depend only on (global seed, cell address, density field,
//! reference density). Each cell re-seeds its own `ChaCha8Rng` from a hash of
//! the seed and address, so cells can be generated in any order or in
//! parallel and always produce the same stars.

use glam::{DVec3, IVec3};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_STARS_PER_CELL;
use crate::coords::{Cell, SUBSECTOR_SIZE};
use crate::density::DensityField;
use crate::sampling::{sample_in_cube, sample_poisson};
use crate::seeds::{cell_seed, star_seed};

/// Border added around a cell by the bordered variant (one subsector)
pub const BORDER_WIDTH: f64 = SUBSECTOR_SIZE;

/// Hard ceiling on the stars placed in one cell, whatever the calibration
pub const MAX_STARS_PER_CELL: u64 = 1_000_000;

/// Stars of one or more cells as parallel arrays.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CellStarData {
    pub positions: Vec<DVec3>,
    pub star_seeds: Vec<u64>,
}

impl CellStarData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            positions: Vec::with_capacity(capacity),
            star_seeds: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn push(&mut self, position: DVec3, seed: u64) {
        self.positions.push(position);
        self.star_seeds.push(seed);
    }

    /// Append another dataset's stars after this one's
    pub fn merge(&mut self, other: CellStarData) {
        self.positions.extend(other.positions);
        self.star_seeds.extend(other.star_seeds);
    }

    /// Iterate (position, seed) pairs
    pub fn iter(&self) -> impl Iterator<Item = (DVec3, u64)> + '_ {
        self.positions.iter().copied().zip(self.star_seeds.iter().copied())
    }

    /// Keep only stars whose position satisfies `keep`
    pub fn retain_positions<F: Fn(DVec3) -> bool>(&mut self, keep: F) {
        let (positions, seeds): (Vec<DVec3>, Vec<u64>) = self.iter().filter(|(p, _)| keep(*p)).unzip();
        self.positions = positions;
        self.star_seeds = seeds;
    }
}

/// Star placement with a tunable calibration constant.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CellStarGenerator {
    /// Expected stars in one subsector where local density equals the reference
    pub average_stars_per_cell: f64,
    /// Generate neighbour cells on the rayon pool
    pub parallel: bool,
}

impl Default for CellStarGenerator {
    fn default() -> Self {
        Self {
            average_stars_per_cell: DEFAULT_STARS_PER_CELL,
            parallel: true,
        }
    }
}

impl CellStarGenerator {
    pub fn new(average_stars_per_cell: f64) -> Self {
        Self {
            average_stars_per_cell,
            ..Self::default()
        }
    }

    /// Expected star count of a cell.
    ///
    /// Zero when the reference density is non-positive or nothing sensible
    /// can be computed.
    pub fn expected_count(&self, cell: &Cell, field: &dyn DensityField, reference_density: f64) -> f64 {
        if !(reference_density > 0.0) || !reference_density.is_finite() {
            return 0.0;
        }
        let local_density = field.density(cell.center());
        let lambda =
            (local_density / reference_density) * self.average_stars_per_cell * cell.level.subsector_volume();
        if lambda.is_finite() && lambda > 0.0 {
            lambda
        } else {
            0.0
        }
    }

    /// Generate the stars of a single cell at any level.
    pub fn generate(
        &self,
        global_seed: u64,
        cell: &Cell,
        field: &dyn DensityField,
        reference_density: f64,
    ) -> CellStarData {
        let lambda = self.expected_count(cell, field, reference_density);
        if lambda == 0.0 {
            return CellStarData::new();
        }

        let stream_seed = cell_seed(global_seed, cell);
        let mut rng = ChaCha8Rng::seed_from_u64(stream_seed);
        let sampled = sample_poisson(&mut rng, lambda);
        let count = sampled.min(MAX_STARS_PER_CELL);
        if sampled > count {
            log::warn!(
                "Cell {}: lambda {:.3e} drew {} stars, clamped to {}",
                cell,
                lambda,
                sampled,
                MAX_STARS_PER_CELL
            );
        }

        let origin = cell.origin();
        let size = cell.size();
        let mut stars = CellStarData::with_capacity(count as usize);
        for index in 0..count {
            let position = sample_in_cube(&mut rng, origin, size);
            stars.push(position, star_seed(stream_seed, index));
        }

        log::trace!("Cell {}: lambda {:.2}, {} stars", cell, lambda, stars.len());
        stars
    }

    /// Generate a cell plus every neighbouring star within `BORDER_WIDTH` of it.
    ///
    /// The cell's own stars come first, unchanged, followed by the border
    /// stars of the 26 neighbours in a fixed order.
    pub fn generate_bordered(
        &self,
        global_seed: u64,
        cell: &Cell,
        field: &dyn DensityField,
        reference_density: f64,
    ) -> CellStarData {
        let mut stars = self.generate(global_seed, cell, field, reference_density);

        let min = cell.origin() - DVec3::splat(BORDER_WIDTH);
        let max = cell.origin() + DVec3::splat(cell.size() + BORDER_WIDTH);
        let in_border = |p: DVec3| p.cmpge(min).all() && p.cmplt(max).all();

        let neighbours: Vec<Cell> = neighbour_offsets().map(|delta| cell.offset(delta)).collect();
        let generate_border = |neighbour: &Cell| {
            let mut border = self.generate(global_seed, neighbour, field, reference_density);
            border.retain_positions(in_border);
            border
        };
        let borders: Vec<CellStarData> = if self.parallel {
            neighbours.par_iter().map(generate_border).collect()
        } else {
            neighbours.iter().map(generate_border).collect()
        };

        let own = stars.len();
        for border in borders {
            stars.merge(border);
        }
        log::debug!("Bordered cell {}: {} own stars, {} border stars", cell, own, stars.len() - own);
        stars
    }
}

/// The 26 offsets around a cell, in z-y-x order
fn neighbour_offsets() -> impl Iterator<Item = IVec3> {
    (-1..=1).flat_map(|dz| {
        (-1..=1).flat_map(move |dy| {
            (-1..=1)
                .map(move |dx| IVec3::new(dx, dy, dz))
                .filter(|d| *d != IVec3::ZERO)
        })
    })
}

/// Stars of one sector, using the default calibration.
pub fn generate_cell_stars(
    global_seed: u64,
    quadrant: IVec3,
    sector_local: IVec3,
    field: &dyn DensityField,
    reference_density: f64,
) -> CellStarData {
    CellStarGenerator::default().generate(global_seed, &Cell::sector(quadrant, sector_local), field, reference_density)
}

/// Stars of one sector padded with a border from its neighbours.
pub fn generate_bordered_cell_stars(
    global_seed: u64,
    quadrant: IVec3,
    sector_local: IVec3,
    field: &dyn DensityField,
    reference_density: f64,
) -> CellStarData {
    CellStarGenerator::default().generate_bordered(
        global_seed,
        &Cell::sector(quadrant, sector_local),
        field,
        reference_density,
    )
}

/// Stars of one subsector, using the default calibration.
pub fn generate_subsector_stars(
    global_seed: u64,
    quadrant: IVec3,
    sector_local: IVec3,
    subsector_local: IVec3,
    field: &dyn DensityField,
    reference_density: f64,
) -> CellStarData {
    CellStarGenerator::default().generate(
        global_seed,
        &Cell::subsector(quadrant, sector_local, subsector_local),
        field,
        reference_density,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GalaxyParameters, SOLAR_NEIGHBORHOOD};
    use crate::coords::{world_to_hierarchy, CellLevel};
    use crate::density::{reference_density, SpiralDensityField};
    use std::collections::HashSet;

    fn setup() -> (SpiralDensityField, f64) {
        let field = SpiralDensityField::new(GalaxyParameters::default());
        let reference = reference_density(&field, SOLAR_NEIGHBORHOOD).unwrap();
        (field, reference)
    }

    /// A sector near the solar neighbourhood
    fn solar_sector() -> (IVec3, IVec3) {
        let h = world_to_hierarchy(SOLAR_NEIGHBORHOOD);
        (h.quadrant, h.sector_local)
    }

    #[test]
    fn test_determinism() {
        let (field, reference) = setup();
        let (q, s) = solar_sector();
        let a = generate_cell_stars(42, q, s, &field, reference);
        let b = generate_cell_stars(42, q, s, &field, reference);
        assert!(!a.is_empty());
        assert_eq!(a, b);
    }

    #[test]
    fn test_order_independence() {
        let (field, reference) = setup();
        let (q, _) = solar_sector();
        let cells: Vec<IVec3> = (0..6).map(|i| IVec3::new(i, 0, (i * 3) % 10)).collect();

        let forward: Vec<CellStarData> = cells
            .iter()
            .map(|&sector| generate_cell_stars(7, q, sector, &field, reference))
            .collect();
        let mut reverse: Vec<CellStarData> = cells
            .iter()
            .rev()
            .map(|&sector| generate_cell_stars(7, q, sector, &field, reference))
            .collect();
        reverse.reverse();

        assert_eq!(forward, reverse);
    }

    #[test]
    fn test_zero_reference_density_is_empty() {
        let (field, _) = setup();
        let (q, s) = solar_sector();
        assert!(generate_cell_stars(42, q, s, &field, 0.0).is_empty());
        assert!(generate_cell_stars(42, q, s, &field, -1.0).is_empty());
        assert!(generate_bordered_cell_stars(42, q, s, &field, 0.0).is_empty());
        assert!(generate_subsector_stars(42, q, s, IVec3::ZERO, &field, 0.0).is_empty());
    }

    #[test]
    fn test_stars_inside_cell_with_unique_seeds() {
        let (field, reference) = setup();
        let (q, s) = solar_sector();
        let stars = generate_cell_stars(42, q, s, &field, reference);
        let cell = Cell::sector(q, s);

        assert_eq!(stars.positions.len(), stars.star_seeds.len());
        assert!(stars.positions.iter().all(|&p| cell.contains(p)));
        let unique: HashSet<u64> = stars.star_seeds.iter().copied().collect();
        assert_eq!(unique.len(), stars.len());
    }

    #[test]
    fn test_count_tracks_calibration() {
        let (field, reference) = setup();
        let cell = Cell::containing(CellLevel::Sector, SOLAR_NEIGHBORHOOD);
        let generator = CellStarGenerator::default();
        let lambda = generator.expected_count(&cell, &field, reference);
        // Roughly a few stars per subsector, 1000 subsectors per sector
        assert!(lambda > 1000.0 && lambda < 10_000.0, "lambda {}", lambda);

        let stars = generator.generate(42, &cell, &field, reference);
        let n = stars.len() as f64;
        assert!((n - lambda).abs() < 5.0 * lambda.sqrt(), "{} stars for lambda {}", n, lambda);

        let sparse = CellStarGenerator::new(0.0);
        assert!(sparse.generate(42, &cell, &field, reference).is_empty());
    }

    #[test]
    fn test_overcalibrated_cell_is_clamped() {
        let field = SpiralDensityField::new(GalaxyParameters::default());
        // Raw density far outside the disk, many orders below the solar value
        let tiny_reference = field.density(DVec3::new(30_000.0, 0.0, 0.0));
        let cell = Cell::containing(CellLevel::Subsector, SOLAR_NEIGHBORHOOD);
        let generator = CellStarGenerator {
            parallel: false,
            ..CellStarGenerator::default()
        };
        assert!(generator.expected_count(&cell, &field, tiny_reference) > MAX_STARS_PER_CELL as f64);

        let stars = generator.generate(42, &cell, &field, tiny_reference);
        assert_eq!(stars.len() as u64, MAX_STARS_PER_CELL);
        assert!(stars.positions.iter().all(|&p| cell.contains(p)));
    }

    #[test]
    fn test_seed_changes_stars() {
        let (field, reference) = setup();
        let (q, s) = solar_sector();
        let a = generate_cell_stars(42, q, s, &field, reference);
        let b = generate_cell_stars(99, q, s, &field, reference);
        assert_ne!(a.positions, b.positions);
    }

    #[test]
    fn test_subsector_stars_inside_subsector() {
        let (field, reference) = setup();
        let h = world_to_hierarchy(SOLAR_NEIGHBORHOOD);
        let cell = Cell::subsector(h.quadrant, h.sector_local, h.subsector_local);
        let mut total = 0;
        for i in 0..10 {
            let c = cell.offset(IVec3::new(i, 0, 0));
            let stars = generate_subsector_stars(5, c.quadrant, c.sector_local, c.subsector_local, &field, reference);
            assert!(stars.positions.iter().all(|&p| c.contains(p)));
            total += stars.len();
        }
        assert!(total > 0);
    }

    #[test]
    fn test_bordered_is_superset() {
        let (field, reference) = setup();
        let (q, s) = solar_sector();
        let plain = generate_cell_stars(42, q, s, &field, reference);
        let bordered = generate_bordered_cell_stars(42, q, s, &field, reference);

        assert!(bordered.len() > plain.len());
        // The cell's own stars lead the bordered result unchanged
        assert_eq!(&bordered.positions[..plain.len()], &plain.positions[..]);
        assert_eq!(&bordered.star_seeds[..plain.len()], &plain.star_seeds[..]);

        let cell = Cell::sector(q, s);
        let outside: Vec<DVec3> = bordered.positions.iter().copied().filter(|&p| !cell.contains(p)).collect();
        assert!(!outside.is_empty());
        let min = cell.origin() - DVec3::splat(BORDER_WIDTH);
        let max = cell.origin() + DVec3::splat(cell.size() + BORDER_WIDTH);
        assert!(outside.iter().all(|p| p.cmpge(min).all() && p.cmplt(max).all()));
    }

    #[test]
    fn test_bordered_parallel_matches_sequential() {
        let (field, reference) = setup();
        let cell = Cell::containing(CellLevel::Sector, SOLAR_NEIGHBORHOOD);
        let parallel = CellStarGenerator::default();
        let sequential = CellStarGenerator {
            parallel: false,
            ..CellStarGenerator::default()
        };
        assert_eq!(
            parallel.generate_bordered(3, &cell, &field, reference),
            sequential.generate_bordered(3, &cell, &field, reference)
        );
    }

    #[test]
    fn test_merge_preserves_membership() {
        let (field, reference) = setup();
        let (q, _) = solar_sector();
        let a = generate_cell_stars(1, q, IVec3::new(1, 0, 1), &field, reference);
        let b = generate_cell_stars(1, q, IVec3::new(2, 0, 1), &field, reference);

        let mut ab = a.clone();
        ab.merge(b.clone());
        let mut ba = b.clone();
        ba.merge(a.clone());

        assert_eq!(ab.len(), a.len() + b.len());
        let set_ab: HashSet<u64> = ab.star_seeds.iter().copied().collect();
        let set_ba: HashSet<u64> = ba.star_seeds.iter().copied().collect();
        assert_eq!(set_ab, set_ba);
    }
}
