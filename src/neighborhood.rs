//! Camera-centred window of subsectors with shell-tagged level of detail.
//!
//! The window is a fixed 11×11×11 block of subsectors around the one
//! containing the viewpoint. Each cell carries its Chebyshev distance from
//! the centre (its shell), and every star inherits its cell's shell so a
//! renderer can fade or drop distant stars without recomputing anything.
//!
//! Nothing is cached: the same viewpoint and seed always rebuild the same
//! window, so callers that want to skip work can compare centre origins.

use glam::{DVec3, IVec3};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::GenerationSettings;
use crate::coords::{subsector_world_origin, Cell, CellLevel};
use crate::density::DensityField;
use crate::stars::{CellStarData, CellStarGenerator};

/// Cells from the centre to the window edge along one axis
pub const NEIGHBORHOOD_RADIUS: i32 = 5;

/// Cells along one axis of the window
pub const NEIGHBORHOOD_WIDTH: usize = (2 * NEIGHBORHOOD_RADIUS + 1) as usize;

/// Total cells in the window
pub const NEIGHBORHOOD_CELLS: usize = NEIGHBORHOOD_WIDTH * NEIGHBORHOOD_WIDTH * NEIGHBORHOOD_WIDTH;

/// Number of cells at Chebyshev distance `shell` from the centre: (2k+1)³ − (2k−1)³
pub fn expected_shell_cell_count(shell: u32) -> usize {
    if shell == 0 {
        return 1;
    }
    let outer = (2 * shell as usize + 1).pow(3);
    let inner = (2 * shell as usize - 1).pow(3);
    outer - inner
}

/// Chebyshev distance of an offset from the window centre
#[inline]
pub fn shell_of(offset: IVec3) -> u8 {
    offset.abs().max_element() as u8
}

/// One window's cells and stars as flat parallel arrays.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NeighborhoodData {
    /// Origin of the subsector containing the viewpoint
    pub center_origin: DVec3,
    pub subsector_origins: Vec<DVec3>,
    pub subsector_shells: Vec<u8>,
    pub star_positions: Vec<DVec3>,
    pub star_seeds: Vec<u64>,
    /// Shell of the cell each star was generated in
    pub star_shells: Vec<u8>,
}

impl NeighborhoodData {
    pub fn cell_count(&self) -> usize {
        self.subsector_origins.len()
    }

    pub fn star_count(&self) -> usize {
        self.star_positions.len()
    }

    /// Cells per shell, index = shell
    pub fn shell_cell_counts(&self) -> [usize; NEIGHBORHOOD_RADIUS as usize + 1] {
        let mut counts = [0; NEIGHBORHOOD_RADIUS as usize + 1];
        for &shell in &self.subsector_shells {
            counts[shell as usize] += 1;
        }
        counts
    }

    pub fn star_count_in_shell(&self, shell: u8) -> usize {
        self.star_shells.iter().filter(|&&s| s == shell).count()
    }

    /// Stars from shells `0..=max_shell`, for a reduced level of detail
    pub fn stars_within_shell(&self, max_shell: u8) -> CellStarData {
        let mut stars = CellStarData::new();
        for ((&position, &seed), &shell) in self
            .star_positions
            .iter()
            .zip(&self.star_seeds)
            .zip(&self.star_shells)
        {
            if shell <= max_shell {
                stars.push(position, seed);
            }
        }
        stars
    }

    /// Look up a star by identity seed
    pub fn find_star(&self, seed: u64) -> Option<(DVec3, u8)> {
        self.star_seeds
            .iter()
            .position(|&s| s == seed)
            .map(|i| (self.star_positions[i], self.star_shells[i]))
    }

    fn push_cell(&mut self, origin: DVec3, shell: u8, stars: CellStarData) {
        self.subsector_origins.push(origin);
        self.subsector_shells.push(shell);
        self.star_shells.extend(std::iter::repeat(shell).take(stars.len()));
        self.star_positions.extend(stars.positions);
        self.star_seeds.extend(stars.star_seeds);
    }
}

/// Builds star windows around a viewpoint.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Neighborhood {
    generator: CellStarGenerator,
}

impl Neighborhood {
    pub fn new(generator: CellStarGenerator) -> Self {
        Self { generator }
    }

    pub fn from_settings(settings: &GenerationSettings) -> Self {
        Self::new(CellStarGenerator {
            average_stars_per_cell: settings.average_stars_per_cell,
            parallel: settings.parallel,
        })
    }

    pub fn generator(&self) -> &CellStarGenerator {
        &self.generator
    }

    /// Origin of the window's centre subsector for `viewpoint`.
    ///
    /// Always equal to `build(viewpoint, ..).center_origin`.
    pub fn center_origin(&self, viewpoint: DVec3) -> DVec3 {
        subsector_world_origin(viewpoint)
    }

    /// Whether two viewpoints share a window (same centre subsector)
    pub fn same_window(&self, a: DVec3, b: DVec3) -> bool {
        self.center_origin(a) == self.center_origin(b)
    }

    /// Every cell of the window with its shell, z-major then y then x
    pub fn cells(&self, viewpoint: DVec3) -> Vec<(Cell, u8)> {
        let center = Cell::containing(CellLevel::Subsector, viewpoint);
        let r = NEIGHBORHOOD_RADIUS;
        let mut cells = Vec::with_capacity(NEIGHBORHOOD_CELLS);
        for dz in -r..=r {
            for dy in -r..=r {
                for dx in -r..=r {
                    let offset = IVec3::new(dx, dy, dz);
                    cells.push((center.offset(offset), shell_of(offset)));
                }
            }
        }
        cells
    }

    /// Generate the full window around `viewpoint`.
    pub fn build(
        &self,
        viewpoint: DVec3,
        global_seed: u64,
        field: &dyn DensityField,
        reference_density: f64,
    ) -> NeighborhoodData {
        let cells = self.cells(viewpoint);

        let generate = |&(cell, shell): &(Cell, u8)| {
            (cell.origin(), shell, self.generator.generate(global_seed, &cell, field, reference_density))
        };
        // Ordered collect keeps the output independent of scheduling
        let generated: Vec<(DVec3, u8, CellStarData)> = if self.generator.parallel {
            cells.par_iter().map(generate).collect()
        } else {
            cells.iter().map(generate).collect()
        };

        let mut data = NeighborhoodData {
            center_origin: self.center_origin(viewpoint),
            subsector_origins: Vec::with_capacity(NEIGHBORHOOD_CELLS),
            subsector_shells: Vec::with_capacity(NEIGHBORHOOD_CELLS),
            ..NeighborhoodData::default()
        };
        for (origin, shell, stars) in generated {
            data.push_cell(origin, shell, stars);
        }

        log::debug!(
            "Neighborhood at ({:.1}, {:.1}, {:.1}) seed {}: {} cells, {} stars",
            data.center_origin.x,
            data.center_origin.y,
            data.center_origin.z,
            global_seed,
            data.cell_count(),
            data.star_count()
        );
        data
    }
}
