//! Hierarchical coordinate system for galaxy navigation.
//!
//! Four nested levels, each a fixed-size cube in parsecs:
//!
//! | Level     | Size      | Children per axis |
//! |-----------|-----------|-------------------|
//! | Galaxy    | unbounded | quadrants         |
//! | Quadrant  | 1000 pc   | 10 sectors        |
//! | Sector    | 100 pc    | 10 subsectors     |
//! | Subsector | 10 pc     | -                 |
//!
//! All conversions go through a single integer subsector index, so composing
//! the three index levels and converting back to world space reproduces a
//! cell origin exactly.
//!
//! Positions are resolved to their own subsector within `COORDINATE_LIMIT`
//! parsecs of the origin on every axis. Positions beyond it map to the
//! subsector on the domain edge, which keeps every index and neighbour offset
//! well inside `i32`.

use glam::{DVec3, IVec3};
use serde::{Deserialize, Serialize};

/// Edge length of a subsector in parsecs (finest grain)
pub const SUBSECTOR_SIZE: f64 = 10.0;

/// Subsectors per sector along each axis
pub const SUBSECTORS_PER_SECTOR: i32 = 10;

/// Sectors per quadrant along each axis
pub const SECTORS_PER_QUADRANT: i32 = 10;

/// Edge length of a sector in parsecs
pub const SECTOR_SIZE: f64 = SUBSECTOR_SIZE * SUBSECTORS_PER_SECTOR as f64;

/// Edge length of a quadrant in parsecs
pub const QUADRANT_SIZE: f64 = SECTOR_SIZE * SECTORS_PER_QUADRANT as f64;

/// Subsectors per quadrant along each axis
const SUBSECTORS_PER_QUADRANT: i32 = SUBSECTORS_PER_SECTOR * SECTORS_PER_QUADRANT;

/// Largest global subsector index magnitude a position can resolve to
const MAX_SUBSECTOR_INDEX: i32 = 100_000_000;

/// Half-width of the resolvable domain in parsecs (a million kiloparsecs)
pub const COORDINATE_LIMIT: f64 = MAX_SUBSECTOR_INDEX as f64 * SUBSECTOR_SIZE;

/// Largest remainder inside a subsector, just below its edge length
const MAX_REMAINDER: f64 = SUBSECTOR_SIZE * (1.0 - f64::EPSILON);

/// Cell levels that can be addressed and populated with stars.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellLevel {
    Quadrant,
    Sector,
    Subsector,
}

impl CellLevel {
    /// Edge length of a cell at this level, in parsecs
    pub fn size(&self) -> f64 {
        match self {
            CellLevel::Quadrant => QUADRANT_SIZE,
            CellLevel::Sector => SECTOR_SIZE,
            CellLevel::Subsector => SUBSECTOR_SIZE,
        }
    }

    /// Number of subsectors along one axis of a cell at this level
    pub fn subsectors_per_axis(&self) -> i32 {
        match self {
            CellLevel::Quadrant => SUBSECTORS_PER_QUADRANT,
            CellLevel::Sector => SUBSECTORS_PER_SECTOR,
            CellLevel::Subsector => 1,
        }
    }

    /// Number of finest-grain cells contained in one cell at this level
    pub fn subsector_volume(&self) -> f64 {
        let n = self.subsectors_per_axis() as f64;
        n * n * n
    }

    /// Stable tag mixed into per-cell seeds so levels never share a stream
    pub(crate) fn tag(&self) -> u64 {
        match self {
            CellLevel::Quadrant => 1,
            CellLevel::Sector => 2,
            CellLevel::Subsector => 3,
        }
    }
}

/// A world position decomposed into the three index levels plus remainder.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HierarchyCoords {
    /// Quadrant index (unbounded, may be negative)
    pub quadrant: IVec3,
    /// Sector within the quadrant, each component in 0..10
    pub sector_local: IVec3,
    /// Subsector within the sector, each component in 0..10
    pub subsector_local: IVec3,
    /// Offset from the subsector origin, each component in [0, 10) pc
    pub remainder: DVec3,
}

impl HierarchyCoords {
    /// Origin (minimum corner) of the containing subsector
    pub fn origin(&self) -> DVec3 {
        subsector_origin_from_indices(self.quadrant, self.sector_local, self.subsector_local)
    }

    /// Reconstruct the original world position (exact inside `COORDINATE_LIMIT`)
    pub fn to_world(&self) -> DVec3 {
        self.origin() + self.remainder
    }

    /// The cell at `level` holding this position
    pub fn cell(&self, level: CellLevel) -> Cell {
        match level {
            CellLevel::Quadrant => Cell::quadrant(self.quadrant),
            CellLevel::Sector => Cell::sector(self.quadrant, self.sector_local),
            CellLevel::Subsector => Cell::subsector(self.quadrant, self.sector_local, self.subsector_local),
        }
    }
}

impl std::fmt::Display for HierarchyCoords {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.cell(CellLevel::Subsector))
    }
}

/// Global integer index of the subsector containing `position`.
///
/// Clamped to the resolvable domain on each axis.
pub fn global_subsector_index(position: DVec3) -> IVec3 {
    (position / SUBSECTOR_SIZE)
        .floor()
        .clamp(
            DVec3::splat(-MAX_SUBSECTOR_INDEX as f64),
            DVec3::splat((MAX_SUBSECTOR_INDEX - 1) as f64),
        )
        .as_ivec3()
}

/// Split a global subsector index into (quadrant, sector_local, subsector_local).
pub fn split_subsector_index(global: IVec3) -> (IVec3, IVec3, IVec3) {
    let sector_global = global.div_euclid(IVec3::splat(SUBSECTORS_PER_SECTOR));
    let subsector_local = global.rem_euclid(IVec3::splat(SUBSECTORS_PER_SECTOR));
    let quadrant = sector_global.div_euclid(IVec3::splat(SECTORS_PER_QUADRANT));
    let sector_local = sector_global.rem_euclid(IVec3::splat(SECTORS_PER_QUADRANT));
    (quadrant, sector_local, subsector_local)
}

/// Compose the three index levels into a global subsector index.
///
/// Saturates rather than overflowing for hand-built indices outside the domain.
pub fn compose_subsector_index(quadrant: IVec3, sector_local: IVec3, subsector_local: IVec3) -> IVec3 {
    quadrant
        .saturating_mul(IVec3::splat(SUBSECTORS_PER_QUADRANT))
        .saturating_add(sector_local.saturating_mul(IVec3::splat(SUBSECTORS_PER_SECTOR)))
        .saturating_add(subsector_local)
}

/// Decompose a world position into hierarchy indices.
pub fn world_to_hierarchy(position: DVec3) -> HierarchyCoords {
    let global = global_subsector_index(position);
    let (quadrant, sector_local, subsector_local) = split_subsector_index(global);
    HierarchyCoords {
        quadrant,
        sector_local,
        subsector_local,
        remainder: (position - global.as_dvec3() * SUBSECTOR_SIZE)
            .clamp(DVec3::ZERO, DVec3::splat(MAX_REMAINDER)),
    }
}

/// Minimum corner of the subsector containing `position`.
pub fn subsector_world_origin(position: DVec3) -> DVec3 {
    global_subsector_index(position).as_dvec3() * SUBSECTOR_SIZE
}

/// Minimum corner of a subsector given its three index levels.
pub fn subsector_origin_from_indices(quadrant: IVec3, sector_local: IVec3, subsector_local: IVec3) -> DVec3 {
    compose_subsector_index(quadrant, sector_local, subsector_local).as_dvec3() * SUBSECTOR_SIZE
}

/// Minimum corner of a sector.
pub fn sector_world_origin(quadrant: IVec3, sector_local: IVec3) -> DVec3 {
    subsector_origin_from_indices(quadrant, sector_local, IVec3::ZERO)
}

/// Minimum corner of a quadrant.
pub fn quadrant_world_origin(quadrant: IVec3) -> DVec3 {
    subsector_origin_from_indices(quadrant, IVec3::ZERO, IVec3::ZERO)
}

/// Address of a single cell at any populated level.
///
/// Finer indices below the cell's level are always zero, so two `Cell`s
/// compare equal exactly when they denote the same region of space.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub level: CellLevel,
    pub quadrant: IVec3,
    pub sector_local: IVec3,
    pub subsector_local: IVec3,
}

impl Cell {
    pub fn quadrant(quadrant: IVec3) -> Self {
        Self {
            level: CellLevel::Quadrant,
            quadrant,
            sector_local: IVec3::ZERO,
            subsector_local: IVec3::ZERO,
        }
    }

    pub fn sector(quadrant: IVec3, sector_local: IVec3) -> Self {
        Self {
            level: CellLevel::Sector,
            quadrant,
            sector_local,
            subsector_local: IVec3::ZERO,
        }
    }

    pub fn subsector(quadrant: IVec3, sector_local: IVec3, subsector_local: IVec3) -> Self {
        Self {
            level: CellLevel::Subsector,
            quadrant,
            sector_local,
            subsector_local,
        }
    }

    /// The cell at `level` that contains `position`
    pub fn containing(level: CellLevel, position: DVec3) -> Self {
        world_to_hierarchy(position).cell(level)
    }

    /// Global index of this cell in units of its own level's size
    pub fn index(&self) -> IVec3 {
        compose_subsector_index(self.quadrant, self.sector_local, self.subsector_local)
            .div_euclid(IVec3::splat(self.level.subsectors_per_axis()))
    }

    fn from_index(level: CellLevel, index: IVec3) -> Self {
        let (quadrant, sector_local, subsector_local) =
            split_subsector_index(index.saturating_mul(IVec3::splat(level.subsectors_per_axis())));
        Self {
            level,
            quadrant,
            sector_local,
            subsector_local,
        }
    }

    /// Neighbouring cell at the same level, carrying across parent boundaries
    pub fn offset(&self, delta: IVec3) -> Self {
        Self::from_index(self.level, self.index().saturating_add(delta))
    }

    pub fn size(&self) -> f64 {
        self.level.size()
    }

    /// Minimum corner in world space
    pub fn origin(&self) -> DVec3 {
        subsector_origin_from_indices(self.quadrant, self.sector_local, self.subsector_local)
    }

    pub fn center(&self) -> DVec3 {
        self.origin() + DVec3::splat(self.size() * 0.5)
    }

    /// Whether `position` lies inside this cell (min inclusive, max exclusive)
    pub fn contains(&self, position: DVec3) -> bool {
        let min = self.origin();
        let max = min + DVec3::splat(self.size());
        position.cmpge(min).all() && position.cmplt(max).all()
    }
}

impl std::fmt::Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let q = self.quadrant;
        let s = self.sector_local;
        let ss = self.subsector_local;
        match self.level {
            CellLevel::Quadrant => write!(f, "Q({},{},{})", q.x, q.y, q.z),
            CellLevel::Sector => write!(f, "Q({},{},{}):S({},{},{})", q.x, q.y, q.z, s.x, s.y, s.z),
            CellLevel::Subsector => write!(
                f,
                "Q({},{},{}):S({},{},{}):s({},{},{})",
                q.x, q.y, q.z, s.x, s.y, s.z, ss.x, ss.y, ss.z
            ),
        }
    }
}
