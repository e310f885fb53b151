//! Procedural galaxy star field generation
//!
//! Stars are never stored: any window of the galaxy is regenerated on demand
//! from the galaxy parameters and a global seed, identically every time.

pub mod config;
pub mod coords;
pub mod density;
pub mod export;
pub mod neighborhood;
pub mod sampling;
pub mod seeds;
pub mod stars;
pub mod zoom;

pub use config::{GalaxyConfig, GalaxyParameters, GenerationSettings, Morphology};
pub use coords::{world_to_hierarchy, Cell, CellLevel, HierarchyCoords};
pub use density::{density_field_for, reference_density, DensityField};
pub use neighborhood::{Neighborhood, NeighborhoodData};
pub use stars::{generate_bordered_cell_stars, generate_cell_stars, CellStarData, CellStarGenerator};
pub use zoom::{ZoomLevel, ZoomStateMachine};
