//! Export of generated data for external viewers.
//!
//! Neighbourhoods are written as JSON; density profiles as CSV.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::config::GalaxyParameters;
use crate::neighborhood::NeighborhoodData;

/// File layout of an exported neighbourhood
#[derive(Serialize)]
struct NeighborhoodExport<'a> {
    galaxy: &'a GalaxyParameters,
    viewpoint: [f64; 3],
    star_count: usize,
    shell_cell_counts: Vec<usize>,
    neighborhood: &'a NeighborhoodData,
}

/// Write a neighbourhood, with the galaxy it came from, as JSON.
pub fn export_neighborhood<P: AsRef<Path>>(
    path: P,
    galaxy: &GalaxyParameters,
    viewpoint: glam::DVec3,
    data: &NeighborhoodData,
) -> Result<(), ExportError> {
    let export = NeighborhoodExport {
        galaxy,
        viewpoint: viewpoint.to_array(),
        star_count: data.star_count(),
        shell_cell_counts: data.shell_cell_counts().to_vec(),
        neighborhood: data,
    };
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, &export).map_err(|e| ExportError::Serialization(e.to_string()))?;
    writer.flush()?;
    log::info!("Exported {} stars to {}", data.star_count(), path.as_ref().display());
    Ok(())
}

/// Write `(radius, density)` rows as CSV.
pub fn export_profile<P: AsRef<Path>>(path: P, profile: &[(f64, f64)]) -> Result<(), ExportError> {
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    writeln!(writer, "radius_pc,density")?;
    for (radius, density) in profile {
        writeln!(writer, "{:.1},{:.6e}", radius, density)?;
    }
    writer.flush()?;
    Ok(())
}

/// Errors that can occur during export.
#[derive(Debug)]
pub enum ExportError {
    Io(std::io::Error),
    Serialization(String),
}

impl std::fmt::Display for ExportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportError::Io(e) => write!(f, "IO error: {}", e),
            ExportError::Serialization(e) => write!(f, "Serialization error: {}", e),
        }
    }
}

impl std::error::Error for ExportError {}

impl From<std::io::Error> for ExportError {
    fn from(e: std::io::Error) -> Self {
        ExportError::Io(e)
    }
}
