//! Galaxy parameters and generation settings.
//!
//! Everything here is plain data with serde derives so a galaxy can be
//! described in a JSON file and shared between runs.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::density::{density_field_for, reference_density};

/// Galaxy morphology, selects the density model
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Morphology {
    /// Disk with logarithmic spiral arms
    #[default]
    Spiral,
    /// Spiral disk with a central bar; arms start at the bar ends
    BarredSpiral,
    /// Smooth flattened spheroid without arms
    Elliptical,
}

impl Morphology {
    pub fn name(&self) -> &'static str {
        match self {
            Morphology::Spiral => "Spiral",
            Morphology::BarredSpiral => "Barred spiral",
            Morphology::Elliptical => "Elliptical",
        }
    }
}

/// Immutable description of a galaxy. Lengths are in parsecs, angles in radians.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GalaxyParameters {
    /// Global seed for all star streams
    pub seed: u64,
    /// Nominal disk radius; density is truncated beyond it
    pub radius: f64,
    /// Exponential disk scale length
    pub scale_length: f64,
    /// Exponential disk scale height
    pub scale_height: f64,
    /// Share of the central density carried by the bulge (0-1)
    pub bulge_fraction: f64,
    pub num_arms: u32,
    /// Pitch angle of the logarithmic spiral
    pub arm_pitch: f64,
    /// Gaussian standard deviation of an arm, as an angle
    pub arm_width: f64,
    /// Arm/inter-arm contrast (0 = no arms, 1 = empty inter-arm regions)
    pub arm_amplitude: f64,
    /// Angle of the first arm at r = 1 pc
    pub arm_phase: f64,
    /// Half-length of the bar (barred spirals only)
    pub bar_length: f64,
    pub morphology: Morphology,
}

impl Default for GalaxyParameters {
    /// Milky Way-like four-armed spiral
    fn default() -> Self {
        Self {
            seed: 0,
            radius: 15_000.0,
            scale_length: 3_000.0,
            scale_height: 300.0,
            bulge_fraction: 0.3,
            num_arms: 4,
            arm_pitch: 12.0_f64.to_radians(),
            arm_width: 0.35,
            arm_amplitude: 0.6,
            arm_phase: 0.0,
            bar_length: 3_000.0,
            morphology: Morphology::Spiral,
        }
    }
}

impl GalaxyParameters {
    /// Default galaxy with the given seed
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    /// Check that the parameters describe a usable galaxy.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("radius", self.radius),
            ("scale_length", self.scale_length),
            ("scale_height", self.scale_height),
            ("arm_width", self.arm_width),
        ];
        for (name, value) in positive {
            if !(value > 0.0) || !value.is_finite() {
                return Err(ConfigError::Invalid(format!("{} must be positive, got {}", name, value)));
            }
        }
        if !(0.0..=1.0).contains(&self.bulge_fraction) {
            return Err(ConfigError::Invalid(format!(
                "bulge_fraction must be in [0, 1], got {}",
                self.bulge_fraction
            )));
        }
        if !(0.0..=1.0).contains(&self.arm_amplitude) {
            return Err(ConfigError::Invalid(format!(
                "arm_amplitude must be in [0, 1], got {}",
                self.arm_amplitude
            )));
        }
        if self.num_arms == 0 {
            return Err(ConfigError::Invalid("num_arms must be at least 1".to_string()));
        }
        // tan(pitch) appears as a divisor
        if !(self.arm_pitch > 0.0 && self.arm_pitch < std::f64::consts::FRAC_PI_2) {
            return Err(ConfigError::Invalid(format!(
                "arm_pitch must be in (0, pi/2), got {}",
                self.arm_pitch
            )));
        }
        if self.morphology == Morphology::BarredSpiral && !(self.bar_length > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "bar_length must be positive for a barred spiral, got {}",
                self.bar_length
            )));
        }
        Ok(())
    }
}

/// Tuning values for star placement.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    /// Expected stars in one subsector where density equals the reference density
    pub average_stars_per_cell: f64,
    /// Calibration point whose density is the reference density
    pub reference_position: DVec3,
    /// Generate cells of a window on the rayon pool
    pub parallel: bool,
}

/// Solar-neighbourhood equivalent: 8 kpc from the centre, just above the plane
pub const SOLAR_NEIGHBORHOOD: DVec3 = DVec3::new(8_000.0, 20.0, 0.0);

/// Default calibration constant, a few stars per subsector near the Sun
pub const DEFAULT_STARS_PER_CELL: f64 = 4.0;

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            average_stars_per_cell: DEFAULT_STARS_PER_CELL,
            reference_position: SOLAR_NEIGHBORHOOD,
            parallel: true,
        }
    }
}

/// Complete configuration file contents
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GalaxyConfig {
    pub galaxy: GalaxyParameters,
    pub generation: GenerationSettings,
}

impl GalaxyConfig {
    /// Load and validate a configuration from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let file = File::open(path.as_ref())?;
        let config: GalaxyConfig = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        log::debug!(
            "Loaded galaxy config from {}: {} arms, seed {}",
            path.as_ref().display(),
            config.galaxy.num_arms,
            config.galaxy.seed
        );
        Ok(config)
    }

    /// Write the configuration as pretty-printed JSON.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let file = File::create(path.as_ref())?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)
            .map_err(|e| ConfigError::Parse(e.to_string()))?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.galaxy.validate()?;
        let stars = self.generation.average_stars_per_cell;
        if !(stars >= 0.0) || !stars.is_finite() {
            return Err(ConfigError::Invalid(format!(
                "average_stars_per_cell must be non-negative, got {}",
                stars
            )));
        }
        if stars == 0.0 {
            log::warn!("average_stars_per_cell is 0, every cell will be empty");
        }
        self.reference_density()?;
        Ok(())
    }

    /// Density at the configured reference position for this galaxy's model.
    pub fn reference_density(&self) -> Result<f64, ConfigError> {
        let field = density_field_for(&self.galaxy);
        let position = self.generation.reference_position;
        reference_density(field.as_ref(), position).ok_or_else(|| {
            ConfigError::Invalid(format!(
                "reference_position ({}, {}, {}) is too sparse to calibrate star counts",
                position.x, position.y, position.z
            ))
        })
    }
}

/// Errors that can occur while loading or saving configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// IO error (file not found, permissions, etc.)
    Io(std::io::Error),
    /// Malformed JSON or wrong field types
    Parse(String),
    /// Well-formed but physically meaningless values
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Invalid(e) => write!(f, "Invalid configuration: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_default_is_valid() {
        assert!(GalaxyConfig::default().validate().is_ok());
        for morphology in [Morphology::Spiral, Morphology::BarredSpiral, Morphology::Elliptical] {
            let params = GalaxyParameters {
                morphology,
                ..GalaxyParameters::default()
            };
            assert!(params.validate().is_ok(), "{} should validate", morphology.name());
        }
    }

    #[test]
    fn test_invalid_values_rejected() {
        let bad = [
            GalaxyParameters { num_arms: 0, ..Default::default() },
            GalaxyParameters { arm_amplitude: 1.5, ..Default::default() },
            GalaxyParameters { scale_length: -1.0, ..Default::default() },
            GalaxyParameters { arm_pitch: 0.0, ..Default::default() },
            GalaxyParameters { bulge_fraction: f64::NAN, ..Default::default() },
        ];
        for params in bad {
            assert!(matches!(params.validate(), Err(ConfigError::Invalid(_))), "{:?}", params);
        }
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("galaxy.json");

        let mut config = GalaxyConfig::default();
        config.galaxy.seed = 42;
        config.galaxy.morphology = Morphology::BarredSpiral;
        config.generation.average_stars_per_cell = 2.5;
        config.save(&path).unwrap();

        let loaded = GalaxyConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("partial.json");
        let mut file = File::create(&path).unwrap();
        writeln!(file, r#"{{ "galaxy": {{ "seed": 99, "num_arms": 2 }} }}"#).unwrap();
        drop(file);

        let loaded = GalaxyConfig::load(&path).unwrap();
        assert_eq!(loaded.galaxy.seed, 99);
        assert_eq!(loaded.galaxy.num_arms, 2);
        assert_eq!(loaded.galaxy.radius, GalaxyParameters::default().radius);
        assert_eq!(loaded.generation, GenerationSettings::default());
    }

    #[test]
    fn test_load_errors() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            GalaxyConfig::load(dir.path().join("missing.json")),
            Err(ConfigError::Io(_))
        ));

        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(GalaxyConfig::load(&path), Err(ConfigError::Parse(_))));

        let path = dir.path().join("invalid.json");
        std::fs::write(&path, r#"{ "generation": { "average_stars_per_cell": -1.0 } }"#).unwrap();
        assert!(matches!(GalaxyConfig::load(&path), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_far_reference_position_rejected() {
        let mut config = GalaxyConfig::default();
        assert!(config.reference_density().unwrap() > 0.0);

        config.generation.reference_position = DVec3::new(30_000.0, 0.0, 0.0);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let dir = tempdir().unwrap();
        let path = dir.path().join("far.json");
        std::fs::write(&path, r#"{ "generation": { "reference_position": [30000.0, 0.0, 0.0] } }"#).unwrap();
        assert!(matches!(GalaxyConfig::load(&path), Err(ConfigError::Invalid(_))));
    }
}
