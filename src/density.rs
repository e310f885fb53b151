//! Continuous stellar density of a disk galaxy.
//!
//! The galactic plane is x–z and y is height above the plane. Densities are
//! relative (1.0 at the centre of a spiral disk) and only ever compared to a
//! reference density, so no absolute units are attached.

use std::f64::consts::{PI, TAU};

use glam::DVec3;

use crate::config::{GalaxyParameters, Morphology};

/// Below this radius the arms give way to the bulge (parsecs)
pub const ARM_CORE_RADIUS: f64 = 500.0;

/// Bulge scale radius as a fraction of the disk scale length
const BULGE_SCALE_RATIO: f64 = 0.1;

/// Width of the Gaussian edge cut-off, as a fraction of the galaxy radius
const EDGE_TRUNCATION_WIDTH: f64 = 0.1;

/// Bar minor/major axis ratio
const BAR_AXIS_RATIO: f64 = 0.3;

/// Bar peak density relative to the bulge fraction
const BAR_STRENGTH: f64 = 0.5;

/// Vertical/horizontal axis ratio of an elliptical galaxy
const ELLIPTICAL_FLATTENING: f64 = 0.7;

/// Anything that can report relative stellar density at a world position.
///
/// Implementations must be pure functions of their parameters and the
/// position, and must never return a negative value.
pub trait DensityField: Send + Sync {
    fn density(&self, position: DVec3) -> f64;

    /// Human-readable model name, for logs
    fn name(&self) -> &'static str {
        "density field"
    }
}

/// Build the density model matching the galaxy's morphology.
pub fn density_field_for(params: &GalaxyParameters) -> Box<dyn DensityField> {
    match params.morphology {
        Morphology::Spiral => Box::new(SpiralDensityField::new(params.clone())),
        Morphology::BarredSpiral => Box::new(BarredSpiralDensityField::new(params.clone())),
        Morphology::Elliptical => Box::new(EllipticalDensityField::new(params.clone())),
    }
}

/// Smallest usable reference density, as a fraction of the central density
pub const MIN_REFERENCE_FRACTION: f64 = 1e-6;

/// Density at the calibration point, used to normalize expected star counts.
///
/// `None` when the point is so sparse (or the field so degenerate) that
/// dividing by it would blow star counts up: the density must be finite and
/// at least `MIN_REFERENCE_FRACTION` of the density at the galactic centre.
pub fn reference_density(field: &dyn DensityField, position: DVec3) -> Option<f64> {
    let central = field.density(DVec3::ZERO);
    let reference = field.density(position);
    if !central.is_finite() || !reference.is_finite() || !(central > 0.0) {
        return None;
    }
    if reference < central * MIN_REFERENCE_FRACTION {
        return None;
    }
    Some(reference)
}

/// Cylindrical radius and height of a position
#[inline]
fn cylindrical(position: DVec3) -> (f64, f64) {
    ((position.x * position.x + position.z * position.z).sqrt(), position.y)
}

/// Gaussian fade beyond the nominal radius; 1.0 inside it
fn edge_truncation(r: f64, radius: f64) -> f64 {
    if r <= radius {
        return 1.0;
    }
    let t = (r - radius) / (EDGE_TRUNCATION_WIDTH * radius);
    (-t * t).exp()
}

/// Exponential disk with logarithmic spiral arms.
#[derive(Clone, Debug)]
pub struct SpiralDensityField {
    params: GalaxyParameters,
    /// Arms are suppressed inside this radius
    arm_inner_radius: f64,
}

impl SpiralDensityField {
    pub fn new(params: GalaxyParameters) -> Self {
        Self {
            params,
            arm_inner_radius: ARM_CORE_RADIUS,
        }
    }

    pub fn params(&self) -> &GalaxyParameters {
        &self.params
    }

    /// Disk and bulge falloff, 1.0 at the centre.
    ///
    /// `r` is cylindrical radius, `height` the signed distance from the plane.
    pub fn radial_vertical_falloff(&self, r: f64, height: f64) -> f64 {
        let p = &self.params;
        let disk = (-r / p.scale_length).exp() * (-height.abs() / p.scale_height).exp();

        let bulge_scale = BULGE_SCALE_RATIO * p.scale_length;
        let spherical = (r * r + height * height).sqrt();
        let bulge = (-spherical / bulge_scale).exp();

        let blended = (1.0 - p.bulge_fraction) * disk + p.bulge_fraction * bulge;
        blended * edge_truncation(r, p.radius)
    }

    /// Arm angle of the logarithmic spiral at radius `r`
    pub fn arm_angle(&self, r: f64) -> f64 {
        self.params.arm_phase + r.ln() / self.params.arm_pitch.tan()
    }

    /// Angular distance from `theta` to the nearest arm, in [-pi/n, pi/n]
    pub fn arm_offset(&self, r: f64, theta: f64) -> f64 {
        let spacing = TAU / self.params.num_arms.max(1) as f64;
        let mut offset = (theta - self.arm_angle(r)).rem_euclid(spacing);
        if offset > spacing * 0.5 {
            offset -= spacing;
        }
        offset
    }

    /// Spiral-arm modulation: 1.0 on an arm crest, lowest halfway between arms.
    pub fn arm_factor(&self, r: f64, x: f64, z: f64) -> f64 {
        if r < self.arm_inner_radius {
            return 1.0;
        }
        let p = &self.params;
        let theta = z.atan2(x);
        let offset = self.arm_offset(r, theta);
        let width = p.arm_width;
        (1.0 - p.arm_amplitude) + p.arm_amplitude * (-offset * offset / (2.0 * width * width)).exp()
    }

    /// Exact arm factor halfway between two arms
    pub fn inter_arm_minimum(&self) -> f64 {
        let p = &self.params;
        let half_gap = PI / p.num_arms.max(1) as f64;
        (1.0 - p.arm_amplitude) + p.arm_amplitude * (-half_gap * half_gap / (2.0 * p.arm_width * p.arm_width)).exp()
    }
}

impl DensityField for SpiralDensityField {
    fn density(&self, position: DVec3) -> f64 {
        let (r, height) = cylindrical(position);
        let value = self.radial_vertical_falloff(r, height) * self.arm_factor(r, position.x, position.z);
        value.max(0.0)
    }

    fn name(&self) -> &'static str {
        "spiral"
    }
}

/// Spiral disk plus an elongated central bar.
///
/// The bar is rotated so its ends sit where the arms begin.
#[derive(Clone, Debug)]
pub struct BarredSpiralDensityField {
    disk: SpiralDensityField,
    /// Unit vector along the bar's major axis, in the x–z plane
    bar_axis: (f64, f64),
}

impl BarredSpiralDensityField {
    pub fn new(params: GalaxyParameters) -> Self {
        let bar_length = params.bar_length.max(ARM_CORE_RADIUS);
        let mut disk = SpiralDensityField::new(params);
        disk.arm_inner_radius = bar_length;
        let angle = disk.arm_angle(bar_length);
        Self {
            disk,
            bar_axis: (angle.cos(), angle.sin()),
        }
    }

    /// Bar component alone
    pub fn bar_density(&self, position: DVec3) -> f64 {
        let p = self.disk.params();
        let a = p.bar_length.max(ARM_CORE_RADIUS);
        let b = a * BAR_AXIS_RATIO;
        let (cx, sz) = self.bar_axis;
        let along = position.x * cx + position.z * sz;
        let across = -position.x * sz + position.z * cx;
        let planar = (along / a).powi(2) + (across / b).powi(2);
        BAR_STRENGTH * p.bulge_fraction * (-planar).exp() * (-position.y.abs() / p.scale_height).exp()
    }
}

impl DensityField for BarredSpiralDensityField {
    fn density(&self, position: DVec3) -> f64 {
        (self.disk.density(position) + self.bar_density(position)).max(0.0)
    }

    fn name(&self) -> &'static str {
        "barred spiral"
    }
}

/// Smooth, armless, flattened spheroid.
#[derive(Clone, Debug)]
pub struct EllipticalDensityField {
    params: GalaxyParameters,
}

impl EllipticalDensityField {
    pub fn new(params: GalaxyParameters) -> Self {
        Self { params }
    }
}

impl DensityField for EllipticalDensityField {
    fn density(&self, position: DVec3) -> f64 {
        let (r, height) = cylindrical(position);
        let h = height / ELLIPTICAL_FLATTENING;
        let m = (r * r + h * h).sqrt();
        let value = (-m / self.params.scale_length).exp() * edge_truncation(m, self.params.radius);
        value.max(0.0)
    }

    fn name(&self) -> &'static str {
        "elliptical"
    }
}

/// Azimuthally averaged in-plane density at `steps` radii from 0 to `max_radius`.
pub fn radial_profile(field: &dyn DensityField, max_radius: f64, steps: usize) -> Vec<(f64, f64)> {
    const AZIMUTH_SAMPLES: usize = 72;
    let steps = steps.max(1);
    (0..=steps)
        .map(|i| {
            let r = max_radius * i as f64 / steps as f64;
            let sum: f64 = (0..AZIMUTH_SAMPLES)
                .map(|k| {
                    let theta = TAU * k as f64 / AZIMUTH_SAMPLES as f64;
                    field.density(DVec3::new(r * theta.cos(), 0.0, r * theta.sin()))
                })
                .sum();
            (r, sum / AZIMUTH_SAMPLES as f64)
        })
        .collect()
}
