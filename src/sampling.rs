//! Random draws used by star placement.

use std::f64::consts::PI;

use rand::Rng;

/// Above this mean the Poisson draw switches to a normal approximation.
///
/// Knuth's product method needs O(lambda) uniforms and underflows `exp(-lambda)`
/// for large means; at 30 the normal approximation is already tight.
pub const POISSON_NORMAL_THRESHOLD: f64 = 30.0;

/// Sample from a Gaussian (normal) distribution using the Box-Muller transform
pub fn sample_gaussian<R: Rng + ?Sized>(rng: &mut R, mean: f64, std_dev: f64) -> f64 {
    // 1 - u keeps the argument of ln in (0, 1]
    let u1: f64 = 1.0 - rng.gen::<f64>();
    let u2: f64 = rng.gen();
    let z = (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos();
    mean + std_dev * z
}

/// Sample a Poisson-distributed count with mean `lambda`.
///
/// Non-positive or non-finite means yield 0.
pub fn sample_poisson<R: Rng + ?Sized>(rng: &mut R, lambda: f64) -> u64 {
    if !(lambda > 0.0) || !lambda.is_finite() {
        return 0;
    }

    if lambda < POISSON_NORMAL_THRESHOLD {
        let limit = (-lambda).exp();
        let mut count = 0u64;
        let mut product: f64 = rng.gen();
        while product > limit {
            count += 1;
            product *= rng.gen::<f64>();
        }
        count
    } else {
        sample_gaussian(rng, lambda, lambda.sqrt()).round().max(0.0) as u64
    }
}

/// Uniform point inside an axis-aligned cube
pub fn sample_in_cube<R: Rng + ?Sized>(rng: &mut R, origin: glam::DVec3, size: f64) -> glam::DVec3 {
    let x: f64 = rng.gen();
    let y: f64 = rng.gen();
    let z: f64 = rng.gen();
    origin + glam::DVec3::new(x, y, z) * size
}
