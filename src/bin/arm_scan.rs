//! Debug script to print the spiral arm factor around a ring as ASCII

use std::f64::consts::TAU;

use galaxy_generator::config::GalaxyParameters;
use galaxy_generator::density::SpiralDensityField;

fn main() {
    let params = GalaxyParameters::default();
    let field = SpiralDensityField::new(params.clone());
    let samples = 72;
    let bar_width = 50;

    println!(
        "=== ARM FACTOR SCAN ({} arms, pitch {:.1} deg, width {:.2} rad, amplitude {:.2}) ===",
        params.num_arms,
        params.arm_pitch.to_degrees(),
        params.arm_width,
        params.arm_amplitude
    );
    println!("Expected inter-arm minimum: {:.4}", field.inter_arm_minimum());

    for &radius in &[2_000.0, 5_000.0, 8_000.0, 12_000.0] {
        println!();
        println!("r = {:.0} pc", radius);
        let mut min = f64::MAX;
        let mut max = f64::MIN;
        for k in 0..samples {
            let theta = TAU * k as f64 / samples as f64;
            let factor = field.arm_factor(radius, radius * theta.cos(), radius * theta.sin());
            min = min.min(factor);
            max = max.max(factor);
            let filled = (factor * bar_width as f64).round() as usize;
            println!("{:>6.1} deg |{:<width$}| {:.3}", theta.to_degrees(), "#".repeat(filled), factor, width = bar_width);
        }
        println!("min {:.4}  max {:.4}", min, max);
    }
}
