use std::error::Error;

use clap::Parser;
use glam::DVec3;

use galaxy_generator::config::GalaxyConfig;
use galaxy_generator::coords::{world_to_hierarchy, Cell, CellLevel};
use galaxy_generator::density::{density_field_for, radial_profile};
use galaxy_generator::export::{export_neighborhood, export_profile};
use galaxy_generator::neighborhood::{Neighborhood, NEIGHBORHOOD_RADIUS};

#[derive(Parser, Debug)]
#[command(name = "galaxy_generator")]
#[command(about = "Generate the star field around a viewpoint in a procedural galaxy")]
struct Args {
    /// Galaxy configuration file (JSON); defaults to a Milky Way-like spiral
    #[arg(short, long)]
    config: Option<String>,

    /// Global seed (overrides the config; random if neither gives one)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Viewpoint X in parsecs (galactic plane)
    #[arg(short, long, default_value = "8000", allow_hyphen_values = true)]
    x: f64,

    /// Viewpoint Y in parsecs (height above the plane)
    #[arg(short, long, default_value = "20", allow_hyphen_values = true)]
    y: f64,

    /// Viewpoint Z in parsecs (galactic plane)
    #[arg(short, long, default_value = "0", allow_hyphen_values = true)]
    z: f64,

    /// Expected stars per subsector at the reference density
    #[arg(long)]
    stars_per_cell: Option<f64>,

    /// Export the neighbourhood to a JSON file
    #[arg(long)]
    export: Option<String>,

    /// Export a radial density profile to a CSV file
    #[arg(long)]
    profile: Option<String>,

    /// Also generate the bordered sector containing the viewpoint
    #[arg(long)]
    bordered: bool,

    /// Generate cells on the current thread only
    #[arg(long)]
    sequential: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => GalaxyConfig::load(path)?,
        None => GalaxyConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.galaxy.seed = seed;
    } else if args.config.is_none() {
        config.galaxy.seed = rand::random();
    }
    if let Some(stars) = args.stars_per_cell {
        config.generation.average_stars_per_cell = stars;
    }
    if args.sequential {
        config.generation.parallel = false;
    }
    config.validate()?;

    let galaxy = &config.galaxy;
    let field = density_field_for(galaxy);
    let reference = config.reference_density()?;

    println!("Galaxy seed: {}", galaxy.seed);
    println!(
        "Morphology: {} ({} arms, radius {:.0} pc)",
        galaxy.morphology.name(),
        galaxy.num_arms,
        galaxy.radius
    );
    println!("Reference density: {:.4e}", reference);

    let viewpoint = DVec3::new(args.x, args.y, args.z);
    let hierarchy = world_to_hierarchy(viewpoint);
    println!("Viewpoint ({:.1}, {:.1}, {:.1}) pc -> {}", viewpoint.x, viewpoint.y, viewpoint.z, hierarchy);
    println!("Local density: {:.4e}", field.density(viewpoint));

    println!("Generating neighbourhood...");
    let neighborhood = Neighborhood::from_settings(&config.generation);
    let data = neighborhood.build(viewpoint, galaxy.seed, field.as_ref(), reference);
    println!(
        "Generated {} stars in {} subsectors (centre origin {:?})",
        data.star_count(),
        data.cell_count(),
        data.center_origin.to_array()
    );
    let cells = data.shell_cell_counts();
    for shell in 0..=NEIGHBORHOOD_RADIUS as u8 {
        println!(
            "  Shell {}: {:>4} cells, {:>6} stars",
            shell,
            cells[shell as usize],
            data.star_count_in_shell(shell)
        );
    }

    if args.bordered {
        let sector = Cell::containing(CellLevel::Sector, viewpoint);
        let generator = neighborhood.generator();
        let plain = generator.generate(galaxy.seed, &sector, field.as_ref(), reference);
        let bordered = generator.generate_bordered(galaxy.seed, &sector, field.as_ref(), reference);
        println!(
            "Sector {}: {} stars, {} with border",
            sector,
            plain.len(),
            bordered.len()
        );
    }

    if let Some(path) = &args.export {
        println!("Exporting neighbourhood to {}...", path);
        export_neighborhood(path, galaxy, viewpoint, &data)?;
    }

    if let Some(path) = &args.profile {
        println!("Exporting density profile to {}...", path);
        let profile = radial_profile(field.as_ref(), galaxy.radius * 1.2, 120);
        export_profile(path, &profile)?;
    }

    Ok(())
}
