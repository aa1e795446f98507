use anyhow::{Context, Result};
use clap::Parser;
use image::Rgba;
use log::{debug, info, warn};
use spatial_model_common::{InitialConcentration, SimulationConfig, SpeciesPalette};
use spatial_model_engine::{
    BoundaryCondition, Field, Geometry, LinearDecay, NoReactions, ReactionTerm, Simulation,
};
use std::path::PathBuf;

/// Command-line arguments for the engine
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the simulation config file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,
}

/// Builds the field described by `config` over `geometry`, with diffusion
/// constants, display colours and initial/boundary concentrations applied.
fn build_field<'g>(config: &SimulationConfig, geometry: &'g Geometry) -> Result<Field<'g>> {
    let boundary_condition: BoundaryCondition = config.geometry.boundary_conditions.parse()?;
    let mut field = Field::new(geometry, config.species.len(), boundary_condition)?;

    let mut palette = SpeciesPalette::with_len(config.species.len());
    for (i, species) in config.species.iter().enumerate() {
        field.set_diffusion_constant(i, species.diffusion_constant);
        field.set_boundary_concentration(i, species.boundary_concentration);
        if let Some(colour) = species.display_colour()? {
            palette.set_colour(i, colour);
        }

        match species.initial_concentration(config.geometry.volume) {
            InitialConcentration::Image { path, scale_factor } => {
                let img = image::open(&path)
                    .with_context(|| format!("Failed to open concentration image: {}", path.display()))?
                    .to_luma8();
                field.import_concentration(i, &img, scale_factor)?;
                info!("Species '{}': initial concentration imported from {}", species.name, path.display());
            }
            InitialConcentration::Uniform(value) => {
                field.set_constant_concentration(i, value);
                debug!("Species '{}': uniform initial concentration {}", species.name, value);
            }
        }
    }
    field.set_palette(palette)?;
    Ok(field)
}

fn reaction_term(config: &SimulationConfig) -> Box<dyn ReactionTerm> {
    let rates: Vec<f64> = config.species.iter().map(|s| s.decay_rate).collect();
    if rates.iter().any(|&k| k != 0.0) {
        Box::new(LinearDecay { rates })
    } else {
        Box::new(NoReactions { n_species: rates.len() })
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize the logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("Starting Spatial Model Engine...");

    // --- Load Configuration ---
    let config = SimulationConfig::load(&args.config)?;
    info!("Loaded config from {}", args.config.display());
    debug!("Configuration: {:#?}", config);

    // --- Extract Compartment Geometry ---
    let source = image::open(&config.geometry.image)
        .with_context(|| format!("Failed to open geometry image: {}", config.geometry.image.display()))?
        .to_rgba8();
    let colour = Rgba(config.compartment_colour()?);
    let geometry = Geometry::from_image(&source, colour);
    if geometry.is_empty() {
        warn!(
            "No pixels of colour {} in {}; the compartment is empty.",
            config.geometry.compartment_colour,
            config.geometry.image.display()
        );
    }
    info!(
        "Compartment: {} pixels in a {}x{} image.",
        geometry.pixel_count(),
        source.width(),
        source.height()
    );

    // --- Initialize Field ---
    let field = build_field(&config, &geometry)?;
    info!(
        "Field initialized: {} species, {} boundary.",
        field.species_count(),
        field.boundary_condition()
    );

    // --- Simulation Loop ---
    let mut sim = Simulation::new(field, reaction_term(&config), config.timing.dt)?;
    sim.run(config.timing.total_time, config.timing.record_interval);

    // --- Report ---
    let names = config.species_names();
    for snapshot in sim.get_recorded_snapshots() {
        let means: Vec<String> = names
            .iter()
            .enumerate()
            .map(|(s, name)| match snapshot.mean_concentration(s) {
                Some(mean) => format!("{}={:.4}", name, mean),
                None => format!("{}=n/a", name),
            })
            .collect();
        info!("t = {:.3} | mean concentration: {}", snapshot.time, means.join(", "));
    }

    info!("Simulation Complete.");
    Ok(())
}
