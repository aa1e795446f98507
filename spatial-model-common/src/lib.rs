pub mod colour;
pub mod config;
pub mod snapshot;

// Re-export key types for easier use by dependent crates
pub use colour::{parse_colour, SpeciesPalette, DEFAULT_SPECIES_COLOURS};
pub use config::{GeometryConfig, InitialConcentration, SimulationConfig, SpeciesConfig, TimingConfig};
pub use snapshot::Snapshot;
