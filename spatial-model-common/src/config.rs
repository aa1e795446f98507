use serde::{Deserialize, Serialize};
use anyhow::Result;
use crate::colour::parse_colour;
use std::path::{Path, PathBuf};

// Configuration for the compartment geometry
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct GeometryConfig {
    /// Raster image the compartment is extracted from.
    pub image: PathBuf,
    /// Colour of the compartment's pixels in `image`, by name or `#rrggbb[aa]`.
    pub compartment_colour: String,
    /// "neumann" (zero flux) or "dirichlet" (fixed exterior value).
    #[serde(default = "default_boundary_conditions")]
    pub boundary_conditions: String,
    /// Compartment volume, used to convert initial amounts into concentrations.
    #[serde(default = "default_volume")]
    pub volume: f64,
}

// Configuration for timing
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct TimingConfig {
    pub dt: f64,
    pub total_time: f64,
    pub record_interval: f64,
}

// Per-species settings, one [[species]] table each
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct SpeciesConfig {
    pub name: String,
    #[serde(default = "default_diffusion_constant")]
    pub diffusion_constant: f64,
    #[serde(default)]
    pub initial_concentration: Option<f64>,
    #[serde(default)]
    pub initial_amount: Option<f64>,
    /// Optional intensity image imported as the initial concentration.
    #[serde(default)]
    pub concentration_image: Option<PathBuf>,
    #[serde(default = "default_scale_factor")]
    pub scale_factor: f64,
    /// Concentration held in the exterior slot (only meaningful for Dirichlet boundaries).
    #[serde(default)]
    pub boundary_concentration: f64,
    /// First-order loss rate, `dc/dt = -decay_rate * c`.
    #[serde(default)]
    pub decay_rate: f64,
    /// Display colour override.
    #[serde(default)]
    pub colour: Option<String>,
}

/// Where a species' initial concentration comes from, in order of precedence.
#[derive(Debug, Clone, PartialEq)]
pub enum InitialConcentration {
    Image { path: PathBuf, scale_factor: f64 },
    Uniform(f64),
}

fn default_boundary_conditions() -> String {
    "neumann".to_string()
}

fn default_volume() -> f64 {
    1.0
}

fn default_diffusion_constant() -> f64 {
    1.0
}

fn default_scale_factor() -> f64 {
    1.0
}

// Main simulation configuration structure, loaded from config.toml.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct SimulationConfig {
    pub geometry: GeometryConfig,
    pub timing: TimingConfig,
    pub species: Vec<SpeciesConfig>,
}

impl SpeciesConfig {
    /// Resolves the initial state: image > amount / volume > concentration > 0.
    pub fn initial_concentration(&self, volume: f64) -> InitialConcentration {
        if let Some(path) = &self.concentration_image {
            return InitialConcentration::Image { path: path.clone(), scale_factor: self.scale_factor };
        }
        if let Some(amount) = self.initial_amount {
            return InitialConcentration::Uniform(amount / volume);
        }
        InitialConcentration::Uniform(self.initial_concentration.unwrap_or(0.0))
    }

    /// Parsed display colour override, if any.
    pub fn display_colour(&self) -> Result<Option<[u8; 3]>> {
        self.colour
            .as_deref()
            .map(|c| parse_colour(c).map(|[r, g, b, _]| [r, g, b]))
            .transpose()
    }
}

impl SimulationConfig {
    /// Loads the simulation configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();

        let config_str = std::fs::read_to_string(path_ref)
            .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path_ref.display(), e))?;
        let mut config = Self::from_toml_str(&config_str)
            .map_err(|e| anyhow::anyhow!("Invalid config '{}': {}", path_ref.display(), e))?;

        // Relative image paths are resolved against the config file's directory
        if let Some(base) = path_ref.parent() {
            config.resolve_paths(base);
        }
        Ok(config)
    }

    /// Parses and validates a configuration from TOML text.
    pub fn from_toml_str(config_str: &str) -> Result<Self> {
        let config: SimulationConfig = toml::from_str(config_str)
            .map_err(|e| anyhow::anyhow!("Failed to parse TOML: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.timing.dt <= 0.0 {
            anyhow::bail!("timing.dt must be positive.");
        }
        if self.timing.total_time < 0.0 {
            anyhow::bail!("timing.total_time must not be negative.");
        }
        if self.timing.record_interval < 0.0 {
            anyhow::bail!("timing.record_interval must not be negative.");
        }
        if self.geometry.volume <= 0.0 {
            anyhow::bail!("geometry.volume must be positive.");
        }
        parse_colour(&self.geometry.compartment_colour)?;
        if self.species.is_empty() {
            anyhow::bail!("At least one [[species]] entry is required.");
        }
        for species in &self.species {
            if species.diffusion_constant < 0.0 {
                anyhow::bail!("Species '{}' has a negative diffusion_constant.", species.name);
            }
            if species.decay_rate < 0.0 {
                anyhow::bail!("Species '{}' has a negative decay_rate.", species.name);
            }
            species.display_colour()?;
        }
        Ok(())
    }

    fn resolve_paths(&mut self, base: &Path) {
        if self.geometry.image.is_relative() {
            self.geometry.image = base.join(&self.geometry.image);
        }
        for species in &mut self.species {
            if let Some(path) = species.concentration_image.as_mut() {
                if path.is_relative() {
                    *path = base.join(&*path);
                }
            }
        }
    }

    /// RGBA colour identifying the compartment in the geometry image.
    pub fn compartment_colour(&self) -> Result<[u8; 4]> {
        parse_colour(&self.geometry.compartment_colour)
    }

    pub fn species_names(&self) -> Vec<&str> {
        self.species.iter().map(|s| s.name.as_str()).collect()
    }
}
