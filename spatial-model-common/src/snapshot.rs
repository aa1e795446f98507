use serde::{Serialize, Deserialize};

/// A snapshot of the field's summary statistics at a specific time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)] // Derive traits for easy saving/loading
pub struct Snapshot {
    /// The simulation time at which the snapshot was taken.
    pub time: f64,
    /// Mean concentration of each species over the compartment.
    /// `None` when the compartment has no pixels.
    pub mean_concentrations: Vec<Option<f64>>,
}

impl Snapshot {
    /// Mean concentration of one species, if the compartment has any pixels.
    pub fn mean_concentration(&self, species_index: usize) -> Option<f64> {
        self.mean_concentrations.get(species_index).copied().flatten()
    }
}
