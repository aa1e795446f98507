//! Reaction-diffusion of species concentrations over compartments extracted
//! from raster images.
//!
//! A [`Geometry`] is the set of pixels of one colour in an image. A [`Field`]
//! holds per-pixel species concentrations over a geometry and computes their
//! diffusion with a 5-point Laplacian, honouring Dirichlet or Neumann boundaries.
//! [`Simulation`] advances a field with explicit Euler steps.

pub mod error;
pub mod field;
pub mod geometry;
pub mod simulation;

pub use error::FieldError;
pub use field::{BoundaryCondition, Field};
pub use geometry::{Geometry, Pixel};
pub use simulation::{LinearDecay, NoReactions, ReactionTerm, Simulation};
