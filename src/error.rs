use thiserror::Error;

/// Recoverable failures raised while setting up or driving a [`crate::Field`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FieldError {
    #[error("boundary condition '{0}' not supported (expected \"dirichlet\" or \"neumann\")")]
    UnsupportedBoundaryCondition(String),
    #[error("a field needs at least one species")]
    NoSpecies,
    #[error("image size mismatch: expected {expected:?}, found {found:?}")]
    ImageSizeMismatch {
        expected: (u32, u32),
        found: (u32, u32),
    },
    #[error("species count mismatch: expected {expected}, found {found}")]
    SpeciesCountMismatch { expected: usize, found: usize },
}
