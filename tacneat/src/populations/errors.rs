use super::SpeciesId;

use thiserror::Error;

/// An error type indicating that a population
/// could not be evolved.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvolutionError {
    /// The population holds no specimens.
    #[error("attempted evolution on an empty population")]
    EmptyPopulation,
    /// A specimen was assigned a negative or NaN fitness.
    #[error("specimen of species {species} has invalid fitness {fitness}")]
    InvalidFitness { species: SpeciesId, fitness: f64 },
}
