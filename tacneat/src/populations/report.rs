use super::SpeciesId;

use serde::{Deserialize, Serialize};

use std::fmt;

/// A summary of one call to [`Population::evolve`].
///
/// [`Population::evolve`]: crate::Population::evolve
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenerationReport {
    /// The generation that was evaluated.
    pub generation: usize,
    /// Number of species holding the new generation.
    pub species_count: usize,
    /// Highest raw fitness of the evaluated generation.
    pub best_fitness: f64,
    /// Species of the best member of the evaluated generation.
    pub best_species: SpeciesId,
    /// Species removed by stagnation, mass extinction,
    /// or for being left without members.
    pub extinct_species: Vec<SpeciesId>,
    /// Whether a mass extinction took place.
    pub mass_extinction: bool,
}

impl fmt::Display for GenerationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "generation {}: best fitness {} (species {}), {} species",
            self.generation, self.best_fitness, self.best_species, self.species_count
        )?;
        if self.mass_extinction {
            write!(f, ", mass extinction")?;
        }
        if !self.extinct_species.is_empty() {
            write!(f, ", {} extinct", self.extinct_species.len())?;
        }
        Ok(())
    }
}
