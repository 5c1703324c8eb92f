use super::SpeciesId;

use serde::{Deserialize, Serialize};

/// A member of a population: a genome along with
/// its evolutionary bookkeeping.
///
/// Genomes are never modified once wrapped in a specimen;
/// offspring are built from clones.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Specimen<G> {
    genome: G,
    fitness: f64,
    adjusted_fitness: f64,
    champion_of: Option<SpeciesId>,
    champion_fitness: Option<f64>,
}

impl<G> Specimen<G> {
    /// Wraps a genome with no fitness recorded.
    ///
    /// # Examples
    /// ```
    /// use tacneat::Specimen;
    ///
    /// let specimen = Specimen::new("genome");
    /// assert_eq!(specimen.fitness(), 0.0);
    /// assert!(!specimen.is_champion());
    /// ```
    pub fn new(genome: G) -> Specimen<G> {
        Specimen {
            genome,
            fitness: 0.0,
            adjusted_fitness: 0.0,
            champion_of: None,
            champion_fitness: None,
        }
    }

    /// Wraps an unmodified copy of the best member of a species,
    /// remembering the fitness it earned.
    pub(super) fn champion(genome: G, species: SpeciesId, fitness: f64) -> Specimen<G> {
        Specimen {
            champion_of: Some(species),
            champion_fitness: Some(fitness),
            ..Specimen::new(genome)
        }
    }

    /// Returns the specimen's genome.
    pub fn genome(&self) -> &G {
        &self.genome
    }

    /// Returns the raw fitness of the specimen, as
    /// last set by an evaluation.
    pub fn fitness(&self) -> f64 {
        self.fitness
    }

    /// Sets the specimen's raw fitness.
    /// Must be non-negative for the population to evolve.
    pub fn set_fitness(&mut self, fitness: f64) {
        self.fitness = fitness;
    }

    /// Returns the specimen's fitness shared with its species.
    pub fn adjusted_fitness(&self) -> f64 {
        self.adjusted_fitness
    }

    pub(super) fn set_adjusted_fitness(&mut self, adjusted_fitness: f64) {
        self.adjusted_fitness = adjusted_fitness;
    }

    /// Returns whether the specimen is a carried-over species champion.
    pub fn is_champion(&self) -> bool {
        self.champion_of.is_some()
    }

    /// Returns the species the specimen was champion of
    /// in the previous generation, if it was one.
    pub fn champion_of(&self) -> Option<SpeciesId> {
        self.champion_of
    }

    /// Returns the fitness the specimen earned before being
    /// carried over as champion, if it was one.
    pub fn champion_fitness(&self) -> Option<f64> {
        self.champion_fitness
    }
}
