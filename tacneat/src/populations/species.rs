use super::Specimen;

use rand::prelude::{Rng, SliceRandom};
use serde::{Deserialize, Serialize};

use std::fmt;

/// Species identifier. Species are numbered
/// sequentially in order of appearance.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct SpeciesId(pub usize);

impl fmt::Display for SpeciesId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Species are collections of reproductively
/// compatible (within a certain [compatibility threshold])
/// specimens. Membership is determined each generation by
/// comparing offspring to a randomly chosen member of
/// the previous generation.
///
/// A species tracks the summed adjusted fitness of its
/// members, and how many generations have gone by since
/// that sum last improved.
///
/// [compatibility threshold]: crate::PopulationConfig::initial_compatibility_threshold
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Species<G> {
    id: SpeciesId,
    pub(super) members: Vec<Specimen<G>>,
    collective_fitness: f64,
    best_collective_fitness: f64,
    pub(super) generations_since_improvement: usize,
}

impl<G> Species<G> {
    /// Creates a new, empty species with the specified ID.
    ///
    /// # Examples
    /// ```
    /// use tacneat::{Species, SpeciesId};
    ///
    /// let species = Species::<()>::new(SpeciesId(3));
    /// assert_eq!(species.id(), SpeciesId(3));
    /// assert!(species.is_empty());
    /// ```
    pub fn new(id: SpeciesId) -> Species<G> {
        Species {
            id,
            members: vec![],
            collective_fitness: 0.0,
            best_collective_fitness: 0.0,
            generations_since_improvement: 0,
        }
    }

    /// Returns the species' ID.
    pub fn id(&self) -> SpeciesId {
        self.id
    }

    /// Returns an iterator over the species' members.
    pub fn members(&self) -> impl Iterator<Item = &Specimen<G>> {
        self.members.iter()
    }

    /// Returns the number of members in the species.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns whether the species has no members left.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Returns the sum of the members' adjusted fitnesses,
    /// as of the last scoring.
    pub fn collective_fitness(&self) -> f64 {
        self.collective_fitness
    }

    /// Returns the highest collective fitness the species reached.
    pub fn best_collective_fitness(&self) -> f64 {
        self.best_collective_fitness
    }

    /// Returns the number of generations since the
    /// species' collective fitness last improved.
    pub fn generations_since_improvement(&self) -> usize {
        self.generations_since_improvement
    }

    /// Returns the member with the highest raw fitness.
    ///
    /// # Examples
    /// ```
    /// use tacneat::{Species, SpeciesId};
    ///
    /// let species = Species::<u8>::new(SpeciesId(0));
    /// assert!(species.champion().is_none());
    /// ```
    pub fn champion(&self) -> Option<&Specimen<G>> {
        self.members
            .iter()
            .max_by(|a, b| a.fitness().total_cmp(&b.fitness()))
    }

    /// Shares each member's raw fitness with the rest of the
    /// species, and updates the stagnation record.
    pub(super) fn score(&mut self) {
        let size = self.members.len() as f64;
        self.collective_fitness = 0.0;
        for member in &mut self.members {
            let adjusted = member.fitness() / size;
            member.set_adjusted_fitness(adjusted);
            self.collective_fitness += adjusted;
        }
        if self.collective_fitness > self.best_collective_fitness {
            self.best_collective_fitness = self.collective_fitness;
            self.generations_since_improvement = 0;
        } else {
            self.generations_since_improvement += 1;
        }
    }

    /// Sorts members by adjusted fitness, best first, and drops
    /// all but the top `survival_threshold` share of them
    /// (rounded up).
    pub(super) fn retain_survivors(&mut self, survival_threshold: f64) {
        self.members
            .sort_by(|a, b| b.adjusted_fitness().total_cmp(&a.adjusted_fitness()));
        let survivors = (self.members.len() as f64 * survival_threshold).ceil() as usize;
        self.members.truncate(survivors.max(1));
    }

    /// Returns a randomly chosen member to compare offspring against.
    pub(super) fn random_representative<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&G> {
        self.members.choose(rng).map(Specimen::genome)
    }

    /// Replaces the species' members with a new generation.
    pub(super) fn set_members(&mut self, members: Vec<Specimen<G>>) {
        self.members = members;
        self.collective_fitness = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn species(fitnesses: &[f64]) -> Species<usize> {
        let mut species = Species::new(SpeciesId(0));
        species.members = fitnesses
            .iter()
            .enumerate()
            .map(|(i, &f)| {
                let mut s = Specimen::new(i);
                s.set_fitness(f);
                s
            })
            .collect();
        species
    }

    #[test]
    fn score_shares_fitness() {
        let mut species = species(&[2.0, 4.0, 6.0, 8.0]);
        species.score();
        let adjusted: Vec<f64> = species.members().map(|m| m.adjusted_fitness()).collect();
        assert_eq!(adjusted, [0.5, 1.0, 1.5, 2.0]);
        assert_eq!(species.collective_fitness(), 5.0);
        assert_eq!(species.generations_since_improvement(), 0);
    }

    #[test]
    fn stagnation_counts_until_improvement() {
        let mut species = species(&[4.0, 4.0]);
        species.score();
        species.score();
        species.score();
        assert_eq!(species.generations_since_improvement(), 2);
        species.members[0].set_fitness(10.0);
        species.score();
        assert_eq!(species.generations_since_improvement(), 0);
        assert_eq!(species.best_collective_fitness(), 7.0);
    }

    #[test]
    fn survivors_are_rounded_up() {
        let mut species = species(&[1.0, 5.0, 3.0, 2.0, 4.0]);
        species.score();
        species.retain_survivors(0.5);
        let genomes: Vec<usize> = species.members().map(|m| *m.genome()).collect();
        assert_eq!(genomes, [1, 4, 2]);
    }

    #[test]
    fn champion_has_highest_raw_fitness() {
        let species = species(&[1.0, 5.0, 3.0]);
        assert_eq!(species.champion().map(|c| *c.genome()), Some(1));
    }
}
