use super::{PopulationConfig, Species, SpeciesId, Specimen};
use crate::Genome;

use rand::prelude::{Rng, SliceRandom};
use tracing::trace;

/// Auxiliary type for offspring generation.
/// Handles all the tasks of generating a population's
/// offspring according to the specified configs
/// and allotted offspring.
///
/// Species are expected to hold only their reproducing
/// members, sorted best first.
pub(super) struct OffspringFactory<'a, G: Genome, R: ?Sized> {
    species: &'a [Species<G>],
    history: &'a mut G::InnovationHistory,
    genetic_config: &'a G::Config,
    population_config: &'a PopulationConfig,
    rng: &'a mut R,
}

impl<'a, G: Genome, R: Rng + ?Sized> OffspringFactory<'a, G, R> {
    pub(super) fn new(
        species: &'a [Species<G>],
        history: &'a mut G::InnovationHistory,
        genetic_config: &'a G::Config,
        population_config: &'a PopulationConfig,
        rng: &'a mut R,
    ) -> OffspringFactory<'a, G, R> {
        OffspringFactory {
            species,
            history,
            genetic_config,
            population_config,
            rng,
        }
    }

    /// Generates the allotted offspring of every species.
    ///
    /// A species' champion is carried over unchanged if the species
    /// is large enough or holds the population's best member. A share
    /// of the remaining slots is filled by mutated clones, the rest by
    /// mutated crossover children.
    pub(super) fn generate_offspring(
        &mut self,
        allotted_offspring: &[usize],
        best_species: SpeciesId,
    ) -> Vec<Specimen<G>> {
        let all_species = self.species;
        let mut offspring = Vec::with_capacity(allotted_offspring.iter().sum());

        for (index, &allotted) in allotted_offspring.iter().enumerate() {
            let species = &all_species[index];
            if allotted == 0 || species.is_empty() {
                continue;
            }
            let mut remaining = allotted;
            let mut asexual = (allotted as f64 * self.population_config.asexual_reproduction_share)
                .floor() as usize;

            let keeps_champion = species.len() > self.population_config.min_species_size_for_elitism
                || species.id() == best_species;
            if let Some(champion) = species.members.first().filter(|_| keeps_champion) {
                offspring.push(Specimen::champion(
                    champion.genome().clone(),
                    species.id(),
                    champion.fitness(),
                ));
                remaining -= 1;
            }

            for _ in 0..remaining {
                let child = if asexual > 0 {
                    asexual -= 1;
                    Self::select_parent(species, self.rng).map(|p| p.genome().clone())
                } else {
                    self.crossover(index)
                };
                if let Some(mut child) = child {
                    child.mutate(self.history, self.genetic_config, self.rng);
                    offspring.push(Specimen::new(child));
                }
            }
        }

        offspring
    }

    /// Picks two parents, the second one possibly from another
    /// species, and returns their child.
    fn crossover(&mut self, species_index: usize) -> Option<G> {
        let all_species = self.species;
        let species = &all_species[species_index];
        let first = Self::select_parent(species, self.rng)?;

        let partner_species = if all_species.len() > 1
            && self.rng.gen::<f64>() < self.population_config.interspecies_mating_chance
        {
            let mut other = self.rng.gen_range(0..all_species.len() - 1);
            if other >= species_index {
                other += 1;
            }
            trace!(
                species = %species.id(),
                partner = %all_species[other].id(),
                "interspecies mating"
            );
            &all_species[other]
        } else {
            species
        };
        let second = Self::select_parent(partner_species, self.rng).unwrap_or(first);

        let (a, b) = (first.adjusted_fitness(), second.adjusted_fitness());
        let (better, worse) = if a >= b { (first, second) } else { (second, first) };
        Some(G::crossover(
            better.genome(),
            worse.genome(),
            a == b,
            self.genetic_config,
            self.rng,
        ))
    }

    /// Roulette selection weighted by squared raw fitness.
    /// Falls back to a uniform pick if no member has any fitness.
    /// The same member may be selected more than once.
    fn select_parent<'s>(species: &'s Species<G>, rng: &mut R) -> Option<&'s Specimen<G>> {
        let members = &species.members;
        let total: f64 = members.iter().map(|m| m.fitness().powi(2)).sum();
        if !(total > 0.0 && total.is_finite()) {
            return members.choose(rng);
        }
        let pick = rng.gen_range(0.0..=total);
        let mut running = 0.0;
        for member in members {
            running += member.fitness().powi(2);
            if running >= pick {
                return Some(member);
            }
        }
        members.last()
    }
}
