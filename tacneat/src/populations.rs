//! A Population is a collection of genomes.
//! These are grouped into species, which can
//! be evolved using either a genome evaluation function
//! or a ticked [`Simulation`] as the source of selective pressure.
mod config;
mod episode;
mod errors;
pub mod logging;
mod offspring_factory;
mod report;
mod species;
mod specimen;

use crate::{Genome, InnovationHistory};
pub use config::PopulationConfig;
pub use episode::{EpisodeSummary, Simulation};
pub use errors::EvolutionError;
use offspring_factory::OffspringFactory;
pub use report::GenerationReport;
pub use species::{Species, SpeciesId};
pub use specimen::Specimen;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info};

/// A population of genomes.
///
/// All randomness used while evolving comes from the population's
/// own generator, so two populations built with the same seed and
/// fed the same fitnesses evolve identically.
pub struct Population<C, H, G> {
    species: Vec<Species<G>>,
    history: H,
    generation: usize,
    next_species_id: usize,
    best_population_fitness: f64,
    generations_since_improvement: usize,
    compatibility_threshold: f64,
    lifetime: usize,
    last_episode: Option<EpisodeSummary>,
    population_config: PopulationConfig,
    genetic_config: C,
    rng: StdRng,
}

impl<C, H, G> Population<C, H, G>
where
    G: Genome<InnovationHistory = H, Config = C>,
    H: InnovationHistory<Config = C>,
{
    /// Creates a new population of randomized genomes
    /// using the passed configurations.
    ///
    /// The type of `genetic_config` depends on the implementation
    /// of [`Genome`], and is effectively opaque to the population.
    ///
    /// [`Genome`]: crate::Genome
    ///
    /// # Examples
    /// ```
    /// # use tacneat_nn::genomics::{GeneticConfig, LayeredGenome as G};
    /// use tacneat::{Population, PopulationConfig};
    ///
    /// let pop_config = PopulationConfig {
    ///     // Set desired configuration
    ///     ..PopulationConfig::zero()
    /// };
    /// # let genetic_config = GeneticConfig::zero();
    ///
    /// // With `G` a suitable type implementing `Genome`...
    /// let population = Population::<_, _, G>::new(pop_config, genetic_config);
    /// assert_eq!(population.species().count(), 1);
    /// ```
    pub fn new(population_config: PopulationConfig, genetic_config: C) -> Population<C, H, G> {
        Self::with_rng(population_config, genetic_config, StdRng::from_entropy())
    }

    /// Like [`new`], but with a seeded random number generator.
    ///
    /// [`new`]: Population::new
    pub fn with_seed(
        population_config: PopulationConfig,
        genetic_config: C,
        seed: u64,
    ) -> Population<C, H, G> {
        Self::with_rng(population_config, genetic_config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(
        population_config: PopulationConfig,
        genetic_config: C,
        mut rng: StdRng,
    ) -> Population<C, H, G> {
        let members = (0..population_config.size.get())
            .map(|_| Specimen::new(G::new(&genetic_config, &mut rng)))
            .collect();
        let history = H::new(&genetic_config);
        Self::from_members(members, history, population_config, genetic_config, rng)
    }

    /// Creates a population made of copies of a single genome,
    /// e.g. a champion loaded from a previous run.
    ///
    /// The genome's innovations are registered in the new
    /// population's history, so that later mutations never
    /// reuse its markings for different structures.
    ///
    /// # Examples
    /// ```
    /// # use tacneat_nn::genomics::{GeneticConfig, LayeredGenome};
    /// use tacneat::{Population, PopulationConfig};
    /// use std::num::NonZeroUsize;
    ///
    /// # let genetic_config = GeneticConfig::zero();
    /// # let base = LayeredGenome::new(&genetic_config, &mut rand::thread_rng());
    /// let pop_config = PopulationConfig {
    ///     size: NonZeroUsize::new(10).unwrap(),
    ///     ..PopulationConfig::zero()
    /// };
    /// // With `base` a previously evolved genome...
    /// let population = Population::new_seeded(base.clone(), pop_config, genetic_config);
    /// assert!(population.genomes().all(|g| g == &base));
    /// ```
    pub fn new_seeded(
        base: G,
        population_config: PopulationConfig,
        genetic_config: C,
    ) -> Population<C, H, G> {
        Self::from_base(base, population_config, genetic_config, StdRng::from_entropy())
    }

    /// Like [`new_seeded`], but with a seeded random number generator.
    ///
    /// [`new_seeded`]: Population::new_seeded
    pub fn new_seeded_with_seed(
        base: G,
        population_config: PopulationConfig,
        genetic_config: C,
        seed: u64,
    ) -> Population<C, H, G> {
        Self::from_base(
            base,
            population_config,
            genetic_config,
            StdRng::seed_from_u64(seed),
        )
    }

    fn from_base(
        base: G,
        population_config: PopulationConfig,
        genetic_config: C,
        rng: StdRng,
    ) -> Population<C, H, G> {
        let mut history = H::new(&genetic_config);
        base.register_innovations(&mut history);
        let members = (0..population_config.size.get())
            .map(|_| Specimen::new(base.clone()))
            .collect();
        Self::from_members(members, history, population_config, genetic_config, rng)
    }

    fn from_members(
        members: Vec<Specimen<G>>,
        history: H,
        population_config: PopulationConfig,
        genetic_config: C,
        rng: StdRng,
    ) -> Population<C, H, G> {
        let mut s0 = Species::new(SpeciesId(0));
        s0.set_members(members);
        Population {
            species: vec![s0],
            history,
            generation: 0,
            next_species_id: 1,
            best_population_fitness: 0.0,
            generations_since_improvement: 0,
            compatibility_threshold: population_config.initial_compatibility_threshold,
            lifetime: population_config.initial_lifetime,
            last_episode: None,
            population_config,
            genetic_config,
            rng,
        }
    }

    /// Replaces the population's random number generator
    /// with one seeded from `seed`.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    /// Evaluates the fitness of each genome in the
    /// population using the passed evaluator.
    ///
    /// The return value of the evaluation function
    /// should be non-negative; [`evolve`] rejects
    /// anything else.
    ///
    /// [`evolve`]: Population::evolve
    ///
    /// # Examples
    /// ```
    /// # use tacneat_nn::genomics::{GeneticConfig, LayeredGenome as G};
    /// use tacneat::{Population, PopulationConfig};
    ///
    /// # let genetic_config = GeneticConfig::zero();
    /// let mut population = Population::<_, _, G>::new(
    ///     PopulationConfig::zero(),
    ///     genetic_config,
    /// );
    ///
    /// population.evaluate_fitness(|g| {
    ///     # let fitness = 1.0 - g.evaluate(&[1.0]).unwrap()[0];
    ///     // Compute genome's fitness...
    ///     return fitness;
    /// });
    /// ```
    pub fn evaluate_fitness<E>(&mut self, mut evaluator: E)
    where
        E: FnMut(&G) -> f64,
    {
        for specimen in self.specimens_mut() {
            let fitness = evaluator(specimen.genome());
            specimen.set_fitness(fitness);
        }
    }

    /// Runs one episode of `simulation` over the whole population.
    ///
    /// Ticks are simulated until either no member is active anymore
    /// or the population's current [lifetime] is reached. Each
    /// member's fitness is then read back from the simulation.
    ///
    /// [lifetime]: Population::lifetime
    pub fn run_episode<S: Simulation<G>>(&mut self, simulation: &mut S) -> EpisodeSummary {
        let genomes: Vec<&G> = self.genomes().collect();
        let count = genomes.len();
        simulation.begin_episode(&genomes);

        let mut ticks = 0;
        while ticks < self.lifetime && (0..count).any(|m| simulation.is_active(m)) {
            for member in 0..count {
                if simulation.is_active(member) {
                    simulation.act(member, ticks);
                }
            }
            simulation.end_tick(ticks);
            ticks += 1;
        }

        let mut best_fitness = 0.0;
        for (member, specimen) in self.specimens_mut().enumerate() {
            let fitness = simulation.fitness(member);
            specimen.set_fitness(fitness);
            best_fitness = f64::max(best_fitness, fitness);
        }
        let survivors = (0..count).filter(|&m| simulation.is_active(m)).count();

        let summary = EpisodeSummary {
            ticks,
            survivors,
            best_fitness,
        };
        info!(
            generation = self.generation,
            ticks, survivors, best_fitness, "episode finished"
        );
        self.last_episode = Some(summary);
        summary
    }

    /// Evolves the population into its next generation.
    ///
    /// Species share their members' fitness, stagnant species are
    /// culled, and each remaining species receives offspring in
    /// proportion to its collective fitness. Offspring are then
    /// speciated against a random member of each species of the
    /// previous generation.
    ///
    /// # Errors
    /// Returns an error, leaving the population untouched, if it
    /// has no members or any member's fitness is negative or NaN.
    ///
    /// # Examples
    /// ```
    /// # use tacneat_nn::genomics::{GeneticConfig, LayeredGenome as G};
    /// use tacneat::{Population, PopulationConfig};
    ///
    /// # let genetic_config = GeneticConfig::zero();
    /// // With `G` a suitable type implementing `Genome`...
    /// let mut population = Population::<_, _, G>::new(
    ///     PopulationConfig {
    ///         survival_threshold: 1.0,
    ///         initial_compatibility_threshold: 3.0,
    ///         ..PopulationConfig::zero()
    ///     },
    ///     genetic_config,
    /// );
    ///
    /// population.evaluate_fitness(|g| {
    ///     # let fitness = 1.0 - g.evaluate(&[1.0]).unwrap()[0];
    ///     // Compute genome's fitness...
    ///     return fitness;
    /// });
    ///
    /// match population.evolve() {
    ///     Ok(report) => println!("{}", report),
    ///     Err(e) => eprintln!("{}", e),
    /// }
    /// ```
    pub fn evolve(&mut self) -> Result<GenerationReport, EvolutionError> {
        self.check_fitness()?;

        let (best_fitness, best_species) = self.score();
        let mut extinct_species = vec![];
        let mass_extinction = self.cull(best_species, &mut extinct_species);

        let collective_fitnesses: Vec<f64> = self
            .species
            .iter()
            .map(Species::collective_fitness)
            .collect();
        let allotted_offspring =
            allot_offspring(&collective_fitnesses, self.population_config.size.get());

        for species in &mut self.species {
            species.retain_survivors(self.population_config.survival_threshold);
        }
        let offspring = OffspringFactory::new(
            &self.species,
            &mut self.history,
            &self.genetic_config,
            &self.population_config,
            &mut self.rng,
        )
        .generate_offspring(&allotted_offspring, best_species);

        self.adjust_compatibility_threshold();
        self.respeciate(offspring);
        self.remove_extinct_species(&mut extinct_species);

        let report = GenerationReport {
            generation: self.generation,
            species_count: self.species.len(),
            best_fitness,
            best_species,
            extinct_species,
            mass_extinction,
        };
        info!(
            generation = self.generation,
            best_fitness,
            best_species = %best_species,
            species = self.species.len(),
            threshold = self.compatibility_threshold,
            "generation evolved"
        );

        self.generation += 1;
        let every = self.population_config.generations_between_lifetime_increase;
        if every > 0 && self.generation % every == 0 {
            self.lifetime += self.population_config.lifetime_increase;
            info!(lifetime = self.lifetime, "episode lifetime increased");
        }
        self.history.advance_generation();
        self.last_episode = None;

        Ok(report)
    }

    /// Rejects populations that cannot be evolved.
    fn check_fitness(&self) -> Result<(), EvolutionError> {
        if self.species.iter().all(Species::is_empty) {
            return Err(EvolutionError::EmptyPopulation);
        }
        for species in &self.species {
            if let Some(invalid) = species
                .members()
                .find(|m| m.fitness().is_nan() || m.fitness() < 0.0)
            {
                return Err(EvolutionError::InvalidFitness {
                    species: species.id(),
                    fitness: invalid.fitness(),
                });
            }
        }
        Ok(())
    }

    /// Scores every species, tracks the population's improvement,
    /// and returns the best raw fitness along with its species.
    fn score(&mut self) -> (f64, SpeciesId) {
        let mut population_fitness = 0.0;
        let mut best = (f64::NEG_INFINITY, SpeciesId(0));
        for species in &mut self.species {
            species.score();
            population_fitness += species.collective_fitness();
            if let Some(champion) = species.champion() {
                if champion.fitness() > best.0 {
                    best = (champion.fitness(), species.id());
                }
            }
        }

        if population_fitness > self.best_population_fitness {
            self.best_population_fitness = population_fitness;
            self.generations_since_improvement = 0;
        } else {
            self.generations_since_improvement += 1;
        }
        best
    }

    /// Sorts species by collective fitness and removes the stagnant
    /// ones. Returns whether a mass extinction took place.
    ///
    /// The species holding the best member is never
    /// removed for its own stagnation.
    fn cull(&mut self, best_species: SpeciesId, extinct: &mut Vec<SpeciesId>) -> bool {
        self.species
            .sort_by(|a, b| b.collective_fitness().total_cmp(&a.collective_fitness()));

        let mass_threshold = self.population_config.mass_extinction_threshold;
        if mass_threshold > 0 && self.generations_since_improvement >= mass_threshold {
            let kept = self.species.len().min(2);
            extinct.extend(self.species.drain(kept..).map(|s| s.id()));
            self.generations_since_improvement = 0;
            info!(
                generation = self.generation,
                removed = extinct.len(),
                "mass extinction"
            );
            return true;
        }

        let species_threshold = self.population_config.species_extinction_threshold;
        if species_threshold > 0
            && self.species.len() >= self.population_config.min_species_for_stagnation_cull
        {
            self.species.retain(|s| {
                let stagnant = s.id() != best_species
                    && s.generations_since_improvement() >= species_threshold;
                if stagnant {
                    info!(species = %s.id(), "stagnant species removed");
                    extinct.push(s.id());
                }
                !stagnant
            });
        }
        false
    }

    /// Moves the compatibility threshold towards
    /// the targeted number of species.
    fn adjust_compatibility_threshold(&mut self) {
        let count = self.species.len();
        let target = self.population_config.target_species_count;
        let modifier = self.population_config.compatibility_modifier;
        if count > target {
            self.compatibility_threshold += modifier;
        } else if count < target {
            self.compatibility_threshold = (self.compatibility_threshold - modifier).max(modifier);
        }
        debug!(
            threshold = self.compatibility_threshold,
            species = count,
            "compatibility threshold adjusted"
        );
    }

    /// Assigns each child to the first species whose representative
    /// is close enough, or founds a new species with it.
    fn respeciate(&mut self, offspring: Vec<Specimen<G>>) {
        let rng = &mut self.rng;
        let mut representatives: Vec<Option<G>> = self
            .species
            .iter()
            .map(|s| s.random_representative(rng).cloned())
            .collect();
        let mut assignments: Vec<Vec<Specimen<G>>> = self.species.iter().map(|_| vec![]).collect();

        for child in offspring {
            let compatible = representatives.iter().position(|r| {
                r.as_ref().map_or(false, |r| {
                    G::compatibility_distance(r, child.genome(), &self.genetic_config)
                        < self.compatibility_threshold
                })
            });
            match compatible {
                Some(index) => assignments[index].push(child),
                None => {
                    let id = SpeciesId(self.next_species_id);
                    self.next_species_id += 1;
                    debug!(species = %id, "new species");
                    self.species.push(Species::new(id));
                    representatives.push(Some(child.genome().clone()));
                    assignments.push(vec![child]);
                }
            }
        }

        for (species, members) in self.species.iter_mut().zip(assignments) {
            species.set_members(members);
        }
    }

    /// Removes all species left without members.
    fn remove_extinct_species(&mut self, extinct: &mut Vec<SpeciesId>) {
        self.species.retain(|s| {
            if s.is_empty() {
                info!(species = %s.id(), "species left without members");
                extinct.push(s.id());
            }
            !s.is_empty()
        });
        self.species.sort_unstable_by_key(|s| s.id());
    }

    /// Returns the currently best-performing member, if any.
    ///
    /// # Examples
    /// ```
    /// # use tacneat_nn::genomics::{GeneticConfig, LayeredGenome as G};
    /// use tacneat::{Population, PopulationConfig};
    ///
    /// # let genetic_config = GeneticConfig::zero();
    /// // With `G` a suitable type implementing `Genome`...
    /// let mut population = Population::<_, _, G>::new(
    ///     PopulationConfig {
    ///         size: std::num::NonZeroUsize::new(20).unwrap(),
    ///         ..PopulationConfig::zero()
    ///     },
    ///     genetic_config,
    /// );
    ///
    /// let mut fitness = 0.0;
    /// population.evaluate_fitness(move |_| {
    ///     fitness += 10.0;
    ///     fitness
    /// });
    ///
    /// assert_eq!(population.champion().map(|c| c.fitness()), Some(20.0 * 10.0));
    /// ```
    pub fn champion(&self) -> Option<&Specimen<G>> {
        self.specimens()
            .max_by(|a, b| a.fitness().total_cmp(&b.fitness()))
    }

    /// Returns an iterator over the species champions
    /// carried over unchanged from the previous generation.
    pub fn champions(&self) -> impl Iterator<Item = &Specimen<G>> {
        self.specimens().filter(|s| s.is_champion())
    }

    /// Returns whether the last episode ended with no active member.
    pub fn is_extinct(&self) -> bool {
        self.last_episode.map_or(false, |e| e.survivors == 0)
    }

    /// Returns the summary of the current generation's episode,
    /// if one was run.
    pub fn last_episode(&self) -> Option<&EpisodeSummary> {
        self.last_episode.as_ref()
    }

    /// Returns an iterator over all current members, in the
    /// order used to number them during episodes.
    pub fn specimens(&self) -> impl Iterator<Item = &Specimen<G>> {
        self.species.iter().flat_map(|s| &s.members)
    }

    /// Returns a mutable iterator over all current members,
    /// for setting their fitness directly.
    pub fn specimens_mut(&mut self) -> impl Iterator<Item = &mut Specimen<G>> {
        self.species.iter_mut().flat_map(|s| &mut s.members)
    }

    /// Returns an iterator over all current genomes.
    ///
    /// # Examples
    /// ```
    /// # use tacneat_nn::genomics::{GeneticConfig, LayeredGenome as G};
    /// use tacneat::{Population, PopulationConfig};
    ///
    /// # let genetic_config = GeneticConfig::zero();
    /// // With `G` a suitable type implementing `Genome`...
    /// let population = Population::<_, _, G>::new(PopulationConfig::zero(), genetic_config);
    ///
    /// for genome in population.genomes() {
    ///     println!("{}", genome);
    /// }
    /// ```
    pub fn genomes(&self) -> impl Iterator<Item = &G> {
        self.specimens().map(Specimen::genome)
    }

    /// Returns an iterator over all current species.
    ///
    /// # Examples
    /// ```
    /// # use tacneat_nn::genomics::{GeneticConfig, LayeredGenome as G};
    /// use tacneat::{Population, PopulationConfig};
    ///
    /// # let genetic_config = GeneticConfig::zero();
    /// // With `G` a suitable type implementing `Genome`...
    /// let population = Population::<_, _, G>::new(PopulationConfig::zero(), genetic_config);
    ///
    /// for species in population.species() {
    ///     println!("Species {} has {} members", species.id(), species.len());
    /// }
    /// ```
    pub fn species(&self) -> impl Iterator<Item = &Species<G>> {
        self.species.iter()
    }

    /// Returns the species with the given ID, if it still exists.
    pub fn species_by_id(&self, id: SpeciesId) -> Option<&Species<G>> {
        self.species.iter().find(|s| s.id() == id)
    }

    /// Returns the current generation number.
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// Returns the maximum number of ticks of an episode.
    pub fn lifetime(&self) -> usize {
        self.lifetime
    }

    /// Returns the current compatibility threshold.
    pub fn compatibility_threshold(&self) -> f64 {
        self.compatibility_threshold
    }

    /// Returns the population's innovation history.
    pub fn history(&self) -> &H {
        &self.history
    }

    /// Returns the population's configuration.
    pub fn population_config(&self) -> &PopulationConfig {
        &self.population_config
    }

    /// Returns the configuration passed to the genomes.
    pub fn genetic_config(&self) -> &C {
        &self.genetic_config
    }
}

/// Splits `target` offspring among species in proportion to their
/// collective fitness, using largest remainders so that the
/// allotments always sum to `target`.
///
/// If no species has any fitness, offspring are split evenly,
/// with the remainder going to the first species.
///
/// # Examples
/// ```
/// use tacneat::allot_offspring;
///
/// assert_eq!(allot_offspring(&[3.0, 1.0], 10), [8, 2]);
/// assert_eq!(allot_offspring(&[0.0, 0.0, 0.0], 10), [4, 3, 3]);
/// ```
pub fn allot_offspring(fitnesses: &[f64], target: usize) -> Vec<usize> {
    if fitnesses.is_empty() {
        return vec![];
    }
    let total: f64 = fitnesses.iter().sum();
    if !(total > 0.0 && total.is_finite()) {
        let mut allotted = vec![target / fitnesses.len(); fitnesses.len()];
        allotted[0] += target % fitnesses.len();
        return allotted;
    }

    let mut truncated: Vec<(usize, usize, f64)> = fitnesses
        .iter()
        .enumerate()
        .map(|(i, f)| {
            let share = f / total * target as f64;
            let u = share.floor();
            (i, u as usize, share - u)
        })
        .collect();
    let truncated_sum: usize = truncated.iter().map(|(_, u, _)| *u).sum();
    let mut remainder = target.saturating_sub(truncated_sum);
    // Sort in decreasing order of error
    truncated.sort_by(|a, b| b.2.total_cmp(&a.2));
    while remainder > 0 {
        for (_, u, _) in truncated.iter_mut().take(remainder) {
            *u += 1;
        }
        remainder = remainder.saturating_sub(truncated.len());
    }
    truncated.sort_by_key(|(i, ..)| *i);
    truncated.iter().map(|(_, u, _)| *u).collect()
}
