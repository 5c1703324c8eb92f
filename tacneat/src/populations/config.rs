use serde::{Deserialize, Serialize};

use std::num::NonZeroUsize;

/// Configuration data for population generation
/// and evolution.
///
/// # Note
/// All quantities expressing probabilities
/// should be in the range [0.0, 1.0]. Using
/// values that are not in this bound may result
/// in odd behaviours and/or incorrect programs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PopulationConfig {
    /// Size of the population.
    pub size: NonZeroUsize,
    /// Compatibility distance threshold at the start of a run,
    /// beyond which genomes are considered as belonging to
    /// different species.
    pub initial_compatibility_threshold: f64,
    /// Step by which the compatibility threshold moves every
    /// generation to steer towards [`target_species_count`].
    /// The threshold never drops below this value.
    ///
    /// [`target_species_count`]: PopulationConfig::target_species_count
    pub compatibility_modifier: f64,
    /// Number of species the threshold adaptation aims for.
    pub target_species_count: usize,
    /// Number of generations without improvement of the summed
    /// species fitness after which only the two best species survive.
    pub mass_extinction_threshold: usize,
    /// Number of generations without improvement
    /// after which a species is removed.
    pub species_extinction_threshold: usize,
    /// Stagnant species are only removed while at least
    /// this many species exist.
    pub min_species_for_stagnation_cull: usize,
    /// Top % of each species which can participate
    /// in reproduction.
    pub survival_threshold: f64,
    /// Species with at most this many reproducing members do not
    /// pass their champion on unchanged, unless they hold the
    /// population's best member.
    pub min_species_size_for_elitism: usize,
    /// Share of each species' offspring produced by
    /// cloning and mutation instead of crossover.
    pub asexual_reproduction_share: f64,
    /// Chance that the second parent of a crossover is
    /// taken from another species.
    pub interspecies_mating_chance: f64,
    /// Number of ticks in the first generations' episodes.
    pub initial_lifetime: usize,
    /// Number of ticks added to the episode length
    /// every [`generations_between_lifetime_increase`].
    ///
    /// [`generations_between_lifetime_increase`]: PopulationConfig::generations_between_lifetime_increase
    pub lifetime_increase: usize,
    /// Number of generations between episode lengthenings.
    /// If zero, episodes keep their initial length.
    pub generations_between_lifetime_increase: usize,
}

impl PopulationConfig {
    /// Returns a "zero-valued" default configuration.
    /// All values are 0, or in the case of
    /// `NonZeroUsize`s, 1.
    ///
    /// # Note
    /// This value is not suitable for use in most experiments.
    /// It is meant as a way to abbreviate configuration
    /// instantiation, or to fill in unused values.
    ///
    /// # Examples
    /// ```
    /// use tacneat::PopulationConfig;
    ///
    /// let cfg = PopulationConfig {
    ///     // Specify some values here...
    ///     survival_threshold: 0.5,
    ///     // Default the rest...
    ///     ..PopulationConfig::zero()
    /// };
    /// ```
    pub fn zero() -> PopulationConfig {
        PopulationConfig {
            size: NonZeroUsize::new(1).unwrap(),
            initial_compatibility_threshold: 0.0,
            compatibility_modifier: 0.0,
            target_species_count: 0,
            mass_extinction_threshold: 0,
            species_extinction_threshold: 0,
            min_species_for_stagnation_cull: 0,
            survival_threshold: 0.0,
            min_species_size_for_elitism: 0,
            asexual_reproduction_share: 0.0,
            interspecies_mating_chance: 0.0,
            initial_lifetime: 0,
            lifetime_increase: 0,
            generations_between_lifetime_increase: 0,
        }
    }
}

impl Default for PopulationConfig {
    /// The tuned values of the patrol task.
    ///
    /// # Examples
    /// ```
    /// use tacneat::PopulationConfig;
    ///
    /// let config = PopulationConfig::default();
    /// assert_eq!(config.size.get(), 200);
    /// assert_eq!(config.target_species_count, 8);
    /// ```
    fn default() -> PopulationConfig {
        PopulationConfig {
            size: NonZeroUsize::new(200).unwrap(),
            initial_compatibility_threshold: 8.0,
            compatibility_modifier: 0.2,
            target_species_count: 8,
            mass_extinction_threshold: 30,
            species_extinction_threshold: 15,
            min_species_for_stagnation_cull: 5,
            survival_threshold: 0.5,
            min_species_size_for_elitism: 5,
            asexual_reproduction_share: 0.25,
            interspecies_mating_chance: 0.01,
            initial_lifetime: 3000,
            lifetime_increase: 500,
            generations_between_lifetime_increase: 5,
        }
    }
}
