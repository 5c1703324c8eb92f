use rand::Rng;

/// An interface for genomes that can be evolved by a [`Population`].
///
/// Every operation drawing random numbers receives the population's
/// generator, so that seeded runs are reproducible.
///
/// [`Population`]: crate::Population
pub trait Genome: Clone {
    type Config;
    type InnovationHistory: InnovationHistory<Config = Self::Config>;

    /// Returns a minimal, randomized genome.
    fn new<R: Rng + ?Sized>(config: &Self::Config, rng: &mut R) -> Self;

    /// Returns the compatibility distance between two genomes.
    /// Genomes closer than the population's compatibility
    /// threshold may share a species.
    fn compatibility_distance(first: &Self, second: &Self, config: &Self::Config) -> f64;

    /// Combines two genomes and returns a "child" genome.
    ///
    /// `better` is the fitter parent; if `equal_fitness` is set,
    /// neither parent should be favoured.
    fn crossover<R: Rng + ?Sized>(
        better: &Self,
        worse: &Self,
        equal_fitness: bool,
        config: &Self::Config,
        rng: &mut R,
    ) -> Self;

    /// Runs one full mutation pass over the genome, recording
    /// structural innovations in `history`.
    fn mutate<R: Rng + ?Sized>(
        &mut self,
        history: &mut Self::InnovationHistory,
        config: &Self::Config,
        rng: &mut R,
    );

    /// Records the genome's existing innovations in `history`.
    /// Called once on a genome seeding a population, so that
    /// innovations minted afterwards never collide with it.
    fn register_innovations(&self, history: &mut Self::InnovationHistory);
}

/// An Innovation History is used to keep track
/// of genetic innovations through successive
/// generations of genomes.
///
/// The exact function and utility of the
/// InnovationHistory is left to the implementor.
pub trait InnovationHistory {
    type Config;

    fn new(config: &Self::Config) -> Self;

    /// Called by the population once every generation is complete.
    fn advance_generation(&mut self);
}
