use serde::{Deserialize, Serialize};

/// The environment a population is evaluated in.
///
/// Members are numbered in the order of [`Population::specimens`].
/// During an episode, every active member acts once per tick, in
/// order, and the simulation clock only advances once all of them
/// have acted: no member sees another's action of the same tick.
///
/// [`Population::specimens`]: crate::Population::specimens
pub trait Simulation<G> {
    /// Prepares a new episode for the given genomes,
    /// typically building one controller per member.
    fn begin_episode(&mut self, genomes: &[&G]);

    /// Returns whether the member is still taking part.
    fn is_active(&self, member: usize) -> bool;

    /// Lets the member act on tick `tick`.
    fn act(&mut self, member: usize, tick: usize);

    /// Advances the shared clock past tick `tick`.
    fn end_tick(&mut self, tick: usize);

    /// Returns the raw fitness the member earned. Read once,
    /// when the episode is over.
    fn fitness(&self, member: usize) -> f64;
}

/// The outcome of one simulated episode.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EpisodeSummary {
    /// Number of ticks simulated.
    pub ticks: usize,
    /// Number of members still active at the end.
    pub survivors: usize,
    /// Highest raw fitness earned.
    pub best_fitness: f64,
}
