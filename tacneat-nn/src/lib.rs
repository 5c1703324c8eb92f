//! # TacNEAT-NN
//! A layered, evolving-topology neural genome implementing the
//! [`tacneat`](https://crates.io/crates/tacneat) crate's `Genome` trait.
//!
//! Provides the [`LayeredGenome`] type usable in `tacneat` `Population`s, the
//! innovation tracker ([`History`]) that keeps identical structural mutations
//! homologous across genomes, and the networks that can be executed from a genome:
//! - [`FeedForwardNetwork`]: the evolving-topology evaluator, reusable tick after tick.
//! - [`FixedTopologyNetwork`]: a dense layered perceptron used as a baseline.
//! - [`Brain`]: one call site over both.
//!
//! Every node carries a `layer` rank. Layers exist only to keep one valid
//! topological order around while the topology mutates: a connection always
//! runs from a lower layer to a strictly higher one, and the output nodes
//! share the single highest layer of their genome.
//!
//! [`LayeredGenome`]: crate::genomics::LayeredGenome
//! [`History`]: crate::genomics::History
//! [`FeedForwardNetwork`]: crate::networks::FeedForwardNetwork
//! [`FixedTopologyNetwork`]: crate::networks::FixedTopologyNetwork
//! [`Brain`]: crate::networks::Brain
//!
//! # Example usage: Evolution of an XOR solver
//! ```
//! use tacneat::{Population, PopulationConfig};
//! use tacneat_nn::genomics::{GeneticConfig, LayeredGenome};
//! use std::num::NonZeroUsize;
//!
//! fn evaluate_xor(genome: &LayeredGenome) -> f64 {
//!     let cases = [
//!         ([0.0, 0.0], 0.0),
//!         ([0.0, 1.0], 1.0),
//!         ([1.0, 0.0], 1.0),
//!         ([1.0, 1.0], 0.0),
//!     ];
//!
//!     let error: f64 = cases
//!         .iter()
//!         .map(|(inputs, expected)| (genome.evaluate(inputs).unwrap()[0] - expected).abs())
//!         .sum();
//!
//!     (4.0 - error).powi(2)
//! }
//!
//! let genetic_config = GeneticConfig {
//!     input_count: NonZeroUsize::new(2).unwrap(),
//!     output_count: NonZeroUsize::new(1).unwrap(),
//!     ..GeneticConfig::default()
//! };
//! let population_config = PopulationConfig {
//!     size: NonZeroUsize::new(50).unwrap(),
//!     ..PopulationConfig::default()
//! };
//!
//! let mut population: Population<_, _, LayeredGenome> =
//!     Population::with_seed(population_config, genetic_config, 7);
//! for _ in 0..5 {
//!     population.evaluate_fitness(evaluate_xor);
//!     population.evolve().unwrap();
//! }
//! assert_eq!(population.specimens().count(), 50);
//! ```

pub mod genomics;
pub mod networks;

/// Identifier type used to designate historically
/// identical mutations for the purposes of
/// genome comparison and genetic tracking.
pub type Innovation = usize;

/// Identifier of a node within a genome lineage.
pub type NodeId = usize;

/// The steep sigmoid used by every evolving-topology node.
///
/// # Examples
/// ```
/// use tacneat_nn::steep_sigmoid;
///
/// assert_eq!(steep_sigmoid(0.0), 0.5);
/// assert!(steep_sigmoid(2.0) > 0.99);
/// ```
pub fn steep_sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-4.9 * x).exp())
}
