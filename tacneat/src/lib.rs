//! An implementation of NeuroEvolution of Augmenting Topologies,
//! following the 2002 paper: <http://nn.cs.utexas.edu/keyword?stanley:ec02>,
//! tuned for evolving the controllers of agents living in a ticked simulation.
//!
//! User-defined genomic structures plug in via the `Genome` trait. A
//! [`Population`] groups them into species, shares fitness inside each
//! species, allots offspring among species, culls stagnant ones, and
//! adapts its compatibility threshold towards a target species count.
//! Fitness comes either from a plain evaluation function or from an
//! episode of a [`Simulation`], whose length grows as generations pass.
//! A layered neural genome is supplied via the
//! [`TacNEAT-NN`](https://crates.io/crates/tacneat-nn) crate.
//!
//! Runs are reproducible: every random draw comes from the
//! population's own seedable generator.
//!
//! # Example usage: Evolution of XOR function approximator, using `TacNEAT-NN`
//! ```
//! use tacneat::{Population, PopulationConfig};
//! use tacneat_nn::genomics::{GeneticConfig, LayeredGenome};
//! use std::num::NonZeroUsize;
//!
//! // Allowed error margin for neural net answers.
//! const ERROR_MARGIN: f64 = 0.3;
//!
//! fn evaluate_xor(genome: &LayeredGenome) -> f64 {
//!     let values = [
//!         ([0.0, 0.0], 0.0),
//!         ([0.0, 1.0], 1.0),
//!         ([1.0, 0.0], 1.0),
//!         ([1.0, 1.0], 0.0),
//!     ];
//!
//!     let mut errors = [0.0; 4];
//!     for (i, (input, output)) in values.iter().enumerate() {
//!         errors[i] = match genome.evaluate(input) {
//!             Ok(result) => (result[0] - output).abs(),
//!             Err(_) => 1.0,
//!         };
//!         if errors[i] < ERROR_MARGIN {
//!             errors[i] = 0.0;
//!         }
//!     }
//!
//!     (4.0 - errors.iter().sum::<f64>()).powi(2)
//! }
//!
//! fn main() {
//!     let genetic_config = GeneticConfig {
//!         input_count: NonZeroUsize::new(2).unwrap(),
//!         output_count: NonZeroUsize::new(1).unwrap(),
//!         weight_bound: 5.0,
//!         weight_perturbation_power: 2.5,
//!         add_connection_chance: 0.05,
//!         add_node_chance: 0.03,
//!         ..GeneticConfig::default()
//!     };
//!
//!     let population_config = PopulationConfig {
//!         size: NonZeroUsize::new(150).unwrap(),
//!         initial_compatibility_threshold: 3.0,
//!         compatibility_modifier: 0.3,
//!         target_species_count: 10,
//!         ..PopulationConfig::default()
//!     };
//!
//!     let mut population: Population<_, _, LayeredGenome> =
//!         Population::with_seed(population_config, genetic_config, 1);
//!     for _ in 0..20 {
//!         population.evaluate_fitness(evaluate_xor);
//!         if let Some(champion) = population.champion() {
//!             if (champion.fitness() - 16.0).abs() < f64::EPSILON {
//!                 println!("Solution found!:\n{}", champion.genome());
//!                 break;
//!             }
//!         }
//!         if let Err(e) = population.evolve() {
//!             eprintln!("{}", e);
//!             break;
//!         }
//!     }
//! }
//! ```

mod genome;
#[cfg(test)]
mod mock;
mod populations;

pub use genome::*;
pub use populations::*;
