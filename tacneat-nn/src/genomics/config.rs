use serde::{Deserialize, Serialize};

use std::num::NonZeroUsize;

/// How long entries of the innovation ledger stay valid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerPolicy {
    /// Identical mutations are only recognized as homologous
    /// within the generation they occur in.
    PerGeneration,
    /// The ledger grows for the whole run.
    Persistent,
}

/// Configuration data for genome generation
/// and inter-genome operations.
///
/// # Note
/// All quantities expressing probabilities
/// should be in the range [0.0, 1.0]. Using
/// values that are not in this bound may result
/// in odd behaviours and/or incorrect programs.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GeneticConfig {
    /// Number of inputs in a genome, not counting the bias.
    pub input_count: NonZeroUsize,
    /// Number of outputs in a genome.
    pub output_count: NonZeroUsize,
    /// Maximum magnitude of a connection's weight.
    /// Only its absolute value is used.
    pub weight_bound: f64,
    /// Chance that each enabled connection's weight
    /// is mutated during a mutation pass.
    pub weight_mutation_rate: f64,
    /// Chance that a weight mutation jitters the weight
    /// instead of reassigning it.
    pub weight_perturbation_chance: f64,
    /// Standard deviation of the Gaussian weight jitter.
    pub weight_perturbation_power: f64,
    /// Chance of a connection addition mutation during a mutation pass.
    pub add_connection_chance: f64,
    /// Chance of a node addition mutation during a mutation pass.
    pub add_node_chance: f64,
    /// Chance that a disabled connection stays disabled
    /// when inherited during crossover.
    pub disabled_gene_stays_disabled_chance: f64,
    /// Weight of excess genes in compatibility distance.
    pub excess_gene_factor: f64,
    /// Weight of disjoint genes in compatibility distance.
    pub disjoint_gene_factor: f64,
    /// Weight of the mean weight difference of matching
    /// genes in compatibility distance.
    pub common_weight_factor: f64,
    /// Lifetime of innovation ledger entries.
    pub ledger_policy: LedgerPolicy,
}

impl GeneticConfig {
    /// Returns a "zero-valued" default configuration.
    /// All values are 0, or in the case of
    /// `NonZeroUsize`s, 1. The ledger is scoped
    /// to one generation.
    ///
    /// # Examples
    /// ```
    /// use tacneat_nn::genomics::GeneticConfig;
    ///
    /// let config = GeneticConfig {
    ///     add_node_chance: 1.0,
    ///     ..GeneticConfig::zero()
    /// };
    /// ```
    pub fn zero() -> GeneticConfig {
        GeneticConfig {
            input_count: NonZeroUsize::new(1).unwrap(),
            output_count: NonZeroUsize::new(1).unwrap(),
            weight_bound: 0.0,
            weight_mutation_rate: 0.0,
            weight_perturbation_chance: 0.0,
            weight_perturbation_power: 0.0,
            add_connection_chance: 0.0,
            add_node_chance: 0.0,
            disabled_gene_stays_disabled_chance: 0.0,
            excess_gene_factor: 0.0,
            disjoint_gene_factor: 0.0,
            common_weight_factor: 0.0,
            ledger_policy: LedgerPolicy::PerGeneration,
        }
    }
}

impl Default for GeneticConfig {
    /// The tuned values of the patrol task: 17 sensors, 5 controls.
    fn default() -> GeneticConfig {
        GeneticConfig {
            input_count: NonZeroUsize::new(17).unwrap(),
            output_count: NonZeroUsize::new(5).unwrap(),
            weight_bound: 1.0,
            weight_mutation_rate: 0.1,
            weight_perturbation_chance: 0.8,
            weight_perturbation_power: 0.2,
            add_connection_chance: 0.09,
            add_node_chance: 0.06,
            disabled_gene_stays_disabled_chance: 0.75,
            excess_gene_factor: 1.0,
            disjoint_gene_factor: 1.0,
            common_weight_factor: 3.0,
            ledger_policy: LedgerPolicy::PerGeneration,
        }
    }
}
