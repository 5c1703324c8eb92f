use crate::genomics::{GeneticConfig, LedgerPolicy};
use crate::{Innovation, NodeId};

use ahash::RandomState;
use serde::{Deserialize, Serialize};
use tacneat::InnovationHistory;

use std::collections::HashMap;

/// A `History` keeps track of connection and node innovations
/// in a population, in order to make sure identical mutations
/// are assigned the same historical markings.
///
/// For connection innovations the origin and destination nodes
/// identify identical mutations. For node innovations the split
/// connection's marking does, and the new node's id is recorded.
///
/// Genesis connections (and connections of registered genomes)
/// are remembered for the whole run. Mutation entries live in
/// the ledger, whose lifetime is set by the configured
/// [`LedgerPolicy`]. The marking and node counters themselves
/// never go back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct History {
    next_marking: Innovation,
    next_node: NodeId,
    policy: LedgerPolicy,
    standing: HashMap<(NodeId, NodeId), Innovation, RandomState>,
    connection_ledger: HashMap<(NodeId, NodeId), Innovation, RandomState>,
    node_ledger: HashMap<Innovation, NodeId, RandomState>,
}

impl InnovationHistory for History {
    type Config = GeneticConfig;

    fn new(config: &GeneticConfig) -> History {
        Self::new(config)
    }

    fn advance_generation(&mut self) {
        Self::advance_generation(self)
    }
}

impl History {
    /// Creates a new History using the specified configuration.
    ///
    /// Genesis connections are given the marking `i ⨯ output_count + o`,
    /// where `i` is the index of their input node (the bias being 0)
    /// and `o` the index of their output node. Markings minted by
    /// mutation thus start at `(input_count + 1) ⨯ output_count`.
    ///
    /// # Examples
    /// ```
    /// use tacneat_nn::genomics::{GeneticConfig, History};
    /// use std::num::NonZeroUsize;
    ///
    /// let config = GeneticConfig {
    ///     input_count: NonZeroUsize::new(3).unwrap(),
    ///     output_count: NonZeroUsize::new(2).unwrap(),
    ///     ..GeneticConfig::zero()
    /// };
    /// let history = History::new(&config);
    ///
    /// assert_eq!(history.next_marking(), 8);
    /// assert_eq!(history.next_node(), 6);
    /// ```
    pub fn new(config: &GeneticConfig) -> History {
        let inputs = config.input_count.get() + 1;
        let outputs = config.output_count.get();
        let standing = (0..inputs)
            .flat_map(|i| (0..outputs).map(move |o| ((i, inputs + o), i * outputs + o)))
            .collect();
        History {
            next_marking: inputs * outputs,
            next_node: inputs + outputs,
            policy: config.ledger_policy,
            standing,
            connection_ledger: HashMap::default(),
            node_ledger: HashMap::default(),
        }
    }

    /// Returns the marking already assigned to a connection between
    /// `origin` and `destination`, if any.
    pub fn lookup_connection(&self, origin: NodeId, destination: NodeId) -> Option<Innovation> {
        self.connection_ledger
            .get(&(origin, destination))
            .or_else(|| self.standing.get(&(origin, destination)))
            .copied()
    }

    /// Returns the marking for a connection between `origin` and
    /// `destination`, minting and recording a new one if the pair
    /// has not been seen.
    pub(crate) fn connection_marking(&mut self, origin: NodeId, destination: NodeId) -> Innovation {
        if let Some(marking) = self.lookup_connection(origin, destination) {
            return marking;
        }
        let marking = self.next_marking;
        self.next_marking += 1;
        self.connection_ledger.insert((origin, destination), marking);
        marking
    }

    /// Returns the id of the node created by splitting the connection
    /// with marking `split`.
    ///
    /// If the split is already recorded but `is_taken` reports its node
    /// as present in the mutating genome (which split the same connection
    /// before), a fresh id is minted and replaces the record.
    pub(crate) fn split_node(
        &mut self,
        split: Innovation,
        is_taken: impl Fn(NodeId) -> bool,
    ) -> NodeId {
        if let Some(&node) = self.node_ledger.get(&split) {
            if !is_taken(node) {
                return node;
            }
        }
        let node = self.next_node;
        self.next_node += 1;
        self.node_ledger.insert(split, node);
        node
    }

    /// Records a connection found in a genome that did not originate
    /// from this history, and makes sure its marking is never minted again.
    pub(crate) fn register_connection(
        &mut self,
        origin: NodeId,
        destination: NodeId,
        marking: Innovation,
    ) {
        self.standing.entry((origin, destination)).or_insert(marking);
        self.next_marking = self.next_marking.max(marking + 1);
    }

    /// Makes sure node id `node` is never minted again.
    pub(crate) fn reserve_node(&mut self, node: NodeId) {
        self.next_node = self.next_node.max(node + 1);
    }

    /// Closes the current generation. Under
    /// [`LedgerPolicy::PerGeneration`] the mutation ledger is cleared,
    /// so identical mutations in later generations are told apart.
    ///
    /// # Examples
    /// ```
    /// use tacneat_nn::genomics::{GeneticConfig, History, LayeredGenome, LedgerPolicy};
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha8Rng;
    ///
    /// let config = GeneticConfig {
    ///     weight_bound: 1.0,
    ///     ledger_policy: LedgerPolicy::PerGeneration,
    ///     ..GeneticConfig::zero()
    /// };
    /// let mut rng = ChaCha8Rng::seed_from_u64(0);
    /// let mut history = History::new(&config);
    /// let mut genome = LayeredGenome::new(&config, &mut rng);
    ///
    /// genome.mutate_add_node(&mut history, &mut rng).unwrap();
    /// assert_eq!(history.connection_innovations().count(), 2);
    ///
    /// history.advance_generation();
    /// assert_eq!(history.connection_innovations().count(), 0);
    /// ```
    pub fn advance_generation(&mut self) {
        if self.policy == LedgerPolicy::PerGeneration {
            self.connection_ledger.clear();
            self.node_ledger.clear();
        }
    }

    /// Returns the marking the next new connection will receive.
    pub fn next_marking(&self) -> Innovation {
        self.next_marking
    }

    /// Returns the id the next new node will receive.
    pub fn next_node(&self) -> NodeId {
        self.next_node
    }

    /// Returns the ledger's lifetime policy.
    pub fn policy(&self) -> LedgerPolicy {
        self.policy
    }

    /// Returns an iterator over the connection mutations in the ledger,
    /// in the format `((origin, destination), marking)`.
    /// No ordering is guaranteed.
    pub fn connection_innovations(
        &self,
    ) -> impl Iterator<Item = (&(NodeId, NodeId), &Innovation)> {
        self.connection_ledger.iter()
    }

    /// Returns an iterator over the node mutations in the ledger,
    /// in the format `(split connection, new node)`.
    /// No ordering is guaranteed.
    pub fn node_innovations(&self) -> impl Iterator<Item = (&Innovation, &NodeId)> {
        self.node_ledger.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::num::NonZeroUsize;

    fn config(policy: LedgerPolicy) -> GeneticConfig {
        GeneticConfig {
            input_count: NonZeroUsize::new(3).unwrap(),
            output_count: NonZeroUsize::new(2).unwrap(),
            ledger_policy: policy,
            ..GeneticConfig::zero()
        }
    }

    #[test]
    fn genesis_pairs_are_known() {
        let history = History::new(&config(LedgerPolicy::PerGeneration));
        // Bias (0) to second output (5).
        assert_eq!(history.lookup_connection(0, 5), Some(1));
        // Third input (3) to first output (4).
        assert_eq!(history.lookup_connection(3, 4), Some(6));
        assert_eq!(history.lookup_connection(4, 5), None);
    }

    #[test]
    fn identical_connections_share_markings() {
        let mut history = History::new(&config(LedgerPolicy::PerGeneration));
        let first = history.connection_marking(6, 4);
        let second = history.connection_marking(6, 4);
        let other = history.connection_marking(6, 5);
        assert_eq!(first, 8);
        assert_eq!(first, second);
        assert_eq!(other, 9);
    }

    #[test]
    fn per_generation_ledger_forgets() {
        let mut history = History::new(&config(LedgerPolicy::PerGeneration));
        let before = history.connection_marking(6, 4);
        history.advance_generation();
        let after = history.connection_marking(6, 4);
        assert_ne!(before, after);
        // Genesis entries survive.
        assert_eq!(history.lookup_connection(0, 4), Some(0));
    }

    #[test]
    fn persistent_ledger_remembers() {
        let mut history = History::new(&config(LedgerPolicy::Persistent));
        let before = history.connection_marking(6, 4);
        let node = history.split_node(before, |_| false);
        history.advance_generation();
        assert_eq!(history.connection_marking(6, 4), before);
        assert_eq!(history.split_node(before, |_| false), node);
    }

    #[test]
    fn taken_split_node_is_reminted() {
        let mut history = History::new(&config(LedgerPolicy::Persistent));
        let first = history.split_node(3, |_| false);
        let second = history.split_node(3, |id| id == first);
        assert_ne!(first, second);
        assert_eq!(history.split_node(3, |_| false), second);
    }

    #[test]
    fn registration_reserves_ids() {
        let mut history = History::new(&config(LedgerPolicy::PerGeneration));
        history.register_connection(12, 4, 40);
        history.reserve_node(12);
        assert_eq!(history.lookup_connection(12, 4), Some(40));
        assert_eq!(history.next_marking(), 41);
        assert_eq!(history.next_node(), 13);
    }
}
