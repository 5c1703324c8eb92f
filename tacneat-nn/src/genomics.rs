//! Genomes are the focus of evolution in NEAT.
//! A [`LayeredGenome`] is a collection of typed nodes and weighted
//! connections, each connection carrying the historical marking of
//! the mutation that created it. Genomes grow by mutation, and
//! combine through crossover aligned on those markings.
//!
//! Nodes and connections live in two arenas sorted by node id and
//! marking respectively, and refer to each other by id only.

mod config;
mod connections;
mod errors;
mod history;
mod layering;
mod nodes;
mod serialization;

pub use config::{GeneticConfig, LedgerPolicy};
pub use connections::Connection;
pub use errors::{
    EvaluationError, GeneAdditionError, ImportError, NodeAdditionError, TopologyError,
};
pub use history::History;
pub use nodes::{Node, NodeType};
pub use serialization::suggested_file_name;

use crate::networks::FeedForwardNetwork;
use crate::{Innovation, NodeId};

use ahash::RandomState;
use rand::prelude::{IteratorRandom, Rng, SliceRandom};
use serde::{Deserialize, Serialize};
use tracing::trace;

use std::collections::HashSet;

/// A mutable, layered collection of nodes and connections.
///
/// Every connection runs from a lower layer to a strictly higher
/// one, and output nodes share the genome's highest layer. Layers
/// only serve to keep one valid evaluation order around.
///
/// Suports Serde for convenient genome saving and loading,
/// next to the plain text format of [`export`].
///
/// [`export`]: LayeredGenome::export
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct LayeredGenome {
    nodes: Vec<Node>,
    connections: Vec<Connection>,
    layer_count: usize,
}

impl LayeredGenome {
    /// Create a new, minimal genome with the specified configuration:
    /// every input (the bias first) connected to every output.
    ///
    /// Inputs take ids `0..=input_count` and outputs the ids right after.
    /// The connection from input `i` to output `o` has marking
    /// `i ⨯ output_count + o`.
    ///
    /// # Examples
    /// ```
    /// use tacneat_nn::genomics::{GeneticConfig, LayeredGenome, NodeType};
    /// use std::num::NonZeroUsize;
    ///
    /// let config = GeneticConfig {
    ///     input_count: NonZeroUsize::new(3).unwrap(),
    ///     output_count: NonZeroUsize::new(2).unwrap(),
    ///     weight_bound: 1.0,
    ///     ..GeneticConfig::zero()
    /// };
    ///
    /// let genome = LayeredGenome::new(&config, &mut rand::thread_rng());
    ///
    /// // 3 inputs and the bias, plus 2 outputs.
    /// assert_eq!(genome.nodes().filter(|n| n.node_type() == NodeType::Input).count(), 4);
    /// assert_eq!(genome.nodes().filter(|n| n.node_type() == NodeType::Output).count(), 2);
    ///
    /// // Fully connected, markings 0..8.
    /// assert!(genome.connections().map(|c| c.marking()).eq(0..8));
    /// assert!(genome.connections().all(|c| c.enabled()));
    /// assert_eq!(genome.layer_count(), 2);
    /// ```
    pub fn new<R: Rng + ?Sized>(config: &GeneticConfig, rng: &mut R) -> LayeredGenome {
        let inputs = config.input_count.get() + 1;
        let outputs = config.output_count.get();

        let mut nodes = Vec::with_capacity(inputs + outputs);
        nodes.extend((0..inputs).map(|i| Node::new(i, NodeType::Input, 0, 1)));
        nodes.extend((0..outputs).map(|o| Node::new(inputs + o, NodeType::Output, 1, inputs)));

        let mut connections = Vec::with_capacity(inputs * outputs);
        for i in 0..inputs {
            for o in 0..outputs {
                let weight = Connection::random_weight(config, rng);
                connections.push(Connection::new(i * outputs + o, i, inputs + o, weight, true));
            }
        }

        LayeredGenome {
            nodes,
            connections,
            layer_count: 2,
        }
    }

    /// Returns the position of node `id` in the node arena.
    fn node_index(&self, id: NodeId) -> Option<usize> {
        self.nodes.binary_search_by_key(&id, Node::id).ok()
    }

    /// Returns the position of node `id`, which must be in the genome.
    fn position(&self, id: NodeId) -> usize {
        self.node_index(id)
            .unwrap_or_else(|| panic!("node {} missing from genome", id))
    }

    fn insert_node(&mut self, node: Node) -> usize {
        let index = self
            .nodes
            .binary_search_by_key(&node.id(), Node::id)
            .unwrap_or_else(|index| index);
        self.nodes.insert(index, node);
        index
    }

    fn insert_connection(&mut self, connection: Connection) -> usize {
        let index = self
            .connections
            .binary_search_by_key(&connection.marking(), Connection::marking)
            .unwrap_or_else(|index| index);
        self.connections.insert(index, connection);
        index
    }

    /// Induces a _weight mutation_ in the genome: every enabled
    /// connection has a [`weight_mutation_rate`] chance of being
    /// [mutated].
    ///
    /// [`weight_mutation_rate`]: GeneticConfig::weight_mutation_rate
    /// [mutated]: Connection::mutate_weight
    ///
    /// # Examples
    /// ```
    /// use tacneat_nn::genomics::{GeneticConfig, LayeredGenome};
    ///
    /// let config = GeneticConfig {
    ///     weight_bound: 1.0,
    ///     weight_mutation_rate: 1.0,
    ///     ..GeneticConfig::zero()
    /// };
    /// let mut rng = rand::thread_rng();
    /// let mut genome = LayeredGenome::new(&config, &mut rng);
    ///
    /// genome.mutate_weights(&config, &mut rng);
    /// assert!(genome.connections().all(|c| c.weight().abs() <= 1.0));
    /// ```
    pub fn mutate_weights<R: Rng + ?Sized>(&mut self, config: &GeneticConfig, rng: &mut R) {
        for connection in self.connections.iter_mut().filter(|c| c.enabled()) {
            if rng.gen::<f64>() < config.weight_mutation_rate {
                connection.mutate_weight(config, rng);
            }
        }
    }

    /// Induces a _connection mutation_ in the genome.
    /// If successful, returns the newly added connection.
    ///
    /// Origins are tried in random order among non-output nodes;
    /// for each, a random non-input destination is looked for that
    /// is not yet fed by the origin and does not lead back to it.
    /// If the destination does not already sit above the origin,
    /// it is raised along with everything downstream of it.
    ///
    /// # Errors
    ///
    /// Returns an error if no viable pair of nodes exists.
    ///
    /// # Examples
    /// ```
    /// use tacneat_nn::genomics::{GeneticConfig, History, LayeredGenome};
    ///
    /// let config = GeneticConfig {
    ///     weight_bound: 1.0,
    ///     ..GeneticConfig::zero()
    /// };
    /// let mut rng = rand::thread_rng();
    /// let mut history = History::new(&config);
    /// let mut genome = LayeredGenome::new(&config, &mut rng);
    ///
    /// // A genesis genome is already fully connected.
    /// assert!(genome.mutate_add_connection(&mut history, &config, &mut rng).is_err());
    ///
    /// // Splitting a connection opens room for a new one.
    /// genome.mutate_add_node(&mut history, &mut rng).unwrap();
    /// let connection = genome.mutate_add_connection(&mut history, &config, &mut rng).unwrap();
    /// assert!(connection.enabled());
    /// ```
    pub fn mutate_add_connection<R: Rng + ?Sized>(
        &mut self,
        history: &mut History,
        config: &GeneticConfig,
        rng: &mut R,
    ) -> Result<&Connection, GeneAdditionError> {
        let successors = self.successor_lists();
        let (origin, destination) = self
            .find_connectable_pair(&successors, rng)
            .ok_or(GeneAdditionError::NoViablePair)?;
        let (origin_id, destination_id) = (self.nodes[origin].id(), self.nodes[destination].id());

        let marking = history.connection_marking(origin_id, destination_id);
        debug_assert!(
            self.connection(marking).is_none(),
            "marking {} reused within genome",
            marking
        );

        let origin_layer = self.nodes[origin].layer();
        if self.nodes[destination].layer() <= origin_layer {
            self.raise(&successors, destination, origin_layer + 1);
        }
        self.nodes[destination].increment_input_count();

        let weight = Connection::random_weight(config, rng);
        let index = self.insert_connection(Connection::new(
            marking,
            origin_id,
            destination_id,
            weight,
            true,
        ));
        Ok(&self.connections[index])
    }

    fn find_connectable_pair<R: Rng + ?Sized>(
        &self,
        successors: &[Vec<usize>],
        rng: &mut R,
    ) -> Option<(usize, usize)> {
        let mut origins: Vec<usize> = (0..self.nodes.len())
            .filter(|&i| self.nodes[i].node_type() != NodeType::Output)
            .collect();
        origins.shuffle(rng);

        for origin in origins {
            let mut destinations: Vec<usize> = (0..self.nodes.len())
                .filter(|&d| {
                    d != origin
                        && self.nodes[d].node_type() != NodeType::Input
                        && !successors[origin].contains(&d)
                })
                .collect();
            destinations.shuffle(rng);
            if let Some(destination) = destinations
                .into_iter()
                .find(|&d| !Self::reaches(successors, d, origin))
            {
                return Some((origin, destination));
            }
        }
        None
    }

    /// Induces a _node mutation_ in the genome.
    /// If succesful, returns the id of the new node.
    ///
    /// A random enabled connection is disabled, and replaced by a
    /// hidden node one layer above its origin, fed by the origin with
    /// weight 1.0 and feeding the old destination with the old weight.
    ///
    /// # Errors
    ///
    /// Returns an error if there is no enabled connection to split.
    ///
    /// # Examples
    /// ```
    /// use tacneat_nn::genomics::{GeneticConfig, History, LayeredGenome, NodeType};
    ///
    /// let config = GeneticConfig {
    ///     weight_bound: 1.0,
    ///     ..GeneticConfig::zero()
    /// };
    /// let mut rng = rand::thread_rng();
    /// let mut history = History::new(&config);
    /// let mut genome = LayeredGenome::new(&config, &mut rng);
    ///
    /// let new_node = genome.mutate_add_node(&mut history, &mut rng).unwrap();
    ///
    /// assert_eq!(genome.node(new_node).unwrap().node_type(), NodeType::Hidden);
    /// assert_eq!(genome.connections().filter(|c| !c.enabled()).count(), 1);
    /// assert_eq!(genome.layer_count(), 3);
    /// ```
    pub fn mutate_add_node<R: Rng + ?Sized>(
        &mut self,
        history: &mut History,
        rng: &mut R,
    ) -> Result<NodeId, NodeAdditionError> {
        let split = self
            .connections
            .iter()
            .enumerate()
            .filter(|(_, c)| c.enabled())
            .map(|(i, _)| i)
            .choose(rng)
            .ok_or(NodeAdditionError::NoEnabledConnection)?;

        let split = &mut self.connections[split];
        split.set_enabled(false);
        let (marking, weight) = (split.marking(), split.weight());
        let (origin, destination) = split.endpoints();

        let new_node = history.split_node(marking, |id| self.node_index(id).is_some());
        let new_layer = self.nodes[self.position(origin)].layer() + 1;
        self.insert_node(Node::new(new_node, NodeType::Hidden, new_layer, 1));

        let into_marking = history.connection_marking(origin, new_node);
        let out_of_marking = history.connection_marking(new_node, destination);
        self.insert_connection(Connection::new(into_marking, origin, new_node, 1.0, true));
        self.insert_connection(Connection::new(
            out_of_marking,
            new_node,
            destination,
            weight,
            true,
        ));

        let destination = self.position(destination);
        self.nodes[destination].increment_input_count();
        if self.nodes[destination].layer() <= new_layer {
            let successors = self.successor_lists();
            self.raise(&successors, destination, new_layer + 1);
        }

        Ok(new_node)
    }

    /// Runs a full mutation pass: weights, then node addition,
    /// then connection addition, each with its configured chance.
    /// Structural mutations that find nothing to do are skipped.
    pub fn mutate_all<R: Rng + ?Sized>(
        &mut self,
        history: &mut History,
        config: &GeneticConfig,
        rng: &mut R,
    ) {
        self.mutate_weights(config, rng);
        if rng.gen::<f64>() < config.add_node_chance {
            if let Err(e) = self.mutate_add_node(history, rng) {
                trace!(error = %e, "node mutation skipped");
            }
        }
        if rng.gen::<f64>() < config.add_connection_chance {
            if let Err(e) = self.mutate_add_connection(history, config, rng) {
                trace!(error = %e, "connection mutation skipped");
            }
        }
    }

    /// Combines two genomes into a child genome, aligning
    /// connections by historical marking.
    ///
    /// Connections present in both parents are inherited from either
    /// one at random. Connections present in only one parent are
    /// inherited only from the `better` one; when both parents are
    /// equally fit, a coin flip decides each. An inherited disabled
    /// connection is re-enabled unless it [stays disabled].
    ///
    /// The child's nodes and layers are inferred from the inherited
    /// connections rather than copied: connections that would
    /// duplicate endpoints or close a cycle are dropped.
    ///
    /// [stays disabled]: GeneticConfig::disabled_gene_stays_disabled_chance
    ///
    /// # Examples
    /// ```
    /// use tacneat_nn::genomics::{GeneticConfig, History, LayeredGenome};
    ///
    /// let config = GeneticConfig {
    ///     weight_bound: 1.0,
    ///     ..GeneticConfig::zero()
    /// };
    /// let mut rng = rand::thread_rng();
    /// let mut history = History::new(&config);
    ///
    /// let mut better = LayeredGenome::new(&config, &mut rng);
    /// let worse = LayeredGenome::new(&config, &mut rng);
    /// better.mutate_add_node(&mut history, &mut rng).unwrap();
    ///
    /// let child = LayeredGenome::crossover(&better, &worse, false, &config, &mut rng);
    ///
    /// // The better parent's extra structure is carried over.
    /// assert_eq!(child.connections().count(), better.connections().count());
    /// assert_eq!(child.nodes().count(), better.nodes().count());
    /// ```
    pub fn crossover<R: Rng + ?Sized>(
        better: &LayeredGenome,
        worse: &LayeredGenome,
        equal_fitness: bool,
        config: &GeneticConfig,
        rng: &mut R,
    ) -> LayeredGenome {
        let inherited = Self::inherit_connections(better, worse, equal_fitness, config, rng);

        let mut child = LayeredGenome {
            nodes: better
                .nodes
                .iter()
                .filter(|n| n.node_type() != NodeType::Hidden)
                .map(|n| Node::new(n.id(), n.node_type(), base_layer(n.node_type()), 0))
                .collect(),
            connections: Vec::with_capacity(inherited.len()),
            layer_count: 2,
        };
        for connection in &inherited {
            for id in [connection.origin(), connection.destination()] {
                if child.node_index(id).is_none() {
                    if let Some(node) = better.node(id).or_else(|| worse.node(id)) {
                        let node_type = node.node_type();
                        child.insert_node(Node::new(id, node_type, base_layer(node_type), 0));
                    }
                }
            }
        }

        let mut successors = vec![vec![]; child.nodes.len()];
        let mut endpoints = HashSet::<_, RandomState>::default();
        for connection in inherited {
            let (origin, destination) = match (
                child.node_index(connection.origin()),
                child.node_index(connection.destination()),
            ) {
                (Some(origin), Some(destination)) => (origin, destination),
                _ => continue,
            };
            if !endpoints.insert(connection.endpoints()) {
                trace!(
                    marking = connection.marking(),
                    "crossover dropped connection with duplicate endpoints"
                );
                continue;
            }
            if Self::reaches(&successors, destination, origin) {
                trace!(
                    marking = connection.marking(),
                    "crossover dropped cycle-closing connection"
                );
                continue;
            }
            successors[origin].push(destination);
            let origin_layer = child.nodes[origin].layer();
            if child.nodes[destination].layer() <= origin_layer {
                child.raise(&successors, destination, origin_layer + 1);
            }
            child.connections.push(connection);
        }

        child.settle_outputs();
        child.recount_inputs();
        child
    }

    /// Walks both parents' connections in marking order and picks
    /// the ones the child inherits.
    fn inherit_connections<R: Rng + ?Sized>(
        better: &LayeredGenome,
        worse: &LayeredGenome,
        equal_fitness: bool,
        config: &GeneticConfig,
        rng: &mut R,
    ) -> Vec<Connection> {
        let mut inherited = Vec::with_capacity(better.connections.len().max(worse.connections.len()));
        let mut better_genes = better.connections.iter().peekable();
        let mut worse_genes = worse.connections.iter().peekable();

        loop {
            let next = (
                better_genes.peek().map(|c| c.marking()),
                worse_genes.peek().map(|c| c.marking()),
            );
            let gene = match next {
                (None, None) => break,
                (Some(b), Some(w)) if b == w => {
                    let (from_better, from_worse) = (better_genes.next(), worse_genes.next());
                    if rng.gen::<bool>() {
                        from_better
                    } else {
                        from_worse
                    }
                }
                (Some(b), Some(w)) if b > w => {
                    let from_worse = worse_genes.next();
                    from_worse.filter(|_| equal_fitness && rng.gen::<bool>())
                }
                (Some(_), _) => {
                    let from_better = better_genes.next();
                    from_better.filter(|_| !equal_fitness || rng.gen::<bool>())
                }
                (None, Some(_)) => {
                    let from_worse = worse_genes.next();
                    from_worse.filter(|_| equal_fitness && rng.gen::<bool>())
                }
            };

            if let Some(gene) = gene {
                let mut gene = gene.clone();
                if !gene.enabled() && rng.gen::<f64>() >= config.disabled_gene_stays_disabled_chance {
                    gene.set_enabled(true);
                }
                inherited.push(gene);
            }
        }

        inherited
    }

    /// Calculates the _compatibility distance_ between two genomes:
    /// `c1 ⨯ excess + c2 ⨯ disjoint + c3 ⨯ mean weight difference`,
    /// with the coefficients taken from `config`.
    ///
    /// Unmatched connections beyond the smaller of the two highest
    /// markings are excess, the others disjoint. The mean weight
    /// difference over matching connections is 0 if none match.
    ///
    /// # Examples
    /// ```
    /// use tacneat_nn::genomics::{GeneticConfig, LayeredGenome};
    ///
    /// let config = GeneticConfig {
    ///     weight_bound: 1.0,
    ///     excess_gene_factor: 1.0,
    ///     disjoint_gene_factor: 1.0,
    ///     common_weight_factor: 3.0,
    ///     ..GeneticConfig::zero()
    /// };
    /// let genome = LayeredGenome::new(&config, &mut rand::thread_rng());
    ///
    /// assert_eq!(LayeredGenome::compatibility_distance(&genome, &genome, &config), 0.0);
    /// ```
    pub fn compatibility_distance(
        first: &LayeredGenome,
        second: &LayeredGenome,
        config: &GeneticConfig,
    ) -> f64 {
        let excess_boundary = first.max_marking().min(second.max_marking());
        let is_excess = |marking: Innovation| excess_boundary.map_or(true, |b| marking > b);

        let (mut matching, mut weight_difference) = (0usize, 0.0);
        let (mut disjoint, mut excess) = (0usize, 0usize);
        let mut count_unmatched = |marking: Innovation| {
            if is_excess(marking) {
                excess += 1;
            } else {
                disjoint += 1;
            }
        };

        let mut a = first.connections.iter().peekable();
        let mut b = second.connections.iter().peekable();
        loop {
            match (a.peek().map(|c| c.marking()), b.peek().map(|c| c.marking())) {
                (None, None) => break,
                (Some(x), Some(y)) if x == y => {
                    if let (Some(ca), Some(cb)) = (a.next(), b.next()) {
                        matching += 1;
                        weight_difference += (ca.weight() - cb.weight()).abs();
                    }
                }
                (Some(x), Some(y)) if x > y => {
                    b.next();
                    count_unmatched(y);
                }
                (Some(x), _) => {
                    a.next();
                    count_unmatched(x);
                }
                (None, Some(y)) => {
                    b.next();
                    count_unmatched(y);
                }
            }
        }

        let mean_weight_difference = if matching > 0 {
            weight_difference / matching as f64
        } else {
            0.0
        };

        config.excess_gene_factor * excess as f64
            + config.disjoint_gene_factor * disjoint as f64
            + config.common_weight_factor * mean_weight_difference
    }

    /// Records the genome's markings and node ids in `history`,
    /// so that they are never minted again for other structure.
    /// Used when seeding a population from an imported genome.
    pub fn register_innovations(&self, history: &mut History) {
        for connection in &self.connections {
            let (origin, destination) = connection.endpoints();
            history.register_connection(origin, destination, connection.marking());
        }
        if let Some(last) = self.nodes.last() {
            history.reserve_node(last.id());
        }
    }

    /// Evaluates the genome once. See [`FeedForwardNetwork::evaluate`];
    /// build the network once instead when evaluating repeatedly.
    ///
    /// # Errors
    ///
    /// Returns an error if `inputs` does not hold one value
    /// per non-bias input node.
    pub fn evaluate(&self, inputs: &[f64]) -> Result<Vec<f64>, EvaluationError> {
        FeedForwardNetwork::from(self).evaluate(inputs)
    }

    /// Returns an iterator over the genome's nodes, ordered by id.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    /// Returns an iterator over the genome's connections,
    /// ordered by historical marking.
    pub fn connections(&self) -> impl Iterator<Item = &Connection> {
        self.connections.iter()
    }

    /// Returns the node with the given id, if present.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.node_index(id).map(|i| &self.nodes[i])
    }

    /// Returns the connection with the given marking, if present.
    pub fn connection(&self, marking: Innovation) -> Option<&Connection> {
        self.connections
            .binary_search_by_key(&marking, Connection::marking)
            .ok()
            .map(|i| &self.connections[i])
    }

    /// Returns the highest historical marking in the genome.
    pub fn max_marking(&self) -> Option<Innovation> {
        self.connections.last().map(Connection::marking)
    }

    /// Returns the number of layers, the output layer being the last.
    pub fn layer_count(&self) -> usize {
        self.layer_count
    }

    /// Returns the number of inputs the genome expects,
    /// not counting the bias.
    pub fn input_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| n.node_type() == NodeType::Input)
            .count()
            .saturating_sub(1)
    }

    /// Returns the number of outputs the genome produces.
    pub fn output_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| n.node_type() == NodeType::Output)
            .count()
    }
}

fn base_layer(node_type: NodeType) -> usize {
    match node_type {
        NodeType::Input => 0,
        _ => 1,
    }
}

impl tacneat::Genome for LayeredGenome {
    type Config = GeneticConfig;
    type InnovationHistory = History;

    fn new<R: Rng + ?Sized>(config: &GeneticConfig, rng: &mut R) -> LayeredGenome {
        Self::new(config, rng)
    }

    fn compatibility_distance(
        first: &LayeredGenome,
        second: &LayeredGenome,
        config: &GeneticConfig,
    ) -> f64 {
        Self::compatibility_distance(first, second, config)
    }

    fn crossover<R: Rng + ?Sized>(
        better: &LayeredGenome,
        worse: &LayeredGenome,
        equal_fitness: bool,
        config: &GeneticConfig,
        rng: &mut R,
    ) -> LayeredGenome {
        Self::crossover(better, worse, equal_fitness, config, rng)
    }

    fn mutate<R: Rng + ?Sized>(&mut self, history: &mut History, config: &GeneticConfig, rng: &mut R) {
        self.mutate_all(history, config, rng)
    }

    fn register_innovations(&self, history: &mut History) {
        Self::register_innovations(self, history)
    }
}
