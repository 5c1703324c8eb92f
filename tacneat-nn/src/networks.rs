//! A network is the executable phenotype of a genome.
//!
//! The [`FeedForwardNetwork`] type is built once from a
//! [`LayeredGenome`] and evaluated tick after tick, its node
//! accumulators being cleared after every evaluation.
//!
//! [`FixedTopologyNetwork`] is a dense layered perceptron used as a
//! baseline, and [`Brain`] puts both behind a single `evaluate`.
mod fixed_topology;

pub use fixed_topology::FixedTopologyNetwork;

use crate::genomics::{EvaluationError, LayeredGenome, NodeType};
use crate::{steep_sigmoid, NodeId};

use std::collections::VecDeque;
use std::fmt;

/// A single weighted edge between two node positions.
/// Disabled connections keep a zero weight: they still
/// deliver a (null) contribution to their destination.
#[derive(Clone, Copy, PartialEq)]
struct Link {
    origin: usize,
    destination: usize,
    weight: f64,
}

impl fmt::Debug for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {} {:.9}", self.origin, self.destination, self.weight)
    }
}

/// An acyclic, arbitrarily-structured neural network.
#[derive(Clone, Debug)]
pub struct FeedForwardNetwork {
    node_ids: Box<[NodeId]>,
    inputs: Box<[usize]>,
    outputs: Box<[usize]>,
    expected: Box<[usize]>,
    received: Box<[usize]>,
    sums: Box<[f64]>,
    links: Box<[Link]>,
}

impl FeedForwardNetwork {
    /// Generates a new network from the passed genome.
    ///
    /// # Examples
    /// ```
    /// use tacneat_nn::genomics::{GeneticConfig, LayeredGenome};
    /// use tacneat_nn::networks::FeedForwardNetwork;
    /// use std::num::NonZeroUsize;
    ///
    /// let genome = LayeredGenome::new(&GeneticConfig {
    ///     input_count: NonZeroUsize::new(3).unwrap(),
    ///     output_count: NonZeroUsize::new(2).unwrap(),
    ///     weight_bound: 1.0,
    ///     ..GeneticConfig::zero()
    /// }, &mut rand::thread_rng());
    ///
    /// let network = FeedForwardNetwork::new(&genome);
    /// assert_eq!(network.input_count(), 3);
    /// assert_eq!(network.output_count(), 2);
    /// ```
    pub fn new(genome: &LayeredGenome) -> FeedForwardNetwork {
        let node_ids: Vec<NodeId> = genome.nodes().map(|n| n.id()).collect();
        let position = |id: NodeId| node_ids.binary_search(&id).ok();
        let of_type = |node_type: NodeType| -> Box<[usize]> {
            genome
                .nodes()
                .enumerate()
                .filter(|(_, n)| n.node_type() == node_type)
                .map(|(i, _)| i)
                .collect()
        };

        let links: Box<[Link]> = genome
            .connections()
            .filter_map(|c| {
                Some(Link {
                    origin: position(c.origin())?,
                    destination: position(c.destination())?,
                    weight: if c.enabled() { c.weight() } else { 0.0 },
                })
            })
            .collect();

        FeedForwardNetwork {
            inputs: of_type(NodeType::Input),
            outputs: of_type(NodeType::Output),
            expected: genome.nodes().map(|n| n.input_count()).collect(),
            received: vec![0; node_ids.len()].into(),
            sums: vec![0.0; node_ids.len()].into(),
            node_ids: node_ids.into(),
            links,
        }
    }

    /// Evaluates the network on the passed inputs and returns
    /// the activation of every output node, in id order.
    ///
    /// The first input node is the bias and always receives `1.0`;
    /// `inputs` feeds the remaining ones. Connections fire once
    /// their origin has received all of its declared inputs;
    /// those that cannot fire yet are retried after every
    /// successful firing. Every node squashes its summed inputs
    /// with [`steep_sigmoid`].
    ///
    /// # Errors
    ///
    /// Returns an error if `inputs` does not hold exactly one value
    /// per non-bias input node, or if an output node is left
    /// waiting for inputs, which only happens for malformed genomes.
    ///
    /// # Examples
    /// ```
    /// use tacneat_nn::genomics::LayeredGenome;
    /// use tacneat_nn::networks::FeedForwardNetwork;
    /// use tacneat_nn::steep_sigmoid;
    ///
    /// // Bias and one input, both feeding the output.
    /// let genome: LayeredGenome = "2\n\nN\n0 Input 0 1\nN\n1 Input 0 1\nN\n2 Output 1 2\n\n\
    ///     C\n0 0 2 0.5 true\nC\n1 1 2 -1 true\n".parse().unwrap();
    /// let mut network = FeedForwardNetwork::new(&genome);
    ///
    /// let expected = steep_sigmoid(0.5 * steep_sigmoid(1.0) - steep_sigmoid(0.3));
    /// assert_eq!(network.evaluate(&[0.3]).unwrap(), vec![expected]);
    /// assert!(network.evaluate(&[0.3, 0.1]).is_err());
    /// ```
    pub fn evaluate(&mut self, inputs: &[f64]) -> Result<Vec<f64>, EvaluationError> {
        let expected = self.input_count();
        if inputs.len() != expected {
            return Err(EvaluationError::InputLengthMismatch {
                expected,
                actual: inputs.len(),
            });
        }

        if let Some(&bias) = self.inputs.first() {
            self.receive(bias, 1.0);
            for (i, &value) in inputs.iter().enumerate() {
                let node = self.inputs[i + 1];
                self.receive(node, value);
            }
        }

        let mut pending = VecDeque::new();
        for index in 0..self.links.len() {
            if self.is_ready(self.links[index].origin) {
                self.fire(index);
                self.retry(&mut pending);
            } else {
                pending.push_back(index);
            }
        }
        while !pending.is_empty() && self.retry(&mut pending) {}

        let result = self
            .outputs
            .iter()
            .map(|&node| {
                if self.is_ready(node) {
                    Ok(steep_sigmoid(self.sums[node]))
                } else {
                    Err(EvaluationError::IncompleteOutput(self.node_ids[node]))
                }
            })
            .collect();
        self.clear_state();
        result
    }

    /// Makes one pass over the retry queue, firing every connection
    /// whose origin became ready. Returns whether any fired.
    fn retry(&mut self, pending: &mut VecDeque<usize>) -> bool {
        let mut fired = false;
        for _ in 0..pending.len() {
            if let Some(index) = pending.pop_front() {
                if self.is_ready(self.links[index].origin) {
                    self.fire(index);
                    fired = true;
                } else {
                    pending.push_back(index);
                }
            }
        }
        fired
    }

    fn fire(&mut self, index: usize) {
        let link = self.links[index];
        let output = steep_sigmoid(self.sums[link.origin]);
        self.receive(link.destination, output * link.weight);
    }

    fn receive(&mut self, node: usize, value: f64) {
        self.sums[node] += value;
        self.received[node] += 1;
    }

    fn is_ready(&self, node: usize) -> bool {
        self.received[node] >= self.expected[node]
    }

    fn clear_state(&mut self) {
        self.sums.iter_mut().for_each(|s| *s = 0.0);
        self.received.iter_mut().for_each(|r| *r = 0);
    }

    /// Returns the number of inputs the network expects, not counting the bias.
    pub fn input_count(&self) -> usize {
        self.inputs.len().saturating_sub(1)
    }

    /// Returns the number of outputs the network produces.
    pub fn output_count(&self) -> usize {
        self.outputs.len()
    }
}

impl From<&LayeredGenome> for FeedForwardNetwork {
    fn from(genome: &LayeredGenome) -> FeedForwardNetwork {
        FeedForwardNetwork::new(genome)
    }
}

/// The controller of an agent: either a fixed, dense perceptron
/// or an evolved network, evaluated through the same call.
#[derive(Clone, Debug)]
pub enum Brain {
    FixedTopology(FixedTopologyNetwork),
    EvolvingTopology(FeedForwardNetwork),
}

impl Brain {
    /// Evaluates the underlying network on `inputs`.
    ///
    /// # Errors
    ///
    /// Returns an error if `inputs` does not match
    /// the network's input count.
    ///
    /// # Examples
    /// ```
    /// use tacneat_nn::genomics::{GeneticConfig, LayeredGenome};
    /// use tacneat_nn::networks::{Brain, FixedTopologyNetwork};
    /// use std::num::NonZeroUsize;
    ///
    /// let mut rng = rand::thread_rng();
    /// let config = GeneticConfig {
    ///     input_count: NonZeroUsize::new(4).unwrap(),
    ///     output_count: NonZeroUsize::new(2).unwrap(),
    ///     weight_bound: 1.0,
    ///     ..GeneticConfig::zero()
    /// };
    ///
    /// let mut brains = vec![
    ///     Brain::from(&LayeredGenome::new(&config, &mut rng)),
    ///     Brain::from(FixedTopologyNetwork::new(&[4, 6, 2], &mut rng).unwrap()),
    /// ];
    /// for brain in &mut brains {
    ///     assert_eq!(brain.evaluate(&[0.1, 0.2, 0.3, 0.4]).unwrap().len(), 2);
    /// }
    /// ```
    pub fn evaluate(&mut self, inputs: &[f64]) -> Result<Vec<f64>, EvaluationError> {
        match self {
            Brain::FixedTopology(network) => network.evaluate(inputs),
            Brain::EvolvingTopology(network) => network.evaluate(inputs),
        }
    }
}

impl From<FixedTopologyNetwork> for Brain {
    fn from(network: FixedTopologyNetwork) -> Brain {
        Brain::FixedTopology(network)
    }
}

impl From<FeedForwardNetwork> for Brain {
    fn from(network: FeedForwardNetwork) -> Brain {
        Brain::EvolvingTopology(network)
    }
}

impl From<&LayeredGenome> for Brain {
    fn from(genome: &LayeredGenome) -> Brain {
        Brain::EvolvingTopology(FeedForwardNetwork::new(genome))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genomics::{GeneticConfig, History};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::num::NonZeroUsize;

    fn sig(x: f64) -> f64 {
        steep_sigmoid(x)
    }

    #[test]
    fn from_genome() {
        let genome: LayeredGenome = "3\n\nN\n0 Input 0 1\nN\n1 Input 0 1\nN\n2 Output 2 3\nN\n5 Hidden 1 1\n\n\
            C\n0 0 2 0.5 true\nC\n1 1 2 0.7 false\nC\n2 1 5 1 true\nC\n3 5 2 0.7 true\n"
            .parse()
            .unwrap();
        let network = FeedForwardNetwork::new(&genome);
        assert_eq!(&*network.node_ids, &[0, 1, 2, 5]);
        assert_eq!(&*network.inputs, &[0, 1]);
        assert_eq!(&*network.outputs, &[2]);
        assert_eq!(&*network.expected, &[1, 1, 3, 1]);
        // Disabled connections are kept, silenced.
        assert_eq!(network.links[1].weight, 0.0);
        assert_eq!(network.links[3].origin, 3);
    }

    #[test]
    fn evaluate_split_genome() {
        let genome: LayeredGenome = "3\n\nN\n0 Input 0 1\nN\n1 Input 0 1\nN\n2 Output 2 3\nN\n3 Hidden 1 1\n\n\
            C\n0 0 2 0.5 true\nC\n1 1 2 0.7 false\nC\n2 1 3 1 true\nC\n3 3 2 0.7 true\n"
            .parse()
            .unwrap();
        let mut network = FeedForwardNetwork::new(&genome);
        for x in -10..=10 {
            let x = x as f64 / 10.0;
            let hidden = sig(sig(x));
            let expected = sig(0.5 * sig(1.0) + 0.7 * hidden);
            assert_eq!(network.evaluate(&[x]).unwrap(), vec![expected]);
        }
    }

    #[test]
    fn connections_out_of_order_are_retried() {
        // Connection 0 leaves the hidden node before anything reaches it.
        let genome: LayeredGenome = "3\n\nN\n0 Input 0 1\nN\n1 Output 2 1\nN\n2 Hidden 1 1\n\n\
            C\n0 2 1 2 true\nC\n1 0 2 -1 true\n"
            .parse()
            .unwrap();
        let mut network = FeedForwardNetwork::new(&genome);
        let expected = sig(2.0 * sig(-sig(1.0)));
        assert_eq!(network.evaluate(&[]).unwrap(), vec![expected]);
    }

    #[test]
    fn evaluation_is_repeatable() {
        let config = GeneticConfig {
            input_count: NonZeroUsize::new(3).unwrap(),
            output_count: NonZeroUsize::new(2).unwrap(),
            ..GeneticConfig::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let mut history = History::new(&config);
        let mut genome = LayeredGenome::new(&config, &mut rng);
        for _ in 0..5 {
            genome.mutate_add_node(&mut history, &mut rng).unwrap();
        }
        let mut network = FeedForwardNetwork::from(&genome);
        let first = network.evaluate(&[0.2, -0.4, 0.9]).unwrap();
        let second = network.evaluate(&[0.2, -0.4, 0.9]).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, genome.evaluate(&[0.2, -0.4, 0.9]).unwrap());
    }

    #[test]
    fn bias_and_inputs_are_seeded_in_order() {
        // Bias and two inputs, each feeding the output with its own weight.
        let genome: LayeredGenome = "2\n\nN\n0 Input 0 1\nN\n1 Input 0 1\nN\n2 Input 0 1\nN\n3 Output 1 3\n\n\
            C\n0 0 3 1 true\nC\n1 1 3 2 true\nC\n2 2 3 -3 true\n"
            .parse()
            .unwrap();
        let mut network = FeedForwardNetwork::new(&genome);
        for (a, b) in [(0.0, 0.0), (0.4, -0.2), (1.0, 0.5)] {
            let expected = sig(sig(1.0) + 2.0 * sig(a) - 3.0 * sig(b));
            assert_eq!(network.evaluate(&[a, b]).unwrap(), vec![expected]);
        }
    }

    #[test]
    fn input_length_mismatch() {
        let genome = LayeredGenome::new(
            &GeneticConfig {
                input_count: NonZeroUsize::new(2).unwrap(),
                ..GeneticConfig::zero()
            },
            &mut ChaCha8Rng::seed_from_u64(0),
        );
        let mut network = FeedForwardNetwork::new(&genome);
        assert_eq!(
            network.evaluate(&[1.0]),
            Err(EvaluationError::InputLengthMismatch {
                expected: 2,
                actual: 1
            })
        );
        // The failed call leaves nothing behind.
        assert!(network.evaluate(&[1.0, 1.0]).is_ok());
    }

    #[test]
    fn starved_output_is_reported() {
        let genome = LayeredGenome::new(&GeneticConfig::zero(), &mut ChaCha8Rng::seed_from_u64(0));
        let mut network = FeedForwardNetwork::new(&genome);
        network.expected[2] += 1;
        assert_eq!(
            network.evaluate(&[0.0]),
            Err(EvaluationError::IncompleteOutput(2))
        );
        // Accumulators are cleared even after a failure.
        assert!(network.sums.iter().all(|&s| s == 0.0));
    }
}
