use crate::genomics::{EvaluationError, TopologyError};
use crate::steep_sigmoid;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// A fully connected layer. Row `i` of `weights` holds the
/// weights leaving input `i`, the last row being the bias.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct DenseLayer {
    input_count: usize,
    output_count: usize,
    weights: Box<[f64]>,
}

impl DenseLayer {
    fn random<R: Rng + ?Sized>(input_count: usize, output_count: usize, rng: &mut R) -> DenseLayer {
        DenseLayer {
            input_count,
            output_count,
            weights: (0..(input_count + 1) * output_count)
                .map(|_| rng.gen_range(-1.0..=1.0))
                .collect(),
        }
    }

    fn feed(&self, inputs: &[f64]) -> Vec<f64> {
        (0..self.output_count)
            .map(|o| {
                let bias = self.weights[self.input_count * self.output_count + o];
                let sum: f64 = inputs
                    .iter()
                    .enumerate()
                    .map(|(i, x)| x * self.weights[i * self.output_count + o])
                    .sum();
                steep_sigmoid(sum + bias)
            })
            .collect()
    }
}

/// A dense, layered perceptron whose shape never changes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FixedTopologyNetwork {
    layers: Box<[DenseLayer]>,
}

impl FixedTopologyNetwork {
    /// Builds a network with the given neuron count per layer, the
    /// first being the inputs and the last the outputs. Every
    /// non-input layer gets a bias, and all weights are drawn
    /// uniformly from [-1, 1].
    ///
    /// # Errors
    ///
    /// Returns an error if fewer than two layers are passed
    /// or any of them is empty.
    ///
    /// # Examples
    /// ```
    /// use tacneat_nn::networks::FixedTopologyNetwork;
    ///
    /// let mut rng = rand::thread_rng();
    /// let mut network = FixedTopologyNetwork::new(&[17, 12, 5], &mut rng).unwrap();
    ///
    /// assert_eq!(network.input_count(), 17);
    /// assert_eq!(network.evaluate(&[0.0; 17]).unwrap().len(), 5);
    /// assert!(FixedTopologyNetwork::new(&[3], &mut rng).is_err());
    /// ```
    pub fn new<R: Rng + ?Sized>(
        layer_sizes: &[usize],
        rng: &mut R,
    ) -> Result<FixedTopologyNetwork, TopologyError> {
        if layer_sizes.len() < 2 {
            return Err(TopologyError::TooFewLayers(layer_sizes.len()));
        }
        if let Some(empty) = layer_sizes.iter().position(|&s| s == 0) {
            return Err(TopologyError::EmptyLayer(empty));
        }
        Ok(FixedTopologyNetwork {
            layers: layer_sizes
                .windows(2)
                .map(|pair| DenseLayer::random(pair[0], pair[1], rng))
                .collect(),
        })
    }

    /// Propagates `inputs` through every layer in turn.
    ///
    /// # Errors
    ///
    /// Returns an error if `inputs` does not hold one
    /// value per input neuron.
    pub fn evaluate(&self, inputs: &[f64]) -> Result<Vec<f64>, EvaluationError> {
        let expected = self.input_count();
        if inputs.len() != expected {
            return Err(EvaluationError::InputLengthMismatch {
                expected,
                actual: inputs.len(),
            });
        }
        let mut signal = inputs.to_vec();
        for layer in self.layers.iter() {
            signal = layer.feed(&signal);
        }
        Ok(signal)
    }

    /// Returns the number of input neurons.
    pub fn input_count(&self) -> usize {
        self.layers.first().map_or(0, |l| l.input_count)
    }

    /// Returns the number of output neurons.
    pub fn output_count(&self) -> usize {
        self.layers.last().map_or(0, |l| l.output_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn shape() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let network = FixedTopologyNetwork::new(&[3, 4, 2], &mut rng).unwrap();
        assert_eq!(network.layers.len(), 2);
        assert_eq!(network.layers[0].weights.len(), 16);
        assert_eq!(network.layers[1].weights.len(), 10);
        assert!(network
            .layers
            .iter()
            .flat_map(|l| l.weights.iter())
            .all(|w| w.abs() <= 1.0));
        assert_eq!(network.output_count(), 2);
    }

    #[test]
    fn rejects_bad_shapes() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert_eq!(
            FixedTopologyNetwork::new(&[], &mut rng),
            Err(TopologyError::TooFewLayers(0))
        );
        assert_eq!(
            FixedTopologyNetwork::new(&[2, 0, 1], &mut rng),
            Err(TopologyError::EmptyLayer(1))
        );
    }

    #[test]
    fn single_layer_is_a_weighted_sum() {
        let network = FixedTopologyNetwork {
            layers: vec![DenseLayer {
                input_count: 2,
                output_count: 1,
                weights: vec![0.5, -1.0, 0.25].into(),
            }]
            .into(),
        };
        let output = network.evaluate(&[1.0, 0.5]).unwrap();
        assert_eq!(output, vec![steep_sigmoid(0.5 - 0.5 + 0.25)]);
        assert!(network.evaluate(&[1.0]).is_err());
    }
}
