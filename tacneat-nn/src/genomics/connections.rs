use crate::genomics::GeneticConfig;
use crate::{Innovation, NodeId};

use std::fmt;

use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

/// Connections are the principal components of genomes.
/// They are created between two nodes, referenced by id,
/// and carry the historical marking used to align genomes
/// during crossover and compatibility comparison.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Connection {
    marking: Innovation,
    origin: NodeId,
    destination: NodeId,
    weight: f64,
    enabled: bool,
}

impl Connection {
    /// Returns a new connection with the specified parameters.
    ///
    /// # Examples
    /// ```
    /// use tacneat_nn::genomics::Connection;
    ///
    /// let connection = Connection::new(42, 3, 9, 0.5, true);
    /// assert_eq!(connection.marking(), 42);
    /// assert_eq!(connection.endpoints(), (3, 9));
    /// ```
    pub fn new(
        marking: Innovation,
        origin: NodeId,
        destination: NodeId,
        weight: f64,
        enabled: bool,
    ) -> Connection {
        Connection {
            marking,
            origin,
            destination,
            weight,
            enabled,
        }
    }

    /// Returns a random weight, uniformly distributed
    /// over ±[`weight_bound`].
    ///
    /// [`weight_bound`]: crate::genomics::GeneticConfig::weight_bound
    pub(crate) fn random_weight<R: Rng + ?Sized>(config: &GeneticConfig, rng: &mut R) -> f64 {
        let bound = config.weight_bound.abs();
        if bound > 0.0 {
            rng.gen_range(-bound..=bound)
        } else {
            0.0
        }
    }

    /// Mutates the connection's weight: with probability
    /// [`weight_perturbation_chance`] it is jittered by a
    /// Gaussian delta of deviation [`weight_perturbation_power`],
    /// otherwise it is reassigned uniformly. The result is
    /// clamped to ±[`weight_bound`].
    ///
    /// [`weight_perturbation_chance`]: crate::genomics::GeneticConfig::weight_perturbation_chance
    /// [`weight_perturbation_power`]: crate::genomics::GeneticConfig::weight_perturbation_power
    /// [`weight_bound`]: crate::genomics::GeneticConfig::weight_bound
    ///
    /// # Examples
    /// ```
    /// use tacneat_nn::genomics::{Connection, GeneticConfig};
    ///
    /// let config = GeneticConfig::default();
    /// let mut connection = Connection::new(0, 0, 1, 0.9, true);
    ///
    /// connection.mutate_weight(&config, &mut rand::thread_rng());
    /// assert!(connection.weight().abs() <= config.weight_bound);
    /// ```
    pub fn mutate_weight<R: Rng + ?Sized>(&mut self, config: &GeneticConfig, rng: &mut R) {
        if rng.gen::<f64>() < config.weight_perturbation_chance {
            // A non-positive deviation leaves the weight untouched.
            if let Ok(normal) = Normal::new(0.0, config.weight_perturbation_power) {
                self.weight += normal.sample(rng);
            }
        } else {
            self.weight = Self::random_weight(config, rng);
        }
        let bound = config.weight_bound.abs();
        // A NaN bound leaves the weight unclamped.
        self.weight = self.weight.max(-bound).min(bound);
    }

    /// Returns the connection's historical marking.
    pub fn marking(&self) -> Innovation {
        self.marking
    }

    /// Returns the id of the node the connection leaves.
    pub fn origin(&self) -> NodeId {
        self.origin
    }

    /// Returns the id of the node the connection feeds.
    pub fn destination(&self) -> NodeId {
        self.destination
    }

    /// Returns the connection's endpoints as `(origin, destination)`.
    pub fn endpoints(&self) -> (NodeId, NodeId) {
        (self.origin, self.destination)
    }

    /// Returns the connection's weight.
    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// Sets the connection's weight.
    pub fn set_weight(&mut self, w: f64) {
        self.weight = w;
    }

    /// Returns whether the connection carries signal.
    /// Disabled connections still deliver a zero contribution.
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Sets the connection's enabled status.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}

impl fmt::Display for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {}",
            self.marking, self.origin, self.destination, self.weight, self.enabled
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn weight_mutation_stays_in_bounds() {
        let config = GeneticConfig {
            weight_perturbation_power: 5.0,
            ..GeneticConfig::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut connection = Connection::new(0, 0, 1, 1.0, true);
        for _ in 0..1000 {
            connection.mutate_weight(&config, &mut rng);
            assert!(connection.weight().abs() <= config.weight_bound);
        }
    }

    #[test]
    fn reset_only_weight_mutation() {
        let config = GeneticConfig {
            weight_perturbation_chance: 0.0,
            weight_bound: 2.0,
            ..GeneticConfig::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let mut connection = Connection::new(0, 0, 1, 7.5, true);
        connection.mutate_weight(&config, &mut rng);
        assert_ne!(connection.weight(), 7.5);
        assert!(connection.weight().abs() <= 2.0);
    }

    #[test]
    fn negative_bound_acts_as_its_magnitude() {
        let config = GeneticConfig {
            weight_bound: -1.5,
            weight_perturbation_power: 4.0,
            ..GeneticConfig::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let mut connection = Connection::new(0, 0, 1, 0.0, true);
        for _ in 0..500 {
            connection.mutate_weight(&config, &mut rng);
            assert!(connection.weight().abs() <= 1.5);
        }
        let weight = Connection::random_weight(&config, &mut rng);
        assert!(weight.abs() <= 1.5);
    }

    #[test]
    fn nan_bound_does_not_panic() {
        let config = GeneticConfig {
            weight_bound: f64::NAN,
            ..GeneticConfig::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let mut connection = Connection::new(0, 0, 1, 0.25, true);
        for _ in 0..100 {
            connection.mutate_weight(&config, &mut rng);
            assert!(connection.weight().is_finite());
        }
    }

    #[test]
    fn display_matches_export_line() {
        let connection = Connection::new(3, 1, 4, -0.25, false);
        assert_eq!(connection.to_string(), "3 1 4 -0.25 false");
    }
}
