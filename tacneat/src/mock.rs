//! A one-dimensional genome for exercising the population engine.
use crate::{Genome, InnovationHistory};

use rand::Rng;

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Scalar(pub f64);

#[derive(Clone, Debug)]
pub(crate) struct ScalarConfig {
    /// Genesis values are drawn from `[0, spread)`.
    pub spread: f64,
    /// Added to the value on every mutation.
    pub step: f64,
}

#[derive(Debug, Default)]
pub(crate) struct Ledger {
    pub generations: usize,
    pub mutations: usize,
    pub registered: Vec<f64>,
}

impl InnovationHistory for Ledger {
    type Config = ScalarConfig;

    fn new(_: &ScalarConfig) -> Ledger {
        Ledger::default()
    }

    fn advance_generation(&mut self) {
        self.generations += 1;
    }
}

impl Genome for Scalar {
    type Config = ScalarConfig;
    type InnovationHistory = Ledger;

    fn new<R: Rng + ?Sized>(config: &ScalarConfig, rng: &mut R) -> Scalar {
        if config.spread > 0.0 {
            Scalar(rng.gen_range(0.0..config.spread))
        } else {
            Scalar(0.0)
        }
    }

    fn compatibility_distance(first: &Scalar, second: &Scalar, _: &ScalarConfig) -> f64 {
        (first.0 - second.0).abs()
    }

    fn crossover<R: Rng + ?Sized>(
        better: &Scalar,
        worse: &Scalar,
        equal_fitness: bool,
        _: &ScalarConfig,
        _: &mut R,
    ) -> Scalar {
        if equal_fitness {
            Scalar((better.0 + worse.0) / 2.0)
        } else {
            better.clone()
        }
    }

    fn mutate<R: Rng + ?Sized>(&mut self, history: &mut Ledger, config: &ScalarConfig, _: &mut R) {
        history.mutations += 1;
        self.0 += config.step;
    }

    fn register_innovations(&self, history: &mut Ledger) {
        history.registered.push(self.0);
    }
}
