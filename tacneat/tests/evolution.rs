use tacneat::{Population, PopulationConfig, Simulation};
use tacneat_nn::genomics::{GeneticConfig, History, LayeredGenome};
use tacneat_nn::networks::FeedForwardNetwork;

use std::num::NonZeroUsize;

/// Agents walk along a line; each tick their network picks a step
/// from their position. Agents stepping past either end are out.
struct Corridor {
    networks: Vec<FeedForwardNetwork>,
    positions: Vec<f64>,
    pending: Vec<f64>,
    travelled: Vec<f64>,
}

impl Corridor {
    const LENGTH: f64 = 10.0;

    fn new() -> Corridor {
        Corridor {
            networks: vec![],
            positions: vec![],
            pending: vec![],
            travelled: vec![],
        }
    }
}

impl Simulation<LayeredGenome> for Corridor {
    fn begin_episode(&mut self, genomes: &[&LayeredGenome]) {
        self.networks = genomes.iter().map(|g| FeedForwardNetwork::new(g)).collect();
        self.positions = vec![Self::LENGTH / 2.0; genomes.len()];
        self.pending = vec![0.0; genomes.len()];
        self.travelled = vec![0.0; genomes.len()];
    }

    fn is_active(&self, member: usize) -> bool {
        (0.0..=Self::LENGTH).contains(&self.positions[member])
    }

    fn act(&mut self, member: usize, _: usize) {
        let position = self.positions[member] / Self::LENGTH;
        let output = self.networks[member]
            .evaluate(&[position])
            .map_or(0.5, |o| o[0]);
        self.pending[member] = output - 0.5;
    }

    fn end_tick(&mut self, _: usize) {
        for member in 0..self.positions.len() {
            let step = std::mem::take(&mut self.pending[member]);
            self.positions[member] += step;
            self.travelled[member] += step.abs();
        }
    }

    fn fitness(&self, member: usize) -> f64 {
        self.travelled[member]
    }
}

fn genetic_config() -> GeneticConfig {
    GeneticConfig {
        input_count: NonZeroUsize::new(1).unwrap(),
        output_count: NonZeroUsize::new(1).unwrap(),
        ..GeneticConfig::default()
    }
}

fn population_config() -> PopulationConfig {
    PopulationConfig {
        size: NonZeroUsize::new(40).unwrap(),
        initial_compatibility_threshold: 1.0,
        target_species_count: 4,
        initial_lifetime: 30,
        lifetime_increase: 10,
        generations_between_lifetime_increase: 3,
        ..PopulationConfig::default()
    }
}

fn evolve_corridor(
    seed: u64,
    generations: usize,
) -> Population<GeneticConfig, History, LayeredGenome> {
    let mut population = Population::with_seed(population_config(), genetic_config(), seed);
    let mut corridor = Corridor::new();
    for _ in 0..generations {
        let summary = population.run_episode(&mut corridor);
        assert!(summary.ticks <= population.lifetime());
        population.evolve().unwrap();
    }
    population
}

#[test]
fn corridor_population_keeps_its_shape() {
    let population = evolve_corridor(17, 12);

    assert_eq!(population.generation(), 12);
    assert_eq!(population.lifetime(), 70);
    assert_eq!(population.specimens().count(), 40);
    assert!(population.species().all(|s| !s.is_empty()));
    assert!(population.compatibility_threshold() >= 0.2);
    for genome in population.genomes() {
        assert!(!genome.has_cycle());
        assert!(genome.is_consistently_layered());
        assert!(genome.evaluate(&[0.5]).is_ok());
    }
}

#[test]
fn seeded_runs_are_reproducible() {
    let export = |population: &Population<_, _, LayeredGenome>| {
        population.genomes().map(|g| g.export()).collect::<Vec<_>>()
    };
    assert_eq!(export(&evolve_corridor(5, 6)), export(&evolve_corridor(5, 6)));
}

#[test]
fn seeded_population_respects_imported_innovations() {
    let text = "3\n\nN\n0 Input 0 1\nN\n1 Input 0 1\nN\n2 Output 2 3\nN\n7 Hidden 1 1\n\n\
        C\n0 0 2 0.5 true\nC\n1 1 2 -1 false\nC\n12 1 7 1 true\nC\n13 7 2 -1 true\n";
    let base = LayeredGenome::import(text).unwrap();

    let mut population =
        Population::new_seeded(base.clone(), population_config(), genetic_config());
    population.reseed(3);
    for _ in 0..5 {
        population.evaluate_fitness(|g| {
            let output = g.evaluate(&[1.0]).map_or(0.0, |o| o[0]);
            1.0 - (output - 0.25).abs()
        });
        population.evolve().unwrap();
    }

    for genome in population.genomes() {
        for connection in genome.connections() {
            if let Some(original) = base.connection(connection.marking()) {
                assert_eq!(connection.endpoints(), original.endpoints());
            }
        }
        for node in genome.nodes().filter(|n| n.id() == 7) {
            assert_eq!(Some(node.node_type()), base.node(7).map(|n| n.node_type()));
        }
    }
}
