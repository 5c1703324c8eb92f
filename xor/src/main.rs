use tacneat::logging::{EvolutionLogger, ReportingLevel, Stats};
use tacneat::{Population, PopulationConfig, Simulation};
use tacneat_nn::genomics::{suggested_file_name, GeneticConfig, LayeredGenome};
use tacneat_nn::networks::{Brain, FeedForwardNetwork};

use std::num::NonZeroUsize;

use rayon::prelude::*;
use tracing::{info, warn};
use tracing_subscriber::filter::EnvFilter;

const ERROR_MARGIN: f64 = 0.3;
const CASES: [([f64; 2], f64); 4] = [
    ([0.0, 0.0], 0.0),
    ([0.0, 1.0], 1.0),
    ([1.0, 0.0], 1.0),
    ([1.0, 1.0], 0.0),
];

fn evaluate_xor(genome: &LayeredGenome) -> f64 {
    let mut network = FeedForwardNetwork::from(genome);

    let mut errors = [0.0; 4];
    for (i, (input, output)) in CASES.iter().enumerate() {
        errors[i] = match network.evaluate(input) {
            Ok(result) => (result[0] - output).abs(),
            Err(_) => 1.0,
        };
        if errors[i] < ERROR_MARGIN {
            errors[i] = 0.0;
        }
    }

    (4.0 - errors.iter().sum::<f64>()).powi(2)
}

/// XOR as a ticked task: one case per tick, and a member
/// drops out once its accumulated error passes a budget.
struct XorRounds {
    brains: Vec<Brain>,
    error: Vec<f64>,
    score: Vec<f64>,
}

impl XorRounds {
    const ERROR_BUDGET: f64 = 3.0;

    fn new() -> XorRounds {
        XorRounds {
            brains: vec![],
            error: vec![],
            score: vec![],
        }
    }
}

impl Simulation<LayeredGenome> for XorRounds {
    fn begin_episode(&mut self, genomes: &[&LayeredGenome]) {
        self.brains = genomes
            .iter()
            .map(|g| Brain::from(*g))
            .collect();
        self.error = vec![0.0; genomes.len()];
        self.score = vec![0.0; genomes.len()];
    }

    fn is_active(&self, member: usize) -> bool {
        self.error[member] < Self::ERROR_BUDGET
    }

    fn act(&mut self, member: usize, tick: usize) {
        let (input, output) = CASES[tick % CASES.len()];
        let error = match self.brains[member].evaluate(&input) {
            Ok(result) => (result[0] - output).abs(),
            Err(_) => 1.0,
        };
        self.error[member] += error;
        self.score[member] += 1.0 - error;
    }

    fn end_tick(&mut self, _: usize) {}

    fn fitness(&self, member: usize) -> f64 {
        self.score[member]
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let genetic_config = GeneticConfig {
        input_count: NonZeroUsize::new(2).unwrap(),
        output_count: NonZeroUsize::new(1).unwrap(),
        weight_bound: 5.0,
        weight_mutation_rate: 0.8,
        weight_perturbation_chance: 0.9,
        weight_perturbation_power: 2.5,
        add_connection_chance: 0.05,
        add_node_chance: 0.03,
        common_weight_factor: 0.4,
        ..GeneticConfig::default()
    };
    let population_config = PopulationConfig {
        size: NonZeroUsize::new(150).unwrap(),
        initial_compatibility_threshold: 3.0,
        compatibility_modifier: 0.3,
        target_species_count: 10,
        survival_threshold: 0.2,
        initial_lifetime: 40,
        lifetime_increase: 20,
        generations_between_lifetime_increase: 10,
        ..PopulationConfig::default()
    };

    match ron::ser::to_string_pretty(
        &(&genetic_config, &population_config),
        ron::ser::PrettyConfig::default(),
    ) {
        Ok(text) => info!("configuration:\n{}", text),
        Err(e) => warn!("could not serialize configuration: {}", e),
    }

    stress_test(&genetic_config, &population_config);
    episode_test(&genetic_config, &population_config);
}

/// Evolves many independent, seeded populations in parallel
/// and reports how fast they solve XOR.
fn stress_test(genetic_config: &GeneticConfig, population_config: &PopulationConfig) {
    const ITERATIONS: u64 = 200;
    let generations: Vec<Option<usize>> = (0..ITERATIONS)
        .into_par_iter()
        .map(|seed| {
            let mut population: Population<_, _, LayeredGenome> =
                Population::with_seed(population_config.clone(), genetic_config.clone(), seed);
            for _ in 0..100 {
                population.evaluate_fitness(evaluate_xor);
                if population
                    .champion()
                    .map_or(false, |c| (c.fitness() - 16.0).abs() < f64::EPSILON)
                {
                    return Some(population.generation());
                }
                if let Err(e) = population.evolve() {
                    warn!(seed, "{}", e);
                    return None;
                }
            }
            None
        })
        .collect();

    println!(
        "Successful run generation count {:?}, {}% failure rate over {} iterations",
        Stats::from(generations.iter().filter_map(|g| g.map(|g| g as f64))),
        generations.iter().filter(|g| g.is_none()).count() as f64 * 100.0 / ITERATIONS as f64,
        ITERATIONS
    );
}

/// Evolves a population through ticked episodes, logging every
/// generation, and prints the final champion in brain file format.
fn episode_test(genetic_config: &GeneticConfig, population_config: &PopulationConfig) {
    let mut population: Population<_, _, LayeredGenome> =
        Population::with_seed(population_config.clone(), genetic_config.clone(), 2024);
    let mut logger = EvolutionLogger::new(ReportingLevel::NoGenomes);
    let mut simulation = XorRounds::new();

    for _ in 0..50 {
        let summary = population.run_episode(&mut simulation);
        logger.log(
            &population,
            &|s| [s.fitness(), s.genome().connections().count() as f64],
            ["fitness", "connections"],
        );
        if population.is_extinct() {
            info!(ticks = summary.ticks, "every member dropped out");
        }
        match population.evolve() {
            Ok(report) => info!("{}", report),
            Err(e) => {
                warn!("{}", e);
                break;
            }
        }
    }

    if let Some(log) = logger.iter().last() {
        println!("{}", log);
    }

    // Score the final generation before exporting its best member.
    population.specimens_mut().par_bridge().for_each(|specimen| {
        let fitness = evaluate_xor(specimen.genome());
        specimen.set_fitness(fitness);
    });
    let best = population
        .species()
        .filter_map(|s| s.champion().map(|c| (s.id(), c)))
        .max_by(|(_, a), (_, b)| a.fitness().total_cmp(&b.fitness()));
    if let Some((species, champion)) = best {
        println!(
            "{}:\n{}",
            suggested_file_name(species.0, champion.fitness()),
            champion.genome().export()
        );
    }
}
