use tacneat_nn::genomics::{GeneticConfig, History, LayeredGenome, LedgerPolicy, NodeType};
use tacneat_nn::networks::FeedForwardNetwork;

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

use std::collections::HashSet;
use std::num::NonZeroUsize;

fn config() -> GeneticConfig {
    GeneticConfig {
        input_count: NonZeroUsize::new(3).unwrap(),
        output_count: NonZeroUsize::new(2).unwrap(),
        weight_bound: 2.0,
        weight_mutation_rate: 0.5,
        weight_perturbation_chance: 0.8,
        weight_perturbation_power: 0.5,
        add_connection_chance: 0.6,
        add_node_chance: 0.4,
        disabled_gene_stays_disabled_chance: 0.75,
        excess_gene_factor: 1.0,
        disjoint_gene_factor: 1.0,
        common_weight_factor: 0.4,
        ledger_policy: LedgerPolicy::PerGeneration,
    }
}

fn assert_well_formed(genome: &LayeredGenome) {
    assert!(!genome.has_cycle(), "cycle in {}", genome);
    assert!(genome.is_consistently_layered(), "bad layering in {}", genome);

    let top = genome.layer_count() - 1;
    for node in genome.nodes() {
        match node.node_type() {
            NodeType::Input => assert_eq!(node.layer(), 0),
            NodeType::Output => assert_eq!(node.layer(), top),
            NodeType::Hidden => assert!(node.layer() > 0 && node.layer() < top),
        }
    }

    let mut markings = HashSet::new();
    let mut endpoints = HashSet::new();
    for connection in genome.connections() {
        assert!(markings.insert(connection.marking()));
        assert!(endpoints.insert(connection.endpoints()));
        assert!(genome.node(connection.origin()).is_some());
        assert!(genome.node(connection.destination()).is_some());
    }
    assert!(genome
        .connections()
        .zip(genome.connections().skip(1))
        .all(|(a, b)| a.marking() < b.marking()));

    assert_eq!(LayeredGenome::import(&genome.export()).as_ref(), Ok(genome));
    let outputs = genome.evaluate(&[0.2, -0.4, 0.9]).unwrap();
    assert_eq!(outputs.len(), 2);
    assert!(outputs.iter().all(|o| (0.0..=1.0).contains(o)));
}

#[test]
fn random_lineages_stay_well_formed() {
    let config = config();
    let mut rng = ChaCha8Rng::seed_from_u64(11);
    let mut history = History::new(&config);
    let mut pool: Vec<LayeredGenome> = (0..20)
        .map(|_| LayeredGenome::new(&config, &mut rng))
        .collect();

    for step in 0..400 {
        let child = if rng.gen_bool(0.5) {
            let mut child = pool.choose(&mut rng).unwrap().clone();
            child.mutate_all(&mut history, &config, &mut rng);
            child
        } else {
            let better = pool.choose(&mut rng).unwrap();
            let worse = pool.choose(&mut rng).unwrap();
            let equal_fitness = rng.gen_bool(0.3);
            LayeredGenome::crossover(better, worse, equal_fitness, &config, &mut rng)
        };
        assert_well_formed(&child);

        let slot = rng.gen_range(0..pool.len());
        pool[slot] = child;
        if step % 20 == 19 {
            history.advance_generation();
        }
    }

    // Lineages should have grown some structure along the way.
    assert!(pool.iter().any(|g| g.layer_count() > 2));
}

#[test]
fn genesis_layout() {
    let config = config();
    let history = History::new(&config);
    let genome = LayeredGenome::new(&config, &mut ChaCha8Rng::seed_from_u64(0));

    assert_eq!(genome.nodes().count(), 6);
    assert_eq!(genome.node(0).unwrap().node_type(), NodeType::Input);
    assert_eq!(genome.node(4).unwrap().node_type(), NodeType::Output);
    assert_eq!(genome.node(5).unwrap().input_count(), 4);
    assert_eq!(genome.layer_count(), 2);
    assert_eq!(genome.connections().count(), 8);
    assert_eq!(genome.connection(5).unwrap().endpoints(), (2, 5));
    assert_eq!(history.lookup_connection(2, 5), Some(5));
    assert_eq!(history.next_marking(), 8);
    assert_eq!(history.next_node(), 6);
    assert_well_formed(&genome);
}

#[test]
fn split_connection_keeps_signal_path() {
    let config = GeneticConfig {
        weight_bound: 1.0,
        ..GeneticConfig::zero()
    };
    let mut genome: LayeredGenome = "2\n\nN\n0 Input 0 1\nN\n1 Input 0 1\nN\n2 Output 1 2\n\n\
        C\n0 0 2 0.7 true\nC\n1 1 2 0.7 true\n"
        .parse()
        .unwrap();
    let mut history = History::new(&config);
    genome.register_innovations(&mut history);

    let new_node = genome
        .mutate_add_node(&mut history, &mut ChaCha8Rng::seed_from_u64(4))
        .unwrap();

    assert_eq!(new_node, 3);
    assert_eq!(genome.node(3).unwrap().layer(), 1);
    assert_eq!(genome.node(2).unwrap().layer(), 2);
    assert_eq!(genome.node(2).unwrap().input_count(), 3);
    assert_eq!(genome.layer_count(), 3);
    assert_eq!(genome.connections().filter(|c| !c.enabled()).count(), 1);
    assert_eq!(genome.connection(2).unwrap().weight(), 1.0);
    assert_eq!(genome.connection(2).unwrap().destination(), 3);
    assert_eq!(genome.connection(3).unwrap().weight(), 0.7);
    assert_eq!(genome.connection(3).unwrap().endpoints(), (3, 2));
}

#[test]
fn identical_mutations_share_innovations_within_a_generation() {
    let config = config();
    let mut history = History::new(&config);
    let genesis = LayeredGenome::new(&config, &mut ChaCha8Rng::seed_from_u64(1));

    let mut a = genesis.clone();
    let mut b = genesis.clone();
    a.mutate_add_node(&mut history, &mut ChaCha8Rng::seed_from_u64(2))
        .unwrap();
    b.mutate_add_node(&mut history, &mut ChaCha8Rng::seed_from_u64(2))
        .unwrap();
    assert_eq!(a, b);
    assert_eq!(history.next_marking(), 10);
    assert_eq!(history.next_node(), 7);

    history.advance_generation();
    let mut c = genesis;
    c.mutate_add_node(&mut history, &mut ChaCha8Rng::seed_from_u64(2))
        .unwrap();
    assert_ne!(a, c);
    assert_eq!(c.max_marking(), Some(11));
}

#[test]
fn crossover_conserves_genes() {
    let config = config();
    let mut rng = ChaCha8Rng::seed_from_u64(21);
    let mut history = History::new(&config);

    let mut better = LayeredGenome::new(&config, &mut rng);
    better.mutate_add_node(&mut history, &mut rng).unwrap();
    better.mutate_add_node(&mut history, &mut rng).unwrap();
    let mut worse = LayeredGenome::new(&config, &mut rng);
    worse.mutate_add_node(&mut history, &mut rng).unwrap();

    for _ in 0..20 {
        let child = LayeredGenome::crossover(&better, &worse, false, &config, &mut rng);
        let markings: Vec<_> = child.connections().map(|c| c.marking()).collect();
        let expected: Vec<_> = better.connections().map(|c| c.marking()).collect();
        assert_eq!(markings, expected);
        for connection in child.connections() {
            let weights: Vec<f64> = [&better, &worse]
                .iter()
                .filter_map(|p| p.connection(connection.marking()))
                .map(|c| c.weight())
                .collect();
            assert!(weights.contains(&connection.weight()));
        }

        let child = LayeredGenome::crossover(&better, &worse, true, &config, &mut rng);
        assert!(child
            .connections()
            .all(|c| better.connection(c.marking()).is_some()
                || worse.connection(c.marking()).is_some()));
        assert_well_formed(&child);
    }
}

#[test]
fn compatibility_distance_is_symmetric() {
    let config = config();
    let mut rng = ChaCha8Rng::seed_from_u64(8);
    let mut history = History::new(&config);
    let mut genomes: Vec<LayeredGenome> = vec![];
    for _ in 0..10 {
        let mut genome = LayeredGenome::new(&config, &mut rng);
        for _ in 0..5 {
            genome.mutate_all(&mut history, &config, &mut rng);
        }
        genomes.push(genome);
    }

    for a in &genomes {
        assert_eq!(LayeredGenome::compatibility_distance(a, a, &config), 0.0);
        for b in &genomes {
            let ab = LayeredGenome::compatibility_distance(a, b, &config);
            let ba = LayeredGenome::compatibility_distance(b, a, &config);
            assert!((ab - ba).abs() < 1e-9);
            assert!(ab >= 0.0);
        }
    }
}

#[test]
fn seeded_lineages_are_reproducible() {
    let run = |seed| {
        let config = config();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut history = History::new(&config);
        let mut genome = LayeredGenome::new(&config, &mut rng);
        for _ in 0..50 {
            genome.mutate_all(&mut history, &config, &mut rng);
        }
        genome
    };
    assert_eq!(run(3), run(3));
    assert_ne!(run(3), run(4));
}

#[test]
fn networks_are_reusable() {
    let config = config();
    let mut rng = ChaCha8Rng::seed_from_u64(5);
    let mut history = History::new(&config);
    let mut genome = LayeredGenome::new(&config, &mut rng);
    for _ in 0..30 {
        genome.mutate_all(&mut history, &config, &mut rng);
    }

    let mut network = FeedForwardNetwork::new(&genome);
    for inputs in [[0.0, 0.0, 0.0], [1.0, -1.0, 0.5], [0.0, 0.0, 0.0]] {
        let first = network.evaluate(&inputs).unwrap();
        assert_eq!(network.evaluate(&inputs).unwrap(), first);
        assert_eq!(genome.evaluate(&inputs).unwrap(), first);
    }
}

#[test]
fn serde_round_trip() {
    let config = config();
    let mut rng = ChaCha8Rng::seed_from_u64(6);
    let mut history = History::new(&config);
    let mut genome = LayeredGenome::new(&config, &mut rng);
    for _ in 0..20 {
        genome.mutate_all(&mut history, &config, &mut rng);
    }

    let json = serde_json::to_string(&genome).unwrap();
    let restored: LayeredGenome = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, genome);
    for inputs in [[0.0, 0.0, 0.0], [0.3, -0.7, 1.0]] {
        assert_eq!(restored.evaluate(&inputs), genome.evaluate(&inputs));
    }
}
