use subneat::logging::Stats;
use subneat::{Population, PopulationConfig};
use subneat_nn::genomics::{GeneticConfig, History, NNGenome};
use subneat_nn::networks::FunctionApproximatorNetwork;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use std::error::Error;
use std::num::NonZeroUsize;

type XorPopulation = Population<GeneticConfig, History, NNGenome>;
type BoxError = Box<dyn Error + Send + Sync>;

const ERROR_MARGIN: f32 = 0.3;
const PERFECT_FITNESS: f32 = 16.0;
const MAX_GENERATIONS: usize = 100;
const ITERATIONS: u64 = 100;

fn evaluate_xor(genome: &NNGenome, config: &GeneticConfig) -> f32 {
    let mut network = FunctionApproximatorNetwork::new(genome, config);

    let values = [
        ([0.0, 0.0], 0.0),
        ([0.0, 1.0], 1.0),
        ([1.0, 0.0], 1.0),
        ([1.0, 1.0], 0.0),
    ];

    let mut errors = [0.0; 4];
    for (error, (input, output)) in errors.iter_mut().zip(values) {
        // Networks whose outputs never activate are worthless.
        let Ok(answer) = network.evaluate_at(&input) else {
            return 0.0;
        };
        *error = (answer[0] - output).abs();
        if *error < ERROR_MARGIN {
            *error = 0.0;
        }
    }

    (4.0 - errors.iter().sum::<f32>()).powf(2.0)
}

/// Evaluates every organism in parallel.
fn evaluate(population: &mut XorPopulation, config: &GeneticConfig) {
    let mut organisms: Vec<_> = population.organisms_mut().collect();
    organisms.par_iter_mut().for_each(|organism| {
        let fitness = evaluate_xor(organism.genome(), config);
        organism.set_fitness(fitness);
    });
}

fn solved(population: &XorPopulation) -> bool {
    (population.champion().fitness() - PERFECT_FITNESS).abs() < f32::EPSILON
}

/// Evolves a fresh population until it solves XOR, returning
/// the generation it did so in.
fn run(
    seed: u64,
    genetic_config: &GeneticConfig,
    population_config: &PopulationConfig,
) -> Result<Option<usize>, BoxError> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut population =
        XorPopulation::new(population_config.clone(), genetic_config.clone(), &mut rng)?;
    for _ in 0..MAX_GENERATIONS {
        evaluate(&mut population, genetic_config);
        if solved(&population) {
            return Ok(Some(population.generation()));
        }
        population.evolve(&mut rng)?;
    }
    Ok(None)
}

fn stress_test(
    genetic_config: &GeneticConfig,
    population_config: &PopulationConfig,
) -> Result<(), BoxError> {
    let generations = (0..ITERATIONS)
        .into_par_iter()
        .map(|seed| run(seed, genetic_config, population_config))
        .collect::<Result<Vec<_>, _>>()?;

    let failures = generations.iter().filter(|g| g.is_none()).count();
    info!(
        "Successful run generation count {:?}, {}% failure rate over {} iterations",
        Stats::from(generations.iter().flatten().map(|&g| g as f32)),
        failures as f32 * 100.0 / ITERATIONS as f32,
        ITERATIONS
    );
    Ok(())
}

/// Saves a population midway, restores it, and
/// keeps evolving it until it finds a solution.
fn serde_test(
    genetic_config: &GeneticConfig,
    population_config: &PopulationConfig,
) -> Result<(), BoxError> {
    let mut rng = ChaCha8Rng::seed_from_u64(ITERATIONS);
    let mut population =
        XorPopulation::new(population_config.clone(), genetic_config.clone(), &mut rng)?;
    for _ in 0..MAX_GENERATIONS / 2 {
        evaluate(&mut population, genetic_config);
        population.evolve(&mut rng)?;
    }

    let saved = ron::to_string(&population)?;
    let mut population: XorPopulation = ron::from_str(&saved)?;
    for _ in 0..MAX_GENERATIONS {
        evaluate(&mut population, genetic_config);
        if solved(&population) {
            info!(
                generation = population.generation(),
                "solution found: {}",
                ron::to_string(population.champion())?
            );
            return Ok(());
        }
        population.evolve(&mut rng)?;
    }
    warn!("restored population found no solution");
    Ok(())
}

fn main() -> Result<(), BoxError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let genetic_config = GeneticConfig {
        input_count: NonZeroUsize::new(2).unwrap(),
        output_count: NonZeroUsize::new(1).unwrap(),
        ..GeneticConfig::default()
    };
    let population_config = PopulationConfig {
        size: NonZeroUsize::new(150).unwrap(),
        ..PopulationConfig::default()
    };

    stress_test(&genetic_config, &population_config)?;
    serde_test(&genetic_config, &population_config)
}
