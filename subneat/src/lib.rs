//! An implementation of NeuroEvolution of Augmenting Topologies,
//! following the 2002 paper: <http://nn.cs.utexas.edu/keyword?stanley:ec02>
//!
//! Organisms are clustered into dynamically formed subspecies, which share
//! fitness among their members, are penalized when they stagnate, and are
//! allotted offspring in proportion to their adjusted fitness. When the whole
//! population stagnates, delta coding refocuses reproduction on the two best
//! subspecies.
//!
//! Genomic structures are user-defined via the [`Genome`] trait. A neural
//! network-based genome representation, as in the original algorithm, is
//! supplied by the `subneat-nn` crate. Every stochastic step draws from a
//! caller-supplied random number generator, so seeded runs are reproducible.
//! Generational population logging is supported by the [`logging`] module.
//!
//! # Example usage: Evolution of XOR function approximator, using `subneat-nn`
//! ```
//! use subneat::logging::{EvolutionLogger, ReportingLevel};
//! use subneat::{Population, PopulationConfig};
//! use subneat_nn::{
//!     genomics::{GeneticConfig, NNGenome},
//!     networks::FunctionApproximatorNetwork,
//! };
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//! use std::num::NonZeroUsize;
//!
//! fn evaluate_xor(genome: &NNGenome, config: &GeneticConfig) -> f32 {
//!     let mut network = FunctionApproximatorNetwork::new(genome, config);
//!
//!     let values = [
//!         ([0.0, 0.0], 0.0),
//!         ([0.0, 1.0], 1.0),
//!         ([1.0, 0.0], 1.0),
//!         ([1.0, 1.0], 0.0),
//!     ];
//!
//!     let mut error = 0.0;
//!     for (input, output) in values {
//!         match network.evaluate_at(&input) {
//!             Ok(answer) => error += (answer[0] - output).abs(),
//!             // Networks that cannot activate their outputs score nothing.
//!             Err(_) => return 0.0,
//!         }
//!     }
//!     (4.0 - error).powf(2.0)
//! }
//!
//! fn main() {
//!     let genetic_config = GeneticConfig {
//!         input_count: NonZeroUsize::new(2).unwrap(),
//!         ..GeneticConfig::default()
//!     };
//!     let population_config = PopulationConfig::default();
//!
//!     let mut rng = ChaCha8Rng::seed_from_u64(0);
//!     let mut population =
//!         Population::new(population_config, genetic_config.clone(), &mut rng).unwrap();
//!     let mut logger = EvolutionLogger::new(ReportingLevel::PopulationChampion);
//!     for _ in 0..20 {
//!         population.evaluate_fitness(|g| evaluate_xor(g, &genetic_config));
//!         logger.log(&population, &|g| [g.fitness(), g.genes().len() as f32], ["fitness", "genes"]);
//!         if let Err(e) = population.evolve(&mut rng) {
//!             eprintln!("{}", e);
//!             break;
//!         }
//!     }
//!
//!     for log in logger.iter() {
//!         println!("{}", log);
//!     }
//! }
//! ```

mod genome;
mod populations;

pub use genome::*;
pub use populations::*;
