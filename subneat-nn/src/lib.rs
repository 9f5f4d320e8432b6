//! # subneat-nn
//! A neural network-based implementation of the [`subneat` crate](../subneat/index.html)'s `Genome` trait.
//!
//! Provides an [`NNGenome`] type usable in `subneat` `Population`s, the
//! [`History`] innovation ledger that keeps structural mutations aligned
//! across genomes, and two phenotypes generated from an [`NNGenome`]:
//! - [`Network`]: the relaxation-based network, loaded with sensor values
//!   and activated pass by pass.
//! - [`FunctionApproximatorNetwork`]: a wrapper that relaxes the network
//!   through its full depth for each query, best suited for
//!   single-output-per-input function approximation tasks.
//!
//! [`NNGenome`]: crate::genomics::NNGenome
//! [`History`]: crate::genomics::History
//! [`Network`]: crate::networks::Network
//! [`FunctionApproximatorNetwork`]: crate::networks::FunctionApproximatorNetwork
//!
//! # Example usage: Evolution of XOR function approximator
//! ```
//! use subneat::{Population, PopulationConfig};
//! use subneat_nn::{
//!     genomics::{GeneticConfig, NNGenome},
//!     networks::{ActivationError, FunctionApproximatorNetwork},
//! };
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//! use std::num::NonZeroUsize;
//!
//! // Allowed error margin for neural net answers.
//! const ERROR_MARGIN: f32 = 0.3;
//!
//! fn evaluate_xor(genome: &NNGenome, config: &GeneticConfig) -> Result<f32, ActivationError> {
//!     let mut network = FunctionApproximatorNetwork::new(genome, config);
//!
//!     let values = [
//!         ([0.0, 0.0], 0.0),
//!         ([0.0, 1.0], 1.0),
//!         ([1.0, 0.0], 1.0),
//!         ([1.0, 1.0], 0.0),
//!     ];
//!
//!     let mut errors = [0.0, 0.0, 0.0, 0.0];
//!     for (i, (input, output)) in values.iter().enumerate() {
//!         errors[i] = (network.evaluate_at(input)?[0] - output).abs();
//!         if errors[i] < ERROR_MARGIN {
//!             errors[i] = 0.0;
//!         }
//!     }
//!
//!     Ok((4.0 - errors.iter().copied().sum::<f32>()).powf(2.0))
//! }
//!
//! fn main() {
//!     let genetic_config = GeneticConfig {
//!         input_count: NonZeroUsize::new(2).unwrap(),
//!         output_count: NonZeroUsize::new(1).unwrap(),
//!         ..GeneticConfig::default()
//!     };
//!     let population_config = PopulationConfig {
//!         size: NonZeroUsize::new(150).unwrap(),
//!         ..PopulationConfig::default()
//!     };
//!
//!     let mut rng = ChaCha8Rng::seed_from_u64(42);
//!     let mut population =
//!         Population::new(population_config, genetic_config.clone(), &mut rng).unwrap();
//!     for _ in 0..100 {
//!         // Networks whose outputs cannot be activated score nothing.
//!         population.evaluate_fitness(|g| evaluate_xor(g, &genetic_config).unwrap_or(0.0));
//!         if (population.champion().fitness() - 16.0).abs() < f32::EPSILON {
//!             println!("Solution found!: {}", serde_json::to_string(population.champion()).unwrap());
//!             break;
//!         }
//!         if let Err(e) = population.evolve(&mut rng) {
//!             eprintln!("{}", e);
//!             break;
//!         }
//!     }
//! }
//! ```

pub mod genomics;
pub mod networks;

/// Identifier type used to designate historically
/// identical mutations for the purposes of
/// genome comparison and genetic tracking.
pub type Innovation = usize;

/// Identifier of a node, unique within a genome and
/// shared by every genome that inherited the same node.
pub type NodeId = usize;
