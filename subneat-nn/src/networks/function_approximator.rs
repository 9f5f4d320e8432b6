use super::{ActivationError, Network};
use crate::genomics::{GeneticConfig, NNGenome};

/// A neural network best suited for function
/// approximation.
///
/// Every query starts from a flushed network and relaxes it
/// once more than its depth, so signals from every sensor
/// reach every output.
#[derive(Clone, Debug)]
pub struct FunctionApproximatorNetwork {
    network: Network,
    depth: usize,
}

impl FunctionApproximatorNetwork {
    /// Generates a new network from the passed genome.
    ///
    /// # Examples
    /// ```
    /// use subneat_nn::genomics::{GeneticConfig, NNGenome};
    /// use subneat_nn::networks::FunctionApproximatorNetwork;
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha8Rng;
    ///
    /// let config = GeneticConfig::default();
    /// let genome = NNGenome::new(&config, &mut ChaCha8Rng::seed_from_u64(0));
    /// let network = FunctionApproximatorNetwork::new(&genome, &config);
    ///
    /// assert_eq!(network.depth(), 1);
    /// ```
    pub fn new(genome: &NNGenome, config: &GeneticConfig) -> FunctionApproximatorNetwork {
        let mut network = genome.create_network(config);
        let depth = network.max_depth();
        FunctionApproximatorNetwork { network, depth }
    }

    /// Returns the approximated function's value
    /// at the N-dimensional point given by `inputs`.
    ///
    /// # Errors
    /// Returns an error if the network's outputs
    /// cannot be activated.
    ///
    /// # Examples
    /// ```
    /// use subneat_nn::genomics::{GeneticConfig, NNGenome, NodePlace};
    /// use subneat_nn::networks::FunctionApproximatorNetwork;
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha8Rng;
    ///
    /// fn sigmoid(x: f32) -> f32 {
    ///     1.0 / (1.0 + (-4.924273 * x).exp())
    /// }
    ///
    /// let config = GeneticConfig {
    ///     max_network_depth: 10,
    ///     ..GeneticConfig::zero()
    /// };
    /// let mut genome = NNGenome::new(&config, &mut ChaCha8Rng::seed_from_u64(0));
    /// genome.add_node(2, NodePlace::Hidden);
    /// genome.add_gene(0, 0, 2, 1.0);
    /// genome.add_gene(1, 2, 1, 1.0);
    /// let mut network = FunctionApproximatorNetwork::new(&genome, &config);
    ///
    /// for input in -20..=20 {
    ///     let input = input as f32 / 10.0;
    ///     assert_eq!(network.evaluate_at(&[input]).unwrap()[0], sigmoid(sigmoid(input)));
    /// }
    /// ```
    pub fn evaluate_at(&mut self, inputs: &[f32]) -> Result<Vec<f32>, ActivationError> {
        self.network.flush();
        self.network.load_sensors(inputs);
        for _ in 0..=self.depth {
            self.network.activate()?;
        }
        Ok(self.network.outputs())
    }

    /// Returns the depth measured when the network was built.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Returns the underlying network.
    pub fn network(&self) -> &Network {
        &self.network
    }
}
