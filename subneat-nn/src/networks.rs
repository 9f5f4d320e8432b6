//! A [`Network`] is the phenotype of an [`NNGenome`]: its nodes
//! become neurons in an arena, and its enabled genes become
//! links holding arena indices. Disabled genes are ignored.
//!
//! Networks are activated by relaxation. Sensor values are loaded,
//! then every neuron fires from the activations of its incoming
//! links, pass after pass, until every output has fired. Neurons
//! are visited in topological order over feed-forward links, so a
//! genome without recurrent genes settles in a single pass.
//!
//! For single-query use, such as function approximation, the
//! [`FunctionApproximatorNetwork`] wrapper is more convenient.
//!
//! [`NNGenome`]: crate::genomics::NNGenome
mod errors;
mod function_approximator;
mod link;
mod neuron;

pub use errors::ActivationError;
pub use function_approximator::FunctionApproximatorNetwork;
pub use link::Link;
pub use neuron::Neuron;

use crate::genomics::{NNGenome, NodePlace};

use ahash::RandomState;

use std::collections::{HashMap, VecDeque};
use std::fmt;

/// Recursion depth past which [`Network::max_depth`]
/// gives up and reports [`DEPTH_SENTINEL`].
const MAX_DEPTH_RECURSION: usize = 100;
/// Depth reported for networks too deep to measure.
const DEPTH_SENTINEL: usize = 10;

/// An arbitrarily-structured neural network.
#[derive(Clone, Debug)]
pub struct Network {
    neurons: Box<[Neuron]>,
    links: Box<[Link]>,
    inputs: Box<[usize]>,
    biases: Box<[usize]>,
    outputs: Box<[usize]>,
    order: Box<[usize]>,
    max_passes: usize,
}

impl Network {
    /// Builds the network expressed by `genome`. Activation
    /// gives up after `max_passes` passes.
    ///
    /// Neurons keep the genome's node order, and links
    /// the genome's gene order.
    ///
    /// # Examples
    /// ```
    /// use subneat_nn::genomics::{GeneticConfig, NNGenome};
    /// use subneat_nn::networks::Network;
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha8Rng;
    /// use std::num::NonZeroUsize;
    ///
    /// let mut genome = NNGenome::new(&GeneticConfig {
    ///     input_count: NonZeroUsize::new(3).unwrap(),
    ///     output_count: NonZeroUsize::new(2).unwrap(),
    ///     initial_expression_chance: 1.0,
    ///     ..GeneticConfig::zero()
    /// }, &mut ChaCha8Rng::seed_from_u64(0));
    /// genome.gene_mut(0).unwrap().set_enabled(false);
    ///
    /// let network = Network::new(&genome, 10);
    ///
    /// assert_eq!(network.neurons().len(), 5);
    /// assert_eq!(network.links().len(), 3 * 2 - 1);
    /// ```
    pub fn new(genome: &NNGenome, max_passes: usize) -> Network {
        let mut neurons: Vec<_> = genome
            .nodes()
            .iter()
            .map(|n| Neuron::new(n.id(), n.place()))
            .collect();
        let index_of: HashMap<_, _, RandomState> = genome
            .nodes()
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id(), i))
            .collect();

        let mut links = vec![];
        for gene in genome.genes().iter().filter(|g| g.enabled()) {
            if let (Some(&input), Some(&output)) =
                (index_of.get(&gene.input()), index_of.get(&gene.output()))
            {
                neurons[output].incoming.push(links.len());
                links.push(Link::new(gene, input, output));
            }
        }

        let placed = |place: NodePlace| -> Box<[usize]> {
            neurons
                .iter()
                .enumerate()
                .filter(|(_, n)| n.place() == place)
                .map(|(i, _)| i)
                .collect()
        };
        let inputs = placed(NodePlace::Input);
        let biases = placed(NodePlace::Bias);
        let outputs = placed(NodePlace::Output);
        let order = evaluation_order(&neurons, &links);

        Network {
            neurons: neurons.into(),
            links: links.into(),
            inputs,
            biases,
            outputs,
            order,
            max_passes,
        }
    }

    /// Loads the input neurons with `values`, in node order,
    /// and every bias neuron with 1.0.
    ///
    /// # Panics
    /// This function panics if the length of `values` is not
    /// the number of input neurons in the network.
    pub fn load_sensors(&mut self, values: &[f32]) {
        assert_eq!(
            values.len(),
            self.inputs.len(),
            "sensor value count must match the network's input count"
        );
        for (&i, &value) in self.inputs.iter().zip(values) {
            self.neurons[i].load(value);
        }
        for &i in self.biases.iter() {
            self.neurons[i].load(1.0);
        }
    }

    /// Relaxes the network until every output neuron has fired
    /// at least once, running at least one pass. Returns the
    /// number of passes taken.
    ///
    /// Each pass, every non-sensor neuron sums its incoming
    /// links' weighted signals (the previous activation for
    /// time-delayed links) and fires through a sigmoid if any
    /// undelayed link carried an active signal.
    ///
    /// Neurons are summed and fired one at a time in feed-forward
    /// order, so a recurrent link whose source fires earlier in the
    /// pass reads that source's new output, not the previous pass's.
    /// Acyclic networks are unaffected.
    ///
    /// # Errors
    /// Returns an error if the outputs have not all fired
    /// after the network's pass budget.
    ///
    /// # Examples
    /// ```
    /// use subneat_nn::genomics::{GeneticConfig, NNGenome};
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha8Rng;
    ///
    /// let config = GeneticConfig::default();
    /// let genome = NNGenome::new(&config, &mut ChaCha8Rng::seed_from_u64(0));
    ///
    /// let mut network = genome.create_network(&config);
    /// network.load_sensors(&[1.0]);
    ///
    /// // Networks without recurrent links settle in one pass.
    /// assert_eq!(network.activate(), Ok(1));
    /// ```
    pub fn activate(&mut self) -> Result<usize, ActivationError> {
        let mut passes = 0;
        while passes == 0 || self.outputs_off() {
            if passes == self.max_passes {
                return Err(ActivationError::OutputsUnreachable { passes });
            }
            for &n in self.order.iter() {
                let (sum, active) = self.neurons[n].incoming.iter().fold(
                    (0.0, false),
                    |(sum, active), &l| {
                        let link = &self.links[l];
                        let source = &self.neurons[link.input];
                        if link.time_delay {
                            (sum + link.weight * source.delayed_output(), active)
                        } else {
                            (
                                sum + link.weight * source.output(),
                                active || source.active() || source.is_sensor(),
                            )
                        }
                    },
                );
                self.neurons[n].fire(sum, active);
            }
            passes += 1;
        }
        Ok(passes)
    }

    fn outputs_off(&self) -> bool {
        self.outputs
            .iter()
            .any(|&i| self.neurons[i].activation_count() == 0)
    }

    /// Returns the current activations of the output
    /// neurons, in node order.
    pub fn outputs(&self) -> Vec<f32> {
        self.outputs
            .iter()
            .map(|&i| self.neurons[i].activation())
            .collect()
    }

    /// Resets the runtime state of every neuron.
    ///
    /// # Examples
    /// ```
    /// use subneat_nn::genomics::{GeneticConfig, NNGenome};
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha8Rng;
    ///
    /// let config = GeneticConfig::default();
    /// let genome = NNGenome::new(&config, &mut ChaCha8Rng::seed_from_u64(0));
    ///
    /// let mut network = genome.create_network(&config);
    /// network.load_sensors(&[1.0]);
    /// network.activate().unwrap();
    ///
    /// network.flush();
    ///
    /// assert_eq!(network.outputs(), [0.0]);
    /// assert!(network.neurons().iter().all(|n| n.activation_count() == 0));
    /// ```
    pub fn flush(&mut self) {
        for neuron in self.neurons.iter_mut() {
            neuron.flush();
        }
    }

    /// Returns the length of the longest chain of feed-forward
    /// links from a sensor to an output.
    ///
    /// Measuring gives up past 100 links of depth (which only
    /// malformed cyclic networks reach) and reports a depth
    /// of 10 instead.
    ///
    /// # Examples
    /// ```
    /// use subneat_nn::genomics::{GeneticConfig, NNGenome, NodePlace};
    /// use subneat_nn::networks::Network;
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha8Rng;
    ///
    /// // 0 -> 2 -> 1, plus a direct 0 -> 1 link.
    /// let config = GeneticConfig {
    ///     initial_expression_chance: 1.0,
    ///     ..GeneticConfig::zero()
    /// };
    /// let mut genome = NNGenome::new(&config, &mut ChaCha8Rng::seed_from_u64(0));
    /// genome.add_node(2, NodePlace::Hidden);
    /// genome.add_gene(1, 0, 2, 1.0);
    /// genome.add_gene(2, 2, 1, 1.0);
    ///
    /// assert_eq!(Network::new(&genome, 10).max_depth(), 2);
    /// ```
    pub fn max_depth(&mut self) -> usize {
        for neuron in self.neurons.iter_mut() {
            neuron.inner_level = 0;
            neuron.visited = false;
        }
        let outputs = self.outputs.clone();
        outputs
            .iter()
            .map(|&o| self.depth(o, 0))
            .max()
            .unwrap_or(0)
    }

    fn depth(&mut self, index: usize, depth: usize) -> usize {
        if depth > MAX_DEPTH_RECURSION {
            return DEPTH_SENTINEL;
        }
        let neuron = &self.neurons[index];
        if neuron.is_sensor() {
            return depth;
        }
        if neuron.visited {
            return depth + neuron.inner_level;
        }

        self.neurons[index].visited = true;
        let mut max = depth;
        for k in 0..self.neurons[index].incoming.len() {
            let link = self.links[self.neurons[index].incoming[k]];
            if !link.recurrent {
                max = max.max(self.depth(link.input, depth + 1));
            }
        }
        self.neurons[index].inner_level = max.saturating_sub(depth);
        max
    }

    /// Searches backwards from `source` along feed-forward links
    /// for `target`, visiting at most `threshold` neurons.
    ///
    /// Returns `(completed, found)`: whether the search finished
    /// within `threshold` visits, and whether a feed-forward path
    /// from `target` to `source` exists. A new link
    /// `source -> target` closes a cycle exactly when such a path
    /// exists, or when `source == target`.
    ///
    /// # Examples
    /// ```
    /// use subneat_nn::genomics::{GeneticConfig, NNGenome};
    /// use subneat_nn::networks::Network;
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha8Rng;
    ///
    /// let config = GeneticConfig {
    ///     initial_expression_chance: 1.0,
    ///     ..GeneticConfig::zero()
    /// };
    /// let genome = NNGenome::new(&config, &mut ChaCha8Rng::seed_from_u64(0));
    /// let network = Network::new(&genome, 10);
    ///
    /// // Input 0 feeds output 1, so 1 -> 0 would close a cycle...
    /// assert_eq!(network.has_path(1, 0, 4), (true, true));
    /// // ...but 0 -> 1 would not.
    /// assert_eq!(network.has_path(0, 1, 4), (true, false));
    /// ```
    pub fn has_path(&self, source: usize, target: usize, threshold: usize) -> (bool, bool) {
        let mut visits = 0;
        let found = self.reaches(source, target, &mut visits, threshold);
        (visits <= threshold, found)
    }

    fn reaches(&self, node: usize, target: usize, visits: &mut usize, threshold: usize) -> bool {
        *visits += 1;
        if *visits > threshold {
            return false;
        }
        if node == target {
            return true;
        }
        self.neurons[node]
            .incoming
            .iter()
            .map(|&l| &self.links[l])
            .filter(|link| !link.recurrent)
            .any(|link| self.reaches(link.input, target, visits, threshold))
    }

    /// Returns the network's neurons, in genome node order.
    pub fn neurons(&self) -> &[Neuron] {
        &self.neurons
    }

    /// Returns the network's links, in genome gene order.
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// Returns the number of input neurons, which is
    /// the number of values [`load_sensors`] expects.
    ///
    /// [`load_sensors`]: Network::load_sensors
    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }

    /// Returns the number of output neurons.
    pub fn output_count(&self) -> usize {
        self.outputs.len()
    }
}

/// Orders non-sensor neurons so every neuron comes after the
/// sources of its feed-forward links. Neurons caught in
/// feed-forward cycles are appended in arena order.
fn evaluation_order(neurons: &[Neuron], links: &[Link]) -> Box<[usize]> {
    let mut pending = vec![0usize; neurons.len()];
    let mut downstream = vec![vec![]; neurons.len()];
    for link in links {
        if !link.recurrent && link.input != link.output && !neurons[link.input].is_sensor() {
            pending[link.output] += 1;
            downstream[link.input].push(link.output);
        }
    }

    let mut ready: VecDeque<_> = (0..neurons.len())
        .filter(|&i| !neurons[i].is_sensor() && pending[i] == 0)
        .collect();
    let mut placed = vec![false; neurons.len()];
    let mut order = Vec::with_capacity(neurons.len());
    while let Some(i) = ready.pop_front() {
        placed[i] = true;
        order.push(i);
        for &next in &downstream[i] {
            pending[next] -= 1;
            if pending[next] == 0 {
                ready.push_back(next);
            }
        }
    }
    order.extend((0..neurons.len()).filter(|&i| !neurons[i].is_sensor() && !placed[i]));
    order.into()
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Network")
            .field(
                "Neurons",
                &self.neurons.iter().map(|n| n.to_string()).collect::<Vec<_>>(),
            )
            .field("Links", &self.links)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genomics::GeneticConfig;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::num::NonZeroUsize;

    fn sigmoid(x: f32) -> f32 {
        1.0 / (1.0 + (-4.924273 * x).exp())
    }

    /// Inputs 0 and 1, output 2, no genes.
    fn bare_genome() -> NNGenome {
        NNGenome::new(
            &GeneticConfig {
                input_count: NonZeroUsize::new(2).unwrap(),
                ..GeneticConfig::zero()
            },
            &mut ChaCha8Rng::seed_from_u64(0),
        )
    }

    /// A deep feed-forward genome whose hidden node ids
    /// run against the direction of flow.
    fn chain_genome() -> NNGenome {
        let mut genome = bare_genome();
        for id in 3..6 {
            genome.add_node(id, NodePlace::Hidden);
        }
        genome.add_gene(10, 0, 5, 1.0);
        genome.add_gene(11, 5, 4, 1.0);
        genome.add_gene(12, 4, 3, 1.0);
        genome.add_gene(13, 3, 2, 1.0);
        genome.add_gene(14, 1, 2, -1.0);
        genome
    }

    #[test]
    fn acyclic_settles_in_one_pass() {
        let mut network = Network::new(&chain_genome(), 10);
        network.load_sensors(&[0.5, 0.25]);
        assert_eq!(network.activate(), Ok(1));

        let expected = sigmoid(sigmoid(sigmoid(sigmoid(0.5))) - 0.25);
        assert_eq!(network.outputs(), [expected]);
    }

    #[test]
    fn bias_loaded_with_one() {
        let mut genome = NNGenome::new(
            &GeneticConfig {
                bias: true,
                ..GeneticConfig::zero()
            },
            &mut ChaCha8Rng::seed_from_u64(0),
        );
        genome.add_gene(0, 1, 2, 0.5);
        let mut network = Network::new(&genome, 10);
        assert_eq!(network.input_count(), 1);

        network.load_sensors(&[100.0]);
        network.activate().unwrap();
        assert_eq!(network.outputs(), [sigmoid(0.5)]);
    }

    #[test]
    fn disabled_genes_not_expressed() {
        let mut genome = chain_genome();
        genome.gene_mut(14).unwrap().set_enabled(false);
        let mut network = Network::new(&genome, 10);
        assert_eq!(network.links().len(), 4);

        network.load_sensors(&[0.5, 0.25]);
        network.activate().unwrap();
        assert_eq!(
            network.outputs(),
            [sigmoid(sigmoid(sigmoid(sigmoid(0.5))))]
        );
    }

    #[test]
    fn recurrent_links_relax_over_passes() {
        let mut genome = bare_genome();
        genome.add_gene(0, 0, 2, 1.0);
        genome.add_gene(1, 2, 2, 1.0).set_recurrent(true);
        let mut network = Network::new(&genome, 10);
        network.load_sensors(&[0.0, 0.0]);

        assert_eq!(network.activate(), Ok(1));
        let first = network.outputs()[0];
        assert_eq!(first, 0.5);
        network.activate().unwrap();
        assert_eq!(network.outputs(), [sigmoid(first)]);
    }

    #[test]
    fn recurrent_links_read_sources_fired_this_pass() {
        let mut genome = chain_genome();
        genome.add_gene(15, 5, 3, 1.0).set_recurrent(true);
        let mut network = Network::new(&genome, 10);
        network.load_sensors(&[0.5, 0.25]);
        assert_eq!(network.activate(), Ok(1));

        let five = sigmoid(0.5);
        let four = sigmoid(five);
        let three = sigmoid(four + five);
        assert_eq!(network.outputs(), [sigmoid(three - 0.25)]);
    }

    #[test]
    fn time_delayed_links_read_previous_activation() {
        let mut genome = bare_genome();
        genome.add_gene(0, 0, 2, 1.0);
        genome.add_gene(1, 2, 2, 1.0).set_recurrent(true);
        genome.gene_mut(1).unwrap().set_time_delay(true);
        let mut network = Network::new(&genome, 10);
        network.load_sensors(&[0.0, 0.0]);

        network.activate().unwrap();
        network.activate().unwrap();
        // The second pass still reads nothing through the delay.
        assert_eq!(network.outputs(), [0.5]);
        network.activate().unwrap();
        assert_eq!(network.outputs(), [sigmoid(0.5)]);
    }

    #[test]
    fn unreachable_outputs_fail() {
        let mut genome = bare_genome();
        genome.add_node(3, NodePlace::Hidden);
        genome.add_gene(0, 3, 2, 1.0);
        let mut network = Network::new(&genome, 7);
        network.load_sensors(&[1.0, 1.0]);
        assert_eq!(
            network.activate(),
            Err(ActivationError::OutputsUnreachable { passes: 7 })
        );
    }

    #[test]
    #[should_panic]
    fn sensor_count_mismatch() {
        Network::new(&bare_genome(), 10).load_sensors(&[1.0]);
    }

    #[test]
    fn max_depth_ignores_recurrent_links() {
        let mut genome = chain_genome();
        genome.add_gene(15, 2, 5, 1.0).set_recurrent(true);
        let mut network = Network::new(&genome, 10);
        assert_eq!(network.max_depth(), 4);
        // Traversal state is reset between calls.
        assert_eq!(network.max_depth(), 4);
    }

    #[test]
    fn max_depth_caps_cycles() {
        let mut genome = bare_genome();
        genome.add_node(3, NodePlace::Hidden);
        genome.add_node(4, NodePlace::Hidden);
        genome.add_gene(0, 0, 3, 1.0);
        genome.add_gene(1, 3, 4, 1.0);
        genome.add_gene(2, 4, 3, 1.0);
        genome.add_gene(3, 4, 2, 1.0);
        let mut network = Network::new(&genome, 10);
        assert_eq!(network.max_depth(), 3);
    }

    #[test]
    fn has_path_threshold() {
        let network = Network::new(&chain_genome(), 10);
        let index = |id| network.neurons().iter().position(|n| n.id() == id).unwrap();

        // 2 <- 3 <- 4 <- 5 <- 0
        assert_eq!(network.has_path(index(2), index(0), 100), (true, true));
        assert_eq!(network.has_path(index(2), index(0), 3), (false, false));
        assert_eq!(network.has_path(index(5), index(2), 100), (true, false));
        assert_eq!(network.has_path(index(4), index(4), 1), (true, true));
    }

    #[test]
    fn flush_then_reactivate() {
        let mut network = Network::new(&chain_genome(), 10);
        network.load_sensors(&[0.5, 0.25]);
        network.activate().unwrap();
        let outputs = network.outputs();

        network.flush();
        network.load_sensors(&[0.5, 0.25]);
        network.activate().unwrap();
        assert_eq!(network.outputs(), outputs);
    }
}
