//! Genomes are the focus of evolution in NEAT.
//! They are a collection of genes and nodes that can be instantiated
//! as a phenotype (a neural network). Genomes can be progressively mutated,
//! thus adding complexity and functionality.
//!
//! Genes are kept strictly ascending by innovation number and nodes
//! strictly ascending by id, as every alignment algorithm (compatibility,
//! crossover) walks both arrays linearly.

mod config;
mod crossover;
mod errors;
mod genes;
mod history;
mod mutations;
mod nodes;

pub use config::GeneticConfig;
pub use crossover::Crossover;
pub use errors::ConfigError;
use errors::*;
pub use genes::Gene;
pub use history::{History, InnovationKey, InnovationRecord};
pub use mutations::WeightMutation;
pub use nodes::{Node, NodePlace, NodeType};

use crate::networks::Network;
use crate::{Innovation, NodeId};

use rand::Rng;
use serde::{Deserialize, Serialize};
use subneat::Genome;

use std::cmp::Ordering;
use std::fmt;

/// A mutable collection of genes and nodes.
///
/// Suports Serde for convenient genome saving and loading.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct NNGenome {
    nodes: Vec<Node>,
    genes: Vec<Gene>,
    fitness: f32,
}

impl NNGenome {
    /// Creates a new template genome with the specified configuration.
    ///
    /// Nodes are numbered inputs first, then the bias sensor
    /// (if configured), then outputs. Each sensor-output pair is
    /// linked with chance [`initial_expression_chance`] by a gene
    /// numbered `o + i ⨯ output_count`, where `i` is the sensor's
    /// index and `o` the output's. Weights are drawn uniformly
    /// from ±[`weight_range`], and each gene's mutation number
    /// starts at its weight.
    ///
    /// [`initial_expression_chance`]: GeneticConfig::initial_expression_chance
    /// [`weight_range`]: GeneticConfig::weight_range
    ///
    /// # Examples
    /// ```
    /// use subneat_nn::genomics::{GeneticConfig, NNGenome, NodePlace};
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha8Rng;
    /// use std::num::NonZeroUsize;
    ///
    /// let config = GeneticConfig {
    ///     input_count: NonZeroUsize::new(3).unwrap(),
    ///     output_count: NonZeroUsize::new(2).unwrap(),
    ///     bias: true,
    ///     initial_expression_chance: 1.0,
    ///     weight_range: 5.0,
    ///     ..GeneticConfig::zero()
    /// };
    ///
    /// let genome = NNGenome::new(&config, &mut ChaCha8Rng::seed_from_u64(0));
    ///
    /// // 3 inputs + 1 bias + 2 outputs.
    /// assert_eq!(genome.nodes().len(), 3 + 1 + 2);
    /// assert_eq!(genome.nodes()[3].place(), NodePlace::Bias);
    ///
    /// // With an initial_expression_chance of 1, every sensor feeds every output.
    /// assert_eq!(genome.genes().len(), 4 * 2);
    /// assert!(genome.genes().iter().all(|g| g.weight().abs() <= config.weight_range));
    /// ```
    pub fn new<R: Rng + ?Sized>(config: &GeneticConfig, rng: &mut R) -> NNGenome {
        let input_count = config.input_count.get();
        let sensor_count = input_count + usize::from(config.bias);
        let output_count = config.output_count.get();

        let mut nodes = Vec::with_capacity(sensor_count + output_count);
        nodes.extend((0..input_count).map(|i| Node::new(i, NodePlace::Input)));
        if config.bias {
            nodes.push(Node::new(input_count, NodePlace::Bias));
        }
        nodes.extend((0..output_count).map(|o| Node::new(sensor_count + o, NodePlace::Output)));

        let mut genes = Vec::with_capacity(sensor_count * output_count);
        for i in 0..sensor_count {
            for o in 0..output_count {
                if rng.gen::<f32>() < config.initial_expression_chance {
                    let weight = random_weight(config.weight_range, rng);
                    let mut gene = Gene::new(o + i * output_count, i, sensor_count + o, weight);
                    gene.set_mutation_number(weight);
                    genes.push(gene);
                }
            }
        }

        NNGenome {
            nodes,
            genes,
            fitness: 0.0,
        }
    }

    /// Returns a genome with no nodes or genes, used
    /// as the starting point of crossover offspring.
    pub(crate) fn empty() -> NNGenome {
        NNGenome {
            nodes: vec![],
            genes: vec![],
            fitness: 0.0,
        }
    }

    /// Adds a new gene to the genome, keeping genes ordered
    /// by innovation number. Returns a reference to the new gene.
    ///
    /// # Panics
    /// This function panics if a gene with the same innovation
    /// number or the same non-recurrent endpoints already exists,
    /// if either endpoint is missing from the genome, or if the
    /// output endpoint is a sensor.
    ///
    /// # Examples
    /// ```
    /// use subneat_nn::genomics::{GeneticConfig, NNGenome, NodePlace};
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha8Rng;
    ///
    /// let mut genome = NNGenome::new(&GeneticConfig::zero(), &mut ChaCha8Rng::seed_from_u64(0));
    /// genome.add_node(2, NodePlace::Hidden);
    ///
    /// genome.add_gene(7, 2, 1, 0.5);
    /// genome.add_gene(3, 0, 2, 1.0).set_enabled(false);
    ///
    /// let innovations: Vec<_> = genome.genes().iter().map(|g| g.innovation()).collect();
    /// assert_eq!(innovations, [3, 7]);
    /// assert!(!genome.genes()[0].enabled());
    /// ```
    pub fn add_gene(
        &mut self,
        innovation: Innovation,
        input: NodeId,
        output: NodeId,
        weight: f32,
    ) -> &mut Gene {
        self.check_gene_viability(innovation, input, output)
            .unwrap_or_else(|e| panic!("{} in {}", e, self));
        let index = self.insert_gene(Gene::new(innovation, input, output, weight));
        &mut self.genes[index]
    }

    fn check_gene_viability(
        &self,
        innovation: Innovation,
        input: NodeId,
        output: NodeId,
    ) -> Result<(), GeneValidityError> {
        if self.gene_index(innovation).is_some() {
            return Err(GeneValidityError::DuplicateGeneId(innovation));
        }
        match (self.node(input), self.node(output)) {
            (Some(_), Some(o)) if o.is_sensor() => {
                Err(GeneValidityError::SensorEndpoint(innovation, output))
            }
            (Some(_), Some(_)) => {
                if self
                    .genes
                    .iter()
                    .any(|g| g.input() == input && g.output() == output && !g.recurrent())
                {
                    Err(GeneValidityError::DuplicateGeneWithEndpoints(
                        innovation,
                        (input, output),
                    ))
                } else {
                    Ok(())
                }
            }
            _ => Err(GeneValidityError::NonexistantEndpoints(input, output)),
        }
    }

    /// Adds a new node to the genome, keeping nodes ordered by id.
    ///
    /// # Panics
    /// This function panics if a node with the same id
    /// already exists.
    ///
    /// # Examples
    /// ```
    /// use subneat_nn::genomics::{GeneticConfig, NNGenome, NodePlace};
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha8Rng;
    ///
    /// let mut genome = NNGenome::new(&GeneticConfig::zero(), &mut ChaCha8Rng::seed_from_u64(0));
    /// genome.add_node(5, NodePlace::Hidden);
    ///
    /// assert_eq!(genome.node(5).unwrap().place(), NodePlace::Hidden);
    /// ```
    pub fn add_node(&mut self, id: NodeId, place: NodePlace) {
        if self.node_index(id).is_some() {
            panic!("{} in {}", NodeValidityError::DuplicateNodeId(id), self);
        }
        self.insert_node(Node::new(id, place));
    }

    /// Inserts a gene at its ordered position and returns the
    /// position. Callers guarantee its innovation number is new
    /// to the genome.
    pub(crate) fn insert_gene(&mut self, gene: Gene) -> usize {
        let index = match self.genes.last() {
            Some(last) if last.innovation() < gene.innovation() => self.genes.len(),
            None => 0,
            _ => self
                .genes
                .binary_search_by_key(&gene.innovation(), Gene::innovation)
                .unwrap_or_else(|i| i),
        };
        self.genes.insert(index, gene);
        index
    }

    /// Inserts a node at its ordered position, unless a node with
    /// the same id is already present.
    pub(crate) fn insert_node(&mut self, node: Node) {
        if let Err(index) = self.nodes.binary_search_by_key(&node.id(), Node::id) {
            self.nodes.insert(index, node);
        }
    }

    /// Returns the position of the node with the given id.
    pub(crate) fn node_index(&self, id: NodeId) -> Option<usize> {
        self.nodes.binary_search_by_key(&id, Node::id).ok()
    }

    /// Returns the position of the gene with the given
    /// innovation number.
    pub(crate) fn gene_index(&self, innovation: Innovation) -> Option<usize> {
        self.genes
            .binary_search_by_key(&innovation, Gene::innovation)
            .ok()
    }

    /// Returns the node with the given id, if present.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.node_index(id).map(|i| &self.nodes[i])
    }

    /// Returns the gene with the given innovation number, if present.
    pub fn gene(&self, innovation: Innovation) -> Option<&Gene> {
        self.gene_index(innovation).map(|i| &self.genes[i])
    }

    /// Returns the genome's genes, ascending by innovation number.
    pub fn genes(&self) -> &[Gene] {
        &self.genes
    }

    /// Returns the genome's nodes, ascending by id.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Returns a mutable reference to the gene with the
    /// given innovation number, if present.
    ///
    /// Only the gene's attributes can be modified this way,
    /// so the ordering of the genome is preserved.
    pub fn gene_mut(&mut self, innovation: Innovation) -> Option<&mut Gene> {
        self.gene_index(innovation).map(move |i| &mut self.genes[i])
    }

    /// Builds the genome's phenotype.
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
    /// network.load_sensors(&[0.5]);
    /// network.activate().unwrap();
    ///
    /// assert_eq!(network.outputs().len(), 1);
    /// ```
    pub fn create_network(&self, config: &GeneticConfig) -> Network {
        Network::new(self, config.max_network_depth)
    }

    /// Returns the compatibility distance between two genomes:
    /// the count of disjoint genes, the count of excess genes,
    /// and the average mutation number difference of matching
    /// genes, each weighted by its configured coefficient.
    ///
    /// # Examples
    /// ```
    /// use subneat_nn::genomics::{GeneticConfig, NNGenome};
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha8Rng;
    ///
    /// let config = GeneticConfig::default();
    /// let mut rng = ChaCha8Rng::seed_from_u64(1);
    /// let a = NNGenome::new(&config, &mut rng);
    /// let b = NNGenome::new(&config, &mut rng);
    ///
    /// assert_eq!(a.compatibility(&a, &config), 0.0);
    /// assert_eq!(a.compatibility(&b, &config), b.compatibility(&a, &config));
    /// ```
    pub fn compatibility(&self, other: &NNGenome, config: &GeneticConfig) -> f32 {
        let (mut disjoint, mut excess, mut matching) = (0.0, 0.0, 0.0);
        let mut mutation_difference = 0.0;
        let (mut i, mut j) = (0, 0);

        while i < self.genes.len() || j < other.genes.len() {
            if i == self.genes.len() {
                j += 1;
                excess += 1.0;
            } else if j == other.genes.len() {
                i += 1;
                excess += 1.0;
            } else {
                let (g1, g2) = (&self.genes[i], &other.genes[j]);
                match g1.innovation().cmp(&g2.innovation()) {
                    Ordering::Equal => {
                        matching += 1.0;
                        mutation_difference += (g1.mutation_number() - g2.mutation_number()).abs();
                        i += 1;
                        j += 1;
                    }
                    Ordering::Less => {
                        i += 1;
                        disjoint += 1.0;
                    }
                    Ordering::Greater => {
                        j += 1;
                        disjoint += 1.0;
                    }
                }
            }
        }

        let average_difference = if matching > 0.0 {
            mutation_difference / matching
        } else {
            0.0
        };
        config.disjoint_coefficient * disjoint
            + config.excess_coefficient * excess
            + config.mutation_difference_coefficient * average_difference
    }

    /// Sets the genome's fitness value.
    pub fn set_fitness(&mut self, fitness: f32) {
        self.fitness = fitness;
    }

    /// Returns the genome's fitness value.
    pub fn fitness(&self) -> f32 {
        self.fitness
    }
}

/// Returns a weight drawn uniformly from ±`range`.
pub(crate) fn random_weight<R: Rng + ?Sized>(range: f32, rng: &mut R) -> f32 {
    (rng.gen::<f32>() * 2.0 - 1.0) * range
}

impl Genome for NNGenome {
    type Config = GeneticConfig;
    type InnovationHistory = History;
    type ConfigError = ConfigError;

    fn check_config(config: &GeneticConfig) -> Result<(), ConfigError> {
        config.validate()
    }

    fn new<R: Rng + ?Sized>(config: &GeneticConfig, rng: &mut R) -> NNGenome {
        NNGenome::new(config, rng)
    }

    fn genetic_distance(first: &NNGenome, second: &NNGenome, config: &GeneticConfig) -> f32 {
        first.compatibility(second, config)
    }

    fn mate<R: Rng + ?Sized>(
        parent1: &NNGenome,
        parent2: &NNGenome,
        config: &GeneticConfig,
        rng: &mut R,
    ) -> NNGenome {
        let crossover = Crossover::choose(config, rng);
        parent1.mate_with(parent2, crossover, rng)
    }

    /// Applies a node addition, or else a link addition, or
    /// else any of the parametric mutations, each with its
    /// configured chance. A link is never added right after
    /// a node.
    fn mutate<R: Rng + ?Sized>(
        &mut self,
        history: &mut History,
        config: &GeneticConfig,
        rng: &mut R,
    ) {
        if rng.gen::<f32>() < config.add_node_chance {
            self.mutate_add_node(history, config, rng);
        } else if rng.gen::<f32>() < config.add_link_chance {
            self.mutate_add_link(history, config, rng);
        } else {
            if rng.gen::<f32>() < config.link_weight_mutation_chance {
                self.mutate_link_weights(
                    config.weight_mutation_power,
                    1.0,
                    WeightMutation::Gaussian,
                    rng,
                );
            }
            if rng.gen::<f32>() < config.toggle_enable_chance {
                self.mutate_toggle_enable(1, rng);
            }
            if rng.gen::<f32>() < config.gene_reenable_chance {
                self.mutate_gene_reenable();
            }
        }
    }

    /// Mostly perturbs weights; one time in five adds a link
    /// instead, if link addition is enabled at all.
    fn perturb<R: Rng + ?Sized>(
        &mut self,
        history: &mut History,
        config: &GeneticConfig,
        rng: &mut R,
    ) {
        if rng.gen::<f32>() < 0.8 || config.add_link_chance == 0.0 {
            self.mutate_link_weights(
                config.weight_mutation_power,
                1.0,
                WeightMutation::Gaussian,
                rng,
            );
        } else {
            self.mutate_add_link(history, config, rng);
        }
    }

    fn set_fitness(&mut self, fitness: f32) {
        self.fitness = fitness;
    }

    fn fitness(&self) -> f32 {
        self.fitness
    }
}

impl fmt::Display for NNGenome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Genome")
            .field(
                "Genes",
                &self.genes.iter().map(|g| g.to_string()).collect::<Vec<_>>(),
            )
            .field(
                "Nodes",
                &self.nodes.iter().map(|n| n.to_string()).collect::<Vec<_>>(),
            )
            .field("Fitness", &self.fitness)
            .finish()
    }
}
