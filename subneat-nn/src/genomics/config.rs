use super::ConfigError;

use serde::{Deserialize, Serialize};

use std::num::NonZeroUsize;

/// Configuration data for genome generation,
/// mutation, crossover and comparison.
///
/// # Note
/// All quantities expressing probabilities
/// should be in the range [0.0, 1.0]. This is
/// checked by [`validate`] before a population
/// is created.
///
/// [`validate`]: GeneticConfig::validate
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeneticConfig {
    /// Number of input sensors in a genome.
    pub input_count: NonZeroUsize,
    /// Number of outputs in a genome.
    pub output_count: NonZeroUsize,
    /// Whether genomes carry a bias sensor, always
    /// loaded with 1.0.
    pub bias: bool,
    /// Chance that a gene between an input-output node pair
    /// is created during initial genome generation.
    pub initial_expression_chance: f32,
    /// Magnitude bound of the uniform distribution from
    /// which fresh link weights are drawn.
    pub weight_range: f32,
    /// Magnitude bound of weight perturbations and
    /// replacements during weight mutation.
    pub weight_mutation_power: f32,
    /// Chance of mutating link weights, when no
    /// structural mutation took place.
    pub link_weight_mutation_chance: f32,
    /// Chance of toggling a random gene's enable flag,
    /// when no structural mutation took place.
    pub toggle_enable_chance: f32,
    /// Chance of re-enabling the first disabled gene,
    /// when no structural mutation took place.
    pub gene_reenable_chance: f32,
    /// Chance of a node addition mutation.
    pub add_node_chance: f32,
    /// Chance of a link addition mutation, when no
    /// node was added.
    pub add_link_chance: f32,
    /// Chance that a link addition looks exclusively
    /// for recurrent links.
    pub recurrent_only_chance: f32,
    /// Maximum number of candidate pairs sampled by a
    /// link addition before giving up.
    pub new_link_tries: usize,
    /// Maximum number of candidate genes sampled by a node
    /// addition on genomes of at least [`add_node_max_genome_length`]
    /// genes.
    ///
    /// [`add_node_max_genome_length`]: GeneticConfig::add_node_max_genome_length
    pub new_node_tries: usize,
    /// Genome length below which node addition scans genes
    /// from oldest to newest instead of sampling uniformly.
    pub add_node_max_genome_length: usize,
    /// Chance of multipoint crossover.
    pub mate_multipoint_chance: f32,
    /// Relative weight of multipoint-average crossover
    /// when multipoint crossover is not chosen.
    pub mate_multipoint_average_chance: f32,
    /// Relative weight of singlepoint crossover
    /// when multipoint crossover is not chosen.
    pub mate_singlepoint_chance: f32,
    /// Weight of disjoint genes in compatibility distance.
    pub disjoint_coefficient: f32,
    /// Weight of excess genes in compatibility distance.
    pub excess_coefficient: f32,
    /// Weight of the average mutation number difference of
    /// matching genes in compatibility distance.
    pub mutation_difference_coefficient: f32,
    /// Maximum number of relaxation passes a network may
    /// take to activate all of its outputs.
    pub max_network_depth: usize,
}

impl GeneticConfig {
    /// Returns a "zero-valued" default configuration.
    /// All values are 0, false, or in the case of
    /// `NonZeroUsize`s, 1.
    ///
    /// # Note
    /// This value is not suitable for use in most experiments.
    /// It is meant as a way to fill in unused values during
    /// configuration instantiation.
    ///
    /// # Examples
    /// ```
    /// use subneat_nn::genomics::GeneticConfig;
    ///
    /// let cfg1 = GeneticConfig::zero();
    ///
    /// let cfg2 = GeneticConfig {
    ///     // Specify some values here...
    ///     add_link_chance: 1.0,
    ///     new_link_tries: 20,
    ///     // Default the rest...
    ///     ..GeneticConfig::zero()
    /// };
    /// ```
    pub const fn zero() -> GeneticConfig {
        GeneticConfig {
            // SAFETY: 1 is a valid NonZeroUsize. Replace this with
            // NonZeroUsize::new(1).unwrap() once const Option::unwrap
            // becomes stable.
            input_count: unsafe { NonZeroUsize::new_unchecked(1) },
            output_count: unsafe { NonZeroUsize::new_unchecked(1) },
            bias: false,
            initial_expression_chance: 0.0,
            weight_range: 0.0,
            weight_mutation_power: 0.0,
            link_weight_mutation_chance: 0.0,
            toggle_enable_chance: 0.0,
            gene_reenable_chance: 0.0,
            add_node_chance: 0.0,
            add_link_chance: 0.0,
            recurrent_only_chance: 0.0,
            new_link_tries: 0,
            new_node_tries: 0,
            add_node_max_genome_length: 0,
            mate_multipoint_chance: 0.0,
            mate_multipoint_average_chance: 0.0,
            mate_singlepoint_chance: 0.0,
            disjoint_coefficient: 0.0,
            excess_coefficient: 0.0,
            mutation_difference_coefficient: 0.0,
            max_network_depth: 0,
        }
    }

    /// Checks that every probability lies in [0, 1], that
    /// magnitudes and coefficients are non-negative, and
    /// that the activation pass budget is non-zero.
    ///
    /// # Errors
    /// Returns the first offending parameter.
    ///
    /// # Examples
    /// ```
    /// use subneat_nn::genomics::GeneticConfig;
    ///
    /// assert!(GeneticConfig::default().validate().is_ok());
    ///
    /// let config = GeneticConfig {
    ///     add_node_chance: 1.5,
    ///     ..GeneticConfig::default()
    /// };
    /// assert!(config.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<(), ConfigError> {
        let probabilities = [
            ("initial_expression_chance", self.initial_expression_chance),
            ("link_weight_mutation_chance", self.link_weight_mutation_chance),
            ("toggle_enable_chance", self.toggle_enable_chance),
            ("gene_reenable_chance", self.gene_reenable_chance),
            ("add_node_chance", self.add_node_chance),
            ("add_link_chance", self.add_link_chance),
            ("recurrent_only_chance", self.recurrent_only_chance),
            ("mate_multipoint_chance", self.mate_multipoint_chance),
            ("mate_multipoint_average_chance", self.mate_multipoint_average_chance),
            ("mate_singlepoint_chance", self.mate_singlepoint_chance),
        ];
        for (name, value) in probabilities {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::ProbabilityOutOfRange { name, value });
            }
        }

        let magnitudes = [
            ("weight_range", self.weight_range),
            ("weight_mutation_power", self.weight_mutation_power),
            ("disjoint_coefficient", self.disjoint_coefficient),
            ("excess_coefficient", self.excess_coefficient),
            ("mutation_difference_coefficient", self.mutation_difference_coefficient),
        ];
        for (name, value) in magnitudes {
            // Written this way round so NaN is rejected too.
            if !(value >= 0.0) {
                return Err(ConfigError::Negative { name, value });
            }
        }

        if self.max_network_depth == 0 {
            return Err(ConfigError::ZeroBudget {
                name: "max_network_depth",
            });
        }
        Ok(())
    }
}

impl Default for GeneticConfig {
    /// The canonical NEAT parameter set for a single-input,
    /// single-output genome with a bias sensor. Override the
    /// sensor and output counts with struct update syntax.
    fn default() -> GeneticConfig {
        GeneticConfig {
            bias: true,
            initial_expression_chance: 1.0,
            weight_range: 1.0,
            weight_mutation_power: 2.5,
            link_weight_mutation_chance: 0.9,
            toggle_enable_chance: 0.0,
            gene_reenable_chance: 0.0,
            add_node_chance: 0.03,
            add_link_chance: 0.05,
            recurrent_only_chance: 0.0,
            new_link_tries: 20,
            new_node_tries: 20,
            add_node_max_genome_length: 15,
            mate_multipoint_chance: 0.6,
            mate_multipoint_average_chance: 0.4,
            mate_singlepoint_chance: 0.0,
            disjoint_coefficient: 1.0,
            excess_coefficient: 1.0,
            mutation_difference_coefficient: 0.4,
            max_network_depth: 30,
            ..GeneticConfig::zero()
        }
    }
}
