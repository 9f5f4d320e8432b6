use super::{random_weight, Gene, GeneticConfig, History, NNGenome, Node, NodePlace};
use crate::networks::Network;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Magnitude bound on mutated weights.
const WEIGHT_CAP: f32 = 8.0;

/// Probability with which the age-biased scan of
/// [`NNGenome::mutate_add_node`] passes over an eligible gene.
const SPLIT_SKIP_CHANCE: f32 = 0.3;

/// The way a weight mutation alters each gene's weight.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeightMutation {
    /// Mostly perturbs weights by a random delta,
    /// occasionally replacing them outright.
    Gaussian,
    /// Replaces every weight with a fresh random value.
    ColdGaussian,
}

impl NNGenome {
    /// Mutates the weight of every non-frozen gene.
    ///
    /// Each weight is perturbed by, or (for
    /// [`ColdGaussian`] mutations, and some [`Gaussian`] ones)
    /// replaced with, a value drawn uniformly from ±`power`.
    /// Half of the calls are _severe_, replacing weights more
    /// often. Genes in the newest 20% of genomes of at least
    /// ten genes are also replaced more often, as older
    /// structure has had more time to settle. `rate` is the
    /// probability of altering a gene at all outside of those
    /// cases.
    ///
    /// Resulting weights are capped at ±8, and each gene's
    /// mutation number is set to its new weight.
    ///
    /// [`Gaussian`]: WeightMutation::Gaussian
    /// [`ColdGaussian`]: WeightMutation::ColdGaussian
    ///
    /// # Examples
    /// ```
    /// use subneat_nn::genomics::{GeneticConfig, NNGenome, WeightMutation};
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha8Rng;
    ///
    /// let config = GeneticConfig::default();
    /// let mut rng = ChaCha8Rng::seed_from_u64(3);
    /// let mut genome = NNGenome::new(&config, &mut rng);
    ///
    /// genome.mutate_link_weights(1.0, 1.0, WeightMutation::ColdGaussian, &mut rng);
    ///
    /// for gene in genome.genes() {
    ///     assert!(gene.weight().abs() <= 1.0);
    ///     assert_eq!(gene.mutation_number(), gene.weight());
    /// }
    /// ```
    pub fn mutate_link_weights<R: Rng + ?Sized>(
        &mut self,
        power: f32,
        rate: f32,
        mutation: WeightMutation,
        rng: &mut R,
    ) {
        let severe = rng.gen::<f32>() > 0.5;
        let gene_total = self.genes.len() as f32;
        let end_part = gene_total * 0.8;
        let mut num = 0.0;

        for gene in self.genes.iter_mut().filter(|g| !g.frozen()) {
            let (perturb_point, replace_point) = if severe {
                (0.3, 0.1)
            } else if gene_total >= 10.0 && num > end_part {
                (0.5, 0.3)
            } else if rng.gen::<f32>() > 0.5 {
                (1.0 - rate, 1.0 - rate - 0.1)
            } else {
                (1.0 - rate, 1.0 - rate)
            };

            let sign = if rng.gen::<bool>() { 1.0 } else { -1.0 };
            let delta = sign * rng.gen::<f32>() * power;
            let mut weight = gene.weight();
            match mutation {
                WeightMutation::Gaussian => {
                    let choice = rng.gen::<f32>();
                    if choice > perturb_point {
                        weight += delta;
                    } else if choice > replace_point {
                        weight = delta;
                    }
                }
                WeightMutation::ColdGaussian => weight = delta,
            }

            let weight = weight.clamp(-WEIGHT_CAP, WEIGHT_CAP);
            gene.set_weight(weight);
            gene.set_mutation_number(weight);
            num += 1.0;
        }
    }

    /// Flips the enable flag of a randomly chosen gene,
    /// `times` times. A gene is only disabled if its input
    /// node keeps another enabled outgoing gene, so no node
    /// is cut off from the network.
    ///
    /// Returns `true` if any flag changed.
    ///
    /// # Examples
    /// ```
    /// use subneat_nn::genomics::{GeneticConfig, NNGenome};
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha8Rng;
    ///
    /// // A single input linked to a single output.
    /// let config = GeneticConfig {
    ///     initial_expression_chance: 1.0,
    ///     ..GeneticConfig::zero()
    /// };
    /// let mut rng = ChaCha8Rng::seed_from_u64(0);
    /// let mut genome = NNGenome::new(&config, &mut rng);
    ///
    /// // The input's only outgoing gene is never disabled.
    /// assert!(!genome.mutate_toggle_enable(10, &mut rng));
    /// assert!(genome.genes()[0].enabled());
    /// ```
    pub fn mutate_toggle_enable<R: Rng + ?Sized>(&mut self, times: usize, rng: &mut R) -> bool {
        if self.genes.is_empty() {
            return false;
        }

        let mut changed = false;
        for _ in 0..times {
            let index = rng.gen_range(0..self.genes.len());
            let (input, innovation) = (self.genes[index].input(), self.genes[index].innovation());
            if self.genes[index].enabled() {
                let has_alternative = self
                    .genes
                    .iter()
                    .any(|g| g.input() == input && g.enabled() && g.innovation() != innovation);
                if has_alternative {
                    self.genes[index].set_enabled(false);
                    changed = true;
                }
            } else {
                self.genes[index].set_enabled(true);
                changed = true;
            }
        }
        changed
    }

    /// Re-enables the oldest disabled gene, if there is one.
    ///
    /// Returns `true` if a gene was re-enabled.
    pub fn mutate_gene_reenable(&mut self) -> bool {
        match self.genes.iter_mut().find(|g| !g.enabled()) {
            Some(gene) => {
                gene.set_enabled(true);
                true
            }
            None => false,
        }
    }

    /// Induces a _link mutation_ in the genome: a new gene
    /// between two nodes not yet linked in the same way.
    ///
    /// With chance [`recurrent_only_chance`] only recurrent links
    /// are sought, half the time as self-loops; otherwise only
    /// feed-forward links are. Candidate pairs are sampled up to
    /// [`new_link_tries`] times. A candidate is rejected if it
    /// targets a sensor, duplicates an existing link of the same
    /// recurrency, or its recurrency (as found by searching the
    /// genome's network) differs from the one sought. A candidate
    /// whose search visits more than the square of the node count
    /// is rejected too, and sampling carries on with the next one.
    ///
    /// The new gene's innovation number and weight are shared with
    /// every identical link added since the last [`History::clear`].
    ///
    /// Returns `true` if a gene was added; the genome is left
    /// untouched otherwise.
    ///
    /// [`recurrent_only_chance`]: GeneticConfig::recurrent_only_chance
    /// [`new_link_tries`]: GeneticConfig::new_link_tries
    ///
    /// # Examples
    /// ```
    /// use subneat_nn::genomics::{GeneticConfig, History, NNGenome};
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha8Rng;
    /// use std::num::NonZeroUsize;
    ///
    /// let config = GeneticConfig {
    ///     input_count: NonZeroUsize::new(2).unwrap(),
    ///     weight_range: 1.0,
    ///     new_link_tries: 20,
    ///     max_network_depth: 10,
    ///     ..GeneticConfig::zero()
    /// };
    /// let mut rng = ChaCha8Rng::seed_from_u64(5);
    /// let mut history = History::new(&config);
    /// let mut genome = NNGenome::new(&config, &mut rng);
    ///
    /// // The genome is initially unconnected.
    /// assert!(genome.genes().is_empty());
    ///
    /// assert!(genome.mutate_add_link(&mut history, &config, &mut rng));
    ///
    /// let gene = &genome.genes()[0];
    /// assert!(!gene.recurrent());
    /// assert_eq!(gene.output(), 2);
    /// ```
    pub fn mutate_add_link<R: Rng + ?Sized>(
        &mut self,
        history: &mut History,
        config: &GeneticConfig,
        rng: &mut R,
    ) -> bool {
        let node_count = self.nodes.len();
        let first_non_sensor = self.nodes.iter().take_while(|n| n.is_sensor()).count();
        if first_non_sensor == node_count {
            return false;
        }

        let network = Network::new(self, config.max_network_depth);
        let threshold = node_count * node_count;
        let recurrent = rng.gen::<f32>() < config.recurrent_only_chance;

        for _ in 0..config.new_link_tries {
            let (source, target) = if recurrent && rng.gen::<f32>() > 0.5 {
                let node = rng.gen_range(first_non_sensor..node_count);
                (node, node)
            } else {
                (
                    rng.gen_range(0..node_count),
                    rng.gen_range(first_non_sensor..node_count),
                )
            };
            let (input, output) = (self.nodes[source], self.nodes[target]);

            if output.is_sensor()
                || self.genes.iter().any(|g| {
                    g.input() == input.id() && g.output() == output.id() && g.recurrent() == recurrent
                })
            {
                continue;
            }

            let (completed, closes_cycle) = network.has_path(source, target, threshold);
            if !completed || closes_cycle != recurrent {
                continue;
            }

            let (innovation, weight) =
                history.link_innovation(input.id(), output.id(), recurrent, || {
                    random_weight(config.weight_range, rng)
                });
            if self.gene_index(innovation).is_some() {
                continue;
            }

            let mut gene = Gene::new(innovation, input.id(), output.id(), weight);
            gene.set_recurrent(recurrent);
            gene.set_mutation_number(weight);
            self.insert_gene(gene);
            return true;
        }

        trace!(
            tries = config.new_link_tries,
            recurrent,
            "link mutation found no viable node pair"
        );
        false
    }

    /// Induces a _node mutation_ in the genome: an enabled
    /// gene not fed by the bias is disabled and replaced by a
    /// new hidden node and two genes. The gene into the new
    /// node has weight 1 and keeps the split gene's recurrency;
    /// the gene out of it carries the split gene's weight.
    ///
    /// Genomes shorter than [`add_node_max_genome_length`] are
    /// scanned from their oldest gene, passing over each eligible
    /// gene with 30% probability. Longer genomes are sampled
    /// uniformly up to [`new_node_tries`] times.
    ///
    /// Splitting the same gene in different genomes before the
    /// next [`History::clear`] yields the same node and genes.
    ///
    /// Returns `true` if a node was added; the genome is left
    /// untouched otherwise.
    ///
    /// [`add_node_max_genome_length`]: GeneticConfig::add_node_max_genome_length
    /// [`new_node_tries`]: GeneticConfig::new_node_tries
    ///
    /// # Examples
    /// ```
    /// use subneat_nn::genomics::{GeneticConfig, History, NNGenome, NodePlace};
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha8Rng;
    ///
    /// let config = GeneticConfig {
    ///     initial_expression_chance: 1.0,
    ///     weight_range: 1.0,
    ///     new_node_tries: 20,
    ///     ..GeneticConfig::zero()
    /// };
    /// let mut rng = ChaCha8Rng::seed_from_u64(0);
    /// let mut history = History::new(&config);
    /// let mut genome = NNGenome::new(&config, &mut rng);
    /// let split = genome.genes()[0].clone();
    ///
    /// assert!(genome.mutate_add_node(&mut history, &config, &mut rng));
    ///
    /// assert!(!genome.genes()[0].enabled());
    /// assert_eq!(genome.genes().len(), 3);
    /// assert_eq!(genome.nodes()[2].place(), NodePlace::Hidden);
    ///
    /// let (into, out_of) = (&genome.genes()[1], &genome.genes()[2]);
    /// assert_eq!((into.input(), into.weight()), (split.input(), 1.0));
    /// assert_eq!((out_of.output(), out_of.weight()), (split.output(), split.weight()));
    /// ```
    pub fn mutate_add_node<R: Rng + ?Sized>(
        &mut self,
        history: &mut History,
        config: &GeneticConfig,
        rng: &mut R,
    ) -> bool {
        if self.genes.is_empty() {
            return false;
        }

        let chosen = if self.genes.len() < config.add_node_max_genome_length {
            self.genes
                .iter()
                .position(|g| self.is_splittable(g) && rng.gen::<f32>() >= SPLIT_SKIP_CHANCE)
        } else {
            (0..config.new_node_tries)
                .map(|_| rng.gen_range(0..self.genes.len()))
                .find(|&i| self.is_splittable(&self.genes[i]))
        };
        let split = match chosen {
            Some(index) => {
                self.genes[index].set_enabled(false);
                self.genes[index].clone()
            }
            None => {
                trace!(
                    genes = self.genes.len(),
                    "node mutation found no gene to split"
                );
                return false;
            }
        };

        let (input_gene, node, output_gene) = history.node_innovation(
            split.input(),
            split.output(),
            split.innovation(),
            |id| self.node_index(id).is_some(),
        );

        self.insert_node(Node::new(node, NodePlace::Hidden));
        let mut into = Gene::new(input_gene, split.input(), node, 1.0);
        into.set_recurrent(split.recurrent());
        self.insert_gene(into);
        self.insert_gene(Gene::new(output_gene, node, split.output(), split.weight()));
        true
    }

    fn is_splittable(&self, gene: &Gene) -> bool {
        gene.enabled()
            && self
                .node(gene.input())
                .map_or(false, |n| n.place() != NodePlace::Bias)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::num::NonZeroUsize;

    fn connected_config(inputs: usize, outputs: usize) -> GeneticConfig {
        GeneticConfig {
            input_count: NonZeroUsize::new(inputs).unwrap(),
            output_count: NonZeroUsize::new(outputs).unwrap(),
            initial_expression_chance: 1.0,
            weight_range: 1.0,
            new_link_tries: 20,
            new_node_tries: 20,
            max_network_depth: 10,
            ..GeneticConfig::zero()
        }
    }

    fn ascending(genome: &NNGenome) -> bool {
        genome
            .genes()
            .windows(2)
            .all(|w| w[0].innovation() < w[1].innovation())
            && genome.nodes().windows(2).all(|w| w[0].id() < w[1].id())
    }

    #[test]
    fn identical_splits_share_numbers() {
        let config = connected_config(2, 1);
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let mut history = History::new(&config);
        let template = NNGenome::new(&config, &mut rng);

        // Only gene 0 can be split in both copies.
        let mut a = template.clone();
        let mut b = template.clone();
        a.gene_mut(1).unwrap().set_enabled(false);
        b.gene_mut(1).unwrap().set_enabled(false);
        assert!(a.mutate_add_node(&mut history, &config, &mut rng));
        assert!(b.mutate_add_node(&mut history, &config, &mut rng));

        assert_eq!(a.nodes(), b.nodes());
        let new_genes = |g: &NNGenome| {
            g.genes()
                .iter()
                .filter(|g| g.innovation() >= 2)
                .map(|g| (g.innovation(), g.input(), g.output()))
                .collect::<Vec<_>>()
        };
        assert_eq!(new_genes(&a), new_genes(&b));
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn repeated_split_in_same_genome_gets_fresh_node() {
        let config = connected_config(1, 1);
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let mut history = History::new(&config);
        let template = NNGenome::new(&config, &mut rng);

        let mut genome = template.clone();
        assert!(genome.mutate_add_node(&mut history, &config, &mut rng));
        // Re-enable the split gene and split it again.
        genome.gene_mut(0).unwrap().set_enabled(true);
        genome.gene_mut(1).unwrap().set_enabled(false);
        genome.gene_mut(2).unwrap().set_enabled(false);
        assert!(genome.mutate_add_node(&mut history, &config, &mut rng));

        assert_eq!(genome.nodes().len(), 4);
        assert_eq!(genome.genes().len(), 5);
        assert!(ascending(&genome));
    }

    #[test]
    fn add_node_skips_bias_genes() {
        let config = GeneticConfig {
            bias: true,
            ..connected_config(1, 1)
        };
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let mut history = History::new(&config);
        let mut genome = NNGenome::new(&config, &mut rng);
        genome.gene_mut(0).unwrap().set_enabled(false);
        let before = genome.clone();

        assert!(!genome.mutate_add_node(&mut history, &config, &mut rng));
        assert_eq!(genome, before);
    }

    #[test]
    fn add_node_samples_long_genomes() {
        let config = GeneticConfig {
            add_node_max_genome_length: 4,
            ..connected_config(3, 3)
        };
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let mut history = History::new(&config);
        let mut genome = NNGenome::new(&config, &mut rng);

        assert!(genome.mutate_add_node(&mut history, &config, &mut rng));
        assert_eq!(genome.genes().len(), 9 + 2);
        assert_eq!(genome.genes().iter().filter(|g| !g.enabled()).count(), 1);
        assert!(ascending(&genome));
    }

    #[test]
    fn add_link_saturated_genome_unchanged() {
        let config = GeneticConfig {
            bias: true,
            ..connected_config(2, 1)
        };
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut history = History::new(&config);
        let mut genome = NNGenome::new(&config, &mut rng);
        let before = genome.clone();

        assert!(!genome.mutate_add_link(&mut history, &config, &mut rng));
        assert_eq!(genome, before);
        assert!(history.is_empty());
    }

    #[test]
    fn add_link_recurrent_only() {
        let config = GeneticConfig {
            recurrent_only_chance: 1.0,
            ..connected_config(1, 1)
        };
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        let mut history = History::new(&config);
        let mut genome = NNGenome::new(&config, &mut rng);

        assert!(genome.mutate_add_link(&mut history, &config, &mut rng));
        let gene = genome.genes().last().unwrap();
        assert!(gene.recurrent());
        assert_eq!((gene.input(), gene.output()), (1, 1));
        assert_eq!(gene.mutation_number(), gene.weight());
    }

    #[test]
    fn add_link_detects_backward_links() {
        // 0 -> 2 -> 1, with 2 hidden. The only feed-forward
        // candidate left is 0 -> 1; a link 1 -> 2 closes a cycle.
        let config = GeneticConfig {
            initial_expression_chance: 0.0,
            ..connected_config(1, 1)
        };
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let mut history = History::new(&config);
        let mut genome = NNGenome::new(&config, &mut rng);
        genome.add_node(2, NodePlace::Hidden);
        genome.add_gene(10, 0, 2, 1.0);
        genome.add_gene(11, 2, 1, 1.0);

        for _ in 0..10 {
            genome.mutate_add_link(&mut history, &config, &mut rng);
        }
        for gene in genome.genes() {
            let backward = (gene.input() == 1 && gene.output() == 2)
                || (gene.input() == gene.output());
            assert_eq!(gene.recurrent(), backward, "{}", gene);
        }
        assert!(ascending(&genome));
    }

    #[test]
    fn add_link_passes_over_unsearchable_pairs() {
        // A fully connected feed-forward chain 0 -> 2 -> ... -> 13.
        // Only 2..=8 and 13 feed output 1, so 9..=12 -> 1 are new
        // links whose searches overrun, and 0 -> 1 is the only
        // candidate that can be added.
        let config = GeneticConfig {
            initial_expression_chance: 0.0,
            new_link_tries: 5000,
            ..connected_config(1, 1)
        };
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut history = History::new(&config);
        let mut genome = NNGenome::new(&config, &mut rng);
        let hidden = 2..=13;
        let mut innovation = 1000;
        let mut link = |genome: &mut NNGenome, input, output| {
            genome.add_gene(innovation, input, output, 1.0);
            innovation += 1;
        };
        for id in hidden.clone() {
            genome.add_node(id, NodePlace::Hidden);
        }
        for output in hidden.clone() {
            link(&mut genome, 0, output);
            for input in 2..output {
                link(&mut genome, input, output);
            }
        }
        for input in (2..=8).chain([13]) {
            link(&mut genome, input, 1);
        }

        let network = Network::new(&genome, config.max_network_depth);
        let threshold = genome.nodes().len().pow(2);
        for source in 9..=12 {
            assert_eq!(network.has_path(source, 1, threshold), (false, false));
        }

        let before = genome.genes().len();
        assert!(genome.mutate_add_link(&mut history, &config, &mut rng));
        assert_eq!(genome.genes().len(), before + 1);
        let added: Vec<_> = genome
            .genes()
            .iter()
            .filter(|g| g.innovation() < 1000)
            .map(|g| (g.input(), g.output(), g.recurrent()))
            .collect();
        assert_eq!(added, [(0, 1, false)]);
    }

    #[test]
    fn add_link_shares_innovations() {
        let config = GeneticConfig {
            initial_expression_chance: 0.0,
            ..connected_config(1, 1)
        };
        let mut rng = ChaCha8Rng::seed_from_u64(12);
        let mut history = History::new(&config);
        let template = NNGenome::new(&config, &mut rng);

        let mut a = template.clone();
        let mut b = template.clone();
        assert!(a.mutate_add_link(&mut history, &config, &mut rng));
        assert!(b.mutate_add_link(&mut history, &config, &mut rng));
        assert_eq!(a.genes(), b.genes());
    }

    #[test]
    fn frozen_weights_untouched() {
        let config = connected_config(2, 2);
        let mut rng = ChaCha8Rng::seed_from_u64(13);
        let mut genome = NNGenome::new(&config, &mut rng);
        genome.gene_mut(1).unwrap().set_frozen(true);
        let frozen = genome.gene(1).unwrap().clone();

        for _ in 0..10 {
            genome.mutate_link_weights(2.5, 1.0, WeightMutation::Gaussian, &mut rng);
        }
        assert_eq!(genome.gene(1), Some(&frozen));
        for gene in genome.genes().iter().filter(|g| !g.frozen()) {
            assert!(gene.weight().abs() <= WEIGHT_CAP);
            assert_eq!(gene.mutation_number(), gene.weight());
        }
    }

    #[test]
    fn toggle_disables_redundant_genes() {
        let config = connected_config(1, 2);
        let mut rng = ChaCha8Rng::seed_from_u64(14);
        let mut genome = NNGenome::new(&config, &mut rng);

        assert!(genome.mutate_toggle_enable(1, &mut rng));
        assert_eq!(genome.genes().iter().filter(|g| g.enabled()).count(), 1);

        // The remaining gene is the input's only enabled outgoing one,
        // so further toggles can only re-enable the other.
        genome.mutate_toggle_enable(20, &mut rng);
        assert!(genome.genes().iter().any(|g| g.enabled()));
    }

    #[test]
    fn reenable_oldest_disabled() {
        let config = connected_config(2, 2);
        let mut rng = ChaCha8Rng::seed_from_u64(15);
        let mut genome = NNGenome::new(&config, &mut rng);
        assert!(!genome.mutate_gene_reenable());

        genome.gene_mut(3).unwrap().set_enabled(false);
        genome.gene_mut(1).unwrap().set_enabled(false);
        assert!(genome.mutate_gene_reenable());
        assert!(genome.gene(1).unwrap().enabled());
        assert!(!genome.gene(3).unwrap().enabled());
    }
}
