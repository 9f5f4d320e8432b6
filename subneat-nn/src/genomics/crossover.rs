use super::{Gene, GeneticConfig, NNGenome, NodePlace};
use crate::NodeId;

use ahash::RandomState;
use rand::Rng;
use serde::{Deserialize, Serialize};

use std::cmp::Ordering;
use std::collections::HashSet;

/// Chance of disabling an inherited gene that
/// is disabled in either parent.
const INHERIT_DISABLED_CHANCE: f32 = 0.75;

/// The crossover strategies available for mating genomes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Crossover {
    /// Matching genes are inherited from either parent at random.
    Multipoint,
    /// Matching genes are blended into an averaged gene.
    MultipointAverage,
    /// Genes are inherited from one parent before a random
    /// crosspoint and from the other after it.
    Singlepoint,
}

impl Crossover {
    /// Picks a strategy: multipoint with chance
    /// [`mate_multipoint_chance`], else multipoint-average
    /// or singlepoint in proportion to their configured
    /// chances (multipoint-average if both are 0).
    ///
    /// [`mate_multipoint_chance`]: GeneticConfig::mate_multipoint_chance
    pub fn choose<R: Rng + ?Sized>(config: &GeneticConfig, rng: &mut R) -> Crossover {
        if rng.gen::<f32>() < config.mate_multipoint_chance {
            return Crossover::Multipoint;
        }
        let total = config.mate_multipoint_average_chance + config.mate_singlepoint_chance;
        if total <= 0.0 || rng.gen::<f32>() * total < config.mate_multipoint_average_chance {
            Crossover::MultipointAverage
        } else {
            Crossover::Singlepoint
        }
    }
}

/// A child genome under construction. Rejects genes
/// duplicating a link already inherited and copies in
/// the endpoints of every gene it accepts.
struct Offspring<'a> {
    genome: NNGenome,
    links: HashSet<(NodeId, NodeId, bool), RandomState>,
    parents: [&'a NNGenome; 2],
}

impl<'a> Offspring<'a> {
    /// The second parent's sensors and outputs are
    /// always part of the child.
    fn new(first: &'a NNGenome, second: &'a NNGenome) -> Offspring<'a> {
        let mut genome = NNGenome::empty();
        for node in second.nodes.iter().filter(|n| n.place() != NodePlace::Hidden) {
            genome.insert_node(*node);
        }
        Offspring {
            genome,
            links: HashSet::default(),
            parents: [first, second],
        }
    }

    fn push(&mut self, gene: Gene) {
        let link = (gene.input(), gene.output(), gene.recurrent());
        let reversed = (gene.output(), gene.input(), false);
        if self.links.contains(&link) || (!gene.recurrent() && self.links.contains(&reversed)) {
            return;
        }

        for id in [gene.input(), gene.output()] {
            if self.genome.node_index(id).is_none() {
                if let Some(node) = self.parents.iter().find_map(|p| p.node(id)) {
                    self.genome.insert_node(*node);
                }
            }
        }
        self.links.insert(link);
        self.genome.insert_gene(gene);
    }

    fn finish(self) -> NNGenome {
        self.genome
    }
}

impl NNGenome {
    /// Mates two genomes with the given strategy.
    ///
    /// Unmatched genes are inherited from the fitter parent only.
    /// On equal fitness the parent with fewer genes counts as fitter.
    ///
    /// # Examples
    /// ```
    /// use subneat_nn::genomics::{Crossover, GeneticConfig, NNGenome};
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha8Rng;
    ///
    /// let config = GeneticConfig::default();
    /// let mut rng = ChaCha8Rng::seed_from_u64(0);
    /// let mut mother = NNGenome::new(&config, &mut rng);
    /// let father = NNGenome::new(&config, &mut rng);
    /// mother.set_fitness(2.0);
    ///
    /// let child = mother.mate_with(&father, Crossover::Multipoint, &mut rng);
    ///
    /// assert_eq!(child.genes().len(), mother.genes().len());
    /// assert_eq!(child.nodes(), mother.nodes());
    /// ```
    pub fn mate_with<R: Rng + ?Sized>(
        &self,
        other: &NNGenome,
        crossover: Crossover,
        rng: &mut R,
    ) -> NNGenome {
        match crossover {
            Crossover::Multipoint => self.mate_multipoint(other, rng),
            Crossover::MultipointAverage => self.mate_multipoint_average(other, rng),
            Crossover::Singlepoint => self.mate_singlepoint(other, rng),
        }
    }

    /// Multipoint crossover: each matching gene is copied from
    /// a random parent, and disabled with 75% probability if
    /// either parent's copy is disabled.
    pub fn mate_multipoint<R: Rng + ?Sized>(&self, other: &NNGenome, rng: &mut R) -> NNGenome {
        self.merge(other, rng, |first, second, rng| {
            let mut gene = if rng.gen::<bool>() {
                first.clone()
            } else {
                second.clone()
            };
            if (!first.enabled() || !second.enabled())
                && rng.gen::<f32>() < INHERIT_DISABLED_CHANCE
            {
                gene.set_enabled(false);
            }
            gene
        })
    }

    /// Multipoint-average crossover: each matching pair of genes
    /// is blended into one with their mean weight and mutation
    /// number, and endpoints and recurrency taken from a random
    /// parent. The blend is disabled with 75% probability if
    /// either parent's copy is disabled.
    pub fn mate_multipoint_average<R: Rng + ?Sized>(
        &self,
        other: &NNGenome,
        rng: &mut R,
    ) -> NNGenome {
        self.merge(other, rng, Self::average_genes)
    }

    /// Linear walk over both parents' genes by innovation
    /// number, resolving matching pairs with `resolve`.
    fn merge<R: Rng + ?Sized>(
        &self,
        other: &NNGenome,
        rng: &mut R,
        mut resolve: impl FnMut(&Gene, &Gene, &mut R) -> Gene,
    ) -> NNGenome {
        let self_fitter = self.is_fitter_than(other);
        let mut child = Offspring::new(self, other);
        let (mut i, mut j) = (0, 0);

        while i < self.genes.len() || j < other.genes.len() {
            let ordering = match (self.genes.get(i), other.genes.get(j)) {
                (Some(g1), Some(g2)) => g1.innovation().cmp(&g2.innovation()),
                (Some(_), None) => Ordering::Less,
                _ => Ordering::Greater,
            };
            match ordering {
                Ordering::Equal => {
                    child.push(resolve(&self.genes[i], &other.genes[j], rng));
                    i += 1;
                    j += 1;
                }
                Ordering::Less => {
                    if self_fitter {
                        child.push(self.genes[i].clone());
                    }
                    i += 1;
                }
                Ordering::Greater => {
                    if !self_fitter {
                        child.push(other.genes[j].clone());
                    }
                    j += 1;
                }
            }
        }

        child.finish()
    }

    /// Singlepoint crossover. A crosspoint is drawn among the
    /// shorter parent's genes. Up to it, genes come from the
    /// shorter parent; after it, from the longer. The matching
    /// pair straddling the crosspoint is averaged.
    pub fn mate_singlepoint<R: Rng + ?Sized>(&self, other: &NNGenome, rng: &mut R) -> NNGenome {
        let (short, long) = if self.genes.len() < other.genes.len() {
            (self, other)
        } else {
            (other, self)
        };
        let crosspoint = rng.gen_range(0..short.genes.len().max(1));
        let mut child = Offspring::new(self, other);
        let (mut i, mut j, mut counter) = (0, 0, 0);

        while j < long.genes.len() {
            let Some(s) = short.genes.get(i) else {
                child.push(long.genes[j].clone());
                j += 1;
                continue;
            };
            let l = &long.genes[j];
            match s.innovation().cmp(&l.innovation()) {
                Ordering::Equal => {
                    let gene = match counter.cmp(&crosspoint) {
                        Ordering::Less => s.clone(),
                        Ordering::Greater => l.clone(),
                        Ordering::Equal => Self::average_genes(s, l, rng),
                    };
                    child.push(gene);
                    i += 1;
                    j += 1;
                    counter += 1;
                }
                Ordering::Less => {
                    if counter < crosspoint {
                        child.push(s.clone());
                        counter += 1;
                    }
                    i += 1;
                }
                Ordering::Greater => {
                    if counter >= crosspoint {
                        child.push(l.clone());
                    }
                    j += 1;
                }
            }
        }

        child.finish()
    }

    /// Blends two matching genes: mean weight and mutation
    /// number, endpoints and recurrency each taken from a
    /// random parent. The result is disabled with 75%
    /// probability if either parent's copy is disabled.
    fn average_genes<R: Rng + ?Sized>(first: &Gene, second: &Gene, rng: &mut R) -> Gene {
        let input = if rng.gen::<bool>() {
            first.input()
        } else {
            second.input()
        };
        let output = if rng.gen::<bool>() {
            first.output()
        } else {
            second.output()
        };
        let mut gene = Gene::new(
            first.innovation(),
            input,
            output,
            (first.weight() + second.weight()) / 2.0,
        );
        gene.set_mutation_number((first.mutation_number() + second.mutation_number()) / 2.0);
        gene.set_recurrent(if rng.gen::<bool>() {
            first.recurrent()
        } else {
            second.recurrent()
        });
        if (!first.enabled() || !second.enabled()) && rng.gen::<f32>() < INHERIT_DISABLED_CHANCE {
            gene.set_enabled(false);
        }
        gene
    }

    fn is_fitter_than(&self, other: &NNGenome) -> bool {
        match self.fitness.partial_cmp(&other.fitness) {
            Some(Ordering::Greater) => true,
            Some(Ordering::Less) => false,
            _ => self.genes.len() < other.genes.len(),
        }
    }
}
