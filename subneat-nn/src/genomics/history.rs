use crate::genomics::GeneticConfig;
use crate::{Innovation, NodeId};

use serde::{Deserialize, Serialize};
use subneat::InnovationHistory;

/// Identity of a structural mutation. Two mutations
/// with equal keys within one generation are the same
/// innovation and receive the same numbers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InnovationKey {
    /// A link between two existing nodes.
    NewLink {
        input: NodeId,
        output: NodeId,
        recurrent: bool,
    },
    /// A node splitting the gene `split`, which linked
    /// `input` to `output`.
    NewNode {
        input: NodeId,
        output: NodeId,
        split: Innovation,
    },
}

/// The numbers first assigned to a structural mutation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum InnovationRecord {
    NewLink {
        innovation: Innovation,
        weight: f32,
    },
    NewNode {
        input_gene: Innovation,
        node: NodeId,
        output_gene: Innovation,
    },
}

/// A `History` is the innovation ledger of a population.
/// It hands out monotonic gene innovation numbers and
/// node ids, and records the structural mutations of the
/// current generation so identical mutations in different
/// genomes are numbered identically.
///
/// The record of mutations is cleared at the start of
/// every generation's reproduction; the counters are not.
/// Records are kept in order of first occurrence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct History {
    next_innovation: Innovation,
    next_node_id: NodeId,
    innovations: Vec<(InnovationKey, InnovationRecord)>,
}

impl InnovationHistory for History {
    type Config = GeneticConfig;

    fn new(config: &GeneticConfig) -> History {
        Self::new(config)
    }

    fn clear(&mut self) {
        Self::clear(self)
    }
}

impl History {
    /// Creates a new History using the specified configuration.
    ///
    /// Template genomes number their nodes sensors first (inputs,
    /// then the bias if configured), then outputs. Their genes
    /// are given the innovation number `o + i ⨯ output_count`,
    /// where `i` is the index of the input-side node and `o` that
    /// of the output node. The counters start past that layout.
    ///
    /// # Examples
    /// ```
    /// use subneat_nn::genomics::{GeneticConfig, History};
    /// use std::num::NonZeroUsize;
    ///
    /// let history = History::new(&GeneticConfig {
    ///     input_count: NonZeroUsize::new(2).unwrap(),
    ///     output_count: NonZeroUsize::new(3).unwrap(),
    ///     bias: true,
    ///     ..GeneticConfig::zero()
    /// });
    ///
    /// assert_eq!(history.next_innovation(), 3 * 3);
    /// assert_eq!(history.next_node_id(), 2 + 1 + 3);
    /// assert!(history.is_empty());
    /// ```
    pub fn new(config: &GeneticConfig) -> History {
        let sensors = config.input_count.get() + usize::from(config.bias);
        let outputs = config.output_count.get();
        History {
            next_innovation: sensors * outputs,
            next_node_id: sensors + outputs,
            innovations: vec![],
        }
    }

    /// Clears the record of this generation's mutations,
    /// but keeps the innovation number and node id counters.
    ///
    /// # Examples
    /// ```
    /// use subneat_nn::genomics::{GeneticConfig, History, NNGenome};
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha8Rng;
    ///
    /// let config = GeneticConfig::default();
    /// let mut rng = ChaCha8Rng::seed_from_u64(0);
    /// let mut history = History::new(&config);
    ///
    /// NNGenome::new(&config, &mut rng).mutate_add_node(&mut history, &config, &mut rng);
    /// let next = history.next_innovation();
    ///
    /// history.clear();
    ///
    /// assert!(history.is_empty());
    /// assert_eq!(history.next_innovation(), next);
    /// ```
    pub fn clear(&mut self) {
        self.innovations.clear();
    }

    /// Returns the innovation number the next new
    /// gene will receive.
    pub fn next_innovation(&self) -> Innovation {
        self.next_innovation
    }

    /// Returns the id the next new node will receive.
    pub fn next_node_id(&self) -> NodeId {
        self.next_node_id
    }

    /// Returns the number of mutations recorded this generation.
    pub fn len(&self) -> usize {
        self.innovations.len()
    }

    /// Returns `true` if no mutation was recorded this generation.
    pub fn is_empty(&self) -> bool {
        self.innovations.is_empty()
    }

    /// Returns an iterator over this generation's recorded
    /// mutations, in order of first occurrence.
    pub fn records(&self) -> impl Iterator<Item = &(InnovationKey, InnovationRecord)> {
        self.innovations.iter()
    }

    fn lookup(&self, key: &InnovationKey) -> Option<InnovationRecord> {
        self.innovations
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, record)| *record)
    }

    /// Returns the innovation number and weight of a new
    /// link, reusing this generation's record of the same
    /// link if there is one. `weight` is only called for
    /// links not seen before.
    pub(crate) fn link_innovation(
        &mut self,
        input: NodeId,
        output: NodeId,
        recurrent: bool,
        weight: impl FnOnce() -> f32,
    ) -> (Innovation, f32) {
        let key = InnovationKey::NewLink {
            input,
            output,
            recurrent,
        };
        if let Some(InnovationRecord::NewLink { innovation, weight }) = self.lookup(&key) {
            return (innovation, weight);
        }
        let (innovation, weight) = (self.next_innovation, weight());
        self.next_innovation += 1;
        self.innovations
            .push((key, InnovationRecord::NewLink { innovation, weight }));
        (innovation, weight)
    }

    /// Returns the numbers of a node splitting gene `split`,
    /// in the format `(input gene, new node, output gene)`,
    /// reusing this generation's record of the same split if
    /// there is one.
    ///
    /// If the recorded node already exists in the splitting
    /// genome (as reported by `node_taken`), fresh numbers are
    /// handed out without replacing the record, as reusing them
    /// would duplicate nodes and genes within the genome.
    pub(crate) fn node_innovation(
        &mut self,
        input: NodeId,
        output: NodeId,
        split: Innovation,
        node_taken: impl Fn(NodeId) -> bool,
    ) -> (Innovation, NodeId, Innovation) {
        let key = InnovationKey::NewNode {
            input,
            output,
            split,
        };
        let recorded = self.lookup(&key);
        if let Some(InnovationRecord::NewNode {
            input_gene,
            node,
            output_gene,
        }) = recorded
        {
            if !node_taken(node) {
                return (input_gene, node, output_gene);
            }
        }

        let numbers = (
            self.next_innovation,
            self.next_node_id,
            self.next_innovation + 1,
        );
        self.next_innovation += 2;
        self.next_node_id += 1;
        if recorded.is_none() {
            self.innovations.push((
                key,
                InnovationRecord::NewNode {
                    input_gene: numbers.0,
                    node: numbers.1,
                    output_gene: numbers.2,
                },
            ));
        }
        numbers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history() -> History {
        History::new(&GeneticConfig::zero())
    }

    #[test]
    fn new_skips_template_layout() {
        let history = history();
        assert_eq!(history.next_innovation(), 1);
        assert_eq!(history.next_node_id(), 2);
    }

    #[test]
    fn link_innovation_reused_within_generation() {
        let mut history = history();
        let first = history.link_innovation(0, 1, true, || 0.25);
        let second = history.link_innovation(0, 1, true, || panic!("weight redrawn"));
        assert_eq!(first, (1, 0.25));
        assert_eq!(second, first);
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn link_recurrency_distinguishes_innovations() {
        let mut history = history();
        let (a, _) = history.link_innovation(0, 1, false, || 0.0);
        let (b, _) = history.link_innovation(0, 1, true, || 0.0);
        assert_ne!(a, b);
    }

    #[test]
    fn node_innovation_reused_within_generation() {
        let mut history = history();
        let first = history.node_innovation(0, 1, 0, |_| false);
        let second = history.node_innovation(0, 1, 0, |_| false);
        assert_eq!(first, (1, 2, 2));
        assert_eq!(second, first);
        assert_eq!(history.next_innovation(), 3);
        assert_eq!(history.next_node_id(), 3);
    }

    #[test]
    fn node_innovation_fresh_when_node_taken() {
        let mut history = history();
        let first = history.node_innovation(0, 1, 0, |_| false);
        let second = history.node_innovation(0, 1, 0, |n| n == first.1);
        assert_eq!(second, (3, 3, 4));
        // The original record still serves other genomes.
        assert_eq!(history.node_innovation(0, 1, 0, |_| false), first);
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn clear_forgets_records_only() {
        let mut history = history();
        let first = history.link_innovation(0, 1, false, || 1.0);
        history.clear();
        let second = history.link_innovation(0, 1, false, || 1.0);
        assert_ne!(first.0, second.0);
        assert_eq!(second.0, first.0 + 1);
    }
}
