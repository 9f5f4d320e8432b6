use crate::{Innovation, NodeId};

use std::fmt;

use serde::{Deserialize, Serialize};

/// Genes are the principal components of genomes.
/// They link two nodes, and become network links
/// in the genome's phenotype.
///
/// Endpoints are stored as node ids. The phenotype
/// resolves them into arena indices when a network
/// is built.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Gene {
    innovation: Innovation,
    input: NodeId,
    output: NodeId,
    weight: f32,
    mutation_number: f32,
    enabled: bool,
    recurrent: bool,
    #[serde(default)]
    time_delay: bool,
    #[serde(default)]
    frozen: bool,
}

impl Gene {
    /// Returns a new enabled, non-recurrent gene with the
    /// specified parameters and a mutation number of 0.
    ///
    /// # Examples
    /// ```
    /// use subneat_nn::genomics::Gene;
    ///
    /// let gene = Gene::new(42, 3, 9, 2.0);
    ///
    /// assert!(gene.enabled());
    /// assert!(!gene.recurrent());
    /// assert_eq!(gene.mutation_number(), 0.0);
    /// ```
    pub fn new(innovation: Innovation, input: NodeId, output: NodeId, weight: f32) -> Gene {
        Gene {
            innovation,
            input,
            output,
            weight,
            mutation_number: 0.0,
            enabled: true,
            recurrent: false,
            time_delay: false,
            frozen: false,
        }
    }

    /// Returns the gene's innovation number.
    ///
    /// # Examples
    /// ```
    /// use subneat_nn::genomics::Gene;
    ///
    /// let gene = Gene::new(42, 3, 9, 2.0);
    ///
    /// assert_eq!(gene.innovation(), 42);
    /// ```
    pub fn innovation(&self) -> Innovation {
        self.innovation
    }

    /// Returns the id of the gene's input node.
    pub fn input(&self) -> NodeId {
        self.input
    }

    /// Returns the id of the gene's output node.
    pub fn output(&self) -> NodeId {
        self.output
    }

    /// Returns the gene's weight.
    pub fn weight(&self) -> f32 {
        self.weight
    }

    /// Sets the gene's weight.
    ///
    /// # Examples
    /// ```
    /// use subneat_nn::genomics::Gene;
    ///
    /// let mut gene = Gene::new(42, 3, 9, 2.0);
    /// gene.set_weight(-1.5);
    ///
    /// assert_eq!(gene.weight(), -1.5);
    /// ```
    pub fn set_weight(&mut self, weight: f32) {
        self.weight = weight;
    }

    /// Returns the gene's mutation number, a record of
    /// its cumulative weight drift used when measuring
    /// compatibility.
    pub fn mutation_number(&self) -> f32 {
        self.mutation_number
    }

    /// Sets the gene's mutation number.
    pub fn set_mutation_number(&mut self, mutation_number: f32) {
        self.mutation_number = mutation_number;
    }

    /// Returns whether the gene is expressed in the phenotype.
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Enables or disables the gene.
    ///
    /// # Examples
    /// ```
    /// use subneat_nn::genomics::Gene;
    ///
    /// let mut gene = Gene::new(42, 3, 9, 2.0);
    /// gene.set_enabled(false);
    ///
    /// assert!(!gene.enabled());
    /// ```
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Returns whether the gene closes a cycle.
    pub fn recurrent(&self) -> bool {
        self.recurrent
    }

    /// Marks the gene as recurrent or not.
    pub fn set_recurrent(&mut self, recurrent: bool) {
        self.recurrent = recurrent;
    }

    /// Returns whether the gene's link reads the
    /// previous activation of its input node.
    pub fn time_delay(&self) -> bool {
        self.time_delay
    }

    /// Marks the gene's link as time-delayed or not.
    pub fn set_time_delay(&mut self, time_delay: bool) {
        self.time_delay = time_delay;
    }

    /// Returns whether the gene's weight is exempt
    /// from weight mutation.
    pub fn frozen(&self) -> bool {
        self.frozen
    }

    /// Freezes or thaws the gene's weight.
    pub fn set_frozen(&mut self, frozen: bool) {
        self.frozen = frozen;
    }

    /// Returns whether both genes link the same
    /// endpoints with the same recurrency.
    pub(crate) fn same_link(&self, other: &Gene) -> bool {
        self.input == other.input
            && self.output == other.output
            && self.recurrent == other.recurrent
    }
}

impl fmt::Display for Gene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{:?}[{:?}->{:?}, {:.3}]{}{}",
            if self.enabled { "" } else { "(" },
            self.innovation,
            self.input,
            self.output,
            self.weight,
            if self.recurrent { "*" } else { "" },
            if self.enabled { "" } else { ")" },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_marks_disabled_and_recurrent() {
        let mut gene = Gene::new(4, 1, 2, 0.5);
        assert_eq!(gene.to_string(), "4[1->2, 0.500]");
        gene.set_enabled(false);
        gene.set_recurrent(true);
        assert_eq!(gene.to_string(), "(4[1->2, 0.500]*)");
    }

    #[test]
    fn same_link_considers_recurrency() {
        let a = Gene::new(0, 1, 2, 0.5);
        let mut b = Gene::new(7, 1, 2, -3.0);
        assert!(a.same_link(&b));
        b.set_recurrent(true);
        assert!(!a.same_link(&b));
    }

    #[test]
    fn deserializes_without_optional_flags() {
        let gene: Gene = serde_json::from_str(
            r#"{"innovation":3,"input":0,"output":2,"weight":1.5,
                "mutation_number":1.5,"enabled":true,"recurrent":false}"#,
        )
        .unwrap();
        assert!(!gene.time_delay());
        assert!(!gene.frozen());
        assert_eq!(gene.weight(), 1.5);
    }
}
