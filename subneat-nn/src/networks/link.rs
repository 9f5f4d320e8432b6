use crate::genomics::Gene;
use crate::Innovation;

use std::fmt;

/// The runtime counterpart of an enabled gene.
/// Endpoints are indices into the owning network's
/// neuron arena.
#[derive(Clone, Copy, PartialEq)]
pub struct Link {
    pub innovation: Innovation,
    pub input: usize,
    pub output: usize,
    pub weight: f32,
    pub recurrent: bool,
    pub time_delay: bool,
}

impl Link {
    /// Creates a link expressing `gene` between
    /// the neurons at `input` and `output`.
    pub(super) fn new(gene: &Gene, input: usize, output: usize) -> Link {
        Link {
            innovation: gene.innovation(),
            input,
            output,
            weight: gene.weight(),
            recurrent: gene.recurrent(),
            time_delay: gene.time_delay(),
        }
    }
}

impl fmt::Debug for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} -> {} {:.9}{}",
            self.innovation,
            self.input,
            self.output,
            self.weight,
            if self.recurrent { " *" } else { "" }
        )
    }
}
